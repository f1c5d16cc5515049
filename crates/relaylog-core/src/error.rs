//! Error Types for Relaylog
//!
//! This module defines all error types that can occur in channel storage
//! operations.
//!
//! ## Error Categories
//!
//! ### I/O Errors (`EIO`)
//! - File system operations: open, read, write, rename
//! - `fdatasync` failures during commit
//!
//! ### Caller Errors (`EARG`)
//! - `OffsetOutOfBounds`: requested offset is past the channel head or
//!   outside the segment being read
//! - `EmptySegmentList`: opening a channel from zero recovered segments
//!
//! ### Channel Name Errors (`EINVAL`)
//! - `InvalidChannelId`: the name is empty or contains characters that
//!   are not safe as a filesystem path component
//!
//! ### Data Integrity Errors (`ECORRUPT`)
//! - `InvalidMagic`: segment file doesn't start with the expected magic bytes
//! - `CorruptFrame`: unreadable length prefix, or a frame that extends past
//!   the committed watermark
//! - `VarintOverflow`: a length prefix that doesn't fit in 64 bits
//! - `TruncatedTransaction`: watermark record shorter than 8 bytes
//! - `NonContiguousSegments`: gap or overlap between recovered segments
//!
//! ## Usage
//!
//! All fallible operations return `Result<T>`, aliased to
//! `Result<T, Error>`, so `?` propagates cleanly. Callers that dispatch on
//! the error taxonomy rather than the concrete variant use [`Error::kind`],
//! which collapses the enum into the four short codes above.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("offset {0} is out of bounds")]
    OffsetOutOfBounds(u64),

    #[error("cannot open a channel from an empty segment list")]
    EmptySegmentList,

    #[error("invalid channel id: '{0}'")]
    InvalidChannelId(String),

    #[error("invalid magic bytes in '{path}'")]
    InvalidMagic { path: PathBuf },

    #[error("corrupt frame in '{path}' at offset {offset}")]
    CorruptFrame { path: PathBuf, offset: u64 },

    #[error("varint exceeds 64 bits")]
    VarintOverflow,

    #[error("truncated segment transaction record")]
    TruncatedTransaction,

    #[error("segment ending at offset {head} is not contiguous with segment beginning at {next_begin}")]
    NonContiguousSegments { head: u64, next_begin: u64 },
}

impl Error {
    /// The short error code for this error, one of the four kinds in the
    /// storage taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::OffsetOutOfBounds(_) | Error::EmptySegmentList => ErrorKind::Arg,
            Error::InvalidChannelId(_) => ErrorKind::InvalidChannel,
            Error::InvalidMagic { .. }
            | Error::CorruptFrame { .. }
            | Error::VarintOverflow
            | Error::TruncatedTransaction
            | Error::NonContiguousSegments { .. } => ErrorKind::Corrupt,
        }
    }
}

/// Coarse error taxonomy used by callers that don't care about the
/// concrete variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Disk failure, short read/write, fsync failure
    Io,
    /// Offset out of range or malformed caller input
    Arg,
    /// Bad channel id
    InvalidChannel,
    /// Magic mismatch, bad framing, non-contiguous segments
    Corrupt,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Io => "EIO",
            ErrorKind::Arg => "EARG",
            ErrorKind::InvalidChannel => "EINVAL",
            ErrorKind::Corrupt => "ECORRUPT",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
