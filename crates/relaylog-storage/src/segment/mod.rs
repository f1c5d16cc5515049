//! Segment Storage Format
//!
//! A segment is one file on disk holding a contiguous slice of a channel's
//! offset space. Files are named `{channel}~{offset_begin}` with the start
//! offset in decimal.
//!
//! ## Segment File Structure
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Header (32 bytes)                                           │
//! │ - Magic bytes: "RLOG" (4 bytes)                             │
//! │ - Version (2 bytes)                                         │
//! │ - Transaction record: offset_head, u64 little-endian (8 B)  │
//! │ - Zero padding (18 bytes)                                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Body: frame, frame, frame, ...                              │
//! └─────────────────────────────────────────────────────────────┘
//!
//! Frame:
//! ┌──────────────────────────┬──────────────────┐
//! │ payload length (varint)  │ payload (N bytes)│
//! └──────────────────────────┴──────────────────┘
//! ```
//!
//! The channel offset of a message is the body position of its length
//! prefix plus the segment's `offset_begin`.
//!
//! ## The Transaction Record
//!
//! The 8 bytes at [`SEGMENT_HEADER_TX_OFFSET`] hold the committed
//! watermark: the first channel offset not yet durably written. A commit
//! first fdatasyncs the body, then rewrites this slot in place. Readers
//! trust the watermark over the physical file length, so bytes past the
//! watermark (a torn tail from a crashed append) are never served.
//!
//! The watermark is stored little-endian regardless of host byte order.
//! Segment files are byte-identical across architectures.

mod reader;
mod writer;

pub use reader::{read_header, read_messages};
pub use writer::SegmentWriter;

use std::path::{Path, PathBuf};

use bytes::BufMut;
use relaylog_core::{Error, Result};

/// Magic bytes at the start of every segment file: "RLOG"
pub const SEGMENT_MAGIC: [u8; 4] = [0x52, 0x4C, 0x4F, 0x47];

/// Segment format version bytes
pub const SEGMENT_VERSION: [u8; 2] = [0x00, 0x01];

/// Byte offset of the transaction record inside the header
pub const SEGMENT_HEADER_TX_OFFSET: usize = SEGMENT_MAGIC.len() + SEGMENT_VERSION.len();

/// Total header size; the bytes after the transaction record are zero
pub const SEGMENT_HEADER_SIZE: usize = 32;

/// Encoded size of the transaction record
pub const SEGMENT_TX_SIZE: usize = 8;

/// Chunk size for sequential body reads
pub(crate) const READ_CHUNK_SIZE: usize = 4096;

/// Path of the segment file starting at `offset_begin`, composed from the
/// channel path prefix.
pub fn segment_path(channel_path: &Path, offset_begin: u64) -> PathBuf {
    let mut path = channel_path.as_os_str().to_os_string();
    path.push(format!("~{offset_begin}"));
    PathBuf::from(path)
}

/// The durable watermark record embedded in a segment header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentTransaction {
    /// First channel offset not yet durably written to this segment.
    pub offset_head: u64,
}

impl SegmentTransaction {
    /// Append the 8-byte little-endian encoding of this record to `buf`.
    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u64_le(self.offset_head);
    }

    /// Decode a record from the front of `buf`. Shorter buffers are
    /// corruption.
    pub fn decode(buf: &[u8]) -> Result<SegmentTransaction> {
        if buf.len() < SEGMENT_TX_SIZE {
            return Err(Error::TruncatedTransaction);
        }

        let mut raw = [0u8; SEGMENT_TX_SIZE];
        raw.copy_from_slice(&buf[..SEGMENT_TX_SIZE]);

        Ok(SegmentTransaction {
            offset_head: u64::from_le_bytes(raw),
        })
    }
}
