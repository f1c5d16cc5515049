//! Relaylog Storage Layer
//!
//! This crate implements the on-disk storage engine for one broker
//! channel: an append-only, segmented, durable log of opaque byte
//! messages.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────┐
//! │  Producers  │
//! └──────┬──────┘
//!        │ append(bytes) -> offset
//!        ▼
//! ┌──────────────────────────────┐
//! │ Channel                      │
//! │ - archive: sealed segments   │
//! │ - active: SegmentWriter      │
//! │ - mutex + dirty flag         │
//! └──────┬───────────────────────┘
//!        │ varint-framed frames
//!        ▼
//! ┌──────────────────────────────┐
//! │ Segment files on disk        │
//! │   {channel}~0  {channel}~N   │
//! └──────┬───────────────────────┘
//!        │ fetch(start_offset, batch)
//!        ▼
//! ┌─────────────┐
//! │  Consumers  │
//! └─────────────┘
//! ```
//!
//! ## Main Components
//!
//! - [`Channel`]: the public entry point. Serializes appends behind a
//!   mutex, commits each append durably, and serves lock-free range reads
//!   from descriptor snapshots.
//! - [`segment`]: the binary file format plus the writer handle and the
//!   read paths.
//! - [`recovery`]: reconstructs a channel's segment list from its
//!   directory after a restart.
//! - [`ChannelConfig`]: tuning knobs, currently the rotation threshold.
//!
//! ## Durability Contract
//!
//! `Channel::append` returns only after the message body has been
//! fdatasync'd and the segment header watermark rewritten. The watermark
//! rewrite itself is not synced a second time, so after a crash it may lag
//! the body; recovery then serves the shorter committed range and the next
//! append overwrites the torn tail. See [`segment::SegmentWriter::commit`].
//!
//! ## Sharing
//!
//! One writer and any number of readers per channel within one process.
//! Opening the same channel directory from multiple processes is not
//! supported and needs external arbitration.

pub mod channel;
pub mod config;
pub mod recovery;
pub mod segment;

pub use channel::Channel;
pub use config::ChannelConfig;
pub use recovery::scan_segments;
pub use segment::{SegmentTransaction, SegmentWriter};

pub use relaylog_core::{ChannelId, ChannelSegment, Error, ErrorKind, Message, Result};
