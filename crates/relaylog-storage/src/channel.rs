//! Channel - Append-Only Log Over Segment Files
//!
//! A `Channel` owns one directory-resident log: an ordered archive of
//! sealed segment descriptors plus the single active segment accepting
//! appends. All mutable state sits behind one mutex.
//!
//! ## Locking Discipline
//!
//! `append` holds the mutex across the whole write, fdatasync and
//! watermark rewrite, so appends are totally ordered and each returned
//! offset is durable before the call returns.
//!
//! `fetch` takes the mutex only long enough to snapshot the segment
//! descriptors, then reads from disk with its own read-only descriptors.
//! Body bytes below a snapshotted head are immutable, so readers never
//! see a partial frame regardless of concurrent appends.
//!
//! Mutex poisoning means an append panicked mid-flight and the in-memory
//! state can no longer be trusted; that is fatal here, matching the
//! recovery story (restart and rebuild from the on-disk watermarks).

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use relaylog_core::{ChannelSegment, Error, Message, Result};

use crate::config::ChannelConfig;
use crate::segment::{read_messages, SegmentWriter};

/// A named, append-only, segmented log.
#[derive(Debug)]
pub struct Channel {
    /// Directory plus channel name; segment files are siblings named
    /// `{path}~{offset_begin}`.
    path: PathBuf,
    config: ChannelConfig,
    inner: Mutex<ChannelInner>,
}

#[derive(Debug)]
struct ChannelInner {
    /// Sealed segments, ordered by `offset_begin`, contiguous.
    archive: Vec<ChannelSegment>,
    /// The one segment currently accepting appends.
    active: SegmentWriter,
    /// True iff the in-memory head is ahead of the committed watermark.
    dirty: bool,
}

impl Channel {
    /// Create a brand-new channel at `path` with its first segment
    /// starting at offset 0.
    pub fn create(path: impl Into<PathBuf>, config: ChannelConfig) -> Result<Channel> {
        let path = path.into();
        let active = SegmentWriter::create(&path, 0)?;

        info!(path = %path.display(), "channel created");

        Ok(Channel {
            path,
            config,
            inner: Mutex::new(ChannelInner {
                archive: Vec::new(),
                active,
                dirty: false,
            }),
        })
    }

    /// Open an existing channel from the ordered segment list produced by
    /// [`crate::recovery::scan_segments`]. The last segment becomes the
    /// active one; the rest form the archive.
    pub fn open(
        path: impl Into<PathBuf>,
        mut segments: Vec<ChannelSegment>,
        config: ChannelConfig,
    ) -> Result<Channel> {
        let path = path.into();

        let last = segments.pop().ok_or(Error::EmptySegmentList)?;
        let active = SegmentWriter::open(&path, last)?;

        info!(
            path = %path.display(),
            archived = segments.len(),
            head = active.segment().offset_head,
            "channel opened"
        );

        Ok(Channel {
            path,
            config,
            inner: Mutex::new(ChannelInner {
                archive: segments,
                active,
                dirty: false,
            }),
        })
    }

    /// Append one message, returning its assigned channel offset.
    ///
    /// The message is durable when this returns: the segment body has
    /// been fdatasync'd and the header watermark rewritten.
    pub fn append(&self, message: &[u8]) -> Result<u64> {
        let mut inner = self.lock();

        if inner.active.segment().len() > self.config.segment_max_size {
            self.rotate(&mut inner)?;
        }

        let offset = inner.active.segment().offset_head;
        inner.active.append(message)?;
        inner.dirty = true;

        Self::commit_locked(&mut inner)?;
        Ok(offset)
    }

    /// Seal the active segment and start a new one at its head.
    fn rotate(&self, inner: &mut ChannelInner) -> Result<()> {
        Self::commit_locked(inner)?;

        let sealed = inner.active.segment();
        let next = SegmentWriter::create(&self.path, sealed.offset_head)?;

        // dropping the old writer closes its descriptor
        inner.active = next;
        inner.archive.push(sealed);

        debug!(
            path = %self.path.display(),
            offset_begin = sealed.offset_begin,
            offset_head = sealed.offset_head,
            "segment rotated"
        );

        Ok(())
    }

    /// Read up to `batch_size` messages starting at `start_offset`.
    ///
    /// `start_offset` must be 0, an offset returned by [`append`](Self::append),
    /// or a previous message's `next_offset`; offsets inside a frame are
    /// undefined. A start equal to the current head returns an empty vec,
    /// meaning "nothing more at this offset right now"; a start past the
    /// head is out of bounds.
    pub fn fetch(&self, start_offset: u64, batch_size: usize) -> Result<Vec<Message>> {
        let (segments, head) = {
            let inner = self.lock();
            let mut segments = inner.archive.clone();
            segments.push(inner.active.segment());
            let head = inner.active.segment().offset_head;
            (segments, head)
        };

        if start_offset > head {
            return Err(Error::OffsetOutOfBounds(start_offset));
        }

        let mut entries = Vec::new();
        if batch_size == 0 {
            return Ok(entries);
        }

        let mut start = start_offset;
        for segment in &segments {
            while start < segment.offset_head {
                let before = entries.len();
                read_messages(
                    segment,
                    &self.path,
                    start,
                    batch_size - entries.len(),
                    &mut entries,
                )?;

                if entries.len() == batch_size || entries.len() == before {
                    return Ok(entries);
                }

                match entries.last() {
                    Some(last) => start = last.next_offset,
                    None => return Ok(entries),
                }
            }
        }

        Ok(entries)
    }

    /// Flush the active segment's watermark if any append since the last
    /// commit left it dirty.
    pub fn commit(&self) -> Result<()> {
        let mut inner = self.lock();
        Self::commit_locked(&mut inner)
    }

    fn commit_locked(inner: &mut ChannelInner) -> Result<()> {
        if !inner.dirty {
            return Ok(());
        }

        inner.active.commit()?;
        inner.dirty = false;
        Ok(())
    }

    /// The channel-wide head offset: where the next append will land.
    pub fn head_offset(&self) -> u64 {
        self.lock().active.segment().offset_head
    }

    /// The path prefix of this channel's segment files.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChannelInner> {
        self.inner.lock().expect("channel mutex poisoned")
    }
}
