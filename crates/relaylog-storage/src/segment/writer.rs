//! Segment Writer - The Active Segment's Writable Handle
//!
//! A `SegmentWriter` owns the open file descriptor of the one segment a
//! channel is currently appending to, together with the in-memory
//! descriptor tracking how far the body extends.
//!
//! All writes are positional (`pwrite`-style): the append position is
//! computed from `offset_head` on every call instead of relying on the
//! file cursor. A failed or partial append therefore never advances the
//! head, and the next append simply overwrites the torn bytes.
//!
//! ## Lifecycle
//!
//! - `create` builds a fresh segment file: the header is staged in a
//!   `{path}~` temp file and renamed into place, so a crash mid-create
//!   leaves no half-written segment under the real name.
//! - `open` re-attaches to an existing segment during recovery, verifying
//!   the magic bytes before trusting it.
//! - The descriptor is closed when the writer is dropped, on rotation or
//!   channel teardown.
//!
//! Writers are not thread-safe; the owning channel serializes access
//! behind its mutex.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{FileExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use bytes::{BufMut, BytesMut};
use relaylog_core::{varint, ChannelSegment, Error, Result};

use super::{
    segment_path, SegmentTransaction, SEGMENT_HEADER_SIZE, SEGMENT_HEADER_TX_OFFSET, SEGMENT_MAGIC,
    SEGMENT_TX_SIZE, SEGMENT_VERSION,
};

/// Writable handle to the active segment of a channel.
#[derive(Debug)]
pub struct SegmentWriter {
    file: File,
    segment: ChannelSegment,
    path: PathBuf,
}

impl SegmentWriter {
    /// Create a new segment file starting at `start_offset`.
    ///
    /// The header carries a transaction record with
    /// `offset_head = start_offset`, so an empty segment is well-formed on
    /// disk from the moment it appears under its final name.
    pub fn create(channel_path: &Path, start_offset: u64) -> Result<SegmentWriter> {
        let path = segment_path(channel_path, start_offset);

        let mut tmp_path = path.clone().into_os_string();
        tmp_path.push("~");
        let tmp_path = PathBuf::from(tmp_path);

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o644)
            .open(&tmp_path)?;

        let mut header = BytesMut::with_capacity(SEGMENT_HEADER_SIZE);
        header.put_slice(&SEGMENT_MAGIC);
        header.put_slice(&SEGMENT_VERSION);
        SegmentTransaction {
            offset_head: start_offset,
        }
        .encode(&mut header);
        header.resize(SEGMENT_HEADER_SIZE, 0);

        // Single write; the temp file is unlinked on any failure so a
        // crashed create leaves nothing behind under the real name.
        if let Err(err) = file.write_all(&header) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }

        if let Err(err) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }

        Ok(SegmentWriter {
            file,
            segment: ChannelSegment::empty_at(start_offset),
            path,
        })
    }

    /// Re-open an existing segment for appending, typically after
    /// recovery has read its header.
    ///
    /// The magic bytes are verified again here; the descriptor handed in
    /// may come from a stale directory scan.
    pub fn open(channel_path: &Path, segment: ChannelSegment) -> Result<SegmentWriter> {
        let path = segment_path(channel_path, segment.offset_begin);

        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let mut magic = [0u8; SEGMENT_MAGIC.len()];
        file.read_exact_at(&mut magic, 0)?;
        if magic != SEGMENT_MAGIC {
            return Err(Error::InvalidMagic { path });
        }

        Ok(SegmentWriter {
            file,
            segment,
            path,
        })
    }

    /// Append one varint-framed message to the segment body.
    ///
    /// The frame lands at the body position derived from `offset_head`,
    /// which only advances after the whole frame is on disk (in the page
    /// cache; durability comes from [`commit`](Self::commit)).
    pub fn append(&mut self, message: &[u8]) -> Result<()> {
        let mut frame = BytesMut::with_capacity(varint::MAX_VARINT_LEN + message.len());
        varint::encode_varint(&mut frame, message.len() as u64);
        frame.put_slice(message);

        let body_position = self.segment.offset_head - self.segment.offset_begin;
        self.file
            .write_all_at(&frame, SEGMENT_HEADER_SIZE as u64 + body_position)?;

        self.segment.offset_head += frame.len() as u64;
        Ok(())
    }

    /// Make appended frames durable and record the new watermark.
    ///
    /// The body is fdatasync'd first, then the header transaction record
    /// is rewritten in place. The rewrite itself is not synced: the body
    /// is durable, the watermark is best-effort. After a crash the
    /// on-disk watermark may lag the body, in which case recovery serves
    /// the shorter committed range and the next append overwrites the
    /// unaccounted tail.
    pub fn commit(&mut self) -> Result<()> {
        self.file.sync_data()?;

        let mut tx = BytesMut::with_capacity(SEGMENT_TX_SIZE);
        SegmentTransaction {
            offset_head: self.segment.offset_head,
        }
        .encode(&mut tx);

        self.file
            .write_all_at(&tx, SEGMENT_HEADER_TX_OFFSET as u64)?;
        Ok(())
    }

    /// Snapshot of this segment's descriptor, including unflushed appends.
    pub fn segment(&self) -> ChannelSegment {
        self.segment
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{read_header, read_messages};
    use tempfile::TempDir;

    fn channel_path(dir: &TempDir) -> PathBuf {
        dir.path().join("ch")
    }

    #[test]
    fn test_create_writes_header() {
        let dir = TempDir::new().unwrap();
        let writer = SegmentWriter::create(&channel_path(&dir), 0).unwrap();

        assert_eq!(writer.segment(), ChannelSegment::empty_at(0));

        let raw = fs::read(dir.path().join("ch~0")).unwrap();
        assert_eq!(raw.len(), SEGMENT_HEADER_SIZE);
        assert_eq!(&raw[..4], &SEGMENT_MAGIC);
        assert_eq!(&raw[4..6], &SEGMENT_VERSION);
        assert_eq!(&raw[6..14], &[0u8; 8]);
        assert!(raw[14..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_create_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        SegmentWriter::create(&channel_path(&dir), 0).unwrap();
        assert!(!dir.path().join("ch~0~").exists());
    }

    #[test]
    fn test_create_header_records_start_offset() {
        let dir = TempDir::new().unwrap();
        SegmentWriter::create(&channel_path(&dir), 4096).unwrap();

        let seg = read_header(&channel_path(&dir), 4096).unwrap();
        assert_eq!(seg.offset_begin, 4096);
        assert_eq!(seg.offset_head, 4096);
    }

    #[test]
    fn test_append_advances_head_by_frame_len() {
        let dir = TempDir::new().unwrap();
        let mut writer = SegmentWriter::create(&channel_path(&dir), 0).unwrap();

        writer.append(b"hello").unwrap();
        assert_eq!(writer.segment().offset_head, 6);

        writer.append(b"world!").unwrap();
        assert_eq!(writer.segment().offset_head, 13);
    }

    #[test]
    fn test_append_large_payload_two_byte_prefix() {
        let dir = TempDir::new().unwrap();
        let mut writer = SegmentWriter::create(&channel_path(&dir), 0).unwrap();

        let payload = vec![0xAB; 300];
        writer.append(&payload).unwrap();
        // varint(300) takes 2 bytes
        assert_eq!(writer.segment().offset_head, 302);
    }

    #[test]
    fn test_commit_updates_watermark() {
        let dir = TempDir::new().unwrap();
        let mut writer = SegmentWriter::create(&channel_path(&dir), 0).unwrap();

        writer.append(b"hello").unwrap();
        // not committed yet: the header still says 0
        let seg = read_header(&channel_path(&dir), 0).unwrap();
        assert_eq!(seg.offset_head, 0);

        writer.commit().unwrap();
        let seg = read_header(&channel_path(&dir), 0).unwrap();
        assert_eq!(seg.offset_head, 6);
    }

    #[test]
    fn test_open_resumes_append_position() {
        let dir = TempDir::new().unwrap();
        let path = channel_path(&dir);

        let mut writer = SegmentWriter::create(&path, 0).unwrap();
        writer.append(b"hello").unwrap();
        writer.commit().unwrap();
        drop(writer);

        let seg = read_header(&path, 0).unwrap();
        let mut writer = SegmentWriter::open(&path, seg).unwrap();
        writer.append(b"world!").unwrap();
        writer.commit().unwrap();

        let seg = read_header(&path, 0).unwrap();
        let mut out = Vec::new();
        read_messages(&seg, &path, 0, 10, &mut out).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].data.as_ref(), b"hello");
        assert_eq!(out[1].data.as_ref(), b"world!");
        assert_eq!(out[1].offset, 6);
    }

    #[test]
    fn test_open_rejects_bad_magic() {
        let dir = TempDir::new().unwrap();
        let path = channel_path(&dir);
        SegmentWriter::create(&path, 0).unwrap();

        let seg_file = dir.path().join("ch~0");
        let mut raw = fs::read(&seg_file).unwrap();
        raw[0] ^= 0xFF;
        fs::write(&seg_file, raw).unwrap();

        let err = SegmentWriter::open(&path, ChannelSegment::empty_at(0)).unwrap_err();
        assert_eq!(err.kind().code(), "ECORRUPT");
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err =
            SegmentWriter::open(&channel_path(&dir), ChannelSegment::empty_at(0)).unwrap_err();
        assert_eq!(err.kind().code(), "EIO");
    }

    #[test]
    fn test_reopened_writer_overwrites_torn_tail() {
        let dir = TempDir::new().unwrap();
        let path = channel_path(&dir);

        let mut writer = SegmentWriter::create(&path, 0).unwrap();
        writer.append(b"hello").unwrap();
        writer.commit().unwrap();
        drop(writer);

        // a crashed append left garbage past the watermark
        let seg_file = dir.path().join("ch~0");
        let mut raw = fs::read(&seg_file).unwrap();
        raw.extend_from_slice(&[0xFF, 0xFF, 0xFF]);
        fs::write(&seg_file, raw).unwrap();

        let seg = read_header(&path, 0).unwrap();
        assert_eq!(seg.offset_head, 6);

        let mut writer = SegmentWriter::open(&path, seg).unwrap();
        writer.append(b"ok").unwrap();
        writer.commit().unwrap();

        let seg = read_header(&path, 0).unwrap();
        let mut out = Vec::new();
        read_messages(&seg, &path, 0, 10, &mut out).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].data.as_ref(), b"ok");
    }
}
