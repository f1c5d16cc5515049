//! Directory Recovery
//!
//! Rebuilds a channel's segment list from its directory after a restart.
//! Segment files are siblings of the channel path named
//! `{channel_name}~{offset_begin}`; the decimal suffix is the only source
//! of ordering, so `ch~9` sorts before `ch~100`.
//!
//! Files whose suffix is not purely ASCII digits are ignored. That also
//! skips `{path}~{offset}~` temp files left behind by a create that
//! crashed before its rename.
//!
//! Each matching file has its header read and validated; the resulting
//! descriptors must tile the offset space without gaps or overlaps, since
//! a missing or doubled range means messages were lost or duplicated and
//! no safe head can be chosen. The ordered list feeds
//! [`Channel::open`](crate::Channel::open).

use std::fs;
use std::path::Path;

use tracing::debug;

use relaylog_core::{ChannelSegment, Error, Result};

use crate::segment::read_header;

/// Enumerate, validate and order the segment files of the channel at
/// `channel_path`.
///
/// Returns an empty vec when no segment files exist (a channel that was
/// never created); the caller decides between
/// [`Channel::create`](crate::Channel::create) and
/// [`Channel::open`](crate::Channel::open).
pub fn scan_segments(channel_path: &Path) -> Result<Vec<ChannelSegment>> {
    let dir = channel_path.parent().filter(|p| !p.as_os_str().is_empty());
    let dir = dir.unwrap_or_else(|| Path::new("."));

    let name = match channel_path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => return Err(Error::InvalidChannelId(channel_path.display().to_string())),
    };
    let prefix = format!("{name}~");

    let mut offsets = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();

        let Some(suffix) = file_name.strip_prefix(&prefix) else {
            continue;
        };
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        match suffix.parse::<u64>() {
            Ok(offset) => offsets.push(offset),
            Err(_) => continue,
        }
    }

    offsets.sort_unstable();

    let mut segments = Vec::with_capacity(offsets.len());
    for offset in offsets {
        segments.push(read_header(channel_path, offset)?);
    }

    for pair in segments.windows(2) {
        if pair[0].offset_head != pair[1].offset_begin {
            return Err(Error::NonContiguousSegments {
                head: pair[0].offset_head,
                next_begin: pair[1].offset_begin,
            });
        }
    }

    debug!(
        path = %channel_path.display(),
        segments = segments.len(),
        "channel directory scanned"
    );

    Ok(segments)
}
