//! Segment Reader - Header and Body Read Paths
//!
//! Reads open their own short-lived read-only descriptor, so they never
//! contend with the channel's writable handle and a fetch can run while
//! appends continue.
//!
//! `read_header` validates the magic bytes and decodes the committed
//! watermark; recovery calls it for every segment file it finds.
//!
//! `read_messages` scans the body in 4 KiB chunks and reassembles frames
//! that cross chunk boundaries: payload bytes accumulate into the message
//! under construction, and a length prefix cut off at the end of a chunk
//! triggers a re-read starting at the prefix. Only bytes below the
//! descriptor's `offset_head` are ever looked at; anything past the
//! watermark is a torn tail and stays invisible.

use std::cmp;
use std::fs::File;
use std::io::Read;
use std::os::unix::fs::FileExt;
use std::path::Path;

use bytes::Bytes;
use relaylog_core::{varint, ChannelSegment, Error, Message, Result};

use super::{
    segment_path, SegmentTransaction, READ_CHUNK_SIZE, SEGMENT_HEADER_SIZE,
    SEGMENT_HEADER_TX_OFFSET, SEGMENT_MAGIC,
};

/// Read and validate a segment header, returning the descriptor for the
/// range the file durably covers.
pub fn read_header(channel_path: &Path, start_offset: u64) -> Result<ChannelSegment> {
    let path = segment_path(channel_path, start_offset);
    let mut file = File::open(&path)?;

    let mut header = [0u8; SEGMENT_HEADER_SIZE];
    file.read_exact(&mut header)?;

    if header[..SEGMENT_MAGIC.len()] != SEGMENT_MAGIC {
        return Err(Error::InvalidMagic { path });
    }

    let tx = SegmentTransaction::decode(&header[SEGMENT_HEADER_TX_OFFSET..])?;

    Ok(ChannelSegment {
        offset_begin: start_offset,
        offset_head: tx.offset_head,
    })
}

/// A frame whose payload is still being assembled across chunk reads.
struct PartialMessage {
    offset: u64,
    next_offset: u64,
    remaining: usize,
    data: Vec<u8>,
}

/// Read up to `max_messages` messages from `segment`, starting at channel
/// offset `start_offset`, appending them to `out`.
///
/// `start_offset` must lie inside the segment's committed range and on a
/// frame boundary; offsets come from a previous append or a message's
/// `next_offset`.
pub fn read_messages(
    segment: &ChannelSegment,
    channel_path: &Path,
    start_offset: u64,
    max_messages: usize,
    out: &mut Vec<Message>,
) -> Result<()> {
    if start_offset < segment.offset_begin || start_offset >= segment.offset_head {
        return Err(Error::OffsetOutOfBounds(start_offset));
    }
    if max_messages == 0 {
        return Ok(());
    }

    let path = segment_path(channel_path, segment.offset_begin);
    let file = File::open(&path)?;

    let body_len = segment.offset_head - segment.offset_begin;
    let mut pos = start_offset - segment.offset_begin;
    let mut budget = max_messages;
    let mut partial: Option<PartialMessage> = None;

    'chunks: while pos < body_len {
        let want = cmp::min(READ_CHUNK_SIZE as u64, body_len - pos) as usize;
        let mut chunk = vec![0u8; want];
        file.read_exact_at(&mut chunk, SEGMENT_HEADER_SIZE as u64 + pos)?;

        let mut cur = 0usize;
        while cur < want {
            if let Some(mut msg) = partial.take() {
                let take = cmp::min(msg.remaining, want - cur);
                msg.data.extend_from_slice(&chunk[cur..cur + take]);
                msg.remaining -= take;
                cur += take;

                if msg.remaining == 0 {
                    out.push(Message::new(msg.offset, msg.next_offset, Bytes::from(msg.data)));
                    budget -= 1;
                    if budget == 0 {
                        return Ok(());
                    }
                } else {
                    partial = Some(msg);
                }
                continue;
            }

            let frame_offset = segment.offset_begin + pos + cur as u64;
            match varint::decode_varint(&chunk[cur..want])
                .map_err(|_| Error::CorruptFrame {
                    path: path.clone(),
                    offset: frame_offset,
                })? {
                Some((payload_len, prefix_len)) => {
                    cur += prefix_len;
                    let next_offset = segment.offset_begin + pos + cur as u64 + payload_len;
                    if next_offset > segment.offset_head {
                        // frame claims bytes past the committed watermark
                        return Err(Error::CorruptFrame {
                            path,
                            offset: frame_offset,
                        });
                    }
                    partial = Some(PartialMessage {
                        offset: frame_offset,
                        next_offset,
                        remaining: payload_len as usize,
                        data: Vec::with_capacity(payload_len as usize),
                    });
                }
                None => {
                    // length prefix cut off by the chunk boundary
                    if pos + want as u64 == body_len {
                        return Err(Error::CorruptFrame {
                            path,
                            offset: frame_offset,
                        });
                    }
                    pos += cur as u64;
                    continue 'chunks;
                }
            }
        }

        pos += want as u64;
    }

    // a zero-length payload whose prefix is the last body byte completes
    // with nothing left to read; flush it here
    if let Some(msg) = partial {
        out.push(Message::new(msg.offset, msg.next_offset, Bytes::from(msg.data)));
    }

    Ok(())
}
