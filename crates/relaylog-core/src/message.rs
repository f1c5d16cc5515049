//! Message Data Structure
//!
//! The unit returned by a channel fetch. Every message knows where it
//! starts in channel-offset space and where the next message starts, so a
//! consumer can resume a scan by passing `next_offset` back as the start
//! offset of its next fetch.
//!
//! Payloads are opaque bytes held in `bytes::Bytes` so batches can be
//! cloned and sliced without copying.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A single message read from a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Channel offset of this message's length prefix.
    pub offset: u64,

    /// Channel offset at which the next message starts.
    pub next_offset: u64,

    /// Payload bytes.
    pub data: Bytes,
}

impl Message {
    pub fn new(offset: u64, next_offset: u64, data: Bytes) -> Message {
        Message {
            offset,
            next_offset,
            data,
        }
    }

    /// On-disk size of this message's frame: length prefix plus payload.
    pub fn frame_len(&self) -> u64 {
        self.next_offset - self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varint::varint_len;

    #[test]
    fn test_new() {
        let msg = Message::new(0, 6, Bytes::from("hello"));
        assert_eq!(msg.offset, 0);
        assert_eq!(msg.next_offset, 6);
        assert_eq!(msg.data, Bytes::from("hello"));
    }

    #[test]
    fn test_frame_len() {
        let msg = Message::new(6, 13, Bytes::from("world!"));
        assert_eq!(msg.frame_len(), 7);
        assert_eq!(
            msg.frame_len(),
            (varint_len(msg.data.len() as u64) + msg.data.len()) as u64
        );
    }

    #[test]
    fn test_empty_payload() {
        let msg = Message::new(40, 41, Bytes::new());
        assert!(msg.data.is_empty());
        assert_eq!(msg.frame_len(), 1);
    }

    #[test]
    fn test_clone_and_eq() {
        let msg = Message::new(10, 16, Bytes::from("abcde"));
        let cloned = msg.clone();
        assert_eq!(msg, cloned);
    }

    #[test]
    fn test_serde_roundtrip() {
        let msg = Message::new(22, 33, Bytes::from(vec![0u8, 1, 2, 255]));
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
