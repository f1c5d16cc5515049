//! Edge-case tests for the varint codec, channel ids, and message types.

use bytes::Bytes;
use relaylog_core::varint::{decode_varint, encode_varint, varint_len, MAX_VARINT_LEN};
use relaylog_core::{ChannelId, ChannelSegment, Message};

// ---------------------------------------------------------------
// Varint encoding round-trip
// ---------------------------------------------------------------

#[test]
fn varint_roundtrip_small_values() {
    for val in 0..=255u64 {
        let mut buf = Vec::new();
        encode_varint(&mut buf, val);
        let (decoded, len) = decode_varint(&buf).unwrap().unwrap();
        assert_eq!(decoded, val, "failed for value {val}");
        assert_eq!(len, buf.len());
    }
}

#[test]
fn varint_roundtrip_width_boundaries() {
    // values on either side of each 7-bit width boundary
    let mut values = vec![0u64, u64::MAX];
    for width in 1..=9u32 {
        let boundary = 1u64 << (7 * width);
        values.push(boundary - 1);
        values.push(boundary);
    }

    for val in values {
        let mut buf = Vec::new();
        encode_varint(&mut buf, val);
        assert_eq!(buf.len(), varint_len(val), "width for value {val}");
        let (decoded, _) = decode_varint(&buf).unwrap().unwrap();
        assert_eq!(decoded, val, "failed for value {val}");
    }
}

#[test]
fn varint_truncated_inputs_are_incomplete_not_errors() {
    let mut buf = Vec::new();
    encode_varint(&mut buf, u64::MAX);
    assert_eq!(buf.len(), MAX_VARINT_LEN);

    for cut in 0..buf.len() {
        assert_eq!(
            decode_varint(&buf[..cut]).unwrap(),
            None,
            "prefix of {cut} bytes should be incomplete"
        );
    }
}

#[test]
fn varint_overflow_is_corruption() {
    let err = decode_varint(&[0xFF; 11]).unwrap_err();
    assert_eq!(err.kind().code(), "ECORRUPT");
}

// ---------------------------------------------------------------
// Channel id validation
// ---------------------------------------------------------------

#[test]
fn channel_id_accepts_the_documented_alphabet() {
    let id = ChannelId::from_string("AZaz09_-.~").unwrap();
    assert_eq!(id.as_str(), "AZaz09_-.~");
}

#[test]
fn channel_id_rejects_traversal_attempts() {
    for name in ["..", ".", "../../etc", "a/../b"] {
        assert!(ChannelId::from_string(name).is_err(), "accepted '{name}'");
    }
}

// ---------------------------------------------------------------
// Descriptors and messages
// ---------------------------------------------------------------

#[test]
fn segment_ranges_are_half_open() {
    let seg = ChannelSegment {
        offset_begin: 6,
        offset_head: 13,
    };
    assert!(seg.contains(6));
    assert!(seg.contains(12));
    assert!(!seg.contains(13));
    assert_eq!(seg.len(), 7);
}

#[test]
fn message_frame_len_accounts_for_prefix_width() {
    // a 128-byte payload needs a 2-byte length prefix
    let msg = Message::new(0, 130, Bytes::from(vec![0u8; 128]));
    assert_eq!(msg.frame_len(), 130);
    assert_eq!(varint_len(128), 2);
}
