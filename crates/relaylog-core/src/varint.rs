//! Variable-length Integer Encoding (Varint)
//!
//! Unsigned LEB128 encoding for the message length prefixes in segment
//! bodies. Instead of always spending 8 bytes on a u64, a varint uses only
//! as many bytes as the value needs:
//!
//! - Values 0-127 use 1 byte
//! - Larger values use 2-10 bytes depending on magnitude
//! - Each byte carries 7 bits of payload; the high bit is a continuation flag
//!
//! Message payloads are usually small, so the typical frame overhead is a
//! single byte.
//!
//! Decoding works on a byte slice and distinguishes two failure modes: the
//! slice ended mid-value (the caller may have more bytes to offer), and the
//! value overflowed 64 bits, which is corruption.

use bytes::BufMut;

use crate::error::{Error, Result};

/// Maximum encoded width of a u64: ceil(64 / 7) bytes.
pub const MAX_VARINT_LEN: usize = 10;

/// Encode an unsigned integer as a varint.
pub fn encode_varint(buf: &mut impl BufMut, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;

        if value != 0 {
            byte |= 0x80;
        }

        buf.put_u8(byte);

        if value == 0 {
            break;
        }
    }
}

/// Decode a varint from the front of `buf`.
///
/// Returns `Ok(Some((value, encoded_len)))` on success and `Ok(None)` when
/// the slice ends before the value is complete. A value that doesn't fit in
/// 64 bits is an error.
pub fn decode_varint(buf: &[u8]) -> Result<Option<(u64, usize)>> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;

    for (i, &byte) in buf.iter().enumerate() {
        let bits = (byte & 0x7F) as u64;

        if shift >= 64 || (shift == 63 && bits > 1) {
            return Err(Error::VarintOverflow);
        }

        value |= bits << shift;

        if byte & 0x80 == 0 {
            return Ok(Some((value, i + 1)));
        }

        shift += 7;
    }

    Ok(None)
}

/// The number of bytes `encode_varint` produces for `value`.
pub fn varint_len(value: u64) -> usize {
    let mut len = 1;
    let mut rest = value >> 7;
    while rest != 0 {
        len += 1;
        rest >>= 7;
    }
    len
}
