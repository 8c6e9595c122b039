//! Wire format encoding and decoding.
//!
//! Every message on the channel is a single length-prefixed frame:
//! ```text
//! ┌──────────────┬──────────────────────────────┐
//! │ Length (L)   │ Envelope                     │
//! │ 4 bytes      │ L bytes (UTF-8 JSON)         │
//! │ int32 LE     │                              │
//! └──────────────┴──────────────────────────────┘
//! ```
//!
//! The prefix is read as a signed 32-bit integer so that a peer sending a
//! negative length is rejected rather than reinterpreted as a huge one.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{HostpipeError, Result};

/// Length prefix size in bytes (fixed, exactly 4).
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default maximum declared payload length (10 MiB).
pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Encode a payload length as a little-endian prefix.
///
/// # Errors
///
/// Returns [`HostpipeError::InvalidLength`] if the length does not fit in an `i32`.
///
/// # Example
///
/// ```
/// use hostpipe::protocol::encode_length;
///
/// assert_eq!(encode_length(258).unwrap(), [0x02, 0x01, 0x00, 0x00]);
/// ```
pub fn encode_length(len: usize) -> Result<[u8; LENGTH_PREFIX_SIZE]> {
    let len = i32::try_from(len).map_err(|_| HostpipeError::InvalidLength(len as i64))?;
    Ok(len.to_le_bytes())
}

/// Decode a length prefix from bytes.
///
/// Returns `None` if buffer is too short.
pub fn decode_length(buf: &[u8]) -> Option<i32> {
    let prefix: [u8; LENGTH_PREFIX_SIZE] = buf.get(..LENGTH_PREFIX_SIZE)?.try_into().ok()?;
    Some(i32::from_le_bytes(prefix))
}

/// Check a declared length against protocol bounds.
///
/// A length of exactly `max_payload_size` is accepted; zero, negative and
/// anything above the cap are rejected.
pub fn validate_length(declared: i32, max_payload_size: usize) -> Result<usize> {
    match usize::try_from(declared) {
        Ok(len) if len > 0 && len <= max_payload_size => Ok(len),
        _ => Err(HostpipeError::InvalidLength(declared as i64)),
    }
}

/// Build a complete frame: length prefix followed by the payload.
pub fn encode_frame(payload: &[u8]) -> Result<Bytes> {
    let prefix = encode_length(payload.len())?;
    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.put_slice(&prefix);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_little_endian_byte_order() {
        let bytes = encode_length(0x0403_0201).unwrap();
        assert_eq!(bytes, [0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_decode_length_too_short_buffer() {
        assert!(decode_length(&[0x01, 0x00]).is_none());
        assert!(decode_length(&[]).is_none());
    }

    #[test]
    fn test_decode_negative_length() {
        let bytes = (-1i32).to_le_bytes();
        assert_eq!(decode_length(&bytes), Some(-1));
        assert!(validate_length(-1, MAX_MESSAGE_SIZE).is_err());
    }

    #[test]
    fn test_validate_zero_rejected() {
        let err = validate_length(0, MAX_MESSAGE_SIZE).unwrap_err();
        assert!(matches!(err, HostpipeError::InvalidLength(0)));
    }

    #[test]
    fn test_validate_cap_boundary() {
        let cap = MAX_MESSAGE_SIZE as i32;
        assert_eq!(validate_length(cap, MAX_MESSAGE_SIZE).unwrap(), MAX_MESSAGE_SIZE);
        assert!(validate_length(cap + 1, MAX_MESSAGE_SIZE).is_err());
    }

    #[test]
    fn test_encode_frame_layout() {
        let frame = encode_frame(b"hello").unwrap();
        assert_eq!(frame.len(), LENGTH_PREFIX_SIZE + 5);
        assert_eq!(&frame[..4], &[5, 0, 0, 0]);
        assert_eq!(&frame[4..], b"hello");
    }

    #[test]
    fn test_encode_length_overflow() {
        let too_big = i32::MAX as usize + 1;
        assert!(encode_length(too_big).is_err());
    }
}
