//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management.
//! Implements a state machine for handling fragmented frames:
//! - `WaitingForHeader`: Need at least 4 bytes
//! - `WaitingForPayload`: Length validated, need N more payload bytes
//!
//! # Example
//!
//! ```
//! use hostpipe::protocol::{encode_frame, FrameBuffer};
//!
//! let frame = encode_frame(b"{}").unwrap();
//! let mut buffer = FrameBuffer::new();
//!
//! assert!(buffer.push(&frame[..3]).unwrap().is_none());
//! let payload = buffer.push(&frame[3..]).unwrap().unwrap();
//! assert_eq!(&payload[..], b"{}");
//! ```

use bytes::{Bytes, BytesMut};

use super::wire_format::{decode_length, validate_length, LENGTH_PREFIX_SIZE, MAX_MESSAGE_SIZE};
use crate::error::{HostpipeError, Result};

/// State machine for frame parsing.
#[derive(Debug, Clone, Copy)]
enum State {
    /// Waiting for complete length prefix (need 4 bytes).
    WaitingForHeader,
    /// Length parsed, waiting for payload bytes.
    WaitingForPayload { length: usize },
}

/// Buffer for accumulating incoming bytes and extracting a complete frame.
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Maximum allowed payload size.
    max_payload_size: usize,
}

impl FrameBuffer {
    /// Create a new frame buffer with the default 10 MiB cap.
    pub fn new() -> Self {
        Self::with_max_payload(MAX_MESSAGE_SIZE)
    }

    /// Create a new frame buffer with custom max payload size.
    pub fn with_max_payload(max_payload_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(LENGTH_PREFIX_SIZE),
            state: State::WaitingForHeader,
            max_payload_size,
        }
    }

    /// Push data into the buffer and extract the next complete payload.
    ///
    /// Returns `Ok(None)` while more bytes are needed. Bytes beyond the end
    /// of a completed frame stay buffered for the next call.
    ///
    /// # Errors
    ///
    /// Returns [`HostpipeError::InvalidLength`] as soon as a complete prefix
    /// declares a length that is non-positive or above the cap.
    pub fn push(&mut self, data: &[u8]) -> Result<Option<Bytes>> {
        self.buffer.extend_from_slice(data);
        self.try_extract_one()
    }

    fn try_extract_one(&mut self) -> Result<Option<Bytes>> {
        match self.state {
            State::WaitingForHeader => {
                let Some(declared) = decode_length(&self.buffer) else {
                    return Ok(None);
                };

                let length = validate_length(declared, self.max_payload_size)?;
                let _ = self.buffer.split_to(LENGTH_PREFIX_SIZE);

                // Reserve lazily; a hostile prefix alone must not allocate the cap.
                self.buffer.reserve(length.min(64 * 1024));
                self.state = State::WaitingForPayload { length };

                self.try_extract_one()
            }

            State::WaitingForPayload { length } => {
                if self.buffer.len() < length {
                    return Ok(None);
                }

                let payload = self.buffer.split_to(length).freeze();
                self.state = State::WaitingForHeader;

                Ok(Some(payload))
            }
        }
    }

    /// Number of bytes still missing from the current frame.
    ///
    /// Reading at most this many bytes never consumes data past the frame.
    pub fn bytes_needed(&self) -> usize {
        match self.state {
            State::WaitingForHeader => LENGTH_PREFIX_SIZE.saturating_sub(self.buffer.len()),
            State::WaitingForPayload { length } => length.saturating_sub(self.buffer.len()),
        }
    }

    /// Error describing an end-of-stream in the current state.
    pub fn truncation_error(&self) -> HostpipeError {
        match self.state {
            State::WaitingForHeader => HostpipeError::TruncatedHeader {
                received: self.buffer.len(),
            },
            State::WaitingForPayload { length } => HostpipeError::TruncatedPayload {
                expected: length,
                received: self.buffer.len(),
            },
        }
    }

    /// Get the number of buffered bytes.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer and reset state.
    #[cfg(test)]
    fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::WaitingForHeader;
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::WaitingForHeader => "WaitingForHeader",
            State::WaitingForPayload { .. } => "WaitingForPayload",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode_frame;

    #[test]
    fn test_single_complete_frame() {
        let mut buffer = FrameBuffer::new();
        let frame = encode_frame(b"hello").unwrap();

        let payload = buffer.push(&frame).unwrap().unwrap();

        assert_eq!(&payload[..], b"hello");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fragmented_header() {
        let mut buffer = FrameBuffer::new();
        let frame = encode_frame(b"test").unwrap();

        assert!(buffer.push(&frame[..2]).unwrap().is_none());
        assert_eq!(buffer.state_name(), "WaitingForHeader");
        assert_eq!(buffer.bytes_needed(), 2);

        let payload = buffer.push(&frame[2..]).unwrap().unwrap();
        assert_eq!(&payload[..], b"test");
    }

    #[test]
    fn test_fragmented_payload() {
        let mut buffer = FrameBuffer::new();
        let body = b"this is a longer payload that will be fragmented";
        let frame = encode_frame(body).unwrap();

        let partial = LENGTH_PREFIX_SIZE + 10;
        assert!(buffer.push(&frame[..partial]).unwrap().is_none());
        assert_eq!(buffer.state_name(), "WaitingForPayload");
        assert_eq!(buffer.bytes_needed(), body.len() - 10);

        let payload = buffer.push(&frame[partial..]).unwrap().unwrap();
        assert_eq!(&payload[..], body);
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = FrameBuffer::new();
        let frame = encode_frame(b"hi").unwrap();

        let mut completed = Vec::new();
        for byte in frame.iter() {
            if let Some(payload) = buffer.push(&[*byte]).unwrap() {
                completed.push(payload);
            }
        }

        assert_eq!(completed.len(), 1);
        assert_eq!(&completed[0][..], b"hi");
    }

    #[test]
    fn test_zero_length_rejected() {
        let mut buffer = FrameBuffer::new();
        let err = buffer.push(&0i32.to_le_bytes()).unwrap_err();
        assert!(matches!(err, HostpipeError::InvalidLength(0)));
    }

    #[test]
    fn test_cap_is_accepted_structurally() {
        let mut buffer = FrameBuffer::new();
        let prefix = (MAX_MESSAGE_SIZE as i32).to_le_bytes();

        assert!(buffer.push(&prefix).unwrap().is_none());
        assert_eq!(buffer.state_name(), "WaitingForPayload");
        assert_eq!(buffer.bytes_needed(), MAX_MESSAGE_SIZE);
    }

    #[test]
    fn test_cap_plus_one_rejected() {
        let mut buffer = FrameBuffer::new();
        let prefix = (MAX_MESSAGE_SIZE as i32 + 1).to_le_bytes();

        let err = buffer.push(&prefix).unwrap_err();
        assert!(err.to_string().contains("Invalid message length"));
    }

    #[test]
    fn test_custom_max_payload() {
        let mut buffer = FrameBuffer::with_max_payload(8);
        assert!(buffer.push(&9i32.to_le_bytes()).is_err());
    }

    #[test]
    fn test_truncation_error_by_state() {
        let mut buffer = FrameBuffer::new();
        buffer.push(&[5, 0]).unwrap();
        assert!(matches!(
            buffer.truncation_error(),
            HostpipeError::TruncatedHeader { received: 2 }
        ));

        buffer.push(&[0, 0, b'a', b'b']).unwrap();
        assert!(matches!(
            buffer.truncation_error(),
            HostpipeError::TruncatedPayload {
                expected: 5,
                received: 2
            }
        ));
    }

    #[test]
    fn test_clear_resets_state() {
        let mut buffer = FrameBuffer::new();
        buffer.push(&[3, 0, 0, 0, b'x']).unwrap();
        assert_eq!(buffer.state_name(), "WaitingForPayload");

        buffer.clear();

        assert_eq!(buffer.state_name(), "WaitingForHeader");
        assert!(buffer.is_empty());
    }
}
