//! Protocol module - wire format and framing.
//!
//! This module implements the framing for the bridge channel:
//! - 4-byte little-endian length prefix encoding/decoding
//! - Frame buffer for accumulating partial reads
//! - Async read/write of exactly one frame

mod frame_buffer;
mod frame_io;
mod wire_format;

pub use frame_buffer::FrameBuffer;
pub use frame_io::{read_frame, write_frame};
pub use wire_format::{
    decode_length, encode_frame, encode_length, validate_length, LENGTH_PREFIX_SIZE,
    MAX_MESSAGE_SIZE,
};
