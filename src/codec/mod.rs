//! Codec module - serialization for envelopes and opaque payloads.
//!
//! - [`JsonCodec`] - UTF-8 JSON using `serde_json`, for envelopes and structured payloads
//! - [`PayloadCodec`] - base64 text for the opaque `data` field of envelopes
//!
//! # Design
//!
//! Codecs are implemented as marker structs with static methods rather than trait objects.
//!
//! # Example
//!
//! ```
//! use hostpipe::codec::{JsonCodec, PayloadCodec};
//!
//! let encoded = JsonCodec::encode(&"hello").unwrap();
//! let decoded: String = JsonCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, "hello");
//!
//! let opaque = PayloadCodec::encode_json(&[1, 2, 3]).unwrap();
//! let numbers: Vec<i32> = PayloadCodec::decode_json(&opaque).unwrap();
//! assert_eq!(numbers, vec![1, 2, 3]);
//! ```

mod json;
mod payload;

pub use json::JsonCodec;
pub use payload::PayloadCodec;
