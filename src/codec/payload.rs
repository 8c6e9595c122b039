//! Opaque payload codec - binary-safe text for envelope `data` fields.
//!
//! Payload bytes are carried as standard base64 (with padding) so that any
//! binary content survives the JSON envelope.
//!
//! # Example
//!
//! ```
//! use hostpipe::codec::PayloadCodec;
//!
//! let opaque = PayloadCodec::encode_str("x");
//! assert_eq!(opaque, "eA==");
//! assert_eq!(PayloadCodec::decode_str(&opaque).unwrap(), "x");
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use super::JsonCodec;
use crate::error::Result;

/// Codec between raw bytes / UTF-8 text / structured values and opaque payload text.
pub struct PayloadCodec;

impl PayloadCodec {
    /// Encode raw bytes as opaque payload text.
    #[inline]
    pub fn encode(data: &[u8]) -> String {
        BASE64.encode(data)
    }

    /// Decode opaque payload text into raw bytes.
    #[inline]
    pub fn decode(opaque: &str) -> Result<Vec<u8>> {
        Ok(BASE64.decode(opaque)?)
    }

    /// Encode UTF-8 text as opaque payload text.
    #[inline]
    pub fn encode_str(text: &str) -> String {
        Self::encode(text.as_bytes())
    }

    /// Decode opaque payload text into UTF-8 text.
    pub fn decode_str(opaque: &str) -> Result<String> {
        Ok(String::from_utf8(Self::decode(opaque)?)?)
    }

    /// Serialize a value as JSON, then encode it as opaque payload text.
    pub fn encode_json<T: serde::Serialize>(value: &T) -> Result<String> {
        Ok(Self::encode(&JsonCodec::encode(value)?))
    }

    /// Decode opaque payload text and parse the JSON inside.
    pub fn decode_json<T: serde::de::DeserializeOwned>(opaque: &str) -> Result<T> {
        JsonCodec::decode(&Self::decode(opaque)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostpipeError;
    use serde::{Deserialize, Serialize};

    #[test]
    fn test_text_round_trip() {
        for text in ["", "Unity module healthy", "héllo wörld", "日本語テキスト", "🎮 ok"] {
            let opaque = PayloadCodec::encode_str(text);
            assert_eq!(PayloadCodec::decode_str(&opaque).unwrap(), text);
        }
    }

    #[test]
    fn test_known_encoding() {
        assert_eq!(
            PayloadCodec::encode_str("Unity module healthy"),
            "VW5pdHkgbW9kdWxlIGhlYWx0aHk="
        );
    }

    #[test]
    fn test_binary_data_preserved() {
        let all_bytes: Vec<u8> = (0..=255).collect();
        let opaque = PayloadCodec::encode(&all_bytes);
        assert_eq!(PayloadCodec::decode(&opaque).unwrap(), all_bytes);
    }

    #[test]
    fn test_invalid_base64() {
        let err = PayloadCodec::decode("not base64!!").unwrap_err();
        assert!(matches!(err, HostpipeError::Base64(_)));
    }

    #[test]
    fn test_non_utf8_payload() {
        let opaque = PayloadCodec::encode(&[0xff, 0xfe, 0xfd]);
        let err = PayloadCodec::decode_str(&opaque).unwrap_err();
        assert!(matches!(err, HostpipeError::Utf8(_)));
    }

    #[test]
    fn test_json_round_trip() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Move {
            name: String,
            x: f32,
        }

        let value = Move {
            name: "Cube".to_string(),
            x: 1.5,
        };
        let opaque = PayloadCodec::encode_json(&value).unwrap();
        let decoded: Move = PayloadCodec::decode_json(&opaque).unwrap();
        assert_eq!(decoded, value);
    }
}
