//! Outbound result envelope.

use serde::{Deserialize, Serialize};

use super::{null_as_default, timestamp_now};
use crate::codec::{JsonCodec, PayloadCodec};
use crate::error::Result;

/// A single outbound response.
///
/// `error_message` is non-empty exactly when `success` is false; the
/// constructors keep that pairing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkResult {
    /// Correlation id of the originating request.
    #[serde(alias = "RequestId", deserialize_with = "null_as_default")]
    pub request_id: String,
    #[serde(alias = "Success")]
    pub success: bool,
    /// Opaque payload text, empty when the handler returns nothing.
    #[serde(alias = "Data", deserialize_with = "null_as_default")]
    pub data: String,
    #[serde(alias = "ErrorMessage", deserialize_with = "null_as_default")]
    pub error_message: String,
    /// Advisory processing timestamp.
    #[serde(alias = "ProcessedAt", deserialize_with = "null_as_default")]
    pub processed_at: String,
}

impl WorkResult {
    /// A successful result with no payload.
    pub fn success(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            success: true,
            processed_at: timestamp_now(),
            ..Self::default()
        }
    }

    /// A failed result.
    ///
    /// An empty message is replaced so that failures always carry one.
    pub fn failure(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.is_empty() {
            message = "Unknown error".to_string();
        }
        Self {
            request_id: request_id.into(),
            success: false,
            error_message: message,
            processed_at: timestamp_now(),
            ..Self::default()
        }
    }

    /// Attach a UTF-8 text payload.
    pub fn with_string_data(mut self, text: &str) -> Self {
        self.data = PayloadCodec::encode_str(text);
        self
    }

    /// Attach a JSON-serialized payload.
    pub fn with_json_data<T: serde::Serialize>(mut self, value: &T) -> Result<Self> {
        self.data = PayloadCodec::encode_json(value)?;
        Ok(self)
    }

    /// Valid iff `requestId` has non-whitespace content.
    pub fn is_valid(&self) -> bool {
        !self.request_id.trim().is_empty()
    }

    /// Decode the payload as UTF-8 text.
    pub fn data_as_string(&self) -> Result<String> {
        PayloadCodec::decode_str(&self.data)
    }

    /// Decode the payload as JSON.
    pub fn data_as_json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        PayloadCodec::decode_json(&self.data)
    }

    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        JsonCodec::encode(self)
    }

    /// Parse a result from raw frame bytes.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        JsonCodec::decode(raw)
    }
}
