//! Inbound work envelope.
//!
//! # Example
//!
//! ```
//! use hostpipe::envelope::WorkItem;
//!
//! let mut item = WorkItem::new("execute_command").with_request_id("req-1");
//! item.set_data_from_string("spawn cube");
//!
//! let parsed = WorkItem::from_bytes(&item.to_bytes().unwrap()).unwrap();
//! assert!(parsed.is_valid());
//! assert_eq!(parsed.request_id(), Some("req-1"));
//! assert_eq!(parsed.data_as_string().unwrap(), "spawn cube");
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{null_as_default, timestamp_now};
use crate::codec::{JsonCodec, PayloadCodec};
use crate::error::{HostpipeError, Result};

/// Metadata key carrying the correlation id copied into the result.
pub const REQUEST_ID_KEY: &str = "request_id";

/// A single inbound unit of work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkItem {
    /// Producer-supplied id (advisory).
    #[serde(alias = "Id", deserialize_with = "null_as_default")]
    pub id: String,
    /// Dispatch key, compared case-insensitively.
    #[serde(rename = "type", alias = "Type", deserialize_with = "null_as_default")]
    pub kind: String,
    /// Opaque payload text.
    #[serde(alias = "Data", deserialize_with = "null_as_default")]
    pub data: String,
    /// Advisory creation timestamp, never validated.
    #[serde(
        rename = "createdAt",
        alias = "CreatedAt",
        deserialize_with = "null_as_default"
    )]
    pub created_at: String,
    /// Ancillary key/value pairs.
    #[serde(alias = "Metadata", deserialize_with = "null_as_default")]
    pub metadata: HashMap<String, String>,
}

impl WorkItem {
    /// Create an item of the given type with a fresh id and timestamp.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: kind.into(),
            created_at: timestamp_now(),
            ..Self::default()
        }
    }

    /// Set `metadata["request_id"]`.
    pub fn with_request_id(self, request_id: impl Into<String>) -> Self {
        self.with_metadata(REQUEST_ID_KEY, request_id)
    }

    /// Insert a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the payload from UTF-8 text.
    pub fn with_string_data(mut self, text: &str) -> Self {
        self.set_data_from_string(text);
        self
    }

    /// Parse an envelope from raw frame bytes.
    ///
    /// A parse failure is an explicit error; callers still need
    /// [`is_valid`](Self::is_valid) before dispatching a parsed item.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        JsonCodec::decode(raw)
    }

    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        JsonCodec::encode(self)
    }

    /// Valid iff `type` has non-whitespace content and `data` is non-empty.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Like [`is_valid`](Self::is_valid), with the reason on failure.
    pub fn validate(&self) -> Result<()> {
        if self.kind.trim().is_empty() {
            return Err(HostpipeError::InvalidEnvelope("missing type".to_string()));
        }
        if self.data.is_empty() {
            return Err(HostpipeError::InvalidEnvelope("missing data".to_string()));
        }
        Ok(())
    }

    /// Correlation id from `metadata["request_id"]`, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.metadata.get(REQUEST_ID_KEY).map(String::as_str)
    }

    /// Decode the payload as UTF-8 text.
    pub fn data_as_string(&self) -> Result<String> {
        PayloadCodec::decode_str(&self.data)
    }

    /// Decode the payload as JSON.
    pub fn data_as_json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        PayloadCodec::decode_json(&self.data)
    }

    /// Replace the payload with UTF-8 text.
    pub fn set_data_from_string(&mut self, text: &str) {
        self.data = PayloadCodec::encode_str(text);
    }

    /// Replace the payload with a JSON-serialized value.
    pub fn set_data_from_json<T: serde::Serialize>(&mut self, value: &T) -> Result<()> {
        self.data = PayloadCodec::encode_json(value)?;
        Ok(())
    }
}
