//! Request context for handlers.
//!
//! Carries the correlation id for one dispatch and builds the results a
//! handler returns:
//! - `ok` - success with no payload
//! - `respond` - success with a text payload
//! - `respond_json` - success with a structured payload
//! - `error` - failure with a message
//!
//! # Example
//!
//! ```
//! use hostpipe::handler::RequestContext;
//!
//! let ctx = RequestContext::new("req-7", "execute_command");
//! let result = ctx.respond("Executed: ls");
//! assert_eq!(result.request_id, "req-7");
//! assert!(result.success);
//! ```

use crate::envelope::{WorkItem, WorkResult};
use crate::error::Result;

/// Context passed to work handlers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation id copied into every result.
    request_id: String,
    /// Work item type as sent by the producer.
    kind: String,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            kind: kind.into(),
        }
    }

    /// Context for `item`: its `metadata["request_id"]`, else a fresh id.
    pub fn for_item(item: &WorkItem) -> Self {
        let request_id = match item.request_id() {
            Some(id) => id.to_string(),
            None => uuid::Uuid::new_v4().to_string(),
        };
        Self::new(request_id, item.kind.clone())
    }

    #[inline]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Success without payload.
    pub fn ok(&self) -> WorkResult {
        WorkResult::success(self.request_id.as_str())
    }

    /// Success with a UTF-8 text payload.
    pub fn respond(&self, text: &str) -> WorkResult {
        self.ok().with_string_data(text)
    }

    /// Success with a JSON payload.
    pub fn respond_json<T: serde::Serialize>(&self, value: &T) -> Result<WorkResult> {
        self.ok().with_json_data(value)
    }

    /// Failure carrying `message`.
    pub fn error(&self, message: impl Into<String>) -> WorkResult {
        WorkResult::failure(self.request_id.as_str(), message)
    }
}
