//! Error types for hostpipe.

use thiserror::Error;

/// Main error type for all bridge operations.
#[derive(Debug, Error)]
pub enum HostpipeError {
    /// I/O error during pipe/socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error (envelopes and payloads).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Opaque payload was not valid base64.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Opaque payload decoded to bytes that are not UTF-8.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Peer closed before the 4-byte length prefix was complete.
    #[error("Truncated length prefix: received {received} of 4 bytes")]
    TruncatedHeader { received: usize },

    /// Declared frame length is non-positive or above the cap.
    #[error("Invalid message length: {0}")]
    InvalidLength(i64),

    /// Peer closed before the declared payload was complete.
    #[error("Truncated payload: received {received} of {expected} bytes")]
    TruncatedPayload { expected: usize, received: usize },

    /// Envelope parsed but failed its validity predicate.
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// Error raised by a work handler.
    #[error("{0}")]
    Handler(String),

    /// Configuration value rejected.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    /// No async runtime available to drive the listener.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// A queued dispatch callback was discarded before producing a result.
    #[error("Dispatch callback dropped before completion")]
    DispatchDropped,
}

impl HostpipeError {
    /// Whether this error only concerns the current session's framing.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            HostpipeError::TruncatedHeader { .. }
                | HostpipeError::InvalidLength(_)
                | HostpipeError::TruncatedPayload { .. }
        )
    }
}

/// Result type alias using HostpipeError.
pub type Result<T> = std::result::Result<T, HostpipeError>;
