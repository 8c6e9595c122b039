//! Orchestrator-side client.
//!
//! Each request opens a fresh connection, writes one frame, reads at most
//! one frame back, and disconnects.
//!
//! # Example
//!
//! ```ignore
//! use hostpipe::{Client, WorkItem};
//!
//! let client = Client::new("unity_module");
//! let result = client
//!     .send(&WorkItem::new("healthcheck").with_string_data("ping"))
//!     .await?;
//! assert!(result.success);
//! ```

use crate::envelope::{WorkItem, WorkResult};
use crate::error::{HostpipeError, Result};
use crate::protocol::{read_frame, write_frame, MAX_MESSAGE_SIZE};
use crate::transport::{connect, resolve_channel_path};

/// Connects to a module's channel and exchanges single requests.
#[derive(Debug, Clone)]
pub struct Client {
    path: String,
    max_message_size: usize,
}

impl Client {
    /// Client for the endpoint a module with `channel_name` listens on.
    pub fn new(channel_name: &str) -> Self {
        Self {
            path: resolve_channel_path(channel_name),
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }

    /// Cap on the declared length of response frames.
    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Send a work item and wait for its result.
    ///
    /// # Errors
    ///
    /// [`HostpipeError::ConnectionClosed`] if the module disconnects without
    /// answering, which it does for invalid work items.
    pub async fn send(&self, item: &WorkItem) -> Result<WorkResult> {
        let payload = item.to_bytes()?;
        self.send_raw(&payload)
            .await?
            .ok_or(HostpipeError::ConnectionClosed)
    }

    /// Send an arbitrary frame payload.
    ///
    /// Returns `None` when the module closes the connection without writing
    /// a response.
    pub async fn send_raw(&self, payload: &[u8]) -> Result<Option<WorkResult>> {
        let mut stream = connect(&self.path).await?;
        write_frame(&mut stream, payload).await?;

        match read_frame(&mut stream, self.max_message_size).await {
            Ok(raw) => Ok(Some(WorkResult::from_bytes(&raw)?)),
            Err(HostpipeError::TruncatedHeader { received: 0 }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
