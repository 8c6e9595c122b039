//! Module configuration.
//!
//! # Example
//!
//! ```
//! use hostpipe::ModuleConfig;
//!
//! let config = ModuleConfig::from_json_str(r#"{"channel_name": "editor_bridge"}"#).unwrap();
//! assert_eq!(config.channel_name, "editor_bridge");
//! assert_eq!(config.module_name, "UnityModule");
//! assert!(config.auto_start);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HostpipeError, Result};
use crate::protocol::MAX_MESSAGE_SIZE;

/// Default module label.
pub const DEFAULT_MODULE_NAME: &str = "UnityModule";

/// Default channel name.
pub const DEFAULT_CHANNEL_NAME: &str = "unity_module";

/// Default back-off before re-creating a failed endpoint.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Configuration for a [`PipeModule`](crate::PipeModule).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Label used in logs.
    pub module_name: String,
    /// Endpoint identity; see [`resolve_channel_path`](crate::transport::resolve_channel_path).
    pub channel_name: String,
    /// Start listening as soon as the host wiring attaches the module.
    pub auto_start: bool,
    /// Advisory; carried for host wiring, not enforced by the bridge.
    pub health_check_interval_secs: f32,
    /// Advisory; carried for host wiring, not enforced by the bridge.
    pub connection_timeout_secs: f32,
    /// Back-off before the endpoint is re-created after a failure.
    pub retry_delay_ms: u64,
    /// Largest accepted declared frame length.
    pub max_message_size: usize,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            module_name: DEFAULT_MODULE_NAME.to_string(),
            channel_name: DEFAULT_CHANNEL_NAME.to_string(),
            auto_start: true,
            health_check_interval_secs: 10.0,
            connection_timeout_secs: 5.0,
            retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}

impl ModuleConfig {
    /// Parse a JSON configuration; missing keys take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check the values the bridge depends on.
    pub fn validate(&self) -> Result<()> {
        if self.channel_name.trim().is_empty() {
            return Err(HostpipeError::Config("channel_name must not be empty".to_string()));
        }
        if self.max_message_size == 0 || self.max_message_size > i32::MAX as usize {
            return Err(HostpipeError::Config(format!(
                "max_message_size {} out of range",
                self.max_message_size
            )));
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
