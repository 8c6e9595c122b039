//! Orchestrator - drive a running module from another process.
//!
//! Sends a health check, asks for the host state, and moves an object.
//!
//! # Running
//!
//! ```text
//! cargo run --example host_loop             # in another terminal
//! cargo run --example orchestrator [channel]
//! ```

use hostpipe::config::DEFAULT_CHANNEL_NAME;
use hostpipe::handler::TransformData;
use hostpipe::{Client, StateSnapshot, WorkItem};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let channel = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CHANNEL_NAME.to_string());
    let client = Client::new(&channel);
    tracing::info!("Connecting to {}", client.path());

    let health = client
        .send(&WorkItem::new("healthcheck").with_string_data("ping"))
        .await?;
    tracing::info!("healthcheck -> {}", health.data_as_string()?);

    let state = client
        .send(&WorkItem::new("get_game_state").with_string_data("{}"))
        .await?;
    let snapshot: StateSnapshot = state.data_as_json()?;
    tracing::info!("get_game_state -> {:?}", snapshot);

    let mut transform = WorkItem::new("set_transform").with_request_id("move-player");
    transform.set_data_from_json(&TransformData {
        object_name: "Player".to_string(),
        x: 1.0,
        y: 0.5,
        z: -2.0,
    })?;
    let moved = client.send(&transform).await?;
    if moved.success {
        tracing::info!("set_transform [{}] ok", moved.request_id);
    } else {
        tracing::warn!("set_transform [{}] failed: {}", moved.request_id, moved.error_message);
    }

    Ok(())
}
