//! Built-in work handlers.

use serde::{Deserialize, Serialize};

use super::{HandlerResult, RequestContext, TypeRouter};
use crate::envelope::WorkItem;
use crate::host::{Host, Position};

/// Built-in type names.
pub mod types {
    pub const HEALTHCHECK: &str = "healthcheck";
    pub const GET_GAME_STATE: &str = "get_game_state";
    pub const SET_TRANSFORM: &str = "set_transform";
    pub const EXECUTE_COMMAND: &str = "execute_command";
    pub const SEND_CHAT: &str = "send_chat_to_unity";
}

/// Payload returned by every `healthcheck`.
pub const HEALTHY_MESSAGE: &str = "Unity module healthy";

/// Payload returned by `send_chat_to_unity`.
pub const CHAT_ACK_MESSAGE: &str = "Message processed";

/// Payload of a `set_transform` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TransformData {
    pub object_name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Register every built-in handler on `router`.
pub fn register_builtins(router: &mut TypeRouter) {
    router.register(types::HEALTHCHECK, healthcheck);
    router.register(types::GET_GAME_STATE, get_game_state);
    router.register_json(types::SET_TRANSFORM, set_transform);
    router.register(types::EXECUTE_COMMAND, execute_command);
    router.register(types::SEND_CHAT, send_chat);
}

fn healthcheck(item: &WorkItem, ctx: &RequestContext, _host: &mut dyn Host) -> HandlerResult {
    tracing::debug!(
        "Health check received: {}",
        item.data_as_string().unwrap_or_default()
    );
    Ok(ctx.respond(HEALTHY_MESSAGE))
}

fn get_game_state(_item: &WorkItem, ctx: &RequestContext, host: &mut dyn Host) -> HandlerResult {
    ctx.respond_json(&host.host_state())
}

fn set_transform(data: TransformData, ctx: &RequestContext, host: &mut dyn Host) -> HandlerResult {
    match host.find_object(&data.object_name) {
        Some(object) => {
            host.set_object_position(object, Position::new(data.x, data.y, data.z));
            Ok(ctx.ok())
        }
        None => Ok(ctx.error(format!("Object '{}' not found", data.object_name))),
    }
}

// Acknowledges only; running the command belongs to the host integration.
fn execute_command(item: &WorkItem, ctx: &RequestContext, _host: &mut dyn Host) -> HandlerResult {
    let command = payload_text(item);
    tracing::info!("Executing: {}", command);
    Ok(ctx.respond(&format!("Executed: {command}")))
}

fn send_chat(item: &WorkItem, ctx: &RequestContext, _host: &mut dyn Host) -> HandlerResult {
    let message = payload_text(item);
    tracing::info!("Chat: {}", message);
    Ok(ctx.respond(CHAT_ACK_MESSAGE))
}

/// Payload as text; an undecodable payload reads as empty.
fn payload_text(item: &WorkItem) -> String {
    item.data_as_string().unwrap_or_else(|e| {
        tracing::debug!("Payload of '{}' is not text: {}", item.kind, e);
        String::new()
    })
}
