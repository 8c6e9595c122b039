//! Handler module - type-based work dispatch.
//!
//! Provides:
//! - [`TypeRouter`] - maps work item types to handlers
//! - [`RequestContext`] - correlation id and result builders for handlers
//! - the built-in handlers (`healthcheck`, `get_game_state`, `set_transform`,
//!   `execute_command`, `send_chat_to_unity`)
//!
//! # Example
//!
//! ```
//! use hostpipe::handler::TypeRouter;
//!
//! let mut router = TypeRouter::with_builtins();
//!
//! // Plain handler: sees the raw item
//! router.register("echo", |item, ctx, _host| Ok(ctx.respond(&item.data_as_string()?)));
//!
//! // Typed handler: payload decoded from JSON first
//! router.register_json("sum", |numbers: Vec<i64>, ctx, _host| {
//!     Ok(ctx.respond(&numbers.iter().sum::<i64>().to_string()))
//! });
//! ```

mod builtin;
mod context;
mod router;

pub use builtin::{register_builtins, types, TransformData, CHAT_ACK_MESSAGE, HEALTHY_MESSAGE};
pub use context::RequestContext;
pub use router::{Handler, HandlerResult, TypeRouter, TypedHandler};
