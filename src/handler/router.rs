//! Type router for dispatching work items by their `type`.
//!
//! The router maps lower-cased type names to handlers. Dispatch always yields
//! exactly one [`WorkResult`]: handler errors, payload decode errors, panics
//! and unknown types all become failure results carrying a message.
//!
//! # Example
//!
//! ```
//! use hostpipe::handler::TypeRouter;
//!
//! let mut router = TypeRouter::new();
//! router.register("ping", |_item, ctx, _host| Ok(ctx.respond("pong")));
//!
//! assert!(router.contains("PING"));
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};

use serde::de::DeserializeOwned;

use super::RequestContext;
use crate::envelope::{WorkItem, WorkResult};
use crate::error::Result;
use crate::host::Host;

/// Result type for handler functions.
pub type HandlerResult = Result<WorkResult>;

/// Trait for work handlers.
///
/// Handlers run on the host thread and may touch host state freely.
pub trait Handler: Send + Sync + 'static {
    /// Handle one work item.
    fn call(&self, item: &WorkItem, ctx: &RequestContext, host: &mut dyn Host) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&WorkItem, &RequestContext, &mut dyn Host) -> HandlerResult + Send + Sync + 'static,
{
    fn call(&self, item: &WorkItem, ctx: &RequestContext, host: &mut dyn Host) -> HandlerResult {
        self(item, ctx, host)
    }
}

/// Wrapper that decodes the JSON payload before calling the handler.
pub struct TypedHandler<F, T>
where
    F: Fn(T, &RequestContext, &mut dyn Host) -> HandlerResult + Send + Sync + 'static,
    T: DeserializeOwned + 'static,
{
    handler: F,
    _phantom: PhantomData<fn() -> T>,
}

impl<F, T> TypedHandler<F, T>
where
    F: Fn(T, &RequestContext, &mut dyn Host) -> HandlerResult + Send + Sync + 'static,
    T: DeserializeOwned + 'static,
{
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<F, T> Handler for TypedHandler<F, T>
where
    F: Fn(T, &RequestContext, &mut dyn Host) -> HandlerResult + Send + Sync + 'static,
    T: DeserializeOwned + 'static,
{
    fn call(&self, item: &WorkItem, ctx: &RequestContext, host: &mut dyn Host) -> HandlerResult {
        let parsed: T = item.data_as_json()?;
        (self.handler)(parsed, ctx, host)
    }
}

/// Router mapping work item types to handlers.
pub struct TypeRouter {
    /// Handlers by lower-cased type.
    handlers: HashMap<String, Box<dyn Handler>>,
}

impl TypeRouter {
    /// Create a router with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Create a router with the built-in handlers registered.
    pub fn with_builtins() -> Self {
        let mut router = Self::new();
        super::builtin::register_builtins(&mut router);
        router
    }

    /// Register a handler for `kind`, replacing any previous one.
    pub fn register<F>(&mut self, kind: &str, handler: F)
    where
        F: Fn(&WorkItem, &RequestContext, &mut dyn Host) -> HandlerResult + Send + Sync + 'static,
    {
        self.insert(kind, Box::new(handler));
    }

    /// Register a handler whose payload is decoded from JSON first.
    pub fn register_json<F, T>(&mut self, kind: &str, handler: F)
    where
        F: Fn(T, &RequestContext, &mut dyn Host) -> HandlerResult + Send + Sync + 'static,
        T: DeserializeOwned + 'static,
    {
        self.insert(kind, Box::new(TypedHandler::new(handler)));
    }

    /// Register any [`Handler`] implementation for `kind`.
    pub fn register_handler(&mut self, kind: &str, handler: impl Handler) {
        self.insert(kind, Box::new(handler));
    }

    fn insert(&mut self, kind: &str, handler: Box<dyn Handler>) {
        if self.handlers.insert(kind.to_lowercase(), handler).is_some() {
            tracing::debug!("Replaced handler for type '{}'", kind);
        }
    }

    /// Check whether a handler exists for `kind` (case-insensitive).
    pub fn contains(&self, kind: &str) -> bool {
        self.handlers.contains_key(&kind.to_lowercase())
    }

    /// Registered types, sorted.
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Route `item` to its handler and produce its result.
    ///
    /// Must run on the host thread.
    pub fn dispatch(&self, item: &WorkItem, host: &mut dyn Host) -> WorkResult {
        let ctx = RequestContext::for_item(item);

        let Some(handler) = self.handlers.get(&item.kind.to_lowercase()) else {
            return ctx.error(format!("Unknown type: {}", item.kind));
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.call(item, &ctx, host)));

        match outcome {
            Ok(Ok(mut result)) => {
                result.request_id = ctx.request_id().to_string();
                if !result.success && result.error_message.is_empty() {
                    result.error_message = "Unknown error".to_string();
                }
                result
            }
            Ok(Err(e)) => {
                tracing::warn!("Handler for '{}' failed: {}", item.kind, e);
                ctx.error(e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!("Handler for '{}' panicked: {}", item.kind, message);
                ctx.error(message)
            }
        }
    }
}

impl Default for TypeRouter {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Handler panicked".to_string()
    }
}
