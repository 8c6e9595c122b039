//! Module builder and lifecycle.
//!
//! The [`PipeModuleBuilder`] collects configuration and extra handlers. The
//! [`PipeModule`] owns the background listener and the host queue:
//! 1. `start()` spawns the listener on the ambient tokio runtime
//! 2. the host calls `run_pending()` once per main-loop turn
//! 3. `stop()` cancels the listener and waits for it to unwind
//!
//! # Example
//!
//! ```ignore
//! use hostpipe::PipeModule;
//!
//! let mut module = PipeModule::builder()
//!     .channel_name("editor_bridge")
//!     .handle("ping", |_item, ctx, _host| Ok(ctx.respond("pong")))
//!     .build()?;
//!
//! module.start()?;
//! loop {
//!     module.run_pending(&mut host);
//!     // ... rest of the frame
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::ModuleConfig;
use crate::dispatch::{Dispatcher, HostQueue};
use crate::envelope::{WorkItem, WorkResult};
use crate::error::{HostpipeError, Result};
use crate::events::{EventBus, ModuleEvent, ModuleStatus};
use crate::handler::{Handler, HandlerResult, RequestContext, TypeRouter};
use crate::host::Host;
use crate::listener::{Listener, ListenerState};

/// Builder for a [`PipeModule`].
///
/// Starts with the default configuration and the built-in handlers.
pub struct PipeModuleBuilder {
    config: ModuleConfig,
    router: TypeRouter,
}

impl PipeModuleBuilder {
    pub fn new() -> Self {
        Self {
            config: ModuleConfig::default(),
            router: TypeRouter::with_builtins(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ModuleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn module_name(mut self, name: impl Into<String>) -> Self {
        self.config.module_name = name.into();
        self
    }

    pub fn channel_name(mut self, name: impl Into<String>) -> Self {
        self.config.channel_name = name.into();
        self
    }

    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.config.auto_start = auto_start;
        self
    }

    /// Back-off before a failed endpoint is re-created.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Register a handler for a work type, replacing any existing one.
    pub fn handle<F>(mut self, kind: &str, handler: F) -> Self
    where
        F: Fn(&WorkItem, &RequestContext, &mut dyn Host) -> HandlerResult + Send + Sync + 'static,
    {
        self.router.register(kind, handler);
        self
    }

    /// Register a handler whose payload is decoded from JSON first.
    pub fn handle_json<F, T>(mut self, kind: &str, handler: F) -> Self
    where
        F: Fn(T, &RequestContext, &mut dyn Host) -> HandlerResult + Send + Sync + 'static,
        T: DeserializeOwned + 'static,
    {
        self.router.register_json(kind, handler);
        self
    }

    /// Register a prebuilt [`Handler`].
    pub fn handler(mut self, kind: &str, handler: impl Handler) -> Self {
        self.router.register_handler(kind, handler);
        self
    }

    /// Validate the configuration and build the module (not yet started).
    pub fn build(self) -> Result<PipeModule> {
        self.config.validate()?;

        let events = EventBus::new();
        let dispatcher = Dispatcher::new(HostQueue::new(), Arc::new(self.router), events.clone());
        let (state, _) = watch::channel(ListenerState::Stopped);

        Ok(PipeModule {
            config: self.config,
            dispatcher,
            events,
            state: Arc::new(state),
            running: None,
        })
    }
}

impl Default for PipeModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct Running {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// The bridge: a background listener feeding a host-drained queue.
pub struct PipeModule {
    config: ModuleConfig,
    dispatcher: Dispatcher,
    events: EventBus,
    state: Arc<watch::Sender<ListenerState>>,
    running: Option<Running>,
}

impl PipeModule {
    pub fn builder() -> PipeModuleBuilder {
        PipeModuleBuilder::new()
    }

    /// Start the listener on the current tokio runtime.
    ///
    /// Starting a running module is a no-op.
    ///
    /// # Errors
    ///
    /// [`HostpipeError::Runtime`] when called outside a tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        let handle = Handle::try_current().map_err(|e| HostpipeError::Runtime(e.to_string()))?;
        self.start_on(&handle)
    }

    /// Start the listener on a specific runtime.
    ///
    /// Lets a host whose main thread is not a runtime worker keep the
    /// runtime on a side thread.
    pub fn start_on(&mut self, runtime: &Handle) -> Result<()> {
        if self.is_running() {
            tracing::warn!("{} already running", self.config.module_name);
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let listener = Listener::new(
            &self.config,
            self.dispatcher.clone(),
            self.events.clone(),
            Arc::clone(&self.state),
        );
        let span = tracing::info_span!("module", name = %self.config.module_name);
        let task = runtime.spawn(listener.run(cancel.clone()).instrument(span));

        self.running = Some(Running { cancel, task });

        tracing::info!(
            "{} started on channel '{}' (health check {}s, timeout {}s)",
            self.config.module_name,
            self.config.channel_name,
            self.config.health_check_interval_secs,
            self.config.connection_timeout_secs
        );
        self.events
            .emit(ModuleEvent::StatusChanged(ModuleStatus::Started));
        Ok(())
    }

    /// Start only if `auto_start` is configured. Returns whether it started.
    pub fn start_if_auto(&mut self) -> Result<bool> {
        if !self.config.auto_start {
            return Ok(false);
        }
        self.start()?;
        Ok(true)
    }

    /// Cancel the listener and wait for the endpoint to be released.
    ///
    /// Stopping a stopped module is a no-op.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        running.cancel.cancel();
        if let Err(e) = running.task.await {
            tracing::error!("Listener task failed: {}", e);
        }

        self.stopped();
    }

    /// Cancel the listener without waiting for it.
    ///
    /// For host shutdown paths that cannot await; the endpoint is released
    /// shortly after on the runtime.
    pub fn request_stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        running.cancel.cancel();
        self.stopped();
    }

    fn stopped(&self) {
        tracing::info!("{} stopped", self.config.module_name);
        self.events
            .emit(ModuleEvent::StatusChanged(ModuleStatus::Stopped));
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    /// Run every callback queued so far against `host`.
    ///
    /// Call once per main-loop turn from the host thread. Returns the number
    /// of callbacks run.
    pub fn run_pending<H>(&self, host: &mut H) -> usize
    where
        H: Host + 'static,
    {
        self.dispatcher.queue().drain_and_run_all(host)
    }

    /// Queue the host drains; clone it to drain from another owner.
    pub fn queue(&self) -> &HostQueue {
        self.dispatcher.queue()
    }

    /// Dispatch an item through the queue without going over the channel.
    ///
    /// The result arrives after the next host turn.
    pub async fn submit(&self, item: WorkItem) -> Result<WorkResult> {
        self.dispatcher.submit(item).await
    }

    /// Subscribe to module events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ModuleEvent> {
        self.events.subscribe()
    }

    pub fn listener_state(&self) -> ListenerState {
        *self.state.borrow()
    }

    /// Watch listener state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ListenerState> {
        self.state.subscribe()
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn router(&self) -> &TypeRouter {
        self.dispatcher.router()
    }
}

impl Drop for PipeModule {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::types;

    #[test]
    fn test_builder_defaults() {
        let module = PipeModule::builder().build().unwrap();

        assert_eq!(module.config(), &ModuleConfig::default());
        assert!(module.router().contains(types::HEALTHCHECK));
        assert!(!module.is_running());
        assert_eq!(module.listener_state(), ListenerState::Stopped);
    }

    #[test]
    fn test_builder_overrides() {
        let module = PipeModule::builder()
            .module_name("Editor")
            .channel_name("editor_bridge")
            .auto_start(false)
            .retry_delay(Duration::from_millis(20))
            .handle("ping", |_item: &WorkItem, ctx: &RequestContext, _host: &mut dyn Host| {
                Ok(ctx.respond("pong"))
            })
            .build()
            .unwrap();

        assert_eq!(module.config().module_name, "Editor");
        assert_eq!(module.config().channel_name, "editor_bridge");
        assert_eq!(module.config().retry_delay_ms, 20);
        assert!(module.router().contains("ping"));
    }

    #[test]
    fn test_retry_delay_saturates() {
        let module = PipeModule::builder()
            .retry_delay(Duration::MAX)
            .build()
            .unwrap();

        assert_eq!(module.config().retry_delay_ms, u64::MAX);
    }

    #[test]
    fn test_builder_rejects_empty_channel() {
        let result = PipeModule::builder().channel_name("").build();
        assert!(matches!(result, Err(HostpipeError::Config(_))));
    }

    #[test]
    fn test_start_outside_runtime() {
        let mut module = PipeModule::builder().build().unwrap();
        assert!(matches!(module.start(), Err(HostpipeError::Runtime(_))));
        assert!(!module.is_running());
    }

    #[tokio::test]
    async fn test_start_if_auto_disabled() {
        let mut module = PipeModule::builder().auto_start(false).build().unwrap();
        assert!(!module.start_if_auto().unwrap());
        assert!(!module.is_running());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_start_stop_status_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("module.sock").to_string_lossy().into_owned();

        let mut module = PipeModule::builder().channel_name(&path).build().unwrap();
        let mut events = module.subscribe();

        module.start().unwrap();
        assert!(module.is_running());
        module.stop().await;

        assert!(!module.is_running());
        assert_eq!(module.listener_state(), ListenerState::Stopped);
        assert!(!std::path::Path::new(&path).exists());
        assert!(matches!(
            events.recv().await.unwrap(),
            ModuleEvent::StatusChanged(ModuleStatus::Started)
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            ModuleEvent::StatusChanged(ModuleStatus::Stopped)
        ));
    }

    #[tokio::test]
    async fn test_stop_when_stopped_is_noop() {
        let mut module = PipeModule::builder().build().unwrap();
        let mut events = module.subscribe();

        module.stop().await;
        module.request_stop();

        assert!(events.try_recv().is_err());
    }
}
