//! Notifications the module raises for its host wiring.
//!
//! Events are fire-and-notify: emitting never blocks and never fails, and
//! nothing in the bridge waits on subscribers.

use tokio::sync::broadcast;

use crate::envelope::WorkItem;

/// Buffered events per subscriber before the oldest are skipped.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Module lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleStatus {
    Started,
    Stopped,
}

/// An event raised by the module.
#[derive(Debug, Clone)]
pub enum ModuleEvent {
    /// A valid work item is about to be dispatched on the host thread.
    WorkItemReceived(WorkItem),
    /// A transport, framing, envelope or write failure.
    Error(String),
    /// The module was started or stopped.
    StatusChanged(ModuleStatus),
}

/// Broadcast sender shared by the module, listener and dispatch callbacks.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ModuleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Emit an event to current subscribers, if any.
    pub fn emit(&self, event: ModuleEvent) {
        let _ = self.tx.send(event);
    }

    /// Emit an [`ModuleEvent::Error`].
    pub fn error(&self, message: impl Into<String>) {
        self.emit(ModuleEvent::Error(message.into()));
    }

    /// Subscribe to events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ModuleEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
