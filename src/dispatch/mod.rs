//! Dispatch module - moving work from the I/O side onto the host thread.
//!
//! - [`MainThreadQueue`] - the hand-off queue the host drains once per turn
//! - [`Dispatcher`] - routes a [`WorkItem`] through the queue and hands the
//!   [`WorkResult`] back to the awaiting session

mod queue;

pub use queue::{Callback, MainThreadQueue};

use std::future::Future;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::envelope::{WorkItem, WorkResult};
use crate::error::{HostpipeError, Result};
use crate::events::{EventBus, ModuleEvent};
use crate::handler::TypeRouter;
use crate::host::Host;

/// Queue whose callbacks receive the host collaborator.
pub type HostQueue = MainThreadQueue<dyn Host>;

/// Submits work items for execution on the host thread.
#[derive(Clone)]
pub struct Dispatcher {
    queue: HostQueue,
    router: Arc<TypeRouter>,
    events: EventBus,
}

impl Dispatcher {
    pub fn new(queue: HostQueue, router: Arc<TypeRouter>, events: EventBus) -> Self {
        Self {
            queue,
            router,
            events,
        }
    }

    /// Enqueue `item` for the host thread and return its pending result.
    ///
    /// The callback is queued before this returns; the future only waits
    /// for the host to drain it.
    ///
    /// # Errors
    ///
    /// The future resolves to [`HostpipeError::DispatchDropped`] if the
    /// queue is discarded without running the callback.
    pub fn submit(&self, item: WorkItem) -> impl Future<Output = Result<WorkResult>> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        let router = Arc::clone(&self.router);
        let events = self.events.clone();

        self.queue.enqueue(move |host| {
            events.emit(ModuleEvent::WorkItemReceived(item.clone()));
            let result = router.dispatch(&item, host);
            if tx.send(result).is_err() {
                tracing::debug!("Session closed before result for '{}' was ready", item.kind);
            }
        });

        async move { rx.await.map_err(|_| HostpipeError::DispatchDropped) }
    }

    /// The queue the host must drain.
    pub fn queue(&self) -> &HostQueue {
        &self.queue
    }

    pub fn router(&self) -> &TypeRouter {
        &self.router
    }
}
