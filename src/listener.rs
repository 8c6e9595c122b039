//! Connection listener and per-connection sessions.
//!
//! The listener owns the endpoint and services one peer at a time:
//! 1. Create the endpoint for the configured channel
//! 2. Accept a single connection
//! 3. Run one [`Session`]: read a frame, dispatch through the host queue,
//!    write the result
//! 4. Disconnect and accept again
//!
//! Endpoint failures tear the endpoint down and re-create it after a fixed
//! back-off, until the cancellation token fires.
//!
//! ```text
//! Stopped ─► Starting ─► Listening ─► Connected ─┐
//!               ▲            ▲                   │
//!               │            └───────────────────┘
//!               └── back-off ◄── endpoint error
//! (cancel) ─► Stopping ─► Stopped
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::ModuleConfig;
use crate::dispatch::Dispatcher;
use crate::envelope::{WorkItem, WorkResult};
use crate::error::{HostpipeError, Result};
use crate::events::EventBus;
use crate::protocol::{read_frame, write_frame};
use crate::transport::{resolve_channel_path, PipeListener};

/// Listener lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Stopped,
    /// Creating the endpoint (also after a back-off).
    Starting,
    /// Endpoint up, waiting for a peer.
    Listening,
    /// Servicing one session.
    Connected,
    Stopping,
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// Exactly one result was written.
    Responded { request_id: String },
    /// Framing, envelope or dispatch failure; nothing was written.
    Abandoned(HostpipeError),
    /// The result could not be written.
    WriteFailed(HostpipeError),
    /// Stopped before a response was written.
    Cancelled,
}

/// One accept-to-disconnect exchange over a connected stream.
pub struct Session<S> {
    stream: S,
    dispatcher: Dispatcher,
    max_message_size: usize,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, dispatcher: Dispatcher, max_message_size: usize) -> Self {
        Self {
            stream,
            dispatcher,
            max_message_size,
        }
    }

    /// Run the exchange, then disconnect whatever the outcome.
    pub async fn run(mut self, cancel: &CancellationToken) -> SessionOutcome {
        let outcome = self.exchange(cancel).await;
        let _ = self.stream.shutdown().await;
        outcome
    }

    async fn exchange(&mut self, cancel: &CancellationToken) -> SessionOutcome {
        let raw = tokio::select! {
            _ = cancel.cancelled() => return SessionOutcome::Cancelled,
            read = read_frame(&mut self.stream, self.max_message_size) => match read {
                Ok(raw) => raw,
                Err(e) => return SessionOutcome::Abandoned(e),
            },
        };

        tracing::debug!("Received raw data: {}", String::from_utf8_lossy(&raw));

        let item = match parse_work_item(&raw) {
            Ok(item) => item,
            Err(e) => return SessionOutcome::Abandoned(e),
        };

        tracing::info!("Received: {}", item.kind);

        let pending = self.dispatcher.submit(item);
        let result = tokio::select! {
            _ = cancel.cancelled() => return SessionOutcome::Cancelled,
            result = pending => match result {
                Ok(result) => result,
                Err(e) => return SessionOutcome::Abandoned(e),
            },
        };

        let request_id = result.request_id.clone();
        tokio::select! {
            _ = cancel.cancelled() => SessionOutcome::Cancelled,
            written = self.respond(&result) => match written {
                Ok(()) => SessionOutcome::Responded { request_id },
                Err(e) => SessionOutcome::WriteFailed(e),
            },
        }
    }

    async fn respond(&mut self, result: &WorkResult) -> Result<()> {
        let bytes = result.to_bytes()?;
        write_frame(&mut self.stream, &bytes).await
    }
}

fn parse_work_item(raw: &[u8]) -> Result<WorkItem> {
    let item = WorkItem::from_bytes(raw)?;
    item.validate()?;
    Ok(item)
}

/// Accept loop with retry-forever endpoint management.
pub struct Listener {
    channel_name: String,
    path: String,
    retry_delay: Duration,
    max_message_size: usize,
    dispatcher: Dispatcher,
    events: EventBus,
    state: Arc<watch::Sender<ListenerState>>,
}

impl Listener {
    pub fn new(
        config: &ModuleConfig,
        dispatcher: Dispatcher,
        events: EventBus,
        state: Arc<watch::Sender<ListenerState>>,
    ) -> Self {
        Self {
            channel_name: config.channel_name.clone(),
            path: resolve_channel_path(&config.channel_name),
            retry_delay: config.retry_delay(),
            max_message_size: config.max_message_size,
            dispatcher,
            events,
            state,
        }
    }

    /// Serve until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        while !cancel.is_cancelled() {
            self.set_state(ListenerState::Starting);

            let Err(e) = self.serve(&cancel).await else {
                break;
            };

            tracing::error!("Server error: {}", e);
            self.events.error(format!("Server error: {e}"));

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.retry_delay) => {}
            }
        }

        self.set_state(ListenerState::Stopping);
        self.set_state(ListenerState::Stopped);
    }

    /// Returns `Ok(())` only on cancellation; the endpoint is dropped on every path.
    async fn serve(&self, cancel: &CancellationToken) -> Result<()> {
        let mut endpoint = PipeListener::bind(&self.path).await?;

        loop {
            self.set_state(ListenerState::Listening);
            tracing::info!(
                "Waiting for orchestrator connection on '{}' ({})...",
                self.channel_name,
                endpoint.path()
            );

            let stream = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                accepted = endpoint.accept() => accepted?,
            };

            self.set_state(ListenerState::Connected);
            tracing::info!("Orchestrator connected");

            let session = Session::new(stream, self.dispatcher.clone(), self.max_message_size);
            let outcome = session.run(cancel).await;
            self.report(outcome);

            if cancel.is_cancelled() {
                return Ok(());
            }
        }
    }

    fn report(&self, outcome: SessionOutcome) {
        match outcome {
            SessionOutcome::Responded { request_id } => {
                tracing::info!("Response sent: {}", request_id);
            }
            SessionOutcome::Abandoned(e) if e.is_framing() => {
                tracing::warn!("Invalid frame: {}", e);
                self.events.error(format!("Invalid frame: {e}"));
            }
            SessionOutcome::Abandoned(e) => {
                tracing::warn!("Invalid work item received: {}", e);
                self.events.error(format!("Invalid work item received: {e}"));
            }
            SessionOutcome::WriteFailed(e) => {
                tracing::error!("Response error: {}", e);
                self.events.error(format!("Response error: {e}"));
            }
            SessionOutcome::Cancelled => {
                tracing::debug!("Session cancelled");
            }
        }
    }

    fn set_state(&self, state: ListenerState) {
        self.state.send_replace(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::HostQueue;
    use crate::handler::TypeRouter;
    use crate::host::{Host, ObjectRef, Position, StateSnapshot};
    use crate::protocol::MAX_MESSAGE_SIZE;
    use tokio::io::{duplex, AsyncReadExt, DuplexStream};
    use tokio::task::JoinHandle;

    struct IdleHost;

    impl Host for IdleHost {
        fn host_state(&self) -> StateSnapshot {
            StateSnapshot::default()
        }

        fn find_object(&self, _name: &str) -> Option<ObjectRef> {
            None
        }

        fn set_object_position(&mut self, _object: ObjectRef, _position: Position) {}
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            HostQueue::new(),
            Arc::new(TypeRouter::with_builtins()),
            EventBus::new(),
        )
    }

    fn spawn_host_turns(queue: HostQueue) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut host = IdleHost;
            loop {
                queue.drain_and_run_all(&mut host);
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
    }

    fn spawn_session(
        server: DuplexStream,
        dispatcher: Dispatcher,
        cancel: CancellationToken,
    ) -> JoinHandle<SessionOutcome> {
        tokio::spawn(async move {
            Session::new(server, dispatcher, MAX_MESSAGE_SIZE)
                .run(&cancel)
                .await
        })
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let dispatcher = dispatcher();
        let turns = spawn_host_turns(dispatcher.queue().clone());
        let (mut client, server) = duplex(4096);
        let session = spawn_session(server, dispatcher, CancellationToken::new());

        let item = WorkItem::new("healthcheck")
            .with_string_data("x")
            .with_request_id("s-1");
        write_frame(&mut client, &item.to_bytes().unwrap()).await.unwrap();

        let raw = read_frame(&mut client, MAX_MESSAGE_SIZE).await.unwrap();
        let result = WorkResult::from_bytes(&raw).unwrap();
        assert!(result.success);
        assert_eq!(result.request_id, "s-1");

        match session.await.unwrap() {
            SessionOutcome::Responded { request_id } => assert_eq!(request_id, "s-1"),
            other => panic!("unexpected outcome: {other:?}"),
        }

        // Disconnected after the single exchange.
        let mut rest = Vec::new();
        assert_eq!(client.read_to_end(&mut rest).await.unwrap(), 0);
        turns.abort();
    }

    #[tokio::test]
    async fn test_invalid_item_gets_no_response() {
        let dispatcher = dispatcher();
        let (mut client, server) = duplex(4096);
        let session = spawn_session(server, dispatcher.clone(), CancellationToken::new());

        let blank_data = br#"{"type":"healthcheck","data":""}"#;
        write_frame(&mut client, blank_data).await.unwrap();

        let outcome = session.await.unwrap();
        assert!(matches!(
            outcome,
            SessionOutcome::Abandoned(HostpipeError::InvalidEnvelope(_))
        ));
        assert!(dispatcher.queue().is_empty());

        let mut rest = Vec::new();
        assert_eq!(client.read_to_end(&mut rest).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unparseable_item_gets_no_response() {
        let (mut client, server) = duplex(4096);
        let session = spawn_session(server, dispatcher(), CancellationToken::new());

        write_frame(&mut client, b"{{{{").await.unwrap();

        assert!(matches!(
            session.await.unwrap(),
            SessionOutcome::Abandoned(HostpipeError::Json(_))
        ));
        let mut rest = Vec::new();
        assert_eq!(client.read_to_end(&mut rest).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_short_header_abandons_session() {
        let (mut client, server) = duplex(4096);
        let session = spawn_session(server, dispatcher(), CancellationToken::new());

        client.write_all(&[9, 0]).await.unwrap();
        client.shutdown().await.unwrap();

        assert!(matches!(
            session.await.unwrap(),
            SessionOutcome::Abandoned(HostpipeError::TruncatedHeader { received: 2 })
        ));
    }

    #[tokio::test]
    async fn test_cancel_while_awaiting_host() {
        let dispatcher = dispatcher();
        let cancel = CancellationToken::new();
        let (mut client, server) = duplex(4096);
        let session = spawn_session(server, dispatcher.clone(), cancel.clone());

        let item = WorkItem::new("healthcheck").with_string_data("x");
        write_frame(&mut client, &item.to_bytes().unwrap()).await.unwrap();

        while dispatcher.queue().is_empty() {
            tokio::task::yield_now().await;
        }
        cancel.cancel();

        assert!(matches!(session.await.unwrap(), SessionOutcome::Cancelled));
        let mut rest = Vec::new();
        assert_eq!(client.read_to_end(&mut rest).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_handler_failure_is_still_delivered() {
        let dispatcher = dispatcher();
        let turns = spawn_host_turns(dispatcher.queue().clone());
        let (mut client, server) = duplex(4096);
        let session = spawn_session(server, dispatcher, CancellationToken::new());

        let item = WorkItem::new("unknown_xyz").with_string_data("x");
        write_frame(&mut client, &item.to_bytes().unwrap()).await.unwrap();

        let raw = read_frame(&mut client, MAX_MESSAGE_SIZE).await.unwrap();
        let result = WorkResult::from_bytes(&raw).unwrap();
        assert!(!result.success);
        assert_eq!(result.error_message, "Unknown type: unknown_xyz");
        assert!(matches!(
            session.await.unwrap(),
            SessionOutcome::Responded { .. }
        ));
        turns.abort();
    }
}
