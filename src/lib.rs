//! # hostpipe
//!
//! Local pipe bridge that lets an external orchestrator drive an embedded
//! host (a game engine, an editor, any single-threaded main loop) with
//! typed work requests.
//!
//! ## Architecture
//!
//! - **Channel**: Unix domain socket or Windows named pipe, one
//!   request/response exchange per connection
//! - **Frames**: 4-byte little-endian length prefix + JSON envelope
//! - **Envelopes**: [`WorkItem`] in, [`WorkResult`] out, opaque payloads
//!   base64 encoded
//! - **Host queue**: handlers never run on the I/O side; every item is
//!   queued and executed when the host drains the queue on its own thread
//!
//! ## Example
//!
//! ```ignore
//! use hostpipe::PipeModule;
//!
//! let mut module = PipeModule::builder()
//!     .channel_name("unity_module")
//!     .build()?;
//! module.start()?;
//!
//! // Host main loop
//! loop {
//!     module.run_pending(&mut host);
//! }
//! ```

pub mod codec;
pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod events;
pub mod handler;
pub mod host;
pub mod listener;
pub mod protocol;
pub mod transport;

mod client;
mod module;

pub use client::Client;
pub use config::ModuleConfig;
pub use envelope::{WorkItem, WorkResult};
pub use error::{HostpipeError, Result};
pub use events::{ModuleEvent, ModuleStatus};
pub use handler::{RequestContext, TypeRouter};
pub use host::{Host, ObjectRef, Position, StateSnapshot};
pub use listener::ListenerState;
pub use module::{PipeModule, PipeModuleBuilder};
