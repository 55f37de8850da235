#![warn(missing_docs)]
//! `voxedit-ipc` - recognizer connection for `voxedit-core`.
//!
//! This crate carries batches from the voice recognizer into a [`voxedit_core::Resolver`] and
//! sends replies, resubmissions and out-of-band messages back. Messages are JSON envelopes
//! framed with a `Content-Length` header over a localhost TCP connection; the connection is
//! re-established with exponential backoff when the recognizer goes away.
//!
//! # Example
//!
//! ```rust,no_run
//! use voxedit_core::{Dispatcher, DispatcherConfig, MemoryEditor, Resolver};
//! use voxedit_ipc::{IpcConfig, IpcService};
//!
//! # async fn run() -> Result<(), voxedit_ipc::IpcError> {
//! let dispatcher = Dispatcher::new(MemoryEditor::new(""), DispatcherConfig::default());
//! let handle = IpcService::start(IpcConfig::default(), Resolver::new(dispatcher))?;
//!
//! handle.send("enableListening", serde_json::json!({}))?;
//! handle.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod error;
pub mod protocol;
pub mod service;
pub mod transport;

pub use backoff::{Backoff, BackoffConfig};
pub use error::IpcError;
pub use protocol::{InboundMessage, OutboundMessage};
pub use service::{ConnectionStatus, DEFAULT_PORT, IpcConfig, IpcHandle, IpcService};
pub use transport::{read_message, write_message};
