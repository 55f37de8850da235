#![warn(missing_docs)]
//! Voxedit Core - Headless Voice Command Execution Engine
//!
//! # Overview
//!
//! `voxedit-core` sits between a text editor and an external voice-command recognizer. The
//! recognizer sends batches of planned command sequences; this crate decides which sequence
//! runs, executes its commands against an editor buffer, and reports editor state back in a
//! form the recognizer can plan against.
//!
//! It does not recognize speech, parse language, or draw anything. The editor is reached only
//! through the [`EditorHost`] trait; the recognizer only through [`Recognizer`] (and the
//! `voxedit-ipc` crate, which implements it over a local socket).
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Resolver (disambiguation, chain breaking)  │  ← Batch entry point
//! ├─────────────────────────────────────────────┤
//! │  Dispatcher (one command at a time)         │  ← Host calls, settle delay
//! ├─────────────────────────────────────────────┤
//! │  Diff Engine / Paste Planner                │  ← Highlight ranges, paste text
//! ├─────────────────────────────────────────────┤
//! │  Position Codec                             │  ← Offset <-> row/column
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use voxedit_core::{
//!     Batch, Command, CommandSequence, Dispatcher, DispatcherConfig, MemoryEditor, Recognizer,
//!     Resolver, ResubmitError,
//! };
//!
//! struct Offline;
//!
//! #[async_trait::async_trait]
//! impl Recognizer for Offline {
//!     async fn resubmit(&mut self, _text: &str, _chain: bool) -> Result<(), ResubmitError> {
//!         Ok(())
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let dispatcher = Dispatcher::new(MemoryEditor::new("let x = 1;"), DispatcherConfig::default());
//! let mut resolver = Resolver::new(dispatcher);
//!
//! let batch = Batch::single(CommandSequence::new(
//!     "change one to two",
//!     vec![Command::Diff { source: "let x = 2;".to_string(), cursor: 9 }],
//! ));
//! resolver.handle_batch(batch, &mut Offline).await.unwrap();
//!
//! assert_eq!(resolver.dispatcher().host().text().as_deref(), Some("let x = 2;"));
//! # });
//! ```
//!
//! # Module Description
//!
//! - [`position`] - Offset and row/column conversion
//! - [`diff`] - Line-aligned change ranges for highlighting
//! - [`paste`] - Clipboard insertion arithmetic
//! - [`command`] - Recognizer command model
//! - [`host`] - Editor host trait
//! - [`dispatcher`] - Command execution
//! - [`resolver`] - Alternatives and chain handling
//! - [`state`] - Observable session state
//! - [`files`] - Project file lookup
//! - [`memory`] - In-memory editor host
//!
//! # Coordinates
//!
//! Offsets and columns count Unicode scalar values (Rust `char`s). A `\n` ends a row; `\r` is an
//! ordinary character.

pub mod command;
pub mod diff;
pub mod dispatcher;
pub mod files;
pub mod host;
pub mod memory;
pub mod paste;
pub mod position;
pub mod resolver;
pub mod state;

pub use command::{Alternative, Batch, Command, CommandSequence, PaneDirection};
pub use diff::{DiffRange, DiffRangeKind, diff};
pub use dispatcher::{
    CommandOutcome, DispatchError, Dispatcher, DispatcherConfig, EditorState, OPEN_FILE_CALLBACK,
};
pub use files::{FileSearchError, search_files};
pub use host::{EditorHost, HostError};
pub use memory::MemoryEditor;
pub use paste::{PasteDirection, PastePlan, plan_paste};
pub use position::{CodecError, Position, offset_to_position, position_to_offset};
pub use resolver::{
    BatchOutcome, ChainPolicy, Recognizer, Resolver, ResolverError, ResolverState, ResubmitError,
};
pub use state::{
    AlternativeView, SessionChange, SessionChangeCallback, SessionChangeType, SessionState,
    SessionStateManager,
};
