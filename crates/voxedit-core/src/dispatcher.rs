//! Command Dispatcher
//!
//! Executes one [`Command`] at a time against an [`EditorHost`].
//!
//! # Contract
//!
//! - **Text replacement** (`Diff`, `Paste`) goes through a single
//!   [`EditorHost::set_text_and_cursor`] call, so one undo reverts text and cursor together. The
//!   changed ranges are then flashed on the host.
//! - **UI transitions** (tabs, panes) resolve only after the configured settle delay: hosts do
//!   not report when their UI has caught up, and later commands read the new active buffer.
//! - **No active editor** is not an error. Any command that needs a buffer when none is focused
//!   completes as a no-op.
//! - **Save** without a known path prompts for one; a cancelled prompt is a no-op.
//!
//! # Example
//!
//! ```rust
//! use voxedit_core::{Command, Dispatcher, DispatcherConfig, MemoryEditor};
//!
//! # tokio_test_block_on(async {
//! let mut dispatcher = Dispatcher::new(MemoryEditor::new("hello"), DispatcherConfig::default());
//! dispatcher
//!     .execute(&Command::Diff { source: "hello world".to_string(), cursor: 11 })
//!     .await
//!     .unwrap();
//! assert_eq!(dispatcher.host().text(), Some("hello world".to_string()));
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
//! # }
//! ```

use crate::command::Command;
use crate::diff::{DiffRange, DiffRangeKind, diff};
use crate::files::{FileSearchError, search_files};
use crate::host::{EditorHost, HostError};
use crate::paste::plan_paste;
use crate::position::{CodecError, char_len, offset_to_position, position_to_offset};
use crate::state::SessionStateManager;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Reply the recognizer sends back after an `OpenFileList` search.
pub const OPEN_FILE_CALLBACK: &str = "callback open";

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Wait after tab/pane commands, in milliseconds.
    pub settle_delay_ms: u64,
    /// Gitignore-style globs excluded from file lookups.
    pub ignore: Vec<String>,
}

impl DispatcherConfig {
    /// Settle delay as a [`Duration`].
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 300,
            ignore: ["*.pyc", "*.class", "*.jar", "*.dylib", ".gradle/"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Editor snapshot reported to the recognizer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EditorState {
    /// Full text of the active buffer.
    pub source: String,
    /// Cursor as a character offset into `source`.
    pub cursor: usize,
    /// Path of the active buffer; empty for untitled buffers or no editor.
    pub filename: String,
    /// Result of the last file lookup.
    pub files: Vec<String>,
    /// Project roots.
    pub roots: Vec<String>,
}

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Nothing to report.
    Done,
    /// Editor snapshot for the recognizer.
    EditorState(EditorState),
    /// Text the recognizer should process next.
    SendText(String),
}

impl CommandOutcome {
    /// JSON payload for the recognizer, if this outcome carries one.
    pub fn to_payload(&self) -> Option<serde_json::Value> {
        match self {
            CommandOutcome::Done => None,
            CommandOutcome::EditorState(state) => Some(serde_json::json!({
                "message": "editorState",
                "data": state,
            })),
            CommandOutcome::SendText(text) => Some(serde_json::json!({
                "message": "sendText",
                "data": { "text": text },
            })),
        }
    }
}

/// Errors that the dispatcher does not recover from locally.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    /// An offset did not fit the buffer.
    Codec(#[from] CodecError),

    #[error(transparent)]
    /// The host failed.
    Host(#[from] HostError),

    #[error(transparent)]
    /// A file lookup failed.
    Search(#[from] FileSearchError),
}

/// Runs commands against an editor host.
pub struct Dispatcher<H> {
    host: H,
    config: DispatcherConfig,
    session: SessionStateManager,
    file_list: Vec<PathBuf>,
}

impl<H: EditorHost> Dispatcher<H> {
    /// Create a dispatcher driving `host`.
    pub fn new(host: H, config: DispatcherConfig) -> Self {
        Self {
            host,
            config,
            session: SessionStateManager::new(),
            file_list: Vec::new(),
        }
    }

    /// The editor host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the editor host.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Session state.
    pub fn session(&self) -> &SessionStateManager {
        &self.session
    }

    /// Mutable session state.
    pub fn session_mut(&mut self) -> &mut SessionStateManager {
        &mut self.session
    }

    /// Dispatcher settings.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Files found by the last `OpenFileList` command.
    pub fn file_list(&self) -> &[PathBuf] {
        &self.file_list
    }

    /// Execute one command.
    pub async fn execute(&mut self, command: &Command) -> Result<CommandOutcome, DispatchError> {
        debug!(command = command.type_name(), "executing command");

        let outcome = match self.apply(command).await {
            Err(DispatchError::Host(HostError::NoActiveEditor)) => {
                debug!(command = command.type_name(), "no active editor, skipping");
                CommandOutcome::Done
            }
            result => result?,
        };

        if command.needs_settle() {
            tokio::time::sleep(self.config.settle_delay()).await;
        }

        Ok(outcome)
    }

    /// Snapshot of the active buffer for the recognizer.
    pub fn editor_state(&self) -> Result<EditorState, DispatchError> {
        let mut state = EditorState {
            files: self.file_list.iter().map(|p| display_path(p)).collect(),
            roots: self.host.roots().iter().map(|p| display_path(p)).collect(),
            ..EditorState::default()
        };

        let source = match self.host.active_text() {
            Ok(source) => source,
            Err(HostError::NoActiveEditor) => return Ok(state),
            Err(err) => return Err(err.into()),
        };

        state.cursor = position_to_offset(&source, self.host.cursor_position()?);
        state.filename = self
            .host
            .active_path()?
            .map(|path| display_path(&path))
            .unwrap_or_default();
        state.source = source;
        Ok(state)
    }

    async fn apply(&mut self, command: &Command) -> Result<CommandOutcome, DispatchError> {
        match command {
            Command::Diff { source, cursor } => self.replace_text(source, *cursor)?,
            Command::Paste { cursor, direction } => {
                let source = self.host.active_text()?;
                let clipboard = self.host.read_clipboard();
                let plan = plan_paste(&source, cursor.unwrap_or(0), &clipboard, *direction);
                self.replace_text(&plan.text, plan.cursor)?;
            }
            Command::Copy { text } => {
                if let Some(text) = text.as_deref().filter(|text| !text.is_empty()) {
                    self.host.write_clipboard(text);
                }
            }
            Command::Select { cursor, cursor_end } => {
                let text = self.host.active_text()?;
                let start = offset_to_position(&text, *cursor)?;
                let end = offset_to_position(&text, *cursor_end)?;
                self.host.select(start, end)?;
            }
            Command::GetEditorState => {
                return Ok(CommandOutcome::EditorState(self.editor_state()?));
            }
            Command::Undo => self.host.undo()?,
            Command::Redo => self.host.redo()?,
            Command::Save => self.save().await?,
            Command::CreateTab => self.host.create_tab()?,
            Command::CloseTab => self.host.close_tab()?,
            Command::NextTab => self.host.next_tab()?,
            Command::PreviousTab => self.host.previous_tab()?,
            Command::SwitchTab { index } => self.switch_tab(*index)?,
            Command::Split { direction } => self.host.split(*direction)?,
            Command::Window { direction } => self.host.focus_pane(*direction)?,
            Command::CloseWindow => self.host.close_pane()?,
            Command::OpenFileList { path } => {
                self.file_list = search_files(&self.host.roots(), path, &self.config.ignore)?;
                debug!(query = %path, found = self.file_list.len(), "file lookup");
                return Ok(CommandOutcome::SendText(OPEN_FILE_CALLBACK.to_string()));
            }
            Command::OpenFile { index } => {
                let index = index.unwrap_or(0);
                match self.file_list.get(index).cloned() {
                    Some(path) => self.host.open_file(&path)?,
                    None => debug!(index, "no such file in the last lookup"),
                }
            }
            Command::Use { index } => {
                let index = index.unwrap_or(1).saturating_sub(1);
                self.session.set_highlighted(Some(index));
            }
            Command::Cancel => self.session.clear_alternatives(),
            Command::Pause => {
                self.session.set_listening(false);
                self.session.set_status("Paused");
            }
            Command::SetEditorStatus { text, volume } => {
                if let Some(volume) = volume {
                    self.session.set_volume(*volume);
                }
                self.session.set_status(text.clone());
            }
            Command::GoToDefinition | Command::Invalid => {}
            Command::Unsupported => warn!("ignoring unsupported command"),
        }

        Ok(CommandOutcome::Done)
    }

    fn replace_text(&mut self, text: &str, cursor: usize) -> Result<(), DispatchError> {
        let before = self.host.active_text()?;

        let len = char_len(text);
        if cursor > len {
            warn!(cursor, len, "cursor past end of replacement text, clamping");
        }
        let position = offset_to_position(text, cursor.min(len))?;

        self.host.set_text_and_cursor(text, position)?;

        if before != text {
            let mut ranges = diff(&before, text);
            if ranges.is_empty() {
                debug!(row = position.row, "no structural diff, highlighting cursor line");
                ranges.push(DiffRange::line(DiffRangeKind::Add, text, position.row));
            }
            self.host.highlight(&ranges)?;
        }

        Ok(())
    }

    async fn save(&mut self) -> Result<(), DispatchError> {
        if self.host.active_path()?.is_some() {
            self.host.save()?;
            return Ok(());
        }

        match self.host.prompt_save_location().await {
            Some(path) => {
                info!(path = %path.display(), "saving untitled buffer");
                self.host.save_as(&path)?;
            }
            None => info!("save cancelled"),
        }
        Ok(())
    }

    fn switch_tab(&mut self, index: i64) -> Result<(), DispatchError> {
        let count = self.host.tab_count();
        if count == 0 {
            return Ok(());
        }

        let index = if index <= 0 {
            count - 1
        } else {
            (index - 1) as usize
        };
        if index >= count {
            debug!(index, count, "tab index out of range");
            return Ok(());
        }

        self.host.switch_tab(index)?;
        Ok(())
    }
}

fn display_path(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}
