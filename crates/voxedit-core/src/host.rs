//! Editor host boundary.
//!
//! [`EditorHost`] is the narrow interface the dispatcher drives. A concrete editor binding
//! (or [`crate::MemoryEditor`] in tests and the headless host) implements it.
//!
//! Every method that needs a focused buffer reports [`HostError::NoActiveEditor`] when there is
//! none; the dispatcher turns that into a successful no-op.

use crate::command::PaneDirection;
use crate::diff::DiffRange;
use crate::position::Position;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reported by an editor host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("no active editor")]
    /// No buffer currently has focus.
    NoActiveEditor,

    #[error("I/O error: {0}")]
    /// Reading or writing a file failed.
    Io(#[from] std::io::Error),

    #[error("{0}")]
    /// Any other host failure.
    Other(String),
}

/// Operations the command engine needs from a text editor.
#[async_trait]
pub trait EditorHost: Send {
    /// Full text of the active buffer.
    fn active_text(&self) -> Result<String, HostError>;

    /// Cursor of the active buffer.
    fn cursor_position(&self) -> Result<Position, HostError>;

    /// File path of the active buffer; `Ok(None)` for an untitled buffer.
    fn active_path(&self) -> Result<Option<PathBuf>, HostError>;

    /// Replace the buffer text and move the cursor as one undoable step.
    ///
    /// Implementations must never expose the new text with the old cursor (or vice versa).
    fn set_text_and_cursor(&mut self, text: &str, cursor: Position) -> Result<(), HostError>;

    /// Select `start..end` in the active buffer.
    fn select(&mut self, start: Position, end: Position) -> Result<(), HostError>;

    /// Flash `ranges` as transient feedback.
    fn highlight(&mut self, ranges: &[DiffRange]) -> Result<(), HostError>;

    /// Undo the last edit of the active buffer.
    fn undo(&mut self) -> Result<(), HostError>;

    /// Redo the last undone edit of the active buffer.
    fn redo(&mut self) -> Result<(), HostError>;

    /// Save the active buffer to its known path.
    fn save(&mut self) -> Result<(), HostError>;

    /// Save the active buffer to `path` and adopt it as the buffer's path.
    fn save_as(&mut self, path: &Path) -> Result<(), HostError>;

    /// Ask the user where to save. `None` means the prompt was cancelled.
    async fn prompt_save_location(&mut self) -> Option<PathBuf>;

    /// Current clipboard text.
    fn read_clipboard(&self) -> String;

    /// Replace the clipboard text.
    fn write_clipboard(&mut self, text: &str);

    /// Open `path` in a tab and focus it.
    fn open_file(&mut self, path: &Path) -> Result<(), HostError>;

    /// Project root directories searched by file lookups.
    fn roots(&self) -> Vec<PathBuf>;

    /// Open an empty tab.
    fn create_tab(&mut self) -> Result<(), HostError>;

    /// Close the active tab.
    fn close_tab(&mut self) -> Result<(), HostError>;

    /// Activate the next tab (wrapping).
    fn next_tab(&mut self) -> Result<(), HostError>;

    /// Activate the previous tab (wrapping).
    fn previous_tab(&mut self) -> Result<(), HostError>;

    /// Number of tabs in the active pane.
    fn tab_count(&self) -> usize;

    /// Activate the tab at 0-based `index`.
    fn switch_tab(&mut self, index: usize) -> Result<(), HostError>;

    /// Split the active pane, copying the active tab into the new pane.
    fn split(&mut self, direction: PaneDirection) -> Result<(), HostError>;

    /// Focus the neighbouring pane in `direction`.
    fn focus_pane(&mut self, direction: PaneDirection) -> Result<(), HostError>;

    /// Close the active pane.
    fn close_pane(&mut self) -> Result<(), HostError>;
}
