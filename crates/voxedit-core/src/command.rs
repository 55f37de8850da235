//! Recognizer command model
//!
//! The recognizer sends commands as JSON objects tagged by a `type` field (`COMMAND_TYPE_*`),
//! with the payload fields next to the tag:
//!
//! ```json
//! {"type": "COMMAND_TYPE_DIFF", "source": "let x = 1;", "cursor": 4}
//! ```
//!
//! Commands are grouped into [`CommandSequence`]s (one per spoken phrase), sequences into
//! [`Alternative`]s (one per candidate interpretation), and alternatives into a [`Batch`] (one
//! per recognizer delivery).
//!
//! # Example
//!
//! ```rust
//! use voxedit_core::{Batch, Command};
//!
//! let batch: Batch = serde_json::from_str(r#"{
//!     "alternatives": [{
//!         "sequences": [{
//!             "transcript": "undo",
//!             "commands": [{"type": "COMMAND_TYPE_UNDO"}]
//!         }]
//!     }]
//! }"#).unwrap();
//!
//! assert_eq!(batch.alternatives[0].sequences[0].commands, vec![Command::Undo]);
//! ```

use crate::paste::PasteDirection;
use serde::{Deserialize, Serialize};

/// Pane direction used by split and focus commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaneDirection {
    /// Towards the left.
    Left,
    /// Towards the right.
    Right,
    /// Upwards.
    Up,
    /// Downwards.
    Down,
}

/// A single recognizer command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Replace the whole buffer and place the cursor.
    #[serde(rename = "COMMAND_TYPE_DIFF")]
    Diff {
        /// New buffer text.
        #[serde(default)]
        source: String,
        /// New cursor, as a character offset into `source`.
        #[serde(default)]
        cursor: usize,
    },
    /// Paste the clipboard.
    #[serde(rename = "COMMAND_TYPE_PASTE")]
    Paste {
        /// Insertion offset (defaults to 0).
        #[serde(default)]
        cursor: Option<usize>,
        /// Line paste direction.
        #[serde(default)]
        direction: Option<PasteDirection>,
    },
    /// Put text on the clipboard.
    #[serde(rename = "COMMAND_TYPE_COPY")]
    Copy {
        /// Text to copy; nothing happens when absent or empty.
        #[serde(default)]
        text: Option<String>,
    },
    /// Select a character range.
    #[serde(rename = "COMMAND_TYPE_SELECT")]
    Select {
        /// Selection start offset.
        cursor: usize,
        /// Selection end offset (exclusive).
        #[serde(rename = "cursorEnd")]
        cursor_end: usize,
    },
    /// Report the active buffer to the recognizer.
    #[serde(rename = "COMMAND_TYPE_GET_EDITOR_STATE")]
    GetEditorState,
    /// Undo the last edit.
    #[serde(rename = "COMMAND_TYPE_UNDO")]
    Undo,
    /// Redo the last undone edit.
    #[serde(rename = "COMMAND_TYPE_REDO")]
    Redo,
    /// Save the active buffer.
    #[serde(rename = "COMMAND_TYPE_SAVE")]
    Save,
    /// Open a new, empty tab.
    #[serde(rename = "COMMAND_TYPE_CREATE_TAB")]
    CreateTab,
    /// Close the active tab.
    #[serde(rename = "COMMAND_TYPE_CLOSE_TAB")]
    CloseTab,
    /// Activate the next tab.
    #[serde(rename = "COMMAND_TYPE_NEXT_TAB")]
    NextTab,
    /// Activate the previous tab.
    #[serde(rename = "COMMAND_TYPE_PREVIOUS_TAB")]
    PreviousTab,
    /// Activate a tab by 1-based index; zero or negative selects the last tab.
    #[serde(rename = "COMMAND_TYPE_SWITCH_TAB")]
    SwitchTab {
        /// 1-based tab index.
        #[serde(default)]
        index: i64,
    },
    /// Split the active pane.
    #[serde(rename = "COMMAND_TYPE_SPLIT")]
    Split {
        /// Where the new pane goes.
        direction: PaneDirection,
    },
    /// Move focus to a neighbouring pane.
    #[serde(rename = "COMMAND_TYPE_WINDOW")]
    Window {
        /// Which neighbour to focus.
        direction: PaneDirection,
    },
    /// Close the active pane.
    #[serde(rename = "COMMAND_TYPE_CLOSE_WINDOW")]
    CloseWindow,
    /// Search the project for files matching `path`.
    #[serde(rename = "COMMAND_TYPE_OPEN_FILE_LIST")]
    OpenFileList {
        /// Fuzzy file query; spaces match anything.
        path: String,
    },
    /// Open an entry of the last file list.
    #[serde(rename = "COMMAND_TYPE_OPEN_FILE")]
    OpenFile {
        /// 0-based index into the last file list (defaults to 0).
        #[serde(default)]
        index: Option<usize>,
    },
    /// Pick one of the displayed alternatives.
    #[serde(rename = "COMMAND_TYPE_USE")]
    Use {
        /// 1-based index over the selectable alternatives (defaults to 1).
        #[serde(default)]
        index: Option<usize>,
    },
    /// Dismiss the displayed alternatives.
    #[serde(rename = "COMMAND_TYPE_CANCEL")]
    Cancel,
    /// Stop listening.
    #[serde(rename = "COMMAND_TYPE_PAUSE")]
    Pause,
    /// Update the status line and, optionally, the input volume.
    #[serde(rename = "COMMAND_TYPE_SET_EDITOR_STATUS")]
    SetEditorStatus {
        /// Status text.
        #[serde(default)]
        text: String,
        /// Input volume in `0.0..=1.0`.
        #[serde(default)]
        volume: Option<f64>,
    },
    /// Jump to a definition (not supported by the core; a no-op).
    #[serde(rename = "COMMAND_TYPE_GO_TO_DEFINITION")]
    GoToDefinition,
    /// Recognized but not executable.
    #[serde(rename = "COMMAND_TYPE_INVALID")]
    Invalid,
    /// Any command type this engine does not know.
    #[serde(other)]
    Unsupported,
}

impl Command {
    /// Wire name of this command's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Command::Diff { .. } => "COMMAND_TYPE_DIFF",
            Command::Paste { .. } => "COMMAND_TYPE_PASTE",
            Command::Copy { .. } => "COMMAND_TYPE_COPY",
            Command::Select { .. } => "COMMAND_TYPE_SELECT",
            Command::GetEditorState => "COMMAND_TYPE_GET_EDITOR_STATE",
            Command::Undo => "COMMAND_TYPE_UNDO",
            Command::Redo => "COMMAND_TYPE_REDO",
            Command::Save => "COMMAND_TYPE_SAVE",
            Command::CreateTab => "COMMAND_TYPE_CREATE_TAB",
            Command::CloseTab => "COMMAND_TYPE_CLOSE_TAB",
            Command::NextTab => "COMMAND_TYPE_NEXT_TAB",
            Command::PreviousTab => "COMMAND_TYPE_PREVIOUS_TAB",
            Command::SwitchTab { .. } => "COMMAND_TYPE_SWITCH_TAB",
            Command::Split { .. } => "COMMAND_TYPE_SPLIT",
            Command::Window { .. } => "COMMAND_TYPE_WINDOW",
            Command::CloseWindow => "COMMAND_TYPE_CLOSE_WINDOW",
            Command::OpenFileList { .. } => "COMMAND_TYPE_OPEN_FILE_LIST",
            Command::OpenFile { .. } => "COMMAND_TYPE_OPEN_FILE",
            Command::Use { .. } => "COMMAND_TYPE_USE",
            Command::Cancel => "COMMAND_TYPE_CANCEL",
            Command::Pause => "COMMAND_TYPE_PAUSE",
            Command::SetEditorStatus { .. } => "COMMAND_TYPE_SET_EDITOR_STATUS",
            Command::GoToDefinition => "COMMAND_TYPE_GO_TO_DEFINITION",
            Command::Invalid => "COMMAND_TYPE_INVALID",
            Command::Unsupported => "COMMAND_TYPE_UNSUPPORTED",
        }
    }

    /// Whether this command replaces buffer text (and therefore keeps offsets meaningful for
    /// the commands planned after it).
    pub fn is_text_replacement(&self) -> bool {
        matches!(self, Command::Diff { .. })
    }

    /// Whether the host needs time to settle its UI after this command.
    pub fn needs_settle(&self) -> bool {
        matches!(
            self,
            Command::CreateTab
                | Command::CloseTab
                | Command::NextTab
                | Command::PreviousTab
                | Command::SwitchTab { .. }
                | Command::Split { .. }
                | Command::Window { .. }
                | Command::CloseWindow
        )
    }
}

/// Commands planned from one spoken phrase.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandSequence {
    /// Commands to run in order.
    #[serde(default)]
    pub commands: Vec<Command>,
    /// The phrase as recognized.
    #[serde(default)]
    pub transcript: String,
    /// Display description for disambiguation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Display code snippet for disambiguation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl CommandSequence {
    /// Create a sequence from a transcript and its commands.
    pub fn new(transcript: impl Into<String>, commands: Vec<Command>) -> Self {
        Self {
            commands,
            transcript: transcript.into(),
            description: None,
            code: None,
        }
    }
}

/// One candidate interpretation of an utterance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Alternative {
    /// Sequences making up this interpretation, in execution order.
    #[serde(default)]
    pub sequences: Vec<CommandSequence>,
}

impl Alternative {
    /// Create an alternative from its sequences.
    pub fn new(sequences: Vec<CommandSequence>) -> Self {
        Self { sequences }
    }

    /// `true` when this alternative is exactly one sequence holding one `Invalid` command.
    pub fn is_invalid(&self) -> bool {
        matches!(
            self.sequences.as_slice(),
            [sequence] if matches!(sequence.commands.as_slice(), [Command::Invalid])
        )
    }

    /// Display text: each sequence's description (or transcript), comma separated.
    pub fn description(&self) -> String {
        self.sequences
            .iter()
            .map(|sequence| {
                sequence
                    .description
                    .as_deref()
                    .map(str::trim)
                    .filter(|description| !description.is_empty())
                    .unwrap_or(&sequence.transcript)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Display code snippets, one per sequence that has one.
    pub fn code(&self) -> Vec<String> {
        self.sequences
            .iter()
            .filter_map(|sequence| sequence.code.clone())
            .collect()
    }
}

/// One recognizer delivery.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Batch {
    /// Candidate interpretations, best first.
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

impl Batch {
    /// Create a batch from its alternatives.
    pub fn new(alternatives: Vec<Alternative>) -> Self {
        Self { alternatives }
    }

    /// Batch holding a single alternative with a single sequence.
    pub fn single(sequence: CommandSequence) -> Self {
        Self::new(vec![Alternative::new(vec![sequence])])
    }
}
