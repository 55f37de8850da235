//! In-memory editor host.
//!
//! [`MemoryEditor`] implements [`EditorHost`] over rope buffers arranged in panes of tabs. It is
//! what the headless host binary drives and what the test-suite executes commands against.
//!
//! Each buffer keeps its own undo history. A history entry holds the text *and* the cursor, so
//! undoing a `Diff` restores both at once. Entries are rope clones, which share unchanged
//! chunks with the live buffer, and whole-buffer replacements are applied as a single splice
//! over the differing middle.

use crate::command::PaneDirection;
use crate::diff::DiffRange;
use crate::host::{EditorHost, HostError};
use crate::position::Position;
use async_trait::async_trait;
use ropey::Rope;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_MAX_UNDO: usize = 1000;

#[derive(Debug, Clone)]
struct Snapshot {
    rope: Rope,
    cursor: Position,
}

#[derive(Debug)]
struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_undo: usize,
}

impl History {
    fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_undo,
        }
    }

    fn push(&mut self, snapshot: Snapshot) {
        self.redo_stack.clear();
        if self.undo_stack.len() >= self.max_undo {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(snapshot);
    }
}

/// One open buffer.
#[derive(Debug)]
struct Buffer {
    rope: Rope,
    cursor: Position,
    selection: Option<(Position, Position)>,
    path: Option<PathBuf>,
    history: History,
}

impl Buffer {
    fn new(text: &str, path: Option<PathBuf>) -> Self {
        Self {
            rope: Rope::from_str(text),
            cursor: Position::default(),
            selection: None,
            path,
            history: History::new(DEFAULT_MAX_UNDO),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            rope: self.rope.clone(),
            cursor: self.cursor,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.rope = snapshot.rope;
        self.cursor = snapshot.cursor;
        self.selection = None;
    }

    /// Replace the content with `text`, touching only the chars between the common prefix and
    /// suffix.
    fn splice(&mut self, text: &str) {
        let new: Vec<char> = text.chars().collect();
        let old_len = self.rope.len_chars();

        let prefix = self
            .rope
            .chars()
            .zip(&new)
            .take_while(|(old, new)| old == *new)
            .count();
        let max_suffix = old_len.min(new.len()) - prefix;
        let suffix = (1..=max_suffix)
            .take_while(|back| self.rope.char(old_len - back) == new[new.len() - back])
            .count();

        self.rope.remove(prefix..old_len - suffix);
        let inserted: String = new[prefix..new.len() - suffix].iter().collect();
        self.rope.insert(prefix, &inserted);
    }

    fn write_to(&self, path: &Path) -> Result<(), HostError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.rope.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Pane {
    tabs: Vec<Buffer>,
    active: usize,
}

impl Pane {
    fn active_buffer(&self) -> Option<&Buffer> {
        self.tabs.get(self.active)
    }

    fn active_buffer_mut(&mut self) -> Option<&mut Buffer> {
        self.tabs.get_mut(self.active)
    }
}

/// Editor host backed by in-memory rope buffers.
#[derive(Debug)]
pub struct MemoryEditor {
    panes: Vec<Pane>,
    active_pane: usize,
    clipboard: String,
    highlights: Vec<DiffRange>,
    roots: Vec<PathBuf>,
    save_prompt: Option<PathBuf>,
}

impl MemoryEditor {
    /// Editor with one untitled tab holding `text`.
    pub fn new(text: &str) -> Self {
        let mut editor = Self::empty();
        editor.panes[0].tabs.push(Buffer::new(text, None));
        editor
    }

    /// Editor with a single pane and no tabs, so there is no active buffer.
    pub fn empty() -> Self {
        Self {
            panes: vec![Pane::default()],
            active_pane: 0,
            clipboard: String::new(),
            highlights: Vec::new(),
            roots: Vec::new(),
            save_prompt: None,
        }
    }

    /// Editor with `path` loaded into its only tab.
    pub fn open(path: &Path) -> Result<Self, HostError> {
        let mut editor = Self::empty();
        editor.open_file(path)?;
        Ok(editor)
    }

    /// Set the project roots reported to file lookups.
    pub fn with_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.roots = roots;
        self
    }

    /// Set the answer the save prompt gives; `None` cancels.
    pub fn set_save_prompt(&mut self, path: Option<PathBuf>) {
        self.save_prompt = path;
    }

    /// Replace the clipboard contents.
    pub fn set_clipboard(&mut self, text: impl Into<String>) {
        self.clipboard = text.into();
    }

    /// Clipboard contents.
    pub fn clipboard(&self) -> &str {
        &self.clipboard
    }

    /// Text of the active buffer.
    pub fn text(&self) -> Option<String> {
        self.buffer().map(|buffer| buffer.rope.to_string())
    }

    /// Cursor of the active buffer.
    pub fn cursor(&self) -> Option<Position> {
        self.buffer().map(|buffer| buffer.cursor)
    }

    /// Selection of the active buffer.
    pub fn selection(&self) -> Option<(Position, Position)> {
        self.buffer().and_then(|buffer| buffer.selection)
    }

    /// Path of the active buffer.
    pub fn path(&self) -> Option<&Path> {
        self.buffer().and_then(|buffer| buffer.path.as_deref())
    }

    /// Ranges flashed by the last highlight.
    pub fn highlights(&self) -> &[DiffRange] {
        &self.highlights
    }

    /// Number of panes.
    pub fn pane_count(&self) -> usize {
        self.panes.len()
    }

    /// Index of the focused pane.
    pub fn active_pane(&self) -> usize {
        self.active_pane
    }

    /// Index of the active tab in the focused pane.
    pub fn active_tab(&self) -> usize {
        self.pane().active
    }

    fn pane(&self) -> &Pane {
        &self.panes[self.active_pane]
    }

    fn pane_mut(&mut self) -> &mut Pane {
        &mut self.panes[self.active_pane]
    }

    fn buffer(&self) -> Option<&Buffer> {
        self.pane().active_buffer()
    }

    fn buffer_mut(&mut self) -> Result<&mut Buffer, HostError> {
        self.pane_mut()
            .active_buffer_mut()
            .ok_or(HostError::NoActiveEditor)
    }

    fn require_buffer(&self) -> Result<&Buffer, HostError> {
        self.buffer().ok_or(HostError::NoActiveEditor)
    }

    fn push_tab(&mut self, buffer: Buffer) {
        let pane = self.pane_mut();
        pane.tabs.push(buffer);
        pane.active = pane.tabs.len() - 1;
    }
}

impl Default for MemoryEditor {
    fn default() -> Self {
        Self::empty()
    }
}

#[async_trait]
impl EditorHost for MemoryEditor {
    fn active_text(&self) -> Result<String, HostError> {
        Ok(self.require_buffer()?.rope.to_string())
    }

    fn cursor_position(&self) -> Result<Position, HostError> {
        Ok(self.require_buffer()?.cursor)
    }

    fn active_path(&self) -> Result<Option<PathBuf>, HostError> {
        Ok(self.require_buffer()?.path.clone())
    }

    fn set_text_and_cursor(&mut self, text: &str, cursor: Position) -> Result<(), HostError> {
        let buffer = self.buffer_mut()?;
        let snapshot = buffer.snapshot();
        buffer.history.push(snapshot);
        buffer.splice(text);
        buffer.cursor = cursor;
        buffer.selection = None;
        Ok(())
    }

    fn select(&mut self, start: Position, end: Position) -> Result<(), HostError> {
        let buffer = self.buffer_mut()?;
        buffer.selection = Some((start, end));
        buffer.cursor = end;
        Ok(())
    }

    fn highlight(&mut self, ranges: &[DiffRange]) -> Result<(), HostError> {
        self.require_buffer()?;
        self.highlights = ranges.to_vec();
        Ok(())
    }

    fn undo(&mut self) -> Result<(), HostError> {
        let buffer = self.buffer_mut()?;
        if let Some(snapshot) = buffer.history.undo_stack.pop() {
            let current = buffer.snapshot();
            buffer.history.redo_stack.push(current);
            buffer.restore(snapshot);
        }
        Ok(())
    }

    fn redo(&mut self) -> Result<(), HostError> {
        let buffer = self.buffer_mut()?;
        if let Some(snapshot) = buffer.history.redo_stack.pop() {
            let current = buffer.snapshot();
            buffer.history.undo_stack.push(current);
            buffer.restore(snapshot);
        }
        Ok(())
    }

    fn save(&mut self) -> Result<(), HostError> {
        let buffer = self.require_buffer()?;
        let path = buffer
            .path
            .as_deref()
            .ok_or_else(|| HostError::Other("buffer has no path".to_string()))?;
        debug!(path = %path.display(), "writing buffer");
        buffer.write_to(path)
    }

    fn save_as(&mut self, path: &Path) -> Result<(), HostError> {
        let buffer = self.buffer_mut()?;
        buffer.write_to(path)?;
        buffer.path = Some(path.to_path_buf());
        Ok(())
    }

    async fn prompt_save_location(&mut self) -> Option<PathBuf> {
        self.save_prompt.clone()
    }

    fn read_clipboard(&self) -> String {
        self.clipboard.clone()
    }

    fn write_clipboard(&mut self, text: &str) {
        self.clipboard = text.to_string();
    }

    fn open_file(&mut self, path: &Path) -> Result<(), HostError> {
        let existing = self
            .pane()
            .tabs
            .iter()
            .position(|buffer| buffer.path.as_deref() == Some(path));
        if let Some(index) = existing {
            self.pane_mut().active = index;
            return Ok(());
        }

        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "opened file");
        self.push_tab(Buffer::new(&text, Some(path.to_path_buf())));
        Ok(())
    }

    fn roots(&self) -> Vec<PathBuf> {
        self.roots.clone()
    }

    fn create_tab(&mut self) -> Result<(), HostError> {
        self.push_tab(Buffer::new("", None));
        Ok(())
    }

    fn close_tab(&mut self) -> Result<(), HostError> {
        let pane = self.pane_mut();
        if pane.active >= pane.tabs.len() {
            return Err(HostError::NoActiveEditor);
        }
        pane.tabs.remove(pane.active);
        pane.active = pane.active.min(pane.tabs.len().saturating_sub(1));
        Ok(())
    }

    fn next_tab(&mut self) -> Result<(), HostError> {
        let pane = self.pane_mut();
        if !pane.tabs.is_empty() {
            pane.active = (pane.active + 1) % pane.tabs.len();
        }
        Ok(())
    }

    fn previous_tab(&mut self) -> Result<(), HostError> {
        let pane = self.pane_mut();
        if !pane.tabs.is_empty() {
            pane.active = (pane.active + pane.tabs.len() - 1) % pane.tabs.len();
        }
        Ok(())
    }

    fn tab_count(&self) -> usize {
        self.pane().tabs.len()
    }

    fn switch_tab(&mut self, index: usize) -> Result<(), HostError> {
        let pane = self.pane_mut();
        if index >= pane.tabs.len() {
            return Err(HostError::Other(format!("no tab at index {index}")));
        }
        pane.active = index;
        Ok(())
    }

    fn split(&mut self, direction: PaneDirection) -> Result<(), HostError> {
        let copy = self
            .buffer()
            .map(|buffer| Buffer {
                rope: buffer.rope.clone(),
                ..Buffer::new("", buffer.path.clone())
            });
        let pane = Pane {
            tabs: copy.into_iter().collect(),
            active: 0,
        };

        let index = match direction {
            PaneDirection::Left | PaneDirection::Up => self.active_pane,
            PaneDirection::Right | PaneDirection::Down => self.active_pane + 1,
        };
        self.panes.insert(index, pane);
        self.active_pane = index;
        Ok(())
    }

    fn focus_pane(&mut self, direction: PaneDirection) -> Result<(), HostError> {
        self.active_pane = match direction {
            PaneDirection::Left | PaneDirection::Up => self.active_pane.saturating_sub(1),
            PaneDirection::Right | PaneDirection::Down => {
                (self.active_pane + 1).min(self.panes.len() - 1)
            }
        };
        Ok(())
    }

    fn close_pane(&mut self) -> Result<(), HostError> {
        if self.panes.len() == 1 {
            self.panes[0] = Pane::default();
            return Ok(());
        }
        self.panes.remove(self.active_pane);
        self.active_pane = self.active_pane.min(self.panes.len() - 1);
        Ok(())
    }
}
