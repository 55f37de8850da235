//! Session State Interface
//!
//! Observable values a voice session exposes to the surrounding editor integration: status
//! text, input volume, listening flag, the alternatives awaiting disambiguation, and recognizer
//! connection health.
//!
//! Rendering is out of scope; a panel subscribes to [`SessionChange`] notifications and reads
//! the current [`SessionState`] when something changes.
//!
//! # Example
//!
//! ```rust
//! use voxedit_core::{SessionChangeType, SessionStateManager};
//!
//! let mut manager = SessionStateManager::new();
//! manager.subscribe(|change| {
//!     println!("session changed: {:?}", change.change_type);
//! });
//!
//! manager.set_status("Listening");
//! assert_eq!(manager.state().status, "Listening");
//! assert_eq!(manager.version(), 1);
//! ```

use crate::command::Alternative;

/// One alternative as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternativeView {
    /// 1-based selection number; `None` for invalid alternatives, which are shown but cannot be
    /// picked.
    pub number: Option<usize>,
    /// Description line.
    pub description: String,
    /// Code snippets for each sequence that has one.
    pub code: Vec<String>,
}

impl AlternativeView {
    /// Whether this alternative is shown as invalid.
    pub fn is_invalid(&self) -> bool {
        self.number.is_none()
    }

    /// Build display rows for `alternatives`, numbering only the valid ones.
    pub fn from_alternatives(alternatives: &[Alternative]) -> Vec<AlternativeView> {
        let mut valid = 0;
        alternatives
            .iter()
            .map(|alternative| {
                let number = (!alternative.is_invalid()).then(|| {
                    valid += 1;
                    valid
                });
                AlternativeView {
                    number,
                    description: alternative.description(),
                    code: alternative.code(),
                }
            })
            .collect()
    }
}

/// Current session values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    /// Status line text.
    pub status: String,
    /// Input volume in percent (`0..=100`).
    pub volume: u32,
    /// Whether the recognizer is listening.
    pub listening: bool,
    /// Alternatives awaiting disambiguation (empty when none).
    pub alternatives: Vec<AlternativeView>,
    /// 0-based index of the highlighted selectable alternative.
    pub highlighted: Option<usize>,
    /// The recognizer could not be reached after all reconnect attempts.
    pub connection_failed: bool,
}

/// Kind of session change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChangeType {
    /// Status text changed
    Status,
    /// Volume changed
    Volume,
    /// Listening flag changed
    Listening,
    /// Displayed alternatives changed
    Alternatives,
    /// Highlighted alternative changed
    Highlighted,
    /// Recognizer connection health changed
    Connection,
}

/// Session change record
#[derive(Debug, Clone)]
pub struct SessionChange {
    /// Change type
    pub change_type: SessionChangeType,
    /// Old version number
    pub old_version: u64,
    /// New version number
    pub new_version: u64,
}

/// Session change callback.
pub type SessionChangeCallback = Box<dyn FnMut(&SessionChange) + Send>;

/// Session state owner with change notifications.
///
/// Every setter that actually changes a value increments the version number and notifies
/// subscribers; setting a value to what it already is is silent.
#[derive(Default)]
pub struct SessionStateManager {
    state: SessionState,
    version: u64,
    callbacks: Vec<SessionChangeCallback>,
}

impl SessionStateManager {
    /// Create a manager with default state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current version number.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Check if state has changed since a version
    pub fn has_changed_since(&self, version: u64) -> bool {
        self.version > version
    }

    /// Subscribe to state change notifications
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&SessionChange) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Set the status line.
    pub fn set_status(&mut self, status: impl Into<String>) {
        let status = status.into();
        if self.state.status != status {
            self.state.status = status;
            self.mark_changed(SessionChangeType::Status);
        }
    }

    /// Set the input volume from a `0.0..=1.0` level.
    pub fn set_volume(&mut self, level: f64) {
        let volume = (level.clamp(0.0, 1.0) * 100.0).floor() as u32;
        if self.state.volume != volume {
            self.state.volume = volume;
            self.mark_changed(SessionChangeType::Volume);
        }
    }

    /// Set the listening flag.
    pub fn set_listening(&mut self, listening: bool) {
        if self.state.listening != listening {
            self.state.listening = listening;
            self.mark_changed(SessionChangeType::Listening);
        }
    }

    /// Replace the displayed alternatives and clear the highlight.
    pub fn show_alternatives(&mut self, alternatives: Vec<AlternativeView>) {
        self.state.highlighted = None;
        self.state.alternatives = alternatives;
        self.mark_changed(SessionChangeType::Alternatives);
    }

    /// Remove all displayed alternatives.
    pub fn clear_alternatives(&mut self) {
        if !self.state.alternatives.is_empty() || self.state.highlighted.is_some() {
            self.state.alternatives.clear();
            self.state.highlighted = None;
            self.mark_changed(SessionChangeType::Alternatives);
        }
    }

    /// Highlight the selectable alternative at 0-based `index`.
    pub fn set_highlighted(&mut self, index: Option<usize>) {
        if self.state.highlighted != index {
            self.state.highlighted = index;
            self.mark_changed(SessionChangeType::Highlighted);
        }
    }

    /// Record whether the recognizer is unreachable.
    pub fn set_connection_failed(&mut self, failed: bool) {
        if self.state.connection_failed != failed {
            self.state.connection_failed = failed;
            self.mark_changed(SessionChangeType::Connection);
        }
    }

    fn mark_changed(&mut self, change_type: SessionChangeType) {
        let old_version = self.version;
        self.version += 1;

        let change = SessionChange {
            change_type,
            old_version,
            new_version: self.version,
        };
        for callback in &mut self.callbacks {
            callback(&change);
        }
    }
}

impl std::fmt::Debug for SessionStateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStateManager")
            .field("state", &self.state)
            .field("version", &self.version)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, CommandSequence};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_subscribe_receives_changes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut manager = SessionStateManager::new();
        {
            let seen = Arc::clone(&seen);
            manager.subscribe(move |change| seen.lock().unwrap().push(change.change_type));
        }

        manager.set_status("Paused");
        manager.set_status("Paused");
        manager.set_listening(true);
        manager.set_volume(0.426);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                SessionChangeType::Status,
                SessionChangeType::Listening,
                SessionChangeType::Volume
            ]
        );
        assert_eq!(manager.state().volume, 42);
        assert_eq!(manager.version(), 3);
        assert!(manager.has_changed_since(2));
        assert!(!manager.has_changed_since(3));
    }

    #[test]
    fn test_alternative_numbering_skips_invalid() {
        let alternatives = vec![
            Alternative::new(vec![CommandSequence::new("one", vec![Command::Undo])]),
            Alternative::new(vec![CommandSequence::new("two", vec![Command::Invalid])]),
            Alternative::new(vec![CommandSequence::new("three", vec![Command::Redo])]),
        ];

        let views = AlternativeView::from_alternatives(&alternatives);
        let numbers: Vec<_> = views.iter().map(|view| view.number).collect();
        assert_eq!(numbers, vec![Some(1), None, Some(2)]);
        assert!(views[1].is_invalid());
        assert_eq!(views[1].description, "two");
    }

    #[test]
    fn test_show_alternatives_resets_highlight() {
        let mut manager = SessionStateManager::new();
        manager.set_highlighted(Some(1));
        manager.show_alternatives(Vec::new());
        assert_eq!(manager.state().highlighted, None);

        let version = manager.version();
        manager.clear_alternatives();
        assert_eq!(manager.version(), version);
    }
}
