//! Position codec
//!
//! Converts between linear character offsets ("cursors", as the recognizer reports them) and
//! `(row, column)` coordinates (as host editors address selections).
//!
//! Both directions are plain linear scans over the text. Offsets and columns count Unicode
//! scalar values (`char`s), never bytes, so a buffer containing CJK text or emoji round-trips the
//! same way ASCII does.
//!
//! # Example
//!
//! ```rust
//! use voxedit_core::{Position, offset_to_position, position_to_offset};
//!
//! let text = "ab\ncd";
//! let position = offset_to_position(text, 4).unwrap();
//! assert_eq!(position, Position::new(1, 1));
//! assert_eq!(position_to_offset(text, position), 4);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// Row/column coordinates in a text buffer (both zero-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Number of `\n` characters before this position.
    pub row: usize,
    /// Characters since the last `\n` (or the start of the buffer).
    pub column: usize,
}

impl Position {
    /// Create a new position.
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row
            .cmp(&other.row)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Position codec errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("offset {offset} is out of range for a buffer of {len} characters")]
    /// The offset lies past the end of the buffer.
    OutOfRange {
        /// Requested character offset.
        offset: usize,
        /// Buffer length in characters.
        len: usize,
    },
}

/// Convert a character offset into a row/column position.
///
/// `offset == len` (the end-of-buffer insertion point) is valid. Anything beyond it fails with
/// [`CodecError::OutOfRange`]; the caller decides whether to clamp.
pub fn offset_to_position(text: &str, offset: usize) -> Result<Position, CodecError> {
    let mut position = Position::default();
    let mut consumed = 0;

    for ch in text.chars() {
        if consumed == offset {
            return Ok(position);
        }

        if ch == '\n' {
            position.row += 1;
            position.column = 0;
        } else {
            position.column += 1;
        }
        consumed += 1;
    }

    if consumed == offset {
        Ok(position)
    } else {
        Err(CodecError::OutOfRange {
            offset,
            len: consumed,
        })
    }
}

/// Convert a row/column position into a character offset.
///
/// If the buffer ends before `position` is reached (row past the last row, or a column past the
/// end of its row), the end-of-buffer offset is returned. Editors routinely report a cursor one
/// past the last character of a row, so this is not treated as an error.
pub fn position_to_offset(text: &str, position: Position) -> usize {
    let mut offset = 0;
    let mut row = 0;
    let mut column = 0;

    for ch in text.chars() {
        if row == position.row {
            if column == position.column {
                return offset;
            }
            column += 1;
        }

        if ch == '\n' {
            row += 1;
        }
        offset += 1;
    }

    offset
}

/// Character length of `text`, the largest valid offset.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Convert a character offset into a byte index usable for slicing `text`.
///
/// Offsets past the end map to `text.len()`.
pub fn byte_index(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}
