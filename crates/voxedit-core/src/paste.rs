//! Paste insertion planning.
//!
//! Pasting by voice comes in two flavours:
//!
//! - **inline**: the clipboard is inserted verbatim at the cursor;
//! - **line paste**: triggered by an explicit direction ("paste above"/"paste below") or by a
//!   clipboard that ends in a newline. The clipboard becomes a whole line inserted at the start
//!   of the current line (above) or the following line (below).
//!
//! [`plan_paste`] only computes the resulting text and cursor. Applying it is a single
//! text-and-cursor replacement on the host so that undo restores both together.

use crate::position::{byte_index, char_len};
use serde::{Deserialize, Serialize};

/// Where a line paste goes relative to the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasteDirection {
    /// Insert before the current line.
    Above,
    /// Insert after the current line.
    Below,
}

/// The outcome of a paste: new buffer text and cursor, both in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastePlan {
    /// Full buffer text after the paste.
    pub text: String,
    /// Character offset where the clipboard was inserted.
    pub insertion_offset: usize,
    /// Character offset of the cursor after the paste.
    pub cursor: usize,
}

/// Plan a paste of `clipboard` into `source` at `insertion_offset`.
///
/// Offsets past the end of `source` are treated as the end of the buffer.
pub fn plan_paste(
    source: &str,
    insertion_offset: usize,
    clipboard: &str,
    direction: Option<PasteDirection>,
) -> PastePlan {
    let chars: Vec<char> = source.chars().collect();
    let mut offset = insertion_offset.min(chars.len());
    let mut clipboard = clipboard.to_string();

    let line_paste = direction.is_some() || clipboard.ends_with('\n');
    if line_paste {
        let trimmed = clipboard.trim_end_matches('\n').len();
        clipboard.truncate(trimmed);
        clipboard.push('\n');

        offset = match direction.unwrap_or(PasteDirection::Below) {
            PasteDirection::Below => next_line_start(&chars, offset),
            PasteDirection::Above => current_line_start(&chars, offset),
        };
    }

    let mut cursor = offset + char_len(&clipboard);
    if clipboard.ends_with('\n') {
        cursor -= 1;
    }

    let split = byte_index(source, offset);
    let mut text = String::with_capacity(source.len() + clipboard.len());
    text.push_str(&source[..split]);
    text.push_str(&clipboard);
    text.push_str(&source[split..]);

    PastePlan {
        text,
        insertion_offset: offset,
        cursor,
    }
}

/// Offset just after the next `\n` at or after `offset`, or the end of the buffer.
fn next_line_start(chars: &[char], offset: usize) -> usize {
    chars[offset..]
        .iter()
        .position(|ch| *ch == '\n')
        .map_or(chars.len(), |index| offset + index + 1)
}

/// Offset of the start of the line containing `offset`.
///
/// A cursor sitting on a line's `\n` belongs to that line, not the next one.
fn current_line_start(chars: &[char], mut offset: usize) -> usize {
    if offset > 0 && chars.get(offset) == Some(&'\n') {
        offset -= 1;
    }

    let scan_end = (offset + 1).min(chars.len());
    chars[..scan_end]
        .iter()
        .rposition(|ch| *ch == '\n')
        .map_or(0, |index| index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_paste() {
        let plan = plan_paste("hello world", 5, ",", None);
        assert_eq!(plan.text, "hello, world");
        assert_eq!(plan.insertion_offset, 5);
        assert_eq!(plan.cursor, 6);
    }

    #[test]
    fn test_paste_above_inside_first_line() {
        let plan = plan_paste("line1\nline2", 3, "x\n", Some(PasteDirection::Above));
        assert_eq!(plan.text, "x\nline1\nline2");
        assert_eq!(plan.insertion_offset, 0);
        assert_eq!(plan.cursor, 1);
    }

    #[test]
    fn test_paste_above_from_end_of_line() {
        // Cursor on the '\n' ending "line1" still pastes above "line1".
        let plan = plan_paste("line1\nline2", 5, "x", Some(PasteDirection::Above));
        assert_eq!(plan.text, "x\nline1\nline2");

        let plan = plan_paste("line1\nline2", 8, "x", Some(PasteDirection::Above));
        assert_eq!(plan.text, "line1\nx\nline2");
        assert_eq!(plan.insertion_offset, 6);
        assert_eq!(plan.cursor, 7);
    }

    #[test]
    fn test_paste_below_adds_newline() {
        let plan = plan_paste("line1\nline2", 2, "x", Some(PasteDirection::Below));
        assert_eq!(plan.text, "line1\nx\nline2");
        assert_eq!(plan.insertion_offset, 6);
        assert_eq!(plan.cursor, 7);
    }

    #[test]
    fn test_paste_below_last_line() {
        let plan = plan_paste("line1\nline2", 7, "x\n", Some(PasteDirection::Below));
        assert_eq!(plan.text, "line1\nline2x\n");
        assert_eq!(plan.insertion_offset, 11);
        assert_eq!(plan.cursor, 12);
    }

    #[test]
    fn test_newline_clipboard_defaults_to_below() {
        let implicit = plan_paste("a\nb\nc", 2, "foo\n", None);
        let explicit = plan_paste("a\nb\nc", 2, "foo\n", Some(PasteDirection::Below));
        assert_eq!(implicit, explicit);
        assert_eq!(implicit.text, "a\nb\nfoo\nc");
    }

    #[test]
    fn test_trailing_newlines_collapse_to_one() {
        let plan = plan_paste("a", 0, "x\n\n\n", Some(PasteDirection::Above));
        assert_eq!(plan.text, "x\na");
    }

    #[test]
    fn test_offset_past_end_is_end() {
        let plan = plan_paste("ab", 10, "c", None);
        assert_eq!(plan.text, "abc");
        assert_eq!(plan.cursor, 3);
    }

    #[test]
    fn test_multibyte_source() {
        let plan = plan_paste("你好\n世界", 1, "!", None);
        assert_eq!(plan.text, "你!好\n世界");
        assert_eq!(plan.cursor, 2);
    }
}
