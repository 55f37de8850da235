//! Text diff for highlight feedback.
//!
//! [`diff`] computes the ranges that changed between two buffer states. The output drives
//! transient highlighting after a voice edit, so it only needs to cover every changed character;
//! it is not a minimal edit script.
//!
//! Deletions are reported in coordinates of the **before** text and additions in coordinates of
//! the **after** text, so hosts can flash removed text before applying the edit and inserted text
//! after it.
//!
//! When every changed range is whitespace there is nothing visible to highlight, so the result
//! is empty and callers fall back to highlighting a whole line (see [`DiffRange::line`]). As soon
//! as one range is visible, whitespace ranges of the same edit are kept so every changed
//! character stays covered.

use crate::position::Position;
use serde::{Deserialize, Serialize};

/// Line grids larger than this skip line alignment and report the whole differing middle as one
/// hunk.
const MAX_ALIGNMENT_CELLS: usize = 1 << 20;

/// Edit type of a [`DiffRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffRangeKind {
    /// Text present only in the after buffer.
    Add,
    /// Text present only in the before buffer.
    Delete,
}

/// A changed region, `start` inclusive and `stop` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiffRange {
    /// Whether the range was added or deleted.
    pub kind: DiffRangeKind,
    /// First changed position.
    pub start: Position,
    /// Position just past the last changed character.
    pub stop: Position,
}

impl DiffRange {
    /// Range covering the full content of `row` in `text` (excluding its line break).
    ///
    /// Rows past the end of the buffer produce an empty range at the end of the last row.
    pub fn line(kind: DiffRangeKind, text: &str, row: usize) -> Self {
        let last_row = text.matches('\n').count();
        let row = row.min(last_row);
        let len = text.split('\n').nth(row).map_or(0, |line| line.chars().count());

        Self {
            kind,
            start: Position::new(row, 0),
            stop: Position::new(row, len),
        }
    }
}

/// Compute the added and deleted ranges that transform `before` into `after`.
///
/// Returns an empty list when the texts are equal or differ only in whitespace.
pub fn diff(before: &str, after: &str) -> Vec<DiffRange> {
    if before == after {
        return Vec::new();
    }

    let old: Vec<char> = before.chars().collect();
    let new: Vec<char> = after.chars().collect();

    let (prefix, suffix) = line_affixes(&old, &new);
    let old_mid = prefix..old.len() - suffix;
    let new_mid = prefix..new.len() - suffix;

    let old_map = RowMap::new(&old);
    let new_map = RowMap::new(&new);

    let mut ranges = Vec::new();
    let mut visible = false;
    for hunk in align_lines(&old, old_mid, &new, new_mid) {
        let (trim_start, trim_end) =
            common_affixes(&old[hunk.old.clone()], &new[hunk.new.clone()]);
        let old_range = hunk.old.start + trim_start..hunk.old.end - trim_end;
        let new_range = hunk.new.start + trim_start..hunk.new.end - trim_end;

        if !old_range.is_empty() {
            visible |= is_visible(&old[old_range.clone()]);
            ranges.push(DiffRange {
                kind: DiffRangeKind::Delete,
                start: old_map.position(old_range.start),
                stop: old_map.position(old_range.end),
            });
        }
        if !new_range.is_empty() {
            visible |= is_visible(&new[new_range.clone()]);
            ranges.push(DiffRange {
                kind: DiffRangeKind::Add,
                start: new_map.position(new_range.start),
                stop: new_map.position(new_range.end),
            });
        }
    }

    if !visible {
        ranges.clear();
    }
    ranges
}

/// A pair of differing char ranges (old buffer, new buffer).
#[derive(Debug, Clone, PartialEq, Eq)]
struct Hunk {
    old: std::ops::Range<usize>,
    new: std::ops::Range<usize>,
}

/// Lengths of the common prefix and the common suffix; never overlapping.
fn common_affixes(a: &[char], b: &[char]) -> (usize, usize) {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let max_suffix = a.len().min(b.len()) - prefix;
    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take(max_suffix)
        .take_while(|(x, y)| x == y)
        .count();
    (prefix, suffix)
}

/// Like [`common_affixes`], but shrunk so both affixes cover whole lines only.
fn line_affixes(a: &[char], b: &[char]) -> (usize, usize) {
    let (prefix, suffix) = common_affixes(a, b);
    let prefix = a[..prefix]
        .iter()
        .rposition(|ch| *ch == '\n')
        .map_or(0, |index| index + 1);

    let at_line_start = |chars: &[char], start: usize| start == 0 || chars[start - 1] == '\n';
    let (a_start, b_start) = (a.len() - suffix, b.len() - suffix);
    let suffix = if at_line_start(a, a_start) && at_line_start(b, b_start) {
        suffix
    } else {
        a[a_start..]
            .iter()
            .position(|ch| *ch == '\n')
            .map_or(0, |index| suffix - (index + 1))
    };

    (prefix, suffix)
}

fn is_visible(chars: &[char]) -> bool {
    chars.iter().any(|ch| !ch.is_whitespace())
}

/// Split `range` of `chars` into line spans, each including its trailing `\n`.
fn line_spans(chars: &[char], range: std::ops::Range<usize>) -> Vec<std::ops::Range<usize>> {
    let mut spans = Vec::new();
    let mut start = range.start;
    for index in range.clone() {
        if chars[index] == '\n' {
            spans.push(start..index + 1);
            start = index + 1;
        }
    }
    if start < range.end {
        spans.push(start..range.end);
    }
    spans
}

/// Align the lines of two differing regions with an LCS and return the unmatched hunks.
fn align_lines(
    old: &[char],
    old_range: std::ops::Range<usize>,
    new: &[char],
    new_range: std::ops::Range<usize>,
) -> Vec<Hunk> {
    let whole = Hunk {
        old: old_range.clone(),
        new: new_range.clone(),
    };

    let old_lines = line_spans(old, old_range.clone());
    let new_lines = line_spans(new, new_range.clone());
    let (n, m) = (old_lines.len(), new_lines.len());
    if n == 0 || m == 0 || (n + 1).saturating_mul(m + 1) > MAX_ALIGNMENT_CELLS {
        return vec![whole];
    }

    let same = |i: usize, j: usize| old[old_lines[i].clone()] == new[new_lines[j].clone()];

    // lcs[i * (m + 1) + j] = LCS length of old_lines[i..] and new_lines[j..]
    let width = m + 1;
    let mut lcs = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i * width + j] = if same(i, j) {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let line_start = |lines: &[std::ops::Range<usize>], index: usize, end: usize| {
        lines.get(index).map_or(end, |span| span.start)
    };

    let mut hunks = Vec::new();
    let mut open: Option<(usize, usize)> = None;
    let (mut i, mut j) = (0, 0);

    while i < n || j < m {
        let on_match = i < n
            && j < m
            && same(i, j)
            && lcs[i * width + j] == lcs[(i + 1) * width + j + 1] + 1;
        if on_match {
            if let Some((oi, oj)) = open.take() {
                hunks.push(Hunk {
                    old: line_start(&old_lines, oi, old_range.end)
                        ..line_start(&old_lines, i, old_range.end),
                    new: line_start(&new_lines, oj, new_range.end)
                        ..line_start(&new_lines, j, new_range.end),
                });
            }
            i += 1;
            j += 1;
            continue;
        }

        open.get_or_insert((i, j));
        if j >= m || (i < n && lcs[(i + 1) * width + j] >= lcs[i * width + j + 1]) {
            i += 1;
        } else {
            j += 1;
        }
    }

    if let Some((oi, oj)) = open {
        hunks.push(Hunk {
            old: line_start(&old_lines, oi, old_range.end)..old_range.end,
            new: line_start(&new_lines, oj, new_range.end)..new_range.end,
        });
    }

    hunks
}

/// Offset → position lookups against a fixed buffer.
struct RowMap {
    row_starts: Vec<usize>,
}

impl RowMap {
    fn new(chars: &[char]) -> Self {
        let mut row_starts = vec![0];
        row_starts.extend(
            chars
                .iter()
                .enumerate()
                .filter(|(_, ch)| **ch == '\n')
                .map(|(index, _)| index + 1),
        );
        Self { row_starts }
    }

    fn position(&self, offset: usize) -> Position {
        let row = self
            .row_starts
            .partition_point(|start| *start <= offset)
            .saturating_sub(1);
        Position::new(row, offset - self.row_starts[row])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::offset_to_position;

    fn range(kind: DiffRangeKind, start: (usize, usize), stop: (usize, usize)) -> DiffRange {
        DiffRange {
            kind,
            start: Position::new(start.0, start.1),
            stop: Position::new(stop.0, stop.1),
        }
    }

    #[test]
    fn test_identical_texts() {
        assert!(diff("same\ntext", "same\ntext").is_empty());
        assert!(diff("", "").is_empty());
    }

    #[test]
    fn test_single_line_replacement() {
        assert_eq!(
            diff("a\nb", "a\nc"),
            vec![
                range(DiffRangeKind::Delete, (1, 0), (1, 1)),
                range(DiffRangeKind::Add, (1, 0), (1, 1)),
            ]
        );
    }

    #[test]
    fn test_pure_insertion() {
        assert_eq!(
            diff("hello world", "hello big world"),
            vec![range(DiffRangeKind::Add, (0, 6), (0, 10))]
        );
    }

    #[test]
    fn test_pure_deletion_across_lines() {
        assert_eq!(
            diff("one\ntwo\nthree", "one\nthree"),
            vec![range(DiffRangeKind::Delete, (1, 0), (2, 0))]
        );
    }

    #[test]
    fn test_separate_hunks_keep_unchanged_lines_out() {
        let before = "alpha\nkeep\nbeta\n";
        let after = "ALPHA\nkeep\nBETA\n";
        let ranges = diff(before, after);

        assert_eq!(
            ranges,
            vec![
                range(DiffRangeKind::Delete, (0, 0), (0, 5)),
                range(DiffRangeKind::Add, (0, 0), (0, 5)),
                range(DiffRangeKind::Delete, (2, 0), (2, 4)),
                range(DiffRangeKind::Add, (2, 0), (2, 4)),
            ]
        );
    }

    #[test]
    fn test_whitespace_only_change_is_empty() {
        assert!(diff("a b", "a  b").is_empty());
        assert!(diff("x\n", "x\n\n").is_empty());
    }

    #[test]
    fn test_whitespace_hunk_kept_beside_visible_change() {
        assert_eq!(
            diff("a\nkeep\nb", "A\nkeep\n b"),
            vec![
                range(DiffRangeKind::Delete, (0, 0), (0, 1)),
                range(DiffRangeKind::Add, (0, 0), (0, 1)),
                range(DiffRangeKind::Add, (2, 0), (2, 1)),
            ]
        );
    }

    #[test]
    fn test_ranges_are_valid_positions() {
        let before = "fn main() {\n    let x = 1;\n}\n";
        let after = "fn main() {\n    let y = 2;\n    print(y);\n}\n";
        for r in diff(before, after) {
            let text = match r.kind {
                DiffRangeKind::Delete => before,
                DiffRangeKind::Add => after,
            };
            let end = crate::position::position_to_offset(text, r.stop);
            assert_eq!(offset_to_position(text, end).unwrap(), r.stop);
            assert!(r.start <= r.stop);
        }
    }

    #[test]
    fn test_line_range() {
        let text = "first\nsecond\n";
        assert_eq!(
            DiffRange::line(DiffRangeKind::Add, text, 1),
            range(DiffRangeKind::Add, (1, 0), (1, 6))
        );
        assert_eq!(
            DiffRange::line(DiffRangeKind::Add, text, 9),
            range(DiffRangeKind::Add, (2, 0), (2, 0))
        );
    }
}
