//! Marker buffer — the single tracked string behind the caret tracker.
//!
//! The buffer holds everything we believe the host text field contains, plus
//! zero or one embedded position marker:
//!
//! * [`CARET_MARKER`] — the caret is exactly here.
//! * [`COARSE_MARKER`] — the caret is somewhere on this line, column unknown.
//!
//! No marker at all means the position is unknown; the canonical unknown
//! state is the empty buffer.  A selection is tracked separately as an
//! anchor `(line, chars_from_line_end)` pair — the selection's other edge is
//! always the caret itself.
//!
//! All mutation primitives clamp out-of-range arguments instead of failing;
//! "I don't know" is a representable state, never an error.

use std::fmt;

/// Exact-position marker (U+2038 CARET).
pub const CARET_MARKER: char = '\u{2038}';
/// Line-only position marker (U+2248 ALMOST EQUAL TO).
pub const COARSE_MARKER: char = '\u{2248}';

// ---------------------------------------------------------------------------
// MarkerKind / CaretState
// ---------------------------------------------------------------------------

/// Which marker is embedded in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Line and column are both known.
    Exact,
    /// Only the line is known.
    Coarse,
}

/// Best-effort caret position derived from the buffer contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretState {
    /// Nothing is known; the buffer is empty.
    Unknown,
    /// The caret is somewhere on `line`, column unknown.
    Coarse { line: usize },
    /// The caret is on `line`, `chars_from_line_end` characters before the
    /// line's last character (0 = at end of line).
    Exact {
        line: usize,
        chars_from_line_end: usize,
    },
}

impl CaretState {
    pub fn is_known(&self) -> bool {
        !matches!(self, CaretState::Unknown)
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            CaretState::Unknown => None,
            CaretState::Coarse { line } | CaretState::Exact { line, .. } => Some(*line),
        }
    }
}

impl fmt::Display for CaretState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaretState::Unknown => write!(f, "unknown"),
            CaretState::Coarse { line } => write!(f, "line {line}, column unknown"),
            CaretState::Exact {
                line,
                chars_from_line_end,
            } => write!(f, "line {line}, {chars_from_line_end} from line end"),
        }
    }
}

/// Selection anchor position, stored line-relative so the pair survives
/// edits on other lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionAnchor {
    pub line: usize,
    pub chars_from_line_end: usize,
}

/// Outcome of a horizontal marker move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// The move would step before the first known character or past the
    /// last one — the caller should clear the buffer.
    OutOfBounds,
}

// ---------------------------------------------------------------------------
// MarkerBuffer
// ---------------------------------------------------------------------------

/// The tracked text with at most one embedded position marker.
#[derive(Debug, Clone, Default)]
pub struct MarkerBuffer {
    text: String,
    selection_anchor: Option<SelectionAnchor>,
}

impl MarkerBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The raw buffer text, marker included when present.
    pub fn raw_text(&self) -> &str {
        &self.text
    }

    /// The buffer text with any marker stripped.
    pub fn text(&self) -> String {
        self.text
            .chars()
            .filter(|c| *c != CARET_MARKER && *c != COARSE_MARKER)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Marker kind and its char index within the raw text.
    pub fn marker(&self) -> Option<(MarkerKind, usize)> {
        for (i, c) in self.text.chars().enumerate() {
            if c == CARET_MARKER {
                return Some((MarkerKind::Exact, i));
            }
            if c == COARSE_MARKER {
                return Some((MarkerKind::Coarse, i));
            }
        }
        None
    }

    pub fn selection_anchor(&self) -> Option<SelectionAnchor> {
        self.selection_anchor
    }

    /// Current caret state derived from the marker position.
    pub fn caret_state(&self) -> CaretState {
        let Some((kind, index)) = self.marker() else {
            return CaretState::Unknown;
        };
        let chars: Vec<char> = self.text.chars().collect();
        let line = chars[..index].iter().filter(|c| **c == '\n').count();
        match kind {
            MarkerKind::Coarse => CaretState::Coarse { line },
            MarkerKind::Exact => {
                let mut from_end = 0;
                for c in &chars[index + 1..] {
                    if *c == '\n' {
                        break;
                    }
                    from_end += 1;
                }
                CaretState::Exact {
                    line,
                    chars_from_line_end: from_end,
                }
            }
        }
    }

    /// Char index of the caret in the marker-stripped text.  `None` unless
    /// the marker is exact.
    pub fn caret_char_index(&self) -> Option<usize> {
        match self.marker() {
            Some((MarkerKind::Exact, index)) => Some(index),
            _ => None,
        }
    }

    /// Number of lines in the (marker-stripped) text.  An empty buffer has
    /// zero lines.
    pub fn line_count(&self) -> usize {
        let text = self.text();
        if text.is_empty() {
            0
        } else {
            text.chars().filter(|c| *c == '\n').count() + 1
        }
    }

    /// Text of one line, marker stripped, without its trailing newline.
    pub fn line_text(&self, line: usize) -> Option<String> {
        let text = self.text();
        if text.is_empty() {
            return None;
        }
        text.split('\n').nth(line).map(str::to_string)
    }

    /// Char index (in marker-stripped text) where `line` starts.
    pub fn line_start_index(&self, line: usize) -> Option<usize> {
        let text = self.text();
        if text.is_empty() {
            return None;
        }
        let mut index = 0;
        for (i, segment) in text.split('\n').enumerate() {
            if i == line {
                return Some(index);
            }
            index += segment.chars().count() + 1;
        }
        None
    }

    /// Char index in the marker-stripped text for a `(line, from_end)` pair.
    pub fn index_of_position(&self, line: usize, chars_from_line_end: usize) -> Option<usize> {
        let start = self.line_start_index(line)?;
        let len = self.line_text(line)?.chars().count();
        Some(start + len.saturating_sub(chars_from_line_end))
    }

    // -----------------------------------------------------------------------
    // Whole-buffer mutation
    // -----------------------------------------------------------------------

    /// Drop all knowledge.  The empty buffer is the canonical unknown state.
    pub fn clear(&mut self) {
        self.text.clear();
        self.selection_anchor = None;
    }

    /// Replace the buffer with text whose caret position is unknown.  The
    /// text itself is still trusted (e.g. a host resync that reported no
    /// caret), so searches keep working while navigation degrades.
    pub fn set_unmarked(&mut self, text: &str) {
        self.text = strip_markers(text);
        self.selection_anchor = None;
    }

    /// Replace the buffer with `before` + marker + `after`.  Marker chars in
    /// the inputs are stripped so the one-marker invariant holds.
    pub fn set(&mut self, before: &str, after: &str, kind: MarkerKind) {
        let marker = match kind {
            MarkerKind::Exact => CARET_MARKER,
            MarkerKind::Coarse => COARSE_MARKER,
        };
        self.text = strip_markers(before);
        self.text.push(marker);
        self.text.push_str(&strip_markers(after));
        self.selection_anchor = None;
    }

    pub fn set_selection_anchor(&mut self, anchor: Option<SelectionAnchor>) {
        self.selection_anchor = anchor;
    }

    // -----------------------------------------------------------------------
    // Marker repositioning
    // -----------------------------------------------------------------------

    /// Move the exact marker `delta` characters (negative = left).  Crossing
    /// newlines is fine; stepping outside the known text is reported as
    /// [`MoveOutcome::OutOfBounds`] and leaves the buffer untouched.
    pub fn move_marker(&mut self, delta: isize) -> MoveOutcome {
        let Some((MarkerKind::Exact, index)) = self.marker() else {
            return MoveOutcome::OutOfBounds;
        };
        let mut chars: Vec<char> = self.text.chars().collect();
        chars.remove(index);
        let target = index as isize + delta;
        if target < 0 || target > chars.len() as isize {
            // `chars` is a working copy; the buffer itself is untouched.
            return MoveOutcome::OutOfBounds;
        }
        chars.insert(target as usize, CARET_MARKER);
        self.text = chars.into_iter().collect();
        MoveOutcome::Moved
    }

    /// Place the exact marker at `(line, chars_from_line_end)`, clamping the
    /// column to the line length.
    pub fn place_exact(&mut self, line: usize, chars_from_line_end: usize) -> bool {
        let Some(line_text) = self.line_text(line) else {
            return false;
        };
        let len = line_text.chars().count();
        let column = len.saturating_sub(chars_from_line_end.min(len));
        let Some(start) = self.line_start_index(line) else {
            return false;
        };
        self.place_marker_at(start + column, CARET_MARKER);
        true
    }

    /// Place the coarse marker on `line` (column meaningless; the marker
    /// sits at the line start purely as a representation choice).
    pub fn place_coarse(&mut self, line: usize) -> bool {
        let Some(start) = self.line_start_index(line) else {
            return false;
        };
        self.place_marker_at(start, COARSE_MARKER);
        true
    }

    /// Place the exact marker at a char index of the marker-stripped text.
    pub fn place_exact_index(&mut self, stripped_index: usize) {
        self.place_marker_at(stripped_index, CARET_MARKER);
    }

    /// Remove the chars in `start..end` (marker-stripped indices) and leave
    /// the exact marker at `start`.  Out-of-range bounds clamp.
    pub fn remove_range(&mut self, start: usize, end: usize) {
        let mut chars: Vec<char> = self.text().chars().collect();
        let end = end.min(chars.len());
        let start = start.min(end);
        chars.drain(start..end);
        chars.insert(start, CARET_MARKER);
        self.text = chars.into_iter().collect();
        self.selection_anchor = None;
    }

    fn place_marker_at(&mut self, stripped_index: usize, marker: char) {
        let mut chars: Vec<char> = self.text().chars().collect();
        let index = stripped_index.min(chars.len());
        chars.insert(index, marker);
        self.text = chars.into_iter().collect();
    }

    // -----------------------------------------------------------------------
    // Text mutation around the marker
    // -----------------------------------------------------------------------

    /// Insert `text` immediately before the marker.  On an empty buffer the
    /// text becomes the whole content with the caret after it (typing into
    /// an unknown field tells us exactly where the caret is: right after
    /// what we typed).
    pub fn insert_before_marker(&mut self, inserted: &str) {
        let inserted = strip_markers(inserted);
        if self.text.is_empty() {
            self.text = inserted;
            self.text.push(CARET_MARKER);
            return;
        }
        match self.marker() {
            Some((MarkerKind::Exact, index)) => {
                let mut chars: Vec<char> = self.text.chars().collect();
                let tail: Vec<char> = chars.split_off(index);
                chars.extend(inserted.chars());
                chars.extend(tail);
                self.text = chars.into_iter().collect();
            }
            // Column unknown: the surrounding line content can no longer be
            // trusted, so knowledge collapses to just the inserted text.
            _ => {
                self.text = inserted;
                self.text.push(CARET_MARKER);
                self.selection_anchor = None;
            }
        }
    }

    /// Remove up to `count` characters before the marker.  Returns how many
    /// were actually removed.
    pub fn remove_before_marker(&mut self, count: usize) -> usize {
        let Some((MarkerKind::Exact, index)) = self.marker() else {
            self.clear();
            return 0;
        };
        let mut chars: Vec<char> = self.text.chars().collect();
        let removed = count.min(index);
        chars.drain(index - removed..index);
        self.text = chars.into_iter().collect();
        removed
    }

    /// Remove up to `count` characters after the marker.  Returns how many
    /// were actually removed.
    pub fn remove_after_marker(&mut self, count: usize) -> usize {
        let Some((MarkerKind::Exact, index)) = self.marker() else {
            self.clear();
            return 0;
        };
        let mut chars: Vec<char> = self.text.chars().collect();
        let available = chars.len() - index - 1;
        let removed = count.min(available);
        chars.drain(index + 1..index + 1 + removed);
        self.text = chars.into_iter().collect();
        removed
    }
}

fn strip_markers(text: &str) -> String {
    text.chars()
        .filter(|c| *c != CARET_MARKER && *c != COARSE_MARKER)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn exact_buffer(before: &str, after: &str) -> MarkerBuffer {
        let mut buffer = MarkerBuffer::new();
        buffer.set(before, after, MarkerKind::Exact);
        buffer
    }

    #[test]
    fn empty_buffer_is_unknown() {
        let buffer = MarkerBuffer::new();
        assert_eq!(buffer.caret_state(), CaretState::Unknown);
        assert_eq!(buffer.line_count(), 0);
    }

    #[test]
    fn exact_state_reports_line_and_column() {
        let buffer = exact_buffer("first line\nsec", "ond line");
        assert_eq!(
            buffer.caret_state(),
            CaretState::Exact {
                line: 1,
                chars_from_line_end: 8
            }
        );
    }

    #[test]
    fn coarse_state_reports_line_only() {
        let mut buffer = MarkerBuffer::new();
        buffer.set("one\ntwo", "", MarkerKind::Exact);
        assert!(buffer.place_coarse(0));
        assert_eq!(buffer.caret_state(), CaretState::Coarse { line: 0 });
    }

    #[test]
    fn move_marker_crosses_newlines() {
        let mut buffer = exact_buffer("ab\nc", "d");
        assert_eq!(buffer.move_marker(-2), MoveOutcome::Moved);
        assert_eq!(
            buffer.caret_state(),
            CaretState::Exact {
                line: 0,
                chars_from_line_end: 0
            }
        );
    }

    #[test]
    fn move_marker_out_of_bounds_reports() {
        let mut buffer = exact_buffer("ab", "cd");
        assert_eq!(buffer.move_marker(-3), MoveOutcome::OutOfBounds);
        assert_eq!(buffer.move_marker(3), MoveOutcome::OutOfBounds);
        // Buffer unchanged after a rejected move.
        assert_eq!(buffer.text(), "abcd");
    }

    #[test]
    fn insert_into_empty_buffer_sets_caret_after_text() {
        let mut buffer = MarkerBuffer::new();
        buffer.insert_before_marker("hello ");
        assert_eq!(buffer.text(), "hello ");
        assert_eq!(
            buffer.caret_state(),
            CaretState::Exact {
                line: 0,
                chars_from_line_end: 0
            }
        );
    }

    #[test]
    fn removals_clamp_to_available_text() {
        let mut buffer = exact_buffer("abc", "de");
        assert_eq!(buffer.remove_before_marker(10), 3);
        assert_eq!(buffer.remove_after_marker(10), 2);
        assert_eq!(buffer.text(), "");
    }

    #[test]
    fn marker_chars_in_input_are_stripped() {
        let mut buffer = MarkerBuffer::new();
        buffer.set(&format!("a{CARET_MARKER}b"), "c", MarkerKind::Exact);
        assert_eq!(buffer.text(), "abc");
        assert_eq!(buffer.marker().map(|(kind, _)| kind), Some(MarkerKind::Exact));
    }

    #[test]
    fn index_of_position_resolves_from_line_end() {
        let buffer = exact_buffer("Insert a second sentence. \nmo", "re");
        // 17 from the end of line 0 ("Insert a second sentence. " = 26 chars)
        assert_eq!(buffer.index_of_position(0, 17), Some(9));
    }
}
