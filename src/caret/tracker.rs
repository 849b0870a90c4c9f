//! Caret tracker — replays key events against the marker buffer.
//!
//! The tracker never observes the host caret directly.  It starts from
//! whatever text the context layer last synced in, then folds every key
//! press the front-end issues into a best-effort position.  Any movement
//! whose outcome cannot be determined clears the buffer back to the unknown
//! state rather than guessing.
//!
//! # States
//!
//! | State | Buffer contents |
//! |-------|-----------------|
//! | `Unknown` | empty buffer, no marker |
//! | `Coarse` | coarse marker — line known, column unknown |
//! | `Exact` | exact marker — line and column known |
//! | selecting | exact marker plus a selection anchor at a different index |
//!
//! # Degradation rules
//!
//! * Horizontal movement past the first/last known character clears.
//! * Vertical movement always lands Coarse (the landing column depends on
//!   host state we cannot see).
//! * Word jumps re-derive the column from the current line's text and clear
//!   when they would cross onto a line we would then know nothing about.
//! * Unrecognised hotkeys clear — they are assumed to change focus or
//!   content behind our back.

use log::{debug, trace};

use crate::keys::{parse_descriptors, KeyEvent, KeyParseError, KeyPress, KeyTarget, Modifier};

use super::buffer::{
    CaretState, MarkerBuffer, MarkerKind, MoveOutcome, SelectionAnchor,
};

// ---------------------------------------------------------------------------
// CaretTracker
// ---------------------------------------------------------------------------

/// Replays key-event descriptors to maintain a best-effort caret position
/// over an externally-edited text field.
#[derive(Debug, Default)]
pub struct CaretTracker {
    buffer: MarkerBuffer,
    shift_down: bool,
}

impl CaretTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Tracked text with markers stripped.
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn state(&self) -> CaretState {
        self.buffer.caret_state()
    }

    /// Char index of the caret in the tracked text, when exactly known.
    pub fn caret_index(&self) -> Option<usize> {
        self.buffer.caret_char_index()
    }

    /// Whether a selection with a nonzero extent is live.
    pub fn is_selecting(&self) -> bool {
        self.selection_range().is_some_and(|(start, end)| start != end)
    }

    /// Char range of the live selection in the tracked text.
    pub fn selection_range(&self) -> Option<(usize, usize)> {
        let caret = self.buffer.caret_char_index()?;
        let anchor = self.anchor_index()?;
        Some((caret.min(anchor), caret.max(anchor)))
    }

    fn anchor_index(&self) -> Option<usize> {
        let anchor = self.buffer.selection_anchor()?;
        self.buffer
            .index_of_position(anchor.line, anchor.chars_from_line_end)
    }

    // -----------------------------------------------------------------------
    // Buffer mutation primitives (used by the token buffer)
    // -----------------------------------------------------------------------

    /// Insert text at the caret.  A live selection is replaced, as a real
    /// editor would.
    pub fn append_before_caret(&mut self, text: &str) {
        if self.is_selecting() {
            self.remove_selection();
        }
        self.buffer.insert_before_marker(text);
    }

    /// Remove up to `count` chars before the caret, clamping.  Degrades to
    /// Unknown when the column is not exactly known.
    pub fn remove_before_caret(&mut self, count: usize) -> usize {
        self.buffer.remove_before_marker(count)
    }

    /// Remove up to `count` chars after the caret, clamping.
    pub fn remove_after_caret(&mut self, count: usize) -> usize {
        self.buffer.remove_after_marker(count)
    }

    /// Replace the whole tracked buffer (used when resyncing from host
    /// accessibility text).
    pub fn set_buffer(&mut self, before: &str, after: &str, kind: MarkerKind) {
        self.buffer.set(before, after, kind);
    }

    /// Replace the tracked text without any caret knowledge (host resync
    /// that reported no caret).  Searches keep working; navigation degrades
    /// until the next insertion or resync pins the position.
    pub fn set_unmarked_text(&mut self, text: &str) {
        self.buffer.set_unmarked(text);
    }

    /// Record a selection anchor at a known `(line, chars_from_line_end)`
    /// position (resync with a reported selection).
    pub fn set_selection_anchor(&mut self, line: usize, chars_from_line_end: usize) {
        self.buffer.set_selection_anchor(Some(SelectionAnchor {
            line,
            chars_from_line_end,
        }));
    }

    /// Remove the selected text, leaving the caret at the left edge.
    pub fn remove_selection(&mut self) {
        if let Some((start, end)) = self.selection_range() {
            self.buffer.remove_range(start, end);
        } else {
            self.buffer.set_selection_anchor(None);
        }
    }

    /// Drop all position knowledge.
    pub fn clear(&mut self) {
        debug!("caret tracker desynchronized, clearing buffer");
        self.buffer.clear();
    }

    // -----------------------------------------------------------------------
    // Key replay
    // -----------------------------------------------------------------------

    /// Parse and replay a space-separated descriptor batch.
    pub fn apply_keys(&mut self, descriptors: &str) -> Result<(), KeyParseError> {
        for event in parse_descriptors(descriptors)? {
            self.apply_key(&event);
        }
        Ok(())
    }

    /// Replay one parsed key event.
    pub fn apply_key(&mut self, event: &KeyEvent) {
        trace!("replaying key event {event} against state {}", self.state());
        match event {
            KeyEvent::Hold {
                modifier: Modifier::Shift,
                down,
            } => {
                self.shift_down = *down;
                if *down {
                    self.ensure_anchor();
                }
            }
            // Holding a non-shift modifier on its own changes nothing.
            KeyEvent::Hold { .. } => {}
            KeyEvent::Press(press) => self.handle_press(press),
        }
    }

    fn handle_press(&mut self, press: &KeyPress) {
        let shift = self.shift_down || press.has_modifier(Modifier::Shift);
        let word_jump = press.has_word_jump_modifier();

        match &press.target {
            KeyTarget::Left | KeyTarget::Right => {
                let right = press.target == KeyTarget::Right;
                if word_jump {
                    if shift {
                        // Word-wise selection extension is untrackable once
                        // the column re-derivation degrades; give up early.
                        self.clear();
                    } else {
                        self.word_jump(right, press.count);
                    }
                } else if shift {
                    self.selection_step(right, press.count);
                } else {
                    self.horizontal_step(right, press.count);
                }
            }
            KeyTarget::Up | KeyTarget::Down => {
                if shift {
                    self.clear();
                } else {
                    self.vertical_step(press.target == KeyTarget::Down, press.count);
                }
            }
            KeyTarget::Home => {
                if shift {
                    self.clear();
                } else {
                    self.go_home();
                }
            }
            KeyTarget::End => self.go_end(shift),
            KeyTarget::Backspace => {
                if self.is_selecting() {
                    self.remove_selection();
                } else {
                    self.remove_before_caret(press.count);
                }
            }
            KeyTarget::Delete => {
                if self.is_selecting() {
                    self.remove_selection();
                } else {
                    self.remove_after_caret(press.count);
                }
            }
            KeyTarget::Hotkey(c) => self.handle_hotkey(*c, press),
            KeyTarget::Other(_) => self.clear(),
        }
    }

    /// `ctrl-s`/`ctrl-c`/`ctrl-v` are issued by the front-end itself with a
    /// known effect on caret position (none).  `ctrl-x` removes a live
    /// selection.  Every other combination desynchronizes.
    fn handle_hotkey(&mut self, c: char, press: &KeyPress) {
        let plain_word_modifier = press.has_word_jump_modifier()
            && !press.has_modifier(Modifier::Alt)
            && !press.has_modifier(Modifier::Shift);
        if plain_word_modifier {
            match c {
                's' | 'c' | 'v' => return,
                'x' => {
                    if self.is_selecting() {
                        self.remove_selection();
                    }
                    return;
                }
                _ => {}
            }
        }
        self.clear();
    }

    // -----------------------------------------------------------------------
    // Horizontal movement
    // -----------------------------------------------------------------------

    fn horizontal_step(&mut self, right: bool, count: usize) {
        let mut remaining = count;

        // Collapsing a live selection consumes the first keystroke: the
        // caret lands on the selection edge in the direction of travel.
        if self.is_selecting() {
            let Some((start, end)) = self.selection_range() else {
                self.clear();
                return;
            };
            let edge = if right { end } else { start };
            self.buffer.set_selection_anchor(None);
            self.buffer.place_exact_index(edge);
            remaining -= 1;
        } else {
            self.buffer.set_selection_anchor(None);
        }

        if remaining == 0 {
            return;
        }

        match self.state() {
            CaretState::Exact { .. } => {
                let delta = if right {
                    remaining as isize
                } else {
                    -(remaining as isize)
                };
                if self.buffer.move_marker(delta) == MoveOutcome::OutOfBounds {
                    self.clear();
                }
            }
            // Column unknown: a single horizontal step may silently cross a
            // line edge, so nothing about the landing spot can be trusted.
            _ => self.clear(),
        }
    }

    fn selection_step(&mut self, right: bool, count: usize) {
        if !matches!(self.state(), CaretState::Exact { .. }) {
            self.clear();
            return;
        }
        self.ensure_anchor();
        let delta = if right { count as isize } else { -(count as isize) };
        if self.buffer.move_marker(delta) == MoveOutcome::OutOfBounds {
            self.clear();
        }
    }

    /// Record the current caret as the selection anchor if none is live.
    fn ensure_anchor(&mut self) {
        if self.buffer.selection_anchor().is_none() {
            if let CaretState::Exact {
                line,
                chars_from_line_end,
            } = self.state()
            {
                self.buffer.set_selection_anchor(Some(SelectionAnchor {
                    line,
                    chars_from_line_end,
                }));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Word jumps
    // -----------------------------------------------------------------------

    fn word_jump(&mut self, right: bool, count: usize) {
        self.buffer.set_selection_anchor(None);
        match self.state() {
            CaretState::Exact {
                line,
                chars_from_line_end,
            } => {
                let Some(line_text) = self.buffer.line_text(line) else {
                    self.clear();
                    return;
                };
                let chars: Vec<char> = line_text.chars().collect();
                let mut column = chars.len().saturating_sub(chars_from_line_end);
                for _ in 0..count {
                    match jump_within_line(&chars, column, right) {
                        Some(next) => column = next,
                        None => {
                            // The jump would continue onto a neighboring
                            // line whose landing spot we cannot derive.
                            self.clear();
                            return;
                        }
                    }
                }
                self.buffer.place_exact(line, chars.len() - column);
            }
            CaretState::Coarse { line } => {
                // The column stays unknown, but a single-line word jump does
                // not change the line in the common case.
                debug!("word jump from coarse position stays coarse on line {line}");
            }
            CaretState::Unknown => self.clear(),
        }
    }

    // -----------------------------------------------------------------------
    // Vertical movement / line anchors
    // -----------------------------------------------------------------------

    fn vertical_step(&mut self, down: bool, count: usize) {
        self.buffer.set_selection_anchor(None);
        let Some(line) = self.state().line() else {
            self.clear();
            return;
        };
        let lines = self.buffer.line_count();
        let target = if down {
            line as isize + count as isize
        } else {
            line as isize - count as isize
        };
        if target < 0 || target >= lines as isize {
            self.clear();
            return;
        }
        // The landing column after a vertical move depends on host column
        // memory we cannot see.
        self.buffer.place_coarse(target as usize);
    }

    fn go_home(&mut self) {
        self.buffer.set_selection_anchor(None);
        match self.state().line() {
            // Smart-home may stop at the first non-whitespace character, so
            // only the line is certain.
            Some(line) => {
                self.buffer.place_coarse(line);
            }
            None => self.clear(),
        }
    }

    fn go_end(&mut self, shift: bool) {
        match self.state() {
            CaretState::Exact { line, .. } => {
                if shift {
                    self.ensure_anchor();
                } else {
                    self.buffer.set_selection_anchor(None);
                }
                self.buffer.place_exact(line, 0);
            }
            // Shift-end from a coarse position would anchor the selection at
            // the unknown column itself.
            CaretState::Coarse { line } if !shift => {
                self.buffer.set_selection_anchor(None);
                self.buffer.place_exact(line, 0);
            }
            _ => self.clear(),
        }
    }
}

// ---------------------------------------------------------------------------
// Line tokenization for word jumps
// ---------------------------------------------------------------------------

#[derive(PartialEq, Eq, Clone, Copy)]
enum CharClass {
    Word,
    Punctuation,
}

fn classify(c: char) -> Option<CharClass> {
    if c.is_whitespace() {
        None
    } else if c.is_alphanumeric() || c == '_' {
        Some(CharClass::Word)
    } else {
        Some(CharClass::Punctuation)
    }
}

/// One word jump inside a line.  `None` means the jump would cross the line
/// boundary.
fn jump_within_line(chars: &[char], column: usize, right: bool) -> Option<usize> {
    if right {
        let mut i = column;
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i == chars.len() {
            return None;
        }
        let class = classify(chars[i]);
        while i < chars.len() && classify(chars[i]) == class {
            i += 1;
        }
        Some(i)
    } else {
        let mut i = column;
        while i > 0 && chars[i - 1].is_whitespace() {
            i -= 1;
        }
        if i == 0 {
            return None;
        }
        let class = classify(chars[i - 1]);
        while i > 0 && classify(chars[i - 1]) == class {
            i -= 1;
        }
        Some(i)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_with(before: &str, after: &str) -> CaretTracker {
        let mut tracker = CaretTracker::new();
        tracker.set_buffer(before, after, MarkerKind::Exact);
        tracker
    }

    #[test]
    fn starts_unknown() {
        let tracker = CaretTracker::new();
        assert_eq!(tracker.state(), CaretState::Unknown);
    }

    #[test]
    fn plain_horizontal_movement() {
        let mut tracker = tracker_with("abc", "def");
        tracker.apply_keys("left:2").unwrap();
        assert_eq!(
            tracker.state(),
            CaretState::Exact {
                line: 0,
                chars_from_line_end: 5
            }
        );
        tracker.apply_keys("right:4").unwrap();
        assert_eq!(
            tracker.state(),
            CaretState::Exact {
                line: 0,
                chars_from_line_end: 1
            }
        );
    }

    #[test]
    fn movement_past_known_bounds_clears() {
        let mut tracker = tracker_with("ab", "");
        tracker.apply_keys("right").unwrap();
        assert_eq!(tracker.state(), CaretState::Unknown);
    }

    #[test]
    fn vertical_movement_degrades_to_coarse() {
        let mut tracker = tracker_with("one\ntwo\nthree", "");
        tracker.apply_keys("up").unwrap();
        assert_eq!(tracker.state(), CaretState::Coarse { line: 1 });
        tracker.apply_keys("up").unwrap();
        assert_eq!(tracker.state(), CaretState::Coarse { line: 0 });
        tracker.apply_keys("up").unwrap();
        assert_eq!(tracker.state(), CaretState::Unknown);
    }

    #[test]
    fn end_recovers_exact_column_from_coarse() {
        let mut tracker = tracker_with("one\ntwo", "");
        tracker.apply_keys("up").unwrap();
        assert_eq!(tracker.state(), CaretState::Coarse { line: 0 });
        tracker.apply_keys("end").unwrap();
        assert_eq!(
            tracker.state(),
            CaretState::Exact {
                line: 0,
                chars_from_line_end: 0
            }
        );
    }

    #[test]
    fn shift_end_from_coarse_clears() {
        let mut tracker = tracker_with("one\ntwo", "");
        tracker.apply_keys("up").unwrap();
        tracker.apply_keys("shift-end").unwrap();
        assert_eq!(tracker.state(), CaretState::Unknown);
    }

    #[test]
    fn home_marks_line_coarse() {
        let mut tracker = tracker_with("hello", "");
        tracker.apply_keys("home").unwrap();
        assert_eq!(tracker.state(), CaretState::Coarse { line: 0 });
    }

    #[test]
    fn shift_movement_builds_selection() {
        let mut tracker = tracker_with("Insert a ", "new");
        tracker.apply_keys("shift-left:2").unwrap();
        assert_eq!(tracker.selection_range(), Some((7, 9)));
        tracker.apply_keys("shift-left").unwrap();
        assert_eq!(tracker.selection_range(), Some((6, 9)));
        // Shrink back
        tracker.apply_keys("shift-right").unwrap();
        assert_eq!(tracker.selection_range(), Some((7, 9)));
    }

    #[test]
    fn shift_hold_grammar_builds_selection() {
        let mut tracker = tracker_with("", "Insert a new");
        tracker.apply_keys("shift:down right:8 shift:up").unwrap();
        assert_eq!(tracker.selection_range(), Some((0, 8)));
        assert!(tracker.is_selecting());
    }

    #[test]
    fn collapse_left_consumes_first_keystroke() {
        let mut tracker = tracker_with("Insert a ", "new");
        tracker.apply_keys("shift:down left:9 shift:up").unwrap();
        assert_eq!(tracker.selection_range(), Some((0, 9)));
        // One left collapses to the left edge without moving further.
        tracker.apply_keys("left").unwrap();
        assert!(!tracker.is_selecting());
        assert_eq!(tracker.caret_index(), Some(0));
    }

    #[test]
    fn collapse_right_lands_on_right_edge() {
        let mut tracker = tracker_with("Insert a ", "new");
        tracker.apply_keys("shift:down left:9 shift:up").unwrap();
        tracker.apply_keys("right").unwrap();
        assert!(!tracker.is_selecting());
        assert_eq!(tracker.caret_index(), Some(9));
    }

    #[test]
    fn word_jump_left_then_right_re_derives_columns() {
        // The three-sentence fixture: caret starts at the end of line 1.
        let mut tracker = tracker_with(
            "Insert a new sentence. \nInsert a second sentence. ",
            "\nInsert a third sentence.",
        );
        // Three jumps: past the trailing space+period run, past "sentence",
        // past "second" — landing at the start of "second".
        tracker.apply_keys("ctrl-left:3").unwrap();
        assert_eq!(
            tracker.state(),
            CaretState::Exact {
                line: 1,
                chars_from_line_end: 17
            }
        );
        tracker.apply_keys("ctrl-right").unwrap();
        assert_eq!(
            tracker.state(),
            CaretState::Exact {
                line: 1,
                chars_from_line_end: 11
            }
        );
    }

    #[test]
    fn word_jump_across_line_boundary_clears() {
        let mut tracker = tracker_with("one\n", "two");
        tracker.apply_keys("ctrl-left").unwrap();
        assert_eq!(tracker.state(), CaretState::Unknown);
    }

    #[test]
    fn unknown_hotkeys_clear() {
        let mut tracker = tracker_with("abc", "");
        tracker.apply_keys("ctrl-t").unwrap();
        assert_eq!(tracker.state(), CaretState::Unknown);

        let mut tracker = tracker_with("abc", "");
        tracker.apply_keys("alt-f4").unwrap();
        assert_eq!(tracker.state(), CaretState::Unknown);
    }

    #[test]
    fn copy_paste_hotkeys_do_not_clear() {
        let mut tracker = tracker_with("abc", "");
        tracker.apply_keys("ctrl-c ctrl-s ctrl-v").unwrap();
        assert_eq!(
            tracker.state(),
            CaretState::Exact {
                line: 0,
                chars_from_line_end: 0
            }
        );
    }

    #[test]
    fn backspace_removes_before_caret() {
        let mut tracker = tracker_with("abcd", "ef");
        tracker.apply_keys("backspace:2").unwrap();
        assert_eq!(tracker.text(), "abef");
        assert_eq!(tracker.caret_index(), Some(2));
    }

    #[test]
    fn backspace_with_selection_removes_selection() {
        let mut tracker = tracker_with("Insert a new", "");
        tracker.apply_keys("shift:down left:3 shift:up backspace").unwrap();
        assert_eq!(tracker.text(), "Insert a ");
        assert_eq!(tracker.caret_index(), Some(9));
    }

    #[test]
    fn typing_replaces_selection() {
        let mut tracker = tracker_with("Insert a new", "");
        tracker.apply_keys("shift:down left:3 shift:up").unwrap();
        tracker.append_before_caret("old");
        assert_eq!(tracker.text(), "Insert a old");
    }
}
