//! Token buffer — incremental folding of inserted/removed text into tokens.
//!
//! The buffer owns the ordered token sequence and a [`CaretTracker`]; every
//! mutation keeps the two in lock-step so that concatenating all token text
//! always reproduces the tracker's (marker-stripped) buffer text.
//!
//! Insertions are classified against the tokens around the caret
//! ([`InsertStrategy`]) and applied as a local splice: the affected tokens
//! are textually rebuilt and retokenized, which realises joins and splits
//! without any special-cased boundary surgery.  Deletions cascade across
//! token boundaries and re-merge the cut edges when neither side ends in
//! whitespace.  Both paths finish with a [`reindex`](TokenBuffer::reindex),
//! which is idempotent.

use std::ops::RangeInclusive;

use log::{debug, trace};

use crate::caret::{CaretState, CaretTracker, MarkerKind};
use crate::keys::{parse_descriptors, KeyEvent, KeyParseError, KeyTarget, Modifier};

use super::token::{text_to_tokens, Token};

// ---------------------------------------------------------------------------
// InsertStrategy
// ---------------------------------------------------------------------------

/// How inserted text relates to the token(s) at the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertStrategy {
    /// Empty insertion; nothing changes.
    Ignore,
    /// The text stands on its own next to the neighboring tokens.
    AppendAfter,
    /// The text fuses with its neighbor(s) into one token.
    Join,
    /// Interior insertion that fuses with the left fragment and splits from
    /// the right one.
    JoinLeftSplitRight,
    /// Interior insertion that splits from the left fragment and fuses with
    /// the right one.
    SplitLeftJoinRight,
    /// Interior insertion that splits from both fragments.
    Split,
}

/// Classify an insertion by the characters that will touch its edges.
///
/// * `left_char` / `right_char` — the characters immediately left/right of
///   the insertion point (`None` at the buffer edges).
/// * `at_boundary` — the insertion point sits between two tokens rather
///   than inside one.
///
/// A side fuses when neither the inserted text's edge character nor the
/// adjacent existing character is whitespace.
pub fn determine_insert_strategy(
    new_text: &str,
    left_char: Option<char>,
    right_char: Option<char>,
    at_boundary: bool,
) -> InsertStrategy {
    if new_text.is_empty() {
        return InsertStrategy::Ignore;
    }
    let non_ws = |c: Option<char>| c.is_some_and(|c| !c.is_whitespace());
    let join_left = non_ws(new_text.chars().next()) && non_ws(left_char);
    let join_right = non_ws(new_text.chars().last()) && non_ws(right_char);

    if at_boundary {
        if join_left || join_right {
            InsertStrategy::Join
        } else {
            InsertStrategy::AppendAfter
        }
    } else {
        match (join_left, join_right) {
            (true, true) => InsertStrategy::Join,
            (true, false) => InsertStrategy::JoinLeftSplitRight,
            (false, true) => InsertStrategy::SplitLeftJoinRight,
            (false, false) => InsertStrategy::Split,
        }
    }
}

// ---------------------------------------------------------------------------
// TokenBuffer
// ---------------------------------------------------------------------------

/// Ordered token sequence plus the caret tracker it stays in sync with.
#[derive(Debug, Default)]
pub struct TokenBuffer {
    tokens: Vec<Token>,
    tracker: CaretTracker,
}

impl TokenBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Concatenation of all token text.  Equal to the tracker's text at all
    /// times.
    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    pub fn caret_state(&self) -> CaretState {
        self.tracker.state()
    }

    /// Char index of the caret within the buffer text, when exactly known.
    pub fn caret_index(&self) -> Option<usize> {
        self.tracker.caret_index()
    }

    pub fn is_selecting(&self) -> bool {
        self.tracker.is_selecting()
    }

    pub fn selection_range(&self) -> Option<(usize, usize)> {
        self.tracker.selection_range()
    }

    /// Char range `[start, end)` a token occupies in the buffer text.
    pub fn token_char_range(&self, index: usize) -> Option<(usize, usize)> {
        let mut start = 0;
        for (i, token) in self.tokens.iter().enumerate() {
            let end = start + token.char_len();
            if i == index {
                return Some((start, end));
            }
            start = end;
        }
        None
    }

    /// Token index + char offset (from the token's start) of the caret.  A
    /// caret on the boundary between two tokens reports the *left* token at
    /// its end offset.
    pub fn token_position_at_caret(&self) -> Option<(usize, usize)> {
        let CaretState::Exact {
            line,
            chars_from_line_end,
        } = self.tracker.state()
        else {
            return None;
        };
        for (i, token) in self.tokens.iter().enumerate() {
            if token.line_index != line {
                continue;
            }
            let visible = token.visible_len();
            let top = token.chars_from_line_end + visible;
            if chars_from_line_end >= token.chars_from_line_end && chars_from_line_end <= top {
                return Some((i, top - chars_from_line_end));
            }
        }
        None
    }

    /// Index of the token the caret currently sits in.  Falls back to the
    /// last token of the caret's line when only the line is known.
    pub fn caret_token_index(&self) -> Option<usize> {
        match self.tracker.state() {
            CaretState::Exact { .. } => self.token_position_at_caret().map(|(i, _)| i),
            CaretState::Coarse { line } => self
                .tokens
                .iter()
                .rposition(|t| t.line_index == line),
            CaretState::Unknown => None,
        }
    }

    // -----------------------------------------------------------------------
    // Key replay
    // -----------------------------------------------------------------------

    /// Parse and replay a descriptor batch, routing edits (backspace,
    /// delete, cut) through the token sequence as well as the tracker.
    pub fn apply_keys(&mut self, descriptors: &str) -> Result<(), KeyParseError> {
        for event in parse_descriptors(descriptors)? {
            self.apply_key(&event);
        }
        Ok(())
    }

    pub fn apply_key(&mut self, event: &KeyEvent) {
        match event {
            KeyEvent::Press(press) if press.target == KeyTarget::Backspace => {
                if self.tracker.is_selecting() {
                    self.remove_selection();
                } else {
                    self.remove_before_caret(press.count);
                }
            }
            KeyEvent::Press(press) if press.target == KeyTarget::Delete => {
                if self.tracker.is_selecting() {
                    self.remove_selection();
                } else {
                    self.remove_after_caret(press.count);
                }
            }
            KeyEvent::Press(press)
                if press.target == KeyTarget::Hotkey('x')
                    && press.has_word_jump_modifier()
                    && !press.has_modifier(Modifier::Alt)
                    && !press.has_modifier(Modifier::Shift)
                    && self.tracker.is_selecting() =>
            {
                self.remove_selection();
            }
            _ => {
                self.tracker.apply_key(event);
                // A desynchronizing key wipes the tracker; the token
                // sequence is no longer trustworthy either.
                if self.tracker.text().is_empty() && !self.tokens.is_empty() {
                    debug!("tracker desynchronized; dropping {} tokens", self.tokens.len());
                    self.tokens.clear();
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Insertion
    // -----------------------------------------------------------------------

    /// Fold newly inserted text into the token sequence at the caret.
    pub fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.tracker.is_selecting() {
            self.remove_selection();
        }

        // The caret can sit on a line with no tokens (right after a trailing
        // newline); fall back to a raw char-index lookup there.
        let position = self.token_position_at_caret().or_else(|| {
            self.tracker
                .caret_index()
                .and_then(|caret| self.locate_char(caret))
        });

        match position {
            Some((index, offset)) => self.insert_at(index, offset, text),
            None => {
                // Position unknown: previously tracked content cannot be
                // related to the insertion point, so knowledge restarts
                // from the inserted text alone.
                if !self.tokens.is_empty() {
                    debug!("inserting with unknown caret; restarting token sequence");
                }
                self.tokens = text_to_tokens(text);
                self.tracker.clear();
                self.tracker.append_before_caret(text);
                self.reindex();
            }
        }
    }

    fn insert_at(&mut self, index: usize, offset: usize, text: &str) {
        let token_chars: Vec<char> = self.tokens[index].text.chars().collect();

        let left_char = if offset > 0 {
            Some(token_chars[offset - 1])
        } else if index > 0 {
            self.tokens[index - 1].text.chars().last()
        } else {
            None
        };
        let right_char = if offset < token_chars.len() {
            Some(token_chars[offset])
        } else if index + 1 < self.tokens.len() {
            self.tokens[index + 1].text.chars().next()
        } else {
            None
        };

        let at_boundary = offset == 0 || offset >= self.tokens[index].visible_len();
        let strategy = determine_insert_strategy(text, left_char, right_char, at_boundary);
        trace!(
            "insert {:?} at token {index} offset {offset}: {strategy:?}",
            text
        );

        let non_ws = |c: Option<char>| c.is_some_and(|c| !c.is_whitespace());
        let join_left = non_ws(text.chars().next()) && non_ws(left_char);
        let join_right = non_ws(text.chars().last()) && non_ws(right_char);

        // The splice region: the caret's token, plus whichever neighbor the
        // insertion fuses with.
        let mut start = index;
        let mut end = index;
        if offset == 0 && join_left && index > 0 {
            start = index - 1;
        }
        if offset == token_chars.len() && join_right && index + 1 < self.tokens.len() {
            end = index + 1;
        }

        let mut replacement = String::new();
        for token in &self.tokens[start..index] {
            replacement.push_str(&token.text);
        }
        replacement.extend(token_chars[..offset].iter());
        replacement.push_str(text);
        replacement.extend(token_chars[offset..].iter());
        for token in &self.tokens[index + 1..=end] {
            replacement.push_str(&token.text);
        }

        self.resplice(start..=end, &replacement);
        self.tracker.append_before_caret(text);
        self.reindex();
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    /// Backspace semantics: remove up to `count` chars before the caret,
    /// cascading across tokens.
    pub fn remove_before_caret(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        let Some(caret) = self.tracker.caret_index() else {
            self.desync();
            return;
        };
        let removed = count.min(caret);
        if removed > 0 {
            self.remove_char_range(caret - removed, caret);
        }
        self.tracker.remove_before_caret(count);
        self.reindex();
    }

    /// Delete semantics: remove up to `count` chars after the caret.
    pub fn remove_after_caret(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        let Some(caret) = self.tracker.caret_index() else {
            self.desync();
            return;
        };
        let total: usize = self.tokens.iter().map(Token::char_len).sum();
        let removed = count.min(total - caret.min(total));
        if removed > 0 {
            self.remove_char_range(caret, caret + removed);
        }
        self.tracker.remove_after_caret(count);
        self.reindex();
    }

    /// Remove the live selection: split the boundary tokens at the edges,
    /// drop the interior, and re-merge the cut edges when both are
    /// whitespace-free.
    pub fn remove_selection(&mut self) {
        let Some((start, end)) = self.tracker.selection_range() else {
            return;
        };
        if start != end {
            self.remove_char_range(start, end);
        }
        self.tracker.remove_selection();
        self.reindex();
    }

    /// Remove chars `[start, end)` from the token sequence via a local
    /// splice.  Emptied tokens disappear; the cut edges merge back into one
    /// token whenever retokenization fuses them.
    fn remove_char_range(&mut self, start: usize, end: usize) {
        let Some((first, first_offset)) = self.locate_char(start) else {
            return;
        };
        let Some((last, last_offset)) = self.locate_char(end) else {
            return;
        };
        let mut replacement: String = self.tokens[first]
            .text
            .chars()
            .take(first_offset)
            .collect();
        replacement.extend(self.tokens[last].text.chars().skip(last_offset));
        self.resplice(first..=last, &replacement);
    }

    /// Token index + char offset for a char position in the buffer text.  A
    /// position on a token boundary reports the *right* token at offset 0,
    /// except at the very end of the buffer.
    fn locate_char(&self, position: usize) -> Option<(usize, usize)> {
        let mut start = 0;
        for (i, token) in self.tokens.iter().enumerate() {
            let end = start + token.char_len();
            if position < end {
                return Some((i, position - start));
            }
            start = end;
        }
        if position == start && !self.tokens.is_empty() {
            let last = self.tokens.len() - 1;
            return Some((last, self.tokens[last].char_len()));
        }
        None
    }

    fn desync(&mut self) {
        self.tracker.clear();
        self.tokens.clear();
    }

    // -----------------------------------------------------------------------
    // Resync from host text
    // -----------------------------------------------------------------------

    /// Rebuild the whole buffer from host accessibility text.
    ///
    /// `first_caret` / `second_caret` are `(line, chars_from_line_end)`
    /// positions as reported by the host; when both are present and differ
    /// the pair describes a selection whose caret is `first_caret`.
    pub fn index_content(
        &mut self,
        total_value: &str,
        first_caret: Option<(usize, usize)>,
        second_caret: Option<(usize, usize)>,
    ) {
        self.tokens = text_to_tokens(total_value);

        match first_caret.and_then(|(line, cfe)| split_at_position(total_value, line, cfe)) {
            Some((before, after)) => {
                self.tracker.set_buffer(&before, &after, MarkerKind::Exact);
                if let Some((line, cfe)) = second_caret {
                    if second_caret != first_caret {
                        self.tracker.set_selection_anchor(line, cfe);
                    }
                }
            }
            None => {
                debug!("indexed content without caret position");
                self.tracker.set_unmarked_text(total_value);
            }
        }
        self.reindex();
    }

    // -----------------------------------------------------------------------
    // Reindexing
    // -----------------------------------------------------------------------

    /// Recompute every token's derived position fields.  Idempotent.
    pub fn reindex(&mut self) {
        // Pass 1, forward: line numbers from newline-terminated tokens.
        let mut line = 0;
        for token in &mut self.tokens {
            token.line_index = line;
            if token.is_line_end() {
                line += 1;
            }
        }
        // Pass 2, backward: per-line distance from the line end.
        let mut from_end = 0;
        let mut current_line = usize::MAX;
        for token in self.tokens.iter_mut().rev() {
            if token.line_index != current_line {
                current_line = token.line_index;
                from_end = 0;
            }
            token.chars_from_line_end = from_end;
            from_end += token.visible_len();
        }
    }

    /// Replace `range` (inclusive) with the retokenization of `replacement`.
    fn resplice(&mut self, range: RangeInclusive<usize>, replacement: &str) {
        let new_tokens = text_to_tokens(replacement);
        self.tokens.splice(range, new_tokens);
    }
}

/// Split `text` at a `(line, chars_from_line_end)` position into the parts
/// before and after the caret.  `None` when the line does not exist.
fn split_at_position(text: &str, line: usize, chars_from_line_end: usize) -> Option<(String, String)> {
    let mut start = 0;
    for (i, segment) in text.split('\n').enumerate() {
        let len = segment.chars().count();
        if i == line {
            let column = len.saturating_sub(chars_from_line_end.min(len));
            let index = start + column;
            let chars: Vec<char> = text.chars().collect();
            let before: String = chars[..index].iter().collect();
            let after: String = chars[index..].iter().collect();
            return Some((before, after));
        }
        start += len + 1;
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with(text: &str) -> TokenBuffer {
        let mut buffer = TokenBuffer::new();
        buffer.insert_text(text);
        buffer
    }

    fn texts(buffer: &TokenBuffer) -> Vec<String> {
        buffer.tokens().iter().map(|t| t.text.clone()).collect()
    }

    // -- insert strategy table ------------------------------------------------

    #[test]
    fn interior_insert_strategy_table() {
        // Inserting into "test" at index 1: left char 't', right char 'e'.
        let cases = [
            ("ask", InsertStrategy::Join),
            ("ask ", InsertStrategy::JoinLeftSplitRight),
            (" ask", InsertStrategy::SplitLeftJoinRight),
            (" ask ", InsertStrategy::Split),
        ];
        for (text, expected) in cases {
            assert_eq!(
                determine_insert_strategy(text, Some('t'), Some('e'), false),
                expected,
                "inserting {text:?}"
            );
        }
    }

    #[test]
    fn boundary_insert_strategy_table() {
        // After "hello " (left char is the trailing space).
        assert_eq!(
            determine_insert_strategy("world", Some(' '), None, true),
            InsertStrategy::AppendAfter
        );
        // After "hello" flush against the insertion.
        assert_eq!(
            determine_insert_strategy("world", Some('o'), None, true),
            InsertStrategy::Join
        );
        // Between "hello" and "world" with whitespace-edged text.
        assert_eq!(
            determine_insert_strategy(" or ", Some('o'), Some('w'), true),
            InsertStrategy::Join
        );
        assert_eq!(
            determine_insert_strategy(" or ", Some(' '), Some(' '), true),
            InsertStrategy::AppendAfter
        );
        assert_eq!(
            determine_insert_strategy("", Some('a'), Some('b'), true),
            InsertStrategy::Ignore
        );
    }

    // -- insertion ------------------------------------------------------------

    #[test]
    fn sequential_inserts_round_trip() {
        let mut buffer = TokenBuffer::new();
        let parts = [
            "Insert a new sentence. \n",
            "Insert a second sentence. \n",
            "Insert a third sentence.",
        ];
        for part in parts {
            buffer.insert_text(part);
        }
        assert_eq!(buffer.text(), parts.concat());
        assert_eq!(buffer.text(), buffer.tracker_text());
    }

    #[test]
    fn interior_insert_joins_left_splits_right() {
        let mut buffer = buffer_with("test");
        // Caret between 't' and 'est'.
        buffer.apply_keys("left:3").unwrap();
        buffer.insert_text("ask ");
        assert_eq!(texts(&buffer), vec!["task ", "est"]);
        assert_eq!(buffer.text(), "task est");
    }

    #[test]
    fn interior_insert_splits_both_sides() {
        let mut buffer = buffer_with("test");
        buffer.apply_keys("left:3").unwrap();
        buffer.insert_text(" ask ");
        assert_eq!(texts(&buffer), vec!["t ", "ask ", "est"]);
    }

    #[test]
    fn boundary_insert_appends_token() {
        let mut buffer = buffer_with("hello ");
        buffer.insert_text("world");
        assert_eq!(texts(&buffer), vec!["hello ", "world"]);
    }

    #[test]
    fn boundary_insert_joins_flush_text() {
        let mut buffer = buffer_with("hello");
        buffer.insert_text("world");
        assert_eq!(texts(&buffer), vec!["helloworld"]);
    }

    #[test]
    fn insert_before_first_token() {
        let mut buffer = buffer_with("world");
        buffer.apply_keys("left:5").unwrap();
        buffer.insert_text("hello ");
        assert_eq!(texts(&buffer), vec!["hello ", "world"]);
        assert_eq!(buffer.caret_index(), Some(6));
    }

    // -- reindexing -----------------------------------------------------------

    #[test]
    fn reindex_assigns_lines_and_offsets() {
        let buffer = buffer_with("one two\nthree four");
        let tokens = buffer.tokens();
        assert_eq!(tokens[0].line_index, 0);
        assert_eq!(tokens[1].line_index, 0);
        assert_eq!(tokens[2].line_index, 1);
        assert_eq!(tokens[3].line_index, 1);
        // "one " is 4 visible chars, "two\n" 3: line 0 is "one two".
        assert_eq!(tokens[0].chars_from_line_end, 3);
        assert_eq!(tokens[1].chars_from_line_end, 0);
        assert_eq!(tokens[2].chars_from_line_end, 4);
        assert_eq!(tokens[3].chars_from_line_end, 0);
    }

    #[test]
    fn reindex_is_idempotent() {
        let mut buffer = buffer_with("Insert a new sentence. \nInsert a second sentence.");
        let before: Vec<(usize, usize)> = buffer
            .tokens()
            .iter()
            .map(|t| (t.line_index, t.chars_from_line_end))
            .collect();
        buffer.reindex();
        let after: Vec<(usize, usize)> = buffer
            .tokens()
            .iter()
            .map(|t| (t.line_index, t.chars_from_line_end))
            .collect();
        assert_eq!(before, after);
    }

    // -- removal --------------------------------------------------------------

    #[test]
    fn backspace_cascades_across_tokens() {
        let mut buffer = buffer_with("one two");
        // Caret at end; remove "o two" (5 chars).
        buffer.remove_before_caret(5);
        assert_eq!(buffer.text(), "on");
        assert_eq!(texts(&buffer), vec!["on"]);
    }

    #[test]
    fn backspace_merges_cut_edges() {
        let mut buffer = buffer_with("some words");
        // Remove "e wor": cut edges are "som" and "ds", both flush.
        buffer.apply_keys("left:2").unwrap();
        buffer.remove_before_caret(5);
        assert_eq!(buffer.text(), "somds");
        assert_eq!(texts(&buffer), vec!["somds"]);
    }

    #[test]
    fn backspace_keeps_separate_tokens_across_whitespace() {
        let mut buffer = buffer_with("one two three");
        // Caret at end; remove "three" leaving the trailing space.
        buffer.remove_before_caret(5);
        assert_eq!(buffer.text(), "one two ");
        assert_eq!(texts(&buffer), vec!["one ", "two "]);
    }

    #[test]
    fn delete_removes_after_caret() {
        let mut buffer = buffer_with("one two");
        buffer.apply_keys("left:7").unwrap();
        buffer.remove_after_caret(4);
        assert_eq!(buffer.text(), "two");
    }

    #[test]
    fn removals_clamp() {
        let mut buffer = buffer_with("abc");
        buffer.remove_before_caret(10);
        assert_eq!(buffer.text(), "");
        assert!(buffer.tokens().is_empty());
    }

    #[test]
    fn selection_removal_drops_interior_and_merges() {
        let mut buffer = buffer_with("Insert a new sentence.");
        // Select " a new" backwards from after "new".
        buffer.apply_keys("left:10").unwrap();
        buffer
            .apply_keys("shift:down left:6 shift:up backspace")
            .unwrap();
        assert_eq!(buffer.text(), "Insert sentence.");
        assert_eq!(texts(&buffer), vec!["Insert ", "sentence."]);
    }

    // -- resync ---------------------------------------------------------------

    #[test]
    fn index_content_with_caret() {
        let mut buffer = TokenBuffer::new();
        buffer.index_content("one two\nthree four", Some((1, 5)), None);
        assert_eq!(buffer.text(), "one two\nthree four");
        assert_eq!(
            buffer.caret_state(),
            CaretState::Exact {
                line: 1,
                chars_from_line_end: 5
            }
        );
        assert_eq!(buffer.token_position_at_caret(), Some((2, 5)));
    }

    #[test]
    fn index_content_without_caret_keeps_tokens() {
        let mut buffer = TokenBuffer::new();
        buffer.index_content("searchable text", None, None);
        assert_eq!(buffer.tokens().len(), 2);
        assert_eq!(buffer.caret_state(), CaretState::Unknown);
        assert_eq!(buffer.text(), "searchable text");
    }

    #[test]
    fn index_content_with_selection() {
        let mut buffer = TokenBuffer::new();
        buffer.index_content("one two", Some((0, 0)), Some((0, 3)));
        assert!(buffer.is_selecting());
        assert_eq!(buffer.selection_range(), Some((4, 7)));
    }

    // -- desync ---------------------------------------------------------------

    #[test]
    fn unknown_hotkey_drops_tokens() {
        let mut buffer = buffer_with("some text");
        buffer.apply_keys("ctrl-t").unwrap();
        assert!(buffer.tokens().is_empty());
        assert_eq!(buffer.caret_state(), CaretState::Unknown);
    }

    #[test]
    fn insert_after_desync_restarts_from_inserted_text() {
        let mut buffer = buffer_with("old stuff");
        buffer.apply_keys("ctrl-t").unwrap();
        buffer.insert_text("fresh ");
        assert_eq!(buffer.text(), "fresh ");
        assert_eq!(buffer.caret_index(), Some(6));
    }
}

#[cfg(test)]
impl TokenBuffer {
    /// Test helper: the tracker's view of the text, for invariant checks.
    pub fn tracker_text(&self) -> String {
        self.tracker.text()
    }
}
