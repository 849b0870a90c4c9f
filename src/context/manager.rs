//! Per-window buffer contexts and the voice-action entry points.
//!
//! [`ContextManager`] owns one [`TokenBuffer`] per host window, the shared
//! [`PhoneticEngine`] (its pair memo is a pure function of word pairs, so
//! sharing across contexts is safe), and the user's [`FixTable`].  It is
//! the only caller of the matcher/tracker pair: voice actions come in as
//! phrases, and navigation goes back out as [`NavigationPlan`]s — key
//! descriptor sequences the host presses and the local tracker replays.
//!
//! Everything here is synchronous and runs to completion; the only blocking
//! step in the wider system (waiting for host UI to settle during a resync)
//! lives behind the [`crate::host`] traits, outside this module.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::caret::CaretState;
use crate::config::{AppConfig, AppPaths, MatchingConfig};
use crate::keys::{KeyEvent, KeyPress, Modifier};
use crate::matcher::{find_best_match, find_self_repair_match_with, MatchPurpose, MatchTree};
use crate::phonetics::{PersistentTable, PhoneticEngine, TableError, WordTable};
use crate::tokens::TokenBuffer;

use super::fixes::FixTable;

// ---------------------------------------------------------------------------
// NavigationPlan
// ---------------------------------------------------------------------------

/// A key sequence that moves the host caret, in descriptor form.  The plan
/// is applied to the local tracker when it is produced; the host must press
/// the same keys for the two to stay in step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationPlan {
    pub events: Vec<KeyEvent>,
}

impl NavigationPlan {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl fmt::Display for NavigationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for event in &self.events {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{event}")?;
            first = false;
        }
        Ok(())
    }
}

/// Outcome of a correction: the navigation that selected the old text, and
/// the replacement that was typed over it.
#[derive(Debug, Clone)]
pub struct CorrectionOutcome {
    pub plan: NavigationPlan,
    pub replacement: String,
}

// ---------------------------------------------------------------------------
// ContextManager
// ---------------------------------------------------------------------------

const DEFAULT_CONTEXT: &str = "default";

/// One token buffer per recognized host window, plus the shared matching
/// state.
pub struct ContextManager {
    contexts: HashMap<String, TokenBuffer>,
    active: String,
    engine: PhoneticEngine,
    fixes: FixTable,
    matching: MatchingConfig,
    pending_resync: bool,
}

impl ContextManager {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Create a manager with default thresholds, wired to the user's
    /// persisted state (word tables and fix table).
    pub fn new() -> Self {
        Self::with_config(&AppConfig::default())
    }

    /// Create a manager with the given configuration.  The homophone and
    /// similarity tables are loaded from the platform config directory and
    /// save themselves back there on every addition; the fix table does the
    /// same.
    pub fn with_config(config: &AppConfig) -> Self {
        let paths = AppPaths::new();
        let engine = PhoneticEngine::with_tables(
            persistent_table(paths.homophones_file, "homophone"),
            persistent_table(paths.similarities_file, "similarity"),
        );
        let mut manager = Self::with_parts(engine, FixTable::load_or_default());
        manager.matching = config.matching.clone();
        manager
    }

    /// Create a manager from explicit parts (tests, custom tables).
    pub fn with_parts(engine: PhoneticEngine, fixes: FixTable) -> Self {
        let mut contexts = HashMap::new();
        contexts.insert(DEFAULT_CONTEXT.to_string(), TokenBuffer::new());
        Self {
            contexts,
            active: DEFAULT_CONTEXT.to_string(),
            engine,
            fixes,
            matching: MatchingConfig::default(),
            pending_resync: false,
        }
    }

    /// Override the matcher thresholds.
    pub fn set_matching(&mut self, matching: MatchingConfig) {
        self.matching = matching;
    }

    // -----------------------------------------------------------------------
    // Context switching / resync policy
    // -----------------------------------------------------------------------

    /// Switch the active context to the given window key, creating a fresh
    /// buffer on first sight.  A switch always schedules a resync — the
    /// other window's text may have changed behind our back.
    pub fn switch_context(&mut self, key: &str) {
        if self.active == key {
            return;
        }
        if !self.contexts.contains_key(key) {
            info!("new buffer context for window '{key}'");
            self.contexts.insert(key.to_string(), TokenBuffer::new());
        }
        self.active = key.to_string();
        self.pending_resync = true;
    }

    pub fn active_context(&self) -> &str {
        &self.active
    }

    /// Whether the next action should be preceded by a host text resync:
    /// either a context switch happened, or the caret has been lost.
    pub fn needs_resync(&self) -> bool {
        self.pending_resync || self.buffer().caret_state() == CaretState::Unknown
    }

    /// Feed host accessibility text into the active context.
    pub fn index_content(
        &mut self,
        total_value: &str,
        first_caret: Option<(usize, usize)>,
        second_caret: Option<(usize, usize)>,
    ) {
        self.buffer_mut()
            .index_content(total_value, first_caret, second_caret);
        self.pending_resync = false;
    }

    // -----------------------------------------------------------------------
    // Buffer access
    // -----------------------------------------------------------------------

    pub fn buffer(&self) -> &TokenBuffer {
        self.contexts
            .get(&self.active)
            .expect("active context always exists")
    }

    fn buffer_mut(&mut self) -> &mut TokenBuffer {
        self.contexts
            .get_mut(&self.active)
            .expect("active context always exists")
    }

    pub fn engine_mut(&mut self) -> &mut PhoneticEngine {
        &mut self.engine
    }

    pub fn fixes(&self) -> &FixTable {
        &self.fixes
    }

    pub fn fixes_mut(&mut self) -> &mut FixTable {
        &mut self.fixes
    }

    /// Insert dictated text at the caret of the active context.
    pub fn insert_text(&mut self, text: &str) {
        self.buffer_mut().insert_text(text);
    }

    /// Replay key descriptors the front-end issued against the active
    /// context.
    pub fn apply_keys(&mut self, descriptors: &str) -> Result<(), crate::keys::KeyParseError> {
        self.buffer_mut().apply_keys(descriptors)
    }

    // -----------------------------------------------------------------------
    // Voice actions
    // -----------------------------------------------------------------------

    /// Select the best occurrence of the spoken phrase.  Returns the key
    /// plan the host must press; the local tracker has already replayed it.
    pub fn select_phrases(&mut self, words: &[String]) -> Option<NavigationPlan> {
        let found = find_best_match(
            self.contexts.get(&self.active)?,
            &mut self.engine,
            words,
            self.matching.selection_threshold,
            MatchPurpose::Selection,
        );
        let Some(found) = found else {
            if self.buffer().caret_state() == CaretState::Unknown {
                // Losing the caret also loses the tokens; ask for host text
                // before giving up on the phrase.
                self.pending_resync = true;
            }
            debug!("no selection match for {words:?}");
            return None;
        };

        let (start, end) = self.match_char_range(&found.tree)?;
        let plan = self.plan_selection(start, end)?;
        self.replay(&plan);
        Some(plan)
    }

    /// Replace the phrase closest to what was spoken with its fixed form.
    pub fn correct_phrases(&mut self, words: &[String]) -> Option<CorrectionOutcome> {
        let fixed = self.fixes.apply(words);
        let found = find_best_match(
            self.contexts.get(&self.active)?,
            &mut self.engine,
            &fixed,
            self.matching.correction_threshold,
            MatchPurpose::Correction,
        )?;
        self.replace_match_range(&found.tree, &fixed)
    }

    /// Detect whether the spoken words repair what was just dictated.
    /// Read-only; returns the alignment for the action layer to inspect.
    pub fn find_self_repair(&mut self, words: &[String]) -> Option<MatchTree> {
        find_self_repair_match_with(
            self.contexts.get(&self.active)?,
            &mut self.engine,
            words,
            self.matching.self_repair_threshold,
        )
    }

    /// Detect and apply a self-repair: the matched tail is reselected and
    /// overwritten with the newly spoken words.
    pub fn apply_self_repair(&mut self, words: &[String]) -> Option<CorrectionOutcome> {
        let tree = self.find_self_repair(words)?;
        self.replace_match_range(&tree, words)
    }

    // -----------------------------------------------------------------------
    // Plan building
    // -----------------------------------------------------------------------

    /// Char range `[start, end)` a match occupies, trailing newline of the
    /// final token excluded.
    fn match_char_range(&self, tree: &MatchTree) -> Option<(usize, usize)> {
        let buffer = self.buffer();
        let first = tree.first_buffer_index();
        let last = tree.last_buffer_index();
        let (start, _) = buffer.token_char_range(first)?;
        let (_, mut end) = buffer.token_char_range(last)?;
        if buffer.tokens().get(last).is_some_and(|t| t.is_line_end()) {
            end -= 1;
        }
        Some((start, end))
    }

    /// Keys that move the caret to `start` and shift-select through `end`.
    ///
    /// With a live selection the first horizontal press only collapses it
    /// (editors consume that keystroke), which the plan accounts for.
    fn plan_selection(&self, start: usize, end: usize) -> Option<NavigationPlan> {
        let buffer = self.buffer();
        let caret = buffer.caret_index()?;
        let mut events = Vec::new();

        if let Some((left_edge, right_edge)) = buffer.selection_range() {
            if start <= left_edge {
                events.push(KeyEvent::Press(KeyPress::left(1 + (left_edge - start))));
            } else if start >= right_edge {
                events.push(KeyEvent::Press(KeyPress::right(1 + (start - right_edge))));
            } else {
                events.push(KeyEvent::Press(KeyPress::left(1)));
                events.push(KeyEvent::Press(KeyPress::right(start - left_edge)));
            }
        } else if start < caret {
            events.push(KeyEvent::Press(KeyPress::left(caret - start)));
        } else if start > caret {
            events.push(KeyEvent::Press(KeyPress::right(start - caret)));
        }

        events.push(KeyEvent::Hold {
            modifier: Modifier::Shift,
            down: true,
        });
        if end > start {
            events.push(KeyEvent::Press(KeyPress::right(end - start)));
        }
        events.push(KeyEvent::Hold {
            modifier: Modifier::Shift,
            down: false,
        });

        Some(NavigationPlan { events })
    }

    /// Select the matched range, then type the replacement over it.
    fn replace_match_range(
        &mut self,
        tree: &MatchTree,
        words: &[String],
    ) -> Option<CorrectionOutcome> {
        let (start, end) = self.match_char_range(tree)?;
        let plan = self.plan_selection(start, end)?;
        self.replay(&plan);

        // Preserve the whitespace the replaced text carried after it.
        let last = tree.last_buffer_index();
        let suffix: String = self
            .buffer()
            .tokens()
            .get(last)
            .map(|t| {
                t.text
                    .chars()
                    .rev()
                    .take_while(|c| c.is_whitespace() && *c != '\n')
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect()
            })
            .unwrap_or_default();
        let replacement = format!("{}{}", words.join(" "), suffix);

        self.buffer_mut().insert_text(&replacement);
        Some(CorrectionOutcome { plan, replacement })
    }

    fn replay(&mut self, plan: &NavigationPlan) {
        let buffer = self.buffer_mut();
        for event in &plan.events {
            buffer.apply_key(event);
        }
    }
}

impl Default for ContextManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Load a word table from disk and wire its save callback back to the same
/// file, so pairs the user registers survive restarts.
fn persistent_table(path: PathBuf, label: &'static str) -> PersistentTable {
    let table = WordTable::load(&path).unwrap_or_else(|e| {
        warn!("failed to load {label} table: {e}");
        WordTable::new()
    });
    PersistentTable::new(table, label).with_save_callback(Box::new(move |rows| {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        std::fs::write(&path, rows).map_err(|source| TableError::Write {
            path: path.display().to_string(),
            source,
        })
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
