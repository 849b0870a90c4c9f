//! Per-query match planning: syllable weights, thresholds, skip budget and
//! the visit cache shared by every branch of one search.

use std::collections::{HashMap, HashSet};

use crate::phonetics::{syllable_count, SCORE_MAX};
use crate::tokens::normalize_phrase;

// ---------------------------------------------------------------------------
// MatchPurpose
// ---------------------------------------------------------------------------

/// What the caller intends to do with the match; drives skip budgets,
/// filtering strictness and ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPurpose {
    /// Select the phrase (navigation) — strictest edges.
    Selection,
    /// Replace the phrase with a correction — one extra skip allowed.
    Correction,
    /// Detect that freshly spoken words repair the words just dictated.
    SelfRepair,
}

impl MatchPurpose {
    /// Scale factor applied to the threshold when counting weak steps.
    pub fn weak_step_factor(self) -> f32 {
        match self {
            MatchPurpose::Selection => 1.0,
            MatchPurpose::Correction => 0.8,
            MatchPurpose::SelfRepair => 0.6,
        }
    }
}

// ---------------------------------------------------------------------------
// MatchCalculation
// ---------------------------------------------------------------------------

/// Immutable plan for one matcher invocation.
#[derive(Debug, Clone)]
pub struct MatchCalculation {
    /// Normalized query words (empty words dropped).
    pub words: Vec<String>,
    /// Raw (un-normalized) query words, for punctuation checks.
    pub raw_words: Vec<String>,
    pub syllables: Vec<usize>,
    /// Per-word weight: the word's share of the phrase's syllables.  Sums
    /// to 1.
    pub weights: Vec<f32>,
    /// Score threshold on the raw `[0, SCORE_MAX]` scale; the weighted
    /// total must reach it.
    pub threshold: f32,
    pub purpose: MatchPurpose,
    /// How many buffer tokens the alignment may skip over in total.
    pub allowed_skips: usize,
}

impl MatchCalculation {
    pub fn new(query_words: &[String], threshold: f32, purpose: MatchPurpose) -> Option<Self> {
        let mut words = Vec::new();
        let mut raw_words = Vec::new();
        for raw in query_words {
            let normalized = normalize_phrase(raw);
            if !normalized.is_empty() {
                words.push(normalized);
                raw_words.push(raw.clone());
            }
        }
        if words.is_empty() {
            return None;
        }

        let syllables: Vec<usize> = words.iter().map(|w| syllable_count(w)).collect();
        let total: usize = syllables.iter().sum();
        let weights: Vec<f32> = syllables
            .iter()
            .map(|&s| s as f32 / total.max(1) as f32)
            .collect();

        // Corrections target text the user just singled out, so they get
        // one extra skip to work with.
        let budget = match purpose {
            MatchPurpose::Correction => 1,
            _ => 2,
        };
        let allowed_skips = words.len().saturating_sub(budget);

        Some(Self {
            words,
            raw_words,
            syllables,
            weights,
            threshold: threshold.clamp(0.0, SCORE_MAX),
            purpose,
            allowed_skips,
        })
    }

    /// Combined weight of a query index group.
    pub fn weight_of(&self, indices: &[usize]) -> f32 {
        indices.iter().map(|&i| self.weights[i]).sum()
    }

    /// The weighted total score a match must reach.
    pub fn target_score(&self) -> f32 {
        self.threshold
    }

    /// The raw per-step score below which a step counts as weak.
    pub fn weak_step_score(&self) -> f32 {
        self.threshold * self.purpose.weak_step_factor()
    }

    /// Query words of a group joined for combined scoring.
    pub fn joined_words(&self, indices: &[usize]) -> String {
        indices.iter().map(|&i| self.words[i].as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// VisitCache
// ---------------------------------------------------------------------------

/// Value-typed key for one expansion transition.  Index lists are kept
/// sorted so the key is independent of discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransitionKey {
    from_query: Vec<usize>,
    to_query: Vec<usize>,
    from_buffer: Vec<usize>,
    to_buffer: Vec<usize>,
}

impl TransitionKey {
    pub fn new(
        from_query: &[usize],
        to_query: &[usize],
        from_buffer: &[usize],
        to_buffer: &[usize],
    ) -> Self {
        let sorted = |slice: &[usize]| {
            let mut v = slice.to_vec();
            v.sort_unstable();
            v
        };
        Self {
            from_query: sorted(from_query),
            to_query: sorted(to_query),
            from_buffer: sorted(from_buffer),
            to_buffer: sorted(to_buffer),
        }
    }
}

/// Memo shared by all branches of one matcher invocation: which transitions
/// have been derived already, and the best score seen per buffer index.
#[derive(Debug, Default)]
pub struct VisitCache {
    visited: HashSet<TransitionKey>,
    best_by_index: HashMap<usize, f32>,
}

impl VisitCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transition; returns `false` when an identical transition
    /// was already derived from another branch.
    pub fn mark_visited(&mut self, key: TransitionKey) -> bool {
        self.visited.insert(key)
    }

    /// Track the best raw score any branch achieved at a buffer index.
    pub fn record_index_score(&mut self, index: usize, score: f32) {
        let entry = self.best_by_index.entry(index).or_insert(score);
        if score > *entry {
            *entry = score;
        }
    }

    pub fn best_index_score(&self, index: usize) -> Option<f32> {
        self.best_by_index.get(&index).copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
