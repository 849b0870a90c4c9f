//! Word-to-word phonetic similarity scoring.
//!
//! [`PhoneticEngine::score`] returns a value in `[0, 3]`:
//!
//! | Band | Meaning |
//! |------|---------|
//! | 3    | identical (after normalization) |
//! | 2    | registered homophone, or equal under the strict reduction |
//! | 0..1 | best edit-distance interpretation, `1 − distance / len` |
//!
//! Two grapheme reductions are used.  The *strict* reduction removes
//! voicing/place-of-articulation distinctions (`ph`→`f`, `d`/`t`, `b`/`p`,
//! `g`/`k`, `v`/`f`, `s`/`z`, doubled letters collapse) and decides the
//! score-2 band.  The *loose* reduction additionally merges `th`→`t` and all
//! vowels, and feeds the edit-distance band, where the best of the direct,
//! homophone-substituted and loose-reduced interpretations wins.

use std::collections::HashMap;

use super::tables::{PersistentTable, WordTable};

/// Maximum similarity score: identical words.
pub const SCORE_MAX: f32 = 3.0;
/// Homophone / strict-reduction band.
pub const SCORE_HOMOPHONE: f32 = 2.0;

// ---------------------------------------------------------------------------
// Grapheme reductions
// ---------------------------------------------------------------------------

/// Digraph substitutions applied before the per-letter mergers, in order.
const DIGRAPH_RULES: &[(&str, &str)] = &[("ph", "f"), ("ck", "k"), ("gh", "g"), ("qu", "kw")];

/// Additional digraphs collapsed by the loose reduction only.
const LOOSE_DIGRAPH_RULES: &[(&str, &str)] = &[("th", "t"), ("wh", "w"), ("dg", "j")];

fn merge_voicing(c: char) -> char {
    match c {
        'b' => 'p',
        'd' => 't',
        'g' => 'k',
        'v' => 'f',
        'z' => 's',
        'c' => 'k',
        'q' => 'k',
        _ => c,
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn normalize(word: &str) -> String {
    word.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

fn apply_digraphs(word: &str, rules: &[(&str, &str)]) -> String {
    let mut out = word.to_string();
    for (pattern, replacement) in rules {
        out = out.replace(pattern, replacement);
    }
    out
}

fn dedupe(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut previous = None;
    for c in word.chars() {
        if previous != Some(c) {
            out.push(c);
        }
        previous = Some(c);
    }
    out
}

/// Strict reduction: voicing/place mergers and doubled-letter collapse.
/// Equality under this reduction means "sounds the same" for scoring.
pub fn strict_reduction(word: &str) -> String {
    let normalized = normalize(word);
    let substituted = apply_digraphs(&normalized, DIGRAPH_RULES);
    let merged: String = substituted.chars().map(merge_voicing).collect();
    dedupe(&merged)
}

/// Loose reduction: the strict reduction plus `th`→`t` and a full vowel
/// merger, used for the edit-distance band.
pub fn loose_reduction(word: &str) -> String {
    let normalized = normalize(word);
    let substituted = apply_digraphs(
        &apply_digraphs(&normalized, DIGRAPH_RULES),
        LOOSE_DIGRAPH_RULES,
    );
    let merged: String = substituted
        .chars()
        .map(merge_voicing)
        .map(|c| if is_vowel(c) { 'a' } else { c })
        .collect();
    dedupe(&merged)
}

// ---------------------------------------------------------------------------
// Edit distance
// ---------------------------------------------------------------------------

/// Plain Levenshtein distance over chars.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut dp = vec![vec![0usize; b.len() + 1]; a.len() + 1];

    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        dp[0][j] = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            dp[i][j] = (dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1)
                .min(dp[i - 1][j - 1] + cost);
        }
    }
    dp[a.len()][b.len()]
}

fn distance_score(a: &str, b: &str) -> f32 {
    let len = a.chars().count().max(b.chars().count());
    if len == 0 {
        return 0.0;
    }
    (1.0 - edit_distance(a, b) as f32 / len as f32).max(0.0)
}

// ---------------------------------------------------------------------------
// Syllables
// ---------------------------------------------------------------------------

/// Heuristic syllable count: vowel groups, silent trailing `e` discounted,
/// floor of one.
pub fn syllable_count(word: &str) -> usize {
    let word = normalize(word);
    let chars: Vec<char> = word.chars().collect();
    let vowel = |c: char| is_vowel(c) || c == 'y';

    let mut count = 0;
    let mut in_group = false;
    for &c in &chars {
        if vowel(c) {
            if !in_group {
                count += 1;
            }
            in_group = true;
        } else {
            in_group = false;
        }
    }

    // Silent trailing e ("sentence", "like") does not carry a syllable.
    if count > 1 && chars.last() == Some(&'e') {
        if let Some(&before) = chars.get(chars.len().wrapping_sub(2)) {
            if !vowel(before) {
                count -= 1;
            }
        }
    }
    count.max(1)
}

/// Scale a raw word score by the word's share of the phrase's syllables, so
/// aggregate phrase scores emphasise longer words.
pub fn calculate_syllable_score(raw_score: f32, query_word: &str, total_syllables: usize) -> f32 {
    if total_syllables == 0 {
        return 0.0;
    }
    raw_score * syllable_count(query_word) as f32 / total_syllables as f32
}

// ---------------------------------------------------------------------------
// PhoneticEngine
// ---------------------------------------------------------------------------

/// Word-pair scorer backed by mutable homophone / similarity tables and a
/// pair-score memo.
///
/// The tables are [`PersistentTable`]s: additions made through
/// [`add_homophone`](Self::add_homophone) / [`add_similarity`](Self::add_similarity)
/// are handed to the table's save callback, or kept in memory only when
/// none was wired in.
pub struct PhoneticEngine {
    homophones: PersistentTable,
    similarities: PersistentTable,
    memo: HashMap<(String, String), f32>,
}

impl PhoneticEngine {
    /// In-memory engine with empty tables and no persistence.
    pub fn new() -> Self {
        Self::with_tables(
            PersistentTable::new(WordTable::new(), "homophone"),
            PersistentTable::new(WordTable::new(), "similarity"),
        )
    }

    /// Build from preloaded tables, typically carrying save callbacks wired
    /// to the on-disk row files.
    pub fn with_tables(homophones: PersistentTable, similarities: PersistentTable) -> Self {
        Self {
            homophones,
            similarities,
            memo: HashMap::new(),
        }
    }

    pub fn homophones(&self) -> &WordTable {
        self.homophones.table()
    }

    pub fn similarities(&self) -> &WordTable {
        self.similarities.table()
    }

    /// Register a homophone pair and ask the table to persist itself.  The
    /// memo is dropped because cached scores may have just become stale.
    pub fn add_homophone(&mut self, a: &str, b: &str) {
        self.homophones.add_pair(&normalize(a), &normalize(b));
        self.memo.clear();
    }

    pub fn add_similarity(&mut self, a: &str, b: &str) {
        self.similarities.add_pair(&normalize(a), &normalize(b));
        self.memo.clear();
    }

    /// Score two words, memoized.  Symmetric.
    pub fn score(&mut self, a: &str, b: &str) -> f32 {
        let a = normalize(a);
        let b = normalize(b);
        let key = if a <= b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        };
        if let Some(&score) = self.memo.get(&key) {
            return score;
        }
        let score = self.score_uncached(&a, &b);
        self.memo.insert(key, score);
        score
    }

    fn score_uncached(&self, a: &str, b: &str) -> f32 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        if a == b {
            return SCORE_MAX;
        }
        if self.homophones.table().contains_pair(a, b) {
            return SCORE_HOMOPHONE;
        }
        if strict_reduction(a) == strict_reduction(b) {
            return SCORE_HOMOPHONE;
        }

        // Distance band: best of the direct, homophone-substituted and
        // loose-reduced interpretations.
        let mut best = distance_score(a, b).max(distance_score(
            &loose_reduction(a),
            &loose_reduction(b),
        ));
        for homophone in self.homophones.table().related(a) {
            best = best.max(distance_score(homophone, b));
        }
        // A registered similarity is at least as good as a one-edit miss.
        if self.similarities.table().contains_pair(a, b) {
            best = best.max(1.0);
        }
        best.clamp(0.0, 1.0)
    }
}

impl Default for PhoneticEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PhoneticEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhoneticEngine")
            .field("homophones", &self.homophones.table().len())
            .field("similarities", &self.similarities.table().len())
            .field("memoized_pairs", &self.memo.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
