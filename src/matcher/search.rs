//! Windowed branch-and-bound alignment search.
//!
//! The search proceeds in the order the specification of the problem
//! dictates: build a [`MatchCalculation`], discover starting branches per
//! window (single and combined word roots), then expand each branch
//! backward to query index 0 and forward to the last query index through an
//! explicit worklist.  Every expansion step shrinks the branch's
//! `score_potential`; a branch is dropped the instant it can no longer
//! reach the threshold.  A [`VisitCache`] stops identical transitions from
//! being re-derived out of different branches.

use log::{debug, trace};

use crate::phonetics::{syllable_count, PhoneticEngine, SCORE_MAX};
use crate::tokens::{Token, TokenBuffer};

use super::calculation::{MatchCalculation, MatchPurpose, TransitionKey, VisitCache};
use super::tree::{MatchStep, MatchTree};
use super::windows::{merge_ranges, windows_around_caret};

/// Default threshold for selection queries, on the raw `[0, 3]` score
/// scale: a plain one-edit near-miss (0.75) clears it, unrelated words do
/// not.
pub const SELECTION_THRESHOLD: f32 = 0.5;
/// Default threshold for correction queries.
pub const CORRECTION_THRESHOLD: f32 = 0.5;
/// Default threshold for self-repair detection.  Much higher: a repair of
/// just-dictated words carries mostly exact steps, and a false positive
/// silently rewrites text the user meant to keep.
pub const SELF_REPAIR_THRESHOLD: f32 = 1.0;

/// A combined (many-to-one) interpretation must beat the single-token one
/// by this much before it is worth a branch.
const COMBINE_MARGIN: f32 = 0.1;
/// Maximum tokens/words merged into one alignment step.
const MAX_COMBINE: usize = 3;
/// Starting branches kept per window, best first.
const MAX_BRANCHES_PER_WINDOW: usize = 32;

// ---------------------------------------------------------------------------
// Public results
// ---------------------------------------------------------------------------

/// A ranked match: the aligned buffer tokens plus the alignment itself.
#[derive(Debug, Clone)]
pub struct BufferMatch {
    pub tokens: Vec<Token>,
    pub tree: MatchTree,
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Find the best occurrence of `query_words` in the buffer.  Read-only over
/// the buffer; `None` when nothing clears the threshold.
pub fn find_best_match(
    buffer: &TokenBuffer,
    engine: &mut PhoneticEngine,
    query_words: &[String],
    threshold: f32,
    purpose: MatchPurpose,
) -> Option<BufferMatch> {
    let trees = find_matches(buffer, engine, query_words, threshold, purpose, None);
    let tree = trees.into_iter().next()?;
    let tokens = tree
        .buffer_indices()
        .iter()
        .filter_map(|&i| buffer.tokens().get(i).cloned())
        .collect();
    Some(BufferMatch { tokens, tree })
}

/// Detect whether `query_words` repair the words just dictated at the
/// caret.
///
/// The search looks back at most `len(query)` tokens from the caret token,
/// refuses queries that themselves end a sentence, is invalidated by
/// sentence-ending punctuation inside the looked-back range, and only
/// accepts alignments that start at (or one past) the window start and end
/// exactly on the caret token.
pub fn find_self_repair_match(
    buffer: &TokenBuffer,
    engine: &mut PhoneticEngine,
    query_words: &[String],
) -> Option<MatchTree> {
    find_self_repair_match_with(buffer, engine, query_words, SELF_REPAIR_THRESHOLD)
}

/// [`find_self_repair_match`] with an explicit threshold (configuration
/// override).
pub fn find_self_repair_match_with(
    buffer: &TokenBuffer,
    engine: &mut PhoneticEngine,
    query_words: &[String],
    threshold: f32,
) -> Option<MatchTree> {
    if query_words
        .iter()
        .any(|w| w.trim_end().ends_with(['.', '!', '?']))
    {
        return None;
    }
    let calc = MatchCalculation::new(query_words, threshold, MatchPurpose::SelfRepair)?;
    let caret = buffer.caret_token_index()?;

    let lookback = calc.words.len().min(caret + 1);
    let start = caret + 1 - lookback;

    // A finished sentence between the lookback start and the caret means
    // the user moved on; new words are content, not a repair.
    for token in &buffer.tokens()[start..caret] {
        if token.text.trim_end().ends_with(['.', '!', '?']) {
            return None;
        }
    }

    let mut trees = find_matches(
        buffer,
        engine,
        query_words,
        threshold,
        MatchPurpose::SelfRepair,
        Some((start, caret + 1)),
    );
    trees.retain(|t| {
        t.last_buffer_index() == caret
            && t.first_buffer_index() <= start + 1
            && t.exact_step_count() >= 1
    });

    // Most fully-exact steps first, then the fewest leading weak steps.
    let weak_below = calc.weak_step_score();
    trees.sort_by(|a, b| {
        b.exact_step_count()
            .cmp(&a.exact_step_count())
            .then(a.leading_weak_steps(weak_below).cmp(&b.leading_weak_steps(weak_below)))
    });
    trees.into_iter().next()
}

/// All surviving matches, best first.
pub fn find_matches(
    buffer: &TokenBuffer,
    engine: &mut PhoneticEngine,
    query_words: &[String],
    threshold: f32,
    purpose: MatchPurpose,
    range: Option<(usize, usize)>,
) -> Vec<MatchTree> {
    let Some(calc) = MatchCalculation::new(query_words, threshold, purpose) else {
        return Vec::new();
    };
    let phrases: Vec<String> = buffer.tokens().iter().map(|t| t.phrase.clone()).collect();
    if phrases.is_empty() {
        return Vec::new();
    }
    let caret = buffer.caret_token_index();

    let (lo, hi) = range.unwrap_or((0, phrases.len()));
    let mut cache = VisitCache::new();
    let mut results: Vec<MatchTree> = Vec::new();

    for window in windows_around_caret(phrases.len(), caret, calc.words.len()) {
        let window_lo = window.start.max(lo);
        let window_hi = window.end.min(hi);
        if window_lo >= window_hi {
            continue;
        }

        let branches =
            starting_branches(&calc, engine, &phrases, window_lo, window_hi, &mut cache);
        if branches.is_empty() {
            continue;
        }

        // Union the candidate sub-ranges around the anchors so expansion
        // never walks the whole window.
        let span = calc.words.len() + calc.allowed_skips + MAX_COMBINE;
        let ranges = merge_ranges(
            branches
                .iter()
                .map(|b| {
                    (
                        b.first_buffer_index().saturating_sub(span).max(window_lo),
                        (b.last_buffer_index() + span + 1).min(window_hi),
                    )
                })
                .collect(),
        );

        for branch in branches {
            let anchor = branch.first_buffer_index();
            let bounds = ranges
                .iter()
                .copied()
                .find(|&(s, e)| anchor >= s && anchor < e)
                .unwrap_or((window_lo, window_hi));
            expand_branch(branch, bounds, &calc, engine, &phrases, &mut cache, &mut results);
        }

        // A perfect nearby match cannot be beaten by a farther window.
        if results
            .iter()
            .any(|t| t.score_potential >= SCORE_MAX - f32::EPSILON)
        {
            break;
        }
    }

    finalize(results, &calc, caret)
}

// ---------------------------------------------------------------------------
// Starting branches
// ---------------------------------------------------------------------------

fn starting_branches(
    calc: &MatchCalculation,
    engine: &mut PhoneticEngine,
    phrases: &[String],
    lo: usize,
    hi: usize,
    cache: &mut VisitCache,
) -> Vec<MatchTree> {
    let n = calc.words.len();
    let mut branches = Vec::new();

    for b in lo..hi {
        // Single-word scores at this position anchor the beats-single rule.
        let single_scores: Vec<f32> = (0..n)
            .map(|q| engine.score(&calc.words[q], &phrases[b]))
            .collect();

        for q_len in 1..=MAX_COMBINE.min(n) {
            for q_start in 0..=(n - q_len) {
                let q_group: Vec<usize> = (q_start..q_start + q_len).collect();
                let q_text = calc.joined_words(&q_group);

                let mut b_groups: Vec<Vec<usize>> = vec![vec![b]];
                if b > lo {
                    b_groups.push(vec![b - 1, b]);
                }
                if b + 1 < hi {
                    b_groups.push(vec![b, b + 1]);
                }

                for b_group in b_groups {
                    let b_text: String = b_group
                        .iter()
                        .map(|&i| phrases[i].as_str())
                        .collect();
                    if b_text.is_empty() {
                        continue;
                    }
                    let weight = calc.weight_of(&q_group);
                    let score = engine.score(&q_text, &b_text);
                    if score < calc.target_score() * weight {
                        continue;
                    }
                    // Combined roots must beat the plain single-word
                    // interpretations they are built from.
                    if q_len > 1 || b_group.len() > 1 {
                        let best_single = q_group
                            .iter()
                            .map(|&q| single_scores[q])
                            .fold(0.0f32, f32::max);
                        if score <= best_single {
                            continue;
                        }
                    }
                    // One root per (query group, buffer group) across all
                    // branches and windows.
                    let key = TransitionKey::new(&[], &q_group, &[], &b_group);
                    if !cache.mark_visited(key) {
                        continue;
                    }
                    for &i in &b_group {
                        cache.record_index_score(i, score);
                    }
                    branches.push(MatchTree::root(
                        MatchStep {
                            query_indices: q_group.clone(),
                            buffer_indices: b_group,
                            query_text: q_text.clone(),
                            buffer_text: b_text,
                            score,
                        },
                        weight,
                    ));
                }
            }
        }
    }

    branches.sort_by(|a, b| {
        b.score_potential
            .partial_cmp(&a.score_potential)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    branches.truncate(MAX_BRANCHES_PER_WINDOW);
    trace!("{} starting branches in window {lo}..{hi}", branches.len());
    branches
}

// ---------------------------------------------------------------------------
// Expansion
// ---------------------------------------------------------------------------

fn expand_branch(
    branch: MatchTree,
    bounds: (usize, usize),
    calc: &MatchCalculation,
    engine: &mut PhoneticEngine,
    phrases: &[String],
    cache: &mut VisitCache,
    results: &mut Vec<MatchTree>,
) {
    let n = calc.words.len();
    let mut worklist = vec![branch];

    while let Some(tree) = worklist.pop() {
        if tree.score_potential < calc.target_score() {
            continue;
        }
        if tree.first_query_index() > 0 {
            expand_step(&tree, false, bounds, calc, engine, phrases, cache, &mut worklist);
        } else if tree.last_query_index() + 1 < n {
            expand_step(&tree, true, bounds, calc, engine, phrases, cache, &mut worklist);
        } else {
            results.push(tree);
        }
    }
}

/// Generate every viable continuation of `tree` one query index further in
/// the given direction: the plain single-token step, the skip-one-token
/// step, combined buffer tokens, and combined query words.
#[allow(clippy::too_many_arguments)]
fn expand_step(
    tree: &MatchTree,
    forward: bool,
    bounds: (usize, usize),
    calc: &MatchCalculation,
    engine: &mut PhoneticEngine,
    phrases: &[String],
    cache: &mut VisitCache,
    worklist: &mut Vec<MatchTree>,
) {
    let q = if forward {
        tree.last_query_index() + 1
    } else {
        tree.first_query_index() - 1
    };
    let n = calc.words.len();

    // Single-token continuation score, needed by the combine margins and
    // the perfect-skip rule.
    let single_score = buffer_group(tree, forward, bounds, 1, 0)
        .map(|b_group| engine.score(&calc.words[q], &phrases[b_group[0]]));

    // (query group, buffer group, skipped token)
    let mut options: Vec<(Vec<usize>, Vec<usize>, Option<usize>)> = Vec::new();

    if let Some(b_group) = buffer_group(tree, forward, bounds, 1, 0) {
        options.push((vec![q], b_group, None));
    }

    // Skip one buffer token.
    if tree.skip_count() < calc.allowed_skips {
        if let Some(b_group) = buffer_group(tree, forward, bounds, 1, 1) {
            let skipped = if forward {
                b_group[0] - 1
            } else {
                b_group[0] + 1
            };
            if skip_allowed(tree, forward, engine, calc, phrases, q, skipped, b_group[0]) {
                options.push((vec![q], b_group, Some(skipped)));
            }
        }
    }

    // Combine neighboring buffer tokens under one query word.
    for extra in 2..=MAX_COMBINE {
        if let Some(b_group) = buffer_group(tree, forward, bounds, extra, 0) {
            options.push((vec![q], b_group, None));
        }
    }

    // Combine neighboring query words onto one buffer token.
    for extra in 2..=MAX_COMBINE {
        let q_group: Option<Vec<usize>> = if forward {
            (q + extra <= n).then(|| (q..q + extra).collect())
        } else {
            (q + 1 >= extra).then(|| (q + 1 - extra..=q).collect())
        };
        if let (Some(q_group), Some(b_group)) = (q_group, buffer_group(tree, forward, bounds, 1, 0))
        {
            options.push((q_group, b_group, None));
        }
    }

    let mut sibling_best = f32::MIN;
    for (q_group, b_group, skipped) in options {
        let q_text = calc.joined_words(&q_group);
        let b_text: String = b_group.iter().map(|&i| phrases[i].as_str()).collect();
        let score = engine.score(&q_text, &b_text);

        let combined = q_group.len() > 1 || b_group.len() > 1;
        if combined {
            // A combined step must clearly beat both the single-token
            // interpretation and the best sibling so far.
            let floor = single_score.unwrap_or(0.0).max(sibling_best);
            if score <= floor + COMBINE_MARGIN {
                continue;
            }
        }
        sibling_best = sibling_best.max(score);

        let from = tree
            .steps()
            .last()
            .filter(|_| forward)
            .or_else(|| tree.steps().first());
        let key = TransitionKey::new(
            from.map(|s| s.query_indices.as_slice()).unwrap_or(&[]),
            &q_group,
            from.map(|s| s.buffer_indices.as_slice()).unwrap_or(&[]),
            &b_group,
        );
        if !cache.mark_visited(key) {
            continue;
        }

        let weight = calc.weight_of(&q_group);
        let mut next = tree.clone();
        let potential = next.extend(
            MatchStep {
                query_indices: q_group,
                buffer_indices: b_group.clone(),
                query_text: q_text,
                buffer_text: b_text,
                score,
            },
            weight,
            forward,
        );
        if let Some(skipped) = skipped {
            next.add_skip(skipped);
        }
        if potential < calc.target_score() {
            continue;
        }
        for &i in &b_group {
            cache.record_index_score(i, score);
        }
        worklist.push(next);
    }
}

/// Buffer index group for a continuation: `size` tokens after `skip`
/// skipped ones, on the appropriate side of the tree.  `None` when the
/// group would leave `bounds`.
fn buffer_group(
    tree: &MatchTree,
    forward: bool,
    bounds: (usize, usize),
    size: usize,
    skip: usize,
) -> Option<Vec<usize>> {
    let (lo, hi) = bounds;
    if forward {
        let start = tree.last_buffer_index() + 1 + skip;
        let end = start + size;
        (end <= hi).then(|| (start..end).collect())
    } else {
        let end = tree.first_buffer_index().checked_sub(skip)?;
        let start = end.checked_sub(size)?;
        (start >= lo).then(|| (start..end).collect())
    }
}

/// The acknowledged pair of skip heuristics: a token may be stepped over
/// when it is lighter (by syllable count) than both its buffer neighbors,
/// or when the matches on both sides of the hole are phonetically exact.
/// Either rule suffices; neither is authoritative on its own.
#[allow(clippy::too_many_arguments)]
fn skip_allowed(
    tree: &MatchTree,
    forward: bool,
    engine: &mut PhoneticEngine,
    calc: &MatchCalculation,
    phrases: &[String],
    q: usize,
    skipped: usize,
    landing: usize,
) -> bool {
    let skipped_syllables = syllable_count(&phrases[skipped]);
    let left_ok = skipped
        .checked_sub(1)
        .map_or(true, |i| skipped_syllables <= syllable_count(&phrases[i]));
    let right_ok = phrases
        .get(skipped + 1)
        .map_or(true, |p| skipped_syllables <= syllable_count(p));
    if left_ok && right_ok {
        return true;
    }

    // Perfect-skip rule: the step adjacent to the hole and the landing
    // comparison are both exact.
    let adjacent = if forward {
        tree.steps().last()
    } else {
        tree.steps().first()
    };
    let adjacent_exact = adjacent.is_some_and(|s| s.score >= SCORE_MAX);
    let landing_exact = engine.score(&calc.words[q], &phrases[landing]) >= SCORE_MAX;
    adjacent_exact && landing_exact
}

// ---------------------------------------------------------------------------
// Filtering and ranking
// ---------------------------------------------------------------------------

fn finalize(
    mut results: Vec<MatchTree>,
    calc: &MatchCalculation,
    caret: Option<usize>,
) -> Vec<MatchTree> {
    let weak_below = calc.weak_step_score();

    results.retain(|tree| {
        // Selections anchor their edges on real matches.
        if calc.purpose == MatchPurpose::Selection {
            let edge_zero = tree
                .steps()
                .first()
                .zip(tree.steps().last())
                .is_some_and(|(first, last)| first.score <= 0.0 || last.score <= 0.0);
            if edge_zero {
                return false;
            }
        }
        // Two consecutive weak steps mean the alignment is coasting on its
        // strong words.
        tree.longest_weak_run(weak_below) < 2
    });

    for tree in &mut results {
        tree.finalize_distance(caret);
    }

    // Identical alignments can be reached from different roots.
    results.sort_by(|a, b| {
        a.buffer_indices()
            .cmp(&b.buffer_indices())
            .then(a.steps().len().cmp(&b.steps().len()))
    });
    results.dedup_by(|a, b| {
        a.buffer_indices() == b.buffer_indices()
            && a.steps().len() == b.steps().len()
            && (a.score_potential - b.score_potential).abs() < f32::EPSILON
    });

    match calc.purpose {
        MatchPurpose::Correction => {
            results.sort_by(|a, b| {
                if a.overlaps(b) {
                    compare_potential(a, b)
                } else {
                    a.distance
                        .partial_cmp(&b.distance)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| compare_potential(a, b))
                }
            });
        }
        _ => {
            results.sort_by(|a, b| {
                compare_potential(a, b)
                    .then(a.skip_count().cmp(&b.skip_count()))
                    .then(
                        a.distance
                            .partial_cmp(&b.distance)
                            .unwrap_or(std::cmp::Ordering::Equal),
                    )
            });
        }
    }

    debug!(
        "{} matches survive filtering (purpose {:?})",
        results.len(),
        calc.purpose
    );
    results
}

fn compare_potential(a: &MatchTree, b: &MatchTree) -> std::cmp::Ordering {
    b.score_potential
        .partial_cmp(&a.score_potential)
        .unwrap_or(std::cmp::Ordering::Equal)
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

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_phrase_is_found() {
        let buffer = buffer_with("Insert a new sentence.");
        let mut engine = PhoneticEngine::new();
        let found = find_best_match(
            &buffer,
            &mut engine,
            &words(&["insert", "a"]),
            SELECTION_THRESHOLD,
            MatchPurpose::Selection,
        )
        .expect("expected a match");
        assert_eq!(found.tree.first_buffer_index(), 0);
        assert_eq!(found.tree.last_buffer_index(), 1);
        assert_eq!(found.tree.score_potential, SCORE_MAX);
        assert_eq!(found.tokens[0].phrase, "insert");
        assert_eq!(found.tokens[1].phrase, "a");
    }

    #[test]
    fn no_match_below_threshold() {
        let buffer = buffer_with("Insert a new sentence.");
        let mut engine = PhoneticEngine::new();
        assert!(find_best_match(
            &buffer,
            &mut engine,
            &words(&["giraffe", "xylophone"]),
            SELECTION_THRESHOLD,
            MatchPurpose::Selection,
        )
        .is_none());
    }

    #[test]
    fn phonetic_near_match_is_found() {
        let buffer = buffer_with("please confirm the word now");
        let mut engine = PhoneticEngine::new();
        let found = find_best_match(
            &buffer,
            &mut engine,
            &words(&["confirm", "the", "work"]),
            SELECTION_THRESHOLD,
            MatchPurpose::Selection,
        )
        .expect("expected a fuzzy match");
        // "work" aligns onto "word" (score 0.75).
        assert_eq!(found.tree.buffer_indices(), vec![1, 2, 3]);
    }

    #[test]
    fn nearest_occurrence_wins_ties() {
        // Two identical occurrences; the caret sits at the end, so the
        // second one is closer.
        let buffer = buffer_with("mark the word here and mark the word there");
        let mut engine = PhoneticEngine::new();
        let found = find_best_match(
            &buffer,
            &mut engine,
            &words(&["mark", "the", "word"]),
            SELECTION_THRESHOLD,
            MatchPurpose::Selection,
        )
        .expect("expected a match");
        assert_eq!(found.tree.first_buffer_index(), 5);
    }

    #[test]
    fn skip_allows_one_light_token() {
        // "big" was dictated but not spoken in the query; a three-word
        // query has a skip budget of one.
        let buffer = buffer_with("insert a big new sentence");
        let mut engine = PhoneticEngine::new();
        let found = find_best_match(
            &buffer,
            &mut engine,
            &words(&["insert", "a", "new"]),
            SELECTION_THRESHOLD,
            MatchPurpose::Selection,
        )
        .expect("expected a skip match");
        assert_eq!(found.tree.buffer_indices(), vec![0, 1, 3]);
        assert_eq!(found.tree.skip_count(), 1);
        assert_eq!(found.tree.score_potential, SCORE_MAX);
    }

    #[test]
    fn two_word_queries_have_no_skip_budget() {
        let buffer = buffer_with("insert a big new sentence");
        let mut engine = PhoneticEngine::new();
        let found = find_best_match(
            &buffer,
            &mut engine,
            &words(&["insert", "new"]),
            SELECTION_THRESHOLD,
            MatchPurpose::Selection,
        );
        // Without skips "insert new" cannot align onto "insert a big new"
        // perfectly; whatever comes back must not have skipped anything.
        if let Some(found) = found {
            assert_eq!(found.tree.skip_count(), 0);
        }
    }

    #[test]
    fn combined_buffer_tokens_match_one_query_word() {
        let buffer = buffer_with("the some thing is broken");
        let mut engine = PhoneticEngine::new();
        let found = find_best_match(
            &buffer,
            &mut engine,
            &words(&["something", "is"]),
            SELECTION_THRESHOLD,
            MatchPurpose::Selection,
        )
        .expect("expected a combine match");
        // "something" spans "some" + "thing".
        assert_eq!(found.tree.buffer_indices(), vec![1, 2, 3]);
        assert_eq!(found.tree.steps()[0].buffer_indices, vec![1, 2]);
    }

    #[test]
    fn combined_query_words_match_one_token() {
        let buffer = buffer_with("the keyboard is broken");
        let mut engine = PhoneticEngine::new();
        let found = find_best_match(
            &buffer,
            &mut engine,
            &words(&["key", "board", "is"]),
            SELECTION_THRESHOLD,
            MatchPurpose::Selection,
        )
        .expect("expected a combine match");
        // "key" + "board" collapse onto the single token "keyboard".
        assert_eq!(found.tree.buffer_indices(), vec![1, 2]);
        assert_eq!(found.tree.score_potential, SCORE_MAX);
        assert!(found.tree.steps()[0].query_indices.starts_with(&[0, 1]));
    }

    #[test]
    fn empty_query_and_empty_buffer() {
        let mut engine = PhoneticEngine::new();
        let buffer = buffer_with("some text");
        assert!(find_best_match(
            &buffer,
            &mut engine,
            &[],
            SELECTION_THRESHOLD,
            MatchPurpose::Selection
        )
        .is_none());

        let empty = TokenBuffer::new();
        assert!(find_best_match(
            &empty,
            &mut engine,
            &words(&["anything"]),
            SELECTION_THRESHOLD,
            MatchPurpose::Selection
        )
        .is_none());
    }

    // -- self-repair ----------------------------------------------------------

    #[test]
    fn self_repair_matches_just_dictated_words() {
        let buffer = buffer_with("we should house the data ");
        let mut engine = PhoneticEngine::new();
        // The user restates the tail to fix it: "house the data" →
        // repair starting at "house".
        let tree = find_self_repair_match(
            &buffer,
            &mut engine,
            &words(&["house", "the", "data"]),
        )
        .expect("expected a self-repair match");
        assert_eq!(tree.buffer_indices(), vec![2, 3, 4]);
    }

    #[test]
    fn self_repair_requires_reaching_the_caret() {
        let buffer = buffer_with("house the data got added ");
        let mut engine = PhoneticEngine::new();
        // The phrase exists but is three tokens before the caret.
        assert!(find_self_repair_match(
            &buffer,
            &mut engine,
            &words(&["house", "the", "data"]),
        )
        .is_none());
    }

    #[test]
    fn self_repair_rejects_sentence_punctuation_in_query() {
        let buffer = buffer_with("we should house the data ");
        let mut engine = PhoneticEngine::new();
        assert!(find_self_repair_match(
            &buffer,
            &mut engine,
            &words(&["house", "the", "data."]),
        )
        .is_none());
    }

    #[test]
    fn self_repair_rejects_intervening_sentence_end() {
        let buffer = buffer_with("fix the data. yes truly ");
        let mut engine = PhoneticEngine::new();
        assert!(find_self_repair_match(
            &buffer,
            &mut engine,
            &words(&["data", "yes", "truly"]),
        )
        .is_none());
    }

    #[test]
    fn self_repair_needs_known_caret() {
        let mut buffer = TokenBuffer::new();
        buffer.index_content("house the data", None, None);
        let mut engine = PhoneticEngine::new();
        assert!(find_self_repair_match(
            &buffer,
            &mut engine,
            &words(&["house", "the", "data"]),
        )
        .is_none());
    }
}
