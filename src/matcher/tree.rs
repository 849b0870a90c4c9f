//! Partial and complete phrase alignments.
//!
//! A [`MatchTree`] is a sequence of alignment steps, each mapping a group of
//! query-word indices onto a group of buffer-token indices (many-to-one and
//! one-to-many groups realise combined matches).  Trees are grown outward
//! from a starting branch — backward to query index 0, then forward to the
//! last query index — and carry a monotonically shrinking `score_potential`
//! that lets the search discard a branch the moment it can no longer reach
//! the threshold.
//!
//! Trees live entirely inside one matcher invocation; branching clones the
//! small index vectors, never anything larger.

use crate::phonetics::SCORE_MAX;

// ---------------------------------------------------------------------------
// MatchStep
// ---------------------------------------------------------------------------

/// One aligned group: query indices ↔ buffer indices with the raw score of
/// the comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchStep {
    pub query_indices: Vec<usize>,
    pub buffer_indices: Vec<usize>,
    /// The query text that was compared (joined when combined).
    pub query_text: String,
    /// The buffer phrase it was compared against (joined when combined).
    pub buffer_text: String,
    /// Raw similarity score in `[0, 3]`.
    pub score: f32,
}

// ---------------------------------------------------------------------------
// MatchTree
// ---------------------------------------------------------------------------

/// A (possibly still growing) alignment of the query against the buffer.
#[derive(Debug, Clone)]
pub struct MatchTree {
    steps: Vec<MatchStep>,
    /// Buffer token indices stepped over inside the alignment.
    pub skipped: Vec<usize>,
    /// Upper bound of the weighted total score this tree can still reach.
    pub score_potential: f32,
    /// Token distance between the match and the caret; computed once when
    /// expansion stops.
    pub distance: f32,
}

impl MatchTree {
    /// Create a tree from its starting branch.  `weight` is the combined
    /// weight of the branch's query group.
    pub fn root(step: MatchStep, weight: f32) -> Self {
        let score_potential = SCORE_MAX - (SCORE_MAX - step.score) * weight;
        Self {
            steps: vec![step],
            skipped: Vec::new(),
            score_potential,
            distance: 0.0,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn steps(&self) -> &[MatchStep] {
        &self.steps
    }

    pub fn first_query_index(&self) -> usize {
        self.steps
            .first()
            .and_then(|s| s.query_indices.first())
            .copied()
            .unwrap_or(0)
    }

    pub fn last_query_index(&self) -> usize {
        self.steps
            .last()
            .and_then(|s| s.query_indices.last())
            .copied()
            .unwrap_or(0)
    }

    pub fn first_buffer_index(&self) -> usize {
        self.steps
            .first()
            .and_then(|s| s.buffer_indices.first())
            .copied()
            .unwrap_or(0)
    }

    pub fn last_buffer_index(&self) -> usize {
        self.steps
            .last()
            .and_then(|s| s.buffer_indices.last())
            .copied()
            .unwrap_or(0)
    }

    /// All buffer indices covered by alignment steps (skipped ones
    /// excluded), in order.
    pub fn buffer_indices(&self) -> Vec<usize> {
        self.steps
            .iter()
            .flat_map(|s| s.buffer_indices.iter().copied())
            .collect()
    }

    /// Whether every query index in `0..query_len` is assigned.
    pub fn is_complete(&self, query_len: usize) -> bool {
        self.first_query_index() == 0 && self.last_query_index() + 1 == query_len
    }

    pub fn skip_count(&self) -> usize {
        self.skipped.len()
    }

    /// Number of steps with a fully exact score.
    pub fn exact_step_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.score >= SCORE_MAX)
            .count()
    }

    /// Number of consecutive weak steps at the start of the alignment.
    pub fn leading_weak_steps(&self, weak_below: f32) -> usize {
        self.steps
            .iter()
            .take_while(|s| s.score < weak_below)
            .count()
    }

    /// Longest run of consecutive steps scoring below `weak_below`.
    pub fn longest_weak_run(&self, weak_below: f32) -> usize {
        let mut longest = 0;
        let mut run = 0;
        for step in &self.steps {
            if step.score < weak_below {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 0;
            }
        }
        longest
    }

    /// Whether this match's buffer range overlaps another's.
    pub fn overlaps(&self, other: &MatchTree) -> bool {
        self.first_buffer_index() <= other.last_buffer_index()
            && other.first_buffer_index() <= self.last_buffer_index()
    }

    // -----------------------------------------------------------------------
    // Growth
    // -----------------------------------------------------------------------

    /// Append a step on the given side and shrink the potential by what the
    /// step failed to score.  Returns the new potential.
    pub fn extend(&mut self, step: MatchStep, weight: f32, forward: bool) -> f32 {
        self.score_potential -= (SCORE_MAX - step.score) * weight;
        if forward {
            self.steps.push(step);
        } else {
            self.steps.insert(0, step);
        }
        self.score_potential
    }

    /// Record a skipped buffer token.
    pub fn add_skip(&mut self, buffer_index: usize) {
        self.skipped.push(buffer_index);
    }

    /// Compute and store the distance to the caret token.
    pub fn finalize_distance(&mut self, caret_token_index: Option<usize>) {
        self.distance = match caret_token_index {
            Some(caret) => self
                .buffer_indices()
                .iter()
                .map(|&i| (i as isize - caret as isize).unsigned_abs())
                .min()
                .unwrap_or(0) as f32,
            None => 0.0,
        };
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn step(q: &[usize], b: &[usize], score: f32) -> MatchStep {
        MatchStep {
            query_indices: q.to_vec(),
            buffer_indices: b.to_vec(),
            query_text: String::new(),
            buffer_text: String::new(),
            score,
        }
    }

    #[test]
    fn root_potential_accounts_for_starting_score() {
        let tree = MatchTree::root(step(&[1], &[4], 3.0), 0.5);
        assert_eq!(tree.score_potential, SCORE_MAX);

        let tree = MatchTree::root(step(&[1], &[4], 1.0), 0.5);
        assert_eq!(tree.score_potential, SCORE_MAX - 1.0);
    }

    #[test]
    fn extension_shrinks_potential_monotonically() {
        let mut tree = MatchTree::root(step(&[1], &[4], 3.0), 0.4);
        let p1 = tree.extend(step(&[0], &[3], 2.0), 0.3, false);
        assert!(p1 < SCORE_MAX);
        let p2 = tree.extend(step(&[2], &[5], 0.0), 0.3, true);
        assert!(p2 < p1);
        // Perfect first step, 2.0 at weight 0.3, 0.0 at weight 0.3:
        // 3 − 1·0.3 − 3·0.3 = 1.8
        assert!((p2 - 1.8).abs() < 1e-6);
    }

    #[test]
    fn completeness_and_bounds() {
        let mut tree = MatchTree::root(step(&[1], &[4], 3.0), 0.4);
        assert!(!tree.is_complete(2));
        tree.extend(step(&[0], &[3], 3.0), 0.3, false);
        assert!(tree.is_complete(2));
        assert_eq!(tree.first_query_index(), 0);
        assert_eq!(tree.last_query_index(), 1);
        assert_eq!(tree.first_buffer_index(), 3);
        assert_eq!(tree.last_buffer_index(), 4);
    }

    #[test]
    fn weak_runs() {
        let mut tree = MatchTree::root(step(&[0], &[0], 0.4), 0.2);
        tree.extend(step(&[1], &[1], 0.4), 0.2, true);
        tree.extend(step(&[2], &[2], 3.0), 0.2, true);
        tree.extend(step(&[3], &[3], 0.4), 0.2, true);
        assert_eq!(tree.longest_weak_run(1.0), 2);
        assert_eq!(tree.leading_weak_steps(1.0), 2);
        assert_eq!(tree.exact_step_count(), 1);
    }

    #[test]
    fn distance_uses_nearest_aligned_token() {
        let mut tree = MatchTree::root(step(&[0], &[2], 3.0), 0.5);
        tree.extend(step(&[1], &[3], 3.0), 0.5, true);
        tree.finalize_distance(Some(10));
        assert_eq!(tree.distance, 7.0);
        tree.finalize_distance(None);
        assert_eq!(tree.distance, 0.0);
    }

    #[test]
    fn overlap_detection() {
        let a = MatchTree::root(step(&[0], &[2], 3.0), 0.5);
        let b = MatchTree::root(step(&[0], &[3], 3.0), 0.5);
        assert!(!a.overlaps(&b));
        let mut wide = MatchTree::root(step(&[0], &[2], 3.0), 0.5);
        wide.extend(step(&[1], &[3], 3.0), 0.5, true);
        assert!(wide.overlaps(&b));
    }
}
