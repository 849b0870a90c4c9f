//! Phrase alignment over the token buffer.
//!
//! A windowed, memoized branch-and-bound search that aligns a spoken phrase
//! against the dictated tokens, tolerating misrecognition through the
//! phonetic engine and holes/combinations in the alignment.  Three callers:
//! selection (navigate to a phrase), correction (replace a phrase) and
//! self-repair (newly spoken words fix the words just dictated).

pub mod calculation;
pub mod search;
pub mod tree;
pub mod windows;

pub use calculation::{MatchCalculation, MatchPurpose, TransitionKey, VisitCache};
pub use search::{
    find_best_match, find_matches, find_self_repair_match, find_self_repair_match_with,
    BufferMatch, CORRECTION_THRESHOLD, SELECTION_THRESHOLD, SELF_REPAIR_THRESHOLD,
};
pub use tree::{MatchStep, MatchTree};
pub use windows::{merge_ranges, windows_around_caret, SearchWindow, MAX_WINDOW_TOKENS};
