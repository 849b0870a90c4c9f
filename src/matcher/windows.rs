//! Windowed partitioning of the token sequence.
//!
//! Large documents are not scanned wholesale: the buffer is cut into
//! bounded-size windows that overlap by twice the query length (so no
//! alignment can straddle a cut invisibly), ordered by distance from the
//! caret so nearby text is searched first and a perfect nearby match can
//! end the search early.

/// Maximum number of tokens per search window.
pub const MAX_WINDOW_TOKENS: usize = 100;

/// One token-index window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub start: usize,
    pub end: usize,
}

impl SearchWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

/// Partition `token_count` tokens into overlapping windows, ordered by
/// distance from the caret token.
pub fn windows_around_caret(
    token_count: usize,
    caret_token_index: Option<usize>,
    query_len: usize,
) -> Vec<SearchWindow> {
    if token_count == 0 {
        return Vec::new();
    }
    let overlap = (query_len * 2).min(MAX_WINDOW_TOKENS / 2);
    let stride = MAX_WINDOW_TOKENS - overlap;

    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + MAX_WINDOW_TOKENS).min(token_count);
        windows.push(SearchWindow { start, end });
        if end == token_count {
            break;
        }
        start += stride;
    }

    // Nearest-to-caret first.
    let caret = caret_token_index.unwrap_or(token_count.saturating_sub(1));
    windows.sort_by_key(|w| {
        if w.contains(caret) {
            0
        } else if caret < w.start {
            w.start - caret
        } else {
            caret - (w.end - 1)
        }
    });
    windows
}

/// Union overlapping or adjacent `[start, end)` ranges.  Used to merge the
/// candidate sub-ranges around branch anchors before expansion.
pub fn merge_ranges(mut ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    if ranges.is_empty() {
        return ranges;
    }
    ranges.sort_unstable();
    let mut merged: Vec<(usize, usize)> = vec![ranges[0]];
    for (start, end) in ranges.into_iter().skip(1) {
        let last = merged.last_mut().expect("merged is non-empty");
        if start <= last.1 {
            last.1 = last.1.max(end);
        } else {
            merged.push((start, end));
        }
    }
    merged
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_buffers_are_one_window() {
        let windows = windows_around_caret(30, Some(10), 3);
        assert_eq!(windows, vec![SearchWindow { start: 0, end: 30 }]);
    }

    #[test]
    fn large_buffers_overlap_by_twice_query_len() {
        let windows = windows_around_caret(250, Some(0), 3);
        assert!(windows.len() >= 3);
        // Consecutive windows (by start) overlap by 6 tokens.
        let mut by_start = windows.clone();
        by_start.sort_by_key(|w| w.start);
        assert_eq!(by_start[0].end - by_start[1].start, 6);
        // Every token is covered.
        assert_eq!(by_start.first().unwrap().start, 0);
        assert_eq!(by_start.last().unwrap().end, 250);
    }

    #[test]
    fn caret_window_comes_first() {
        let windows = windows_around_caret(300, Some(299), 2);
        assert!(windows[0].contains(299));
    }

    #[test]
    fn range_merging_unions_overlaps() {
        let merged = merge_ranges(vec![(10, 20), (0, 5), (18, 25), (5, 7)]);
        assert_eq!(merged, vec![(0, 7), (10, 25)]);
    }

    #[test]
    fn empty_inputs() {
        assert!(windows_around_caret(0, None, 3).is_empty());
        assert!(merge_ranges(Vec::new()).is_empty());
    }
}
