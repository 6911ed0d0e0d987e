//! Match records and comparison results
//!
//! A [`Match`] is one maximal common run of equal-typed tokens between two
//! submissions; a [`Comparison`] is the full result of one pairwise run.
//! Both serialize for downstream tooling; a match's wire format is pinned
//! to `{startInFirst, startInSecond, length}`.

pub mod hash_index;
pub(crate) mod rolling_hash;
pub mod tiling;

pub use hash_index::HashIndex;
pub use tiling::TilingMatcher;

use serde::{Deserialize, Serialize};

// ─── Matches ───────────────────────────────────────────────────────

/// A tile: `length` tokens starting at `start_in_first` in one submission
/// and `start_in_second` in the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub start_in_first: usize,
    pub start_in_second: usize,
    pub length: usize,
}

impl Match {
    pub fn new(start_in_first: usize, start_in_second: usize, length: usize) -> Self {
        Self {
            start_in_first,
            start_in_second,
            length,
        }
    }

    /// Exclusive end of the covered range in the first submission.
    pub fn end_in_first(&self) -> usize {
        self.start_in_first + self.length
    }

    /// Exclusive end of the covered range in the second submission.
    pub fn end_in_second(&self) -> usize {
        self.start_in_second + self.length
    }

    /// True when the token ranges intersect on either side. Committed
    /// tiles of one comparison must be pairwise disjoint.
    pub fn overlaps(&self, other: &Match) -> bool {
        let first_side = self.start_in_first < other.end_in_first()
            && other.start_in_first < self.end_in_first();
        let second_side = self.start_in_second < other.end_in_second()
            && other.start_in_second < self.end_in_second();
        first_side || second_side
    }
}

// ─── Comparisons ───────────────────────────────────────────────────

/// The result of comparing two submissions: the tiles found, in discovery
/// order, plus the matchable token counts of both sides at comparison
/// time (pivots, separators and base code excluded).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    first: String,
    second: String,
    matches: Vec<Match>,
    first_matchable_tokens: usize,
    second_matchable_tokens: usize,
}

impl Comparison {
    pub(crate) fn new(
        first: &str,
        second: &str,
        first_matchable_tokens: usize,
        second_matchable_tokens: usize,
    ) -> Self {
        Self {
            first: first.to_string(),
            second: second.to_string(),
            matches: Vec::new(),
            first_matchable_tokens,
            second_matchable_tokens,
        }
    }

    pub(crate) fn push(&mut self, tile: Match) {
        self.matches.push(tile);
    }

    /// Name of the first (shorter) submission.
    pub fn first(&self) -> &str {
        &self.first
    }

    /// Name of the second (longer) submission.
    pub fn second(&self) -> &str {
        &self.second
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Total number of tokens covered by tiles (per side; tiles are
    /// disjoint, so this is a plain sum).
    pub fn matched_token_count(&self) -> usize {
        self.matches.iter().map(|tile| tile.length).sum()
    }

    /// Average similarity over both sides: `2m / (nA + nB)`.
    pub fn similarity(&self) -> f64 {
        let total = self.first_matchable_tokens + self.second_matchable_tokens;
        if total == 0 {
            return 0.0;
        }
        (2 * self.matched_token_count()) as f64 / total as f64
    }

    /// Fraction of the first submission's matchable tokens covered.
    pub fn coverage_of_first(&self) -> f64 {
        coverage(self.matched_token_count(), self.first_matchable_tokens)
    }

    /// Fraction of the second submission's matchable tokens covered.
    pub fn coverage_of_second(&self) -> f64 {
        coverage(self.matched_token_count(), self.second_matchable_tokens)
    }
}

fn coverage(matched: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64
    }
}

// ─── Tests ─────────────────────────────────────────────────────────
