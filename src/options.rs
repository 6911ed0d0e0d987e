//! Matcher configuration
//!
//! A single knob: the minimum tile length. Out-of-range values are
//! corrected silently (with a warning) rather than rejected, so a matcher
//! can always be constructed.

use serde::{Deserialize, Serialize};

use crate::matching::rolling_hash::MAX_HASH_WINDOW;

/// Configuration for [`TilingMatcher`](crate::TilingMatcher).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilingOptions {
    minimum_token_match: usize,
}

impl TilingOptions {
    /// Recommended floor for real-world token alphabets.
    pub const DEFAULT_MINIMUM_TOKEN_MATCH: usize = 9;

    /// Builds options with the given minimum tile length, clamped to the
    /// range the rolling hasher supports (1 ..= 25).
    pub fn new(minimum_token_match: usize) -> Self {
        let clamped = minimum_token_match.clamp(1, MAX_HASH_WINDOW);
        if clamped != minimum_token_match {
            tracing::warn!(
                requested = minimum_token_match,
                effective = clamped,
                "minimum token match out of range, clamped"
            );
        }
        Self {
            minimum_token_match: clamped,
        }
    }

    /// The minimum number of tokens a reported match must span.
    pub fn minimum_token_match(&self) -> usize {
        self.minimum_token_match
    }
}

impl Default for TilingOptions {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MINIMUM_TOKEN_MATCH)
    }
}
