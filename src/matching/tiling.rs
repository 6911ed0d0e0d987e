//! Greedy String Tiling
//!
//! Finds all maximal non-overlapping common token runs between two
//! submissions, longest first: each round scans for the longest tile still
//! available, commits every tile of that length, marks the consumed tokens
//! and repeats until only floor-length tiles remain. Candidate positions
//! come from the rolling-hash index, so a round is near-linear in practice
//! even though the worst case stays quadratic.
//!
//! The matcher also drives base-code subtraction: a comparison against the
//! shared base flags every matched token, and later pairwise runs treat
//! flagged tokens as already consumed.

use rayon::prelude::*;

use super::rolling_hash::hash_token_windows;
use super::{Comparison, Match};
use crate::options::TilingOptions;
use crate::token::{Submission, TokenList};

/// Pairwise submission matcher. Cheap to construct; holds only the
/// validated options. One matcher can serve any number of comparisons.
#[derive(Debug, Clone, Default)]
pub struct TilingMatcher {
    options: TilingOptions,
}

impl TilingMatcher {
    pub fn new(options: TilingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TilingOptions {
        &self.options
    }

    /// Compares two submissions. Never fails: too-short streams (the
    /// `FILE_END` pivot counts toward the size) yield an empty comparison.
    ///
    /// Takes `&mut` only to fill the per-submission hash caches; the
    /// comparison itself reads both sides immutably.
    pub fn compare(&self, a: &mut Submission, b: &mut Submission) -> Comparison {
        // The shorter stream drives the outer scan; ties keep caller order.
        let (first, second) = if a.token_count() > b.token_count() {
            (b, a)
        } else {
            (a, b)
        };
        if first.token_count() > self.options.minimum_token_match() {
            self.prepare(first, false, true);
            self.prepare(second, true, true);
        }
        self.run(first, second, false)
    }

    /// Compares every unordered pair. Each submission is hashed and
    /// indexed once up front; the pairs then run in parallel over
    /// read-only borrows of the stabilized caches.
    pub fn compare_all(&self, submissions: &mut [Submission]) -> Vec<Comparison> {
        for submission in submissions.iter_mut() {
            self.prepare(submission, true, true);
        }
        let shared: &[Submission] = submissions;

        let mut pairs = Vec::with_capacity(shared.len() * shared.len().saturating_sub(1) / 2);
        for left in 0..shared.len() {
            for right in left + 1..shared.len() {
                pairs.push((left, right));
            }
        }

        pairs
            .into_par_iter()
            .map(|(left, right)| {
                let (a, b) = (&shared[left], &shared[right]);
                if a.token_count() > b.token_count() {
                    self.run(b, a, false)
                } else {
                    self.run(a, b, false)
                }
            })
            .collect()
    }

    /// Hashes and indexes the base submission once, so its index is
    /// reused across every [`mark_base_code`](Self::mark_base_code) call.
    pub fn preprocess_base_code(&self, base: &mut Submission) {
        self.prepare(base, true, false);
    }

    /// Runs a base-code comparison and flags every matched token as base
    /// code. Flagged tokens are treated as marked in all later pairwise
    /// comparisons of `submission`. Matches are not reported.
    pub fn mark_base_code(&self, submission: &mut Submission, base: &mut Submission) {
        let swapped = submission.token_count() > base.token_count();
        if submission.token_count().min(base.token_count()) > self.options.minimum_token_match() {
            self.prepare(submission, swapped, false);
            self.prepare(base, true, false);
        }
        let comparison = if swapped {
            self.run(base, submission, true)
        } else {
            self.run(submission, base, true)
        };

        for tile in comparison.matches() {
            let (in_submission, in_base) = if swapped {
                (tile.start_in_second, tile.start_in_first)
            } else {
                (tile.start_in_first, tile.start_in_second)
            };
            submission.tokens_mut().flag_base_code(in_submission, tile.length);
            base.tokens_mut().flag_base_code(in_base, tile.length);
        }
        // The flags feed the marked set of later pairwise runs, so the
        // submission's cached hashes are now stale.
        submission.tokens_mut().invalidate_hashes();
        tracing::debug!(
            submission = submission.name(),
            base = base.name(),
            flagged = comparison.matched_token_count(),
            "base code marked"
        );
    }

    /// Ensures the submission's hash cache matches the configured window,
    /// the index requirement, and the marked-set flavor.
    fn prepare(&self, submission: &mut Submission, need_index: bool, exclude_base_code: bool) {
        let window = self.options.minimum_token_match();
        let list = submission.tokens_mut();
        if list.hashes_valid_for(window, need_index, exclude_base_code) {
            return;
        }
        let marked = initially_marked(list, exclude_base_code);
        if let Some(windows) = hash_token_windows(list, &marked, window, need_index) {
            list.store_hashes(windows.hashes, window, exclude_base_code, windows.index);
        }
    }

    /// The tiling loop proper. `first` must be the shorter list and
    /// `second` must carry a hash index (both are arranged by the public
    /// entry points).
    fn run(&self, first: &Submission, second: &Submission, is_base_code: bool) -> Comparison {
        let first_list = first.tokens();
        let second_list = second.tokens();
        let minimum = self.options.minimum_token_match();

        let mut comparison = Comparison::new(
            first.name(),
            second.name(),
            first_list.matchable_token_count(),
            second_list.matchable_token_count(),
        );
        // <= because the pivot always occupies one slot
        if first_list.len() <= minimum || second_list.len() <= minimum {
            return comparison;
        }
        let Some(index) = second_list.index() else {
            tracing::error!(
                first = first.name(),
                second = second.name(),
                "second submission has no hash index; returning empty comparison"
            );
            return comparison;
        };

        let mut marked_left = initially_marked(first_list, !is_base_code);
        let mut marked_right = initially_marked(second_list, !is_base_code);

        let mut rounds = 0usize;
        loop {
            rounds += 1;
            let mut max_match = minimum;
            let mut tiles: Vec<Match> = Vec::new();

            let mut x = 0;
            while x + max_match < first_list.len() {
                if marked_left[x] {
                    x += 1;
                    continue;
                }
                let Some(hash) = first_list.hash_at(x) else {
                    x += 1;
                    continue;
                };
                'candidates: for &y in index.lookup(hash) {
                    let y = y as usize;
                    // >= keeps the extension inside the pivot guard
                    if marked_right[y] || max_match >= second_list.len() - y {
                        continue;
                    }

                    // Back-scan the current window before extending past
                    // it; hash equality alone can be a collision.
                    for j in (0..max_match).rev() {
                        if first_list.token_type(x + j) != second_list.token_type(y + j)
                            || marked_left[x + j]
                            || marked_right[y + j]
                        {
                            continue 'candidates;
                        }
                    }

                    // Forward-extend. The FILE_END pivots are marked, so
                    // the scan terminates without explicit bounds checks.
                    let mut j = max_match;
                    while first_list.token_type(x + j) == second_list.token_type(y + j)
                        && !marked_left[x + j]
                        && !marked_right[y + j]
                    {
                        j += 1;
                    }

                    // A longer tile invalidates everything collected this
                    // round. Base-code extraction re-collects equal-length
                    // tiles as well: base marking is maximal, not greedy.
                    if (!is_base_code && j > max_match) || (is_base_code && j != max_match) {
                        tiles.clear();
                        max_match = j;
                    }
                    add_match_if_not_overlapping(&mut tiles, Match::new(x, y, j));
                }
                x += 1;
            }

            for tile in &tiles {
                comparison.push(*tile);
                for offset in 0..tile.length {
                    marked_left[tile.start_in_first + offset] = true;
                    marked_right[tile.start_in_second + offset] = true;
                }
            }

            // Nothing grew past the floor this round, so nothing shorter
            // can be waiting either.
            if max_match == minimum {
                break;
            }
        }

        tracing::debug!(
            first = first.name(),
            second = second.name(),
            matches = comparison.matches().len(),
            rounds,
            "tiling complete"
        );
        comparison
    }
}

fn add_match_if_not_overlapping(tiles: &mut Vec<Match>, candidate: Match) {
    if tiles.iter().all(|tile| !tile.overlaps(&candidate)) {
        tiles.push(candidate);
    }
}

/// Pivots and separators are never matchable; base-code tokens join them
/// for pairwise runs but stay fair game while the base pass itself runs.
fn initially_marked(list: &TokenList, exclude_base_code: bool) -> Vec<bool> {
    (0..list.len())
        .map(|position| {
            list.token_type(position).is_reserved()
                || (exclude_base_code && list.is_base_code(position))
        })
        .collect()
}

// ─── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenList, TokenType};

    /// Letters become token types (offset past the reserved values); the
    /// trailing FILE_END pivot is appended by the list builder.
    fn submission(name: &str, stream: &str) -> Submission {
        let tokens: Vec<Token> = stream
            .bytes()
            .enumerate()
            .map(|(i, letter)| {
                Token::new(TokenType(2 + u32::from(letter - b'a')), i as u32 + 1, 0, 1)
            })
            .collect();
        Submission::new(name, TokenList::from_files(vec![tokens]))
    }

    fn matcher(minimum: usize) -> TilingMatcher {
        TilingMatcher::new(TilingOptions::new(minimum))
    }

    #[test]
    fn repeated_block_matches_as_one_tile() {
        let mut first = submission("first", "abcabc");
        let mut second = submission("second", "xabcabcy");
        let comparison = matcher(3).compare(&mut first, &mut second);
        assert_eq!(comparison.matches(), &[Match::new(0, 1, 6)]);
    }

    #[test]
    fn common_prefix_only() {
        let mut first = submission("first", "abcde");
        let mut second = submission("second", "abcfg");
        let comparison = matcher(3).compare(&mut first, &mut second);
        assert_eq!(comparison.matches(), &[Match::new(0, 0, 3)]);
    }

    #[test]
    fn insertion_splits_into_two_tiles() {
        let mut first = submission("first", "abcdef");
        let mut second = submission("second", "abcxdef");
        let mut tiles = matcher(3).compare(&mut first, &mut second).matches().to_vec();
        tiles.sort_by_key(|tile| tile.start_in_first);
        assert_eq!(tiles, vec![Match::new(0, 0, 3), Match::new(3, 4, 3)]);
    }

    #[test]
    fn greedy_prefers_the_longest_tile() {
        let mut first = submission("first", "aaaaa");
        let mut second = submission("second", "aaaaa");
        let comparison = matcher(2).compare(&mut first, &mut second);
        assert_eq!(comparison.matches(), &[Match::new(0, 0, 5)]);
    }

    #[test]
    fn too_short_streams_give_an_empty_comparison() {
        let mut first = submission("first", "abc");
        let mut second = submission("second", "abcdefgh");
        // size 4 including the pivot, floor 4
        let comparison = matcher(4).compare(&mut first, &mut second);
        assert!(comparison.is_empty());
    }

    #[test]
    fn argument_order_does_not_change_the_result() {
        let mut first = submission("first", "abcabcw");
        let mut second = submission("second", "zzabcabczz");
        let forward = matcher(3).compare(&mut first, &mut second);
        let backward = matcher(3).compare(&mut second, &mut first);
        assert_eq!(forward.matches(), backward.matches());
        // the shorter stream is always reported as `first`
        assert_eq!(forward.first(), "first");
        assert_eq!(backward.first(), "first");
        assert_eq!(forward.matches(), &[Match::new(0, 2, 6)]);
    }

    #[test]
    fn floor_is_exclusive_for_growth_but_inclusive_for_reporting() {
        let mut first = submission("first", "abc");
        let mut second = submission("second", "abcz");
        // exactly floor-length tiles are still committed
        let comparison = matcher(2).compare(&mut first, &mut second);
        assert_eq!(comparison.matches(), &[Match::new(0, 0, 3)]);
    }

    #[test]
    fn base_code_pass_flags_both_sides() {
        let mut base = submission("base", "hello");
        let mut student = submission("student", "xhellolworld");
        let tiling = matcher(3);
        tiling.preprocess_base_code(&mut base);
        tiling.mark_base_code(&mut student, &mut base);

        for position in 1..=5 {
            assert!(student.tokens().is_base_code(position), "position {position}");
        }
        assert!(!student.tokens().is_base_code(0));
        assert!(!student.tokens().is_base_code(6));
        for position in 0..5 {
            assert!(base.tokens().is_base_code(position));
        }
    }

    #[test]
    fn flagged_base_code_is_excluded_from_pairwise_matches() {
        let mut base = submission("base", "hello");
        let tiling = matcher(3);
        tiling.preprocess_base_code(&mut base);

        let mut student = submission("student", "xhellolworld");
        let mut copy = submission("copy", "xhellolworld");
        tiling.mark_base_code(&mut student, &mut base);
        tiling.mark_base_code(&mut copy, &mut base);

        let comparison = tiling.compare(&mut student, &mut copy);
        assert_eq!(comparison.matches(), &[Match::new(6, 6, 6)]);
    }

    #[test]
    fn compare_all_agrees_with_sequential_compare() {
        let streams = ["abcabcxy", "zabcabcz", "qqqabcqq", "abcdefab"];
        let mut batch: Vec<Submission> = streams
            .iter()
            .enumerate()
            .map(|(i, stream)| submission(&format!("s{i}"), stream))
            .collect();
        let tiling = matcher(3);
        let parallel = tiling.compare_all(&mut batch);

        let mut pair = 0;
        for left in 0..streams.len() {
            for right in left + 1..streams.len() {
                let mut a = submission("a", streams[left]);
                let mut b = submission("b", streams[right]);
                let sequential = tiling.compare(&mut a, &mut b);
                assert_eq!(parallel[pair].matches(), sequential.matches());
                pair += 1;
            }
        }
    }

    #[test]
    fn identical_submissions_have_full_similarity() {
        let mut first = submission("first", "abcdefgh");
        let mut second = submission("second", "abcdefgh");
        let comparison = matcher(3).compare(&mut first, &mut second);
        assert!((comparison.similarity() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn committed_tiles_are_disjoint_on_both_sides() {
        let mut first = submission("first", "abcabcabcabc");
        let mut second = submission("second", "abcabcxabcabcx");
        let comparison = matcher(3).compare(&mut first, &mut second);
        let tiles = comparison.matches();
        for (i, a) in tiles.iter().enumerate() {
            for b in &tiles[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
        assert!(tiles.iter().all(|tile| tile.length >= 3));
    }
}
