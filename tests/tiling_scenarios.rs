//! End-to-end tiling scenarios
//!
//! Exercises the full matcher pipeline over small letter-alphabet streams:
//! each letter becomes one token type, lists get their pivots from the
//! list builder, and the expectations pin both the exact tiles and the
//! structural invariants every comparison must satisfy.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tessera::{
    Comparison, Match, Submission, TilingMatcher, TilingOptions, Token, TokenList, TokenType,
};

// ─── Helpers ───────────────────────────────────────────────────────

fn stream(letters: &str) -> Vec<Token> {
    letters
        .bytes()
        .enumerate()
        .map(|(i, letter)| Token::new(TokenType(2 + u32::from(letter - b'a')), i as u32 + 1, 0, 1))
        .collect()
}

fn submission(name: &str, letters: &str) -> Submission {
    Submission::new(name, TokenList::from_files(vec![stream(letters)]))
}

fn matcher(minimum: usize) -> TilingMatcher {
    TilingMatcher::new(TilingOptions::new(minimum))
}

/// Checks the invariants every comparison must satisfy: tiles at least as
/// long as the floor, pairwise disjoint on both sides, and never covering
/// a reserved pivot token.
fn assert_well_formed(
    comparison: &Comparison,
    first: &Submission,
    second: &Submission,
    minimum: usize,
) {
    let (first, second) = if comparison.first() == first.name() {
        (first, second)
    } else {
        (second, first)
    };
    let mut covered_first = vec![false; first.token_count()];
    let mut covered_second = vec![false; second.token_count()];

    for tile in comparison.matches() {
        assert!(tile.length >= minimum, "tile below floor: {tile:?}");
        for offset in 0..tile.length {
            let x = tile.start_in_first + offset;
            let y = tile.start_in_second + offset;
            assert!(!covered_first[x], "first side covered twice at {x}");
            assert!(!covered_second[y], "second side covered twice at {y}");
            covered_first[x] = true;
            covered_second[y] = true;

            assert!(
                !first.tokens().token(x).token_type().is_reserved(),
                "reserved token matched at {x} in {}",
                first.name()
            );
            assert!(
                !second.tokens().token(y).token_type().is_reserved(),
                "reserved token matched at {y} in {}",
                second.name()
            );
            assert_eq!(
                first.tokens().token(x).token_type(),
                second.tokens().token(y).token_type(),
                "tile covers unequal token types"
            );
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Section 1: pinned scenarios
// ═══════════════════════════════════════════════════════════════════

#[test]
fn repeated_block_is_one_long_tile() {
    let mut first = submission("first", "abcabc");
    let mut second = submission("second", "xabcabcy");
    let comparison = matcher(3).compare(&mut first, &mut second);
    assert_eq!(comparison.matches(), &[Match::new(0, 1, 6)]);
    assert_well_formed(&comparison, &first, &second, 3);
}

#[test]
fn shared_prefix_is_the_only_tile() {
    let mut first = submission("first", "abcde");
    let mut second = submission("second", "abcfg");
    let comparison = matcher(3).compare(&mut first, &mut second);
    assert_eq!(comparison.matches(), &[Match::new(0, 0, 3)]);
}

#[test]
fn insertion_splits_the_run_into_two_tiles() {
    let mut first = submission("first", "abcdef");
    let mut second = submission("second", "abcxdef");
    let comparison = matcher(3).compare(&mut first, &mut second);
    let mut tiles = comparison.matches().to_vec();
    tiles.sort_by_key(|tile| tile.start_in_first);
    assert_eq!(tiles, vec![Match::new(0, 0, 3), Match::new(3, 4, 3)]);
    assert_well_formed(&comparison, &first, &second, 3);
}

#[test]
fn greedy_takes_the_whole_run_over_floor_pieces() {
    let mut first = submission("first", "aaaaa");
    let mut second = submission("second", "aaaaa");
    let comparison = matcher(2).compare(&mut first, &mut second);
    assert_eq!(comparison.matches(), &[Match::new(0, 0, 5)]);
}

#[test]
fn base_code_region_is_flagged_and_then_ignored() {
    let tiling = matcher(3);
    let mut base = submission("base", "hello");
    tiling.preprocess_base_code(&mut base);

    let mut student = submission("student", "xhellolworld");
    tiling.mark_base_code(&mut student, &mut base);
    for position in 1..=5 {
        assert!(student.tokens().is_base_code(position));
    }
    for position in [0, 6, 7, 8, 9, 10, 11] {
        assert!(!student.tokens().is_base_code(position));
    }

    let mut copy = submission("copy", "xhellolworld");
    tiling.mark_base_code(&mut copy, &mut base);
    let comparison = tiling.compare(&mut student, &mut copy);
    assert_eq!(comparison.matches(), &[Match::new(6, 6, 6)]);
    for tile in comparison.matches() {
        assert!(tile.start_in_first >= 6, "match inside base-code region");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Section 2: structural invariants
// ═══════════════════════════════════════════════════════════════════

#[test]
fn too_short_streams_yield_empty_but_valid_comparisons() {
    let mut first = submission("first", "ab");
    let mut second = submission("second", "abcdefgh");
    let comparison = matcher(3).compare(&mut first, &mut second);
    assert!(comparison.is_empty());
    assert_eq!(comparison.similarity(), 0.0);
}

#[test]
fn comparison_is_symmetric_in_its_arguments() {
    let mut first = submission("first", "abcabcw");
    let mut second = submission("second", "zzabcabczz");
    let forward = matcher(3).compare(&mut first, &mut second);
    let backward = matcher(3).compare(&mut second, &mut first);
    assert_eq!(forward.matches(), backward.matches());
    assert_eq!(forward.first(), backward.first());
    assert_eq!(forward.second(), backward.second());
}

#[test]
fn file_separators_break_tiles() {
    // one submission built from two files, one as a single run
    let mut multi = Submission::new(
        "multi",
        TokenList::from_files(vec![stream("abcabc"), stream("abcabc")]),
    );
    let mut single = submission("single", "abcabcabcabc");
    let comparison = matcher(3).compare(&mut single, &mut multi);

    assert_eq!(comparison.matched_token_count(), 12);
    assert_well_formed(&comparison, &single, &multi, 3);
    // position 6 of the multi-file list is the separator
    assert_eq!(multi.tokens().token_type(6), TokenType::SEPARATOR);
    for tile in comparison.matches() {
        let covers_separator = tile.start_in_second <= 6 && 6 < tile.end_in_second();
        assert!(!covers_separator, "tile spans the file separator: {tile:?}");
    }
}

#[test]
fn random_streams_always_satisfy_the_tile_invariants() {
    let mut rng = StdRng::seed_from_u64(0x7e55e4a);
    let tiling = matcher(3);
    for round in 0..25 {
        let length_first = rng.gen_range(8..60);
        let length_second = rng.gen_range(8..60);
        let letters = |rng: &mut StdRng, length: usize| -> String {
            (0..length)
                .map(|_| char::from(b'a' + rng.gen_range(0..4)))
                .collect()
        };
        let mut first = submission("first", &letters(&mut rng, length_first));
        let mut second = submission("second", &letters(&mut rng, length_second));

        let comparison = tiling.compare(&mut first, &mut second);
        assert_well_formed(&comparison, &first, &second, 3);

        let again = tiling.compare(&mut first, &mut second);
        assert_eq!(comparison.matches(), again.matches(), "round {round} not deterministic");
    }
}

#[test]
fn batch_comparison_agrees_with_sequential_runs() {
    let streams = ["abcabcab", "zabcabcz", "dddabcdd", "abcdefab", "aabbccdd"];
    let mut batch: Vec<Submission> = streams
        .iter()
        .enumerate()
        .map(|(i, letters)| submission(&format!("s{i}"), letters))
        .collect();
    let tiling = matcher(3);
    let results = tiling.compare_all(&mut batch);
    assert_eq!(results.len(), streams.len() * (streams.len() - 1) / 2);

    let mut pair = 0;
    for left in 0..streams.len() {
        for right in left + 1..streams.len() {
            let mut a = submission(&format!("s{left}"), streams[left]);
            let mut b = submission(&format!("s{right}"), streams[right]);
            let sequential = tiling.compare(&mut a, &mut b);
            assert_eq!(results[pair].matches(), sequential.matches());
            assert_eq!(results[pair].first(), sequential.first());
            pair += 1;
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Section 3: result surface
// ═══════════════════════════════════════════════════════════════════

#[test]
fn match_wire_format_is_pinned() {
    let tile = Match::new(3, 7, 9);
    let json = serde_json::to_value(tile).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "startInFirst": 3,
            "startInSecond": 7,
            "length": 9,
        })
    );
    let back: Match = serde_json::from_value(json).unwrap();
    assert_eq!(back, tile);
}

#[test]
fn similarity_reaches_one_for_identical_submissions() {
    let mut first = submission("first", "abcdefghij");
    let mut second = submission("second", "abcdefghij");
    let comparison = matcher(3).compare(&mut first, &mut second);
    assert!((comparison.similarity() - 1.0).abs() < f64::EPSILON);
    assert!((comparison.coverage_of_first() - 1.0).abs() < f64::EPSILON);
}

#[test]
fn match_positions_map_back_to_source_lines() {
    let mut first = submission("first", "abcdef");
    let mut second = submission("second", "qqabcdef");
    let comparison = matcher(3).compare(&mut first, &mut second);
    let tile = comparison.matches()[0];
    // helper tokens carry line = position + 1
    assert_eq!(
        first.tokens().line_range(tile.start_in_first, tile.length),
        Some((1, 6))
    );
    assert_eq!(
        second.tokens().line_range(tile.start_in_second, tile.length),
        Some((3, 8))
    );
}

#[test]
fn out_of_range_floor_is_clamped_not_rejected() {
    let clamped = TilingOptions::new(500);
    assert_eq!(clamped.minimum_token_match(), 25);
    let raised = TilingOptions::new(0);
    assert_eq!(raised.minimum_token_match(), 1);

    // a floor of 1 still produces a working matcher
    let mut first = submission("first", "ab");
    let mut second = submission("second", "xaby");
    let comparison = TilingMatcher::new(raised).compare(&mut first, &mut second);
    assert_eq!(comparison.matches(), &[Match::new(0, 1, 2)]);
}
