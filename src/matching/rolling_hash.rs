//! Karp-Rabin style rolling hashes over token windows
//!
//! Hashes every window of `window` consecutive tokens from its start
//! position, in a single left-to-right pass. Only the low six bits of each
//! token type contribute, so every window hash stays below
//! `63 * 2^24 < 2^30` and the arithmetic cannot overflow. A window that
//! contains a marked token (pivot, separator, or base code) gets no hash
//! at all; the tiling loop never seeds a tile there.

use super::hash_index::HashIndex;
use crate::token::TokenList;

/// Upper bound on the window width; beyond 25 the shifted token terms
/// would no longer fit the original 32-bit hash layout.
pub(crate) const MAX_HASH_WINDOW: usize = 25;

pub(crate) struct HashedWindows {
    pub hashes: Vec<Option<u64>>,
    pub index: Option<HashIndex>,
}

/// Hashes all windows of `window` tokens, optionally building the
/// position index as positions are produced (ascending). Returns `None`
/// without side effects when the list is shorter than the window.
pub(crate) fn hash_token_windows(
    list: &TokenList,
    marked: &[bool],
    window: usize,
    build_index: bool,
) -> Option<HashedWindows> {
    let window = window.clamp(1, MAX_HASH_WINDOW);
    let size = list.len();
    if size < window {
        return None;
    }

    let positions = size - window;
    let mut hashes: Vec<Option<u64>> = vec![None; size];
    let mut index = build_index.then(|| HashIndex::with_capacity(positions));

    // Seed with the first window, tracking how many tokens since the last
    // marked one; a window hash is only valid once that run spans it.
    let mut hash: u64 = 0;
    let mut unmarked_run = 0usize;
    for i in 0..window {
        hash = 2 * hash + list.token_type(i).low_bits();
        unmarked_run += 1;
        if marked[i] {
            unmarked_run = 0;
        }
    }

    let factor: u64 = 1 << (window - 1);
    for i in 0..positions {
        if unmarked_run >= window {
            hashes[i] = Some(hash);
            if let Some(index) = index.as_mut() {
                index.insert(hash, i as u32);
            }
        }
        // Slide: drop the leading term, shift, append the next token.
        hash = 2 * (hash - factor * list.token_type(i).low_bits())
            + list.token_type(i + window).low_bits();
        if marked[i + window] {
            unmarked_run = 0;
        } else {
            unmarked_run += 1;
        }
    }

    tracing::trace!(
        size,
        window,
        hashed = hashes.iter().filter(|hash| hash.is_some()).count(),
        "token windows hashed"
    );
    Some(HashedWindows { hashes, index })
}

// ─── Tests ─────────────────────────────────────────────────────────
