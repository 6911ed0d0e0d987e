//! Hash-to-positions multimap
//!
//! Maps a window hash to every start position it occurs at, in ascending
//! order. Built once per (token list, window width) pair by the rolling
//! hasher and queried on the hot path of the tiling loop, so lookups must
//! stay expected constant time.

use std::collections::HashMap;

/// Multimap from rolling-hash value to ascending start positions.
#[derive(Debug, Clone, Default)]
pub struct HashIndex {
    buckets: HashMap<u64, Vec<u32>>,
}

impl HashIndex {
    /// Sized for the expected number of hashed windows.
    pub(crate) fn with_capacity(windows: usize) -> Self {
        Self {
            buckets: HashMap::with_capacity(windows),
        }
    }

    /// Positions are inserted in ascending order and kept that way.
    pub(crate) fn insert(&mut self, hash: u64, position: u32) {
        self.buckets.entry(hash).or_default().push(position);
    }

    /// All start positions hashing to `hash`; empty if none do.
    pub fn lookup(&self, hash: u64) -> &[u32] {
        self.buckets.get(&hash).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
