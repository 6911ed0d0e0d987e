//! # tessera — Token-Stream Similarity Kernel
//!
//! Detects pairwise similarity between code submissions by aligning their
//! token streams. Language frontends produce the tokens; tessera finds the
//! non-overlapping maximal common tiles between two streams and, where the
//! frontend supplies dataflow semantics, canonicalizes statement order
//! beforehand so reshuffled code still matches.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       TilingMatcher                          │
//! │  ┌─────────────┐  ┌────────────┐  ┌───────────────────────┐  │
//! │  │RollingHasher│  │ HashIndex  │  │ Greedy String Tiling  │  │
//! │  │(Karp-Rabin) │→ │(hash→starts│→ │ back-scan / extend /  │  │
//! │  │             │  │ multimap)  │  │ mark / repeat         │  │
//! │  └─────────────┘  └────────────┘  └───────────┬───────────┘  │
//! │                                               │              │
//! │            base-code pass (flag shared tiles) │              │
//! └───────────────────────────────────────────────┼──────────────┘
//!                                                 ▼
//!   raw tokens → normalize() → TokenList → Comparison { Match… }
//!                    │
//!        ┌───────────▼────────────┐
//!        │   NormalizationGraph   │  per-line nodes, positional +
//!        │  (petgraph DiGraph) →  │  read/write dependency edges,
//!        │  prioritized topo walk │  min-line tie-break
//!        └────────────────────────┘
//! ```
//!
//! ## Capabilities
//!
//! - **Greedy String Tiling**: all maximal non-overlapping common token
//!   runs above a configurable floor, via rolling Karp-Rabin hashes
//! - **Base code subtraction**: tiles shared with an instructor-provided
//!   skeleton are flagged once and ignored in every later comparison
//! - **Dataflow normalization**: per-line dependency graph (reads, writes,
//!   positional anchors, loop blocks) walked topologically to a canonical
//!   statement order
//! - **Batch comparison**: every submission pair, hashed once and compared
//!   in parallel over read-only borrows

pub mod matching;
pub mod normalization;
pub mod options;
pub mod token;

// Re-exports for convenience
pub use matching::{Comparison, HashIndex, Match, TilingMatcher};
pub use normalization::normalize;
pub use options::TilingOptions;
pub use token::{CodeSemantics, Submission, Token, TokenList, TokenType, Variable, VariableRegistry};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TesseraError {
    #[error("token stream has no trailing end-of-file pivot (got {found} tokens)")]
    MissingEndPivot { found: usize },

    #[error("token lines form a dependency cycle; line {line} cannot be scheduled")]
    CyclicDependencies { line: u32 },
}

pub type TesseraResult<T> = Result<T, TesseraError>;
