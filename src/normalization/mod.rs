//! Dataflow-aware token normalization
//!
//! Reorders a token stream into a canonical statement order, so that two
//! submissions differing only by harmless statement shuffling produce
//! identical streams before matching. Tokens are grouped per source line,
//! the lines become nodes of a dependency graph (positional anchors,
//! variable reads and writes, loop blocks), and the graph is walked
//! topologically with the original line number as tie-breaker.
//!
//! Frontends without a semantic analyzer leave every annotation at its
//! default; the graph then has no edges and the walk reproduces the
//! source order unchanged.

pub(crate) mod graph;
pub(crate) mod sorter;

use crate::token::{CodeSemantics, Token};
use crate::TesseraResult;

/// A consecutive run of tokens sharing one source line, carrying the
/// merged semantics of its tokens. The unit of reordering: tokens never
/// move relative to each other within their line.
#[derive(Debug, Clone)]
pub(crate) struct TokenLine {
    line: u32,
    tokens: Vec<Token>,
    semantics: CodeSemantics,
}

impl TokenLine {
    pub(crate) fn new(line: u32) -> Self {
        Self {
            line,
            tokens: Vec::new(),
            semantics: CodeSemantics::none(),
        }
    }

    pub(crate) fn push(&mut self, token: Token) {
        self.semantics.merge(token.semantics());
        self.tokens.push(token);
    }

    pub(crate) fn line(&self) -> u32 {
        self.line
    }

    pub(crate) fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub(crate) fn semantics(&self) -> &CodeSemantics {
        &self.semantics
    }
}

/// Canonicalizes a raw per-file token stream (no pivots; those are added
/// when the [`TokenList`](crate::TokenList) is assembled).
///
/// Deterministic, and idempotent on its own output. Fails only when the
/// semantic annotations are inconsistent enough to cycle, which the walk
/// reports instead of hanging.
pub fn normalize(tokens: &[Token]) -> TesseraResult<Vec<Token>> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let graph = graph::build(tokens);
    let order = sorter::emit(&graph)?;

    let mut normalized = Vec::with_capacity(tokens.len());
    for node in order {
        normalized.extend_from_slice(graph[node].tokens());
    }
    tracing::trace!(
        lines = graph.node_count(),
        tokens = normalized.len(),
        "token stream normalized"
    );
    Ok(normalized)
}

/// Groups consecutive tokens by source line.
pub(crate) fn group_into_lines(tokens: &[Token]) -> Vec<TokenLine> {
    let mut lines: Vec<TokenLine> = Vec::new();
    for token in tokens {
        match lines.last_mut() {
            Some(current) if current.line() == token.line() => current.push(token.clone()),
            _ => {
                let mut current = TokenLine::new(token.line());
                current.push(token.clone());
                lines.push(current);
            }
        }
    }
    lines
}

// ─── Tests ─────────────────────────────────────────────────────────
