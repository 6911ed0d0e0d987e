//! Per-token semantic annotations
//!
//! Frontends with a semantic analyzer tag each token with the variables it
//! reads and writes, loop-block boundaries, and positional anchors. The
//! normalization graph is built entirely from these annotations; a frontend
//! without semantics leaves every token at [`CodeSemantics::default`], which
//! degrades normalization to the identity ordering.

use serde::{Deserialize, Serialize};

// ─── Variables ─────────────────────────────────────────────────────

/// An opaque variable identity.
///
/// Identity semantics, not name semantics: every [`VariableRegistry::declare`]
/// call mints a fresh `Variable`, so shadowing declarations of the same name
/// in different scopes stay distinct, while all reads and writes holding one
/// identity compare and hash equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variable(u32);

/// Hands out [`Variable`] identities and remembers their declared names
/// for diagnostics.
#[derive(Debug, Default, Clone)]
pub struct VariableRegistry {
    names: Vec<String>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a fresh variable identity. Calling twice with the same name
    /// yields two distinct variables.
    pub fn declare(&mut self, name: impl Into<String>) -> Variable {
        let id = self.names.len() as u32;
        self.names.push(name.into());
        Variable(id)
    }

    /// The name the variable was declared under.
    pub fn name_of(&self, variable: Variable) -> &str {
        &self.names[variable.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ─── Semantics ─────────────────────────────────────────────────────

/// Dataflow and ordering constraints attached to a token.
///
/// `block_depth_change` is positive on entry to a loop-like block and
/// negative on exit. Full positional significance pins a token absolutely
/// (nothing may cross it); partial significance only preserves relative
/// order among other partially significant tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSemantics {
    reads: Vec<Variable>,
    writes: Vec<Variable>,
    block_depth_change: i32,
    full_position_significance: bool,
    partial_position_significance: bool,
}

impl CodeSemantics {
    /// No constraints at all (the degenerate annotation).
    pub fn none() -> Self {
        Self::default()
    }

    /// A token no other token may cross in either direction, e.g. a
    /// method boundary or a control-flow keyword.
    pub fn full_position() -> Self {
        Self {
            full_position_significance: true,
            ..Self::default()
        }
    }

    /// A token that keeps its order relative to other partially
    /// significant tokens, e.g. an I/O call.
    pub fn partial_position() -> Self {
        Self {
            partial_position_significance: true,
            ..Self::default()
        }
    }

    /// Entry into a block whose statement order may legitimately vary
    /// across iterations (loop bodies).
    pub fn block_begin() -> Self {
        Self {
            block_depth_change: 1,
            ..Self::default()
        }
    }

    /// Exit from a bidirectional block.
    pub fn block_end() -> Self {
        Self {
            block_depth_change: -1,
            ..Self::default()
        }
    }

    pub fn with_read(mut self, variable: Variable) -> Self {
        if !self.reads.contains(&variable) {
            self.reads.push(variable);
        }
        self
    }

    pub fn with_write(mut self, variable: Variable) -> Self {
        if !self.writes.contains(&variable) {
            self.writes.push(variable);
        }
        self
    }

    pub fn reads(&self) -> &[Variable] {
        &self.reads
    }

    pub fn writes(&self) -> &[Variable] {
        &self.writes
    }

    pub fn block_depth_change(&self) -> i32 {
        self.block_depth_change
    }

    pub fn has_full_position_significance(&self) -> bool {
        self.full_position_significance
    }

    pub fn has_partial_position_significance(&self) -> bool {
        self.partial_position_significance
    }

    /// Folds another token's annotation into this one. Used when grouping
    /// the tokens of one source line into a single normalization node:
    /// reads and writes union, depth changes sum, significance flags or.
    pub(crate) fn merge(&mut self, other: &CodeSemantics) {
        for &variable in &other.reads {
            if !self.reads.contains(&variable) {
                self.reads.push(variable);
            }
        }
        for &variable in &other.writes {
            if !self.writes.contains(&variable) {
                self.writes.push(variable);
            }
        }
        self.block_depth_change += other.block_depth_change;
        self.full_position_significance |= other.full_position_significance;
        self.partial_position_significance |= other.partial_position_significance;
    }
}

// ─── Tests ─────────────────────────────────────────────────────────
