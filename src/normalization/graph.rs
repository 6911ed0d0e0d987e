//! Dependency graph over token lines
//!
//! Every ordering constraint between two lines becomes a directed edge.
//! Parallel constraints between the same pair merge into one edge that
//! carries the set of kinds plus, per kind, the variable that caused it.
//! All edges point from an earlier line to a later one, so the builder can
//! never produce a cycle on its own; the walk still checks.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};

use super::{group_into_lines, TokenLine};
use crate::token::{CodeSemantics, Token, Variable};

/// Why one line must (or should) stay before another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum EdgeKind {
    /// Nothing may cross a fully position-significant line.
    PositionFull,
    /// Partially significant lines keep their relative order.
    PositionPartial,
    /// Read after write: the value must exist before it is used.
    VariableFlow,
    /// Write after read inside a bidirectional block; a later loop
    /// iteration could legitimately flip the order, so this edge is soft.
    VariableReverseFlow,
    /// Write after write, or write after read outside any block.
    VariableOrder,
}

/// Merged edge between one pair of lines.
#[derive(Debug, Clone, Default)]
pub(crate) struct DependencyEdge {
    kinds: BTreeMap<EdgeKind, Option<Variable>>,
}

impl DependencyEdge {
    pub(crate) fn add(&mut self, kind: EdgeKind, cause: Option<Variable>) {
        self.kinds.entry(kind).or_insert(cause);
    }

    pub(crate) fn has_kind(&self, kind: EdgeKind) -> bool {
        self.kinds.contains_key(&kind)
    }

    pub(crate) fn cause_of(&self, kind: EdgeKind) -> Option<Variable> {
        self.kinds.get(&kind).copied().flatten()
    }

    /// An edge gates the walk unless reverse flow is all it carries.
    pub(crate) fn is_hard(&self) -> bool {
        self.kinds
            .keys()
            .any(|&kind| kind != EdgeKind::VariableReverseFlow)
    }
}

pub(crate) type NormalizationGraph = DiGraph<TokenLine, DependencyEdge>;

/// Builds the dependency graph for a raw token stream.
pub(crate) fn build(tokens: &[Token]) -> NormalizationGraph {
    let mut builder = GraphBuilder::default();
    for line in group_into_lines(tokens) {
        builder.add_line(line);
    }
    builder.graph
}

#[derive(Default)]
struct GraphBuilder {
    graph: NormalizationGraph,
    block_depth: i32,
    in_current_block: HashSet<NodeIndex>,
    pending_full: Vec<NodeIndex>,
    last_full: Option<NodeIndex>,
    last_partial: Option<NodeIndex>,
    reads: HashMap<Variable, Vec<NodeIndex>>,
    writes: HashMap<Variable, Vec<NodeIndex>>,
}

impl GraphBuilder {
    fn add_line(&mut self, line: TokenLine) {
        let semantics = line.semantics().clone();
        let current = self.graph.add_node(line);

        self.track_block(current, &semantics);
        self.link_full_position(current, &semantics);
        self.link_partial_position(current, &semantics);
        self.link_reads(current, &semantics);
        self.link_writes(current, &semantics);

        // Reads are recorded only after every edge for this line exists,
        // so a line reading and writing the same variable does not see
        // itself as an earlier reader.
        for &variable in semantics.reads() {
            self.reads.entry(variable).or_default().push(current);
        }
    }

    fn track_block(&mut self, current: NodeIndex, semantics: &CodeSemantics) {
        self.block_depth += semantics.block_depth_change();
        if self.block_depth > 0 {
            self.in_current_block.insert(current);
        } else {
            self.in_current_block.clear();
        }
    }

    fn link_full_position(&mut self, current: NodeIndex, semantics: &CodeSemantics) {
        if semantics.has_full_position_significance() {
            let pending = std::mem::take(&mut self.pending_full);
            for node in pending {
                self.add_edge(node, current, EdgeKind::PositionFull, None);
            }
            self.last_full = Some(current);
        } else if let Some(last) = self.last_full {
            self.add_edge(last, current, EdgeKind::PositionFull, None);
        }
        self.pending_full.push(current);
    }

    fn link_partial_position(&mut self, current: NodeIndex, semantics: &CodeSemantics) {
        if semantics.has_partial_position_significance() {
            if let Some(last) = self.last_partial {
                self.add_edge(last, current, EdgeKind::PositionPartial, None);
            }
            self.last_partial = Some(current);
        }
    }

    fn link_reads(&mut self, current: NodeIndex, semantics: &CodeSemantics) {
        for &variable in semantics.reads() {
            for node in self.writers_of(variable) {
                self.add_edge(node, current, EdgeKind::VariableFlow, Some(variable));
            }
        }
    }

    fn link_writes(&mut self, current: NodeIndex, semantics: &CodeSemantics) {
        for &variable in semantics.writes() {
            for node in self.writers_of(variable) {
                self.add_edge(node, current, EdgeKind::VariableOrder, Some(variable));
            }
            for node in self.readers_of(variable) {
                let kind = if self.in_current_block.contains(&node) {
                    EdgeKind::VariableReverseFlow
                } else {
                    EdgeKind::VariableOrder
                };
                self.add_edge(node, current, kind, Some(variable));
            }
            self.writes.entry(variable).or_default().push(current);
        }
    }

    fn writers_of(&self, variable: Variable) -> Vec<NodeIndex> {
        self.writes.get(&variable).cloned().unwrap_or_default()
    }

    fn readers_of(&self, variable: Variable) -> Vec<NodeIndex> {
        self.reads.get(&variable).cloned().unwrap_or_default()
    }

    fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, kind: EdgeKind, cause: Option<Variable>) {
        let edge = match self.graph.find_edge(from, to) {
            Some(existing) => existing,
            None => self.graph.add_edge(from, to, DependencyEdge::default()),
        };
        self.graph[edge].add(kind, cause);
    }
}

// ─── Tests ─────────────────────────────────────────────────────────
