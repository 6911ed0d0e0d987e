//! Prioritized topological emission
//!
//! Walks the dependency graph with Kahn's algorithm over the hard-edge
//! subgraph. Among the lines whose hard predecessors have all been
//! emitted, the one with the smallest original line number goes first, so
//! the output order is canonical for every input order of the same graph.
//! Soft (reverse-flow only) edges never gate readiness.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use super::graph::NormalizationGraph;
use crate::{TesseraError, TesseraResult};

/// Emits every node exactly once, or reports a cycle in the hard-edge
/// subgraph. Cycles mean the semantic annotator contradicted itself; the
/// walk surfaces that instead of spinning.
pub(crate) fn emit(graph: &NormalizationGraph) -> TesseraResult<Vec<NodeIndex>> {
    let mut hard_predecessors: Vec<usize> = graph
        .node_indices()
        .map(|node| {
            graph
                .edges_directed(node, Direction::Incoming)
                .filter(|edge| edge.weight().is_hard())
                .count()
        })
        .collect();

    let mut ready: BinaryHeap<Reverse<(u32, usize)>> = graph
        .node_indices()
        .filter(|node| hard_predecessors[node.index()] == 0)
        .map(|node| Reverse((graph[node].line(), node.index())))
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    let mut emitted = vec![false; graph.node_count()];

    while let Some(Reverse((_, index))) = ready.pop() {
        let node = NodeIndex::new(index);
        order.push(node);
        emitted[index] = true;

        for edge in graph.edges_directed(node, Direction::Outgoing) {
            if !edge.weight().is_hard() {
                continue;
            }
            let target = edge.target();
            hard_predecessors[target.index()] -= 1;
            if hard_predecessors[target.index()] == 0 {
                ready.push(Reverse((graph[target].line(), target.index())));
            }
        }
    }

    if order.len() != graph.node_count() {
        let line = graph
            .node_indices()
            .filter(|node| !emitted[node.index()])
            .map(|node| graph[node].line())
            .min()
            .unwrap_or(0);
        return Err(TesseraError::CyclicDependencies { line });
    }
    Ok(order)
}

// ─── Tests ─────────────────────────────────────────────────────────
