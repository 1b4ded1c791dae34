//! Domain invariants for the final ordering

use super::entities::{DependencyGraph, SortedOperationResult};
use super::value_objects::OperationId;
use std::collections::{BTreeMap, BTreeSet};

/// INVARIANT-1: Completeness
/// Every operation is ordered exactly once.
pub fn invariant_completeness(results: &[SortedOperationResult], graph: &DependencyGraph) -> bool {
    let ordered: BTreeSet<OperationId> = results.iter().map(|r| r.operation_id).collect();
    let all_ops: BTreeSet<OperationId> = graph.operations.keys().copied().collect();

    results.len() == all_ops.len() && ordered == all_ops
}

/// INVARIANT-2: Contiguous Indices
/// `order_index` covers exactly 1..=N in result order.
pub fn invariant_contiguous_indices(results: &[SortedOperationResult]) -> bool {
    results
        .iter()
        .enumerate()
        .all(|(i, r)| r.order_index == i + 1)
}

/// INVARIANT-3: Dependency Order
/// For every enforced edge not on a cycle, the target is ordered first.
pub fn invariant_dependency_order(
    results: &[SortedOperationResult],
    graph: &DependencyGraph,
) -> bool {
    let positions: BTreeMap<OperationId, usize> = results
        .iter()
        .map(|r| (r.operation_id, r.order_index))
        .collect();

    for edge in graph.edges().filter(|e| e.is_enforced()) {
        if edge_on_cycle(graph, &edge.source, &edge.target) {
            continue;
        }
        let (Some(source), Some(target)) =
            (positions.get(&edge.source), positions.get(&edge.target))
        else {
            return false;
        };
        if target >= source {
            return false;
        }
    }

    true
}

/// An enforced edge source -> target lies on a cycle when target can reach
/// source again through enforced edges.
pub fn edge_on_cycle(graph: &DependencyGraph, source: &OperationId, target: &OperationId) -> bool {
    let mut visited = BTreeSet::new();
    reaches_dfs(graph, *target, source, &mut visited)
}

fn reaches_dfs(
    graph: &DependencyGraph,
    node: OperationId,
    goal: &OperationId,
    visited: &mut BTreeSet<OperationId>,
) -> bool {
    if node == *goal {
        return true;
    }
    if !visited.insert(node) {
        return false;
    }

    graph
        .dependencies_of(&node)
        .into_iter()
        .any(|next| reaches_dfs(graph, next, goal, visited))
}

/// Whether the enforced graph contains any cycle.
pub fn has_cycle(graph: &DependencyGraph) -> bool {
    graph
        .edges()
        .filter(|e| e.is_enforced())
        .any(|e| edge_on_cycle(graph, &e.source, &e.target))
}
