//! Dependency-Aware Kahn's Sort
//!
//! Kahn's topological sort over enforced edges, modified to emit one
//! operation at a time and to never fail:
//!
//! 1. `available` holds unvisited operations whose remaining in-degree is 0.
//! 2. When `available` is empty but operations remain, a cycle exists; the
//!    best operation of a closed cycle (a strongly connected component with
//!    no pending dependency outside itself) is promoted as a cycle break.
//! 3. The winner is taken from `available`, recorded, and its dependents
//!    have their in-degree decremented.
//!
//! Every comparison chain ends on the operation id, so identical inputs
//! always give identical output.

use crate::domain::entities::{
    DependencyAnalysis, DependencyGraph, Operation, SortedOperationResult,
};
use crate::domain::value_objects::{OperationId, ReasonCode};
use crate::ports::outbound::TopologicalSorter;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Fan-out above which an operation is tagged `HIGH_FAN_OUT`.
pub const HIGH_FAN_OUT_THRESHOLD: usize = 2;

/// Ordinal case-insensitive path comparison (upper-case folding).
pub fn compare_paths(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_uppercase)
        .cmp(b.chars().flat_map(char::to_uppercase))
}

/// Snapshot of one operation's ranking inputs.
struct Candidate<'a> {
    op: &'a Operation,
    auth: bool,
    in_degree: usize,
    fan_out: usize,
}

/// HTTP method weight, then path, then id.
fn compare_tail(a: &Candidate, b: &Candidate) -> Ordering {
    a.op.method
        .weight()
        .cmp(&b.op.method.weight())
        .then_with(|| compare_paths(&a.op.path, &b.op.path))
        .then_with(|| a.op.id.cmp(&b.op.id))
}

/// Auth first, fan-out desc, in-degree asc.
fn compare_winner(a: &Candidate, b: &Candidate) -> Ordering {
    b.auth
        .cmp(&a.auth)
        .then_with(|| b.fan_out.cmp(&a.fan_out))
        .then_with(|| a.in_degree.cmp(&b.in_degree))
        .then_with(|| compare_tail(a, b))
}

/// In-degree asc, fan-out desc, auth first.
fn compare_cycle_breaker(a: &Candidate, b: &Candidate) -> Ordering {
    a.in_degree
        .cmp(&b.in_degree)
        .then_with(|| b.fan_out.cmp(&a.fan_out))
        .then_with(|| b.auth.cmp(&a.auth))
        .then_with(|| compare_tail(a, b))
}

/// Unvisited operations belonging to a closed component of the remaining
/// enforced graph: a strongly connected component none of whose members
/// depends on an unvisited operation outside it.
///
/// Iterative Tarjan over the dependency direction.
fn closed_cycle_members(
    graph: &DependencyGraph,
    visited: &BTreeSet<OperationId>,
) -> BTreeSet<OperationId> {
    let pending = |id: &OperationId| -> Vec<OperationId> {
        graph
            .dependencies_of(id)
            .into_iter()
            .filter(|dep| !visited.contains(dep))
            .collect()
    };

    let mut index: BTreeMap<OperationId, usize> = BTreeMap::new();
    let mut low: BTreeMap<OperationId, usize> = BTreeMap::new();
    let mut stack: Vec<OperationId> = Vec::new();
    let mut on_stack: BTreeSet<OperationId> = BTreeSet::new();
    let mut components: Vec<BTreeSet<OperationId>> = Vec::new();

    for root in graph.operations.keys().filter(|id| !visited.contains(id)) {
        if index.contains_key(root) {
            continue;
        }
        index.insert(*root, index.len());
        low.insert(*root, index.len() - 1);
        stack.push(*root);
        on_stack.insert(*root);
        let mut work: Vec<(OperationId, Vec<OperationId>, usize)> =
            vec![(*root, pending(root), 0)];

        while let Some((node, next)) = work.last_mut().map(|(node, successors, cursor)| {
            let next = successors.get(*cursor).copied();
            *cursor += 1;
            (*node, next)
        }) {
            match next {
                Some(succ) if !index.contains_key(&succ) => {
                    let i = index.len();
                    index.insert(succ, i);
                    low.insert(succ, i);
                    stack.push(succ);
                    on_stack.insert(succ);
                    work.push((succ, pending(&succ), 0));
                }
                Some(succ) => {
                    if on_stack.contains(&succ) {
                        let succ_index = index.get(&succ).copied().unwrap_or(usize::MAX);
                        if let Some(node_low) = low.get_mut(&node) {
                            *node_low = (*node_low).min(succ_index);
                        }
                    }
                }
                None => {
                    work.pop();
                    let node_low = low.get(&node).copied().unwrap_or(usize::MAX);
                    if let Some((parent, _, _)) = work.last() {
                        if let Some(parent_low) = low.get_mut(parent) {
                            *parent_low = (*parent_low).min(node_low);
                        }
                    }
                    if Some(node_low) == index.get(&node).copied() {
                        let mut component = BTreeSet::new();
                        while let Some(member) = stack.pop() {
                            on_stack.remove(&member);
                            component.insert(member);
                            if member == node {
                                break;
                            }
                        }
                        components.push(component);
                    }
                }
            }
        }
    }

    components
        .into_iter()
        .filter(|component| {
            component
                .iter()
                .all(|id| pending(id).iter().all(|dep| component.contains(dep)))
        })
        .flatten()
        .collect()
}

/// Order every operation of `analysis`.
///
/// Always returns exactly one result per operation with `order_index`
/// covering `1..=N`.
pub fn dependency_aware_sort(analysis: &DependencyAnalysis) -> Vec<SortedOperationResult> {
    let graph = &analysis.graph;
    if graph.operations.is_empty() {
        return vec![];
    }

    // 1. Remaining in-degree per operation (enforced edges only)
    let mut in_degree: BTreeMap<OperationId, usize> = graph
        .operations
        .keys()
        .map(|id| (*id, graph.in_degree(id)))
        .collect();

    let candidate = |id: &OperationId, in_degree: &BTreeMap<OperationId, usize>| {
        graph.operations.get(id).map(|op| Candidate {
            op,
            auth: analysis.auth_related.contains(id),
            in_degree: in_degree.get(id).copied().unwrap_or(0),
            fan_out: graph.fan_out(id),
        })
    };

    // 2. Seed with zero in-degree operations
    let mut available: BTreeSet<OperationId> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut visited: BTreeSet<OperationId> = BTreeSet::new();
    let mut cycle_broken: BTreeSet<OperationId> = BTreeSet::new();
    let mut results: Vec<SortedOperationResult> = Vec::with_capacity(graph.node_count());

    while visited.len() < graph.node_count() {
        // 3. Cycle: promote the best member of a closed cycle
        if available.is_empty() {
            let mut pool = closed_cycle_members(graph, &visited);
            if pool.is_empty() {
                pool = graph
                    .operations
                    .keys()
                    .filter(|id| !visited.contains(id))
                    .copied()
                    .collect();
            }
            let breaker = pool
                .iter()
                .filter_map(|id| candidate(id, &in_degree))
                .min_by(compare_cycle_breaker);
            let Some(breaker) = breaker else {
                break;
            };
            warn!(
                operation = %breaker.op.label(),
                remaining_in_degree = breaker.in_degree,
                "Dependency cycle detected, breaking at operation"
            );
            cycle_broken.insert(breaker.op.id);
            available.insert(breaker.op.id);
        }

        // 4. Select the winner
        let winner = available
            .iter()
            .filter_map(|id| candidate(id, &in_degree))
            .min_by(compare_winner)
            .map(|c| (c.op.id, c.auth));
        let Some((winner, auth)) = winner else {
            break;
        };
        available.remove(&winner);
        visited.insert(winner);

        let dependencies = graph.dependencies_of(&winner);
        let dependents = graph.dependents_of(&winner);
        let fan_out = dependents.len();
        let is_cycle_break = cycle_broken.contains(&winner);

        let mut reason_codes = Vec::new();
        if auth {
            reason_codes.push(ReasonCode::AuthFirst);
        }
        if !dependencies.is_empty() {
            reason_codes.push(ReasonCode::DependencyFirst);
        }
        if fan_out > 0 {
            reason_codes.push(ReasonCode::ProducerFirst);
        }
        if fan_out > HIGH_FAN_OUT_THRESHOLD {
            reason_codes.push(ReasonCode::HighFanOut);
        }
        if is_cycle_break {
            reason_codes.push(ReasonCode::CycleBreakFallback);
        }
        reason_codes.push(ReasonCode::DeterministicTieBreak);

        results.push(SortedOperationResult {
            operation_id: winner,
            order_index: results.len() + 1,
            fan_out,
            is_cycle_break,
            dependencies,
            dependency_edges: graph.outgoing_edges(&winner),
            reason_codes,
        });

        // 5. Release dependents
        for dependent in &dependents {
            if visited.contains(dependent) {
                continue;
            }
            let Some(degree) = in_degree.get_mut(dependent) else {
                continue;
            };
            *degree = degree.saturating_sub(1);
            if *degree == 0 {
                available.insert(*dependent);
            }
        }
    }

    debug!(
        ordered = results.len(),
        cycle_breaks = cycle_broken.len(),
        "Dependency-aware sort complete"
    );
    results
}

/// Modified Kahn's sorter that breaks cycles instead of failing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyAwareSorter;

impl DependencyAwareSorter {
    pub fn new() -> Self {
        Self
    }
}

impl TopologicalSorter for DependencyAwareSorter {
    fn sort(&self, analysis: &DependencyAnalysis) -> Vec<SortedOperationResult> {
        dependency_aware_sort(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{DependencyEdge, DependencyGraph};
    use crate::domain::invariants::{
        invariant_completeness, invariant_contiguous_indices, invariant_dependency_order,
    };
    use crate::domain::value_objects::{DependencyType, HttpMethod};

    fn make_id(val: u128) -> OperationId {
        OperationId::from_u128(val)
    }

    fn make_op(val: u128, method: HttpMethod, path: &str) -> Operation {
        Operation::new(make_id(val), method, path)
    }

    fn edge(from: u128, to: u128, confidence: f64) -> DependencyEdge {
        DependencyEdge::new(
            make_id(from),
            make_id(to),
            DependencyType::SchemaSchema,
            "test",
            confidence,
        )
    }

    fn analysis(ops: &[Operation], edges: &[DependencyEdge], auth: &[u128]) -> DependencyAnalysis {
        DependencyAnalysis {
            graph: DependencyGraph::from_parts(ops, edges),
            auth_related: auth.iter().map(|v| make_id(*v)).collect(),
        }
    }

    fn order(results: &[SortedOperationResult]) -> Vec<OperationId> {
        results.iter().map(|r| r.operation_id).collect()
    }

    /// Test: C depends on B depends on A
    #[test]
    fn test_simple_chain() {
        let ops = vec![
            make_op(1, HttpMethod::Get, "/a"),
            make_op(2, HttpMethod::Get, "/b"),
            make_op(3, HttpMethod::Get, "/c"),
        ];
        let input = analysis(&ops, &[edge(3, 2, 1.0), edge(2, 1, 1.0)], &[]);

        let results = dependency_aware_sort(&input);

        assert_eq!(order(&results), vec![make_id(1), make_id(2), make_id(3)]);
        assert_eq!(
            results.iter().map(|r| r.order_index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(results.iter().all(|r| !r.is_cycle_break));
        assert!(invariant_dependency_order(&results, &input.graph));
    }

    /// Test: independent operations fall back to method weight, then path
    #[test]
    fn test_independent_ops_ordered_by_method_then_path() {
        let ops = vec![
            make_op(1, HttpMethod::Delete, "/a"),
            make_op(2, HttpMethod::Get, "/b"),
            make_op(3, HttpMethod::Get, "/A"),
            make_op(4, HttpMethod::Post, "/z"),
            make_op(5, HttpMethod::Other("TRACE".into()), "/a"),
        ];
        let input = analysis(&ops, &[], &[]);

        let results = dependency_aware_sort(&input);

        assert_eq!(
            order(&results),
            vec![make_id(4), make_id(3), make_id(2), make_id(1), make_id(5)]
        );
    }

    #[test]
    fn test_path_comparison_folds_to_upper_case() {
        assert_eq!(compare_paths("/users", "/USERS"), Ordering::Equal);
        assert_eq!(compare_paths("/a", "/B"), Ordering::Less);
        // '_' sorts after letters once folded to upper case
        assert_eq!(compare_paths("/ab", "/a_b"), Ordering::Less);
    }

    #[test]
    fn test_auth_operation_first() {
        let ops = vec![
            make_op(1, HttpMethod::Post, "/users"),
            make_op(2, HttpMethod::Get, "/auth/token"),
        ];
        let input = analysis(&ops, &[], &[2]);

        let results = dependency_aware_sort(&input);

        assert_eq!(results[0].operation_id, make_id(2));
        assert_eq!(
            results[0].reason_codes,
            vec![ReasonCode::AuthFirst, ReasonCode::DeterministicTieBreak]
        );
    }

    #[test]
    fn test_higher_fan_out_preferred() {
        let ops = vec![
            make_op(1, HttpMethod::Post, "/a"),
            make_op(2, HttpMethod::Post, "/b"),
            make_op(3, HttpMethod::Get, "/c"),
            make_op(4, HttpMethod::Get, "/d"),
            make_op(5, HttpMethod::Get, "/e"),
        ];
        let edges = [edge(3, 2, 1.0), edge(4, 2, 1.0), edge(5, 2, 0.85)];
        let input = analysis(&ops, &edges, &[]);

        let results = dependency_aware_sort(&input);

        assert_eq!(results[0].operation_id, make_id(2));
        assert_eq!(results[0].fan_out, 3);
        assert_eq!(
            results[0].reason_codes,
            vec![
                ReasonCode::ProducerFirst,
                ReasonCode::HighFanOut,
                ReasonCode::DeterministicTieBreak
            ]
        );
    }

    /// Test: A <-> B (mutual enforced edges)
    #[test]
    fn test_two_node_cycle_breaks_once() {
        let ops = vec![
            make_op(1, HttpMethod::Get, "/items/1"),
            make_op(2, HttpMethod::Get, "/items/2"),
        ];
        let input = analysis(&ops, &[edge(1, 2, 1.0), edge(2, 1, 1.0)], &[]);

        let results = dependency_aware_sort(&input);

        assert_eq!(results.len(), 2);
        assert_eq!(results.iter().filter(|r| r.is_cycle_break).count(), 1);
        assert_eq!(results[0].operation_id, make_id(1));
        assert!(results[0].is_cycle_break);
        assert!(results[0]
            .reason_codes
            .contains(&ReasonCode::CycleBreakFallback));
        assert!(!results[1].is_cycle_break);
    }

    /// Test: A -> B -> C -> A plus D depending on A
    #[test]
    fn test_three_node_cycle_with_tail() {
        let ops = vec![
            make_op(1, HttpMethod::Get, "/a"),
            make_op(2, HttpMethod::Get, "/b"),
            make_op(3, HttpMethod::Get, "/c"),
            make_op(4, HttpMethod::Get, "/d"),
        ];
        let edges = [
            edge(1, 2, 1.0),
            edge(2, 3, 1.0),
            edge(3, 1, 1.0),
            edge(4, 1, 1.0),
        ];
        let input = analysis(&ops, &edges, &[]);

        let results = dependency_aware_sort(&input);

        assert_eq!(results.len(), 4);
        assert_eq!(results.iter().filter(|r| r.is_cycle_break).count(), 1);
        // A has the highest fan-out among the cycle members
        assert_eq!(results[0].operation_id, make_id(1));
        assert_eq!(
            order(&results),
            vec![make_id(1), make_id(3), make_id(2), make_id(4)]
        );
        assert!(invariant_completeness(&results, &input.graph));
        assert!(invariant_contiguous_indices(&results));
        assert!(invariant_dependency_order(&results, &input.graph));
    }

    /// Test: A <-> B, T -> A, S -> T, and three operations depending on S.
    /// S has the highest fan-out but sits downstream of the cycle.
    #[test]
    fn test_cycle_break_stays_inside_cycle() {
        let ops = vec![
            make_op(1, HttpMethod::Get, "/a"),
            make_op(2, HttpMethod::Get, "/b"),
            make_op(3, HttpMethod::Get, "/t"),
            make_op(4, HttpMethod::Get, "/s"),
            make_op(5, HttpMethod::Get, "/x5"),
            make_op(6, HttpMethod::Get, "/x6"),
            make_op(7, HttpMethod::Get, "/x7"),
        ];
        let edges = [
            edge(1, 2, 1.0),
            edge(2, 1, 1.0),
            edge(3, 1, 1.0),
            edge(4, 3, 1.0),
            edge(5, 4, 1.0),
            edge(6, 4, 1.0),
            edge(7, 4, 1.0),
        ];
        let input = analysis(&ops, &edges, &[]);

        let results = dependency_aware_sort(&input);

        assert_eq!(
            order(&results),
            (1..=7).map(make_id).collect::<Vec<_>>()
        );
        assert_eq!(results.iter().filter(|r| r.is_cycle_break).count(), 1);
        assert!(results[0].is_cycle_break);
        assert!(!results[3].is_cycle_break);
        assert!(invariant_completeness(&results, &input.graph));
        assert!(invariant_dependency_order(&results, &input.graph));
    }

    #[test]
    fn test_advisory_edges_do_not_constrain() {
        let ops = vec![
            make_op(1, HttpMethod::Post, "/a"),
            make_op(2, HttpMethod::Get, "/b"),
        ];
        // 1 "depends" on 2, but below the enforcement threshold
        let input = analysis(&ops, &[edge(1, 2, 0.3)], &[]);

        let results = dependency_aware_sort(&input);

        assert_eq!(results[0].operation_id, make_id(1));
        assert!(results[0].dependencies.is_empty());
        assert_eq!(results[0].dependency_edges.len(), 1);
        assert_eq!(results[1].fan_out, 0);
    }

    #[test]
    fn test_empty_graph() {
        let input = analysis(&[], &[], &[]);
        assert!(dependency_aware_sort(&input).is_empty());
    }

    #[test]
    fn test_deterministic_output() {
        let ops = vec![
            make_op(1, HttpMethod::Get, "/x/{id}"),
            make_op(2, HttpMethod::Post, "/x"),
            make_op(3, HttpMethod::Put, "/x/{id}"),
        ];
        let edges = [edge(1, 2, 1.0), edge(3, 2, 1.0), edge(1, 3, 0.65)];

        let forward = analysis(&ops, &edges, &[]);
        let mut reversed_ops = ops.clone();
        reversed_ops.reverse();
        let mut reversed_edges = edges.to_vec();
        reversed_edges.reverse();
        let backward = analysis(&reversed_ops, &reversed_edges, &[]);

        let sorter = DependencyAwareSorter::new();
        assert_eq!(sorter.sort(&forward), sorter.sort(&backward));
        assert_eq!(
            order(&sorter.sort(&forward)),
            vec![make_id(2), make_id(3), make_id(1)]
        );
    }
}
