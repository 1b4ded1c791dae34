//! Transitive Closure
//!
//! Warshall-style reachability over the schema graph: if i -> k and
//! k -> j then i -> j, repeated until nothing changes. A node only reaches
//! itself when a cycle leads back to it, which in the bidirectional
//! co-reference graph is any node with at least one neighbor.

use super::schema_graph::SchemaGraph;
use crate::domain::value_objects::SchemaName;
use std::collections::{BTreeMap, BTreeSet};

/// Full reachable set per schema name.
pub type SchemaClosure = BTreeMap<SchemaName, BTreeSet<SchemaName>>;

/// Compute the transitive closure of `graph`.
///
/// The result is a pure set per node; insertion order of the graph has no
/// effect on it.
pub fn compute_closure(graph: &SchemaGraph) -> SchemaClosure {
    let mut reach: SchemaClosure = graph
        .nodes()
        .map(|node| {
            let direct = graph.neighbors(node).cloned().unwrap_or_default();
            (node.clone(), direct)
        })
        .collect();

    let nodes: Vec<SchemaName> = reach.keys().cloned().collect();

    loop {
        let mut changed = false;

        for k in &nodes {
            let via_k = reach.get(k).cloned().unwrap_or_default();
            if via_k.is_empty() {
                continue;
            }
            for i in &nodes {
                let Some(reachable) = reach.get_mut(i) else {
                    continue;
                };
                if !reachable.contains(k) {
                    continue;
                }
                for j in &via_k {
                    changed |= reachable.insert(j.clone());
                }
            }
        }

        if !changed {
            break;
        }
    }

    reach
}

/// Names reachable from `name`, including `name` itself.
pub fn reachable_including_self(closure: &SchemaClosure, name: &SchemaName) -> BTreeSet<SchemaName> {
    let mut out = closure.get(name).cloned().unwrap_or_default();
    out.insert(name.clone());
    out
}
