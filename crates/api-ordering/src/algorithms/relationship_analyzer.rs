//! Relationship Analyzer
//!
//! Finds schema-derived dependencies between operations:
//!
//! 1. Transitive: a parameter schema reaches (through the co-reference
//!    closure) a schema some other operation returns. Confidence 0.85.
//! 2. Fuzzy names: a parameter schema and a response schema share a base
//!    name once common affixes are stripped (`CreateUserRequest` and
//!    `UserResponse` both become `User`). Confidence 0.65.
//!
//! Edges point from the consuming operation to the producing one.

use super::schema_graph::{build_schema_graph, OperationRefs};
use super::token_matcher::{normalize, EnglishTokenMatcher};
use super::transitive_closure::{compute_closure, reachable_including_self};
use crate::config::OrderingConfig;
use crate::domain::entities::{DependencyEdge, Operation};
use crate::domain::value_objects::{
    DependencyType, OperationId, SchemaName, FUZZY_NAME_CONFIDENCE,
    TRANSITIVE_SCHEMA_CONFIDENCE,
};
use crate::ports::outbound::{RelationshipAnalyzer, TokenMatcher};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Schema-name suffixes stripped before prefix stripping.
const SCHEMA_SUFFIXES: &[&str] = &[
    "Request", "Response", "Dto", "Model", "Create", "Update", "Input", "Output", "Payload",
    "Body", "Result", "Entity", "Data", "Details", "Info", "Summary", "Resource", "Params",
    "Command", "View",
];

/// Schema-name prefixes stripped after the suffix.
const SCHEMA_PREFIXES: &[&str] = &[
    "Create", "Update", "Get", "List", "Delete", "Patch", "New", "Add", "Remove", "Search",
];

const MIN_BASE_NAME_LEN: usize = 2;

fn longest_affix<'a>(
    name: &str,
    affixes: &[&'a str],
    matches: impl Fn(&str, &str) -> bool,
) -> Option<&'a str> {
    let lower = name.to_ascii_lowercase();
    affixes
        .iter()
        .filter(|affix| matches(&lower, &affix.to_ascii_lowercase()))
        .max_by_key(|affix| affix.len())
        .copied()
}

/// Strip the longest known suffix, then the longest known prefix.
///
/// Returns `None` when fewer than two characters remain.
pub fn extract_schema_base_name(name: &str) -> Option<String> {
    let mut base = name.trim();

    if let Some(suffix) = longest_affix(base, SCHEMA_SUFFIXES, |n, s| n.ends_with(s)) {
        base = &base[..base.len() - suffix.len()];
    }
    if let Some(prefix) = longest_affix(base, SCHEMA_PREFIXES, |n, p| n.starts_with(p)) {
        base = &base[prefix.len()..];
    }

    if base.chars().count() < MIN_BASE_NAME_LEN {
        return None;
    }
    Some(base.to_string())
}

/// Which analyses run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzerOptions {
    pub transitive_schemas: bool,
    pub fuzzy_names: bool,
    /// Also pair base names the token matcher scores as similar
    pub similar_base_names: bool,
    pub min_token_score: f64,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self::from(&OrderingConfig::default())
    }
}

impl From<&OrderingConfig> for AnalyzerOptions {
    fn from(config: &OrderingConfig) -> Self {
        Self {
            transitive_schemas: config.enable_schema_analysis,
            fuzzy_names: config.enable_fuzzy_names,
            similar_base_names: config.link_similar_base_names,
            min_token_score: config.min_token_score,
        }
    }
}

/// A schema ref owned by an operation.
type OwnedRef = (OperationId, SchemaName);

/// Refs grouped by lower-cased base name.
type BaseGroups = BTreeMap<String, Vec<OwnedRef>>;

/// Relationship analyzer over `$ref` co-references.
pub struct SchemaRelationshipAnalyzer {
    matcher: Arc<dyn TokenMatcher>,
    options: AnalyzerOptions,
}

impl SchemaRelationshipAnalyzer {
    pub fn new() -> Self {
        Self::with_options(Arc::new(EnglishTokenMatcher::new()), AnalyzerOptions::default())
    }

    pub fn with_options(matcher: Arc<dyn TokenMatcher>, options: AnalyzerOptions) -> Self {
        Self { matcher, options }
    }

    /// Consumer -> producer edges found by following the schema closure.
    pub fn transitive_dependencies(&self, operations: &[Operation]) -> Vec<DependencyEdge> {
        let ordered = sorted_by_id(operations);
        let graph = build_schema_graph(operations);
        let closure = compute_closure(&graph);
        debug!(
            schema_nodes = graph.node_count(),
            schema_edges = graph.edge_count(),
            "Built schema co-reference graph"
        );

        let refs: Vec<(&Operation, OperationRefs)> = ordered
            .iter()
            .map(|op| (*op, OperationRefs::from_operation(op)))
            .collect();

        let mut producers: BTreeMap<SchemaName, Vec<&Operation>> = BTreeMap::new();
        for (op, op_refs) in &refs {
            for name in &op_refs.response_refs {
                producers.entry(name.clone()).or_default().push(*op);
            }
        }

        let mut edges = Vec::new();
        for (consumer, op_refs) in &refs {
            let mut linked: BTreeSet<OperationId> = BTreeSet::new();
            for param in &op_refs.parameter_refs {
                for reached in reachable_including_self(&closure, param) {
                    let Some(candidates) = producers.get(&reached) else {
                        continue;
                    };
                    for producer in candidates {
                        if producer.id == consumer.id || !linked.insert(producer.id) {
                            continue;
                        }
                        edges.push(DependencyEdge::new(
                            consumer.id,
                            producer.id,
                            DependencyType::SchemaSchema,
                            format!(
                                "Parameter schema '{}' reaches schema '{}' returned by {}",
                                param,
                                reached,
                                producer.label()
                            ),
                            TRANSITIVE_SCHEMA_CONFIDENCE,
                        ));
                    }
                }
            }
        }
        edges
    }

    /// Consumer -> producer edges found by base-name matching.
    pub fn fuzzy_name_dependencies(&self, operations: &[Operation]) -> Vec<DependencyEdge> {
        let ordered = sorted_by_id(operations);
        let mut consumers = BaseGroups::new();
        let mut producers = BaseGroups::new();
        for op in &ordered {
            let op_refs = OperationRefs::from_operation(op);
            group_by_base(&mut consumers, op.id, &op_refs.parameter_refs);
            group_by_base(&mut producers, op.id, &op_refs.response_refs);
        }

        let mut linked: BTreeSet<(OperationId, OperationId)> = BTreeSet::new();
        let mut edges = Vec::new();

        for (base, consumer_refs) in &consumers {
            let Some(producer_refs) = producers.get(base) else {
                continue;
            };
            pair_refs(consumer_refs, producer_refs, &mut linked, &mut edges, |c, p| {
                format!("Schema '{}' shares base name '{}' with '{}'", c, base, p)
            });
        }

        if self.options.similar_base_names {
            let consumer_bases: Vec<String> = consumers.keys().cloned().collect();
            let producer_bases: Vec<String> = producers.keys().cloned().collect();
            let similar = self.matcher.find_matches(
                &consumer_bases,
                &producer_bases,
                self.options.min_token_score,
            );
            for m in similar.iter().filter(|m| m.source_token != m.matched_token) {
                let (Some(consumer_refs), Some(producer_refs)) = (
                    consumers.get(&normalize(&m.source_token)),
                    producers.get(&normalize(&m.matched_token)),
                ) else {
                    continue;
                };
                pair_refs(consumer_refs, producer_refs, &mut linked, &mut edges, |c, p| {
                    format!(
                        "Schema '{}' base '{}' resembles base '{}' of '{}' ({:?}, score {:.2})",
                        c, m.source_token, m.matched_token, p, m.match_type, m.score
                    )
                });
            }
        }

        edges
    }
}

impl Default for SchemaRelationshipAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl RelationshipAnalyzer for SchemaRelationshipAnalyzer {
    fn analyze(&self, operations: &[Operation]) -> Vec<DependencyEdge> {
        let mut edges = Vec::new();
        if self.options.transitive_schemas {
            edges.extend(self.transitive_dependencies(operations));
        }
        if self.options.fuzzy_names {
            edges.extend(self.fuzzy_name_dependencies(operations));
        }
        debug!(edge_count = edges.len(), "Schema relationship analysis complete");
        edges
    }
}

fn sorted_by_id(operations: &[Operation]) -> Vec<&Operation> {
    let mut ordered: Vec<&Operation> = operations.iter().collect();
    ordered.sort_by(|a, b| a.id.cmp(&b.id));
    ordered
}

fn group_by_base(groups: &mut BaseGroups, owner: OperationId, names: &BTreeSet<SchemaName>) {
    for name in names {
        if let Some(base) = extract_schema_base_name(name.as_str()) {
            groups
                .entry(normalize(&base))
                .or_default()
                .push((owner, name.clone()));
        }
    }
}

fn pair_refs(
    consumer_refs: &[OwnedRef],
    producer_refs: &[OwnedRef],
    linked: &mut BTreeSet<(OperationId, OperationId)>,
    edges: &mut Vec<DependencyEdge>,
    reason: impl Fn(&SchemaName, &SchemaName) -> String,
) {
    for (consumer, consumer_ref) in consumer_refs {
        for (producer, producer_ref) in producer_refs {
            // Identical names belong to the transitive analysis
            if consumer == producer || consumer_ref == producer_ref {
                continue;
            }
            if !linked.insert((*consumer, *producer)) {
                continue;
            }
            edges.push(DependencyEdge::new(
                *consumer,
                *producer,
                DependencyType::SchemaSchema,
                reason(consumer_ref, producer_ref),
                FUZZY_NAME_CONFIDENCE,
            ));
        }
    }
}
