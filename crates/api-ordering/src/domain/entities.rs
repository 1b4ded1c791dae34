//! Core entities for API operation ordering

use super::value_objects::{
    DependencyType, HttpMethod, MatchType, OperationId, ReasonCode, ENFORCEMENT_THRESHOLD,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One HTTP endpoint (method + path) to be ordered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Unique identifier
    pub id: OperationId,
    /// HTTP method
    pub method: HttpMethod,
    /// Path template, may contain `{param}` segments
    pub path: String,
    /// Declared operationId
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    /// Whether the operation declares its own security requirement
    pub has_explicit_security: bool,
    /// Raw parameter/request-body schema fragments
    pub parameter_schema_payloads: Vec<String>,
    /// Raw response schema fragments
    pub response_schema_payloads: Vec<String>,
}

impl Operation {
    pub fn new(id: OperationId, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            id,
            method,
            path: path.into(),
            operation_id: None,
            summary: None,
            description: None,
            has_explicit_security: false,
            parameter_schema_payloads: Vec::new(),
            response_schema_payloads: Vec::new(),
        }
    }

    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_explicit_security(mut self, secured: bool) -> Self {
        self.has_explicit_security = secured;
        self
    }

    pub fn with_parameter_schema(mut self, payload: impl Into<String>) -> Self {
        self.parameter_schema_payloads.push(payload.into());
        self
    }

    pub fn with_response_schema(mut self, payload: impl Into<String>) -> Self {
        self.response_schema_payloads.push(payload.into());
        self
    }

    /// `METHOD /path`, used in log lines and edge reasons.
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Directed "must happen after" relationship: `source` depends on `target`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// Dependent operation
    pub source: OperationId,
    /// Operation that must run first
    pub target: OperationId,
    pub kind: DependencyType,
    /// Human-readable explanation
    pub reason: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
}

impl DependencyEdge {
    pub fn new(
        source: OperationId,
        target: OperationId,
        kind: DependencyType,
        reason: impl Into<String>,
        confidence: f64,
    ) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            source,
            target,
            kind,
            reason: reason.into(),
            confidence,
        }
    }

    /// Whether this edge constrains the ordering.
    pub fn is_enforced(&self) -> bool {
        self.confidence >= ENFORCEMENT_THRESHOLD
    }

    pub fn is_self_edge(&self) -> bool {
        self.source == self.target
    }
}

/// Outcome of comparing two identifier tokens.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenMatchResult {
    pub source_token: String,
    pub matched_token: String,
    pub score: f64,
    pub match_type: MatchType,
}

/// One entry of the final ordering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SortedOperationResult {
    pub operation_id: OperationId,
    /// 1-based position
    pub order_index: usize,
    /// Number of operations depending on this one
    pub fan_out: usize,
    /// Selected to break a dependency cycle
    pub is_cycle_break: bool,
    /// Direct enforced dependencies
    pub dependencies: BTreeSet<OperationId>,
    /// Every edge sourced from this operation, any confidence
    pub dependency_edges: Vec<DependencyEdge>,
    pub reason_codes: Vec<ReasonCode>,
}

type EdgeKey = (OperationId, OperationId, DependencyType);

/// Operations plus the merged edge set between them.
///
/// Edges are kept de-duplicated per (source, target, kind); a duplicate
/// keeps the higher confidence. Self-edges and edges touching unknown
/// operations are dropped on insert.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// All operations by id (first occurrence wins)
    pub operations: BTreeMap<OperationId, Operation>,
    edges: BTreeMap<EdgeKey, DependencyEdge>,
    /// Enforced adjacency: operation -> operations it depends on
    dependencies: BTreeMap<OperationId, BTreeSet<OperationId>>,
    /// Reverse enforced adjacency: operation -> operations depending on it
    dependents: BTreeMap<OperationId, BTreeSet<OperationId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from operations and raw edges.
    pub fn from_parts(operations: &[Operation], edges: &[DependencyEdge]) -> Self {
        let mut graph = Self::new();
        for op in operations {
            graph.add_node(op.clone());
        }
        for edge in edges {
            graph.add_edge(edge.clone());
        }
        graph
    }

    /// Add an operation. Returns false if the id was already present.
    pub fn add_node(&mut self, op: Operation) -> bool {
        if self.operations.contains_key(&op.id) {
            return false;
        }
        self.dependencies.entry(op.id).or_default();
        self.dependents.entry(op.id).or_default();
        self.operations.insert(op.id, op);
        true
    }

    /// Add an edge. Returns false if it was discarded.
    pub fn add_edge(&mut self, edge: DependencyEdge) -> bool {
        if edge.is_self_edge()
            || !self.operations.contains_key(&edge.source)
            || !self.operations.contains_key(&edge.target)
        {
            return false;
        }

        if edge.is_enforced() {
            self.dependencies
                .entry(edge.source)
                .or_default()
                .insert(edge.target);
            self.dependents
                .entry(edge.target)
                .or_default()
                .insert(edge.source);
        }

        let key = (edge.source, edge.target, edge.kind);
        match self.edges.get_mut(&key) {
            Some(existing) => {
                if edge.confidence > existing.confidence {
                    *existing = edge;
                }
            }
            None => {
                self.edges.insert(key, edge);
            }
        }
        true
    }

    /// Check if an enforced edge exists from -> to
    pub fn has_edge(&self, from: &OperationId, to: &OperationId) -> bool {
        self.dependencies
            .get(from)
            .map(|targets| targets.contains(to))
            .unwrap_or(false)
    }

    /// Merged edges ordered by (source, target, kind).
    pub fn edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.values()
    }

    /// All edges sourced from `id`, any confidence.
    pub fn outgoing_edges(&self, id: &OperationId) -> Vec<DependencyEdge> {
        self.edges
            .range((*id, OperationId::from_u128(0), DependencyType::RuleBased)..)
            .take_while(|((source, _, _), _)| source == id)
            .map(|(_, edge)| edge.clone())
            .collect()
    }

    /// Enforced dependencies of `id`.
    pub fn dependencies_of(&self, id: &OperationId) -> BTreeSet<OperationId> {
        self.dependencies.get(id).cloned().unwrap_or_default()
    }

    /// Operations with an enforced dependency on `id`.
    pub fn dependents_of(&self, id: &OperationId) -> BTreeSet<OperationId> {
        self.dependents.get(id).cloned().unwrap_or_default()
    }

    pub fn in_degree(&self, id: &OperationId) -> usize {
        self.dependencies.get(id).map(BTreeSet::len).unwrap_or(0)
    }

    pub fn fan_out(&self, id: &OperationId) -> usize {
        self.dependents.get(id).map(BTreeSet::len).unwrap_or(0)
    }

    /// Number of operations
    pub fn node_count(&self) -> usize {
        self.operations.len()
    }

    /// Number of merged edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of distinct enforced (source, target) pairs
    pub fn enforced_edge_count(&self) -> usize {
        self.dependencies.values().map(BTreeSet::len).sum()
    }
}

/// Discovered edges and auth flags for a set of operations, before sorting.
#[derive(Debug, Clone)]
pub struct DependencyAnalysis {
    pub graph: DependencyGraph,
    /// Operations detected as authentication endpoints
    pub auth_related: BTreeSet<OperationId>,
}

/// Final ordering plus the analysis it was computed from.
#[derive(Debug, Clone)]
pub struct OrderingOutcome {
    pub results: Vec<SortedOperationResult>,
    pub analysis: DependencyAnalysis,
}

impl OrderingOutcome {
    pub fn cycle_breaks(&self) -> usize {
        self.results.iter().filter(|r| r.is_cycle_break).count()
    }

    /// Operation ids in execution order.
    pub fn flatten(&self) -> Vec<OperationId> {
        self.results.iter().map(|r| r.operation_id).collect()
    }
}
