//! Dependency Ordering Service
//!
//! Main service implementing DependencyOrderingApi.

use crate::adapters::InMemoryOperationSource;
use crate::algorithms::relationship_analyzer::{AnalyzerOptions, SchemaRelationshipAnalyzer};
use crate::algorithms::rule_engine::{apply_rules, restrict};
use crate::algorithms::token_matcher::EnglishTokenMatcher;
use crate::algorithms::DependencyAwareSorter;
use crate::config::OrderingConfig;
use crate::domain::entities::{
    DependencyAnalysis, DependencyGraph, Operation, OrderingOutcome,
};
use crate::domain::errors::{OrderingError, SourceError};
use crate::domain::value_objects::{DependencyType, OperationId, SpecificationId};
use crate::ports::inbound::DependencyOrderingApi;
use crate::ports::outbound::{OperationSource, RelationshipAnalyzer, TopologicalSorter};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

/// Dependency Ordering Service
///
/// Orchestrates the ordering pipeline:
/// 1. Validate input and apply the selection
/// 2. Apply rules (path-parameter edges, auth detection)
/// 3. Analyze schema relationships
/// 4. Merge edges into one dependency graph
/// 5. Run the dependency-aware sort
pub struct DependencyOrderingService {
    config: OrderingConfig,
    analyzer: Arc<dyn RelationshipAnalyzer>,
    sorter: Arc<dyn TopologicalSorter>,
    source: Arc<dyn OperationSource>,
}

impl DependencyOrderingService {
    /// Create a new service with default config
    pub fn new() -> Self {
        Self::with_config(OrderingConfig::default())
    }

    /// Create a new service with custom config
    pub fn with_config(config: OrderingConfig) -> Self {
        let analyzer = SchemaRelationshipAnalyzer::with_options(
            Arc::new(EnglishTokenMatcher::new()),
            AnalyzerOptions::from(&config),
        );
        Self {
            config,
            analyzer: Arc::new(analyzer),
            sorter: Arc::new(DependencyAwareSorter::new()),
            source: Arc::new(InMemoryOperationSource::new()),
        }
    }

    /// Replace the analysis and sorting strategies
    pub fn with_strategies(
        mut self,
        analyzer: Arc<dyn RelationshipAnalyzer>,
        sorter: Arc<dyn TopologicalSorter>,
    ) -> Self {
        self.analyzer = analyzer;
        self.sorter = sorter;
        self
    }

    /// Load specifications through `source`
    pub fn with_source(mut self, source: Arc<dyn OperationSource>) -> Self {
        self.source = source;
        self
    }

    pub fn config(&self) -> &OrderingConfig {
        &self.config
    }

    /// De-duplicate, restrict and bound the operation set.
    fn prepare(
        &self,
        operations: &[Operation],
        selection: Option<&[OperationId]>,
    ) -> Result<Vec<Operation>, OrderingError> {
        self.config.validate()?;

        if operations.is_empty() {
            return Err(OrderingError::EmptyOperationSet);
        }

        let mut seen = BTreeSet::new();
        let mut unique: Vec<Operation> = Vec::with_capacity(operations.len());
        for op in operations {
            if seen.insert(op.id) {
                unique.push(op.clone());
            } else {
                debug!(operation_id = %op.id, "Dropping duplicate operation");
            }
        }

        let selected = restrict(&unique, selection)?;
        if selected.is_empty() {
            return Err(OrderingError::EmptyOperationSet);
        }

        if selected.len() > self.config.max_operations {
            return Err(OrderingError::TooManyOperations {
                count: selected.len(),
                max: self.config.max_operations,
            });
        }

        Ok(selected)
    }

    /// Rules plus schema analysis merged into one graph.
    fn analyze(&self, operations: &[Operation]) -> Result<DependencyAnalysis, OrderingError> {
        let rules = apply_rules(operations);
        debug!(
            rule_edges = rules.edges.len(),
            auth_operations = rules.auth_related.len(),
            "Rule pass complete"
        );

        let schema_edges = self.analyzer.analyze(operations);
        debug!(schema_edges = schema_edges.len(), "Schema analysis complete");

        let mut graph = DependencyGraph::new();
        for op in operations {
            graph.add_node(op.clone());
        }
        let mut dropped = 0usize;
        for edge in rules.edges.into_iter().chain(schema_edges) {
            if !graph.add_edge(edge) {
                dropped += 1;
            }
        }
        if dropped > 0 {
            debug!(dropped, "Discarded self or dangling edges");
        }

        if graph.edge_count() > self.config.max_edge_count {
            return Err(OrderingError::TooManyEdges {
                count: graph.edge_count(),
                max: self.config.max_edge_count,
            });
        }
        if graph.edge_count() * 10 > self.config.max_edge_count * 9 {
            warn!(
                edge_count = graph.edge_count(),
                max = self.config.max_edge_count,
                "Edge count approaching limit"
            );
        }

        Ok(DependencyAnalysis {
            graph,
            auth_related: rules.auth_related,
        })
    }
}

impl Default for DependencyOrderingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DependencyOrderingApi for DependencyOrderingService {
    async fn order_specification(
        &self,
        specification: SpecificationId,
        selection: Option<&[OperationId]>,
    ) -> Result<OrderingOutcome, OrderingError> {
        let operations = self
            .source
            .load_operations(specification)
            .await
            .map_err(|e| {
                if !matches!(e, SourceError::NotFound(_)) {
                    warn!(%specification, error = %e, "Operation source failed");
                }
                OrderingError::from(e)
            })?;

        info!(
            %specification,
            operation_count = operations.len(),
            "Loaded specification operations"
        );

        self.order_operations(&operations, selection)
    }

    fn order_operations(
        &self,
        operations: &[Operation],
        selection: Option<&[OperationId]>,
    ) -> Result<OrderingOutcome, OrderingError> {
        let analysis = self.discover_dependencies(operations, selection)?;

        let results = self.sorter.sort(&analysis);
        let outcome = OrderingOutcome { results, analysis };

        info!(
            total_operations = outcome.results.len(),
            cycle_breaks = outcome.cycle_breaks(),
            "Operation ordering complete"
        );

        Ok(outcome)
    }

    fn discover_dependencies(
        &self,
        operations: &[Operation],
        selection: Option<&[OperationId]>,
    ) -> Result<DependencyAnalysis, OrderingError> {
        let operations = self.prepare(operations, selection)?;

        info!(
            operation_count = operations.len(),
            "Discovering operation dependencies"
        );

        let analysis = self.analyze(&operations)?;

        let rule_based = analysis
            .graph
            .edges()
            .filter(|e| e.kind == DependencyType::RuleBased)
            .count();
        info!(
            edge_count = analysis.graph.edge_count(),
            enforced_edges = analysis.graph.enforced_edge_count(),
            rule_based_edges = rule_based,
            "Dependency discovery complete"
        );

        Ok(analysis)
    }
}
