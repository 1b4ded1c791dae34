//! Outbound Ports (Driven Ports / SPI)
//!
//! Strategy seams for the ordering pipeline plus the collaborator that
//! supplies operations for a specification.

use crate::domain::entities::{
    DependencyAnalysis, DependencyEdge, Operation, SortedOperationResult, TokenMatchResult,
};
use crate::domain::errors::SourceError;
use crate::domain::value_objects::SpecificationId;
use async_trait::async_trait;
use std::cmp::Ordering;

/// Similarity scoring between two short identifier tokens.
pub trait TokenMatcher: Send + Sync {
    /// Score `source` against `target`, or `None` when no rule qualifies.
    fn match_tokens(&self, source: &str, target: &str) -> Option<TokenMatchResult>;

    /// All pairs of the cross product scoring at least `min_score`.
    ///
    /// Sorted by score descending, then source and target ascending.
    fn find_matches(
        &self,
        sources: &[String],
        targets: &[String],
        min_score: f64,
    ) -> Vec<TokenMatchResult> {
        let mut matches: Vec<TokenMatchResult> = sources
            .iter()
            .flat_map(|source| targets.iter().map(move |target| (source, target)))
            .filter_map(|(source, target)| self.match_tokens(source, target))
            .filter(|m| m.score >= min_score)
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.source_token.cmp(&b.source_token))
                .then_with(|| a.matched_token.cmp(&b.matched_token))
        });
        matches
    }
}

/// Discovers schema-derived dependencies between operations.
pub trait RelationshipAnalyzer: Send + Sync {
    fn analyze(&self, operations: &[Operation]) -> Vec<DependencyEdge>;
}

/// Produces the final execution order from merged edges and auth flags.
pub trait TopologicalSorter: Send + Sync {
    fn sort(&self, analysis: &DependencyAnalysis) -> Vec<SortedOperationResult>;
}

/// Supplies the operations of a loaded specification.
#[async_trait]
pub trait OperationSource: Send + Sync {
    async fn load_operations(
        &self,
        specification: SpecificationId,
    ) -> Result<Vec<Operation>, SourceError>;
}
