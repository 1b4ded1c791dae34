//! Algorithms module for API operation ordering
//!
//! Contains:
//! - Token matcher (singularization, abbreviations, stems)
//! - Schema reference graph builder
//! - Transitive closure over schema names
//! - Schema relationship analyzer
//! - Rule engine (path-parameter rule, auth detection)
//! - Dependency-aware Kahn's sort

pub mod kahns;
pub mod relationship_analyzer;
pub mod rule_engine;
pub mod schema_graph;
pub mod token_matcher;
pub mod transitive_closure;

pub use kahns::{dependency_aware_sort, DependencyAwareSorter};
pub use relationship_analyzer::{
    extract_schema_base_name, AnalyzerOptions, SchemaRelationshipAnalyzer,
};
pub use rule_engine::{apply_rules, is_auth_related, restrict, RuleAnalysis};
pub use schema_graph::{build_schema_graph, extract_schema_refs, SchemaGraph};
pub use token_matcher::{singularize, EnglishTokenMatcher};
pub use transitive_closure::{compute_closure, SchemaClosure};
