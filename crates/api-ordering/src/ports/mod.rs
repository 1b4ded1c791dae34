//! Ports module for API operation ordering
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::DependencyOrderingApi;
pub use outbound::{OperationSource, RelationshipAnalyzer, TokenMatcher, TopologicalSorter};
