//! # API Operation Dependency Ordering
//!
//! Orders the operations of an HTTP API so that every operation runs after
//! the operations it depends on. Dependencies come from direct rules (a
//! `GET /users/{id}` needs the `POST /users` that creates the resource)
//! and from schema `$ref` relationships; the final order is a
//! deterministic, cycle-tolerant variant of Kahn's algorithm.
//!
//! ## Architecture
//!
//! - **Domain**: Core entities (Operation, DependencyEdge, DependencyGraph, SortedOperationResult)
//! - **Algorithms**: Token matcher, schema graph and closure, relationship analyzer, rule engine, dependency-aware sort
//! - **Ports**: Inbound (DependencyOrderingApi) and Outbound (TokenMatcher, RelationshipAnalyzer, TopologicalSorter, OperationSource)
//! - **Application**: Service orchestration
//! - **IPC**: Request/response payloads and handler
//! - **Adapters**: In-memory operation source

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ipc;
pub mod ports;

pub use adapters::InMemoryOperationSource;
pub use application::service::DependencyOrderingService;
pub use config::OrderingConfig;
pub use domain::entities::*;
pub use domain::errors::{ErrorKind, OrderingError, SourceError};
pub use domain::value_objects::*;
pub use ipc::{
    DependencyAnalysisResponse, OperationPayload, OrderOperationsRequest,
    OrderOperationsResponse, OrderSpecificationRequest, OrderingHandler,
};
pub use ports::inbound::DependencyOrderingApi;
pub use ports::outbound::{OperationSource, RelationshipAnalyzer, TokenMatcher, TopologicalSorter};
