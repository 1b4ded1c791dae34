//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits.

mod operation_source;

pub use operation_source::InMemoryOperationSource;
