//! IPC Module for API Operation Ordering
//!
//! ## Boundaries
//!
//! - Accept: OrderOperationsRequest (inline operations) and
//!   OrderSpecificationRequest (operations loaded by specification id)
//! - Send: OrderOperationsResponse with ordered results, merged edges and metrics

pub mod handler;
pub mod payloads;

pub use handler::OrderingHandler;
pub use payloads::*;
