//! Application layer for API operation ordering

pub mod service;

pub use service::DependencyOrderingService;
