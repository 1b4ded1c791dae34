//! Error types for API operation ordering

use super::value_objects::{OperationId, SpecificationId};
use thiserror::Error;

/// Broad classification of an [`OrderingError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller input is unusable; never retried
    Validation,
    /// A referenced specification or operation does not exist
    NotFound,
    /// Collaborator failure
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
        }
    }
}

/// All errors that can occur while ordering operations
#[derive(Debug, Error)]
pub enum OrderingError {
    /// No operations to order
    #[error("Empty operation set")]
    EmptyOperationSet,

    /// Selected ids not present in the loaded operations
    #[error("Unknown operation ids: {}", join_ids(.missing))]
    UnknownOperations { missing: Vec<OperationId> },

    /// Identifier could not be parsed
    #[error("Malformed identifier {value:?}: {reason}")]
    MalformedIdentifier { value: String, reason: String },

    /// Specification id not known to the operation source
    #[error("Specification not found: {0}")]
    SpecificationNotFound(SpecificationId),

    /// Operation count exceeded limits
    #[error("Operation count exceeded: {count} > {max}")]
    TooManyOperations { count: usize, max: usize },

    /// Edge count exceeded limits
    #[error("Edge count exceeded: {count} > {max}")]
    TooManyEdges { count: usize, max: usize },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation source failed
    #[error("Operation source failed: {0}")]
    Source(String),
}

impl OrderingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderingError::EmptyOperationSet
            | OrderingError::UnknownOperations { .. }
            | OrderingError::MalformedIdentifier { .. }
            | OrderingError::TooManyOperations { .. }
            | OrderingError::TooManyEdges { .. }
            | OrderingError::InvalidConfig(_) => ErrorKind::Validation,
            OrderingError::SpecificationNotFound(_) => ErrorKind::NotFound,
            OrderingError::Source(_) => ErrorKind::Internal,
        }
    }

    pub fn malformed(value: impl Into<String>, reason: impl ToString) -> Self {
        OrderingError::MalformedIdentifier {
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}

fn join_ids(ids: &[OperationId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised by an operation source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Specification not found: {0}")]
    NotFound(SpecificationId),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

impl From<SourceError> for OrderingError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(id) => OrderingError::SpecificationNotFound(id),
            SourceError::Unavailable(msg) => OrderingError::Source(msg),
        }
    }
}
