//! Inbound Ports (Driving Ports / API)

use crate::domain::entities::{DependencyAnalysis, Operation, OrderingOutcome};
use crate::domain::errors::OrderingError;
use crate::domain::value_objects::{OperationId, SpecificationId};
use async_trait::async_trait;

/// Primary dependency ordering API
#[async_trait]
pub trait DependencyOrderingApi: Send + Sync {
    /// Load a specification's operations and order them.
    ///
    /// This is the main entry point. It:
    /// 1. Loads operations from the operation source
    /// 2. Restricts them to `selection`, if given
    /// 3. Discovers rule-based and schema dependencies
    /// 4. Returns the deterministic ordering
    async fn order_specification(
        &self,
        specification: SpecificationId,
        selection: Option<&[OperationId]>,
    ) -> Result<OrderingOutcome, OrderingError>;

    /// Order caller-supplied operations.
    fn order_operations(
        &self,
        operations: &[Operation],
        selection: Option<&[OperationId]>,
    ) -> Result<OrderingOutcome, OrderingError>;

    /// Discover the merged edge set and auth flags without sorting.
    fn discover_dependencies(
        &self,
        operations: &[Operation],
        selection: Option<&[OperationId]>,
    ) -> Result<DependencyAnalysis, OrderingError>;
}
