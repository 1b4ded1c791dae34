//! In-Memory Operation Source Adapter
//!
//! Implements `OperationSource` over specifications registered up front.

use crate::domain::entities::Operation;
use crate::domain::errors::SourceError;
use crate::domain::value_objects::SpecificationId;
use crate::ports::outbound::OperationSource;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// Operation source backed by a map of specification id to operations.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOperationSource {
    specifications: HashMap<SpecificationId, Vec<Operation>>,
}

impl InMemoryOperationSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the operations of a specification.
    pub fn with_specification(
        mut self,
        specification: SpecificationId,
        operations: Vec<Operation>,
    ) -> Self {
        self.insert(specification, operations);
        self
    }

    pub fn insert(&mut self, specification: SpecificationId, operations: Vec<Operation>) {
        self.specifications.insert(specification, operations);
    }

    pub fn len(&self) -> usize {
        self.specifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specifications.is_empty()
    }
}

#[async_trait]
impl OperationSource for InMemoryOperationSource {
    async fn load_operations(
        &self,
        specification: SpecificationId,
    ) -> Result<Vec<Operation>, SourceError> {
        let operations = self
            .specifications
            .get(&specification)
            .cloned()
            .ok_or(SourceError::NotFound(specification))?;

        debug!(
            %specification,
            operation_count = operations.len(),
            "Loaded operations from memory"
        );
        Ok(operations)
    }
}
