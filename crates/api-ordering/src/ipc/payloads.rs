//! IPC Payloads for API Operation Ordering
//!
//! Wire shapes use camelCase JSON. Identifiers travel as strings and are
//! parsed at the handler boundary, so a malformed id is a validation error
//! rather than a deserialization failure.

use crate::domain::entities::{DependencyEdge, Operation, SortedOperationResult};
use crate::domain::errors::OrderingError;
use crate::domain::value_objects::{DependencyType, HttpMethod, OperationId, ReasonCode};
use serde::{Deserialize, Serialize};

// ============================================================
// INCOMING REQUESTS
// ============================================================

/// One operation as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationPayload {
    /// Operation UUID
    pub id: String,
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub has_explicit_security: bool,
    #[serde(default)]
    pub parameter_schema_payloads: Vec<String>,
    #[serde(default)]
    pub response_schema_payloads: Vec<String>,
}

impl OperationPayload {
    /// Parse into a domain operation.
    pub fn to_operation(&self) -> Result<Operation, OrderingError> {
        let id = parse_operation_id(&self.id)?;
        if self.method.trim().is_empty() {
            return Err(OrderingError::malformed(&self.method, "empty HTTP method"));
        }

        Ok(Operation {
            id,
            method: HttpMethod::from(self.method.as_str()),
            path: self.path.clone(),
            operation_id: self.operation_id.clone(),
            summary: self.summary.clone(),
            description: self.description.clone(),
            has_explicit_security: self.has_explicit_security,
            parameter_schema_payloads: self.parameter_schema_payloads.clone(),
            response_schema_payloads: self.response_schema_payloads.clone(),
        })
    }
}

impl From<&Operation> for OperationPayload {
    fn from(op: &Operation) -> Self {
        Self {
            id: op.id.to_string(),
            method: op.method.to_string(),
            path: op.path.clone(),
            operation_id: op.operation_id.clone(),
            summary: op.summary.clone(),
            description: op.description.clone(),
            has_explicit_security: op.has_explicit_security,
            parameter_schema_payloads: op.parameter_schema_payloads.clone(),
            response_schema_payloads: op.response_schema_payloads.clone(),
        }
    }
}

/// Request to order inline operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderOperationsRequest {
    /// Correlation ID for response tracking
    pub correlation_id: String,
    pub operations: Vec<OperationPayload>,
    /// Restrict ordering to these operation ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_operation_ids: Option<Vec<String>>,
}

/// Request to order the operations of a loaded specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSpecificationRequest {
    /// Correlation ID for response tracking
    pub correlation_id: String,
    pub specification_id: String,
    /// Restrict ordering to these operation ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_operation_ids: Option<Vec<String>>,
}

// ============================================================
// OUTGOING RESPONSES
// ============================================================

/// One ordered operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortedOperationPayload {
    pub operation_id: String,
    pub order_index: usize,
    pub dependencies: Vec<String>,
    pub reason_codes: Vec<ReasonCode>,
    pub fan_out: usize,
    pub is_cycle_break: bool,
}

impl From<&SortedOperationResult> for SortedOperationPayload {
    fn from(result: &SortedOperationResult) -> Self {
        Self {
            operation_id: result.operation_id.to_string(),
            order_index: result.order_index,
            dependencies: result.dependencies.iter().map(|id| id.to_string()).collect(),
            reason_codes: result.reason_codes.clone(),
            fan_out: result.fan_out,
            is_cycle_break: result.is_cycle_break,
        }
    }
}

/// One merged dependency edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdgePayload {
    pub source_operation_id: String,
    pub target_operation_id: String,
    #[serde(rename = "type")]
    pub kind: DependencyType,
    pub reason: String,
    pub confidence: f64,
    pub enforced: bool,
}

impl From<&DependencyEdge> for DependencyEdgePayload {
    fn from(edge: &DependencyEdge) -> Self {
        Self {
            source_operation_id: edge.source.to_string(),
            target_operation_id: edge.target.to_string(),
            kind: edge.kind,
            reason: edge.reason.clone(),
            confidence: edge.confidence,
            enforced: edge.is_enforced(),
        }
    }
}

/// Error carried by an unsuccessful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// `validation`, `not_found` or `internal`
    pub kind: String,
    pub message: String,
}

impl From<&OrderingError> for ErrorPayload {
    fn from(err: &OrderingError) -> Self {
        Self {
            kind: err.kind().as_str().to_string(),
            message: err.to_string(),
        }
    }
}

/// Ordering metrics for observability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderingMetrics {
    /// Operations ordered
    pub total_operations: u32,
    /// Merged edges at or above the enforcement threshold
    pub enforced_edges: u32,
    /// Merged edges below the enforcement threshold
    pub advisory_edges: u32,
    pub rule_based_edges: u32,
    pub schema_edges: u32,
    pub cycle_breaks: u32,
    pub auth_operations: u32,
    /// Time taken for ordering (ms)
    pub ordering_time_ms: u64,
}

/// Response with ordered operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderOperationsResponse {
    /// Correlation ID from request
    pub correlation_id: String,
    /// Whether ordering succeeded
    pub success: bool,
    pub results: Vec<SortedOperationPayload>,
    pub edges: Vec<DependencyEdgePayload>,
    pub metrics: OrderingMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

impl OrderOperationsResponse {
    pub fn failure(correlation_id: impl Into<String>, err: &OrderingError) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            success: false,
            results: vec![],
            edges: vec![],
            metrics: OrderingMetrics::default(),
            error: Some(ErrorPayload::from(err)),
        }
    }
}

/// Response with discovered edges and auth flags, unsorted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyAnalysisResponse {
    pub correlation_id: String,
    pub success: bool,
    pub edges: Vec<DependencyEdgePayload>,
    pub auth_operation_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

impl DependencyAnalysisResponse {
    pub fn failure(correlation_id: impl Into<String>, err: &OrderingError) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            success: false,
            edges: vec![],
            auth_operation_ids: vec![],
            error: Some(ErrorPayload::from(err)),
        }
    }
}

/// Parse a caller-supplied operation id.
pub fn parse_operation_id(value: &str) -> Result<OperationId, OrderingError> {
    value
        .parse::<OperationId>()
        .map_err(|e| OrderingError::malformed(value, e))
}
