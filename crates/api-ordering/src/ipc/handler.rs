//! IPC Handler for API Operation Ordering
//!
//! ## Boundaries
//!
//! - MUST reject malformed operation and specification ids
//! - MUST enforce operation and edge count limits (via the service)
//! - MUST answer every request; failures become `success = false`

use crate::application::service::DependencyOrderingService;
use crate::config::OrderingConfig;
use crate::domain::entities::{DependencyAnalysis, Operation, OrderingOutcome};
use crate::domain::errors::{ErrorKind, OrderingError};
use crate::domain::value_objects::{DependencyType, OperationId, SpecificationId};
use crate::ipc::payloads::{
    parse_operation_id, DependencyAnalysisResponse, DependencyEdgePayload,
    OrderOperationsRequest, OrderOperationsResponse, OrderSpecificationRequest, OrderingMetrics,
    SortedOperationPayload,
};
use crate::ports::inbound::DependencyOrderingApi;
use std::time::Instant;
use tracing::{error, info, warn};

/// IPC Handler for API operation ordering.
///
/// Converts payloads and delegates to the domain service.
pub struct OrderingHandler {
    service: DependencyOrderingService,
}

impl OrderingHandler {
    /// Create a new handler with default config.
    pub fn new() -> Self {
        Self::with_service(DependencyOrderingService::new())
    }

    /// Create a new handler with custom config.
    pub fn with_config(config: OrderingConfig) -> Self {
        Self::with_service(DependencyOrderingService::with_config(config))
    }

    pub fn with_service(service: DependencyOrderingService) -> Self {
        Self { service }
    }

    /// Handle an OrderOperationsRequest.
    pub fn handle_order_operations(&self, request: OrderOperationsRequest) -> OrderOperationsResponse {
        let start_time = Instant::now();

        info!(
            correlation_id = %request.correlation_id,
            operation_count = request.operations.len(),
            "Processing OrderOperationsRequest"
        );

        let result = convert_operations(&request)
            .and_then(|(operations, selection)| {
                self.service
                    .order_operations(&operations, selection.as_deref())
            });

        self.respond(request.correlation_id, start_time, result)
    }

    /// Handle an OrderSpecificationRequest.
    pub async fn handle_order_specification(
        &self,
        request: OrderSpecificationRequest,
    ) -> OrderOperationsResponse {
        let start_time = Instant::now();

        info!(
            correlation_id = %request.correlation_id,
            specification_id = %request.specification_id,
            "Processing OrderSpecificationRequest"
        );

        let parsed = request
            .specification_id
            .parse::<SpecificationId>()
            .map_err(|e| OrderingError::malformed(&request.specification_id, e))
            .and_then(|spec| {
                parse_selection(request.selected_operation_ids.as_deref()).map(|sel| (spec, sel))
            });

        let result = match parsed {
            Ok((spec, selection)) => {
                self.service
                    .order_specification(spec, selection.as_deref())
                    .await
            }
            Err(e) => Err(e),
        };

        self.respond(request.correlation_id, start_time, result)
    }

    /// Handle a discovery-only request: edges and auth flags, no ordering.
    pub fn handle_discover_dependencies(
        &self,
        request: OrderOperationsRequest,
    ) -> DependencyAnalysisResponse {
        let result = convert_operations(&request).and_then(|(operations, selection)| {
            self.service
                .discover_dependencies(&operations, selection.as_deref())
        });

        match result {
            Ok(analysis) => DependencyAnalysisResponse {
                correlation_id: request.correlation_id,
                success: true,
                edges: edge_payloads(&analysis),
                auth_operation_ids: analysis
                    .auth_related
                    .iter()
                    .map(|id| id.to_string())
                    .collect(),
                error: None,
            },
            Err(e) => {
                log_failure(&request.correlation_id, &e);
                DependencyAnalysisResponse::failure(request.correlation_id, &e)
            }
        }
    }

    fn respond(
        &self,
        correlation_id: String,
        start_time: Instant,
        result: Result<OrderingOutcome, OrderingError>,
    ) -> OrderOperationsResponse {
        match result {
            Ok(outcome) => {
                let mut metrics = metrics_for(&outcome);
                metrics.ordering_time_ms = start_time.elapsed().as_millis() as u64;

                info!(
                    %correlation_id,
                    total_operations = metrics.total_operations,
                    enforced_edges = metrics.enforced_edges,
                    cycle_breaks = metrics.cycle_breaks,
                    ordering_time_ms = metrics.ordering_time_ms,
                    "Ordered operations"
                );

                OrderOperationsResponse {
                    correlation_id,
                    success: true,
                    results: outcome
                        .results
                        .iter()
                        .map(SortedOperationPayload::from)
                        .collect(),
                    edges: edge_payloads(&outcome.analysis),
                    metrics,
                    error: None,
                }
            }
            Err(e) => {
                log_failure(&correlation_id, &e);
                OrderOperationsResponse::failure(correlation_id, &e)
            }
        }
    }
}

impl Default for OrderingHandler {
    fn default() -> Self {
        Self::new()
    }
}

type Converted = (Vec<Operation>, Option<Vec<OperationId>>);

fn convert_operations(request: &OrderOperationsRequest) -> Result<Converted, OrderingError> {
    let operations = request
        .operations
        .iter()
        .map(|payload| payload.to_operation())
        .collect::<Result<Vec<_>, _>>()?;
    let selection = parse_selection(request.selected_operation_ids.as_deref())?;
    Ok((operations, selection))
}

fn parse_selection(ids: Option<&[String]>) -> Result<Option<Vec<OperationId>>, OrderingError> {
    ids.map(|ids| {
        ids.iter()
            .map(|id| parse_operation_id(id))
            .collect::<Result<Vec<_>, _>>()
    })
    .transpose()
}

fn edge_payloads(analysis: &DependencyAnalysis) -> Vec<DependencyEdgePayload> {
    analysis
        .graph
        .edges()
        .map(DependencyEdgePayload::from)
        .collect()
}

fn metrics_for(outcome: &OrderingOutcome) -> OrderingMetrics {
    let mut metrics = OrderingMetrics {
        total_operations: outcome.results.len() as u32,
        cycle_breaks: outcome.cycle_breaks() as u32,
        auth_operations: outcome.analysis.auth_related.len() as u32,
        ..Default::default()
    };

    for edge in outcome.analysis.graph.edges() {
        if edge.is_enforced() {
            metrics.enforced_edges += 1;
        } else {
            metrics.advisory_edges += 1;
        }
        match edge.kind {
            DependencyType::RuleBased => metrics.rule_based_edges += 1,
            DependencyType::SchemaSchema => metrics.schema_edges += 1,
        }
    }
    metrics
}

fn log_failure(correlation_id: &str, err: &OrderingError) {
    match err.kind() {
        ErrorKind::Validation | ErrorKind::NotFound => {
            warn!(correlation_id, error = %err, "Ordering request rejected")
        }
        ErrorKind::Internal => error!(correlation_id, error = %err, "Ordering failed"),
    }
}
