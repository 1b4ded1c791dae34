//! # End-to-End Ordering Flows
//!
//! Drives the public API from operation descriptors to the final ordering:
//!
//! 1. **Rule flow**: path-parameter operations follow their producing POST
//! 2. **Schema flow**: `$ref` consumers follow producers
//! 3. **Cycle flow**: mutual dependencies terminate with one cycle break
//! 4. **Boundary flow**: selection, not-found and JSON handler round trips

use api_ordering::domain::invariants::{
    has_cycle, invariant_completeness, invariant_contiguous_indices, invariant_dependency_order,
};
use api_ordering::{
    DependencyEdge, DependencyOrderingApi, DependencyOrderingService, DependencyType, ErrorKind,
    HttpMethod, InMemoryOperationSource, Operation, OperationId, OrderOperationsRequest,
    OrderOperationsResponse, OrderingError, OrderingHandler, ReasonCode, SpecificationId,
};
use std::sync::Arc;

// =============================================================================
// TEST FIXTURES
// =============================================================================

fn make_id(val: u128) -> OperationId {
    OperationId::from_u128(val)
}

fn make_op(val: u128, method: HttpMethod, path: &str) -> Operation {
    Operation::new(make_id(val), method, path)
}

fn schema_refs(names: &[&str]) -> String {
    let refs: Vec<String> = names
        .iter()
        .map(|n| format!(r##"{{"$ref":"#/components/schemas/{}"}}"##, n))
        .collect();
    format!(r#"{{"allOf":[{}]}}"#, refs.join(","))
}

/// Login, pet CRUD and orders referencing pets.
fn pet_store() -> Vec<Operation> {
    vec![
        make_op(5, HttpMethod::Get, "/orders/{orderId}")
            .with_response_schema(schema_refs(&["Order"])),
        make_op(4, HttpMethod::Post, "/orders")
            .with_parameter_schema(schema_refs(&["PlaceOrderRequest", "Pet"]))
            .with_response_schema(schema_refs(&["Order"])),
        make_op(3, HttpMethod::Get, "/pets/{petId}").with_response_schema(schema_refs(&["Pet"])),
        make_op(2, HttpMethod::Post, "/pets")
            .with_parameter_schema(schema_refs(&["PetDraft"]))
            .with_response_schema(schema_refs(&["Pet"])),
        make_op(1, HttpMethod::Post, "/auth/login").with_operation_id("login"),
    ]
}

fn position(order: &[OperationId], val: u128) -> usize {
    order
        .iter()
        .position(|id| *id == make_id(val))
        .expect("operation present in ordering")
}

// =============================================================================
// RULE FLOW
// =============================================================================

#[test]
fn test_post_then_get_by_id() {
    let service = DependencyOrderingService::new();
    let ops = vec![
        make_op(1, HttpMethod::Post, "/users"),
        make_op(2, HttpMethod::Get, "/users/{id}"),
    ];

    let outcome = service.order_operations(&ops, None).unwrap();

    let edges: Vec<&DependencyEdge> = outcome.analysis.graph.edges().collect();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].kind, DependencyType::RuleBased);
    assert_eq!((edges[0].source, edges[0].target), (make_id(2), make_id(1)));
    assert_eq!(edges[0].confidence, 1.0);

    let post = &outcome.results[0];
    assert_eq!(post.operation_id, make_id(1));
    assert_eq!(post.order_index, 1);
    assert_eq!(post.fan_out, 1);
    assert!(post.reason_codes.contains(&ReasonCode::ProducerFirst));
    assert!(!post.reason_codes.contains(&ReasonCode::HighFanOut));
    assert_eq!(post.reason_codes.last(), Some(&ReasonCode::DeterministicTieBreak));

    let get = &outcome.results[1];
    assert_eq!(get.operation_id, make_id(2));
    assert_eq!(get.order_index, 2);
    assert!(get.reason_codes.contains(&ReasonCode::DependencyFirst));
    assert!(get.reason_codes.contains(&ReasonCode::DeterministicTieBreak));
}

// =============================================================================
// SCHEMA FLOW
// =============================================================================

#[test]
fn test_pet_store_ordering() {
    let service = DependencyOrderingService::new();
    let ops = pet_store();

    let outcome = service.order_operations(&ops, None).unwrap();
    let order = outcome.flatten();

    assert_eq!(outcome.results[0].operation_id, make_id(1));
    assert!(outcome.results[0].reason_codes.contains(&ReasonCode::AuthFirst));
    assert!(position(&order, 2) < position(&order, 3));
    assert!(position(&order, 3) < position(&order, 4));
    assert!(position(&order, 4) < position(&order, 5));

    let graph = &outcome.analysis.graph;
    assert!(graph.has_edge(&make_id(4), &make_id(2)));
    assert!(graph.has_edge(&make_id(4), &make_id(3)));
    assert!(!has_cycle(graph));
    assert_eq!(outcome.cycle_breaks(), 0);

    assert!(invariant_completeness(&outcome.results, graph));
    assert!(invariant_contiguous_indices(&outcome.results));
    assert!(invariant_dependency_order(&outcome.results, graph));
}

#[test]
fn test_ordering_is_independent_of_input_order() {
    let service = DependencyOrderingService::new();
    let ops = pet_store();
    let mut reversed = ops.clone();
    reversed.reverse();

    let first = service.order_operations(&ops, None).unwrap();
    let second = service.order_operations(&reversed, None).unwrap();

    assert_eq!(first.results, second.results);
}

#[test]
fn test_discover_dependencies_without_sorting() {
    let service = DependencyOrderingService::new();

    let analysis = service.discover_dependencies(&pet_store(), None).unwrap();

    assert_eq!(analysis.graph.node_count(), 5);
    assert!(analysis.auth_related.contains(&make_id(1)));
    assert_eq!(analysis.auth_related.len(), 1);
    let schema_edges = analysis
        .graph
        .edges()
        .filter(|e| e.kind == DependencyType::SchemaSchema)
        .count();
    assert_eq!(schema_edges, 2);
}

// =============================================================================
// CYCLE FLOW
// =============================================================================

#[test]
fn test_mutual_schema_dependency_breaks_once() {
    let service = DependencyOrderingService::new();
    let ops = vec![
        make_op(1, HttpMethod::Put, "/a")
            .with_parameter_schema(schema_refs(&["Beta"]))
            .with_response_schema(schema_refs(&["Alpha"])),
        make_op(2, HttpMethod::Put, "/b")
            .with_parameter_schema(schema_refs(&["Alpha"]))
            .with_response_schema(schema_refs(&["Beta"])),
    ];

    let outcome = service.order_operations(&ops, None).unwrap();

    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.cycle_breaks(), 1);
    assert!(outcome.results[0].is_cycle_break);
    assert!(outcome.results[0]
        .reason_codes
        .contains(&ReasonCode::CycleBreakFallback));
    assert!(invariant_contiguous_indices(&outcome.results));
}

// =============================================================================
// BOUNDARY FLOW
// =============================================================================

#[test]
fn test_selection_restricts_ordering() {
    let service = DependencyOrderingService::new();
    let selection = [make_id(2), make_id(3)];

    let outcome = service
        .order_operations(&pet_store(), Some(&selection))
        .unwrap();

    assert_eq!(outcome.flatten(), vec![make_id(2), make_id(3)]);
}

#[test]
fn test_unknown_selection_is_validation_error() {
    let service = DependencyOrderingService::new();

    let err = service
        .order_operations(&pet_store(), Some(&[make_id(99)]))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains(&make_id(99).to_string()));
}

#[tokio::test]
async fn test_specification_lookup() {
    let spec = SpecificationId::from_u128(1);
    let source = InMemoryOperationSource::new().with_specification(spec, pet_store());
    let service = DependencyOrderingService::new().with_source(Arc::new(source));

    let outcome = service.order_specification(spec, None).await.unwrap();
    assert_eq!(outcome.results.len(), 5);

    let missing = service
        .order_specification(SpecificationId::from_u128(2), None)
        .await;
    assert!(matches!(
        missing,
        Err(OrderingError::SpecificationNotFound(_))
    ));
}

#[test]
fn test_handler_json_round_trip() {
    let request_json = r#"{
        "correlationId": "req-7",
        "operations": [
            {"id": "00000000-0000-0000-0000-000000000002", "method": "get", "path": "/users/{id}"},
            {"id": "00000000-0000-0000-0000-000000000001", "method": "POST", "path": "/users"}
        ]
    }"#;
    let request: OrderOperationsRequest = serde_json::from_str(request_json).unwrap();

    let response = OrderingHandler::new().handle_order_operations(request);
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["correlationId"], "req-7");
    assert_eq!(json["success"], true);
    assert_eq!(
        json["results"][0]["operationId"],
        "00000000-0000-0000-0000-000000000001"
    );
    assert_eq!(json["results"][1]["orderIndex"], 2);
    assert_eq!(json["results"][1]["reasonCodes"][0], "DEPENDENCY_FIRST");
    assert_eq!(json["edges"][0]["type"], "RuleBased");
    assert_eq!(json["metrics"]["ruleBasedEdges"], 1);

    let decoded: OrderOperationsResponse = serde_json::from_value(json).unwrap();
    assert_eq!(decoded.results.len(), 2);
}
