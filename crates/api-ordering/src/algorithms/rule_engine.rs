//! Rule Engine
//!
//! Direct, high-confidence heuristics over the raw operation list:
//!
//! 1. Path-parameter rule: `GET /users/{id}` depends on the POST that
//!    creates into `/users`.
//! 2. Auth detection: unsecured operations whose path, operationId or
//!    summary mention a login/token endpoint.

use super::kahns::compare_paths;
use crate::domain::entities::{DependencyEdge, Operation};
use crate::domain::errors::OrderingError;
use crate::domain::value_objects::{
    DependencyType, HttpMethod, OperationId, RULE_BASED_CONFIDENCE,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Keywords marking an authentication endpoint.
pub const AUTH_KEYWORDS: &[&str] = &[
    "/auth", "/token", "/login", "/signin", "/oauth", "/refresh", "/logout",
];

/// Output of the rule pass.
#[derive(Debug, Clone, Default)]
pub struct RuleAnalysis {
    pub edges: Vec<DependencyEdge>,
    pub auth_related: BTreeSet<OperationId>,
}

/// Whether `op` looks like an authentication endpoint.
///
/// Operations with their own security requirement never qualify.
pub fn is_auth_related(op: &Operation) -> bool {
    if op.has_explicit_security {
        return false;
    }
    let haystack = format!(
        "{}{}{}",
        op.path,
        op.operation_id.as_deref().unwrap_or(""),
        op.summary.as_deref().unwrap_or("")
    )
    .to_lowercase();

    AUTH_KEYWORDS.iter().any(|keyword| haystack.contains(keyword))
}

/// Path up to the last `{param}` segment, lower-cased, without trailing `/`.
///
/// Returns `None` for paths without a parameter.
pub fn collection_path(path: &str) -> Option<String> {
    let brace = path.rfind('{')?;
    Some(normalize_collection(&path[..brace]))
}

fn normalize_collection(path: &str) -> String {
    path.trim_end_matches('/').to_lowercase()
}

/// Apply the path-parameter rule and auth detection.
pub fn apply_rules(operations: &[Operation]) -> RuleAnalysis {
    let mut producers: BTreeMap<String, Vec<&Operation>> = BTreeMap::new();
    for op in operations.iter().filter(|op| op.method == HttpMethod::Post) {
        producers
            .entry(normalize_collection(&op.path))
            .or_default()
            .push(op);
    }
    for candidates in producers.values_mut() {
        candidates.sort_by(|a, b| compare_paths(&a.path, &b.path).then_with(|| a.id.cmp(&b.id)));
    }

    let mut analysis = RuleAnalysis::default();

    for op in operations {
        if is_auth_related(op) {
            analysis.auth_related.insert(op.id);
        }

        if op.method == HttpMethod::Post {
            continue;
        }
        let Some(collection) = collection_path(&op.path) else {
            continue;
        };
        let Some(producer) = producers.get(&collection).and_then(|c| c.first()) else {
            continue;
        };
        if producer.id == op.id {
            continue;
        }

        debug!(
            dependent = %op.label(),
            producer = %producer.label(),
            "Path-parameter rule matched"
        );
        analysis.edges.push(DependencyEdge::new(
            op.id,
            producer.id,
            DependencyType::RuleBased,
            format!(
                "{} requires a resource created by {}",
                op.label(),
                producer.label()
            ),
            RULE_BASED_CONFIDENCE,
        ));
    }

    analysis
}

/// Restrict `operations` to `selection`, keeping input order.
///
/// Every selected id must be present; the missing ones are reported
/// sorted and de-duplicated.
pub fn restrict(
    operations: &[Operation],
    selection: Option<&[OperationId]>,
) -> Result<Vec<Operation>, OrderingError> {
    let Some(selection) = selection else {
        return Ok(operations.to_vec());
    };

    let known: BTreeSet<OperationId> = operations.iter().map(|op| op.id).collect();
    let wanted: BTreeSet<OperationId> = selection.iter().copied().collect();

    let missing: Vec<OperationId> = wanted.difference(&known).copied().collect();
    if !missing.is_empty() {
        return Err(OrderingError::UnknownOperations { missing });
    }

    Ok(operations
        .iter()
        .filter(|op| wanted.contains(&op.id))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_id(val: u128) -> OperationId {
        OperationId::from_u128(val)
    }

    fn make_op(val: u128, method: HttpMethod, path: &str) -> Operation {
        Operation::new(make_id(val), method, path)
    }

    #[test]
    fn test_collection_path() {
        assert_eq!(collection_path("/users/{id}").as_deref(), Some("/users"));
        assert_eq!(collection_path("/Users/{id}/").as_deref(), Some("/users"));
        assert_eq!(
            collection_path("/users/{userId}/posts/{postId}").as_deref(),
            Some("/users/{userid}/posts")
        );
        assert_eq!(collection_path("/users"), None);
    }

    #[test]
    fn test_get_by_id_depends_on_post() {
        let ops = vec![
            make_op(1, HttpMethod::Post, "/users"),
            make_op(2, HttpMethod::Get, "/users/{id}"),
        ];

        let analysis = apply_rules(&ops);

        assert_eq!(analysis.edges.len(), 1);
        let edge = &analysis.edges[0];
        assert_eq!(edge.source, make_id(2));
        assert_eq!(edge.target, make_id(1));
        assert_eq!(edge.kind, DependencyType::RuleBased);
        assert_eq!(edge.confidence, 1.0);
        assert!(edge.reason.contains("POST /users"));
        assert!(analysis.auth_related.is_empty());
    }

    #[test]
    fn test_collection_match_ignores_case_and_trailing_slash() {
        let ops = vec![
            make_op(1, HttpMethod::Post, "/Orders/"),
            make_op(2, HttpMethod::Delete, "/orders/{orderId}"),
        ];

        let analysis = apply_rules(&ops);

        assert_eq!(analysis.edges.len(), 1);
        assert_eq!(analysis.edges[0].target, make_id(1));
    }

    #[test]
    fn test_first_producer_by_path_wins() {
        let ops = vec![
            make_op(1, HttpMethod::Post, "/users/"),
            make_op(2, HttpMethod::Post, "/Users"),
            make_op(3, HttpMethod::Get, "/users/{id}"),
        ];

        let analysis = apply_rules(&ops);

        assert_eq!(analysis.edges.len(), 1);
        assert_eq!(analysis.edges[0].target, make_id(2));
    }

    #[test]
    fn test_post_and_plain_paths_get_no_edge() {
        let ops = vec![
            make_op(1, HttpMethod::Post, "/users"),
            make_op(2, HttpMethod::Post, "/users/{id}/activate"),
            make_op(3, HttpMethod::Get, "/users"),
            make_op(4, HttpMethod::Get, "/orders/{id}"),
        ];

        let analysis = apply_rules(&ops);

        assert!(analysis.edges.is_empty());
    }

    #[test]
    fn test_auth_detection() {
        let login = make_op(1, HttpMethod::Post, "/session").with_operation_id("/login");
        let token = make_op(2, HttpMethod::Post, "/OAuth/Token");
        let secured = make_op(3, HttpMethod::Post, "/auth/login").with_explicit_security(true);
        let summary = make_op(4, HttpMethod::Get, "/me").with_summary("Call /refresh first");
        let plain = make_op(5, HttpMethod::Get, "/authors");

        assert!(is_auth_related(&login));
        assert!(is_auth_related(&token));
        assert!(!is_auth_related(&secured));
        assert!(is_auth_related(&summary));
        // "/authors" contains "/auth"
        assert!(is_auth_related(&plain));
        assert!(!is_auth_related(&make_op(6, HttpMethod::Get, "/users")));
    }

    #[test]
    fn test_restrict_selection() {
        let ops = vec![
            make_op(1, HttpMethod::Post, "/users"),
            make_op(2, HttpMethod::Get, "/users/{id}"),
            make_op(3, HttpMethod::Get, "/health"),
        ];

        let all = restrict(&ops, None).unwrap();
        assert_eq!(all.len(), 3);

        let selected = restrict(&ops, Some(&[make_id(3), make_id(1)])).unwrap();
        let ids: Vec<_> = selected.iter().map(|op| op.id).collect();
        assert_eq!(ids, vec![make_id(1), make_id(3)]);
    }

    #[test]
    fn test_restrict_reports_missing_ids() {
        let ops = vec![make_op(1, HttpMethod::Post, "/users")];

        let result = restrict(&ops, Some(&[make_id(9), make_id(1), make_id(8), make_id(9)]));

        match result {
            Err(OrderingError::UnknownOperations { missing }) => {
                assert_eq!(missing, vec![make_id(8), make_id(9)]);
            }
            other => panic!("expected UnknownOperations, got {:?}", other),
        }
    }
}
