//! Value objects for API operation ordering
//!
//! Identifiers, HTTP methods, schema names, edge/match kinds, reason codes
//! and the fixed confidence constants.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use uuid::Uuid;

/// Confidence of a path-parameter ↔ producing-POST edge.
pub const RULE_BASED_CONFIDENCE: f64 = 1.0;
/// Confidence of an edge found by following the schema closure.
pub const TRANSITIVE_SCHEMA_CONFIDENCE: f64 = 0.85;
/// Confidence of an edge found by schema base-name matching.
pub const FUZZY_NAME_CONFIDENCE: f64 = 0.65;
/// Edges at or above this confidence constrain the ordering.
pub const ENFORCEMENT_THRESHOLD: f64 = 0.5;

/// Token match scores, highest priority first.
pub const EXACT_MATCH_SCORE: f64 = 1.0;
pub const PLURAL_SINGULAR_SCORE: f64 = 0.95;
pub const ABBREVIATION_SCORE: f64 = 0.85;
pub const STEM_SCORE: f64 = 0.80;
pub const SUBSTRING_SCORE: f64 = 0.70;

/// Default minimum score for `find_matches`.
pub const DEFAULT_MIN_MATCH_SCORE: f64 = 0.65;

// ============================================================
// IDENTIFIERS
// ============================================================

/// Opaque operation identifier.
///
/// Ordering is defined over the canonical (lower-case, hyphenated) string
/// form so that every tiebreak is reproducible outside this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(Uuid);

impl OperationId {
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic identifier, handy for fixtures.
    pub fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Ord for OperationId {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut left_buf = Uuid::encode_buffer();
        let mut right_buf = Uuid::encode_buffer();
        let left: &str = self.0.hyphenated().encode_lower(&mut left_buf);
        let right: &str = other.0.hyphenated().encode_lower(&mut right_buf);
        left.cmp(right)
    }
}

impl PartialOrd for OperationId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for OperationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Identifier of a loaded API specification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecificationId(Uuid);

impl SpecificationId {
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl fmt::Display for SpecificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for SpecificationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

// ============================================================
// HTTP METHOD
// ============================================================

/// HTTP method of an operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
    /// Anything else, upper-cased.
    Other(String),
}

impl HttpMethod {
    /// Tiebreak weight: producers first, then mutations, reads, removals.
    pub fn weight(&self) -> u32 {
        match self {
            HttpMethod::Post => 1,
            HttpMethod::Put => 2,
            HttpMethod::Patch => 3,
            HttpMethod::Get => 4,
            HttpMethod::Delete => 5,
            HttpMethod::Options => 6,
            HttpMethod::Head => 7,
            HttpMethod::Other(_) => u32::MAX,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Other(name) => name,
        }
    }
}

impl From<&str> for HttpMethod {
    fn from(value: &str) -> Self {
        let upper = value.trim().to_ascii_uppercase();
        match upper.as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "OPTIONS" => HttpMethod::Options,
            "HEAD" => HttpMethod::Head,
            _ => HttpMethod::Other(upper),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// SCHEMA NAME
// ============================================================

/// A `$ref` schema name.
///
/// Equality, ordering and hashing ignore case; the first-seen spelling is
/// kept for display.
#[derive(Clone, Debug)]
pub struct SchemaName {
    display: String,
    key: String,
}

impl SchemaName {
    pub fn new(name: impl Into<String>) -> Self {
        let display = name.into();
        let key = display.to_lowercase();
        Self { display, key }
    }

    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// Lower-cased comparison key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PartialEq for SchemaName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for SchemaName {}

impl Hash for SchemaName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl Ord for SchemaName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl PartialOrd for SchemaName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

// ============================================================
// KINDS
// ============================================================

/// Origin of a dependency edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DependencyType {
    /// Path parameter consumed from a producing POST
    RuleBased,
    /// Schema reference relationship
    SchemaSchema,
}

/// Which token-matching rule fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchType {
    Exact,
    PluralSingular,
    Abbreviation,
    Stem,
    Substring,
}

/// Explainability token attached to each sorted operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    AuthFirst,
    DependencyFirst,
    ProducerFirst,
    HighFanOut,
    CycleBreakFallback,
    DeterministicTieBreak,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::AuthFirst => "AUTH_FIRST",
            ReasonCode::DependencyFirst => "DEPENDENCY_FIRST",
            ReasonCode::ProducerFirst => "PRODUCER_FIRST",
            ReasonCode::HighFanOut => "HIGH_FAN_OUT",
            ReasonCode::CycleBreakFallback => "CYCLE_BREAK_FALLBACK",
            ReasonCode::DeterministicTieBreak => "DETERMINISTIC_TIE_BREAK",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_id_orders_by_canonical_string() {
        let ids = [
            "ffffffff-0000-0000-0000-000000000000",
            "0a000000-0000-0000-0000-000000000000",
            "a0000000-0000-0000-0000-000000000000",
        ];
        let mut parsed: Vec<OperationId> = ids.iter().map(|s| s.parse().unwrap()).collect();
        parsed.sort();

        let rendered: Vec<String> = parsed.iter().map(|id| id.to_string()).collect();
        let mut expected: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_operation_id_rejects_malformed() {
        assert!("not-a-uuid".parse::<OperationId>().is_err());
        assert!("".parse::<OperationId>().is_err());
    }

    #[test]
    fn test_http_method_parsing_and_weight() {
        assert_eq!(HttpMethod::from("post"), HttpMethod::Post);
        assert_eq!(HttpMethod::from(" Get "), HttpMethod::Get);
        assert_eq!(HttpMethod::from("trace"), HttpMethod::Other("TRACE".into()));
        assert!(HttpMethod::Post.weight() < HttpMethod::Put.weight());
        assert!(HttpMethod::Head.weight() < HttpMethod::Other("TRACE".into()).weight());
    }

    #[test]
    fn test_schema_name_case_insensitive() {
        let a = SchemaName::new("UserDto");
        let b = SchemaName::new("userdto");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "UserDto");
        assert_eq!(a.key(), "userdto");
    }

    #[test]
    fn test_reason_code_serialization() {
        let json = serde_json::to_string(&ReasonCode::DeterministicTieBreak).unwrap();
        assert_eq!(json, "\"DETERMINISTIC_TIE_BREAK\"");
        assert_eq!(ReasonCode::HighFanOut.as_str(), "HIGH_FAN_OUT");
    }
}
