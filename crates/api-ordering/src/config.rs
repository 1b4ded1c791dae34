//! Configuration for API operation ordering

use crate::domain::errors::OrderingError;
use crate::domain::value_objects::DEFAULT_MIN_MATCH_SCORE;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

pub const ENV_MAX_OPERATIONS: &str = "API_ORDERING_MAX_OPERATIONS";
pub const ENV_MAX_EDGES: &str = "API_ORDERING_MAX_EDGES";
pub const ENV_SCHEMA_ANALYSIS: &str = "API_ORDERING_SCHEMA_ANALYSIS";
pub const ENV_FUZZY_NAMES: &str = "API_ORDERING_FUZZY_NAMES";
pub const ENV_SIMILAR_BASE_NAMES: &str = "API_ORDERING_SIMILAR_BASE_NAMES";
pub const ENV_MIN_TOKEN_SCORE: &str = "API_ORDERING_MIN_TOKEN_SCORE";

/// Ordering configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    /// Maximum operations ordered in one call
    pub max_operations: usize,
    /// Maximum merged edges in the dependency graph
    pub max_edge_count: usize,
    /// Follow the schema co-reference closure
    pub enable_schema_analysis: bool,
    /// Link schemas sharing a base name
    pub enable_fuzzy_names: bool,
    /// Also link base names the token matcher scores as similar
    pub link_similar_base_names: bool,
    /// Minimum token score for similar base names
    pub min_token_score: f64,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            max_operations: 1000,
            max_edge_count: 100_000,
            enable_schema_analysis: true,
            enable_fuzzy_names: true,
            link_similar_base_names: false,
            min_token_score: DEFAULT_MIN_MATCH_SCORE,
        }
    }
}

impl OrderingConfig {
    /// Defaults overlaid with `API_ORDERING_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    ///
    /// Unparsable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        overlay(&lookup, ENV_MAX_OPERATIONS, &mut config.max_operations);
        overlay(&lookup, ENV_MAX_EDGES, &mut config.max_edge_count);
        overlay(&lookup, ENV_SCHEMA_ANALYSIS, &mut config.enable_schema_analysis);
        overlay(&lookup, ENV_FUZZY_NAMES, &mut config.enable_fuzzy_names);
        overlay(&lookup, ENV_SIMILAR_BASE_NAMES, &mut config.link_similar_base_names);
        overlay(&lookup, ENV_MIN_TOKEN_SCORE, &mut config.min_token_score);
        config
    }

    pub fn validate(&self) -> Result<(), OrderingError> {
        if self.max_operations == 0 {
            return Err(OrderingError::InvalidConfig(
                "max_operations must be greater than zero".into(),
            ));
        }
        if self.max_edge_count == 0 {
            return Err(OrderingError::InvalidConfig(
                "max_edge_count must be greater than zero".into(),
            ));
        }
        if !(self.min_token_score > 0.0 && self.min_token_score <= 1.0) {
            return Err(OrderingError::InvalidConfig(format!(
                "min_token_score must be in (0, 1], got {}",
                self.min_token_score
            )));
        }
        Ok(())
    }
}

fn overlay<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut T) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *target = value,
        Err(_) => warn!(key, value = %raw, "Ignoring unparsable configuration value"),
    }
}
