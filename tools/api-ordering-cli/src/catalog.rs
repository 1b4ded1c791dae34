//! Specification catalog file
//!
//! JSON document listing specifications and their operations:
//!
//! ```json
//! { "specifications": [ { "id": "<uuid>", "name": "pets", "operations": [ ... ] } ] }
//! ```

use anyhow::{bail, Context, Result};
use api_ordering::{InMemoryOperationSource, OperationPayload, SpecificationId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub specifications: Vec<CatalogSpecification>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSpecification {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub operations: Vec<OperationPayload>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing catalog {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(raw)?;
        let mut seen = HashSet::new();
        for spec in &catalog.specifications {
            if !seen.insert(spec.id.trim().to_ascii_lowercase()) {
                bail!("duplicate specification id {}", spec.id);
            }
        }
        Ok(catalog)
    }

    pub fn find(&self, id: SpecificationId) -> Option<&CatalogSpecification> {
        self.specifications
            .iter()
            .find(|spec| spec.id.parse::<SpecificationId>().ok() == Some(id))
    }

    /// Build an operation source over every specification.
    ///
    /// Malformed specification or operation ids are rejected here.
    pub fn to_source(&self) -> Result<InMemoryOperationSource> {
        let mut source = InMemoryOperationSource::new();
        for spec in &self.specifications {
            let id: SpecificationId = spec
                .id
                .parse()
                .with_context(|| format!("specification id {:?}", spec.id))?;
            let operations = spec
                .operations
                .iter()
                .map(|payload| payload.to_operation())
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("operations of specification {}", id))?;
            source.insert(id, operations);
        }
        Ok(source)
    }
}
