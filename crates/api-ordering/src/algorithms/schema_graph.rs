//! Schema Reference Graph Builder
//!
//! Pulls `$ref` schema names out of raw schema-fragment text and links
//! every pair of names that appear in the same fragment. This is a
//! co-reference approximation, not a structural walk of the schema: two
//! names found in one fragment are treated as related in both directions.

use crate::domain::entities::Operation;
use crate::domain::value_objects::SchemaName;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

lazy_static! {
    static ref SCHEMA_REF: Regex =
        Regex::new(r"(?i)#/(?:components/schemas|definitions)/([A-Za-z0-9_.\-]+)")
            .expect("schema ref pattern is valid");
}

/// Schema names referenced by one fragment, de-duplicated, in sorted order.
///
/// Unparseable or unrelated text simply yields no names. The first
/// spelling of a name wins.
pub fn extract_schema_refs(fragment: &str) -> BTreeSet<SchemaName> {
    let mut names = BTreeSet::new();
    for caps in SCHEMA_REF.captures_iter(fragment) {
        if let Some(m) = caps.get(1) {
            names.insert(SchemaName::new(m.as_str()));
        }
    }
    names
}

/// Parameter-side and response-side refs of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationRefs {
    pub parameter_refs: BTreeSet<SchemaName>,
    pub response_refs: BTreeSet<SchemaName>,
}

impl OperationRefs {
    pub fn from_operation(op: &Operation) -> Self {
        let collect = |payloads: &[String]| {
            let mut names = BTreeSet::new();
            for payload in payloads {
                for name in extract_schema_refs(payload) {
                    names.insert(name);
                }
            }
            names
        };
        Self {
            parameter_refs: collect(&op.parameter_schema_payloads),
            response_refs: collect(&op.response_schema_payloads),
        }
    }
}

/// Directed adjacency over schema names.
///
/// The builder only ever inserts edges in both directions; the closure
/// computer accepts any direction.
#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    adjacency: BTreeMap<SchemaName, BTreeSet<SchemaName>>,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: SchemaName) {
        self.adjacency.entry(name).or_default();
    }

    /// Add a directed edge `from -> to`. Self-loops are ignored.
    pub fn add_edge(&mut self, from: SchemaName, to: SchemaName) {
        if from == to {
            self.add_node(from);
            return;
        }
        self.add_node(to.clone());
        self.adjacency.entry(from).or_default().insert(to);
    }

    pub fn link(&mut self, a: SchemaName, b: SchemaName) {
        self.add_edge(a.clone(), b.clone());
        self.add_edge(b, a);
    }

    pub fn neighbors(&self, name: &SchemaName) -> Option<&BTreeSet<SchemaName>> {
        self.adjacency.get(name)
    }

    pub fn contains(&self, name: &SchemaName) -> bool {
        self.adjacency.contains_key(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SchemaName> {
        self.adjacency.keys()
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum()
    }
}

/// Record one fragment: every name becomes a node, co-occurring names are linked.
pub fn add_fragment(graph: &mut SchemaGraph, fragment: &str) {
    let names: Vec<SchemaName> = extract_schema_refs(fragment).into_iter().collect();
    for name in &names {
        graph.add_node(name.clone());
    }
    for (i, a) in names.iter().enumerate() {
        for b in &names[i + 1..] {
            graph.link(a.clone(), b.clone());
        }
    }
}

/// Build the co-reference graph over every parameter and response fragment.
pub fn build_schema_graph(operations: &[Operation]) -> SchemaGraph {
    let mut graph = SchemaGraph::new();
    for op in operations {
        for fragment in op
            .parameter_schema_payloads
            .iter()
            .chain(op.response_schema_payloads.iter())
        {
            add_fragment(&mut graph, fragment);
        }
    }
    graph
}
