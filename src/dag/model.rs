// src/dag/model.rs

//! Wire types returned by the graph and selector endpoints.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::types::Layer;

/// One node of the dependency graph.
///
/// `depends_on` and `dependents` are inverse relations; the backend is
/// trusted to keep them consistent and the client never repairs them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawGraphNode")]
pub struct GraphNode {
    pub unique_id: String,
    pub display_name: String,
    pub resource_kind: String,
    pub layer: Layer,
    pub materialization: Option<String>,
    /// Upstream node ids, in fetch order.
    pub depends_on: Vec<String>,
    /// Downstream node ids, in fetch order.
    pub dependents: Vec<String>,
    pub description: Option<String>,
}

impl GraphNode {
    pub fn is_source(&self) -> bool {
        self.resource_kind == "source"
    }
}

#[derive(Debug, Deserialize)]
struct RawGraphNode {
    #[serde(default)]
    id: String,
    #[serde(default)]
    unique_id: String,
    name: String,
    #[serde(default)]
    resource_type: String,
    #[serde(default)]
    layer: Layer,
    #[serde(default)]
    materialization: Option<String>,
    #[serde(default)]
    materialized: Option<String>,
    #[serde(default)]
    depends_on: Vec<String>,
    #[serde(default)]
    dependents: Vec<String>,
    #[serde(default)]
    description: Option<String>,
}

impl From<RawGraphNode> for GraphNode {
    fn from(raw: RawGraphNode) -> Self {
        let unique_id = if raw.unique_id.is_empty() {
            raw.id
        } else {
            raw.unique_id
        };
        let materialization = raw
            .materialization
            .filter(|m| !m.is_empty())
            .or(raw.materialized.filter(|m| !m.is_empty()));

        Self {
            unique_id,
            display_name: raw.name,
            resource_kind: raw.resource_type,
            layer: raw.layer,
            materialization,
            depends_on: raw.depends_on,
            dependents: raw.dependents,
            description: raw.description.filter(|d| !d.is_empty()),
        }
    }
}

/// Directed edge from an upstream (depended-upon) node to its dependent.
/// Duplicates are kept as received.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Stable identifier `"<source>-<target>"`.
    pub fn id(&self) -> String {
        format!("{}-{}", self.source, self.target)
    }
}

/// Body of the graph fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DagPayload {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

/// Outcome of evaluating a selector, locally or remotely.
///
/// Derived on every evaluation and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectorResult {
    #[serde(rename = "selector")]
    pub raw_selector: String,
    pub selected_nodes: BTreeSet<String>,
    #[serde(default)]
    pub explanation: String,
}

/// Details and sample rows of one model, as served by the preview endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelPreview {
    pub node: GraphNode,
    #[serde(default)]
    pub sample_data: Vec<Map<String, Value>>,
    #[serde(default)]
    pub row_count: u64,
    #[serde(default)]
    pub sql: Option<String>,
}
