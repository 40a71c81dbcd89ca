use pipeline_console::dag::{DagPayload, GraphEdge, GraphModel, GraphNode};
use pipeline_console::types::Layer;

const PROJECT: &str = "taxi";

struct PendingNode {
    name: String,
    is_source: bool,
    layer: Layer,
    materialization: Option<String>,
    depends_on: Vec<String>,
}

/// Builder for graph payloads, addressed by display name.
///
/// Ids follow the backend's shape: `source.taxi.<name>` for sources and
/// `model.taxi.<name>` for everything else. Dependencies are given by name
/// and must be declared before use; `dependents` and the edge list are
/// derived.
#[derive(Default)]
pub struct GraphBuilder {
    nodes: Vec<PendingNode>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, name: &str) -> Self {
        self.nodes.push(PendingNode {
            name: name.to_string(),
            is_source: true,
            layer: Layer::Source,
            materialization: None,
            depends_on: Vec::new(),
        });
        self
    }

    pub fn model(mut self, name: &str, layer: Layer, depends_on: &[&str]) -> Self {
        self.nodes.push(PendingNode {
            name: name.to_string(),
            is_source: false,
            layer,
            materialization: Some("view".to_string()),
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
        });
        self
    }

    pub fn materialized(mut self, materialization: &str) -> Self {
        if let Some(last) = self.nodes.last_mut() {
            last.materialization = Some(materialization.to_string());
        }
        self
    }

    pub fn build_payload(self) -> DagPayload {
        let id_of = |name: &str| -> String {
            let node = self
                .nodes
                .iter()
                .find(|n| n.name == name)
                .unwrap_or_else(|| panic!("unknown dependency '{name}'"));
            node_id(&node.name, node.is_source)
        };

        let mut edges = Vec::new();
        let mut nodes: Vec<GraphNode> = self
            .nodes
            .iter()
            .map(|n| {
                let unique_id = node_id(&n.name, n.is_source);
                let depends_on: Vec<String> = n.depends_on.iter().map(|d| id_of(d)).collect();
                for dep in &depends_on {
                    edges.push(GraphEdge::new(dep.clone(), unique_id.clone()));
                }
                GraphNode {
                    unique_id,
                    display_name: n.name.clone(),
                    resource_kind: if n.is_source { "source" } else { "model" }.to_string(),
                    layer: n.layer,
                    materialization: n.materialization.clone(),
                    depends_on,
                    dependents: Vec::new(),
                    description: None,
                }
            })
            .collect();

        for edge in &edges {
            if let Some(upstream) = nodes.iter_mut().find(|n| n.unique_id == edge.source) {
                upstream.dependents.push(edge.target.clone());
            }
        }

        DagPayload { nodes, edges }
    }

    pub fn build(self) -> GraphModel {
        GraphModel::from_payload(self.build_payload())
    }
}

pub fn model_id(name: &str) -> String {
    node_id(name, false)
}

pub fn source_id(name: &str) -> String {
    node_id(name, true)
}

fn node_id(name: &str, is_source: bool) -> String {
    if is_source {
        format!("source.{PROJECT}.{name}")
    } else {
        format!("model.{PROJECT}.{name}")
    }
}

/// The chain `a -> b -> fct_trips -> c -> d`, all models.
pub fn trips_chain() -> GraphBuilder {
    GraphBuilder::new()
        .model("a", Layer::Staging, &[])
        .model("b", Layer::Intermediate, &["a"])
        .model("fct_trips", Layer::Marts, &["b"])
        .materialized("table")
        .model("c", Layer::Marts, &["fct_trips"])
        .model("d", Layer::Marts, &["c"])
}
