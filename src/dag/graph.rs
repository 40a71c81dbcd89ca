// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, Reversed};
use tracing::debug;

use crate::dag::model::{DagPayload, GraphEdge, GraphNode};
use crate::types::Layer;

/// In-memory dependency graph built from one fetch.
///
/// A new fetch replaces the whole model; nothing is merged. Node order is
/// fetch order. Traversal runs over a `petgraph` graph whose edges point
/// from a dependency to its dependent, built from each node's `depends_on`.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    /// Node `i` of this graph is `nodes[i]`.
    graph: DiGraph<(), ()>,
}

impl GraphModel {
    pub fn from_payload(payload: DagPayload) -> Self {
        let DagPayload { nodes, edges } = payload;

        let mut by_id = HashMap::with_capacity(nodes.len());
        let mut by_name = HashMap::with_capacity(nodes.len());
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());

        for (idx, node) in nodes.iter().enumerate() {
            graph.add_node(());
            by_id.insert(node.unique_id.clone(), idx);
            // Last node with a given name wins.
            by_name.insert(node.display_name.clone(), idx);
        }

        for (idx, node) in nodes.iter().enumerate() {
            for dep in &node.depends_on {
                match by_id.get(dep) {
                    Some(&dep_idx) => {
                        graph.add_edge(NodeIndex::new(dep_idx), NodeIndex::new(idx), ());
                    }
                    None => {
                        debug!(node = %node.unique_id, %dep, "dependency not present in graph");
                    }
                }
            }
        }

        Self {
            nodes,
            edges,
            by_id,
            by_name,
            graph,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes in fetch order.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn contains(&self, unique_id: &str) -> bool {
        self.by_id.contains_key(unique_id)
    }

    pub fn node(&self, unique_id: &str) -> Option<&GraphNode> {
        self.by_id.get(unique_id).map(|&idx| &self.nodes[idx])
    }

    /// Node with the given display name. When names collide, the one
    /// fetched last is returned.
    pub fn node_by_name(&self, display_name: &str) -> Option<&GraphNode> {
        self.by_name.get(display_name).map(|&idx| &self.nodes[idx])
    }

    /// Nodes grouped by layer, layers in canonical order (unknown last),
    /// nodes in fetch order within a layer. Empty layers are omitted.
    pub fn layers(&self) -> BTreeMap<Layer, Vec<&GraphNode>> {
        let mut layers: BTreeMap<Layer, Vec<&GraphNode>> = BTreeMap::new();
        for node in &self.nodes {
            layers.entry(node.layer).or_default().push(node);
        }
        layers
    }

    /// Every node `unique_id` depends on, directly or transitively.
    /// Excludes `unique_id` itself; empty for unknown ids.
    pub fn upstream_of(&self, unique_id: &str) -> BTreeSet<String> {
        let Some(&start) = self.by_id.get(unique_id) else {
            return BTreeSet::new();
        };
        let start = NodeIndex::new(start);
        let reversed = Reversed(&self.graph);
        let mut dfs = Dfs::new(reversed, start);
        let mut out = BTreeSet::new();
        while let Some(ix) = dfs.next(reversed) {
            if ix != start {
                out.insert(self.nodes[ix.index()].unique_id.clone());
            }
        }
        out
    }

    /// Every node that depends on `unique_id`, directly or transitively.
    /// Excludes `unique_id` itself; empty for unknown ids.
    pub fn downstream_of(&self, unique_id: &str) -> BTreeSet<String> {
        let Some(&start) = self.by_id.get(unique_id) else {
            return BTreeSet::new();
        };
        let start = NodeIndex::new(start);
        let mut dfs = Dfs::new(&self.graph, start);
        let mut out = BTreeSet::new();
        while let Some(ix) = dfs.next(&self.graph) {
            if ix != start {
                out.insert(self.nodes[ix.index()].unique_id.clone());
            }
        }
        out
    }
}

impl From<DagPayload> for GraphModel {
    fn from(payload: DagPayload) -> Self {
        GraphModel::from_payload(payload)
    }
}
