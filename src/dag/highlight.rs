// src/dag/highlight.rs

//! Render-ready classification of the graph under a highlight.
//!
//! Nodes fall into exactly one tier:
//! - [`NodeTier::Unfiltered`]: no highlight is active; full emphasis.
//! - [`NodeTier::Selected`]: the node is highlighted; full emphasis.
//! - [`NodeTier::Dimmed`]: a highlight is active and excludes the node.
//!
//! An edge is active only if no highlight is active or *both* of its
//! endpoints are highlighted. An edge touching the selection from outside
//! stays dim.

use std::collections::BTreeSet;

use crate::dag::graph::GraphModel;
use crate::dag::layout::{layout, Position};
use crate::dag::model::GraphEdge;
use crate::types::Layer;

pub const DIMMED_NODE_COLOR: &str = "#e5e7eb";
pub const DIMMED_OPACITY: f32 = 0.3;
pub const ACTIVE_EDGE_COLOR: &str = "#64748b";
pub const DIMMED_EDGE_COLOR: &str = "#e5e7eb";

/// Set of highlighted node ids. Empty means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightState {
    highlighted: BTreeSet<String>,
}

impl HighlightState {
    /// No filter: everything at full emphasis.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_nodes<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            highlighted: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_filtered(&self) -> bool {
        !self.highlighted.is_empty()
    }

    pub fn contains(&self, unique_id: &str) -> bool {
        self.highlighted.contains(unique_id)
    }

    /// Whether `unique_id` is shown at full emphasis.
    pub fn includes(&self, unique_id: &str) -> bool {
        !self.is_filtered() || self.contains(unique_id)
    }

    pub fn ids(&self) -> &BTreeSet<String> {
        &self.highlighted
    }

    pub fn len(&self) -> usize {
        self.highlighted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.highlighted.is_empty()
    }

    pub fn clear(&mut self) {
        self.highlighted.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTier {
    Unfiltered,
    Selected,
    Dimmed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    pub id: String,
    pub label: String,
    pub layer: Layer,
    pub materialization: Option<String>,
    pub position: Position,
    pub tier: NodeTier,
    pub color: &'static str,
    pub opacity: f32,
    /// The node the user last clicked.
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeView {
    pub id: String,
    pub source: String,
    pub target: String,
    /// Emphasised: no filter, or both endpoints highlighted.
    pub active: bool,
    /// Animated: a filter is active and both endpoints are highlighted.
    pub animated: bool,
    pub color: &'static str,
}

/// Projection of a whole graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedGraph {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

impl ProjectedGraph {
    pub fn node(&self, id: &str) -> Option<&NodeView> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, source: &str, target: &str) -> Option<&EdgeView> {
        self.edges
            .iter()
            .find(|e| e.source == source && e.target == target)
    }
}

pub fn classify_node(highlight: &HighlightState, unique_id: &str) -> NodeTier {
    if !highlight.is_filtered() {
        NodeTier::Unfiltered
    } else if highlight.contains(unique_id) {
        NodeTier::Selected
    } else {
        NodeTier::Dimmed
    }
}

pub fn edge_is_active(highlight: &HighlightState, edge: &GraphEdge) -> bool {
    highlight.includes(&edge.source) && highlight.includes(&edge.target)
}

/// Classify every node and edge of `model` under `highlight`.
///
/// Highlighted ids that are not in the model are ignored.
pub fn project(
    model: &GraphModel,
    highlight: &HighlightState,
    focused: Option<&str>,
) -> ProjectedGraph {
    let nodes = layout(model)
        .into_iter()
        .map(|(node, position)| {
            let tier = classify_node(highlight, &node.unique_id);
            let (color, opacity) = match tier {
                NodeTier::Unfiltered | NodeTier::Selected => (node.layer.color(), 1.0),
                NodeTier::Dimmed => (DIMMED_NODE_COLOR, DIMMED_OPACITY),
            };
            NodeView {
                id: node.unique_id.clone(),
                label: node.display_name.clone(),
                layer: node.layer,
                materialization: node.materialization.clone(),
                position,
                tier,
                color,
                opacity,
                focused: focused == Some(node.unique_id.as_str()),
            }
        })
        .collect();

    let edges = model
        .edges()
        .iter()
        .map(|edge| {
            let active = edge_is_active(highlight, edge);
            EdgeView {
                id: edge.id(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                active,
                animated: active && highlight.is_filtered(),
                color: if active {
                    ACTIVE_EDGE_COLOR
                } else {
                    DIMMED_EDGE_COLOR
                },
            }
        })
        .collect();

    ProjectedGraph { nodes, edges }
}
