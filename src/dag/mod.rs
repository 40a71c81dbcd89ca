// src/dag/mod.rs

//! Dependency graph of transformation nodes and its highlighting.
//!
//! - [`model`] holds the wire types of the graph and selector endpoints.
//! - [`graph`] is the in-memory [`GraphModel`] with closure traversal.
//! - [`layout`] places nodes on a layer grid.
//! - [`selector`] parses and resolves selector expressions.
//! - [`highlight`] classifies nodes and edges for rendering.
//! - [`view`] ties the above to the collaborators in [`crate::api`].

pub mod graph;
pub mod highlight;
pub mod layout;
pub mod model;
pub mod selector;
pub mod view;

pub use graph::GraphModel;
pub use highlight::{project, EdgeView, HighlightState, NodeTier, NodeView, ProjectedGraph};
pub use layout::Position;
pub use model::{DagPayload, GraphEdge, GraphNode, ModelPreview, SelectorResult};
pub use selector::{Selector, SelectorEngine, SelectorTarget};
pub use view::DagView;
