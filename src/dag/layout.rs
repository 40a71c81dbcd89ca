// src/dag/layout.rs

//! Grid placement of graph nodes: one column per layer, one row per node
//! within its layer. Purely presentational.

use crate::dag::graph::GraphModel;
use crate::dag::model::GraphNode;

pub const X_SPACING: f32 = 250.0;
pub const Y_SPACING: f32 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// Place every node of the model.
///
/// Columns follow the canonical layer order, counting empty layers, so a
/// given layer always lands in the same column; unknown layers form the last
/// column. Returned in column order, then fetch order.
pub fn layout(model: &GraphModel) -> Vec<(&GraphNode, Position)> {
    let mut placed = Vec::with_capacity(model.len());
    for (layer, nodes) in model.layers() {
        let x = layer.column() as f32 * X_SPACING;
        for (row, node) in nodes.into_iter().enumerate() {
            placed.push((
                node,
                Position {
                    x,
                    y: row as f32 * Y_SPACING,
                },
            ));
        }
    }
    placed
}
