//! TOML snapshot of a finished layout.

use serde::{Deserialize, Serialize};

use trellis::{
    geometry::Bounds,
    layout::LayoutKind,
    structure::{Graph, NodeId},
};

/// Placement of every node after a layout run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub layout: LayoutKind,
    pub root: usize,
    pub bounds: Frame,
    pub nodes: Vec<Placement>,
}

/// An axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Visual state of one node; `x` and `y` are its center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub visible: bool,
}

impl Snapshot {
    /// Records the visual state of every node of `graph` in graph order.
    pub fn capture(layout: LayoutKind, bounds: Bounds, graph: &Graph, root: NodeId) -> Self {
        let nodes = graph
            .nodes()
            .filter_map(|node| {
                let visual = graph.visual(node)?;
                let position = visual.position();
                let size = visual.size();
                Some(Placement {
                    id: node.index(),
                    parent: graph.parent(node).map(NodeId::index),
                    x: position.x(),
                    y: position.y(),
                    width: size.width(),
                    height: size.height(),
                    visible: visual.is_visible(),
                })
            })
            .collect();

        Self {
            layout,
            root: root.index(),
            bounds: Frame {
                x: bounds.min_x(),
                y: bounds.min_y(),
                width: bounds.width(),
                height: bounds.height(),
            },
            nodes,
        }
    }
}
