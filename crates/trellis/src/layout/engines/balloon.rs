//! Balloon tree layout.
//!
//! Each node becomes a circle around which its children's circles are
//! arranged. A bottom-up pass sizes every circle from its children's
//! radii and the angle each child subtends; a top-down pass turns the
//! accumulated angles into absolute positions. When the children subtend
//! more than half a turn, their angles are compressed so they still fit.

use std::f32::consts::PI;

use log::{debug, trace};

use trellis_core::geometry::{Point, Size};

use super::{layout_children, layout_pre_order};
use crate::{
    config::BalloonConfig,
    error::LayoutError,
    layout::{Layout, LayoutContext, ParamTable},
    structure::{Graph, NodeId},
};

#[derive(Debug, Clone, Copy, Default)]
struct BalloonParams {
    /// Distance from the node to the centers of its children
    d: f32,
    /// Balloon radius
    r: f32,
    /// Angle subtended by this node at its parent
    a: f32,
    /// Compression factor for the children
    c: f32,
    /// Free angle distributed between the children
    f: f32,
}

/// Balloon tree layout engine.
#[derive(Debug, Clone)]
pub struct BalloonLayout {
    min_radius: f32,
}

impl Default for BalloonLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl BalloonLayout {
    pub fn new() -> Self {
        Self::from_config(&BalloonConfig::default())
    }

    pub fn from_config(config: &BalloonConfig) -> Self {
        Self {
            min_radius: config.min_radius(),
        }
    }

    /// Radius of a childless balloon.
    pub fn set_min_radius(&mut self, min_radius: f32) -> &mut Self {
        self.min_radius = min_radius;
        self
    }

    pub fn min_radius(&self) -> f32 {
        self.min_radius
    }

    fn first_walk(&self, graph: &Graph, order: &[NodeId], params: &mut ParamTable<BalloonParams>) {
        for node in order.iter().rev() {
            let mut d = 0.0_f32;
            let mut sum = 0.0;
            for child in layout_children(graph, *node) {
                let child_params = params.get_mut(child);
                d = d.max(child_params.r);
                // zero-radius balloons subtend no angle
                child_params.a = if d + child_params.r > 0.0 {
                    (child_params.r / (d + child_params.r)).atan()
                } else {
                    0.0
                };
                sum += child_params.a;
            }

            let params = params.get_mut(*node);
            params.d = d;
            if sum > PI {
                params.c = PI / sum;
                params.f = 0.0;
            } else {
                params.c = 1.0;
                params.f = PI - sum;
            }
            params.r = d.max(self.min_radius) + 2.0 * d;
        }
    }
}

impl Layout for BalloonLayout {
    fn name(&self) -> &'static str {
        "balloon"
    }

    fn run(&mut self, graph: &mut Graph, ctx: &LayoutContext) -> Result<(), LayoutError> {
        let root = ctx.require_root(self.name(), graph)?;
        if !(self.min_radius.is_finite() && self.min_radius >= 0.0) {
            return Err(LayoutError::invalid_parameter(
                "min_radius",
                "must be non-negative and finite",
            ));
        }

        let order = layout_pre_order(graph, root);
        let mut params: ParamTable<BalloonParams> = ParamTable::new();
        self.first_walk(graph, &order, &mut params);

        debug!(
            root:% = root,
            node_count = order.len(),
            root_radius = params.value(root).r;
            "Balloon layout"
        );

        // (node, center, scale, incoming angle)
        let mut stack = vec![(root, ctx.anchor(), 1.0_f32, 0.0_f32)];
        while let Some((node, center, scale, theta)) = stack.pop() {
            let np = params.value(node);
            trace!(node:% = node, center:? = center, scale = scale; "Placed node");
            if let Some(visual) = graph.visual_mut(node) {
                visual.set_position(center);
                visual.set_size(Size::square(2.0 * scale * np.r));
            }

            let children = layout_children(graph, node);
            if children.is_empty() {
                continue;
            }
            let spread = np.f / children.len() as f32;
            let offset = scale * np.d;
            let mut angle = theta + PI;
            let mut previous = 0.0;
            for child in children {
                let aa = np.c * params.value(child).a;
                let tan = aa.tan();
                let rr = np.d * tan / (1.0 - tan);
                angle += previous + aa + spread;
                let position = center.add_point(Point::from_polar(scale * rr + offset, angle));
                previous = aa;
                stack.push((child, position, scale * np.c, angle));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use trellis_core::geometry::Bounds;

    use super::*;

    fn star(leaves: usize) -> (Graph, NodeId, Vec<NodeId>) {
        let mut graph = Graph::new(false);
        let root = graph.add_node();
        let kids = (0..leaves)
            .map(|_| {
                let child = graph.add_node();
                graph.add_child(root, child).unwrap();
                child
            })
            .collect();
        (graph, root, kids)
    }

    fn position(graph: &Graph, node: NodeId) -> Point {
        graph.visual(node).unwrap().position()
    }

    #[test]
    fn test_two_leaves() {
        let (mut graph, root, kids) = star(2);
        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 100.0, 100.0)).with_root(root);
        BalloonLayout::new().run(&mut graph, &ctx).unwrap();

        let anchor = Point::new(50.0, 50.0);
        assert_eq!(position(&graph, root), anchor);
        // leaves have radius 2; root: d = 2, r = 2 + 4
        assert_approx_eq!(f32, graph.visual(root).unwrap().size().width(), 12.0);
        assert_approx_eq!(f32, graph.visual(kids[0]).unwrap().size().width(), 4.0);
        for kid in &kids {
            assert_approx_eq!(f32, position(&graph, *kid).distance(anchor), 4.0, epsilon = 1e-4);
        }

        // consecutive children are a + a + free/2 apart
        let a = 0.5_f32.atan();
        let step = 2.0 * a + (PI - 2.0 * a) / 2.0;
        let first = anchor.angle_to(position(&graph, kids[0]));
        let second = anchor.angle_to(position(&graph, kids[1]));
        let gap = (second - first).rem_euclid(std::f32::consts::TAU);
        assert_approx_eq!(f32, gap, step, epsilon = 1e-4);
    }

    #[test]
    fn test_crowded_children_are_compressed() {
        let (mut graph, root, kids) = star(20);
        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 100.0, 100.0)).with_root(root);
        BalloonLayout::new().run(&mut graph, &ctx).unwrap();

        let anchor = position(&graph, root);
        let angles: Vec<f32> = kids
            .iter()
            .map(|kid| anchor.angle_to(position(&graph, *kid)))
            .collect();
        // compressed children subtend half a turn each side: steps of 2 * PI / 20
        for pair in angles.windows(2) {
            let gap = (pair[1] - pair[0]).rem_euclid(std::f32::consts::TAU);
            assert_approx_eq!(f32, gap, PI / 10.0, epsilon = 1e-4);
        }
        // children are drawn at the compressed scale
        let c = PI / (20.0 * 0.5_f32.atan());
        assert_approx_eq!(f32, graph.visual(kids[0]).unwrap().size().width(), 4.0 * c, epsilon = 1e-4);
    }

    #[test]
    fn test_min_radius_for_leaves() {
        let (mut graph, root, _) = star(0);
        let mut layout = BalloonLayout::new();
        layout.set_min_radius(7.5);
        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 10.0, 10.0)).with_root(root);
        layout.run(&mut graph, &ctx).unwrap();
        assert_eq!(graph.visual(root).unwrap().size(), Size::square(15.0));

        layout.set_min_radius(-1.0);
        assert!(layout.run(&mut graph, &ctx).is_err());
    }

    #[test]
    fn test_zero_min_radius_stays_finite() {
        let (mut graph, root, kids) = star(2);
        let grandchild = graph.add_node();
        graph.add_child(kids[0], grandchild).unwrap();

        let mut layout = BalloonLayout::new();
        layout.set_min_radius(0.0);
        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 100.0, 100.0)).with_root(root);
        layout.run(&mut graph, &ctx).unwrap();

        // every balloon collapses onto the anchor
        for node in [root, kids[0], kids[1], grandchild] {
            let visual = graph.visual(node).unwrap();
            assert!(visual.position().is_finite(), "{node} at {:?}", visual.position());
            assert_eq!(visual.position(), Point::new(50.0, 50.0));
            assert_eq!(visual.size(), Size::default());
        }
    }

    #[test]
    fn test_grandchildren_surround_their_parent() {
        let (mut graph, root, kids) = star(2);
        let grandchild = graph.add_node();
        graph.add_child(kids[0], grandchild).unwrap();

        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 100.0, 100.0)).with_root(root);
        BalloonLayout::new().run(&mut graph, &ctx).unwrap();

        // kids[0]: d = 2 at scale 1
        let distance = position(&graph, grandchild).distance(position(&graph, kids[0]));
        assert_approx_eq!(f32, distance, 4.0, epsilon = 1e-4);
    }
}
