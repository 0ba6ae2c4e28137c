//! Radial tree layout.
//!
//! The root sits at the anchor and every level occupies a ring. Each node
//! receives an angular sector of its parent's sector, proportional to the
//! size of its visible subtree, and is placed on its ring at the middle of
//! that sector.

use std::{collections::HashMap, f32::consts::TAU};

use log::{debug, trace};

use trellis_core::geometry::Point;

use super::{layout_children, layout_pre_order};
use crate::{
    config::RadialConfig,
    error::LayoutError,
    layout::{Layout, LayoutContext, ParamTable},
    structure::{Graph, NodeId},
};

/// Angular span assigned to a node, in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sector {
    start: f32,
    span: f32,
}

impl Sector {
    pub fn new(start: f32, span: f32) -> Self {
        Self { start, span }
    }

    pub fn start(self) -> f32 {
        self.start
    }

    pub fn span(self) -> f32 {
        self.span
    }

    pub fn end(self) -> f32 {
        self.start + self.span
    }

    pub fn mid(self) -> f32 {
        self.start + self.span / 2.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct RadialParams {
    /// Visible descendants, not counting the node itself.
    descendants: usize,
    depth: usize,
}

impl RadialParams {
    fn weight(self) -> f32 {
        (1 + self.descendants) as f32
    }
}

/// Radial tree layout engine.
#[derive(Debug, Clone)]
pub struct RadialLayout {
    radius_increment: f32,
    auto_scale: bool,
    start_angle: f32,
    preserve_orientation: bool,
    previous_root: Option<NodeId>,
    sectors: HashMap<NodeId, Sector>,
}

impl Default for RadialLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl RadialLayout {
    pub fn new() -> Self {
        Self::from_config(&RadialConfig::default())
    }

    pub fn from_config(config: &RadialConfig) -> Self {
        Self {
            radius_increment: config.radius_increment(),
            auto_scale: config.auto_scale(),
            start_angle: config.start_angle(),
            preserve_orientation: config.preserve_orientation(),
            previous_root: None,
            sectors: HashMap::new(),
        }
    }

    /// Distance between consecutive rings. Overwritten by auto-scaling.
    pub fn set_radius_increment(&mut self, increment: f32) -> &mut Self {
        self.radius_increment = increment;
        self
    }

    pub fn radius_increment(&self) -> f32 {
        self.radius_increment
    }

    /// Fit the deepest level into the bounds on every run.
    pub fn set_auto_scale(&mut self, auto_scale: bool) -> &mut Self {
        self.auto_scale = auto_scale;
        self
    }

    pub fn set_start_angle(&mut self, angle: f32) -> &mut Self {
        self.start_angle = angle;
        self
    }

    /// Keep the direction of the previous root when the root changes.
    pub fn set_preserve_orientation(&mut self, preserve: bool) -> &mut Self {
        self.preserve_orientation = preserve;
        self
    }

    /// Sector assigned to `node` by the last run.
    pub fn sector(&self, node: NodeId) -> Option<Sector> {
        self.sectors.get(&node).copied()
    }

    /// Start angle for a new root that keeps the former root's direction.
    ///
    /// Returns `None` when the former root is not below `root` in the
    /// current layout tree.
    fn continuity_angle(
        &self,
        graph: &Graph,
        root: NodeId,
        params: &ParamTable<RadialParams>,
    ) -> Option<f32> {
        let previous = self.previous_root.filter(|prev| *prev != root)?;
        if !params.contains(previous) {
            return None;
        }

        // child of the root on the path to the former root
        let branch = std::iter::once(previous)
            .chain(graph.ancestors(previous))
            .find(|node| graph.parent(*node) == Some(root))?;

        let total = params.value(root).descendants as f32;
        let before: f32 = layout_children(graph, root)
            .into_iter()
            .take_while(|child| *child != branch)
            .map(|child| params.value(child).weight())
            .sum();
        let fraction = (before + params.value(branch).weight() / 2.0) / total;

        let root_position = graph.visual(root)?.position();
        let previous_position = graph.visual(previous)?.position();
        if root_position == previous_position {
            return None;
        }
        Some(root_position.angle_to(previous_position) - TAU * fraction)
    }
}

impl Layout for RadialLayout {
    fn name(&self) -> &'static str {
        "radial"
    }

    fn run(&mut self, graph: &mut Graph, ctx: &LayoutContext) -> Result<(), LayoutError> {
        let root = ctx.require_root(self.name(), graph)?;
        if !self.auto_scale && !(self.radius_increment.is_finite() && self.radius_increment > 0.0)
        {
            return Err(LayoutError::invalid_parameter(
                "radius_increment",
                "must be positive and finite",
            ));
        }

        let order = layout_pre_order(graph, root);
        let mut params: ParamTable<RadialParams> = ParamTable::new();
        let mut max_depth = 0;
        for node in &order {
            let depth = graph
                .parent(*node)
                .filter(|_| *node != root)
                .map_or(0, |parent| params.value(parent).depth + 1);
            params.get_mut(*node).depth = depth;
            max_depth = max_depth.max(depth);
        }
        // reverse pre-order visits children before their parents
        for node in order.iter().rev() {
            let weight: usize = layout_children(graph, *node)
                .iter()
                .map(|child| 1 + params.value(*child).descendants)
                .sum();
            params.get_mut(*node).descendants = weight;
        }

        if self.auto_scale && max_depth > 0 {
            let bounds = ctx.bounds();
            self.radius_increment = bounds.width().min(bounds.height()) / 2.0 / max_depth as f32;
        }

        let mut start = self.start_angle;
        if self.preserve_orientation
            && let Some(angle) = self.continuity_angle(graph, root, &params)
        {
            start = angle;
        }
        self.previous_root = Some(root);

        debug!(
            root:% = root,
            node_count = order.len(),
            max_depth = max_depth,
            radius_increment = self.radius_increment,
            start_angle = start;
            "Radial layout"
        );

        let anchor = ctx.anchor();
        self.sectors.clear();
        self.sectors.insert(root, Sector::new(start, TAU));
        if let Some(visual) = graph.visual_mut(root) {
            visual.set_position(anchor);
        }

        for node in &order {
            let sector = self.sectors.get(node).copied().unwrap_or_default();
            let total = params.value(*node).descendants as f32;
            if total <= 0.0 {
                continue;
            }

            let mut offset = 0.0;
            for child in layout_children(graph, *node) {
                let child_params = params.value(child);
                let fraction = child_params.weight() / total;
                let child_sector = Sector::new(
                    sector.start() + offset * sector.span(),
                    fraction * sector.span(),
                );
                offset += fraction;

                let radius = child_params.depth as f32 * self.radius_increment;
                let position = anchor.add_point(Point::from_polar(radius, child_sector.mid()));
                trace!(node:% = child, radius = radius, angle = child_sector.mid(); "Placed node");
                if let Some(visual) = graph.visual_mut(child) {
                    visual.set_position(position);
                }
                self.sectors.insert(child, child_sector);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::{approx_eq, assert_approx_eq};
    use trellis_core::geometry::Bounds;

    use super::*;

    fn position(graph: &Graph, node: NodeId) -> Point {
        graph.visual(node).unwrap().position()
    }

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

    #[test]
    fn test_star_leaves_on_one_ring() {
        let (mut graph, root, kids) = star(5);
        let mut layout = RadialLayout::new();
        layout.set_auto_scale(false).set_radius_increment(50.0);
        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 400.0, 400.0)).with_root(root);
        layout.run(&mut graph, &ctx).unwrap();

        let anchor = Point::new(200.0, 200.0);
        assert_eq!(position(&graph, root), anchor);
        for (i, kid) in kids.iter().enumerate() {
            assert_approx_eq!(f32, position(&graph, *kid).distance(anchor), 50.0, epsilon = 1e-3);
            let expected = (i as f32 + 0.5) * TAU / 5.0;
            assert_approx_eq!(f32, layout.sector(*kid).unwrap().mid(), expected, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_sectors_follow_subtree_size() {
        let (mut graph, root, kids) = star(2);
        // first child carries two grandchildren: weight 3 versus 1
        for _ in 0..2 {
            let grandchild = graph.add_node();
            graph.add_child(kids[0], grandchild).unwrap();
        }

        let mut layout = RadialLayout::new();
        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 200.0, 200.0)).with_root(root);
        layout.run(&mut graph, &ctx).unwrap();

        assert_approx_eq!(f32, layout.sector(kids[0]).unwrap().span(), TAU * 0.75);
        assert_approx_eq!(f32, layout.sector(kids[1]).unwrap().span(), TAU * 0.25);
        // auto-scaled: two levels in a 200x200 box
        assert_approx_eq!(f32, layout.radius_increment(), 50.0);
    }

    #[test]
    fn test_start_angle_rotates_layout() {
        let (mut graph, root, kids) = star(1);
        let mut layout = RadialLayout::new();
        layout
            .set_auto_scale(false)
            .set_radius_increment(10.0)
            .set_start_angle(-std::f32::consts::PI);
        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 100.0, 100.0)).with_root(root);
        layout.run(&mut graph, &ctx).unwrap();

        // single child sits at the middle of a full turn from -PI, i.e. angle 0
        let p = position(&graph, kids[0]);
        assert_approx_eq!(f32, p.x(), 60.0, epsilon = 1e-4);
        assert_approx_eq!(f32, p.y(), 50.0, epsilon = 1e-4);
    }

    #[test]
    fn test_hidden_subtrees_do_not_take_space() {
        let (mut graph, root, kids) = star(3);
        graph.visual_mut(kids[1]).unwrap().set_visible(false);

        let mut layout = RadialLayout::new();
        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 100.0, 100.0)).with_root(root);
        layout.run(&mut graph, &ctx).unwrap();

        assert_eq!(layout.sector(kids[1]), None);
        assert_approx_eq!(f32, layout.sector(kids[0]).unwrap().span(), TAU / 2.0);
        assert_approx_eq!(f32, layout.sector(kids[2]).unwrap().span(), TAU / 2.0);
    }

    #[test]
    fn test_preserve_orientation_keeps_former_root_direction() {
        let (mut graph, root, kids) = star(4);
        let mut layout = RadialLayout::new();
        layout
            .set_auto_scale(false)
            .set_radius_increment(50.0)
            .set_preserve_orientation(true);
        let bounds = Bounds::new(0.0, 0.0, 400.0, 400.0);
        layout
            .run(&mut graph, &LayoutContext::new(bounds).with_root(root))
            .unwrap();

        // re-root on a leaf; the old root becomes its only child
        let new_root = kids[2];
        let mut tree = crate::structure::Tree::breadth_first(graph, new_root).unwrap();
        let expected = position(tree.graph(), new_root).angle_to(position(tree.graph(), root));

        let graph = tree.graph_mut();
        layout
            .run(graph, &LayoutContext::new(bounds).with_root(new_root))
            .unwrap();

        let sector = layout.sector(root).unwrap();
        assert!(approx_eq!(f32, sector.mid(), expected, epsilon = 1e-4));
        // the old root now sits opposite to where the new root used to be
        let direction = Point::new(200.0, 200.0).angle_to(position(graph, root));
        assert_approx_eq!(f32, direction.sin(), expected.sin(), epsilon = 1e-4);
        assert_approx_eq!(f32, direction.cos(), expected.cos(), epsilon = 1e-4);
    }

    #[test]
    fn test_invalid_increment_rejected() {
        let (mut graph, root, _) = star(1);
        let mut layout = RadialLayout::new();
        layout.set_auto_scale(false).set_radius_increment(0.0);
        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 10.0, 10.0)).with_root(root);
        assert!(matches!(
            layout.run(&mut graph, &ctx),
            Err(LayoutError::InvalidParameter { name: "radius_increment", .. })
        ));
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;
    use trellis_core::geometry::Bounds;

    use super::*;

    fn check_angular_partition(parents: &[usize]) -> Result<(), TestCaseError> {
        let mut graph = Graph::new(false);
        let mut ids = vec![graph.add_node()];
        for (i, parent) in parents.iter().enumerate() {
            let node = graph.add_node();
            graph.add_child(ids[parent % (i + 1)], node).unwrap();
            ids.push(node);
        }

        let mut layout = RadialLayout::new();
        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 300.0, 300.0)).with_root(ids[0]);
        layout.run(&mut graph, &ctx).unwrap();

        for id in &ids {
            let children = graph.children(*id);
            if children.is_empty() {
                continue;
            }
            let parent = layout.sector(*id).unwrap();
            let sectors: Vec<Sector> = children
                .iter()
                .map(|child| layout.sector(*child).unwrap())
                .collect();

            let total: f32 = sectors.iter().map(|s| s.span()).sum();
            prop_assert!((total - parent.span()).abs() < 1e-3);
            prop_assert!((sectors[0].start() - parent.start()).abs() < 1e-3);
            for pair in sectors.windows(2) {
                prop_assert!(pair[1].start() >= pair[0].end() - 1e-3);
            }
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn children_partition_parent_sector(parents in prop::collection::vec(any::<usize>(), 0..50)) {
            check_angular_partition(&parents)?;
        }
    }
}
