//! Declarative action pipelines.
//!
//! An [`Action`] is one step applied to a graph within a [`LayoutContext`]:
//! a filter deciding which nodes are visible, a layout computing positions,
//! or a nested [`ActionList`]. Every [`Layout`] is an action.
//!
//! # Example
//!
//! ```
//! # use trellis::layout::{LayoutContext, RadialLayout};
//! # use trellis::pipeline::{Action, ActionList, FisheyeTreeFilter};
//! # use trellis::structure::Graph;
//! # use trellis_core::geometry::Bounds;
//! let mut graph = Graph::new(false);
//! let root = graph.add_node();
//! let child = graph.add_node();
//! graph.add_child(root, child).unwrap();
//!
//! let mut actions = ActionList::new();
//! actions
//!     .add(FisheyeTreeFilter::new(1))
//!     .add(RadialLayout::new());
//!
//! let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 100.0, 100.0)).with_root(root);
//! actions.apply(&mut graph, &ctx).unwrap();
//! ```

use log::{debug, info, warn};

use crate::{
    error::LayoutError,
    layout::{Layout, LayoutContext},
    structure::{Graph, NodeId},
};

/// A step of a pipeline.
pub trait Action {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Applies the action to `graph`.
    ///
    /// # Errors
    ///
    /// Propagates the [`LayoutError`] of the failing step.
    fn apply(&mut self, graph: &mut Graph, ctx: &LayoutContext) -> Result<(), LayoutError>;
}

impl<L: Layout + ?Sized> Action for L {
    fn name(&self) -> &'static str {
        Layout::name(self)
    }

    fn apply(&mut self, graph: &mut Graph, ctx: &LayoutContext) -> Result<(), LayoutError> {
        self.run(graph, ctx)
    }
}

/// Actions applied one after another.
///
/// The list stops at the first failing action.
#[derive(Default)]
pub struct ActionList {
    actions: Vec<Box<dyn Action + Send>>,
}

impl ActionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an action.
    pub fn add(&mut self, action: impl Action + Send + 'static) -> &mut Self {
        self.actions.push(Box::new(action));
        self
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Names of the actions in application order.
    pub fn names(&self) -> Vec<&'static str> {
        self.actions.iter().map(|action| action.name()).collect()
    }
}

impl Action for ActionList {
    fn name(&self) -> &'static str {
        "action_list"
    }

    fn apply(&mut self, graph: &mut Graph, ctx: &LayoutContext) -> Result<(), LayoutError> {
        info!(action_count = self.actions.len(); "Running action list");
        for action in &mut self.actions {
            debug!(action = action.name(); "Applying action");
            action.apply(graph, ctx)?;
        }
        Ok(())
    }
}

/// Shows the neighborhood of focus nodes in a tree.
///
/// Focus nodes and their ancestors form the focus path and are always shown
/// and expanded. Every other node is shown when it lies at most `distance`
/// levels below the focus path. The degree of interest of each node is set
/// to minus that distance. Without focus nodes the root is the focus.
#[derive(Debug, Clone)]
pub struct FisheyeTreeFilter {
    distance: usize,
    focus: Vec<NodeId>,
}

impl FisheyeTreeFilter {
    pub fn new(distance: usize) -> Self {
        Self {
            distance,
            focus: Vec::new(),
        }
    }

    pub fn with_focus(mut self, focus: impl IntoIterator<Item = NodeId>) -> Self {
        self.focus = focus.into_iter().collect();
        self
    }

    pub fn set_focus(&mut self, focus: impl IntoIterator<Item = NodeId>) -> &mut Self {
        self.focus = focus.into_iter().collect();
        self
    }

    pub fn focus(&self) -> &[NodeId] {
        &self.focus
    }

    pub fn distance(&self) -> usize {
        self.distance
    }
}

impl Action for FisheyeTreeFilter {
    fn name(&self) -> &'static str {
        "fisheye"
    }

    fn apply(&mut self, graph: &mut Graph, ctx: &LayoutContext) -> Result<(), LayoutError> {
        let root = ctx.require_root("fisheye", graph)?;

        let mut on_path = std::collections::HashSet::from([root]);
        for focus in &self.focus {
            if *focus != root && !graph.is_descendant_of(*focus, root) {
                warn!(focus:% = focus, root:% = root; "Focus node outside the tree, ignored");
                continue;
            }
            on_path.insert(*focus);
            on_path.extend(graph.ancestors(*focus).take_while(|node| *node != root));
        }

        // pre-order visits parents first, so parent distances are known
        let order: Vec<NodeId> = graph.pre_order(root).collect();
        let mut distances = std::collections::HashMap::with_capacity(order.len());
        for node in &order {
            let distance = if on_path.contains(node) {
                0
            } else {
                graph
                    .parent(*node)
                    .and_then(|parent| distances.get(&parent))
                    .map_or(0, |d: &usize| d + 1)
            };
            distances.insert(*node, distance);
        }

        let mut shown = 0;
        for node in order {
            let distance = distances.get(&node).copied().unwrap_or_default();
            let visible = distance <= self.distance;
            let expanded = on_path.contains(&node) || distance < self.distance;
            if let Some(visual) = graph.visual_mut(node) {
                visual.set_visible(visible);
                visual.set_expanded(expanded);
                visual.set_doi(-(distance as f32));
            }
            shown += usize::from(visible);
        }
        debug!(
            root:% = root,
            focus_count = self.focus.len(),
            visible = shown;
            "Fisheye filter applied"
        );
        Ok(())
    }
}

/// Shows the tree down to a fixed depth below the root.
#[derive(Debug, Clone, Copy)]
pub struct DepthFilter {
    max_depth: usize,
}

impl DepthFilter {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Action for DepthFilter {
    fn name(&self) -> &'static str {
        "depth"
    }

    fn apply(&mut self, graph: &mut Graph, ctx: &LayoutContext) -> Result<(), LayoutError> {
        let root = ctx.require_root("depth", graph)?;
        let mut stack = vec![(root, 0_usize)];
        while let Some((node, depth)) = stack.pop() {
            if let Some(visual) = graph.visual_mut(node) {
                visual.set_visible(depth <= self.max_depth);
                visual.set_expanded(depth < self.max_depth);
                visual.set_doi(-(depth as f32));
            }
            stack.extend(graph.children(node).iter().map(|child| (*child, depth + 1)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::geometry::{Bounds, Point};

    use super::*;
    use crate::layout::{CircleLayout, NodeLinkLayout};

    /// root -> a -> (a1 -> a11), root -> b
    fn sample() -> (Graph, [NodeId; 5]) {
        let mut graph = Graph::new(false);
        let ids = [(); 5].map(|_| graph.add_node());
        let [root, a, b, a1, a11] = ids;
        graph.add_child(root, a).unwrap();
        graph.add_child(root, b).unwrap();
        graph.add_child(a, a1).unwrap();
        graph.add_child(a1, a11).unwrap();
        (graph, ids)
    }

    fn visible(graph: &Graph, node: NodeId) -> bool {
        graph.visual(node).unwrap().is_visible()
    }

    #[test]
    fn test_fisheye_around_root() {
        let (mut graph, [root, a, b, a1, a11]) = sample();
        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 10.0, 10.0)).with_root(root);
        FisheyeTreeFilter::new(1).apply(&mut graph, &ctx).unwrap();

        assert!(visible(&graph, root) && visible(&graph, a) && visible(&graph, b));
        assert!(!visible(&graph, a1) && !visible(&graph, a11));
        assert!(!graph.visual(a).unwrap().is_expanded());
        assert_eq!(graph.visual(a1).unwrap().doi(), -2.0);
    }

    #[test]
    fn test_fisheye_follows_focus_path() {
        let (mut graph, [root, a, b, a1, a11]) = sample();
        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 10.0, 10.0)).with_root(root);
        FisheyeTreeFilter::new(0)
            .with_focus([a1])
            .apply(&mut graph, &ctx)
            .unwrap();

        for node in [root, a, a1] {
            assert!(visible(&graph, node));
            assert!(graph.visual(node).unwrap().is_expanded());
            assert_eq!(graph.visual(node).unwrap().doi(), 0.0);
        }
        assert!(!visible(&graph, b));
        assert!(!visible(&graph, a11));
    }

    #[test]
    fn test_fisheye_ignores_foreign_focus() {
        let (mut graph, [root, ..]) = sample();
        let stray = graph.add_node();
        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 10.0, 10.0)).with_root(root);
        FisheyeTreeFilter::new(1)
            .with_focus([stray])
            .apply(&mut graph, &ctx)
            .unwrap();
        assert!(visible(&graph, root));
    }

    #[test]
    fn test_depth_filter() {
        let (mut graph, [root, a, b, a1, a11]) = sample();
        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 10.0, 10.0)).with_root(root);
        DepthFilter::new(2).apply(&mut graph, &ctx).unwrap();

        for node in [root, a, b, a1] {
            assert!(visible(&graph, node));
        }
        assert!(!visible(&graph, a11));
        assert!(!graph.visual(a1).unwrap().is_expanded());
    }

    #[test]
    fn test_action_list_runs_in_order() {
        let (mut graph, [root, a, b, a1, a11]) = sample();
        let mut actions = ActionList::new();
        actions
            .add(DepthFilter::new(1))
            .add(NodeLinkLayout::new());
        assert_eq!(actions.names(), vec!["depth", "node_link"]);

        graph.visual_mut(a1).unwrap().set_position(Point::new(-5.0, -5.0));
        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 200.0, 100.0)).with_root(root);
        actions.apply(&mut graph, &ctx).unwrap();

        // filtered nodes are not laid out
        assert_eq!(graph.visual(a1).unwrap().position(), Point::new(-5.0, -5.0));
        assert!(!visible(&graph, a11));
        assert_eq!(graph.visual(a).unwrap().position().x(), 100.0);
        assert_eq!(graph.visual(b).unwrap().position().x(), 100.0);
    }

    #[test]
    fn test_action_list_stops_on_error() {
        let (mut graph, [_, a, ..]) = sample();
        graph.visual_mut(a).unwrap().set_position(Point::new(-1.0, -1.0));

        let mut actions = ActionList::new();
        actions.add(DepthFilter::new(1)).add(CircleLayout::new());
        // no root: the filter fails before the circle layout moves anything
        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(
            actions.apply(&mut graph, &ctx),
            Err(LayoutError::MissingRoot("depth"))
        );
        assert_eq!(graph.visual(a).unwrap().position(), Point::new(-1.0, -1.0));
    }
}
