//! Concrete layout engines.
//!
//! Tree engines ([`NodeLinkLayout`], [`RadialLayout`], [`SquarifiedLayout`],
//! [`BalloonLayout`]) walk the tree relation below the context root and
//! treat collapsed nodes as leaves. Graph engines ([`ForceLayout`],
//! [`CircleLayout`], [`RandomLayout`]) place every visible node and leave
//! fixed nodes where they are.

mod balloon;
mod circle;
mod force_directed;
mod node_link;
mod radial;
mod random;
mod squarified;

pub use balloon::BalloonLayout;
pub use circle::CircleLayout;
pub use force_directed::{ForceLayout, Timestep};
pub use node_link::{NodeLinkLayout, Orientation};
pub use radial::{RadialLayout, Sector};
pub use random::RandomLayout;
pub use squarified::{SizeMetric, SquarifiedLayout};

use crate::structure::{Graph, NodeId};

/// Children of `node` that take part in a tree layout.
///
/// Collapsed nodes contribute no children; invisible children are skipped.
fn layout_children(graph: &Graph, node: NodeId) -> Vec<NodeId> {
    let expanded = graph.visual(node).is_some_and(|visual| visual.is_expanded());
    if !expanded {
        return Vec::new();
    }
    graph
        .children(node)
        .iter()
        .copied()
        .filter(|child| graph.visual(*child).is_some_and(|visual| visual.is_visible()))
        .collect()
}

/// Nodes of the visible, expanded subtree below `root` in pre-order.
fn layout_pre_order(graph: &Graph, root: NodeId) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        order.push(node);
        stack.extend(layout_children(graph, node).into_iter().rev());
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapsed_and_hidden_children_are_skipped() {
        let mut graph = Graph::new(false);
        let root = graph.add_node();
        let a = graph.add_node();
        let b = graph.add_node();
        let c = graph.add_node();
        graph.add_child(root, a).unwrap();
        graph.add_child(root, b).unwrap();
        graph.add_child(a, c).unwrap();

        graph.visual_mut(b).unwrap().set_visible(false);
        assert_eq!(layout_children(&graph, root), vec![a]);
        assert_eq!(layout_pre_order(&graph, root), vec![root, a, c]);

        graph.visual_mut(a).unwrap().set_expanded(false);
        assert_eq!(layout_pre_order(&graph, root), vec![root, a]);
    }
}
