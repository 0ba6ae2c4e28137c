//! Parent/child relation layered over the graph's adjacency.
//!
//! The children of a node are always a subsequence of its neighbors, in the
//! same relative order. Operations come in two flavors: `add_child` and
//! `remove_child` also create or delete the connecting edge, while
//! `set_as_child` and `remove_as_child` only change the relation and leave
//! the edge set untouched.
//!
//! Every change to a child list walks the ancestor chain once with a signed
//! delta of `1 + descendants(child)`, so descendant counts stay exact without
//! a full recount.

use std::collections::VecDeque;

use super::graph::{Edge, EdgeId, Graph, NodeId};
use crate::error::GraphError;

impl Graph {
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|node| node.parent)
    }

    /// Ordered children of `node`, empty when the node is unknown.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map(|node| node.children()).unwrap_or_default()
    }

    pub fn child_count(&self, node: NodeId) -> usize {
        self.children(node).len()
    }

    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|c| *c == child)
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).first().copied()
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).last().copied()
    }

    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.child_index(parent, node)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.child_index(parent, node)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Cached number of proper descendants of `node`.
    pub fn num_descendants(&self, node: NodeId) -> usize {
        self.node(node).map_or(0, |node| node.num_descendants)
    }

    /// Number of parent hops from `node` to the root of its tree.
    pub fn depth(&self, node: NodeId) -> usize {
        self.ancestors(node).count()
    }

    /// Ancestors of `node`, nearest first.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), move |n| self.parent(*n))
    }

    pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(node).any(|n| n == ancestor)
    }

    /// Appends `child` to the children of `parent`, creating the connecting edge.
    ///
    /// # Errors
    ///
    /// See [`Graph::add_child_at`].
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<EdgeId, GraphError> {
        let index = self.node_ref(parent)?.children.len();
        self.add_child_at(parent, index, child)
    }

    /// Inserts `child` at `index` among the children of `parent`, creating the
    /// connecting edge.
    ///
    /// # Errors
    ///
    /// Fails without modifying the graph when `child` is already a child or a
    /// neighbor of `parent`, already has a parent, is an ancestor of
    /// `parent`, or when `index` exceeds the child count.
    pub fn add_child_at(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<EdgeId, GraphError> {
        let parent_node = self.node_ref(parent)?;
        if parent_node.children.contains(&child) {
            return Err(GraphError::AlreadyChild { parent, child });
        }
        if self.edge_between(parent, child).is_some() {
            return Err(GraphError::AlreadyNeighbor {
                node: parent,
                neighbor: child,
            });
        }
        let edge = Edge::new(parent, child, self.is_directed());
        self.check_new_edge(&edge)?;
        self.check_attachable(parent, index, child)?;

        let position = self
            .children(parent)
            .get(index)
            .and_then(|next| self.neighbors(parent).iter().position(|n| n == next));
        let edge = self.insert_edge(edge, position);
        self.link_child(parent, index, child);
        Ok(edge)
    }

    /// Makes the existing neighbor `child` a child of `parent`.
    ///
    /// The child takes the position implied by its place in the neighbor
    /// list, so neither list is reordered.
    ///
    /// # Errors
    ///
    /// See [`Graph::set_as_child_at`].
    pub fn set_as_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), GraphError> {
        let index = self.natural_child_index(parent, child)?;
        self.set_as_child_at(parent, index, child)
    }

    /// Makes the existing neighbor `child` the `index`-th child of `parent`.
    ///
    /// When the requested index disagrees with the neighbor order, the
    /// neighbor entry (and its parallel edge entry) is moved so that the
    /// children stay a subsequence of the neighbors.
    ///
    /// # Errors
    ///
    /// Fails without modifying the graph when `child` is not a neighbor of
    /// `parent`, is already its child, already has a parent, is an ancestor
    /// of `parent`, or when `index` exceeds the child count.
    pub fn set_as_child_at(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), GraphError> {
        let natural = self.natural_child_index(parent, child)?;
        if self.node_ref(parent)?.children.contains(&child) {
            return Err(GraphError::AlreadyChild { parent, child });
        }
        self.check_attachable(parent, index, child)?;

        if natural != index {
            let node = self.node_mut(parent)?;
            if let Some(from) = node.neighbors.iter().position(|n| *n == child) {
                let neighbor = node.neighbors.remove(from);
                let edge = node.edges.remove(from);
                let to = match node.children.get(index) {
                    Some(next) => node.neighbors.iter().position(|n| n == next),
                    None => node
                        .children
                        .last()
                        .and_then(|last| node.neighbors.iter().position(|n| n == last))
                        .map(|p| p + 1),
                }
                .unwrap_or(from);
                node.neighbors.insert(to, neighbor);
                node.edges.insert(to, edge);
            }
        }

        self.link_child(parent, index, child);
        Ok(())
    }

    /// Removes `child` from the children of `parent` and deletes the connecting edge.
    ///
    /// The detached subtree stays in the graph.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotChild`] if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<Edge, GraphError> {
        self.remove_as_child(parent, child)?;
        self.remove_edge_between(parent, child)
    }

    /// Drops the parent/child relation between `parent` and `child`, keeping the edge.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotChild`] if `child` is not a child of `parent`.
    pub fn remove_as_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), GraphError> {
        let node = self.node_mut(parent)?;
        let index = node
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or(GraphError::NotChild { parent, child })?;
        node.children.remove(index);

        let child_node = self.node_mut(child)?;
        child_node.parent = None;
        let delta = 1 + child_node.num_descendants;
        self.propagate_descendants(parent, -(delta as isize));
        self.debug_check(&[parent, child]);
        Ok(())
    }

    /// Removes every child of `parent` together with the connecting edges.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if `parent` is not in the graph.
    pub fn remove_all_children(&mut self, parent: NodeId) -> Result<(), GraphError> {
        for child in self.node_ref(parent)?.children.clone() {
            self.remove_child(parent, child)?;
        }
        Ok(())
    }

    /// Drops every parent/child relation below `parent`, keeping the edges.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if `parent` is not in the graph.
    pub fn remove_all_as_children(&mut self, parent: NodeId) -> Result<(), GraphError> {
        for child in self.node_ref(parent)?.children.clone() {
            self.remove_as_child(parent, child)?;
        }
        Ok(())
    }

    /// Forgets the whole tree relation. Edges are untouched.
    pub fn clear_tree_relation(&mut self) {
        for node in self.nodes.values_mut() {
            node.parent = None;
            node.children.clear();
            node.num_descendants = 0;
        }
    }

    /// Breadth-first walk over the tree relation starting at `root`.
    pub fn breadth_first(&self, root: NodeId) -> BreadthFirst<'_> {
        let mut queue = VecDeque::new();
        if self.contains(root) {
            queue.push_back(root);
        }
        BreadthFirst { graph: self, queue }
    }

    /// Pre-order walk over the tree relation starting at `root`.
    pub fn pre_order(&self, root: NodeId) -> PreOrder<'_> {
        let stack = if self.contains(root) { vec![root] } else { vec![] };
        PreOrder { graph: self, stack }
    }

    /// Recounts the descendants below `root` from scratch.
    pub fn recount_descendants(&mut self, root: NodeId) {
        let order: Vec<NodeId> = self.pre_order(root).collect();
        for node in order.into_iter().rev() {
            let total = self
                .children(node)
                .iter()
                .map(|c| 1 + self.num_descendants(*c))
                .sum();
            if let Some(record) = self.nodes.get_mut(&node) {
                record.num_descendants = total;
            }
        }
    }

    fn natural_child_index(&self, parent: NodeId, child: NodeId) -> Result<usize, GraphError> {
        let node = self.node_ref(parent)?;
        self.node_ref(child)?;
        let position = node
            .neighbors
            .iter()
            .position(|n| *n == child)
            .ok_or(GraphError::NotNeighbor {
                node: parent,
                neighbor: child,
            })?;
        Ok(node.neighbors[..position]
            .iter()
            .filter(|n| self.parent(**n) == Some(parent))
            .count())
    }

    fn check_attachable(
        &self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), GraphError> {
        if parent == child {
            return Err(GraphError::SelfLoop(parent));
        }
        if let Some(existing) = self.node_ref(child)?.parent {
            return Err(GraphError::HasParent {
                parent: existing,
                child,
            });
        }
        if self.is_descendant_of(parent, child) {
            return Err(GraphError::WouldCycle { parent, child });
        }
        let len = self.node_ref(parent)?.children.len();
        if index > len {
            return Err(GraphError::IndexOutOfRange {
                node: parent,
                index,
                len,
            });
        }
        Ok(())
    }

    fn link_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        let Some(child_node) = self.nodes.get_mut(&child) else {
            return;
        };
        child_node.parent = Some(parent);
        let delta = 1 + child_node.num_descendants;
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.insert(index, child);
        }
        self.propagate_descendants(parent, delta as isize);
        self.debug_check(&[parent, child]);
    }

    fn propagate_descendants(&mut self, start: NodeId, delta: isize) {
        let mut current = Some(start);
        while let Some(id) = current {
            let Some(node) = self.nodes.get_mut(&id) else {
                break;
            };
            node.num_descendants = node.num_descendants.saturating_add_signed(delta);
            current = node.parent;
        }
    }
}

/// Iterator returned by [`Graph::breadth_first`].
#[derive(Debug)]
pub struct BreadthFirst<'a> {
    graph: &'a Graph,
    queue: VecDeque<NodeId>,
}

impl Iterator for BreadthFirst<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.queue.pop_front()?;
        self.queue.extend(self.graph.children(node).iter().copied());
        Some(node)
    }
}

/// Iterator returned by [`Graph::pre_order`].
#[derive(Debug)]
pub struct PreOrder<'a> {
    graph: &'a Graph,
    stack: Vec<NodeId>,
}

impl Iterator for PreOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.graph.children(node).iter().rev().copied());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(graph: &mut Graph, count: usize) -> Vec<NodeId> {
        (0..count).map(|_| graph.add_node()).collect()
    }

    #[test]
    fn test_add_child_creates_edge_and_counts() {
        let mut graph = Graph::new(false);
        let n = nodes(&mut graph, 4);

        graph.add_child(n[0], n[1]).unwrap();
        graph.add_child(n[1], n[2]).unwrap();
        graph.add_child(n[0], n[3]).unwrap();

        assert_eq!(graph.num_edges(), 3);
        assert_eq!(graph.num_descendants(n[0]), 3);
        assert_eq!(graph.num_descendants(n[1]), 1);
        assert_eq!(graph.children(n[0]), &[n[1], n[3]]);
        assert_eq!(graph.depth(n[2]), 2);
        assert!(graph.is_descendant_of(n[2], n[0]));
        graph.validate().unwrap();
    }

    #[test]
    fn test_add_child_rejects_neighbor_and_child() {
        let mut graph = Graph::new(false);
        let n = nodes(&mut graph, 3);
        graph.add_child(n[0], n[1]).unwrap();
        graph.add_edge(n[0], n[2]).unwrap();

        assert_eq!(
            graph.add_child(n[0], n[1]),
            Err(GraphError::AlreadyChild {
                parent: n[0],
                child: n[1]
            })
        );
        assert_eq!(
            graph.add_child(n[0], n[2]),
            Err(GraphError::AlreadyNeighbor {
                node: n[0],
                neighbor: n[2]
            })
        );
        assert_eq!(graph.num_edges(), 2);
    }

    #[test]
    fn test_add_child_rejects_cycles() {
        let mut graph = Graph::new(false);
        let n = nodes(&mut graph, 3);
        graph.add_child(n[0], n[1]).unwrap();
        graph.add_child(n[1], n[2]).unwrap();

        assert_eq!(
            graph.add_child(n[2], n[0]),
            Err(GraphError::WouldCycle {
                parent: n[2],
                child: n[0]
            })
        );
        assert_eq!(graph.num_edges(), 2);
        graph.validate().unwrap();
    }

    #[test]
    fn test_add_child_at_keeps_neighbor_order() {
        let mut graph = Graph::new(false);
        let n = nodes(&mut graph, 4);
        graph.add_child(n[0], n[1]).unwrap();
        graph.add_child(n[0], n[2]).unwrap();
        graph.add_child_at(n[0], 1, n[3]).unwrap();

        assert_eq!(graph.children(n[0]), &[n[1], n[3], n[2]]);
        assert_eq!(graph.neighbors(n[0]), &[n[1], n[3], n[2]]);
        let extra = graph.add_node();
        assert_eq!(
            graph.add_child_at(n[0], 9, extra),
            Err(GraphError::IndexOutOfRange {
                node: n[0],
                index: 9,
                len: 3
            })
        );
    }

    #[test]
    fn test_set_as_child_requires_neighbor() {
        let mut graph = Graph::new(false);
        let n = nodes(&mut graph, 3);
        graph.add_edge(n[0], n[1]).unwrap();

        graph.set_as_child(n[0], n[1]).unwrap();
        assert_eq!(graph.parent(n[1]), Some(n[0]));
        assert_eq!(graph.num_edges(), 1);

        assert_eq!(
            graph.set_as_child(n[0], n[2]),
            Err(GraphError::NotNeighbor {
                node: n[0],
                neighbor: n[2]
            })
        );
    }

    #[test]
    fn test_set_as_child_at_reorders_neighbors() {
        let mut graph = Graph::new(false);
        let n = nodes(&mut graph, 4);
        for child in &n[1..] {
            graph.add_edge(n[0], *child).unwrap();
        }
        graph.set_as_child(n[0], n[1]).unwrap();
        graph.set_as_child(n[0], n[2]).unwrap();
        graph.set_as_child_at(n[0], 0, n[3]).unwrap();

        assert_eq!(graph.children(n[0]), &[n[3], n[1], n[2]]);
        assert_eq!(graph.neighbors(n[0]), &[n[3], n[1], n[2]]);
        graph.validate().unwrap();
    }

    #[test]
    fn test_remove_as_child_keeps_edge() {
        let mut graph = Graph::new(false);
        let n = nodes(&mut graph, 3);
        graph.add_child(n[0], n[1]).unwrap();
        graph.add_child(n[1], n[2]).unwrap();

        graph.remove_as_child(n[0], n[1]).unwrap();
        assert_eq!(graph.num_edges(), 2);
        assert_eq!(graph.num_descendants(n[0]), 0);
        assert_eq!(graph.num_descendants(n[1]), 1);
        assert_eq!(graph.parent(n[1]), None);
        assert_eq!(
            graph.remove_as_child(n[0], n[1]),
            Err(GraphError::NotChild {
                parent: n[0],
                child: n[1]
            })
        );
    }

    #[test]
    fn test_remove_child_deletes_edge() {
        let mut graph = Graph::new(false);
        let n = nodes(&mut graph, 3);
        graph.add_child(n[0], n[1]).unwrap();
        graph.add_child(n[0], n[2]).unwrap();

        graph.remove_child(n[0], n[1]).unwrap();
        assert_eq!(graph.num_edges(), 1);
        assert!(graph.contains(n[1]));
        assert_eq!(graph.children(n[0]), &[n[2]]);

        graph.remove_all_children(n[0]).unwrap();
        assert_eq!(graph.num_edges(), 0);
        assert_eq!(graph.num_descendants(n[0]), 0);
    }

    #[test]
    fn test_siblings() {
        let mut graph = Graph::new(false);
        let n = nodes(&mut graph, 4);
        for child in &n[1..] {
            graph.add_child(n[0], *child).unwrap();
        }

        assert_eq!(graph.first_child(n[0]), Some(n[1]));
        assert_eq!(graph.last_child(n[0]), Some(n[3]));
        assert_eq!(graph.next_sibling(n[1]), Some(n[2]));
        assert_eq!(graph.previous_sibling(n[1]), None);
        assert_eq!(graph.previous_sibling(n[3]), Some(n[2]));
        assert_eq!(graph.child_index(n[0], n[2]), Some(1));
    }

    #[test]
    fn test_remove_node_detaches_subtree() {
        let mut graph = Graph::new(false);
        let n = nodes(&mut graph, 4);
        graph.add_child(n[0], n[1]).unwrap();
        graph.add_child(n[1], n[2]).unwrap();
        graph.add_child(n[1], n[3]).unwrap();

        graph.remove_node(n[1]).unwrap();
        assert_eq!(graph.num_descendants(n[0]), 0);
        assert_eq!(graph.parent(n[2]), None);
        assert_eq!(graph.num_edges(), 0);
        graph.validate().unwrap();
    }

    #[test]
    fn test_removing_tree_edge_drops_relation() {
        let mut graph = Graph::new(false);
        let n = nodes(&mut graph, 2);
        let edge = graph.add_child(n[0], n[1]).unwrap();

        graph.remove_edge(edge).unwrap();
        assert_eq!(graph.parent(n[1]), None);
        assert_eq!(graph.num_descendants(n[0]), 0);
    }

    #[test]
    fn test_traversals() {
        let mut graph = Graph::new(false);
        let n = nodes(&mut graph, 5);
        graph.add_child(n[0], n[1]).unwrap();
        graph.add_child(n[0], n[2]).unwrap();
        graph.add_child(n[1], n[3]).unwrap();
        graph.add_child(n[2], n[4]).unwrap();

        let bfs: Vec<NodeId> = graph.breadth_first(n[0]).collect();
        assert_eq!(bfs, vec![n[0], n[1], n[2], n[3], n[4]]);
        let pre: Vec<NodeId> = graph.pre_order(n[0]).collect();
        assert_eq!(pre, vec![n[0], n[1], n[3], n[2], n[4]]);
    }

    #[test]
    fn test_recount_matches_incremental() {
        let mut graph = Graph::new(false);
        let n = nodes(&mut graph, 4);
        graph.add_child(n[0], n[1]).unwrap();
        graph.add_child(n[1], n[2]).unwrap();
        graph.add_child(n[0], n[3]).unwrap();

        let before: Vec<usize> = n.iter().map(|id| graph.num_descendants(*id)).collect();
        graph.recount_descendants(n[0]);
        let after: Vec<usize> = n.iter().map(|id| graph.num_descendants(*id)).collect();
        assert_eq!(before, after);
    }
}
