//! Rooted tree over an undirected graph.

use std::collections::{HashSet, VecDeque};

use log::debug;

use trellis_core::attribute::Attributes;

use super::graph::{EdgeId, Graph, NodeId};
use crate::error::GraphError;

/// A rooted tree: an undirected [`Graph`] whose tree relation spans every
/// node reachable from the root.
///
/// Node iteration is breadth-first from the root. Since each non-root node
/// has exactly one parent edge, `num_edges() == num_nodes() - 1` for a
/// non-empty tree.
///
/// # Examples
///
/// ```
/// use trellis::structure::Tree;
/// use trellis_core::attribute::Attributes;
///
/// let mut tree = Tree::new();
/// let root = tree.add_root(Attributes::new()).unwrap();
/// let a = tree.add_child(root, Attributes::new()).unwrap();
/// let b = tree.add_child(a, Attributes::new()).unwrap();
///
/// assert_eq!(tree.num_nodes(), 3);
/// assert_eq!(tree.num_edges(), 2);
///
/// tree.switch_root(b).unwrap();
/// assert_eq!(tree.root(), Some(b));
/// assert_eq!(tree.graph().parent(root), Some(a));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Tree {
    graph: Graph,
    root: Option<NodeId>,
}

impl Tree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tree holding a single root node.
    pub fn with_root(attributes: Attributes) -> Self {
        let mut graph = Graph::new(false);
        let root = graph.add_node_with(attributes);
        Self {
            graph,
            root: Some(root),
        }
    }

    /// Builds a breadth-first spanning tree of `graph` rooted at `root`.
    ///
    /// Any previous tree relation in the graph is discarded; the edge set is
    /// left untouched. Nodes unreachable from `root` stay in the graph but
    /// are not part of the tree.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DirectedTree`] for directed graphs and
    /// [`GraphError::NodeNotFound`] when `root` is not in the graph.
    pub fn breadth_first(mut graph: Graph, root: NodeId) -> Result<Self, GraphError> {
        if graph.is_directed() {
            return Err(GraphError::DirectedTree);
        }
        if !graph.contains(root) {
            return Err(GraphError::NodeNotFound(root));
        }

        graph.clear_tree_relation();
        let mut visited = HashSet::from([root]);
        let mut queue = VecDeque::from([root]);
        while let Some(node) = queue.pop_front() {
            for neighbor in graph.neighbors(node).to_vec() {
                if visited.insert(neighbor) {
                    graph.set_as_child(node, neighbor)?;
                    queue.push_back(neighbor);
                }
            }
        }

        debug!(root:% = root, tree_node_count = visited.len(); "Built spanning tree");
        Ok(Self {
            graph,
            root: Some(root),
        })
    }

    /// The root node, if the tree is non-empty.
    pub fn root(&self) -> Option<NodeId> {
        self.root.filter(|root| self.graph.contains(*root))
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Direct access to the backing graph.
    ///
    /// Edits made here bypass the tree bookkeeping; nodes added without a
    /// parent are not part of the tree until attached.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// Adds the root of an empty tree.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::RootExists`] when the tree already has a root.
    pub fn add_root(&mut self, attributes: Attributes) -> Result<NodeId, GraphError> {
        if let Some(root) = self.root() {
            return Err(GraphError::RootExists(root));
        }
        let root = self.graph.add_node_with(attributes);
        self.root = Some(root);
        Ok(root)
    }

    /// Creates a node and appends it to the children of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotInTree`] when `parent` is not part of the tree.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        attributes: Attributes,
    ) -> Result<NodeId, GraphError> {
        let index = self.graph.child_count(parent);
        self.add_child_at(parent, index, attributes)
    }

    /// Creates a node and inserts it at `index` among the children of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotInTree`] when `parent` is not part of the
    /// tree and [`GraphError::IndexOutOfRange`] for an invalid index.
    pub fn add_child_at(
        &mut self,
        parent: NodeId,
        index: usize,
        attributes: Attributes,
    ) -> Result<NodeId, GraphError> {
        if !self.contains(parent) {
            return Err(GraphError::NotInTree(parent));
        }
        let len = self.graph.child_count(parent);
        if index > len {
            return Err(GraphError::IndexOutOfRange {
                node: parent,
                index,
                len,
            });
        }
        let child = self.graph.add_node_with(attributes);
        if let Err(err) = self.graph.add_child_at(parent, index, child) {
            self.graph.remove_node(child)?;
            return Err(err);
        }
        Ok(child)
    }

    /// Attaches an existing graph node (with whatever subtree hangs below it)
    /// as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Fails when `parent` is not in the tree or `node` cannot become its child.
    pub fn attach(&mut self, parent: NodeId, node: NodeId) -> Result<EdgeId, GraphError> {
        if !self.contains(parent) {
            return Err(GraphError::NotInTree(parent));
        }
        self.graph.add_child(parent, node)
    }

    /// Removes `child` and its entire subtree from the tree and the graph.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotChild`] if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), GraphError> {
        if !self.contains(parent) {
            return Err(GraphError::NotInTree(parent));
        }
        let subtree: Vec<NodeId> = self.graph.pre_order(child).collect();
        self.graph.remove_child(parent, child)?;
        for node in subtree.into_iter().rev() {
            self.graph.remove_node(node)?;
        }
        Ok(())
    }

    /// Removes `node` and its subtree. Removing the root empties the tree.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotInTree`] when `node` is not part of the tree.
    pub fn remove_subtree(&mut self, node: NodeId) -> Result<(), GraphError> {
        if !self.contains(node) {
            return Err(GraphError::NotInTree(node));
        }
        match self.graph.parent(node) {
            Some(parent) => self.remove_child(parent, node),
            None => {
                let subtree: Vec<NodeId> = self.graph.pre_order(node).collect();
                for node in subtree.into_iter().rev() {
                    self.graph.remove_node(node)?;
                }
                self.root = None;
                Ok(())
            }
        }
    }

    /// Re-roots the tree at `new_root`.
    ///
    /// Walks the path from the current root down to `new_root`, flipping each
    /// parent/child relation along the way. The edge set does not change.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EmptyTree`] for an empty tree and
    /// [`GraphError::NotInTree`] when `new_root` is not part of the tree.
    pub fn switch_root(&mut self, new_root: NodeId) -> Result<(), GraphError> {
        let old_root = self.root().ok_or(GraphError::EmptyTree)?;
        if !self.contains(new_root) {
            return Err(GraphError::NotInTree(new_root));
        }
        if old_root == new_root {
            return Ok(());
        }

        let mut path = vec![new_root];
        path.extend(self.graph.ancestors(new_root));
        for pair in path.windows(2).rev() {
            let (child, parent) = (pair[0], pair[1]);
            self.graph.remove_as_child(parent, child)?;
            self.graph.set_as_child(child, parent)?;
        }

        debug!(old_root:% = old_root, new_root:% = new_root, path_len = path.len(); "Switched tree root");
        self.root = Some(new_root);
        Ok(())
    }

    /// Tree nodes in breadth-first order from the root.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.root()
            .into_iter()
            .flat_map(move |root| self.graph.breadth_first(root))
    }

    /// Parent-to-child edges, in breadth-first order of the parents.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.nodes().flat_map(move |node| {
            self.graph
                .children(node)
                .iter()
                .filter_map(move |child| self.graph.edge_between(node, *child))
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.root()
            .map_or(0, |root| 1 + self.graph.num_descendants(root))
    }

    pub fn num_edges(&self) -> usize {
        self.num_nodes().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.root().is_none()
    }

    /// Whether `node` hangs below (or is) the root.
    pub fn contains(&self, node: NodeId) -> bool {
        let Some(root) = self.root() else {
            return false;
        };
        self.graph.contains(node) && (node == root || self.graph.is_descendant_of(node, root))
    }

    /// Distance from the root, or `None` when `node` is not in the tree.
    pub fn depth(&self, node: NodeId) -> Option<usize> {
        self.contains(node).then(|| self.graph.depth(node))
    }

    /// Childless tree nodes in breadth-first order.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes()
            .filter(move |node| self.graph.child_count(*node) == 0)
    }

    /// Proper descendants of `node` in pre-order.
    pub fn descendants(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.pre_order(node).skip(1)
    }

    /// Recounts every cached descendant count from scratch.
    pub fn recompute_descendants(&mut self) {
        if let Some(root) = self.root() {
            self.graph.recount_descendants(root);
        }
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    /// Builds a random tree from a parent index list: node `i + 1` hangs below
    /// node `parents[i] % (i + 1)`.
    fn build(parents: &[usize]) -> (Tree, Vec<NodeId>) {
        let mut tree = Tree::with_root(Attributes::new());
        let mut ids = vec![tree.root().unwrap()];
        for (i, parent) in parents.iter().enumerate() {
            let parent = ids[parent % (i + 1)];
            ids.push(tree.add_child(parent, Attributes::new()).unwrap());
        }
        (tree, ids)
    }

    fn check_edge_count(parents: &[usize]) -> Result<(), TestCaseError> {
        let (tree, ids) = build(parents);
        prop_assert_eq!(tree.num_nodes(), ids.len());
        prop_assert_eq!(tree.num_edges(), ids.len() - 1);
        prop_assert_eq!(tree.edges().count(), ids.len() - 1);
        prop_assert_eq!(tree.nodes().count(), ids.len());
        Ok(())
    }

    fn check_switch_root_round_trip(parents: &[usize], pick: usize) -> Result<(), TestCaseError> {
        let (mut tree, ids) = build(parents);
        let original_root = ids[0];
        let before: Vec<(NodeId, Option<NodeId>)> = ids
            .iter()
            .map(|id| (*id, tree.graph().parent(*id)))
            .collect();

        let target = ids[pick % ids.len()];
        tree.switch_root(target).unwrap();
        prop_assert_eq!(tree.root(), Some(target));
        prop_assert_eq!(tree.num_nodes(), ids.len());
        prop_assert_eq!(tree.graph().validate(), Ok(()));

        tree.switch_root(original_root).unwrap();
        let after: Vec<(NodeId, Option<NodeId>)> = ids
            .iter()
            .map(|id| (*id, tree.graph().parent(*id)))
            .collect();
        prop_assert_eq!(before, after);
        for id in &ids {
            let expected = tree.graph().pre_order(*id).count() - 1;
            prop_assert_eq!(tree.graph().num_descendants(*id), expected);
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn tree_has_one_edge_less_than_nodes(parents in prop::collection::vec(any::<usize>(), 0..40)) {
            check_edge_count(&parents)?;
        }

        #[test]
        fn switching_root_and_back_restores_relation(
            parents in prop::collection::vec(any::<usize>(), 0..30),
            pick in any::<usize>(),
        ) {
            check_switch_root_round_trip(&parents, pick)?;
        }
    }
}
