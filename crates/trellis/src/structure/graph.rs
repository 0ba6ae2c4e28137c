//! Arena graph storage.
//!
//! Nodes and edges live in insertion-ordered maps keyed by stable,
//! never-reused indices. Each node keeps its incident edges in a list that
//! runs parallel to its neighbor list, so `edges()[i]` always connects the
//! node to `neighbors()[i]`. Directed graphs additionally record in-links so
//! that removing a node can clean up the inverse references held by the
//! nodes pointing at it.
//!
//! The same node record stores the tree relation (parent, ordered children,
//! cached descendant count); the operations on it live in the `hierarchy`
//! module.

use std::fmt;

use indexmap::IndexMap;
use log::trace;

use trellis_core::attribute::Attributes;

use super::visual::Visual;
use crate::error::GraphError;

/// Stable node key. Indices are never reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Stable edge key. Indices are never reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(usize);

impl EdgeId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// An edge between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    source: NodeId,
    target: NodeId,
    directed: bool,
    attributes: Attributes,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId, directed: bool) -> Self {
        Self {
            source,
            target,
            directed,
            attributes: Attributes::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Returns the endpoint opposite to `node`, if `node` is an endpoint.
    pub fn adjacent(&self, node: NodeId) -> Option<NodeId> {
        if node == self.source {
            Some(self.target)
        } else if node == self.target {
            Some(self.source)
        } else {
            None
        }
    }
}

/// Node record: attributes, adjacency, tree relation and visual state.
#[derive(Debug, Clone, Default)]
pub struct Node {
    attributes: Attributes,
    visual: Visual,
    pub(super) edges: Vec<EdgeId>,
    pub(super) neighbors: Vec<NodeId>,
    pub(super) in_links: Vec<NodeId>,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
    pub(super) num_descendants: usize,
}

impl Node {
    fn with_attributes(attributes: Attributes) -> Self {
        Self {
            attributes,
            ..Self::default()
        }
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn visual(&self) -> &Visual {
        &self.visual
    }

    /// Incident edges, parallel to [`Node::neighbors`].
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Adjacent nodes. For directed graphs these are the out-neighbors.
    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    /// Nodes with a directed edge pointing at this node.
    pub fn in_links(&self) -> &[NodeId] {
        &self.in_links
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn num_descendants(&self) -> usize {
        self.num_descendants
    }

    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Mutable graph with stable node and edge keys.
///
/// At most one edge connects any pair of nodes, in either direction, and
/// self-loops are rejected. Every edge shares the directedness of the graph.
///
/// # Examples
///
/// ```
/// use trellis::structure::Graph;
///
/// let mut graph = Graph::new(false);
/// let a = graph.add_node();
/// let b = graph.add_node();
///
/// graph.add_edge(a, b).unwrap();
/// assert!(graph.add_edge(b, a).is_err());
/// assert_eq!(graph.num_edges(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Graph {
    directed: bool,
    pub(super) nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
    next_node: usize,
    next_edge: usize,
}

impl Graph {
    /// Creates an empty graph. Directedness is fixed for the lifetime of the graph.
    pub fn new(directed: bool) -> Self {
        Self {
            directed,
            ..Self::default()
        }
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        self.edges.contains_key(&edge)
    }

    /// Node ids in insertion order. Calling again restarts the iteration.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Edge ids in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.keys().copied()
    }

    pub fn node(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(&node)
    }

    pub fn edge(&self, edge: EdgeId) -> Option<&Edge> {
        self.edges.get(&edge)
    }

    pub fn edge_mut(&mut self, edge: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(&edge)
    }

    pub(super) fn node_ref(&self, node: NodeId) -> Result<&Node, GraphError> {
        self.nodes.get(&node).ok_or(GraphError::NodeNotFound(node))
    }

    pub(super) fn node_mut(&mut self, node: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes
            .get_mut(&node)
            .ok_or(GraphError::NodeNotFound(node))
    }

    pub fn attributes(&self, node: NodeId) -> Option<&Attributes> {
        self.node(node).map(Node::attributes)
    }

    pub fn attributes_mut(&mut self, node: NodeId) -> Option<&mut Attributes> {
        self.nodes.get_mut(&node).map(|node| &mut node.attributes)
    }

    pub fn visual(&self, node: NodeId) -> Option<&Visual> {
        self.node(node).map(Node::visual)
    }

    pub fn visual_mut(&mut self, node: NodeId) -> Option<&mut Visual> {
        self.nodes.get_mut(&node).map(|node| &mut node.visual)
    }

    /// Neighbors of `node`, empty when the node is unknown.
    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map(Node::neighbors).unwrap_or_default()
    }

    /// Incident edges of `node`, parallel to [`Graph::neighbors`].
    pub fn incident_edges(&self, node: NodeId) -> &[EdgeId] {
        self.node(node).map(Node::edges).unwrap_or_default()
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.neighbors(node).len()
    }

    /// Adds an isolated node with no attributes.
    pub fn add_node(&mut self) -> NodeId {
        self.add_node_with(Attributes::new())
    }

    /// Adds an isolated node carrying `attributes`.
    pub fn add_node_with(&mut self, attributes: Attributes) -> NodeId {
        let id = NodeId::new(self.next_node);
        self.next_node += 1;
        self.nodes.insert(id, Node::with_attributes(attributes));
        trace!(node:% = id; "Added node");
        id
    }

    /// Removes `node`, its incident edges and every reference other nodes hold to it.
    ///
    /// The tree relation is repaired first: the node is detached from its
    /// parent and its children become roots of their own subtrees.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node is not in the graph.
    pub fn remove_node(&mut self, node: NodeId) -> Result<Attributes, GraphError> {
        let record = self.node_ref(node)?;
        let parent = record.parent;
        let children = record.children.clone();

        if let Some(parent) = parent {
            self.remove_as_child(parent, node)?;
        }
        for child in children {
            self.remove_as_child(node, child)?;
        }

        let record = self.node_ref(node)?;
        let mut incident: Vec<EdgeId> = record.edges.clone();
        for source in record.in_links.clone() {
            if let Some(edge) = self.edge_between(source, node) {
                incident.push(edge);
            }
        }
        for edge in incident {
            self.unlink_edge(edge);
        }

        let record = self
            .nodes
            .shift_remove(&node)
            .ok_or(GraphError::NodeNotFound(node))?;
        trace!(node:% = node; "Removed node");
        Ok(record.attributes)
    }

    /// Connects `source` and `target` with an edge matching the graph's directedness.
    ///
    /// # Errors
    ///
    /// Fails with [`GraphError::NodeNotFound`], [`GraphError::SelfLoop`] or
    /// [`GraphError::DuplicateEdge`]; the graph is left unchanged.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId) -> Result<EdgeId, GraphError> {
        self.add_edge_with(Edge::new(source, target, self.directed))
    }

    /// Inserts a prepared edge.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`Graph::add_edge`], fails with
    /// [`GraphError::DirectednessMismatch`] when the edge's directedness
    /// differs from the graph's.
    pub fn add_edge_with(&mut self, edge: Edge) -> Result<EdgeId, GraphError> {
        self.check_new_edge(&edge)?;
        Ok(self.insert_edge(edge, None))
    }

    pub(super) fn check_new_edge(&self, edge: &Edge) -> Result<(), GraphError> {
        if edge.directed != self.directed {
            return Err(GraphError::DirectednessMismatch {
                graph: self.directed,
                edge: edge.directed,
            });
        }
        self.node_ref(edge.source)?;
        self.node_ref(edge.target)?;
        if edge.source == edge.target {
            return Err(GraphError::SelfLoop(edge.source));
        }
        if self.edge_between(edge.source, edge.target).is_some() {
            return Err(GraphError::DuplicateEdge {
                from: edge.source,
                to: edge.target,
            });
        }
        Ok(())
    }

    /// Inserts an already validated edge. `source_position` places the new
    /// entry in the source's neighbor list; `None` appends.
    pub(super) fn insert_edge(&mut self, edge: Edge, source_position: Option<usize>) -> EdgeId {
        let id = EdgeId::new(self.next_edge);
        self.next_edge += 1;

        let (source, target) = (edge.source, edge.target);
        if let Some(record) = self.nodes.get_mut(&source) {
            let position = source_position
                .unwrap_or(record.neighbors.len())
                .min(record.neighbors.len());
            record.neighbors.insert(position, target);
            record.edges.insert(position, id);
        }
        if let Some(record) = self.nodes.get_mut(&target) {
            if self.directed {
                record.in_links.push(source);
            } else {
                record.neighbors.push(source);
                record.edges.push(id);
            }
        }

        self.edges.insert(id, edge);
        trace!(edge:% = id, source:% = source, target:% = target; "Added edge");
        id
    }

    /// Removes `edge`, dropping any parent/child relation it carried.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EdgeNotFound`] if the edge is not in the graph.
    pub fn remove_edge(&mut self, edge: EdgeId) -> Result<Edge, GraphError> {
        let (source, target) = {
            let record = self.edges.get(&edge).ok_or(GraphError::EdgeNotFound(edge))?;
            (record.source, record.target)
        };

        if self.parent(target) == Some(source) {
            self.remove_as_child(source, target)?;
        } else if self.parent(source) == Some(target) {
            self.remove_as_child(target, source)?;
        }

        self.unlink_edge(edge).ok_or(GraphError::EdgeNotFound(edge))
    }

    /// Removes the edge connecting `a` and `b`, in either direction.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotNeighbor`] when no such edge exists.
    pub fn remove_edge_between(&mut self, a: NodeId, b: NodeId) -> Result<Edge, GraphError> {
        let edge = self
            .edge_between(a, b)
            .ok_or(GraphError::NotNeighbor { node: a, neighbor: b })?;
        self.remove_edge(edge)
    }

    /// Detaches the edge from both endpoints without touching the tree relation.
    fn unlink_edge(&mut self, edge: EdgeId) -> Option<Edge> {
        let record = self.edges.shift_remove(&edge)?;
        let directed = self.directed;

        if let Some(source) = self.nodes.get_mut(&record.source)
            && let Some(position) = source.edges.iter().position(|e| *e == edge)
        {
            source.edges.remove(position);
            source.neighbors.remove(position);
        }
        if let Some(target) = self.nodes.get_mut(&record.target) {
            if directed {
                target.in_links.retain(|n| *n != record.source);
            } else if let Some(position) = target.edges.iter().position(|e| *e == edge) {
                target.edges.remove(position);
                target.neighbors.remove(position);
            }
        }

        trace!(edge:% = edge; "Removed edge");
        Some(record)
    }

    /// Returns the edge connecting `a` and `b` in either direction.
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        let lookup = |from: NodeId, to: NodeId| {
            let node = self.nodes.get(&from)?;
            let position = node.neighbors.iter().position(|n| *n == to)?;
            node.edges.get(position).copied()
        };
        lookup(a, b).or_else(|| lookup(b, a))
    }

    /// Whether `neighbor` appears in the neighbor list of `node`.
    pub fn is_neighbor(&self, node: NodeId, neighbor: NodeId) -> bool {
        self.neighbors(node).contains(&neighbor)
    }

    /// Validates adjacency and tree-relation invariants for every node.
    ///
    /// Used by debug builds after each structural mutation and by tests.
    pub fn validate(&self) -> Result<(), String> {
        for id in self.nodes() {
            self.validate_node(id)?;
        }
        Ok(())
    }

    pub(super) fn validate_node(&self, id: NodeId) -> Result<(), String> {
        let node = self
            .nodes
            .get(&id)
            .ok_or_else(|| format!("{id} missing"))?;

        if node.edges.len() != node.neighbors.len() {
            return Err(format!("{id}: edge and neighbor lists differ in length"));
        }
        for (edge, neighbor) in node.edges.iter().zip(&node.neighbors) {
            let record = self
                .edges
                .get(edge)
                .ok_or_else(|| format!("{id}: dangling edge {edge}"))?;
            if record.adjacent(id) != Some(*neighbor) {
                return Err(format!("{id}: edge {edge} does not reach {neighbor}"));
            }
        }

        let mut last_position = None;
        let mut expected_descendants = 0;
        for child in &node.children {
            let position = node
                .neighbors
                .iter()
                .position(|n| n == child)
                .ok_or_else(|| format!("{id}: child {child} is not a neighbor"))?;
            if last_position.is_some_and(|last| last >= position) {
                return Err(format!("{id}: children out of neighbor order"));
            }
            last_position = Some(position);

            let child_node = self
                .nodes
                .get(child)
                .ok_or_else(|| format!("{id}: dangling child {child}"))?;
            if child_node.parent != Some(id) {
                return Err(format!("{id}: child {child} points at another parent"));
            }
            expected_descendants += 1 + child_node.num_descendants;
        }
        if expected_descendants != node.num_descendants {
            return Err(format!(
                "{id}: cached descendants {} != {}",
                node.num_descendants, expected_descendants
            ));
        }

        if let Some(parent) = node.parent {
            let parent_node = self
                .nodes
                .get(&parent)
                .ok_or_else(|| format!("{id}: dangling parent {parent}"))?;
            if !parent_node.children.contains(&id) {
                return Err(format!("{id}: missing from children of {parent}"));
            }
        }
        Ok(())
    }

    /// Runs the invariant checker on `nodes` in debug builds.
    pub(super) fn debug_check(&self, nodes: &[NodeId]) {
        if cfg!(debug_assertions) {
            for node in nodes {
                if self.contains(*node)
                    && let Err(message) = self.validate_node(*node)
                {
                    panic!("graph invariant violated: {message}");
                }
            }
        }
    }
}
