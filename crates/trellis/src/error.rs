//! Error types for Trellis operations.
//!
//! Structural violations of the graph model are reported as [`GraphError`]
//! at the call site and leave the graph untouched. Layout engines report
//! caller contract violations (missing root, missing size data) as
//! [`LayoutError`]; numerical degeneracies never surface as errors.

use std::io;

use thiserror::Error;

use trellis_core::{attribute::AttributeError, identifier::Id};

use crate::structure::{EdgeId, NodeId};

/// Structural violations raised by the graph and tree model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("node {0} is not part of the graph")]
    NodeNotFound(NodeId),

    #[error("edge {0} is not part of the graph")]
    EdgeNotFound(EdgeId),

    #[error("nodes {from} and {to} are already connected")]
    DuplicateEdge { from: NodeId, to: NodeId },

    #[error("self-loop on node {0} is not allowed")]
    SelfLoop(NodeId),

    #[error("edge directedness ({edge}) does not match graph directedness ({graph})")]
    DirectednessMismatch { graph: bool, edge: bool },

    #[error("node {child} is already a child of node {parent}")]
    AlreadyChild { parent: NodeId, child: NodeId },

    #[error("node {child} already has a parent ({parent})")]
    HasParent { parent: NodeId, child: NodeId },

    #[error("node {neighbor} is already a neighbor of node {node}")]
    AlreadyNeighbor { node: NodeId, neighbor: NodeId },

    #[error("node {neighbor} is not a neighbor of node {node}")]
    NotNeighbor { node: NodeId, neighbor: NodeId },

    #[error("node {child} is not a child of node {parent}")]
    NotChild { parent: NodeId, child: NodeId },

    #[error("attaching node {child} under node {parent} would create a cycle")]
    WouldCycle { parent: NodeId, child: NodeId },

    #[error("node {0} is not contained in the tree")]
    NotInTree(NodeId),

    #[error("tree already has a root ({0})")]
    RootExists(NodeId),

    #[error("tree is empty")]
    EmptyTree,

    #[error("trees require an undirected graph")]
    DirectedTree,

    #[error("child index {index} out of range for node {node} with {len} children")]
    IndexOutOfRange {
        node: NodeId,
        index: usize,
        len: usize,
    },
}

/// Caller contract violations detected before or during a layout run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("layout `{0}` requires a root node")]
    MissingRoot(&'static str),

    #[error("node {0} is not part of the graph")]
    NodeNotFound(NodeId),

    #[error("node {node} cannot be laid out: {source}")]
    MissingAttribute {
        node: NodeId,
        #[source]
        source: AttributeError,
    },

    #[error("size metric returned no value for node {0}")]
    MissingSize(NodeId),

    #[error("invalid layout parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl LayoutError {
    /// Convenience constructor for [`LayoutError::InvalidParameter`].
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// The main error type for Trellis operations.
#[derive(Debug, Error)]
pub enum TrellisError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Loader error: {0}")]
    Loader(String),
}

impl TrellisError {
    /// Returns the attribute name when the error stems from missing layout input.
    pub fn missing_attribute(&self) -> Option<Id> {
        match self {
            TrellisError::Layout(LayoutError::MissingAttribute {
                source: AttributeError::Missing(name),
                ..
            }) => Some(*name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_error_messages() {
        let err = GraphError::DuplicateEdge {
            from: NodeId::new(1),
            to: NodeId::new(2),
        };
        assert_eq!(err.to_string(), "nodes n1 and n2 are already connected");

        let err = GraphError::NotInTree(NodeId::new(7));
        assert_eq!(err.to_string(), "node n7 is not contained in the tree");
    }

    #[test]
    fn test_layout_error_wraps_attribute_error() {
        let err: TrellisError = LayoutError::MissingAttribute {
            node: NodeId::new(3),
            source: AttributeError::Missing(Id::new("size")),
        }
        .into();

        assert_eq!(err.missing_attribute(), Some(Id::new("size")));
        assert!(err.to_string().contains("attribute `size` is not set"));
    }

    #[test]
    fn test_invalid_parameter_constructor() {
        let err = LayoutError::invalid_parameter("radius_increment", "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid layout parameter `radius_increment`: must be positive"
        );
    }
}
