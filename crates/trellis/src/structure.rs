//! Graph and tree data model.
//!
//! [`Graph`] is an arena of nodes and edges with stable keys. Every node also
//! carries a tree relation (parent, ordered children, cached descendant
//! count) and a [`Visual`] record that layouts read and write. [`Tree`]
//! pairs an undirected graph with a root.

mod graph;
mod hierarchy;
mod tree;
mod visual;

pub use graph::{Edge, EdgeId, Graph, Node, NodeId};
pub use hierarchy::{BreadthFirst, PreOrder};
pub use tree::Tree;
pub use visual::Visual;
