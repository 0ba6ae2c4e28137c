//! Synthetic graphs for exercising the layouts.
//!
//! Every generated node carries an `index` attribute (its creation order)
//! and a `weight` attribute between 1 and 10 that tree-maps can use as
//! their size metric.

use clap::ValueEnum;
use log::debug;
use rand::Rng;

use trellis::{
    GraphError,
    attribute::Attributes,
    structure::{Graph, NodeId, Tree},
};

/// Shape of a generated graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shape {
    /// One root with every other node as its child
    Star,
    /// Each node is the only child of the previous one
    Chain,
    /// Complete tree filled level by level
    Balanced,
    /// Square grid spanned breadth-first from its corner
    Grid,
    /// Random recursive tree
    Random,
}

/// A generated graph and the root of its tree relation.
#[derive(Debug)]
pub struct Generated {
    pub graph: Graph,
    pub root: NodeId,
}

/// Builds a graph of `count` nodes with the given shape.
///
/// `count` and `fanout` must both be at least one.
///
/// # Errors
///
/// Propagates the [`GraphError`] of a rejected insertion.
pub fn generate(
    shape: Shape,
    count: usize,
    fanout: usize,
    rng: &mut impl Rng,
) -> Result<Generated, GraphError> {
    let mut graph = Graph::new(false);
    let nodes: Vec<NodeId> = (0..count)
        .map(|i| {
            graph.add_node_with(
                Attributes::new()
                    .with("index", i as i64)
                    .with("weight", rng.random_range(1..=10_i64)),
            )
        })
        .collect();
    let root = *nodes.first().ok_or(GraphError::EmptyTree)?;

    match shape {
        Shape::Star => {
            for node in &nodes[1..] {
                graph.add_child(root, *node)?;
            }
        }
        Shape::Chain => {
            for pair in nodes.windows(2) {
                graph.add_child(pair[0], pair[1])?;
            }
        }
        Shape::Balanced => {
            for (i, node) in nodes.iter().enumerate().skip(1) {
                graph.add_child(nodes[(i - 1) / fanout.max(1)], *node)?;
            }
        }
        Shape::Random => {
            for (i, node) in nodes.iter().enumerate().skip(1) {
                graph.add_child(nodes[rng.random_range(0..i)], *node)?;
            }
        }
        Shape::Grid => {
            let columns = (count as f64).sqrt().ceil() as usize;
            for i in 0..count {
                if (i + 1) % columns != 0 && i + 1 < count {
                    graph.add_edge(nodes[i], nodes[i + 1])?;
                }
                if i + columns < count {
                    graph.add_edge(nodes[i], nodes[i + columns])?;
                }
            }
            graph = Tree::breadth_first(graph, root)?.into_graph();
        }
    }

    debug!(
        shape:? = shape,
        node_count = graph.num_nodes(),
        edge_count = graph.num_edges();
        "Generated graph"
    );
    Ok(Generated { graph, root })
}
