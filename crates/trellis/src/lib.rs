//! Trellis - graph and tree layouts for interactive visualization.
//!
//! A mutable graph model that keeps a spanning tree (parent, ordered
//! children and descendant counts) consistent under every edit, plus a set
//! of layout engines writing positions and sizes into each node's visual
//! record: force-directed simulation, tidy node-link trees, radial trees,
//! squarified tree-maps and balloon trees.

pub mod config;
pub mod layout;
pub mod loader;
pub mod pipeline;
pub mod structure;

mod error;

pub use trellis_core::{attribute, geometry, identifier};

pub use error::{GraphError, LayoutError, TrellisError};

use log::{debug, info};

use config::AppConfig;
use layout::{Layout, LayoutContext, LayoutKind};
use structure::Graph;

/// Builder for configured layout engines.
///
/// Engines are created from the sections of an [`AppConfig`]. Engines that
/// carry state between runs (the force simulation and the radial layout's
/// orientation memory) should be built once with [`LayoutBuilder::build`]
/// and kept by the caller.
///
/// # Examples
///
/// ```
/// use trellis::{LayoutBuilder, config::AppConfig};
/// use trellis::geometry::Bounds;
/// use trellis::layout::{LayoutContext, LayoutKind};
/// use trellis::structure::Graph;
///
/// let mut graph = Graph::new(false);
/// let root = graph.add_node();
/// for _ in 0..3 {
///     let leaf = graph.add_node();
///     graph.add_child(root, leaf).unwrap();
/// }
///
/// let builder = LayoutBuilder::new(AppConfig::default());
/// let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 400.0, 300.0)).with_root(root);
/// builder.run_kind(LayoutKind::Radial, &mut graph, &ctx).unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct LayoutBuilder {
    config: AppConfig,
}

impl LayoutBuilder {
    /// Create a new builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Create the engine for `kind` from its configuration section.
    pub fn build(&self, kind: LayoutKind) -> Box<dyn Layout + Send> {
        debug!(kind:% = kind; "Building layout engine");
        layout::build_layout(kind, self.config.layout())
    }

    /// Run the configured default engine once.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Layout`] when the engine rejects its input.
    pub fn run(&self, graph: &mut Graph, ctx: &LayoutContext) -> Result<(), TrellisError> {
        self.run_kind(self.config.layout().kind(), graph, ctx)
    }

    /// Run a freshly built engine of the given kind once.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Layout`] when the engine rejects its input.
    pub fn run_kind(
        &self,
        kind: LayoutKind,
        graph: &mut Graph,
        ctx: &LayoutContext,
    ) -> Result<(), TrellisError> {
        info!(
            kind:% = kind,
            node_count = graph.num_nodes(),
            edge_count = graph.num_edges();
            "Running layout"
        );
        let mut engine = self.build(kind);
        engine.run(graph, ctx)?;
        debug!(kind:% = kind; "Layout finished");
        Ok(())
    }
}
