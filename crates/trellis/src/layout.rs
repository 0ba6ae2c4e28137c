//! Layout engines.
//!
//! Every engine implements [`Layout`]: it reads the graph structure and the
//! per-node visual flags, and writes positions (and sizes, for area based
//! engines) back into each node's [`Visual`](crate::structure::Visual)
//! record. Per-node scratch data lives in a [`ParamTable`] owned by a single
//! run, so engines never leave state behind on the graph.
//!
//! Engines are selected through [`LayoutKind`] and constructed from
//! configuration with [`build_layout`].

pub mod engines;
pub mod force;

use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use trellis_core::geometry::{Bounds, Point};

use crate::{
    config::LayoutConfig,
    error::LayoutError,
    structure::{Graph, NodeId},
};

pub use engines::{
    BalloonLayout, CircleLayout, ForceLayout, NodeLinkLayout, Orientation, RadialLayout,
    RandomLayout, Sector, SizeMetric, SquarifiedLayout, Timestep,
};

/// A layout engine.
pub trait Layout {
    /// Short, stable engine name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Computes positions for the nodes of `graph` within `ctx`.
    ///
    /// # Errors
    ///
    /// Returns a [`LayoutError`] when the caller violates the engine's
    /// contract, for example by omitting the root of a tree layout. Numerical
    /// degeneracies are absorbed rather than reported.
    fn run(&mut self, graph: &mut Graph, ctx: &LayoutContext) -> Result<(), LayoutError>;
}

impl<L: Layout + ?Sized> Layout for Box<L> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn run(&mut self, graph: &mut Graph, ctx: &LayoutContext) -> Result<(), LayoutError> {
        (**self).run(graph, ctx)
    }
}

/// Inputs shared by every layout run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutContext {
    bounds: Bounds,
    anchor: Option<Point>,
    root: Option<NodeId>,
}

impl LayoutContext {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            anchor: None,
            root: None,
        }
    }

    pub fn with_anchor(mut self, anchor: Point) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_root(mut self, root: NodeId) -> Self {
        self.root = Some(root);
        self
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The anchor point, defaulting to the center of the bounds.
    pub fn anchor(&self) -> Point {
        self.anchor.unwrap_or_else(|| self.bounds.center())
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns the root for a tree layout, validating it against `graph`.
    ///
    /// # Errors
    ///
    /// [`LayoutError::MissingRoot`] when no root was supplied and
    /// [`LayoutError::NodeNotFound`] when it is not part of `graph`.
    pub fn require_root(&self, layout: &'static str, graph: &Graph) -> Result<NodeId, LayoutError> {
        let root = self.root.ok_or(LayoutError::MissingRoot(layout))?;
        if !graph.contains(root) {
            return Err(LayoutError::NodeNotFound(root));
        }
        Ok(root)
    }
}

/// Per-run side table of layout parameters keyed by node.
///
/// Entries are created lazily with `T::default()` on first mutable access.
/// A table belongs to one layout invocation and is cleared before the next.
#[derive(Debug, Clone)]
pub struct ParamTable<T> {
    entries: HashMap<NodeId, T>,
}

impl<T> Default for ParamTable<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T: Default> ParamTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for `node`, creating it on first access.
    pub fn get_mut(&mut self, node: NodeId) -> &mut T {
        self.entries.entry(node).or_default()
    }

    pub fn get(&self, node: NodeId) -> Option<&T> {
        self.entries.get(&node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.entries.contains_key(&node)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Default + Clone> ParamTable<T> {
    /// Returns a copy of the record for `node`, or the default when absent.
    pub fn value(&self, node: NodeId) -> T {
        self.entries.get(&node).cloned().unwrap_or_default()
    }
}

/// Available layout engines.
///
/// The names match external configuration strings (snake_case).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    /// Force-directed simulation (default)
    #[default]
    Force,
    /// Buchheim/Walker tidy tree
    NodeLink,
    /// Concentric rings around the root
    Radial,
    /// Squarified tree-map
    Treemap,
    /// Balloon tree
    Balloon,
    /// Nodes on a circle
    Circle,
    /// Uniform random placement
    Random,
}

impl LayoutKind {
    pub const ALL: [LayoutKind; 7] = [
        LayoutKind::Force,
        LayoutKind::NodeLink,
        LayoutKind::Radial,
        LayoutKind::Treemap,
        LayoutKind::Balloon,
        LayoutKind::Circle,
        LayoutKind::Random,
    ];

    /// Whether the engine needs [`LayoutContext::root`].
    pub fn requires_root(self) -> bool {
        matches!(
            self,
            LayoutKind::NodeLink | LayoutKind::Radial | LayoutKind::Treemap | LayoutKind::Balloon
        )
    }
}

impl FromStr for LayoutKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "force" => Ok(Self::Force),
            "node_link" => Ok(Self::NodeLink),
            "radial" => Ok(Self::Radial),
            "treemap" => Ok(Self::Treemap),
            "balloon" => Ok(Self::Balloon),
            "circle" => Ok(Self::Circle),
            "random" => Ok(Self::Random),
            _ => Err("Unsupported layout kind"),
        }
    }
}

impl From<LayoutKind> for &'static str {
    fn from(val: LayoutKind) -> Self {
        match val {
            LayoutKind::Force => "force",
            LayoutKind::NodeLink => "node_link",
            LayoutKind::Radial => "radial",
            LayoutKind::Treemap => "treemap",
            LayoutKind::Balloon => "balloon",
            LayoutKind::Circle => "circle",
            LayoutKind::Random => "random",
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &'static str = (*self).into();
        write!(f, "{s}")
    }
}

/// Constructs the engine selected by `kind`, configured from `config`.
pub fn build_layout(kind: LayoutKind, config: &LayoutConfig) -> Box<dyn Layout + Send> {
    match kind {
        LayoutKind::Force => Box::new(ForceLayout::from_config(config.force())),
        LayoutKind::NodeLink => Box::new(NodeLinkLayout::from_config(config.node_link())),
        LayoutKind::Radial => Box::new(RadialLayout::from_config(config.radial())),
        LayoutKind::Treemap => Box::new(SquarifiedLayout::from_config(config.treemap())),
        LayoutKind::Balloon => Box::new(BalloonLayout::from_config(config.balloon())),
        LayoutKind::Circle => Box::new(CircleLayout::from_config(config.circle())),
        LayoutKind::Random => Box::new(RandomLayout::from_config(config.random())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_defaults_to_center() {
        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 200.0, 100.0));
        assert_eq!(ctx.anchor(), Point::new(100.0, 50.0));

        let ctx = ctx.with_anchor(Point::new(5.0, 5.0));
        assert_eq!(ctx.anchor(), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_require_root() {
        let mut graph = Graph::new(false);
        let root = graph.add_node();
        let ctx = LayoutContext::new(Bounds::default());

        assert_eq!(
            ctx.require_root("radial", &graph),
            Err(LayoutError::MissingRoot("radial"))
        );
        assert_eq!(ctx.with_root(root).require_root("radial", &graph), Ok(root));

        let ghost = NodeId::new(42);
        assert_eq!(
            ctx.with_root(ghost).require_root("radial", &graph),
            Err(LayoutError::NodeNotFound(ghost))
        );
    }

    #[test]
    fn test_param_table_is_lazy() {
        let mut table: ParamTable<f32> = ParamTable::new();
        let node = NodeId::new(0);

        assert!(!table.contains(node));
        assert_eq!(table.value(node), 0.0);
        *table.get_mut(node) += 2.5;
        assert_eq!(table.get(node), Some(&2.5));
        table.clear();
        assert!(table.is_empty());
    }

    #[test]
    fn test_layout_kind_names_round_trip() {
        for kind in LayoutKind::ALL {
            let name = kind.to_string();
            assert_eq!(name.parse::<LayoutKind>(), Ok(kind));
        }
        assert!("sugiyama".parse::<LayoutKind>().is_err());
    }

    #[test]
    fn test_build_layout_names() {
        let config = LayoutConfig::default();
        let names: Vec<&str> = LayoutKind::ALL
            .iter()
            .map(|kind| build_layout(*kind, &config).name())
            .collect();
        assert_eq!(
            names,
            vec!["force", "node_link", "radial", "treemap", "balloon", "circle", "random"]
        );
    }
}
