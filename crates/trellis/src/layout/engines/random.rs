//! Uniform random placement inside the bounds.

use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};

use trellis_core::geometry::Point;

use crate::{
    config::RandomConfig,
    error::LayoutError,
    layout::{Layout, LayoutContext},
    structure::Graph,
};

/// Random layout engine.
///
/// The generator lives as long as the engine, so consecutive runs with a
/// seeded engine produce a reproducible sequence of layouts.
#[derive(Debug, Clone)]
pub struct RandomLayout {
    rng: StdRng,
}

impl Default for RandomLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomLayout {
    /// Creates an engine seeded from the thread-local generator.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_config(config: &RandomConfig) -> Self {
        config.seed().map_or_else(Self::new, Self::with_seed)
    }
}

impl Layout for RandomLayout {
    fn name(&self) -> &'static str {
        "random"
    }

    fn run(&mut self, graph: &mut Graph, ctx: &LayoutContext) -> Result<(), LayoutError> {
        let bounds = ctx.bounds();
        let nodes: Vec<_> = graph
            .nodes()
            .filter(|node| {
                graph
                    .visual(*node)
                    .is_some_and(|v| v.is_visible() && !v.is_fixed())
            })
            .collect();
        debug!(node_count = nodes.len(), bounds:? = bounds; "Random layout");

        for node in nodes {
            let x = bounds.min_x() + self.rng.random::<f32>() * bounds.width().max(0.0);
            let y = bounds.min_y() + self.rng.random::<f32>() * bounds.height().max(0.0);
            if let Some(visual) = graph.visual_mut(node) {
                visual.set_position(Point::new(x, y));
            }
        }
        Ok(())
    }
}
