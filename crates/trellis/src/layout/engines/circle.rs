//! Places visible nodes evenly on a circle.

use std::f32::consts::TAU;

use log::debug;

use trellis_core::geometry::Point;

use crate::{
    config::CircleConfig,
    error::LayoutError,
    layout::{Layout, LayoutContext},
    structure::Graph,
};

/// Share of the shorter bounds side used as radius when none is set.
const FIT_RATIO: f32 = 0.45;

/// Circle layout engine.
///
/// Nodes are visited in graph order; the `i`-th of `n` visible nodes sits
/// at angle `2π·i/n` around the anchor. Fixed nodes keep their slot empty.
#[derive(Debug, Clone, Default)]
pub struct CircleLayout {
    radius: Option<f32>,
}

impl CircleLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CircleConfig) -> Self {
        Self {
            radius: config.radius(),
        }
    }

    /// Explicit radius; `None` fits the circle into the bounds.
    pub fn set_radius(&mut self, radius: Option<f32>) -> &mut Self {
        self.radius = radius;
        self
    }

    pub fn radius(&self) -> Option<f32> {
        self.radius
    }
}

impl Layout for CircleLayout {
    fn name(&self) -> &'static str {
        "circle"
    }

    fn run(&mut self, graph: &mut Graph, ctx: &LayoutContext) -> Result<(), LayoutError> {
        let radius = match self.radius {
            Some(radius) if radius.is_finite() && radius > 0.0 => radius,
            Some(_) => {
                return Err(LayoutError::invalid_parameter(
                    "radius",
                    "must be positive and finite",
                ));
            }
            None => FIT_RATIO * ctx.bounds().short_side(),
        };

        let nodes: Vec<_> = graph
            .nodes()
            .filter(|node| graph.visual(*node).is_some_and(|v| v.is_visible()))
            .collect();
        let center = ctx.anchor();
        debug!(node_count = nodes.len(), radius = radius; "Circle layout");

        let count = nodes.len() as f32;
        for (i, node) in nodes.into_iter().enumerate() {
            let Some(visual) = graph.visual_mut(node) else {
                continue;
            };
            if visual.is_fixed() {
                continue;
            }
            let angle = TAU * i as f32 / count;
            visual.set_position(center.add_point(Point::from_polar(radius, angle)));
        }
        Ok(())
    }
}
