//! Configuration types for Trellis layouts.
//!
//! All types implement [`serde::Deserialize`] and default every field, so a
//! configuration file only needs to mention the values it changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level application configuration.
//! - [`LayoutConfig`] - Selected [`LayoutKind`] plus one section per engine.
//!
//! # Example
//!
//! ```
//! # use trellis::config::AppConfig;
//! # use trellis::layout::LayoutKind;
//! let config = AppConfig::default();
//! assert_eq!(config.layout().kind(), LayoutKind::Force);
//! assert_eq!(config.layout().radial().radius_increment(), 50.0);
//! ```

use serde::Deserialize;

use crate::layout::{LayoutKind, Orientation};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,
}

impl AppConfig {
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut LayoutConfig {
        &mut self.layout
    }
}

/// Engine selection and per-engine parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayoutConfig {
    /// Engine used when the caller does not pick one.
    #[serde(default)]
    kind: LayoutKind,

    #[serde(default)]
    force: ForceConfig,

    #[serde(default)]
    node_link: NodeLinkConfig,

    #[serde(default)]
    radial: RadialConfig,

    #[serde(default)]
    treemap: TreeMapConfig,

    #[serde(default)]
    balloon: BalloonConfig,

    #[serde(default)]
    circle: CircleConfig,

    #[serde(default)]
    random: RandomConfig,
}

impl LayoutConfig {
    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: LayoutKind) -> &mut Self {
        self.kind = kind;
        self
    }

    pub fn force(&self) -> &ForceConfig {
        &self.force
    }

    pub fn node_link(&self) -> &NodeLinkConfig {
        &self.node_link
    }

    pub fn radial(&self) -> &RadialConfig {
        &self.radial
    }

    pub fn treemap(&self) -> &TreeMapConfig {
        &self.treemap
    }

    pub fn balloon(&self) -> &BalloonConfig {
        &self.balloon
    }

    pub fn circle(&self) -> &CircleConfig {
        &self.circle
    }

    pub fn random(&self) -> &RandomConfig {
        &self.random
    }
}

/// Integration scheme for the force simulation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    #[default]
    Euler,
    RungeKutta,
}

/// Force-directed layout parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    gravitational_constant: f32,
    max_distance: Option<f32>,
    spring_coefficient: f32,
    spring_length: f32,
    drag: f32,
    speed_limit: f32,
    integrator: IntegratorKind,
    /// Fixed step in milliseconds; unset means wall-clock steps.
    timestep_ms: Option<f32>,
    /// Step used by the first wall-clock run.
    default_timestep_ms: f32,
    run_once: bool,
    iterations: usize,
    enforce_bounds: bool,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            gravitational_constant: -1.0,
            max_distance: None,
            spring_coefficient: 1e-4,
            spring_length: 50.0,
            drag: 0.01,
            speed_limit: 1.0,
            integrator: IntegratorKind::Euler,
            timestep_ms: None,
            default_timestep_ms: 20.0,
            run_once: false,
            iterations: 100,
            enforce_bounds: true,
        }
    }
}

impl ForceConfig {
    pub fn gravitational_constant(&self) -> f32 {
        self.gravitational_constant
    }

    pub fn max_distance(&self) -> Option<f32> {
        self.max_distance
    }

    pub fn spring_coefficient(&self) -> f32 {
        self.spring_coefficient
    }

    pub fn spring_length(&self) -> f32 {
        self.spring_length
    }

    pub fn drag(&self) -> f32 {
        self.drag
    }

    pub fn speed_limit(&self) -> f32 {
        self.speed_limit
    }

    pub fn integrator(&self) -> IntegratorKind {
        self.integrator
    }

    pub fn timestep_ms(&self) -> Option<f32> {
        self.timestep_ms
    }

    pub fn default_timestep_ms(&self) -> f32 {
        self.default_timestep_ms
    }

    pub fn run_once(&self) -> bool {
        self.run_once
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn enforce_bounds(&self) -> bool {
        self.enforce_bounds
    }
}

/// Node-link tree layout parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeLinkConfig {
    orientation: Orientation,
    sibling_spacing: f32,
    subtree_spacing: f32,
    depth_spacing: f32,
    root_offset: f32,
}

impl Default for NodeLinkConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::LeftRight,
            sibling_spacing: 5.0,
            subtree_spacing: 25.0,
            depth_spacing: 50.0,
            root_offset: 50.0,
        }
    }
}

impl NodeLinkConfig {
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn sibling_spacing(&self) -> f32 {
        self.sibling_spacing
    }

    pub fn subtree_spacing(&self) -> f32 {
        self.subtree_spacing
    }

    pub fn depth_spacing(&self) -> f32 {
        self.depth_spacing
    }

    pub fn root_offset(&self) -> f32 {
        self.root_offset
    }
}

/// Radial tree layout parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RadialConfig {
    radius_increment: f32,
    auto_scale: bool,
    /// Start angle in radians.
    start_angle: f32,
    preserve_orientation: bool,
}

impl Default for RadialConfig {
    fn default() -> Self {
        Self {
            radius_increment: 50.0,
            auto_scale: true,
            start_angle: 0.0,
            preserve_orientation: false,
        }
    }
}

impl RadialConfig {
    pub fn radius_increment(&self) -> f32 {
        self.radius_increment
    }

    pub fn auto_scale(&self) -> bool {
        self.auto_scale
    }

    pub fn start_angle(&self) -> f32 {
        self.start_angle
    }

    pub fn preserve_orientation(&self) -> bool {
        self.preserve_orientation
    }
}

/// Squarified tree-map parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TreeMapConfig {
    frame_width: f32,
    /// Numeric leaf attribute driving the areas; unset counts leaves.
    size_attribute: Option<String>,
}

impl TreeMapConfig {
    pub fn frame_width(&self) -> f32 {
        self.frame_width
    }

    pub fn size_attribute(&self) -> Option<&str> {
        self.size_attribute.as_deref()
    }
}

/// Balloon tree parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BalloonConfig {
    min_radius: f32,
}

impl Default for BalloonConfig {
    fn default() -> Self {
        Self { min_radius: 2.0 }
    }
}

impl BalloonConfig {
    pub fn min_radius(&self) -> f32 {
        self.min_radius
    }
}

/// Circle layout parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CircleConfig {
    /// Explicit radius; unset fits the circle to the bounds.
    radius: Option<f32>,
}

impl CircleConfig {
    pub fn radius(&self) -> Option<f32> {
        self.radius
    }
}

/// Random layout parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RandomConfig {
    seed: Option<u64>,
}

impl RandomConfig {
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LayoutConfig::default();
        assert_eq!(config.kind(), LayoutKind::Force);
        assert_eq!(config.force().spring_length(), 50.0);
        assert_eq!(config.force().timestep_ms(), None);
        assert!(config.force().enforce_bounds());
        assert_eq!(config.node_link().orientation(), Orientation::LeftRight);
        assert_eq!(config.node_link().depth_spacing(), 50.0);
        assert_eq!(config.balloon().min_radius(), 2.0);
        assert_eq!(config.treemap().size_attribute(), None);
    }
}
