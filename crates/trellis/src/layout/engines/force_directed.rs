//! Force-directed graph layout engine.
//!
//! Each run copies node positions into a [`ForceSimulator`], adds one spring
//! per edge, advances the simulation and writes the resulting positions back.

use std::{collections::HashMap, time::Instant};

use log::debug;

use trellis_core::geometry::{Bounds, Point};

use crate::{
    config::{ForceConfig, IntegratorKind},
    error::LayoutError,
    layout::{
        Layout, LayoutContext,
        force::{
            DragForce, EulerIntegrator, ForceItem, ForceSimulator, NBodyForce,
            RungeKuttaIntegrator, SpringForce,
        },
    },
    structure::{EdgeId, Graph, NodeId},
};

/// Per-edge strategy returning a spring rest length or coefficient.
pub type EdgeStrategy = Box<dyn Fn(&Graph, EdgeId) -> f32 + Send + Sync>;

/// Per-node strategy returning a particle mass.
pub type NodeStrategy = Box<dyn Fn(&Graph, NodeId) -> f32 + Send + Sync>;

/// How much simulated time a single run covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timestep {
    /// Always advance by the given number of milliseconds.
    Fixed(f32),
    /// Advance by the wall-clock time elapsed since the previous run.
    WallClock,
}

/// Force-directed layout engine.
///
/// Fixed nodes exert forces on their neighbors but never move. Invisible
/// nodes are ignored entirely.
pub struct ForceLayout {
    simulator: ForceSimulator,
    timestep: Timestep,
    default_timestep: f32,
    run_once: bool,
    iterations: usize,
    enforce_bounds: bool,
    spring_length: Option<EdgeStrategy>,
    spring_coefficient: Option<EdgeStrategy>,
    mass: Option<NodeStrategy>,
    last_run: Option<Instant>,
}

impl std::fmt::Debug for ForceLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForceLayout")
            .field("simulator", &self.simulator)
            .field("timestep", &self.timestep)
            .field("run_once", &self.run_once)
            .field("iterations", &self.iterations)
            .field("enforce_bounds", &self.enforce_bounds)
            .finish_non_exhaustive()
    }
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl ForceLayout {
    /// Create a new force layout engine with the default simulator
    pub fn new() -> Self {
        Self::from_config(&ForceConfig::default())
    }

    /// Create a force layout engine from configuration
    pub fn from_config(config: &ForceConfig) -> Self {
        let mut simulator = ForceSimulator::with_forces(vec![
            Box::new(
                NBodyForce::new(config.gravitational_constant())
                    .with_max_distance(config.max_distance()),
            ),
            Box::new(SpringForce::new(
                config.spring_coefficient(),
                config.spring_length(),
            )),
            Box::new(DragForce::new(config.drag())),
        ]);
        simulator.set_speed_limit(config.speed_limit());
        match config.integrator() {
            IntegratorKind::Euler => simulator.set_integrator(Box::new(EulerIntegrator)),
            IntegratorKind::RungeKutta => {
                simulator.set_integrator(Box::new(RungeKuttaIntegrator))
            }
        };

        let timestep = config
            .timestep_ms()
            .map_or(Timestep::WallClock, Timestep::Fixed);

        Self {
            simulator,
            timestep,
            default_timestep: config.default_timestep_ms(),
            run_once: config.run_once(),
            iterations: config.iterations(),
            enforce_bounds: config.enforce_bounds(),
            spring_length: None,
            spring_coefficient: None,
            mass: None,
            last_run: None,
        }
    }

    /// Replace the simulator, keeping every other setting
    pub fn with_simulator(mut self, simulator: ForceSimulator) -> Self {
        self.simulator = simulator;
        self
    }

    pub fn set_timestep(&mut self, timestep: Timestep) -> &mut Self {
        self.timestep = timestep;
        self
    }

    /// Run `iterations` steps with a decaying timestep on each call
    pub fn set_run_once(&mut self, run_once: bool, iterations: usize) -> &mut Self {
        self.run_once = run_once;
        self.iterations = iterations;
        self
    }

    pub fn set_enforce_bounds(&mut self, enforce: bool) -> &mut Self {
        self.enforce_bounds = enforce;
        self
    }

    pub fn set_spring_length(&mut self, strategy: EdgeStrategy) -> &mut Self {
        self.spring_length = Some(strategy);
        self
    }

    pub fn set_spring_coefficient(&mut self, strategy: EdgeStrategy) -> &mut Self {
        self.spring_coefficient = Some(strategy);
        self
    }

    pub fn set_mass(&mut self, strategy: NodeStrategy) -> &mut Self {
        self.mass = Some(strategy);
        self
    }

    pub fn simulator(&self) -> &ForceSimulator {
        &self.simulator
    }

    /// Spreads the free nodes of `graph` over a grid inside `bounds`.
    ///
    /// Useful as a starting configuration: a simulation started with every
    /// node on the same spot spends its first steps pulling them apart.
    pub fn place_on_grid(graph: &mut Graph, bounds: Bounds) {
        let nodes: Vec<NodeId> = graph
            .nodes()
            .filter(|node| graph.visual(*node).is_some_and(|v| !v.is_fixed()))
            .collect();
        for (node, position) in nodes.iter().zip(grid_positions(nodes.len(), bounds)) {
            if let Some(visual) = graph.visual_mut(*node) {
                visual.set_position(position);
            }
        }
    }

    /// Simulated milliseconds for the current run.
    fn next_timestep(&mut self) -> f32 {
        let now = Instant::now();
        let step = match (self.timestep, self.last_run) {
            (Timestep::Fixed(step), _) => step,
            (Timestep::WallClock, Some(last)) => now.duration_since(last).as_secs_f32() * 1000.0,
            (Timestep::WallClock, None) => self.default_timestep,
        };
        self.last_run = Some(now);
        step
    }

    /// Loads visible nodes and their edges into the simulator.
    fn populate(&mut self, graph: &Graph) -> HashMap<NodeId, usize> {
        self.simulator.clear();
        let mut index = HashMap::new();

        for node in graph.nodes() {
            let Some(visual) = graph.visual(node) else {
                continue;
            };
            if !visual.is_visible() {
                continue;
            }
            let mass = self.mass.as_ref().map_or(1.0, |mass| mass(graph, node));
            let item = ForceItem::new(visual.position())
                .with_mass(mass)
                .with_fixed(visual.is_fixed());
            index.insert(node, self.simulator.add_item(item));
        }

        for edge in graph.edges() {
            let Some(record) = graph.edge(edge) else {
                continue;
            };
            let (Some(&a), Some(&b)) = (index.get(&record.source()), index.get(&record.target()))
            else {
                continue;
            };
            let coefficient = self
                .spring_coefficient
                .as_ref()
                .map_or(-1.0, |strategy| strategy(graph, edge));
            let length = self
                .spring_length
                .as_ref()
                .map_or(-1.0, |strategy| strategy(graph, edge));
            self.simulator.add_spring(a, b, coefficient, length);
        }

        index
    }

    /// Keeps free items inside `bounds`, reflecting the clamped velocity component.
    fn clamp_items(&mut self, graph: &Graph, index: &HashMap<NodeId, usize>, bounds: Bounds) {
        let items = self.simulator.items_mut();
        for (node, &i) in index {
            let item = &mut items[i];
            if item.fixed {
                continue;
            }
            let size = graph.visual(*node).map(|v| v.size()).unwrap_or_default();
            let (location, clamped_x, clamped_y) = bounds.clamp_center(item.location, size);
            item.location = location;
            if clamped_x {
                item.velocity = item.velocity.with_x(-item.velocity.x());
            }
            if clamped_y {
                item.velocity = item.velocity.with_y(-item.velocity.y());
            }
        }
    }
}

impl Layout for ForceLayout {
    fn name(&self) -> &'static str {
        "force"
    }

    fn run(&mut self, graph: &mut Graph, ctx: &LayoutContext) -> Result<(), LayoutError> {
        let index = self.populate(graph);
        let bounds = ctx.bounds();

        debug!(
            item_count = index.len(),
            spring_count = self.simulator.springs().len(),
            run_once = self.run_once;
            "Running force simulation"
        );

        if self.run_once {
            let mut step = 1000.0_f32;
            for i in 0..self.iterations {
                step *= 1.0 - i as f32 / self.iterations as f32;
                self.simulator.run_simulator(step + 50.0);
                if self.enforce_bounds {
                    self.clamp_items(graph, &index, bounds);
                }
            }
        } else {
            let step = self.next_timestep();
            self.simulator.run_simulator(step);
            if self.enforce_bounds {
                self.clamp_items(graph, &index, bounds);
            }
        }

        for (node, i) in index {
            let item = &self.simulator.items()[i];
            if item.fixed || !item.location.is_finite() {
                continue;
            }
            if let Some(visual) = graph.visual_mut(node) {
                visual.set_position(item.location);
            }
        }
        Ok(())
    }
}

/// Centers of a near-square grid of `count` cells covering `bounds`.
fn grid_positions(count: usize, bounds: Bounds) -> Vec<Point> {
    let columns = (count as f32).sqrt().ceil().max(1.0) as usize;
    let rows = count.div_ceil(columns).max(1);
    let cell_w = bounds.width() / columns as f32;
    let cell_h = bounds.height() / rows as f32;
    (0..count)
        .map(|i| {
            let (row, col) = (i / columns, i % columns);
            Point::new(
                bounds.min_x() + (col as f32 + 0.5) * cell_w,
                bounds.min_y() + (row as f32 + 0.5) * cell_h,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_pair_settles_near_rest_length() {
        let mut graph = Graph::new(false);
        let a = graph.add_node();
        let b = graph.add_node();
        graph.add_edge(a, b).unwrap();
        graph.visual_mut(a).unwrap().set_position(Point::new(100.0, 100.0));
        graph.visual_mut(b).unwrap().set_position(Point::new(300.0, 100.0));

        let mut layout = ForceLayout::new();
        layout.set_timestep(Timestep::Fixed(20.0));
        let ctx = LayoutContext::new(Bounds::new(0.0, 0.0, 400.0, 200.0));
        let before = 200.0;
        for _ in 0..50 {
            layout.run(&mut graph, &ctx).unwrap();
        }

        let pa = graph.visual(a).unwrap().position();
        let pb = graph.visual(b).unwrap().position();
        assert!(pa.distance(pb) < before);
    }

    #[test]
    fn test_fixed_node_is_not_moved() {
        let mut graph = Graph::new(false);
        let a = graph.add_node();
        let b = graph.add_node();
        graph.add_edge(a, b).unwrap();
        graph.visual_mut(a).unwrap().set_position(Point::new(50.0, 50.0));
        graph.visual_mut(a).unwrap().set_fixed(true);
        graph.visual_mut(b).unwrap().set_position(Point::new(60.0, 50.0));

        let mut layout = ForceLayout::new();
        layout.set_run_once(true, 20);
        layout
            .run(&mut graph, &LayoutContext::new(Bounds::new(0.0, 0.0, 200.0, 200.0)))
            .unwrap();

        assert_eq!(graph.visual(a).unwrap().position(), Point::new(50.0, 50.0));
        assert_ne!(graph.visual(b).unwrap().position(), Point::new(60.0, 50.0));
    }

    #[test]
    fn test_strategies_are_consulted() {
        let mut graph = Graph::new(false);
        let a = graph.add_node();
        let b = graph.add_node();
        graph.add_edge(a, b).unwrap();

        let mut layout = ForceLayout::new();
        layout
            .set_spring_length(Box::new(|_, _| 10.0))
            .set_spring_coefficient(Box::new(|_, _| 0.5))
            .set_mass(Box::new(|_, _| 3.0));
        layout.populate(&graph);

        let spring = layout.simulator().springs()[0];
        assert_eq!(spring.length, 10.0);
        assert_eq!(spring.coefficient, 0.5);
        assert_eq!(layout.simulator().items()[0].mass, 3.0);
    }

    #[test]
    fn test_invisible_nodes_are_ignored() {
        let mut graph = Graph::new(false);
        let a = graph.add_node();
        let b = graph.add_node();
        graph.add_edge(a, b).unwrap();
        graph.visual_mut(b).unwrap().set_visible(false);

        let mut layout = ForceLayout::new();
        let index = layout.populate(&graph);
        assert_eq!(index.len(), 1);
        assert!(layout.simulator().springs().is_empty());
    }

    #[test]
    fn test_place_on_grid_inside_bounds() {
        let bounds = Bounds::new(0.0, 0.0, 100.0, 100.0);
        let mut graph = Graph::new(false);
        let nodes: Vec<NodeId> = (0..5).map(|_| graph.add_node()).collect();
        graph.visual_mut(nodes[0]).unwrap().set_fixed(true);

        ForceLayout::place_on_grid(&mut graph, bounds);
        assert_eq!(graph.visual(nodes[0]).unwrap().position(), Point::default());
        for node in &nodes[1..] {
            let position = graph.visual(*node).unwrap().position();
            assert!(position.x() > 0.0 && position.x() < 100.0, "{position:?}");
            assert!(position.y() > 0.0 && position.y() < 100.0, "{position:?}");
        }
        assert_ne!(
            graph.visual(nodes[1]).unwrap().position(),
            graph.visual(nodes[2]).unwrap().position()
        );
    }
}

#[cfg(test)]
mod proptest_tests {
    use std::time::Duration;

    use proptest::prelude::*;

    use super::*;

    fn inside(bounds: Bounds, point: Point) -> bool {
        (bounds.min_x()..=bounds.max_x()).contains(&point.x())
            && (bounds.min_y()..=bounds.max_y()).contains(&point.y())
    }

    fn graph_on_grid(node_count: usize, edges: &[(usize, usize)], bounds: Bounds) -> Graph {
        let mut graph = Graph::new(false);
        let nodes: Vec<NodeId> = (0..node_count).map(|_| graph.add_node()).collect();
        for (a, b) in edges {
            // self-loops and duplicate edges are skipped
            graph
                .add_edge(nodes[a % node_count], nodes[b % node_count])
                .ok();
        }
        ForceLayout::place_on_grid(&mut graph, bounds);
        graph
    }

    fn check_in_bounds(graph: &Graph, bounds: Bounds) -> Result<(), TestCaseError> {
        for node in graph.nodes() {
            let position = graph.visual(node).unwrap().position();
            prop_assert!(position.is_finite(), "{node} at {position:?}");
            prop_assert!(inside(bounds, position), "{position:?} outside {bounds:?}");
        }
        Ok(())
    }

    fn check_positions_stay_in_bounds(
        node_count: usize,
        edges: &[(usize, usize)],
        width: f32,
        height: f32,
    ) -> Result<(), TestCaseError> {
        let bounds = Bounds::new(0.0, 0.0, width, height);
        let mut graph = graph_on_grid(node_count, edges, bounds);

        let mut layout = ForceLayout::new();
        layout.set_run_once(true, 30);
        layout.run(&mut graph, &LayoutContext::new(bounds)).unwrap();

        check_in_bounds(&graph, bounds)
    }

    /// Frame-by-frame runs with long steps never leave the bounds.
    fn check_frames_stay_in_bounds(
        node_count: usize,
        edges: &[(usize, usize)],
        timestep: Timestep,
        elapsed_ms: u64,
        frames: usize,
    ) -> Result<(), TestCaseError> {
        let bounds = Bounds::new(0.0, 0.0, 200.0, 150.0);
        let mut graph = graph_on_grid(node_count, edges, bounds);
        let ctx = LayoutContext::new(bounds);

        let mut layout = ForceLayout::new();
        layout.set_timestep(timestep).set_enforce_bounds(true);
        for _ in 0..frames {
            // pretend the previous frame ran long ago
            layout.last_run = Instant::now().checked_sub(Duration::from_millis(elapsed_ms));
            layout.run(&mut graph, &ctx).unwrap();
            check_in_bounds(&graph, bounds)?;
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn force_positions_stay_in_bounds(
            node_count in 1..15usize,
            edges in prop::collection::vec((0..15usize, 0..15usize), 0..25),
            width in 50.0f32..500.0,
            height in 50.0f32..500.0,
        ) {
            check_positions_stay_in_bounds(node_count, &edges, width, height)?;
        }

        #[test]
        fn force_frames_stay_in_bounds(
            node_count in 1..12usize,
            edges in prop::collection::vec((0..12usize, 0..12usize), 0..20),
            timestep in prop_oneof![
                (1.0f32..10_000.0).prop_map(Timestep::Fixed),
                Just(Timestep::WallClock),
            ],
            elapsed_ms in 1..10_000u64,
            frames in 1..25usize,
        ) {
            check_frames_stay_in_bounds(node_count, &edges, timestep, elapsed_ms, frames)?;
        }
    }
}
