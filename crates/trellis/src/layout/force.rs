//! Particle/spring physics simulation.
//!
//! A [`ForceSimulator`] owns a set of [`ForceItem`] particles and the
//! [`Spring`]s connecting them. Each step clears the accumulated forces,
//! lets every registered [`Force`] add its contribution, and hands the items
//! to an [`Integrator`] that advances velocities and locations.

mod forces;
mod integrator;

use log::trace;

use trellis_core::geometry::Point;

pub use forces::{DragForce, Force, NBodyForce, SpringForce};
pub use integrator::{EulerIntegrator, Integrator, RungeKuttaIntegrator};

/// Separation used in place of a zero distance between two particles.
pub(crate) const MIN_DISTANCE: f32 = 1e-3;

/// Deterministic unit direction used to separate coincident particles.
pub(crate) fn separation_direction(a: usize, b: usize) -> Point {
    // golden angle spreads successive pairs around the circle
    let angle = (a * 31 + b) as f32 * 2.399_963;
    Point::from_polar(1.0, angle)
}

/// A particle in the simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceItem {
    pub location: Point,
    pub velocity: Point,
    pub force: Point,
    pub mass: f32,
    /// Fixed items push other items around but neither accumulate force nor move.
    pub fixed: bool,
}

impl Default for ForceItem {
    fn default() -> Self {
        Self {
            location: Point::default(),
            velocity: Point::default(),
            force: Point::default(),
            mass: 1.0,
            fixed: false,
        }
    }
}

impl ForceItem {
    pub fn new(location: Point) -> Self {
        Self {
            location,
            ..Self::default()
        }
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }
}

/// A spring between two items, addressed by their index in the simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub item1: usize,
    pub item2: usize,
    /// Hooke coefficient; negative values fall back to the spring force default.
    pub coefficient: f32,
    /// Rest length; negative values fall back to the spring force default.
    pub length: f32,
}

impl Spring {
    pub fn new(item1: usize, item2: usize, coefficient: f32, length: f32) -> Self {
        Self {
            item1,
            item2,
            coefficient,
            length,
        }
    }
}

/// Runs the particle simulation.
///
/// # Examples
///
/// ```
/// use trellis::layout::force::{ForceItem, ForceSimulator};
/// use trellis_core::geometry::Point;
///
/// let mut sim = ForceSimulator::new();
/// let a = sim.add_item(ForceItem::new(Point::new(0.0, 0.0)));
/// let b = sim.add_item(ForceItem::new(Point::new(10.0, 0.0)));
/// sim.add_spring(a, b, -1.0, -1.0);
///
/// sim.run_simulator(20.0);
/// assert!(sim.items()[0].location.x() < 0.0);
/// ```
pub struct ForceSimulator {
    items: Vec<ForceItem>,
    springs: Vec<Spring>,
    forces: Vec<Box<dyn Force>>,
    integrator: Box<dyn Integrator>,
    speed_limit: f32,
}

impl Default for ForceSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ForceSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForceSimulator")
            .field("items", &self.items.len())
            .field("springs", &self.springs.len())
            .field("forces", &self.forces.len())
            .field("speed_limit", &self.speed_limit)
            .finish()
    }
}

impl ForceSimulator {
    /// Creates a simulator with n-body repulsion, springs and drag, integrated
    /// with semi-implicit Euler steps.
    pub fn new() -> Self {
        Self::with_forces(vec![
            Box::new(NBodyForce::default()),
            Box::new(SpringForce::default()),
            Box::new(DragForce::default()),
        ])
    }

    /// Creates a simulator with a custom set of forces.
    pub fn with_forces(forces: Vec<Box<dyn Force>>) -> Self {
        Self {
            items: Vec::new(),
            springs: Vec::new(),
            forces,
            integrator: Box::new(EulerIntegrator),
            speed_limit: 1.0,
        }
    }

    pub fn set_integrator(&mut self, integrator: Box<dyn Integrator>) -> &mut Self {
        self.integrator = integrator;
        self
    }

    /// Maximum velocity magnitude of any item after a step.
    pub fn set_speed_limit(&mut self, limit: f32) -> &mut Self {
        self.speed_limit = limit;
        self
    }

    pub fn speed_limit(&self) -> f32 {
        self.speed_limit
    }

    pub fn add_force(&mut self, force: Box<dyn Force>) -> &mut Self {
        self.forces.push(force);
        self
    }

    pub fn forces(&self) -> &[Box<dyn Force>] {
        &self.forces
    }

    /// Adds an item and returns its index.
    pub fn add_item(&mut self, item: ForceItem) -> usize {
        self.items.push(item);
        self.items.len() - 1
    }

    /// Connects two items. Negative coefficient or length use the spring force defaults.
    pub fn add_spring(&mut self, item1: usize, item2: usize, coefficient: f32, length: f32) {
        self.springs
            .push(Spring::new(item1, item2, coefficient, length));
    }

    pub fn items(&self) -> &[ForceItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [ForceItem] {
        &mut self.items
    }

    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    /// Removes every item and spring, keeping forces and integrator.
    pub fn clear(&mut self) {
        self.items.clear();
        self.springs.clear();
    }

    /// Recomputes the force acting on every item at its current location.
    pub fn accumulate(&mut self) {
        accumulate_forces(&self.forces, &self.springs, &mut self.items);
    }

    /// Advances the simulation by `timestep` (milliseconds).
    pub fn run_simulator(&mut self, timestep: f32) {
        let forces = &self.forces;
        let springs = &self.springs;
        let accumulate = |items: &mut [ForceItem]| accumulate_forces(forces, springs, items);
        self.integrator
            .integrate(&mut self.items, timestep, self.speed_limit, &accumulate);
        trace!(timestep = timestep, item_count = self.items.len(); "Simulation step");
    }
}

fn accumulate_forces(forces: &[Box<dyn Force>], springs: &[Spring], items: &mut [ForceItem]) {
    for item in items.iter_mut() {
        item.force = Point::default();
    }
    for force in forces {
        force.accumulate_items(items);
    }
    for spring in springs {
        if spring.item1 >= items.len() || spring.item2 >= items.len() {
            continue;
        }
        for force in forces {
            force.accumulate_spring(spring, items);
        }
    }
    for item in items.iter_mut().filter(|item| item.fixed) {
        item.force = Point::default();
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;

    #[test]
    fn test_spring_pulls_items_together() {
        let mut sim = ForceSimulator::with_forces(vec![Box::new(SpringForce::default())]);
        let a = sim.add_item(ForceItem::new(Point::new(0.0, 0.0)));
        let b = sim.add_item(ForceItem::new(Point::new(100.0, 0.0)));
        sim.add_spring(a, b, -1.0, -1.0);

        sim.accumulate();
        assert!(sim.items()[a].force.x() > 0.0);
        assert!(sim.items()[b].force.x() < 0.0);
        assert!(approx_eq!(
            f32,
            sim.items()[a].force.x(),
            -sim.items()[b].force.x()
        ));
    }

    #[test]
    fn test_fixed_items_do_not_move() {
        let mut sim = ForceSimulator::new();
        let a = sim.add_item(ForceItem::new(Point::new(0.0, 0.0)).with_fixed(true));
        let b = sim.add_item(ForceItem::new(Point::new(5.0, 0.0)));

        for _ in 0..10 {
            sim.run_simulator(20.0);
        }
        assert_eq!(sim.items()[a].location, Point::new(0.0, 0.0));
        assert!(sim.items()[b].location.x() > 5.0);
    }

    #[test]
    fn test_coincident_items_separate() {
        let mut sim = ForceSimulator::with_forces(vec![Box::new(NBodyForce::default())]);
        sim.add_item(ForceItem::new(Point::new(1.0, 1.0)));
        sim.add_item(ForceItem::new(Point::new(1.0, 1.0)));

        sim.run_simulator(10.0);
        let items = sim.items();
        assert!(items.iter().all(|item| item.location.is_finite()));
        assert!(items[0].location.distance(items[1].location) > 0.0);
    }

    #[test]
    fn test_speed_limit_caps_velocity() {
        let mut sim = ForceSimulator::with_forces(vec![Box::new(NBodyForce::new(-1000.0))]);
        sim.set_speed_limit(0.5);
        sim.add_item(ForceItem::new(Point::new(0.0, 0.0)));
        sim.add_item(ForceItem::new(Point::new(0.5, 0.0)));

        sim.run_simulator(50.0);
        for item in sim.items() {
            assert!(item.velocity.hypot() <= 0.5 + 1e-4);
        }
    }

    #[test]
    fn test_dangling_springs_are_ignored() {
        let mut sim = ForceSimulator::new();
        sim.add_item(ForceItem::new(Point::new(0.0, 0.0)));
        sim.add_spring(0, 3, -1.0, -1.0);

        sim.run_simulator(20.0);
        assert!(sim.items()[0].location.is_finite());
    }
}
