//! Force functions applied by the simulator.

use trellis_core::geometry::Point;

use super::{ForceItem, MIN_DISTANCE, Spring, separation_direction};

/// A force contributing to the accumulated force on each item.
///
/// Item forces act on the whole particle set; spring forces act on one
/// spring at a time. A force may implement either or both.
pub trait Force: Send + Sync {
    /// Adds this force's contribution to every item.
    fn accumulate_items(&self, _items: &mut [ForceItem]) {}

    /// Adds this force's contribution for a single spring.
    fn accumulate_spring(&self, _spring: &Spring, _items: &mut [ForceItem]) {}
}

/// Offset from `a` to `b`, replaced by a tiny deterministic offset when the
/// two coincide. Returns the offset and its length.
fn separation(items: &[ForceItem], a: usize, b: usize) -> (Point, f32) {
    let delta = items[b].location.sub_point(items[a].location);
    let distance = delta.hypot();
    if distance < MIN_DISTANCE || !distance.is_finite() {
        (separation_direction(a, b).scale(MIN_DISTANCE), MIN_DISTANCE)
    } else {
        (delta, distance)
    }
}

/// Pairwise inverse-square interaction between all items.
///
/// A negative gravitational constant makes items repel each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NBodyForce {
    gravitational_constant: f32,
    max_distance: Option<f32>,
}

impl Default for NBodyForce {
    fn default() -> Self {
        Self::new(-1.0)
    }
}

impl NBodyForce {
    pub fn new(gravitational_constant: f32) -> Self {
        Self {
            gravitational_constant,
            max_distance: None,
        }
    }

    /// Pairs further apart than `distance` do not interact.
    pub fn with_max_distance(mut self, distance: Option<f32>) -> Self {
        self.max_distance = distance;
        self
    }

    pub fn gravitational_constant(&self) -> f32 {
        self.gravitational_constant
    }
}

impl Force for NBodyForce {
    fn accumulate_items(&self, items: &mut [ForceItem]) {
        for i in 0..items.len() {
            for j in (i + 1)..items.len() {
                let (delta, distance) = separation(items, i, j);
                if self
                    .max_distance
                    .is_some_and(|max_distance| distance > max_distance)
                {
                    continue;
                }

                let v = self.gravitational_constant * items[i].mass * items[j].mass
                    / (distance * distance * distance);
                let push = delta.scale(v);
                items[i].force = items[i].force.add_point(push);
                items[j].force = items[j].force.sub_point(push);
            }
        }
    }
}

/// Hooke's law along every spring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringForce {
    default_coefficient: f32,
    default_length: f32,
}

impl Default for SpringForce {
    fn default() -> Self {
        Self::new(1e-4, 50.0)
    }
}

impl SpringForce {
    /// Defaults apply to springs created with a negative coefficient or length.
    pub fn new(default_coefficient: f32, default_length: f32) -> Self {
        Self {
            default_coefficient,
            default_length,
        }
    }
}

impl Force for SpringForce {
    fn accumulate_spring(&self, spring: &Spring, items: &mut [ForceItem]) {
        let (a, b) = (spring.item1, spring.item2);
        if a == b {
            return;
        }
        let coefficient = if spring.coefficient < 0.0 {
            self.default_coefficient
        } else {
            spring.coefficient
        };
        let length = if spring.length < 0.0 {
            self.default_length
        } else {
            spring.length
        };

        let (delta, distance) = separation(items, a, b);
        let stretch = distance - length;
        let pull = delta.scale(coefficient * stretch / distance);
        items[a].force = items[a].force.add_point(pull);
        items[b].force = items[b].force.sub_point(pull);
    }
}

/// Velocity-proportional damping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragForce {
    coefficient: f32,
}

impl Default for DragForce {
    fn default() -> Self {
        Self::new(0.01)
    }
}

impl DragForce {
    pub fn new(coefficient: f32) -> Self {
        Self { coefficient }
    }
}

impl Force for DragForce {
    fn accumulate_items(&self, items: &mut [ForceItem]) {
        for item in items.iter_mut() {
            item.force = item
                .force
                .sub_point(item.velocity.scale(self.coefficient));
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn pair(distance: f32) -> Vec<ForceItem> {
        vec![
            ForceItem::new(Point::new(0.0, 0.0)),
            ForceItem::new(Point::new(distance, 0.0)),
        ]
    }

    #[test]
    fn test_nbody_inverse_square() {
        let mut items = pair(10.0);
        NBodyForce::default().accumulate_items(&mut items);

        // |F| = G * m1 * m2 / r^2
        assert_approx_eq!(f32, items[0].force.x(), -0.01);
        assert_approx_eq!(f32, items[1].force.x(), 0.01);
        assert_approx_eq!(f32, items[0].force.y(), 0.0);
    }

    #[test]
    fn test_nbody_max_distance() {
        let mut items = pair(10.0);
        NBodyForce::default()
            .with_max_distance(Some(5.0))
            .accumulate_items(&mut items);
        assert_eq!(items[0].force, Point::default());
    }

    #[test]
    fn test_spring_at_rest_length_is_neutral() {
        let mut items = pair(50.0);
        SpringForce::default().accumulate_spring(&Spring::new(0, 1, -1.0, -1.0), &mut items);
        assert_approx_eq!(f32, items[0].force.x(), 0.0);
    }

    #[test]
    fn test_spring_stretched_pulls() {
        let mut items = pair(150.0);
        SpringForce::default().accumulate_spring(&Spring::new(0, 1, 0.5, 100.0), &mut items);

        // coefficient * (distance - length)
        assert_approx_eq!(f32, items[0].force.x(), 25.0);
        assert_approx_eq!(f32, items[1].force.x(), -25.0);
    }

    #[test]
    fn test_drag_opposes_velocity() {
        let mut items = pair(1.0);
        items[0].velocity = Point::new(2.0, -4.0);
        DragForce::new(0.5).accumulate_items(&mut items);
        assert_eq!(items[0].force, Point::new(-1.0, 2.0));
        assert_eq!(items[1].force, Point::default());
    }
}
