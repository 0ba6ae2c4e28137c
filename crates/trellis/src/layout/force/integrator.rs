//! Numerical integrators advancing the particle system.

use trellis_core::geometry::Point;

use super::ForceItem;

/// Advances item velocities and locations by one timestep.
///
/// `accumulate` recomputes the force on every item from its current
/// location; integrators call it as often as their scheme needs.
pub trait Integrator: Send + Sync {
    fn integrate(
        &self,
        items: &mut [ForceItem],
        timestep: f32,
        speed_limit: f32,
        accumulate: &dyn Fn(&mut [ForceItem]),
    );
}

fn inverse_mass(item: &ForceItem) -> f32 {
    if item.mass > 0.0 { 1.0 / item.mass } else { 1.0 }
}

fn limit_speed(velocity: Point, speed_limit: f32) -> Point {
    let speed = velocity.hypot();
    if speed > speed_limit && speed > 0.0 {
        velocity.scale(speed_limit / speed)
    } else {
        velocity
    }
}

/// Semi-implicit Euler: velocity first, then location from the new velocity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EulerIntegrator;

impl Integrator for EulerIntegrator {
    fn integrate(
        &self,
        items: &mut [ForceItem],
        timestep: f32,
        speed_limit: f32,
        accumulate: &dyn Fn(&mut [ForceItem]),
    ) {
        accumulate(items);
        for item in items.iter_mut() {
            if item.fixed {
                item.velocity = Point::default();
                continue;
            }
            let coeff = timestep * inverse_mass(item);
            item.velocity = limit_speed(
                item.velocity.add_point(item.force.scale(coeff)),
                speed_limit,
            );
            item.location = item.location.add_point(item.velocity.scale(timestep));
        }
    }
}

/// Classic fourth-order Runge-Kutta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RungeKuttaIntegrator;

impl Integrator for RungeKuttaIntegrator {
    fn integrate(
        &self,
        items: &mut [ForceItem],
        timestep: f32,
        speed_limit: f32,
        accumulate: &dyn Fn(&mut [ForceItem]),
    ) {
        let start: Vec<Point> = items.iter().map(|item| item.location).collect();
        // k: location deltas, l: velocity deltas, one per stage
        let mut k = vec![[Point::default(); 4]; items.len()];
        let mut l = vec![[Point::default(); 4]; items.len()];

        for stage in 0..4 {
            accumulate(items);
            for (i, item) in items.iter_mut().enumerate() {
                if item.fixed {
                    continue;
                }
                let coeff = timestep * inverse_mass(item);
                let velocity = match stage {
                    0 => item.velocity,
                    1 | 2 => item.velocity.add_point(l[i][stage - 1].scale(0.5)),
                    _ => item.velocity.add_point(l[i][2]),
                };
                k[i][stage] = velocity.scale(timestep);
                l[i][stage] = item.force.scale(coeff);

                let step = match stage {
                    0 | 1 => k[i][stage].scale(0.5),
                    _ => k[i][stage],
                };
                if stage < 3 {
                    item.location = start[i].add_point(step);
                }
            }
        }

        for (i, item) in items.iter_mut().enumerate() {
            if item.fixed {
                item.velocity = Point::default();
                item.location = start[i];
                continue;
            }
            let weighted = |v: &[Point; 4]| {
                v[0].add_point(v[1].scale(2.0))
                    .add_point(v[2].scale(2.0))
                    .add_point(v[3])
                    .scale(1.0 / 6.0)
            };
            item.location = start[i].add_point(weighted(&k[i]));
            item.velocity = limit_speed(item.velocity.add_point(weighted(&l[i])), speed_limit);
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn constant_push(items: &mut [ForceItem]) {
        for item in items.iter_mut() {
            item.force = if item.fixed {
                Point::default()
            } else {
                Point::new(0.001, 0.0)
            };
        }
    }

    #[test]
    fn test_euler_constant_force() {
        let mut items = vec![ForceItem::new(Point::default())];
        EulerIntegrator.integrate(&mut items, 10.0, 10.0, &constant_push);

        // v = F * dt / m = 0.01; x = v * dt = 0.1
        assert_approx_eq!(f32, items[0].velocity.x(), 0.01);
        assert_approx_eq!(f32, items[0].location.x(), 0.1);
    }

    #[test]
    fn test_runge_kutta_constant_force() {
        let mut items = vec![ForceItem::new(Point::default())];
        RungeKuttaIntegrator.integrate(&mut items, 10.0, 10.0, &constant_push);

        // exact: x = a * t^2 / 2 = 0.05
        assert_approx_eq!(f32, items[0].velocity.x(), 0.01, epsilon = 1e-6);
        assert_approx_eq!(f32, items[0].location.x(), 0.05, epsilon = 1e-6);
    }

    #[test]
    fn test_mass_scales_acceleration() {
        let mut items = vec![ForceItem::new(Point::default()).with_mass(2.0)];
        EulerIntegrator.integrate(&mut items, 10.0, 10.0, &constant_push);
        assert_approx_eq!(f32, items[0].velocity.x(), 0.005);
    }

    #[test]
    fn test_fixed_items_stay_put() {
        for integrator in [
            &EulerIntegrator as &dyn Integrator,
            &RungeKuttaIntegrator as &dyn Integrator,
        ] {
            let mut items = vec![ForceItem::new(Point::new(3.0, 4.0)).with_fixed(true)];
            items[0].velocity = Point::new(1.0, 1.0);
            integrator.integrate(&mut items, 10.0, 1.0, &constant_push);
            assert_eq!(items[0].location, Point::new(3.0, 4.0));
            assert_eq!(items[0].velocity, Point::default());
        }
    }
}
