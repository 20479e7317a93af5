//! # Integration Passes
//!
//! Velocity and position integration over every awake body. Each body
//! integrates independently, so with the `parallel` feature enabled both
//! passes fan out across a rayon pool.

use crate::arena::Arena;
use crate::body::{Body, BodyKind};
use crate::types::Vec2;

/// Applies gravity, damping and accumulated forces to every awake dynamic
/// body. Kinematic and static bodies keep their user-set velocities.
pub(crate) fn integrate_velocities(bodies: &mut Arena<Body>, gravity: Vec2, damping: f32, dt: f32) {
    #[cfg(feature = "parallel")]
    {
        use rayon::iter::ParallelIterator;
        bodies.par_values_mut().for_each(|body| {
            if body.kind() == BodyKind::Dynamic && !body.is_sleeping() {
                body.run_velocity_update(gravity, damping, dt);
            }
        });
    }
    #[cfg(not(feature = "parallel"))]
    for (_, body) in bodies.iter_mut() {
        if body.kind() == BodyKind::Dynamic && !body.is_sleeping() {
            body.run_velocity_update(gravity, damping, dt);
        }
    }
}

/// Advances every awake non-static body by its velocity plus accumulated
/// bias velocity, then clears the bias.
pub(crate) fn integrate_positions(bodies: &mut Arena<Body>, dt: f32) {
    #[cfg(feature = "parallel")]
    {
        use rayon::iter::ParallelIterator;
        bodies.par_values_mut().for_each(|body| {
            if body.kind() != BodyKind::Static && !body.is_sleeping() {
                body.run_position_update(dt);
            }
        });
    }
    #[cfg(not(feature = "parallel"))]
    for (_, body) in bodies.iter_mut() {
        if body.kind() != BodyKind::Static && !body.is_sleeping() {
            body.run_position_update(dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravity_accelerates_only_dynamic_bodies() {
        let mut bodies = Arena::new();
        let dynamic = bodies.insert(Body::new(1.0, 1.0));
        let kinematic = bodies.insert(Body::new_kinematic());

        integrate_velocities(&mut bodies, Vec2::new(0.0, -10.0), 1.0, 0.5);

        assert_eq!(
            bodies.get(dynamic).unwrap().velocity,
            Vec2::new(0.0, -5.0)
        );
        assert_eq!(bodies.get(kinematic).unwrap().velocity, Vec2::ZERO);
    }

    #[test]
    fn kinematic_bodies_still_move() {
        let mut bodies = Arena::new();
        let id = bodies.insert(Body::new_kinematic());
        bodies.get_mut(id).unwrap().velocity = Vec2::new(2.0, 0.0);

        integrate_positions(&mut bodies, 1.0);

        assert_eq!(bodies.get(id).unwrap().position(), Vec2::new(2.0, 0.0));
    }
}
