//! # Joint Solver Step
//!
//! Drives every joint constraint through its pre-step, warm start and
//! per-iteration impulse, skipping joints whose bodies are all asleep or
//! immovable.

use crate::arena::Arena;
use crate::body::{Body, BodyId, BodyKind};
use crate::constraints::Constraint;

/// A joint participates in the solve only while it can move something.
fn is_active(bodies: &Arena<Body>, a: BodyId, b: BodyId) -> bool {
    let awake_dynamic = |id: BodyId| {
        bodies
            .get(id)
            .is_some_and(|body| body.kind() == BodyKind::Dynamic && !body.is_sleeping())
    };
    awake_dynamic(a) || awake_dynamic(b)
}

pub(crate) fn pre_step(constraints: &mut Arena<Constraint>, bodies: &mut Arena<Body>, dt: f32) {
    for (_, constraint) in constraints.iter_mut() {
        let (ia, ib) = constraint.bodies();
        if !is_active(bodies, ia, ib) {
            continue;
        }
        if let Some((a, b)) = bodies.get2_mut(ia, ib) {
            constraint.pre_step(a, b, dt);
        }
    }
}

pub(crate) fn apply_cached_impulses(
    constraints: &mut Arena<Constraint>,
    bodies: &mut Arena<Body>,
    dt_coef: f32,
) {
    for (_, constraint) in constraints.iter_mut() {
        let (ia, ib) = constraint.bodies();
        if !is_active(bodies, ia, ib) {
            continue;
        }
        if let Some((a, b)) = bodies.get2_mut(ia, ib) {
            constraint.apply_cached_impulse(a, b, dt_coef);
        }
    }
}

/// One solver iteration over every active joint.
pub(crate) fn apply_impulses(constraints: &mut Arena<Constraint>, bodies: &mut Arena<Body>) {
    for (_, constraint) in constraints.iter_mut() {
        let (ia, ib) = constraint.bodies();
        if !is_active(bodies, ia, ib) {
            continue;
        }
        if let Some((a, b)) = bodies.get2_mut(ia, ib) {
            constraint.apply_impulse(a, b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{ConstraintKind, PinJoint};
    use crate::types::Vec2;

    #[test]
    fn pin_joint_cancels_separating_velocity() {
        let mut bodies = Arena::new();
        let a = Body::new(1.0, 1.0);
        let mut b = Body::new(1.0, 1.0);
        b.set_position(Vec2::new(10.0, 0.0));
        b.velocity = Vec2::new(5.0, 0.0);

        let ia = bodies.insert(a);
        let ib = bodies.insert(b);

        let mut constraints = Arena::new();
        let pin = {
            let (ba, bb) = bodies.get2_mut(ia, ib).unwrap();
            PinJoint::new(ba, bb, Vec2::ZERO, Vec2::ZERO, None)
        };
        constraints.insert(Constraint::new(ia, ib, ConstraintKind::Pin(pin)));

        let dt = 1.0 / 60.0;
        pre_step(&mut constraints, &mut bodies, dt);
        apply_cached_impulses(&mut constraints, &mut bodies, 0.0);
        for _ in 0..10 {
            apply_impulses(&mut constraints, &mut bodies);
        }

        let va = bodies.get(ia).unwrap().velocity;
        let vb = bodies.get(ib).unwrap().velocity;
        // Stretch velocity along the rod is gone; momentum is shared.
        assert!((vb.x - va.x).abs() < 1e-4);
        assert!((va.x + vb.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn sleeping_pairs_are_skipped() {
        let mut bodies = Arena::new();
        let mut a = Body::new(1.0, 1.0);
        a.velocity = Vec2::new(1.0, 0.0);
        let ia = bodies.insert(a);
        let ib = bodies.insert(Body::new(1.0, 1.0));
        bodies.get_mut(ia).unwrap().sleeping = true;
        bodies.get_mut(ib).unwrap().sleeping = true;

        let mut constraints = Arena::new();
        let pin = {
            let (ba, bb) = bodies.get2_mut(ia, ib).unwrap();
            PinJoint::new(ba, bb, Vec2::ZERO, Vec2::ZERO, Some(1.0))
        };
        constraints.insert(Constraint::new(ia, ib, ConstraintKind::Pin(pin)));

        pre_step(&mut constraints, &mut bodies, 1.0 / 60.0);
        apply_impulses(&mut constraints, &mut bodies);

        assert_eq!(bodies.get(ia).unwrap().velocity, Vec2::new(1.0, 0.0));
    }
}
