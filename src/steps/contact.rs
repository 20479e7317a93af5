//! # Contact Solver Step
//!
//! Sequential-impulse solve for one arbiter: the pre-step computes effective
//! masses, restitution and the penetration-correction bias for every contact
//! point, warm starting replays last step's accumulated impulses, and each
//! solver iteration removes normal approach velocity (clamped repulsive),
//! applies Coulomb friction along the tangent, and drains penetration
//! through the separate bias-velocity channel so position correction never
//! adds kinetic energy.

use crate::arbiter::Arbiter;
use crate::body::Body;
use crate::constraints::{
    apply_bias_impulses, k_scalar, normal_relative_velocity, relative_velocity,
};
use crate::types::Vec2;

/// Fills in per-contact solver state for this step.
///
/// `bias_per_dt` is the penetration-correction gain already divided by the
/// timestep; `slop` is the penetration depth tolerated without correction.
pub(crate) fn pre_step(arb: &mut Arbiter, a: &Body, b: &Body, slop: f32, bias_per_dt: f32) {
    let n = arb.normal;
    for con in &mut arb.contacts {
        // Anchor each contact midway between the two surface points.
        let p = (con.point_a + con.point_b) * 0.5;
        con.r1 = p - a.world_cog();
        con.r2 = p - b.world_cog();

        con.n_mass = 1.0 / k_scalar(a, b, con.r1, con.r2, n);
        con.t_mass = 1.0 / k_scalar(a, b, con.r1, con.r2, n.perp());

        con.bias = -bias_per_dt * (con.dist + slop).min(0.0);
        con.j_bias = 0.0;

        con.bounce = normal_relative_velocity(a, b, con.r1, con.r2, n) * arb.restitution;
    }
}

/// Replays the accumulated impulses from the previous step (warm starting).
pub(crate) fn apply_cached_impulse(arb: &mut Arbiter, a: &mut Body, b: &mut Body, dt_coef: f32) {
    let n = arb.normal;
    for con in &arb.contacts {
        let j = Vec2::new(con.jn_acc, con.jt_acc).rotate(n) * dt_coef;
        a.apply_impulse(-j, con.r1);
        b.apply_impulse(j, con.r2);
    }
}

/// One solver iteration over the arbiter's contact points.
pub(crate) fn apply_impulse(arb: &mut Arbiter, a: &mut Body, b: &mut Body) {
    let n = arb.normal;
    let surface_vr = arb.surface_velocity;
    let friction = arb.friction;

    for con in &mut arb.contacts {
        let (r1, r2) = (con.r1, con.r2);

        // Penetration correction runs on the bias velocities only.
        let vb1 = a.v_bias + r1.perp() * a.w_bias;
        let vb2 = b.v_bias + r2.perp() * b.w_bias;
        let vbn = (vb2 - vb1).dot(n);

        let jbn = (con.bias - vbn) * con.n_mass;
        let jbn_old = con.j_bias;
        con.j_bias = (jbn_old + jbn).max(0.0);
        apply_bias_impulses(a, b, r1, r2, n * (con.j_bias - jbn_old));

        let vr = relative_velocity(a, b, r1, r2);
        let vrn = vr.dot(n);
        let vrt = (vr + surface_vr).dot(n.perp());

        // Normal impulse, accumulated and clamped repulsive.
        let jn = -(con.bounce + vrn) * con.n_mass;
        let jn_old = con.jn_acc;
        con.jn_acc = (jn_old + jn).max(0.0);

        // Friction impulse, bounded by the friction cone.
        let jt_max = friction * con.jn_acc;
        let jt = -vrt * con.t_mass;
        let jt_old = con.jt_acc;
        con.jt_acc = (jt_old + jt).clamp(-jt_max, jt_max);

        let j = Vec2::new(con.jn_acc - jn_old, con.jt_acc - jt_old).rotate(n);
        a.apply_impulse(-j, r1);
        b.apply_impulse(j, r2);
    }
}
