//! # Groove Joint
//!
//! Pins an anchor on the second body into a line segment (the groove) fixed
//! on the first body. The anchor slides freely along the groove and pins
//! rigidly at either end. Solved as a 2x2 block like the pivot joint, with
//! the impulse projected onto the groove axis while unclamped.

use crate::body::Body;
use crate::constraints::{
    anchor_arm, apply_impulses, k_tensor, relative_velocity, Tuning,
};
use crate::types::{Mat2x2, Vec2};

pub struct GrooveJoint {
    /// Groove endpoints, local to the first body.
    pub groove_a: Vec2,
    pub groove_b: Vec2,
    /// Anchor, local to the second body.
    pub anchor_b: Vec2,

    grv_n: Vec2,
    grv_tn: Vec2,
    clamp: f32,
    r1: Vec2,
    r2: Vec2,
    k: Mat2x2,
    j_max: f32,
    bias: Vec2,
    j_acc: Vec2,
}

impl GrooveJoint {
    #[must_use]
    pub fn new(groove_a: Vec2, groove_b: Vec2, anchor_b: Vec2) -> Self {
        Self {
            groove_a,
            groove_b,
            anchor_b,
            grv_n: (groove_b - groove_a).normalized().perp(),
            grv_tn: Vec2::ZERO,
            clamp: 0.0,
            r1: Vec2::ZERO,
            r2: Vec2::ZERO,
            k: Mat2x2::new(0.0, 0.0, 0.0, 0.0),
            j_max: 0.0,
            bias: Vec2::ZERO,
            j_acc: Vec2::ZERO,
        }
    }

    #[must_use]
    pub fn impulse(&self) -> f32 {
        self.j_acc.length()
    }

    pub(crate) fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f32, tune: Tuning) {
        let ta = a.local_to_world(self.groove_a);
        let tb = a.local_to_world(self.groove_b);

        let n = self.grv_n.rotate(a.rotation());
        let d = ta.dot(n);
        self.grv_tn = n;

        self.r2 = anchor_arm(b, self.anchor_b);

        // Where along the groove the anchor currently sits, and whether it
        // is pinned at an end.
        let td = (b.world_cog() + self.r2).cross(n);
        if td <= ta.cross(n) {
            self.clamp = 1.0;
            self.r1 = ta - a.world_cog();
        } else if td >= tb.cross(n) {
            self.clamp = -1.0;
            self.r1 = tb - a.world_cog();
        } else {
            self.clamp = 0.0;
            self.r1 = n.rperp() * -td + n * d - a.world_cog();
        }

        self.k = k_tensor(a, b, self.r1, self.r2);

        self.j_max = tune.j_max;
        let delta = (b.world_cog() + self.r2) - (a.world_cog() + self.r1);
        self.bias = (delta * (-tune.error_coef / dt)).clamp_len(tune.max_bias);
    }

    fn constrain(&self, j: Vec2) -> Vec2 {
        let n = self.grv_tn;
        // While sliding, only the component perpendicular to the groove may
        // push; at an end the full impulse is allowed outward.
        let clamped = if self.clamp * j.cross(n) > 0.0 {
            j
        } else {
            n * j.dot(n)
        };
        clamped.clamp_len(self.j_max)
    }

    pub(crate) fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f32) {
        apply_impulses(a, b, self.r1, self.r2, self.j_acc * dt_coef);
    }

    pub(crate) fn apply_impulse(&mut self, a: &mut Body, b: &mut Body) {
        let vr = relative_velocity(a, b, self.r1, self.r2);

        let j = self.k.transform(self.bias - vr);
        let j_old = self.j_acc;
        self.j_acc = self.constrain(j_old + j);

        apply_impulses(a, b, self.r1, self.r2, self.j_acc - j_old);
    }
}
