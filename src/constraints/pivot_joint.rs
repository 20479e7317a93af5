//! # Pivot Joint
//!
//! Pins two anchor points together while leaving rotation free, solved as a
//! 2x2 block so the x and y axes converge together.

use crate::body::Body;
use crate::constraints::{
    anchor_arm, apply_impulses, k_tensor, relative_velocity, Tuning,
};
use crate::types::{Mat2x2, Vec2};

pub struct PivotJoint {
    pub anchor_a: Vec2,
    pub anchor_b: Vec2,

    r1: Vec2,
    r2: Vec2,
    k: Mat2x2,
    j_max: f32,
    bias: Vec2,
    j_acc: Vec2,
}

impl PivotJoint {
    #[must_use]
    pub fn new(anchor_a: Vec2, anchor_b: Vec2) -> Self {
        Self {
            anchor_a,
            anchor_b,
            r1: Vec2::ZERO,
            r2: Vec2::ZERO,
            k: Mat2x2::new(0.0, 0.0, 0.0, 0.0),
            j_max: 0.0,
            bias: Vec2::ZERO,
            j_acc: Vec2::ZERO,
        }
    }

    /// Builds the joint from a shared pivot point given in world
    /// coordinates.
    #[must_use]
    pub fn from_world_point(a: &Body, b: &Body, pivot: Vec2) -> Self {
        Self::new(a.world_to_local(pivot), b.world_to_local(pivot))
    }

    #[must_use]
    pub fn impulse(&self) -> f32 {
        self.j_acc.length()
    }

    pub(crate) fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f32, tune: Tuning) {
        self.r1 = anchor_arm(a, self.anchor_a);
        self.r2 = anchor_arm(b, self.anchor_b);

        self.k = k_tensor(a, b, self.r1, self.r2);

        self.j_max = tune.j_max;
        let delta = (b.world_cog() + self.r2) - (a.world_cog() + self.r1);
        self.bias = (delta * (-tune.error_coef / dt)).clamp_len(tune.max_bias);
    }

    pub(crate) fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f32) {
        apply_impulses(a, b, self.r1, self.r2, self.j_acc * dt_coef);
    }

    pub(crate) fn apply_impulse(&mut self, a: &mut Body, b: &mut Body) {
        let vr = relative_velocity(a, b, self.r1, self.r2);

        let j = self.k.transform(self.bias - vr);
        let j_old = self.j_acc;
        self.j_acc = (j_old + j).clamp_len(self.j_max);

        apply_impulses(a, b, self.r1, self.r2, self.j_acc - j_old);
    }
}
