//! # Slide Joint
//!
//! Keeps the anchor separation within a `[min, max]` band. Inside the band
//! the bodies move freely; at either limit the joint behaves like a rigid
//! pin until the separation re-enters the band.

use crate::body::Body;
use crate::constraints::{
    anchor_arm, apply_impulses, k_scalar, relative_velocity, Tuning,
};
use crate::types::Vec2;

pub struct SlideJoint {
    pub anchor_a: Vec2,
    pub anchor_b: Vec2,
    pub min: f32,
    pub max: f32,

    r1: Vec2,
    r2: Vec2,
    n: Vec2,
    n_mass: f32,
    j_max: f32,
    bias: f32,
    jn_acc: f32,
}

impl SlideJoint {
    #[must_use]
    pub fn new(anchor_a: Vec2, anchor_b: Vec2, min: f32, max: f32) -> Self {
        Self {
            anchor_a,
            anchor_b,
            min,
            max,
            r1: Vec2::ZERO,
            r2: Vec2::ZERO,
            n: Vec2::ZERO,
            n_mass: 0.0,
            j_max: 0.0,
            bias: 0.0,
            jn_acc: 0.0,
        }
    }

    #[must_use]
    pub fn impulse(&self) -> f32 {
        self.jn_acc.abs()
    }

    pub(crate) fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f32, tune: Tuning) {
        self.r1 = anchor_arm(a, self.anchor_a);
        self.r2 = anchor_arm(b, self.anchor_b);

        let delta = (b.world_cog() + self.r2) - (a.world_cog() + self.r1);
        let dist = delta.length();
        let mut pdist = 0.0;
        if dist > self.max {
            pdist = dist - self.max;
            self.n = delta.normalized();
        } else if dist < self.min {
            pdist = self.min - dist;
            self.n = -delta.normalized();
        } else {
            // Inside the band: no constraint this step.
            self.n = Vec2::ZERO;
            self.jn_acc = 0.0;
        }

        self.n_mass = 1.0 / k_scalar(a, b, self.r1, self.r2, self.n);

        self.j_max = tune.j_max;
        self.bias = (-tune.error_coef * pdist / dt).clamp(-tune.max_bias, tune.max_bias);
    }

    pub(crate) fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f32) {
        apply_impulses(a, b, self.r1, self.r2, self.n * (self.jn_acc * dt_coef));
    }

    pub(crate) fn apply_impulse(&mut self, a: &mut Body, b: &mut Body) {
        if self.n == Vec2::ZERO {
            return;
        }

        let vr = relative_velocity(a, b, self.r1, self.r2);
        let vrn = vr.dot(self.n);

        let jn = (self.bias - vrn) * self.n_mass;
        let jn_old = self.jn_acc;
        // One-sided: the joint only ever pulls back toward the band.
        self.jn_acc = (jn_old + jn).clamp(-self.j_max, 0.0);

        apply_impulses(a, b, self.r1, self.r2, self.n * (self.jn_acc - jn_old));
    }
}
