//! # Pin Joint
//!
//! Holds two anchor points at a fixed distance apart, like a massless rod.
//! The rest distance defaults to the anchor separation at creation time and
//! may be retuned afterwards.

use crate::body::Body;
use crate::constraints::{
    anchor_arm, apply_impulses, k_scalar, normal_relative_velocity, Tuning,
};
use crate::types::Vec2;

pub struct PinJoint {
    pub anchor_a: Vec2,
    pub anchor_b: Vec2,
    pub dist: f32,

    r1: Vec2,
    r2: Vec2,
    n: Vec2,
    n_mass: f32,
    j_max: f32,
    bias: f32,
    jn_acc: f32,
}

impl PinJoint {
    /// `dist` of `None` measures the rod length from the bodies' current
    /// anchor positions.
    #[must_use]
    pub fn new(a: &Body, b: &Body, anchor_a: Vec2, anchor_b: Vec2, dist: Option<f32>) -> Self {
        let dist = dist.unwrap_or_else(|| {
            (b.local_to_world(anchor_b) - a.local_to_world(anchor_a)).length()
        });
        Self {
            anchor_a,
            anchor_b,
            dist,
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
        // Coincident anchors leave the axis undefined; zero normal makes
        // the solve a no-op for this step.
        self.n = delta.normalized();

        self.n_mass = 1.0 / k_scalar(a, b, self.r1, self.r2, self.n);

        self.j_max = tune.j_max;
        self.bias = (-tune.error_coef * (dist - self.dist) / dt)
            .clamp(-tune.max_bias, tune.max_bias);
    }

    pub(crate) fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f32) {
        apply_impulses(a, b, self.r1, self.r2, self.n * (self.jn_acc * dt_coef));
    }

    pub(crate) fn apply_impulse(&mut self, a: &mut Body, b: &mut Body) {
        let vrn = normal_relative_velocity(a, b, self.r1, self.r2, self.n);

        let jn = (self.bias - vrn) * self.n_mass;
        let jn_old = self.jn_acc;
        self.jn_acc = (jn_old + jn).clamp(-self.j_max, self.j_max);

        apply_impulses(a, b, self.r1, self.r2, self.n * (self.jn_acc - jn_old));
    }
}
