//! # Gear Joint
//!
//! Locks the angular velocities of two bodies to a fixed ratio, like meshed
//! gears, with `phase` as the constant angular offset.

use crate::body::Body;
use crate::constraints::Tuning;

pub struct GearJoint {
    pub phase: f32,
    ratio: f32,
    ratio_inv: f32,

    i_sum: f32,
    j_max: f32,
    bias: f32,
    j_acc: f32,
}

impl GearJoint {
    /// # Panics
    /// Panics if `ratio` is zero.
    #[must_use]
    pub fn new(phase: f32, ratio: f32) -> Self {
        assert!(ratio != 0.0, "gear ratio must be non-zero");
        Self {
            phase,
            ratio,
            ratio_inv: 1.0 / ratio,
            i_sum: 0.0,
            j_max: 0.0,
            bias: 0.0,
            j_acc: 0.0,
        }
    }

    #[must_use]
    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// # Panics
    /// Panics if `ratio` is zero.
    pub fn set_ratio(&mut self, ratio: f32) {
        assert!(ratio != 0.0, "gear ratio must be non-zero");
        self.ratio = ratio;
        self.ratio_inv = 1.0 / ratio;
    }

    #[must_use]
    pub fn impulse(&self) -> f32 {
        self.j_acc.abs()
    }

    pub(crate) fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f32, tune: Tuning) {
        self.i_sum = 1.0 / (a.moment_inv() * self.ratio_inv + self.ratio * b.moment_inv());

        self.j_max = tune.j_max;
        self.bias = (-tune.error_coef * (b.angle() * self.ratio - a.angle() - self.phase) / dt)
            .clamp(-tune.max_bias, tune.max_bias);
    }

    pub(crate) fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f32) {
        let j = self.j_acc * dt_coef;
        a.angular_velocity -= j * a.moment_inv() * self.ratio_inv;
        b.angular_velocity += j * b.moment_inv();
    }

    pub(crate) fn apply_impulse(&mut self, a: &mut Body, b: &mut Body) {
        let wr = b.angular_velocity * self.ratio - a.angular_velocity;

        let j = (self.bias - wr) * self.i_sum;
        let j_old = self.j_acc;
        self.j_acc = (j_old + j).clamp(-self.j_max, self.j_max);
        let j = self.j_acc - j_old;

        a.angular_velocity -= j * a.moment_inv() * self.ratio_inv;
        b.angular_velocity += j * b.moment_inv();
    }
}
