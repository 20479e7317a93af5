//! # Rotary Limit Joint
//!
//! Constrains the relative angle of two bodies to a `[min, max]` band;
//! inside the band the bodies spin freely.

use crate::body::Body;
use crate::constraints::Tuning;

pub struct RotaryLimitJoint {
    pub min: f32,
    pub max: f32,

    i_sum: f32,
    j_max: f32,
    bias: f32,
    j_acc: f32,
}

impl RotaryLimitJoint {
    #[must_use]
    pub fn new(min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            i_sum: 0.0,
            j_max: 0.0,
            bias: 0.0,
            j_acc: 0.0,
        }
    }

    #[must_use]
    pub fn impulse(&self) -> f32 {
        self.j_acc.abs()
    }

    pub(crate) fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f32, tune: Tuning) {
        let dist = b.angle() - a.angle();
        let mut pdist = 0.0;
        if dist > self.max {
            pdist = self.max - dist;
        } else if dist < self.min {
            pdist = self.min - dist;
        }

        self.i_sum = 1.0 / (a.moment_inv() + b.moment_inv());

        self.j_max = tune.j_max;
        self.bias = (-tune.error_coef * pdist / dt).clamp(-tune.max_bias, tune.max_bias);

        if self.bias == 0.0 {
            self.j_acc = 0.0;
        }
    }

    pub(crate) fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f32) {
        let j = self.j_acc * dt_coef;
        a.angular_velocity -= j * a.moment_inv();
        b.angular_velocity += j * b.moment_inv();
    }

    pub(crate) fn apply_impulse(&mut self, a: &mut Body, b: &mut Body) {
        if self.bias == 0.0 {
            return;
        }

        let wr = b.angular_velocity - a.angular_velocity;

        let j = -(self.bias + wr) * self.i_sum;
        let j_old = self.j_acc;
        // One-sided toward the violated limit.
        self.j_acc = if self.bias < 0.0 {
            (j_old + j).clamp(0.0, self.j_max)
        } else {
            (j_old + j).clamp(-self.j_max, 0.0)
        };
        let j = self.j_acc - j_old;

        a.angular_velocity -= j * a.moment_inv();
        b.angular_velocity += j * b.moment_inv();
    }
}
