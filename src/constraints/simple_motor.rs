//! # Simple Motor
//!
//! Drives the relative angular velocity of two bodies toward a constant
//! rate. Cap `max_force` on the owning constraint to give the motor finite
//! torque.

use crate::body::Body;
use crate::constraints::Tuning;

pub struct SimpleMotor {
    /// Desired relative angular velocity, radians per second.
    pub rate: f32,

    i_sum: f32,
    j_max: f32,
    j_acc: f32,
}

impl SimpleMotor {
    #[must_use]
    pub fn new(rate: f32) -> Self {
        Self {
            rate,
            i_sum: 0.0,
            j_max: 0.0,
            j_acc: 0.0,
        }
    }

    #[must_use]
    pub fn impulse(&self) -> f32 {
        self.j_acc.abs()
    }

    pub(crate) fn pre_step(&mut self, a: &mut Body, b: &mut Body, tune: Tuning) {
        self.i_sum = 1.0 / (a.moment_inv() + b.moment_inv());
        self.j_max = tune.j_max;
    }

    pub(crate) fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f32) {
        let j = self.j_acc * dt_coef;
        a.angular_velocity -= j * a.moment_inv();
        b.angular_velocity += j * b.moment_inv();
    }

    pub(crate) fn apply_impulse(&mut self, a: &mut Body, b: &mut Body) {
        let wr = b.angular_velocity - a.angular_velocity + self.rate;

        let j = -wr * self.i_sum;
        let j_old = self.j_acc;
        self.j_acc = (j_old + j).clamp(-self.j_max, self.j_max);
        let j = self.j_acc - j_old;

        a.angular_velocity -= j * a.moment_inv();
        b.angular_velocity += j * b.moment_inv();
    }
}
