//! # Ratchet Joint
//!
//! A rotary ratchet (socket-wrench behavior): the relative angle may only
//! advance in the direction of `ratchet`, clicking in increments of that
//! size, offset by `phase`.

use crate::body::Body;
use crate::constraints::Tuning;

pub struct RatchetJoint {
    pub phase: f32,
    pub ratchet: f32,
    /// Most recently engaged ratchet angle; updated as the joint clicks
    /// forward.
    pub angle: f32,

    i_sum: f32,
    j_max: f32,
    bias: f32,
    j_acc: f32,
}

impl RatchetJoint {
    #[must_use]
    pub fn new(a: &Body, b: &Body, phase: f32, ratchet: f32) -> Self {
        Self {
            phase,
            ratchet,
            angle: b.angle() - a.angle(),
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
        let delta = b.angle() - a.angle();
        let diff = self.angle - delta;
        let mut pdist = 0.0;

        if diff * self.ratchet > 0.0 {
            pdist = diff;
        } else {
            // Moved past a tooth; advance to the next engaged angle.
            self.angle = ((delta - self.phase) / self.ratchet).floor() * self.ratchet + self.phase;
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
        self.j_acc =
            ((j_old + j) * self.ratchet).clamp(0.0, self.j_max * self.ratchet.abs()) / self.ratchet;
        let j = self.j_acc - j_old;

        a.angular_velocity -= j * a.moment_inv();
        b.angular_velocity += j * b.moment_inv();
    }
}
