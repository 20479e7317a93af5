//! # Damped Rotary Spring
//!
//! Angular analogue of the damped spring: a torque proportional to the
//! angular offset from the rest angle, with explicit angular damping.

use crate::body::Body;

/// Custom torque law; receives the relative angle, returns a torque.
pub type SpringTorqueFn = fn(&DampedRotarySpring, f32) -> f32;

pub struct DampedRotarySpring {
    pub rest_angle: f32,
    pub stiffness: f32,
    pub damping: f32,
    pub torque_fn: Option<SpringTorqueFn>,

    i_sum: f32,
    w_coef: f32,
    target_wrn: f32,
    j_acc: f32,
}

impl DampedRotarySpring {
    #[must_use]
    pub fn new(rest_angle: f32, stiffness: f32, damping: f32) -> Self {
        Self {
            rest_angle,
            stiffness,
            damping,
            torque_fn: None,
            i_sum: 0.0,
            w_coef: 0.0,
            target_wrn: 0.0,
            j_acc: 0.0,
        }
    }

    #[must_use]
    pub fn impulse(&self) -> f32 {
        self.j_acc.abs()
    }

    fn spring_torque(&self, relative_angle: f32) -> f32 {
        match self.torque_fn {
            Some(f) => f(self, relative_angle),
            None => (relative_angle - self.rest_angle) * self.stiffness,
        }
    }

    pub(crate) fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f32) {
        let moment = a.moment_inv() + b.moment_inv();
        debug_assert!(moment != 0.0, "unsolvable spring between two non-rotating bodies");
        self.i_sum = 1.0 / moment;

        self.w_coef = 1.0 - (-self.damping * dt * moment).exp();
        self.target_wrn = 0.0;

        // Apply the spring torque for this step up front.
        let j_spring = self.spring_torque(a.angle() - b.angle()) * dt;
        self.j_acc = j_spring;
        a.angular_velocity -= j_spring * a.moment_inv();
        b.angular_velocity += j_spring * b.moment_inv();
    }

    pub(crate) fn apply_impulse(&mut self, a: &mut Body, b: &mut Body) {
        let wrn = a.angular_velocity - b.angular_velocity;

        let w_damp = (self.target_wrn - wrn) * self.w_coef;
        self.target_wrn = wrn + w_damp;

        let j_damp = w_damp * self.i_sum;
        self.j_acc += j_damp;
        a.angular_velocity += j_damp * a.moment_inv();
        b.angular_velocity -= j_damp * b.moment_inv();
    }
}
