//! # Damped Spring
//!
//! A soft linear spring between two anchors with explicit damping. The
//! spring force is applied directly during the pre-step; the solver
//! iterations then remove velocity along the axis according to the damping
//! coefficient. No positional correction and no warm starting.

use crate::body::Body;
use crate::constraints::{
    anchor_arm, apply_impulses, k_scalar, normal_relative_velocity,
};
use crate::types::Vec2;

/// Custom force law; receives current anchor separation, returns force
/// along the axis (positive pushes the anchors apart).
pub type SpringForceFn = fn(&DampedSpring, f32) -> f32;

pub struct DampedSpring {
    pub anchor_a: Vec2,
    pub anchor_b: Vec2,
    pub rest_length: f32,
    pub stiffness: f32,
    pub damping: f32,
    pub force_fn: Option<SpringForceFn>,

    r1: Vec2,
    r2: Vec2,
    n: Vec2,
    n_mass: f32,
    target_vrn: f32,
    v_coef: f32,
    j_acc: f32,
}

impl DampedSpring {
    #[must_use]
    pub fn new(
        anchor_a: Vec2,
        anchor_b: Vec2,
        rest_length: f32,
        stiffness: f32,
        damping: f32,
    ) -> Self {
        Self {
            anchor_a,
            anchor_b,
            rest_length,
            stiffness,
            damping,
            force_fn: None,
            r1: Vec2::ZERO,
            r2: Vec2::ZERO,
            n: Vec2::ZERO,
            n_mass: 0.0,
            target_vrn: 0.0,
            v_coef: 0.0,
            j_acc: 0.0,
        }
    }

    #[must_use]
    pub fn impulse(&self) -> f32 {
        self.j_acc.abs()
    }

    fn spring_force(&self, dist: f32) -> f32 {
        match self.force_fn {
            Some(f) => f(self, dist),
            None => (self.rest_length - dist) * self.stiffness,
        }
    }

    pub(crate) fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f32) {
        self.r1 = anchor_arm(a, self.anchor_a);
        self.r2 = anchor_arm(b, self.anchor_b);

        let delta = (b.world_cog() + self.r2) - (a.world_cog() + self.r1);
        let dist = delta.length();
        self.n = delta.normalized();

        let k = k_scalar(a, b, self.r1, self.r2, self.n);
        self.n_mass = 1.0 / k;

        self.target_vrn = 0.0;
        self.v_coef = 1.0 - (-self.damping * dt * k).exp();

        // Apply the spring force for this step up front.
        let j_spring = self.spring_force(dist) * dt;
        self.j_acc = j_spring;
        apply_impulses(a, b, self.r1, self.r2, self.n * j_spring);
    }

    pub(crate) fn apply_impulse(&mut self, a: &mut Body, b: &mut Body) {
        let vrn = normal_relative_velocity(a, b, self.r1, self.r2, self.n);

        // Semi-implicit damping: chase the target axial velocity.
        let v_damp = (self.target_vrn - vrn) * self.v_coef;
        self.target_vrn = vrn + v_damp;

        let j_damp = v_damp * self.n_mass;
        self.j_acc += j_damp;
        apply_impulses(a, b, self.r1, self.r2, self.n * j_damp);
    }
}
