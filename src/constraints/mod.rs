//! # Joint Constraints
//!
//! Every joint restricts the relative motion of two bodies and is solved
//! with sequential impulses, sharing the scalar/tensor effective-mass
//! helpers below. A [`Constraint`] wraps one concrete joint kind together
//! with the tuning knobs common to all of them (force limit, error bias,
//! bias velocity limit, self-collision flag).

pub(crate) mod damped_rotary_spring;
pub(crate) mod damped_spring;
pub(crate) mod gear_joint;
pub(crate) mod groove_joint;
pub(crate) mod pin_joint;
pub(crate) mod pivot_joint;
pub(crate) mod ratchet_joint;
pub(crate) mod rotary_limit_joint;
pub(crate) mod simple_motor;
pub(crate) mod slide_joint;

pub use damped_rotary_spring::DampedRotarySpring;
pub use damped_spring::DampedSpring;
pub use gear_joint::GearJoint;
pub use groove_joint::GrooveJoint;
pub use pin_joint::PinJoint;
pub use pivot_joint::PivotJoint;
pub use ratchet_joint::RatchetJoint;
pub use rotary_limit_joint::RotaryLimitJoint;
pub use simple_motor::SimpleMotor;
pub use slide_joint::SlideJoint;

use crate::body::{Body, BodyId};
use crate::types::{Mat2x2, Vec2};

// Default error bias: correct about 90% of positional error every 1/60 s.
const DEFAULT_ERROR_BIAS: f32 = 0.001_797_010_3; // (1 - 0.1)^60

/// One joint between two bodies.
pub struct Constraint {
    pub(crate) body_a: BodyId,
    pub(crate) body_b: BodyId,

    /// Upper bound on the force this joint may apply.
    pub max_force: f32,
    /// Fraction of positional error left uncorrected after one second.
    pub error_bias: f32,
    /// Upper bound on the corrective (bias) velocity.
    pub max_bias: f32,
    /// When false, shapes attached to the two joined bodies never collide
    /// with each other.
    pub collide_bodies: bool,

    pub kind: ConstraintKind,
}

/// The concrete joint wrapped by a [`Constraint`]. Match on this to reach
/// kind-specific parameters after construction.
pub enum ConstraintKind {
    Pin(PinJoint),
    Slide(SlideJoint),
    Pivot(PivotJoint),
    Groove(GrooveJoint),
    DampedSpring(DampedSpring),
    DampedRotarySpring(DampedRotarySpring),
    RotaryLimit(RotaryLimitJoint),
    Ratchet(RatchetJoint),
    Gear(GearJoint),
    Motor(SimpleMotor),
}

impl Constraint {
    /// Wraps a joint between two bodies with default tuning.
    ///
    /// # Panics
    /// Panics if both ids name the same body.
    #[must_use]
    pub fn new(body_a: BodyId, body_b: BodyId, kind: ConstraintKind) -> Self {
        assert!(body_a != body_b, "constraint must join two distinct bodies");
        Self {
            body_a,
            body_b,
            max_force: f32::INFINITY,
            error_bias: DEFAULT_ERROR_BIAS,
            max_bias: f32::INFINITY,
            collide_bodies: true,
            kind,
        }
    }

    #[must_use]
    pub fn bodies(&self) -> (BodyId, BodyId) {
        (self.body_a, self.body_b)
    }

    /// Magnitude of the impulse this joint applied during the last step.
    /// Divide by the timestep to recover a force.
    #[must_use]
    pub fn impulse(&self) -> f32 {
        match &self.kind {
            ConstraintKind::Pin(j) => j.impulse(),
            ConstraintKind::Slide(j) => j.impulse(),
            ConstraintKind::Pivot(j) => j.impulse(),
            ConstraintKind::Groove(j) => j.impulse(),
            ConstraintKind::DampedSpring(j) => j.impulse(),
            ConstraintKind::DampedRotarySpring(j) => j.impulse(),
            ConstraintKind::RotaryLimit(j) => j.impulse(),
            ConstraintKind::Ratchet(j) => j.impulse(),
            ConstraintKind::Gear(j) => j.impulse(),
            ConstraintKind::Motor(j) => j.impulse(),
        }
    }

    pub(crate) fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f32) {
        let tune = Tuning {
            error_coef: bias_coef(self.error_bias, dt),
            max_bias: self.max_bias,
            j_max: self.max_force * dt,
        };
        match &mut self.kind {
            ConstraintKind::Pin(j) => j.pre_step(a, b, dt, tune),
            ConstraintKind::Slide(j) => j.pre_step(a, b, dt, tune),
            ConstraintKind::Pivot(j) => j.pre_step(a, b, dt, tune),
            ConstraintKind::Groove(j) => j.pre_step(a, b, dt, tune),
            ConstraintKind::DampedSpring(j) => j.pre_step(a, b, dt),
            ConstraintKind::DampedRotarySpring(j) => j.pre_step(a, b, dt),
            ConstraintKind::RotaryLimit(j) => j.pre_step(a, b, dt, tune),
            ConstraintKind::Ratchet(j) => j.pre_step(a, b, dt, tune),
            ConstraintKind::Gear(j) => j.pre_step(a, b, dt, tune),
            ConstraintKind::Motor(j) => j.pre_step(a, b, tune),
        }
    }

    pub(crate) fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f32) {
        match &mut self.kind {
            ConstraintKind::Pin(j) => j.apply_cached_impulse(a, b, dt_coef),
            ConstraintKind::Slide(j) => j.apply_cached_impulse(a, b, dt_coef),
            ConstraintKind::Pivot(j) => j.apply_cached_impulse(a, b, dt_coef),
            ConstraintKind::Groove(j) => j.apply_cached_impulse(a, b, dt_coef),
            // Springs recompute from scratch; no warm start.
            ConstraintKind::DampedSpring(_) | ConstraintKind::DampedRotarySpring(_) => {}
            ConstraintKind::RotaryLimit(j) => j.apply_cached_impulse(a, b, dt_coef),
            ConstraintKind::Ratchet(j) => j.apply_cached_impulse(a, b, dt_coef),
            ConstraintKind::Gear(j) => j.apply_cached_impulse(a, b, dt_coef),
            ConstraintKind::Motor(j) => j.apply_cached_impulse(a, b, dt_coef),
        }
    }

    pub(crate) fn apply_impulse(&mut self, a: &mut Body, b: &mut Body) {
        match &mut self.kind {
            ConstraintKind::Pin(j) => j.apply_impulse(a, b),
            ConstraintKind::Slide(j) => j.apply_impulse(a, b),
            ConstraintKind::Pivot(j) => j.apply_impulse(a, b),
            ConstraintKind::Groove(j) => j.apply_impulse(a, b),
            ConstraintKind::DampedSpring(j) => j.apply_impulse(a, b),
            ConstraintKind::DampedRotarySpring(j) => j.apply_impulse(a, b),
            ConstraintKind::RotaryLimit(j) => j.apply_impulse(a, b),
            ConstraintKind::Ratchet(j) => j.apply_impulse(a, b),
            ConstraintKind::Gear(j) => j.apply_impulse(a, b),
            ConstraintKind::Motor(j) => j.apply_impulse(a, b),
        }
    }
}

/// Per-step solver tuning derived from the constraint's public knobs.
#[derive(Copy, Clone)]
pub(crate) struct Tuning {
    pub(crate) error_coef: f32,
    pub(crate) max_bias: f32,
    pub(crate) j_max: f32,
}

/// Fraction of positional error to feed back as bias velocity over `dt`.
pub(crate) fn bias_coef(error_bias: f32, dt: f32) -> f32 {
    1.0 - error_bias.powf(dt)
}

/// Rotates a body-local offset (measured from the body origin) into the
/// world frame, re-anchored on the center of gravity.
pub(crate) fn anchor_arm(body: &Body, anchor: Vec2) -> Vec2 {
    (anchor - body.center_of_gravity()).rotate(body.rotation())
}

pub(crate) fn relative_velocity(a: &Body, b: &Body, r1: Vec2, r2: Vec2) -> Vec2 {
    (b.velocity + r2.perp() * b.angular_velocity)
        - (a.velocity + r1.perp() * a.angular_velocity)
}

pub(crate) fn normal_relative_velocity(a: &Body, b: &Body, r1: Vec2, r2: Vec2, n: Vec2) -> f32 {
    relative_velocity(a, b, r1, r2).dot(n)
}

pub(crate) fn apply_impulses(a: &mut Body, b: &mut Body, r1: Vec2, r2: Vec2, j: Vec2) {
    a.apply_impulse(-j, r1);
    b.apply_impulse(j, r2);
}

pub(crate) fn apply_bias_impulses(a: &mut Body, b: &mut Body, r1: Vec2, r2: Vec2, j: Vec2) {
    a.apply_bias_impulse(-j, r1);
    b.apply_bias_impulse(j, r2);
}

/// Effective mass of the pair along axis `n` at offsets `r1`/`r2`, as the
/// inverse (a sum of inverse masses).
pub(crate) fn k_scalar(a: &Body, b: &Body, r1: Vec2, r2: Vec2, n: Vec2) -> f32 {
    let value = k_scalar_body(a, r1, n) + k_scalar_body(b, r2, n);
    debug_assert!(value != 0.0, "unsolvable constraint between two infinite-mass bodies");
    value
}

pub(crate) fn k_scalar_body(body: &Body, r: Vec2, n: Vec2) -> f32 {
    let rcn = r.cross(n);
    body.mass_inv() + body.moment_inv() * rcn * rcn
}

/// Inverted 2x2 effective-mass tensor for a point-to-point constraint.
pub(crate) fn k_tensor(a: &Body, b: &Body, r1: Vec2, r2: Vec2) -> Mat2x2 {
    let m_sum = a.mass_inv() + b.mass_inv();

    let mut k11 = m_sum;
    let mut k12 = 0.0;
    let mut k22 = m_sum;

    let a_i = a.moment_inv();
    k11 += a_i * r1.y * r1.y;
    k12 += -a_i * r1.x * r1.y;
    k22 += a_i * r1.x * r1.x;

    let b_i = b.moment_inv();
    k11 += b_i * r2.y * r2.y;
    k12 += -b_i * r2.x * r2.y;
    k22 += b_i * r2.x * r2.x;

    let det = k11 * k22 - k12 * k12;
    debug_assert!(det != 0.0, "unsolvable constraint between two infinite-mass bodies");
    let det_inv = 1.0 / det;
    Mat2x2::new(k22 * det_inv, -k12 * det_inv, -k12 * det_inv, k11 * det_inv)
}
