//! # Rigid Bodies
//!
//! A body carries the dynamic state of the simulation: mass, moment, the
//! position of its origin, a unit rotation vector, velocities and the
//! per-step force and torque accumulators. Shapes attach to bodies; the
//! solver works exclusively on body velocities.

use crate::arena::Id;
use crate::constraints::Constraint;
use crate::shapes::Shape;
use crate::types::{Transform, Vec2};

pub type BodyId = Id<Body>;
pub type ShapeId = Id<Shape>;
pub type ConstraintId = Id<Constraint>;

/// How a body participates in the simulation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BodyKind {
    /// Simulated: responds to gravity, forces and collisions.
    Dynamic,
    /// Moved by the user via its velocity; infinite mass.
    Kinematic,
    /// Never moves; infinite mass.
    Static,
}

/// Velocity-update override. Receives the body, gravity, the per-step
/// damping fraction and dt, and must leave the body's velocities finite.
pub type VelocityFn = fn(&mut Body, gravity: Vec2, damping: f32, dt: f32);

/// Position-update override with the same contract as [`VelocityFn`].
pub type PositionFn = fn(&mut Body, dt: f32);

/// A 2D rigid body.
pub struct Body {
    kind: BodyKind,

    mass: f32,
    mass_inv: f32,
    moment: f32,
    moment_inv: f32,

    /// World position of the body origin.
    position: Vec2,
    /// Center of gravity in body-local coordinates.
    cog: Vec2,
    /// Unit rotation vector (cos a, sin a), composed incrementally.
    rot: Vec2,
    angle: f32,

    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub force: Vec2,
    pub torque: f32,

    // Pseudo-velocities used only by the penetration bias solver.
    pub(crate) v_bias: Vec2,
    pub(crate) w_bias: f32,

    pub(crate) sleeping: bool,
    pub(crate) idle_time: f32,

    pub(crate) velocity_fn: Option<VelocityFn>,
    pub(crate) position_fn: Option<PositionFn>,

    pub(crate) shapes: Vec<ShapeId>,
    pub(crate) constraints: Vec<ConstraintId>,
}

impl Body {
    /// Creates a dynamic body. Mass and moment may be refined later with
    /// [`Body::set_mass`] / [`Body::set_moment`]; they are validated when
    /// the space steps.
    #[must_use]
    pub fn new(mass: f32, moment: f32) -> Self {
        let mut body = Self {
            kind: BodyKind::Dynamic,
            mass: 0.0,
            mass_inv: 0.0,
            moment: 0.0,
            moment_inv: 0.0,
            position: Vec2::ZERO,
            cog: Vec2::ZERO,
            rot: Vec2::new(1.0, 0.0),
            angle: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
            v_bias: Vec2::ZERO,
            w_bias: 0.0,
            sleeping: false,
            idle_time: 0.0,
            velocity_fn: None,
            position_fn: None,
            shapes: Vec::new(),
            constraints: Vec::new(),
        };
        body.set_mass(mass);
        body.set_moment(moment);
        body
    }

    #[must_use]
    pub fn new_kinematic() -> Self {
        let mut body = Self::new(0.0, 0.0);
        body.kind = BodyKind::Kinematic;
        body.mass_inv = 0.0;
        body.moment_inv = 0.0;
        body
    }

    #[must_use]
    pub fn new_static() -> Self {
        let mut body = Self::new(0.0, 0.0);
        body.kind = BodyKind::Static;
        body.mass_inv = 0.0;
        body.moment_inv = 0.0;
        body
    }

    #[must_use]
    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    /// Changes the body kind. Non-dynamic kinds force infinite mass.
    pub fn set_kind(&mut self, kind: BodyKind) {
        self.kind = kind;
        if kind == BodyKind::Dynamic {
            self.mass_inv = if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 };
            self.moment_inv = if self.moment > 0.0 { 1.0 / self.moment } else { 0.0 };
        } else {
            self.mass_inv = 0.0;
            self.moment_inv = 0.0;
            self.velocity = Vec2::ZERO;
            self.angular_velocity = 0.0;
        }
    }

    #[must_use]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Sets the mass. Ignored for the inverse on non-dynamic bodies, whose
    /// inverse mass is pinned at zero.
    ///
    /// # Panics
    /// Panics on a NaN or negative mass; that is a caller bug.
    pub fn set_mass(&mut self, mass: f32) {
        assert!(!mass.is_nan() && mass >= 0.0, "body mass must be >= 0");
        self.mass = mass;
        self.mass_inv = if self.kind == BodyKind::Dynamic && mass > 0.0 && mass.is_finite() {
            1.0 / mass
        } else {
            0.0
        };
    }

    #[must_use]
    pub fn moment(&self) -> f32 {
        self.moment
    }

    /// # Panics
    /// Panics on a NaN or negative moment.
    pub fn set_moment(&mut self, moment: f32) {
        assert!(!moment.is_nan() && moment >= 0.0, "body moment must be >= 0");
        self.moment = moment;
        self.moment_inv = if self.kind == BodyKind::Dynamic && moment > 0.0 && moment.is_finite() {
            1.0 / moment
        } else {
            0.0
        };
    }

    #[must_use]
    pub fn mass_inv(&self) -> f32 {
        self.mass_inv
    }

    #[must_use]
    pub fn moment_inv(&self) -> f32 {
        self.moment_inv
    }

    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// # Panics
    /// Panics on a non-finite position.
    pub fn set_position(&mut self, position: Vec2) {
        assert!(position.is_finite(), "body position must be finite");
        self.position = position;
    }

    #[must_use]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// # Panics
    /// Panics on a non-finite angle.
    pub fn set_angle(&mut self, angle: f32) {
        assert!(angle.is_finite(), "body angle must be finite");
        self.angle = angle;
        self.rot = Vec2::for_angle(angle);
    }

    /// Unit rotation vector (cos, sin) of the current orientation.
    #[must_use]
    pub fn rotation(&self) -> Vec2 {
        self.rot
    }

    /// Center of gravity offset in body-local coordinates.
    #[must_use]
    pub fn center_of_gravity(&self) -> Vec2 {
        self.cog
    }

    pub fn set_center_of_gravity(&mut self, cog: Vec2) {
        assert!(cog.is_finite(), "center of gravity must be finite");
        self.cog = cog;
    }

    /// World position of the center of gravity.
    #[must_use]
    pub fn world_cog(&self) -> Vec2 {
        self.position + self.cog.rotate(self.rot)
    }

    /// Local-to-world transform of this body.
    #[must_use]
    pub fn transform(&self) -> Transform {
        Transform::rigid(self.position, self.rot)
    }

    #[must_use]
    pub fn local_to_world(&self, p: Vec2) -> Vec2 {
        self.transform().point(p)
    }

    #[must_use]
    pub fn world_to_local(&self, p: Vec2) -> Vec2 {
        (p - self.position).unrotate(self.rot)
    }

    #[must_use]
    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    pub fn set_velocity_fn(&mut self, f: VelocityFn) {
        self.velocity_fn = Some(f);
    }

    pub fn set_position_fn(&mut self, f: PositionFn) {
        self.position_fn = Some(f);
    }

    /// Ids of the shapes attached to this body.
    #[must_use]
    pub fn shapes(&self) -> &[ShapeId] {
        &self.shapes
    }

    /// Ids of the constraints referencing this body.
    #[must_use]
    pub fn constraints(&self) -> &[ConstraintId] {
        &self.constraints
    }

    /// Accumulates a force applied at a world point (adds torque about the
    /// center of gravity). Accumulators reset at the end of every step.
    pub fn apply_force_at_world_point(&mut self, force: Vec2, point: Vec2) {
        assert!(force.is_finite(), "force must be finite");
        self.force += force;
        let r = point - self.world_cog();
        self.torque += r.cross(force);
    }

    pub fn apply_force_at_local_point(&mut self, force: Vec2, point: Vec2) {
        let world = self.local_to_world(point);
        self.apply_force_at_world_point(force.rotate(self.rot), world);
    }

    /// Applies an impulse immediately to the velocities.
    pub fn apply_impulse_at_world_point(&mut self, impulse: Vec2, point: Vec2) {
        assert!(impulse.is_finite(), "impulse must be finite");
        let r = point - self.world_cog();
        self.apply_impulse(impulse, r);
    }

    /// Impulse at offset `r` from the world center of gravity.
    pub(crate) fn apply_impulse(&mut self, j: Vec2, r: Vec2) {
        self.velocity += j * self.mass_inv;
        self.angular_velocity += self.moment_inv * r.cross(j);
    }

    pub(crate) fn apply_bias_impulse(&mut self, j: Vec2, r: Vec2) {
        self.v_bias += j * self.mass_inv;
        self.w_bias += self.moment_inv * r.cross(j);
    }

    /// Velocity of the body at a world point.
    #[must_use]
    pub fn velocity_at_world_point(&self, point: Vec2) -> Vec2 {
        let r = point - self.world_cog();
        self.velocity + r.perp() * self.angular_velocity
    }

    #[must_use]
    pub fn kinetic_energy(&self) -> f32 {
        let v_sq = self.velocity.length_sq();
        let w_sq = self.angular_velocity * self.angular_velocity;
        (if v_sq > 0.0 { v_sq * self.mass } else { 0.0 })
            + (if w_sq > 0.0 { w_sq * self.moment } else { 0.0 })
    }

    /// Default velocity update: semi-implicit Euler with simple damping.
    pub fn update_velocity(&mut self, gravity: Vec2, damping: f32, dt: f32) {
        if self.kind != BodyKind::Dynamic {
            return;
        }
        self.velocity = self.velocity * damping + (gravity + self.force * self.mass_inv) * dt;
        self.angular_velocity = self.angular_velocity * damping + self.torque * self.moment_inv * dt;
        debug_assert!(
            self.velocity.is_finite() && self.angular_velocity.is_finite(),
            "velocity update produced a non-finite velocity"
        );
    }

    /// Default position update. The body pivots about its center of gravity;
    /// orientation is integrated by composing the rotation vector with the
    /// incremental rotation and re-normalizing, never rebuilt from the
    /// accumulated angle.
    pub fn update_position(&mut self, dt: f32) {
        let cog_w = self.world_cog() + (self.velocity + self.v_bias) * dt;
        let da = (self.angular_velocity + self.w_bias) * dt;
        self.angle += da;
        self.rot = self.rot.rotate(Vec2::for_angle(da)).normalized();
        self.position = cog_w - self.cog.rotate(self.rot);
        self.v_bias = Vec2::ZERO;
        self.w_bias = 0.0;
    }

    pub(crate) fn run_velocity_update(&mut self, gravity: Vec2, damping: f32, dt: f32) {
        match self.velocity_fn {
            Some(f) => f(self, gravity, damping, dt),
            None => self.update_velocity(gravity, damping, dt),
        }
    }

    pub(crate) fn run_position_update(&mut self, dt: f32) {
        match self.position_fn {
            Some(f) => f(self, dt),
            None => self.update_position(dt),
        }
    }

    pub(crate) fn clear_forces(&mut self) {
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_dynamic_inverse_mass_is_pinned_to_zero() {
        let mut body = Body::new_static();
        body.set_mass(10.0);
        body.set_moment(5.0);
        assert_eq!(body.mass_inv(), 0.0);
        assert_eq!(body.moment_inv(), 0.0);

        let mut kin = Body::new_kinematic();
        kin.set_mass(3.0);
        assert_eq!(kin.mass_inv(), 0.0);
    }

    #[test]
    fn free_body_drifts_without_forces() {
        let mut body = Body::new(1.0, 1.0);
        body.velocity = Vec2::new(5.0, 0.0);
        for _ in 0..10 {
            body.update_velocity(Vec2::ZERO, 1.0, 1.0);
            body.update_position(1.0);
        }
        assert!((body.position() - Vec2::new(50.0, 0.0)).length() < 1e-4);
        assert!((body.velocity - Vec2::new(5.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn rotation_vector_stays_unit_length() {
        let mut body = Body::new(1.0, 1.0);
        body.angular_velocity = 3.0;
        for _ in 0..1000 {
            body.update_position(1.0 / 60.0);
        }
        assert!((body.rotation().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn impulse_at_offset_adds_spin() {
        let mut body = Body::new(2.0, 4.0);
        body.apply_impulse_at_world_point(Vec2::new(0.0, 2.0), Vec2::new(1.0, 0.0));
        assert!((body.velocity.y - 1.0).abs() < 1e-6);
        assert!((body.angular_velocity - 0.5).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "finite")]
    fn non_finite_position_is_rejected() {
        let mut body = Body::new(1.0, 1.0);
        body.set_position(Vec2::new(f32::NAN, 0.0));
    }
}
