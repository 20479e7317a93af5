//! # Arbiters and Collision Handlers
//!
//! An arbiter tracks one colliding shape pair across steps. It owns the pair's
//! contact points with their impulse accumulators (warm starting), the
//! combined material for the pair, and the lifecycle state driving the
//! begin / pre-solve / post-solve / separate handler sequence.
//!
//! Arbiters are owned by the space's contact cache and must not be retained
//! outside a handler invocation; their backing contact data is recycled.

use std::collections::{HashMap, HashSet};

use crate::body::{BodyId, ShapeId};
use crate::collision::CollisionInfo;
use crate::shapes::Shape;
use crate::simulation::Space;
use crate::types::{CollisionType, Vec2};

/// One solved contact point inside an arbiter.
#[derive(Copy, Clone, Debug, Default)]
pub struct ContactPoint {
    /// Point on the first shape's surface (world).
    pub point_a: Vec2,
    /// Point on the second shape's surface (world).
    pub point_b: Vec2,
    /// Signed separation; negative while penetrating.
    pub dist: f32,

    // Solver state, filled in by the contact pre-step.
    pub(crate) r1: Vec2,
    pub(crate) r2: Vec2,
    pub(crate) n_mass: f32,
    pub(crate) t_mass: f32,
    pub(crate) bounce: f32,
    pub(crate) bias: f32,

    // Accumulated impulses, persisted across steps for warm starting.
    pub(crate) jn_acc: f32,
    pub(crate) jt_acc: f32,
    pub(crate) j_bias: f32,

    pub(crate) id: u32,
}

/// Lifecycle state of an arbiter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArbiterState {
    /// Created this step; `begin` has not been consulted yet.
    FirstCollision,
    /// Colliding normally.
    Normal,
    /// A begin handler vetoed the pair; stays ignored until separation.
    Ignore,
    /// No longer touching; kept briefly so warm-start data survives
    /// short separations.
    Cached,
    /// A shape was removed; evict after the separate callback.
    Invalidated,
}

/// A persistent contact record for one shape pair.
pub struct Arbiter {
    pub(crate) shape_a: ShapeId,
    pub(crate) shape_b: ShapeId,
    pub(crate) body_a: BodyId,
    pub(crate) body_b: BodyId,

    pub(crate) normal: Vec2,
    pub(crate) contacts: Vec<ContactPoint>,

    /// Combined friction for the pair. Writable from `pre_solve` to
    /// override it for the current step only.
    pub friction: f32,
    /// Combined restitution; same override rule as `friction`.
    pub restitution: f32,
    /// Relative surface velocity; same override rule.
    pub surface_velocity: Vec2,

    pub(crate) state: ArbiterState,
    pub(crate) stamp: u64,
}

/// Read/write snapshot of an arbiter's contact points. The setter exists so
/// an external snapshot mechanism can restore warm-start impulses.
#[derive(Clone, Debug, Default)]
pub struct ContactPointSet {
    pub normal: Vec2,
    pub points: Vec<ContactPointData>,
}

#[derive(Copy, Clone, Debug)]
pub struct ContactPointData {
    pub point_a: Vec2,
    pub point_b: Vec2,
    pub distance: f32,
    pub normal_impulse: f32,
    pub tangent_impulse: f32,
}

impl Arbiter {
    pub(crate) fn new(shape_a: ShapeId, shape_b: ShapeId, body_a: BodyId, body_b: BodyId) -> Self {
        Self {
            shape_a,
            shape_b,
            body_a,
            body_b,
            normal: Vec2::ZERO,
            contacts: Vec::new(),
            friction: 0.0,
            restitution: 0.0,
            surface_velocity: Vec2::ZERO,
            state: ArbiterState::FirstCollision,
            stamp: 0,
        }
    }

    /// The two shapes, in the pair's canonical order.
    #[must_use]
    pub fn shapes(&self) -> (ShapeId, ShapeId) {
        (self.shape_a, self.shape_b)
    }

    #[must_use]
    pub fn bodies(&self) -> (BodyId, BodyId) {
        (self.body_a, self.body_b)
    }

    /// Collision normal, pointing from the first shape to the second.
    #[must_use]
    pub fn normal(&self) -> Vec2 {
        self.normal
    }

    #[must_use]
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    /// True only on the step the pair started colliding.
    #[must_use]
    pub fn is_first_contact(&self) -> bool {
        self.state == ArbiterState::FirstCollision
    }

    /// True when the pair is separating because a shape was removed.
    #[must_use]
    pub fn is_removal(&self) -> bool {
        self.state == ArbiterState::Invalidated
    }

    /// Total impulse applied this step, in the normal/tangent frame of the
    /// pair, summed over contact points.
    #[must_use]
    pub fn total_impulse(&self) -> Vec2 {
        let mut sum = Vec2::ZERO;
        for c in &self.contacts {
            sum += self.normal * c.jn_acc + self.normal.perp() * c.jt_acc;
        }
        sum
    }

    /// Estimate of the energy lost in the collision (used for gameplay
    /// reactions, not fed back into the solve).
    #[must_use]
    pub fn total_ke(&self) -> f32 {
        let e_coef = (1.0 - self.restitution) / (1.0 + self.restitution);
        self.contacts
            .iter()
            .filter(|c| c.n_mass > 0.0)
            .map(|c| e_coef * c.jn_acc * c.jn_acc / c.n_mass)
            .sum()
    }

    #[must_use]
    pub fn contact_point_set(&self) -> ContactPointSet {
        ContactPointSet {
            normal: self.normal,
            points: self
                .contacts
                .iter()
                .map(|c| ContactPointData {
                    point_a: c.point_a,
                    point_b: c.point_b,
                    distance: c.dist,
                    normal_impulse: c.jn_acc,
                    tangent_impulse: c.jt_acc,
                })
                .collect(),
        }
    }

    /// Overwrites contact geometry and warm-start impulses.
    ///
    /// # Panics
    /// Panics if the point count differs from the current contact count.
    pub fn set_contact_point_set(&mut self, set: &ContactPointSet) {
        assert_eq!(
            set.points.len(),
            self.contacts.len(),
            "contact point count mismatch"
        );
        self.normal = set.normal;
        for (c, p) in self.contacts.iter_mut().zip(&set.points) {
            c.point_a = p.point_a;
            c.point_b = p.point_b;
            c.dist = p.distance;
            c.jn_acc = p.normal_impulse;
            c.jt_acc = p.tangent_impulse;
        }
    }

    /// Merges fresh narrow-phase output into this arbiter, carrying over
    /// impulse accumulators for contact points whose feature id matches.
    /// Unmatched points start cold (accumulators reset to zero).
    pub(crate) fn update(&mut self, info: &CollisionInfo, shape_a: &Shape, shape_b: &Shape) {
        self.normal = info.normal;

        let old = std::mem::take(&mut self.contacts);
        self.contacts = info
            .points
            .iter()
            .map(|raw| {
                let mut c = ContactPoint {
                    point_a: raw.point_a,
                    point_b: raw.point_b,
                    dist: raw.dist,
                    id: raw.id,
                    ..ContactPoint::default()
                };
                if let Some(prev) = old.iter().find(|p| p.id == raw.id) {
                    c.jn_acc = prev.jn_acc;
                    c.jt_acc = prev.jt_acc;
                }
                c
            })
            .collect();

        self.friction = combine_friction(shape_a.friction, shape_b.friction);
        self.restitution = combine_restitution(shape_a.elasticity, shape_b.elasticity);
        self.surface_velocity = shape_b.surface_velocity - shape_a.surface_velocity;
    }
}

/// Combine friction coefficients by multiplying the two shapes' values.
#[must_use]
pub fn combine_friction(f1: f32, f2: f32) -> f32 {
    f1 * f2
}

/// Combine restitution coefficients by multiplying the two shapes' values.
#[must_use]
pub fn combine_restitution(r1: f32, r2: f32) -> f32 {
    r1 * r2
}

// ---------------------------------------------------------------------------
// Collision handlers
// ---------------------------------------------------------------------------

/// User hooks invoked at arbiter lifecycle transitions. All methods have
/// accepting no-op defaults, so implementors override only what they need.
#[allow(unused_variables)]
pub trait CollisionHandler {
    /// First contact between the pair. Returning `false` ignores the pair
    /// until natural separation (only `separate` fires afterwards).
    fn begin(&mut self, arbiter: &mut Arbiter, ops: &mut PostStepOps) -> bool {
        true
    }

    /// Every step while colliding, before the solver. Returning `false`
    /// skips the contact this step; friction / restitution / surface
    /// velocity overrides on the arbiter apply to this step only.
    fn pre_solve(&mut self, arbiter: &mut Arbiter, ops: &mut PostStepOps) -> bool {
        true
    }

    /// Every step while colliding, after the solver. Read-only access to
    /// the applied impulse; never feeds back into this step's physics.
    fn post_solve(&mut self, arbiter: &Arbiter, ops: &mut PostStepOps) {}

    /// The pair stopped touching (or a shape was removed). Notification
    /// only.
    fn separate(&mut self, arbiter: &mut Arbiter, ops: &mut PostStepOps) {}
}

/// Accept-everything handler used when nothing is registered.
pub(crate) struct DefaultHandler;

impl CollisionHandler for DefaultHandler {}

/// Registration table for collision handlers: exact type pairs, per-type
/// wildcards, and an overridable global default.
pub(crate) struct HandlerTable {
    exact: HashMap<(CollisionType, CollisionType), Box<dyn CollisionHandler>>,
    wildcard: HashMap<CollisionType, Box<dyn CollisionHandler>>,
    default: Box<dyn CollisionHandler>,
}

fn pair_key(a: CollisionType, b: CollisionType) -> (CollisionType, CollisionType) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl HandlerTable {
    pub(crate) fn new() -> Self {
        Self {
            exact: HashMap::new(),
            wildcard: HashMap::new(),
            default: Box::new(DefaultHandler),
        }
    }

    pub(crate) fn set_pair(
        &mut self,
        a: CollisionType,
        b: CollisionType,
        handler: Box<dyn CollisionHandler>,
    ) {
        self.exact.insert(pair_key(a, b), handler);
    }

    pub(crate) fn set_wildcard(&mut self, t: CollisionType, handler: Box<dyn CollisionHandler>) {
        self.wildcard.insert(t, handler);
    }

    pub(crate) fn set_default(&mut self, handler: Box<dyn CollisionHandler>) {
        self.default = handler;
    }

    /// Runs the begin hooks for a type pair; any veto rejects the pair.
    pub(crate) fn begin(
        &mut self,
        a: CollisionType,
        b: CollisionType,
        arbiter: &mut Arbiter,
        ops: &mut PostStepOps,
    ) -> bool {
        if let Some(h) = self.exact.get_mut(&pair_key(a, b)) {
            return h.begin(arbiter, ops);
        }
        let mut hit_wildcard = false;
        let mut accept = true;
        for t in wildcard_types(a, b) {
            if let Some(h) = self.wildcard.get_mut(&t) {
                hit_wildcard = true;
                accept &= h.begin(arbiter, ops);
            }
        }
        if hit_wildcard {
            accept
        } else {
            self.default.begin(arbiter, ops)
        }
    }

    pub(crate) fn pre_solve(
        &mut self,
        a: CollisionType,
        b: CollisionType,
        arbiter: &mut Arbiter,
        ops: &mut PostStepOps,
    ) -> bool {
        if let Some(h) = self.exact.get_mut(&pair_key(a, b)) {
            return h.pre_solve(arbiter, ops);
        }
        let mut hit_wildcard = false;
        let mut accept = true;
        for t in wildcard_types(a, b) {
            if let Some(h) = self.wildcard.get_mut(&t) {
                hit_wildcard = true;
                accept &= h.pre_solve(arbiter, ops);
            }
        }
        if hit_wildcard {
            accept
        } else {
            self.default.pre_solve(arbiter, ops)
        }
    }

    pub(crate) fn post_solve(
        &mut self,
        a: CollisionType,
        b: CollisionType,
        arbiter: &Arbiter,
        ops: &mut PostStepOps,
    ) {
        if let Some(h) = self.exact.get_mut(&pair_key(a, b)) {
            h.post_solve(arbiter, ops);
            return;
        }
        let mut hit_wildcard = false;
        for t in wildcard_types(a, b) {
            if let Some(h) = self.wildcard.get_mut(&t) {
                hit_wildcard = true;
                h.post_solve(arbiter, ops);
            }
        }
        if !hit_wildcard {
            self.default.post_solve(arbiter, ops);
        }
    }

    pub(crate) fn separate(
        &mut self,
        a: CollisionType,
        b: CollisionType,
        arbiter: &mut Arbiter,
        ops: &mut PostStepOps,
    ) {
        if let Some(h) = self.exact.get_mut(&pair_key(a, b)) {
            h.separate(arbiter, ops);
            return;
        }
        let mut hit_wildcard = false;
        for t in wildcard_types(a, b) {
            if let Some(h) = self.wildcard.get_mut(&t) {
                hit_wildcard = true;
                h.separate(arbiter, ops);
            }
        }
        if !hit_wildcard {
            self.default.separate(arbiter, ops);
        }
    }
}

/// Distinct wildcard keys for a type pair (one entry when a == b).
fn wildcard_types(a: CollisionType, b: CollisionType) -> impl Iterator<Item = CollisionType> {
    let second = if a == b { None } else { Some(b) };
    std::iter::once(a).chain(second)
}

// ---------------------------------------------------------------------------
// Deferred structural mutation
// ---------------------------------------------------------------------------

type PostStepFn = Box<dyn FnOnce(&mut Space)>;

/// Queue of deferred operations available to collision handlers while the
/// space is locked. Callbacks run exactly once each, in registration order,
/// immediately after the step unlocks.
#[derive(Default)]
pub struct PostStepOps {
    pub(crate) callbacks: Vec<PostStepFn>,
    pub(crate) keys: HashSet<u64>,
    pub(crate) wake: Vec<BodyId>,
}

impl PostStepOps {
    /// Queues a callback to run against the space after the step.
    pub fn post_step(&mut self, f: impl FnOnce(&mut Space) + 'static) {
        self.callbacks.push(Box::new(f));
    }

    /// Keyed variant: the callback is dropped if the key was already queued
    /// this step. Returns whether it was queued.
    pub fn post_step_keyed(&mut self, key: u64, f: impl FnOnce(&mut Space) + 'static) -> bool {
        if self.keys.insert(key) {
            self.callbacks.push(Box::new(f));
            true
        } else {
            false
        }
    }

    /// Requests that a body (and its sleep group) be woken after the step.
    pub fn wake(&mut self, body: BodyId) {
        self.wake.push(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materials_combine_by_multiplication() {
        assert!((combine_friction(0.5, 0.5) - 0.25).abs() < f32::EPSILON);
        assert!((combine_restitution(0.9, 1.0) - 0.9).abs() < f32::EPSILON);
        // An ideal surface on either side leaves the other side's value.
        assert!((combine_friction(1.0, 0.7) - 0.7).abs() < f32::EPSILON);
        assert_eq!(combine_restitution(0.0, 1.0), 0.0);
    }
}
