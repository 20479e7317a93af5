//! # Space
//!
//! The simulation container: owns every body, shape and constraint, the
//! broad-phase grid, the arbiter cache and the collision handler table, and
//! orchestrates the fixed-timestep update. One step runs the phases in a
//! fixed order; while a step is in flight the space is locked and collision
//! handlers queue structural changes through [`PostStepOps`] instead of
//! applying them directly.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace, warn};

use crate::arbiter::{Arbiter, ArbiterState, CollisionHandler, HandlerTable, PostStepOps};
use crate::arena::Arena;
use crate::body::{Body, BodyId, BodyKind, ConstraintId, ShapeId};
use crate::collision::{collide, SpatialGrid};
use crate::constraints::Constraint;
use crate::error::PhysicsError;
use crate::shapes::Shape;
use crate::steps::{contact, integration, joint};
use crate::types::{CollisionType, Vec2};

/// Tunables for a [`Space`], mirroring the classic defaults: 10 solver
/// iterations, no gravity, no damping, sleeping disabled, a tenth of a unit
/// of allowed overlap corrected at roughly 90% per 1/60 s.
#[derive(Copy, Clone, Debug)]
pub struct SpaceOptions {
    pub iterations: u32,
    pub gravity: Vec2,
    pub damping: f32,
    /// Speed below which a body counts as idle; 0 means derive it from
    /// gravity each step.
    pub idle_speed_threshold: f32,
    /// Seconds of group-wide idleness before falling asleep; infinity
    /// disables sleeping.
    pub sleep_time_threshold: f32,
    /// Penetration depth tolerated without correction.
    pub collision_slop: f32,
    /// Fraction of penetration error remaining after one second.
    pub collision_bias: f32,
    /// Steps a separated arbiter keeps its warm-start data.
    pub collision_persistence: u64,
    /// Broad-phase grid cell size, in world units.
    pub grid_cell_size: f32,
}

impl Default for SpaceOptions {
    fn default() -> Self {
        Self {
            iterations: 10,
            gravity: Vec2::ZERO,
            damping: 1.0,
            idle_speed_threshold: 0.0,
            sleep_time_threshold: f32::INFINITY,
            collision_slop: 0.1,
            collision_bias: 0.001_797_010_3, // (1 - 0.1)^60
            collision_persistence: 3,
            grid_cell_size: 10.0,
        }
    }
}

type ArbiterKey = (ShapeId, ShapeId);

/// The simulation container.
pub struct Space {
    pub(crate) bodies: Arena<Body>,
    pub(crate) shapes: Arena<Shape>,
    pub(crate) constraints: Arena<Constraint>,
    pub(crate) grid: SpatialGrid,
    pub(crate) arbiters: HashMap<ArbiterKey, Arbiter>,

    handlers: HandlerTable,
    ops: PostStepOps,

    static_body: BodyId,
    locked: bool,
    stamp: u64,
    prev_dt: f32,

    pub options: SpaceOptions,
}

impl Space {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(SpaceOptions::default())
    }

    #[must_use]
    pub fn with_options(options: SpaceOptions) -> Self {
        let mut bodies = Arena::new();
        let static_body = bodies.insert(Body::new_static());
        Self {
            bodies,
            shapes: Arena::new(),
            constraints: Arena::new(),
            grid: SpatialGrid::new(options.grid_cell_size),
            arbiters: HashMap::new(),
            handlers: HandlerTable::new(),
            ops: PostStepOps::default(),
            static_body,
            locked: false,
            stamp: 0,
            prev_dt: 0.0,
            options,
        }
    }

    /// The built-in static body, for attaching level geometry.
    #[must_use]
    pub fn static_body(&self) -> BodyId {
        self.static_body
    }

    // -----------------------------------------------------------------
    // Structural API
    // -----------------------------------------------------------------

    pub fn add_body(&mut self, body: Body) -> Result<BodyId, PhysicsError> {
        debug_assert!(!self.locked, "structural change during a step");
        if body.kind() == BodyKind::Dynamic {
            if !(body.mass().is_finite() && body.mass() > 0.0) {
                return Err(PhysicsError::InvalidMass(body.mass()));
            }
            if !(body.moment() > 0.0) {
                return Err(PhysicsError::InvalidMoment(body.moment()));
            }
        }
        Ok(self.bodies.insert(body))
    }

    /// Attaches `shape` to `body` and indexes it. The body must already be
    /// in this space.
    pub fn add_shape(&mut self, mut shape: Shape, body: BodyId) -> Result<ShapeId, PhysicsError> {
        debug_assert!(!self.locked, "structural change during a step");
        let Some(owner) = self.bodies.get(body) else {
            return Err(PhysicsError::BodyNotInSpace);
        };
        let is_static = owner.kind() == BodyKind::Static;
        let bb = shape.cache_bb(&owner.transform());
        shape.body = Some(body);

        let id = self.shapes.insert(shape);
        if let Some(owner) = self.bodies.get_mut(body) {
            owner.shapes.push(id);
        }
        if is_static {
            self.grid.insert_static(id, bb);
        } else {
            self.grid.insert_dynamic(id, bb);
        }
        Ok(id)
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<ConstraintId, PhysicsError> {
        debug_assert!(!self.locked, "structural change during a step");
        let (ia, ib) = constraint.bodies();
        if ia == ib {
            return Err(PhysicsError::InvalidConstraint(
                "constraint joins a body to itself",
            ));
        }
        let (Some(a), Some(b)) = (self.bodies.get(ia), self.bodies.get(ib)) else {
            return Err(PhysicsError::BodyNotInSpace);
        };
        if a.kind() != BodyKind::Dynamic && b.kind() != BodyKind::Dynamic {
            return Err(PhysicsError::InvalidConstraint(
                "at least one constrained body must be dynamic",
            ));
        }

        let id = self.constraints.insert(constraint);
        for body in [ia, ib] {
            if let Some(body) = self.bodies.get_mut(body) {
                body.constraints.push(id);
            }
        }
        self.wake_body(ia);
        self.wake_body(ib);
        Ok(id)
    }

    /// Removes a shape, firing the separate handler for any collision it
    /// was part of and waking bodies it was supporting.
    pub fn remove_shape(&mut self, id: ShapeId) -> Result<Shape, PhysicsError> {
        debug_assert!(!self.locked, "structural change during a step");
        if !self.shapes.contains(id) {
            return Err(PhysicsError::NotInSpace("shape"));
        }

        // Losing a shape mid-collision still gets exactly one separate.
        let keys: Vec<ArbiterKey> = self
            .arbiters
            .keys()
            .filter(|(a, b)| *a == id || *b == id)
            .copied()
            .collect();
        let mut to_wake = Vec::new();
        for key in keys {
            if let Some(mut arb) = self.arbiters.remove(&key) {
                let (ba, bb) = arb.bodies();
                to_wake.push(ba);
                to_wake.push(bb);
                if arb.state != ArbiterState::Cached {
                    arb.state = ArbiterState::Invalidated;
                    let (ta, tb) = self.collision_types(key);
                    self.handlers.separate(ta, tb, &mut arb, &mut self.ops);
                }
            }
        }

        self.grid.remove(id);
        let shape = self
            .shapes
            .remove(id)
            .ok_or(PhysicsError::NotInSpace("shape"))?;
        if let Some(owner) = shape.body().and_then(|b| self.bodies.get_mut(b)) {
            owner.shapes.retain(|s| *s != id);
        }
        for body in to_wake {
            self.wake_body(body);
        }
        self.drain_deferred_ops();
        Ok(shape)
    }

    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<Constraint, PhysicsError> {
        debug_assert!(!self.locked, "structural change during a step");
        let constraint = self
            .constraints
            .remove(id)
            .ok_or(PhysicsError::NotInSpace("constraint"))?;
        let (ia, ib) = constraint.bodies();
        for body in [ia, ib] {
            if let Some(body) = self.bodies.get_mut(body) {
                body.constraints.retain(|c| *c != id);
            }
        }
        self.wake_body(ia);
        self.wake_body(ib);
        Ok(constraint)
    }

    /// Removes a body along with everything attached to it (shapes,
    /// constraints and their arbiters).
    pub fn remove_body(&mut self, id: BodyId) -> Result<Body, PhysicsError> {
        debug_assert!(!self.locked, "structural change during a step");
        if id == self.static_body {
            return Err(PhysicsError::InvalidConstraint(
                "the built-in static body cannot be removed",
            ));
        }
        let Some(body) = self.bodies.get(id) else {
            return Err(PhysicsError::NotInSpace("body"));
        };

        for shape in body.shapes().to_vec() {
            self.remove_shape(shape)?;
        }
        for constraint in self
            .bodies
            .get(id)
            .map_or_else(Vec::new, |b| b.constraints().to_vec())
        {
            self.remove_constraint(constraint)?;
        }
        self.bodies.remove(id).ok_or(PhysicsError::NotInSpace("body"))
    }

    // -----------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------

    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    /// Mutable body access. Geometry-affecting changes are picked up at the
    /// next step or an explicit [`Space::reindex_shapes_for_body`].
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    #[must_use]
    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    pub fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(id)
    }

    #[must_use]
    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(id)
    }

    pub fn constraint_mut(&mut self, id: ConstraintId) -> Option<&mut Constraint> {
        self.constraints.get_mut(id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.bodies.iter()
    }

    pub fn shapes(&self) -> impl Iterator<Item = (ShapeId, &Shape)> {
        self.shapes.iter()
    }

    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintId, &Constraint)> {
        self.constraints.iter()
    }

    /// Arbiters currently colliding, in deterministic key order.
    pub fn arbiters(&self) -> impl Iterator<Item = &Arbiter> {
        let mut keys: Vec<ArbiterKey> = self
            .arbiters
            .iter()
            .filter(|(_, arb)| {
                matches!(arb.state, ArbiterState::FirstCollision | ArbiterState::Normal)
            })
            .map(|(k, _)| *k)
            .collect();
        keys.sort_unstable();
        keys.into_iter().filter_map(|k| self.arbiters.get(&k))
    }

    // -----------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------

    /// Registers a handler for collisions between two collision types.
    pub fn set_collision_handler(
        &mut self,
        a: CollisionType,
        b: CollisionType,
        handler: Box<dyn CollisionHandler>,
    ) {
        self.handlers.set_pair(a, b, handler);
    }

    /// Registers a handler consulted for every collision involving `t`.
    pub fn set_wildcard_handler(&mut self, t: CollisionType, handler: Box<dyn CollisionHandler>) {
        self.handlers.set_wildcard(t, handler);
    }

    /// Replaces the accept-everything default handler.
    pub fn set_default_handler(&mut self, handler: Box<dyn CollisionHandler>) {
        self.handlers.set_default(handler);
    }

    // -----------------------------------------------------------------
    // Sleeping
    // -----------------------------------------------------------------

    /// Wakes a body and, transitively, everything sleeping in contact with
    /// or jointed to it.
    pub fn wake_body(&mut self, id: BodyId) {
        let mut queue = vec![id];
        let mut seen = HashSet::new();
        while let Some(current) = queue.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(body) = self.bodies.get_mut(current) else {
                continue;
            };
            let was_sleeping = body.sleeping;
            body.sleeping = false;
            body.idle_time = 0.0;
            if !was_sleeping && current != id {
                continue;
            }
            for arb in self.arbiters.values() {
                let (a, b) = arb.bodies();
                if a == current {
                    queue.push(b);
                } else if b == current {
                    queue.push(a);
                }
            }
            for (_, constraint) in self.constraints.iter() {
                let (a, b) = constraint.bodies();
                if a == current {
                    queue.push(b);
                } else if b == current {
                    queue.push(a);
                }
            }
        }
    }

    /// Puts a dynamic body to sleep immediately, zeroing its velocities.
    /// Ignored (with a warning) while sleeping is disabled.
    pub fn sleep_body(&mut self, id: BodyId) {
        if self.options.sleep_time_threshold.is_infinite() {
            warn!("sleep_body called while sleeping is disabled");
            return;
        }
        if let Some(body) = self.bodies.get_mut(id) {
            if body.kind() == BodyKind::Dynamic {
                body.sleeping = true;
                body.velocity = Vec2::ZERO;
                body.angular_velocity = 0.0;
            }
        }
    }

    // -----------------------------------------------------------------
    // Indexing
    // -----------------------------------------------------------------

    /// Recomputes world geometry and grid cells for one body's shapes.
    /// Needed after teleporting a body outside of a step.
    pub fn reindex_shapes_for_body(&mut self, id: BodyId) {
        let Some(body) = self.bodies.get(id) else {
            return;
        };
        let transform = body.transform();
        for shape_id in body.shapes().to_vec() {
            if let Some(shape) = self.shapes.get_mut(shape_id) {
                let bb = shape.cache_bb(&transform);
                self.grid.reindex(shape_id, bb);
            }
        }
    }

    // -----------------------------------------------------------------
    // Step
    // -----------------------------------------------------------------

    /// Advances the simulation by `dt` seconds.
    ///
    /// Zero `dt` is a no-op; negative or non-finite `dt` is an error.
    pub fn step(&mut self, dt: f32) -> Result<(), PhysicsError> {
        if dt == 0.0 {
            return Ok(());
        }
        if !dt.is_finite() || dt < 0.0 {
            return Err(PhysicsError::InvalidTimeStep(dt));
        }
        for (_, body) in self.bodies.iter() {
            if body.kind() == BodyKind::Dynamic && !(body.mass().is_finite() && body.mass() > 0.0)
            {
                return Err(PhysicsError::InvalidMass(body.mass()));
            }
        }

        self.locked = true;
        self.stamp += 1;
        let dt_coef = if self.prev_dt == 0.0 { 0.0 } else { dt / self.prev_dt };

        // Joint pre-step runs before integration so spring forces see the
        // pre-gravity velocities.
        joint::pre_step(&mut self.constraints, &mut self.bodies, dt);

        integration::integrate_velocities(
            &mut self.bodies,
            self.options.gravity,
            self.options.damping,
            dt,
        );

        self.sync_dynamic_shapes();
        let solve_keys = self.update_arbiters();
        debug!(
            arbiters = self.arbiters.len(),
            solving = solve_keys.len(),
            stamp = self.stamp,
            "collision phase done"
        );

        // Contact pre-step, then warm starting for contacts and joints.
        let slop = self.options.collision_slop;
        let bias_per_dt = (1.0 - self.options.collision_bias.powf(dt)) / dt;
        for key in &solve_keys {
            if let Some(arb) = self.arbiters.get_mut(key) {
                let (ia, ib) = arb.bodies();
                if let Some((a, b)) = self.bodies.get2_mut(ia, ib) {
                    contact::pre_step(arb, a, b, slop, bias_per_dt);
                    contact::apply_cached_impulse(arb, a, b, dt_coef);
                }
            }
        }
        joint::apply_cached_impulses(&mut self.constraints, &mut self.bodies, dt_coef);

        for _ in 0..self.options.iterations {
            for key in &solve_keys {
                if let Some(arb) = self.arbiters.get_mut(key) {
                    let (ia, ib) = arb.bodies();
                    if let Some((a, b)) = self.bodies.get2_mut(ia, ib) {
                        contact::apply_impulse(arb, a, b);
                    }
                }
            }
            joint::apply_impulses(&mut self.constraints, &mut self.bodies);
        }

        // Post-solve notifications, then first collisions become normal.
        for key in &solve_keys {
            let (ta, tb) = self.collision_types(*key);
            if let Some(arb) = self.arbiters.get_mut(key) {
                self.handlers.post_solve(ta, tb, arb, &mut self.ops);
            }
        }
        for arb in self.arbiters.values_mut() {
            if arb.state == ArbiterState::FirstCollision {
                arb.state = ArbiterState::Normal;
            }
        }

        integration::integrate_positions(&mut self.bodies, dt);
        for (_, body) in self.bodies.iter_mut() {
            body.clear_forces();
        }

        self.sync_dynamic_shapes();
        self.process_sleeping(dt);

        self.prev_dt = dt;
        self.locked = false;
        self.drain_deferred_ops();
        Ok(())
    }

    /// Recomputes world geometry for shapes on awake non-static bodies and
    /// rebuilds the dynamic side of the grid.
    fn sync_dynamic_shapes(&mut self) {
        let mut entries = Vec::new();
        for (_, body) in self.bodies.iter() {
            if body.kind() == BodyKind::Static {
                continue;
            }
            let transform = body.transform();
            let moved = !body.is_sleeping();
            for shape_id in body.shapes() {
                entries.push((*shape_id, moved, transform));
            }
        }
        for (shape_id, moved, transform) in &entries {
            if *moved {
                if let Some(shape) = self.shapes.get_mut(*shape_id) {
                    shape.cache_bb(transform);
                }
            }
        }
        self.grid.rebuild_dynamic(
            entries
                .iter()
                .filter_map(|(id, _, _)| Some((*id, self.shapes.get(*id)?.bb()))),
        );
    }

    fn collision_types(&self, key: ArbiterKey) -> (CollisionType, CollisionType) {
        let t = |id: ShapeId| {
            self.shapes
                .get(id)
                .map_or(CollisionType::default(), |s| s.collision_type)
        };
        (t(key.0), t(key.1))
    }

    /// Broad + narrow phase: refreshes arbiters from candidate pairs, runs
    /// begin/pre-solve handlers, expires stale arbiters, and returns the
    /// sorted keys of the arbiters that take part in the solve.
    fn update_arbiters(&mut self) -> Vec<ArbiterKey> {
        let stamp = self.stamp;
        let mut to_wake = Vec::new();

        for (pa, pb) in self.grid.candidate_pairs() {
            let (Some(sa), Some(sb)) = (self.shapes.get(pa), self.shapes.get(pb)) else {
                continue;
            };
            let (Some(ba), Some(bb)) = (sa.body(), sb.body()) else {
                continue;
            };
            if ba == bb || sa.filter.rejects(sb.filter) {
                continue;
            }
            let (Some(body_a), Some(body_b)) = (self.bodies.get(ba), self.bodies.get(bb)) else {
                continue;
            };
            let a_live = body_a.kind() == BodyKind::Dynamic && !body_a.is_sleeping();
            let b_live = body_b.kind() == BodyKind::Dynamic && !body_b.is_sleeping();
            if !a_live && !b_live {
                continue;
            }
            if self.constrained_pair_rejects(ba, bb) {
                continue;
            }

            // Canonical order for dispatch and for the arbiter key.
            let (key, flipped) =
                if (sa.geometry().type_tag(), pa) <= (sb.geometry().type_tag(), pb) {
                    ((pa, pb), false)
                } else {
                    ((pb, pa), true)
                };
            let (shape_a, shape_b) = if flipped { (sb, sa) } else { (sa, sb) };
            let (body_a_id, body_b_id) = if flipped { (bb, ba) } else { (ba, bb) };

            let info = collide(shape_a, shape_b);
            if info.points.is_empty() {
                continue;
            }

            let arb = self
                .arbiters
                .entry(key)
                .or_insert_with(|| Arbiter::new(key.0, key.1, body_a_id, body_b_id));
            if arb.state == ArbiterState::Cached {
                // Revived from the cache counts as a fresh collision.
                arb.state = ArbiterState::FirstCollision;
            }
            arb.update(&info, shape_a, shape_b);
            arb.stamp = stamp;
            trace!(?key, contacts = arb.contacts.len(), "arbiter updated");

            if body_a.is_sleeping() {
                to_wake.push(ba);
            }
            if body_b.is_sleeping() {
                to_wake.push(bb);
            }
        }

        for body in to_wake {
            self.wake_body(body);
        }

        let mut keys: Vec<ArbiterKey> = self.arbiters.keys().copied().collect();
        keys.sort_unstable();

        let mut solve_keys = Vec::new();
        let mut expired = Vec::new();
        for key in keys {
            let (arb_stamp, state, ia, ib) = match self.arbiters.get(&key) {
                Some(arb) => {
                    let (ia, ib) = arb.bodies();
                    (arb.stamp, arb.state, ia, ib)
                }
                None => continue,
            };

            if arb_stamp != stamp {
                // Frozen pairs (both bodies asleep) keep their contacts.
                let asleep = |id: BodyId| self.bodies.get(id).is_some_and(Body::is_sleeping);
                if asleep(ia) && asleep(ib) {
                    continue;
                }
                if state == ArbiterState::Cached {
                    if stamp.wrapping_sub(arb_stamp) > self.options.collision_persistence {
                        expired.push(key);
                    }
                } else {
                    let (ta, tb) = self.collision_types(key);
                    if let Some(arb) = self.arbiters.get_mut(&key) {
                        self.handlers.separate(ta, tb, arb, &mut self.ops);
                        arb.state = ArbiterState::Cached;
                    }
                }
                continue;
            }

            let (ta, tb) = self.collision_types(key);
            let is_sensor = |id: ShapeId| self.shapes.get(id).is_some_and(|s| s.sensor);
            let sensor = is_sensor(key.0) || is_sensor(key.1);

            let Some(arb) = self.arbiters.get_mut(&key) else {
                continue;
            };
            if arb.state == ArbiterState::FirstCollision
                && !self.handlers.begin(ta, tb, arb, &mut self.ops)
            {
                arb.state = ArbiterState::Ignore;
            }
            if arb.state == ArbiterState::Ignore {
                continue;
            }
            // Sensor pairs still see `pre_solve` every frame but never
            // reach the solver.
            if !self.handlers.pre_solve(ta, tb, arb, &mut self.ops) || sensor {
                continue;
            }
            solve_keys.push(key);
        }

        for key in expired {
            self.arbiters.remove(&key);
        }

        solve_keys
    }

    /// True when a joint with `collide_bodies == false` links the two
    /// bodies.
    fn constrained_pair_rejects(&self, a: BodyId, b: BodyId) -> bool {
        let Some(body) = self.bodies.get(a) else {
            return false;
        };
        body.constraints().iter().any(|id| {
            self.constraints.get(*id).is_some_and(|c| {
                let (ca, cb) = c.bodies();
                !c.collide_bodies && ((ca, cb) == (a, b) || (ca, cb) == (b, a))
            })
        })
    }

    /// Idle-time bookkeeping and group sleeping over the contact/joint
    /// graph.
    fn process_sleeping(&mut self, dt: f32) {
        let threshold = self.options.sleep_time_threshold;
        if threshold.is_infinite() {
            return;
        }

        let idle_speed = if self.options.idle_speed_threshold > 0.0 {
            self.options.idle_speed_threshold
        } else {
            self.options.gravity.length() * dt
        };
        let idle_speed_sq = idle_speed * idle_speed;

        for (_, body) in self.bodies.iter_mut() {
            if body.kind() != BodyKind::Dynamic || body.is_sleeping() {
                continue;
            }
            let ke_threshold = idle_speed_sq * body.mass();
            if body.kinetic_energy() > ke_threshold {
                body.idle_time = 0.0;
            } else {
                body.idle_time += dt;
            }
        }

        // Edges between dynamic bodies, plus a "restless" mark for bodies
        // touching kinematic ones.
        let mut edges: Vec<(BodyId, BodyId)> = Vec::new();
        let mut restless: HashSet<BodyId> = HashSet::new();
        let dynamic = |bodies: &Arena<Body>, id: BodyId| {
            bodies.get(id).is_some_and(|b| b.kind() == BodyKind::Dynamic)
        };
        let kinematic = |bodies: &Arena<Body>, id: BodyId| {
            bodies.get(id).is_some_and(|b| b.kind() == BodyKind::Kinematic)
        };
        for arb in self.arbiters.values() {
            if !matches!(arb.state, ArbiterState::FirstCollision | ArbiterState::Normal) {
                continue;
            }
            let (a, b) = arb.bodies();
            if dynamic(&self.bodies, a) && dynamic(&self.bodies, b) {
                edges.push((a, b));
            }
            if kinematic(&self.bodies, a) && dynamic(&self.bodies, b) {
                restless.insert(b);
            }
            if kinematic(&self.bodies, b) && dynamic(&self.bodies, a) {
                restless.insert(a);
            }
        }
        for (_, constraint) in self.constraints.iter() {
            let (a, b) = constraint.bodies();
            if dynamic(&self.bodies, a) && dynamic(&self.bodies, b) {
                edges.push((a, b));
            }
        }

        // Flood fill per component; sleep only when every member is ready.
        let mut visited: HashSet<BodyId> = HashSet::new();
        for id in self.bodies.ids() {
            let Some(body) = self.bodies.get(id) else {
                continue;
            };
            if body.kind() != BodyKind::Dynamic || body.is_sleeping() || visited.contains(&id) {
                continue;
            }

            let mut component = Vec::new();
            let mut queue = vec![id];
            while let Some(current) = queue.pop() {
                if !visited.insert(current) {
                    continue;
                }
                component.push(current);
                for (a, b) in &edges {
                    if *a == current && !visited.contains(b) {
                        queue.push(*b);
                    } else if *b == current && !visited.contains(a) {
                        queue.push(*a);
                    }
                }
            }

            let ready = component.iter().all(|member| {
                !restless.contains(member)
                    && self
                        .bodies
                        .get(*member)
                        .is_some_and(|b| b.idle_time >= threshold)
            });
            if ready {
                debug!(bodies = component.len(), "sleeping component");
                for member in component {
                    if let Some(body) = self.bodies.get_mut(member) {
                        body.sleeping = true;
                        body.velocity = Vec2::ZERO;
                        body.angular_velocity = 0.0;
                    }
                }
            }
        }
    }

    /// Runs queued wakes and post-step callbacks exactly once each, in
    /// registration order.
    fn drain_deferred_ops(&mut self) {
        if self.ops.callbacks.is_empty() && self.ops.wake.is_empty() {
            return;
        }
        let mut ops = std::mem::take(&mut self.ops);
        for body in ops.wake.drain(..) {
            self.wake_body(body);
        }
        for callback in ops.callbacks.drain(..) {
            callback(self);
        }
    }
}

impl Default for Space {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes;

    fn ball(space: &mut Space, pos: Vec2, radius: f32) -> (BodyId, ShapeId) {
        let mass = 1.0;
        let mut body = Body::new(mass, shapes::moment_for_circle(mass, 0.0, radius, Vec2::ZERO));
        body.set_position(pos);
        let body = space.add_body(body).unwrap();
        let mut shape = Shape::circle(radius, Vec2::ZERO);
        shape.friction = 0.5;
        let shape = space.add_shape(shape, body).unwrap();
        (body, shape)
    }

    #[test]
    fn step_rejects_bad_dt() {
        let mut space = Space::new();
        assert!(space.step(-0.1).is_err());
        assert!(space.step(f32::NAN).is_err());
        assert!(space.step(0.0).is_ok());
    }

    #[test]
    fn shape_requires_body_in_space() {
        let mut other = Space::new();
        let foreign = other.add_body(Body::new(1.0, 1.0)).unwrap();

        let mut space = Space::new();
        let err = space.add_shape(Shape::circle(1.0, Vec2::ZERO), foreign);
        assert!(matches!(err, Err(PhysicsError::BodyNotInSpace)));
    }

    #[test]
    fn double_remove_is_an_error() {
        let mut space = Space::new();
        let (body, shape) = ball(&mut space, Vec2::ZERO, 1.0);
        assert!(space.remove_shape(shape).is_ok());
        assert!(space.remove_shape(shape).is_err());
        assert!(space.remove_body(body).is_ok());
        assert!(space.remove_body(body).is_err());
    }

    #[test]
    fn constraint_needs_a_dynamic_body() {
        let mut space = Space::new();
        let ka = space.add_body(Body::new_kinematic()).unwrap();
        let kb = space.add_body(Body::new_kinematic()).unwrap();
        let joint = Constraint::new(
            ka,
            kb,
            crate::constraints::ConstraintKind::Motor(crate::constraints::SimpleMotor::new(1.0)),
        );
        assert!(matches!(
            space.add_constraint(joint),
            Err(PhysicsError::InvalidConstraint(_))
        ));
    }

    #[test]
    fn removing_body_cascades() {
        let mut space = Space::new();
        let (body_a, _) = ball(&mut space, Vec2::ZERO, 1.0);
        let (body_b, _) = ball(&mut space, Vec2::new(5.0, 0.0), 1.0);
        let joint = Constraint::new(
            body_a,
            body_b,
            crate::constraints::ConstraintKind::Pivot(
                crate::constraints::PivotJoint::new(Vec2::ZERO, Vec2::ZERO),
            ),
        );
        let joint = space.add_constraint(joint).unwrap();

        space.remove_body(body_a).unwrap();
        assert!(space.constraint(joint).is_none());
        assert_eq!(space.shapes().count(), 1);
        // The surviving body no longer references the dead joint.
        assert!(space.body(body_b).unwrap().constraints().is_empty());
    }

    #[test]
    fn falling_ball_gains_velocity() {
        let mut space = Space::new();
        space.options.gravity = Vec2::new(0.0, -10.0);
        let (body, _) = ball(&mut space, Vec2::new(0.0, 100.0), 1.0);

        for _ in 0..60 {
            space.step(1.0 / 60.0).unwrap();
        }

        let body = space.body(body).unwrap();
        assert!((body.velocity.y + 10.0).abs() < 1e-3);
        assert!(body.position().y < 100.0);
    }

    #[test]
    fn overlapping_balls_create_an_arbiter() {
        let mut space = Space::new();
        ball(&mut space, Vec2::ZERO, 1.0);
        ball(&mut space, Vec2::new(1.5, 0.0), 1.0);

        space.step(1.0 / 60.0).unwrap();
        assert_eq!(space.arbiters().count(), 1);
        let arb = space.arbiters().next().unwrap();
        assert_eq!(arb.contact_count(), 1);
    }

    #[test]
    fn filtered_pair_never_collides() {
        let mut space = Space::new();
        let (_, sa) = ball(&mut space, Vec2::ZERO, 1.0);
        let (_, sb) = ball(&mut space, Vec2::new(1.5, 0.0), 1.0);
        space.shape_mut(sa).unwrap().filter = crate::types::ShapeFilter::new(5, !0, !0);
        space.shape_mut(sb).unwrap().filter = crate::types::ShapeFilter::new(5, !0, !0);

        space.step(1.0 / 60.0).unwrap();
        assert_eq!(space.arbiters().count(), 0);
    }
}
