#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
//! # Impulse2D
//!
//! A 2D rigid body physics engine built around persistent contacts and a
//! sequential impulse solver.
//!
//! ## Key Components
//!
//! -   **Space:** The [`Space`] in the [`simulation`] module owns every
//!     body, shape and constraint and advances the world with fixed
//!     timesteps via [`Space::step`].
//! -   **Bodies and shapes:** [`Body`] carries the dynamics state; one or
//!     more [`Shape`]s (circles, beveled segments, convex polygons) give it
//!     a collision surface and material.
//! -   **Collision:** a hashed [`SpatialGrid`] broad phase feeds a SAT
//!     narrow phase; colliding pairs persist as [`Arbiter`]s so contact
//!     impulses warm-start the next step.
//! -   **Joints:** ten [`constraints`] kinds, from pin joints to damped
//!     springs and motors, solved with the same sequential impulse scheme
//!     as contacts.
//! -   **Callbacks and queries:** [`CollisionHandler`] hooks into the
//!     collision lifecycle; point / segment / bounding-box / shape queries
//!     and a batch readout API interrogate the world without stepping it.
//!
//! ## Usage
//!
//! ```rust
//! use impulse2d::{Body, Shape, Space, Vec2};
//!
//! let mut space = Space::new();
//! space.options.gravity = Vec2::new(0.0, -100.0);
//!
//! let ball = space.add_body(Body::new(1.0, 10.0))?;
//! space.add_shape(Shape::circle(5.0, Vec2::ZERO), ball)?;
//!
//! for _ in 0..60 {
//!     space.step(1.0 / 60.0)?;
//! }
//! # Ok::<(), impulse2d::PhysicsError>(())
//! ```

pub mod arbiter;
pub mod arena;
pub mod batch;
pub mod body;
pub mod collision;
pub mod constraints;
pub mod debug_draw;
pub mod error;
pub mod query;
pub mod shapes;
pub mod simulation;
pub mod types;

pub(crate) mod steps;

pub use arbiter::{
    Arbiter, ArbiterState, CollisionHandler, ContactPointSet, PostStepOps,
};
pub use arena::{Arena, Id};
pub use body::{Body, BodyId, BodyKind, ConstraintId, ShapeId};
pub use collision::SpatialGrid;
pub use constraints::{Constraint, ConstraintKind};
pub use debug_draw::{Color, DebugDraw, DebugDrawFlags, DebugDrawOptions};
pub use error::PhysicsError;
pub use query::{PointQueryInfo, SegmentQueryInfo, ShapeQueryInfo};
pub use shapes::{Shape, ShapeGeometry};
pub use simulation::{Space, SpaceOptions};
pub use types::{CollisionType, Mat2x2, ShapeFilter, Transform, Vec2, BB};
