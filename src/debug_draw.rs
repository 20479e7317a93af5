//! # Debug Draw
//!
//! Renderer-agnostic visualization: the space walks its shapes, joints and
//! contact points and emits primitive draw calls through the [`DebugDraw`]
//! trait. No rendering happens in the core; hook the trait up to whatever
//! draws lines.

use crate::constraints::ConstraintKind;
use crate::shapes::ShapeGeometry;
use crate::simulation::Space;
use crate::types::{Transform, Vec2};

/// RGBA color, components in 0..=1.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

/// Which parts of the space to emit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DebugDrawFlags(pub u32);

impl DebugDrawFlags {
    pub const SHAPES: Self = Self(1 << 0);
    pub const CONSTRAINTS: Self = Self(1 << 1);
    pub const COLLISION_POINTS: Self = Self(1 << 2);
    pub const ALL: Self = Self(0b111);

    #[must_use]
    pub fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 != 0
    }
}

pub struct DebugDrawOptions {
    pub flags: DebugDrawFlags,
    pub shape_outline_color: Color,
    pub shape_fill_color: Color,
    pub sleeping_fill_color: Color,
    pub constraint_color: Color,
    pub collision_point_color: Color,
    /// Uniform transform applied to every emitted coordinate.
    pub transform: Transform,
}

impl Default for DebugDrawOptions {
    fn default() -> Self {
        Self {
            flags: DebugDrawFlags::ALL,
            shape_outline_color: Color::rgb(0.8, 0.8, 0.8),
            shape_fill_color: Color::rgb(0.3, 0.4, 0.6),
            sleeping_fill_color: Color::rgb(0.2, 0.2, 0.25),
            constraint_color: Color::rgb(0.0, 0.75, 0.0),
            collision_point_color: Color::rgb(1.0, 0.2, 0.2),
            transform: Transform::IDENTITY,
        }
    }
}

/// Primitive sink for debug visualization.
pub trait DebugDraw {
    fn draw_circle(&mut self, pos: Vec2, angle: f32, radius: f32, outline: Color, fill: Color);
    fn draw_segment(&mut self, a: Vec2, b: Vec2, color: Color);
    fn draw_fat_segment(&mut self, a: Vec2, b: Vec2, radius: f32, outline: Color, fill: Color);
    fn draw_polygon(&mut self, verts: &[Vec2], radius: f32, outline: Color, fill: Color);
    fn draw_dot(&mut self, size: f32, pos: Vec2, color: Color);
}

const CONTACT_DOT_SIZE: f32 = 3.0;

impl Space {
    /// Emits the space's current state through `draw`.
    pub fn debug_draw(&self, draw: &mut dyn DebugDraw, options: &DebugDrawOptions) {
        let t = &options.transform;

        if options.flags.contains(DebugDrawFlags::SHAPES) {
            for (_, shape) in self.shapes() {
                let body = shape.body().and_then(|id| self.body(id));
                let fill = if body.is_some_and(crate::body::Body::is_sleeping) {
                    options.sleeping_fill_color
                } else {
                    options.shape_fill_color
                };
                let outline = options.shape_outline_color;
                match shape.geometry() {
                    ShapeGeometry::Circle { radius, tc, .. } => {
                        let angle = body.map_or(0.0, crate::body::Body::angle);
                        draw.draw_circle(t.point(*tc), angle, *radius, outline, fill);
                    }
                    ShapeGeometry::Segment { radius, ta, tb, .. } => {
                        draw.draw_fat_segment(t.point(*ta), t.point(*tb), *radius, outline, fill);
                    }
                    ShapeGeometry::Poly { radius, t_verts, .. } => {
                        let verts: Vec<Vec2> = t_verts.iter().map(|v| t.point(*v)).collect();
                        draw.draw_polygon(&verts, *radius, outline, fill);
                    }
                }
            }
        }

        if options.flags.contains(DebugDrawFlags::CONSTRAINTS) {
            for (_, constraint) in self.constraints() {
                let (ia, ib) = constraint.bodies();
                let (Some(a), Some(b)) = (self.body(ia), self.body(ib)) else {
                    continue;
                };
                let color = options.constraint_color;
                match &constraint.kind {
                    ConstraintKind::Pin(j) => {
                        let pa = t.point(a.local_to_world(j.anchor_a));
                        let pb = t.point(b.local_to_world(j.anchor_b));
                        draw.draw_segment(pa, pb, color);
                    }
                    ConstraintKind::Slide(j) => {
                        let pa = t.point(a.local_to_world(j.anchor_a));
                        let pb = t.point(b.local_to_world(j.anchor_b));
                        draw.draw_segment(pa, pb, color);
                        draw.draw_dot(CONTACT_DOT_SIZE, pa, color);
                        draw.draw_dot(CONTACT_DOT_SIZE, pb, color);
                    }
                    ConstraintKind::Pivot(j) => {
                        draw.draw_dot(CONTACT_DOT_SIZE, t.point(a.local_to_world(j.anchor_a)), color);
                        draw.draw_dot(CONTACT_DOT_SIZE, t.point(b.local_to_world(j.anchor_b)), color);
                    }
                    ConstraintKind::Groove(j) => {
                        let ga = t.point(a.local_to_world(j.groove_a));
                        let gb = t.point(a.local_to_world(j.groove_b));
                        draw.draw_segment(ga, gb, color);
                        draw.draw_dot(CONTACT_DOT_SIZE, t.point(b.local_to_world(j.anchor_b)), color);
                    }
                    ConstraintKind::DampedSpring(j) => {
                        let pa = t.point(a.local_to_world(j.anchor_a));
                        let pb = t.point(b.local_to_world(j.anchor_b));
                        draw.draw_segment(pa, pb, color);
                    }
                    // Rotary joints have no world-space geometry to show.
                    ConstraintKind::DampedRotarySpring(_)
                    | ConstraintKind::RotaryLimit(_)
                    | ConstraintKind::Ratchet(_)
                    | ConstraintKind::Gear(_)
                    | ConstraintKind::Motor(_) => {}
                }
            }
        }

        if options.flags.contains(DebugDrawFlags::COLLISION_POINTS) {
            // `arbiters()` already yields only actively colliding pairs.
            for arb in self.arbiters() {
                for point in &arb.contact_point_set().points {
                    draw.draw_dot(
                        CONTACT_DOT_SIZE,
                        t.point(point.point_a),
                        options.collision_point_color,
                    );
                    draw.draw_dot(
                        CONTACT_DOT_SIZE,
                        t.point(point.point_b),
                        options.collision_point_color,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::shapes::Shape;

    #[derive(Default)]
    struct Recorder {
        circles: usize,
        polygons: usize,
        dots: usize,
        segments: usize,
    }

    impl DebugDraw for Recorder {
        fn draw_circle(&mut self, _: Vec2, _: f32, _: f32, _: Color, _: Color) {
            self.circles += 1;
        }
        fn draw_segment(&mut self, _: Vec2, _: Vec2, _: Color) {
            self.segments += 1;
        }
        fn draw_fat_segment(&mut self, _: Vec2, _: Vec2, _: f32, _: Color, _: Color) {}
        fn draw_polygon(&mut self, _: &[Vec2], _: f32, _: Color, _: Color) {
            self.polygons += 1;
        }
        fn draw_dot(&mut self, _: f32, _: Vec2, _: Color) {
            self.dots += 1;
        }
    }

    #[test]
    fn emits_shapes_and_contacts() {
        let mut space = Space::new();
        for x in [0.0_f32, 1.5] {
            let mut body = Body::new(1.0, 1.0);
            body.set_position(Vec2::new(x, 0.0));
            let body = space.add_body(body).unwrap();
            space.add_shape(Shape::circle(1.0, Vec2::ZERO), body).unwrap();
        }
        space.step(1.0 / 60.0).unwrap();

        let mut recorder = Recorder::default();
        space.debug_draw(&mut recorder, &DebugDrawOptions::default());

        assert_eq!(recorder.circles, 2);
        // One contact, drawn as a dot per surface point.
        assert_eq!(recorder.dots, 2);
    }
}
