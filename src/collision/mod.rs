//! # Narrow-phase Collision Detection
//!
//! Exact contact generation between shape pairs, dispatched on the
//! normalized shape-type pair (circle < segment < polygon). Each case
//! produces up to two contact points with positions on both surfaces and a
//! signed distance (`negative` = overlapping) measured along the collision
//! normal, which points from shape A to shape B.
//!
//! Segments and polygons carry a bevel radius with Minkowski-sum semantics:
//! two radius-bearing shapes collide like their cores fattened by the sum
//! of the radii.

mod circle_circle;
mod circle_poly;
mod circle_segment;
mod poly_poly;
mod segment_poly;
mod segment_segment;

pub(crate) mod broad_phase;

pub use broad_phase::SpatialGrid;

use crate::shapes::{Shape, ShapeGeometry, SplittingPlane};
use crate::types::Vec2;

/// One raw contact point produced by the narrow phase.
#[derive(Copy, Clone, Debug)]
pub struct ContactPointRaw {
    /// Point on A's surface.
    pub point_a: Vec2,
    /// Point on B's surface.
    pub point_b: Vec2,
    /// `dot(point_b - point_a, normal)`; negative when overlapping.
    pub dist: f32,
    /// Feature id used to match contacts across steps for warm starting.
    pub id: u32,
}

/// Narrow-phase output: a shared normal and up to two contact points.
#[derive(Clone, Debug, Default)]
pub struct CollisionInfo {
    pub normal: Vec2,
    pub points: Vec<ContactPointRaw>,
}

impl CollisionInfo {
    pub(crate) const NONE: Self = Self {
        normal: Vec2::ZERO,
        points: Vec::new(),
    };

    pub(crate) fn single(normal: Vec2, point: ContactPointRaw) -> Self {
        Self {
            normal,
            points: vec![point],
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Same collision seen from the other shape's side.
    #[must_use]
    pub(crate) fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        for p in &mut self.points {
            std::mem::swap(&mut p.point_a, &mut p.point_b);
        }
        self
    }
}

/// Computes contacts between two shapes using their cached world geometry.
///
/// Callers must pass the pair in canonical order
/// (`a.type_tag() <= b.type_tag()`); the space's arbiter keying guarantees
/// this. Degenerate geometry yields an empty result, never a NaN normal.
pub(crate) fn collide(a: &Shape, b: &Shape) -> CollisionInfo {
    debug_assert!(a.geometry().type_tag() <= b.geometry().type_tag());

    match (a.geometry(), b.geometry()) {
        (
            ShapeGeometry::Circle { radius: ra, tc: ca, .. },
            ShapeGeometry::Circle { radius: rb, tc: cb, .. },
        ) => circle_circle::collide(*ca, *ra, *cb, *rb),
        (
            ShapeGeometry::Circle { radius, tc, .. },
            ShapeGeometry::Segment {
                radius: seg_r,
                ta,
                tb,
                ..
            },
        ) => circle_segment::collide(*tc, *radius, *ta, *tb, *seg_r),
        (
            ShapeGeometry::Circle { radius, tc, .. },
            ShapeGeometry::Poly {
                radius: poly_r,
                t_verts,
                t_planes,
                ..
            },
        ) => circle_poly::collide(*tc, *radius, t_verts, t_planes, *poly_r),
        (
            ShapeGeometry::Segment {
                radius: r1,
                ta: a1,
                tb: b1,
                tn: n1,
                ..
            },
            ShapeGeometry::Segment {
                radius: r2,
                ta: a2,
                tb: b2,
                tn: n2,
                ..
            },
        ) => segment_segment::collide(*a1, *b1, *n1, *r1, *a2, *b2, *n2, *r2),
        (
            ShapeGeometry::Segment {
                radius,
                ta,
                tb,
                tn,
                ..
            },
            ShapeGeometry::Poly {
                radius: poly_r,
                t_verts,
                t_planes,
                ..
            },
        ) => segment_poly::collide(*ta, *tb, *tn, *radius, t_verts, t_planes, *poly_r),
        (
            ShapeGeometry::Poly {
                radius: ra,
                t_verts: va,
                t_planes: pa,
                ..
            },
            ShapeGeometry::Poly {
                radius: rb,
                t_verts: vb,
                t_planes: pb,
                ..
            },
        ) => poly_poly::collide(
            PolyLike {
                verts: va,
                planes: pa,
                radius: *ra,
            },
            PolyLike {
                verts: vb,
                planes: pb,
                radius: *rb,
            },
        ),
        // Non-canonical orderings are normalized by the caller.
        _ => unreachable!("collide called with non-canonical shape order"),
    }
}

/// Borrowed view of a convex vertex loop with a bevel radius. Segments are
/// treated as degenerate two-vertex loops so the SAT pipeline covers the
/// segment/segment, segment/poly and poly/poly cases uniformly.
#[derive(Copy, Clone)]
pub(crate) struct PolyLike<'a> {
    pub verts: &'a [Vec2],
    pub planes: &'a [SplittingPlane],
    pub radius: f32,
}

/// Builds the two-vertex loop view of a segment. Returns `None` for a
/// zero-length segment (degenerate; the caller skips the collision).
pub(crate) fn segment_planes(a: Vec2, b: Vec2, n: Vec2) -> Option<[SplittingPlane; 2]> {
    if (b - a).length_sq() < f32::EPSILON || n.length_sq() < 0.5 {
        return None;
    }
    Some([
        SplittingPlane { n, d: n.dot(a) },
        SplittingPlane { n: -n, d: -n.dot(a) },
    ])
}

/// Greatest separation of `verts` behind any plane in `planes`: for each
/// plane the innermost vertex is found, and the plane with the largest such
/// (least negative) value wins. Core distances; radii are applied by the
/// caller.
pub(crate) fn find_max_separation(planes: &[SplittingPlane], verts: &[Vec2]) -> (f32, usize) {
    let mut best = f32::NEG_INFINITY;
    let mut best_i = 0;
    for (i, plane) in planes.iter().enumerate() {
        let mut min = f32::INFINITY;
        for &v in verts {
            min = min.min(plane.n.dot(v) - plane.d);
        }
        if min > best {
            best = min;
            best_i = i;
        }
    }
    (best, best_i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;
    use crate::types::Transform;

    fn cached(mut shape: Shape, t: Transform) -> Shape {
        shape.cache_bb(&t);
        shape
    }

    #[test]
    fn overlapping_circles_produce_one_contact() {
        let a = cached(Shape::circle(1.0, Vec2::ZERO), Transform::IDENTITY);
        let b = cached(
            Shape::circle(1.0, Vec2::ZERO),
            Transform::translation(Vec2::new(1.5, 0.0)),
        );
        let info = collide(&a, &b);
        assert_eq!(info.points.len(), 1);
        assert!((info.normal - Vec2::new(1.0, 0.0)).length() < 1e-5);
        let p = info.points[0];
        assert!((p.dist + 0.5).abs() < 1e-5);
        assert!((p.point_a - Vec2::new(1.0, 0.0)).length() < 1e-5);
        assert!((p.point_b - Vec2::new(0.5, 0.0)).length() < 1e-5);
    }

    #[test]
    fn coincident_circle_centers_yield_no_contact() {
        let a = cached(Shape::circle(1.0, Vec2::ZERO), Transform::IDENTITY);
        let b = cached(Shape::circle(1.0, Vec2::ZERO), Transform::IDENTITY);
        assert!(collide(&a, &b).is_empty());
    }

    #[test]
    fn separated_circles_yield_no_contact() {
        let a = cached(Shape::circle(1.0, Vec2::ZERO), Transform::IDENTITY);
        let b = cached(
            Shape::circle(1.0, Vec2::ZERO),
            Transform::translation(Vec2::new(3.0, 0.0)),
        );
        assert!(collide(&a, &b).is_empty());
    }

    #[test]
    fn circle_rests_on_segment() {
        let a = cached(Shape::circle(1.0, Vec2::ZERO), Transform::translation(Vec2::new(0.0, 0.8)));
        let b = cached(
            Shape::segment(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0), 0.0),
            Transform::IDENTITY,
        );
        let info = collide(&a, &b);
        assert_eq!(info.points.len(), 1);
        // Normal points from the circle toward the segment (downward).
        assert!(info.normal.y < -0.99);
        assert!((info.points[0].dist + 0.2).abs() < 1e-5);
    }

    #[test]
    fn box_on_box_face_contact_has_two_points() {
        let a = cached(Shape::poly_box(2.0, 2.0, 0.0), Transform::IDENTITY);
        let b = cached(
            Shape::poly_box(2.0, 2.0, 0.0),
            Transform::translation(Vec2::new(0.0, 1.9)),
        );
        let info = collide(&a, &b);
        assert_eq!(info.points.len(), 2);
        assert!(info.normal.y > 0.99);
        for p in &info.points {
            assert!((p.dist + 0.1).abs() < 1e-4);
        }
    }

    #[test]
    fn beveled_boxes_collide_like_fattened_cores() {
        let a = cached(Shape::poly_box(2.0, 2.0, 0.25), Transform::IDENTITY);
        let b = cached(
            Shape::poly_box(2.0, 2.0, 0.25),
            Transform::translation(Vec2::new(0.0, 2.4)),
        );
        // Core gap is 0.4, combined radii 0.5: overlapping by 0.1.
        let info = collide(&a, &b);
        assert!(!info.is_empty());
        assert!(info.points.iter().all(|p| p.dist < 0.0 && p.dist > -0.2));
    }

    #[test]
    fn circle_hits_poly_corner() {
        let a = cached(
            Shape::circle(0.5, Vec2::ZERO),
            Transform::translation(Vec2::new(1.3, 1.3)),
        );
        let b = cached(Shape::poly_box(2.0, 2.0, 0.0), Transform::IDENTITY);
        let info = collide(&a, &b);
        assert_eq!(info.points.len(), 1);
        let expected = Vec2::new(-1.0, -1.0).normalized();
        assert!((info.normal - expected).length() < 1e-4);
    }

    #[test]
    fn crossing_segments_collide() {
        let a = cached(
            Shape::segment(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0), 0.1),
            Transform::IDENTITY,
        );
        let b = cached(
            Shape::segment(Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0), 0.1),
            Transform::IDENTITY,
        );
        let info = collide(&a, &b);
        assert!(!info.is_empty());
        assert!(info.normal.is_finite());
    }

    #[test]
    fn zero_length_segment_degrades_to_no_contact() {
        let a = cached(
            Shape::segment(Vec2::ZERO, Vec2::ZERO, 0.5),
            Transform::IDENTITY,
        );
        let b = cached(Shape::poly_box(2.0, 2.0, 0.0), Transform::IDENTITY);
        let info = collide(&a, &b);
        assert!(info.is_empty());
    }
}
