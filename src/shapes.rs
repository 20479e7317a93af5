//! # Collision Shapes
//!
//! Circle, segment (capsule) and convex polygon shapes. A shape belongs to
//! at most one body, carries the collision material and filter, and caches
//! its world-space geometry and bounding box when [`Shape::cache_bb`] runs
//! (the space does this as part of every step).

use crate::body::BodyId;
use crate::error::PhysicsError;
use crate::types::{CollisionType, ShapeFilter, Transform, Vec2, BB};

/// One face plane of a polygon: outward normal and distance from origin.
#[derive(Copy, Clone, Debug)]
pub struct SplittingPlane {
    pub n: Vec2,
    pub d: f32,
}

/// Shape-specific geometry plus cached world-space data.
pub enum ShapeGeometry {
    Circle {
        offset: Vec2,
        radius: f32,
        /// Cached world center.
        tc: Vec2,
    },
    Segment {
        a: Vec2,
        b: Vec2,
        radius: f32,
        /// Local normal (rperp of the segment direction).
        n: Vec2,
        ta: Vec2,
        tb: Vec2,
        tn: Vec2,
    },
    Poly {
        /// Convex hull vertices, counterclockwise, body-local.
        verts: Vec<Vec2>,
        radius: f32,
        t_verts: Vec<Vec2>,
        t_planes: Vec<SplittingPlane>,
    },
}

impl ShapeGeometry {
    /// Tag used to order shape pairs canonically for dispatch and arbiter
    /// keys: circle < segment < poly.
    #[must_use]
    pub(crate) fn type_tag(&self) -> u8 {
        match self {
            Self::Circle { .. } => 0,
            Self::Segment { .. } => 1,
            Self::Poly { .. } => 2,
        }
    }
}

/// Result of a point query against a single shape.
#[derive(Copy, Clone, Debug)]
pub struct PointQueryResult {
    /// Closest point on the shape's surface.
    pub point: Vec2,
    /// Signed distance; negative when the query point is inside.
    pub distance: f32,
    /// Direction from the surface toward the query point.
    pub gradient: Vec2,
}

/// Result of a segment (ray) query against a single shape.
#[derive(Copy, Clone, Debug)]
pub struct SegmentQueryResult {
    pub point: Vec2,
    pub normal: Vec2,
    /// Fraction along the query segment at the hit.
    pub alpha: f32,
}

/// A collision shape attached to a body (or detached, for standalone
/// queries).
pub struct Shape {
    pub(crate) body: Option<BodyId>,
    pub(crate) geom: ShapeGeometry,

    pub sensor: bool,
    pub elasticity: f32,
    pub friction: f32,
    pub surface_velocity: Vec2,
    pub collision_type: CollisionType,
    pub filter: ShapeFilter,

    pub(crate) bb: BB,
}

impl Shape {
    fn with_geometry(geom: ShapeGeometry) -> Self {
        Self {
            body: None,
            geom,
            sensor: false,
            elasticity: 0.0,
            friction: 0.0,
            surface_velocity: Vec2::ZERO,
            collision_type: CollisionType::default(),
            filter: ShapeFilter::all(),
            bb: BB::EMPTY,
        }
    }

    #[must_use]
    pub fn circle(radius: f32, offset: Vec2) -> Self {
        assert!(radius.is_finite() && radius >= 0.0, "circle radius must be >= 0");
        Self::with_geometry(ShapeGeometry::Circle {
            offset,
            radius,
            tc: offset,
        })
    }

    #[must_use]
    pub fn segment(a: Vec2, b: Vec2, radius: f32) -> Self {
        assert!(a.is_finite() && b.is_finite(), "segment endpoints must be finite");
        let n = (b - a).normalized().rperp();
        Self::with_geometry(ShapeGeometry::Segment {
            a,
            b,
            radius,
            n,
            ta: a,
            tb: b,
            tn: n,
        })
    }

    /// Convex polygon from an arbitrary point cloud; the hull is computed
    /// and wound counterclockwise.
    ///
    /// # Errors
    /// [`PhysicsError::NonFinite`] when any input coordinate is NaN or
    /// infinite, and [`PhysicsError::DegeneratePolygon`] when fewer than 3
    /// non-collinear points remain after hulling.
    pub fn poly(points: &[Vec2], radius: f32) -> Result<Self, PhysicsError> {
        if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(PhysicsError::NonFinite("polygon vertex"));
        }
        let verts = convex_hull(points);
        if verts.len() < 3 {
            return Err(PhysicsError::DegeneratePolygon);
        }
        let t_planes = planes_for(&verts);
        Ok(Self::with_geometry(ShapeGeometry::Poly {
            t_verts: verts.clone(),
            verts,
            radius,
            t_planes,
        }))
    }

    /// Axis-aligned box polygon centered on the body origin.
    ///
    /// # Panics
    /// Panics if `width` or `height` is not positive.
    #[must_use]
    pub fn poly_box(width: f32, height: f32, radius: f32) -> Self {
        let hw = width * 0.5;
        let hh = height * 0.5;
        let verts = [
            Vec2::new(-hw, -hh),
            Vec2::new(hw, -hh),
            Vec2::new(hw, hh),
            Vec2::new(-hw, hh),
        ];
        // A box hull can't degenerate for positive extents.
        Self::poly(&verts, radius).expect("box polygon")
    }

    #[must_use]
    pub fn body(&self) -> Option<BodyId> {
        self.body
    }

    #[must_use]
    pub fn geometry(&self) -> &ShapeGeometry {
        &self.geom
    }

    /// Last cached world bounding box. Valid only after [`Shape::cache_bb`]
    /// or a completed space step.
    #[must_use]
    pub fn bb(&self) -> BB {
        self.bb
    }

    /// Recomputes world-space geometry and the bounding box for the given
    /// body transform. Idempotent for an unchanged transform.
    pub fn cache_bb(&mut self, transform: &Transform) -> BB {
        self.bb = match &mut self.geom {
            ShapeGeometry::Circle { offset, radius, tc } => {
                *tc = transform.point(*offset);
                BB::for_circle(*tc, *radius)
            }
            ShapeGeometry::Segment {
                a,
                b,
                radius,
                n,
                ta,
                tb,
                tn,
            } => {
                *ta = transform.point(*a);
                *tb = transform.point(*b);
                *tn = transform.vector(*n);
                BB::for_circle(*ta, *radius).merge(BB::for_circle(*tb, *radius))
            }
            ShapeGeometry::Poly {
                verts,
                radius,
                t_verts,
                t_planes,
            } => {
                let mut bb = BB::EMPTY;
                for (src, dst) in verts.iter().zip(t_verts.iter_mut()) {
                    *dst = transform.point(*src);
                    bb = bb.expand(*dst);
                }
                let count = t_verts.len();
                for i in 0..count {
                    let v1 = t_verts[i];
                    let v2 = t_verts[(i + 1) % count];
                    let n = (v2 - v1).normalized().rperp();
                    t_planes[i] = SplittingPlane { n, d: n.dot(v1) };
                }
                bb.grow(*radius)
            }
        };
        self.bb
    }

    /// Surface area of the shape (bevel radius included).
    #[must_use]
    pub fn area(&self) -> f32 {
        match &self.geom {
            ShapeGeometry::Circle { radius, .. } => area_for_circle(0.0, *radius),
            ShapeGeometry::Segment { a, b, radius, .. } => area_for_segment(*a, *b, *radius),
            ShapeGeometry::Poly { verts, radius, .. } => area_for_poly(verts, *radius),
        }
    }

    /// Moment of inertia for the given mass, about the body origin.
    #[must_use]
    pub fn moment_for_mass(&self, mass: f32) -> f32 {
        match &self.geom {
            ShapeGeometry::Circle { offset, radius, .. } => {
                moment_for_circle(mass, 0.0, *radius, *offset)
            }
            ShapeGeometry::Segment { a, b, radius, .. } => moment_for_segment(mass, *a, *b, *radius),
            ShapeGeometry::Poly { verts, radius, .. } => {
                moment_for_poly(mass, verts, Vec2::ZERO, *radius)
            }
        }
    }

    /// Centroid of the shape in body-local coordinates.
    #[must_use]
    pub fn centroid(&self) -> Vec2 {
        match &self.geom {
            ShapeGeometry::Circle { offset, .. } => *offset,
            ShapeGeometry::Segment { a, b, .. } => (*a + *b) * 0.5,
            ShapeGeometry::Poly { verts, .. } => centroid_for_poly(verts),
        }
    }

    /// Nearest point on the shape's surface to `p`, using the cached world
    /// geometry.
    #[must_use]
    pub fn point_query(&self, p: Vec2) -> PointQueryResult {
        match &self.geom {
            ShapeGeometry::Circle { radius, tc, .. } => circle_point_query(*tc, *radius, p),
            ShapeGeometry::Segment {
                radius, ta, tb, ..
            } => {
                let closest = closest_point_on_segment(p, *ta, *tb);
                circle_point_query(closest, *radius, p)
            }
            ShapeGeometry::Poly {
                radius,
                t_verts,
                t_planes,
                ..
            } => poly_point_query(t_verts, t_planes, *radius, p),
        }
    }

    /// Casts the segment `a..b` (inflated by `query_radius`) against the
    /// shape. Returns the first hit if any.
    #[must_use]
    pub fn segment_query(&self, a: Vec2, b: Vec2, query_radius: f32) -> Option<SegmentQueryResult> {
        match &self.geom {
            ShapeGeometry::Circle { radius, tc, .. } => {
                circle_segment_query(*tc, radius + query_radius, a, b)
            }
            ShapeGeometry::Segment {
                radius, ta, tb, tn, ..
            } => fat_segment_query(*ta, *tb, *tn, radius + query_radius, a, b),
            ShapeGeometry::Poly {
                radius,
                t_verts,
                t_planes,
                ..
            } => poly_segment_query(t_verts, t_planes, radius + query_radius, a, b),
        }
    }
}

// ---------------------------------------------------------------------------
// Mass property helpers
// ---------------------------------------------------------------------------

/// Moment of inertia for a hollow circle (solid when `r1 == 0`).
#[must_use]
pub fn moment_for_circle(mass: f32, r1: f32, r2: f32, offset: Vec2) -> f32 {
    mass * (0.5 * (r1 * r1 + r2 * r2) + offset.length_sq())
}

/// Moment of inertia for a beveled line segment.
#[must_use]
pub fn moment_for_segment(mass: f32, a: Vec2, b: Vec2, radius: f32) -> f32 {
    let offset = a.lerp(b, 0.5);
    let length = b.distance(a) + 2.0 * radius;
    mass * ((length * length + 4.0 * radius * radius) / 12.0 + offset.length_sq())
}

/// Moment of inertia for a solid convex polygon about `offset`.
#[must_use]
pub fn moment_for_poly(mass: f32, verts: &[Vec2], offset: Vec2, radius: f32) -> f32 {
    if verts.len() == 2 {
        return moment_for_segment(mass, verts[0], verts[1], 0.0);
    }
    let mut sum1 = 0.0;
    let mut sum2 = 0.0;
    for i in 0..verts.len() {
        let v1 = verts[i] + offset;
        let v2 = verts[(i + 1) % verts.len()] + offset;
        let a = v2.cross(v1);
        let b = v1.dot(v1) + v1.dot(v2) + v2.dot(v2);
        sum1 += a * b;
        sum2 += a;
    }
    // Beveled polygons approximate the radius contribution the way the
    // reference does: ignore it for the 2nd moment, it is tiny in practice.
    let _ = radius;
    (mass * sum1) / (6.0 * sum2)
}

/// Moment of inertia for a solid centered box.
#[must_use]
pub fn moment_for_box(mass: f32, width: f32, height: f32) -> f32 {
    mass * (width * width + height * height) / 12.0
}

#[must_use]
pub fn area_for_circle(r1: f32, r2: f32) -> f32 {
    std::f32::consts::PI * (r1 * r1 - r2 * r2).abs()
}

#[must_use]
pub fn area_for_segment(a: Vec2, b: Vec2, radius: f32) -> f32 {
    radius * (std::f32::consts::PI * radius + 2.0 * a.distance(b))
}

#[must_use]
pub fn area_for_poly(verts: &[Vec2], radius: f32) -> f32 {
    let mut area = 0.0;
    let mut perimeter = 0.0;
    for i in 0..verts.len() {
        let v1 = verts[i];
        let v2 = verts[(i + 1) % verts.len()];
        area += v1.cross(v2);
        perimeter += v1.distance(v2);
    }
    radius * (std::f32::consts::PI * radius + perimeter) + area * 0.5
}

#[must_use]
pub fn centroid_for_poly(verts: &[Vec2]) -> Vec2 {
    let mut sum = 0.0;
    let mut vsum = Vec2::ZERO;
    for i in 0..verts.len() {
        let v1 = verts[i];
        let v2 = verts[(i + 1) % verts.len()];
        let cross = v1.cross(v2);
        sum += cross;
        vsum += (v1 + v2) * cross;
    }
    vsum * (1.0 / (3.0 * sum))
}

/// Counterclockwise convex hull of a point cloud (monotone chain).
/// Collinear and duplicate points are dropped.
#[must_use]
pub fn convex_hull(points: &[Vec2]) -> Vec<Vec2> {
    let mut pts: Vec<Vec2> = points.to_vec();
    pts.sort_by(|a, b| (a.x, a.y).partial_cmp(&(b.x, b.y)).unwrap_or(std::cmp::Ordering::Equal));
    pts.dedup_by(|a, b| (*a - *b).length_sq() < f32::EPSILON);
    if pts.len() < 3 {
        return pts;
    }

    // Monotone chain: each half-hull pops only its own vertices, so the
    // junction points never cancel across passes.
    fn half_hull<'a>(points: impl Iterator<Item = &'a Vec2>) -> Vec<Vec2> {
        let mut hull: Vec<Vec2> = Vec::new();
        for &p in points {
            while hull.len() >= 2 {
                let q = hull[hull.len() - 1];
                let r = hull[hull.len() - 2];
                if (q - r).cross(p - r) <= 0.0 {
                    hull.pop();
                } else {
                    break;
                }
            }
            hull.push(p);
        }
        hull
    }

    let mut lower = half_hull(pts.iter());
    let mut upper = half_hull(pts.iter().rev());
    lower.pop();
    upper.pop();
    lower.append(&mut upper);
    lower
}

fn planes_for(verts: &[Vec2]) -> Vec<SplittingPlane> {
    let count = verts.len();
    (0..count)
        .map(|i| {
            let v1 = verts[i];
            let v2 = verts[(i + 1) % count];
            let n = (v2 - v1).normalized().rperp();
            SplittingPlane { n, d: n.dot(v1) }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Query primitives
// ---------------------------------------------------------------------------

#[must_use]
pub(crate) fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let delta = b - a;
    let len_sq = delta.length_sq();
    if len_sq < f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(delta) / len_sq).clamp(0.0, 1.0);
    a + delta * t
}

fn circle_point_query(center: Vec2, radius: f32, p: Vec2) -> PointQueryResult {
    let delta = p - center;
    let d = delta.length();
    let gradient = if d > 0.0 {
        delta / d
    } else {
        Vec2::new(0.0, 1.0)
    };
    PointQueryResult {
        point: center + gradient * radius,
        distance: d - radius,
        gradient,
    }
}

fn poly_point_query(
    verts: &[Vec2],
    planes: &[SplittingPlane],
    radius: f32,
    p: Vec2,
) -> PointQueryResult {
    // Distance to the hull boundary; negative inside.
    let mut outside = false;
    let mut best = f32::INFINITY;
    let mut best_point = verts[0];
    for plane in planes {
        if plane.n.dot(p) > plane.d {
            outside = true;
        }
    }
    for i in 0..verts.len() {
        let closest = closest_point_on_segment(p, verts[i], verts[(i + 1) % verts.len()]);
        let d = p.distance(closest);
        if d < best {
            best = d;
            best_point = closest;
        }
    }
    let core_dist = if outside { best } else { -best };
    let gradient = if outside {
        (p - best_point).normalized()
    } else if best > 0.0 {
        (best_point - p).normalized()
    } else {
        Vec2::new(0.0, 1.0)
    };
    PointQueryResult {
        point: best_point + gradient * radius,
        distance: core_dist - radius,
        gradient,
    }
}

fn circle_segment_query(
    center: Vec2,
    radius: f32,
    a: Vec2,
    b: Vec2,
) -> Option<SegmentQueryResult> {
    let da = a - center;
    let db = b - a;
    let qa = db.dot(db);
    let qb = 2.0 * da.dot(db);
    let qc = da.dot(da) - radius * radius;
    let det = qb * qb - 4.0 * qa * qc;
    if det < 0.0 || qa < f32::EPSILON {
        return None;
    }
    let t = (-qb - det.sqrt()) / (2.0 * qa);
    if (0.0..=1.0).contains(&t) {
        let point = a.lerp(b, t);
        Some(SegmentQueryResult {
            point,
            normal: (point - center).normalized(),
            alpha: t,
        })
    } else {
        None
    }
}

fn fat_segment_query(
    sa: Vec2,
    sb: Vec2,
    sn: Vec2,
    radius: f32,
    a: Vec2,
    b: Vec2,
) -> Option<SegmentQueryResult> {
    // Side planes of the capsule, then the endcaps.
    let d = sn.dot(sa);
    let flipped = if sn.dot(a) < d { -1.0 } else { 1.0 };
    let n = sn * flipped;
    let plane_d = d * flipped + radius;

    let an = n.dot(a);
    let bn = n.dot(b);
    let mut best: Option<SegmentQueryResult> = None;

    if an > plane_d && bn < an {
        let t = (plane_d - an) / (bn - an);
        if (0.0..=1.0).contains(&t) {
            let point = a.lerp(b, t);
            // Accept only within the segment's span.
            let seg_dir = sb - sa;
            let proj = (point - sa).dot(seg_dir);
            if proj >= 0.0 && proj <= seg_dir.length_sq() {
                best = Some(SegmentQueryResult {
                    point,
                    normal: n,
                    alpha: t,
                });
            }
        }
    }

    for cap in [sa, sb] {
        if let Some(hit) = circle_segment_query(cap, radius, a, b) {
            if best.as_ref().map_or(true, |cur| hit.alpha < cur.alpha) {
                best = Some(hit);
            }
        }
    }
    best
}

fn poly_segment_query(
    verts: &[Vec2],
    planes: &[SplittingPlane],
    radius: f32,
    a: Vec2,
    b: Vec2,
) -> Option<SegmentQueryResult> {
    let mut best: Option<SegmentQueryResult> = None;
    for (i, plane) in planes.iter().enumerate() {
        let n = plane.n;
        let an = n.dot(a);
        let d = plane.d + radius;
        if an <= d {
            continue;
        }
        let bn = n.dot(b);
        if (bn - an).abs() < f32::EPSILON {
            continue;
        }
        let t = (d - an) / (bn - an);
        if !(0.0..=1.0).contains(&t) {
            continue;
        }
        let point = a.lerp(b, t);
        let v1 = verts[i];
        let v2 = verts[(i + 1) % verts.len()];
        // Hit must land within the edge span, not past the corners (the
        // endcap circles below cover rounded corners).
        let dir = v2 - v1;
        let proj = (point - v1).dot(dir);
        if proj < 0.0 || proj > dir.length_sq() {
            continue;
        }
        if best.as_ref().map_or(true, |cur| t < cur.alpha) {
            best = Some(SegmentQueryResult {
                point,
                normal: n,
                alpha: t,
            });
        }
    }
    if radius > 0.0 {
        for &v in verts {
            if let Some(hit) = circle_segment_query(v, radius, a, b) {
                if best.as_ref().map_or(true, |cur| hit.alpha < cur.alpha) {
                    best = Some(hit);
                }
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_bb_and_idempotence() {
        let mut shape = Shape::circle(2.0, Vec2::new(1.0, 0.0));
        let t = Transform::translation(Vec2::new(10.0, 5.0));
        let bb1 = shape.cache_bb(&t);
        let bb2 = shape.cache_bb(&t);
        assert_eq!(bb1, bb2);
        assert_eq!(bb1, BB::new(9.0, 3.0, 13.0, 7.0));
    }

    #[test]
    fn box_moment_matches_formula() {
        let shape = Shape::poly_box(2.0, 4.0, 0.0);
        let m = shape.moment_for_mass(3.0);
        assert!((m - moment_for_box(3.0, 2.0, 4.0)).abs() < 1e-4);
    }

    #[test]
    fn poly_area_and_centroid() {
        let shape = Shape::poly_box(2.0, 2.0, 0.0);
        assert!((shape.area() - 4.0).abs() < 1e-5);
        assert!(shape.centroid().length() < 1e-6);
    }

    #[test]
    fn hull_drops_interior_points() {
        let hull = convex_hull(&[
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
            Vec2::new(1.0, 1.0),
        ]);
        assert_eq!(hull.len(), 4);
        // Counterclockwise winding.
        let mut area = 0.0;
        for i in 0..hull.len() {
            area += hull[i].cross(hull[(i + 1) % hull.len()]);
        }
        assert!(area > 0.0);
    }

    #[test]
    fn hull_keeps_every_corner_of_a_square() {
        // The junction between the lower and upper chains must not eat a
        // corner vertex.
        let corners = [
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
        ];
        let hull = convex_hull(&corners);
        assert_eq!(hull.len(), 4);
        for corner in corners {
            assert!(hull.contains(&corner), "lost corner {corner:?}");
        }
    }

    #[test]
    fn degenerate_poly_is_rejected() {
        let result = Shape::poly(&[Vec2::ZERO, Vec2::new(1.0, 1.0)], 0.0);
        assert!(result.is_err());
    }

    #[test]
    fn non_finite_poly_vertex_is_rejected() {
        let verts = [Vec2::ZERO, Vec2::new(1.0, f32::NAN), Vec2::new(0.0, 1.0)];
        assert!(matches!(
            Shape::poly(&verts, 0.0),
            Err(PhysicsError::NonFinite(_))
        ));
    }

    #[test]
    fn point_query_inside_circle_is_negative() {
        let mut shape = Shape::circle(3.0, Vec2::ZERO);
        shape.cache_bb(&Transform::IDENTITY);
        let info = shape.point_query(Vec2::new(1.0, 0.0));
        assert!((info.distance + 2.0).abs() < 1e-5);
        assert_eq!(info.gradient, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn segment_query_hits_circle_front() {
        let mut shape = Shape::circle(1.0, Vec2::ZERO);
        shape.cache_bb(&Transform::IDENTITY);
        let hit = shape
            .segment_query(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0), 0.0)
            .unwrap();
        assert!((hit.point.x + 1.0).abs() < 1e-4);
        assert!((hit.normal - Vec2::new(-1.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn segment_query_hits_poly_face() {
        let mut shape = Shape::poly_box(2.0, 2.0, 0.0);
        shape.cache_bb(&Transform::IDENTITY);
        let hit = shape
            .segment_query(Vec2::new(-5.0, 0.0), Vec2::new(0.0, 0.0), 0.0)
            .unwrap();
        assert!((hit.point.x + 1.0).abs() < 1e-4);
    }
}
