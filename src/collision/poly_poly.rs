//! Polygon-polygon collision: separating-axis search plus incident-edge
//! clipping, producing up to two contact points.
//!
//! This file also hosts the shared SAT pipeline used by the segment cases
//! (a segment is a degenerate two-vertex loop with a bevel radius).

use super::circle_circle::circle_contact;
use super::{find_max_separation, CollisionInfo, ContactPointRaw, PolyLike};
use crate::shapes::closest_point_on_segment;
use crate::types::Vec2;

const FLIP_BIT: u32 = 1 << 16;

pub(super) fn collide(a: PolyLike<'_>, b: PolyLike<'_>) -> CollisionInfo {
    sat_clip(a, b)
}

/// Full SAT + clip pipeline over two convex vertex loops. Falls back to a
/// closest-feature (rounded corner) contact when the clip produces nothing,
/// which happens for endcap-to-endcap and corner-to-corner configurations.
pub(super) fn sat_clip(a: PolyLike<'_>, b: PolyLike<'_>) -> CollisionInfo {
    let total_r = a.radius + b.radius;

    let (sep_a, idx_a) = find_max_separation(a.planes, b.verts);
    if sep_a > total_r {
        return CollisionInfo::NONE;
    }
    let (sep_b, idx_b) = find_max_separation(b.planes, a.verts);
    if sep_b > total_r {
        return CollisionInfo::NONE;
    }

    // Reference face = face of greatest separation; slight preference for A
    // keeps the choice stable for symmetric stacks.
    let info = if sep_b > sep_a + 1e-4 {
        clip_contacts(b, idx_b, a, true)
    } else {
        clip_contacts(a, idx_a, b, false)
    };

    if info.is_empty() {
        corner_fallback(a, b, total_r)
    } else {
        info
    }
}

fn clip_contacts(
    reference: PolyLike<'_>,
    ref_i: usize,
    incident: PolyLike<'_>,
    flipped: bool,
) -> CollisionInfo {
    let n = reference.planes[ref_i].n;
    let d = reference.planes[ref_i].d;
    let total_r = reference.radius + incident.radius;

    // Incident edge: the one whose outward normal is most opposed to the
    // reference normal.
    let mut inc_i = 0;
    let mut min_dot = f32::INFINITY;
    for (i, plane) in incident.planes.iter().enumerate() {
        let dot = plane.n.dot(n);
        if dot < min_dot {
            min_dot = dot;
            inc_i = i;
        }
    }
    let inc_count = incident.verts.len();
    let i1 = inc_i;
    let i2 = (inc_i + 1) % inc_count;

    #[allow(clippy::cast_possible_truncation)]
    let mut points = [
        (incident.verts[i1], i1 as u32),
        (incident.verts[i2], i2 as u32),
    ];

    // Clip the incident edge to the reference edge's span.
    let v1 = reference.verts[ref_i];
    let v2 = reference.verts[(ref_i + 1) % reference.verts.len()];
    let tangent = v2 - v1;
    if !clip(&mut points, -tangent, -tangent.dot(v1)) || !clip(&mut points, tangent, tangent.dot(v2))
    {
        return CollisionInfo::NONE;
    }

    let mut out = CollisionInfo {
        normal: if flipped { -n } else { n },
        points: Vec::with_capacity(2),
    };

    #[allow(clippy::cast_possible_truncation)]
    let ref_id_part = (ref_i as u32) << 8;
    for (p, vert_id) in points {
        let core_sep = n.dot(p) - d;
        let dist = core_sep - total_r;
        if dist > 0.0 {
            continue;
        }
        let p_ref = p - n * core_sep + n * reference.radius;
        let p_inc = p - n * incident.radius;
        let id = ref_id_part | vert_id | if flipped { FLIP_BIT } else { 0 };
        let (point_a, point_b) = if flipped { (p_inc, p_ref) } else { (p_ref, p_inc) };
        out.points.push(ContactPointRaw {
            point_a,
            point_b,
            dist,
            id,
        });
    }
    out
}

/// Clips the two points to the half-plane `axis . p <= bound`, moving a
/// point outside onto the boundary by interpolating along the edge. Returns
/// false when both points are outside (no contact along this face).
fn clip(points: &mut [(Vec2, u32); 2], axis: Vec2, bound: f32) -> bool {
    let d0 = axis.dot(points[0].0) - bound;
    let d1 = axis.dot(points[1].0) - bound;
    if d0 > 0.0 && d1 > 0.0 {
        return false;
    }
    if d0 > 0.0 {
        let t = d0 / (d0 - d1);
        points[0].0 = points[0].0.lerp(points[1].0, t);
    } else if d1 > 0.0 {
        let t = d1 / (d1 - d0);
        points[1].0 = points[1].0.lerp(points[0].0, t);
    }
    true
}

/// Rounded corner/endcap contact: closest vertex-to-boundary pair within
/// the combined radii, resolved like two circles.
fn corner_fallback(a: PolyLike<'_>, b: PolyLike<'_>, total_r: f32) -> CollisionInfo {
    let mut best_d_sq = f32::INFINITY;
    let mut best: Option<(Vec2, Vec2)> = None;

    for &v in a.verts {
        let p = closest_boundary_point(v, b.verts);
        let d_sq = (p - v).length_sq();
        if d_sq < best_d_sq {
            best_d_sq = d_sq;
            best = Some((v, p));
        }
    }
    for &v in b.verts {
        let p = closest_boundary_point(v, a.verts);
        let d_sq = (p - v).length_sq();
        if d_sq < best_d_sq {
            best_d_sq = d_sq;
            best = Some((p, v));
        }
    }

    let Some((pa, pb)) = best else {
        return CollisionInfo::NONE;
    };
    if best_d_sq > total_r * total_r {
        return CollisionInfo::NONE;
    }
    match circle_contact(pa, a.radius, pb, b.radius, FLIP_BIT | 0xFF) {
        Some((normal, point)) => CollisionInfo::single(normal, point),
        None => CollisionInfo::NONE,
    }
}

fn closest_boundary_point(p: Vec2, verts: &[Vec2]) -> Vec2 {
    let mut best = verts[0];
    let mut best_d_sq = f32::INFINITY;
    for i in 0..verts.len() {
        let q = closest_point_on_segment(p, verts[i], verts[(i + 1) % verts.len()]);
        let d_sq = (q - p).length_sq();
        if d_sq < best_d_sq {
            best_d_sq = d_sq;
            best = q;
        }
    }
    best
}
