//! Circle-polygon collision.

use super::circle_circle::circle_contact;
use super::{CollisionInfo, ContactPointRaw};
use crate::shapes::SplittingPlane;
use crate::types::Vec2;

/// Feature-id namespace for corner contacts (face contacts use the face
/// index directly).
const CORNER_ID_BASE: u32 = 0x100;

pub(super) fn collide(
    center: Vec2,
    radius: f32,
    verts: &[Vec2],
    planes: &[SplittingPlane],
    poly_radius: f32,
) -> CollisionInfo {
    // Face of greatest separation relative to the circle center.
    let mut best_sep = f32::NEG_INFINITY;
    let mut best_i = 0;
    for (i, plane) in planes.iter().enumerate() {
        let sep = plane.n.dot(center) - plane.d - poly_radius;
        if sep > best_sep {
            best_sep = sep;
            best_i = i;
        }
    }
    if best_sep > radius {
        return CollisionInfo::NONE;
    }

    let v1 = verts[best_i];
    let v2 = verts[(best_i + 1) % verts.len()];
    let edge = v2 - v1;
    let t = (center - v1).dot(edge);

    if t < 0.0 {
        corner(center, radius, v1, poly_radius, best_i)
    } else if t > edge.length_sq() {
        corner(center, radius, v2, poly_radius, (best_i + 1) % verts.len())
    } else {
        // Face region: the plane normal points from the polygon toward the
        // circle, so the A-to-B (circle-to-polygon) normal is its negation.
        let n = planes[best_i].n;
        if best_sep < -radius {
            // Center is deep inside; the face normal is still the best
            // separation direction.
            tracing::trace!("circle center inside polygon");
        }
        CollisionInfo::single(
            -n,
            ContactPointRaw {
                point_a: center - n * radius,
                point_b: center - n * best_sep,
                dist: best_sep - radius,
                #[allow(clippy::cast_possible_truncation)]
                id: best_i as u32,
            },
        )
    }
}

fn corner(center: Vec2, radius: f32, vert: Vec2, poly_radius: f32, index: usize) -> CollisionInfo {
    #[allow(clippy::cast_possible_truncation)]
    let id = CORNER_ID_BASE | index as u32;
    match circle_contact(center, radius, vert, poly_radius, id) {
        Some((normal, point)) => CollisionInfo::single(normal, point),
        None => CollisionInfo::NONE,
    }
}
