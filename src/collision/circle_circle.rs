//! Circle-circle collision, closed form.

use super::{CollisionInfo, ContactPointRaw};
use crate::types::Vec2;

/// Contact between two circles. Shared by the segment endcap and polygon
/// corner cases, which reduce to this. Returns `None` when separated or
/// when the centers coincide (no normal can be determined).
pub(super) fn circle_contact(
    ca: Vec2,
    ra: f32,
    cb: Vec2,
    rb: f32,
    id: u32,
) -> Option<(Vec2, ContactPointRaw)> {
    let delta = cb - ca;
    let min_dist = ra + rb;
    let d_sq = delta.length_sq();
    if d_sq >= min_dist * min_dist {
        return None;
    }
    let d = d_sq.sqrt();
    if d <= f32::EPSILON {
        tracing::warn!("coincident circle centers, skipping contact");
        return None;
    }
    let normal = delta / d;
    Some((
        normal,
        ContactPointRaw {
            point_a: ca + normal * ra,
            point_b: cb - normal * rb,
            dist: d - min_dist,
            id,
        },
    ))
}

pub(super) fn collide(ca: Vec2, ra: f32, cb: Vec2, rb: f32) -> CollisionInfo {
    match circle_contact(ca, ra, cb, rb, 0) {
        Some((normal, point)) => CollisionInfo::single(normal, point),
        None => CollisionInfo::NONE,
    }
}
