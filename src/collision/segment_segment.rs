//! Segment-segment (capsule-capsule) collision via the shared SAT pipeline
//! over two-vertex loops.

use super::poly_poly::sat_clip;
use super::{segment_planes, CollisionInfo, PolyLike};
use crate::types::Vec2;

#[allow(clippy::too_many_arguments)]
pub(super) fn collide(
    a1: Vec2,
    b1: Vec2,
    n1: Vec2,
    r1: f32,
    a2: Vec2,
    b2: Vec2,
    n2: Vec2,
    r2: f32,
) -> CollisionInfo {
    let (Some(planes_a), Some(planes_b)) = (segment_planes(a1, b1, n1), segment_planes(a2, b2, n2))
    else {
        tracing::warn!("zero-length segment in collision, skipping");
        return CollisionInfo::NONE;
    };
    let verts_a = [a1, b1];
    let verts_b = [a2, b2];
    sat_clip(
        PolyLike {
            verts: &verts_a,
            planes: &planes_a,
            radius: r1,
        },
        PolyLike {
            verts: &verts_b,
            planes: &planes_b,
            radius: r2,
        },
    )
}
