//! Segment-polygon collision via the shared SAT pipeline.

use super::poly_poly::sat_clip;
use super::{segment_planes, CollisionInfo, PolyLike};
use crate::shapes::SplittingPlane;
use crate::types::Vec2;

pub(super) fn collide(
    a: Vec2,
    b: Vec2,
    n: Vec2,
    radius: f32,
    verts: &[Vec2],
    planes: &[SplittingPlane],
    poly_radius: f32,
) -> CollisionInfo {
    let Some(seg_planes) = segment_planes(a, b, n) else {
        tracing::warn!("zero-length segment in collision, skipping");
        return CollisionInfo::NONE;
    };
    let seg_verts = [a, b];
    sat_clip(
        PolyLike {
            verts: &seg_verts,
            planes: &seg_planes,
            radius,
        },
        PolyLike {
            verts,
            planes,
            radius: poly_radius,
        },
    )
}
