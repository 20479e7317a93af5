//! Circle-segment (capsule) collision.

use super::circle_circle::circle_contact;
use super::CollisionInfo;
use crate::shapes::closest_point_on_segment;
use crate::types::Vec2;

pub(super) fn collide(center: Vec2, radius: f32, a: Vec2, b: Vec2, seg_radius: f32) -> CollisionInfo {
    // The capsule surface is the core segment fattened by its radius, so
    // the closest core point reduces this to circle vs circle.
    let closest = closest_point_on_segment(center, a, b);
    match circle_contact(center, radius, closest, seg_radius, 0) {
        Some((normal, point)) => CollisionInfo::single(normal, point),
        None => CollisionInfo::NONE,
    }
}
