//! # Spatial Queries
//!
//! Read-only interrogation of a space: nearest-point, ray-cast, bounding
//! box and shape-overlap queries, all narrowed by the broad-phase grid and
//! the shape filter.

use crate::body::ShapeId;
use crate::collision::{collide, CollisionInfo};
use crate::shapes::Shape;
use crate::simulation::Space;
use crate::types::{ShapeFilter, Transform, Vec2, BB};

/// One shape within range of a point query.
#[derive(Copy, Clone, Debug)]
pub struct PointQueryInfo {
    pub shape: ShapeId,
    /// Closest point on the shape's surface.
    pub point: Vec2,
    /// Signed distance; negative when the query point is inside.
    pub distance: f32,
    /// Direction from the surface toward the query point.
    pub gradient: Vec2,
}

/// One shape hit by a segment query.
#[derive(Copy, Clone, Debug)]
pub struct SegmentQueryInfo {
    pub shape: ShapeId,
    pub point: Vec2,
    pub normal: Vec2,
    /// Fraction along the query segment where the hit starts.
    pub alpha: f32,
}

/// One shape overlapping a shape query.
pub struct ShapeQueryInfo {
    pub shape: ShapeId,
    pub contacts: CollisionInfo,
}

impl Space {
    /// Every shape within `max_distance` of `p`, sensors included.
    /// `max_distance` may be negative to require penetration depth.
    #[must_use]
    pub fn point_query(
        &self,
        p: Vec2,
        max_distance: f32,
        filter: ShapeFilter,
    ) -> Vec<PointQueryInfo> {
        let bb = BB::for_circle(p, max_distance.max(0.0));
        let mut out = Vec::new();
        for id in self.grid.query_bb(bb) {
            let Some(shape) = self.shapes.get(id) else {
                continue;
            };
            if filter.rejects(shape.filter) {
                continue;
            }
            let result = shape.point_query(p);
            if result.distance < max_distance {
                out.push(PointQueryInfo {
                    shape: id,
                    point: result.point,
                    distance: result.distance,
                    gradient: result.gradient,
                });
            }
        }
        out.sort_unstable_by(|a, b| a.shape.cmp(&b.shape));
        out
    }

    /// The non-sensor shape closest to `p` within `max_distance`.
    #[must_use]
    pub fn point_query_nearest(
        &self,
        p: Vec2,
        max_distance: f32,
        filter: ShapeFilter,
    ) -> Option<PointQueryInfo> {
        self.point_query(p, max_distance, filter)
            .into_iter()
            .filter(|info| !self.shapes.get(info.shape).is_some_and(|s| s.sensor))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Every shape crossed by the fat segment from `a` to `b`, sensors
    /// included, ordered by hit fraction.
    #[must_use]
    pub fn segment_query(
        &self,
        a: Vec2,
        b: Vec2,
        radius: f32,
        filter: ShapeFilter,
    ) -> Vec<SegmentQueryInfo> {
        let bb = BB::for_circle(a, radius).merge(BB::for_circle(b, radius));
        let mut out = Vec::new();
        for id in self.grid.query_bb(bb) {
            let Some(shape) = self.shapes.get(id) else {
                continue;
            };
            if filter.rejects(shape.filter) {
                continue;
            }
            if let Some(hit) = shape.segment_query(a, b, radius) {
                out.push(SegmentQueryInfo {
                    shape: id,
                    point: hit.point,
                    normal: hit.normal,
                    alpha: hit.alpha,
                });
            }
        }
        out.sort_unstable_by(|x, y| x.alpha.total_cmp(&y.alpha).then(x.shape.cmp(&y.shape)));
        out
    }

    /// The first non-sensor shape hit along the fat segment.
    #[must_use]
    pub fn segment_query_first(
        &self,
        a: Vec2,
        b: Vec2,
        radius: f32,
        filter: ShapeFilter,
    ) -> Option<SegmentQueryInfo> {
        self.segment_query(a, b, radius, filter)
            .into_iter()
            .find(|info| !self.shapes.get(info.shape).is_some_and(|s| s.sensor))
    }

    /// Ids of every shape whose bounding box intersects `bb`.
    #[must_use]
    pub fn bb_query(&self, bb: BB, filter: ShapeFilter) -> Vec<ShapeId> {
        let mut out: Vec<ShapeId> = self
            .grid
            .query_bb(bb)
            .into_iter()
            .filter(|id| {
                self.shapes
                    .get(*id)
                    .is_some_and(|s| !filter.rejects(s.filter) && s.bb().intersects(bb))
            })
            .collect();
        out.sort_unstable();
        out
    }

    /// Narrow-phase contacts between a free-standing query shape (placed by
    /// `transform`) and everything it overlaps.
    #[must_use]
    pub fn shape_query(&self, shape: &mut Shape, transform: &Transform) -> Vec<ShapeQueryInfo> {
        let bb = shape.cache_bb(transform);
        let mut out = Vec::new();
        for id in self.grid.query_bb(bb) {
            let Some(other) = self.shapes.get(id) else {
                continue;
            };
            if shape.filter.rejects(other.filter) {
                continue;
            }
            let query_tag = shape.geometry().type_tag();
            let contacts = if query_tag <= other.geometry().type_tag() {
                collide(shape, other)
            } else {
                // Normal points from the query shape toward the other.
                collide(other, shape).flipped()
            };
            if !contacts.is_empty() {
                out.push(ShapeQueryInfo { shape: id, contacts });
            }
        }
        out.sort_unstable_by(|a, b| a.shape.cmp(&b.shape));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;

    fn space_with_two_balls() -> (Space, ShapeId, ShapeId) {
        let mut space = Space::new();
        let sa = {
            let body = space.add_body(Body::new(1.0, 1.0)).unwrap();
            space.add_shape(Shape::circle(1.0, Vec2::ZERO), body).unwrap()
        };
        let sb = {
            let mut body = Body::new(1.0, 1.0);
            body.set_position(Vec2::new(10.0, 0.0));
            let body = space.add_body(body).unwrap();
            space.add_shape(Shape::circle(1.0, Vec2::ZERO), body).unwrap()
        };
        (space, sa, sb)
    }

    #[test]
    fn point_query_ranks_by_distance() {
        let (space, sa, _) = space_with_two_balls();

        let hits = space.point_query(Vec2::new(2.0, 0.0), 20.0, ShapeFilter::all());
        assert_eq!(hits.len(), 2);

        let nearest = space
            .point_query_nearest(Vec2::new(2.0, 0.0), 20.0, ShapeFilter::all())
            .unwrap();
        assert_eq!(nearest.shape, sa);
        assert!((nearest.distance - 1.0).abs() < 1e-5);
        assert_eq!(nearest.point, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn segment_query_orders_hits_by_alpha() {
        let (space, sa, sb) = space_with_two_balls();

        let hits = space.segment_query(
            Vec2::new(-5.0, 0.0),
            Vec2::new(15.0, 0.0),
            0.0,
            ShapeFilter::all(),
        );
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].shape, sa);
        assert_eq!(hits[1].shape, sb);
        assert!(hits[0].alpha < hits[1].alpha);

        let first = space
            .segment_query_first(
                Vec2::new(-5.0, 0.0),
                Vec2::new(15.0, 0.0),
                0.0,
                ShapeFilter::all(),
            )
            .unwrap();
        assert_eq!(first.shape, sa);
        assert!((first.point.x + 1.0).abs() < 1e-4);
    }

    #[test]
    fn sensors_are_invisible_to_first_hit_queries() {
        let (mut space, sa, sb) = space_with_two_balls();
        space.shape_mut(sa).unwrap().sensor = true;

        let first = space
            .segment_query_first(
                Vec2::new(-5.0, 0.0),
                Vec2::new(15.0, 0.0),
                0.0,
                ShapeFilter::all(),
            )
            .unwrap();
        assert_eq!(first.shape, sb);
    }

    #[test]
    fn bb_query_respects_filters() {
        let (mut space, sa, sb) = space_with_two_balls();
        space.shape_mut(sb).unwrap().filter = ShapeFilter::new(0, 0b01, 0b01);

        let everything = BB::new(-20.0, -20.0, 20.0, 20.0);
        assert_eq!(space.bb_query(everything, ShapeFilter::all()), vec![sa, sb]);

        let masked = ShapeFilter::new(0, 0b10, 0b10);
        assert_eq!(space.bb_query(everything, masked), vec![sa]);
    }

    #[test]
    fn shape_query_reports_overlaps() {
        let (space, sa, _) = space_with_two_balls();

        let mut probe = Shape::circle(2.0, Vec2::ZERO);
        let hits = space.shape_query(&mut probe, &Transform::translation(Vec2::new(2.0, 0.0)));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].shape, sa);
        assert!(!hits[0].contacts.points.is_empty());
    }
}
