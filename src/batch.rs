//! # Batch Readout
//!
//! Bulk extraction of simulation state into flat buffers, for callers that
//! stream body or contact state somewhere else every frame (renderers,
//! recorders, FFI). Field selection is a bitmask; selected fields append in
//! declaration order, integers to the int buffer and floats to the float
//! buffer.

use std::ops::BitOr;

use crate::arena::Id;
use crate::simulation::Space;

/// Reusable pair of output buffers.
#[derive(Default)]
pub struct Buffer {
    pub ints: Vec<u64>,
    pub floats: Vec<f32>,
}

impl Buffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.ints.clear();
        self.floats.clear();
    }
}

/// Body fields selectable for batch readout.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BodyFields(pub u32);

impl BodyFields {
    pub const BODY_ID: Self = Self(1 << 0);
    pub const POSITION: Self = Self(1 << 1);
    pub const ANGLE: Self = Self(1 << 2);
    pub const VELOCITY: Self = Self(1 << 3);
    pub const ANGULAR_VELOCITY: Self = Self(1 << 4);

    pub const ALL: Self = Self(0b1_1111);

    #[must_use]
    pub fn contains(self, field: Self) -> bool {
        self.0 & field.0 != 0
    }
}

impl BitOr for BodyFields {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Arbiter fields selectable for batch readout.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArbiterFields(pub u32);

impl ArbiterFields {
    pub const BODY_A_ID: Self = Self(1 << 0);
    pub const BODY_B_ID: Self = Self(1 << 1);
    pub const TOTAL_IMPULSE: Self = Self(1 << 2);
    pub const TOTAL_KE: Self = Self(1 << 3);
    pub const IS_FIRST_CONTACT: Self = Self(1 << 4);
    pub const NORMAL: Self = Self(1 << 5);
    pub const CONTACT_COUNT: Self = Self(1 << 6);
    pub const POINT_A_1: Self = Self(1 << 7);
    pub const POINT_B_1: Self = Self(1 << 8);
    pub const DISTANCE_1: Self = Self(1 << 9);
    pub const POINT_A_2: Self = Self(1 << 10);
    pub const POINT_B_2: Self = Self(1 << 11);
    pub const DISTANCE_2: Self = Self(1 << 12);

    pub const ALL: Self = Self(0b1_1111_1111_1111);

    #[must_use]
    pub fn contains(self, field: Self) -> bool {
        self.0 & field.0 != 0
    }
}

impl BitOr for ArbiterFields {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

fn id_bits<T>(id: Id<T>) -> u64 {
    (u64::from(id.generation) << 32) | u64::from(id.index)
}

/// Appends the selected fields of every user body (arena order).
pub fn get_space_bodies(space: &Space, fields: BodyFields, buffer: &mut Buffer) {
    for (id, body) in space.bodies() {
        if id == space.static_body() {
            continue;
        }
        if fields.contains(BodyFields::BODY_ID) {
            buffer.ints.push(id_bits(id));
        }
        if fields.contains(BodyFields::POSITION) {
            let p = body.position();
            buffer.floats.extend_from_slice(&[p.x, p.y]);
        }
        if fields.contains(BodyFields::ANGLE) {
            buffer.floats.push(body.angle());
        }
        if fields.contains(BodyFields::VELOCITY) {
            let v = body.velocity;
            buffer.floats.extend_from_slice(&[v.x, v.y]);
        }
        if fields.contains(BodyFields::ANGULAR_VELOCITY) {
            buffer.floats.push(body.angular_velocity);
        }
    }
}

/// Appends the selected fields of every active arbiter (deterministic key
/// order). Missing second contact points pad with zeros so rows stay a
/// fixed width.
pub fn get_space_arbiters(space: &Space, fields: ArbiterFields, buffer: &mut Buffer) {
    for arb in space.arbiters() {
        let (body_a, body_b) = arb.bodies();
        let set = arb.contact_point_set();
        let point = |i: usize| set.points.get(i).copied();

        if fields.contains(ArbiterFields::BODY_A_ID) {
            buffer.ints.push(id_bits(body_a));
        }
        if fields.contains(ArbiterFields::BODY_B_ID) {
            buffer.ints.push(id_bits(body_b));
        }
        if fields.contains(ArbiterFields::TOTAL_IMPULSE) {
            let j = arb.total_impulse();
            buffer.floats.extend_from_slice(&[j.x, j.y]);
        }
        if fields.contains(ArbiterFields::TOTAL_KE) {
            buffer.floats.push(arb.total_ke());
        }
        if fields.contains(ArbiterFields::IS_FIRST_CONTACT) {
            buffer.ints.push(u64::from(arb.is_first_contact()));
        }
        if fields.contains(ArbiterFields::NORMAL) {
            let n = arb.normal();
            buffer.floats.extend_from_slice(&[n.x, n.y]);
        }
        if fields.contains(ArbiterFields::CONTACT_COUNT) {
            buffer.ints.push(arb.contact_count() as u64);
        }
        for (index, (pa_field, pb_field, d_field)) in [
            (
                ArbiterFields::POINT_A_1,
                ArbiterFields::POINT_B_1,
                ArbiterFields::DISTANCE_1,
            ),
            (
                ArbiterFields::POINT_A_2,
                ArbiterFields::POINT_B_2,
                ArbiterFields::DISTANCE_2,
            ),
        ]
        .into_iter()
        .enumerate()
        {
            if fields.contains(pa_field) {
                let p = point(index).map_or([0.0, 0.0], |c| [c.point_a.x, c.point_a.y]);
                buffer.floats.extend_from_slice(&p);
            }
            if fields.contains(pb_field) {
                let p = point(index).map_or([0.0, 0.0], |c| [c.point_b.x, c.point_b.y]);
                buffer.floats.extend_from_slice(&p);
            }
            if fields.contains(d_field) {
                buffer.floats.push(point(index).map_or(0.0, |c| c.distance));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::shapes::Shape;
    use crate::types::Vec2;

    #[test]
    fn body_rows_follow_declaration_order() {
        let mut space = Space::new();
        let mut body = Body::new(1.0, 1.0);
        body.set_position(Vec2::new(3.0, 4.0));
        body.velocity = Vec2::new(1.0, 2.0);
        let id = space.add_body(body).unwrap();

        let mut buffer = Buffer::new();
        get_space_bodies(
            &space,
            BodyFields::BODY_ID | BodyFields::POSITION | BodyFields::VELOCITY,
            &mut buffer,
        );

        assert_eq!(buffer.ints, vec![id_bits(id)]);
        assert_eq!(buffer.floats, vec![3.0, 4.0, 1.0, 2.0]);
    }

    #[test]
    fn arbiter_rows_pad_missing_second_contact() {
        let mut space = Space::new();
        for x in [0.0_f32, 1.5] {
            let mut body = Body::new(1.0, 1.0);
            body.set_position(Vec2::new(x, 0.0));
            let body = space.add_body(body).unwrap();
            space.add_shape(Shape::circle(1.0, Vec2::ZERO), body).unwrap();
        }
        space.step(1.0 / 60.0).unwrap();

        let mut buffer = Buffer::new();
        get_space_arbiters(
            &space,
            ArbiterFields::CONTACT_COUNT | ArbiterFields::DISTANCE_2,
            &mut buffer,
        );

        assert_eq!(buffer.ints, vec![1]);
        assert_eq!(buffer.floats, vec![0.0]);

        buffer.clear();
        assert!(buffer.ints.is_empty() && buffer.floats.is_empty());
    }
}
