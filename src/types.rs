//! # Core Value Types
//!
//! 2D vector, affine transform and axis-aligned bounding box primitives used
//! throughout the engine. All of these are plain `Copy` value types with
//! stable C layout so they can be marshalled into flat buffers.

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// 2D vector.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector for the given angle (radians).
    #[must_use]
    pub fn for_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    #[must_use]
    pub fn to_angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product of the two vectors.
    #[must_use]
    pub fn cross(self, other: Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// Counterclockwise perpendicular.
    #[must_use]
    pub fn perp(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Clockwise perpendicular.
    #[must_use]
    pub fn rperp(self) -> Self {
        Self::new(self.y, -self.x)
    }

    /// Complex multiplication: rotates `self` by the rotation vector `rot`.
    #[must_use]
    pub fn rotate(self, rot: Self) -> Self {
        Self::new(
            self.x * rot.x - self.y * rot.y,
            self.x * rot.y + self.y * rot.x,
        )
    }

    /// Inverse of [`Vec2::rotate`].
    #[must_use]
    pub fn unrotate(self, rot: Self) -> Self {
        Self::new(
            self.x * rot.x + self.y * rot.y,
            self.y * rot.x - self.x * rot.y,
        )
    }

    #[must_use]
    pub fn length_sq(self) -> f32 {
        self.dot(self)
    }

    #[must_use]
    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction. The zero vector normalizes to zero.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            self / len
        } else {
            Self::ZERO
        }
    }

    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self * (1.0 - t) + other * t
    }

    /// Clamps the vector to at most `len` long.
    #[must_use]
    pub fn clamp_len(self, len: f32) -> Self {
        if self.length_sq() > len * len {
            self.normalized() * len
        } else {
            self
        }
    }

    /// Projects `self` onto `other`.
    #[must_use]
    pub fn project(self, other: Self) -> Self {
        other * (self.dot(other) / other.dot(other))
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl MulAssign<f32> for Vec2 {
    fn mul_assign(&mut self, rhs: f32) {
        *self = *self * rhs;
    }
}

impl Div<f32> for Vec2 {
    type Output = Self;
    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl DivAssign<f32> for Vec2 {
    fn div_assign(&mut self, rhs: f32) {
        *self = *self / rhs;
    }
}

/// 2x3 affine transform mapping local coordinates to world coordinates.
///
/// Stored column major as `(a, b, c, d, tx, ty)`:
///
/// ```text
/// | a c tx |
/// | b d ty |
/// ```
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    #[must_use]
    pub const fn new(a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    #[must_use]
    pub const fn translation(t: Vec2) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, t.x, t.y)
    }

    #[must_use]
    pub fn rotation(angle: f32) -> Self {
        let rot = Vec2::for_angle(angle);
        Self::new(rot.x, rot.y, -rot.y, rot.x, 0.0, 0.0)
    }

    #[must_use]
    pub const fn scaling(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rigid transform from a translation and a unit rotation vector.
    #[must_use]
    pub const fn rigid(t: Vec2, rot: Vec2) -> Self {
        Self::new(rot.x, rot.y, -rot.y, rot.x, t.x, t.y)
    }

    /// Composition; non-commutative, applies `rhs` first.
    #[must_use]
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.a * rhs.a + self.c * rhs.b,
            self.b * rhs.a + self.d * rhs.b,
            self.a * rhs.c + self.c * rhs.d,
            self.b * rhs.c + self.d * rhs.d,
            self.a * rhs.tx + self.c * rhs.ty + self.tx,
            self.b * rhs.tx + self.d * rhs.ty + self.ty,
        )
    }

    /// Transforms a point (rotation and translation).
    #[must_use]
    pub fn point(self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }

    /// Transforms a vector (rotation only).
    #[must_use]
    pub fn vector(self, v: Vec2) -> Vec2 {
        Vec2::new(self.a * v.x + self.c * v.y, self.b * v.x + self.d * v.y)
    }

    /// Axis-aligned box containing the transformed corners of `bb`.
    #[must_use]
    pub fn bb(self, bb: BB) -> BB {
        let center = self.point(bb.center());
        let hw = (bb.right - bb.left) * 0.5;
        let hh = (bb.top - bb.bottom) * 0.5;
        let ex = (self.a * hw).abs() + (self.c * hh).abs();
        let ey = (self.b * hw).abs() + (self.d * hh).abs();
        BB::new(center.x - ex, center.y - ey, center.x + ex, center.y + ey)
    }

    #[must_use]
    pub fn inverse(self) -> Self {
        let det_inv = 1.0 / (self.a * self.d - self.c * self.b);
        Self::new(
            self.d * det_inv,
            -self.b * det_inv,
            -self.c * det_inv,
            self.a * det_inv,
            (self.c * self.ty - self.tx * self.d) * det_inv,
            (self.tx * self.b - self.a * self.ty) * det_inv,
        )
    }
}

/// Axis-aligned bounding box. Invariant for non-empty boxes:
/// `left <= right` and `bottom <= top`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BB {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl BB {
    /// Empty box sentinel with inverted bounds; merging with it yields the
    /// other box unchanged.
    pub const EMPTY: Self = Self {
        left: f32::INFINITY,
        bottom: f32::INFINITY,
        right: f32::NEG_INFINITY,
        top: f32::NEG_INFINITY,
    };

    #[must_use]
    pub const fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    #[must_use]
    pub fn for_circle(center: Vec2, radius: f32) -> Self {
        Self::new(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
        )
    }

    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.bottom <= other.top
            && other.bottom <= self.top
    }

    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.left <= other.left
            && self.right >= other.right
            && self.bottom <= other.bottom
            && self.top >= other.top
    }

    #[must_use]
    pub fn contains_vect(self, v: Vec2) -> bool {
        self.left <= v.x && v.x <= self.right && self.bottom <= v.y && v.y <= self.top
    }

    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self::new(
            self.left.min(other.left),
            self.bottom.min(other.bottom),
            self.right.max(other.right),
            self.top.max(other.top),
        )
    }

    #[must_use]
    pub fn expand(self, v: Vec2) -> Self {
        Self::new(
            self.left.min(v.x),
            self.bottom.min(v.y),
            self.right.max(v.x),
            self.top.max(v.y),
        )
    }

    /// Box grown outward by `r` on every side.
    #[must_use]
    pub fn grow(self, r: f32) -> Self {
        Self::new(self.left - r, self.bottom - r, self.right + r, self.top + r)
    }

    #[must_use]
    pub fn center(self) -> Vec2 {
        Vec2::new((self.left + self.right) * 0.5, (self.bottom + self.top) * 0.5)
    }

    #[must_use]
    pub fn area(self) -> f32 {
        (self.right - self.left) * (self.top - self.bottom)
    }

    /// Fraction along the segment `a..b` where it first enters the box, or
    /// `f32::INFINITY` if it never does.
    #[must_use]
    pub fn segment_query(self, a: Vec2, b: Vec2) -> f32 {
        let delta = b - a;
        let mut t_min: f32 = 0.0;
        let mut t_max: f32 = 1.0;

        for (da, pa, lo, hi) in [
            (delta.x, a.x, self.left, self.right),
            (delta.y, a.y, self.bottom, self.top),
        ] {
            if da.abs() < f32::EPSILON {
                if pa < lo || pa > hi {
                    return f32::INFINITY;
                }
            } else {
                let t1 = (lo - pa) / da;
                let t2 = (hi - pa) / da;
                t_min = t_min.max(t1.min(t2));
                t_max = t_max.min(t1.max(t2));
                if t_min > t_max {
                    return f32::INFINITY;
                }
            }
        }

        t_min
    }
}

/// Small 2x2 matrix used by the block solvers (pivot and groove joints).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Mat2x2 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
}

impl Mat2x2 {
    #[must_use]
    pub const fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self { a, b, c, d }
    }

    #[must_use]
    pub fn transform(self, v: Vec2) -> Vec2 {
        Vec2::new(v.x * self.a + v.y * self.b, v.x * self.c + v.y * self.d)
    }
}

/// Collision type tag used to key collision handlers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CollisionType(pub u64);

/// Category/mask filter deciding which shape pairs may collide at all.
///
/// Two shapes collide only if they are not in the same non-zero group and
/// each one's categories intersect the other's mask.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShapeFilter {
    pub group: u32,
    pub categories: u32,
    pub mask: u32,
}

impl ShapeFilter {
    pub const ALL_CATEGORIES: u32 = u32::MAX;

    #[must_use]
    pub const fn new(group: u32, categories: u32, mask: u32) -> Self {
        Self {
            group,
            categories,
            mask,
        }
    }

    /// Filter that collides with everything (group 0, all bits set).
    #[must_use]
    pub const fn all() -> Self {
        Self::new(0, Self::ALL_CATEGORIES, Self::ALL_CATEGORIES)
    }

    /// Whether the two filters permit their shapes to collide.
    #[must_use]
    pub fn rejects(self, other: Self) -> bool {
        (self.group != 0 && self.group == other.group)
            || (self.categories & other.mask) == 0
            || (other.categories & self.mask) == 0
    }
}

impl Default for ShapeFilter {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_rotate_roundtrip() {
        let v = Vec2::new(3.0, -2.0);
        let rot = Vec2::for_angle(0.7);
        let back = v.rotate(rot).unrotate(rot);
        assert!((back - v).length() < 1e-5);
    }

    #[test]
    fn perp_is_ccw() {
        let v = Vec2::new(1.0, 0.0);
        assert_eq!(v.perp(), Vec2::new(0.0, 1.0));
        assert_eq!(v.cross(v.perp()), 1.0);
    }

    #[test]
    fn transform_identity_law() {
        let t = Transform::rigid(Vec2::new(3.0, 4.0), Vec2::for_angle(1.2));
        let composed = Transform::IDENTITY.mul(t);
        let p = Vec2::new(-1.0, 2.5);
        assert!((composed.point(p) - t.point(p)).length() < 1e-6);
    }

    #[test]
    fn transform_translation_composes_additively() {
        let t1 = Transform::translation(Vec2::new(1.0, 2.0));
        let t2 = Transform::translation(Vec2::new(3.0, 4.0));
        let combined = t1.mul(t2);
        assert_eq!(combined, Transform::translation(Vec2::new(4.0, 6.0)));
    }

    #[test]
    fn transform_inverse_undoes_point() {
        let t = Transform::rigid(Vec2::new(5.0, -1.0), Vec2::for_angle(0.3));
        let p = Vec2::new(2.0, 7.0);
        let back = t.inverse().point(t.point(p));
        assert!((back - p).length() < 1e-4);
    }

    #[test]
    fn bb_merge_and_intersect() {
        let a = BB::new(0.0, 0.0, 2.0, 2.0);
        let b = BB::new(1.0, 1.0, 3.0, 3.0);
        let c = BB::new(5.0, 5.0, 6.0, 6.0);
        assert!(a.intersects(b));
        assert!(!a.intersects(c));
        assert_eq!(a.merge(b), BB::new(0.0, 0.0, 3.0, 3.0));
        assert_eq!(a.merge(BB::EMPTY), a);
    }

    #[test]
    fn bb_segment_query_hits_front_face() {
        let bb = BB::new(-1.0, -1.0, 1.0, 1.0);
        let t = bb.segment_query(Vec2::new(-3.0, 0.0), Vec2::new(3.0, 0.0));
        assert!((t - 2.0 / 6.0).abs() < 1e-6);
        let miss = bb.segment_query(Vec2::new(-3.0, 2.0), Vec2::new(3.0, 2.0));
        assert!(miss.is_infinite());
    }

    #[test]
    fn filter_same_group_rejects() {
        let f = ShapeFilter::new(5, ShapeFilter::ALL_CATEGORIES, ShapeFilter::ALL_CATEGORIES);
        assert!(f.rejects(f));
        assert!(!ShapeFilter::all().rejects(ShapeFilter::all()));
    }

    #[test]
    fn filter_disjoint_masks_reject() {
        let a = ShapeFilter::new(0, 0b01, 0b01);
        let b = ShapeFilter::new(0, 0b10, 0b10);
        assert!(a.rejects(b));
    }
}
