//! Rotation quaternions for SQT transforms and interpolated animation.

use glam::{Mat4, Vec3, Vec4};

use crate::math::MatrixExt;

/// A quaternion `(x, y, z, w)` with `w` as the scalar part.
///
/// Quaternions here are not forced to unit length. [`Quaternion::to_matrix`]
/// scales by `2 / |q|²` so any non-zero quaternion yields a pure rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians about `axis`.
    ///
    /// The axis is normalized first; a zero axis yields the identity.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let axis = axis.normalize_or_zero();
        if axis == Vec3::ZERO {
            return Self::IDENTITY;
        }
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    #[inline]
    fn as_vec4(self) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, self.w)
    }

    #[inline]
    fn from_vec4(v: Vec4) -> Self {
        Self::new(v.x, v.y, v.z, v.w)
    }

    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Multiplicative inverse: conjugate divided by the squared norm.
    pub fn inverse(self) -> Self {
        self.conjugate().scale(1.0 / self.norm_squared())
    }

    pub fn norm_squared(self) -> f32 {
        self.as_vec4().length_squared()
    }

    pub fn norm(self) -> f32 {
        self.as_vec4().length()
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::from_vec4(self.as_vec4() * factor)
    }

    pub fn dot(self, other: Self) -> f32 {
        self.as_vec4().dot(other.as_vec4())
    }

    /// Spherical linear interpolation from `self` (t = 0) to `other` (t = 1).
    ///
    /// The angle is `acos(self · other)`. Nearly parallel inputs fall back to
    /// a linear blend where `sin(angle)` would vanish.
    pub fn slerp(self, other: Self, t: f32) -> Self {
        let cos = self.dot(other).clamp(-1.0, 1.0);
        let angle = cos.acos();
        let sin = angle.sin();
        if sin.abs() < 1e-6 {
            return Self::from_vec4(self.as_vec4().lerp(other.as_vec4(), t));
        }
        let a = ((1.0 - t) * angle).sin() / sin;
        let b = (t * angle).sin() / sin;
        Self::from_vec4(self.as_vec4() * a + other.as_vec4() * b)
    }

    /// Homogeneous rotation matrix, valid for any non-zero quaternion.
    pub fn to_matrix(self) -> Mat4 {
        let Self { x, y, z, w } = self;
        let s = 2.0 / self.norm_squared();
        Mat4::from_row_major([
            1.0 - s * (y * y + z * z),
            s * (x * y - w * z),
            s * (x * z + w * y),
            0.0,
            s * (x * y + w * z),
            1.0 - s * (x * x + z * z),
            s * (y * z - w * x),
            0.0,
            s * (x * z - w * y),
            s * (y * z + w * x),
            1.0 - s * (x * x + y * y),
            0.0,
            0.0,
            0.0,
            0.0,
            1.0,
        ])
    }
}

impl std::ops::Mul for Quaternion {
    type Output = Self;

    /// Hamilton product; `a * b` applies `b` first.
    fn mul(self, rhs: Self) -> Self {
        let (a, b) = (self, rhs);
        Self::new(
            a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        )
    }
}

impl From<glam::Quat> for Quaternion {
    fn from(q: glam::Quat) -> Self {
        Self::new(q.x, q.y, q.z, q.w)
    }
}
