//! Homogeneous vector and matrix helpers on top of [`glam`].
//!
//! The renderer speaks in 4x4 homogeneous transforms with logical
//! `(row, column)` addressing. glam stores matrices column-major, so this
//! module adds the small set of constructors and accessors the scene
//! passes need without leaving glam's types:
//!
//! - [`MatrixExt`]: row-major construction, `(row, col)` access, Euler
//!   rotations, `look_at`, `frustum` and a degree-based `perspective`
//! - [`VectorExt`]: three-component cross product and colour accessors
//! - [`Axes`]: which Euler axes a rotation includes
//!
//! # Example
//!
//! ```
//! use twinpass::math::{Axes, MatrixExt};
//! use glam::{Mat4, Vec3};
//!
//! let m = Mat4::from_row_major([
//!     1.0, 0.0, 0.0, 3.0,
//!     0.0, 1.0, 0.0, 4.0,
//!     0.0, 0.0, 1.0, 5.0,
//!     0.0, 0.0, 0.0, 1.0,
//! ]);
//! assert_eq!(m.get(0, 3), 3.0);
//! assert_eq!(m.transform_point3(Vec3::ZERO), Vec3::new(3.0, 4.0, 5.0));
//!
//! let r = Mat4::rotation(Axes::Y, 0.0, 1.0, 0.0);
//! assert!((r * Mat4::rotation(Axes::Y, 0.0, -1.0, 0.0)).abs_diff_eq(Mat4::IDENTITY, 1e-6));
//! ```

use glam::{Mat4, Vec3, Vec4};

/// Selects the Euler axes a rotation is built from.
///
/// A rotation with several axes set composes as `Rx · Ry · Rz`; an axis that
/// is not set contributes nothing, regardless of its angle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Axes {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl Axes {
    pub const NONE: Self = Self::new(false, false, false);
    pub const X: Self = Self::new(true, false, false);
    pub const Y: Self = Self::new(false, true, false);
    pub const Z: Self = Self::new(false, false, true);
    pub const XY: Self = Self::new(true, true, false);
    pub const ALL: Self = Self::new(true, true, true);

    pub const fn new(x: bool, y: bool, z: bool) -> Self {
        Self { x, y, z }
    }

    /// True when no axis is selected.
    pub fn is_empty(self) -> bool {
        !(self.x || self.y || self.z)
    }
}

/// Row/column oriented constructors and accessors for [`Mat4`].
pub trait MatrixExt: Sized {
    /// Build a matrix from 16 values given row by row.
    fn from_row_major(values: [f32; 16]) -> Self;

    /// Element at logical `(row, col)`.
    fn get(&self, row: usize, col: usize) -> f32;

    /// Overwrite the element at logical `(row, col)`.
    fn set(&mut self, row: usize, col: usize, value: f32);

    /// Euler rotation `Rx(ax) · Ry(ay) · Rz(az)` over the selected axes.
    ///
    /// Angles are in radians.
    fn rotation(axes: Axes, ax: f32, ay: f32, az: f32) -> Self;

    /// Viewing matrix with the camera at `eye` looking at `center`.
    ///
    /// Rows of the rotation part are the side, up and negated forward
    /// vectors, followed by a translation by `-eye`.
    fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Self;

    /// Perspective frustum in OpenGL clip convention (depth in `[-1, 1]`).
    fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self;

    /// Symmetric perspective projection from a vertical field of view in degrees.
    fn perspective(fovy_degrees: f32, aspect: f32, near: f32, far: f32) -> Self;
}

impl MatrixExt for Mat4 {
    fn from_row_major(values: [f32; 16]) -> Self {
        Mat4::from_cols_array(&values).transpose()
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> f32 {
        self.col(col)[row]
    }

    #[inline]
    fn set(&mut self, row: usize, col: usize, value: f32) {
        self.col_mut(col)[row] = value;
    }

    fn rotation(axes: Axes, ax: f32, ay: f32, az: f32) -> Self {
        let mut m = Mat4::IDENTITY;
        if axes.x {
            let (s, c) = ax.sin_cos();
            m *= Mat4::from_row_major([
                1.0, 0.0, 0.0, 0.0, //
                0.0, c, -s, 0.0, //
                0.0, s, c, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ]);
        }
        if axes.y {
            let (s, c) = ay.sin_cos();
            m *= Mat4::from_row_major([
                c, 0.0, s, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                -s, 0.0, c, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ]);
        }
        if axes.z {
            let (s, c) = az.sin_cos();
            m *= Mat4::from_row_major([
                c, -s, 0.0, 0.0, //
                s, c, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ]);
        }
        m
    }

    fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Self {
        let f = (center - eye).normalize();
        let s = f.cross(up).normalize();
        let u = s.cross(f).normalize();
        let rotation = Mat4::from_row_major([
            s.x, s.y, s.z, 0.0, //
            u.x, u.y, u.z, 0.0, //
            -f.x, -f.y, -f.z, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]);
        rotation * Mat4::from_translation(-eye)
    }

    fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let a = (right + left) / (right - left);
        let b = (top + bottom) / (top - bottom);
        let c = -(far + near) / (far - near);
        let d = -(2.0 * far * near) / (far - near);
        let x = (2.0 * near) / (right - left);
        let y = (2.0 * near) / (top - bottom);
        Mat4::from_row_major([
            x, 0.0, a, 0.0, //
            0.0, y, b, 0.0, //
            0.0, 0.0, c, d, //
            0.0, 0.0, -1.0, 0.0,
        ])
    }

    fn perspective(fovy_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let top = near * (fovy_degrees.to_radians() / 2.0).tan();
        let right = aspect * top;
        Mat4::frustum(-right, right, -top, top, near, far)
    }
}

/// Homogeneous vector helpers for [`Vec4`].
pub trait VectorExt {
    /// Cross product of the first three components. The result has `w = 0`.
    fn cross3(self, other: Self) -> Self;

    fn r(self) -> f32;
    fn g(self) -> f32;
    fn b(self) -> f32;
    fn a(self) -> f32;
}

impl VectorExt for Vec4 {
    #[inline]
    fn cross3(self, other: Self) -> Self {
        self.truncate().cross(other.truncate()).extend(0.0)
    }

    #[inline]
    fn r(self) -> f32 {
        self.x
    }

    #[inline]
    fn g(self) -> f32 {
        self.y
    }

    #[inline]
    fn b(self) -> f32 {
        self.z
    }

    #[inline]
    fn a(self) -> f32 {
        self.w
    }
}

/// Point in homogeneous coordinates (`w = 1`).
#[inline]
pub fn point(x: f32, y: f32, z: f32) -> Vec4 {
    Vec4::new(x, y, z, 1.0)
}

/// Direction in homogeneous coordinates (`w = 0`).
#[inline]
pub fn direction(x: f32, y: f32, z: f32) -> Vec4 {
    Vec4::new(x, y, z, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn sample(seed: f32) -> Mat4 {
        Mat4::from_row_major(std::array::from_fn(|i| ((i as f32 + seed) * 0.37).sin()))
    }

    #[test]
    fn row_major_addressing() {
        let m = Mat4::from_row_major(std::array::from_fn(|i| i as f32));
        assert_eq!(m.get(0, 1), 1.0);
        assert_eq!(m.get(1, 0), 4.0);
        assert_eq!(m.get(3, 2), 14.0);

        let mut m = Mat4::IDENTITY;
        m.set(2, 3, 7.5);
        assert_eq!(m.w_axis.z, 7.5);
    }

    #[test]
    fn multiplication_is_associative() {
        let (a, b, c) = (sample(1.0), sample(2.0), sample(3.0));
        assert!(((a * b) * c).abs_diff_eq(a * (b * c), 1e-4));
    }

    #[test]
    fn double_transpose_is_identity() {
        let m = sample(4.0);
        assert_eq!(m.transpose().transpose(), m);
    }

    #[test]
    fn rotation_by_negated_angle_cancels() {
        for axes in [Axes::X, Axes::Y, Axes::Z] {
            let r = Mat4::rotation(axes, 0.7, 0.7, 0.7);
            let back = Mat4::rotation(axes, -0.7, -0.7, -0.7);
            assert!((r * back).abs_diff_eq(Mat4::IDENTITY, 1e-6));
        }
    }

    #[test]
    fn rotation_matches_right_handed_convention() {
        let rz = Mat4::rotation(Axes::Z, 0.0, 0.0, FRAC_PI_2);
        assert!(rz.transform_vector3(Vec3::X).abs_diff_eq(Vec3::Y, 1e-6));

        let rx = Mat4::rotation(Axes::X, FRAC_PI_2, 0.0, 0.0);
        assert!(rx.transform_vector3(Vec3::Y).abs_diff_eq(Vec3::Z, 1e-6));

        let none = Mat4::rotation(Axes::NONE, 1.0, 2.0, 3.0);
        assert_eq!(none, Mat4::IDENTITY);
    }

    #[test]
    fn look_at_agrees_with_glam() {
        let eye = Vec3::new(1.0, 2.0, 3.0);
        let center = Vec3::new(-1.0, 0.5, -4.0);
        let ours = Mat4::look_at(eye, center, Vec3::Y);
        assert!(ours.abs_diff_eq(Mat4::look_at_rh(eye, center, Vec3::Y), 1e-5));
    }

    #[test]
    fn perspective_agrees_with_gl_projection() {
        let ours = Mat4::perspective(60.0, 1.5, 0.1, 100.0);
        let glam = Mat4::perspective_rh_gl(60f32.to_radians(), 1.5, 0.1, 100.0);
        assert!(ours.abs_diff_eq(glam, 1e-5));
    }

    #[test]
    fn cross3_drops_w() {
        let c = Vec4::new(1.0, 0.0, 0.0, 5.0).cross3(Vec4::new(0.0, 1.0, 0.0, 9.0));
        assert_eq!(c, Vec4::new(0.0, 0.0, 1.0, 0.0));
    }

    #[test]
    fn normalize_uses_all_four_components() {
        let v = Vec4::new(1.0, 1.0, 1.0, 1.0).normalize();
        assert!((v.x - 0.5).abs() < 1e-6);
        assert!((v.w - 0.5).abs() < 1e-6);
    }
}
