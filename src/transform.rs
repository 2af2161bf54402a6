//! Local transformations attached to group nodes.
//!
//! A [`Transformation`] always carries its matrix together with the exact
//! inverse. Values are immutable: changing a rotation angle or an SQT
//! component builds a new transformation, so the two matrices can never
//! disagree. Animation drivers swap whole transformations into the graph
//! through [`SceneGraph::set_transform`](crate::scene::SceneGraph::set_transform).
//!
//! # Example
//!
//! ```
//! use twinpass::transform::Transformation;
//! use twinpass::math::Axes;
//! use glam::{Mat4, Vec3};
//!
//! let t = Transformation::translation(Vec3::new(0.0, 0.0, -5.0));
//! assert!((t.matrix() * t.inverse()).abs_diff_eq(Mat4::IDENTITY, 1e-6));
//!
//! let spin = Transformation::rotation(Axes::Y, Vec3::ZERO);
//! let spun = spin.with_angles(Vec3::new(0.0, 0.5, 0.0));
//! assert_eq!(spun.angles(), Some(Vec3::new(0.0, 0.5, 0.0)));
//! ```

use glam::{Mat4, Vec3};
use thiserror::Error;

use crate::math::{Axes, MatrixExt};
use crate::quaternion::Quaternion;

/// Rejected transformation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransformError {
    /// A scale factor of zero has no inverse.
    #[error("scale component {axis} is zero")]
    ZeroScale { axis: char },
    /// NaN or infinite input.
    #[error("transformation parameter {what} is not finite")]
    NonFinite { what: &'static str },
    /// A quaternion of zero length cannot describe a rotation.
    #[error("rotation quaternion has zero length")]
    DegenerateRotation,
}

/// The parameters a [`Transformation`] was built from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformKind {
    Translation(Vec3),
    /// Euler angles in radians, composed as `Rx · Ry · Rz` over `axes`.
    Rotation { axes: Axes, angles: Vec3 },
    Scaling(Vec3),
    /// Accumulated camera-style motion, stored as raw matrices.
    FreeFlight,
    /// Scale, then rotate, then translate.
    Sqt {
        scale: Vec3,
        rotation: Quaternion,
        translation: Vec3,
    },
}

/// A local transform with its exact inverse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transformation {
    kind: TransformKind,
    matrix: Mat4,
    inverse: Mat4,
}

impl Default for Transformation {
    fn default() -> Self {
        Self::identity()
    }
}

fn check_finite(v: Vec3, what: &'static str) -> Result<(), TransformError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(TransformError::NonFinite { what })
    }
}

fn check_scale(scale: Vec3) -> Result<(), TransformError> {
    check_finite(scale, "scale")?;
    for (axis, value) in ['x', 'y', 'z'].into_iter().zip(scale.to_array()) {
        if value == 0.0 {
            return Err(TransformError::ZeroScale { axis });
        }
    }
    Ok(())
}

impl Transformation {
    /// The identity, expressed as a zero translation.
    pub fn identity() -> Self {
        Self::translation(Vec3::ZERO)
    }

    pub fn translation(offset: Vec3) -> Self {
        Self {
            kind: TransformKind::Translation(offset),
            matrix: Mat4::from_translation(offset),
            inverse: Mat4::from_translation(-offset),
        }
    }

    /// Euler rotation over the selected axes; angles in radians.
    pub fn rotation(axes: Axes, angles: Vec3) -> Self {
        let matrix = Mat4::rotation(axes, angles.x, angles.y, angles.z);
        Self {
            kind: TransformKind::Rotation { axes, angles },
            matrix,
            // Orthonormal, so the transpose is the exact inverse of Rx·Ry·Rz.
            inverse: matrix.transpose(),
        }
    }

    /// Non-uniform scale. Zero or non-finite factors are rejected.
    pub fn scaling(scale: Vec3) -> Result<Self, TransformError> {
        check_scale(scale)?;
        Ok(Self {
            kind: TransformKind::Scaling(scale),
            matrix: Mat4::from_scale(scale),
            inverse: Mat4::from_scale(scale.recip()),
        })
    }

    /// Scale, rotate by `rotation`, then translate.
    pub fn sqt(
        scale: Vec3,
        rotation: Quaternion,
        translation: Vec3,
    ) -> Result<Self, TransformError> {
        check_scale(scale)?;
        check_finite(translation, "translation")?;
        let norm = rotation.norm_squared();
        if !norm.is_finite() {
            return Err(TransformError::NonFinite { what: "rotation" });
        }
        if norm == 0.0 {
            return Err(TransformError::DegenerateRotation);
        }
        let matrix =
            Mat4::from_translation(translation) * rotation.to_matrix() * Mat4::from_scale(scale);
        let inverse = Mat4::from_scale(scale.recip())
            * rotation.inverse().to_matrix()
            * Mat4::from_translation(-translation);
        Ok(Self {
            kind: TransformKind::Sqt {
                scale,
                rotation,
                translation,
            },
            matrix,
            inverse,
        })
    }

    /// Free-flight transform from a matrix and its known inverse.
    pub fn free_flight(matrix: Mat4, inverse: Mat4) -> Self {
        Self {
            kind: TransformKind::FreeFlight,
            matrix,
            inverse,
        }
    }

    /// Free-flight transform from a matrix alone; the inverse is computed.
    pub fn from_matrix(matrix: Mat4) -> Self {
        Self::free_flight(matrix, matrix.inverse())
    }

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    #[inline]
    pub fn inverse(&self) -> Mat4 {
        self.inverse
    }

    #[inline]
    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    /// Euler angles of a rotation transform.
    pub fn angles(&self) -> Option<Vec3> {
        match self.kind {
            TransformKind::Rotation { angles, .. } => Some(angles),
            _ => None,
        }
    }

    /// Translation column of the matrix.
    pub fn translation_part(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }

    /// Largest stretch the local 3x3 block applies to any axis.
    pub fn scale_factor(&self) -> f32 {
        self.matrix
            .x_axis
            .truncate()
            .length()
            .max(self.matrix.y_axis.truncate().length())
            .max(self.matrix.z_axis.truncate().length())
    }

    /// Same rotation axes with new angles. Non-rotations become a rotation
    /// about all axes.
    pub fn with_angles(&self, angles: Vec3) -> Self {
        let axes = match self.kind {
            TransformKind::Rotation { axes, .. } => axes,
            _ => Axes::ALL,
        };
        Self::rotation(axes, angles)
    }

    /// Same angles about a different set of axes.
    pub fn with_axes(&self, axes: Axes) -> Self {
        Self::rotation(axes, self.angles().unwrap_or(Vec3::ZERO))
    }

    /// Same scale and translation with a new rotation quaternion.
    pub fn with_rotation(&self, rotation: Quaternion) -> Result<Self, TransformError> {
        match self.kind {
            TransformKind::Sqt {
                scale, translation, ..
            } => Self::sqt(scale, rotation, translation),
            _ => Self::sqt(Vec3::ONE, rotation, self.translation_part()),
        }
    }

    /// Move along the transform's own axes: `M · T(offset)`.
    pub fn translated(&self, offset: Vec3) -> Self {
        self.then(&Self::translation(offset))
    }

    /// Turn about the transform's own axes: `M · R(angles)`.
    pub fn rotated(&self, axes: Axes, angles: Vec3) -> Self {
        self.then(&Self::rotation(axes, angles))
    }

    /// Compose `self · other` as a free-flight transform.
    pub fn then(&self, other: &Self) -> Self {
        Self::free_flight(self.matrix * other.matrix, other.inverse * self.inverse)
    }
}
