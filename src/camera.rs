//! Camera descriptors for the two backends.
//!
//! Both are plain values. The light/camera collection pass fills them from a
//! camera node's accumulated transform; without a camera node the defaults
//! below put the eye at `(0, 0, 1)` looking down `-z`.

use glam::{Mat4, Vec3};

use crate::math::MatrixExt;

/// Pinhole camera used by the raytracer and by hit testing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayCamera {
    /// World-space eye position.
    pub origin: Vec3,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Horizontal field of view in radians.
    pub alpha: f32,
    /// Rotates camera-space directions into world space.
    pub to_world: Mat4,
}

impl Default for RayCamera {
    fn default() -> Self {
        Self {
            origin: Vec3::new(0.0, 0.0, 1.0),
            width: 600,
            height: 600,
            alpha: std::f32::consts::FRAC_PI_3,
            to_world: Mat4::IDENTITY,
        }
    }
}

impl RayCamera {
    /// Same camera rendering into a different image size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Distance from the eye to the image plane, in pixel units.
    pub fn focal_length(&self) -> f32 {
        (self.width as f32 / 2.0) / (self.alpha / 2.0).tan()
    }
}

/// Look-at camera with a perspective frustum, used by the rasterizer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterCamera {
    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for RasterCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 1.0),
            center: Vec3::ZERO,
            up: Vec3::Y,
            fovy: 60.0,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl RasterCamera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.eye, self.center, self.up)
    }

    /// OpenGL-convention projection (clip depth in `[-1, 1]`).
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fovy, self.aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_raster_camera_looks_down_negative_z() {
        let camera = RasterCamera::default();
        let view = camera.view_matrix();
        let ahead = view.transform_point3(Vec3::new(0.0, 0.0, -4.0));
        assert!(ahead.abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-6));
    }

    #[test]
    fn focal_length_follows_field_of_view() {
        let camera = RayCamera::default().with_size(200, 100);
        // tan(30°) = 1/√3
        assert!((camera.focal_length() - 100.0 * 3f32.sqrt()).abs() < 1e-3);
    }
}
