//! Rays and ray-primitive intersection.
//!
//! - [`Ray`]: origin plus normalized direction, generated per pixel from a
//!   [`RayCamera`]
//! - [`Intersection`]: distance, world point and world normal of a hit
//!
//! Primitive tests work in whatever space the ray is expressed in. The
//! raytracer and the hit tester move rays into a primitive's local space
//! with the accumulated inverse transform before calling them.
//!
//! # Example
//!
//! ```
//! use twinpass::ray::Ray;
//! use glam::Vec3;
//!
//! let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
//! let hit = ray.intersect_sphere(Vec3::ZERO, 1.0).unwrap();
//! assert_eq!(hit.t, 4.0);
//! assert_eq!(hit.normal, Vec3::Z);
//! ```

use glam::{Mat4, Vec3};

use crate::camera::{RasterCamera, RayCamera};

/// Triangles whose determinant falls below this are treated as misses.
///
/// This also rejects every back-facing triangle, since those produce a
/// negative determinant.
pub const TRIANGLE_DETERMINANT_EPSILON: f32 = 0.001;

/// A ray in 3D space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// The starting point of the ray.
    pub origin: Vec3,
    /// The normalized direction of the ray.
    pub direction: Vec3,
}

/// Where a ray met a surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    /// Distance along the ray.
    pub t: f32,
    pub point: Vec3,
    /// Unit surface normal at `point`.
    pub normal: Vec3,
}

impl Intersection {
    /// True when `self` lies strictly nearer along the ray than `other`.
    ///
    /// Equal distances are not closer, so the first hit found wins ties.
    #[inline]
    pub fn closer_than(&self, other: &Intersection) -> bool {
        self.t < other.t
    }
}

impl Ray {
    /// Create a new ray. The direction is normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Primary ray through pixel `(x, y)` of `camera`'s image.
    ///
    /// Pixel centres are measured from the middle of the image with `y`
    /// pointing up; the image plane sits at `-focal_length` on the camera's
    /// `z` axis and `to_world` rotates the result into world space.
    pub fn from_camera(x: f32, y: f32, camera: &RayCamera) -> Self {
        let new_x = x - (camera.width as f32 - 1.0) / 2.0;
        let new_y = (camera.height as f32 - 1.0) / 2.0 - y;
        let new_z = -camera.focal_length();
        let direction = camera
            .to_world
            .transform_vector3(Vec3::new(new_x, new_y, new_z));
        Self::new(camera.origin, direction)
    }

    /// Ray through pixel `(x, y)` of a `width` x `height` image drawn by the
    /// rasterizer with `camera`.
    ///
    /// Follows the same pixel-centre convention as [`Ray::from_camera`] but
    /// spans the raster frustum: vertical field of view `fovy`, widened
    /// horizontally by `aspect`.
    pub fn from_raster_camera(
        x: f32,
        y: f32,
        width: u32,
        height: u32,
        camera: &RasterCamera,
    ) -> Self {
        let half_height = (camera.fovy.to_radians() / 2.0).tan();
        let half_width = half_height * camera.aspect;
        let ndc_x = (x - (width as f32 - 1.0) / 2.0) / (width as f32 / 2.0);
        let ndc_y = ((height as f32 - 1.0) / 2.0 - y) / (height as f32 / 2.0);
        let direction = camera.view_matrix().inverse().transform_vector3(Vec3::new(
            ndc_x * half_width,
            ndc_y * half_height,
            -1.0,
        ));
        Self::new(camera.eye, direction)
    }

    /// Get a point along the ray at the given distance from the origin.
    #[inline]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// This ray expressed in the space `matrix` maps into.
    ///
    /// The direction is renormalized, so distances along the result are not
    /// distances along `self` when `matrix` scales.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self::new(
            matrix.transform_point3(self.origin),
            matrix.transform_vector3(self.direction),
        )
    }

    /// Distance along the ray to `point`, from the x component.
    ///
    /// When the ray is nearly parallel to the x = const planes the dominant
    /// direction component is used instead.
    pub fn distance_to(&self, point: Vec3) -> f32 {
        let offset = point - self.origin;
        if self.direction.x.abs() > 1e-4 {
            return offset.x / self.direction.x;
        }
        let d = self.direction;
        if d.y.abs() >= d.z.abs() {
            offset.y / d.y
        } else {
            offset.z / d.z
        }
    }

    /// Test intersection with a sphere.
    ///
    /// With `O` the origin relative to the centre and `D` the direction,
    /// `c = (O·D)² − O·O + r²` decides the outcome: no hit when negative,
    /// a tangent hit at `−O·D` when zero, otherwise the nearer root
    /// `−O·D − √c`. The nearer root is returned even when it lies behind
    /// the origin; callers reject non-positive distances.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<Intersection> {
        let (near, _) = self.sphere_roots(center, radius)?;
        let point = self.point_at(near);
        Some(Intersection {
            t: near,
            point,
            normal: (point - center).normalize_or_zero(),
        })
    }

    /// Both sphere roots, nearer first. Equal when the ray is tangent.
    pub fn sphere_roots(&self, center: Vec3, radius: f32) -> Option<(f32, f32)> {
        let o = self.origin - center;
        let od = o.dot(self.direction);
        let c = od * od - o.dot(o) + radius * radius;
        if c < 0.0 {
            return None;
        }
        if c == 0.0 {
            return Some((-od, -od));
        }
        let root = c.sqrt();
        Some((-od - root, -od + root))
    }

    /// Test intersection with an axis-aligned box.
    ///
    /// Returns the entry point when the origin is outside the box and the
    /// exit point when it is inside. The normal is the face normal of the
    /// slab that produced the hit.
    pub fn intersect_aabb(&self, min: Vec3, max: Vec3) -> Option<Intersection> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        let mut enter = Vec3::ZERO;
        let mut exit = Vec3::ZERO;

        for i in 0..3 {
            let origin = self.origin[i];
            let dir = self.direction[i];

            if dir.abs() < f32::EPSILON {
                if origin < min[i] || origin > max[i] {
                    return None;
                }
                continue;
            }

            let inv_dir = 1.0 / dir;
            let mut t1 = (min[i] - origin) * inv_dir;
            let mut t2 = (max[i] - origin) * inv_dir;
            // Face the ray enters through on this axis.
            let mut axis_normal = Vec3::ZERO;
            axis_normal[i] = -dir.signum();

            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            if t1 > t_min {
                t_min = t1;
                enter = axis_normal;
            }
            if t2 < t_max {
                t_max = t2;
                exit = -axis_normal;
            }
            if t_min > t_max {
                return None;
            }
        }

        let (t, normal) = if t_min > 0.0 {
            (t_min, enter)
        } else if t_max > 0.0 {
            (t_max, exit)
        } else {
            return None;
        };
        Some(Intersection {
            t,
            point: self.point_at(t),
            normal,
        })
    }

    /// Möller–Trumbore ray/triangle test.
    ///
    /// Triangles are front-facing when wound counter-clockwise as seen by
    /// the ray. Any determinant below [`TRIANGLE_DETERMINANT_EPSILON`] is a
    /// miss, which covers both parallel rays and back faces.
    pub fn intersect_triangle(&self, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<Intersection> {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let h = self.direction.cross(edge2);
        let det = edge1.dot(h);

        if det < TRIANGLE_DETERMINANT_EPSILON {
            return None;
        }

        let f = 1.0 / det;
        let s = self.origin - v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * self.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if t <= f32::EPSILON {
            return None;
        }
        Some(Intersection {
            t,
            point: self.point_at(t),
            normal: edge1.cross(edge2).normalize_or_zero(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sphere_roots_straddle_the_center() {
        let center = Vec3::new(0.5, -1.0, -6.0);
        let ray = Ray::new(Vec3::ZERO, center);
        let (near, far) = ray.sphere_roots(center, 1.0).unwrap();
        assert!(near < far);
        let midpoint = ray.point_at((near + far) / 2.0);
        assert!(midpoint.abs_diff_eq(center, 1e-4));
        assert_relative_eq!(far - near, 2.0, epsilon = 1e-4);
    }

    #[test]
    fn sphere_miss_has_no_hit() {
        let ray = Ray::new(Vec3::new(0.0, 2.0, 5.0), Vec3::NEG_Z);
        assert!(ray.intersect_sphere(Vec3::ZERO, 1.0).is_none());
    }

    #[test]
    fn tangent_ray_touches_once() {
        let ray = Ray::new(Vec3::new(0.0, 1.0, 5.0), Vec3::NEG_Z);
        let (near, far) = ray.sphere_roots(Vec3::ZERO, 1.0).unwrap();
        assert_eq!(near, far);
        assert_eq!(near, 5.0);
    }

    #[test]
    fn sphere_hit_reports_outward_normal() {
        let ray = Ray::new(Vec3::new(3.0, 0.0, 0.0), Vec3::NEG_X);
        let hit = ray.intersect_sphere(Vec3::ZERO, 1.0).unwrap();
        assert_relative_eq!(hit.t, 2.0);
        assert!(hit.normal.abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn center_pixel_ray_follows_the_view_axis() {
        let camera = RayCamera::default().with_size(101, 101);
        let ray = Ray::from_camera(50.0, 50.0, &camera);
        assert!(ray.direction.abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert_eq!(ray.origin, camera.origin);

        // Top-left pixel points up and to the left.
        let corner = Ray::from_camera(0.0, 0.0, &camera);
        assert!(corner.direction.x < 0.0 && corner.direction.y > 0.0);
    }

    #[test]
    fn aabb_entry_and_exit() {
        let outside = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let hit = outside.intersect_aabb(Vec3::splat(-0.5), Vec3::splat(0.5)).unwrap();
        assert_relative_eq!(hit.t, 4.5);
        assert_eq!(hit.normal, Vec3::Z);

        let inside = Ray::new(Vec3::ZERO, Vec3::X);
        let hit = inside.intersect_aabb(Vec3::splat(-0.5), Vec3::splat(0.5)).unwrap();
        assert_relative_eq!(hit.t, 0.5);
        assert_eq!(hit.normal, Vec3::X);

        let behind = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert!(behind.intersect_aabb(Vec3::splat(-0.5), Vec3::splat(0.5)).is_none());
    }

    #[test]
    fn triangle_front_face_hit() {
        let ray = Ray::new(Vec3::new(0.2, 0.2, 3.0), Vec3::NEG_Z);
        let hit = ray
            .intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Y)
            .unwrap();
        assert_relative_eq!(hit.t, 3.0, epsilon = 1e-6);
        assert!(hit.point.abs_diff_eq(Vec3::new(0.2, 0.2, 0.0), 1e-6));
        assert_eq!(hit.normal, Vec3::Z);
    }

    #[test]
    fn triangle_back_face_is_culled() {
        // The determinant test rejects triangles seen from behind as well as
        // parallel rays.
        let ray = Ray::new(Vec3::new(0.2, 0.2, -3.0), Vec3::Z);
        assert!(ray.intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Y).is_none());

        let parallel = Ray::new(Vec3::new(-1.0, 0.2, 0.0), Vec3::X);
        assert!(parallel.intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Y).is_none());
    }

    #[test]
    fn triangle_outside_barycentric_range_misses() {
        let ray = Ray::new(Vec3::new(0.8, 0.8, 3.0), Vec3::NEG_Z);
        assert!(ray.intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Y).is_none());
    }

    #[test]
    fn distance_falls_back_when_direction_has_no_x() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert_relative_eq!(ray.distance_to(Vec3::new(0.0, 0.0, 1.0)), 4.0);

        let slanted = Ray::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));
        let p = slanted.point_at(2.0);
        assert_relative_eq!(slanted.distance_to(p), 2.0, epsilon = 1e-5);
    }

    #[test]
    fn raster_ray_matches_ray_camera_on_square_images() {
        let ray_camera = RayCamera::default().with_size(101, 101);
        let raster_camera = RasterCamera::default();
        for (x, y) in [(0.0, 0.0), (50.0, 50.0), (80.0, 13.0)] {
            let a = Ray::from_camera(x, y, &ray_camera);
            let b = Ray::from_raster_camera(x, y, 101, 101, &raster_camera);
            assert_eq!(a.origin, b.origin);
            assert!(a.direction.abs_diff_eq(b.direction, 1e-5));
        }
    }

    #[test]
    fn raster_ray_widens_with_aspect() {
        let camera = RasterCamera {
            aspect: 2.0,
            ..RasterCamera::default()
        };
        // Right edge of a 200 x 100 image, on the middle row.
        let ray = Ray::from_raster_camera(199.0, 49.5, 200, 100, &camera);
        let slope = ray.direction.x / -ray.direction.z;
        let expected = 30f32.to_radians().tan() * 2.0 * (99.5 / 100.0);
        assert_relative_eq!(slope, expected, epsilon = 1e-5);
        assert_relative_eq!(ray.direction.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn raster_ray_follows_look_at() {
        let camera = RasterCamera {
            eye: Vec3::new(5.0, 0.0, 0.0),
            center: Vec3::ZERO,
            ..RasterCamera::default()
        };
        let ray = Ray::from_raster_camera(49.5, 49.5, 100, 100, &camera);
        assert_eq!(ray.origin, camera.eye);
        assert!(ray.direction.abs_diff_eq(Vec3::NEG_X, 1e-5));
    }
}
