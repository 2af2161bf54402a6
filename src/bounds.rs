//! Bounding spheres for the hit-test pre-filter.

use glam::{Mat4, Vec3};

use crate::ray::{Intersection, Ray};

/// A sphere enclosing every vertex of a primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Ritter's approximate minimal sphere.
    ///
    /// Seeds the sphere from the most separated pair among the per-axis
    /// extreme points, then sweeps the points once and grows the sphere to
    /// swallow every point that falls outside it. The result encloses all
    /// points but is not minimal.
    ///
    /// An empty slice yields a zero sphere at the origin.
    pub fn from_points(points: &[Vec3]) -> Self {
        let Some(&first) = points.first() else {
            return Self::new(Vec3::ZERO, 0.0);
        };

        let mut min = [first; 3];
        let mut max = [first; 3];
        for &p in points {
            for axis in 0..3 {
                if p[axis] < min[axis][axis] {
                    min[axis] = p;
                }
                if p[axis] > max[axis][axis] {
                    max[axis] = p;
                }
            }
        }

        let (a, b) = (0..3)
            .map(|axis| (min[axis], max[axis]))
            .max_by(|(a0, b0), (a1, b1)| {
                a0.distance_squared(*b0)
                    .total_cmp(&a1.distance_squared(*b1))
            })
            .unwrap_or((first, first));

        let mut center = (a + b) * 0.5;
        let mut radius = a.distance(b) * 0.5;

        for &p in points {
            let distance = p.distance(center);
            if distance > radius {
                let grown = (radius + distance) * 0.5;
                center += (p - center) * ((grown - radius) / distance);
                radius = grown;
            }
        }

        Self::new(center, radius)
    }

    /// World-space sphere under `matrix`, with the radius stretched by the
    /// largest scale factor along the path.
    pub fn transformed(&self, matrix: &Mat4, scale: f32) -> Self {
        Self::new(matrix.transform_point3(self.center), self.radius * scale)
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.distance(self.center) <= self.radius * (1.0 + 1e-5)
    }

    /// Ray test using the same root selection as sphere primitives.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        ray.intersect_sphere(self.center, self.radius)
    }
}
