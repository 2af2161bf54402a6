//! Whitted-style raytracing backend.
//!
//! One primary ray per pixel, no secondary bounces. For every pixel the
//! scene graph is walked with a fresh transform stack; each primitive
//! intersects the ray in its own local space against a canonical shape:
//!
//! | Node | Canonical shape |
//! |------|-----------------|
//! | sphere | unit sphere at the origin |
//! | axis-aligned box, texture box | box spanning `[-0.5, 0.5]³` |
//! | pyramid | its triangle list, apex at the origin, base at `y = -1` |
//!
//! OBJ meshes are left to the rasterizer.
//!
//! The closest hit is shaded with [`phong::shade`] and written as opaque
//! 8-bit RGBA; misses get the background colour. Rows are traced in
//! parallel with rayon since each pixel only reads the graph.
//!
//! # Example
//!
//! ```
//! use twinpass::raytracer::Raytracer;
//! use twinpass::scene::{Node, SceneGraph, SphereNode};
//! use twinpass::transform::Transformation;
//! use glam::{Vec3, Vec4};
//!
//! let mut graph = SceneGraph::new(Transformation::translation(Vec3::new(0.0, 0.0, -5.0)));
//! graph.add_child(graph.root(), Node::Sphere(SphereNode::new(Vec4::new(1.0, 0.0, 0.0, 1.0))))?;
//! graph.add_child(graph.root(), Node::Light)?;
//!
//! let image = Raytracer::default().render(&graph, 64, 64);
//! assert_eq!(image.dimensions(), (64, 64));
//! # Ok::<(), twinpass::scene::SceneError>(())
//! ```

use std::time::Instant;

use glam::{Vec3, Vec4};
use image::RgbaImage;
use log::debug;
use rayon::prelude::*;

use crate::camera::RayCamera;
use crate::collect::SceneCollector;
use crate::config::RenderConfig;
use crate::geometry::Geometry;
use crate::phong::{self, PhongParams};
use crate::ray::{Intersection, Ray};
use crate::scene::{Color, Node, NodeId, ObjNode, SceneGraph};
use crate::traversal::{Frame, Visitor};

/// Hits closer than this are treated as self-intersections and ignored.
pub const MIN_HIT_DISTANCE: f32 = 1e-4;

const UNIT_BOX_MIN: Vec3 = Vec3::splat(-0.5);
const UNIT_BOX_MAX: Vec3 = Vec3::splat(0.5);

/// The closest surface a ray met.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub node: NodeId,
    pub intersection: Intersection,
    pub color: Color,
}

/// Renders scene graphs to images.
#[derive(Clone, Debug)]
pub struct Raytracer {
    background: Vec4,
    alpha: f32,
    phong: PhongParams,
    pyramid: Vec<[Vec3; 3]>,
}

impl Default for Raytracer {
    fn default() -> Self {
        Self::new(&RenderConfig::default())
    }
}

impl Raytracer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            background: config.background,
            alpha: config.ray_fov,
            phong: config.phong,
            pyramid: Geometry::pyramid_triangles(),
        }
    }

    /// Collect lights and camera from `graph`, then trace a full image.
    pub fn render(&self, graph: &SceneGraph, width: u32, height: u32) -> RgbaImage {
        let mut collector = SceneCollector::new(width, height, self.alpha);
        collector.collect(graph);
        let camera = collector.ray_camera().with_size(width, height);
        let params = collector
            .coefficients()
            .map(PhongParams::from)
            .unwrap_or(self.phong);
        self.render_with(graph, &camera, collector.lights(), &params)
    }

    /// Trace a full image with an explicit camera and light list.
    pub fn render_with(
        &self,
        graph: &SceneGraph,
        camera: &RayCamera,
        lights: &[Vec3],
        params: &PhongParams,
    ) -> RgbaImage {
        let start = Instant::now();
        let (width, height) = (camera.width, camera.height);
        let mut image = RgbaImage::new(width, height);
        let row_bytes = width as usize * 4;
        if row_bytes == 0 {
            return image;
        }

        image
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
                    let color = self.shade_pixel(graph, camera, lights, params, x as u32, y as u32);
                    pixel.copy_from_slice(&phong::to_rgba8(color));
                }
            });

        debug!(
            "raytraced {width}x{height} with {} lights in {:.1?}",
            lights.len(),
            start.elapsed()
        );
        image
    }

    /// Colour of one pixel before 8-bit conversion.
    pub fn shade_pixel(
        &self,
        graph: &SceneGraph,
        camera: &RayCamera,
        lights: &[Vec3],
        params: &PhongParams,
        x: u32,
        y: u32,
    ) -> Vec4 {
        let ray = Ray::from_camera(x as f32, y as f32, camera);
        match self.trace(graph, &ray) {
            Some(hit) => phong::shade(
                hit.color,
                hit.intersection.point,
                hit.intersection.normal,
                lights,
                camera.origin,
                params,
            ),
            None => self.background,
        }
    }

    /// Closest primitive hit along a world-space ray.
    pub fn trace(&self, graph: &SceneGraph, ray: &Ray) -> Option<Hit> {
        let mut pass = TracePass {
            ray,
            pyramid: &self.pyramid,
            closest: None,
        };
        graph.walk(&mut pass);
        pass.closest
    }
}

/// Per-ray visitor tracking the closest hit.
struct TracePass<'a> {
    ray: &'a Ray,
    pyramid: &'a [[Vec3; 3]],
    closest: Option<Hit>,
}

impl TracePass<'_> {
    fn intersect_local(&self, node: &Node, local: &Ray) -> Option<(Intersection, Color)> {
        match node {
            Node::Sphere(sphere) => local
                .intersect_sphere(Vec3::ZERO, 1.0)
                .map(|hit| (hit, sphere.color)),
            Node::AaBox(aabox) => local
                .intersect_aabb(UNIT_BOX_MIN, UNIT_BOX_MAX)
                .map(|hit| (hit, aabox.face_color(box_face(hit.normal)))),
            Node::TextureBox(_) => local
                .intersect_aabb(UNIT_BOX_MIN, UNIT_BOX_MAX)
                .map(|hit| (hit, ObjNode::COLOR)),
            Node::Pyramid(pyramid) => self
                .pyramid
                .iter()
                .enumerate()
                .filter_map(|(i, [a, b, c])| {
                    local.intersect_triangle(*a, *b, *c).map(|hit| (i, hit))
                })
                .min_by(|(_, a), (_, b)| a.t.total_cmp(&b.t))
                .map(|(i, hit)| (hit, pyramid.face_color(Geometry::pyramid_face_of(i)))),
            Node::Obj(_) | Node::Group(_) | Node::Light | Node::Camera(_) => None,
        }
    }
}

impl Visitor for TracePass<'_> {
    fn visit(&mut self, id: NodeId, node: &Node, frame: &Frame) {
        if !node.is_primitive() {
            return;
        }
        let local_ray = self.ray.transformed(&frame.inverse);
        let Some((local, color)) = self.intersect_local(node, &local_ray) else {
            return;
        };

        let point = frame.matrix.transform_point3(local.point);
        let normal = frame
            .inverse
            .transpose()
            .transform_vector3(local.normal)
            .normalize_or_zero();
        // Local distances are not world distances once scaling is involved.
        let t = self.ray.distance_to(point);
        if !(t > MIN_HIT_DISTANCE) {
            return;
        }

        let candidate = Intersection { t, point, normal };
        let closer = self
            .closest
            .as_ref()
            .is_none_or(|best| candidate.closer_than(&best.intersection));
        if closer {
            self.closest = Some(Hit {
                node: id,
                intersection: candidate,
                color,
            });
        }
    }
}

/// Face index of the unit box for an axis-aligned normal, matching the
/// face order of [`Geometry::aabox`].
fn box_face(normal: Vec3) -> usize {
    let abs = normal.abs();
    if abs.z >= abs.x && abs.z >= abs.y {
        if normal.z > 0.0 { 0 } else { 1 }
    } else if abs.x >= abs.y {
        if normal.x > 0.0 { 2 } else { 3 }
    } else if normal.y > 0.0 {
        4
    } else {
        5
    }
}
