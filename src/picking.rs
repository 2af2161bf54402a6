//! Mouse picking against rasterized primitives.
//!
//! A click becomes a primary ray through the clicked pixel, built the same
//! way the raytracer builds its rays. Every primitive that has a
//! [`Renderable`] is then tested in two phases:
//!
//! 1. the ray against the primitive's bounding sphere moved into world space
//! 2. if that passes, the ray against each world-space triangle
//!
//! The nearest triangle hit is marked [`Selection::Selected`]. Every other
//! tested primitive becomes [`Selection::Deselected`], including all of them
//! when the click hits nothing. Primitives without a renderable keep their
//! selection state.
//!
//! # Example
//!
//! ```ignore
//! let mut picker = HitTester::new();
//! if let Some(hit) = picker.pick(&mut graph, &renderables, x, y, &collector.ray_camera()) {
//!     log::info!("picked {} at distance {}", hit.node, hit.t);
//! }
//! ```

use glam::Vec3;
use log::debug;

use crate::camera::RayCamera;
use crate::raster::{Renderable, Renderables};
use crate::ray::{Intersection, Ray};
use crate::scene::{Node, NodeId, SceneGraph, Selection};
use crate::traversal::{Frame, TransformStack, Visitor};

/// Information about a picked primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickHit {
    /// The primitive that was hit.
    pub node: NodeId,
    /// Distance from the eye to the hit point.
    pub t: f32,
    /// World-space position of the hit point.
    pub point: Vec3,
}

/// Result of a pick: the nearest hit, if any.
pub type PickResult = Option<PickHit>;

/// Resolves clicks to primitives and updates their selection state.
#[derive(Clone, Debug, Default)]
pub struct HitTester {
    stack: TransformStack,
}

impl HitTester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the primitive under pixel `(x, y)` of `camera`'s image.
    ///
    /// # Arguments
    ///
    /// * `graph` - Scene whose selection states are updated
    /// * `renderables` - Geometry and bounds from the raster setup pass
    /// * `x`, `y` - Pixel coordinates, origin at the top left
    /// * `camera` - Camera the image was rendered with
    pub fn pick<M>(
        &mut self,
        graph: &mut SceneGraph,
        renderables: &Renderables<M>,
        x: f32,
        y: f32,
        camera: &RayCamera,
    ) -> PickResult {
        let ray = Ray::from_camera(x, y, camera);
        let result = self.pick_ray(graph, renderables, &ray);
        match &result {
            Some(hit) => debug!("pick ({x}, {y}) hit {} at t = {}", hit.node, hit.t),
            None => debug!("pick ({x}, {y}) hit nothing"),
        }
        result
    }

    /// Pick with an arbitrary world-space ray.
    pub fn pick_ray<M>(
        &mut self,
        graph: &mut SceneGraph,
        renderables: &Renderables<M>,
        ray: &Ray,
    ) -> PickResult {
        let mut pass = PickPass {
            ray,
            renderables,
            tested: Vec::new(),
            nearest: None,
        };
        graph.walk_with(&mut self.stack, &mut pass);

        let PickPass { tested, nearest, .. } = pass;
        let picked = nearest.map(|(node, _)| node);
        for id in tested {
            let state = if Some(id) == picked {
                Selection::Selected
            } else {
                Selection::Deselected
            };
            graph.set_selection(id, state);
        }

        nearest.map(|(node, hit)| PickHit {
            node,
            t: hit.t,
            point: hit.point,
        })
    }
}

struct PickPass<'a, M> {
    ray: &'a Ray,
    renderables: &'a Renderables<M>,
    tested: Vec<NodeId>,
    nearest: Option<(NodeId, Intersection)>,
}

impl<M> PickPass<'_, M> {
    /// Bounding sphere pre-filter. Passes when any part of the sphere lies
    /// ahead of the ray origin, including when the origin is inside it.
    fn may_hit(&self, renderable: &Renderable<M>, frame: &Frame) -> bool {
        let bounds = renderable.bounds.transformed(&frame.matrix, frame.scale);
        self.ray
            .sphere_roots(bounds.center, bounds.radius)
            .is_some_and(|(_, far)| far > 0.0)
    }

    fn nearest_triangle(&self, renderable: &Renderable<M>, frame: &Frame) -> Option<Intersection> {
        let mut nearest: Option<Intersection> = None;
        for [a, b, c] in renderable.geometry.triangles() {
            let hit = self.ray.intersect_triangle(
                frame.matrix.transform_point3(a),
                frame.matrix.transform_point3(b),
                frame.matrix.transform_point3(c),
            );
            if let Some(hit) = hit {
                if nearest.is_none_or(|n| hit.closer_than(&n)) {
                    nearest = Some(hit);
                }
            }
        }
        nearest
    }
}

impl<M> Visitor for PickPass<'_, M> {
    fn visit(&mut self, id: NodeId, node: &Node, frame: &Frame) {
        if !node.is_primitive() {
            return;
        }
        let Some(renderable) = self.renderables.get(&id) else {
            return;
        };
        self.tested.push(id);

        if !self.may_hit(renderable, frame) {
            return;
        }
        let Some(hit) = self.nearest_triangle(renderable, frame) else {
            return;
        };
        if self.nearest.is_none_or(|(_, n)| hit.closer_than(&n)) {
            self.nearest = Some((id, hit));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::RasterSetup;
    use crate::raster::pipeline::recording::RecordingPipeline;
    use crate::scene::{AaBoxNode, ObjNode, SphereNode};
    use crate::transform::Transformation;
    use glam::Vec4;

    const CAMERA: RayCamera = RayCamera {
        origin: Vec3::new(0.0, 0.0, 1.0),
        width: 101,
        height: 101,
        alpha: std::f32::consts::FRAC_PI_3,
        to_world: glam::Mat4::IDENTITY,
    };

    fn sphere_at(graph: &mut SceneGraph, center: Vec3) -> NodeId {
        let group = graph
            .add_group(graph.root(), Transformation::translation(center))
            .unwrap();
        graph.add_child(group, Node::Sphere(SphereNode::default())).unwrap()
    }

    fn setup(graph: &SceneGraph) -> Renderables<usize> {
        let mut renderables = Renderables::new();
        RasterSetup::default().run(graph, &mut RecordingPipeline::default(), &mut renderables);
        renderables
    }

    #[test]
    fn click_selects_the_nearest_primitive() {
        let mut graph = SceneGraph::default();
        let near = sphere_at(&mut graph, Vec3::new(0.1, 0.13, -3.0));
        let far = sphere_at(&mut graph, Vec3::new(0.1, 0.13, -8.0));
        let aside = sphere_at(&mut graph, Vec3::new(4.0, 0.0, -3.0));
        let renderables = setup(&graph);

        let hit = HitTester::new()
            .pick(&mut graph, &renderables, 50.0, 50.0, &CAMERA)
            .unwrap();
        assert_eq!(hit.node, near);
        assert!(hit.t > 3.0 && hit.t < 3.1, "t = {}", hit.t);
        assert_eq!(graph.selection(near), Some(Selection::Selected));
        assert_eq!(graph.selection(far), Some(Selection::Deselected));
        assert_eq!(graph.selection(aside), Some(Selection::Deselected));
        assert_eq!(graph.selected(), Some(near));
    }

    #[test]
    fn reported_distance_is_in_world_units() {
        let mut graph = SceneGraph::default();
        let moved = graph
            .add_group(graph.root(), Transformation::translation(Vec3::new(0.3, 0.2, -5.0)))
            .unwrap();
        let scaled = graph
            .add_group(moved, Transformation::scaling(Vec3::splat(2.0)).unwrap())
            .unwrap();
        let cube = graph
            .add_child(scaled, Node::AaBox(AaBoxNode::new(Vec4::ONE)))
            .unwrap();
        let renderables = setup(&graph);

        let hit = HitTester::new()
            .pick(&mut graph, &renderables, 50.0, 50.0, &CAMERA)
            .unwrap();
        assert_eq!(hit.node, cube);
        assert!((hit.t - 5.0).abs() < 1e-4, "t = {}", hit.t);
        assert!(hit.point.abs_diff_eq(Vec3::new(0.0, 0.0, -4.0), 1e-4));
    }

    #[test]
    fn missing_everything_deselects_all_tested() {
        let mut graph = SceneGraph::default();
        let a = sphere_at(&mut graph, Vec3::new(0.1, 0.13, -3.0));
        let renderables = setup(&graph);
        let mut picker = HitTester::new();

        picker.pick(&mut graph, &renderables, 50.0, 50.0, &CAMERA);
        assert_eq!(graph.selection(a), Some(Selection::Selected));

        // Top left corner looks well away from the sphere.
        assert!(picker.pick(&mut graph, &renderables, 0.0, 0.0, &CAMERA).is_none());
        assert_eq!(graph.selection(a), Some(Selection::Deselected));
    }

    #[test]
    fn primitives_behind_the_eye_are_not_hit() {
        let mut graph = SceneGraph::default();
        let behind = sphere_at(&mut graph, Vec3::new(0.1, 0.13, 4.0));
        let renderables = setup(&graph);

        assert!(
            HitTester::new()
                .pick(&mut graph, &renderables, 50.0, 50.0, &CAMERA)
                .is_none()
        );
        assert_eq!(graph.selection(behind), Some(Selection::Deselected));
    }

    #[test]
    fn primitives_without_renderable_keep_their_state() {
        let mut graph = SceneGraph::default();
        let target = sphere_at(&mut graph, Vec3::new(0.1, 0.13, -3.0));
        let broken = graph
            .add_child(graph.root(), Node::Obj(ObjNode::from_source("f 1 2 3")))
            .unwrap();
        let renderables = setup(&graph);
        assert!(!renderables.contains_key(&broken));

        HitTester::new().pick(&mut graph, &renderables, 50.0, 50.0, &CAMERA);
        assert_eq!(graph.selection(target), Some(Selection::Selected));
        assert_eq!(graph.selection(broken), Some(Selection::Unevaluated));
    }
}
