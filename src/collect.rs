//! Per-frame light and camera collection.
//!
//! Both backends need the world-space light positions and the camera before
//! they can shade anything, so each frame starts with one walk that gathers
//! them:
//!
//! - a light node contributes its accumulated transform applied to the
//!   local point `(1, 1, 1)`
//! - a camera node contributes its Phong coefficients plus a [`RayCamera`]
//!   and a [`RasterCamera`] derived from its accumulated transform
//!
//! # Example
//!
//! ```
//! use twinpass::collect::SceneCollector;
//! use twinpass::scene::{Node, SceneGraph};
//! use twinpass::transform::Transformation;
//! use glam::Vec3;
//!
//! let mut graph = SceneGraph::default();
//! let lamp = graph.add_group(graph.root(), Transformation::translation(Vec3::new(0.0, 0.0, 5.0)))?;
//! graph.add_child(lamp, Node::Light)?;
//!
//! let mut collector = SceneCollector::new(640, 480, std::f32::consts::FRAC_PI_3);
//! collector.collect(&graph);
//! assert_eq!(collector.lights(), &[Vec3::new(1.0, 1.0, 6.0)]);
//! # Ok::<(), twinpass::scene::SceneError>(())
//! ```

use glam::{Vec3, Vec4};
use log::{debug, warn};

use crate::camera::{RasterCamera, RayCamera};
use crate::scene::{CameraNode, Node, NodeId, SceneGraph};
use crate::traversal::{Frame, Visitor};

/// Local point a light node sits at.
const LIGHT_POINT: Vec3 = Vec3::ONE;

/// Gathers lights and the active camera from a scene graph.
#[derive(Clone, Debug)]
pub struct SceneCollector {
    width: u32,
    height: u32,
    alpha: f32,
    lights: Vec<Vec3>,
    camera: Option<CollectedCamera>,
}

/// Everything derived from one camera node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollectedCamera {
    pub node: NodeId,
    pub coefficients: CameraNode,
    pub ray: RayCamera,
    pub raster: RasterCamera,
}

impl SceneCollector {
    /// A collector producing cameras for a `width` x `height` image with a
    /// horizontal raytracing field of view of `alpha` radians.
    pub fn new(width: u32, height: u32, alpha: f32) -> Self {
        Self {
            width,
            height,
            alpha,
            lights: Vec::new(),
            camera: None,
        }
    }

    /// Change the output size used for cameras collected from now on.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Forget everything gathered by the previous walk.
    pub fn clear(&mut self) {
        self.lights.clear();
        self.camera = None;
    }

    /// Clear, then walk `graph` once.
    pub fn collect(&mut self, graph: &SceneGraph) {
        self.clear();
        graph.walk(self);
        debug!(
            "collected {} lights, camera: {}",
            self.lights.len(),
            self.camera.is_some()
        );
    }

    /// World-space light positions in traversal order.
    pub fn lights(&self) -> &[Vec3] {
        &self.lights
    }

    pub fn camera(&self) -> Option<&CollectedCamera> {
        self.camera.as_ref()
    }

    /// The collected raytracing camera, or the default viewpoint sized to
    /// this collector's output.
    pub fn ray_camera(&self) -> RayCamera {
        self.camera.map(|c| c.ray).unwrap_or_else(|| RayCamera {
            width: self.width,
            height: self.height,
            alpha: self.alpha,
            ..RayCamera::default()
        })
    }

    /// The collected rasterizer camera, or the default viewpoint.
    pub fn raster_camera(&self) -> RasterCamera {
        self.camera.map(|c| c.raster).unwrap_or_else(|| RasterCamera {
            aspect: self.aspect(),
            ..RasterCamera::default()
        })
    }

    /// Phong coefficients of the camera node, if one was found.
    pub fn coefficients(&self) -> Option<CameraNode> {
        self.camera.map(|c| c.coefficients)
    }

    fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    fn record_camera(&mut self, id: NodeId, coefficients: CameraNode, frame: &Frame) {
        if let Some(previous) = &self.camera {
            warn!("{id} replaces camera {} found earlier in the scene", previous.node);
        }
        let m = frame.matrix;
        let eye = (m * Vec4::new(0.0, 0.0, 1.0, 1.0)).truncate();
        let ray = RayCamera {
            origin: eye,
            width: self.width,
            height: self.height,
            alpha: self.alpha,
            to_world: m,
        };
        let raster = RasterCamera {
            eye,
            center: (m * Vec4::new(0.0, 0.0, 0.0, 1.0)).truncate(),
            up: (m * Vec4::new(0.0, 1.0, 0.0, 0.0)).truncate(),
            aspect: self.aspect(),
            ..RasterCamera::default()
        };
        self.camera = Some(CollectedCamera {
            node: id,
            coefficients,
            ray,
            raster,
        });
    }
}

impl Visitor for SceneCollector {
    fn visit(&mut self, id: NodeId, node: &Node, frame: &Frame) {
        match node {
            Node::Light => self.lights.push(frame.matrix.transform_point3(LIGHT_POINT)),
            Node::Camera(camera) => self.record_camera(id, *camera, frame),
            Node::Group(_)
            | Node::Sphere(_)
            | Node::Pyramid(_)
            | Node::AaBox(_)
            | Node::TextureBox(_)
            | Node::Obj(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Axes;
    use crate::transform::Transformation;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_3};

    #[test]
    fn lights_keep_traversal_order() {
        let mut graph = SceneGraph::default();
        let root = graph.root();
        let a = graph.add_group(root, Transformation::translation(Vec3::X)).unwrap();
        graph.add_child(a, Node::Light).unwrap();
        graph.add_child(root, Node::Light).unwrap();

        let mut collector = SceneCollector::new(100, 100, FRAC_PI_3);
        collector.collect(&graph);
        assert_eq!(collector.lights(), &[Vec3::new(2.0, 1.0, 1.0), Vec3::ONE]);
        assert!(collector.camera().is_none());
    }

    #[test]
    fn collect_does_not_carry_state_over() {
        let mut graph = SceneGraph::default();
        let light = graph.add_child(graph.root(), Node::Light).unwrap();
        let mut collector = SceneCollector::new(100, 100, FRAC_PI_3);
        collector.collect(&graph);
        collector.collect(&graph);
        assert_eq!(collector.lights().len(), 1);

        graph.remove_subtree(light).unwrap();
        collector.collect(&graph);
        assert!(collector.lights().is_empty());
    }

    #[test]
    fn camera_node_derives_both_cameras() {
        let mut graph = SceneGraph::default();
        let rig = graph
            .add_group(graph.root(), Transformation::translation(Vec3::new(0.0, 2.0, 4.0)))
            .unwrap();
        let turn = graph
            .add_group(rig, Transformation::rotation(Axes::Y, Vec3::new(0.0, FRAC_PI_2, 0.0)))
            .unwrap();
        let coefficients = CameraNode {
            shininess: 8.0,
            ..CameraNode::default()
        };
        let camera = graph.add_child(turn, Node::Camera(coefficients)).unwrap();

        let mut collector = SceneCollector::new(200, 100, FRAC_PI_3);
        collector.collect(&graph);
        let collected = collector.camera().copied().unwrap();
        assert_eq!(collected.node, camera);
        assert_eq!(collected.coefficients.shininess, 8.0);

        // Eye sits one unit along the rotated z axis, which is world +x.
        let eye = Vec3::new(1.0, 2.0, 4.0);
        assert!(collected.ray.origin.abs_diff_eq(eye, 1e-5));
        assert!(collected.raster.eye.abs_diff_eq(eye, 1e-5));
        assert!(collected.raster.center.abs_diff_eq(Vec3::new(0.0, 2.0, 4.0), 1e-5));
        assert!(collected.raster.up.abs_diff_eq(Vec3::Y, 1e-5));
        assert_eq!(collected.raster.fovy, 60.0);
        assert_eq!(collected.raster.aspect, 2.0);
        assert_eq!((collected.ray.width, collected.ray.height), (200, 100));
    }

    #[test]
    fn last_camera_in_traversal_order_wins() {
        let mut graph = SceneGraph::default();
        graph
            .add_child(graph.root(), Node::Camera(CameraNode::default()))
            .unwrap();
        let later = graph
            .add_child(graph.root(), Node::Camera(CameraNode::default()))
            .unwrap();

        let mut collector = SceneCollector::new(100, 100, FRAC_PI_3);
        collector.collect(&graph);
        assert_eq!(collector.camera().map(|c| c.node), Some(later));
    }

    #[test]
    fn defaults_without_camera_node() {
        let collector = SceneCollector::new(300, 150, 1.0);
        let ray = collector.ray_camera();
        assert_eq!(ray.origin, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!((ray.width, ray.height, ray.alpha), (300, 150, 1.0));
        assert_eq!(collector.raster_camera().aspect, 2.0);
    }
}
