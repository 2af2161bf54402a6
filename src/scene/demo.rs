//! The scene the viewer opens with.
//!
//! ```text
//! root  T(0, 0, -5)
//! ├── spin  R_x(0)
//! │   ├── T(1.2, 0.5, 0)
//! │   │   └── sphere, striped
//! │   └── T(-0.8, 0.6, 0)
//! │       ├── S(1, 1, 1)        <- arrow keys
//! │       │   └── pyramid
//! │       └── T(1, 0, 3)
//! │           └── box
//! └── T(0, 0, 5)
//!     └── lamp  R_y(0)          <- jumper, magnitude 2
//!         └── light
//! ```

use glam::{Vec3, Vec4};

use crate::animation::{Animator, DriverAnimator, JumperAnimator};
use crate::math::Axes;
use crate::scene::{AaBoxNode, Node, NodeId, PyramidNode, SceneError, SceneGraph, SphereNode};
use crate::transform::Transformation;

/// Demo graph plus the handles the viewer drives.
pub struct DemoScene {
    pub graph: SceneGraph,
    /// Bounces the light.
    pub jumper: JumperAnimator,
    /// Moves the pyramid while arrow keys are held.
    pub driver: DriverAnimator,
    pub sphere: NodeId,
    pub pyramid: NodeId,
    pub aabox: NodeId,
}

impl DemoScene {
    pub fn build() -> Result<Self, SceneError> {
        let mut graph = SceneGraph::new(Transformation::translation(Vec3::new(0.0, 0.0, -5.0)));
        let root = graph.root();

        let spin = graph.add_group(root, Transformation::rotation(Axes::X, Vec3::ZERO))?;

        let right = graph.add_group(spin, Transformation::translation(Vec3::new(1.2, 0.5, 0.0)))?;
        let sphere = graph.add_child(
            right,
            Node::Sphere(SphereNode::striped(
                Vec4::new(0.8, 0.0, 0.9, 1.0),
                Vec4::new(0.8, 0.9, 0.0, 1.0),
            )),
        )?;

        let left = graph.add_group(spin, Transformation::translation(Vec3::new(-0.8, 0.6, 0.0)))?;
        let steered = graph.add_group(left, Transformation::scaling(Vec3::ONE)?)?;
        let pyramid = graph.add_child(
            steered,
            Node::Pyramid(PyramidNode::with_face_colors(
                Vec4::new(0.0, 0.0, 1.0, 1.0),
                vec![
                    Vec4::new(0.0, 1.0, 1.0, 1.0),
                    Vec4::new(1.0, 1.0, 0.0, 1.0),
                    Vec4::new(1.0, 0.0, 1.0, 1.0),
                    Vec4::new(0.5, 0.5, 0.5, 1.0),
                ],
            )),
        )?;

        let forward = graph.add_group(left, Transformation::translation(Vec3::new(1.0, 0.0, 3.0)))?;
        let aabox = graph.add_child(
            forward,
            Node::AaBox(AaBoxNode::with_face_colors(
                Vec4::new(1.0, 0.0, 0.5, 1.0),
                vec![
                    Vec4::new(1.0, 0.0, 0.0, 1.0),
                    Vec4::new(0.0, 1.0, 0.0, 1.0),
                    Vec4::new(0.0, 0.0, 1.0, 1.0),
                    Vec4::new(1.0, 1.0, 0.0, 1.0),
                    Vec4::new(0.0, 1.0, 1.0, 1.0),
                ],
            )),
        )?;

        let lamp_post = graph.add_group(root, Transformation::translation(Vec3::new(0.0, 0.0, 5.0)))?;
        let lamp = graph.add_group(lamp_post, Transformation::rotation(Axes::Y, Vec3::ZERO))?;
        graph.add_child(lamp, Node::Light)?;

        let jumper = JumperAnimator::new(&graph, lamp, Axes::Y, 2.0)?;
        let driver = DriverAnimator::new(&graph, steered)?;

        Ok(Self {
            graph,
            jumper,
            driver,
            sphere,
            pyramid,
            aabox,
        })
    }

    pub fn animators(&mut self) -> [&mut dyn Animator; 2] {
        [&mut self.jumper, &mut self.driver]
    }

    /// Advance every active animator.
    pub fn simulate(&mut self, dt_ms: f32) -> Result<(), SceneError> {
        let Self {
            graph,
            jumper,
            driver,
            ..
        } = self;
        jumper.simulate(dt_ms, graph)?;
        driver.simulate(dt_ms, graph)
    }

    /// Flip every animator on or off. Returns whether the light now moves.
    pub fn toggle_animation(&mut self) -> bool {
        for animator in self.animators() {
            animator.toggle_active();
        }
        self.jumper.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::SceneCollector;
    use crate::raytracer::Raytracer;
    use std::f32::consts::FRAC_PI_3;

    #[test]
    fn builds_the_expected_tree() {
        let demo = DemoScene::build().unwrap();
        // root, spin, 2 + 2 groups under spin, 3 primitives, lamp post, lamp, light
        assert_eq!(demo.graph.len(), 12);

        let mut collector = SceneCollector::new(600, 600, FRAC_PI_3);
        collector.collect(&demo.graph);
        assert_eq!(collector.lights(), &[Vec3::ONE]);
        assert!(collector.camera().is_none());
    }

    #[test]
    fn jumper_moves_the_light() {
        let mut demo = DemoScene::build().unwrap();
        demo.simulate(250.0).unwrap();

        let mut collector = SceneCollector::new(600, 600, FRAC_PI_3);
        collector.collect(&demo.graph);
        assert!(collector.lights()[0].abs_diff_eq(Vec3::new(1.0, 2.0, 1.0), 1e-5));

        assert!(!demo.toggle_animation());
        demo.simulate(250.0).unwrap();
        collector.collect(&demo.graph);
        assert!(collector.lights()[0].abs_diff_eq(Vec3::new(1.0, 2.0, 1.0), 1e-5));
    }

    #[test]
    fn raytraced_demo_shows_the_sphere() {
        let demo = DemoScene::build().unwrap();
        let image = Raytracer::default().render(&demo.graph, 60, 60);
        let background = image.pixels().filter(|p| p.0 == [255, 255, 255, 255]).count();
        assert!(background > 0 && background < 60 * 60);
    }
}
