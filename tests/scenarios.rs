use approx::assert_relative_eq;
use glam::{Mat4, Vec3, Vec4};

use twinpass::camera::RayCamera;
use twinpass::collect::SceneCollector;
use twinpass::geometry::Geometry;
use twinpass::phong::{LIGHT_ENERGY, PhongParams};
use twinpass::picking::HitTester;
use twinpass::quaternion::Quaternion;
use twinpass::raster::{Program, RasterSetup, Renderables, ShadingPipeline, Uniform};
use twinpass::ray::Ray;
use twinpass::raytracer::Raytracer;
use twinpass::scene::{Node, NodeId, SceneGraph, Selection, SphereNode};
use twinpass::transform::Transformation;

/// Accepts every upload and hands out sequential mesh ids.
#[derive(Default)]
struct NullPipeline {
    meshes: usize,
}

impl ShadingPipeline for NullPipeline {
    type Mesh = usize;
    type Error = String;

    fn create_mesh(&mut self, _geometry: &Geometry) -> Result<usize, String> {
        self.meshes += 1;
        Ok(self.meshes - 1)
    }

    fn use_program(&mut self, _program: Program) {}
    fn set_matrix(&mut self, _uniform: Uniform, _value: Mat4) {}
    fn set_vec3(&mut self, _uniform: Uniform, _value: Vec3) {}
    fn set_float(&mut self, _uniform: Uniform, _value: f32) {}
    fn set_int(&mut self, _uniform: Uniform, _value: i32) {}
    fn draw(&mut self, _mesh: &usize) {}
}

const RED: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);

#[test]
fn raytraced_sphere_center_pixel_is_lit() {
    let mut graph = SceneGraph::default();
    let group = graph
        .add_group(graph.root(), Transformation::translation(Vec3::ZERO))
        .unwrap();
    let sphere = graph
        .add_child(group, Node::Sphere(SphereNode::new(RED)))
        .unwrap();
    graph.add_child(group, Node::Light).unwrap();

    let camera = RayCamera {
        origin: Vec3::new(0.0, 0.0, 5.0),
        width: 64,
        height: 64,
        ..RayCamera::default()
    };
    let mut collector = SceneCollector::new(64, 64, camera.alpha);
    collector.collect(&graph);
    assert_eq!(collector.lights(), &[Vec3::ONE]);

    let raytracer = Raytracer::default();
    let ray = Ray::from_camera(32.0, 32.0, &camera);
    let hit = raytracer.trace(&graph, &ray).expect("center ray hits the sphere");
    assert_eq!(hit.node, sphere);
    assert!(hit.intersection.t > 0.0);
    assert_relative_eq!(hit.intersection.point.z, 1.0, epsilon = 1e-3);

    let params = PhongParams::default();
    let unlit = raytracer.shade_pixel(&graph, &camera, &[], &params, 32, 32);
    assert_relative_eq!(unlit.x, LIGHT_ENERGY * params.ambient, epsilon = 1e-5);
    assert!(unlit.x > 0.0);

    let lit = raytracer.shade_pixel(&graph, &camera, collector.lights(), &params, 32, 32);
    // The light sits almost edge-on to the surface facing the camera.
    assert!(lit.x >= unlit.x);
    assert!(lit.x < 1.0);

    let image = raytracer.render_with(&graph, &camera, collector.lights(), &params);
    assert_ne!(image.get_pixel(32, 32).0, [255, 255, 255, 255]);
    assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);
}

fn sphere_at(graph: &mut SceneGraph, center: Vec3) -> NodeId {
    let group = graph
        .add_group(graph.root(), Transformation::translation(center))
        .unwrap();
    graph
        .add_child(group, Node::Sphere(SphereNode::new(RED)))
        .unwrap()
}

#[test]
fn click_selects_exactly_the_sphere_under_the_cursor() {
    let mut graph = SceneGraph::default();
    let left = sphere_at(&mut graph, Vec3::new(-2.5, 0.0, -6.0));
    let right = sphere_at(&mut graph, Vec3::new(2.5, 0.0, -6.0));
    let light_group = graph
        .add_group(graph.root(), Transformation::translation(Vec3::ZERO))
        .unwrap();
    let light = graph.add_child(light_group, Node::Light).unwrap();

    let mut renderables = Renderables::default();
    let built = RasterSetup::default().run(&graph, &mut NullPipeline::default(), &mut renderables);
    assert_eq!(built, 2);

    let camera = RayCamera {
        width: 201,
        height: 201,
        ..RayCamera::default()
    };
    // Project a point just inside the right sphere's silhouette.
    let focal = camera.focal_length();
    let target = Vec3::new(2.4, 0.1, -6.0) - camera.origin;
    let x = 100.0 + target.x / -target.z * focal;
    let y = 100.0 - target.y / -target.z * focal;

    let hit = HitTester::new()
        .pick(&mut graph, &renderables, x, y, &camera)
        .expect("cursor is over the right sphere");
    assert_eq!(hit.node, right);
    assert_eq!(graph.selection(right), Some(Selection::Selected));
    assert_eq!(graph.selection(left), Some(Selection::Deselected));
    assert_eq!(graph.selection(light), None);
    assert_eq!(graph.selected(), Some(right));
}

#[test]
fn slerp_endpoints_return_the_inputs() {
    let a = Quaternion::from_axis_angle(Vec3::Y, 0.3);
    let b = Quaternion::from_axis_angle(Vec3::new(1.0, 1.0, 0.0).normalize(), 1.7);

    let start = a.slerp(b, 0.0);
    let end = a.slerp(b, 1.0);
    for (got, want) in [(start, a), (end, b)] {
        assert_relative_eq!(got.w, want.w, epsilon = 1e-5);
        assert_relative_eq!(got.x, want.x, epsilon = 1e-5);
        assert_relative_eq!(got.y, want.y, epsilon = 1e-5);
        assert_relative_eq!(got.z, want.z, epsilon = 1e-5);
    }
}
