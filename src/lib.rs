//! # twinpass
//!
//! A scenegraph renderer with two interchangeable backends.
//!
//! Scenes are trees of transformation groups and primitive leaves (spheres,
//! pyramids, boxes, textured boxes, OBJ meshes, lights and cameras). The same
//! graph can be drawn by:
//!
//! - the **rasterizer**: a setup pass turns leaves into GPU meshes, then a
//!   render pass feeds matrices and Phong parameters to a [`ShadingPipeline`]
//! - the **raytracer**: one primary ray per pixel, tested against every leaf,
//!   with Phong shading of the nearest hit
//!
//! Mouse picking reuses the rasterizer's geometry: a bounding sphere test
//! followed by exact ray/triangle tests marks the nearest object selected.
//!
//! ```
//! use glam::{Vec3, Vec4};
//! use twinpass::raytracer::Raytracer;
//! use twinpass::scene::{Node, SceneGraph, SphereNode};
//! use twinpass::transform::Transformation;
//!
//! let mut graph = SceneGraph::new(Transformation::translation(Vec3::new(0.0, 0.0, -4.0)));
//! graph.add_child(graph.root(), Node::Sphere(SphereNode::new(Vec4::new(1.0, 0.0, 0.0, 1.0))))?;
//! graph.add_child(graph.root(), Node::Light)?;
//!
//! let image = Raytracer::default().render(&graph, 32, 32);
//! assert_ne!(image.get_pixel(16, 16).0, [255, 255, 255, 255]);
//! # Ok::<(), twinpass::scene::SceneError>(())
//! ```

pub mod animation;
pub mod app;
pub mod bounds;
pub mod camera;
pub mod collect;
pub mod config;
pub mod geometry;
pub mod gpu;
pub mod gpu_pipeline;
pub mod input;
pub mod math;
pub mod phong;
pub mod picking;
pub mod quaternion;
pub mod raster;
pub mod ray;
pub mod raytracer;
pub mod scene;
pub mod texture;
pub mod transform;
pub mod traversal;

pub use animation::Animator;
pub use camera::{RasterCamera, RayCamera};
pub use collect::SceneCollector;
pub use config::RenderConfig;
pub use picking::{HitTester, PickResult};
pub use raster::{RasterPass, RasterSetup, ShadingPipeline};
pub use raytracer::Raytracer;
pub use scene::{Node, NodeId, SceneGraph};
pub use transform::Transformation;

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
