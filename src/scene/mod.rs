//! The scene graph shared by every render pass.
//!
//! A scene is a tree of [`Node`]s. Group nodes carry a local
//! [`Transformation`](crate::transform::Transformation) and an ordered list
//! of children; all other nodes are leaves:
//!
//! - geometry: [`SphereNode`], [`PyramidNode`], [`AaBoxNode`],
//!   [`TextureBoxNode`] and [`ObjNode`]
//! - [`Node::Light`], a point light at the local point `(1, 1, 1)`
//! - [`CameraNode`], the viewpoint and the scene's Phong coefficients
//!
//! Passes never store state on the nodes themselves. Per-node renderer
//! resources live in side tables keyed by [`NodeId`], and hit-test results
//! are kept as a separate [`Selection`] component.
//!
//! # Example
//!
//! ```
//! use twinpass::scene::{Node, SceneGraph, SphereNode};
//! use twinpass::transform::Transformation;
//! use glam::{Vec3, Vec4};
//!
//! let mut graph = SceneGraph::new(Transformation::translation(Vec3::new(0.0, 0.0, -5.0)));
//! let lamp = graph.add_group(graph.root(), Transformation::translation(Vec3::new(0.0, 0.0, 5.0)))?;
//! graph.add_child(lamp, Node::Light)?;
//! graph.add_child(graph.root(), Node::Sphere(SphereNode::new(Vec4::new(0.8, 0.0, 0.9, 1.0))))?;
//! # Ok::<(), twinpass::scene::SceneError>(())
//! ```

pub mod demo;
mod graph;
mod node;

pub use graph::{NodeId, SceneError, SceneGraph};
pub use node::{
    AaBoxNode, CameraNode, Color, GroupNode, Node, ObjNode, PyramidNode, Selection, SphereNode,
    TextureBoxNode,
};
