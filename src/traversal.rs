//! Depth-first scene traversal with accumulated transforms.
//!
//! Every pass (light collection, raytracing, rasterization, hit testing)
//! walks the graph the same way. Entering a group pushes a [`Frame`] holding
//!
//! - `matrix = parent.matrix · local.matrix`
//! - `inverse = local.inverse · parent.inverse`
//! - `scale = parent.scale · local.scale_factor()`
//!
//! and leaving it pops the frame again. The push returns a [`StackScope`]
//! guard that pops on drop, so the stack depth is restored on every exit
//! path. Leaves are handed to a [`Visitor`] together with the frame in
//! effect.

use std::ops::{Deref, DerefMut};

use glam::Mat4;
use log::warn;

use crate::scene::{Node, NodeId, SceneGraph};
use crate::transform::Transformation;

/// Accumulated transform state at one point of a traversal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    /// Local-to-world matrix.
    pub matrix: Mat4,
    /// World-to-local matrix.
    pub inverse: Mat4,
    /// Product of the largest axis stretch of every group on the path.
    pub scale: f32,
}

impl Frame {
    pub const IDENTITY: Self = Self {
        matrix: Mat4::IDENTITY,
        inverse: Mat4::IDENTITY,
        scale: 1.0,
    };

    /// This frame followed by a group's local transformation.
    pub fn then(&self, local: &Transformation) -> Self {
        Self {
            matrix: self.matrix * local.matrix(),
            inverse: local.inverse() * self.inverse,
            scale: self.scale * local.scale_factor(),
        }
    }

    /// Matrix that carries local normals to world space.
    ///
    /// This is the transpose of the inverse with the translation row and
    /// column cleared and `[3][3] = 1`, which keeps normals perpendicular
    /// under non-uniform scaling.
    pub fn normal_matrix(&self) -> Mat4 {
        let mut n = self.inverse.transpose();
        n.x_axis.w = 0.0;
        n.y_axis.w = 0.0;
        n.z_axis.w = 0.0;
        n.w_axis = glam::Vec4::W;
        n
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Stack of accumulated frames. Never empty: the bottom is the identity.
#[derive(Clone, Debug)]
pub struct TransformStack {
    frames: Vec<Frame>,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformStack {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::IDENTITY],
        }
    }

    /// The frame currently in effect.
    #[inline]
    pub fn top(&self) -> &Frame {
        // The identity frame at the bottom is never popped.
        &self.frames[self.frames.len() - 1]
    }

    /// Number of frames, counting the identity at the bottom.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Enter a group. The frame is popped when the returned scope drops.
    pub fn push(&mut self, local: &Transformation) -> StackScope<'_> {
        let next = self.top().then(local);
        self.frames.push(next);
        let depth = self.frames.len();
        StackScope { stack: self, depth }
    }
}

/// Guard for one pushed frame.
///
/// Dereferences to the stack so nested groups can push through it.
pub struct StackScope<'a> {
    stack: &'a mut TransformStack,
    depth: usize,
}

impl Deref for StackScope<'_> {
    type Target = TransformStack;

    fn deref(&self) -> &TransformStack {
        self.stack
    }
}

impl DerefMut for StackScope<'_> {
    fn deref_mut(&mut self) -> &mut TransformStack {
        self.stack
    }
}

impl Drop for StackScope<'_> {
    fn drop(&mut self) {
        debug_assert_eq!(
            self.stack.frames.len(),
            self.depth,
            "transform stack unbalanced when leaving a group"
        );
        self.stack.frames.truncate(self.depth - 1);
    }
}

/// A render or query pass over the scene graph.
///
/// `visit` is called once per non-group node in depth-first insertion order.
/// Implementations match on [`Node`] so a new node kind shows up as a
/// compile error in every pass.
pub trait Visitor {
    fn visit(&mut self, id: NodeId, node: &Node, frame: &Frame);
}

impl SceneGraph {
    /// Walk the whole graph with a fresh identity stack.
    pub fn walk<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        let mut stack = TransformStack::new();
        self.walk_with(&mut stack, visitor);
    }

    /// Walk the whole graph on an existing stack.
    ///
    /// The stack has the same depth afterwards as before.
    pub fn walk_with<V: Visitor + ?Sized>(&self, stack: &mut TransformStack, visitor: &mut V) {
        self.walk_node(self.root(), stack, visitor);
    }

    fn walk_node<V: Visitor + ?Sized>(
        &self,
        id: NodeId,
        stack: &mut TransformStack,
        visitor: &mut V,
    ) {
        let Ok(node) = self.node(id) else {
            warn!("skipping dangling child {id}");
            return;
        };
        match &*node {
            Node::Group(group) => {
                let mut scope = stack.push(&group.transform);
                for &child in &group.children {
                    self.walk_node(child, &mut scope, visitor);
                }
            }
            leaf => visitor.visit(id, leaf, stack.top()),
        }
    }
}
