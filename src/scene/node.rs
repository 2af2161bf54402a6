//! Node variants stored in the scene graph.

use std::path::PathBuf;

use glam::Vec4;

use crate::transform::Transformation;

use super::NodeId;

/// RGBA colour with components in `[0, 1]`.
pub type Color = Vec4;

/// Tri-state hit-test outcome for a primitive.
///
/// `Unevaluated` means the last hit test never considered the node, which is
/// different from having considered it and rejected it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Selection {
    Selected,
    Deselected,
    #[default]
    Unevaluated,
}

/// One node of the scene graph.
///
/// Groups carry the transformation and own their children; every other
/// variant is a leaf that passes act on.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Group(GroupNode),
    Sphere(SphereNode),
    Pyramid(PyramidNode),
    AaBox(AaBoxNode),
    TextureBox(TextureBoxNode),
    Light,
    Camera(CameraNode),
    Obj(ObjNode),
}

impl Node {
    pub fn group(transform: Transformation) -> Self {
        Node::Group(GroupNode {
            transform,
            children: Vec::new(),
        })
    }

    /// Whether the node is geometry that can be drawn, traced and picked.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Node::Sphere(_) | Node::Pyramid(_) | Node::AaBox(_) | Node::TextureBox(_) | Node::Obj(_)
        )
    }

    /// Colour used when this primitive is shaded as a whole.
    pub fn base_color(&self) -> Option<Color> {
        match self {
            Node::Sphere(sphere) => Some(sphere.color),
            Node::Pyramid(pyramid) => Some(pyramid.base_color),
            Node::AaBox(aabox) => Some(aabox.base_color),
            Node::TextureBox(_) | Node::Obj(_) => Some(ObjNode::COLOR),
            Node::Group(_) | Node::Light | Node::Camera(_) => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Group(_) => "group",
            Node::Sphere(_) => "sphere",
            Node::Pyramid(_) => "pyramid",
            Node::AaBox(_) => "aabox",
            Node::TextureBox(_) => "texture box",
            Node::Light => "light",
            Node::Camera(_) => "camera",
            Node::Obj(_) => "obj",
        }
    }
}

/// Interior node: a local transform applied to an ordered list of children.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupNode {
    pub transform: Transformation,
    /// Filled only by [`SceneGraph::add_child`](crate::scene::SceneGraph::add_child).
    pub(crate) children: Vec<NodeId>,
}

impl GroupNode {
    /// Children in traversal order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Unit sphere at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereNode {
    pub color: Color,
    /// Alternate ring colour for striped rendering.
    pub secondary: Option<Color>,
}

impl Default for SphereNode {
    fn default() -> Self {
        Self {
            color: Vec4::new(0.8, 0.1, 0.1, 1.0),
            secondary: None,
        }
    }
}

impl SphereNode {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            secondary: None,
        }
    }

    pub fn striped(color: Color, secondary: Color) -> Self {
        Self {
            color,
            secondary: Some(secondary),
        }
    }
}

/// Square pyramid with its apex at the origin and its base at `y = -1`.
///
/// Faces are the four sides followed by the base; side `i` uses
/// `extra_colors[i - 1]` when present and the base colour otherwise.
#[derive(Clone, Debug, PartialEq)]
pub struct PyramidNode {
    pub base_color: Color,
    pub extra_colors: Vec<Color>,
}

impl PyramidNode {
    pub const FACES: usize = 5;

    pub fn new(base_color: Color) -> Self {
        Self {
            base_color,
            extra_colors: Vec::new(),
        }
    }

    /// Extra colours beyond [`Self::FACES`]` - 1` are ignored.
    pub fn with_face_colors(base_color: Color, extra_colors: Vec<Color>) -> Self {
        Self {
            base_color,
            extra_colors,
        }
    }

    pub fn face_color(&self, face: usize) -> Color {
        face_color(self.base_color, &self.extra_colors, face)
    }
}

/// Axis-aligned box spanning `[-0.5, 0.5]` on every axis.
#[derive(Clone, Debug, PartialEq)]
pub struct AaBoxNode {
    pub base_color: Color,
    pub extra_colors: Vec<Color>,
}

impl AaBoxNode {
    pub const FACES: usize = 6;

    pub fn new(base_color: Color) -> Self {
        Self {
            base_color,
            extra_colors: Vec::new(),
        }
    }

    pub fn with_face_colors(base_color: Color, extra_colors: Vec<Color>) -> Self {
        Self {
            base_color,
            extra_colors,
        }
    }

    pub fn face_color(&self, face: usize) -> Color {
        face_color(self.base_color, &self.extra_colors, face)
    }
}

fn face_color(base: Color, extra: &[Color], face: usize) -> Color {
    face.checked_sub(1)
        .and_then(|i| extra.get(i).copied())
        .unwrap_or(base)
}

/// Unit box with a diffuse texture and a tangent-space normal map.
///
/// Only the paths are stored; the pixels are loaded by the rasterizer.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureBoxNode {
    pub texture: PathBuf,
    pub normal_map: PathBuf,
}

impl TextureBoxNode {
    pub fn new(texture: impl Into<PathBuf>, normal_map: impl Into<PathBuf>) -> Self {
        Self {
            texture: texture.into(),
            normal_map: normal_map.into(),
        }
    }
}

/// Phong coefficients and the viewpoint of the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraNode {
    pub shininess: f32,
    pub specular: f32,
    pub diffuse: f32,
    pub ambient: f32,
}

impl Default for CameraNode {
    fn default() -> Self {
        Self {
            shininess: 16.0,
            specular: 0.5,
            diffuse: 0.6,
            ambient: 0.3,
        }
    }
}

/// Mesh given as the text lines of a Wavefront OBJ file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjNode {
    pub lines: Vec<String>,
}

impl ObjNode {
    /// Vertex colour given to OBJ meshes and textured surfaces.
    pub const COLOR: Color = Vec4::new(0.5, 0.5, 0.5, 1.0);

    pub fn from_source(source: &str) -> Self {
        Self {
            lines: source.lines().map(str::to_owned).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_colors_fall_back_to_base() {
        let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let green = Vec4::new(0.0, 1.0, 0.0, 1.0);
        let pyramid = PyramidNode::with_face_colors(red, vec![green]);
        assert_eq!(pyramid.face_color(0), red);
        assert_eq!(pyramid.face_color(1), green);
        assert_eq!(pyramid.face_color(4), red);
    }

    #[test]
    fn primitives_are_distinguished_from_structure() {
        assert!(Node::Sphere(SphereNode::default()).is_primitive());
        assert!(Node::Obj(ObjNode::default()).is_primitive());
        assert!(!Node::Light.is_primitive());
        assert!(!Node::group(Transformation::identity()).is_primitive());
        assert_eq!(Node::Light.base_color(), None);
    }
}
