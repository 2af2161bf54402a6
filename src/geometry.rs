//! CPU-side triangle geometry for scene primitives.
//!
//! Every primitive node is turned into a flat triangle list: three
//! consecutive [`Vertex`] values per triangle, wound counter-clockwise when
//! seen from outside. The rasterizer uploads these lists once per node and
//! the hit tester intersects them triangle by triangle.
//!
//! | Node | Shape |
//! |------|-------|
//! | [`SphereNode`] | unit sphere, ring grid, optional striping |
//! | [`AaBoxNode`] | box spanning `[-0.5, 0.5]³`, one colour per face |
//! | [`PyramidNode`] | apex at the origin, square base at `y = -1` |
//! | [`TextureBoxNode`] | unit box with UVs, tangents and bitangents |
//! | [`ObjNode`] | Wavefront OBJ `v` / `vt` / `vn` / `f` records |
//!
//! # Example
//!
//! ```
//! use twinpass::geometry::Geometry;
//! use twinpass::scene::AaBoxNode;
//! use glam::{Vec3, Vec4};
//!
//! let cube = Geometry::aabox(&AaBoxNode::new(Vec4::ONE));
//! assert_eq!(cube.vertices.len(), 36);
//! assert_eq!(cube.bounds(), (Vec3::splat(-0.5), Vec3::splat(0.5)));
//! ```

use std::f32::consts::{PI, TAU};
use std::path::PathBuf;

use glam::{Vec2, Vec3, Vec4};
use thiserror::Error;

use crate::bounds::BoundingSphere;
use crate::config::RenderConfig;
use crate::scene::{AaBoxNode, Node, ObjNode, PyramidNode, SphereNode, TextureBoxNode};

/// Errors that can occur when building geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A record could not be parsed.
    #[error("obj line {line}: {message}")]
    Parse { line: usize, message: String },
    /// A face refers to a vertex that does not exist.
    #[error("obj line {line}: index {index} is out of range")]
    IndexOutOfRange { line: usize, index: i64 },
    /// The source contained no faces.
    #[error("obj source contains no faces")]
    Empty,
}

/// One corner of a triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub color: Vec4,
    pub normal: Vec3,
    pub uv: Vec2,
    pub tangent: Vec3,
    pub bitangent: Vec3,
}

impl Vertex {
    pub fn new(position: Vec3, color: Vec4, normal: Vec3) -> Self {
        Self {
            position,
            color,
            normal,
            uv: Vec2::ZERO,
            tangent: Vec3::ZERO,
            bitangent: Vec3::ZERO,
        }
    }
}

/// Image files sampled by textured geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureMaps {
    pub diffuse: PathBuf,
    pub normal: PathBuf,
}

/// A triangle list ready for upload or hit testing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    /// Three consecutive vertices per triangle.
    pub vertices: Vec<Vertex>,
    /// Set for geometry drawn with the texture program.
    pub textures: Option<TextureMaps>,
}

/// Face frames of the unit box: outward normal, then the `u` and `v`
/// directions across the face with `u × v = normal`.
const BOX_FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    (Vec3::X, Vec3::NEG_Z, Vec3::Y),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::X, Vec3::NEG_Z),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
];

/// Corner offsets of a face quad as `(u, v)` signs, counter-clockwise.
const QUAD: [(f32, f32); 6] = [
    (-1.0, -1.0),
    (1.0, -1.0),
    (1.0, 1.0),
    (-1.0, -1.0),
    (1.0, 1.0),
    (-1.0, 1.0),
];

impl Geometry {
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self {
            vertices,
            textures: None,
        }
    }

    /// Geometry for a primitive node; `None` for groups, lights and cameras.
    pub fn for_node(node: &Node, config: &RenderConfig) -> Result<Option<Self>, GeometryError> {
        let geometry = match node {
            Node::Sphere(sphere) => {
                Self::sphere(sphere, config.sphere_segments, config.sphere_rings)
            }
            Node::AaBox(aabox) => Self::aabox(aabox),
            Node::Pyramid(pyramid) => Self::pyramid(pyramid),
            Node::TextureBox(textured) => Self::texture_box(textured),
            Node::Obj(obj) => Self::obj(obj)?,
            Node::Group(_) | Node::Light | Node::Camera(_) => return Ok(None),
        };
        Ok(Some(geometry))
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Triangle corner positions.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.vertices
            .chunks_exact(3)
            .map(|tri| [tri[0].position, tri[1].position, tri[2].position])
    }

    /// Computes the axis-aligned bounding box.
    ///
    /// Returns `(min, max)` corners of the bounding box.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for v in &self.vertices {
            min = min.min(v.position);
            max = max.max(v.position);
        }
        (min, max)
    }

    /// Ritter bounding sphere of all vertex positions.
    pub fn bounding_sphere(&self) -> BoundingSphere {
        let points: Vec<Vec3> = self.vertices.iter().map(|v| v.position).collect();
        BoundingSphere::from_points(&points)
    }

    /// Unit sphere as a ring grid.
    ///
    /// Ring bands alternate between the sphere's colour and its secondary
    /// colour when one is set.
    pub fn sphere(node: &SphereNode, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let corner = |ring: u32, segment: u32, color: Vec4| {
            let phi = PI * ring as f32 / rings as f32;
            let theta = TAU * segment as f32 / segments as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();
            let (sin_theta, cos_theta) = theta.sin_cos();
            let position = Vec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta);
            let tangent = Vec3::new(-sin_theta, 0.0, cos_theta);
            Vertex {
                position,
                color,
                normal: position,
                uv: Vec2::new(segment as f32 / segments as f32, ring as f32 / rings as f32),
                tangent,
                bitangent: position.cross(tangent),
            }
        };

        let mut vertices = Vec::with_capacity((segments * rings * 6) as usize);
        for ring in 0..rings {
            let color = match node.secondary {
                Some(secondary) if ring % 2 == 1 => secondary,
                _ => node.color,
            };
            for segment in 0..segments {
                let current = corner(ring, segment, color);
                let beside = corner(ring, segment + 1, color);
                let below = corner(ring + 1, segment, color);
                let below_beside = corner(ring + 1, segment + 1, color);
                // The first and last ring meet at a pole, where one
                // triangle of each quad collapses.
                if ring != 0 {
                    vertices.extend([current, beside, below]);
                }
                if ring != rings - 1 {
                    vertices.extend([beside, below_beside, below]);
                }
            }
        }
        Self::new(vertices)
    }

    /// Box spanning `[-0.5, 0.5]³`. Face order is +z, -z, +x, -x, +y, -y.
    pub fn aabox(node: &AaBoxNode) -> Self {
        let vertices = BOX_FACES
            .iter()
            .enumerate()
            .flat_map(|(face, &(normal, u, v))| {
                let color = node.face_color(face);
                QUAD.iter().map(move |&(su, sv)| {
                    let position = (normal + u * su + v * sv) * 0.5;
                    Vertex::new(position, color, normal)
                })
            })
            .collect();
        Self::new(vertices)
    }

    /// Box spanning `[-0.5, 0.5]³` with texture coordinates and a tangent
    /// frame for normal mapping.
    pub fn texture_box(node: &TextureBoxNode) -> Self {
        let vertices = BOX_FACES
            .iter()
            .flat_map(|&(normal, u, v)| {
                QUAD.iter().map(move |&(su, sv)| Vertex {
                    position: (normal + u * su + v * sv) * 0.5,
                    color: ObjNode::COLOR,
                    normal,
                    // Image rows run top to bottom.
                    uv: Vec2::new((su + 1.0) * 0.5, (1.0 - sv) * 0.5),
                    tangent: u,
                    bitangent: v,
                })
            })
            .collect();
        Self {
            vertices,
            textures: Some(TextureMaps {
                diffuse: node.texture.clone(),
                normal: node.normal_map.clone(),
            }),
        }
    }

    /// Corner positions of the pyramid's six triangles: four sides
    /// (+z, +x, -z, -x) then two for the base.
    pub fn pyramid_triangles() -> Vec<[Vec3; 3]> {
        let apex = Vec3::ZERO;
        let back_left = Vec3::new(-0.5, -1.0, -0.5);
        let back_right = Vec3::new(0.5, -1.0, -0.5);
        let front_right = Vec3::new(0.5, -1.0, 0.5);
        let front_left = Vec3::new(-0.5, -1.0, 0.5);
        vec![
            [apex, front_left, front_right],
            [apex, front_right, back_right],
            [apex, back_right, back_left],
            [apex, back_left, front_left],
            [back_left, back_right, front_right],
            [back_left, front_right, front_left],
        ]
    }

    /// Face index of a pyramid triangle from [`Self::pyramid_triangles`].
    pub fn pyramid_face_of(triangle: usize) -> usize {
        triangle.min(PyramidNode::FACES - 1)
    }

    pub fn pyramid(node: &PyramidNode) -> Self {
        let vertices = Self::pyramid_triangles()
            .into_iter()
            .enumerate()
            .flat_map(|(i, tri)| {
                let color = node.face_color(Self::pyramid_face_of(i));
                let normal = (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize();
                tri.map(|p| Vertex::new(p, color, normal))
            })
            .collect();
        Self::new(vertices)
    }

    /// Parse an OBJ mesh.
    ///
    /// Faces with more than three corners are split into a fan. Faces
    /// without `vn` references get flat normals. Unknown record types are
    /// skipped.
    pub fn obj(node: &ObjNode) -> Result<Self, GeometryError> {
        let mut positions: Vec<Vec3> = Vec::new();
        let mut normals: Vec<Vec3> = Vec::new();
        let mut uvs: Vec<Vec2> = Vec::new();
        let mut vertices = Vec::new();

        for (number, raw) in node.lines.iter().enumerate() {
            let line = number + 1;
            let content = raw.split('#').next().unwrap_or("").trim();
            let mut fields = content.split_whitespace();
            let Some(keyword) = fields.next() else {
                continue;
            };
            let rest: Vec<&str> = fields.collect();

            match keyword {
                "v" => positions.push(parse_vec3(&rest, line)?),
                "vn" => normals.push(parse_vec3(&rest, line)?.normalize_or_zero()),
                "vt" => {
                    let uv = parse_floats(&rest, line, 2)?;
                    uvs.push(Vec2::new(uv[0], uv[1]));
                }
                "f" => {
                    if rest.len() < 3 {
                        return Err(GeometryError::Parse {
                            line,
                            message: format!("face needs 3 or more corners, found {}", rest.len()),
                        });
                    }
                    let corners = rest
                        .iter()
                        .map(|corner| {
                            parse_corner(corner, line, &positions, &uvs, &normals)
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    for i in 1..corners.len() - 1 {
                        let mut tri = [corners[0], corners[i], corners[i + 1]];
                        if tri.iter().any(|v| v.normal == Vec3::ZERO) {
                            let normal = (tri[1].position - tri[0].position)
                                .cross(tri[2].position - tri[0].position)
                                .normalize_or_zero();
                            for v in &mut tri {
                                v.normal = normal;
                            }
                        }
                        vertices.extend(tri);
                    }
                }
                _ => {}
            }
        }

        if vertices.is_empty() {
            return Err(GeometryError::Empty);
        }
        Ok(Self::new(vertices))
    }
}

fn parse_floats(fields: &[&str], line: usize, count: usize) -> Result<Vec<f32>, GeometryError> {
    if fields.len() < count {
        return Err(GeometryError::Parse {
            line,
            message: format!("expected {count} numbers, found {}", fields.len()),
        });
    }
    fields[..count]
        .iter()
        .map(|field| {
            field.parse::<f32>().map_err(|e| GeometryError::Parse {
                line,
                message: format!("'{field}': {e}"),
            })
        })
        .collect()
}

fn parse_vec3(fields: &[&str], line: usize) -> Result<Vec3, GeometryError> {
    let v = parse_floats(fields, line, 3)?;
    Ok(Vec3::new(v[0], v[1], v[2]))
}

/// Resolve a 1-based (or negative, relative) OBJ index.
fn resolve<T: Copy>(items: &[T], raw: &str, line: usize) -> Result<T, GeometryError> {
    let index: i64 = raw.parse().map_err(|_| GeometryError::Parse {
        line,
        message: format!("bad index '{raw}'"),
    })?;
    let resolved = if index < 0 {
        items.len() as i64 + index
    } else {
        index - 1
    };
    usize::try_from(resolved)
        .ok()
        .and_then(|i| items.get(i).copied())
        .ok_or(GeometryError::IndexOutOfRange { line, index })
}

/// One `f` corner: `v`, `v/vt`, `v//vn` or `v/vt/vn`.
fn parse_corner(
    corner: &str,
    line: usize,
    positions: &[Vec3],
    uvs: &[Vec2],
    normals: &[Vec3],
) -> Result<Vertex, GeometryError> {
    let mut parts = corner.split('/');
    let position = resolve(positions, parts.next().unwrap_or(""), line)?;
    let uv = match parts.next() {
        Some(raw) if !raw.is_empty() => resolve(uvs, raw, line)?,
        _ => Vec2::ZERO,
    };
    let normal = match parts.next() {
        Some(raw) if !raw.is_empty() => resolve(normals, raw, line)?,
        _ => Vec3::ZERO,
    };
    Ok(Vertex {
        uv,
        ..Vertex::new(position, ObjNode::COLOR, normal)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_outward(geometry: &Geometry, center: Vec3) {
        for [a, b, c] in geometry.triangles() {
            let normal = (b - a).cross(c - a);
            if normal.length() < 1e-6 {
                panic!("degenerate triangle {a} {b} {c}");
            }
            let centroid = (a + b + c) / 3.0;
            assert!(
                normal.dot(centroid - center) > 0.0,
                "triangle {a} {b} {c} winds inward"
            );
        }
    }

    #[test]
    fn sphere_winds_outward_and_stays_on_the_unit_sphere() {
        let geometry = Geometry::sphere(&SphereNode::default(), 16, 8);
        assert_outward(&geometry, Vec3::ZERO);
        for v in &geometry.vertices {
            assert!((v.position.length() - 1.0).abs() < 1e-5);
            assert!(v.normal.abs_diff_eq(v.position, 1e-6));
        }
        // Pole rings contribute one triangle per segment, the rest two.
        assert_eq!(geometry.triangle_count(), 16 * (2 * 8 - 2));
    }

    #[test]
    fn sphere_stripes_alternate_by_ring() {
        let a = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let b = Vec4::new(0.0, 1.0, 0.0, 1.0);
        let geometry = Geometry::sphere(&SphereNode::striped(a, b), 8, 4);
        let colors: Vec<Vec4> = geometry.vertices.iter().map(|v| v.color).collect();
        assert!(colors.contains(&a) && colors.contains(&b));
        // The top cap belongs to ring 0.
        assert_eq!(geometry.vertices[0].color, a);
    }

    #[test]
    fn box_faces_wind_outward_with_face_colors() {
        let base = Vec4::new(1.0, 0.0, 0.5, 1.0);
        let extras = vec![Vec4::X, Vec4::Y, Vec4::Z, Vec4::new(1.0, 1.0, 0.0, 1.0), Vec4::W];
        let geometry = Geometry::aabox(&AaBoxNode::with_face_colors(base, extras.clone()));
        assert_outward(&geometry, Vec3::ZERO);
        assert_eq!(geometry.vertices[0].color, base);
        for (face, color) in extras.iter().enumerate() {
            assert_eq!(geometry.vertices[(face + 1) * 6].color, *color);
        }
        for tri in geometry.vertices.chunks_exact(3) {
            let face_normal = (tri[1].position - tri[0].position)
                .cross(tri[2].position - tri[0].position)
                .normalize();
            assert!(face_normal.abs_diff_eq(tri[0].normal, 1e-6));
        }
    }

    #[test]
    fn pyramid_winds_outward() {
        let geometry = Geometry::pyramid(&PyramidNode::new(Vec4::ONE));
        assert_eq!(geometry.triangle_count(), 6);
        assert_outward(&geometry, Vec3::new(0.0, -0.6, 0.0));
        assert_eq!(geometry.bounds(), (Vec3::new(-0.5, -1.0, -0.5), Vec3::new(0.5, 0.0, 0.5)));
    }

    #[test]
    fn texture_box_has_tangent_frames() {
        let geometry = Geometry::texture_box(&TextureBoxNode::new("wood.png", "wood_normal.png"));
        assert_outward(&geometry, Vec3::ZERO);
        assert_eq!(
            geometry.textures.as_ref().map(|t| t.diffuse.clone()),
            Some(PathBuf::from("wood.png"))
        );
        for v in &geometry.vertices {
            assert!(v.tangent.cross(v.bitangent).abs_diff_eq(v.normal, 1e-6));
            assert!(v.uv.cmpge(Vec2::ZERO).all() && v.uv.cmple(Vec2::ONE).all());
        }
    }

    #[test]
    fn obj_quads_are_split_and_normals_resolved() {
        let source = "\
# unit quad in the xy plane
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
vt 0 0
f 1//1 2//1 3//1 4//1
f -4 -3 -2
";
        let geometry = Geometry::obj(&ObjNode::from_source(source)).unwrap();
        assert_eq!(geometry.triangle_count(), 3);
        assert!(geometry.vertices.iter().all(|v| v.normal == Vec3::Z));
        assert!(geometry.vertices.iter().all(|v| v.color == ObjNode::COLOR));
    }

    #[test]
    fn obj_errors_carry_line_numbers() {
        let bad_index = ObjNode::from_source("v 0 0 0\nf 1 2 3");
        assert_eq!(
            Geometry::obj(&bad_index),
            Err(GeometryError::IndexOutOfRange { line: 2, index: 2 })
        );

        let bad_number = ObjNode::from_source("v 0 zero 0");
        assert!(matches!(
            Geometry::obj(&bad_number),
            Err(GeometryError::Parse { line: 1, .. })
        ));

        assert_eq!(Geometry::obj(&ObjNode::from_source("v 1 2 3")), Err(GeometryError::Empty));
    }

    #[test]
    fn for_node_skips_structural_nodes() {
        let config = RenderConfig::default();
        assert_eq!(Geometry::for_node(&Node::Light, &config), Ok(None));
        let sphere = Geometry::for_node(&Node::Sphere(SphereNode::default()), &config)
            .unwrap()
            .unwrap();
        let bounds = sphere.bounding_sphere();
        assert!(bounds.radius >= 1.0 - 1e-5);
    }
}
