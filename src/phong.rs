//! Phong lighting shared by the raytracer and the raster shaders.

use glam::{Vec3, Vec4};

use crate::scene::CameraNode;

/// Colour of every light source.
pub const LIGHT_COLOR: Vec4 = Vec4::new(0.8, 0.8, 0.8, 0.0);

/// Energy each light contributes; also scales the ambient term.
pub const LIGHT_ENERGY: f32 = 0.8;

/// Material coefficients of the Phong model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhongParams {
    pub shininess: f32,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
}

impl Default for PhongParams {
    fn default() -> Self {
        CameraNode::default().into()
    }
}

impl From<CameraNode> for PhongParams {
    fn from(camera: CameraNode) -> Self {
        Self {
            shininess: camera.shininess,
            ambient: camera.ambient,
            diffuse: camera.diffuse,
            specular: camera.specular,
        }
    }
}

/// Shade a surface point.
///
/// The ambient term `LIGHT_ENERGY · ambient` scales the surface colour. The
/// diffuse and specular sums over all lights are added on top in the light
/// colour, so they tint towards grey rather than the surface colour. The
/// result is not clamped.
///
/// # Arguments
///
/// * `color` - Surface colour
/// * `point` - World-space surface point
/// * `normal` - Unit world-space surface normal
/// * `lights` - World-space light positions
/// * `camera_position` - World-space eye position
/// * `params` - Material coefficients
pub fn shade(
    color: Vec4,
    point: Vec3,
    normal: Vec3,
    lights: &[Vec3],
    camera_position: Vec3,
    params: &PhongParams,
) -> Vec4 {
    let to_camera = (camera_position - point).normalize_or_zero();

    let ambient = LIGHT_ENERGY * params.ambient;
    let mut diffuse = Vec4::ZERO;
    let mut specular = Vec4::ZERO;

    for &light in lights {
        let to_light = (light - point).normalize_or_zero();
        let n_dot_l = normal.dot(to_light);

        diffuse += LIGHT_COLOR * (LIGHT_ENERGY * n_dot_l.max(0.0));

        let reflected = (normal * (2.0 * n_dot_l) - to_light).normalize_or_zero();
        let highlight = reflected.dot(to_camera).max(0.0).powf(params.shininess);
        specular += LIGHT_COLOR * (LIGHT_ENERGY * highlight);
    }

    color * ambient + diffuse * params.diffuse + specular * params.specular
}

/// Clamp a shaded colour and convert it to opaque 8-bit RGBA.
pub fn to_rgba8(color: Vec4) -> [u8; 4] {
    let c = color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
    [c.x.round() as u8, c.y.round() as u8, c.z.round() as u8, 255]
}
