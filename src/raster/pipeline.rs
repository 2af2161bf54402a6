//! The shading sink both raster passes talk to.

use glam::{Mat4, Vec3};

use crate::geometry::Geometry;

/// Lights beyond this count are not uploaded.
pub const MAX_LIGHTS: usize = 8;

/// Shader program selected before a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Program {
    /// Vertex colours with Phong lighting.
    Phong,
    /// Diffuse texture and normal map with Phong lighting.
    Texture,
}

impl Program {
    pub const ALL: [Program; 2] = [Program::Phong, Program::Texture];
}

/// Named uniform slots of the shading programs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Uniform {
    /// Model matrix `M`.
    Model,
    /// Normal matrix `N`.
    Normal,
    /// View matrix `V`.
    View,
    /// Projection matrix `P`, OpenGL clip conventions.
    Projection,
    CameraPosition,
    /// World-space position of the light at this index.
    LightSource(usize),
    LightCount,
    Ambient,
    Diffuse,
    Specular,
    Shininess,
}

impl Uniform {
    /// Name of the slot in shader source.
    pub fn name(&self) -> String {
        match self {
            Uniform::Model => "M".to_string(),
            Uniform::Normal => "N".to_string(),
            Uniform::View => "V".to_string(),
            Uniform::Projection => "P".to_string(),
            Uniform::CameraPosition => "camera_position".to_string(),
            Uniform::LightSource(i) => format!("lights[{i}]"),
            Uniform::LightCount => "light_count".to_string(),
            Uniform::Ambient => "ka".to_string(),
            Uniform::Diffuse => "kd".to_string(),
            Uniform::Specular => "ks".to_string(),
            Uniform::Shininess => "shininess".to_string(),
        }
    }
}

/// Destination of the rasterizer's uploads and draw calls.
///
/// Uniform values persist per program until overwritten, the way GPU
/// program state does. Setters address the program chosen by the last
/// [`use_program`](Self::use_program).
pub trait ShadingPipeline {
    /// Handle to uploaded vertex data.
    type Mesh;
    type Error: std::fmt::Display;

    /// Upload a triangle list, loading any textures it references.
    fn create_mesh(&mut self, geometry: &Geometry) -> Result<Self::Mesh, Self::Error>;

    fn use_program(&mut self, program: Program);

    fn set_matrix(&mut self, uniform: Uniform, value: Mat4);

    fn set_vec3(&mut self, uniform: Uniform, value: Vec3);

    fn set_float(&mut self, uniform: Uniform, value: f32);

    fn set_int(&mut self, uniform: Uniform, value: i32);

    /// Draw `mesh` with the current program and uniform values.
    fn draw(&mut self, mesh: &Self::Mesh);
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_names_index_lights() {
        assert_eq!(Uniform::LightSource(3).name(), "lights[3]");
        assert_eq!(Uniform::Normal.name(), "N");
    }
}
