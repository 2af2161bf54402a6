//! Renderer and viewer configuration.

use glam::Vec4;

use crate::phong::PhongParams;

/// Settings shared by both backends and the viewer window.
///
/// # Example
///
/// ```
/// use twinpass::RenderConfig;
///
/// let config = RenderConfig::new().title("Orbit").size(800, 600).sphere_detail(24, 12);
/// assert_eq!(config.width, 800);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Horizontal field of view of the raytracing camera, in radians.
    pub ray_fov: f32,
    /// Colour of pixels no primary ray hits.
    pub background: Vec4,
    /// Coefficients used when the scene has no camera node.
    pub phong: PhongParams,
    /// Longitudinal segments of tessellated spheres.
    pub sphere_segments: u32,
    /// Latitudinal rings of tessellated spheres.
    pub sphere_rings: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: "twinpass".to_string(),
            width: 600,
            height: 600,
            ray_fov: std::f32::consts::FRAC_PI_3,
            background: Vec4::ONE,
            phong: PhongParams::default(),
            sphere_segments: 32,
            sphere_rings: 16,
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn ray_fov(mut self, radians: f32) -> Self {
        self.ray_fov = radians;
        self
    }

    pub fn background(mut self, color: Vec4) -> Self {
        self.background = color;
        self
    }

    pub fn phong(mut self, params: PhongParams) -> Self {
        self.phong = params;
        self
    }

    /// Sphere tessellation. Values below 3 segments or 2 rings are raised
    /// to that minimum.
    pub fn sphere_detail(mut self, segments: u32, rings: u32) -> Self {
        self.sphere_segments = segments.max(3);
        self.sphere_rings = rings.max(2);
        self
    }
}
