use glam::Mat4;
use log::{debug, warn};

use crate::collect::SceneCollector;
use crate::phong::PhongParams;
use crate::raster::{MAX_LIGHTS, Program, Renderables, ShadingPipeline, Uniform};
use crate::scene::{Node, NodeId, SceneGraph};
use crate::traversal::{Frame, Visitor};

/// Draws every primitive that has a renderable.
#[derive(Clone, Copy, Debug, Default)]
pub struct RasterPass {
    /// Coefficients used when the scene has no camera node.
    pub phong: PhongParams,
}

impl RasterPass {
    pub fn new(phong: PhongParams) -> Self {
        Self { phong }
    }

    /// Render one frame.
    ///
    /// `collector` must already hold this frame's lights and camera. Frame
    /// uniforms are uploaded to both programs first, then each leaf gets
    /// its `M`, `N`, `V` and `P` before its draw.
    ///
    /// Returns the number of draws issued.
    pub fn render<P: ShadingPipeline>(
        &self,
        graph: &SceneGraph,
        pipeline: &mut P,
        renderables: &Renderables<P::Mesh>,
        collector: &SceneCollector,
    ) -> usize {
        let camera = collector.raster_camera();
        let view = camera.view_matrix();
        let projection = camera.projection_matrix();
        let params = collector
            .coefficients()
            .map(PhongParams::from)
            .unwrap_or(self.phong);

        let lights = collector.lights();
        if lights.len() > MAX_LIGHTS {
            warn!(
                "{} lights in scene, only the first {MAX_LIGHTS} are rasterized",
                lights.len()
            );
        }
        let lights = &lights[..lights.len().min(MAX_LIGHTS)];

        for program in Program::ALL {
            pipeline.use_program(program);
            for (i, &light) in lights.iter().enumerate() {
                pipeline.set_vec3(Uniform::LightSource(i), light);
            }
            pipeline.set_int(Uniform::LightCount, lights.len() as i32);
            pipeline.set_float(Uniform::Ambient, params.ambient);
            pipeline.set_float(Uniform::Diffuse, params.diffuse);
            pipeline.set_float(Uniform::Specular, params.specular);
            pipeline.set_float(Uniform::Shininess, params.shininess);
            pipeline.set_vec3(Uniform::CameraPosition, camera.eye);
            pipeline.set_matrix(Uniform::View, view);
            pipeline.set_matrix(Uniform::Projection, projection);
        }

        let mut pass = DrawPass {
            pipeline,
            renderables,
            view,
            projection,
            program: None,
            draws: 0,
        };
        graph.walk(&mut pass);

        debug!("raster pass: {} draws", pass.draws);
        pass.draws
    }
}

struct DrawPass<'a, P: ShadingPipeline> {
    pipeline: &'a mut P,
    renderables: &'a Renderables<P::Mesh>,
    view: Mat4,
    projection: Mat4,
    program: Option<Program>,
    draws: usize,
}

impl<P: ShadingPipeline> Visitor for DrawPass<'_, P> {
    fn visit(&mut self, id: NodeId, node: &Node, frame: &Frame) {
        let Some(renderable) = self.renderables.get(&id) else {
            return;
        };
        let program = match node {
            Node::TextureBox(_) => Program::Texture,
            _ => Program::Phong,
        };
        if self.program != Some(program) {
            self.pipeline.use_program(program);
            self.program = Some(program);
        }
        self.pipeline.set_matrix(Uniform::Model, frame.matrix);
        self.pipeline.set_matrix(Uniform::Normal, frame.normal_matrix());
        self.pipeline.set_matrix(Uniform::View, self.view);
        self.pipeline.set_matrix(Uniform::Projection, self.projection);
        self.pipeline.draw(&renderable.mesh);
        self.draws += 1;
    }
}
