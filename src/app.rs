//! The interactive viewer.
//!
//! Opens a window on the demo scene and renders it every frame with either
//! backend. See [`crate::input`] for the key bindings.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;
use log::{debug, error, info, warn};
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::collect::SceneCollector;
use crate::config::RenderConfig;
use crate::gpu::{GpuContext, GpuError};
use crate::gpu_pipeline::{MeshHandle, WgpuPipeline};
use crate::input::{Backend, Command, Input};
use crate::picking::HitTester;
use crate::raster::{RasterPass, RasterSetup, Renderables};
use crate::ray::Ray;
use crate::raytracer::Raytracer;
use crate::scene::SceneError;
use crate::scene::demo::DemoScene;

/// Errors that stop the viewer.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Open the viewer and block until its window closes.
pub fn run(config: RenderConfig) -> Result<(), AppError> {
    let demo = DemoScene::build()?;
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = Viewer {
        state: ViewerState::Pending {
            config,
            demo: Some(demo),
        },
        error: None,
    };
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct Viewer {
    state: ViewerState,
    error: Option<AppError>,
}

enum ViewerState {
    Pending {
        config: RenderConfig,
        demo: Option<DemoScene>,
    },
    Running(Box<Running>),
}

struct Running {
    config: RenderConfig,
    window: Arc<Window>,
    gpu: GpuContext,
    pipeline: WgpuPipeline,
    demo: DemoScene,
    renderables: Renderables<MeshHandle>,
    setup: RasterSetup,
    pass: RasterPass,
    raytracer: Raytracer,
    collector: SceneCollector,
    hit_tester: HitTester,
    input: Input,
    backend: Backend,
    traced: Option<RgbaImage>,
    screenshots: u32,
    last_frame: Instant,
}

impl Running {
    fn start(
        event_loop: &ActiveEventLoop,
        config: RenderConfig,
        demo: DemoScene,
    ) -> Result<Self, AppError> {
        let attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(attrs)?);
        let gpu = GpuContext::new(window.clone())?;
        let pipeline = WgpuPipeline::new(&gpu);
        let collector = SceneCollector::new(gpu.width(), gpu.height(), config.ray_fov);
        info!("viewer started at {}x{}", gpu.width(), gpu.height());

        Ok(Self {
            setup: RasterSetup::new(&config),
            pass: RasterPass::new(config.phong),
            raytracer: Raytracer::new(&config),
            config,
            window,
            gpu,
            pipeline,
            demo,
            renderables: Renderables::default(),
            collector,
            hit_tester: HitTester::new(),
            input: Input::new(),
            backend: Backend::default(),
            traced: None,
            screenshots: 0,
            last_frame: Instant::now(),
        })
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::SwitchBackend(backend) => {
                if self.backend != backend {
                    info!("switching to {backend:?}");
                    self.backend = backend;
                }
            }
            Command::ToggleAnimation => {
                let active = self.demo.toggle_animation();
                info!("animation {}", if active { "on" } else { "off" });
            }
            Command::Screenshot => self.save_screenshot(),
            Command::JumpAxis(axis) => self.demo.jumper.set_axis(axis),
            Command::Steer(direction, held) => self.demo.driver.steer(direction, held),
            Command::Pick(position) => self.pick(position.x, position.y),
        }
    }

    fn pick(&mut self, x: f32, y: f32) {
        self.setup
            .run(&self.demo.graph, &mut self.pipeline, &mut self.renderables);
        self.collector.collect(&self.demo.graph);
        // Cast through the frustum of whichever backend drew the window.
        let ray = match self.backend {
            Backend::Rasterizer => Ray::from_raster_camera(
                x,
                y,
                self.gpu.width(),
                self.gpu.height(),
                &self.collector.raster_camera(),
            ),
            Backend::Raytracer => Ray::from_camera(x, y, &self.collector.ray_camera()),
        };
        match self
            .hit_tester
            .pick_ray(&mut self.demo.graph, &self.renderables, &ray)
        {
            Some(hit) => info!("picked {} at distance {:.3}", hit.node, hit.t),
            None => info!("nothing under the cursor"),
        }
    }

    fn save_screenshot(&mut self) {
        let Some(image) = &self.traced else {
            warn!("no raytraced image to save yet, press T first");
            return;
        };
        self.screenshots += 1;
        let path = PathBuf::from(format!("{}-{:03}.png", self.config.title, self.screenshots));
        match image.save(&path) {
            Ok(()) => info!("saved {}", path.display()),
            Err(err) => warn!("failed to save {}: {err}", path.display()),
        }
    }

    fn redraw(&mut self) -> Result<(), AppError> {
        let now = Instant::now();
        let dt_ms = now.duration_since(self.last_frame).as_secs_f32() * 1000.0;
        self.last_frame = now;

        self.demo.simulate(dt_ms)?;

        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                debug!("surface timeout, skipping frame");
                return Ok(());
            }
            Err(err) => return Err(GpuError::from(err).into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        match self.backend {
            Backend::Rasterizer => {
                self.collector.collect(&self.demo.graph);
                self.setup
                    .run(&self.demo.graph, &mut self.pipeline, &mut self.renderables);
                self.pass.render(
                    &self.demo.graph,
                    &mut self.pipeline,
                    &self.renderables,
                    &self.collector,
                );
                self.pipeline
                    .finish(&self.gpu, &view, self.config.background);
            }
            Backend::Raytracer => {
                let image =
                    self.raytracer
                        .render(&self.demo.graph, self.gpu.width(), self.gpu.height());
                self.pipeline.present_image(&view, &image);
                self.traced = Some(image);
            }
        }

        output.present();
        Ok(())
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let ViewerState::Pending { config, demo } = &mut self.state else {
            return;
        };
        let Some(demo) = demo.take() else {
            return;
        };
        match Running::start(event_loop, config.clone(), demo) {
            Ok(running) => self.state = ViewerState::Running(Box::new(running)),
            Err(err) => {
                error!("{err}");
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let ViewerState::Running(running) = &mut self.state else {
            return;
        };

        if let Some(command) = running.input.handle_event(&event) {
            running.apply(command);
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                running.gpu.resize(size.width, size.height);
                running.collector.resize(running.gpu.width(), running.gpu.height());
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = running.redraw() {
                    error!("{err}");
                    self.error = Some(err);
                    event_loop.exit();
                    return;
                }
                running.window.request_redraw();
            }
            _ => {}
        }
    }
}
