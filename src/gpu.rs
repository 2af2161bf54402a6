//! wgpu device and window surface.
//!
//! [`GpuContext`] owns the wgpu surface, device and queue for the viewer
//! window. It is created once at startup and passed by reference to the
//! presentation code; the shading pipeline keeps its own clones of the
//! device and queue handles.
//!
//! # Example
//!
//! ```no_run
//! # fn demo(window: std::sync::Arc<winit::window::Window>) -> Result<(), twinpass::gpu::GpuError> {
//! use twinpass::gpu::GpuContext;
//!
//! let mut gpu = GpuContext::new(window)?;
//! gpu.resize(800, 600);
//! assert_eq!(gpu.aspect(), 800.0 / 600.0);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use log::info;
use thiserror::Error;
use winit::window::Window;

/// Errors raised while setting up or using the GPU.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface supports no formats on this adapter")]
    NoSurfaceFormat,
    #[error("failed to acquire frame: {0}")]
    Frame(#[from] wgpu::SurfaceError),
    #[error("failed to load texture {path}: {source}")]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Window surface plus the device that draws into it.
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Surface format and size. `width`/`height` track the window.
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Open the window's surface on the first suitable adapter.
    ///
    /// The surface is configured with a linear (non-sRGB) format when the
    /// adapter offers one, so shaded colours reach the screen unchanged and
    /// raster output matches raytraced images byte for byte.
    pub fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;
        info!("using adapter {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("twinpass device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    /// Follow a window resize. A minimized window reports zero size and is
    /// ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure the surface after it was lost or became outdated.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }
}
