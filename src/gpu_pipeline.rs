//! wgpu implementation of [`ShadingPipeline`].
//!
//! The raster passes issue uniform updates and draws one call at a time, the
//! way a GL program would receive them. [`WgpuPipeline`] records those calls
//! into a per-frame draw list and encodes the whole list into a single render
//! pass in [`finish`](WgpuPipeline::finish):
//!
//! - frame uniforms (view, projection, lights, Phong coefficients) go into
//!   one uniform buffer per [`Program`]
//! - per-draw model and normal matrices go into one buffer addressed with
//!   dynamic offsets
//! - textured meshes carry their own diffuse/normal map bind group
//!
//! Projection matrices arrive with OpenGL's `[-1, 1]` clip depth and are
//! remapped to wgpu's `[0, 1]` before upload.
//!
//! The same type also presents raytraced images with a full-screen blit.

use std::collections::HashMap;

use glam::{Mat4, Vec3, Vec4};
use image::RgbaImage;
use log::{debug, trace};
use wgpu::util::DeviceExt;

use crate::geometry::{Geometry, Vertex};
use crate::gpu::{GpuContext, GpuError};
use crate::raster::{MAX_LIGHTS, Program, ShadingPipeline, Uniform};
use crate::texture::Texture;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Maps OpenGL clip depth `[-w, w]` onto wgpu's `[0, w]`.
pub const GL_TO_WGPU_DEPTH: Mat4 = Mat4::from_cols(
    Vec4::X,
    Vec4::Y,
    Vec4::new(0.0, 0.0, 0.5, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 1.0),
);

/// Projection matrix as uploaded to the shaders.
pub fn wgpu_projection(gl_projection: Mat4) -> Mat4 {
    GL_TO_WGPU_DEPTH * gl_projection
}

/// Vertex as laid out in GPU memory.
///
/// Each vertex occupies 72 bytes: position, RGBA colour, normal, uv,
/// tangent and bitangent.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RasterVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl RasterVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<RasterVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // color
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x4,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 28,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 40,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32x2,
            },
            // tangent
            wgpu::VertexAttribute {
                offset: 48,
                shader_location: 4,
                format: wgpu::VertexFormat::Float32x3,
            },
            // bitangent
            wgpu::VertexAttribute {
                offset: 60,
                shader_location: 5,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    };
}

impl From<&Vertex> for RasterVertex {
    fn from(v: &Vertex) -> Self {
        Self {
            position: v.position.to_array(),
            color: v.color.to_array(),
            normal: v.normal.to_array(),
            uv: v.uv.to_array(),
            tangent: v.tangent.to_array(),
            bitangent: v.bitangent.to_array(),
        }
    }
}

/// Per-frame uniforms of one program. Matches `Frame` in `phong.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub lights: [[f32; 4]; MAX_LIGHTS],
    pub light_count: u32,
    pub ka: f32,
    pub kd: f32,
    pub ks: f32,
    pub shininess: f32,
    pub _pad: [f32; 3],
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY.to_cols_array_2d(),
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            camera_position: [0.0, 0.0, 0.0, 1.0],
            lights: [[0.0; 4]; MAX_LIGHTS],
            light_count: 0,
            ka: 0.0,
            kd: 0.0,
            ks: 0.0,
            shininess: 1.0,
            _pad: [0.0; 3],
        }
    }
}

impl FrameUniforms {
    fn set_matrix(&mut self, uniform: Uniform, value: Mat4) -> bool {
        match uniform {
            Uniform::View => self.view = value.to_cols_array_2d(),
            Uniform::Projection => {
                self.projection = wgpu_projection(value).to_cols_array_2d();
            }
            _ => return false,
        }
        true
    }

    fn set_vec3(&mut self, uniform: Uniform, value: Vec3) -> bool {
        match uniform {
            Uniform::CameraPosition => self.camera_position = value.extend(1.0).to_array(),
            Uniform::LightSource(i) if i < MAX_LIGHTS => {
                self.lights[i] = value.extend(1.0).to_array();
            }
            _ => return false,
        }
        true
    }

    fn set_float(&mut self, uniform: Uniform, value: f32) -> bool {
        match uniform {
            Uniform::Ambient => self.ka = value,
            Uniform::Diffuse => self.kd = value,
            Uniform::Specular => self.ks = value,
            Uniform::Shininess => self.shininess = value,
            _ => return false,
        }
        true
    }

    fn set_int(&mut self, uniform: Uniform, value: i32) -> bool {
        match uniform {
            Uniform::LightCount => {
                self.light_count = value.clamp(0, MAX_LIGHTS as i32) as u32;
            }
            _ => return false,
        }
        true
    }
}

/// Per-draw uniforms. Matches `Model` in `phong.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniforms {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl Default for ModelUniforms {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            normal: Mat4::IDENTITY.to_cols_array_2d(),
        }
    }
}

/// Handle to a mesh uploaded through [`WgpuPipeline`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(usize);

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    textures: Option<wgpu::BindGroup>,
}

struct QueuedDraw {
    mesh: MeshHandle,
    program: Program,
    model: ModelUniforms,
}

struct ProgramState {
    pipeline: wgpu::RenderPipeline,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    uniforms: FrameUniforms,
}

/// Renders through wgpu.
pub struct WgpuPipeline {
    device: wgpu::Device,
    queue: wgpu::Queue,
    programs: HashMap<Program, ProgramState>,
    current: Program,
    model: ModelUniforms,
    draws: Vec<QueuedDraw>,
    meshes: Vec<GpuMesh>,
    model_layout: wgpu::BindGroupLayout,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    model_capacity: usize,
    model_stride: u64,
    texture_layout: wgpu::BindGroupLayout,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
    blit_pipeline: wgpu::RenderPipeline,
    blit_layout: wgpu::BindGroupLayout,
    blit_sampler: wgpu::Sampler,
    frame_texture: Option<Texture>,
}

impl WgpuPipeline {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Phong Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/phong.wgsl").into()),
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ModelUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture Bind Group Layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let phong_layouts = [&frame_layout, &model_layout];
        let texture_layouts = [&frame_layout, &model_layout, &texture_layout];
        let mut programs = HashMap::new();
        for program in Program::ALL {
            let (entry_point, layouts): (&str, &[&wgpu::BindGroupLayout]) = match program {
                Program::Phong => ("fs_phong", &phong_layouts),
                Program::Texture => ("fs_texture", &texture_layouts),
            };
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{program:?} Pipeline Layout")),
                bind_group_layouts: layouts,
                push_constant_ranges: &[],
            });
            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&format!("{program:?} Pipeline")),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs"),
                    buffers: &[RasterVertex::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry_point),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

            let uniforms = FrameUniforms::default();
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{program:?} Frame Uniforms")),
                contents: bytemuck::cast_slice(&[uniforms]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{program:?} Frame Bind Group")),
                layout: &frame_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            programs.insert(
                program,
                ProgramState {
                    pipeline,
                    buffer,
                    bind_group,
                    uniforms,
                },
            );
        }

        let model_stride = wgpu::util::align_to(
            std::mem::size_of::<ModelUniforms>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let model_capacity = 64;
        let (model_buffer, model_bind_group) =
            Self::create_model_buffer(device, &model_layout, model_stride, model_capacity);

        let depth_view = Self::create_depth_view(device, gpu.width(), gpu.height());

        let blit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });
        let blit_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Blit Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let blit_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blit Bind Group Layout"),
            entries: &[
                texture_entry(0),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let blit_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Blit Pipeline Layout"),
            bind_group_layouts: &[&blit_layout],
            push_constant_ranges: &[],
        });
        let blit_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Blit Pipeline"),
            layout: Some(&blit_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &blit_shader,
                entry_point: Some("vs"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &blit_shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            device: gpu.device.clone(),
            queue: gpu.queue.clone(),
            programs,
            current: Program::Phong,
            model: ModelUniforms::default(),
            draws: Vec::new(),
            meshes: Vec::new(),
            model_layout,
            model_buffer,
            model_bind_group,
            model_capacity,
            model_stride,
            texture_layout,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
            blit_pipeline,
            blit_layout,
            blit_sampler,
            frame_texture: None,
        }
    }

    fn create_model_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Model Uniforms"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<ModelUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn ensure_depth_size(&mut self, width: u32, height: u32) {
        if self.depth_size != (width, height) {
            self.depth_view = Self::create_depth_view(&self.device, width, height);
            self.depth_size = (width, height);
        }
    }

    fn ensure_model_capacity(&mut self, draws: usize) {
        if draws <= self.model_capacity {
            return;
        }
        let capacity = draws.next_power_of_two();
        let (buffer, bind_group) =
            Self::create_model_buffer(&self.device, &self.model_layout, self.model_stride, capacity);
        self.model_buffer = buffer;
        self.model_bind_group = bind_group;
        self.model_capacity = capacity;
        debug!("model uniform buffer grown to {capacity} draws");
    }

    /// Number of draws recorded since the last [`finish`](Self::finish).
    pub fn queued(&self) -> usize {
        self.draws.len()
    }

    /// Encode every recorded draw into one render pass on `target`, submit
    /// it, and clear the draw list.
    pub fn finish(&mut self, gpu: &GpuContext, target: &wgpu::TextureView, clear: Vec4) {
        self.ensure_depth_size(gpu.width(), gpu.height());
        self.ensure_model_capacity(self.draws.len());

        for state in self.programs.values() {
            self.queue
                .write_buffer(&state.buffer, 0, bytemuck::cast_slice(&[state.uniforms]));
        }
        for (i, draw) in self.draws.iter().enumerate() {
            self.queue.write_buffer(
                &self.model_buffer,
                i as u64 * self.model_stride,
                bytemuck::cast_slice(&[draw.model]),
            );
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Raster Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Raster Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.x as f64,
                            g: clear.y as f64,
                            b: clear.z as f64,
                            a: clear.w as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut bound = None;
            for (i, draw) in self.draws.iter().enumerate() {
                let Some(mesh) = self.meshes.get(draw.mesh.0) else {
                    continue;
                };
                let Some(state) = self.programs.get(&draw.program) else {
                    continue;
                };
                if bound != Some(draw.program) {
                    pass.set_pipeline(&state.pipeline);
                    pass.set_bind_group(0, &state.bind_group, &[]);
                    bound = Some(draw.program);
                }
                let offset = (i as u64 * self.model_stride) as u32;
                pass.set_bind_group(1, &self.model_bind_group, &[offset]);
                if draw.program == Program::Texture {
                    let Some(textures) = &mesh.textures else {
                        continue;
                    };
                    pass.set_bind_group(2, textures, &[]);
                }
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.draw(0..mesh.vertex_count, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        trace!("submitted {} draws", self.draws.len());
        self.draws.clear();
    }

    /// Draw `image` over the whole of `target`.
    pub fn present_image(&mut self, target: &wgpu::TextureView, image: &RgbaImage) {
        let reuse = self
            .frame_texture
            .as_ref()
            .is_some_and(|texture| texture.write_image(&self.queue, image));
        if !reuse {
            self.frame_texture = Some(Texture::from_image(
                &self.device,
                &self.queue,
                image,
                "Raytraced Frame",
            ));
        }
        let Some(texture) = &self.frame_texture else {
            return;
        };

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Blit Bind Group"),
            layout: &self.blit_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.blit_sampler),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Blit Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blit Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.blit_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn load_textures(&self, geometry: &Geometry) -> Result<Option<wgpu::BindGroup>, GpuError> {
        let Some(maps) = &geometry.textures else {
            return Ok(None);
        };
        let diffuse = Texture::from_file(&self.device, &self.queue, &maps.diffuse)?;
        let normal = Texture::from_file(&self.device, &self.queue, &maps.normal)?;
        Ok(Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Texture Bind Group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&normal.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&diffuse.sampler),
                },
            ],
        })))
    }

    fn frame_uniforms(&mut self) -> Option<&mut FrameUniforms> {
        self.programs
            .get_mut(&self.current)
            .map(|state| &mut state.uniforms)
    }

    fn ignored(&self, uniform: Uniform) {
        debug!(
            "{:?} program has no slot {} of that type",
            self.current,
            uniform.name()
        );
    }
}

impl ShadingPipeline for WgpuPipeline {
    type Mesh = MeshHandle;
    type Error = GpuError;

    fn create_mesh(&mut self, geometry: &Geometry) -> Result<MeshHandle, GpuError> {
        let textures = self.load_textures(geometry)?;
        let vertices: Vec<RasterVertex> = geometry.vertices.iter().map(RasterVertex::from).collect();
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.meshes.push(GpuMesh {
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            textures,
        });
        Ok(MeshHandle(self.meshes.len() - 1))
    }

    fn use_program(&mut self, program: Program) {
        self.current = program;
    }

    fn set_matrix(&mut self, uniform: Uniform, value: Mat4) {
        match uniform {
            Uniform::Model => self.model.model = value.to_cols_array_2d(),
            Uniform::Normal => self.model.normal = value.to_cols_array_2d(),
            _ => {
                if !self.frame_uniforms().is_some_and(|f| f.set_matrix(uniform, value)) {
                    self.ignored(uniform);
                }
            }
        }
    }

    fn set_vec3(&mut self, uniform: Uniform, value: Vec3) {
        if !self.frame_uniforms().is_some_and(|f| f.set_vec3(uniform, value)) {
            self.ignored(uniform);
        }
    }

    fn set_float(&mut self, uniform: Uniform, value: f32) {
        if !self.frame_uniforms().is_some_and(|f| f.set_float(uniform, value)) {
            self.ignored(uniform);
        }
    }

    fn set_int(&mut self, uniform: Uniform, value: i32) {
        if !self.frame_uniforms().is_some_and(|f| f.set_int(uniform, value)) {
            self.ignored(uniform);
        }
    }

    fn draw(&mut self, mesh: &MeshHandle) {
        self.draws.push(QueuedDraw {
            mesh: *mesh,
            program: self.current,
            model: self.model,
        });
    }
}
