//! GPU textures for textured boxes and raytraced frames.

use std::path::Path;

use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::gpu::GpuError;

/// A sampled 2D texture.
///
/// Texels are stored as linear `Rgba8Unorm`, the same bytes the raytracer
/// writes, so sampling returns them unchanged.
#[derive(Debug)]
pub struct Texture {
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Create a texture from raw RGBA8 pixel data.
    ///
    /// # Arguments
    ///
    /// * `data` - Tightly packed rows, 4 bytes per pixel, top row first
    /// * `width`, `height` - Dimensions in pixels
    /// * `label` - Debug label shown in GPU tooling
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[u8],
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} sampler")),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    /// Load an image file.
    pub fn from_file(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
    ) -> Result<Self, GpuError> {
        let img = image::open(path)
            .map_err(|source| GpuError::Texture {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(
            device,
            queue,
            &img,
            width,
            height,
            &path.display().to_string(),
        ))
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        label: &str,
    ) -> Self {
        Self::from_rgba(device, queue, image, image.width(), image.height(), label)
    }

    /// Overwrite the texels with an image of the same size.
    ///
    /// Returns `false`, leaving the texture untouched, when the sizes differ.
    pub fn write_image(&self, queue: &wgpu::Queue, image: &RgbaImage) -> bool {
        if image.dimensions() != (self.width, self.height) {
            return false;
        }
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.width),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        true
    }
}
