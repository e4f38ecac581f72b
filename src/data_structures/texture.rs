//! GPU textures and texture creation utilities.
//!
//! This module provides [`Texture`], a wrapper around WGPU GPU texture resources,
//! and helper methods for creating render targets (depth, multisampled colour,
//! shadow maps), neutral 1×1 material defaults, textures decoded from image
//! data and the mip-mapped float texture used for the environment map.

use anyhow::*;
use image::{GenericImageView, ImageFormat, load_from_memory_with_format};

use crate::resources::environment::EquirectImage;

/// A GPU texture with its default view.
///
/// Textures are used for colour maps, normal maps, depth, and other data
/// bound to shaders. Samplers live with the bind groups that use them.
/// Typically created via [`from_bytes`](Self::from_bytes) or via
/// [`create_depth_texture`](Self::create_depth_texture).
#[derive(Clone, Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
    /// Format of the equirectangular environment map.
    pub const ENVIRONMENT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

    fn allocate(device: &wgpu::Device, target: Target, label: Option<&str>) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size: extent(target.width, target.height),
            mip_level_count: target.mips,
            sample_count: target.samples,
            dimension: wgpu::TextureDimension::D2,
            format: target.format,
            usage: target.usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// Copies tightly packed texels into one mip level.
    fn upload(&self, queue: &wgpu::Queue, mip_level: u32, texels: &[u8], width: u32, height: u32) {
        let bytes_per_texel = self.texture.format().block_copy_size(None).unwrap_or(4);
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            texels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * bytes_per_texel),
                rows_per_image: Some(height),
            },
            extent(width, height),
        );
    }

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// # Arguments
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `sample_count` has to match the colour target it is used with
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(
        device: &wgpu::Device,
        size: [u32; 2],
        sample_count: u32,
        label: &str,
    ) -> Self {
        let target = Target {
            samples: sample_count,
            ..Target::attachment(size, Self::DEPTH_FORMAT)
        };
        Self::allocate(device, target, Some(label))
    }

    /// Create the depth map the key light renders its shadow casters into.
    pub fn create_shadow_map(device: &wgpu::Device, size: u32) -> Self {
        let mut target = Target::attachment([size, size], Self::DEPTH_FORMAT);
        target.usage |= wgpu::TextureUsages::TEXTURE_BINDING;
        Self::allocate(device, target, Some("shadow_map"))
    }

    /// Create the multisampled colour target that is resolved into the surface.
    pub fn create_msaa_target(
        device: &wgpu::Device,
        size: [u32; 2],
        format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let target = Target {
            samples: sample_count,
            ..Target::attachment(size, format)
        };
        Self::allocate(device, target, Some("msaa_colour_target"))
    }

    /// Create a 1×1 texture of a single colour.
    ///
    /// Used in place of textures a material does not provide, e.g. white for a
    /// missing base colour map (the factor alone decides) or the neutral blue
    /// of a flat normal map.
    pub fn create_solid(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [u8; 4],
        srgb: bool,
        label: &str,
    ) -> Texture {
        let texture = Self::allocate(device, Target::sampled([1, 1], rgba8(srgb), 1), Some(label));
        texture.upload(queue, 0, &rgba, 1, 1);
        texture
    }

    /// The blue/purple-ish colour that represents an undisturbed normal.
    pub fn create_default_normal_map(device: &wgpu::Device, queue: &wgpu::Queue) -> Texture {
        Self::create_solid(device, queue, [127, 127, 255, 255], false, "default normal map")
    }

    /// Load a texture from raw byte data (image file contents).
    ///
    /// # Arguments
    ///
    /// * `bytes` represent raw image file data (PNG, JPEG, etc.)
    /// * `label` is used as a debug name for the GPU resource
    /// * `format`  is an optional file format hint (e.g., "png"). If None, auto-detect.
    /// * `srgb` selects sRGB (colour data) or linear (normals, metallic-roughness, occlusion)
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        label: &str,
        format: Option<&str>,
        srgb: bool,
    ) -> Result<Self> {
        let img = match format.and_then(ImageFormat::from_extension) {
            None => image::load_from_memory(bytes)?,
            Some(fmt) => load_from_memory_with_format(bytes, fmt)?,
        };
        Ok(Self::from_image(device, queue, &img, Some(label), srgb))
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: Option<&str>,
        srgb: bool,
    ) -> Self {
        let (width, height) = img.dimensions();
        let texture = Self::allocate(device, Target::sampled([width, height], rgba8(srgb), 1), label);
        texture.upload(queue, 0, &img.to_rgba8(), width, height);
        texture
    }

    /// Upload a decoded HDR panorama together with its mip chain.
    ///
    /// Level 0 is the full image; every further level comes from
    /// [`EquirectImage::mip_chain`]. Texels are stored as half floats so the
    /// texture stays filterable on WebGL2.
    pub fn from_equirect(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &EquirectImage,
        label: &str,
    ) -> Self {
        let levels = image.mip_chain();
        let target = Target::sampled(
            [image.width, image.height],
            Self::ENVIRONMENT_FORMAT,
            levels.len() as u32,
        );
        let texture = Self::allocate(device, target, Some(label));

        for (mip_level, level) in levels.iter().enumerate() {
            let texels: Vec<half::f16> = level
                .texels
                .iter()
                .flatten()
                .copied()
                .map(half::f16::from_f32)
                .collect();
            texture.upload(
                queue,
                mip_level as u32,
                bytemuck::cast_slice(&texels),
                level.width,
                level.height,
            );
        }
        texture
    }
}

/// Shape and usage of a texture about to be allocated.
struct Target {
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
    mips: u32,
    samples: u32,
}

impl Target {
    fn attachment(size: [u32; 2], format: wgpu::TextureFormat) -> Self {
        Self {
            width: size[0],
            height: size[1],
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            mips: 1,
            samples: 1,
        }
    }

    fn sampled(size: [u32; 2], format: wgpu::TextureFormat, mips: u32) -> Self {
        Self {
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            mips,
            ..Self::attachment(size, format)
        }
    }
}

// zero-sized textures are invalid, a minimised window still gets 1×1
fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: width.max(1),
        height: height.max(1),
        depth_or_array_layers: 1,
    }
}

fn rgba8(srgb: bool) -> wgpu::TextureFormat {
    if srgb {
        wgpu::TextureFormat::Rgba8UnormSrgb
    } else {
        wgpu::TextureFormat::Rgba8Unorm
    }
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// Sampler that compares depth instead of filtering, for percentage-closer filtering.
pub fn create_comparison_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("shadow_sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        compare: Some(wgpu::CompareFunction::LessEqual),
        ..Default::default()
    })
}

/// Wraps around horizontally and clamps at the poles of an equirectangular map.
pub fn create_environment_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("environment_sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}
