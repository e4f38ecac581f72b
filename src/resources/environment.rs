//! HDRI environment loading.
//!
//! The environment is a Radiance (`.hdr`) equirectangular panorama. It is
//! decoded on the CPU into linear float texels and box-filtered into a mip
//! chain: the sharp levels serve glossy reflections, the blurry ones rough
//! reflections and diffuse light.

use anyhow::Context as _;
use image::ImageFormat;

use crate::{
    data_structures::texture::Texture,
    resources::fetch::{Progress, load_binary_with_progress},
};

/// A decoded panorama with linear RGBA texels, row-major from the top.
#[derive(Clone, Debug, PartialEq)]
pub struct EquirectImage {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<[f32; 4]>,
}

impl EquirectImage {
    pub fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        let img = image::load_from_memory_with_format(bytes, ImageFormat::Hdr)
            .context("environment map is not a valid Radiance HDR image")?;
        let rgba = img.to_rgba32f();
        let (width, height) = rgba.dimensions();
        let texels = rgba.pixels().map(|p| p.0).collect();
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    pub fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.texels[(y * self.width + x) as usize]
    }

    /// Halves both dimensions (never below one texel) by averaging 2×2 blocks.
    pub fn downsample(&self) -> Self {
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        let mut texels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let mut sum = [0.0f32; 4];
                for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    let texel = self.texel(x * 2 + dx, y * 2 + dy);
                    sum.iter_mut().zip(texel).for_each(|(s, t)| *s += t);
                }
                texels.push(sum.map(|s| s / 4.0));
            }
        }
        Self {
            width,
            height,
            texels,
        }
    }

    /// The full mip chain, starting with a copy of `self` and ending at 1×1.
    pub fn mip_chain(&self) -> Vec<EquirectImage> {
        let mut levels = vec![self.clone()];
        while let Some(last) = levels.last() {
            if last.width == 1 && last.height == 1 {
                break;
            }
            let next = last.downsample();
            levels.push(next);
        }
        levels
    }

    pub fn mip_level_count(&self) -> u32 {
        32 - self.width.max(self.height).max(1).leading_zeros()
    }
}

/// An uploaded environment map ready to be bound for shading.
#[derive(Debug)]
pub struct Environment {
    pub texture: Texture,
    pub mip_levels: u32,
}

pub async fn load_environment(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    on_progress: impl FnMut(Progress),
) -> anyhow::Result<Environment> {
    let bytes = load_binary_with_progress(file_name, on_progress).await?;
    let image = EquirectImage::decode(&bytes)?;
    log::info!(
        "Decoded environment {} ({}x{})",
        file_name,
        image.width,
        image.height
    );
    let texture = Texture::from_equirect(device, queue, &image, file_name);
    Ok(Environment {
        texture,
        mip_levels: image.mip_level_count(),
    })
}
