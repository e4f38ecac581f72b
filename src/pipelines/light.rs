use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    camera::OPENGL_TO_WGPU_MATRIX,
    config::{hex_rgb, srgb_to_linear},
    data_structures::texture::{Texture, create_comparison_sampler},
    platform::{RenderProfile, ShadowSettings},
};

/// Colour of the ambient light.
pub const AMBIENT_COLOUR: u32 = 0x404040;
pub const KEY_LIGHT_POSITION: [f32; 3] = [2.0, 4.0, 2.0];
pub const FILL_LIGHT_POSITION: [f32; 3] = [-2.0, 2.0, -2.0];
/// Depth offset against shadow acne.
const SHADOW_BIAS: f32 = 0.002;

/// A directional light shining from `position` towards the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub position: Point3<f32>,
    pub colour: [f32; 3],
    pub intensity: f32,
}

impl DirectionalLight {
    pub fn white(position: [f32; 3], intensity: f32) -> Self {
        Self {
            position: position.into(),
            colour: [1.0; 3],
            intensity,
        }
    }

    /// Unit vector from the lit surface towards the light.
    pub fn direction(&self) -> Vector3<f32> {
        self.position.to_vec().normalize()
    }

    fn radiance(&self) -> [f32; 4] {
        let [r, g, b] = self.colour.map(|c| c * self.intensity);
        [r, g, b, 0.0]
    }
}

/// The lights of the scene, chosen by the render profile.
#[derive(Clone, Debug, PartialEq)]
pub struct LightSetup {
    pub ambient_colour: [f32; 3],
    pub ambient_intensity: f32,
    pub key: DirectionalLight,
    pub fill: Option<DirectionalLight>,
    pub shadows: Option<ShadowSettings>,
}

impl LightSetup {
    pub fn for_profile(profile: &RenderProfile) -> Self {
        Self {
            ambient_colour: hex_rgb(AMBIENT_COLOUR).map(|c| srgb_to_linear(c as f64) as f32),
            ambient_intensity: profile.ambient_intensity,
            key: DirectionalLight::white(KEY_LIGHT_POSITION, profile.key_light_intensity),
            fill: profile
                .fill_light_intensity
                .map(|intensity| DirectionalLight::white(FILL_LIGHT_POSITION, intensity)),
            shadows: profile.shadows,
        }
    }

    /// View-projection of the orthographic shadow camera sitting in the key light.
    pub fn shadow_view_proj(&self) -> Matrix4<f32> {
        let settings = self.shadows.unwrap_or_default();
        let view = Matrix4::look_at_rh(self.key.position, Point3::origin(), Vector3::unit_y());
        let e = settings.extent;
        let proj = cgmath::ortho(-e, e, -e, e, settings.near, settings.far);
        OPENGL_TO_WGPU_MATRIX * proj * view
    }
}

/// Debug views of the material system, cycled at runtime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DebugView {
    #[default]
    Shaded,
    BaseColour,
    Normals,
    MetallicRoughness,
}

impl DebugView {
    pub fn next(self) -> Self {
        match self {
            DebugView::Shaded => DebugView::BaseColour,
            DebugView::BaseColour => DebugView::Normals,
            DebugView::Normals => DebugView::MetallicRoughness,
            DebugView::MetallicRoughness => DebugView::Shaded,
        }
    }

    fn as_f32(self) -> f32 {
        match self {
            DebugView::Shaded => 0.0,
            DebugView::BaseColour => 1.0,
            DebugView::Normals => 2.0,
            DebugView::MetallicRoughness => 3.0,
        }
    }
}

/// Per-frame shading settings that are not tied to a light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadingSettings {
    pub exposure: f32,
    pub environment: bool,
    pub environment_mips: u32,
    /// The surface does not encode sRGB, the shader has to.
    pub encode_srgb: bool,
    pub debug_view: DebugView,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    ambient: [f32; 4],
    key_direction: [f32; 4],
    key_colour: [f32; 4],
    fill_direction: [f32; 4],
    fill_colour: [f32; 4],
    light_view_proj: [[f32; 4]; 4],
    // enabled, bias, texel size, unused
    shadow: [f32; 4],
    // exposure, environment enabled, encode srgb, debug view
    render: [f32; 4],
    // environment mip count, unused x3
    environment: [f32; 4],
}

impl LightUniform {
    pub fn new(lights: &LightSetup, shading: &ShadingSettings) -> Self {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        let [r, g, b] = lights.ambient_colour.map(|c| c * lights.ambient_intensity);
        let direction = |light: &DirectionalLight| light.direction().extend(0.0).into();
        let (fill_direction, fill_colour) = match &lights.fill {
            Some(fill) => (direction(fill), fill.radiance()),
            None => ([0.0, 1.0, 0.0, 0.0], [0.0; 4]),
        };
        let texel = lights.shadows.map_or(0.0, |s| 1.0 / s.map_size as f32);
        Self {
            ambient: [r, g, b, 0.0],
            key_direction: direction(&lights.key),
            key_colour: lights.key.radiance(),
            fill_direction,
            fill_colour,
            light_view_proj: lights.shadow_view_proj().into(),
            shadow: [flag(lights.shadows.is_some()), SHADOW_BIAS, texel, 0.0],
            render: [
                shading.exposure,
                flag(shading.environment),
                flag(shading.encode_srgb),
                shading.debug_view.as_f32(),
            ],
            environment: [shading.environment_mips as f32, 0.0, 0.0, 0.0],
        }
    }
}

/// Light uniform plus the shadow map, bound together at group 2.
#[derive(Debug)]
pub struct LightResources {
    pub setup: LightSetup,
    pub shading: ShadingSettings,
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub shadow_map: Texture,
    pub bind_group: wgpu::BindGroup,
}

impl LightResources {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        setup: LightSetup,
        shading: ShadingSettings,
    ) -> Self {
        let uniform = LightUniform::new(&setup, &shading);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        // Without shadows a 1x1 map keeps the bind group valid
        let map_size = setup.shadows.map_or(1, |s| s.map_size);
        let shadow_map = Texture::create_shadow_map(device, map_size);
        let shadow_sampler = create_comparison_sampler(device);
        let bind_group = mk_bind_group(device, layout, &buffer, &shadow_map, &shadow_sampler);
        Self {
            setup,
            shading,
            uniform,
            buffer,
            shadow_map,
            bind_group,
        }
    }

    pub fn write_to_buffer(&mut self, queue: &wgpu::Queue) {
        self.uniform = LightUniform::new(&self.setup, &self.shading);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Depth,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
        label: Some("light_bind_group_layout"),
    })
}

fn mk_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    shadow_map: &Texture,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&shadow_map.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some("light_bind_group"),
    })
}
