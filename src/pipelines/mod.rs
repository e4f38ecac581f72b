//! Render pipelines and the bind group layouts they share.

pub mod environment;
pub mod light;
pub mod pbr;
pub mod shadow;

/// Bind group layouts, created once per device.
#[derive(Debug)]
pub struct Layouts {
    pub material: wgpu::BindGroupLayout,
    pub camera: wgpu::BindGroupLayout,
    pub light: wgpu::BindGroupLayout,
    pub environment: wgpu::BindGroupLayout,
    pub light_space: wgpu::BindGroupLayout,
}

impl Layouts {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            material: pbr::mk_material_layout(device),
            camera: mk_camera_layout(device),
            light: light::mk_bind_group_layout(device),
            environment: environment::mk_bind_group_layout(device),
            light_space: shadow::mk_bind_group_layout(device),
        }
    }
}

#[derive(Debug)]
pub struct Pipelines {
    pub pbr: wgpu::RenderPipeline,
    pub shadow: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        layouts: &Layouts,
        color_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        Self {
            pbr: pbr::mk_pbr_pipeline(
                device,
                color_format,
                sample_count,
                &layouts.material,
                &layouts.camera,
                &layouts.light,
                &layouts.environment,
            ),
            shadow: shadow::mk_shadow_pipeline(device, &layouts.light_space),
        }
    }
}

fn mk_camera_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
        label: Some("camera_bind_group_layout"),
    })
}
