use crate::{
    data_structures::texture::{Texture, create_environment_sampler},
    resources::environment::Environment,
};

/// The environment map bound at group 3, or a black stand-in until one is loaded.
#[derive(Debug)]
pub struct EnvironmentResources {
    pub environment: Option<Environment>,
    placeholder: Option<Texture>,
    sampler: wgpu::Sampler,
    pub bind_group: wgpu::BindGroup,
}

impl EnvironmentResources {
    pub fn empty(device: &wgpu::Device, queue: &wgpu::Queue, layout: &wgpu::BindGroupLayout) -> Self {
        let placeholder = Texture::create_solid(device, queue, [0, 0, 0, 255], false, "no environment");
        let sampler = create_environment_sampler(device);
        let bind_group = mk_bind_group(device, layout, &placeholder.view, &sampler);
        Self {
            environment: None,
            placeholder: Some(placeholder),
            sampler,
            bind_group,
        }
    }

    pub fn set(&mut self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout, environment: Environment) {
        self.bind_group = mk_bind_group(device, layout, &environment.texture.view, &self.sampler);
        self.environment = Some(environment);
        self.placeholder = None;
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("environment_bind_group_layout"),
    })
}

fn mk_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some("environment_bind_group"),
    })
}
