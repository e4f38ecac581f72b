//! Meshes, PBR materials and the draw helpers for them.
//!
//! A [`Model`] owns GPU buffers for its meshes and one bind group per
//! material. Materials follow the glTF metallic-roughness model; the fallback
//! cube uses the same pipeline with the `lambert` switch turned on.

use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::{data_structures::texture::Texture, platform::MaterialTuning};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 11]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// CPU-side description of a material, before and after platform tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialParams {
    pub base_colour: [f32; 4],
    pub metalness: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    pub occlusion_strength: f32,
    pub normal_scale: f32,
    /// Scales the contribution of the environment map.
    pub env_intensity: f32,
    /// Diffuse-only shading without reflections.
    pub lambert: bool,
    pub receive_shadows: bool,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            base_colour: [1.0; 4],
            metalness: 1.0,
            roughness: 1.0,
            emissive: [0.0; 3],
            occlusion_strength: 1.0,
            normal_scale: 1.0,
            env_intensity: 1.0,
            lambert: false,
            receive_shadows: true,
        }
    }
}

impl MaterialParams {
    /// A matte, reflection-free material of the given linear colour.
    pub fn lambert(colour: [f32; 3]) -> Self {
        Self {
            base_colour: [colour[0], colour[1], colour[2], 1.0],
            metalness: 0.0,
            roughness: 1.0,
            env_intensity: 0.0,
            lambert: true,
            ..Default::default()
        }
    }

    /// Applies the mobile overrides.
    ///
    /// A metalness of zero stays zero, a roughness of zero is treated as unset
    /// and becomes 0.5 before clamping.
    pub fn tuned(mut self, tuning: &MaterialTuning) -> Self {
        self.env_intensity = tuning.env_intensity;
        if !self.lambert {
            self.metalness = self.metalness.min(tuning.max_metalness);
            let roughness = if self.roughness == 0.0 { 0.5 } else { self.roughness };
            self.roughness = roughness.max(tuning.min_roughness);
        }
        self
    }
}

/**
 * The material uniform as laid out in `pbr.wgsl`. Everything is packed into
 * vec4s to satisfy the 16 byte alignment of uniform buffers.
 */
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    base_colour: [f32; 4],
    // rgb = emissive factor, a = occlusion strength
    emissive: [f32; 4],
    // metalness, roughness, env intensity, normal scale
    params: [f32; 4],
    // lambert, receive shadows, unused, unused
    flags: [f32; 4],
}

impl From<&MaterialParams> for MaterialUniform {
    fn from(p: &MaterialParams) -> Self {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        Self {
            base_colour: p.base_colour,
            emissive: [p.emissive[0], p.emissive[1], p.emissive[2], p.occlusion_strength],
            params: [p.metalness, p.roughness, p.env_intensity, p.normal_scale],
            flags: [flag(p.lambert), flag(p.receive_shadows), 0.0, 0.0],
        }
    }
}

/// The textures of a PBR material. Absent maps are replaced by neutral 1×1 textures.
#[derive(Debug)]
pub struct MaterialTextures {
    pub base_colour: Texture,
    pub metallic_roughness: Texture,
    pub normal: Texture,
    pub occlusion: Texture,
    pub emissive: Texture,
}

impl MaterialTextures {
    pub fn neutral(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let white = |srgb: bool, label: &str| Texture::create_solid(device, queue, [255; 4], srgb, label);
        Self {
            base_colour: white(true, "default base colour"),
            metallic_roughness: white(false, "default metallic roughness"),
            normal: Texture::create_default_normal_map(device, queue),
            occlusion: white(false, "default occlusion"),
            emissive: white(true, "default emissive"),
        }
    }
}

#[derive(Debug)]
pub struct Material {
    pub name: String,
    pub params: MaterialParams,
    pub textures: MaterialTextures,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        textures: MaterialTextures,
        params: MaterialParams,
        sampler: &wgpu::Sampler,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} material uniform")),
            contents: bytemuck::cast_slice(&[MaterialUniform::from(&params)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&textures.base_colour.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&textures.metallic_roughness.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&textures.normal.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&textures.occlusion.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(&textures.emissive.view),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: buffer.as_entire_binding(),
                },
            ],
            label: Some(name),
        });

        Self {
            name: name.to_string(),
            params,
            textures,
            buffer,
            bind_group,
        }
    }

    pub fn set_params(&mut self, queue: &wgpu::Queue, params: MaterialParams) {
        self.params = params;
        queue.write_buffer(
            &self.buffer,
            0,
            bytemuck::cast_slice(&[MaterialUniform::from(&self.params)]),
        );
    }
}

#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: usize,
}

#[derive(Debug)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub casts_shadow: bool,
}

impl Model {
    /// Applies `tuning` to every material and pushes the result to the GPU.
    pub fn tune_materials(&mut self, queue: &wgpu::Queue, tuning: &MaterialTuning) {
        for material in self.materials.iter_mut() {
            let tuned = material.params.tuned(tuning);
            material.set_params(queue, tuned);
        }
    }

    pub fn set_receive_shadows(&mut self, queue: &wgpu::Queue, receive: bool) {
        for material in self.materials.iter_mut() {
            let params = MaterialParams {
                receive_shadows: receive,
                ..material.params
            };
            material.set_params(queue, params);
        }
    }
}

pub trait DrawModel<'a> {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'a Mesh,
        material: &'a Material,
        instances: Range<u32>,
    );

    fn draw_model_instanced(&mut self, model: &'a Model, instances: Range<u32>);

    /// Geometry only, for depth passes that bind no material.
    fn draw_model_geometry(&mut self, model: &'a Model, instances: Range<u32>);
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'b Mesh,
        material: &'b Material,
        instances: Range<u32>,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &material.bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }

    fn draw_model_instanced(&mut self, model: &'b Model, instances: Range<u32>) {
        for mesh in &model.meshes {
            let material = &model.materials[mesh.material];
            self.draw_mesh_instanced(mesh, material, instances.clone());
        }
    }

    fn draw_model_geometry(&mut self, model: &'b Model, instances: Range<u32>) {
        for mesh in &model.meshes {
            self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            self.draw_indexed(0..mesh.num_elements, 0, instances.clone());
        }
    }
}
