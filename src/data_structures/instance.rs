//! Placement of the displayed model.
//!
//! The viewer shows one model at a time. Its world transform lives in a
//! one-element instance buffer that both the shadow and the PBR vertex
//! shaders read at locations 5 to 12.

use cgmath::{Matrix3, Matrix4, One, Quaternion, Rad, Rotation3, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;

use crate::data_structures::model;

/// Position, rotation and scale of the model.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Instance {
    /// At the origin, unrotated, unit scale.
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Turns the model around the world Y axis.
    pub fn rotate_y(&mut self, angle: Rad<f32>) {
        self.rotation = Quaternion::from_angle_y(angle) * self.rotation;
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        let model = self.to_matrix();
        InstanceRaw {
            model: model.into(),
            normal: Matrix3::from(self.rotation).into(),
            // mirrored placements flip the bitangent
            handedness: model.determinant().signum(),
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU layout of an [`Instance`]: model matrix, normal matrix, handedness.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
    handedness: f32,
}

impl InstanceRaw {
    // a mat4 takes four vec4 slots, the mat3 three vec3 slots
    const ATTRIBUTES: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
        9 => Float32x3,
        10 => Float32x3,
        11 => Float32x3,
        12 => Float32,
    ];
}

impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// An [`Instance`] together with the GPU buffer it is mirrored into.
#[derive(Debug)]
pub struct PlacedInstance {
    pub instance: Instance,
    pub buffer: wgpu::Buffer,
}

impl PlacedInstance {
    pub fn new(device: &wgpu::Device, instance: Instance, label: &str) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[instance.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self { instance, buffer }
    }

    pub fn write_to_buffer(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.instance.to_raw()]));
    }
}
