use cgmath::{Vector2, Vector3};
use wgpu::util::DeviceExt;

use crate::data_structures::model;

/// Geometry of one mesh on the CPU, before it is uploaded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<model::ModelVertex>,
    pub indices: Vec<u32>,
    /// Index into the material list of the model, `None` for the default material.
    pub material: Option<usize>,
}

impl MeshData {
    pub fn upload(&self, device: &wgpu::Device, material: usize) -> model::Mesh {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", self.name)),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", self.name)),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        model::Mesh {
            name: self.name.clone(),
            vertex_buffer,
            index_buffer,
            num_elements: self.indices.len() as u32,
            material,
        }
    }
}

/// Fills in per-vertex tangents and bitangents from positions and UVs, for
/// meshes that ship without tangents. Each vertex gets the average over the
/// triangles it belongs to; triangles with degenerate UVs are skipped.
pub fn compute_tangents(vertices: &mut [model::ModelVertex], indices: &[u32]) {
    let mut shared_by = vec![0u32; vertices.len()];

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| vertices[i as usize]);
        let edge1 = Vector3::from(b.position) - Vector3::from(a.position);
        let edge2 = Vector3::from(c.position) - Vector3::from(a.position);
        let duv1 = Vector2::from(b.tex_coords) - Vector2::from(a.tex_coords);
        let duv2 = Vector2::from(c.tex_coords) - Vector2::from(a.tex_coords);

        //     edge1 = duv1.x * T + duv1.y * B
        //     edge2 = duv2.x * T + duv2.y * B
        let det = duv1.x * duv2.y - duv1.y * duv2.x;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (edge1 * duv2.y - edge2 * duv1.y) * r;
        // negated: texture v grows downwards in wgpu
        let bitangent = (edge2 * duv1.x - edge1 * duv2.x) * -r;

        for &i in tri {
            let v = &mut vertices[i as usize];
            v.tangent = (Vector3::from(v.tangent) + tangent).into();
            v.bitangent = (Vector3::from(v.bitangent) + bitangent).into();
            shared_by[i as usize] += 1;
        }
    }

    for (v, n) in vertices.iter_mut().zip(shared_by) {
        if n > 1 {
            let scale = 1.0 / n as f32;
            v.tangent = (Vector3::from(v.tangent) * scale).into();
            v.bitangent = (Vector3::from(v.bitangent) * scale).into();
        }
    }
}

/// An axis-aligned box centred on the origin, four vertices per face so every
/// face gets its own flat normal.
pub fn cuboid(name: &str, width: f32, height: f32, depth: f32) -> MeshData {
    let (hx, hy, hz) = (width / 2.0, height / 2.0, depth / 2.0);
    // normal, right (u direction), up (v direction) per face
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, right, up) in faces {
        let base = vertices.len() as u32;
        for (u, v) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            let su = u * 2.0 - 1.0;
            let sv = v * 2.0 - 1.0;
            let position = [
                (normal[0] + right[0] * su + up[0] * sv) * hx,
                (normal[1] + right[1] * su + up[1] * sv) * hy,
                (normal[2] + right[2] * su + up[2] * sv) * hz,
            ];
            vertices.push(model::ModelVertex {
                position,
                // v grows downwards in texture space
                tex_coords: [u, 1.0 - v],
                normal,
                tangent: right,
                bitangent: up,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData {
        name: name.to_string(),
        vertices,
        indices,
        material: Some(0),
    }
}
