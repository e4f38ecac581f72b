//! glTF / GLB import.
//!
//! Importing happens in two steps. [`import_slice`] parses the document,
//! resolves buffers and walks the node hierarchy into flat [`MeshData`] with
//! node transforms baked into the vertices, plus [`MaterialData`] that still
//! holds encoded image bytes. [`super::upload_model`] then turns the result
//! into GPU resources.

use std::collections::HashMap;

use anyhow::{Context as _, bail};
use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3, Vector4};

use crate::{
    data_structures::model::{MaterialParams, ModelVertex},
    resources::{
        fetch::{load_binary, resolve_relative},
        mesh::{MeshData, compute_tangents},
    },
};

/// Encoded image bytes with an optional file-format hint (`png`, `jpeg`, ...).
#[derive(Clone, Debug, PartialEq)]
pub struct ImageSource {
    pub bytes: Vec<u8>,
    pub format: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialData {
    pub name: String,
    pub params: MaterialParams,
    pub base_colour: Option<ImageSource>,
    pub metallic_roughness: Option<ImageSource>,
    pub normal: Option<ImageSource>,
    pub occlusion: Option<ImageSource>,
    pub emissive: Option<ImageSource>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneData {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
}

impl SceneData {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.indices.len() / 3).sum()
    }
}

/// Parses a `.gltf` or `.glb` file already in memory.
///
/// External buffers and images are fetched relative to `file_name`.
pub async fn import_slice(bytes: &[u8], file_name: &str) -> anyhow::Result<SceneData> {
    let gltf = gltf::Gltf::from_slice(bytes).with_context(|| format!("{file_name} is not valid glTF"))?;

    // Load buffers
    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                Some(blob) => buffer_data.push(blob.into()),
                None => bail!("{file_name} references a binary chunk it does not contain"),
            },
            gltf::buffer::Source::Uri(uri) => {
                if uri.starts_with("data:") {
                    bail!("embedded data URIs are not supported ({file_name}), use a .glb file");
                }
                let bin = load_binary(&resolve_relative(file_name, uri)).await?;
                buffer_data.push(bin);
            }
        }
    }

    // Images are decoded later on the GPU side, here we only collect the bytes
    let mut images: HashMap<usize, ImageSource> = HashMap::new();
    for image in gltf.images() {
        let source = match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let buffer = &buffer_data[view.buffer().index()];
                let start = view.offset();
                let end = start + view.length();
                if end > buffer.len() {
                    bail!("image {} of {file_name} points outside its buffer", image.index());
                }
                ImageSource {
                    bytes: buffer[start..end].to_vec(),
                    format: mime_to_format(Some(mime_type)),
                }
            }
            gltf::image::Source::Uri { uri, mime_type } => {
                if uri.starts_with("data:") {
                    bail!("embedded data URIs are not supported ({file_name}), use a .glb file");
                }
                ImageSource {
                    bytes: load_binary(&resolve_relative(file_name, uri)).await?,
                    format: mime_to_format(mime_type).or_else(|| extension_of(uri)),
                }
            }
        };
        images.insert(image.index(), source);
    }

    let image_of = |texture: gltf::Texture| images.get(&texture.source().index()).cloned();

    // Load materials
    let materials = gltf
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            let params = MaterialParams {
                base_colour: pbr.base_color_factor(),
                metalness: pbr.metallic_factor(),
                roughness: pbr.roughness_factor(),
                emissive: material.emissive_factor(),
                occlusion_strength: material.occlusion_texture().map_or(1.0, |t| t.strength()),
                normal_scale: material.normal_texture().map_or(1.0, |t| t.scale()),
                ..Default::default()
            };
            MaterialData {
                name: material.name().unwrap_or("unnamed material").to_string(),
                params,
                base_colour: pbr.base_color_texture().and_then(|t| image_of(t.texture())),
                metallic_roughness: pbr
                    .metallic_roughness_texture()
                    .and_then(|t| image_of(t.texture())),
                normal: material.normal_texture().and_then(|t| image_of(t.texture())),
                occlusion: material.occlusion_texture().and_then(|t| image_of(t.texture())),
                emissive: material.emissive_texture().and_then(|t| image_of(t.texture())),
            }
        })
        .collect();

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .with_context(|| format!("{file_name} contains no scene"))?;

    let mut meshes = Vec::new();
    for node in scene.nodes() {
        collect_node(&node, Matrix4::identity(), &buffer_data, &mut meshes)
            .with_context(|| format!("cannot read meshes of {file_name}"))?;
    }
    if meshes.is_empty() {
        bail!("{file_name} contains no triangle meshes");
    }

    Ok(SceneData { meshes, materials })
}

fn collect_node(
    node: &gltf::Node,
    parent: Matrix4<f32>,
    buffers: &[Vec<u8>],
    meshes: &mut Vec<MeshData>,
) -> anyhow::Result<()> {
    let world = parent * Matrix4::from(node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping primitive {} of mesh {:?}: only triangle lists are supported",
                    primitive.index(),
                    mesh.name()
                );
                continue;
            }
            if let Some(data) = read_primitive(&primitive, mesh.name(), world, buffers)? {
                meshes.push(data);
            }
        }
    }
    for child in node.children() {
        collect_node(&child, world, buffers, meshes)?;
    }
    Ok(())
}

fn read_primitive(
    primitive: &gltf::Primitive,
    mesh_name: Option<&str>,
    world: Matrix4<f32>,
    buffers: &[Vec<u8>],
) -> anyhow::Result<Option<MeshData>> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let Some(positions) = reader.read_positions() else {
        return Ok(None);
    };
    let mut vertices: Vec<ModelVertex> = positions
        .map(|position| ModelVertex {
            position,
            ..Default::default()
        })
        .collect();

    if let Some(normals) = reader.read_normals() {
        vertices.iter_mut().zip(normals).for_each(|(v, n)| v.normal = n);
    }
    if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
        vertices.iter_mut().zip(tex_coords).for_each(|(v, t)| v.tex_coords = t);
    }

    let mut indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertices.len() as u32).collect(),
    };
    let name = mesh_name.unwrap_or("unknown_mesh");
    if indices.len() % 3 != 0 {
        bail!("mesh {name:?} has {} indices, not a whole number of triangles", indices.len());
    }
    if let Some(index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
        bail!("mesh {name:?} refers to vertex {index} but has only {}", vertices.len());
    }

    match reader.read_tangents() {
        Some(tangents) => {
            vertices.iter_mut().zip(tangents).for_each(|(v, tangent)| {
                // GLTF represents tangents as vec4 where the 4th elem can be used to calculate the bitangent
                let tangent: Vector4<f32> = tangent.into();
                let normal: Vector3<f32> = v.normal.into();
                v.tangent = tangent.truncate().into();
                v.bitangent = (normal.cross(tangent.truncate()) * tangent.w).into();
            });
        }
        None => compute_tangents(&mut vertices, &indices),
    }

    bake_transform(&mut vertices, &mut indices, world);

    Ok(Some(MeshData {
        name: name.to_string(),
        vertices,
        indices,
        material: primitive.material().index(),
    }))
}

/// Moves vertices into model space. Mirroring transforms flip the winding so
/// front faces stay counter-clockwise.
fn bake_transform(vertices: &mut [ModelVertex], indices: &mut [u32], world: Matrix4<f32>) {
    if world == Matrix4::identity() {
        return;
    }
    let linear = Matrix3::from_cols(world.x.truncate(), world.y.truncate(), world.z.truncate());
    let normal_matrix = linear.invert().map(|m| m.transpose()).unwrap_or(linear);
    let direction = |m: &Matrix3<f32>, v: [f32; 3]| -> [f32; 3] {
        let v = m * Vector3::from(v);
        if v.magnitude2() > 0.0 { v.normalize().into() } else { v.into() }
    };
    for v in vertices.iter_mut() {
        let p = world * Vector4::new(v.position[0], v.position[1], v.position[2], 1.0);
        v.position = p.truncate().into();
        v.normal = direction(&normal_matrix, v.normal);
        v.tangent = direction(&linear, v.tangent);
        v.bitangent = direction(&linear, v.bitangent);
    }
    if linear.determinant() < 0.0 {
        indices.chunks_exact_mut(3).for_each(|tri| tri.swap(1, 2));
    }
}

fn mime_to_format(mime_type: Option<&str>) -> Option<String> {
    mime_type.and_then(|mt| mt.split('/').last()).map(str::to_string)
}

fn extension_of(uri: &str) -> Option<String> {
    uri.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}
