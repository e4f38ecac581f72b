use anyhow::Context as _;

use crate::{
    config::{hex_rgb, srgb_to_linear},
    data_structures::{
        model::{self, MaterialParams, MaterialTextures},
        texture::{Texture, create_default_sampler},
    },
    resources::{
        fetch::{Progress, load_binary_with_progress},
        gltf_import::{ImageSource, SceneData, import_slice},
        mesh::cuboid,
    },
};

/**
 * This module contains all logic for loading meshes, materials and the
 * environment map from external files.
 */
pub mod environment;
pub mod fetch;
pub mod gltf_import;
pub mod mesh;

/// Colour of the cube shown when the model cannot be loaded.
pub const FALLBACK_COLOUR: u32 = 0x00ff00;

/// Fetches, parses and uploads a glTF/GLB model.
pub async fn load_model_gltf(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    material_layout: &wgpu::BindGroupLayout,
    on_progress: impl FnMut(Progress),
) -> anyhow::Result<model::Model> {
    let bytes = load_binary_with_progress(file_name, on_progress).await?;
    let scene = import_slice(&bytes, file_name).await?;
    log::info!(
        "Imported {}: {} meshes, {} vertices, {} triangles, {} materials",
        file_name,
        scene.meshes.len(),
        scene.vertex_count(),
        scene.triangle_count(),
        scene.materials.len()
    );
    upload_model(file_name, &scene, device, queue, material_layout)
}

/// Creates GPU buffers, textures and material bind groups for an imported scene.
pub fn upload_model(
    file_name: &str,
    scene: &SceneData,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    material_layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<model::Model> {
    let sampler = create_default_sampler(device);
    let texture = |source: &Option<ImageSource>, srgb: bool, fallback: Texture, label: &str| {
        match source {
            Some(image) => Texture::from_bytes(
                device,
                queue,
                &image.bytes,
                &format!("{file_name} {label}"),
                image.format.as_deref(),
                srgb,
            )
            .with_context(|| format!("could not decode the {label} texture of {file_name}")),
            None => Ok(fallback),
        }
    };

    let mut materials = Vec::with_capacity(scene.materials.len() + 1);
    for data in scene.materials.iter() {
        let neutral = MaterialTextures::neutral(device, queue);
        let textures = MaterialTextures {
            base_colour: texture(&data.base_colour, true, neutral.base_colour, "base colour")?,
            metallic_roughness: texture(
                &data.metallic_roughness,
                false,
                neutral.metallic_roughness,
                "metallic roughness",
            )?,
            normal: texture(&data.normal, false, neutral.normal, "normal")?,
            occlusion: texture(&data.occlusion, false, neutral.occlusion, "occlusion")?,
            emissive: texture(&data.emissive, true, neutral.emissive, "emissive")?,
        };
        materials.push(model::Material::new(
            device,
            &data.name,
            textures,
            data.params,
            &sampler,
            material_layout,
        ));
    }

    // Primitives without a material use the glTF default material
    let default_material = materials.len();
    let mut uses_default = false;
    let meshes = scene
        .meshes
        .iter()
        .map(|mesh| {
            let material = match mesh.material {
                Some(idx) if idx < default_material => idx,
                _ => {
                    uses_default = true;
                    default_material
                }
            };
            mesh.upload(device, material)
        })
        .collect();
    if uses_default {
        materials.push(model::Material::new(
            device,
            "default material",
            MaterialTextures::neutral(device, queue),
            MaterialParams::default(),
            &sampler,
            material_layout,
        ));
    }

    Ok(model::Model {
        meshes,
        materials,
        casts_shadow: true,
    })
}

/// The unit cube in plain green that stands in for a model that failed to load.
pub fn fallback_cube(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    material_layout: &wgpu::BindGroupLayout,
) -> model::Model {
    let sampler = create_default_sampler(device);
    let colour = hex_rgb(FALLBACK_COLOUR).map(|c| srgb_to_linear(c as f64) as f32);
    let material = model::Material::new(
        device,
        "fallback cube",
        MaterialTextures::neutral(device, queue),
        MaterialParams {
            receive_shadows: false,
            ..MaterialParams::lambert(colour)
        },
        &sampler,
        material_layout,
    );
    let mesh = cuboid("fallback cube", 1.0, 1.0, 1.0).upload(device, 0);
    model::Model {
        meshes: vec![mesh],
        materials: vec![material],
        casts_shadow: true,
    }
}
