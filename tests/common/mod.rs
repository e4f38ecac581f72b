#![allow(dead_code)]

//! Builders for small in-memory assets used across the tests.

/// A binary glTF holding one triangle, translated by `(0, 2, 0)`, with a red
/// material (metalness 0.25, roughness 0.75).
pub fn triangle_glb() -> Vec<u8> {
    indexed_triangle_glb(&[0, 1, 2])
}

/// The three vertices of [`triangle_glb`] drawn with arbitrary `indices`.
pub fn indexed_triangle_glb(indices: &[u16]) -> Vec<u8> {
    let mut bin = Vec::new();
    for p in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        bin.extend(p.iter().flat_map(|c| c.to_le_bytes()));
    }
    for _ in 0..3 {
        bin.extend([0.0f32, 0.0, 1.0].iter().flat_map(|c| c.to_le_bytes()));
    }
    for uv in [[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]] {
        bin.extend(uv.iter().flat_map(|c| c.to_le_bytes()));
    }
    for i in indices {
        bin.extend(i.to_le_bytes());
    }
    // pad the index view to a multiple of four
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let json = r#"{
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0, "translation": [0.0, 2.0, 0.0], "name": "triangle node"}],
        "meshes": [{
            "name": "triangle",
            "primitives": [{
                "attributes": {"POSITION": 0, "NORMAL": 1, "TEXCOORD_0": 2},
                "indices": 3,
                "material": 0
            }]
        }],
        "materials": [{
            "name": "red",
            "pbrMetallicRoughness": {
                "baseColorFactor": [1.0, 0.0, 0.0, 1.0],
                "metallicFactor": 0.25,
                "roughnessFactor": 0.75
            }
        }],
        "buffers": [{"byteLength": BUFFER_BYTES}],
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": 36},
            {"buffer": 0, "byteOffset": 36, "byteLength": 36},
            {"buffer": 0, "byteOffset": 72, "byteLength": 24},
            {"buffer": 0, "byteOffset": 96, "byteLength": INDEX_BYTES}
        ],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
             "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
            {"bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3"},
            {"bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC2"},
            {"bufferView": 3, "componentType": 5123, "count": INDEX_COUNT, "type": "SCALAR"}
        ]
    }"#
    .replace("BUFFER_BYTES", &bin.len().to_string())
    .replace("INDEX_BYTES", &(indices.len() * 2).to_string())
    .replace("INDEX_COUNT", &indices.len().to_string());
    glb(&json, &bin)
}

/// Packs a JSON document and a binary chunk into a GLB container.
pub fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json = json.as_bytes().to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let mut bin = bin.to_vec();
    while bin.len() % 4 != 0 {
        bin.push(0);
    }
    let total = 12 + 8 + json.len() + 8 + bin.len();

    let mut out = Vec::with_capacity(total);
    out.extend(b"glTF");
    out.extend(2u32.to_le_bytes());
    out.extend((total as u32).to_le_bytes());
    out.extend((json.len() as u32).to_le_bytes());
    out.extend(b"JSON");
    out.extend(&json);
    out.extend((bin.len() as u32).to_le_bytes());
    out.extend(b"BIN\0");
    out.extend(&bin);
    out
}

/// Encodes a Radiance HDR image from row-major RGB texels.
pub fn hdr(width: usize, height: usize, texels: &[[f32; 3]]) -> Vec<u8> {
    let pixels: Vec<image::Rgb<f32>> = texels.iter().map(|t| image::Rgb(*t)).collect();
    let mut out = Vec::new();
    image::codecs::hdr::HdrEncoder::new(&mut out)
        .encode(&pixels, width, height)
        .expect("encoding an HDR image into memory");
    out
}
