use futures::executor::block_on;
use glb_viewer::resources::gltf_import::import_slice;

mod common;

fn assert_close(actual: [f32; 3], expected: [f32; 3]) {
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-5, "{actual:?} != {expected:?}");
    }
}

#[test]
fn should_import_triangle_from_glb() {
    let scene = block_on(import_slice(&common::triangle_glb(), "triangle.glb")).unwrap();

    assert_eq!(scene.meshes.len(), 1);
    assert_eq!(scene.vertex_count(), 3);
    assert_eq!(scene.triangle_count(), 1);

    let mesh = &scene.meshes[0];
    assert_eq!(mesh.name, "triangle");
    assert_eq!(mesh.indices, vec![0, 1, 2]);
    assert_eq!(mesh.material, Some(0));
}

#[test]
fn should_bake_node_translation_into_vertices() {
    let scene = block_on(import_slice(&common::triangle_glb(), "triangle.glb")).unwrap();
    let vertices = &scene.meshes[0].vertices;

    assert_close(vertices[0].position, [0.0, 2.0, 0.0]);
    assert_close(vertices[1].position, [1.0, 2.0, 0.0]);
    assert_close(vertices[2].position, [0.0, 3.0, 0.0]);
    for v in vertices {
        assert_close(v.normal, [0.0, 0.0, 1.0]);
    }
}

#[test]
fn should_compute_tangents_when_file_has_none() {
    let scene = block_on(import_slice(&common::triangle_glb(), "triangle.glb")).unwrap();
    for v in &scene.meshes[0].vertices {
        assert_close(v.tangent, [1.0, 0.0, 0.0]);
    }
}

#[test]
fn should_read_material_factors() {
    let scene = block_on(import_slice(&common::triangle_glb(), "triangle.glb")).unwrap();

    assert_eq!(scene.materials.len(), 1);
    let material = &scene.materials[0];
    assert_eq!(material.name, "red");
    assert_eq!(material.params.base_colour, [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(material.params.metalness, 0.25);
    assert_eq!(material.params.roughness, 0.75);
    assert!(material.base_colour.is_none());
    assert!(material.normal.is_none());
}

#[test]
fn should_reject_bytes_that_are_not_gltf() {
    let result = block_on(import_slice(b"definitely not a model", "broken.glb"));
    assert!(result.is_err());
}

#[test]
fn should_reject_scene_without_meshes() {
    let json = br#"{"asset": {"version": "2.0"}, "scenes": [{"nodes": [0]}], "nodes": [{}]}"#;
    let err = block_on(import_slice(json, "empty.gltf")).unwrap_err();
    assert!(err.to_string().contains("no triangle meshes"), "{err}");
}

#[test]
fn should_reject_embedded_data_uris() {
    let json = br#"{
        "asset": {"version": "2.0"},
        "buffers": [{"byteLength": 4, "uri": "data:application/octet-stream;base64,AAAAAA=="}]
    }"#;
    let err = block_on(import_slice(json, "embedded.gltf")).unwrap_err();
    assert!(err.to_string().contains("data URIs"), "{err}");
}

#[test]
fn should_reject_indices_past_the_last_vertex() {
    let glb = common::indexed_triangle_glb(&[0, 1, 9]);
    let err = block_on(import_slice(&glb, "out_of_range.glb")).unwrap_err();
    assert!(format!("{err:#}").contains("refers to vertex 9 but has only 3"), "{err:#}");
}

#[test]
fn should_reject_a_partial_triangle() {
    let glb = common::indexed_triangle_glb(&[0, 1, 2, 0]);
    let err = block_on(import_slice(&glb, "partial.glb")).unwrap_err();
    assert!(format!("{err:#}").contains("not a whole number of triangles"), "{err:#}");
}
