use cgmath::{InnerSpace, Vector3};
use glb_viewer::{
    data_structures::model::{MaterialParams, ModelVertex},
    platform::{MaterialTuning, Platform, RenderProfile},
    resources::mesh::{compute_tangents, cuboid},
};

fn mobile_tuning() -> MaterialTuning {
    RenderProfile::for_platform(Platform::Mobile).material_tuning.unwrap()
}

#[test]
fn cuboid_has_flat_faces() {
    let cube = cuboid("cube", 1.0, 1.0, 1.0);

    assert_eq!(cube.vertices.len(), 24);
    assert_eq!(cube.indices.len(), 36);
    assert_eq!(cube.material, Some(0));
    assert!(cube.indices.iter().all(|&i| (i as usize) < cube.vertices.len()));

    for face in cube.vertices.chunks(4) {
        let normal = Vector3::from(face[0].normal);
        for v in face {
            assert_eq!(v.normal, face[0].normal);
            // every corner lies on the face plane, half a unit out
            assert!((Vector3::from(v.position).dot(normal) - 0.5).abs() < 1e-6);
        }
    }
}

#[test]
fn cuboid_winds_counter_clockwise_seen_from_outside() {
    let cube = cuboid("cube", 2.0, 1.0, 3.0);

    for tri in cube.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vector3::from(cube.vertices[i as usize].position));
        let face_normal = (b - a).cross(c - a).normalize();
        let normal = Vector3::from(cube.vertices[tri[0] as usize].normal);
        assert!((face_normal - normal).magnitude() < 1e-5, "{face_normal:?} vs {normal:?}");
    }
}

#[test]
fn cuboid_respects_its_dimensions() {
    let cube = cuboid("slab", 2.0, 0.5, 4.0);
    let max = cube.vertices.iter().fold([0.0f32; 3], |acc, v| {
        [acc[0].max(v.position[0]), acc[1].max(v.position[1]), acc[2].max(v.position[2])]
    });
    assert_eq!(max, [1.0, 0.25, 2.0]);
}

#[test]
fn tangents_follow_the_u_direction() {
    let vertex = |position: [f32; 3], tex_coords: [f32; 2]| ModelVertex {
        position,
        tex_coords,
        normal: [0.0, 0.0, 1.0],
        ..Default::default()
    };
    // a quad in the XY plane with v pointing down
    let mut vertices = vec![
        vertex([0.0, 0.0, 0.0], [0.0, 1.0]),
        vertex([1.0, 0.0, 0.0], [1.0, 1.0]),
        vertex([1.0, 1.0, 0.0], [1.0, 0.0]),
        vertex([0.0, 1.0, 0.0], [0.0, 0.0]),
    ];
    compute_tangents(&mut vertices, &[0, 1, 2, 0, 2, 3]);

    for v in &vertices {
        assert!((Vector3::from(v.tangent) - Vector3::unit_x()).magnitude() < 1e-5, "{v:?}");
        assert!((Vector3::from(v.bitangent) - Vector3::unit_y()).magnitude() < 1e-5, "{v:?}");
    }
}

#[test]
fn degenerate_uvs_leave_tangents_untouched() {
    let mut vertices = vec![ModelVertex::default(); 3];
    vertices[1].position = [1.0, 0.0, 0.0];
    vertices[2].position = [0.0, 1.0, 0.0];
    compute_tangents(&mut vertices, &[0, 1, 2]);
    assert!(vertices.iter().all(|v| v.tangent == [0.0; 3]));
}

#[test]
fn mobile_tuning_clamps_metalness_and_roughness() {
    let params = MaterialParams {
        metalness: 1.0,
        roughness: 0.1,
        ..Default::default()
    }
    .tuned(&mobile_tuning());

    assert_eq!(params.metalness, 0.8);
    assert_eq!(params.roughness, 0.2);
    assert_eq!(params.env_intensity, 0.3);
}

#[test]
fn mobile_tuning_treats_zero_roughness_as_unset() {
    let params = MaterialParams {
        metalness: 0.0,
        roughness: 0.0,
        ..Default::default()
    }
    .tuned(&mobile_tuning());

    assert_eq!(params.metalness, 0.0);
    assert_eq!(params.roughness, 0.5);
}

#[test]
fn mobile_tuning_keeps_lambert_materials_matte() {
    let params = MaterialParams::lambert([0.0, 1.0, 0.0]).tuned(&mobile_tuning());

    assert!(params.lambert);
    assert_eq!(params.metalness, 0.0);
    assert_eq!(params.roughness, 1.0);
    assert_eq!(params.base_colour, [0.0, 1.0, 0.0, 1.0]);
}

#[test]
fn default_material_matches_gltf_defaults() {
    let params = MaterialParams::default();
    assert_eq!(params.base_colour, [1.0; 4]);
    assert_eq!(params.metalness, 1.0);
    assert_eq!(params.roughness, 1.0);
    assert!(params.receive_shadows);
    assert!(!params.lambert);
}
