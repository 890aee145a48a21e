//! Integration tests for scene-import
//!
//! Tests the full pipeline: generate glTF assets -> load -> generate scene ->
//! verify the packed output.

mod scene_generator;

use std::process::Command;

use glam::Vec3;
use tempfile::tempdir;

use scene_import::{
    GeometryRange, ImportError, Importer, NO_TEXTURE, ProcessError, TextureFormat,
};

fn load(paths: &[&std::path::Path]) -> Importer {
    let mut importer = Importer::default();
    for path in paths {
        assert!(importer.load_file(path).expect("Failed to load"), "{path:?} not loaded");
    }
    importer
}

#[test]
fn test_sample_glb_statistics() {
    let dir = tempdir().expect("Failed to create temp dir");
    let importer = load(&[&scene_generator::write_sample_glb(dir.path())]);

    assert_eq!(importer.loaded_by(), &["gltf"]);
    let stats = importer.statistics();
    // Point primitive is skipped
    assert_eq!(stats.geometries, 2);
    assert_eq!(stats.meshes, 3);
    assert_eq!(stats.textures, 2);
    assert_eq!(stats.materials, 3);
    assert_eq!(stats.unique_vertices, 7);
    assert_eq!(stats.effective_triangles, 5);
}

#[test]
fn test_sample_glb_geometry() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene = load(&[&scene_generator::write_sample_glb(dir.path())])
        .generate_scene()
        .expect("Failed to generate scene");

    let geometries = scene.geometries().unwrap();
    assert_eq!(geometries.len(), 1);
    let geometry = geometries[0];

    assert_eq!(
        scene.geometry_ranges().unwrap(),
        &[
            GeometryRange {
                source_index: 0,
                vertex_offset: 0,
                max_vertex: 3,
                first_index: 0,
                triangle_count: 2,
            },
            GeometryRange {
                source_index: 1,
                vertex_offset: 4,
                max_vertex: 2,
                first_index: 6,
                triangle_count: 1,
            },
        ]
    );

    // Non-indexed triangle gets a generated 0..n index buffer
    assert_eq!(
        scene.slice(geometry.indices).unwrap(),
        &[0, 1, 2, 0, 2, 3, 0, 1, 2]
    );

    let positions = scene.slice(geometry.positions).unwrap();
    assert_eq!(positions.len(), 7);
    assert_eq!(positions[2], Vec3::from(scene_generator::QUAD_POSITIONS[2]));
    assert_eq!(positions[6], Vec3::from(scene_generator::QUAD_POSITIONS[2]));

    let tangent_spaces = scene.view(geometry.tangent_spaces).unwrap();
    assert_eq!(tangent_spaces.len(), 7);
    for basis in tangent_spaces.iter() {
        let decoded = basis.decode();
        assert!(decoded.normal.dot(Vec3::Z) > 0.999, "{:?}", decoded.normal);
        assert!(decoded.normal.dot(decoded.tangent).abs() < 1e-2);
    }
    // Quad UVs follow the positions, so the tangent follows +X
    assert!(tangent_spaces.at(0).decode().tangent.dot(Vec3::X) > 0.999);
}

#[test]
fn test_sample_glb_instances() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene = load(&[&scene_generator::write_sample_glb(dir.path())])
        .generate_scene()
        .expect("Failed to generate scene");

    let meshes = scene.meshes().unwrap();
    assert_eq!(meshes.len(), 3);

    // Parent and child translations compose
    assert_eq!(meshes[0].geometry_range, 0);
    assert_eq!(
        meshes[0].transform.transform_point3(Vec3::ZERO),
        Vec3::new(1.0, 2.0, 0.0)
    );
    assert_eq!(meshes[1].geometry_range, 0);
    assert_eq!(meshes[1].transform.transform_point3(Vec3::ONE), Vec3::ONE);
    assert_eq!(meshes[2].geometry_range, 1);
    assert_eq!(
        meshes[2].transform.transform_vector3(Vec3::X),
        Vec3::new(2.0, 0.0, 0.0)
    );
}

#[test]
fn test_sample_glb_materials() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene = load(&[&scene_generator::write_sample_glb(dir.path())])
        .generate_scene()
        .expect("Failed to generate scene");

    let materials = scene.materials().unwrap();
    assert_eq!(materials.len(), 3);

    // Same albedo recipe shared by both materials
    assert_eq!(materials[0].albedo_alpha_texture, 0);
    assert_eq!(materials[1].albedo_alpha_texture, 0);
    assert_eq!(materials[0].metalness_texture, 1);
    assert_eq!(materials[0].roughness_texture, 2);
    assert_eq!(materials[0].normal_texture, NO_TEXTURE);

    // Data URI emissive stays unresolved, factor kept
    assert_eq!(materials[1].emission_texture, NO_TEXTURE);
    assert_eq!(materials[1].factors.emission, Vec3::new(1.0, 0.5, 0.0));

    let plain = materials[2];
    assert_eq!(plain.albedo_alpha_texture, NO_TEXTURE);
    assert_eq!(plain.metalness_texture, NO_TEXTURE);
    assert_eq!(plain.roughness_texture, NO_TEXTURE);
    assert_eq!(plain.emission_texture, NO_TEXTURE);
    assert_eq!(plain.transmission_texture, NO_TEXTURE);
    assert_eq!(plain.factors.roughness, 0.25);
    assert_eq!(plain.factors.albedo_alpha.x, 0.5);
}

#[test]
fn test_sample_glb_textures() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene = load(&[&scene_generator::write_sample_glb(dir.path())])
        .generate_scene()
        .expect("Failed to generate scene");

    let textures = scene.textures().unwrap();
    assert_eq!(textures.len(), 3);

    let albedo = textures[0];
    assert_eq!(albedo.format, TextureFormat::Rgba8Srgb);
    assert_eq!((albedo.size.x, albedo.size.y), (2, 2));
    assert_eq!(
        scene.texture_data(&albedo).unwrap(),
        scene_generator::albedo_image().as_raw().as_slice()
    );

    let [metal, rough] = [textures[1], textures[2]];
    assert_eq!(metal.format, TextureFormat::R8Unorm);
    assert_eq!(rough.format, TextureFormat::R8Unorm);
    let texels = scene_generator::ROUGHNESS_TEXELS;
    assert_eq!(scene.texture_data(&metal).unwrap(), &[texels[0][2], texels[1][2]]);
    assert_eq!(scene.texture_data(&rough).unwrap(), &[texels[0][1], texels[1][1]]);
}

#[test]
fn test_gltf_with_external_buffer_keeps_normals() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene = load(&[&scene_generator::write_triangle_gltf(dir.path())])
        .generate_scene()
        .expect("Failed to generate scene");

    let geometry = scene.geometries().unwrap()[0];
    let expected = Vec3::new(0.0, 1.0, 1.0).normalize();
    for basis in scene.slice(geometry.tangent_spaces).unwrap() {
        assert!(basis.decode_normal().dot(expected) > 0.999);
    }
    assert!(scene.textures().unwrap().is_empty());
    assert!(scene.materials().unwrap().is_empty());
}

#[test]
fn test_multiple_files_accumulate() {
    let dir = tempdir().expect("Failed to create temp dir");
    let importer = load(&[
        &scene_generator::write_sample_glb(dir.path()),
        &scene_generator::write_triangle_gltf(dir.path()),
    ]);
    assert_eq!(importer.loaded_by(), &["gltf", "gltf"]);

    let scene = importer.generate_scene().expect("Failed to generate scene");
    let ranges = scene.geometry_ranges().unwrap();
    assert_eq!(ranges.len(), 3);
    assert_eq!(ranges[2].vertex_offset, 7);
    assert_eq!(ranges[2].first_index, 9);

    let meshes = scene.meshes().unwrap();
    assert_eq!(meshes.len(), 4);
    assert_eq!(meshes[3].geometry_range, 2);
}

#[test]
fn test_generation_is_deterministic() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = scene_generator::write_sample_glb(dir.path());

    let a = load(&[&path]).generate_scene().unwrap();
    let b = load(&[&path]).generate_scene().unwrap();

    let ga = a.geometries().unwrap()[0];
    let gb = b.geometries().unwrap()[0];
    assert_eq!(
        a.slice(ga.tangent_spaces).unwrap(),
        b.slice(gb.tangent_spaces).unwrap()
    );
    assert_eq!(a.geometry_ranges().unwrap(), b.geometry_ranges().unwrap());
}

#[test]
fn test_missing_texture_file_is_fatal() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = scene_generator::write_sample_glb(dir.path());
    std::fs::remove_file(dir.path().join("rough.png")).expect("Failed to remove PNG");

    let err = load(&[&path]).generate_scene().unwrap_err();
    assert!(matches!(err, ProcessError::ImageDecode { texture: 1, .. }), "{err}");
}

#[test]
fn test_malformed_gltf_is_fatal() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("broken.gltf");
    std::fs::write(&path, b"{ not json").expect("Failed to write file");

    let mut importer = Importer::default();
    let err = importer.load_file(&path).unwrap_err();
    assert!(matches!(err, ImportError::Gltf { .. }));
    assert!(importer.model().is_empty());
}

#[test]
fn test_unknown_extension_is_reported_not_fatal() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("model.fbx");
    std::fs::write(&path, b"binary").expect("Failed to write file");

    let mut importer = Importer::default();
    assert!(!importer.load_file(&path).unwrap());
    assert!(importer.model().is_empty());
}

// ============================================================================
// Command line
// ============================================================================

#[test]
fn test_cli_imports_sample() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = scene_generator::write_sample_glb(dir.path());

    let output = Command::new(env!("CARGO_BIN_EXE_scene-import"))
        .arg(&path)
        .args(["--threads", "2", "--detailed"])
        .output()
        .expect("Failed to run scene-import");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "scene-import failed:\n{stdout}\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("2 geometry ranges, 3 textures, 3 materials, 3 meshes"), "{stdout}");
}

#[test]
fn test_cli_unclaimed_input_produces_empty_scene() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("model.fbx");
    std::fs::write(&path, b"binary").expect("Failed to write file");

    let output = Command::new(env!("CARGO_BIN_EXE_scene-import"))
        .arg(&path)
        .output()
        .expect("Failed to run scene-import");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "scene-import failed:\n{stdout}");
    assert!(stdout.contains("0 geometry ranges, 0 textures, 0 materials, 0 meshes"), "{stdout}");
}

#[test]
fn test_cli_rejects_missing_input() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output = Command::new(env!("CARGO_BIN_EXE_scene-import"))
        .arg(dir.path().join("missing.glb"))
        .output()
        .expect("Failed to run scene-import");
    assert!(!output.status.success());
}
