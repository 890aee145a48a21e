//! Programmatic glTF assets for integration tests.
//!
//! `write_sample_glb` produces a GLB with:
//! - an indexed, textured quad instanced twice (once under a parent node)
//! - a non-indexed triangle plus a point primitive that must be skipped
//! - an embedded albedo PNG, an external metallic-roughness PNG and an
//!   unresolvable data-URI emissive texture
//! - three materials, two of which share the albedo texture
//!
//! `write_triangle_gltf` produces a plain `.gltf` + `.bin` pair with
//! supplied normals and no textures.

mod glb_assembly;

use std::path::{Path, PathBuf};

use serde_json::json;

pub use glb_assembly::assemble_glb;

/// Quad corners, counter-clockwise in the XY plane
pub const QUAD_POSITIONS: [[f32; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
];
const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// External metallic-roughness texels: (R, G, B, A)
pub const ROUGHNESS_TEXELS: [[u8; 4]; 2] = [[0, 255, 0, 255], [255, 0, 255, 255]];

fn push_f32s(buffer: &mut Vec<u8>, values: impl IntoIterator<Item = f32>) {
    for value in values {
        buffer.extend_from_slice(&value.to_le_bytes());
    }
}

fn push_u32s(buffer: &mut Vec<u8>, values: impl IntoIterator<Item = u32>) {
    for value in values {
        buffer.extend_from_slice(&value.to_le_bytes());
    }
}

fn encode_png(image: &image::RgbaImage) -> Vec<u8> {
    let mut bytes = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("Failed to encode PNG");
    bytes.into_inner()
}

/// 2x2 albedo, black and white checker
pub fn albedo_image() -> image::RgbaImage {
    image::RgbaImage::from_fn(2, 2, |x, y| {
        let v = if (x + y) % 2 == 0 { 255 } else { 0 };
        image::Rgba([v, v, v, 255])
    })
}

fn roughness_image() -> image::RgbaImage {
    image::RgbaImage::from_fn(2, 1, |x, _| image::Rgba(ROUGHNESS_TEXELS[x as usize]))
}

/// Write the sample GLB (and its external texture) into `dir`
pub fn write_sample_glb(dir: &Path) -> PathBuf {
    roughness_image()
        .save(dir.join("rough.png"))
        .expect("Failed to write PNG");

    let mut bin = Vec::new();
    push_f32s(&mut bin, QUAD_POSITIONS.iter().flatten().copied());
    push_f32s(&mut bin, QUAD_UVS.iter().flatten().copied());
    push_u32s(&mut bin, QUAD_INDICES);
    let png_offset = bin.len();
    let png = encode_png(&albedo_image());
    bin.extend_from_slice(&png);

    let root = json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0, 2, 3] }],
        "nodes": [
            { "translation": [1.0, 0.0, 0.0], "children": [1] },
            { "translation": [0.0, 2.0, 0.0], "mesh": 0 },
            { "mesh": 0 },
            { "scale": [2.0, 2.0, 2.0], "mesh": 1 }
        ],
        "meshes": [
            {
                "name": "quad",
                "primitives": [{
                    "attributes": { "POSITION": 0, "TEXCOORD_0": 1 },
                    "indices": 2,
                    "material": 0
                }]
            },
            {
                "name": "triangle",
                "primitives": [
                    { "attributes": { "POSITION": 3 }, "material": 1 },
                    { "attributes": { "POSITION": 0 }, "mode": 0 }
                ]
            }
        ],
        "accessors": [
            {
                "bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3",
                "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
            },
            { "bufferView": 1, "componentType": 5126, "count": 4, "type": "VEC2" },
            { "bufferView": 2, "componentType": 5125, "count": 6, "type": "SCALAR" },
            {
                "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
            }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 48 },
            { "buffer": 0, "byteOffset": 48, "byteLength": 32 },
            { "buffer": 0, "byteOffset": 80, "byteLength": 24 },
            { "buffer": 0, "byteOffset": png_offset, "byteLength": png.len() }
        ],
        "buffers": [{ "byteLength": bin.len() }],
        "images": [
            { "bufferView": 3, "mimeType": "image/png" },
            { "uri": "rough.png" },
            { "uri": "data:image/png;base64,AAAA" }
        ],
        "textures": [{ "source": 0 }, { "source": 1 }, { "source": 2 }],
        "materials": [
            {
                "pbrMetallicRoughness": {
                    "baseColorTexture": { "index": 0 },
                    "metallicRoughnessTexture": { "index": 1 }
                }
            },
            {
                "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } },
                "emissiveTexture": { "index": 2 },
                "emissiveFactor": [1.0, 0.5, 0.0]
            },
            {
                "pbrMetallicRoughness": {
                    "baseColorFactor": [0.5, 0.5, 0.5, 1.0],
                    "roughnessFactor": 0.25
                }
            }
        ]
    });

    let path = dir.join("sample.glb");
    std::fs::write(&path, assemble_glb(&root, &bin)).expect("Failed to write GLB");
    path
}

/// Write a single-triangle `.gltf` with an external buffer into `dir`
pub fn write_triangle_gltf(dir: &Path) -> PathBuf {
    let mut bin = Vec::new();
    push_f32s(&mut bin, [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    // Normals tilted towards +Y; the loader must keep them
    let n = std::f32::consts::FRAC_1_SQRT_2;
    push_f32s(&mut bin, [0.0, n, n, 0.0, n, n, 0.0, n, n]);
    std::fs::write(dir.join("triangle.bin"), &bin).expect("Failed to write buffer");

    let root = json!({
        "asset": { "version": "2.0" },
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{
            "primitives": [{ "attributes": { "POSITION": 0, "NORMAL": 1 } }]
        }],
        "accessors": [
            {
                "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
            },
            { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 36 }
        ],
        "buffers": [{ "uri": "triangle.bin", "byteLength": bin.len() }]
    });

    let path = dir.join("triangle.gltf");
    std::fs::write(&path, serde_json::to_vec_pretty(&root).expect("Failed to serialize JSON"))
        .expect("Failed to write glTF");
    path
}
