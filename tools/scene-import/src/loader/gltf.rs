//! glTF 2.0 loader (`.gltf` and `.glb`)
//!
//! One source geometry per triangle primitive, one mesh instance per
//! (node, primitive) pair reachable from the default scene. Images become
//! texture sources; material channels map to recipes:
//!
//! | glTF input                          | channel       | transform | format      |
//! |-------------------------------------|---------------|-----------|-------------|
//! | baseColorTexture                    | albedo-alpha  | identity  | RGBA8 sRGB  |
//! | metallicRoughnessTexture (B)        | metalness     | B -> R    | R8          |
//! | metallicRoughnessTexture (G)        | roughness     | G -> R    | R8          |
//! | normalTexture (RG)                  | normal        | RG        | RG8         |
//! | emissiveTexture                     | emission      | identity  | RGBA8 sRGB  |
//! | KHR_materials_transmission (R)      | transmission  | R         | R8          |

use std::path::Path;

use glam::{Affine3A, Mat4, Vec2, Vec3, Vec4};
use hashbrown::HashMap;
use tracing::{info, warn};

use super::{LoaderEntry, ModelLoader, has_extension};
use crate::error::ImportError;
use crate::model::{
    MaterialFactors, SourceGeometry, SourceMaterial, SourceMesh, SourceModel, TexelTransform,
    TextureProcess, TextureSource,
};
use crate::scene::TextureFormat;

const NAME: &str = "gltf";

/// Guards against cyclic node graphs in malformed files
const MAX_NODE_DEPTH: usize = 256;

pub const GLTF_LOADER: LoaderEntry = LoaderEntry {
    name: NAME,
    accepts: is_gltf_path,
    create: create_loader,
};

pub fn is_gltf_path(path: &Path) -> bool {
    has_extension(path, &["gltf", "glb"])
}

fn create_loader() -> Box<dyn ModelLoader> {
    Box::new(GltfLoader)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GltfLoader;

impl ModelLoader for GltfLoader {
    fn import(
        &mut self,
        model: &mut SourceModel,
        path: &Path,
        base_dir: &Path,
    ) -> Result<bool, ImportError> {
        if !is_gltf_path(path) {
            return Ok(false);
        }

        let gltf_error = |source| ImportError::Gltf {
            path: path.to_path_buf(),
            source,
        };
        let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(gltf_error)?;
        let buffers = gltf::import_buffers(&document, Some(base_dir), blob).map_err(gltf_error)?;

        // Build into a scratch model so a failure leaves `model` untouched
        let mut loaded = SourceModel::default();
        let primitives = load_geometries(&document, &buffers, &mut loaded);
        load_instances(&document, &primitives, &mut loaded, path)?;
        let textures = load_textures(&document, &buffers, base_dir, &mut loaded);
        load_materials(&document, &textures, &mut loaded);

        info!(
            "Loaded {:?}: {} geometries, {} meshes, {} textures, {} materials",
            path,
            loaded.geometries.len(),
            loaded.meshes.len(),
            loaded.textures.len(),
            loaded.materials.len()
        );

        append(model, loaded);
        Ok(true)
    }
}

/// Append `loaded` to `model`, rebasing its cross references
fn append(model: &mut SourceModel, loaded: SourceModel) {
    let geometry_base = model.geometries.len();
    let texture_base = model.textures.len();

    model.geometries.extend(loaded.geometries);
    model.textures.extend(loaded.textures);
    model.meshes.extend(loaded.meshes.into_iter().map(|mesh| SourceMesh {
        geometry: mesh.geometry + geometry_base,
        ..mesh
    }));
    model
        .materials
        .extend(loaded.materials.into_iter().map(|mut material| {
            for process in [
                &mut material.albedo_alpha,
                &mut material.metalness,
                &mut material.roughness,
                &mut material.normal,
                &mut material.emission,
                &mut material.transmission,
            ]
            .into_iter()
            .flatten()
            {
                process.source += texture_base;
            }
            material
        }));
}

// ============================================================================
// Geometry
// ============================================================================

/// Returns (mesh index, primitive index) -> geometry index
fn load_geometries(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    model: &mut SourceModel,
) -> HashMap<(usize, usize), usize> {
    let mut primitives = HashMap::new();

    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                warn!(
                    "Mesh {} primitive {}: {:?} topology not supported, skipping",
                    mesh.index(),
                    primitive.index(),
                    primitive.mode()
                );
                continue;
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let Some(positions) = reader.read_positions() else {
                warn!(
                    "Mesh {} primitive {} has no POSITION attribute, skipping",
                    mesh.index(),
                    primitive.index()
                );
                continue;
            };
            let positions: Vec<Vec3> = positions.map(Vec3::from).collect();

            let normals = reader
                .read_normals()
                .map(|iter| iter.map(Vec3::from).collect());
            let tex_coords = reader
                .read_tex_coords(0)
                .map(|iter| iter.into_f32().map(Vec2::from).collect());

            // Non-indexed primitives draw their vertices in order
            let indices = match reader.read_indices() {
                Some(iter) => iter.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            primitives.insert((mesh.index(), primitive.index()), model.geometries.len());
            model.geometries.push(SourceGeometry {
                indices,
                positions,
                normals,
                tex_coords,
            });
        }
    }

    primitives
}

// ============================================================================
// Scene graph
// ============================================================================

fn load_instances(
    document: &gltf::Document,
    primitives: &HashMap<(usize, usize), usize>,
    model: &mut SourceModel,
    path: &Path,
) -> Result<(), ImportError> {
    let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        warn!("{:?} defines no scene, no mesh instances created", path);
        return Ok(());
    };

    for node in scene.nodes() {
        visit_node(&node, Mat4::IDENTITY, 0, primitives, model, path)?;
    }
    Ok(())
}

fn visit_node(
    node: &gltf::Node,
    parent: Mat4,
    depth: usize,
    primitives: &HashMap<(usize, usize), usize>,
    model: &mut SourceModel,
    path: &Path,
) -> Result<(), ImportError> {
    if depth > MAX_NODE_DEPTH {
        return Err(ImportError::Malformed {
            loader: NAME,
            path: path.to_path_buf(),
            message: format!("node hierarchy deeper than {MAX_NODE_DEPTH} at node {}", node.index()),
        });
    }

    let transform = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if let Some(&geometry) = primitives.get(&(mesh.index(), primitive.index())) {
                model.meshes.push(SourceMesh {
                    geometry,
                    transform: Affine3A::from_mat4(transform),
                });
            }
        }
    }

    for child in node.children() {
        visit_node(&child, transform, depth + 1, primitives, model, path)?;
    }
    Ok(())
}

// ============================================================================
// Textures and materials
// ============================================================================

/// Returns glTF texture index -> texture source, `None` when unresolved
fn load_textures(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    base_dir: &Path,
    model: &mut SourceModel,
) -> Vec<Option<usize>> {
    let mut images = Vec::new();

    for image in document.images() {
        let source = match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let start = view.offset();
                let end = start + view.length();
                match buffers
                    .get(view.buffer().index())
                    .and_then(|data| data.get(start..end))
                {
                    Some(bytes) => Some(TextureSource::Encoded {
                        bytes: bytes.to_vec(),
                        mime_type: Some(mime_type.to_string()),
                    }),
                    None => {
                        warn!("Image {} buffer view out of range, leaving unresolved", image.index());
                        None
                    }
                }
            }
            gltf::image::Source::Uri { uri, .. } if uri.starts_with("data:") => {
                warn!("Image {} uses a data URI, leaving unresolved", image.index());
                None
            }
            gltf::image::Source::Uri { uri, .. } => Some(TextureSource::FileUri(base_dir.join(uri))),
        };

        images.push(source.map(|source| {
            model.textures.push(source);
            model.textures.len() - 1
        }));
    }

    document
        .textures()
        .map(|texture| images.get(texture.source().index()).copied().flatten())
        .collect()
}

fn load_materials(document: &gltf::Document, textures: &[Option<usize>], model: &mut SourceModel) {
    let recipe = |texture: gltf::Texture, transform, format| {
        let source = textures.get(texture.index()).copied().flatten();
        if source.is_none() {
            warn!("Texture {} has no usable image, using factor", texture.index());
        }
        source.map(|source| TextureProcess::new(source, transform, format))
    };

    for material in document.materials() {
        let pbr = material.pbr_metallic_roughness();
        let metallic_roughness = pbr.metallic_roughness_texture();
        let transmission = material.transmission();

        model.materials.push(SourceMaterial {
            albedo_alpha: pbr.base_color_texture().and_then(|info| {
                recipe(info.texture(), TexelTransform::Identity, TextureFormat::Rgba8Srgb)
            }),
            metalness: metallic_roughness.as_ref().and_then(|info| {
                recipe(info.texture(), TexelTransform::channel(2), TextureFormat::R8Unorm)
            }),
            roughness: metallic_roughness.as_ref().and_then(|info| {
                recipe(info.texture(), TexelTransform::channel(1), TextureFormat::R8Unorm)
            }),
            normal: material.normal_texture().and_then(|normal| {
                recipe(
                    normal.texture(),
                    TexelTransform::Swizzle([Some(0), Some(1), None, None]),
                    TextureFormat::Rg8Unorm,
                )
            }),
            emission: material.emissive_texture().and_then(|info| {
                recipe(info.texture(), TexelTransform::Identity, TextureFormat::Rgba8Srgb)
            }),
            transmission: transmission
                .as_ref()
                .and_then(|t| t.transmission_texture())
                .and_then(|info| {
                    recipe(info.texture(), TexelTransform::channel(0), TextureFormat::R8Unorm)
                }),
            factors: MaterialFactors {
                albedo_alpha: Vec4::from(pbr.base_color_factor()),
                metalness: pbr.metallic_factor(),
                roughness: pbr.roughness_factor(),
                normal_scale: material.normal_texture().map_or(1.0, |normal| normal.scale()),
                emission: Vec3::from(material.emissive_factor()),
                transmission: transmission.as_ref().map_or(0.0, |t| t.transmission_factor()),
            },
        });
    }
}
