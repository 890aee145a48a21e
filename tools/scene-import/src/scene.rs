//! Packed output scene
//!
//! All buffers live in one [`Arena`] owned by the [`Scene`]; the public
//! types only carry handles into it. Dropping the scene releases every
//! buffer at once.

use bytemuck::{Pod, Zeroable};
use glam::{Affine3A, UVec2, Vec3};
use scene_common::{Arena, ArenaError, Basis, Handle, StridedView};

use crate::error::{ProcessError, to_u32};
use crate::model::{MaterialFactors, SourceMesh};

// ============================================================================
// Output types
// ============================================================================

/// Texel storage format of an output texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8Srgb,
    Rgba8Unorm,
    Rg8Unorm,
    R8Unorm,
}

impl TextureFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            TextureFormat::Rgba8Srgb | TextureFormat::Rgba8Unorm => 4,
            TextureFormat::Rg8Unorm => 2,
            TextureFormat::R8Unorm => 1,
        }
    }
}

/// Merged vertex and index buffers of every source geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Concatenated per-geometry indices, not rebased
    pub indices: Handle<u32>,
    pub positions: Handle<Vec3>,
    pub tangent_spaces: Handle<Basis>,
}

/// Slice of the merged buffers belonging to one source geometry
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct GeometryRange {
    pub source_index: u32,
    /// Added to every index of the range when drawing
    pub vertex_offset: u32,
    /// Largest local index the range may reference
    pub max_vertex: u32,
    pub first_index: u32,
    pub triangle_count: u32,
}

impl GeometryRange {
    /// Indices drawn for the range's triangles
    pub fn index_count(&self) -> usize {
        self.triangle_count as usize * 3
    }

    pub fn vertex_count(&self) -> usize {
        self.max_vertex as usize + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture {
    pub data: Handle<u8>,
    pub size: UVec2,
    pub format: TextureFormat,
}

/// Marks a material channel without texture
pub const NO_TEXTURE: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub albedo_alpha_texture: i32,
    pub metalness_texture: i32,
    pub roughness_texture: i32,
    pub normal_texture: i32,
    pub emission_texture: i32,
    pub transmission_texture: i32,
    pub factors: MaterialFactors,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo_alpha_texture: NO_TEXTURE,
            metalness_texture: NO_TEXTURE,
            roughness_texture: NO_TEXTURE,
            normal_texture: NO_TEXTURE,
            emission_texture: NO_TEXTURE,
            transmission_texture: NO_TEXTURE,
            factors: MaterialFactors::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mesh {
    /// Index into [`Scene::geometry_ranges`]
    pub geometry_range: u32,
    pub transform: Affine3A,
}

// ============================================================================
// Scene
// ============================================================================

pub struct Scene {
    arena: Arena,
    geometries: Handle<Geometry>,
    geometry_ranges: Handle<GeometryRange>,
    textures: Handle<Texture>,
    materials: Handle<Material>,
    meshes: Handle<Mesh>,
}

/// Handles produced by the generation passes
pub(crate) struct SceneParts {
    pub geometries: Handle<Geometry>,
    pub geometry_ranges: Handle<GeometryRange>,
    pub textures: Handle<Texture>,
    pub materials: Handle<Material>,
    pub meshes: Handle<Mesh>,
}

impl Scene {
    pub(crate) fn new(arena: Arena, parts: SceneParts) -> Self {
        Self {
            arena,
            geometries: parts.geometries,
            geometry_ranges: parts.geometry_ranges,
            textures: parts.textures,
            materials: parts.materials,
            meshes: parts.meshes,
        }
    }

    /// Always exactly one merged geometry
    pub fn geometries(&self) -> Result<&[Geometry], ArenaError> {
        self.arena.slice(self.geometries)
    }

    pub fn geometry_ranges(&self) -> Result<&[GeometryRange], ArenaError> {
        self.arena.slice(self.geometry_ranges)
    }

    pub fn textures(&self) -> Result<&[Texture], ArenaError> {
        self.arena.slice(self.textures)
    }

    pub fn materials(&self) -> Result<&[Material], ArenaError> {
        self.arena.slice(self.materials)
    }

    pub fn meshes(&self) -> Result<&[Mesh], ArenaError> {
        self.arena.slice(self.meshes)
    }

    /// Resolve any handle stored in the scene's output types
    pub fn slice<T: 'static>(&self, handle: Handle<T>) -> Result<&[T], ArenaError> {
        self.arena.slice(handle)
    }

    pub fn view<T: Pod>(&self, handle: Handle<T>) -> Result<StridedView<'_, T>, ArenaError> {
        self.arena.view(handle)
    }

    pub fn texture_data(&self, texture: &Texture) -> Result<&[u8], ArenaError> {
        self.arena.slice(texture.data)
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("geometry_ranges", &self.geometry_ranges.len())
            .field("textures", &self.textures.len())
            .field("materials", &self.materials.len())
            .field("meshes", &self.meshes.len())
            .finish()
    }
}

// ============================================================================
// Arena helpers
// ============================================================================

/// Allocate a default-initialized output buffer
pub(crate) fn reserve<T>(
    arena: &mut Arena,
    count: usize,
    what: &'static str,
) -> Result<Handle<T>, ProcessError>
where
    T: Default + Clone + Send + Sync + 'static,
{
    arena
        .allocate(count)
        .ok_or(ProcessError::OutOfMemory { what, count })
}

/// Move a filled buffer into the arena
pub(crate) fn store<T: Send + Sync + 'static>(
    arena: &mut Arena,
    data: Vec<T>,
    what: &'static str,
) -> Result<Handle<T>, ProcessError> {
    let count = data.len();
    arena
        .adopt(data)
        .ok_or(ProcessError::OutOfMemory { what, count })
}

/// One mesh per source instance, pointing at the range of its geometry
pub(crate) fn assemble_meshes(
    meshes: &[SourceMesh],
    geometry_count: usize,
) -> Result<Vec<Mesh>, ProcessError> {
    meshes
        .iter()
        .enumerate()
        .map(|(index, mesh)| {
            if mesh.geometry >= geometry_count {
                return Err(ProcessError::DanglingGeometry {
                    mesh: index,
                    geometry: mesh.geometry,
                    geometry_count,
                });
            }
            Ok(Mesh {
                geometry_range: to_u32(mesh.geometry, "geometry range")?,
                transform: mesh.transform,
            })
        })
        .collect()
}
