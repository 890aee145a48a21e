//! Intermediate model populated by loaders
//!
//! Everything here is loader-neutral: positions, normals and UVs as plain
//! vectors, textures as references to encoded or decoded images, materials
//! as per-channel texture recipes. `generate_scene` consumes a
//! [`SourceModel`] and produces the packed [`Scene`](crate::Scene).

use std::path::PathBuf;

use glam::{Affine3A, Vec2, Vec3, Vec4};

use crate::decode::DecodedImage;
use crate::scene::TextureFormat;

/// One triangle list as read from the source asset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceGeometry {
    /// Triangle list, local to this geometry (length multiple of 3)
    pub indices: Vec<u32>,
    pub positions: Vec<Vec3>,
    /// Per-vertex normals; synthesized from faces when absent
    pub normals: Option<Vec<Vec3>>,
    /// First UV set; tangents stay zero-accumulated when absent
    pub tex_coords: Option<Vec<Vec2>>,
}

impl SourceGeometry {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            indices,
            positions,
            normals: None,
            tex_coords: None,
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_tex_coords(mut self, tex_coords: Vec<Vec2>) -> Self {
        self.tex_coords = Some(tex_coords);
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Placement of one geometry in the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceMesh {
    pub geometry: usize,
    pub transform: Affine3A,
}

/// Where the pixels of a texture come from
#[derive(Debug, Clone, PartialEq)]
pub enum TextureSource {
    /// Already decoded by the loader
    Decoded(DecodedImage),
    /// Encoded image bytes embedded in the asset
    Encoded {
        bytes: Vec<u8>,
        mime_type: Option<String>,
    },
    /// External image file, already resolved against the base directory
    FileUri(PathBuf),
}

/// Per-texel conversion applied before quantization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexelTransform {
    Identity,
    /// Output lane `i` reads source channel `lanes[i]`, or 0.0 when `None`
    Swizzle([Option<u8>; 4]),
}

impl TexelTransform {
    /// Move a single source channel into the first lane
    pub const fn channel(channel: u8) -> Self {
        Self::Swizzle([Some(channel), None, None, None])
    }

    pub fn apply(self, texel: Vec4) -> Vec4 {
        match self {
            Self::Identity => texel,
            Self::Swizzle(lanes) => {
                let source = texel.to_array();
                Vec4::from_array(lanes.map(|lane| {
                    lane.and_then(|c| source.get(c as usize).copied())
                        .unwrap_or(0.0)
                }))
            }
        }
    }
}

/// Recipe for one output texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureProcess {
    /// Index into [`SourceModel::textures`]
    pub source: usize,
    pub transform: TexelTransform,
    pub format: TextureFormat,
}

impl TextureProcess {
    pub fn new(source: usize, transform: TexelTransform, format: TextureFormat) -> Self {
        Self {
            source,
            transform,
            format,
        }
    }
}

/// Material channels that may carry a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    AlbedoAlpha,
    Metalness,
    Roughness,
    Normal,
    Emission,
    Transmission,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::AlbedoAlpha,
        Channel::Metalness,
        Channel::Roughness,
        Channel::Normal,
        Channel::Emission,
        Channel::Transmission,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Channel::AlbedoAlpha => "albedo-alpha",
            Channel::Metalness => "metalness",
            Channel::Roughness => "roughness",
            Channel::Normal => "normal",
            Channel::Emission => "emission",
            Channel::Transmission => "transmission",
        }
    }
}

/// Constant values used where a channel has no texture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialFactors {
    pub albedo_alpha: Vec4,
    pub metalness: f32,
    pub roughness: f32,
    pub normal_scale: f32,
    pub emission: Vec3,
    pub transmission: f32,
}

impl Default for MaterialFactors {
    fn default() -> Self {
        Self {
            albedo_alpha: Vec4::ONE,
            metalness: 1.0,
            roughness: 1.0,
            normal_scale: 1.0,
            emission: Vec3::ZERO,
            transmission: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMaterial {
    pub albedo_alpha: Option<TextureProcess>,
    pub metalness: Option<TextureProcess>,
    pub roughness: Option<TextureProcess>,
    pub normal: Option<TextureProcess>,
    pub emission: Option<TextureProcess>,
    pub transmission: Option<TextureProcess>,
    pub factors: MaterialFactors,
}

impl SourceMaterial {
    pub fn channel(&self, channel: Channel) -> Option<&TextureProcess> {
        match channel {
            Channel::AlbedoAlpha => self.albedo_alpha.as_ref(),
            Channel::Metalness => self.metalness.as_ref(),
            Channel::Roughness => self.roughness.as_ref(),
            Channel::Normal => self.normal.as_ref(),
            Channel::Emission => self.emission.as_ref(),
            Channel::Transmission => self.transmission.as_ref(),
        }
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut Option<TextureProcess> {
        match channel {
            Channel::AlbedoAlpha => &mut self.albedo_alpha,
            Channel::Metalness => &mut self.metalness,
            Channel::Roughness => &mut self.roughness,
            Channel::Normal => &mut self.normal,
            Channel::Emission => &mut self.emission,
            Channel::Transmission => &mut self.transmission,
        }
    }
}

/// Everything the loaders accumulated for one import run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceModel {
    pub geometries: Vec<SourceGeometry>,
    pub meshes: Vec<SourceMesh>,
    pub textures: Vec<TextureSource>,
    pub materials: Vec<SourceMaterial>,
}

impl SourceModel {
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
            && self.meshes.is_empty()
            && self.textures.is_empty()
            && self.materials.is_empty()
    }
}
