//! Material and texture flattening
//!
//! Each material channel names a texture recipe (source image, texel
//! transform, output format). Identical recipes are processed once and
//! shared; output textures are numbered in first-reference order, walking
//! materials then channels. Only sources that some recipe references are
//! decoded.

use glam::{UVec2, Vec4};
use hashbrown::HashMap;
use rayon::prelude::*;
use scene_common::{Arena, Handle, f32_to_unorm8};
use tracing::warn;

use crate::decode::ImageDecoder;
use crate::error::{ImageDecodeError, ProcessError};
use crate::model::{Channel, SourceMaterial, TextureProcess, TextureSource};
use crate::scene::{Material, NO_TEXTURE, Texture, reserve, store};

pub(crate) struct FlattenedMaterials {
    pub textures: Handle<Texture>,
    pub materials: Handle<Material>,
}

/// Deduplicated recipe list in first-reference order
#[derive(Default)]
struct RecipeTable {
    index: HashMap<TextureProcess, i32>,
    recipes: Vec<TextureProcess>,
}

impl RecipeTable {
    fn resolve(
        &mut self,
        material: usize,
        channel: Channel,
        process: Option<&TextureProcess>,
        source_count: usize,
    ) -> i32 {
        let Some(process) = process else {
            return NO_TEXTURE;
        };
        if process.source >= source_count {
            warn!(
                "Material {} {} texture references missing source {}; using factor",
                material,
                channel.name(),
                process.source
            );
            return NO_TEXTURE;
        }
        let next = self.recipes.len() as i32;
        *self.index.entry(*process).or_insert_with(|| {
            self.recipes.push(*process);
            next
        })
    }
}

/// Decoded source image expanded to float RGBA
struct Texels {
    size: UVec2,
    data: Handle<Vec4>,
}

pub(crate) fn flatten_materials(
    sources: &[TextureSource],
    materials: &[SourceMaterial],
    decoder: &dyn ImageDecoder,
    arena: &mut Arena,
) -> Result<FlattenedMaterials, ProcessError> {
    let mut table = RecipeTable::default();
    let mut flattened = Vec::with_capacity(materials.len());

    for (index, material) in materials.iter().enumerate() {
        let mut resolve = |channel: Channel| table.resolve(index, channel, material.channel(channel), sources.len());
        flattened.push(Material {
            albedo_alpha_texture: resolve(Channel::AlbedoAlpha),
            metalness_texture: resolve(Channel::Metalness),
            roughness_texture: resolve(Channel::Roughness),
            normal_texture: resolve(Channel::Normal),
            emission_texture: resolve(Channel::Emission),
            transmission_texture: resolve(Channel::Transmission),
            factors: material.factors,
        });
    }

    let texels = decode_referenced(sources, &table.recipes, decoder, arena)?;

    let textures = table
        .recipes
        .iter()
        .map(|recipe| process_texture(recipe, &texels[&recipe.source], arena))
        .collect::<Result<Vec<_>, _>>()?;

    for input in texels.into_values() {
        arena.free(input.data)?;
    }

    Ok(FlattenedMaterials {
        textures: store(arena, textures, "textures")?,
        materials: store(arena, flattened, "materials")?,
    })
}

/// Decode every source a recipe references, in parallel
fn decode_referenced(
    sources: &[TextureSource],
    recipes: &[TextureProcess],
    decoder: &dyn ImageDecoder,
    arena: &mut Arena,
) -> Result<HashMap<usize, Texels>, ProcessError> {
    let mut referenced: Vec<usize> = recipes.iter().map(|r| r.source).collect();
    referenced.sort_unstable();
    referenced.dedup();

    let decoded = referenced
        .par_iter()
        .map(|&source| {
            load_texels(&sources[source], decoder)
                .map(|(size, data)| (source, size, data))
                .map_err(|err| ProcessError::ImageDecode {
                    texture: source,
                    source: err,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    decoded
        .into_iter()
        .map(|(source, size, data)| {
            let data = store(arena, data, "decoded texels")?;
            Ok((source, Texels { size, data }))
        })
        .collect()
}

fn load_texels(
    source: &TextureSource,
    decoder: &dyn ImageDecoder,
) -> Result<(UVec2, Vec<Vec4>), ImageDecodeError> {
    let owned;
    let image = match source {
        TextureSource::Decoded(image) => image,
        TextureSource::Encoded { bytes, mime_type } => {
            owned = decoder.decode_bytes(bytes, mime_type.as_deref())?;
            &owned
        }
        TextureSource::FileUri(path) => {
            owned = decoder.decode_file(path)?;
            &owned
        }
    };
    Ok((image.size(), image.to_rgba_f32()?))
}

/// Transform and quantize one recipe into a packed output texture
fn process_texture(
    recipe: &TextureProcess,
    input: &Texels,
    arena: &mut Arena,
) -> Result<Texture, ProcessError> {
    let bytes_per_pixel = recipe.format.bytes_per_pixel();
    let count = input
        .data
        .len()
        .checked_mul(bytes_per_pixel)
        .ok_or(ProcessError::CountOverflow {
            what: "texture byte",
            count: input.data.len(),
        })?;
    let data = reserve::<u8>(arena, count, "texture bytes")?;

    let (out, texels) = arena.pair_mut(data, input.data)?;
    out.par_chunks_mut(bytes_per_pixel)
        .zip(texels.par_iter())
        .for_each(|(pixel, texel)| {
            let value = recipe.transform.apply(*texel).to_array();
            for (byte, lane) in pixel.iter_mut().zip(value) {
                *byte = f32_to_unorm8(lane);
            }
        });

    Ok(Texture {
        data,
        size: input.size,
        format: recipe.format,
    })
}
