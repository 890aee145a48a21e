//! Import orchestration
//!
//! An [`Importer`] accumulates any number of files into one source model,
//! then [`Importer::generate_scene`] runs the geometry and material passes
//! into a fresh arena.

use std::path::{Path, PathBuf};

use scene_common::Arena;
use tracing::{info, warn};

use crate::decode::{ImageCrateDecoder, ImageDecoder};
use crate::error::{ImportError, ProcessError};
use crate::geometry::{merge_geometries, store_merged};
use crate::loader::LoaderConfig;
use crate::material::flatten_materials;
use crate::model::SourceModel;
use crate::scene::{Scene, SceneParts, assemble_meshes, store};
use crate::stats::ImportStatistics;

pub struct Importer {
    loaders: LoaderConfig,
    decoder: Box<dyn ImageDecoder>,
    base_dir: Option<PathBuf>,
    model: SourceModel,
    loaded_by: Vec<&'static str>,
}

impl Default for Importer {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl Importer {
    pub fn new(loaders: LoaderConfig) -> Self {
        Self {
            loaders,
            decoder: Box::new(ImageCrateDecoder),
            base_dir: None,
            model: SourceModel::default(),
            loaded_by: Vec::new(),
        }
    }

    pub fn with_decoder(mut self, decoder: impl ImageDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Directory relative references are resolved against
    ///
    /// Defaults to each input file's parent directory.
    pub fn set_base_dir(&mut self, base_dir: impl Into<PathBuf>) {
        self.base_dir = Some(base_dir.into());
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Load one file with the first loader that accepts it
    ///
    /// Returns `Ok(false)` when no loader claims the file; the model is left
    /// unchanged in that case.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<bool, ImportError> {
        let path = path.as_ref();
        let base_dir = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };

        info!("Loading {:?}", path);
        match self.loaders.load(&mut self.model, path, &base_dir)? {
            Some(name) => {
                self.loaded_by.push(name);
                Ok(true)
            }
            None => {
                warn!("No loader accepted {:?}", path);
                Ok(false)
            }
        }
    }

    /// Names of the loaders that imported each file, in load order
    pub fn loaded_by(&self) -> &[&'static str] {
        &self.loaded_by
    }

    pub fn model(&self) -> &SourceModel {
        &self.model
    }

    /// Direct access for callers that build the model themselves
    pub fn model_mut(&mut self) -> &mut SourceModel {
        &mut self.model
    }

    pub fn statistics(&self) -> ImportStatistics {
        ImportStatistics::from_model(&self.model)
    }

    /// Pack the accumulated model into a [`Scene`]
    pub fn generate_scene(self) -> Result<Scene, ProcessError> {
        let Importer { model, decoder, .. } = self;
        let mut arena = Arena::new();

        let merged = merge_geometries(&model.geometries, &mut arena)?;
        info!(
            "Merged {} geometries: {} vertices, {} indices",
            model.geometries.len(),
            merged.geometry.positions.len(),
            merged.geometry.indices.len()
        );
        let (geometries, geometry_ranges) = store_merged(merged, &mut arena)?;

        let flattened = flatten_materials(&model.textures, &model.materials, decoder.as_ref(), &mut arena)?;
        info!(
            "Flattened {} materials into {} textures",
            flattened.materials.len(),
            flattened.textures.len()
        );

        let meshes = assemble_meshes(&model.meshes, model.geometries.len())?;
        let meshes = store(&mut arena, meshes, "meshes")?;

        Ok(Scene::new(
            arena,
            SceneParts {
                geometries,
                geometry_ranges,
                textures: flattened.textures,
                materials: flattened.materials,
                meshes,
            },
        ))
    }
}
