//! Format loaders
//!
//! A [`LoaderConfig`] is an ordered list of loader entries. For each input
//! file a fresh loader is created from every entry whose `accepts` check
//! passes, in order; the first one that reports success owns the file.

pub mod gltf;

use std::path::Path;

use crate::error::ImportError;
use crate::model::SourceModel;

/// A format plugin that appends one file's contents to a [`SourceModel`]
pub trait ModelLoader {
    /// Import `path`, resolving relative references against `base_dir`
    ///
    /// Returns `Ok(false)` without touching `model` when the file is not in
    /// this loader's format. Errors are reserved for files the loader does
    /// recognize but cannot read.
    fn import(
        &mut self,
        model: &mut SourceModel,
        path: &Path,
        base_dir: &Path,
    ) -> Result<bool, ImportError>;
}

/// Registration record for one loader
#[derive(Clone, Copy)]
pub struct LoaderEntry {
    pub name: &'static str,
    /// Cheap pre-check, usually on the file extension
    pub accepts: fn(&Path) -> bool,
    pub create: fn() -> Box<dyn ModelLoader>,
}

impl std::fmt::Debug for LoaderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderEntry").field("name", &self.name).finish()
    }
}

/// Ordered loader registry
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    entries: Vec<LoaderEntry>,
}

impl Default for LoaderConfig {
    /// Every built-in loader
    fn default() -> Self {
        Self::empty().with_loader(gltf::GLTF_LOADER)
    }
}

impl LoaderConfig {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_loader(mut self, entry: LoaderEntry) -> Self {
        self.register(entry);
        self
    }

    pub fn register(&mut self, entry: LoaderEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LoaderEntry] {
        &self.entries
    }

    /// Run loaders in registration order until one accepts the file
    ///
    /// Returns the name of the loader that imported it.
    pub fn load(
        &self,
        model: &mut SourceModel,
        path: &Path,
        base_dir: &Path,
    ) -> Result<Option<&'static str>, ImportError> {
        for entry in &self.entries {
            if !(entry.accepts)(path) {
                continue;
            }
            let mut loader = (entry.create)();
            if loader.import(model, path, base_dir)? {
                return Ok(Some(entry.name));
            }
            tracing::debug!("{} loader declined {:?}", entry.name, path);
        }
        Ok(None)
    }
}

/// Case-insensitive extension check
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}
