//! Import statistics
//!
//! Counts describe the accumulated source model before scene generation.
//! "Effective" triangles count every mesh instance, so a geometry placed
//! three times contributes three times.

use std::fmt;

use crate::model::SourceModel;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStatistics {
    pub geometries: usize,
    pub meshes: usize,
    pub textures: usize,
    pub materials: usize,
    pub unique_vertices: u64,
    pub unique_indices: u64,
    pub unique_triangles: u64,
    pub effective_triangles: u64,
}

impl ImportStatistics {
    pub fn from_model(model: &SourceModel) -> Self {
        let unique_vertices = model
            .geometries
            .iter()
            .map(|g| g.vertex_count() as u64)
            .sum();
        let unique_indices = model
            .geometries
            .iter()
            .map(|g| g.indices.len() as u64)
            .sum();
        let unique_triangles = model
            .geometries
            .iter()
            .map(|g| g.triangle_count() as u64)
            .sum();
        let effective_triangles = model
            .meshes
            .iter()
            .filter_map(|mesh| model.geometries.get(mesh.geometry))
            .map(|g| g.triangle_count() as u64)
            .sum();

        Self {
            geometries: model.geometries.len(),
            meshes: model.meshes.len(),
            textures: model.textures.len(),
            materials: model.materials.len(),
            unique_vertices,
            unique_indices,
            unique_triangles,
            effective_triangles,
        }
    }
}

impl fmt::Display for ImportStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} geometries ({} vertices, {} indices, {} triangles), {} meshes ({} triangles drawn), {} textures, {} materials",
            self.geometries,
            self.unique_vertices,
            self.unique_indices,
            self.unique_triangles,
            self.meshes,
            self.effective_triangles,
            self.textures,
            self.materials
        )
    }
}

/// Log one line per geometry and mesh instance
pub fn log_detailed(model: &SourceModel) {
    for (index, geometry) in model.geometries.iter().enumerate() {
        tracing::info!(
            "Geometry {}: {} vertices, {} triangles, normals: {}, uvs: {}",
            index,
            geometry.vertex_count(),
            geometry.triangle_count(),
            geometry.normals.is_some(),
            geometry.tex_coords.is_some()
        );
    }
    for (index, mesh) in model.meshes.iter().enumerate() {
        tracing::info!(
            "Mesh {}: geometry {}, translation {:?}",
            index,
            mesh.geometry,
            mesh.transform.translation
        );
    }
}
