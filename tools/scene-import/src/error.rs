//! Error types for loading and scene generation
//!
//! Every variant here is fatal for the run. Degraded conditions (no matching
//! loader, unresolved texture references) are logged and never surface as
//! errors.

use std::path::PathBuf;

use scene_common::{ArenaError, ViewError};

/// Loader failure (malformed or unreadable source asset)
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Failed to load glTF {path:?}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("{loader} loader rejected {path:?}: {message}")]
    Malformed {
        loader: &'static str,
        path: PathBuf,
        message: String,
    },
}

/// Image-decode collaborator failure
#[derive(Debug, thiserror::Error)]
pub enum ImageDecodeError {
    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("{width}x{height} RGBA8 image needs {expected} bytes, buffer holds {actual}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Scene generation failure
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to decode texture {texture}: {source}")]
    ImageDecode {
        texture: usize,
        #[source]
        source: ImageDecodeError,
    },

    #[error("geometry {geometry} has no positions")]
    EmptyGeometry { geometry: usize },

    #[error("geometry {geometry}: {attribute} has {actual} entries, positions have {expected}")]
    AttributeLength {
        geometry: usize,
        attribute: &'static str,
        actual: usize,
        expected: usize,
    },

    #[error("geometry {geometry}: index {index} at position {position} exceeds vertex count {vertex_count}")]
    IndexOutOfRange {
        geometry: usize,
        position: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("mesh {mesh} references geometry {geometry}, but only {geometry_count} exist")]
    DanglingGeometry {
        mesh: usize,
        geometry: usize,
        geometry_count: usize,
    },

    #[error("{what} count {count} does not fit in 32 bits")]
    CountOverflow { what: &'static str, count: usize },

    #[error("Failed to allocate {count} {what}")]
    OutOfMemory { what: &'static str, count: usize },

    #[error(transparent)]
    Arena(#[from] ArenaError),

    #[error(transparent)]
    View(#[from] ViewError),
}

/// Convert a count to a 32-bit output field
pub(crate) fn to_u32(count: usize, what: &'static str) -> Result<u32, ProcessError> {
    u32::try_from(count).map_err(|_| ProcessError::CountOverflow { what, count })
}
