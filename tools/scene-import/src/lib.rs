//! scene-import library
//!
//! Loads 3D models through pluggable format loaders and packs them into a
//! render-ready [`Scene`]: one merged geometry with packed tangent spaces,
//! deduplicated textures and flattened materials.

pub mod decode;
pub mod error;
pub mod importer;
pub mod loader;
pub mod model;
pub mod scene;
pub mod stats;

mod geometry;
mod material;

pub use decode::{DecodedImage, ImageCrateDecoder, ImageDecoder};
pub use error::{ImageDecodeError, ImportError, ProcessError};
pub use importer::Importer;
pub use loader::{LoaderConfig, LoaderEntry, ModelLoader};
pub use model::{
    Channel, MaterialFactors, SourceGeometry, SourceMaterial, SourceMesh, SourceModel,
    TexelTransform, TextureProcess, TextureSource,
};
pub use scene::{
    Geometry, GeometryRange, Material, Mesh, NO_TEXTURE, Scene, Texture, TextureFormat,
};
pub use stats::ImportStatistics;

// Re-export the packed record and storage types scene consumers need
pub use scene_common::{Arena, ArenaError, Basis, DecodedBasis, Handle, StridedView};
