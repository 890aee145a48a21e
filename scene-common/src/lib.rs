//! Shared building blocks for the scene import pipeline
//!
//! This crate provides the storage and encoding layers used by
//! `scene-import` and by renderers consuming its output:
//!
//! # Modules
//!
//! - [`view`] - Strided, non-owning typed views over `Pod` storage
//! - [`arena`] - Per-run arena owning every output buffer
//! - [`packing`] - Octahedral/diamond codec and scalar quantizers
//! - [`basis`] - The packed 32-bit tangent-space record

pub mod arena;
pub mod basis;
pub mod packing;
pub mod view;

pub use arena::{Arena, ArenaError, Handle};
pub use basis::{Basis, DecodedBasis};
pub use view::{StridedView, StridedViewMut, ViewError};

// Re-export commonly used packing items
pub use packing::{
    decode_diamond, decode_signed_octahedral, decode_tangent, encode_diamond,
    encode_signed_octahedral, encode_tangent, f32_to_unorm8, f32_to_unorm10, pack_normal_unorm10,
    tangent_plane_basis, unorm10_to_f32, unpack_normal_unorm10, UNORM10_MAX,
};
