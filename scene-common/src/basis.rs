//! Packed 32-bit tangent-space record
//!
//! # Layout
//! ```text
//! bits  0..10  oct_x   unorm10 octahedral X of the normal
//! bits 10..20  oct_y   unorm10 octahedral Y of the normal
//! bit  20      oct_s   normal hemisphere (1 = +Z)
//! bits 21..31  tgt_a   unorm10 diamond-encoded tangent angle
//! bit  31      btg_s   bitangent handedness
//! ```
//!
//! The layout is a compatibility contract with renderers reading
//! `Geometry::tangent_spaces`; it is expressed through shifts and masks on a
//! `u32`, never through struct layout.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::packing::{
    UNORM10_MAX, decode_tangent, encode_tangent, f32_to_unorm10, pack_normal_unorm10,
    unorm10_to_f32, unpack_normal_unorm10,
};

const OCT_X_SHIFT: u32 = 0;
const OCT_Y_SHIFT: u32 = 10;
const OCT_S_SHIFT: u32 = 20;
const TGT_A_SHIFT: u32 = 21;
const BTG_S_SHIFT: u32 = 31;

/// Packed normal + tangent + bitangent sign
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Basis(pub u32);

/// Tangent frame reconstructed from a [`Basis`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedBasis {
    pub normal: Vec3,
    pub tangent: Vec3,
    /// +1.0 when the bitangent follows `cross(normal, tangent)`, -1.0 otherwise
    pub bitangent_sign: f32,
}

impl DecodedBasis {
    pub fn bitangent(&self) -> Vec3 {
        self.normal.cross(self.tangent) * self.bitangent_sign
    }
}

impl Basis {
    pub const SIZE: usize = 4;

    /// Pack raw field values; values wider than their field are masked
    pub fn from_fields(oct_x: u32, oct_y: u32, oct_s: bool, tgt_a: u32, btg_s: bool) -> Self {
        Self(
            ((oct_x & UNORM10_MAX) << OCT_X_SHIFT)
                | ((oct_y & UNORM10_MAX) << OCT_Y_SHIFT)
                | ((oct_s as u32) << OCT_S_SHIFT)
                | ((tgt_a & UNORM10_MAX) << TGT_A_SHIFT)
                | ((btg_s as u32) << BTG_S_SHIFT),
        )
    }

    #[inline]
    pub fn oct_x(self) -> u32 {
        (self.0 >> OCT_X_SHIFT) & UNORM10_MAX
    }

    #[inline]
    pub fn oct_y(self) -> u32 {
        (self.0 >> OCT_Y_SHIFT) & UNORM10_MAX
    }

    #[inline]
    pub fn oct_s(self) -> bool {
        (self.0 >> OCT_S_SHIFT) & 1 != 0
    }

    #[inline]
    pub fn tgt_a(self) -> u32 {
        (self.0 >> TGT_A_SHIFT) & UNORM10_MAX
    }

    #[inline]
    pub fn btg_s(self) -> bool {
        (self.0 >> BTG_S_SHIFT) & 1 != 0
    }

    /// Quantize an orthonormal frame
    ///
    /// `normal` and `tangent` must be unit length and orthogonal. The tangent
    /// is encoded against the *decoded* quantized normal so a decoder, which
    /// only sees the quantized normal, rebuilds the same in-plane basis.
    pub fn encode(normal: Vec3, tangent: Vec3, bitangent_positive: bool) -> Self {
        let (oct_x, oct_y, oct_s) = pack_normal_unorm10(normal);
        let decoded_normal = unpack_normal_unorm10(oct_x, oct_y, oct_s);
        let tgt_a = f32_to_unorm10(encode_tangent(decoded_normal, tangent));

        Self::from_fields(oct_x, oct_y, oct_s, tgt_a, bitangent_positive)
    }

    pub fn decode_normal(self) -> Vec3 {
        unpack_normal_unorm10(self.oct_x(), self.oct_y(), self.oct_s())
    }

    pub fn decode(self) -> DecodedBasis {
        let normal = self.decode_normal();
        DecodedBasis {
            normal,
            tangent: decode_tangent(normal, unorm10_to_f32(self.tgt_a())),
            bitangent_sign: if self.btg_s() { 1.0 } else { -1.0 },
        }
    }

    pub fn to_le_bytes(self) -> [u8; Self::SIZE] {
        self.0.to_le_bytes()
    }
}
