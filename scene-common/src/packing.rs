//! Normal/tangent codec and scalar quantizers
//!
//! Provides the pure encode/decode functions behind the packed [`Basis`]
//! record:
//! - signed octahedral encoding of unit normals (two unorm coordinates plus a
//!   hemisphere flag)
//! - diamond encoding of an in-plane tangent direction to one unorm scalar
//! - unorm10 / unorm8 quantizers used for storage
//!
//! Every encode/decode pair is exact before quantization; only the storage
//! quantizers lose precision.
//!
//! [`Basis`]: crate::Basis

use glam::{Vec2, Vec3};

/// Largest value representable in a 10-bit unsigned field
pub const UNORM10_MAX: u32 = 1023;

// ============================================================================
// Scalar Quantizers
// ============================================================================

/// Component sign, zero for zero
#[inline]
pub fn sign(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Convert f32 in [0.0, 1.0] to a 10-bit unsigned integer (truncating)
#[inline]
pub fn f32_to_unorm10(value: f32) -> u32 {
    (value.clamp(0.0, 1.0) * UNORM10_MAX as f32) as u32
}

/// Convert a 10-bit unsigned integer back to f32 in [0.0, 1.0]
#[inline]
pub fn unorm10_to_f32(value: u32) -> f32 {
    (value & UNORM10_MAX) as f32 / UNORM10_MAX as f32
}

/// Convert f32 to unsigned normalized 8-bit integer (unorm8)
///
/// Maps f32 range [0.0, 1.0] to u8 range [0, 255]. Truncates, so 0.999
/// maps to 254 rather than 255.
#[inline]
pub fn f32_to_unorm8(value: f32) -> u8 {
    let clamped = value.clamp(0.0, 1.0);
    (clamped * 255.0) as u8
}

// ============================================================================
// Normal Encoding
// ============================================================================

/// Encode a unit normal to signed octahedral coordinates
///
/// Returns `(x, y, s)` with every component in [0, 1]. `x`/`y` are the folded
/// octahedral coordinates, `s` is 1 for the upper hemisphere (`n.z > 0`).
#[inline]
pub fn encode_signed_octahedral(n: Vec3) -> Vec3 {
    let n = n / (n.x.abs() + n.y.abs() + n.z.abs());

    let y = n.y * 0.5 + 0.5;
    let x = n.x * 0.5 + y;
    let y = n.x * -0.5 + y;
    let s = (n.z * f32::MAX).clamp(0.0, 1.0);

    Vec3::new(x, y, s)
}

/// Decode signed octahedral coordinates back to a unit normal
#[inline]
pub fn decode_signed_octahedral(e: Vec3) -> Vec3 {
    let x = e.x - e.y;
    let y = (e.x + e.y) - 1.0;
    let z = (e.z * 2.0 - 1.0) * (1.0 - x.abs() - y.abs());

    Vec3::new(x, y, z).normalize()
}

/// Quantize a unit normal to `(oct_x, oct_y, oct_s)` storage fields
#[inline]
pub fn pack_normal_unorm10(n: Vec3) -> (u32, u32, bool) {
    let e = encode_signed_octahedral(n);
    (f32_to_unorm10(e.x), f32_to_unorm10(e.y), e.z >= 1.0)
}

/// Decode `(oct_x, oct_y, oct_s)` storage fields to a unit normal
#[inline]
pub fn unpack_normal_unorm10(oct_x: u32, oct_y: u32, oct_s: bool) -> Vec3 {
    decode_signed_octahedral(Vec3::new(
        unorm10_to_f32(oct_x),
        unorm10_to_f32(oct_y),
        if oct_s { 1.0 } else { 0.0 },
    ))
}

// ============================================================================
// Tangent Encoding
// ============================================================================

/// Canonical orthonormal basis `(t1, t2)` of the plane orthogonal to `normal`
///
/// Encode and decode must pick the same branch, otherwise the reconstructed
/// tangent frame is silently rotated.
#[inline]
pub fn tangent_plane_basis(normal: Vec3) -> (Vec3, Vec3) {
    let t1 = if normal.y.abs() > normal.z.abs() {
        // Orthogonal to n with z = 0
        Vec3::new(normal.y, -normal.x, 0.0)
    } else {
        // Orthogonal to n with y = 0
        Vec3::new(normal.z, 0.0, -normal.x)
    }
    .normalize();

    (t1, t1.cross(normal))
}

/// Encode a 2D direction on the unit diamond to a scalar in [0, 1]
///
/// The upper half plane (including the +x/-x axis) maps to [0.5, 1], the
/// lower half to [0, 0.5).
#[inline]
pub fn encode_diamond(p: Vec2) -> f32 {
    // Project to the unit diamond, then to the x-axis
    let x = p.x / (p.x.abs() + p.y.abs());

    let py_sign = if p.y >= 0.0 { 1.0 } else { -1.0 };
    -py_sign * 0.25 * x + 0.5 + py_sign * 0.25
}

/// Decode a diamond scalar back to a unit 2D direction
#[inline]
pub fn decode_diamond(p: f32) -> Vec2 {
    let p_sign = sign(p - 0.5);
    let x = -p_sign * 4.0 * p + 1.0 + p_sign * 2.0;
    let y = p_sign * (1.0 - x.abs());

    // Normalizing extends the diamond point back onto the unit circle
    Vec2::new(x, y).normalize()
}

/// Encode `tangent` (orthogonal to `normal`) as one scalar in [0, 1]
#[inline]
pub fn encode_tangent(normal: Vec3, tangent: Vec3) -> f32 {
    let (t1, t2) = tangent_plane_basis(normal);
    encode_diamond(Vec2::new(tangent.dot(t1), tangent.dot(t2)))
}

/// Decode a tangent scalar relative to `normal`
#[inline]
pub fn decode_tangent(normal: Vec3, diamond: f32) -> Vec3 {
    let (t1, t2) = tangent_plane_basis(normal);
    let d = decode_diamond(diamond);
    t1 * d.x + t2 * d.y
}
