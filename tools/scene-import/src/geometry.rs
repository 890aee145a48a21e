//! Geometry merge and tangent-space synthesis
//!
//! Concatenates every source geometry into one index, position and packed
//! basis buffer. Per-vertex frames are accumulated from faces, area
//! weighted, in a scratch block that is reused across geometries and freed
//! before returning. Quantization into [`Basis`] runs on the rayon pool.

use std::mem::offset_of;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use rayon::prelude::*;
use scene_common::{Arena, Basis, Handle, StridedView, StridedViewMut, tangent_plane_basis};

use crate::error::{ProcessError, to_u32};
use crate::model::SourceGeometry;
use crate::scene::{Geometry, GeometryRange, reserve, store};

/// Unnormalized frame accumulated per vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
struct VertexBasis {
    normal: Vec3,
    tangent: Vec3,
    bitangent: Vec3,
}

#[derive(Debug)]
pub(crate) struct MergedGeometry {
    pub geometry: Geometry,
    pub ranges: Vec<GeometryRange>,
}

struct Layout {
    ranges: Vec<GeometryRange>,
    vertex_count: usize,
    index_count: usize,
    max_vertices: usize,
}

// ============================================================================
// Layout
// ============================================================================

fn layout(geometries: &[SourceGeometry]) -> Result<Layout, ProcessError> {
    let mut ranges = Vec::with_capacity(geometries.len());
    let mut vertex_count = 0usize;
    let mut index_count = 0usize;
    let mut max_vertices = 0usize;

    for (index, geometry) in geometries.iter().enumerate() {
        let vertices = geometry.positions.len();
        if vertices == 0 {
            return Err(ProcessError::EmptyGeometry { geometry: index });
        }
        check_attribute(index, "normals", geometry.normals.as_ref().map(Vec::len), vertices)?;
        check_attribute(index, "tex_coords", geometry.tex_coords.as_ref().map(Vec::len), vertices)?;

        ranges.push(GeometryRange {
            source_index: to_u32(index, "geometry")?,
            vertex_offset: to_u32(vertex_count, "vertex")?,
            max_vertex: to_u32(vertices - 1, "vertex")?,
            first_index: to_u32(index_count, "index")?,
            triangle_count: to_u32(geometry.triangle_count(), "triangle")?,
        });

        vertex_count += vertices;
        index_count += geometry.indices.len();
        max_vertices = max_vertices.max(vertices);
    }

    to_u32(vertex_count, "vertex")?;
    to_u32(index_count, "index")?;

    Ok(Layout {
        ranges,
        vertex_count,
        index_count,
        max_vertices,
    })
}

fn check_attribute(
    geometry: usize,
    attribute: &'static str,
    len: Option<usize>,
    expected: usize,
) -> Result<(), ProcessError> {
    match len {
        Some(actual) if actual != expected => Err(ProcessError::AttributeLength {
            geometry,
            attribute,
            actual,
            expected,
        }),
        _ => Ok(()),
    }
}

// ============================================================================
// Merge
// ============================================================================

/// Merge all source geometries into arena-owned buffers
///
/// Returns the merged [`Geometry`] and one [`GeometryRange`] per source
/// geometry, in source order.
pub(crate) fn merge_geometries(
    geometries: &[SourceGeometry],
    arena: &mut Arena,
) -> Result<MergedGeometry, ProcessError> {
    let layout = layout(geometries)?;

    let indices = reserve::<u32>(arena, layout.index_count, "indices")?;
    let positions = reserve::<Vec3>(arena, layout.vertex_count, "positions")?;
    let tangent_spaces = reserve::<Basis>(arena, layout.vertex_count, "tangent spaces")?;
    let scratch = reserve::<VertexBasis>(arena, layout.max_vertices, "vertex frames")?;

    for (index, (geometry, range)) in geometries.iter().zip(&layout.ranges).enumerate() {
        let vertices = geometry.positions.len();
        let first_vertex = range.vertex_offset as usize;

        StridedView::from_slice(&geometry.indices).copy_to(
            &mut arena
                .view_mut(indices)?
                .into_slice(range.first_index as usize, Some(geometry.indices.len()))?,
        )?;
        StridedView::from_slice(&geometry.positions).copy_to(
            &mut arena
                .view_mut(positions)?
                .into_slice(first_vertex, Some(vertices))?,
        )?;

        let (out, frames) = arena.pair_mut(tangent_spaces, scratch)?;
        let frames = &mut frames[..vertices];
        frames.fill(VertexBasis::default());

        if let Some(normals) = &geometry.normals {
            let mut seeded = StridedViewMut::field_of(frames, offset_of!(VertexBasis, normal))?;
            StridedView::from_slice(normals).copy_to(&mut seeded)?;
        }

        accumulate_frames(index, geometry, frames)?;
        quantize_frames(frames, &mut out[first_vertex..first_vertex + vertices]);
    }

    arena.free(scratch)?;

    Ok(MergedGeometry {
        geometry: Geometry {
            indices,
            positions,
            tangent_spaces,
        },
        ranges: layout.ranges,
    })
}

/// Store the merged buffers' descriptors in the arena
pub(crate) fn store_merged(
    merged: MergedGeometry,
    arena: &mut Arena,
) -> Result<(Handle<Geometry>, Handle<GeometryRange>), ProcessError> {
    let geometries = store(arena, vec![merged.geometry], "geometries")?;
    let ranges = store(arena, merged.ranges, "geometry ranges")?;
    Ok((geometries, ranges))
}

// ============================================================================
// Tangent-space synthesis
// ============================================================================

/// Area-weighted face accumulation
///
/// Normals are only accumulated when the geometry has none of its own.
/// Zero-area triangles and trailing indices that do not complete a triangle
/// contribute nothing.
fn accumulate_frames(
    geometry_index: usize,
    geometry: &SourceGeometry,
    frames: &mut [VertexBasis],
) -> Result<(), ProcessError> {
    let synthesize_normals = geometry.normals.is_none();
    let vertices = geometry.positions.len();

    for (triangle, corners) in geometry.indices.chunks_exact(3).enumerate() {
        let mut ids = [0usize; 3];
        for (corner, &index) in corners.iter().enumerate() {
            if index as usize >= vertices {
                return Err(ProcessError::IndexOutOfRange {
                    geometry: geometry_index,
                    position: triangle * 3 + corner,
                    index,
                    vertex_count: vertices,
                });
            }
            ids[corner] = index as usize;
        }

        let [p1, p2, p3] = ids.map(|i| geometry.positions[i]);
        let v12 = p2 - p1;
        let v13 = p3 - p1;
        let cross = v12.cross(v13);
        let area = 0.5 * cross.length();
        if area == 0.0 {
            continue;
        }
        let face_normal = cross / (2.0 * area);

        let (tangent, bitangent) = match &geometry.tex_coords {
            Some(uv) => face_tangents(v12, v13, uv[ids[1]] - uv[ids[0]], uv[ids[2]] - uv[ids[0]]),
            None => (Vec3::ZERO, Vec3::ZERO),
        };

        for id in ids {
            let frame = &mut frames[id];
            if synthesize_normals {
                frame.normal += area * face_normal;
            }
            frame.tangent += area * tangent;
            frame.bitangent += area * bitangent;
        }
    }

    Ok(())
}

/// Face tangent and bitangent from edge and UV deltas
///
/// Returns zero vectors when the UV mapping is singular.
fn face_tangents(v12: Vec3, v13: Vec3, u12: Vec2, u13: Vec2) -> (Vec3, Vec3) {
    let f = 1.0 / (u12.x * u13.y - u13.x * u12.y);
    if !f.is_finite() {
        return (Vec3::ZERO, Vec3::ZERO);
    }
    let tangent = f * (u13.y * v12 - u12.y * v13);
    let bitangent = f * (u13.x * v12 - u12.x * v13);
    (tangent, bitangent)
}

/// Normalize, re-orthogonalize and pack every vertex frame
fn quantize_frames(frames: &[VertexBasis], out: &mut [Basis]) {
    out.par_iter_mut()
        .zip(frames.par_iter())
        .for_each(|(basis, frame)| *basis = quantize_frame(frame));
}

fn quantize_frame(frame: &VertexBasis) -> Basis {
    let normal = frame.normal.try_normalize().unwrap_or(Vec3::Z);
    let tangent = frame
        .tangent
        .try_normalize()
        .and_then(|t| (t - normal * t.dot(normal)).try_normalize())
        .unwrap_or_else(|| tangent_plane_basis(normal).0);
    let bitangent = frame.bitangent.normalize_or_zero();

    Basis::encode(normal, tangent, normal.cross(tangent).dot(bitangent) > 0.0)
}
