//! Structural validation of hair assets

use crate::asset::HairAsset;
use crate::error::{HairError, Result};
use crate::types::StrandLayout;

/// Validates a hair asset for internal consistency
pub fn validate_asset(asset: &HairAsset) -> Result<()> {
    validate_array_lengths(asset)?;
    validate_strand_layout(asset)?;
    let strand_lengths = validate_line_indices(asset)?;
    validate_strand_lengths(asset, &strand_lengths)?;
    validate_triangle_indices(asset)?;
    validate_vertex_values(asset)?;
    validate_bounds(asset)?;
    Ok(())
}

fn check_len(what: &str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(HairError::ValidationError(format!(
            "{what} has {actual} entries, expected {expected}"
        )));
    }
    Ok(())
}

/// Every per-vertex and per-strand array matches its count
fn validate_array_lengths(asset: &HairAsset) -> Result<()> {
    let vertices = asset.vertex_count();
    let strands = asset.strand_count();

    check_len("reference vectors", asset.ref_vectors.len(), vertices)?;
    check_len("global rotations", asset.global_rotations.len(), vertices)?;
    check_len("local rotations", asset.local_rotations.len(), vertices)?;
    check_len("tangents", asset.tangents.len(), vertices)?;
    check_len("triangle vertices", asset.triangle_vertices.len(), vertices)?;
    check_len("thickness", asset.thickness.len(), vertices)?;
    check_len("rest lengths", asset.rest_lengths.len(), vertices)?;
    check_len("follow root offsets", asset.follow_root_offsets.len(), strands)?;

    if asset.guide_vertex_count > vertices {
        return Err(HairError::ValidationError(format!(
            "Guide vertex count {} exceeds vertex count {}",
            asset.guide_vertex_count, vertices
        )));
    }

    Ok(())
}

/// Guides and follows interleave and each follow points at its guide
fn validate_strand_layout(asset: &HairAsset) -> Result<()> {
    let layout = StrandLayout::new(asset.follows_per_guide);
    let expected = layout.strand_count(asset.guide_strand_count);
    if expected != asset.strand_count() {
        return Err(HairError::ValidationError(format!(
            "{} guides with {} follows each make {} strands, found {}",
            asset.guide_strand_count,
            asset.follows_per_guide,
            expected,
            asset.strand_count()
        )));
    }

    for (index, offset) in asset.follow_root_offsets.iter().enumerate() {
        let guide = layout.slot(index).guide_index;
        if offset.w != guide as f32 {
            return Err(HairError::ValidationError(format!(
                "Strand {index} references guide {}, expected {guide}",
                offset.w
            )));
        }
    }

    Ok(())
}

/// Line indices are consecutive vertex pairs; returns the vertex count of each strand
fn validate_line_indices(asset: &HairAsset) -> Result<Vec<usize>> {
    let vertices = asset.vertex_count();
    let lines = &asset.line_indices;

    if lines.len() % 2 != 0 {
        return Err(HairError::ValidationError(format!(
            "Odd number of line indices: {}",
            lines.len()
        )));
    }

    let mut has_next = vec![false; vertices];
    for pair in lines.chunks_exact(2) {
        let (a, b) = (pair[0] as usize, pair[1] as usize);
        if b != a + 1 || b >= vertices {
            return Err(HairError::ValidationError(format!(
                "Invalid line segment ({a}, {b}) for {vertices} vertices"
            )));
        }
        has_next[a] = true;
    }

    let mut strand_lengths = Vec::with_capacity(asset.strand_count());
    let mut current = 0usize;
    for (vertex, &linked) in has_next.iter().enumerate() {
        current += 1;
        if !linked {
            if asset.rest_lengths[vertex] != 0.0 {
                return Err(HairError::ValidationError(format!(
                    "Strand ending at vertex {vertex} has rest length {} instead of 0",
                    asset.rest_lengths[vertex]
                )));
            }
            strand_lengths.push(current);
            current = 0;
        }
    }

    if strand_lengths.len() != asset.strand_count() {
        return Err(HairError::ValidationError(format!(
            "Line indices describe {} strands, header has {}",
            strand_lengths.len(),
            asset.strand_count()
        )));
    }

    Ok(strand_lengths)
}

/// Strands respect the vertex limit and follows match their guide
fn validate_strand_lengths(asset: &HairAsset, strand_lengths: &[usize]) -> Result<()> {
    let layout = StrandLayout::new(asset.follows_per_guide);
    let mut guide_vertices = 0usize;

    for (index, &length) in strand_lengths.iter().enumerate() {
        if length > asset.max_vertices_per_strand {
            return Err(HairError::ValidationError(format!(
                "Strand {index} has {length} vertices, limit is {}",
                asset.max_vertices_per_strand
            )));
        }

        let slot = layout.slot(index);
        if slot.is_guide() {
            guide_vertices += length;
        } else if strand_lengths[slot.guide_index] != length {
            return Err(HairError::ValidationError(format!(
                "Follow strand {index} has {length} vertices, its guide has {}",
                strand_lengths[slot.guide_index]
            )));
        }
    }

    if guide_vertices != asset.guide_vertex_count {
        return Err(HairError::ValidationError(format!(
            "Guide strands hold {guide_vertices} vertices, header has {}",
            asset.guide_vertex_count
        )));
    }

    Ok(())
}

/// Two triangles per edge, all within the doubled ribbon vertex range
fn validate_triangle_indices(asset: &HairAsset) -> Result<()> {
    let expected = asset.line_indices.len() * 3;
    if asset.triangle_indices.len() != expected {
        return Err(HairError::ValidationError(format!(
            "{} triangle indices for {} edges, expected {expected}",
            asset.triangle_indices.len(),
            asset.line_indices.len() / 2
        )));
    }

    let limit = asset.vertex_count() * 2;
    if let Some(&index) = asset
        .triangle_indices
        .iter()
        .find(|&&index| index as usize >= limit)
    {
        return Err(HairError::ValidationError(format!(
            "Triangle index {index} out of range (max: {})",
            limit.saturating_sub(1)
        )));
    }

    Ok(())
}

/// Positions, render attributes and rest lengths are finite numbers
fn validate_vertex_values(asset: &HairAsset) -> Result<()> {
    let non_finite = |what: &str, index: usize| -> Result<()> {
        Err(HairError::ValidationError(format!(
            "Vertex {index} has a non-finite {what}"
        )))
    };

    for (index, position) in asset.positions.iter().enumerate() {
        if !position.is_finite() {
            return non_finite("position", index);
        }
    }
    for (index, vertex) in asset.triangle_vertices.iter().enumerate() {
        if !vertex.texcoord.is_finite() {
            return non_finite("texcoord", index);
        }
        if !vertex.tangent.is_finite() {
            return non_finite("tangent", index);
        }
    }
    for (index, (thickness, rest)) in asset.thickness.iter().zip(&asset.rest_lengths).enumerate() {
        if !thickness.is_finite() || !rest.is_finite() {
            return non_finite("thickness or rest length", index);
        }
    }

    Ok(())
}

fn validate_bounds(asset: &HairAsset) -> Result<()> {
    let sphere = &asset.bounding_sphere;
    if !sphere.center.is_finite() || !sphere.radius.is_finite() || sphere.radius < 0.0 {
        return Err(HairError::ValidationError(format!(
            "Invalid bounding sphere: centre {:?}, radius {}",
            sphere.center, sphere.radius
        )));
    }
    Ok(())
}
