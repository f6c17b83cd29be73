//! Display information about a `.tfxb` asset

use anyhow::{Context, Result};
use hair_tfx::tfxb::read_asset_from_path;
use std::path::Path;

use crate::utils::{add_property, create_property_table, format_bytes, format_point, format_share};

pub fn execute(path: &Path) -> Result<()> {
    let asset = read_asset_from_path(path)
        .with_context(|| format!("Failed to read asset: {}", path.display()))?;

    println!("Hair asset: {}", path.display());
    println!();

    let sphere = asset.bounding_sphere;
    let mut table = create_property_table();
    add_property(&mut table, "Size", format_bytes(asset.serialized_size() as u64));
    add_property(&mut table, "Strands", asset.strand_count());
    add_property(
        &mut table,
        "Guide strands",
        format_share(asset.guide_strand_count, asset.strand_count()),
    );
    add_property(&mut table, "Follows per guide", asset.follows_per_guide);
    add_property(&mut table, "Vertices", asset.vertex_count());
    add_property(
        &mut table,
        "Guide vertices",
        format_share(asset.guide_vertex_count, asset.vertex_count()),
    );
    add_property(&mut table, "Max vertices per strand", asset.max_vertices_per_strand);
    add_property(&mut table, "Groups", group_summary(&asset.group_ids));
    add_property(&mut table, "Line indices", asset.line_indices.len());
    add_property(&mut table, "Triangle indices", asset.triangle_indices.len());
    add_property(&mut table, "Bounding centre", format_point(sphere.center.to_array()));
    add_property(&mut table, "Bounding radius", format!("{:.3}", sphere.radius));
    table.printstd();

    Ok(())
}

/// Strand count per group id, e.g. `0: 120, 1: 48`
fn group_summary(group_ids: &[u32]) -> String {
    let mut counts: Vec<(u32, usize)> = Vec::new();
    for &id in group_ids {
        match counts.iter_mut().find(|(group, _)| *group == id) {
            Some((_, count)) => *count += 1,
            None => counts.push((id, 1)),
        }
    }
    counts.sort_unstable();

    if counts.is_empty() {
        return "none".to_string();
    }
    counts
        .iter()
        .map(|(group, count)| format!("{group}: {count}"))
        .collect::<Vec<_>>()
        .join(", ")
}
