//! Validate a `.tfxb` asset

use anyhow::{Context, Result};
use console::style;
use hair_tfx::tfxb::read_asset_from_path;
use hair_tfx::validate_asset;
use std::path::Path;

pub fn execute(path: &Path) -> Result<()> {
    let asset = read_asset_from_path(path)
        .with_context(|| format!("Failed to read asset: {}", path.display()))?;

    match validate_asset(&asset) {
        Ok(()) => {
            println!(
                "✓ Hair asset '{}' is valid ({} strands, {} vertices)",
                style(path.display()).cyan(),
                style(asset.strand_count()).yellow(),
                style(asset.vertex_count()).yellow()
            );
        }
        Err(err) => {
            anyhow::bail!("Validation failed: {}", err);
        }
    }

    Ok(())
}
