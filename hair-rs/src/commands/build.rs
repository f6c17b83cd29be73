//! Build a `.tfxb` asset from `.tfx` strand files

use anyhow::{Context, Result};
use console::style;
use hair_tfx::HairAssetBuilder;
use hair_tfx::tfxb::write_asset_to_path;
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::cli::PipelineSettings;
use crate::utils::{create_progress_bar, format_bytes};

/// Load every input file as its own group
pub(crate) fn load_inputs(
    inputs: &[PathBuf],
    settings: &PipelineSettings,
    quiet: bool,
) -> Result<HairAssetBuilder> {
    let mut builder =
        HairAssetBuilder::new(settings.options()).context("Invalid build settings")?;

    let pb = create_progress_bar(inputs.len() as u64, "Loading strands", quiet);
    for input in inputs {
        pb.set_message(format!("{}", input.display()));
        let kept = builder
            .load_path(input)
            .with_context(|| format!("Failed to load strand file: {}", input.display()))?;
        info!("{}: kept {} guide strands", input.display(), kept);
        pb.inc(1);
    }
    pb.finish_and_clear();

    if builder.store().guide_count() == 0 {
        warn!(
            "No guide strands left after loading; each file needs at least {} usable strands",
            settings.thread_group_size
        );
    }

    Ok(builder)
}

pub fn execute(
    inputs: &[PathBuf],
    output: &Path,
    settings: &PipelineSettings,
    quiet: bool,
) -> Result<()> {
    let builder = load_inputs(inputs, settings, quiet)?;
    let asset = builder.build().context("Failed to build hair asset")?;

    write_asset_to_path(output, &asset)
        .with_context(|| format!("Failed to write asset: {}", output.display()))?;

    if !quiet {
        println!(
            "✓ Wrote '{}': {} strands ({} guides), {} vertices, {}",
            style(output.display()).cyan(),
            style(asset.strand_count()).yellow(),
            asset.guide_strand_count,
            style(asset.vertex_count()).yellow(),
            format_bytes(asset.serialized_size() as u64)
        );
    }

    Ok(())
}
