//! Write the strand collection of a build back out as `.tfx` text

use anyhow::{Context, Result};
use console::style;
use hair_tfx::tfx::write_strands_to_path;
use std::path::{Path, PathBuf};

use crate::cli::PipelineSettings;
use crate::commands::build::load_inputs;

pub fn execute(
    inputs: &[PathBuf],
    output: &Path,
    settings: &PipelineSettings,
    quiet: bool,
) -> Result<()> {
    let builder = load_inputs(inputs, settings, quiet)?;
    let strands = builder.build_strands();

    write_strands_to_path(output, &strands)
        .with_context(|| format!("Failed to write strand file: {}", output.display()))?;

    if !quiet {
        println!(
            "✓ Wrote {} strands to '{}'",
            style(strands.len()).yellow(),
            style(output.display()).cyan()
        );
    }

    Ok(())
}
