//! Root CLI structure for hair-rs

use clap::{Args, Parser, Subcommand};
use hair_tfx::BuildOptions;
use hair_tfx::store::{DEFAULT_THREAD_GROUP_SIZE, MAX_GROUPS};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hair-rs")]
#[command(about = "Build and inspect simulation-ready hair strand assets", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Options shared by every command that runs the strand pipeline
#[derive(Args, Debug, Clone)]
pub struct PipelineSettings {
    /// Guides per input file are truncated to a multiple of this
    #[arg(long, default_value_t = DEFAULT_THREAD_GROUP_SIZE, value_name = "N")]
    pub thread_group_size: usize,

    /// Seed for follow-strand placement (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl PipelineSettings {
    /// Library build options for these settings
    pub fn options(&self) -> BuildOptions {
        BuildOptions {
            thread_group_size: self.thread_group_size,
            seed: self.seed,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a .tfxb asset from up to four .tfx files
    Build {
        /// Input .tfx files; each file becomes one group
        #[arg(required = true, num_args = 1..=MAX_GROUPS)]
        inputs: Vec<PathBuf>,

        /// Path to write the .tfxb asset
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        settings: PipelineSettings,
    },

    /// Display information about a .tfxb asset
    Info {
        /// Path to the .tfxb file
        file: PathBuf,
    },

    /// Validate a .tfxb asset
    Validate {
        /// Path to the .tfxb file
        file: PathBuf,
    },

    /// Write the guide and follow strands of a build as .tfx text
    DumpStrands {
        /// Input .tfx files; each file becomes one group
        #[arg(required = true, num_args = 1..=MAX_GROUPS)]
        inputs: Vec<PathBuf>,

        /// Path to write the .tfx file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        settings: PipelineSettings,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
