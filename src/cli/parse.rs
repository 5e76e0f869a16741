//! CLI parse: clap types for Colorbook. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Colorbook CLI - coloring-book prompt and illustration generation
#[derive(Parser)]
#[command(name = "colorbook")]
#[command(about = "Generate coloring-book prompts and illustrations for a topic")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Working directory holding colorbook.toml
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding one folder per topic (overrides books_root)
    #[arg(long)]
    pub books_root: Option<PathBuf>,

    /// Write images without upscaling
    #[arg(long)]
    pub no_upscale: bool,

    /// Enable debug logging
    #[arg(long)]
    pub verbose: bool,

    /// Disable logging
    #[arg(long)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Generate prompts and images for a topic
    Generate {
        /// Book topic; asked interactively when omitted
        topic: Option<String>,
    },
    /// Generate and save prompts only
    Prompts {
        /// Book topic; asked interactively when omitted
        topic: Option<String>,
    },
    /// Generate images from an existing prompts.csv
    Images {
        /// Book topic; asked interactively when omitted
        topic: Option<String>,
    },
}

impl Commands {
    pub fn topic(&self) -> Option<&str> {
        match self {
            Commands::Generate { topic } | Commands::Prompts { topic } | Commands::Images { topic } => {
                topic.as_deref()
            }
        }
    }
}
