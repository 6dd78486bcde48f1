//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod convert;
mod diagnose;
mod tools;
mod verify;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "parsdoc")]
#[command(about = "Convert Persian PDFs into validated, paragraph-segmented JSON")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every PDF under a directory into JSON records
    Convert(convert::ConvertArgs),

    /// Sample PDFs and explain how each would be routed
    Diagnose {
        /// Directory to scan for PDFs
        input_dir: PathBuf,
        /// Number of files to inspect (0 = all)
        #[arg(short, long, default_value = "10")]
        sample: usize,
    },

    /// Re-check emitted JSON records for integrity problems
    Verify {
        /// Directory of emitted JSON files (defaults to the configured output directory)
        output_dir: Option<PathBuf>,
    },

    /// Check if required extraction and OCR tools are installed
    CheckTools,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
    };
    let (settings, _config) = load_settings_with_options(options).await?;

    match cli.command {
        Commands::Convert(args) => convert::cmd_convert(settings, args).await,
        Commands::Diagnose { input_dir, sample } => {
            diagnose::cmd_diagnose(&settings, &input_dir, sample).await
        }
        Commands::Verify { output_dir } => {
            let dir = output_dir.unwrap_or_else(|| settings.output_dir.clone());
            verify::cmd_verify(&settings, &dir).await
        }
        Commands::CheckTools => tools::cmd_check_tools(&settings).await,
    }
}
