// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines global output flags and the init, validate and simulate subcommands.

use clap::{Parser, Subcommand};
use rollstep::output::OutputMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rollstep")]
#[command(about = "Step-by-step rolling updates between replicated workloads")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new rollstep.yml configuration file
    Init {
        /// Overwrite an existing rollstep.yml
        #[arg(short, long)]
        force: bool,
    },

    /// Parse and validate the rollout plan
    Validate {
        /// Path to the plan (default: discovered in the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Run every rollout against a simulated cluster
    Simulate {
        /// Path to the plan (default: discovered in the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
