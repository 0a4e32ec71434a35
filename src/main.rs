// ABOUTME: Entry point for the rollstep CLI application.
// ABOUTME: Parses arguments, sets up tracing and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use rollstep::config::{self, Config};
use rollstep::error::Result;
use rollstep::output::Output;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let output = Output::new(cli.output_mode());

    if let Err(e) = run(cli, output.clone()).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: Output) -> Result<()> {
    match cli.command {
        Commands::Init { force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Validate { config } => {
            let config = load_config(config.as_deref())?;
            commands::validate(&config, &output)
        }
        Commands::Simulate { config } => {
            let config = load_config(config.as_deref())?;
            commands::simulate(config, output).await
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::discover(&env::current_dir()?),
    }
}
