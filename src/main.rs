//! fxchain CLI - Audio Effects Engine
//!
//! Command-line interface for the fxchain effects engine.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fxchain::cli::commands;
use fxchain::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise info, or debug with --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("fxchain v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("fxchain v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Apply {
            input,
            output,
            chain,
            bit_depth,
        } => commands::apply(&input, &output, &chain, bit_depth),
        Commands::Render {
            score,
            output,
            soundfont,
            sample_rate,
            chain,
            bit_depth,
        } => commands::render(&score, &output, &soundfont, sample_rate, &chain, bit_depth),
        Commands::Effects => commands::list_effects(),
        Commands::Analyze { path } => commands::analyze(&path),
    }
}
