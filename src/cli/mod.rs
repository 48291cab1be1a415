//! CLI Module
//!
//! Command-line interface for the fxchain effects engine.

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::engine::render::{DEFAULT_RENDER_SAMPLE_RATE, DEFAULT_SOUNDFONT};

/// fxchain - apply audio effect chains to WAV files
#[derive(Parser, Debug)]
#[command(name = "fxchain")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Where the effect chain comes from
#[derive(Args, Debug, Clone, Default)]
pub struct ChainArgs {
    /// JSON chain description file
    #[arg(long, conflicts_with = "effects")]
    pub chain: Option<PathBuf>,

    /// Comma-separated effect names, each with default parameters
    #[arg(long, value_delimiter = ',')]
    pub effects: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply an effect chain to a WAV file
    #[command(name = "apply")]
    Apply {
        /// Input WAV file
        #[arg(short, long)]
        input: PathBuf,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        chain: ChainArgs,

        /// Output bit depth (16, 24 or 32)
        #[arg(long, default_value_t = 16)]
        bit_depth: u16,
    },

    /// Render a MIDI score with FluidSynth, then apply an effect chain
    #[command(name = "render")]
    Render {
        /// MIDI score file
        #[arg(short, long)]
        score: PathBuf,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        /// Soundfont used by the synthesizer
        #[arg(long, default_value = DEFAULT_SOUNDFONT)]
        soundfont: PathBuf,

        /// Render sample rate in Hz
        #[arg(long, default_value_t = DEFAULT_RENDER_SAMPLE_RATE)]
        sample_rate: u32,

        #[command(flatten)]
        chain: ChainArgs,

        /// Output bit depth (16, 24 or 32)
        #[arg(long, default_value_t = 16)]
        bit_depth: u16,
    },

    /// List available effects and their parameters
    #[command(name = "effects")]
    Effects,

    /// Print duration, sample rate, peak and RMS of a WAV file
    #[command(name = "analyze")]
    Analyze {
        /// WAV file to analyze
        path: PathBuf,
    },
}
