//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use anyhow::{Context, Result};

use super::ChainArgs;
use crate::dsp::{ChainOutput, EffectChain, EffectKind, StageStatus};
use crate::engine::{export_wav, import_wav, AudioBuffer, FluidSynthRenderer, ScoreRenderer};

/// Build the effect chain from `--chain` or `--effects`
pub fn load_chain(args: &ChainArgs) -> Result<EffectChain> {
    let chain = match &args.chain {
        Some(path) => EffectChain::from_json_file(path)
            .with_context(|| format!("failed to load chain from {}", path.display()))?,
        None => EffectChain::from_names(&args.effects),
    };

    if chain.is_empty() {
        tracing::warn!("effect chain is empty, output will only be normalized");
    }
    Ok(chain)
}

/// Apply an effect chain to a WAV file.
pub fn apply(input: &Path, output: &Path, chain: &ChainArgs, bit_depth: u16) -> Result<()> {
    tracing::info!("Applying effects to: {}", input.display());

    let chain = load_chain(chain)?;
    let buffer =
        import_wav(input).with_context(|| format!("failed to read {}", input.display()))?;

    process_and_write(&chain, &buffer, output, bit_depth)
}

/// Render a score, then apply an effect chain.
pub fn render(
    score: &Path,
    output: &Path,
    soundfont: &Path,
    sample_rate: u32,
    chain: &ChainArgs,
    bit_depth: u16,
) -> Result<()> {
    tracing::info!("Rendering score: {}", score.display());

    let chain = load_chain(chain)?;
    let work_dir = tempfile::tempdir().context("failed to create render directory")?;
    let renderer = FluidSynthRenderer::new(work_dir.path())
        .with_soundfont(soundfont)
        .with_sample_rate(sample_rate);

    let buffer = renderer
        .render(score)
        .with_context(|| format!("failed to render {}", score.display()))?;

    process_and_write(&chain, &buffer, output, bit_depth)
}

fn process_and_write(
    chain: &EffectChain,
    buffer: &AudioBuffer,
    output: &Path,
    bit_depth: u16,
) -> Result<()> {
    let result = chain.process(buffer).context("effect chain failed")?;
    print_outcomes(&result);

    export_wav(&result.buffer, output, bit_depth)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Wrote {} ({:.2}s, peak {:.3})",
        output.display(),
        result.buffer.duration(),
        result.buffer.peak()
    );
    Ok(())
}

fn print_outcomes(result: &ChainOutput) {
    for outcome in &result.outcomes {
        match &outcome.status {
            StageStatus::Applied => {
                println!("  [{}] {}: applied", outcome.index, outcome.kind.display_name())
            }
            StageStatus::Skipped { reason } => println!(
                "  [{}] {}: skipped ({})",
                outcome.index,
                outcome.kind.display_name(),
                reason
            ),
        }
    }
    println!(
        "{} applied, {} skipped",
        result.applied_count(),
        result.skipped_count()
    );
}

/// List every effect with its parameter table.
pub fn list_effects() -> Result<()> {
    for kind in EffectKind::ALL {
        println!("{} ({})", kind.display_name(), kind.as_str());
        for param in kind.param_specs() {
            println!(
                "  {:<12} default {:<8} range [{}, {}]",
                param.name, param.default, param.min, param.max
            );
        }
    }
    Ok(())
}

/// Print basic measurements of a WAV file.
pub fn analyze(path: &Path) -> Result<()> {
    let buffer = import_wav(path).with_context(|| format!("failed to read {}", path.display()))?;

    println!("File:        {}", path.display());
    println!("Duration:    {:.3}s", buffer.duration());
    println!("Sample rate: {} Hz", buffer.sample_rate());
    println!("Samples:     {}", buffer.len());
    println!("Peak:        {:.4}", buffer.peak());
    println!("RMS:         {:.4} ({:.1} dBFS)", buffer.rms(), buffer.rms_db());

    Ok(())
}
