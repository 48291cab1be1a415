//! fxchain - Offline Audio Effects Engine
//!
//! Applies an ordered chain of effects to a mono audio buffer:
//!
//! ```text
//! input -> [effect 1 -> effect 2 -> ... -> effect n] -> normalize -> output
//! ```
//!
//! # Architecture
//!
//! - `dsp`: filter primitives, the Reverb / Delay / Chorus / Distortion /
//!   Equalizer processors, the safety layer and the fail-soft chain executor
//! - `engine`: the audio buffer type, WAV I/O and score rendering
//! - `cli`: the `fxchain-cli` command-line front end
//!
//! Chain output is finite, the same length and sample rate as its input, and
//! peaks at no more than [`dsp::PEAK_CEILING`].

pub mod cli;
pub mod dsp;
pub mod engine;
pub mod error;

pub use dsp::{EffectChain, EffectKind, EffectParams, EffectSpec};
pub use engine::AudioBuffer;
pub use error::{FxError, Result};
