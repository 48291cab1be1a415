//! DSP Effects Library
//!
//! Filter primitives, the five effect processors, the safety layer and the
//! chain executor. All effects implement the `Effect` trait for uniform
//! processing.

pub mod chain;
pub mod chorus;
pub mod delay;
pub mod distortion;
pub mod effect;
pub mod eq;
pub mod filters;
pub mod reverb;
pub mod safety;

pub use chain::{build_effect, ChainOutput, EffectChain, EffectSpec, StageOutcome, StageStatus};
pub use chorus::Chorus;
pub use delay::Delay;
pub use distortion::Distortion;
pub use effect::{mix, Effect, EffectKind, EffectParams, ParamSpec};
pub use eq::Equalizer;
pub use filters::{allpass_filter, butterworth, comb_filter, BandShape, BiquadCoeffs};
pub use reverb::Reverb;
pub use safety::{normalize, sanitize, PEAK_CEILING};
