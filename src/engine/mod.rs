//! Audio Engine Module
//!
//! Everything around the effects core:
//! - Mono audio buffer and measurements
//! - WAV file I/O
//! - Score rendering through an external synthesizer

pub mod buffer;
pub mod io;
pub mod render;

pub use buffer::AudioBuffer;
pub use io::{export_wav, import_wav};
pub use render::{FluidSynthRenderer, ScoreRenderer};
