//! Three-band EQ Effect
//!
//! Splits the input into low, mid and high bands with 2nd-order Butterworth
//! sections, scales each band and sums them. There is no wet/dry blend: the
//! weighted sum is the whole output.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::effect::{finish, prepare_input, Effect, EffectKind, EffectParams, ParamSpec};
use super::filters::{butterworth, BandShape};
use crate::engine::AudioBuffer;
use crate::error::Result;

/// Crossover between the low and mid bands (Hz)
pub const LOW_CROSSOVER_HZ: f64 = 500.0;

/// Crossover between the mid and high bands (Hz)
pub const HIGH_CROSSOVER_HZ: f64 = 2000.0;

pub const LOW_GAIN: ParamSpec = ParamSpec::new("low_gain", 1.0, 0.0, 4.0);
pub const MID_GAIN: ParamSpec = ParamSpec::new("mid_gain", 1.0, 0.0, 4.0);
pub const HIGH_GAIN: ParamSpec = ParamSpec::new("high_gain", 1.0, 0.0, 4.0);

/// Recognized equalizer parameters
pub const PARAMS: &[ParamSpec] = &[LOW_GAIN, MID_GAIN, HIGH_GAIN];

/// Fixed-crossover three-band equalizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equalizer {
    /// Linear gain below 500 Hz (0-4)
    low_gain: f32,
    /// Linear gain for 500-2000 Hz (0-4)
    mid_gain: f32,
    /// Linear gain above 2000 Hz (0-4)
    high_gain: f32,
}

impl Default for Equalizer {
    fn default() -> Self {
        Self {
            low_gain: LOW_GAIN.default,
            mid_gain: MID_GAIN.default,
            high_gain: HIGH_GAIN.default,
        }
    }
}

impl Equalizer {
    /// Create an equalizer with the given band gains (each clamped to 0-4)
    pub fn new(low_gain: f32, mid_gain: f32, high_gain: f32) -> Self {
        Self {
            low_gain: LOW_GAIN.clamp(low_gain),
            mid_gain: MID_GAIN.clamp(mid_gain),
            high_gain: HIGH_GAIN.clamp(high_gain),
        }
    }

    /// Build from a parameter map, applying defaults and clamping
    pub fn from_params(params: &EffectParams) -> Self {
        Self {
            low_gain: params.resolve(&LOW_GAIN),
            mid_gain: params.resolve(&MID_GAIN),
            high_gain: params.resolve(&HIGH_GAIN),
        }
    }

    pub fn low_gain(&self) -> f32 {
        self.low_gain
    }

    pub fn mid_gain(&self) -> f32 {
        self.mid_gain
    }

    pub fn high_gain(&self) -> f32 {
        self.high_gain
    }

    /// Band shapes paired with their gains
    fn bands(&self) -> [(BandShape, f32); 3] {
        [
            (BandShape::LowPass(LOW_CROSSOVER_HZ), self.low_gain),
            (
                BandShape::BandPass(LOW_CROSSOVER_HZ, HIGH_CROSSOVER_HZ),
                self.mid_gain,
            ),
            (BandShape::HighPass(HIGH_CROSSOVER_HZ), self.high_gain),
        ]
    }
}

impl Effect for Equalizer {
    fn kind(&self) -> EffectKind {
        EffectKind::Equalizer
    }

    /// # Errors
    /// * `FilterDesign` - If a crossover is not below Nyquist for the buffer's rate
    fn process(&self, input: &AudioBuffer) -> Result<AudioBuffer> {
        let samples = prepare_input(input)?;
        let sample_rate = input.sample_rate();

        let mut output = vec![0.0_f32; samples.len()];
        for (shape, gain) in self.bands() {
            let band = butterworth(&samples, shape, sample_rate)?;
            for (out, s) in output.iter_mut().zip(band) {
                *out += gain * s;
            }
        }

        Ok(finish(input, output))
    }

    fn params(&self) -> Value {
        json!({
            "low_gain": self.low_gain,
            "mid_gain": self.mid_gain,
            "high_gain": self.high_gain,
        })
    }
}
