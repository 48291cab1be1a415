//! Reverb effect implementation
//!
//! Schroeder-style reverberator:
//! - 4 parallel comb filters, averaged, for the decaying reflections
//! - 2 series all-pass filters for diffusion
//! - wet/dry blend, normalized

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::effect::{finish, mix, prepare_input, Effect, EffectKind, EffectParams, ParamSpec};
use super::filters::{allpass_filter, comb_filter};
use super::safety;
use crate::engine::AudioBuffer;
use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Comb filter base delays in seconds
const COMB_DELAYS_SECS: [f64; 4] = [0.0297, 0.0371, 0.0411, 0.0437];

/// Comb filter base decay coefficients
const COMB_DECAYS: [f32; 4] = [0.86, 0.83, 0.80, 0.78];

/// All-pass filter delays in seconds
const ALLPASS_DELAYS_SECS: [f64; 2] = [0.005, 0.0017];

/// All-pass filter gains
const ALLPASS_GAINS: [f32; 2] = [0.7, 0.6];

/// Damping reduces every comb decay by up to this fraction
const DAMPING_SCALE: f32 = 0.15;

pub const ROOM_SIZE: ParamSpec = ParamSpec::new("room_size", 0.8, 0.0, 1.0);
pub const DAMPING: ParamSpec = ParamSpec::new("damping", 0.5, 0.0, 1.0);
pub const WET_LEVEL: ParamSpec = ParamSpec::new("wet_level", 0.3, 0.0, 1.0);
pub const DRY_LEVEL: ParamSpec = ParamSpec::new("dry_level", 0.7, 0.0, 1.0);

/// Recognized reverb parameters
pub const PARAMS: &[ParamSpec] = &[ROOM_SIZE, DAMPING, WET_LEVEL, DRY_LEVEL];

// ============================================================================
// Reverb
// ============================================================================

/// Comb/all-pass reverb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reverb {
    /// Room size: 0 (small) to 1 (large)
    room_size: f32,
    /// Damping: 0 (long tail) to 1 (short tail)
    damping: f32,
    /// Wet signal level: 0 to 1
    wet_level: f32,
    /// Dry signal level: 0 to 1
    dry_level: f32,
}

impl Default for Reverb {
    fn default() -> Self {
        Self {
            room_size: ROOM_SIZE.default,
            damping: DAMPING.default,
            wet_level: WET_LEVEL.default,
            dry_level: DRY_LEVEL.default,
        }
    }
}

impl Reverb {
    /// Create a reverb with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a parameter map, applying defaults and clamping
    pub fn from_params(params: &EffectParams) -> Self {
        Self {
            room_size: params.resolve(&ROOM_SIZE),
            damping: params.resolve(&DAMPING),
            wet_level: params.resolve(&WET_LEVEL),
            dry_level: params.resolve(&DRY_LEVEL),
        }
    }

    /// Set room size (clamped to 0-1)
    pub fn set_room_size(&mut self, size: f32) {
        self.room_size = ROOM_SIZE.clamp(size);
    }

    pub fn room_size(&self) -> f32 {
        self.room_size
    }

    /// Set damping (clamped to 0-1)
    pub fn set_damping(&mut self, damping: f32) {
        self.damping = DAMPING.clamp(damping);
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// Set wet signal level (clamped to 0-1)
    pub fn set_wet_level(&mut self, level: f32) {
        self.wet_level = WET_LEVEL.clamp(level);
    }

    pub fn wet_level(&self) -> f32 {
        self.wet_level
    }

    /// Set dry signal level (clamped to 0-1)
    pub fn set_dry_level(&mut self, level: f32) {
        self.dry_level = DRY_LEVEL.clamp(level);
    }

    pub fn dry_level(&self) -> f32 {
        self.dry_level
    }

    /// Scale applied to the comb delays: 0.95 at room size 0, 0.999 at 1
    fn room_size_factor(&self) -> f64 {
        0.95 + 0.049 * self.room_size as f64
    }

    /// Comb filter delays in samples for a sample rate
    pub fn comb_delays(&self, sample_rate: u32) -> [usize; 4] {
        let factor = self.room_size_factor();
        COMB_DELAYS_SECS.map(|t| (sample_rate as f64 * t * factor) as usize)
    }

    /// All-pass filter delays in samples for a sample rate
    pub fn allpass_delays(&self, sample_rate: u32) -> [usize; 2] {
        ALLPASS_DELAYS_SECS.map(|t| (sample_rate as f64 * t) as usize)
    }

    /// Comb decay coefficients after damping
    pub fn comb_decays(&self) -> [f32; 4] {
        let damping = 1.0 - DAMPING_SCALE * self.damping;
        COMB_DECAYS.map(|d| d * damping)
    }

    /// Diffused, normalized wet signal
    fn wet_signal(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f32>> {
        let mut wet = vec![0.0_f32; samples.len()];
        for (delay, decay) in self
            .comb_delays(sample_rate)
            .into_iter()
            .zip(self.comb_decays())
        {
            let comb = comb_filter(samples, delay, decay)?;
            for (acc, s) in wet.iter_mut().zip(comb) {
                *acc += s;
            }
        }
        let comb_count = COMB_DELAYS_SECS.len() as f32;
        for s in wet.iter_mut() {
            *s /= comb_count;
        }

        for (delay, gain) in self
            .allpass_delays(sample_rate)
            .into_iter()
            .zip(ALLPASS_GAINS)
        {
            wet = allpass_filter(&wet, delay, gain)?;
        }

        Ok(safety::normalized(wet))
    }
}

impl Effect for Reverb {
    fn kind(&self) -> EffectKind {
        EffectKind::Reverb
    }

    /// Filter failures (a zero-length delay at very low sample rates) return
    /// the input unmodified, apart from replacing non-finite samples.
    fn process(&self, input: &AudioBuffer) -> Result<AudioBuffer> {
        let samples = prepare_input(input)?;

        let wet = match self.wet_signal(&samples, input.sample_rate()) {
            Ok(wet) => wet,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    sample_rate = input.sample_rate(),
                    "reverb filter failed, returning input"
                );
                return Ok(input.with_samples(samples));
            }
        };

        let output = mix(&samples, &wet, self.dry_level, self.wet_level);
        Ok(finish(input, output))
    }

    fn params(&self) -> Value {
        json!({
            "room_size": self.room_size,
            "damping": self.damping,
            "wet_level": self.wet_level,
            "dry_level": self.dry_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reverb_defaults() {
        let reverb = Reverb::new();
        assert_eq!(reverb.room_size(), 0.8);
        assert_eq!(reverb.damping(), 0.5);
        assert_eq!(reverb.wet_level(), 0.3);
        assert_eq!(reverb.dry_level(), 0.7);
    }

    #[test]
    fn test_reverb_from_params_clamps() {
        let params = EffectParams::from([("room_size", 3.0), ("damping", -1.0)]);
        let reverb = Reverb::from_params(&params);
        assert_eq!(reverb.room_size(), 1.0);
        assert_eq!(reverb.damping(), 0.0);
        assert_eq!(reverb.wet_level(), 0.3);
    }

    #[test]
    fn test_reverb_setters_clamp() {
        let mut reverb = Reverb::new();
        reverb.set_wet_level(2.0);
        reverb.set_dry_level(-0.5);
        assert_eq!(reverb.wet_level(), 1.0);
        assert_eq!(reverb.dry_level(), 0.0);
    }

    #[test]
    fn test_comb_delays_at_44100() {
        let reverb = Reverb::new();
        assert_eq!(reverb.comb_delays(44100), [1295, 1618, 1792, 1906]);
        assert_eq!(reverb.allpass_delays(44100), [220, 74]);
    }

    #[test]
    fn test_comb_decays_scaled_by_damping() {
        let mut reverb = Reverb::new();
        reverb.set_damping(0.0);
        assert_eq!(reverb.comb_decays(), COMB_DECAYS);

        reverb.set_damping(1.0);
        let decays = reverb.comb_decays();
        assert_relative_eq!(decays[0], 0.86 * 0.85, epsilon = 1e-6);
        assert_relative_eq!(decays[3], 0.78 * 0.85, epsilon = 1e-6);
    }

    #[test]
    fn test_reverb_impulse_has_energy_at_comb_delays() {
        let reverb = Reverb::new();
        let input = AudioBuffer::impulse(100_000, 44100);
        let output = reverb.process(&input).unwrap();

        assert_eq!(output.len(), input.len());
        for delay in reverb.comb_delays(44100) {
            assert!(
                output.samples()[delay].abs() > 1e-3,
                "no energy at comb delay {}",
                delay
            );
        }
    }

    #[test]
    fn test_reverb_dry_only_reproduces_input() {
        let mut reverb = Reverb::new();
        reverb.set_wet_level(0.0);
        reverb.set_dry_level(1.0);

        let input = AudioBuffer::sine_wave(440.0, 0.2, 22050);
        let output = reverb.process(&input).unwrap();
        let expected = input.with_samples(safety::normalized(input.samples().to_vec()));

        assert!(output.is_approx_equal(&expected, 1e-6));
    }

    #[test]
    fn test_reverb_low_sample_rate_falls_back_to_input() {
        // All-pass delay of 0.0017 s rounds to zero samples below ~589 Hz
        let reverb = Reverb::new();
        let input = AudioBuffer::new(vec![2.0, -1.0, 0.5, 0.0], 100).unwrap();
        let output = reverb.process(&input).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_reverb_fallback_only_replaces_non_finite() {
        let reverb = Reverb::new();
        let input = AudioBuffer::new(vec![2.0, f32::NAN, f32::NEG_INFINITY, 0.5], 100).unwrap();
        let output = reverb.process(&input).unwrap();
        assert_eq!(output.samples(), &[2.0, 0.0, -safety::PEAK_CEILING, 0.5]);
    }

    #[test]
    fn test_reverb_output_bounded() {
        let reverb = Reverb::from_params(&EffectParams::from([("wet_level", 1.0), ("dry_level", 1.0)]));
        let input = AudioBuffer::new(vec![4.0; 8000], 22050).unwrap();
        let output = reverb.process(&input).unwrap();

        assert!(output.is_finite());
        assert!(output.peak() <= safety::PEAK_CEILING + 1e-6);
    }

    #[test]
    fn test_reverb_params_json() {
        let params = Reverb::new().params();
        assert_relative_eq!(params["room_size"].as_f64().unwrap(), 0.8, epsilon = 1e-6);
        assert_relative_eq!(params["dry_level"].as_f64().unwrap(), 0.7, epsilon = 1e-6);
    }
}
