//! Chorus effect
//!
//! Several voices read the input through a delay line modulated by a slow
//! sine LFO. Each voice gets a slightly different rate, depth and phase; the
//! voices are averaged into the wet signal. Reads between samples use linear
//! interpolation.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::effect::{finish, mix, prepare_input, Effect, EffectKind, EffectParams, ParamSpec};
use crate::engine::AudioBuffer;
use crate::error::Result;

/// Modulation depth never exceeds this many seconds
const MAX_DEPTH_SECS: f64 = 0.03;

pub const RATE: ParamSpec = ParamSpec::new("rate", 0.5, 0.1, 5.0);
pub const DEPTH: ParamSpec = ParamSpec::new("depth", 0.002, 0.0001, 0.01);
pub const VOICES: ParamSpec = ParamSpec::new("voices", 3.0, 1.0, 8.0);
pub const WET_LEVEL: ParamSpec = ParamSpec::new("wet_level", 0.5, 0.0, 1.0);
pub const DRY_LEVEL: ParamSpec = ParamSpec::new("dry_level", 0.5, 0.0, 1.0);

/// Recognized chorus parameters
pub const PARAMS: &[ParamSpec] = &[RATE, DEPTH, VOICES, WET_LEVEL, DRY_LEVEL];

/// Multi-voice modulated-delay chorus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chorus {
    /// LFO rate in Hz
    rate: f32,
    /// Modulation depth in seconds
    depth: f32,
    /// Number of voices (1-8)
    voices: usize,
    wet_level: f32,
    dry_level: f32,
}

impl Default for Chorus {
    fn default() -> Self {
        Self {
            rate: RATE.default,
            depth: DEPTH.default,
            voices: VOICES.default as usize,
            wet_level: WET_LEVEL.default,
            dry_level: DRY_LEVEL.default,
        }
    }
}

/// Per-voice modulation settings
#[derive(Debug, Clone, Copy, PartialEq)]
struct Voice {
    /// LFO rate in Hz
    rate: f64,
    /// Peak modulated delay in samples
    depth: f64,
    /// LFO start phase in radians
    phase: f64,
}

impl Chorus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a parameter map, applying defaults and clamping
    ///
    /// `voices` is rounded to the nearest integer after clamping.
    pub fn from_params(params: &EffectParams) -> Self {
        Self {
            rate: params.resolve(&RATE),
            depth: params.resolve(&DEPTH),
            voices: params.resolve(&VOICES).round() as usize,
            wet_level: params.resolve(&WET_LEVEL),
            dry_level: params.resolve(&DRY_LEVEL),
        }
    }

    /// Set LFO rate in Hz (clamped to 0.1-5.0)
    pub fn set_rate(&mut self, rate: f32) {
        self.rate = RATE.clamp(rate);
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Set modulation depth in seconds (clamped to 0.0001-0.01)
    pub fn set_depth(&mut self, depth: f32) {
        self.depth = DEPTH.clamp(depth);
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    /// Set voice count (clamped to 1-8)
    pub fn set_voices(&mut self, voices: usize) {
        self.voices = voices.clamp(VOICES.min as usize, VOICES.max as usize);
    }

    pub fn voices(&self) -> usize {
        self.voices
    }

    pub fn set_wet_level(&mut self, level: f32) {
        self.wet_level = WET_LEVEL.clamp(level);
    }

    pub fn wet_level(&self) -> f32 {
        self.wet_level
    }

    pub fn set_dry_level(&mut self, level: f32) {
        self.dry_level = DRY_LEVEL.clamp(level);
    }

    pub fn dry_level(&self) -> f32 {
        self.dry_level
    }

    /// Modulation depth in samples, capped at 30 ms
    pub fn depth_samples(&self, sample_rate: u32) -> f64 {
        let sr = sample_rate as f64;
        (self.depth as f64 * sr).min(MAX_DEPTH_SECS * sr)
    }

    fn voice_settings(&self, sample_rate: u32) -> Vec<Voice> {
        let count = self.voices as f64;
        let depth = self.depth_samples(sample_rate);
        (0..self.voices)
            .map(|v| {
                let spread = 0.9 + 0.2 * v as f64 / count;
                Voice {
                    rate: self.rate as f64 * spread,
                    depth: depth * spread,
                    phase: 2.0 * PI * v as f64 / count,
                }
            })
            .collect()
    }

    /// Averaged, modulated voices
    fn wet_signal(&self, samples: &[f32], sample_rate: u32) -> Vec<f32> {
        let sr = sample_rate as f64;
        let voices = self.voice_settings(sample_rate);
        let mut wet = vec![0.0_f32; samples.len()];

        for voice in &voices {
            for (i, out) in wet.iter_mut().enumerate() {
                let lfo = (2.0 * PI * voice.rate * i as f64 / sr + voice.phase).sin();
                let delay = (lfo + 1.0) / 2.0 * voice.depth;
                *out += read_interpolated(samples, i as f64 - delay);
            }
        }

        let count = voices.len() as f32;
        for s in wet.iter_mut() {
            *s /= count;
        }
        wet
    }
}

/// Linearly interpolated read; positions before the start are silent
fn read_interpolated(samples: &[f32], pos: f64) -> f32 {
    if pos < 0.0 {
        return 0.0;
    }
    let index = pos.floor() as usize;
    let frac = (pos - index as f64) as f32;
    match (samples.get(index), samples.get(index + 1)) {
        (Some(&a), Some(&b)) => a + (b - a) * frac,
        (Some(&a), None) => a,
        _ => 0.0,
    }
}

impl Effect for Chorus {
    fn kind(&self) -> EffectKind {
        EffectKind::Chorus
    }

    fn process(&self, input: &AudioBuffer) -> Result<AudioBuffer> {
        let samples = prepare_input(input)?;
        let wet = self.wet_signal(&samples, input.sample_rate());
        let output = mix(&samples, &wet, self.dry_level, self.wet_level);
        Ok(finish(input, output))
    }

    fn params(&self) -> Value {
        json!({
            "rate": self.rate,
            "depth": self.depth,
            "voices": self.voices,
            "wet_level": self.wet_level,
            "dry_level": self.dry_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::safety;
    use approx::assert_relative_eq;

    #[test]
    fn test_chorus_defaults() {
        let chorus = Chorus::new();
        assert_eq!(chorus.rate(), 0.5);
        assert_eq!(chorus.depth(), 0.002);
        assert_eq!(chorus.voices(), 3);
    }

    #[test]
    fn test_voices_rounded_and_clamped() {
        let chorus = Chorus::from_params(&EffectParams::from([("voices", 2.6)]));
        assert_eq!(chorus.voices(), 3);

        let chorus = Chorus::from_params(&EffectParams::from([("voices", 20.0)]));
        assert_eq!(chorus.voices(), 8);

        let chorus = Chorus::from_params(&EffectParams::from([("voices", 0.0)]));
        assert_eq!(chorus.voices(), 1);
    }

    #[test]
    fn test_depth_samples() {
        let chorus = Chorus::new();
        assert_relative_eq!(chorus.depth_samples(44100), 88.2, epsilon = 1e-3);
    }

    #[test]
    fn test_voice_spread() {
        let mut chorus = Chorus::new();
        chorus.set_voices(2);
        let voices = chorus.voice_settings(44100);

        assert_eq!(voices.len(), 2);
        assert_relative_eq!(voices[0].rate, 0.45, epsilon = 1e-6);
        assert_relative_eq!(voices[1].rate, 0.5, epsilon = 1e-6);
        assert_relative_eq!(voices[1].phase, PI, epsilon = 1e-12);
    }

    #[test]
    fn test_read_interpolated() {
        let samples = [0.0, 1.0, 0.5];
        assert_eq!(read_interpolated(&samples, -0.5), 0.0);
        assert_eq!(read_interpolated(&samples, 1.0), 1.0);
        assert_relative_eq!(read_interpolated(&samples, 0.25), 0.25);
        assert_relative_eq!(read_interpolated(&samples, 1.5), 0.75);
        assert_eq!(read_interpolated(&samples, 2.0), 0.5);
    }

    #[test]
    fn test_chorus_constant_input_settles() {
        let mut chorus = Chorus::new();
        chorus.set_wet_level(1.0);
        chorus.set_dry_level(0.0);

        let input = AudioBuffer::new(vec![0.5; 4410], 44100).unwrap();
        let output = chorus.process(&input).unwrap();

        // Past the longest modulated delay every voice reads the constant
        for &s in &output.samples()[200..] {
            assert_relative_eq!(s, 0.5, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_chorus_dry_only_reproduces_input() {
        let mut chorus = Chorus::new();
        chorus.set_wet_level(0.0);
        chorus.set_dry_level(1.0);

        let input = AudioBuffer::sine_wave(220.0, 0.25, 22050);
        let output = chorus.process(&input).unwrap();
        let expected = input.with_samples(safety::normalized(input.samples().to_vec()));

        assert!(output.is_approx_equal(&expected, 1e-6));
    }

    #[test]
    fn test_chorus_output_bounded_and_same_length() {
        let chorus = Chorus::from_params(&EffectParams::from([("voices", 8.0), ("rate", 5.0)]));
        let input = AudioBuffer::sine_wave(440.0, 0.5, 22050);
        let output = chorus.process(&input).unwrap();

        assert_eq!(output.len(), input.len());
        assert!(output.is_finite());
        assert!(output.peak() <= safety::PEAK_CEILING + 1e-6);
    }
}
