//! Delay Effect
//!
//! Feedback echo built by accumulating attenuated, shifted copies of the
//! input. The number of repeats is bounded, so work is bounded for any
//! parameter combination. Echoes past the end of the input are truncated.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::effect::{finish, mix, prepare_input, Effect, EffectKind, EffectParams, ParamSpec};
use crate::engine::AudioBuffer;
use crate::error::Result;

/// Hard cap on echo repeats
const MAX_REPEATS: usize = 10;

/// Repeats quieter than this are dropped
const MIN_ATTENUATION: f32 = 0.01;

pub const DELAY_TIME: ParamSpec = ParamSpec::new("delay_time", 0.5, 0.01, 2.0);
pub const FEEDBACK: ParamSpec = ParamSpec::new("feedback", 0.5, 0.0, 0.9);
pub const WET_LEVEL: ParamSpec = ParamSpec::new("wet_level", 0.5, 0.0, 1.0);
pub const DRY_LEVEL: ParamSpec = ParamSpec::new("dry_level", 0.5, 0.0, 1.0);

/// Recognized delay parameters
pub const PARAMS: &[ParamSpec] = &[DELAY_TIME, FEEDBACK, WET_LEVEL, DRY_LEVEL];

/// Echo delay with feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delay {
    /// Delay time in seconds (0.01-2.0)
    delay_time: f32,
    /// Feedback amount (0-0.9)
    feedback: f32,
    /// Wet signal level (0-1)
    wet_level: f32,
    /// Dry signal level (0-1)
    dry_level: f32,
}

impl Default for Delay {
    fn default() -> Self {
        Self {
            delay_time: DELAY_TIME.default,
            feedback: FEEDBACK.default,
            wet_level: WET_LEVEL.default,
            dry_level: DRY_LEVEL.default,
        }
    }
}

impl Delay {
    /// Create a new delay effect with specified delay time
    ///
    /// # Arguments
    /// * `delay_time` - Delay time in seconds (clamped to 0.01-2.0)
    pub fn new(delay_time: f32) -> Self {
        Self {
            delay_time: DELAY_TIME.clamp(delay_time),
            ..Self::default()
        }
    }

    /// Build from a parameter map, applying defaults and clamping
    pub fn from_params(params: &EffectParams) -> Self {
        Self {
            delay_time: params.resolve(&DELAY_TIME),
            feedback: params.resolve(&FEEDBACK),
            wet_level: params.resolve(&WET_LEVEL),
            dry_level: params.resolve(&DRY_LEVEL),
        }
    }

    /// Set delay time in seconds
    ///
    /// # Arguments
    /// * `secs` - Delay time (clamped to 0.01-2.0)
    pub fn set_delay_time(&mut self, secs: f32) {
        self.delay_time = DELAY_TIME.clamp(secs);
    }

    /// Get delay time in seconds
    pub fn delay_time(&self) -> f32 {
        self.delay_time
    }

    /// Set feedback amount
    ///
    /// # Arguments
    /// * `fb` - Feedback amount (clamped to 0-0.9)
    pub fn set_feedback(&mut self, fb: f32) {
        self.feedback = FEEDBACK.clamp(fb);
    }

    /// Get feedback amount
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Set wet signal level
    ///
    /// # Arguments
    /// * `level` - Wet level (clamped to 0-1)
    pub fn set_wet_level(&mut self, level: f32) {
        self.wet_level = WET_LEVEL.clamp(level);
    }

    /// Get wet signal level
    pub fn wet_level(&self) -> f32 {
        self.wet_level
    }

    /// Set dry signal level
    ///
    /// # Arguments
    /// * `level` - Dry level (clamped to 0-1)
    pub fn set_dry_level(&mut self, level: f32) {
        self.dry_level = DRY_LEVEL.clamp(level);
    }

    /// Get dry signal level
    pub fn dry_level(&self) -> f32 {
        self.dry_level
    }

    /// Delay length in samples for a sample rate
    pub fn delay_samples(&self, sample_rate: u32) -> usize {
        (self.delay_time as f64 * sample_rate as f64).round() as usize
    }

    /// Upper bound on echo repeats: `min(10, ceil(1 / (1 - feedback)))`, at least 1
    pub fn max_repeats(&self) -> usize {
        if self.feedback >= 1.0 {
            return MAX_REPEATS;
        }
        // f32 -> f64 widening nudges exact quotients (0.8 -> 5.0000003) over the integer
        let bound = (1.0 / (1.0 - f64::from(self.feedback)) - 1e-6).ceil() as usize;
        bound.clamp(1, MAX_REPEATS)
    }

    /// Echo-only signal, truncated to the input length
    fn wet_signal(&self, samples: &[f32], sample_rate: u32) -> Vec<f32> {
        let len = samples.len();
        let delay = self.delay_samples(sample_rate);
        let mut wet = vec![0.0_f32; len];

        for k in 1..=self.max_repeats() {
            let attenuation = self.feedback.powi(k as i32);
            let shift = k * delay;
            if attenuation < MIN_ATTENUATION || shift >= len {
                break;
            }
            for (out, &s) in wet[shift..].iter_mut().zip(samples) {
                *out += attenuation * s;
            }
        }

        wet
    }
}

impl Effect for Delay {
    fn kind(&self) -> EffectKind {
        EffectKind::Delay
    }

    fn process(&self, input: &AudioBuffer) -> Result<AudioBuffer> {
        let samples = prepare_input(input)?;
        let wet = self.wet_signal(&samples, input.sample_rate());
        let output = mix(&samples, &wet, self.dry_level, self.wet_level);
        Ok(finish(input, output))
    }

    fn params(&self) -> Value {
        json!({
            "delay_time": self.delay_time,
            "feedback": self.feedback,
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

    fn wet_only(delay_time: f32, feedback: f32) -> Delay {
        let mut delay = Delay::new(delay_time);
        delay.set_feedback(feedback);
        delay.set_wet_level(1.0);
        delay.set_dry_level(0.0);
        delay
    }

    #[test]
    fn test_delay_defaults() {
        let delay = Delay::default();
        assert_eq!(delay.delay_time(), 0.5);
        assert_eq!(delay.feedback(), 0.5);
        assert_eq!(delay.wet_level(), 0.5);
        assert_eq!(delay.dry_level(), 0.5);
    }

    #[test]
    fn test_delay_clamping() {
        let mut delay = Delay::new(10.0);
        assert_eq!(delay.delay_time(), 2.0);

        delay.set_delay_time(0.0);
        assert_eq!(delay.delay_time(), 0.01);

        delay.set_feedback(1.5);
        assert_eq!(delay.feedback(), 0.9);
    }

    #[test]
    fn test_max_repeats() {
        assert_eq!(wet_only(0.1, 0.0).max_repeats(), 1);
        assert_eq!(wet_only(0.1, 0.5).max_repeats(), 2);
        assert_eq!(wet_only(0.1, 0.75).max_repeats(), 4);
        assert_eq!(wet_only(0.1, 0.8).max_repeats(), 5);
        assert_eq!(wet_only(0.1, 2.0 / 3.0).max_repeats(), 3);
        assert_eq!(wet_only(0.1, 0.9).max_repeats(), 10);
    }

    #[test]
    fn test_delay_produces_echoes() {
        let delay = wet_only(0.1, 0.5);
        let input = AudioBuffer::impulse(44100, 44100);
        let output = delay.process(&input).unwrap();

        let d = delay.delay_samples(44100);
        assert_eq!(d, 4410);
        assert_eq!(output.samples()[0], 0.0);
        assert_relative_eq!(output.samples()[d], 0.5, epsilon = 1e-6);
        assert_relative_eq!(output.samples()[2 * d], 0.25, epsilon = 1e-6);
        // Bounded at two repeats for feedback 0.5
        assert_eq!(output.samples()[3 * d], 0.0);
    }

    #[test]
    fn test_feedback_08_stops_after_five_echoes() {
        let delay = wet_only(0.1, 0.8);
        let input = AudioBuffer::impulse(44100, 44100);
        let output = delay.process(&input).unwrap();

        let d = delay.delay_samples(44100);
        assert!(output.samples()[5 * d] > 0.0);
        assert_eq!(output.samples()[6 * d], 0.0);
    }

    #[test]
    fn test_zero_feedback_is_silent_wet() {
        let delay = wet_only(0.1, 0.0);
        let input = AudioBuffer::impulse(10000, 44100);
        let output = delay.process(&input).unwrap();
        assert!(output.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_delay_longer_than_buffer() {
        let delay = wet_only(2.0, 0.5);
        let input = AudioBuffer::impulse(1000, 44100);
        let output = delay.process(&input).unwrap();

        assert_eq!(output.len(), 1000);
        assert!(output.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_delay_dry_signal_passthrough() {
        let mut delay = Delay::new(0.5);
        delay.set_wet_level(0.0);
        delay.set_dry_level(1.0);

        let input = AudioBuffer::sine_wave(1.0, 1.0, 44100);
        let output = delay.process(&input).unwrap();
        let expected = input.with_samples(safety::normalized(input.samples().to_vec()));

        assert!(output.is_approx_equal(&expected, 1e-6));
    }

    #[test]
    fn test_delay_output_bounded() {
        let mut delay = Delay::new(0.01);
        delay.set_feedback(0.9);
        delay.set_wet_level(1.0);
        delay.set_dry_level(1.0);

        let input = AudioBuffer::new(vec![1.0; 22050], 22050).unwrap();
        let output = delay.process(&input).unwrap();
        assert!(output.peak() <= safety::PEAK_CEILING + 1e-6);
    }

    #[test]
    fn test_delay_get_params() {
        let delay = Delay::new(0.3);
        let params = delay.params();

        assert_relative_eq!(params["delay_time"].as_f64().unwrap(), 0.3, epsilon = 1e-6);
        assert_relative_eq!(params["feedback"].as_f64().unwrap(), 0.5, epsilon = 1e-6);
    }
}
