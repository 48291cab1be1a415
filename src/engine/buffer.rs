//! Audio Buffer
//!
//! Mono sample buffer handed to the effects chain. Buffers are treated as
//! immutable values: every effect reads one and returns a new one of the same
//! length and sample rate.

use crate::error::{FxError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns `f32::NEG_INFINITY` for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Peak absolute amplitude of a sample slice
pub fn calculate_peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
}

/// RMS level of a sample slice (linear)
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Mono audio samples with their sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Samples, nominally within -1.0..1.0
    samples: Vec<f32>,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a buffer from existing samples
    ///
    /// # Errors
    /// * `EmptyBuffer` - If `samples` is empty
    /// * `InvalidSampleRate` - If `sample_rate` is zero
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(FxError::EmptyBuffer);
        }
        if sample_rate == 0 {
            return Err(FxError::InvalidSampleRate { sample_rate });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a silent buffer with the given duration
    pub fn silence(duration_secs: f32, sample_rate: u32) -> Self {
        let num_samples = (duration_secs * sample_rate as f32) as usize;
        Self {
            samples: vec![0.0; num_samples],
            sample_rate,
        }
    }

    /// Create a unit-amplitude sine wave test tone
    pub fn sine_wave(frequency: f32, duration_secs: f32, sample_rate: u32) -> Self {
        let num_samples = (duration_secs * sample_rate as f32) as usize;
        let angular_freq = 2.0 * std::f64::consts::PI * frequency as f64 / sample_rate as f64;

        let samples = (0..num_samples)
            .map(|i| (angular_freq * i as f64).sin() as f32)
            .collect();

        Self {
            samples,
            sample_rate,
        }
    }

    /// Create a unit impulse (1.0 followed by zeros)
    pub fn impulse(num_samples: usize, sample_rate: u32) -> Self {
        let mut samples = vec![0.0; num_samples];
        if let Some(first) = samples.first_mut() {
            *first = 1.0;
        }
        Self {
            samples,
            sample_rate,
        }
    }

    /// Build a buffer with the same sample rate from new samples
    pub fn with_samples(&self, samples: Vec<f32>) -> Self {
        Self {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    /// Get a reference to the samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Get a mutable reference to the samples
    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Consume the buffer and return its samples
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Check the buffer against the input contract of the effects chain
    ///
    /// # Errors
    /// * `EmptyBuffer` - If there are no samples
    /// * `InvalidSampleRate` - If the sample rate is zero
    pub fn validate(&self) -> Result<()> {
        if self.samples.is_empty() {
            return Err(FxError::EmptyBuffer);
        }
        if self.sample_rate == 0 {
            return Err(FxError::InvalidSampleRate {
                sample_rate: self.sample_rate,
            });
        }
        Ok(())
    }

    /// Peak absolute amplitude
    pub fn peak(&self) -> f32 {
        calculate_peak(&self.samples)
    }

    /// RMS level (linear)
    pub fn rms(&self) -> f32 {
        calculate_rms(&self.samples)
    }

    /// RMS level in dBFS
    pub fn rms_db(&self) -> f32 {
        linear_to_db(self.rms())
    }

    /// Check that every sample is finite (no NaN/Inf)
    pub fn is_finite(&self) -> bool {
        self.samples.iter().all(|s| s.is_finite())
    }

    /// Check if buffers are approximately equal within tolerance
    pub fn is_approx_equal(&self, other: &AudioBuffer, tolerance: f32) -> bool {
        self.sample_rate == other.sample_rate
            && self.samples.len() == other.samples.len()
            && self
                .samples
                .iter()
                .zip(other.samples.iter())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_wave_generation() {
        let buffer = AudioBuffer::sine_wave(440.0, 1.0, 44100);
        assert_eq!(buffer.sample_rate(), 44100);
        assert_eq!(buffer.len(), 44100);
        assert!((buffer.duration() - 1.0).abs() < 0.001);
        assert!((buffer.peak() - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_silence_generation() {
        let buffer = AudioBuffer::silence(0.5, 22050);
        assert_eq!(buffer.len(), 11025);
        assert!(buffer.samples().iter().all(|&s| s == 0.0));
        assert_eq!(buffer.rms_db(), f32::NEG_INFINITY);
    }

    #[test]
    fn test_impulse_generation() {
        let buffer = AudioBuffer::impulse(100, 44100);
        assert_eq!(buffer.samples()[0], 1.0);
        assert!(buffer.samples()[1..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_empty_buffer_error() {
        let result = AudioBuffer::new(vec![], 44100);
        assert!(matches!(result, Err(FxError::EmptyBuffer)));
    }

    #[test]
    fn test_zero_sample_rate_error() {
        let result = AudioBuffer::new(vec![0.1, 0.2], 0);
        assert!(matches!(
            result,
            Err(FxError::InvalidSampleRate { sample_rate: 0 })
        ));
    }

    #[test]
    fn test_rms_of_sine() {
        let buffer = AudioBuffer::sine_wave(440.0, 1.0, 44100);
        // RMS of a unit sine is 1/sqrt(2), about -3.01 dB
        assert!((buffer.rms_db() - (-3.01)).abs() < 0.05);
    }

    #[test]
    fn test_is_finite() {
        let mut buffer = AudioBuffer::silence(0.01, 44100);
        assert!(buffer.is_finite());
        buffer.samples_mut()[3] = f32::NAN;
        assert!(!buffer.is_finite());
    }

    #[test]
    fn test_with_samples_keeps_rate() {
        let buffer = AudioBuffer::silence(0.01, 22050);
        let other = buffer.with_samples(vec![0.5; 4]);
        assert_eq!(other.sample_rate(), 22050);
        assert_eq!(other.len(), 4);
    }
}
