//! Filter primitives
//!
//! Whole-buffer filters used by the effects:
//! - Feedback comb: `y[n] = x[n] + decay * y[n - D]`
//! - Schroeder all-pass: `y[n] = g * x[n] + x[n - D] - g * y[n - D]`
//! - 2nd-order Butterworth low-pass / band-pass / high-pass biquads
//!
//! Comb and all-pass keep the exact causal recurrence, one sample at a time;
//! each output depends on a delayed copy of itself.

use std::f64::consts::{PI, SQRT_2};

use crate::error::{FxError, Result};

// ============================================================================
// Comb / All-pass
// ============================================================================

/// Feedback comb filter over a whole buffer
///
/// Samples before the first full delay pass through unchanged.
///
/// # Errors
/// * `InvalidDelay` - If `delay` is zero
pub fn comb_filter(input: &[f32], delay: usize, decay: f32) -> Result<Vec<f32>> {
    if delay == 0 {
        return Err(FxError::InvalidDelay {
            filter: "comb",
            delay_samples: delay,
        });
    }

    let mut output = vec![0.0_f32; input.len()];
    for n in 0..input.len() {
        output[n] = if n >= delay {
            input[n] + decay * output[n - delay]
        } else {
            input[n]
        };
    }
    Ok(output)
}

/// Schroeder all-pass filter over a whole buffer
///
/// # Errors
/// * `InvalidDelay` - If `delay` is zero
pub fn allpass_filter(input: &[f32], delay: usize, gain: f32) -> Result<Vec<f32>> {
    if delay == 0 {
        return Err(FxError::InvalidDelay {
            filter: "allpass",
            delay_samples: delay,
        });
    }

    let mut output = vec![0.0_f32; input.len()];
    for n in 0..input.len() {
        output[n] = if n >= delay {
            gain * input[n] + input[n - delay] - gain * output[n - delay]
        } else {
            input[n]
        };
    }
    Ok(output)
}

// ============================================================================
// Butterworth Biquads
// ============================================================================

/// Band shape of a Butterworth section
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandShape {
    /// Pass below the cutoff (Hz)
    LowPass(f64),
    /// Pass between the two edges (Hz)
    BandPass(f64, f64),
    /// Pass above the cutoff (Hz)
    HighPass(f64),
}

/// Biquad filter coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Design a 2nd-order Butterworth section
    ///
    /// Cutoffs are expressed as a fraction of Nyquist and mapped through the
    /// bilinear transform with frequency pre-warping.
    ///
    /// # Errors
    /// * `FilterDesign` - If any edge is not strictly inside (0, Nyquist), or
    ///   band-pass edges are not increasing
    pub fn butterworth(shape: BandShape, sample_rate: u32) -> Result<Self> {
        let nyquist = sample_rate as f64 / 2.0;
        // Bilinear transform constant for fs = 2 (normalized frequencies)
        let k = 4.0;

        let coeffs = match shape {
            BandShape::LowPass(cutoff) => {
                let wc = prewarp(normalized_cutoff(cutoff, nyquist)?);
                // H(s) = wc^2 / (s^2 + sqrt(2) wc s + wc^2)
                bilinear([0.0, 0.0, wc * wc], [1.0, SQRT_2 * wc, wc * wc], k)
            }
            BandShape::HighPass(cutoff) => {
                let wc = prewarp(normalized_cutoff(cutoff, nyquist)?);
                // H(s) = s^2 / (s^2 + sqrt(2) wc s + wc^2)
                bilinear([1.0, 0.0, 0.0], [1.0, SQRT_2 * wc, wc * wc], k)
            }
            BandShape::BandPass(low, high) => {
                if low >= high {
                    return Err(FxError::FilterDesign {
                        details: format!("band edges must increase ({} >= {} Hz)", low, high),
                    });
                }
                let w1 = prewarp(normalized_cutoff(low, nyquist)?);
                let w2 = prewarp(normalized_cutoff(high, nyquist)?);
                let bandwidth = w2 - w1;
                // H(s) = B s / (s^2 + B s + w1 w2)
                bilinear([0.0, bandwidth, 0.0], [1.0, bandwidth, w1 * w2], k)
            }
        };

        Ok(coeffs)
    }

    /// Run the section forward over a whole buffer
    pub fn apply(&self, input: &[f32]) -> Vec<f32> {
        let mut state = BiquadState::default();
        input
            .iter()
            .map(|&x| state.process(x as f64, self) as f32)
            .collect()
    }
}

/// Check and convert a cutoff in Hz to a fraction of Nyquist
fn normalized_cutoff(cutoff_hz: f64, nyquist: f64) -> Result<f64> {
    let wn = cutoff_hz / nyquist;
    if !(wn > 0.0 && wn < 1.0) {
        return Err(FxError::FilterDesign {
            details: format!(
                "cutoff {} Hz must lie strictly between 0 and Nyquist ({} Hz)",
                cutoff_hz, nyquist
            ),
        });
    }
    Ok(wn)
}

/// Pre-warp a normalized digital frequency to the analog domain (fs = 2)
#[inline]
fn prewarp(wn: f64) -> f64 {
    4.0 * (PI * wn / 2.0).tan()
}

/// Map analog `(s^2, s, 1)` polynomials to a digital biquad, s = k (1 - z^-1) / (1 + z^-1)
fn bilinear(num: [f64; 3], den: [f64; 3], k: f64) -> BiquadCoeffs {
    let k2 = k * k;
    let expand = |p: [f64; 3]| {
        [
            p[0] * k2 + p[1] * k + p[2],
            2.0 * (p[2] - p[0] * k2),
            p[0] * k2 - p[1] * k + p[2],
        ]
    };

    let b = expand(num);
    let a = expand(den);

    BiquadCoeffs {
        b0: b[0] / a[0],
        b1: b[1] / a[0],
        b2: b[2] / a[0],
        a1: a[1] / a[0],
        a2: a[2] / a[0],
    }
}

/// Direct Form I biquad state
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64, // x[n-1]
    x2: f64, // x[n-2]
    y1: f64, // y[n-1]
    y2: f64, // y[n-2]
}

impl BiquadState {
    /// Process a single sample through the biquad filter
    fn process(&mut self, input: f64, coeffs: &BiquadCoeffs) -> f64 {
        let output = coeffs.b0 * input + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// Apply a 2nd-order Butterworth section to a buffer
///
/// # Errors
/// * `FilterDesign` - If the band edges are not valid for `sample_rate`
pub fn butterworth(input: &[f32], shape: BandShape, sample_rate: u32) -> Result<Vec<f32>> {
    Ok(BiquadCoeffs::butterworth(shape, sample_rate)?.apply(input))
}
