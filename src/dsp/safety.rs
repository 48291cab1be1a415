//! Safety / normalization layer
//!
//! Runs after every effect and once more at the end of a chain. Output is
//! guaranteed finite with a peak absolute amplitude of at most [`PEAK_CEILING`].

/// Maximum peak amplitude allowed on any effect output
pub const PEAK_CEILING: f32 = 0.95;

/// Replace non-finite samples in place
///
/// NaN becomes 0.0; ±Infinity becomes ±[`PEAK_CEILING`].
/// Returns the number of samples replaced.
pub fn sanitize(samples: &mut [f32]) -> usize {
    let mut replaced = 0;
    for sample in samples.iter_mut() {
        if sample.is_nan() {
            *sample = 0.0;
            replaced += 1;
        } else if sample.is_infinite() {
            *sample = PEAK_CEILING.copysign(*sample);
            replaced += 1;
        }
    }
    replaced
}

/// Sanitize, then rescale so the peak does not exceed [`PEAK_CEILING`]
///
/// Buffers already under the ceiling are left untouched after sanitizing.
pub fn normalize(samples: &mut [f32]) {
    let replaced = sanitize(samples);
    if replaced > 0 {
        tracing::debug!(replaced, "replaced non-finite samples");
    }

    let peak = samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max);
    if peak > PEAK_CEILING {
        let scale = PEAK_CEILING / peak;
        for sample in samples.iter_mut() {
            // Clamp guards against the product rounding a hair above the ceiling
            *sample = (*sample * scale).clamp(-PEAK_CEILING, PEAK_CEILING);
        }
    }
}

/// Owned variant of [`normalize`]
pub fn normalized(mut samples: Vec<f32>) -> Vec<f32> {
    normalize(&mut samples);
    samples
}
