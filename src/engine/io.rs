//! WAV container adapter
//!
//! Reads and writes mono WAV files for the CLI. The effects chain itself only
//! sees [`AudioBuffer`] values; this module is the delivery-side collaborator.
//! Multi-channel files are downmixed to mono on import by averaging frames.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::engine::buffer::AudioBuffer;
use crate::error::{FxError, Result};

/// Import a WAV file as a mono buffer
///
/// # Errors
/// * `AudioRead` - If the file cannot be opened or decoded
/// * `UnsupportedFormat` - For integer bit depths other than 8/16/24/32
/// * `EmptyBuffer` - If the file holds no frames
pub fn import_wav(path: &Path) -> Result<AudioBuffer> {
    let reader = WavReader::open(path).map_err(|source| FxError::AudioRead {
        path: path.display().to_string(),
        source,
    })?;

    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;
    let interleaved = read_samples_as_f32(reader, path, spec.bits_per_sample, spec.sample_format)?;

    let mono = downmix(&interleaved, channels);
    tracing::debug!(
        path = %path.display(),
        channels,
        sample_rate = spec.sample_rate,
        frames = mono.len(),
        "imported wav"
    );

    AudioBuffer::new(mono, spec.sample_rate)
}

/// Export a buffer as a mono WAV file
///
/// # Arguments
/// * `bit_depth` - 16 or 24 for integer PCM, 32 for float
///
/// # Errors
/// * `UnsupportedFormat` - For any other bit depth
/// * `AudioWrite` - If the file cannot be written
pub fn export_wav(buffer: &AudioBuffer, path: &Path, bit_depth: u16) -> Result<()> {
    let sample_format = match bit_depth {
        16 | 24 => SampleFormat::Int,
        32 => SampleFormat::Float,
        _ => {
            return Err(FxError::UnsupportedFormat {
                details: format!("{}-bit audio (only 16, 24, 32 supported)", bit_depth),
            })
        }
    };

    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: bit_depth,
        sample_format,
    };

    let write_err = |source| FxError::AudioWrite {
        path: path.display().to_string(),
        source,
    };

    let mut writer = WavWriter::create(path, spec).map_err(write_err)?;

    match bit_depth {
        16 => {
            for &sample in buffer.samples() {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled).map_err(write_err)?;
            }
        }
        24 => {
            for &sample in buffer.samples() {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled).map_err(write_err)?;
            }
        }
        _ => {
            for &sample in buffer.samples() {
                writer.write_sample(sample).map_err(write_err)?;
            }
        }
    }

    writer.finalize().map_err(write_err)?;
    Ok(())
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    path: &Path,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let read_err = |source| FxError::AudioRead {
        path: path.display().to_string(),
        source,
    };

    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(read_err),
        SampleFormat::Int => {
            let scale = match bits_per_sample {
                8 => 128.0,
                16 => 32768.0,
                24 => 8388608.0,
                32 => 2147483648.0,
                _ => {
                    return Err(FxError::UnsupportedFormat {
                        details: format!("{}-bit integer audio", bits_per_sample),
                    })
                }
            };
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(read_err)
        }
    }
}

/// Average interleaved frames down to one channel
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
