//! Error handling for fxchain
//!
//! Every error carries a stable code and a recovery hint. Per-effect failures
//! are recoverable (the chain skips the stage); malformed input is not.

use thiserror::Error;

/// Result type alias for fxchain operations
pub type Result<T> = std::result::Result<T, FxError>;

/// Main error type for fxchain operations
#[derive(Error, Debug)]
pub enum FxError {
    // Input validation errors
    #[error("Audio buffer is empty")]
    EmptyBuffer,

    #[error("Invalid sample rate: {sample_rate} Hz")]
    InvalidSampleRate { sample_rate: u32 },

    // Chain configuration errors
    #[error("Unknown effect: {name}")]
    UnknownEffect { name: String },

    #[error("Invalid effect chain configuration: {details}")]
    InvalidChainConfig { details: String },

    // DSP errors
    #[error("{filter} filter needs a delay of at least one sample (got {delay_samples})")]
    InvalidDelay {
        filter: &'static str,
        delay_samples: usize,
    },

    #[error("Filter design failed: {details}")]
    FilterDesign { details: String },

    // Synthesis collaborator errors
    #[error("Score rendering failed: {details}")]
    Render { details: String },

    // Audio I/O errors
    #[error("Failed to read audio file: {path}")]
    AudioRead {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("Failed to write audio file: {path}")]
    AudioWrite {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("Unsupported audio format: {details}")]
    UnsupportedFormat { details: String },

    // Generic I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FxError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::EmptyBuffer => "EMPTY_BUFFER",
            FxError::InvalidSampleRate { .. } => "INVALID_SAMPLE_RATE",
            FxError::UnknownEffect { .. } => "UNKNOWN_EFFECT",
            FxError::InvalidChainConfig { .. } => "INVALID_CHAIN_CONFIG",
            FxError::InvalidDelay { .. } => "INVALID_DELAY",
            FxError::FilterDesign { .. } => "FILTER_DESIGN",
            FxError::Render { .. } => "RENDER_ERROR",
            FxError::AudioRead { .. } => "AUDIO_READ_ERROR",
            FxError::AudioWrite { .. } => "AUDIO_WRITE_ERROR",
            FxError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            FxError::Io(_) => "IO_ERROR",
            FxError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors are confined to a single effect stage; the chain
    /// keeps going with the pre-stage buffer.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FxError::UnknownEffect { .. }
                | FxError::InvalidDelay { .. }
                | FxError::FilterDesign { .. }
        )
    }

    /// Returns a suggested recovery action for this error
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::EmptyBuffer => "Render or load audio before applying effects",
            Self::InvalidSampleRate { .. } => "Use a positive sample rate such as 22050 or 44100 Hz",
            Self::UnknownEffect { .. } => {
                "Supported effects: reverb, delay, chorus, distortion, equalizer"
            }
            Self::InvalidChainConfig { .. } => {
                "Expected {\"effects\": [{\"effect\": \"reverb\", \"params\": {...}}]}"
            }
            Self::InvalidDelay { .. } => "Increase the sample rate; the delay rounds to zero samples",
            Self::FilterDesign { .. } => {
                "Band edges must sit below Nyquist; use a sample rate above 4 kHz"
            }
            Self::Render { .. } => "Check that fluidsynth is installed and the soundfont exists",
            Self::AudioRead { .. } => "Check that the file exists and is a valid WAV file",
            Self::UnsupportedFormat { .. } => "Convert to 16/24-bit integer or 32-bit float WAV",
            _ => "Check the error details and try again",
        }
    }
}
