//! Effect Chain execution
//!
//! Effects are processed in chain order (index 0 first). Each stage reads
//! the buffer left by the previous one. A stage that fails is recorded as
//! skipped and the chain continues from the buffer as it stood before that
//! stage. A final safety pass runs after the last stage.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::chorus::Chorus;
use super::delay::Delay;
use super::distortion::Distortion;
use super::effect::{Effect, EffectKind, EffectParams};
use super::eq::Equalizer;
use super::reverb::Reverb;
use super::safety;
use crate::engine::AudioBuffer;
use crate::error::{FxError, Result};

// ============================================================================
// Stages
// ============================================================================

/// One pipeline stage: an effect kind and its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    #[serde(rename = "effect")]
    pub kind: EffectKind,
    #[serde(default)]
    pub params: EffectParams,
}

impl EffectSpec {
    pub fn new(kind: EffectKind, params: EffectParams) -> Self {
        Self { kind, params }
    }

    /// Stage with every parameter at its default
    pub fn with_defaults(kind: EffectKind) -> Self {
        Self::new(kind, EffectParams::new())
    }

    /// Instantiate the effect with resolved parameters
    pub fn build(&self) -> Box<dyn Effect> {
        build_effect(self.kind, &self.params)
    }
}

/// Create an effect of `kind` from a parameter map
pub fn build_effect(kind: EffectKind, params: &EffectParams) -> Box<dyn Effect> {
    match kind {
        EffectKind::Reverb => Box::new(Reverb::from_params(params)),
        EffectKind::Delay => Box::new(Delay::from_params(params)),
        EffectKind::Chorus => Box::new(Chorus::from_params(params)),
        EffectKind::Distortion => Box::new(Distortion::from_params(params)),
        EffectKind::Equalizer => Box::new(Equalizer::from_params(params)),
    }
}

/// Stage as written in a chain file; the name is checked when loading
#[derive(Debug, Deserialize)]
struct RawStage {
    effect: String,
    #[serde(default)]
    params: EffectParams,
}

#[derive(Debug, Deserialize)]
struct RawChain {
    effects: Vec<RawStage>,
}

// ============================================================================
// Outcomes
// ============================================================================

/// What happened to one stage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    Applied,
    Skipped { reason: String },
}

/// Per-stage record of a chain run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageOutcome {
    pub index: usize,
    pub kind: EffectKind,
    #[serde(flatten)]
    pub status: StageStatus,
}

impl StageOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self.status, StageStatus::Applied)
    }
}

/// Result of running a chain
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutput {
    pub buffer: AudioBuffer,
    pub outcomes: Vec<StageOutcome>,
}

impl ChainOutput {
    /// Number of stages that were applied
    pub fn applied_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_applied()).count()
    }

    /// Number of stages that failed and were skipped
    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.applied_count()
    }
}

// ============================================================================
// Effect Chain
// ============================================================================

/// Ordered sequence of effect stages
///
/// Duplicates are allowed; each stage is applied in turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectChain {
    stages: Vec<EffectSpec>,
}

impl EffectChain {
    /// Create a new empty effect chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage
    pub fn push(&mut self, spec: EffectSpec) {
        self.stages.push(spec);
    }

    /// Builder-style append
    pub fn with(mut self, kind: EffectKind, params: EffectParams) -> Self {
        self.push(EffectSpec::new(kind, params));
        self
    }

    /// Build a chain of default-parameter stages from effect names
    ///
    /// Unrecognized names are skipped with a warning.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut chain = Self::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            match name.parse::<EffectKind>() {
                Ok(kind) => chain.push(EffectSpec::with_defaults(kind)),
                Err(e) => tracing::warn!(error = %e, "ignoring unknown effect"),
            }
        }
        chain
    }

    /// Parse a chain description:
    /// `{"effects": [{"effect": "reverb", "params": {"room_size": 0.9}}]}`
    ///
    /// Unrecognized effect names are skipped with a warning.
    ///
    /// # Errors
    /// * `InvalidChainConfig` - If the JSON does not have the expected shape
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawChain =
            serde_json::from_str(json).map_err(|e| FxError::InvalidChainConfig {
                details: e.to_string(),
            })?;

        let mut chain = Self::new();
        for (index, stage) in raw.effects.into_iter().enumerate() {
            match stage.effect.parse::<EffectKind>() {
                Ok(kind) => chain.push(EffectSpec::new(kind, stage.params)),
                Err(e) => tracing::warn!(index, error = %e, "ignoring unknown effect"),
            }
        }
        Ok(chain)
    }

    /// Load a chain description from a JSON file
    ///
    /// # Errors
    /// * `Io` - If the file cannot be read
    /// * `InvalidChainConfig` - If the contents are not a chain description
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Serialize to the chain description format
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&serde_json::json!({
            "effects": self.stages,
        }))?)
    }

    /// Get the number of stages in the chain
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Iterate over stages in application order
    pub fn iter(&self) -> impl Iterator<Item = &EffectSpec> {
        self.stages.iter()
    }

    /// Run every stage over `input`
    ///
    /// Stage failures are recorded in the returned outcomes and never abort
    /// the chain.
    ///
    /// # Errors
    /// * `EmptyBuffer` / `InvalidSampleRate` - If `input` is not processable
    pub fn process(&self, input: &AudioBuffer) -> Result<ChainOutput> {
        input.validate()?;

        tracing::info!(
            stages = self.stages.len(),
            samples = input.len(),
            sample_rate = input.sample_rate(),
            "processing effect chain"
        );

        let mut current = input.clone();
        let mut outcomes = Vec::with_capacity(self.stages.len());

        for (index, spec) in self.stages.iter().enumerate() {
            let effect = spec.build();
            tracing::debug!(index, effect = %spec.kind, params = %effect.params(), "applying stage");

            let status = match effect.process(&current) {
                Ok(output) => {
                    current = output;
                    StageStatus::Applied
                }
                Err(e) => {
                    tracing::warn!(
                        index,
                        effect = %spec.kind,
                        code = e.error_code(),
                        error = %e,
                        "effect failed, skipping stage"
                    );
                    StageStatus::Skipped {
                        reason: e.to_string(),
                    }
                }
            };

            outcomes.push(StageOutcome {
                index,
                kind: spec.kind,
                status,
            });
        }

        safety::normalize(current.samples_mut());

        let output = ChainOutput {
            buffer: current,
            outcomes,
        };
        tracing::info!(
            applied = output.applied_count(),
            skipped = output.skipped_count(),
            peak = output.buffer.peak(),
            "effect chain complete"
        );
        Ok(output)
    }

    /// Run the chain, returning `input` unchanged if it cannot be processed at all
    pub fn process_or_passthrough(&self, input: &AudioBuffer) -> AudioBuffer {
        match self.process(input) {
            Ok(output) => output.buffer,
            Err(e) => {
                tracing::warn!(error = %e, "effect chain failed, returning input unchanged");
                input.clone()
            }
        }
    }
}

impl FromIterator<EffectSpec> for EffectChain {
    fn from_iter<T: IntoIterator<Item = EffectSpec>>(iter: T) -> Self {
        Self {
            stages: iter.into_iter().collect(),
        }
    }
}
