//! Effect trait definition
//!
//! Effects are stateless per call: each one is built from resolved
//! parameters, reads an input buffer, and returns a new buffer of the same
//! length and sample rate.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::safety;
use crate::engine::AudioBuffer;
use crate::error::{FxError, Result};

/// Closed set of effect kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Reverb,
    Delay,
    Chorus,
    Distortion,
    #[serde(alias = "eq")]
    Equalizer,
}

impl EffectKind {
    /// All kinds, in listing order
    pub const ALL: [EffectKind; 5] = [
        EffectKind::Reverb,
        EffectKind::Delay,
        EffectKind::Chorus,
        EffectKind::Distortion,
        EffectKind::Equalizer,
    ];

    /// Get string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::Reverb => "reverb",
            EffectKind::Delay => "delay",
            EffectKind::Chorus => "chorus",
            EffectKind::Distortion => "distortion",
            EffectKind::Equalizer => "equalizer",
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            EffectKind::Reverb => "Reverb",
            EffectKind::Delay => "Delay",
            EffectKind::Chorus => "Chorus",
            EffectKind::Distortion => "Distortion",
            EffectKind::Equalizer => "Equalizer",
        }
    }

    /// Recognized parameters for this kind
    pub fn param_specs(&self) -> &'static [ParamSpec] {
        match self {
            EffectKind::Reverb => super::reverb::PARAMS,
            EffectKind::Delay => super::delay::PARAMS,
            EffectKind::Chorus => super::chorus::PARAMS,
            EffectKind::Distortion => super::distortion::PARAMS,
            EffectKind::Equalizer => super::eq::PARAMS,
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectKind {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "reverb" => Ok(EffectKind::Reverb),
            "delay" => Ok(EffectKind::Delay),
            "chorus" => Ok(EffectKind::Chorus),
            "distortion" => Ok(EffectKind::Distortion),
            "equalizer" | "eq" => Ok(EffectKind::Equalizer),
            _ => Err(FxError::UnknownEffect {
                name: s.to_string(),
            }),
        }
    }
}

/// Declared range and default of one effect parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub default: f32,
    pub min: f32,
    pub max: f32,
}

impl ParamSpec {
    pub const fn new(name: &'static str, default: f32, min: f32, max: f32) -> Self {
        Self {
            name,
            default,
            min,
            max,
        }
    }

    /// Clamp a value into the declared range
    ///
    /// NaN falls back to the default.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }
        value.clamp(self.min, self.max)
    }
}

/// Flat name -> value parameter map for one stage
///
/// Unknown keys are kept but ignored by the effects. Missing or non-numeric
/// values resolve to the declared default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectParams(BTreeMap<String, Value>);

impl EffectParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style numeric setter
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.set(name, value);
        self
    }

    /// Set a numeric parameter
    pub fn set(&mut self, name: &str, value: f64) {
        self.0.insert(name.to_string(), Value::from(value));
    }

    /// Raw value by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Number of entries (including unrecognized keys)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve a parameter: default when missing, clamped when present
    pub fn resolve(&self, spec: &ParamSpec) -> f32 {
        match self.0.get(spec.name) {
            None => spec.default,
            Some(value) => match value.as_f64() {
                Some(v) => {
                    let clamped = spec.clamp(v as f32);
                    if clamped != v as f32 {
                        tracing::debug!(
                            param = spec.name,
                            requested = v,
                            clamped,
                            "parameter clamped to range"
                        );
                    }
                    clamped
                }
                None => {
                    tracing::debug!(
                        param = spec.name,
                        value = %value,
                        "non-numeric parameter, using default"
                    );
                    spec.default
                }
            },
        }
    }
}

impl<const N: usize> From<[(&str, f64); N]> for EffectParams {
    fn from(entries: [(&str, f64); N]) -> Self {
        entries
            .into_iter()
            .fold(EffectParams::new(), |params, (name, value)| params.with(name, value))
    }
}

/// Base trait for all DSP effects
pub trait Effect: Send + Sync {
    /// Which kind of effect this is
    fn kind(&self) -> EffectKind;

    /// Transform `input` into a new buffer of the same length and rate
    ///
    /// Processed output is always passed through the safety layer.
    fn process(&self, input: &AudioBuffer) -> Result<AudioBuffer>;

    /// Resolved parameters as JSON (for logging and the CLI)
    fn params(&self) -> Value;
}

/// Validate an effect input and return a sanitized copy of its samples
///
/// # Errors
/// * `EmptyBuffer` / `InvalidSampleRate` - If the buffer breaks the input contract
pub(crate) fn prepare_input(input: &AudioBuffer) -> Result<Vec<f32>> {
    input.validate()?;
    let mut samples = input.samples().to_vec();
    let replaced = safety::sanitize(&mut samples);
    if replaced > 0 {
        tracing::debug!(replaced, "sanitized non-finite input samples");
    }
    Ok(samples)
}

/// Wrap processed samples in a buffer shaped like `input`, normalized
pub(crate) fn finish(input: &AudioBuffer, samples: Vec<f32>) -> AudioBuffer {
    input.with_samples(safety::normalized(samples))
}

/// Blend dry and wet signals: `dry_level * dry + wet_level * wet`
pub fn mix(dry: &[f32], wet: &[f32], dry_level: f32, wet_level: f32) -> Vec<f32> {
    dry.iter()
        .zip(wet.iter())
        .map(|(&d, &w)| dry_level * d + wet_level * w)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LEVEL: ParamSpec = ParamSpec::new("level", 0.5, 0.0, 1.0);

    #[test]
    fn test_kind_from_str() {
        assert_eq!("reverb".parse::<EffectKind>().unwrap(), EffectKind::Reverb);
        assert_eq!("EQ".parse::<EffectKind>().unwrap(), EffectKind::Equalizer);
        assert_eq!(" Chorus ".parse::<EffectKind>().unwrap(), EffectKind::Chorus);
        assert!(matches!(
            "flanger".parse::<EffectKind>(),
            Err(FxError::UnknownEffect { .. })
        ));
    }

    #[test]
    fn test_kind_serde_names() {
        assert_eq!(serde_json::to_value(EffectKind::Equalizer).unwrap(), json!("equalizer"));
        let kind: EffectKind = serde_json::from_value(json!("eq")).unwrap();
        assert_eq!(kind, EffectKind::Equalizer);
    }

    #[test]
    fn test_resolve_missing_uses_default() {
        let params = EffectParams::new();
        assert_eq!(params.resolve(&LEVEL), 0.5);
    }

    #[test]
    fn test_resolve_clamps() {
        assert_eq!(EffectParams::from([("level", 5.0)]).resolve(&LEVEL), 1.0);
        assert_eq!(EffectParams::from([("level", -2.0)]).resolve(&LEVEL), 0.0);
        assert_eq!(EffectParams::from([("level", 0.25)]).resolve(&LEVEL), 0.25);
    }

    #[test]
    fn test_resolve_non_numeric_uses_default() {
        let params: EffectParams = serde_json::from_value(json!({"level": "loud"})).unwrap();
        assert_eq!(params.resolve(&LEVEL), 0.5);
    }

    #[test]
    fn test_resolve_accepts_integers() {
        let params: EffectParams = serde_json::from_value(json!({"level": 1})).unwrap();
        assert_eq!(params.resolve(&LEVEL), 1.0);
    }

    #[test]
    fn test_every_kind_has_params() {
        for kind in EffectKind::ALL {
            assert!(!kind.param_specs().is_empty(), "{} has no params", kind);
            for p in kind.param_specs() {
                assert!(p.min <= p.default && p.default <= p.max, "{}.{}", kind, p.name);
            }
        }
    }

    #[test]
    fn test_mix() {
        let out = mix(&[1.0, 0.0], &[0.0, 1.0], 0.7, 0.3);
        assert_eq!(out, vec![0.7, 0.3]);
    }
}
