//! Distortion Effect
//!
//! Drive the input into an exponential soft clipper. The clipper is
//! continuous, odd-symmetric and maps 0 to 0, so silence stays silent.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::effect::{finish, mix, prepare_input, Effect, EffectKind, EffectParams, ParamSpec};
use super::safety;
use crate::engine::AudioBuffer;
use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Cap on the soft-clip exponent argument
const MAX_EXPONENT: f32 = 30.0;

pub const AMOUNT: ParamSpec = ParamSpec::new("amount", 0.5, 0.0, 1.0);
pub const WET_LEVEL: ParamSpec = ParamSpec::new("wet_level", 0.5, 0.0, 1.0);
pub const DRY_LEVEL: ParamSpec = ParamSpec::new("dry_level", 0.5, 0.0, 1.0);

/// Recognized distortion parameters
pub const PARAMS: &[ParamSpec] = &[AMOUNT, WET_LEVEL, DRY_LEVEL];

// ============================================================================
// Helper Functions
// ============================================================================

/// Exponential soft clip: `sign(x) * (1 - exp(-min(shape * |x|, 30)))`
#[inline]
pub fn soft_clip(x: f32, shape: f32) -> f32 {
    let magnitude = 1.0 - (-(shape * x.abs()).min(MAX_EXPONENT)).exp();
    if x < 0.0 {
        -magnitude
    } else {
        magnitude
    }
}

// ============================================================================
// Distortion
// ============================================================================

/// Soft-clipping distortion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distortion {
    /// Distortion amount (0-1)
    amount: f32,
    wet_level: f32,
    dry_level: f32,
}

impl Default for Distortion {
    fn default() -> Self {
        Self {
            amount: AMOUNT.default,
            wet_level: WET_LEVEL.default,
            dry_level: DRY_LEVEL.default,
        }
    }
}

impl Distortion {
    /// Create a distortion with the given amount
    ///
    /// # Arguments
    /// * `amount` - Distortion amount (clamped to 0-1)
    pub fn new(amount: f32) -> Self {
        Self {
            amount: AMOUNT.clamp(amount),
            ..Self::default()
        }
    }

    /// Build from a parameter map, applying defaults and clamping
    pub fn from_params(params: &EffectParams) -> Self {
        Self {
            amount: params.resolve(&AMOUNT),
            wet_level: params.resolve(&WET_LEVEL),
            dry_level: params.resolve(&DRY_LEVEL),
        }
    }

    pub fn set_amount(&mut self, amount: f32) {
        self.amount = AMOUNT.clamp(amount);
    }

    pub fn amount(&self) -> f32 {
        self.amount
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

    /// Pre-clip drive: 1 at amount 0, 10 at amount 1
    pub fn gain(&self) -> f32 {
        1.0 + 9.0 * self.amount
    }

    /// Clipper steepness: 1 at amount 0, 6 at amount 1
    pub fn shape(&self) -> f32 {
        1.0 + 5.0 * self.amount
    }

    fn wet_signal(&self, samples: &[f32]) -> Vec<f32> {
        let gain = self.gain();
        let shape = self.shape();
        let wet = samples.iter().map(|&x| soft_clip(gain * x, shape)).collect();
        safety::normalized(wet)
    }
}

impl Effect for Distortion {
    fn kind(&self) -> EffectKind {
        EffectKind::Distortion
    }

    fn process(&self, input: &AudioBuffer) -> Result<AudioBuffer> {
        let samples = prepare_input(input)?;
        let wet = self.wet_signal(&samples);
        let output = mix(&samples, &wet, self.dry_level, self.wet_level);
        Ok(finish(input, output))
    }

    fn params(&self) -> Value {
        json!({
            "amount": self.amount,
            "wet_level": self.wet_level,
            "dry_level": self.dry_level,
        })
    }
}
