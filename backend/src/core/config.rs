//! Simulation configuration
//!
//! All coefficients the deterministic core reads are collected here. The
//! configuration is loaded once (JSON via `serde_json`), validated, and then
//! treated as read-only for the lifetime of an orchestrator.
//!
//! Every section is `#[serde(default)]`, so a partial document only needs to
//! name the values it overrides:
//!
//! ```rust
//! use settlement_sim_core::SimulationConfig;
//!
//! let config = SimulationConfig::from_json_str(r#"{ "global_seed": 7, "emotion": { "alpha": 0.2 } }"#).unwrap();
//! assert_eq!(config.global_seed, 7);
//! assert_eq!(config.emotion.alpha, 0.2);
//! assert_eq!(config.emotion.beta, 0.01); // untouched default
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::orchestrator::checkpoint::compute_config_hash;
use crate::orchestrator::SimulationError;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse config JSON: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed every tick's RNG is derived from (`global_seed + tick`)
    pub global_seed: u64,

    /// Ticks between bounds-validation sweeps
    pub validation_interval: u64,

    /// Distance under which two agents count as social contacts
    pub proximity_radius: f64,

    pub emotion: EmotionParams,
    pub faction: FactionParams,
    pub thresholds: Thresholds,
    pub cascade: CascadeParams,
    pub decision: DecisionParams,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            global_seed: 0,
            validation_interval: 100,
            proximity_radius: 5.0,
            emotion: EmotionParams::default(),
            faction: FactionParams::default(),
            thresholds: Thresholds::default(),
            cascade: CascadeParams::default(),
            decision: DecisionParams::default(),
        }
    }
}

/// Coefficients of the three-layer emotional model
///
/// `E_i = θ1·tone + θ2·relevance + θ3·bias + θ4·socialPressure`,
/// `M_s(t) = α·E_i + (1-α)·M_s(t-1)`, `A_l(t) = A_l(t-1) + β·M_s(t)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionParams {
    /// θ1
    pub tone_weight: f64,
    /// θ2
    pub relevance_weight: f64,
    /// θ3
    pub bias_weight: f64,
    /// θ4
    pub social_weight: f64,
    /// Mood smoothing factor α
    pub alpha: f64,
    /// Attitude accumulation rate β
    pub beta: f64,
}

impl Default for EmotionParams {
    fn default() -> Self {
        Self {
            tone_weight: 0.4,
            relevance_weight: 0.3,
            bias_weight: 0.2,
            social_weight: 0.1,
            alpha: 0.1,
            beta: 0.01,
        }
    }
}

/// Faction loyalty weights and emergence steepness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactionParams {
    /// w1, applied to the member's long-term attitude
    pub attitude_weight: f64,
    /// w2, applied to the faction's relevance
    pub relevance_weight: f64,
    /// w3, applied to the faction's emotional appeal
    pub appeal_weight: f64,
    /// k in `sigmoid(k·(1 - avgMemberLoyalty))`
    pub emergence_steepness: f64,
    /// Skill count at which the skill term of capability saturates
    pub max_skills: u32,
    /// Age (years) at which the age term of capability saturates
    pub age_saturation: f64,
    /// Emergence probability a faction must reach before it rolls for
    /// unilateral action
    pub emergence_action_threshold: f64,
}

impl Default for FactionParams {
    fn default() -> Self {
        Self {
            attitude_weight: 0.5,
            relevance_weight: 0.3,
            appeal_weight: 0.2,
            emergence_steepness: 2.0,
            max_skills: 10,
            age_saturation: 30.0,
            emergence_action_threshold: 0.75,
        }
    }
}

/// Fixed thresholds for problem detection and world-state diffs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Severity at or above which an agent seeks dialogue
    pub dialogue: f64,
    /// Mood change that counts as significant for the narrative layer
    pub mood_delta: f64,
    /// Faction average-loyalty change that counts as significant
    pub loyalty_delta: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            dialogue: 0.3,
            mood_delta: 0.2,
            loyalty_delta: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeParams {
    /// Multiplier on impact level inside `sigmoid(impact · factor)`
    pub factor: f64,
}

impl Default for CascadeParams {
    fn default() -> Self {
        Self { factor: 0.5 }
    }
}

/// How strongly a leadership decision moves loyalty and how loud its decree is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionParams {
    /// Maximum loyalty change a single decision applies to one agent
    pub loyalty_sensitivity: f64,
    /// Impact level of a decree issued with zero quantity
    pub base_impact: f64,
}

impl Default for DecisionParams {
    fn default() -> Self {
        Self {
            loyalty_sensitivity: 0.1,
            base_impact: 3.0,
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Convenience constructor used heavily in tests
    pub fn with_seed(global_seed: u64) -> Self {
        Self {
            global_seed,
            ..Self::default()
        }
    }

    /// SHA-256 fingerprint of the canonical JSON form of this config
    pub fn fingerprint(&self) -> Result<String, SimulationError> {
        compute_config_hash(self)
    }

    /// Validate ranges of every coefficient
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validation_interval == 0 {
            return Err(invalid("validation_interval must be > 0"));
        }
        if !self.proximity_radius.is_finite() || self.proximity_radius < 0.0 {
            return Err(invalid("proximity_radius must be a finite value >= 0"));
        }

        let e = &self.emotion;
        for (name, value) in [
            ("emotion.tone_weight", e.tone_weight),
            ("emotion.relevance_weight", e.relevance_weight),
            ("emotion.bias_weight", e.bias_weight),
            ("emotion.social_weight", e.social_weight),
            ("faction.attitude_weight", self.faction.attitude_weight),
            ("faction.relevance_weight", self.faction.relevance_weight),
            ("faction.appeal_weight", self.faction.appeal_weight),
        ] {
            require_non_negative(name, value)?;
        }
        if !(e.alpha > 0.0 && e.alpha <= 1.0) {
            return Err(invalid(format!(
                "emotion.alpha must be in (0, 1], got {}",
                e.alpha
            )));
        }
        if !(0.0..=1.0).contains(&e.beta) {
            return Err(invalid(format!(
                "emotion.beta must be in [0, 1], got {}",
                e.beta
            )));
        }

        let f = &self.faction;
        if !f.emergence_steepness.is_finite() {
            return Err(invalid("faction.emergence_steepness must be finite"));
        }
        if f.max_skills == 0 {
            return Err(invalid("faction.max_skills must be > 0"));
        }
        if !(f.age_saturation.is_finite() && f.age_saturation > 0.0) {
            return Err(invalid("faction.age_saturation must be > 0"));
        }

        for (name, value) in [
            ("faction.emergence_action_threshold", f.emergence_action_threshold),
            ("thresholds.dialogue", self.thresholds.dialogue),
            ("thresholds.mood_delta", self.thresholds.mood_delta),
            ("thresholds.loyalty_delta", self.thresholds.loyalty_delta),
            ("decision.loyalty_sensitivity", self.decision.loyalty_sensitivity),
        ] {
            if !crate::core::math::is_unit(value) {
                return Err(invalid(format!("{} must be in [0, 1], got {}", name, value)));
            }
        }

        if !self.cascade.factor.is_finite() {
            return Err(invalid("cascade.factor must be finite"));
        }
        if !(0.0..=10.0).contains(&self.decision.base_impact) {
            return Err(invalid("decision.base_impact must be in [0, 10]"));
        }

        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

fn require_non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{} must be finite and >= 0, got {}", name, value)))
    }
}
