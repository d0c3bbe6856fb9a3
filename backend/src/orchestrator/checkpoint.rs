//! Checkpoint - Save/Load Simulation State
//!
//! Enables serialization and deserialization of complete orchestrator state
//! for pause/resume functionality. A checkpoint is always taken between
//! ticks, with the phase machine idle.
//!
//! # Critical Invariants
//!
//! - **Determinism**: resuming from a checkpoint produces the same hashes as
//!   the uninterrupted run
//! - **Event Integrity**: every `caused_by` names an older, existing event
//! - **Config Matching**: a checkpoint can only be loaded with the config it
//!   was taken under

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::events::EventSpec;
use crate::models::decision::Decision;
use crate::models::ids::{EventId, ResourceId};
use crate::models::registry::Identified;
use crate::models::state::SimulationState;
use crate::orchestrator::SimulationError;
use crate::tracking::PreviousStateCache;

// ============================================================================
// Snapshot Structure
// ============================================================================

/// Complete orchestrator state between two ticks
///
/// The RNG is not stored: it is re-seeded from `global_seed + tick` at the
/// start of every tick, so the tick number is enough to resume it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Tick the resumed orchestrator will execute next
    pub tick: u64,

    /// SHA256 hash of the config (for validation)
    pub config_hash: String,

    pub state: SimulationState,

    /// Last tick's projection, needed for the next tick's deltas
    pub previous: PreviousStateCache,

    /// Events created since the last emotion phase, in ID order
    #[serde(default)]
    pub pending_stimuli: Vec<EventId>,

    /// Events injected by the host for the next tick
    #[serde(default)]
    pub pending_injections: Vec<EventSpec>,

    #[serde(default)]
    pub pending_decision: Option<Decision>,

    /// First event ID the world-state tracker has not reported
    pub reported_watermark: EventId,

    /// Resource scarcity as the world-state tracker last saw it
    #[serde(default)]
    pub reported_scarcity: BTreeMap<ResourceId, bool>,
}

impl Checkpoint {
    pub fn to_json(&self) -> Result<String, SimulationError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SimulationError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Compute deterministic SHA256 hash of config
///
/// This hash is used to verify that a checkpoint's config matches
/// the config used to restore it.
///
/// Uses canonical JSON serialization with sorted keys to ensure
/// deterministic hashing regardless of map iteration order.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SimulationError> {
    use serde_json::Value;

    let value = serde_json::to_value(config).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    // Recursively sort all object keys for canonical representation
    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let canonical_value = canonicalize(value);

    let json = serde_json::to_string(&canonical_value).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    let result = hasher.finalize();

    Ok(format!("{:x}", result))
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validate checkpoint integrity
///
/// Checks:
/// - Every stored scalar is finite
/// - Event referential integrity (`caused_by` names an older event)
/// - Pending stimuli refer to stored events, without duplicates
/// - The tracker watermark does not run ahead of event allocation
///
/// Scalars that are finite but out of range are left alone; the next
/// validation sweep pulls them back and logs the correction.
pub fn validate_checkpoint(checkpoint: &Checkpoint) -> Result<(), SimulationError> {
    let state = &checkpoint.state;

    // 1. Finite scalars
    for agent in state.agents().get_all() {
        let a = agent.affect();
        let p = agent.position();
        let values = [
            a.immediate_emotion,
            a.short_term_mood,
            a.long_term_attitude,
            agent.loyalty(),
            agent.ambition(),
            agent.age(),
            agent.emotional_bias(),
            p.x,
            p.y,
            p.z,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SimulationError::StateValidationError(format!(
                "agent {} has a non-finite value",
                agent.id()
            )));
        }
    }
    for faction in state.factions().get_all() {
        if !faction.relevance().is_finite() || !faction.emotional_appeal().is_finite() {
            return Err(SimulationError::StateValidationError(format!(
                "faction {} has a non-finite value",
                faction.id()
            )));
        }
    }
    for resource in state.resources().get_all() {
        if !resource.quantity().is_finite() || !resource.scarcity_threshold().is_finite() {
            return Err(SimulationError::StateValidationError(format!(
                "resource {} has a non-finite value",
                resource.id()
            )));
        }
    }

    // 2. Event referential integrity
    for event in state.events().get_all() {
        if !event.tone().is_finite() || !event.impact_level().is_finite() {
            return Err(SimulationError::StateValidationError(format!(
                "event {} has a non-finite value",
                event.id()
            )));
        }
        if let Some(parent) = event.caused_by() {
            if parent >= event.id() || state.get_event(parent).is_none() {
                return Err(SimulationError::StateValidationError(format!(
                    "event {} is caused by unknown or newer event {}",
                    event.id(),
                    parent
                )));
            }
        }
    }

    // 3. Pending stimuli
    let mut seen = BTreeSet::new();
    for id in &checkpoint.pending_stimuli {
        if state.get_event(*id).is_none() {
            return Err(SimulationError::StateValidationError(format!(
                "pending stimulus {} is not a stored event",
                id
            )));
        }
        if !seen.insert(*id) {
            return Err(SimulationError::StateValidationError(format!(
                "pending stimulus {} listed twice",
                id
            )));
        }
    }

    // 4. Watermark
    if checkpoint.reported_watermark > state.next_event_id() {
        return Err(SimulationError::StateValidationError(format!(
            "reported watermark {} is ahead of next event id {}",
            checkpoint.reported_watermark,
            state.next_event_id()
        )));
    }

    Ok(())
}
