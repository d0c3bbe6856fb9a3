//! Simulation error taxonomy
//!
//! Bounds violations and dangling member references never surface here:
//! they are corrected in place and logged. Determinism divergence is the
//! only failure a player-facing host is expected to report.

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::models::ids::{AgentId, FactionId, ResourceId};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("Agent not found: {0}")]
    AgentNotFound(AgentId),

    #[error("Faction not found: {0}")]
    FactionNotFound(FactionId),

    #[error("Resource not found: {0}")]
    ResourceNotFound(ResourceId),

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    /// A second decision arrived for a tick that already has one
    #[error("Input rejected at tick {tick}: {reason}")]
    InputRejected { tick: u64, reason: String },

    #[error("Invalid decision: {0}")]
    InvalidDecision(String),

    /// Replayed state hash differs from the recorded one
    #[error("Determinism divergence at tick {tick}: expected {expected:#018x}, got {actual:#018x}")]
    DeterminismDivergence { tick: u64, expected: u64, actual: u64 },

    /// Replayed random draw or decision differs from the recorded one
    #[error("Replay mismatch at tick {tick}, entry {index}: {detail}")]
    ReplayMismatch {
        tick: u64,
        index: usize,
        detail: String,
    },

    #[error("State validation failed: {0}")]
    StateValidationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SimulationError {
    fn from(err: serde_json::Error) -> Self {
        SimulationError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divergence_message_names_tick_and_hashes() {
        let err = SimulationError::DeterminismDivergence {
            tick: 42,
            expected: 0xabc,
            actual: 0xdef,
        };
        let msg = err.to_string();
        assert!(msg.contains("tick 42"));
        assert!(msg.contains("0x0000000000000abc"));
        assert!(msg.contains("0x0000000000000def"));
    }

    #[test]
    fn test_config_error_converts() {
        let err: SimulationError = ConfigError::Invalid("alpha".into()).into();
        assert!(matches!(err, SimulationError::Config(_)));
    }
}
