//! Replay validation
//!
//! Re-executes a recorded run from its starting checkpoint, feeding back the
//! recorded input, and checks two things:
//!
//! 1. the end-of-tick state hash matches at every recorded tick; the first
//!    mismatch halts validation with [`SimulationError::DeterminismDivergence`]
//! 2. the sequence of seeds, random draws and decisions matches entry for
//!    entry; a difference is a [`SimulationError::ReplayMismatch`]

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::config::SimulationConfig;
use crate::events::ScheduledEvent;
use crate::orchestrator::checkpoint::Checkpoint;
use crate::orchestrator::{Orchestrator, SimulationError};
use crate::replay::log::{ReplayEntry, ReplayLog};
use crate::replay::script::{InputScript, ScriptedInput};
use crate::spatial::SpatialSystem;

/// Everything needed to re-execute a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub config: SimulationConfig,
    pub start: Checkpoint,
    #[serde(default)]
    pub schedule: Vec<ScheduledEvent>,
    pub script: InputScript,
    pub log: ReplayLog,
}

impl Recording {
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

/// Summary of a successful validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub ticks_verified: u64,
    pub entries_compared: usize,
    pub final_hash: Option<u64>,
}

pub struct ReplayValidator {
    recording: Recording,
    spatial: Option<Box<dyn SpatialSystem>>,
}

impl ReplayValidator {
    pub fn new(recording: Recording) -> Self {
        Self {
            recording,
            spatial: None,
        }
    }

    /// Spatial collaborator the original run used (stationary by default)
    pub fn with_spatial(mut self, spatial: Box<dyn SpatialSystem>) -> Self {
        self.spatial = Some(spatial);
        self
    }

    pub fn validate(self) -> Result<ReplayReport, SimulationError> {
        let Recording {
            config,
            start,
            schedule,
            script,
            log,
        } = self.recording;

        let fingerprint = config.fingerprint()?;
        if fingerprint != log.header().config_hash {
            return Err(SimulationError::StateValidationError(format!(
                "replay log was recorded with config {}, not {}",
                log.header().config_hash,
                fingerprint
            )));
        }

        let mut orchestrator = Orchestrator::from_checkpoint(config, start)?.with_schedule(schedule)?;
        if let Some(spatial) = self.spatial {
            orchestrator = orchestrator.with_spatial(spatial);
        }

        let expected_hashes = log.state_hashes();
        info!(run_id = %log.header().run_id, ticks = expected_hashes.len(), "validating replay");

        let mut final_hash = None;
        for &(tick, expected) in &expected_hashes {
            if orchestrator.current_tick() != tick {
                return Err(SimulationError::StateValidationError(format!(
                    "recorded hash for tick {} but replay is at tick {}",
                    tick,
                    orchestrator.current_tick()
                )));
            }
            apply_inputs(&mut orchestrator, &script, tick)?;

            let actual = orchestrator.tick().state_hash;
            if actual != expected {
                return Err(SimulationError::DeterminismDivergence {
                    tick,
                    expected,
                    actual,
                });
            }
            debug!(tick, hash = actual, "tick verified");
            final_hash = Some(actual);
        }

        let entries_compared = compare_checked_entries(&log, orchestrator.replay_log())?;

        Ok(ReplayReport {
            ticks_verified: expected_hashes.len() as u64,
            entries_compared,
            final_hash,
        })
    }
}

fn apply_inputs(
    orchestrator: &mut Orchestrator,
    script: &InputScript,
    tick: u64,
) -> Result<(), SimulationError> {
    for input in script.inputs_for(tick) {
        match input {
            ScriptedInput::Decision(decision) => orchestrator.submit_decision(decision.clone())?,
            ScriptedInput::Injection(spec) => orchestrator.inject_event(spec.clone())?,
        }
    }
    Ok(())
}

/// Compare seeds, random draws and decisions entry by entry
fn compare_checked_entries(original: &ReplayLog, replayed: &ReplayLog) -> Result<usize, SimulationError> {
    let expected: Vec<&ReplayEntry> = original.replay_checked().collect();
    let actual: Vec<&ReplayEntry> = replayed.replay_checked().collect();

    for (index, (e, a)) in expected.iter().zip(actual.iter()).enumerate() {
        if e != a {
            return Err(SimulationError::ReplayMismatch {
                tick: e.tick,
                index,
                detail: format!(
                    "expected {:?} {} -> {}, got {:?} {} -> {}",
                    e.operation, e.parameters, e.result, a.operation, a.parameters, a.result
                ),
            });
        }
    }

    if expected.len() != actual.len() {
        let index = expected.len().min(actual.len());
        let tick = expected
            .get(index)
            .or_else(|| actual.get(index))
            .map_or(0, |entry| entry.tick);
        return Err(SimulationError::ReplayMismatch {
            tick,
            index,
            detail: format!(
                "expected {} checked entries, replay produced {}",
                expected.len(),
                actual.len()
            ),
        });
    }

    Ok(expected.len())
}
