//! Append-only replay log
//!
//! Every operation that consumes randomness or produces a state-affecting
//! result appends one [`ReplayEntry`]. Entries are ordered by tick, then by
//! the order phases emit them, and are never modified after being written.
//!
//! # Persistence
//!
//! A log is persisted as JSON Lines: the first line is the [`ReplayHeader`],
//! every following line one entry. `serde_json` is built with
//! `float_roundtrip`, so `f64` parameters survive the round trip bit-exactly.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::orchestrator::SimulationError;

/// Kind of a logged operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// RNG reseeded at tick start
    TickSeed,
    /// Immediate emotion recomputed from an event stimulus
    ImmediateEmotion,
    /// Faction referenced an agent that no longer exists
    FactionMissingMember,
    /// Agent crossed the dialogue threshold
    DialogueTrigger,
    /// Leadership decision executed
    Decision,
    /// World event created (primary or secondary)
    EventCreated,
    /// Random draw deciding whether a secondary event fires
    CascadeRoll,
    /// Random draw deciding whether a faction acts on its own
    EmergenceRoll,
    /// Scheduled scenario event applied directly to state
    ScenarioEvent,
    /// Out-of-range value clamped by the validation sweep
    BoundsCorrection,
    /// End-of-tick state fingerprint
    StateHash,
}

impl Operation {
    /// Operations whose sequence a replay must reproduce exactly
    pub fn is_replay_checked(self) -> bool {
        matches!(
            self,
            Operation::TickSeed
                | Operation::CascadeRoll
                | Operation::EmergenceRoll
                | Operation::Decision
        )
    }
}

/// One immutable log record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayEntry {
    pub tick: u64,
    pub operation: Operation,
    pub parameters: Value,
    pub result: Value,
}

/// Identifies the run a log belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayHeader {
    /// Random per-run identifier; never part of the state hash
    pub run_id: Uuid,
    /// SHA-256 fingerprint of the configuration the run used
    pub config_hash: String,
    pub global_seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayLog {
    header: ReplayHeader,
    entries: Vec<ReplayEntry>,
}

impl ReplayLog {
    /// Start a fresh log with a new run identifier
    pub fn new(config_hash: impl Into<String>, global_seed: u64) -> Self {
        Self::with_run_id(Uuid::new_v4(), config_hash, global_seed)
    }

    pub fn with_run_id(run_id: Uuid, config_hash: impl Into<String>, global_seed: u64) -> Self {
        Self {
            header: ReplayHeader {
                run_id,
                config_hash: config_hash.into(),
                global_seed,
            },
            entries: Vec::new(),
        }
    }

    pub fn header(&self) -> &ReplayHeader {
        &self.header
    }

    pub fn append(&mut self, tick: u64, operation: Operation, parameters: Value, result: Value) {
        self.entries.push(ReplayEntry {
            tick,
            operation,
            parameters,
            result,
        });
    }

    pub fn entries(&self) -> &[ReplayEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries written during `tick`, in emission order
    pub fn entries_for_tick(&self, tick: u64) -> impl Iterator<Item = &ReplayEntry> {
        self.entries.iter().filter(move |e| e.tick == tick)
    }

    /// Entries of one operation kind, in emission order
    pub fn entries_of(&self, operation: Operation) -> impl Iterator<Item = &ReplayEntry> {
        self.entries.iter().filter(move |e| e.operation == operation)
    }

    /// Entries a replay must reproduce exactly, in emission order
    pub fn replay_checked(&self) -> impl Iterator<Item = &ReplayEntry> {
        self.entries
            .iter()
            .filter(|e| e.operation.is_replay_checked())
    }

    /// `(tick, hash)` for every logged end-of-tick fingerprint
    pub fn state_hashes(&self) -> Vec<(u64, u64)> {
        self.entries_of(Operation::StateHash)
            .filter_map(|e| e.result.as_u64().map(|hash| (e.tick, hash)))
            .collect()
    }

    pub fn hash_at(&self, tick: u64) -> Option<u64> {
        self.entries_of(Operation::StateHash)
            .find(|e| e.tick == tick)
            .and_then(|e| e.result.as_u64())
    }

    // ========================================================================
    // JSON Lines
    // ========================================================================

    pub fn write_jsonl<W: Write>(&self, mut writer: W) -> Result<(), SimulationError> {
        serde_json::to_writer(&mut writer, &self.header)?;
        writer.write_all(b"\n")?;
        for entry in &self.entries {
            serde_json::to_writer(&mut writer, entry)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read_jsonl<R: BufRead>(reader: R) -> Result<Self, SimulationError> {
        let mut lines = reader.lines();
        let header_line = lines.next().ok_or_else(|| {
            SimulationError::SerializationError("replay log is missing its header".to_string())
        })??;
        let header: ReplayHeader = serde_json::from_str(&header_line)?;

        let mut entries = Vec::new();
        for line in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line)?);
        }

        Ok(Self { header, entries })
    }

    pub fn to_jsonl_string(&self) -> Result<String, SimulationError> {
        let mut buf = Vec::new();
        self.write_jsonl(&mut buf)?;
        String::from_utf8(buf).map_err(|e| SimulationError::SerializationError(e.to_string()))
    }

    pub fn from_jsonl_str(text: &str) -> Result<Self, SimulationError> {
        Self::read_jsonl(text.as_bytes())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SimulationError> {
        let file = std::fs::File::create(path)?;
        self.write_jsonl(std::io::BufWriter::new(file))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        let file = std::fs::File::open(path)?;
        Self::read_jsonl(BufReader::new(file))
    }
}
