//! Settlement Simulator Core - Rust Engine
//!
//! Deterministic, tick-ordered simulation of a small settlement: settlers'
//! emotions, faction loyalties and world events evolving under the player's
//! decisions, with significant changes pushed to a narrative layer.
//!
//! # Architecture
//!
//! - **core**: Time management, configuration and math helpers
//! - **models**: Domain types (Agent, Faction, Resource, WorldEvent, State)
//! - **rng**: Deterministic random number generation, re-seeded every tick
//! - **emotion**: Three-layer affect model and the bounds-validation sweep
//! - **factions**: Strength, loyalty and emergence aggregates
//! - **problems**: Severity detection and dialogue requests
//! - **cascade**: Probabilistic secondary events
//! - **tracking**: Previous-state cache and world-state diffs
//! - **decisions**: Player decision execution
//! - **events**: Scheduled scenario events
//! - **spatial**: Movement collaborator interface and proximity
//! - **narrative**: Fire-and-forget outbound queue
//! - **replay**: Replay log, state hashing and replay validation
//! - **orchestrator**: Main simulation loop
//!
//! # Critical Invariants
//!
//! 1. Every affect, loyalty and probability scalar stays in `[0, 1]`
//! 2. All randomness is deterministic (seeded RNG, re-seeded per tick)
//! 3. Iteration is always in ID order
//! 4. Phases run in a fixed order; the previous-state cache refreshes last

// Module declarations
pub mod cascade;
pub mod core;
pub mod decisions;
pub mod emotion;
pub mod events;
pub mod factions;
pub mod models;
pub mod narrative;
pub mod orchestrator;
pub mod problems;
pub mod replay;
pub mod rng;
pub mod spatial;
pub mod tracking;

// Re-exports for convenience
pub use crate::core::config::{ConfigError, SimulationConfig};
pub use crate::core::time::TimeManager;
pub use models::state::SimulationState;
pub use orchestrator::{Checkpoint, Orchestrator, RunSummary, SimulationError, StopSignal, TickPhase, TickResult};
pub use replay::{Recording, ReplayLog, ReplayValidator, StateHasher};
pub use rng::RngManager;
