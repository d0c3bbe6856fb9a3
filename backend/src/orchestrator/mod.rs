//! Orchestrator - the fixed-order tick loop
//!
//! See `engine.rs` for the loop itself and `phase.rs` for the phase order.

pub mod checkpoint;
pub mod engine;
pub mod error;
pub mod phase;

pub use checkpoint::{compute_config_hash, validate_checkpoint, Checkpoint};
pub use engine::{Orchestrator, RunSummary, StopSignal, TickResult};
pub use error::SimulationError;
pub use phase::TickPhase;
