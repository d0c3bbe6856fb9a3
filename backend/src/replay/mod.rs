//! Replay logging, state hashing and replay validation

pub mod hasher;
pub mod log;
pub mod script;
pub mod validator;

pub use hasher::{diff_entities, EntityDiff, EntityKey, Fnv1a, StateHasher};
pub use log::{Operation, ReplayEntry, ReplayHeader, ReplayLog};
pub use script::{InputScript, ScriptedInput};
pub use validator::{Recording, ReplayReport, ReplayValidator};
