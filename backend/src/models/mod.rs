//! Domain models for the settlement simulation

pub mod agent;
pub mod decision;
pub mod event;
pub mod faction;
pub mod ids;
pub mod registry;
pub mod resource;
pub mod state;

// Re-exports
pub use agent::{AdvisorProfile, AdvisorSpecialty, AffectState, Agent, AgentRole, Position};
pub use decision::{Decision, DecisionAction, DecisionTarget};
pub use event::{EventKind, EventScope, SecondaryCandidate, WorldEvent, MAX_IMPACT};
pub use faction::{Faction, FactionAggregate};
pub use ids::{AgentId, EventId, FactionId, ResourceId};
pub use registry::{Identified, Registry};
pub use resource::Resource;
pub use state::SimulationState;
