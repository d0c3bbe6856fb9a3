//! Spatial collaborator interface
//!
//! Movement and pathfinding live outside the deterministic core. The
//! orchestrator owns one [`SpatialSystem`] and asks it, once per tick, where
//! agents have moved to. Moves are applied in agent-ID order.
//!
//! # Interface
//!
//! ```rust
//! use settlement_sim_core::models::{Agent, AgentId, Position, Registry};
//! use settlement_sim_core::spatial::SpatialSystem;
//!
//! struct Drift;
//!
//! impl SpatialSystem for Drift {
//!     fn next_positions(&mut self, agents: &Registry<Agent>, _tick: u64) -> Vec<(AgentId, Position)> {
//!         use settlement_sim_core::models::Identified;
//!         agents
//!             .get_all()
//!             .map(|a| {
//!                 let p = a.position();
//!                 (a.id(), Position::new(p.x + 1.0, p.y, p.z))
//!             })
//!             .collect()
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "drift"
//!     }
//! }
//! ```
//!
//! Implementations must be deterministic: no clocks, no unseeded randomness.

use crate::models::agent::{Agent, Position};
use crate::models::ids::AgentId;
use crate::models::registry::{Identified, Registry};
use crate::models::state::SimulationState;

pub trait SpatialSystem: Send {
    /// New positions for the agents that moved this tick
    fn next_positions(&mut self, agents: &Registry<Agent>, tick: u64) -> Vec<(AgentId, Position)>;

    fn name(&self) -> &'static str;
}

/// Nobody moves
#[derive(Debug, Default, Clone, Copy)]
pub struct Stationary;

impl SpatialSystem for Stationary {
    fn next_positions(&mut self, _agents: &Registry<Agent>, _tick: u64) -> Vec<(AgentId, Position)> {
        Vec::new()
    }

    fn name(&self) -> &'static str {
        "stationary"
    }
}

/// Straight-line steering towards each agent's destination at a fixed speed
#[derive(Debug, Clone, Copy)]
pub struct SteerToDestination {
    speed: f64,
}

impl SteerToDestination {
    pub fn new(speed: f64) -> Self {
        Self {
            speed: speed.max(0.0),
        }
    }
}

impl SpatialSystem for SteerToDestination {
    fn next_positions(&mut self, agents: &Registry<Agent>, _tick: u64) -> Vec<(AgentId, Position)> {
        agents
            .get_all()
            .filter_map(|agent| {
                let target = agent.destination()?;
                let current = agent.position();
                (current != target).then(|| (agent.id(), current.step_towards(&target, self.speed)))
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "steer_to_destination"
    }
}

/// Apply moves to the state in agent-ID order; unknown IDs are ignored.
/// Returns the number of agents moved.
pub fn apply_moves(state: &mut SimulationState, mut moves: Vec<(AgentId, Position)>) -> usize {
    moves.sort_by_key(|(id, _)| *id);
    let mut moved = 0;
    for (id, position) in moves {
        if let Some(agent) = state.get_agent_mut(id) {
            agent.set_position(position);
            moved += 1;
        }
    }
    moved
}

/// For every agent, the other agents within `radius`, in ID order
pub fn proximity_contacts(agents: &Registry<Agent>, radius: f64) -> Vec<(AgentId, Vec<AgentId>)> {
    let all: Vec<&Agent> = agents.get_all().collect();
    all.iter()
        .map(|agent| {
            let contacts = all
                .iter()
                .filter(|other| other.id() != agent.id())
                .filter(|other| agent.position().distance_to(&other.position()) <= radius)
                .map(|other| other.id())
                .collect();
            (agent.id(), contacts)
        })
        .collect()
}

/// Store proximity contacts on every agent
pub fn update_proximity(state: &mut SimulationState, radius: f64) {
    let contacts = proximity_contacts(state.agents(), radius);
    for (id, nearby) in contacts {
        if let Some(agent) = state.get_agent_mut(id) {
            agent.set_nearby(nearby);
        }
    }
}
