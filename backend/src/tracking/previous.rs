//! Previous-state cache
//!
//! A minimal projection of last tick's values, used only for delta
//! computation. Moods, resource quantities and faction loyalties are replaced
//! in `PreviousStateRefreshed`, the last phase of every tick, so every earlier
//! phase reads the same "last tick" picture.
//!
//! Agent loyalty is the exception. Decisions, scenario shifts and the bounds
//! sweep all write it after `ProblemsChecked` has read it, so its baseline is
//! settled by the problem check itself and carried through the refresh. A
//! loyalty change made anywhere in tick `t` is therefore seen by the check in
//! tick `t + 1`, exactly once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::ids::{AgentId, FactionId, ResourceId};
use crate::models::registry::Identified;
use crate::models::state::SimulationState;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentProjection {
    pub mood: f64,
    pub loyalty: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PreviousStateCache {
    agents: BTreeMap<AgentId, AgentProjection>,
    resources: BTreeMap<ResourceId, f64>,
    factions: BTreeMap<FactionId, f64>,
}

impl PreviousStateCache {
    /// Project the current state
    pub fn capture(state: &SimulationState) -> Self {
        let agents = state
            .agents()
            .get_all()
            .map(|a| {
                (
                    a.id(),
                    AgentProjection {
                        mood: a.affect().short_term_mood,
                        loyalty: a.loyalty(),
                    },
                )
            })
            .collect();
        let resources = state
            .resources()
            .get_all()
            .map(|r| (r.id(), r.quantity()))
            .collect();
        let factions = state
            .factions()
            .get_all()
            .map(|f| (f.id(), f.loyalty()))
            .collect();

        Self {
            agents,
            resources,
            factions,
        }
    }

    /// Replace every projection with the current state's values, keeping
    /// the settled loyalty of agents that already had one
    pub fn refresh(&mut self, state: &SimulationState) {
        let settled = std::mem::take(&mut self.agents);
        *self = Self::capture(state);
        for (id, projection) in self.agents.iter_mut() {
            if let Some(before) = settled.get(id) {
                projection.loyalty = before.loyalty;
            }
        }
    }

    /// Take the current loyalties as the baseline for the next problem check
    pub fn settle_loyalty(&mut self, state: &SimulationState) {
        for agent in state.agents().get_all() {
            if let Some(projection) = self.agents.get_mut(&agent.id()) {
                projection.loyalty = agent.loyalty();
            }
        }
    }

    pub fn agent(&self, id: AgentId) -> Option<&AgentProjection> {
        self.agents.get(&id)
    }

    pub fn mood(&self, id: AgentId) -> Option<f64> {
        self.agents.get(&id).map(|p| p.mood)
    }

    pub fn loyalty(&self, id: AgentId) -> Option<f64> {
        self.agents.get(&id).map(|p| p.loyalty)
    }

    pub fn resource_quantity(&self, id: ResourceId) -> Option<f64> {
        self.resources.get(&id).copied()
    }

    /// Average member loyalty of a faction last tick
    pub fn faction_loyalty(&self, id: FactionId) -> Option<f64> {
        self.factions.get(&id).copied()
    }

    pub fn num_agents(&self) -> usize {
        self.agents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AffectState, Agent, Resource};

    #[test]
    fn test_capture_projects_mood_and_loyalty() {
        let mut state = SimulationState::new();
        state
            .add_agent(
                Agent::new(AgentId(1), "Ada")
                    .with_affect(AffectState::new(0.1, 0.7, 0.4))
                    .with_loyalty(0.9),
            )
            .unwrap();
        state
            .add_resource(Resource::new(ResourceId(1), "grain", 12.0, 5.0))
            .unwrap();

        let cache = PreviousStateCache::capture(&state);
        assert_eq!(cache.mood(AgentId(1)), Some(0.7));
        assert_eq!(cache.loyalty(AgentId(1)), Some(0.9));
        assert_eq!(cache.resource_quantity(ResourceId(1)), Some(12.0));
        assert_eq!(cache.mood(AgentId(2)), None);
    }

    #[test]
    fn test_refresh_keeps_settled_loyalty() {
        let mut state = SimulationState::new();
        state
            .add_agent(Agent::new(AgentId(1), "Ada").with_loyalty(0.9))
            .unwrap();
        let mut cache = PreviousStateCache::capture(&state);

        state.get_agent_mut(AgentId(1)).unwrap().set_loyalty(0.2);
        state
            .add_agent(Agent::new(AgentId(2), "Bram").with_loyalty(0.4))
            .unwrap();
        cache.refresh(&state);

        // Loyalty waits for the next check; newcomers start from what they have
        assert_eq!(cache.loyalty(AgentId(1)), Some(0.9));
        assert_eq!(cache.loyalty(AgentId(2)), Some(0.4));

        cache.settle_loyalty(&state);
        assert_eq!(cache.loyalty(AgentId(1)), Some(0.2));
    }

    #[test]
    fn test_refresh_replaces_wholesale() {
        let mut state = SimulationState::new();
        state.add_agent(Agent::new(AgentId(1), "Ada")).unwrap();
        let mut cache = PreviousStateCache::capture(&state);

        state.remove_agent(AgentId(1));
        state.add_agent(Agent::new(AgentId(2), "Bram")).unwrap();
        cache.refresh(&state);

        assert!(cache.agent(AgentId(1)).is_none());
        assert!(cache.agent(AgentId(2)).is_some());
        assert_eq!(cache.num_agents(), 1);
    }
}
