//! Simulation State
//!
//! Owns every registry the deterministic core reads and writes: agents,
//! factions, resources and the event forest. The orchestrator holds the only
//! instance for the duration of a run, so several simulations can coexist in
//! one process without sharing anything.
//!
//! # Critical Invariants
//!
//! 1. **Ordered iteration**: every registry iterates in ID order
//! 2. **Weak membership**: factions refer to agents by ID; a removed agent
//!    leaves a dangling ID that the faction system skips
//! 3. **Event forest**: `caused_by` always points at an existing, older event
//! 4. **Monotonic event IDs**: event IDs are never reused

use serde::{Deserialize, Serialize};

use crate::models::agent::Agent;
use crate::models::event::{EventKind, EventScope, WorldEvent};
use crate::models::faction::Faction;
use crate::models::ids::{AgentId, EventId, FactionId, ResourceId};
use crate::models::registry::{Identified, Registry};
use crate::models::resource::Resource;
use crate::orchestrator::SimulationError;

/// Complete simulation state
///
/// # Example
///
/// ```rust
/// use settlement_sim_core::models::{Agent, AgentId, Faction, FactionId};
/// use settlement_sim_core::SimulationState;
///
/// let mut state = SimulationState::new();
/// state.add_agent(Agent::new(AgentId(1), "Ada")).unwrap();
/// state.add_agent(Agent::new(AgentId(2), "Bram")).unwrap();
/// state.add_faction(Faction::new(FactionId(1), "Millers").with_members([AgentId(1)])).unwrap();
///
/// assert_eq!(state.num_agents(), 2);
/// assert_eq!(state.memberships(AgentId(1)), vec![FactionId(1)]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    agents: Registry<Agent>,
    factions: Registry<Faction>,
    resources: Registry<Resource>,
    #[serde(default)]
    events: Registry<WorldEvent>,
    #[serde(default)]
    next_event_id: u64,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationState {
    pub fn new() -> Self {
        Self {
            agents: Registry::new(),
            factions: Registry::new(),
            resources: Registry::new(),
            events: Registry::new(),
            next_event_id: 1,
        }
    }

    // ========================================================================
    // Agents
    // ========================================================================

    pub fn add_agent(&mut self, agent: Agent) -> Result<(), SimulationError> {
        let id = agent.id();
        if self.agents.contains(id) {
            return Err(SimulationError::DuplicateId(id.to_string()));
        }
        self.agents.insert(agent);
        Ok(())
    }

    /// Remove an agent. Faction memberships are left untouched.
    pub fn remove_agent(&mut self, id: AgentId) -> Option<Agent> {
        self.agents.remove(id)
    }

    pub fn get_agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn get_agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id)
    }

    pub fn agents(&self) -> &Registry<Agent> {
        &self.agents
    }

    pub(crate) fn agents_mut(&mut self) -> &mut Registry<Agent> {
        &mut self.agents
    }

    pub fn num_agents(&self) -> usize {
        self.agents.len()
    }

    /// Agents that carry an advisor component, in ID order
    pub fn advisors(&self) -> impl Iterator<Item = &Agent> {
        self.agents.get_all().filter(|a| a.is_advisor())
    }

    // ========================================================================
    // Factions
    // ========================================================================

    pub fn add_faction(&mut self, faction: Faction) -> Result<(), SimulationError> {
        let id = faction.id();
        if self.factions.contains(id) {
            return Err(SimulationError::DuplicateId(id.to_string()));
        }
        self.factions.insert(faction);
        Ok(())
    }

    pub fn get_faction(&self, id: FactionId) -> Option<&Faction> {
        self.factions.get(id)
    }

    pub fn get_faction_mut(&mut self, id: FactionId) -> Option<&mut Faction> {
        self.factions.get_mut(id)
    }

    pub fn factions(&self) -> &Registry<Faction> {
        &self.factions
    }

    pub(crate) fn factions_mut(&mut self) -> &mut Registry<Faction> {
        &mut self.factions
    }

    pub fn num_factions(&self) -> usize {
        self.factions.len()
    }

    /// Factions listing `agent` as a member, in faction-ID order
    pub fn memberships(&self, agent: AgentId) -> Vec<FactionId> {
        self.factions
            .get_all()
            .filter(|f| f.is_member(agent))
            .map(|f| f.id())
            .collect()
    }

    // ========================================================================
    // Resources
    // ========================================================================

    pub fn add_resource(&mut self, resource: Resource) -> Result<(), SimulationError> {
        let id = resource.id();
        if self.resources.contains(id) {
            return Err(SimulationError::DuplicateId(id.to_string()));
        }
        self.resources.insert(resource);
        Ok(())
    }

    pub fn get_resource(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn get_resource_mut(&mut self, id: ResourceId) -> Option<&mut Resource> {
        self.resources.get_mut(id)
    }

    pub fn resources(&self) -> &Registry<Resource> {
        &self.resources
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Create and store a new immutable event, returning its ID
    ///
    /// # Panics
    ///
    /// Panics if `caused_by` names an event that does not exist; the cascade
    /// code only ever passes IDs it has just created.
    pub fn record_event(
        &mut self,
        kind: EventKind,
        scope: EventScope,
        tone: f64,
        impact_level: f64,
        tick: u64,
        caused_by: Option<EventId>,
    ) -> EventId {
        if let Some(parent) = caused_by {
            assert!(
                self.events.contains(parent),
                "caused_by {} does not exist",
                parent
            );
        }
        let id = EventId(self.allocate_event_id());
        self.events
            .insert(WorldEvent::new(id, kind, scope, tone, impact_level, tick, caused_by));
        id
    }

    fn allocate_event_id(&mut self) -> u64 {
        let floor = self.events.last_id().map_or(1, |last| last.raw() + 1);
        let id = self.next_event_id.max(floor);
        self.next_event_id = id + 1;
        id
    }

    pub fn get_event(&self, id: EventId) -> Option<&WorldEvent> {
        self.events.get(id)
    }

    pub fn events(&self) -> &Registry<WorldEvent> {
        &self.events
    }

    pub fn num_events(&self) -> usize {
        self.events.len()
    }

    /// ID the next recorded event will receive
    pub fn next_event_id(&self) -> EventId {
        let floor = self.events.last_id().map_or(1, |last| last.raw() + 1);
        EventId(self.next_event_id.max(floor))
    }

    /// Direct children of an event in the cascade forest, in ID order
    pub fn children_of(&self, id: EventId) -> Vec<EventId> {
        self.events
            .get_all()
            .filter(|e| e.caused_by() == Some(id))
            .map(|e| e.id())
            .collect()
    }

    /// Root of the cascade tree containing `id`
    pub fn cascade_root(&self, id: EventId) -> Option<EventId> {
        let mut current = self.events.get(id)?;
        while let Some(parent) = current.caused_by() {
            current = self.events.get(parent)?;
        }
        Some(current.id())
    }

    /// Number of `caused_by` hops from `id` to its root
    pub fn cascade_depth(&self, id: EventId) -> Option<usize> {
        let mut current = self.events.get(id)?;
        let mut depth = 0;
        while let Some(parent) = current.caused_by() {
            current = self.events.get(parent)?;
            depth += 1;
        }
        Some(depth)
    }
}
