//! Scenario event execution and scheduling
//!
//! This module handles:
//! - Scheduling events by tick
//! - Applying direct state changes (stockpiles, faction membership)
//! - Handing world events back to the orchestrator, which creates and
//!   cascades them
//! - Logging every application for replay

use serde_json::json;
use tracing::warn;

use crate::events::types::{EventSpec, ScenarioEvent, ScheduledEvent};
use crate::models::event::EventScope;
use crate::models::ids::{AgentId, FactionId, ResourceId};
use crate::models::state::SimulationState;
use crate::orchestrator::SimulationError;
use crate::replay::{Operation, ReplayLog};

/// Handles scenario event scheduling and execution
#[derive(Debug, Clone, Default)]
pub struct ScenarioEventHandler {
    events: Vec<ScheduledEvent>,
}

impl ScenarioEventHandler {
    /// Create a new event handler with the given events
    pub fn new(events: Vec<ScheduledEvent>) -> Self {
        Self { events }
    }

    pub fn scheduled(&self) -> &[ScheduledEvent] {
        &self.events
    }

    /// Get all events scheduled for a specific tick, in schedule order
    pub fn get_events_for_tick(&self, tick: u64) -> Vec<&ScenarioEvent> {
        self.events
            .iter()
            .filter(|scheduled| scheduled.schedule.should_execute(tick))
            .map(|scheduled| &scheduled.event)
            .collect()
    }

    /// Check every reference in the schedule against `state`
    pub fn validate(&self, state: &SimulationState) -> Result<(), SimulationError> {
        for scheduled in &self.events {
            scheduled.event.check_references(state)?;
        }
        Ok(())
    }

    /// Execute all events scheduled for the given tick
    ///
    /// Direct state changes are applied here. World events are returned, in
    /// schedule order, for the caller to create and cascade. An event whose
    /// target has disappeared since the schedule was validated is skipped.
    pub fn execute_tick_events(
        &self,
        state: &mut SimulationState,
        tick: u64,
        log: &mut ReplayLog,
    ) -> Vec<EventSpec> {
        let mut world_events = Vec::new();

        for event in self.get_events_for_tick(tick) {
            match event.execute(state, tick, log) {
                Ok(Some(spec)) => world_events.push(spec),
                Ok(None) => {}
                Err(e) => warn!(tick, error = %e, "skipping scenario event"),
            }
        }

        world_events
    }
}

impl ScenarioEvent {
    /// Execute this event, modifying the given state
    ///
    /// # Returns
    /// `Ok(Some(spec))` for world events the caller must create,
    /// `Ok(None)` once a direct change has been applied
    pub fn execute(
        &self,
        state: &mut SimulationState,
        tick: u64,
        log: &mut ReplayLog,
    ) -> Result<Option<EventSpec>, SimulationError> {
        self.check_references(state)?;
        match self {
            ScenarioEvent::WorldEvent(spec) => Ok(Some(spec.clone())),

            ScenarioEvent::ResourceChange { resource, delta } => {
                execute_resource_change(state, tick, log, *resource, *delta)?;
                Ok(None)
            }

            ScenarioEvent::FactionShift {
                faction,
                relevance,
                emotional_appeal,
            } => {
                execute_faction_shift(state, tick, log, *faction, *relevance, *emotional_appeal)?;
                Ok(None)
            }

            ScenarioEvent::JoinFaction { agent, faction } => {
                execute_membership_change(state, tick, log, *agent, *faction, true)?;
                Ok(None)
            }

            ScenarioEvent::LeaveFaction { agent, faction } => {
                execute_membership_change(state, tick, log, *agent, *faction, false)?;
                Ok(None)
            }
        }
    }

    fn check_references(&self, state: &SimulationState) -> Result<(), SimulationError> {
        match self {
            ScenarioEvent::WorldEvent(spec) => spec.check_references(state),
            ScenarioEvent::ResourceChange { resource, .. } => state
                .get_resource(*resource)
                .map(|_| ())
                .ok_or(SimulationError::ResourceNotFound(*resource)),
            ScenarioEvent::FactionShift { faction, .. } => state
                .get_faction(*faction)
                .map(|_| ())
                .ok_or(SimulationError::FactionNotFound(*faction)),
            ScenarioEvent::JoinFaction { agent, faction }
            | ScenarioEvent::LeaveFaction { agent, faction } => {
                if state.get_agent(*agent).is_none() {
                    return Err(SimulationError::AgentNotFound(*agent));
                }
                if state.get_faction(*faction).is_none() {
                    return Err(SimulationError::FactionNotFound(*faction));
                }
                Ok(())
            }
        }
    }
}

impl EventSpec {
    /// Check the impact and tone are finite and the scope names something that exists
    pub fn check_references(&self, state: &SimulationState) -> Result<(), SimulationError> {
        if !self.impact.is_finite() || self.tone.is_some_and(|t| !t.is_finite()) {
            return Err(SimulationError::StateValidationError(format!(
                "{} event has a non-finite impact or tone",
                self.kind.as_str()
            )));
        }
        match self.scope {
            EventScope::Settlement => Ok(()),
            EventScope::Faction(id) => state
                .get_faction(id)
                .map(|_| ())
                .ok_or(SimulationError::FactionNotFound(id)),
            EventScope::Agent(id) => state
                .get_agent(id)
                .map(|_| ())
                .ok_or(SimulationError::AgentNotFound(id)),
        }
    }
}

// ============================================================================
// Event Execution Functions
// ============================================================================

fn execute_resource_change(
    state: &mut SimulationState,
    tick: u64,
    log: &mut ReplayLog,
    resource: ResourceId,
    delta: f64,
) -> Result<(), SimulationError> {
    let stock = state
        .get_resource_mut(resource)
        .ok_or(SimulationError::ResourceNotFound(resource))?;
    let applied = stock.adjust(delta);

    log_scenario_event(
        log,
        tick,
        "resource_change",
        json!({ "resource": resource.raw(), "delta": delta }),
        json!({ "applied": applied, "quantity": stock.quantity() }),
    );

    Ok(())
}

fn execute_faction_shift(
    state: &mut SimulationState,
    tick: u64,
    log: &mut ReplayLog,
    faction: FactionId,
    relevance: Option<f64>,
    emotional_appeal: Option<f64>,
) -> Result<(), SimulationError> {
    let target = state
        .get_faction_mut(faction)
        .ok_or(SimulationError::FactionNotFound(faction))?;
    if let Some(r) = relevance {
        target.set_relevance(r);
    }
    if let Some(a) = emotional_appeal {
        target.set_emotional_appeal(a);
    }

    log_scenario_event(
        log,
        tick,
        "faction_shift",
        json!({ "faction": faction.raw(), "relevance": relevance, "emotional_appeal": emotional_appeal }),
        json!({ "relevance": target.relevance(), "emotional_appeal": target.emotional_appeal() }),
    );

    Ok(())
}

fn execute_membership_change(
    state: &mut SimulationState,
    tick: u64,
    log: &mut ReplayLog,
    agent: AgentId,
    faction: FactionId,
    join: bool,
) -> Result<(), SimulationError> {
    let target = state
        .get_faction_mut(faction)
        .ok_or(SimulationError::FactionNotFound(faction))?;
    let changed = if join {
        target.add_member(agent)
    } else {
        target.remove_member(agent)
    };

    log_scenario_event(
        log,
        tick,
        if join { "join_faction" } else { "leave_faction" },
        json!({ "agent": agent.raw(), "faction": faction.raw() }),
        json!(changed),
    );

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn log_scenario_event(
    log: &mut ReplayLog,
    tick: u64,
    event_type: &str,
    details: serde_json::Value,
    result: serde_json::Value,
) {
    let mut parameters = details;
    if let Some(map) = parameters.as_object_mut() {
        map.insert("event_type".to_string(), json!(event_type));
    }
    log.append(tick, Operation::ScenarioEvent, parameters, result);
}
