//! Decision execution
//!
//! Decisions are the only writer of agent loyalty to the leader. Each one
//! adjusts loyalty and stockpiles, then becomes public as a `Decree` event
//! that the orchestrator creates and cascades.
//!
//! | Action     | Effect                                                          |
//! |------------|-----------------------------------------------------------------|
//! | Distribute | takes `min(quantity, stock)`; everyone gains `s·min(1, share)`  |
//! | Ration     | everyone loses `s·0.5`                                          |
//! | Address    | addressed agents move `s·(tone - 0.5)·2·min(1, quantity)`       |
//! | Punish     | the target loses `s·min(1, quantity)`                           |
//!
//! `s` is the configured loyalty sensitivity.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::core::config::DecisionParams;
use crate::events::EventSpec;
use crate::models::decision::{Decision, DecisionAction, DecisionTarget};
use crate::models::event::{clamp_impact, EventKind, EventScope};
use crate::models::ids::{AgentId, ResourceId};
use crate::models::registry::Identified;
use crate::models::state::SimulationState;
use crate::orchestrator::SimulationError;
use crate::replay::{Operation, ReplayLog};

/// What a decision changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOutcome {
    /// Applied loyalty change per agent, in ID order
    pub loyalty_changes: Vec<(AgentId, f64)>,
    pub resource_change: Option<(ResourceId, f64)>,
    /// The public decree this decision becomes
    pub decree: EventSpec,
}

/// Check a decision against the state it will run on
pub fn check_decision(decision: &Decision, state: &SimulationState) -> Result<(), SimulationError> {
    decision.validate().map_err(SimulationError::InvalidDecision)?;
    match decision.target {
        DecisionTarget::Settlement => Ok(()),
        DecisionTarget::Faction(id) => state
            .get_faction(id)
            .map(|_| ())
            .ok_or(SimulationError::FactionNotFound(id)),
        DecisionTarget::Agent(id) => state
            .get_agent(id)
            .map(|_| ())
            .ok_or(SimulationError::AgentNotFound(id)),
        DecisionTarget::Resource(id) => state
            .get_resource(id)
            .map(|_| ())
            .ok_or(SimulationError::ResourceNotFound(id)),
    }
}

/// Scope of the decree a decision produces
pub fn decree_scope(target: DecisionTarget) -> EventScope {
    match target {
        DecisionTarget::Settlement | DecisionTarget::Resource(_) => EventScope::Settlement,
        DecisionTarget::Faction(id) => EventScope::Faction(id),
        DecisionTarget::Agent(id) => EventScope::Agent(id),
    }
}

/// Impact of the decree: `base · (1 + min(1, quantity))`, clamped
pub fn decree_impact(quantity: f64, params: &DecisionParams) -> f64 {
    clamp_impact(params.base_impact * (1.0 + quantity.min(1.0)))
}

/// Apply `decision` to `state` and log it
pub fn execute_decision(
    decision: &Decision,
    state: &mut SimulationState,
    params: &DecisionParams,
    tick: u64,
    log: &mut ReplayLog,
) -> Result<DecisionOutcome, SimulationError> {
    check_decision(decision, state)?;
    let sensitivity = params.loyalty_sensitivity;
    let emphasis = decision.quantity.min(1.0);

    let (recipients, delta, resource_change) = match decision.action {
        DecisionAction::Distribute => {
            let resource_id = resource_target(decision)?;
            let stock = state
                .get_resource_mut(resource_id)
                .ok_or(SimulationError::ResourceNotFound(resource_id))?;
            let given = decision.quantity.min(stock.quantity());
            let applied = stock.adjust(-given);

            let everyone = state.agents().ids();
            let share = if everyone.is_empty() {
                0.0
            } else {
                (given / everyone.len() as f64).min(1.0)
            };
            (everyone, sensitivity * share, Some((resource_id, applied)))
        }
        DecisionAction::Ration => {
            let resource_id = resource_target(decision)?;
            (state.agents().ids(), -sensitivity * 0.5, Some((resource_id, 0.0)))
        }
        DecisionAction::Address => {
            let addressed: Vec<AgentId> = match decision.target {
                DecisionTarget::Faction(id) => state
                    .get_faction(id)
                    .map(|f| {
                        f.members()
                            .iter()
                            .copied()
                            .filter(|m| state.get_agent(*m).is_some())
                            .collect()
                    })
                    .unwrap_or_default(),
                DecisionTarget::Agent(id) => vec![id],
                _ => state.agents().ids(),
            };
            let delta = sensitivity * (decision.tone - 0.5) * 2.0 * emphasis;
            (addressed, delta, None)
        }
        DecisionAction::Punish => {
            let DecisionTarget::Agent(id) = decision.target else {
                return Err(SimulationError::InvalidDecision(
                    "Punish requires an agent target".to_string(),
                ));
            };
            (vec![id], -sensitivity * emphasis, None)
        }
    };

    let mut loyalty_changes = Vec::with_capacity(recipients.len());
    for id in recipients {
        if let Some(agent) = state.get_agent_mut(id) {
            let before = agent.loyalty();
            let after = agent.adjust_loyalty(delta);
            loyalty_changes.push((agent.id(), after - before));
        }
    }

    let decree = EventSpec::new(
        EventKind::Decree,
        decree_scope(decision.target),
        decree_impact(decision.quantity, params),
    )
    .with_tone(decision.tone);

    debug!(
        tick,
        action = ?decision.action,
        affected = loyalty_changes.len(),
        "decision executed"
    );
    log.append(
        tick,
        Operation::Decision,
        serde_json::to_value(decision)?,
        json!({
            "affected": loyalty_changes.len(),
            "loyalty_delta": delta,
            "resource_change": resource_change.map(|(_, applied)| applied),
        }),
    );

    Ok(DecisionOutcome {
        loyalty_changes,
        resource_change,
        decree,
    })
}

fn resource_target(decision: &Decision) -> Result<ResourceId, SimulationError> {
    match decision.target {
        DecisionTarget::Resource(id) => Ok(id),
        other => Err(SimulationError::InvalidDecision(format!(
            "{:?} requires a resource target, got {:?}",
            decision.action, other
        ))),
    }
}
