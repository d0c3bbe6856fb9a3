//! Problem detection
//!
//! Severity is a pure function of how far an agent's mood and loyalty moved
//! since the last tick:
//!
//! `severity = clamp(0.5·|Δmood| + 0.5·|Δloyalty|)`
//!
//! An agent whose severity reaches the dialogue threshold seeks out the
//! leader. When the settlement has advisors, the most insightful one (other
//! than the troubled agent) is attached to the request.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::core::math::clamp_unit;
use crate::models::agent::{AdvisorSpecialty, Agent};
use crate::models::ids::AgentId;
use crate::models::registry::Identified;
use crate::models::state::SimulationState;
use crate::replay::{Operation, ReplayLog};
use crate::tracking::PreviousStateCache;

/// `clamp(0.5·|mood - prevMood| + 0.5·|loyalty - prevLoyalty|)`
///
/// # Example
/// ```
/// use settlement_sim_core::problems::{severity, should_initiate_dialogue};
///
/// let s = severity(0.5, 0.7, 0.8, 0.9);
/// assert!((s - 0.15).abs() < 1e-12);
/// assert!(!should_initiate_dialogue(s, 0.3));
/// ```
pub fn severity(mood: f64, previous_mood: f64, loyalty: f64, previous_loyalty: f64) -> f64 {
    clamp_unit(0.5 * (mood - previous_mood).abs() + 0.5 * (loyalty - previous_loyalty).abs())
}

pub fn should_initiate_dialogue(severity: f64, threshold: f64) -> bool {
    severity >= threshold
}

/// Advisor attached to a dialogue request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorCounsel {
    pub advisor: AgentId,
    pub specialty: AdvisorSpecialty,
    pub urgency: f64,
}

/// An agent asking to speak with the leader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueRequest {
    pub tick: u64,
    pub agent: AgentId,
    pub severity: f64,
    pub counsel: Option<AdvisorCounsel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProblemSystem {
    dialogue_threshold: f64,
}

impl ProblemSystem {
    pub fn new(dialogue_threshold: f64) -> Self {
        Self { dialogue_threshold }
    }

    /// Severity for `agent` against the cache; `None` for agents with no
    /// previous-tick baseline
    pub fn agent_severity(&self, agent: &Agent, previous: &PreviousStateCache) -> Option<f64> {
        let before = previous.agent(agent.id())?;
        Some(severity(
            agent.affect().short_term_mood,
            before.mood,
            agent.loyalty(),
            before.loyalty,
        ))
    }

    /// Check every agent in ID order and build the dialogue requests
    pub fn check_all(
        &self,
        state: &SimulationState,
        previous: &PreviousStateCache,
        tick: u64,
        log: &mut ReplayLog,
    ) -> Vec<DialogueRequest> {
        let mut requests = Vec::new();

        for agent in state.agents().get_all() {
            let Some(severity) = self.agent_severity(agent, previous) else {
                continue;
            };
            if !should_initiate_dialogue(severity, self.dialogue_threshold) {
                continue;
            }

            let counsel = best_advisor(state, agent.id()).and_then(|advisor| {
                advisor.as_advisor().map(|profile| AdvisorCounsel {
                    advisor: advisor.id(),
                    specialty: profile.specialty,
                    urgency: profile.urgency(severity),
                })
            });

            debug!(tick, agent_id = %agent.id(), severity, "agent seeks dialogue");
            log.append(
                tick,
                Operation::DialogueTrigger,
                json!({ "agent": agent.id().raw(), "threshold": self.dialogue_threshold }),
                json!(severity),
            );

            requests.push(DialogueRequest {
                tick,
                agent: agent.id(),
                severity,
                counsel,
            });
        }

        requests
    }
}

/// Most insightful advisor other than `exclude`; ties go to the lower ID
fn best_advisor(state: &SimulationState, exclude: AgentId) -> Option<&Agent> {
    let mut best: Option<(&Agent, f64)> = None;
    for advisor in state.advisors().filter(|a| a.id() != exclude) {
        let insight = advisor.as_advisor().map_or(0.0, |p| p.insight);
        if best.map_or(true, |(_, b)| insight > b) {
            best = Some((advisor, insight));
        }
    }
    best.map(|(a, _)| a)
}
