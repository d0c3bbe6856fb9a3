//! Faction system
//!
//! Recomputes every faction aggregate from current member state once per
//! tick. Nothing is updated incrementally, so rounding error cannot compound
//! across ticks.
//!
//! - `loyalty(agent, faction) = w1·attitude + w2·relevance + w3·appeal`
//! - `capability(agent) = 0.2·skills + 0.3·ambition + 0.3·age + 0.2·loyalty`
//! - `strength = clamp(Σ loyalty_i · capability_i)`
//! - `emergence = sigmoid(k·(1 - avgMemberLoyalty))`
//!
//! Members are resolved through the agent registry at use time. An ID with no
//! agent behind it contributes nothing and is reported.

use serde_json::json;
use tracing::warn;

use crate::core::config::FactionParams;
use crate::core::math::{clamp_unit, sigmoid};
use crate::models::agent::Agent;
use crate::models::faction::{Faction, FactionAggregate};
use crate::models::ids::AgentId;
use crate::models::registry::{Identified, Registry};
use crate::models::state::SimulationState;
use crate::replay::{Operation, ReplayLog};

const SKILL_WEIGHT: f64 = 0.2;
const AMBITION_WEIGHT: f64 = 0.3;
const AGE_WEIGHT: f64 = 0.3;
const LOYALTY_WEIGHT: f64 = 0.2;

/// Weighted composite of an agent's traits and its loyalty to one faction
///
/// Each term contributes at most its coefficient, so the result is in
/// `[0, 1]`.
pub fn capability(agent: &Agent, loyalty_to_faction: f64, params: &FactionParams) -> f64 {
    let skills = (agent.skill_count() as f64 / params.max_skills as f64).min(1.0);
    let age = (agent.age() / params.age_saturation).min(1.0);
    clamp_unit(
        SKILL_WEIGHT * skills
            + AMBITION_WEIGHT * agent.ambition()
            + AGE_WEIGHT * age
            + LOYALTY_WEIGHT * clamp_unit(loyalty_to_faction),
    )
}

/// An agent's derived loyalty towards a faction
pub fn member_loyalty(attitude: f64, relevance: f64, emotional_appeal: f64, params: &FactionParams) -> f64 {
    clamp_unit(
        params.attitude_weight * attitude
            + params.relevance_weight * relevance
            + params.appeal_weight * emotional_appeal,
    )
}

/// `clamp(Σ loyalty · capability)` over `(loyalty, capability)` pairs
///
/// # Example
/// ```
/// use settlement_sim_core::factions::strength;
///
/// // 0.8·0.9 + 0.6·0.6 = 1.08, clamped
/// assert_eq!(strength([(0.8, 0.9), (0.6, 0.6)]), 1.0);
/// ```
pub fn strength<I>(members: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    clamp_unit(members.into_iter().map(|(l, c)| l * c).sum())
}

/// `sigmoid(k·(1 - avg))`
pub fn emergence_probability(average_loyalty: f64, steepness: f64) -> f64 {
    clamp_unit(sigmoid(steepness * (1.0 - average_loyalty)))
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactionSystem {
    params: FactionParams,
}

impl FactionSystem {
    pub fn new(params: FactionParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FactionParams {
        &self.params
    }

    /// Aggregate for one faction plus the member IDs that did not resolve
    ///
    /// A faction with no resolvable members has an all-zero aggregate.
    pub fn compute_aggregate(&self, faction: &Faction, agents: &Registry<Agent>) -> (FactionAggregate, Vec<AgentId>) {
        let mut aggregate = FactionAggregate::default();
        let mut missing = Vec::new();
        let mut weighted = Vec::new();

        for &member in faction.members() {
            let Some(agent) = agents.get(member) else {
                missing.push(member);
                continue;
            };
            let loyalty = member_loyalty(
                agent.affect().long_term_attitude,
                faction.relevance(),
                faction.emotional_appeal(),
                &self.params,
            );
            weighted.push((loyalty, capability(agent, loyalty, &self.params)));
            aggregate.member_loyalty.insert(member, loyalty);
        }

        if weighted.is_empty() {
            return (aggregate, missing);
        }

        let average = weighted.iter().map(|(l, _)| l).sum::<f64>() / weighted.len() as f64;
        aggregate.loyalty = clamp_unit(average);
        aggregate.strength = strength(weighted);
        aggregate.emergence_probability =
            emergence_probability(aggregate.loyalty, self.params.emergence_steepness);

        (aggregate, missing)
    }

    /// Recompute and store every faction aggregate, in faction-ID order
    pub fn update_all(&self, state: &mut SimulationState, tick: u64, log: &mut ReplayLog) {
        let results: Vec<_> = state
            .factions()
            .get_all()
            .map(|faction| {
                let (aggregate, missing) = self.compute_aggregate(faction, state.agents());
                (faction.id(), aggregate, missing)
            })
            .collect();

        for (faction_id, aggregate, missing) in results {
            for agent_id in missing {
                warn!(
                    tick,
                    faction_id = %faction_id,
                    agent_id = %agent_id,
                    "faction references a missing agent; skipping"
                );
                log.append(
                    tick,
                    Operation::FactionMissingMember,
                    json!({ "faction": faction_id.raw(), "agent": agent_id.raw() }),
                    json!(null),
                );
            }
            if let Some(faction) = state.factions_mut().get_mut(faction_id) {
                faction.set_aggregate(aggregate);
            }
        }
    }
}
