//! Three-layer emotional model
//!
//! Every agent carries three affect layers, fast to slow:
//!
//! 1. **Immediate emotion**, recomputed only when an event touches the agent:
//!    `E_i = θ1·tone + θ2·relevance + θ3·bias + θ4·socialPressure`
//! 2. **Short-term mood**, smoothed every tick:
//!    `M_s(t) = α·E_i + (1-α)·M_s(t-1)`
//! 3. **Long-term attitude**, integrated every tick:
//!    `A_l(t) = A_l(t-1) + β·M_s(t)`
//!
//! Each layer is clamped to `[0, 1]` after it is written. Agents are updated
//! in ID order; every input an agent reads (stimuli, contacts' moods from the
//! previous-state cache) is fixed before the phase starts, so the order of
//! updates within the phase cannot change the result.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::core::config::EmotionParams;
use crate::core::math::{clamp_unit, is_unit};
use crate::models::agent::{AffectState, Agent};
use crate::models::event::{EventScope, WorldEvent, MAX_IMPACT};
use crate::models::ids::{AgentId, EventId, FactionId};
use crate::models::registry::Identified;
use crate::models::state::SimulationState;
use crate::replay::{Operation, ReplayLog};
use crate::tracking::PreviousStateCache;

/// Relevance multiplier for an event aimed directly at the agent
pub const AGENT_SCOPE_FACTOR: f64 = 1.0;
/// Relevance multiplier for an event aimed at one of the agent's factions
pub const FACTION_SCOPE_FACTOR: f64 = 0.7;
/// Relevance multiplier for a settlement-wide event
pub const SETTLEMENT_SCOPE_FACTOR: f64 = 0.4;

/// The event an agent reacts to this tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stimulus {
    pub event: EventId,
    pub tone: f64,
    pub relevance: f64,
}

/// How relevant `event` is to an agent belonging to `memberships`
///
/// `None` when the event does not touch the agent at all.
pub fn event_relevance(event: &WorldEvent, agent: AgentId, memberships: &[FactionId]) -> Option<f64> {
    let factor = match event.scope() {
        EventScope::Agent(target) if target == agent => AGENT_SCOPE_FACTOR,
        EventScope::Faction(faction) if memberships.contains(&faction) => FACTION_SCOPE_FACTOR,
        EventScope::Settlement => SETTLEMENT_SCOPE_FACTOR,
        _ => return None,
    };
    Some(clamp_unit(event.impact_level() / MAX_IMPACT * factor))
}

/// Social pressure on an agent: mean previous-tick mood of its contacts
///
/// Contacts missing from the cache are ignored; no contacts gives 0.
pub fn social_pressure(agent: &Agent, previous: &PreviousStateCache) -> f64 {
    let moods: Vec<f64> = agent
        .nearby()
        .iter()
        .filter_map(|id| previous.mood(*id))
        .collect();
    if moods.is_empty() {
        0.0
    } else {
        clamp_unit(moods.iter().sum::<f64>() / moods.len() as f64)
    }
}

/// Pure affect-update rules parameterised by the configured coefficients
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionalModel {
    params: EmotionParams,
}

impl EmotionalModel {
    pub fn new(params: EmotionParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &EmotionParams {
        &self.params
    }

    /// `E_i`, clamped
    pub fn immediate_emotion(&self, tone: f64, relevance: f64, bias: f64, social_pressure: f64) -> f64 {
        let p = &self.params;
        clamp_unit(
            p.tone_weight * tone
                + p.relevance_weight * relevance
                + p.bias_weight * bias
                + p.social_weight * social_pressure,
        )
    }

    /// `M_s(t)`, clamped
    ///
    /// # Example
    /// ```
    /// use settlement_sim_core::core::config::EmotionParams;
    /// use settlement_sim_core::emotion::EmotionalModel;
    ///
    /// let model = EmotionalModel::new(EmotionParams::default());
    /// let mut mood = 0.0;
    /// for _ in 0..50 {
    ///     mood = model.mood(1.0, mood);
    /// }
    /// assert!(mood > 0.99 && mood < 1.0);
    /// ```
    pub fn mood(&self, immediate: f64, previous_mood: f64) -> f64 {
        let alpha = self.params.alpha;
        clamp_unit(alpha * immediate + (1.0 - alpha) * previous_mood)
    }

    /// `A_l(t)`, clamped
    pub fn attitude(&self, previous_attitude: f64, mood: f64) -> f64 {
        clamp_unit(previous_attitude + self.params.beta * mood)
    }

    /// Pick the stimulus an agent reacts to among `events`
    ///
    /// The most relevant event wins; equal relevance goes to the lower event
    /// ID. `events` must be in ID order.
    pub fn select_stimulus<'a, I>(&self, agent: AgentId, memberships: &[FactionId], events: I) -> Option<Stimulus>
    where
        I: IntoIterator<Item = &'a WorldEvent>,
    {
        let mut best: Option<Stimulus> = None;
        for event in events {
            let Some(relevance) = event_relevance(event, agent, memberships) else {
                continue;
            };
            if best.map_or(true, |b| relevance > b.relevance) {
                best = Some(Stimulus {
                    event: event.id(),
                    tone: event.tone(),
                    relevance,
                });
            }
        }
        best
    }

    /// One tick of the three chained rules
    pub fn step(&self, affect: &AffectState, stimulus: Option<&Stimulus>, bias: f64, social: f64) -> AffectState {
        let immediate = match stimulus {
            Some(s) => self.immediate_emotion(s.tone, s.relevance, bias, social),
            None => clamp_unit(affect.immediate_emotion),
        };
        let mood = self.mood(immediate, affect.short_term_mood);
        let attitude = self.attitude(affect.long_term_attitude, mood);
        AffectState::new(immediate, mood, attitude)
    }

    /// Update every agent for this tick
    ///
    /// `stimuli` are the events created since the last emotion phase, in ID
    /// order. Returns the number of agents whose immediate emotion was
    /// recomputed.
    pub fn update_all(
        &self,
        state: &mut SimulationState,
        previous: &PreviousStateCache,
        stimuli: &[EventId],
        tick: u64,
        log: &mut ReplayLog,
    ) -> usize {
        let events: Vec<WorldEvent> = stimuli
            .iter()
            .filter_map(|id| state.get_event(*id).cloned())
            .collect();

        // Inputs are resolved against the pre-phase state
        let updates: Vec<(AgentId, AffectState, Option<Stimulus>)> = state
            .agents()
            .get_all()
            .map(|agent| {
                let memberships = state.memberships(agent.id());
                let stimulus = self.select_stimulus(agent.id(), &memberships, &events);
                let social = social_pressure(agent, previous);
                let next = self.step(agent.affect(), stimulus.as_ref(), agent.emotional_bias(), social);
                (agent.id(), next, stimulus)
            })
            .collect();

        let mut stimulated = 0;
        for (id, affect, stimulus) in updates {
            if let Some(s) = stimulus {
                stimulated += 1;
                log.append(
                    tick,
                    Operation::ImmediateEmotion,
                    json!({
                        "agent": id.raw(),
                        "event": s.event.raw(),
                        "tone": s.tone,
                        "relevance": s.relevance,
                    }),
                    json!(affect.immediate_emotion),
                );
            }
            if let Some(agent) = state.get_agent_mut(id) {
                agent.set_affect(affect);
            }
        }
        stimulated
    }
}

/// A value the validation sweep had to pull back into range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsCorrection {
    pub agent: AgentId,
    pub field: String,
    pub before: f64,
    pub after: f64,
}

/// Clamp every agent scalar that drifted outside `[0, 1]`
///
/// Corrections are logged with `warn!` and appended to the replay log; they
/// are never fatal.
pub fn validate_bounds(state: &mut SimulationState, tick: u64, log: &mut ReplayLog) -> Vec<BoundsCorrection> {
    let mut corrections = Vec::new();

    for agent in state.agents_mut().get_all_mut() {
        let id = agent.id();
        let affect = *agent.affect();
        for (field, before) in [
            ("immediate_emotion", affect.immediate_emotion),
            ("short_term_mood", affect.short_term_mood),
            ("long_term_attitude", affect.long_term_attitude),
            ("loyalty", agent.loyalty()),
        ] {
            if !is_unit(before) {
                corrections.push(BoundsCorrection {
                    agent: id,
                    field: field.to_string(),
                    before,
                    after: clamp_unit(before),
                });
            }
        }
        if !affect.is_within_bounds() {
            agent.set_affect(affect.clamped());
        }
        if !is_unit(agent.loyalty()) {
            agent.set_loyalty(agent.loyalty());
        }
    }

    for c in &corrections {
        warn!(
            tick,
            agent_id = %c.agent,
            field = %c.field,
            before = c.before,
            after = c.after,
            "clamped out-of-range value"
        );
        log.append(
            tick,
            Operation::BoundsCorrection,
            json!({ "agent": c.agent.raw(), "field": c.field, "before": c.before }),
            json!(c.after),
        );
    }
    info!(tick, corrections = corrections.len(), "validation sweep complete");

    corrections
}
