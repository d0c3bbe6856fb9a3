//! Event cascade
//!
//! A primary event may spawn secondary events, each of which may spawn more.
//! For every secondary candidate of an event's kind, one draw from the tick
//! RNG decides whether it fires:
//!
//! `triggered = rng.next_f64() < sigmoid(parent.impact · factor)`
//!
//! Expansion is breadth-first and candidates are rolled in catalog order, so
//! the draw sequence is fully determined by the event forest. Every draw is
//! written to the replay log with the tick seed, the drawn value, the
//! threshold and the outcome. The catalog is acyclic, so expansion ends when
//! it reaches kinds with no candidates.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::core::math::{clamp_unit, sigmoid};
use crate::models::event::clamp_impact;
use crate::models::ids::EventId;
use crate::models::state::SimulationState;
use crate::replay::{Operation, ReplayLog};
use crate::rng::RngManager;

/// `sigmoid(impact · factor)`
///
/// # Example
/// ```
/// use settlement_sim_core::cascade::cascade_probability;
///
/// assert!((cascade_probability(8.0, 0.5) - 0.9820).abs() < 1e-4);
/// ```
pub fn cascade_probability(impact_level: f64, factor: f64) -> f64 {
    clamp_unit(sigmoid(impact_level * factor))
}

/// Outcome of one cascade draw
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CascadeRoll {
    pub probability: f64,
    pub draw: f64,
    pub triggered: bool,
}

/// Draw once and compare against the cascade probability
pub fn roll(rng: &mut RngManager, impact_level: f64, factor: f64) -> CascadeRoll {
    let probability = cascade_probability(impact_level, factor);
    let draw = rng.next_f64();
    CascadeRoll {
        probability,
        draw,
        triggered: draw < probability,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventCascade {
    factor: f64,
}

impl EventCascade {
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Expand the cascade tree under `root`, returning the secondary events
    /// created in creation order
    pub fn expand(
        &self,
        state: &mut SimulationState,
        root: EventId,
        rng: &mut RngManager,
        tick: u64,
        log: &mut ReplayLog,
    ) -> Vec<EventId> {
        let mut created = Vec::new();
        let mut frontier = VecDeque::from([root]);

        while let Some(parent_id) = frontier.pop_front() {
            let Some(parent) = state.get_event(parent_id).cloned() else {
                continue;
            };

            for candidate in parent.kind().secondary_candidates() {
                let outcome = roll(rng, parent.impact_level(), self.factor);
                log.append(
                    tick,
                    Operation::CascadeRoll,
                    json!({
                        "seed": rng.seed(),
                        "parent": parent_id.raw(),
                        "candidate": candidate.kind.as_str(),
                    }),
                    json!({
                        "draw": outcome.draw,
                        "probability": outcome.probability,
                        "triggered": outcome.triggered,
                    }),
                );
                if !outcome.triggered {
                    continue;
                }

                let impact = clamp_impact(parent.impact_level() * candidate.impact_scale);
                let child = state.record_event(
                    candidate.kind,
                    parent.scope(),
                    candidate.kind.base_tone(),
                    impact,
                    tick,
                    Some(parent_id),
                );
                debug!(tick, parent = %parent_id, event = %child, kind = candidate.kind.as_str(), "secondary event");
                log.append(
                    tick,
                    Operation::EventCreated,
                    json!({
                        "kind": candidate.kind.as_str(),
                        "impact": impact,
                        "caused_by": parent_id.raw(),
                    }),
                    json!(child.raw()),
                );
                created.push(child);
                frontier.push_back(child);
            }
        }

        created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventKind, EventScope};

    #[test]
    fn test_probability_grows_with_impact() {
        assert!(cascade_probability(2.0, 0.5) < cascade_probability(8.0, 0.5));
        assert_eq!(cascade_probability(0.0, 0.5), 0.5);
    }

    #[test]
    fn test_expansion_builds_tree_under_root() {
        let mut state = SimulationState::new();
        let root = state.record_event(EventKind::Storm, EventScope::Settlement, 0.2, 10.0, 0, None);
        let mut rng = RngManager::for_tick(42, 0);
        let mut log = ReplayLog::new("test", 42);

        let created = EventCascade::new(0.5).expand(&mut state, root, &mut rng, 0, &mut log);

        for id in &created {
            assert_eq!(state.cascade_root(*id), Some(root));
            let event = state.get_event(*id).unwrap();
            let parent = state.get_event(event.caused_by().unwrap()).unwrap();
            assert!(event.impact_level() < parent.impact_level());
        }
        assert_eq!(log.entries_of(Operation::EventCreated).count(), created.len());
    }

    #[test]
    fn test_terminal_kind_draws_nothing() {
        let mut state = SimulationState::new();
        let root = state.record_event(EventKind::Brawl, EventScope::Settlement, 0.2, 10.0, 0, None);
        let mut rng = RngManager::for_tick(1, 0);
        let mut log = ReplayLog::new("test", 1);

        let created = EventCascade::new(0.5).expand(&mut state, root, &mut rng, 0, &mut log);
        assert!(created.is_empty());
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let run = || {
            let mut state = SimulationState::new();
            let root = state.record_event(EventKind::Fire, EventScope::Settlement, 0.1, 7.0, 3, None);
            let mut rng = RngManager::for_tick(99, 3);
            let mut log = ReplayLog::new("test", 99);
            EventCascade::new(0.5).expand(&mut state, root, &mut rng, 3, &mut log);
            state
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_every_candidate_consumes_one_draw() {
        let mut state = SimulationState::new();
        // Zero impact keeps children at zero impact, still rolled at p = 0.5
        let root = state.record_event(EventKind::Harvest, EventScope::Settlement, 0.8, 0.0, 0, None);
        let mut rng = RngManager::for_tick(5, 0);
        let mut log = ReplayLog::new("test", 5);

        let created = EventCascade::new(0.5).expand(&mut state, root, &mut rng, 0, &mut log);
        assert_eq!(rng.draws() as usize, log.entries_of(Operation::CascadeRoll).count());
        assert!(created.len() <= 2);
    }
}
