//! World-state tracking
//!
//! Diffs the current state against the previous-state cache and packages
//! externally significant changes for the narrative layer. Four independent
//! sets are computed:
//!
//! - agents whose mood moved by more than the mood threshold
//! - factions whose average member loyalty moved by more than the loyalty
//!   threshold
//! - resources that crossed their scarcity threshold, in either direction
//! - events created since the previous check
//!
//! Scarcity is compared against what the last check saw, not against the
//! cache. Scheduled resource changes land after this phase, and the tracker's
//! own baseline carries them into the next tick's snapshot.
//!
//! An empty snapshot is never produced.

mod previous;

pub use previous::{AgentProjection, PreviousStateCache};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::config::Thresholds;
use crate::models::event::{EventKind, EventScope};
use crate::models::ids::{AgentId, EventId, FactionId, ResourceId};
use crate::models::registry::Identified;
use crate::models::resource::is_scarce;
use crate::models::state::SimulationState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodChange {
    pub agent: AgentId,
    pub previous: f64,
    pub current: f64,
}

impl MoodChange {
    pub fn delta(&self) -> f64 {
        self.current - self.previous
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionLoyaltyChange {
    pub faction: FactionId,
    pub previous: f64,
    pub current: f64,
}

impl FactionLoyaltyChange {
    pub fn delta(&self) -> f64 {
        self.current - self.previous
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScarcityChange {
    pub resource: ResourceId,
    pub quantity: f64,
    pub threshold: f64,
    /// True when the resource became scarce, false when it recovered
    pub now_scarce: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: EventId,
    pub kind: EventKind,
    pub scope: EventScope,
    pub impact_level: f64,
    pub caused_by: Option<EventId>,
}

/// Aggregate of everything the narrative layer should hear about this tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldStateSnapshot {
    pub tick: u64,
    pub mood_changes: Vec<MoodChange>,
    pub faction_changes: Vec<FactionLoyaltyChange>,
    pub scarcity_changes: Vec<ScarcityChange>,
    pub events: Vec<EventSummary>,
}

impl WorldStateSnapshot {
    pub fn is_empty(&self) -> bool {
        self.mood_changes.is_empty()
            && self.faction_changes.is_empty()
            && self.scarcity_changes.is_empty()
            && self.events.is_empty()
    }
}

/// Resources whose scarcity differs from last tick, in ID order
///
/// Shared with the continuous-event phase, which turns new scarcity into
/// `Shortage` events.
pub fn scarcity_crossings(
    state: &SimulationState,
    previous: &PreviousStateCache,
) -> Vec<ScarcityChange> {
    state
        .resources()
        .get_all()
        .filter_map(|resource| {
            let before = previous.resource_quantity(resource.id())?;
            let was_scarce = is_scarce(before, resource.scarcity_threshold());
            let now_scarce = resource.is_scarce();
            (was_scarce != now_scarce).then(|| ScarcityChange {
                resource: resource.id(),
                quantity: resource.quantity(),
                threshold: resource.scarcity_threshold(),
                now_scarce,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldStateTracker {
    mood_threshold: f64,
    loyalty_threshold: f64,
    /// First event ID not yet reported
    watermark: EventId,
    /// Scarcity of each resource as of the last check
    #[serde(default)]
    scarce: BTreeMap<ResourceId, bool>,
}

impl WorldStateTracker {
    pub fn new(thresholds: &Thresholds) -> Self {
        Self {
            mood_threshold: thresholds.mood_delta,
            loyalty_threshold: thresholds.loyalty_delta,
            watermark: EventId(1),
            scarce: BTreeMap::new(),
        }
    }

    /// Resume reporting from a saved watermark
    pub fn with_watermark(mut self, watermark: EventId) -> Self {
        self.watermark = watermark;
        self
    }

    pub fn watermark(&self) -> EventId {
        self.watermark
    }

    /// Resume from the scarcity the last check saw
    pub fn with_scarcity(mut self, scarce: BTreeMap<ResourceId, bool>) -> Self {
        self.scarce = scarce;
        self
    }

    pub fn scarcity(&self) -> &BTreeMap<ResourceId, bool> {
        &self.scarce
    }

    /// Resources whose scarcity differs from the last check, in ID order
    ///
    /// A resource the tracker has never seen falls back to the cache's
    /// quantity; one missing from both has no baseline and is skipped.
    fn scarcity_changes(&mut self, state: &SimulationState, previous: &PreviousStateCache) -> Vec<ScarcityChange> {
        let mut changes = Vec::new();
        let mut seen = BTreeMap::new();
        for resource in state.resources().get_all() {
            let now_scarce = resource.is_scarce();
            seen.insert(resource.id(), now_scarce);

            let was_scarce = self.scarce.get(&resource.id()).copied().or_else(|| {
                previous
                    .resource_quantity(resource.id())
                    .map(|q| is_scarce(q, resource.scarcity_threshold()))
            });
            if was_scarce.is_some_and(|was| was != now_scarce) {
                changes.push(ScarcityChange {
                    resource: resource.id(),
                    quantity: resource.quantity(),
                    threshold: resource.scarcity_threshold(),
                    now_scarce,
                });
            }
        }
        self.scarce = seen;
        changes
    }

    /// Diff `state` against `previous`; `None` when nothing is significant
    ///
    /// Entities missing from the cache (added since the last refresh) have no
    /// baseline and are skipped. Events and scarcity crossings are reported
    /// once each.
    pub fn check(
        &mut self,
        state: &SimulationState,
        previous: &PreviousStateCache,
        tick: u64,
    ) -> Option<WorldStateSnapshot> {
        let mood_changes = state
            .agents()
            .get_all()
            .filter_map(|agent| {
                let before = previous.mood(agent.id())?;
                let current = agent.affect().short_term_mood;
                ((current - before).abs() > self.mood_threshold).then(|| MoodChange {
                    agent: agent.id(),
                    previous: before,
                    current,
                })
            })
            .collect();

        let faction_changes = state
            .factions()
            .get_all()
            .filter_map(|faction| {
                let before = previous.faction_loyalty(faction.id())?;
                let current = faction.loyalty();
                ((current - before).abs() > self.loyalty_threshold).then(|| {
                    FactionLoyaltyChange {
                        faction: faction.id(),
                        previous: before,
                        current,
                    }
                })
            })
            .collect();

        let events: Vec<EventSummary> = state
            .events()
            .get_all()
            .filter(|e| e.id() >= self.watermark)
            .map(|e| EventSummary {
                id: e.id(),
                kind: e.kind(),
                scope: e.scope(),
                impact_level: e.impact_level(),
                caused_by: e.caused_by(),
            })
            .collect();
        self.watermark = state.next_event_id();

        let snapshot = WorldStateSnapshot {
            tick,
            mood_changes,
            faction_changes,
            scarcity_changes: self.scarcity_changes(state, previous),
            events,
        };

        if snapshot.is_empty() {
            None
        } else {
            Some(snapshot)
        }
    }
}
