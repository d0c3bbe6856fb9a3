//! Scenario event types
//!
//! Scenario events script the world around the player: storms on a given
//! tick, a harvest every season, a faction's cause gaining relevance.
//!
//! # Design Principles
//!
//! 1. **Determinism**: events are scheduled by tick, never by wall clock
//! 2. **Self-contained**: each event carries all data needed to apply it
//! 3. **Logged**: every application is written to the replay log

use serde::{Deserialize, Serialize};

use crate::models::event::{EventKind, EventScope};
use crate::models::ids::{AgentId, FactionId, ResourceId};

/// A primary world event waiting to be created
///
/// Used for scheduled world events and for events injected by the host
/// between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSpec {
    pub kind: EventKind,
    pub scope: EventScope,
    pub impact: f64,
    /// Overrides the kind's base tone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<f64>,
}

impl EventSpec {
    pub fn new(kind: EventKind, scope: EventScope, impact: f64) -> Self {
        Self {
            kind,
            scope,
            impact,
            tone: None,
        }
    }

    pub fn with_tone(mut self, tone: f64) -> Self {
        self.tone = Some(tone);
        self
    }

    pub fn tone_or_base(&self) -> f64 {
        self.tone.unwrap_or_else(|| self.kind.base_tone())
    }
}

/// Something that happens to the settlement on schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioEvent {
    /// A primary world event, cascaded like any other
    ///
    /// # Example
    /// A storm of impact 7 over the whole settlement
    WorldEvent(EventSpec),

    /// Add to (or draw down) a stockpile
    ///
    /// # Example
    /// Autumn harvest: +40 grain
    ResourceChange { resource: ResourceId, delta: f64 },

    /// Shift how much a faction's cause resonates
    FactionShift {
        faction: FactionId,
        #[serde(default)]
        relevance: Option<f64>,
        #[serde(default)]
        emotional_appeal: Option<f64>,
    },

    /// An agent joins a faction
    JoinFaction { agent: AgentId, faction: FactionId },

    /// An agent leaves a faction
    LeaveFaction { agent: AgentId, faction: FactionId },
}

/// When to execute a scenario event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventSchedule {
    /// Execute once at a specific tick
    OneTime { tick: u64 },

    /// Execute at regular intervals starting from start_tick
    Repeating { start_tick: u64, interval: u64 },
}

impl EventSchedule {
    /// Check if this schedule triggers at the given tick
    ///
    /// A repeating schedule with a zero interval fires only at its start.
    pub fn should_execute(&self, tick: u64) -> bool {
        match *self {
            EventSchedule::OneTime { tick: event_tick } => tick == event_tick,
            EventSchedule::Repeating {
                start_tick,
                interval,
            } => {
                tick >= start_tick
                    && (tick - start_tick)
                        .checked_rem(interval)
                        .map_or(tick == start_tick, |r| r == 0)
            }
        }
    }
}

/// A scenario event paired with its schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub event: ScenarioEvent,
    pub schedule: EventSchedule,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_time_schedule() {
        let schedule = EventSchedule::OneTime { tick: 10 };

        assert!(!schedule.should_execute(9));
        assert!(schedule.should_execute(10));
        assert!(!schedule.should_execute(11));
    }

    #[test]
    fn test_repeating_schedule() {
        let schedule = EventSchedule::Repeating {
            start_tick: 10,
            interval: 5,
        };

        assert!(!schedule.should_execute(9));
        assert!(schedule.should_execute(10));
        assert!(!schedule.should_execute(11));
        assert!(schedule.should_execute(15));
        assert!(!schedule.should_execute(22));
    }

    #[test]
    fn test_zero_interval_fires_once() {
        let schedule = EventSchedule::Repeating {
            start_tick: 3,
            interval: 0,
        };
        assert!(schedule.should_execute(3));
        assert!(!schedule.should_execute(4));
    }

    #[test]
    fn test_scheduled_event_from_json() {
        let json = r#"{
            "event": { "type": "world_event", "kind": "storm", "scope": { "scope": "settlement" }, "impact": 7.0 },
            "schedule": { "start_tick": 0, "interval": 20 }
        }"#;
        let scheduled: ScheduledEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            scheduled.event,
            ScenarioEvent::WorldEvent(EventSpec::new(EventKind::Storm, EventScope::Settlement, 7.0))
        );
        assert!(scheduled.schedule.should_execute(40));
    }
}
