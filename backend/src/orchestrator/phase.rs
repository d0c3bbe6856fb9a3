//! Tick phase state machine
//!
//! ```text
//! Idle -> TickStart -> PositionsUpdated -> EmotionsUpdated -> ProblemsChecked
//!      -> ProximityChecked -> InputProcessed -> WorldStateChecked
//!      -> ContinuousEventsChecked -> [EmotionValidated] -> PreviousStateRefreshed
//!      -> TickEnd -> Idle
//! ```
//!
//! `EmotionValidated` only runs on validation ticks.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickPhase {
    Idle,
    TickStart,
    PositionsUpdated,
    EmotionsUpdated,
    ProblemsChecked,
    ProximityChecked,
    InputProcessed,
    WorldStateChecked,
    ContinuousEventsChecked,
    EmotionValidated,
    PreviousStateRefreshed,
    TickEnd,
}

impl TickPhase {
    /// Phase that follows this one
    pub fn next(self, validation_tick: bool) -> TickPhase {
        use TickPhase::*;
        match self {
            Idle => TickStart,
            TickStart => PositionsUpdated,
            PositionsUpdated => EmotionsUpdated,
            EmotionsUpdated => ProblemsChecked,
            ProblemsChecked => ProximityChecked,
            ProximityChecked => InputProcessed,
            InputProcessed => WorldStateChecked,
            WorldStateChecked => ContinuousEventsChecked,
            ContinuousEventsChecked if validation_tick => EmotionValidated,
            ContinuousEventsChecked => PreviousStateRefreshed,
            EmotionValidated => PreviousStateRefreshed,
            PreviousStateRefreshed => TickEnd,
            TickEnd => Idle,
        }
    }

    /// Every phase a tick passes through, excluding the leading and trailing `Idle`
    pub fn sequence(validation_tick: bool) -> Vec<TickPhase> {
        let mut phases = Vec::with_capacity(11);
        let mut phase = TickPhase::Idle.next(validation_tick);
        while phase != TickPhase::Idle {
            phases.push(phase);
            phase = phase.next(validation_tick);
        }
        phases
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TickPhase::Idle => "idle",
            TickPhase::TickStart => "tick_start",
            TickPhase::PositionsUpdated => "positions_updated",
            TickPhase::EmotionsUpdated => "emotions_updated",
            TickPhase::ProblemsChecked => "problems_checked",
            TickPhase::ProximityChecked => "proximity_checked",
            TickPhase::InputProcessed => "input_processed",
            TickPhase::WorldStateChecked => "world_state_checked",
            TickPhase::ContinuousEventsChecked => "continuous_events_checked",
            TickPhase::EmotionValidated => "emotion_validated",
            TickPhase::PreviousStateRefreshed => "previous_state_refreshed",
            TickPhase::TickEnd => "tick_end",
        }
    }
}

impl std::fmt::Display for TickPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
