//! Recorded player and host input
//!
//! The orchestrator writes every accepted decision and injected event here,
//! keyed by the tick that will consume it. Replaying the script against the
//! same starting state must reproduce the original run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::events::EventSpec;
use crate::models::decision::Decision;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum ScriptedInput {
    Decision(Decision),
    Injection(EventSpec),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InputScript {
    inputs: BTreeMap<u64, Vec<ScriptedInput>>,
}

impl InputScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an input for `tick`, after any already recorded for it
    pub fn record(&mut self, tick: u64, input: ScriptedInput) {
        self.inputs.entry(tick).or_default().push(input);
    }

    /// Inputs for `tick` in submission order
    pub fn inputs_for(&self, tick: u64) -> &[ScriptedInput] {
        self.inputs.get(&tick).map_or(&[], Vec::as_slice)
    }

    /// Ticks that have input, ascending
    pub fn ticks(&self) -> impl Iterator<Item = u64> + '_ {
        self.inputs.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.inputs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DecisionAction, DecisionTarget, EventKind, EventScope};

    #[test]
    fn test_inputs_keep_submission_order() {
        let mut script = InputScript::new();
        let storm = EventSpec::new(EventKind::Storm, EventScope::Settlement, 5.0);
        let address = Decision::new(DecisionAction::Address, DecisionTarget::Settlement, 1.0, 0.9);
        script.record(3, ScriptedInput::Injection(storm.clone()));
        script.record(3, ScriptedInput::Decision(address.clone()));

        assert_eq!(
            script.inputs_for(3),
            &[ScriptedInput::Injection(storm), ScriptedInput::Decision(address)]
        );
        assert!(script.inputs_for(4).is_empty());
        assert_eq!(script.len(), 2);
    }

    #[test]
    fn test_script_roundtrips_through_json() {
        let mut script = InputScript::new();
        script.record(
            12,
            ScriptedInput::Decision(Decision::new(
                DecisionAction::Punish,
                DecisionTarget::Agent(crate::models::AgentId(2)),
                0.5,
                0.1,
            )),
        );
        let json = serde_json::to_string(&script).unwrap();
        let back: InputScript = serde_json::from_str(&json).unwrap();
        assert_eq!(back, script);
        assert_eq!(back.ticks().collect::<Vec<_>>(), vec![12]);
    }
}
