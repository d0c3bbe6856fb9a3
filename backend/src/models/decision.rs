//! Leadership decisions
//!
//! A decision arrives from the input layer already parsed and validated. The
//! orchestrator accepts at most one per tick and executes it in the
//! `InputProcessed` phase.

use serde::{Deserialize, Serialize};

use crate::models::ids::{AgentId, FactionId, ResourceId};

/// What the leader does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    /// Hand out `quantity` units of a resource to every settler
    Distribute,
    /// Restrict consumption of a resource
    Ration,
    /// Speak to the settlement, a faction or one agent
    Address,
    /// Discipline one agent
    Punish,
}

/// Who or what the decision is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", content = "id", rename_all = "snake_case")]
pub enum DecisionTarget {
    Settlement,
    Faction(FactionId),
    Agent(AgentId),
    Resource(ResourceId),
}

/// A parsed, validated player decision
///
/// # Example
/// ```
/// use settlement_sim_core::models::{Decision, DecisionAction, DecisionTarget, ResourceId};
///
/// let decision = Decision::new(DecisionAction::Distribute, DecisionTarget::Resource(ResourceId(1)), 20.0, 0.8);
/// assert!(decision.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: DecisionAction,
    pub target: DecisionTarget,
    /// Amount (resource units for Distribute/Ration, emphasis for the rest)
    pub quantity: f64,
    /// Delivery tone, `[0, 1]`: 0 harsh, 1 warm
    pub tone: f64,
}

impl Decision {
    pub fn new(action: DecisionAction, target: DecisionTarget, quantity: f64, tone: f64) -> Self {
        Self {
            action,
            target,
            quantity,
            tone,
        }
    }

    /// Check the action/target pairing and the numeric ranges
    pub fn validate(&self) -> Result<(), String> {
        if !self.quantity.is_finite() || self.quantity < 0.0 {
            return Err(format!("quantity must be finite and >= 0, got {}", self.quantity));
        }
        if !crate::core::math::is_unit(self.tone) {
            return Err(format!("tone must be in [0, 1], got {}", self.tone));
        }
        match (self.action, self.target) {
            (DecisionAction::Distribute | DecisionAction::Ration, DecisionTarget::Resource(_)) => Ok(()),
            (DecisionAction::Distribute | DecisionAction::Ration, other) => Err(format!(
                "{:?} requires a resource target, got {:?}",
                self.action, other
            )),
            (DecisionAction::Address, DecisionTarget::Resource(_)) => {
                Err("Address cannot target a resource".to_string())
            }
            (DecisionAction::Address, _) => Ok(()),
            (DecisionAction::Punish, DecisionTarget::Agent(_)) => Ok(()),
            (DecisionAction::Punish, other) => {
                Err(format!("Punish requires an agent target, got {:?}", other))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punish_needs_agent() {
        let bad = Decision::new(DecisionAction::Punish, DecisionTarget::Settlement, 1.0, 0.2);
        assert!(bad.validate().is_err());
        let good = Decision::new(DecisionAction::Punish, DecisionTarget::Agent(AgentId(3)), 1.0, 0.2);
        assert!(good.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_tone() {
        let d = Decision::new(DecisionAction::Address, DecisionTarget::Settlement, 1.0, 1.5);
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_quantity() {
        let d = Decision::new(
            DecisionAction::Distribute,
            DecisionTarget::Resource(ResourceId(1)),
            -4.0,
            0.5,
        );
        assert!(d.validate().is_err());
    }
}
