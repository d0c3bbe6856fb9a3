//! Faction model
//!
//! A faction holds a weak relation to its members: a set of agent IDs,
//! resolved through the agent registry every tick. The aggregate values
//! (strength, loyalty, emergence probability) are recomputed from scratch
//! each tick by the faction system and never persisted independently.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::math::clamp_unit;
use crate::models::ids::{AgentId, FactionId};
use crate::models::registry::Identified;

/// Per-tick recomputed aggregate of a faction
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FactionAggregate {
    /// Capability-weighted member loyalty, clamped `[0, 1]`
    pub strength: f64,
    /// Average derived member loyalty, `[0, 1]`
    pub loyalty: f64,
    /// Probability the faction acts without the player, `[0, 1]`
    pub emergence_probability: f64,
    /// Derived loyalty of each resolved member towards this faction
    pub member_loyalty: BTreeMap<AgentId, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    id: FactionId,
    name: String,
    members: BTreeSet<AgentId>,

    /// How much the faction's cause matters to settlers right now, `[0, 1]`
    relevance: f64,

    /// Emotional pull of the faction's rhetoric, `[0, 1]`
    emotional_appeal: f64,

    #[serde(default)]
    aggregate: FactionAggregate,
}

impl Identified for Faction {
    type Id = FactionId;

    fn id(&self) -> FactionId {
        self.id
    }
}

impl Faction {
    pub fn new(id: FactionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            members: BTreeSet::new(),
            relevance: 0.5,
            emotional_appeal: 0.5,
            aggregate: FactionAggregate::default(),
        }
    }

    pub fn with_members<I: IntoIterator<Item = AgentId>>(mut self, members: I) -> Self {
        self.members = members.into_iter().collect();
        self
    }

    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance = clamp_unit(relevance);
        self
    }

    pub fn with_emotional_appeal(mut self, appeal: f64) -> Self {
        self.emotional_appeal = clamp_unit(appeal);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member IDs in ascending order
    pub fn members(&self) -> &BTreeSet<AgentId> {
        &self.members
    }

    pub fn is_member(&self, agent: AgentId) -> bool {
        self.members.contains(&agent)
    }

    /// Returns false if the agent was already a member
    pub fn add_member(&mut self, agent: AgentId) -> bool {
        self.members.insert(agent)
    }

    /// Returns false if the agent was not a member
    pub fn remove_member(&mut self, agent: AgentId) -> bool {
        self.members.remove(&agent)
    }

    pub fn relevance(&self) -> f64 {
        self.relevance
    }

    pub fn emotional_appeal(&self) -> f64 {
        self.emotional_appeal
    }

    pub fn set_relevance(&mut self, relevance: f64) {
        self.relevance = clamp_unit(relevance);
    }

    pub fn set_emotional_appeal(&mut self, appeal: f64) {
        self.emotional_appeal = clamp_unit(appeal);
    }

    pub fn aggregate(&self) -> &FactionAggregate {
        &self.aggregate
    }

    pub fn strength(&self) -> f64 {
        self.aggregate.strength
    }

    pub fn loyalty(&self) -> f64 {
        self.aggregate.loyalty
    }

    pub fn emergence_probability(&self) -> f64 {
        self.aggregate.emergence_probability
    }

    pub(crate) fn set_aggregate(&mut self, aggregate: FactionAggregate) {
        self.aggregate = aggregate;
    }
}
