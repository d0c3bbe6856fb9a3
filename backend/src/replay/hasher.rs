//! State fingerprinting
//!
//! Folds every determinism-relevant field through FNV-1a into a single
//! 64-bit value. Floats are folded by their IEEE-754 bit pattern, so two
//! states hash equal only when every scalar is bit-identical.
//!
//! The per-entity sub-hashes exist for debugging: when two runs diverge,
//! [`diff_entities`] names the entities whose fields differ.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::agent::Agent;
use crate::models::event::{EventScope, WorldEvent};
use crate::models::faction::Faction;
use crate::models::ids::{AgentId, EventId, FactionId, ResourceId};
use crate::models::registry::Identified;
use crate::models::resource::Resource;
use crate::models::state::SimulationState;

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Running FNV-1a hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fnv1a(u64);

impl Default for Fnv1a {
    fn default() -> Self {
        Self::new()
    }
}

impl Fnv1a {
    pub fn new() -> Self {
        Fnv1a(FNV_OFFSET_BASIS)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.write_u64(value.to_bits());
    }

    /// Strings are terminated so adjacent fields cannot run together
    pub fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
        self.write_bytes(&[0xff]);
    }

    pub fn finish(&self) -> u64 {
        self.0
    }
}

/// Entity a sub-hash belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "entity", content = "id", rename_all = "snake_case")]
pub enum EntityKey {
    Agent(AgentId),
    Faction(FactionId),
    Resource(ResourceId),
    Event(EventId),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Agent(id) => write!(f, "{}", id),
            EntityKey::Faction(id) => write!(f, "{}", id),
            EntityKey::Resource(id) => write!(f, "{}", id),
            EntityKey::Event(id) => write!(f, "{}", id),
        }
    }
}

/// One entity whose sub-hash differs between two states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDiff {
    pub key: EntityKey,
    /// `None` when the entity is missing on that side
    pub left: Option<u64>,
    pub right: Option<u64>,
}

pub struct StateHasher;

impl StateHasher {
    /// Fingerprint of the whole state, folded in registry (ID) order
    pub fn calculate_hash(state: &SimulationState) -> u64 {
        let mut h = Fnv1a::new();
        h.write_u64(state.num_agents() as u64);
        for agent in state.agents().get_all() {
            h.write_u64(Self::agent_hash(agent));
        }
        h.write_u64(state.num_factions() as u64);
        for faction in state.factions().get_all() {
            h.write_u64(Self::faction_hash(faction));
        }
        h.write_u64(state.resources().len() as u64);
        for resource in state.resources().get_all() {
            h.write_u64(Self::resource_hash(resource));
        }
        h.write_u64(state.num_events() as u64);
        for event in state.events().get_all() {
            h.write_u64(Self::event_hash(event));
        }
        h.finish()
    }

    pub fn agent_hash(agent: &Agent) -> u64 {
        let mut h = Fnv1a::new();
        h.write_u64(agent.id().raw());
        let affect = agent.affect();
        h.write_f64(affect.immediate_emotion);
        h.write_f64(affect.short_term_mood);
        h.write_f64(affect.long_term_attitude);
        h.write_f64(agent.loyalty());
        let position = agent.position();
        h.write_f64(position.x);
        h.write_f64(position.y);
        h.write_f64(position.z);
        h.write_u64(agent.nearby().len() as u64);
        for contact in agent.nearby() {
            h.write_u64(contact.raw());
        }
        h.finish()
    }

    pub fn faction_hash(faction: &Faction) -> u64 {
        let mut h = Fnv1a::new();
        h.write_u64(faction.id().raw());
        h.write_u64(faction.members().len() as u64);
        for member in faction.members() {
            h.write_u64(member.raw());
        }
        h.write_f64(faction.relevance());
        h.write_f64(faction.emotional_appeal());
        h.write_f64(faction.strength());
        h.write_f64(faction.loyalty());
        h.write_f64(faction.emergence_probability());
        h.finish()
    }

    pub fn resource_hash(resource: &Resource) -> u64 {
        let mut h = Fnv1a::new();
        h.write_u64(resource.id().raw());
        h.write_f64(resource.quantity());
        h.write_f64(resource.scarcity_threshold());
        h.finish()
    }

    pub fn event_hash(event: &WorldEvent) -> u64 {
        let mut h = Fnv1a::new();
        h.write_u64(event.id().raw());
        h.write_u64(event.kind().code());
        match event.scope() {
            EventScope::Settlement => h.write_u64(0),
            EventScope::Faction(id) => {
                h.write_u64(1);
                h.write_u64(id.raw());
            }
            EventScope::Agent(id) => {
                h.write_u64(2);
                h.write_u64(id.raw());
            }
        }
        h.write_f64(event.tone());
        h.write_f64(event.impact_level());
        h.write_u64(event.tick());
        h.write_u64(event.caused_by().map_or(0, |id| id.raw()));
        h.finish()
    }

    /// Sub-hash of every entity, keyed and ordered by entity
    pub fn entity_hashes(state: &SimulationState) -> BTreeMap<EntityKey, u64> {
        let mut hashes = BTreeMap::new();
        for agent in state.agents().get_all() {
            hashes.insert(EntityKey::Agent(agent.id()), Self::agent_hash(agent));
        }
        for faction in state.factions().get_all() {
            hashes.insert(EntityKey::Faction(faction.id()), Self::faction_hash(faction));
        }
        for resource in state.resources().get_all() {
            hashes.insert(EntityKey::Resource(resource.id()), Self::resource_hash(resource));
        }
        for event in state.events().get_all() {
            hashes.insert(EntityKey::Event(event.id()), Self::event_hash(event));
        }
        hashes
    }
}

/// Entities whose sub-hashes differ between `left` and `right`, in key order
pub fn diff_entities(left: &SimulationState, right: &SimulationState) -> Vec<EntityDiff> {
    let a = StateHasher::entity_hashes(left);
    let b = StateHasher::entity_hashes(right);

    let mut keys: Vec<EntityKey> = a.keys().chain(b.keys()).copied().collect();
    keys.sort();
    keys.dedup();

    keys.into_iter()
        .filter_map(|key| {
            let l = a.get(&key).copied();
            let r = b.get(&key).copied();
            (l != r).then_some(EntityDiff {
                key,
                left: l,
                right: r,
            })
        })
        .collect()
}
