//! Ordered entity registry
//!
//! Replaces process-wide singleton registries with a plain owned container.
//! Iteration is always in ID order, which the determinism contract depends on.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

/// An entity that carries its own identifier
pub trait Identified {
    type Id: Copy + Ord + Hash + fmt::Debug + fmt::Display;

    fn id(&self) -> Self::Id;
}

/// ID-ordered collection of entities
///
/// Serialized as a plain JSON array of entities in ID order.
///
/// # Example
/// ```
/// use settlement_sim_core::models::{Agent, AgentId, Registry};
///
/// let mut agents = Registry::new();
/// agents.insert(Agent::new(AgentId(2), "Bram"));
/// agents.insert(Agent::new(AgentId(1), "Ada"));
///
/// let order: Vec<AgentId> = agents.ids();
/// assert_eq!(order, vec![AgentId(1), AgentId(2)]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Registry<T: Identified> {
    items: BTreeMap<T::Id, T>,
}

impl<T: Identified> Default for Registry<T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<T: Identified> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity, returning the one it replaced (if any)
    pub fn insert(&mut self, item: T) -> Option<T> {
        self.items.insert(item.id(), item)
    }

    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: T::Id) -> Option<&mut T> {
        self.items.get_mut(&id)
    }

    pub fn remove(&mut self, id: T::Id) -> Option<T> {
        self.items.remove(&id)
    }

    pub fn contains(&self, id: T::Id) -> bool {
        self.items.contains_key(&id)
    }

    /// All entities in ID order
    pub fn get_all(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    /// Mutable iteration in ID order
    pub fn get_all_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.values_mut()
    }

    /// Snapshot of the IDs in order
    pub fn ids(&self) -> Vec<T::Id> {
        self.items.keys().copied().collect()
    }

    /// Largest ID currently stored
    pub fn last_id(&self) -> Option<T::Id> {
        self.items.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Identified> FromIterator<T> for Registry<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut registry = Registry::new();
        for item in iter {
            registry.insert(item);
        }
        registry
    }
}

impl<T: Identified + Serialize> Serialize for Registry<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.values())
    }
}

impl<'de, T: Identified + Deserialize<'de>> Deserialize<'de> for Registry<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Ok(items.into_iter().collect())
    }
}
