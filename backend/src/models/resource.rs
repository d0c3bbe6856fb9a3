//! Resource model
//!
//! A settlement stockpile. A resource is scarce while its quantity is below
//! its scarcity threshold; the world-state tracker reports crossings of that
//! threshold in either direction.

use serde::{Deserialize, Serialize};

use crate::models::ids::ResourceId;
use crate::models::registry::Identified;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    id: ResourceId,
    name: String,
    quantity: f64,
    scarcity_threshold: f64,
}

impl Identified for Resource {
    type Id = ResourceId;

    fn id(&self) -> ResourceId {
        self.id
    }
}

impl Resource {
    pub fn new(id: ResourceId, name: impl Into<String>, quantity: f64, scarcity_threshold: f64) -> Self {
        Self {
            id,
            name: name.into(),
            quantity: quantity.max(0.0),
            scarcity_threshold: scarcity_threshold.max(0.0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn scarcity_threshold(&self) -> f64 {
        self.scarcity_threshold
    }

    pub fn is_scarce(&self) -> bool {
        is_scarce(self.quantity, self.scarcity_threshold)
    }

    /// Adjust quantity by `delta`, never below zero. Returns the applied change.
    ///
    /// # Example
    /// ```
    /// use settlement_sim_core::models::{Resource, ResourceId};
    ///
    /// let mut grain = Resource::new(ResourceId(1), "grain", 10.0, 4.0);
    /// assert_eq!(grain.adjust(-15.0), -10.0);
    /// assert!(grain.is_scarce());
    /// ```
    pub fn adjust(&mut self, delta: f64) -> f64 {
        let before = self.quantity;
        self.quantity = (self.quantity + delta).max(0.0);
        self.quantity - before
    }
}

/// Scarcity predicate shared with the previous-state comparison
pub fn is_scarce(quantity: f64, threshold: f64) -> bool {
    quantity < threshold
}
