//! Typed entity identifiers
//!
//! Cross-references between entities are integer IDs resolved through the
//! registries at use time, never pointers. Ordering is numeric, which gives
//! every registry a stable iteration order.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw numeric value
            pub fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

entity_id!(
    /// Identifier of an NPC agent
    AgentId,
    "agent_"
);
entity_id!(
    /// Identifier of a faction
    FactionId,
    "faction_"
);
entity_id!(
    /// Identifier of a settlement resource stockpile
    ResourceId,
    "resource_"
);
entity_id!(
    /// Identifier of a world event; assigned monotonically by the state
    EventId,
    "event_"
);
