//! World events and the secondary-event catalog.
//!
//! Events are immutable once created. A secondary event points back at the
//! event that caused it through `caused_by`, so the full set of events forms
//! a forest of cascade trees.
//!
//! # Catalog
//!
//! Every [`EventKind`] has a base tone and a finite list of secondary
//! candidates. The candidate graph is acyclic and has terminal kinds with no
//! candidates, so cascade expansion always terminates without needing an
//! artificial depth bound. Candidates are listed in the order they are rolled.
//!
//! # Example
//!
//! ```rust
//! use settlement_sim_core::models::{EventKind, EventScope, WorldEvent, EventId};
//!
//! let storm = WorldEvent::primary(EventId(1), EventKind::Storm, EventScope::Settlement, 6.5, 3);
//! assert!(storm.is_primary());
//! assert_eq!(storm.tone(), EventKind::Storm.base_tone());
//!
//! let kinds: Vec<EventKind> = EventKind::Storm
//!     .secondary_candidates()
//!     .iter()
//!     .map(|c| c.kind)
//!     .collect();
//! assert_eq!(kinds, vec![EventKind::Flood, EventKind::CropFailure]);
//! ```

use serde::{Deserialize, Serialize};

use crate::core::math::clamp_unit;
use crate::models::ids::{AgentId, EventId, FactionId};
use crate::models::registry::Identified;

/// Maximum impact level of any event
pub const MAX_IMPACT: f64 = 10.0;

/// Kind of world event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A leadership decision made public
    Decree,
    Storm,
    Flood,
    CropFailure,
    Shortage,
    Theft,
    Protest,
    Brawl,
    Fire,
    Injury,
    Disease,
    /// A faction acting on its own (rebellion, petition)
    FactionUprising,
    Harvest,
    Festival,
    Celebration,
    NewArrivals,
}

/// A possible follow-on event and how much of the parent's impact it keeps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondaryCandidate {
    pub kind: EventKind,
    pub impact_scale: f64,
}

const fn candidate(kind: EventKind, impact_scale: f64) -> SecondaryCandidate {
    SecondaryCandidate { kind, impact_scale }
}

const DECREE_FOLLOWUPS: &[SecondaryCandidate] = &[
    candidate(EventKind::Protest, 0.6),
    candidate(EventKind::Celebration, 0.5),
];
const STORM_FOLLOWUPS: &[SecondaryCandidate] = &[
    candidate(EventKind::Flood, 0.7),
    candidate(EventKind::CropFailure, 0.5),
];
const FLOOD_FOLLOWUPS: &[SecondaryCandidate] = &[candidate(EventKind::Disease, 0.5)];
const CROP_FAILURE_FOLLOWUPS: &[SecondaryCandidate] = &[candidate(EventKind::Shortage, 0.8)];
const SHORTAGE_FOLLOWUPS: &[SecondaryCandidate] = &[
    candidate(EventKind::Theft, 0.5),
    candidate(EventKind::Protest, 0.4),
];
const THEFT_FOLLOWUPS: &[SecondaryCandidate] = &[candidate(EventKind::Brawl, 0.5)];
const PROTEST_FOLLOWUPS: &[SecondaryCandidate] = &[candidate(EventKind::Brawl, 0.5)];
const FIRE_FOLLOWUPS: &[SecondaryCandidate] = &[
    candidate(EventKind::Shortage, 0.6),
    candidate(EventKind::Injury, 0.5),
];
const UPRISING_FOLLOWUPS: &[SecondaryCandidate] = &[
    candidate(EventKind::Protest, 0.7),
    candidate(EventKind::Brawl, 0.5),
];
const HARVEST_FOLLOWUPS: &[SecondaryCandidate] = &[candidate(EventKind::Festival, 0.5)];
const FESTIVAL_FOLLOWUPS: &[SecondaryCandidate] = &[candidate(EventKind::Celebration, 0.5)];

impl EventKind {
    /// Every kind, in catalog order
    pub const ALL: [EventKind; 16] = [
        EventKind::Decree,
        EventKind::Storm,
        EventKind::Flood,
        EventKind::CropFailure,
        EventKind::Shortage,
        EventKind::Theft,
        EventKind::Protest,
        EventKind::Brawl,
        EventKind::Fire,
        EventKind::Injury,
        EventKind::Disease,
        EventKind::FactionUprising,
        EventKind::Harvest,
        EventKind::Festival,
        EventKind::Celebration,
        EventKind::NewArrivals,
    ];

    /// Emotional tone in `[0, 1]`: 0 is distressing, 1 is uplifting
    pub fn base_tone(self) -> f64 {
        match self {
            EventKind::Decree => 0.5,
            EventKind::Storm => 0.2,
            EventKind::Flood => 0.15,
            EventKind::CropFailure => 0.2,
            EventKind::Shortage => 0.2,
            EventKind::Theft => 0.25,
            EventKind::Protest => 0.3,
            EventKind::Brawl => 0.2,
            EventKind::Fire => 0.1,
            EventKind::Injury => 0.2,
            EventKind::Disease => 0.1,
            EventKind::FactionUprising => 0.15,
            EventKind::Harvest => 0.8,
            EventKind::Festival => 0.9,
            EventKind::Celebration => 0.85,
            EventKind::NewArrivals => 0.6,
        }
    }

    /// Follow-on events this kind can trigger, in roll order
    pub fn secondary_candidates(self) -> &'static [SecondaryCandidate] {
        match self {
            EventKind::Decree => DECREE_FOLLOWUPS,
            EventKind::Storm => STORM_FOLLOWUPS,
            EventKind::Flood => FLOOD_FOLLOWUPS,
            EventKind::CropFailure => CROP_FAILURE_FOLLOWUPS,
            EventKind::Shortage => SHORTAGE_FOLLOWUPS,
            EventKind::Theft => THEFT_FOLLOWUPS,
            EventKind::Protest => PROTEST_FOLLOWUPS,
            EventKind::Fire => FIRE_FOLLOWUPS,
            EventKind::FactionUprising => UPRISING_FOLLOWUPS,
            EventKind::Harvest => HARVEST_FOLLOWUPS,
            EventKind::Festival => FESTIVAL_FOLLOWUPS,
            EventKind::Brawl
            | EventKind::Injury
            | EventKind::Disease
            | EventKind::Celebration
            | EventKind::NewArrivals => &[],
        }
    }

    /// Stable numeric code used by the state hasher
    pub fn code(self) -> u64 {
        self as u64
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Decree => "decree",
            EventKind::Storm => "storm",
            EventKind::Flood => "flood",
            EventKind::CropFailure => "crop_failure",
            EventKind::Shortage => "shortage",
            EventKind::Theft => "theft",
            EventKind::Protest => "protest",
            EventKind::Brawl => "brawl",
            EventKind::Fire => "fire",
            EventKind::Injury => "injury",
            EventKind::Disease => "disease",
            EventKind::FactionUprising => "faction_uprising",
            EventKind::Harvest => "harvest",
            EventKind::Festival => "festival",
            EventKind::Celebration => "celebration",
            EventKind::NewArrivals => "new_arrivals",
        }
    }
}

/// Who an event touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum EventScope {
    Settlement,
    Faction(FactionId),
    Agent(AgentId),
}

/// An immutable record of something that happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEvent {
    id: EventId,
    kind: EventKind,
    scope: EventScope,
    tone: f64,
    impact_level: f64,
    tick: u64,
    caused_by: Option<EventId>,
}

impl Identified for WorldEvent {
    type Id = EventId;

    fn id(&self) -> EventId {
        self.id
    }
}

impl WorldEvent {
    /// Build an event; tone is clamped to `[0, 1]`, impact to `[0, 10]`
    pub fn new(
        id: EventId,
        kind: EventKind,
        scope: EventScope,
        tone: f64,
        impact_level: f64,
        tick: u64,
        caused_by: Option<EventId>,
    ) -> Self {
        Self {
            id,
            kind,
            scope,
            tone: clamp_unit(tone),
            impact_level: clamp_impact(impact_level),
            tick,
            caused_by,
        }
    }

    /// A root event using the kind's base tone
    pub fn primary(id: EventId, kind: EventKind, scope: EventScope, impact_level: f64, tick: u64) -> Self {
        Self::new(id, kind, scope, kind.base_tone(), impact_level, tick, None)
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn scope(&self) -> EventScope {
        self.scope
    }

    pub fn tone(&self) -> f64 {
        self.tone
    }

    pub fn impact_level(&self) -> f64 {
        self.impact_level
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn caused_by(&self) -> Option<EventId> {
        self.caused_by
    }

    pub fn is_primary(&self) -> bool {
        self.caused_by.is_none()
    }
}

/// Clamp an impact level into `[0, MAX_IMPACT]`; NaN collapses to 0
pub fn clamp_impact(impact: f64) -> f64 {
    if impact.is_nan() {
        0.0
    } else {
        impact.clamp(0.0, MAX_IMPACT)
    }
}
