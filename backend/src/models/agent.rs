//! Agent (NPC) model
//!
//! Represents a settler living under the player's leadership.
//! Each agent has:
//! - A three-layer affect state (immediate emotion, short-term mood,
//!   long-term attitude), written only by the emotional model
//! - Loyalty to the leader, changed only by decision execution
//! - Traits read by the faction system (ambition, age, skills)
//! - A position owned by the spatial collaborator
//!
//! Advisors are ordinary agents with an [`AdvisorProfile`] component rather
//! than a separate type.
//!
//! CRITICAL: every scalar in `[0, 1]` is clamped on write.

use serde::{Deserialize, Serialize};

use crate::core::math::{clamp_unit, is_unit};
use crate::models::ids::AgentId;
use crate::models::registry::Identified;

/// The three-layer affect model, fast-to-slow
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffectState {
    pub immediate_emotion: f64,
    pub short_term_mood: f64,
    pub long_term_attitude: f64,
}

impl Default for AffectState {
    fn default() -> Self {
        Self {
            immediate_emotion: 0.5,
            short_term_mood: 0.5,
            long_term_attitude: 0.5,
        }
    }
}

impl AffectState {
    /// Build an affect state, clamping each layer into `[0, 1]`
    ///
    /// # Example
    /// ```
    /// use settlement_sim_core::models::AffectState;
    ///
    /// let affect = AffectState::new(1.4, 0.3, -0.1);
    /// assert_eq!(affect.immediate_emotion, 1.0);
    /// assert_eq!(affect.long_term_attitude, 0.0);
    /// ```
    pub fn new(immediate_emotion: f64, short_term_mood: f64, long_term_attitude: f64) -> Self {
        Self {
            immediate_emotion: clamp_unit(immediate_emotion),
            short_term_mood: clamp_unit(short_term_mood),
            long_term_attitude: clamp_unit(long_term_attitude),
        }
    }

    /// True when every layer is a finite value in `[0, 1]`
    pub fn is_within_bounds(&self) -> bool {
        is_unit(self.immediate_emotion)
            && is_unit(self.short_term_mood)
            && is_unit(self.long_term_attitude)
    }

    /// Copy of this state with every layer clamped
    pub fn clamped(&self) -> Self {
        Self::new(
            self.immediate_emotion,
            self.short_term_mood,
            self.long_term_attitude,
        )
    }
}

/// Point in settlement space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Move at most `max_step` along the straight line towards `target`
    ///
    /// # Example
    /// ```
    /// use settlement_sim_core::models::Position;
    ///
    /// let start = Position::new(0.0, 0.0, 0.0);
    /// let next = start.step_towards(&Position::new(10.0, 0.0, 0.0), 3.0);
    /// assert_eq!(next, Position::new(3.0, 0.0, 0.0));
    /// ```
    pub fn step_towards(&self, target: &Position, max_step: f64) -> Position {
        let distance = self.distance_to(target);
        if distance <= max_step || distance == 0.0 {
            return *target;
        }
        let ratio = max_step / distance;
        Position {
            x: self.x + (target.x - self.x) * ratio,
            y: self.y + (target.y - self.y) * ratio,
            z: self.z + (target.z - self.z) * ratio,
        }
    }
}

/// Area an advisor counsels on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisorSpecialty {
    Economy,
    Defense,
    Diplomacy,
    Faith,
    Welfare,
}

/// Capability component carried by agents that can give advice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorProfile {
    pub specialty: AdvisorSpecialty,
    /// How perceptive the advisor's counsel is, `[0, 1]`
    pub insight: f64,
}

impl AdvisorProfile {
    pub fn new(specialty: AdvisorSpecialty, insight: f64) -> Self {
        Self {
            specialty,
            insight: clamp_unit(insight),
        }
    }

    /// Urgency with which the advisor raises a problem of `severity`
    pub fn urgency(&self, severity: f64) -> f64 {
        clamp_unit(severity * (0.5 + 0.5 * self.insight))
    }
}

/// What an agent is, beyond being a settler
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentRole {
    #[default]
    Villager,
    Advisor(AdvisorProfile),
}

/// A settler in the simulation
///
/// # Example
/// ```
/// use settlement_sim_core::models::{Agent, AgentId, AdvisorProfile, AdvisorSpecialty, AgentRole};
///
/// let agent = Agent::new(AgentId(1), "Mira")
///     .with_loyalty(0.8)
///     .with_role(AgentRole::Advisor(AdvisorProfile::new(AdvisorSpecialty::Economy, 0.6)));
///
/// assert_eq!(agent.loyalty(), 0.8);
/// assert!(agent.as_advisor().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    id: AgentId,
    name: String,

    /// Written only by the emotional model during the emotion phase
    affect: AffectState,

    /// Loyalty to the leader, `[0, 1]`
    loyalty: f64,

    /// Drive to act on its own, `[0, 1]`
    ambition: f64,

    /// Age in years
    age: f64,

    skills: Vec<String>,

    /// Temperament offset in the immediate-emotion formula, `[0, 1]`
    emotional_bias: f64,

    position: Position,

    /// Where the spatial collaborator should steer this agent
    #[serde(default)]
    destination: Option<Position>,

    /// Agents within proximity radius at the last proximity check (ID order)
    #[serde(default)]
    nearby: Vec<AgentId>,

    #[serde(default)]
    role: AgentRole,
}

impl Identified for Agent {
    type Id = AgentId;

    fn id(&self) -> AgentId {
        self.id
    }
}

impl Agent {
    /// Create a new agent with neutral traits
    pub fn new(id: AgentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            affect: AffectState::default(),
            loyalty: 0.5,
            ambition: 0.5,
            age: 25.0,
            skills: Vec::new(),
            emotional_bias: 0.5,
            position: Position::default(),
            destination: None,
            nearby: Vec::new(),
            role: AgentRole::Villager,
        }
    }

    pub fn with_affect(mut self, affect: AffectState) -> Self {
        self.affect = affect.clamped();
        self
    }

    pub fn with_loyalty(mut self, loyalty: f64) -> Self {
        self.loyalty = clamp_unit(loyalty);
        self
    }

    pub fn with_ambition(mut self, ambition: f64) -> Self {
        self.ambition = clamp_unit(ambition);
        self
    }

    pub fn with_age(mut self, age: f64) -> Self {
        self.age = age.max(0.0);
        self
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_emotional_bias(mut self, bias: f64) -> Self {
        self.emotional_bias = clamp_unit(bias);
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_destination(mut self, destination: Position) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_role(mut self, role: AgentRole) -> Self {
        self.role = role;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn affect(&self) -> &AffectState {
        &self.affect
    }

    pub fn loyalty(&self) -> f64 {
        self.loyalty
    }

    pub fn ambition(&self) -> f64 {
        self.ambition
    }

    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }

    pub fn emotional_bias(&self) -> f64 {
        self.emotional_bias
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn destination(&self) -> Option<Position> {
        self.destination
    }

    pub fn nearby(&self) -> &[AgentId] {
        &self.nearby
    }

    pub fn role(&self) -> &AgentRole {
        &self.role
    }

    /// Advisor component, if this agent can give advice
    pub fn as_advisor(&self) -> Option<&AdvisorProfile> {
        match &self.role {
            AgentRole::Advisor(profile) => Some(profile),
            AgentRole::Villager => None,
        }
    }

    pub fn is_advisor(&self) -> bool {
        self.as_advisor().is_some()
    }

    /// Set loyalty to the leader, clamped to `[0, 1]`
    ///
    /// This is the decision-execution entry point; the faction system only
    /// reads loyalty.
    pub fn set_loyalty(&mut self, loyalty: f64) {
        self.loyalty = clamp_unit(loyalty);
    }

    /// Adjust loyalty by `delta`, returning the clamped new value
    pub fn adjust_loyalty(&mut self, delta: f64) -> f64 {
        self.set_loyalty(self.loyalty + delta);
        self.loyalty
    }

    pub fn set_destination(&mut self, destination: Option<Position>) {
        self.destination = destination;
    }

    /// Store a newly computed affect state; only the emotion phase and the
    /// validation sweep call this
    pub(crate) fn set_affect(&mut self, affect: AffectState) {
        self.affect = affect.clamped();
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub(crate) fn set_nearby(&mut self, nearby: Vec<AgentId>) {
        self.nearby = nearby;
    }
}
