//! Orchestrator Engine
//!
//! Main simulation loop integrating all components:
//! - Movement (spatial collaborator)
//! - Emotion and faction updates
//! - Problem detection and dialogue requests
//! - Decision execution, event creation and cascades
//! - World-state diffs for the narrative layer
//! - Replay logging and state hashing
//!
//! # Architecture
//!
//! ```text
//! For each tick t:
//!  1. TickStart                re-seed RNG from global_seed + t
//!  2. PositionsUpdated         apply moves from the spatial system
//!  3. EmotionsUpdated          affect layers, then faction aggregates
//!  4. ProblemsChecked          severity vs last check, dialogue requests
//!  5. ProximityChecked         social contacts within the radius
//!  6. InputProcessed           the pending decision, its decree and cascade
//!  7. WorldStateChecked        diff vs last check, snapshot to the narrative queue
//!  8. ContinuousEventsChecked  scheduled, injected, emergence and shortage events
//!  9. EmotionValidated         bounds sweep (validation ticks only)
//! 10. PreviousStateRefreshed   refresh the previous-state cache
//! 11. TickEnd                  state hash, advance time
//! ```
//!
//! # Example
//!
//! ```rust
//! use settlement_sim_core::models::{Agent, AgentId, SimulationState};
//! use settlement_sim_core::{Orchestrator, SimulationConfig};
//!
//! let mut state = SimulationState::new();
//! state.add_agent(Agent::new(AgentId(1), "Ada")).unwrap();
//!
//! let mut orchestrator = Orchestrator::new(SimulationConfig::with_seed(12345), state).unwrap();
//! let result = orchestrator.tick();
//! assert_eq!(result.tick, 0);
//! assert_eq!(orchestrator.current_tick(), 1);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::cascade::EventCascade;
use crate::core::config::SimulationConfig;
use crate::core::time::TimeManager;
use crate::decisions::{check_decision, execute_decision, DecisionOutcome};
use crate::emotion::{validate_bounds, BoundsCorrection, EmotionalModel};
use crate::events::{EventSpec, ScenarioEventHandler, ScheduledEvent};
use crate::factions::FactionSystem;
use crate::models::decision::Decision;
use crate::models::event::{EventKind, EventScope};
use crate::models::ids::{EventId, FactionId};
use crate::models::registry::Identified;
use crate::models::state::SimulationState;
use crate::narrative::{NarrativeMessage, NarrativeQueue};
use crate::orchestrator::checkpoint::{validate_checkpoint, Checkpoint};
use crate::orchestrator::phase::TickPhase;
use crate::orchestrator::SimulationError;
use crate::problems::{DialogueRequest, ProblemSystem};
use crate::replay::{InputScript, Operation, Recording, ReplayLog, ScriptedInput, StateHasher};
use crate::rng::RngManager;
use crate::spatial::{apply_moves, update_proximity, SpatialSystem, Stationary};
use crate::tracking::{scarcity_crossings, PreviousStateCache, WorldStateSnapshot, WorldStateTracker};

// ============================================================================
// Run control
// ============================================================================

/// Shared flag that stops [`Orchestrator::run`] between ticks
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of a single tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickResult {
    /// Tick number
    pub tick: u64,

    /// Phases entered, in order
    pub phases: Vec<TickPhase>,

    /// Fingerprint of the state at TickEnd
    pub state_hash: u64,

    /// Agents the spatial system moved
    pub agents_moved: usize,

    /// Agents whose immediate emotion was recomputed from a stimulus
    pub agents_stimulated: usize,

    pub dialogue_requests: Vec<DialogueRequest>,

    /// Every event created this tick (primaries and cascades), in ID order
    pub events_created: Vec<EventId>,

    /// Snapshot pushed to the narrative queue, if anything was significant
    pub snapshot: Option<WorldStateSnapshot>,

    pub decision: Option<DecisionOutcome>,

    /// Values pulled back into range by the validation sweep
    pub corrections: Vec<BoundsCorrection>,
}

impl TickResult {
    pub fn snapshot_emitted(&self) -> bool {
        self.snapshot.is_some()
    }
}

/// Result of [`Orchestrator::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks_run: u64,
    /// Tick the orchestrator will execute next
    pub next_tick: u64,
    pub last_hash: Option<u64>,
    /// True when the stop signal ended the run
    pub stopped: bool,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Main orchestrator owning simulation state and the tick loop
///
/// # Determinism
///
/// All randomness is via `rng` with seeded xorshift64*, re-seeded from
/// `global_seed + tick` at the start of every tick. Same seed + same config
/// + same input = identical state hashes at every tick.
pub struct Orchestrator {
    config: SimulationConfig,
    config_hash: String,

    /// Agents, factions, resources and the event forest
    state: SimulationState,

    time: TimeManager,
    rng: RngManager,
    phase: TickPhase,

    emotional_model: EmotionalModel,
    faction_system: FactionSystem,
    problem_system: ProblemSystem,
    cascade: EventCascade,
    tracker: WorldStateTracker,
    previous: PreviousStateCache,

    spatial: Box<dyn SpatialSystem>,
    narrative: NarrativeQueue,
    scenario: ScenarioEventHandler,

    /// Decision for the coming tick (at most one)
    pending_decision: Option<Decision>,
    /// Events injected for the coming tick, in submission order
    pending_injections: Vec<EventSpec>,
    /// Events created since the last emotion phase
    pending_stimuli: Vec<EventId>,

    log: ReplayLog,
    script: InputScript,
    /// State the recorded run starts from; taken at the first tick unless
    /// resumed from a checkpoint
    start: Option<Checkpoint>,
}

impl Orchestrator {
    /// Create new orchestrator owning `state`
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Successfully initialized orchestrator
    /// * `Err(SimulationError)` - Configuration or state validation failed
    pub fn new(config: SimulationConfig, state: SimulationState) -> Result<Self, SimulationError> {
        config.validate()?;
        let config_hash = config.fingerprint()?;
        let previous = PreviousStateCache::capture(&state);
        let tracker = WorldStateTracker::new(&config.thresholds).with_watermark(state.next_event_id());

        let orchestrator = Self::assemble(config, config_hash, state, 0, previous, tracker)?;
        validate_checkpoint(&orchestrator.capture_start())?;

        info!(
            agents = orchestrator.state.num_agents(),
            factions = orchestrator.state.num_factions(),
            seed = orchestrator.config.global_seed,
            run_id = %orchestrator.log.header().run_id,
            "orchestrator initialized"
        );
        Ok(orchestrator)
    }

    /// Resume from a checkpoint taken under the same config
    pub fn from_checkpoint(config: SimulationConfig, checkpoint: Checkpoint) -> Result<Self, SimulationError> {
        config.validate()?;
        let config_hash = config.fingerprint()?;
        if checkpoint.config_hash != config_hash {
            return Err(SimulationError::StateValidationError(format!(
                "checkpoint was taken under config {}, not {}",
                checkpoint.config_hash, config_hash
            )));
        }
        validate_checkpoint(&checkpoint)?;

        let tracker = WorldStateTracker::new(&config.thresholds)
            .with_watermark(checkpoint.reported_watermark)
            .with_scarcity(checkpoint.reported_scarcity.clone());
        let mut orchestrator = Self::assemble(
            config,
            config_hash,
            checkpoint.state.clone(),
            checkpoint.tick,
            checkpoint.previous.clone(),
            tracker,
        )?;
        orchestrator.pending_stimuli = checkpoint.pending_stimuli.clone();
        orchestrator.pending_injections = checkpoint.pending_injections.clone();
        orchestrator.pending_decision = checkpoint.pending_decision.clone();
        orchestrator.start = Some(checkpoint);

        info!(
            tick = orchestrator.current_tick(),
            agents = orchestrator.state.num_agents(),
            "orchestrator resumed from checkpoint"
        );
        Ok(orchestrator)
    }

    fn assemble(
        config: SimulationConfig,
        config_hash: String,
        state: SimulationState,
        tick: u64,
        previous: PreviousStateCache,
        tracker: WorldStateTracker,
    ) -> Result<Self, SimulationError> {
        Ok(Self {
            time: TimeManager::starting_at(tick, config.validation_interval)?,
            rng: RngManager::for_tick(config.global_seed, tick),
            phase: TickPhase::Idle,
            emotional_model: EmotionalModel::new(config.emotion.clone()),
            faction_system: FactionSystem::new(config.faction.clone()),
            problem_system: ProblemSystem::new(config.thresholds.dialogue),
            cascade: EventCascade::new(config.cascade.factor),
            tracker,
            previous,
            spatial: Box::new(Stationary),
            narrative: NarrativeQueue::disconnected(),
            scenario: ScenarioEventHandler::default(),
            pending_decision: None,
            pending_injections: Vec::new(),
            pending_stimuli: Vec::new(),
            log: ReplayLog::new(config_hash.clone(), config.global_seed),
            script: InputScript::new(),
            start: None,
            config,
            config_hash,
            state,
        })
    }

    pub fn with_spatial(mut self, spatial: Box<dyn SpatialSystem>) -> Self {
        debug!(spatial = spatial.name(), "spatial system attached");
        self.spatial = spatial;
        self
    }

    pub fn with_narrative(mut self, narrative: NarrativeQueue) -> Self {
        self.narrative = narrative;
        self
    }

    /// Attach scheduled scenario events; every reference must resolve now
    pub fn with_schedule(mut self, schedule: Vec<ScheduledEvent>) -> Result<Self, SimulationError> {
        let handler = ScenarioEventHandler::new(schedule);
        handler.validate(&self.state)?;
        self.scenario = handler;
        Ok(self)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Tick the next call to [`tick`](Self::tick) executes
    pub fn current_tick(&self) -> u64 {
        self.time.current_tick()
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Mutable access to the state between ticks
    ///
    /// Edits made before the first tick become part of the recorded starting
    /// state. Later edits bypass the input script and will not replay.
    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn phase(&self) -> TickPhase {
        self.phase
    }

    pub fn previous_state(&self) -> &PreviousStateCache {
        &self.previous
    }

    pub fn replay_log(&self) -> &ReplayLog {
        &self.log
    }

    pub fn input_script(&self) -> &InputScript {
        &self.script
    }

    pub fn narrative(&self) -> &NarrativeQueue {
        &self.narrative
    }

    /// Events waiting to be felt in the next emotion phase
    pub fn pending_stimuli(&self) -> &[EventId] {
        &self.pending_stimuli
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Queue the player's decision for the coming tick
    ///
    /// At most one decision is accepted per tick; a second is rejected with
    /// [`SimulationError::InputRejected`].
    pub fn submit_decision(&mut self, decision: Decision) -> Result<(), SimulationError> {
        let tick = self.current_tick();
        if self.pending_decision.is_some() {
            return Err(SimulationError::InputRejected {
                tick,
                reason: "a decision is already pending for this tick".to_string(),
            });
        }
        check_decision(&decision, &self.state)?;

        debug!(tick, action = ?decision.action, target = ?decision.target, "decision queued");
        self.script.record(tick, ScriptedInput::Decision(decision.clone()));
        self.pending_decision = Some(decision);
        Ok(())
    }

    /// Queue a primary event for the coming tick's continuous-event phase
    pub fn inject_event(&mut self, spec: EventSpec) -> Result<(), SimulationError> {
        spec.check_references(&self.state)?;
        let tick = self.current_tick();

        debug!(tick, kind = spec.kind.as_str(), "event injected");
        self.script.record(tick, ScriptedInput::Injection(spec.clone()));
        self.pending_injections.push(spec);
        Ok(())
    }

    // ========================================================================
    // Tick Loop Implementation
    // ========================================================================

    /// Execute one simulation tick
    ///
    /// Every phase runs to completion; a tick cannot fail part-way. Bounds
    /// violations are clamped and missing references skipped, both logged.
    pub fn tick(&mut self) -> TickResult {
        if self.start.is_none() {
            // Baseline a fresh run on the state as it stands now
            self.previous = PreviousStateCache::capture(&self.state);
            self.start = Some(self.capture_start());
        }

        let tick = self.time.current_tick();
        let validation_tick = self.time.is_validation_tick();
        let mut phases = Vec::with_capacity(11);

        // TickStart
        self.enter(TickPhase::TickStart, validation_tick, &mut phases);
        self.rng.reseed_for_tick(self.config.global_seed, tick);
        self.log.append(
            tick,
            Operation::TickSeed,
            json!({ "global_seed": self.config.global_seed, "tick": tick }),
            json!(self.rng.seed()),
        );

        // PositionsUpdated
        self.enter(TickPhase::PositionsUpdated, validation_tick, &mut phases);
        let moves = self.spatial.next_positions(self.state.agents(), tick);
        let agents_moved = apply_moves(&mut self.state, moves);

        // EmotionsUpdated
        self.enter(TickPhase::EmotionsUpdated, validation_tick, &mut phases);
        let stimuli = std::mem::take(&mut self.pending_stimuli);
        let agents_stimulated =
            self.emotional_model
                .update_all(&mut self.state, &self.previous, &stimuli, tick, &mut self.log);
        self.faction_system.update_all(&mut self.state, tick, &mut self.log);

        // ProblemsChecked
        self.enter(TickPhase::ProblemsChecked, validation_tick, &mut phases);
        let dialogue_requests = self
            .problem_system
            .check_all(&self.state, &self.previous, tick, &mut self.log);
        self.previous.settle_loyalty(&self.state);
        for request in &dialogue_requests {
            self.narrative.publish(NarrativeMessage::Dialogue(request.clone()));
        }

        // ProximityChecked
        self.enter(TickPhase::ProximityChecked, validation_tick, &mut phases);
        update_proximity(&mut self.state, self.config.proximity_radius);

        // InputProcessed
        self.enter(TickPhase::InputProcessed, validation_tick, &mut phases);
        let mut events_created = Vec::new();
        let decision = self.process_decision(tick, &mut events_created);

        // WorldStateChecked
        self.enter(TickPhase::WorldStateChecked, validation_tick, &mut phases);
        let snapshot = self.tracker.check(&self.state, &self.previous, tick);
        if let Some(snapshot) = &snapshot {
            self.narrative.publish(NarrativeMessage::Snapshot(snapshot.clone()));
        }

        // ContinuousEventsChecked
        self.enter(TickPhase::ContinuousEventsChecked, validation_tick, &mut phases);
        self.process_continuous_events(tick, &mut events_created);
        self.pending_stimuli.extend(events_created.iter().copied());

        // EmotionValidated
        let corrections = if validation_tick {
            self.enter(TickPhase::EmotionValidated, validation_tick, &mut phases);
            validate_bounds(&mut self.state, tick, &mut self.log)
        } else {
            Vec::new()
        };

        // PreviousStateRefreshed
        self.enter(TickPhase::PreviousStateRefreshed, validation_tick, &mut phases);
        self.previous.refresh(&self.state);

        // TickEnd
        self.enter(TickPhase::TickEnd, validation_tick, &mut phases);
        let state_hash = StateHasher::calculate_hash(&self.state);
        self.log
            .append(tick, Operation::StateHash, json!(null), json!(state_hash));
        self.time.advance_tick();
        self.phase = TickPhase::Idle;

        debug!(
            tick,
            hash = state_hash,
            events = events_created.len(),
            dialogues = dialogue_requests.len(),
            "tick complete"
        );

        TickResult {
            tick,
            phases,
            state_hash,
            agents_moved,
            agents_stimulated,
            dialogue_requests,
            events_created,
            snapshot,
            decision,
            corrections,
        }
    }

    /// Run ticks until `max_ticks` have run or `stop` is set
    ///
    /// The stop signal is checked between ticks only.
    pub fn run(&mut self, max_ticks: u64, stop: &StopSignal) -> RunSummary {
        let mut summary = RunSummary {
            ticks_run: 0,
            next_tick: self.current_tick(),
            last_hash: None,
            stopped: false,
        };

        while summary.ticks_run < max_ticks {
            if stop.is_stopped() {
                summary.stopped = true;
                break;
            }
            let result = self.tick();
            summary.ticks_run += 1;
            summary.last_hash = Some(result.state_hash);
        }

        summary.next_tick = self.current_tick();
        info!(ticks = summary.ticks_run, stopped = summary.stopped, "run finished");
        summary
    }

    fn enter(&mut self, phase: TickPhase, validation_tick: bool, trace: &mut Vec<TickPhase>) {
        debug_assert_eq!(self.phase.next(validation_tick), phase, "phase out of order");
        self.phase = phase;
        trace.push(phase);
    }

    fn process_decision(&mut self, tick: u64, created: &mut Vec<EventId>) -> Option<DecisionOutcome> {
        let decision = self.pending_decision.take()?;
        match execute_decision(&decision, &mut self.state, &self.config.decision, tick, &mut self.log) {
            Ok(outcome) => {
                created.extend(self.create_primary(&outcome.decree, tick));
                Some(outcome)
            }
            Err(e) => {
                warn!(tick, error = %e, "discarding decision that no longer applies");
                None
            }
        }
    }

    fn process_continuous_events(&mut self, tick: u64, created: &mut Vec<EventId>) {
        let mut specs = self.scenario.execute_tick_events(&mut self.state, tick, &mut self.log);
        specs.append(&mut self.pending_injections);
        for spec in &specs {
            created.extend(self.create_primary(spec, tick));
        }

        // Factions close to breaking away roll for unilateral action
        let threshold = self.config.faction.emergence_action_threshold;
        let restless: Vec<(FactionId, f64)> = self
            .state
            .factions()
            .get_all()
            .filter(|f| f.emergence_probability() >= threshold)
            .map(|f| (f.id(), f.emergence_probability()))
            .collect();
        for (faction, probability) in restless {
            let draw = self.rng.next_f64();
            let triggered = draw < probability;
            self.log.append(
                tick,
                Operation::EmergenceRoll,
                json!({ "seed": self.rng.seed(), "faction": faction.raw(), "probability": probability }),
                json!({ "draw": draw, "triggered": triggered }),
            );
            if triggered {
                info!(tick, faction_id = %faction, probability, "faction acts on its own");
                let spec = EventSpec::new(EventKind::FactionUprising, EventScope::Faction(faction), 10.0 * probability);
                created.extend(self.create_primary(&spec, tick));
            }
        }

        for change in scarcity_crossings(&self.state, &self.previous) {
            if !change.now_scarce {
                continue;
            }
            let impact = if change.threshold > 0.0 {
                10.0 * (1.0 - change.quantity / change.threshold)
            } else {
                0.0
            };
            debug!(tick, resource_id = %change.resource, quantity = change.quantity, "resource became scarce");
            let spec = EventSpec::new(EventKind::Shortage, EventScope::Settlement, impact);
            created.extend(self.create_primary(&spec, tick));
        }
    }

    /// Record a primary event and cascade it; returns every created ID
    fn create_primary(&mut self, spec: &EventSpec, tick: u64) -> Vec<EventId> {
        let id = self
            .state
            .record_event(spec.kind, spec.scope, spec.tone_or_base(), spec.impact, tick, None);
        let impact = self.state.get_event(id).map_or(0.0, |e| e.impact_level());
        self.log.append(
            tick,
            Operation::EventCreated,
            json!({ "kind": spec.kind.as_str(), "impact": impact, "caused_by": null }),
            json!(id.raw()),
        );

        let mut created = vec![id];
        created.extend(
            self.cascade
                .expand(&mut self.state, id, &mut self.rng, tick, &mut self.log),
        );
        created
    }

    // ========================================================================
    // Checkpoints and recordings
    // ========================================================================

    /// Snapshot the orchestrator between ticks
    pub fn save_checkpoint(&self) -> Checkpoint {
        Checkpoint {
            tick: self.current_tick(),
            config_hash: self.config_hash.clone(),
            state: self.state.clone(),
            previous: self.previous.clone(),
            pending_stimuli: self.pending_stimuli.clone(),
            pending_injections: self.pending_injections.clone(),
            pending_decision: self.pending_decision.clone(),
            reported_watermark: self.tracker.watermark(),
            reported_scarcity: self.tracker.scarcity().clone(),
        }
    }

    /// Starting checkpoint without the queued input the script already holds
    fn capture_start(&self) -> Checkpoint {
        Checkpoint {
            pending_injections: Vec::new(),
            pending_decision: None,
            ..self.save_checkpoint()
        }
    }

    /// Everything needed to replay this run from its start
    pub fn recording(&self) -> Recording {
        Recording {
            config: self.config.clone(),
            start: self.start.clone().unwrap_or_else(|| self.capture_start()),
            schedule: self.scenario.scheduled().to_vec(),
            script: self.script.clone(),
            log: self.log.clone(),
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("current_tick", &self.current_tick())
            .field("phase", &self.phase)
            .field("num_agents", &self.state.num_agents())
            .field("num_factions", &self.state.num_factions())
            .field("num_events", &self.state.num_events())
            .field("spatial", &self.spatial.name())
            .field("log_entries", &self.log.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Agent, AgentId, DecisionAction, DecisionTarget, Faction, Resource, ResourceId};

    fn settlement() -> SimulationState {
        let mut state = SimulationState::new();
        for id in 1..=3 {
            state
                .add_agent(Agent::new(AgentId(id), format!("settler {}", id)).with_loyalty(0.6))
                .unwrap();
        }
        state
            .add_faction(Faction::new(FactionId(1), "Millers").with_members([AgentId(1), AgentId(2)]))
            .unwrap();
        state
            .add_resource(Resource::new(ResourceId(1), "grain", 20.0, 5.0))
            .unwrap();
        state
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(SimulationConfig::with_seed(7), settlement()).unwrap()
    }

    #[test]
    fn test_tick_zero_runs_validation_phase() {
        let mut orch = orchestrator();
        let result = orch.tick();
        assert_eq!(result.phases, TickPhase::sequence(true));
        assert_eq!(orch.phase(), TickPhase::Idle);

        let result = orch.tick();
        assert_eq!(result.phases, TickPhase::sequence(false));
    }

    #[test]
    fn test_second_decision_is_rejected() {
        let mut orch = orchestrator();
        let address = Decision::new(DecisionAction::Address, DecisionTarget::Settlement, 1.0, 0.9);
        orch.submit_decision(address.clone()).unwrap();
        let err = orch.submit_decision(address).unwrap_err();
        assert!(matches!(err, SimulationError::InputRejected { tick: 0, .. }));
    }

    #[test]
    fn test_decision_creates_decree_and_stimulus() {
        let mut orch = orchestrator();
        orch.submit_decision(Decision::new(
            DecisionAction::Address,
            DecisionTarget::Settlement,
            1.0,
            0.9,
        ))
        .unwrap();

        let result = orch.tick();
        let decree = result.events_created[0];
        assert_eq!(orch.state().get_event(decree).unwrap().kind(), EventKind::Decree);
        assert!(result.decision.is_some());
        assert_eq!(orch.pending_stimuli(), result.events_created.as_slice());

        // Felt in the next emotion phase
        let next = orch.tick();
        assert_eq!(next.agents_stimulated, 3);
    }

    #[test]
    fn test_injected_event_scope_must_exist() {
        let mut orch = orchestrator();
        let spec = EventSpec::new(EventKind::Fire, EventScope::Faction(FactionId(9)), 4.0);
        assert!(matches!(
            orch.inject_event(spec),
            Err(SimulationError::FactionNotFound(FactionId(9)))
        ));
        assert!(orch.input_script().is_empty());
    }

    #[test]
    fn test_every_tick_logs_seed_and_hash() {
        let mut orch = orchestrator();
        for _ in 0..3 {
            orch.tick();
        }
        let seeds: Vec<_> = orch.replay_log().entries_of(Operation::TickSeed).map(|e| e.result.clone()).collect();
        assert_eq!(seeds, vec![json!(7), json!(8), json!(9)]);
        assert_eq!(orch.replay_log().state_hashes().len(), 3);
    }

    #[test]
    fn test_run_honours_stop_signal() {
        let mut orch = orchestrator();
        let stop = StopSignal::new();
        let summary = orch.run(5, &stop);
        assert_eq!(summary.ticks_run, 5);
        assert!(!summary.stopped);

        stop.stop();
        let summary = orch.run(5, &stop);
        assert_eq!(summary.ticks_run, 0);
        assert!(summary.stopped);
        assert_eq!(summary.next_tick, 5);
    }

    #[test]
    fn test_scarcity_crossing_creates_shortage() {
        let mut orch = orchestrator();
        orch.tick();
        orch.state_mut().get_resource_mut(ResourceId(1)).unwrap().adjust(-18.0);

        let result = orch.tick();
        let kinds: Vec<EventKind> = result
            .events_created
            .iter()
            .map(|id| orch.state().get_event(*id).unwrap().kind())
            .collect();
        assert_eq!(kinds.first(), Some(&EventKind::Shortage));
        // quantity 2 against threshold 5
        let shortage = orch.state().get_event(result.events_created[0]).unwrap();
        assert!((shortage.impact_level() - 6.0).abs() < 1e-12);
    }
}
