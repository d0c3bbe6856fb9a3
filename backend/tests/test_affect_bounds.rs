//! Affect bounds tests
//!
//! Every affect layer and loyalty stays in [0, 1] whatever the event stream;
//! values that arrive out of range are healed by the validation sweep.

use proptest::prelude::*;
use settlement_sim_core::events::EventSpec;
use settlement_sim_core::models::{
    AffectState, Agent, AgentId, EventKind, EventScope, Faction, FactionId, Identified, Position, SimulationState,
};
use settlement_sim_core::replay::Operation;
use settlement_sim_core::{Checkpoint, Orchestrator, SimulationConfig};

const KINDS: [EventKind; 6] = [
    EventKind::Storm,
    EventKind::Harvest,
    EventKind::Fire,
    EventKind::Festival,
    EventKind::Protest,
    EventKind::Theft,
];

fn settlement(agents: &[(f64, f64, f64, f64, f64)]) -> SimulationState {
    let mut state = SimulationState::new();
    for (i, &(immediate, mood, attitude, loyalty, bias)) in agents.iter().enumerate() {
        state
            .add_agent(
                Agent::new(AgentId(i as u64 + 1), format!("settler {}", i + 1))
                    .with_affect(AffectState::new(immediate, mood, attitude))
                    .with_loyalty(loyalty)
                    .with_emotional_bias(bias)
                    .with_position(Position::new(i as f64, 0.0, 0.0)),
            )
            .unwrap();
    }
    let members: Vec<AgentId> = (1..=agents.len() as u64).step_by(2).map(AgentId).collect();
    state
        .add_faction(Faction::new(FactionId(1), "Odd lot").with_members(members))
        .unwrap();
    state
}

fn assert_in_unit(state: &SimulationState) -> Result<(), TestCaseError> {
    for agent in state.agents().get_all() {
        let a = agent.affect();
        for (name, value) in [
            ("immediate_emotion", a.immediate_emotion),
            ("short_term_mood", a.short_term_mood),
            ("long_term_attitude", a.long_term_attitude),
            ("loyalty", agent.loyalty()),
        ] {
            prop_assert!((0.0..=1.0).contains(&value), "agent {} {} = {}", agent.id(), name, value);
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn property_affect_stays_in_unit_interval(
        seed in any::<u64>(),
        agents in prop::collection::vec(
            (0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64),
            1..8,
        ),
        events in prop::collection::vec((0usize..6, 0.0..=10.0f64, 0.0..=1.0f64, 0u64..20), 0..12),
    ) {
        let config = SimulationConfig {
            validation_interval: 7,
            ..SimulationConfig::with_seed(seed)
        };
        let mut orch = Orchestrator::new(config, settlement(&agents)).unwrap();

        for tick in 0..20u64 {
            for &(kind, impact, tone, at) in &events {
                if at == tick {
                    orch.inject_event(EventSpec::new(KINDS[kind], EventScope::Settlement, impact).with_tone(tone))
                        .unwrap();
                }
            }
            let result = orch.tick();
            // The model clamps as it goes, so the sweep finds nothing
            prop_assert!(result.corrections.is_empty());
            assert_in_unit(orch.state())?;
        }
    }

    #[test]
    fn property_same_seed_same_hashes(seed in any::<u64>(), ticks in 1u64..15) {
        let agents = [(0.2, 0.4, 0.6, 0.8, 0.3), (0.9, 0.1, 0.5, 0.2, 0.7), (0.5, 0.5, 0.5, 0.5, 0.5)];
        let run = || {
            let mut orch = Orchestrator::new(SimulationConfig::with_seed(seed), settlement(&agents)).unwrap();
            orch.inject_event(EventSpec::new(EventKind::Storm, EventScope::Settlement, 9.0)).unwrap();
            (0..ticks).map(|_| orch.tick().state_hash).collect::<Vec<u64>>()
        };
        prop_assert_eq!(run(), run());
    }
}

/// Rewrite agent loyalties straight in the serialized state
fn with_raw_loyalty(checkpoint: Checkpoint, loyalties: &[(usize, f64)]) -> Checkpoint {
    let mut value = serde_json::to_value(&checkpoint).unwrap();
    for &(index, loyalty) in loyalties {
        value["state"]["agents"][index]["loyalty"] = serde_json::json!(loyalty);
    }
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_out_of_range_loyalty_is_healed_on_validation_tick() {
    let config = SimulationConfig {
        validation_interval: 3,
        ..SimulationConfig::with_seed(5)
    };
    let mut orch = Orchestrator::new(config.clone(), settlement(&[(0.5, 0.5, 0.5, 0.5, 0.5); 3])).unwrap();
    orch.tick();

    let checkpoint = with_raw_loyalty(orch.save_checkpoint(), &[(0, 1.4), (2, -0.2)]);
    let mut resumed = Orchestrator::from_checkpoint(config, checkpoint).unwrap();
    assert_eq!(resumed.state().get_agent(AgentId(1)).unwrap().loyalty(), 1.4);

    // Ticks 1 and 2 run no sweep
    for _ in 0..2 {
        assert!(resumed.tick().corrections.is_empty());
    }
    assert_eq!(resumed.state().get_agent(AgentId(1)).unwrap().loyalty(), 1.4);

    let result = resumed.tick();
    assert_eq!(result.tick, 3);
    assert_eq!(result.corrections.len(), 2);

    let first = &result.corrections[0];
    assert_eq!(first.agent, AgentId(1));
    assert_eq!(first.field, "loyalty");
    assert_eq!(first.before, 1.4);
    assert_eq!(first.after, 1.0);
    let second = &result.corrections[1];
    assert_eq!(second.agent, AgentId(3));
    assert_eq!(second.after, 0.0);

    assert_eq!(resumed.state().get_agent(AgentId(1)).unwrap().loyalty(), 1.0);
    assert_eq!(resumed.state().get_agent(AgentId(3)).unwrap().loyalty(), 0.0);

    let logged: Vec<_> = resumed.replay_log().entries_of(Operation::BoundsCorrection).collect();
    assert_eq!(logged.len(), 2);
    assert_eq!(logged[0].tick, 3);
    assert_eq!(logged[0].parameters["field"], "loyalty");
    assert_eq!(logged[0].result, serde_json::json!(1.0));
}

#[test]
fn test_out_of_range_state_at_start_is_healed_at_tick_zero() {
    let mut state = settlement(&[(0.5, 0.5, 0.5, 0.5, 0.5)]);
    let mut value = serde_json::to_value(&state).unwrap();
    value["agents"][0]["loyalty"] = serde_json::json!(1.4);
    state = serde_json::from_value(value).unwrap();

    let mut orch = Orchestrator::new(SimulationConfig::with_seed(5), state).unwrap();
    let result = orch.tick();

    assert_eq!(result.corrections.len(), 1);
    assert_eq!(orch.state().get_agent(AgentId(1)).unwrap().loyalty(), 1.0);
}
