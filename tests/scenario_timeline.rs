//! ---
//! avsim_section: "15-testing-qa-runbook"
//! avsim_subsection: "integration-tests"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Built-in scenarios driven through the live tick loop."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use avsim_core::{SimMode, SimulationCoordinator};
use avsim_faults::FaultKind;
use avsim_model::FlightPhase;

fn tick_for(coordinator: &mut SimulationCoordinator, seconds: usize) {
    for _ in 0..seconds {
        coordinator.tick(1.0, false);
    }
}

#[test]
fn fuel_leak_scenario_builds_an_imbalance() {
    let mut coordinator = SimulationCoordinator::default();
    assert!(coordinator.run_scenario("FUEL_LEAK_CRUISE"));

    tick_for(&mut coordinator, 25);
    assert_eq!(coordinator.model().aircraft.phase, FlightPhase::Cruise);
    assert!(coordinator.active_faults().is_empty());

    tick_for(&mut coordinator, 10);
    let faults = coordinator.active_faults();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].kind, FaultKind::FuelLeak);

    tick_for(&mut coordinator, 60);
    assert!(coordinator.model().fuel.imbalance_kg() < 0.0);
    assert!(coordinator.snapshot().fuel.leaking);
}

#[test]
fn finished_scenario_leaves_a_complete_record() {
    let mut coordinator = SimulationCoordinator::default();
    assert!(coordinator.run_scenario("RAPID_DECOMPRESSION"));
    tick_for(&mut coordinator, 181);

    assert!(coordinator.scenario_status().is_none());
    let run = coordinator.injector().last_run().expect("finished run kept");
    assert_eq!(run.scenario().id, "RAPID_DECOMPRESSION");
    assert_eq!(run.fired().len(), 5);
    assert!(run.fired().iter().all(|action| action.accepted));
    assert!(coordinator.model().aircraft.altitude_ft < 35_000.0);
}

#[test]
fn scenario_start_leaves_replay() {
    let mut coordinator = SimulationCoordinator::default();
    assert!(coordinator.load_playback_source("TIME,IAS\n0,140\n1,150\n"));
    assert_eq!(coordinator.mode(), SimMode::Replay);

    assert!(coordinator.run_scenario("ENGINE_FIRE_CRUISE"));
    assert_eq!(coordinator.mode(), SimMode::Live);
    tick_for(&mut coordinator, 12);
    assert!(coordinator.model().engines[1].fire);
    assert_eq!(coordinator.scenario_status().map(|status| status.fired), Some(2));
}
