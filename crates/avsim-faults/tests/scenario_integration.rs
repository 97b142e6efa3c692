//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "faults"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Scenario runner and injector integration checks."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use std::io::Write;

use avsim_faults::{FaultInjector, ScenarioDefinition, ScenarioError, ScenarioLibrary};
use avsim_metrics::{new_registry, SimulationMetrics};
use avsim_model::{AircraftModel, EngineId};

const TRAINING: &str = r#"
    id = "MIXED_DRILL"
    name = "Mixed systems drill"
    description = "Several faults and cues on one timeline."
    duration_s = 90
    success_criteria = ["Identify every failure"]

    [[timeline]]
    at_s = 0
    type = "set_phase"
    phase = "CRUISE"

    [[timeline]]
    at_s = 12.5
    type = "inject_fault"
    fault = "GEN_FAILURE"
    target = "gen2"

    [[timeline]]
    at_s = 12.5
    type = "message"
    text = "Generator 2 offline"

    [[timeline]]
    at_s = 40
    type = "set_thrust"
    thrust = 0.6

    [[timeline]]
    at_s = 61
    type = "inject_fault"
    fault = "ENG_VIBRATION"

    [[timeline]]
    at_s = 90
    type = "clear_faults"
"#;

fn fired_indices(step: f64) -> Vec<(usize, f64)> {
    let scenario = TRAINING.parse::<ScenarioDefinition>().unwrap();
    let mut library = ScenarioLibrary::empty();
    library.register(scenario).unwrap();
    let mut injector = FaultInjector::new(library, None);
    let mut model = AircraftModel::deterministic();
    assert!(injector.run_scenario("MIXED_DRILL", model.aircraft.elapsed_s));

    let mut fired = Vec::new();
    let mut guard = 0;
    while injector.scenario_status().is_some() {
        model.advance(step);
        fired.extend(
            injector
                .update_scenario(&mut model, step)
                .into_iter()
                .map(|f| (f.index, f.trigger_s)),
        );
        guard += 1;
        assert!(guard < 10_000, "scenario never completed");
    }
    fired
}

#[test]
fn coarse_and_fine_steps_fire_the_same_entries() {
    let fine = fired_indices(0.25);
    for step in [1.0, 7.3, 45.0, 500.0] {
        assert_eq!(fired_indices(step), fine, "step {step}");
    }
    assert_eq!(fine.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4, 5]);
    assert!(fine.windows(2).all(|pair| pair[0].1 <= pair[1].1));
}

#[test]
fn scenario_effects_reach_the_model() {
    let registry = new_registry();
    let metrics = SimulationMetrics::new(registry.clone()).unwrap();
    let mut library = ScenarioLibrary::empty();
    library.register(TRAINING.parse().unwrap()).unwrap();
    let mut injector = FaultInjector::new(library, Some(metrics));
    let mut model = AircraftModel::deterministic();

    injector.run_scenario("MIXED_DRILL", 0.0);
    for _ in 0..95 {
        model.advance(1.0);
        injector.update_scenario(&mut model, 1.0);
    }

    assert!(model.electrical.gen2.failed);
    assert_eq!(model.engine(EngineId::Eng1).thrust_override, Some(0.6));
    assert!(model.engine(EngineId::Eng1).vibration_bias > 0.0);
    assert!(injector.active_faults().is_empty());
    assert_eq!(injector.fault_history().len(), 2);
    let last = injector.last_run().unwrap();
    assert_eq!(last.fired().len(), 6);

    let body = avsim_metrics::render(&registry).unwrap();
    assert!(body.contains("avsim_scenario_actions_total{action=\"inject_fault\"} 2"));
}

#[test]
fn scenario_files_load_into_the_library() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(TRAINING.as_bytes()).unwrap();

    let mut library = ScenarioLibrary::builtin();
    let loaded = library.load_file(file.path()).unwrap();
    assert_eq!(loaded.timeline.len(), 6);
    assert_eq!(library.len(), 6);

    let missing = library.load_file(file.path().with_extension("missing"));
    assert!(matches!(missing, Err(ScenarioError::Io { .. })));
}
