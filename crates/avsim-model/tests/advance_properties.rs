//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "02-model"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Property checks over sequences of model advance steps."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use avsim_model::engine::{EGT_RATE_C_S, N1_RATE_PCT_S, N2_RATE_PCT_S};
use avsim_model::hydraulics::PRESSURE_RATE_PSI_S;
use avsim_model::model::VS_RATE_FPM_S;
use avsim_model::{AircraftModel, EngineId, FlightPhase, HydraulicCircuitId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EPS: f64 = 1e-9;

fn random_steps(seed: u64, count: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| rng.gen_range(0.05..2.0)).collect()
}

#[test]
fn rate_limited_quantities_respect_their_rates() {
    let mut model = AircraftModel::deterministic();
    model.set_thrust(Some(EngineId::Eng1), Some(0.04));
    model.engine_mut(EngineId::Eng2).flame_out();
    model.hydraulics.green.pump_failed = true;

    for dt in random_steps(11, 200) {
        let before_eng1 = model.engine(EngineId::Eng1).clone();
        let before_green = model.hydraulics.circuit(HydraulicCircuitId::Green).pressure_psi;
        let before_vs = model.aircraft.vertical_speed_fpm;

        model.advance(dt);

        let eng1 = model.engine(EngineId::Eng1);
        assert!((eng1.n1_pct - before_eng1.n1_pct).abs() <= N1_RATE_PCT_S * dt + EPS);
        assert!((eng1.n2_pct - before_eng1.n2_pct).abs() <= N2_RATE_PCT_S * dt + EPS);
        assert!((eng1.egt_c - before_eng1.egt_c).abs() <= EGT_RATE_C_S * dt + EPS);
        let green = model.hydraulics.green.pressure_psi;
        assert!((green - before_green).abs() <= PRESSURE_RATE_PSI_S * dt + EPS);
        assert!((model.aircraft.vertical_speed_fpm - before_vs).abs() <= VS_RATE_FPM_S * dt + EPS);
    }
}

#[test]
fn subsystem_values_stay_physical() {
    let mut model = AircraftModel::new(Box::new(avsim_model::RandomNoise::seeded(3)));
    model.engine_mut(EngineId::Eng1).oil_leak_pct_s = 5.0;
    model.hydraulics.yellow.leak_pct_s = 4.0;
    model.pressurization.decompression = true;

    for dt in random_steps(5, 300) {
        model.advance(dt);
        for engine in &model.engines {
            assert!(engine.n1_pct >= 0.0 && engine.n1_pct <= 100.0);
            assert!(engine.oil_pressure_psi >= 0.0);
            assert!((0.0..=100.0).contains(&engine.oil_quantity_pct));
            assert!((0.0..=1.0).contains(&engine.thrust));
        }
        for circuit in [&model.hydraulics.green, &model.hydraulics.blue, &model.hydraulics.yellow] {
            assert!(circuit.pressure_psi >= 0.0);
            assert!((0.0..=100.0).contains(&circuit.quantity_pct));
        }
        assert!(model.pressurization.differential_psi >= 0.0);
        assert!(model.pressurization.cabin_altitude_ft <= model.aircraft.altitude_ft.max(0.0));
        assert!(model.aircraft.altitude_ft >= 0.0);
        assert!(model.fuel.total_l() >= 0.0);
        assert!(model.electrical.battery.charge_pct >= 0.0);
    }
}

#[test]
fn out_of_domain_ticks_are_no_ops() {
    let mut model = AircraftModel::deterministic();
    model.advance(1.0);
    let aircraft = model.aircraft.clone();
    let engines = model.engines.clone();
    let fuel = model.fuel.clone();

    for dt in [0.0, -1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        model.advance(dt);
    }

    assert_eq!(model.aircraft, aircraft);
    assert_eq!(model.engines, engines);
    assert_eq!(model.fuel, fuel);
}

#[test]
fn flameout_persists_across_phase_changes() {
    let mut model = AircraftModel::deterministic();
    model.engine_mut(EngineId::Eng1).flame_out();
    model.set_flight_phase(FlightPhase::Climb);
    for _ in 0..30 {
        model.advance(1.0);
    }
    let eng1 = model.engine(EngineId::Eng1);
    assert!(!eng1.running);
    assert_eq!(eng1.n1_pct, 0.0);
    assert!(model.engine(EngineId::Eng2).running);
}

#[test]
fn takeoff_roll_climbs_out() {
    let mut model = AircraftModel::deterministic();
    model.set_flight_phase(FlightPhase::Takeoff);
    for _ in 0..60 {
        model.advance(1.0);
    }
    assert!(model.aircraft.altitude_ft > 1_000.0);
    assert!(matches!(model.phase(), FlightPhase::Takeoff | FlightPhase::Climb));
    assert!(model.aircraft.airspeed_kt > 145.0);
}
