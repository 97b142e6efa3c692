//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "02-model"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Aircraft model aggregate and the per-tick advance step."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use tracing::{debug, warn};

use crate::aircraft::AircraftState;
use crate::controls::FlightControls;
use crate::electrical::ElectricalSystem;
use crate::engine::{n1_for_thrust, EngineId, EngineState};
use crate::fuel::FuelState;
use crate::hydraulics::HydraulicSystem;
use crate::noise::{NoNoise, NoiseSource};
use crate::phase::{determine_phase, FlightPhase, GROUND_ALTITUDE_FT};
use crate::pressurization::PressurizationState;
use crate::smoothing::approach;

/// Vertical speed acceleration, fpm per second.
pub const VS_RATE_FPM_S: f64 = 500.0;
pub const AIRSPEED_RATE_KT_S: f64 = 3.0;
const BRAKING_RATE_KT_S: f64 = 5.0;
const VS_GAIN_FPM_PER_FT: f64 = 1.0;
const MAX_CLIMB_FPM: f64 = 3_000.0;
const MAX_DESCENT_FPM: f64 = 3_500.0;
const STABILISED_APPROACH_FPM: f64 = 700.0;
const GLIDE_SINK_FPM: f64 = 1_800.0;
const GLIDE_SPEED_KT: f64 = 210.0;
const ROTATION_SPEED_KT: f64 = 140.0;
const ATTITUDE_RATE_DEG_S: f64 = 2.0;
const ROLL_DECAY_DEG_S: f64 = 3.0;

/// The complete physical and systems state of the simulated aircraft.
///
/// Owns every subsystem outright. Callers outside the crate mutate it either
/// through [`AircraftModel::advance`] or by writing public fields through a
/// short-lived `&mut` borrow (fault effects, playback setters).
#[derive(Debug)]
pub struct AircraftModel {
    pub aircraft: AircraftState,
    pub engines: [EngineState; 2],
    pub hydraulics: HydraulicSystem,
    pub electrical: ElectricalSystem,
    pub pressurization: PressurizationState,
    pub fuel: FuelState,
    pub controls: FlightControls,
    noise: Box<dyn NoiseSource>,
}

impl Default for AircraftModel {
    fn default() -> Self {
        Self::deterministic()
    }
}

impl AircraftModel {
    /// A stabilised cruise at FL350 with both engines running.
    pub fn new(noise: Box<dyn NoiseSource>) -> Self {
        let aircraft = AircraftState::default();
        let (low, high) = FlightPhase::Cruise.n1_window();
        let cruise_n1 = n1_for_thrust(FlightPhase::Cruise.required_thrust()).clamp(low, high);
        let engine = EngineState::running_at(cruise_n1, aircraft.outside_air_temp_c);
        let mut model = Self {
            aircraft,
            engines: [engine.clone(), engine],
            hydraulics: HydraulicSystem::default(),
            electrical: ElectricalSystem::default(),
            pressurization: PressurizationState::default(),
            fuel: FuelState::default(),
            controls: FlightControls::default(),
            noise,
        };
        // Zero-length update brings generators and buses online.
        let n2 = model.engine_n2();
        model.electrical.update(n2, 0.0, &mut NoNoise);
        let fuel_kg = model.fuel.total_kg();
        model.aircraft.set_fuel_remaining_kg(fuel_kg);
        model
    }

    /// Model without micro-variation noise.
    pub fn deterministic() -> Self {
        Self::new(Box::new(NoNoise))
    }

    pub fn set_noise_source(&mut self, noise: Box<dyn NoiseSource>) {
        self.noise = noise;
    }

    pub fn engine(&self, id: EngineId) -> &EngineState {
        &self.engines[id.index()]
    }

    pub fn engine_mut(&mut self, id: EngineId) -> &mut EngineState {
        &mut self.engines[id.index()]
    }

    pub fn phase(&self) -> FlightPhase {
        self.aircraft.phase
    }

    pub fn running_engines(&self) -> usize {
        self.engines.iter().filter(|engine| engine.running).count()
    }

    /// Force a flight phase by seeding its kinematic profile.
    ///
    /// Phase is re-derived from kinematics every tick, so the profile is what
    /// keeps the forced phase in place on the next [`advance`](Self::advance).
    pub fn set_flight_phase(&mut self, phase: FlightPhase) {
        let profile = phase.profile();
        let aircraft = &mut self.aircraft;
        aircraft.altitude_ft = profile.altitude_ft;
        aircraft.airspeed_kt = profile.airspeed_kt;
        aircraft.vertical_speed_fpm = profile.vertical_speed_fpm;
        aircraft.target_altitude_ft = profile.target_altitude_ft;
        aircraft.target_airspeed_kt = profile.target_airspeed_kt;
        aircraft.phase = phase;
        aircraft.refresh_environment();
        if !self.pressurization.decompression {
            self.pressurization.cabin_altitude_ft =
                PressurizationState::scheduled_cabin_altitude_ft(profile.altitude_ft);
        }
        debug!(target: "avsim::model", phase = phase.as_str(), "flight phase forced");
    }

    /// Override thrust on one engine, or both when `engine` is `None`.
    /// `None` for `thrust` returns the engine(s) to the phase schedule.
    pub fn set_thrust(&mut self, engine: Option<EngineId>, thrust: Option<f64>) {
        let thrust = thrust.map(|value| value.clamp(0.0, 1.0));
        match engine {
            Some(id) => self.engine_mut(id).thrust_override = thrust,
            None => {
                for engine in &mut self.engines {
                    engine.thrust_override = thrust;
                }
            }
        }
    }

    pub fn set_target_altitude(&mut self, altitude_ft: f64) {
        self.aircraft.target_altitude_ft = altitude_ft.max(0.0);
    }

    pub fn set_target_airspeed(&mut self, airspeed_kt: f64) {
        self.aircraft.target_airspeed_kt = airspeed_kt.max(0.0);
    }

    /// Advance the model by `dt` seconds of simulated time.
    ///
    /// Steps run in a fixed order: flight phase, environment, engines, fuel,
    /// hydraulics, electrical, pressurization, flight controls, kinematics.
    /// Non-finite or non-positive `dt` leaves the model untouched.
    pub fn advance(&mut self, dt: f64) {
        if !dt.is_finite() || dt <= 0.0 {
            debug!(target: "avsim::model", dt, "ignoring out-of-domain tick");
            return;
        }

        let aircraft = &mut self.aircraft;
        aircraft.phase = determine_phase(
            aircraft.altitude_ft,
            aircraft.airspeed_kt,
            aircraft.vertical_speed_fpm,
        );
        aircraft.refresh_environment();
        let phase = aircraft.phase;
        let oat_c = aircraft.outside_air_temp_c;

        for engine in &mut self.engines {
            engine.update(phase, oat_c, dt, self.noise.as_mut());
        }

        let total_fuel_flow: f64 = self.engines.iter().map(|e| e.fuel_flow_kg_h).sum();
        self.fuel.update(total_fuel_flow, oat_c, dt);
        if self.fuel.is_empty() && self.running_engines() > 0 {
            warn!(target: "avsim::model", "fuel exhausted; engines flamed out");
            for engine in &mut self.engines {
                engine.flame_out();
            }
        }
        let fuel_kg = self.fuel.total_kg();
        self.aircraft.set_fuel_remaining_kg(fuel_kg);

        self.hydraulics.update(
            self.engines[0].running,
            self.engines[1].running,
            self.electrical.ac_powered(),
            dt,
            self.noise.as_mut(),
        );
        let n2 = self.engine_n2();
        self.electrical.update(n2, dt, self.noise.as_mut());
        let bleed_available = self.running_engines() > 0;
        self.pressurization
            .update(self.aircraft.altitude_ft, bleed_available, dt);
        self.controls.update(
            phase,
            self.aircraft.pitch_deg,
            self.aircraft.roll_deg,
            self.hydraulics.usable_circuits() > 0,
            dt,
        );

        self.update_kinematics(dt);
        self.aircraft.elapsed_s += dt;
    }

    fn engine_n2(&self) -> [(bool, f64); 2] {
        [
            (self.engines[0].running, self.engines[0].n2_pct),
            (self.engines[1].running, self.engines[1].n2_pct),
        ]
    }

    fn update_kinematics(&mut self, dt: f64) {
        let running = self.running_engines();
        let aircraft = &mut self.aircraft;
        let airborne = aircraft.altitude_ft >= GROUND_ALTITUDE_FT;
        let error_ft = aircraft.target_altitude_ft - aircraft.altitude_ft;

        let max_climb = MAX_CLIMB_FPM * running as f64 / 2.0;
        let mut vs_target = if matches!(aircraft.phase, FlightPhase::Approach | FlightPhase::Landing)
            && error_ft < 0.0
        {
            -STABILISED_APPROACH_FPM
        } else {
            (error_ft * VS_GAIN_FPM_PER_FT).clamp(-MAX_DESCENT_FPM, max_climb)
        };
        if running == 0 && airborne {
            vs_target = -GLIDE_SINK_FPM;
        }
        if !airborne && aircraft.airspeed_kt < ROTATION_SPEED_KT {
            vs_target = vs_target.min(0.0);
        }
        aircraft.vertical_speed_fpm =
            approach(aircraft.vertical_speed_fpm, vs_target, VS_RATE_FPM_S, dt);

        aircraft.altitude_ft += aircraft.vertical_speed_fpm / 60.0 * dt;
        if aircraft.altitude_ft <= 0.0 {
            aircraft.altitude_ft = 0.0;
            aircraft.vertical_speed_fpm = aircraft.vertical_speed_fpm.max(0.0);
        }

        let speed_target = if running == 0 && airborne {
            GLIDE_SPEED_KT
        } else {
            aircraft.target_airspeed_kt
        };
        let speed_rate = if !airborne && speed_target < aircraft.airspeed_kt {
            BRAKING_RATE_KT_S
        } else {
            AIRSPEED_RATE_KT_S
        };
        aircraft.airspeed_kt = approach(aircraft.airspeed_kt, speed_target, speed_rate, dt).max(0.0);

        let pitch_target = (2.5 + aircraft.vertical_speed_fpm / 1_000.0 * 2.0).clamp(-10.0, 20.0);
        aircraft.pitch_deg = approach(aircraft.pitch_deg, pitch_target, ATTITUDE_RATE_DEG_S, dt);
        aircraft.roll_deg = approach(aircraft.roll_deg, 0.0, ROLL_DECAY_DEG_S, dt);
        aircraft.heading_deg = aircraft.heading_deg.rem_euclid(360.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_cruise_holds_altitude_and_phase() {
        let mut model = AircraftModel::deterministic();
        for _ in 0..60 {
            model.advance(1.0);
        }
        assert_eq!(model.phase(), FlightPhase::Cruise);
        assert_eq!(model.aircraft.altitude_ft, 35_000.0);
        assert_eq!(model.aircraft.elapsed_s, 60.0);
        assert_eq!(model.hydraulics.usable_circuits(), 3);
        assert!(model.electrical.gen1.online && model.electrical.gen2.online);
    }

    #[test]
    fn fuel_burn_reduces_gross_weight() {
        let mut model = AircraftModel::deterministic();
        let before = model.aircraft.gross_weight_kg;
        model.advance(10.0);
        assert!(model.aircraft.gross_weight_kg < before);
        assert!(
            (model.aircraft.fuel_remaining_kg - model.fuel.total_kg()).abs() < 1e-9,
            "fuel remaining tracks tanks"
        );
    }

    #[test]
    fn forced_phase_survives_next_tick() {
        for phase in [
            FlightPhase::Parked,
            FlightPhase::Taxi,
            FlightPhase::Takeoff,
            FlightPhase::Climb,
            FlightPhase::Descent,
            FlightPhase::Approach,
            FlightPhase::Landing,
        ] {
            let mut model = AircraftModel::deterministic();
            model.set_flight_phase(phase);
            model.advance(1.0);
            assert_eq!(model.phase(), phase);
            assert!(model.pressurization.cabin_altitude_ft <= model.aircraft.altitude_ft.max(0.0) + 10.0);
        }
    }

    #[test]
    fn empty_tanks_flame_out_both_engines() {
        let mut model = AircraftModel::deterministic();
        model.fuel.left_l = 0.0;
        model.fuel.center_l = 0.0;
        model.fuel.right_l = 0.0;
        model.advance(1.0);
        assert_eq!(model.running_engines(), 0);
        assert!(model.engines.iter().all(|e| e.fuel_flow_kg_h == 0.0));
    }

    #[test]
    fn dual_flameout_glides_down() {
        let mut model = AircraftModel::deterministic();
        for engine in &mut model.engines {
            engine.flame_out();
        }
        for _ in 0..10 {
            model.advance(1.0);
        }
        assert_eq!(model.aircraft.vertical_speed_fpm, -GLIDE_SINK_FPM);
        assert_eq!(model.phase(), FlightPhase::Descent);
        assert!(model.aircraft.altitude_ft < 35_000.0);
    }

    #[test]
    fn thrust_override_applies_to_both_engines() {
        let mut model = AircraftModel::deterministic();
        model.set_thrust(None, Some(0.3));
        assert!(model.engines.iter().all(|e| e.thrust_override == Some(0.3)));
        model.set_thrust(Some(EngineId::Eng2), None);
        assert_eq!(model.engine(EngineId::Eng2).thrust_override, None);
    }
}
