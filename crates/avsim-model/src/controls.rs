//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "02-model"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Flight control surface positions and flap schedule."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::phase::FlightPhase;
use crate::smoothing::approach;

pub const FLAP_RATE_DEG_S: f64 = 2.0;
const SURFACE_RATE_DEG_S: f64 = 10.0;
const MAX_ELEVATOR_DEG: f64 = 15.0;
const MAX_AILERON_DEG: f64 = 20.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightControls {
    pub aileron_left_deg: f64,
    pub aileron_right_deg: f64,
    pub elevator_deg: f64,
    pub rudder_deg: f64,
    pub spoilers_deg: f64,
    pub flaps_deg: f64,
    pub flaps_jammed: bool,
    pub stabilizer_trim_deg: f64,
    pub gear_down: bool,
}

/// Scheduled flap setting in degrees.
pub fn flap_schedule_deg(phase: FlightPhase) -> f64 {
    match phase {
        FlightPhase::Parked => 0.0,
        FlightPhase::Taxi => 5.0,
        FlightPhase::Takeoff => 10.0,
        FlightPhase::Climb | FlightPhase::Cruise | FlightPhase::Descent => 0.0,
        FlightPhase::Approach => 20.0,
        FlightPhase::Landing => 35.0,
    }
}

pub fn gear_scheduled_down(phase: FlightPhase) -> bool {
    matches!(
        phase,
        FlightPhase::Parked
            | FlightPhase::Taxi
            | FlightPhase::Takeoff
            | FlightPhase::Approach
            | FlightPhase::Landing
    )
}

impl FlightControls {
    /// Move surfaces toward the demands implied by the phase and current
    /// attitude. Surfaces hold position when no hydraulic circuit is usable.
    pub fn update(
        &mut self,
        phase: FlightPhase,
        pitch_deg: f64,
        roll_deg: f64,
        hydraulics_available: bool,
        dt: f64,
    ) {
        if !hydraulics_available {
            return;
        }
        if !self.flaps_jammed {
            self.flaps_deg = approach(self.flaps_deg, flap_schedule_deg(phase), FLAP_RATE_DEG_S, dt);
        }
        self.gear_down = gear_scheduled_down(phase);

        let elevator_target = (pitch_deg * 0.5).clamp(-MAX_ELEVATOR_DEG, MAX_ELEVATOR_DEG);
        self.elevator_deg = approach(self.elevator_deg, elevator_target, SURFACE_RATE_DEG_S, dt);
        let aileron_target = (roll_deg * 0.3).clamp(-MAX_AILERON_DEG, MAX_AILERON_DEG);
        self.aileron_left_deg = approach(self.aileron_left_deg, aileron_target, SURFACE_RATE_DEG_S, dt);
        self.aileron_right_deg =
            approach(self.aileron_right_deg, -aileron_target, SURFACE_RATE_DEG_S, dt);
        self.rudder_deg = approach(self.rudder_deg, 0.0, SURFACE_RATE_DEG_S, dt);

        let spoiler_target = if matches!(phase, FlightPhase::Landing) { 10.0 } else { 0.0 };
        self.spoilers_deg = approach(self.spoilers_deg, spoiler_target, SURFACE_RATE_DEG_S, dt);
        self.stabilizer_trim_deg = approach(self.stabilizer_trim_deg, pitch_deg * 0.2, 0.5, dt);
    }
}
