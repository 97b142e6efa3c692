//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "02-model"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Aircraft-level kinematic and environmental state."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::environment::{isa_temperature_c, mach_number, total_air_temperature_c, true_airspeed_kt};
use crate::phase::FlightPhase;

pub const EMPTY_WEIGHT_KG: f64 = 42_000.0;
pub const PAYLOAD_KG: f64 = 15_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftState {
    pub altitude_ft: f64,
    /// Indicated airspeed, knots.
    pub airspeed_kt: f64,
    pub vertical_speed_fpm: f64,
    pub heading_deg: f64,
    pub pitch_deg: f64,
    pub roll_deg: f64,
    pub gross_weight_kg: f64,
    pub fuel_remaining_kg: f64,
    pub phase: FlightPhase,
    pub outside_air_temp_c: f64,
    pub total_air_temp_c: f64,
    pub mach: f64,
    /// Simulated seconds since the model was created.
    pub elapsed_s: f64,
    pub target_altitude_ft: f64,
    pub target_airspeed_kt: f64,
}

impl Default for AircraftState {
    fn default() -> Self {
        let profile = FlightPhase::Cruise.profile();
        let mut state = Self {
            altitude_ft: profile.altitude_ft,
            airspeed_kt: profile.airspeed_kt,
            vertical_speed_fpm: profile.vertical_speed_fpm,
            heading_deg: 90.0,
            pitch_deg: 2.5,
            roll_deg: 0.0,
            gross_weight_kg: EMPTY_WEIGHT_KG + PAYLOAD_KG,
            fuel_remaining_kg: 0.0,
            phase: FlightPhase::Cruise,
            outside_air_temp_c: 0.0,
            total_air_temp_c: 0.0,
            mach: 0.0,
            elapsed_s: 0.0,
            target_altitude_ft: profile.target_altitude_ft,
            target_airspeed_kt: profile.target_airspeed_kt,
        };
        state.refresh_environment();
        state
    }
}

impl AircraftState {
    /// Recompute OAT, Mach and TAT from altitude and airspeed.
    pub fn refresh_environment(&mut self) {
        self.outside_air_temp_c = isa_temperature_c(self.altitude_ft);
        self.mach = mach_number(
            true_airspeed_kt(self.airspeed_kt, self.altitude_ft),
            self.outside_air_temp_c,
        );
        self.total_air_temp_c = total_air_temperature_c(self.outside_air_temp_c, self.mach);
    }

    pub fn set_fuel_remaining_kg(&mut self, fuel_kg: f64) {
        self.fuel_remaining_kg = fuel_kg.max(0.0);
        self.gross_weight_kg = EMPTY_WEIGHT_KG + PAYLOAD_KG + self.fuel_remaining_kg;
    }

    pub fn is_on_ground(&self) -> bool {
        !self.phase.is_airborne()
            || (self.altitude_ft < crate::phase::GROUND_ALTITUDE_FT && self.vertical_speed_fpm <= 0.0)
    }
}
