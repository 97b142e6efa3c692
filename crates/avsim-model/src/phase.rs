//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "02-model"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Flight phase classification."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Altitude below which the aircraft is considered on the runway or ramp.
pub const GROUND_ALTITUDE_FT: f64 = 50.0;
const PARKED_MAX_SPEED_KT: f64 = 5.0;
const TAXI_MAX_SPEED_KT: f64 = 40.0;
const GROUND_SINK_FPM: f64 = -100.0;
const INITIAL_CLIMB_CEILING_FT: f64 = 1_500.0;
const LANDING_CEILING_FT: f64 = 1_000.0;
const APPROACH_CEILING_FT: f64 = 3_000.0;
const APPROACH_SINK_FPM: f64 = -300.0;
const CLIMB_RATE_FPM: f64 = 500.0;
const CLIMB_CEILING_FT: f64 = 30_000.0;
const DESCENT_RATE_FPM: f64 = -500.0;

/// Flight phase derived every tick from the kinematic state.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum FlightPhase {
    Parked,
    Taxi,
    Takeoff,
    Climb,
    Cruise,
    Descent,
    Approach,
    Landing,
}

impl FlightPhase {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Fraction of maximum thrust the autothrust demands in this phase.
    pub fn required_thrust(&self) -> f64 {
        match self {
            FlightPhase::Parked => 0.04,
            FlightPhase::Taxi => 0.08,
            FlightPhase::Takeoff => 0.95,
            FlightPhase::Climb => 0.85,
            FlightPhase::Cruise => 0.75,
            FlightPhase::Descent => 0.30,
            FlightPhase::Approach => 0.45,
            FlightPhase::Landing => 0.35,
        }
    }

    /// N1 window (percent) the engine target is clamped into.
    pub fn n1_window(&self) -> (f64, f64) {
        match self {
            FlightPhase::Parked => (20.0, 25.0),
            FlightPhase::Taxi => (20.0, 35.0),
            FlightPhase::Takeoff => (85.0, 98.0),
            FlightPhase::Climb => (75.0, 95.0),
            FlightPhase::Cruise => (65.0, 90.0),
            FlightPhase::Descent => (20.0, 60.0),
            FlightPhase::Approach => (30.0, 75.0),
            FlightPhase::Landing => (20.0, 70.0),
        }
    }

    pub fn is_airborne(&self) -> bool {
        !matches!(self, FlightPhase::Parked | FlightPhase::Taxi)
    }

    /// Representative kinematic state used when a phase is forced directly.
    pub fn profile(&self) -> PhaseProfile {
        let (altitude_ft, airspeed_kt, vertical_speed_fpm, target_altitude_ft, target_airspeed_kt) =
            match self {
                FlightPhase::Parked => (0.0, 0.0, 0.0, 0.0, 0.0),
                FlightPhase::Taxi => (0.0, 15.0, 0.0, 0.0, 15.0),
                FlightPhase::Takeoff => (0.0, 145.0, 0.0, 5_000.0, 250.0),
                FlightPhase::Climb => (12_000.0, 290.0, 2_000.0, 35_000.0, 290.0),
                FlightPhase::Cruise => (35_000.0, 280.0, 0.0, 35_000.0, 280.0),
                FlightPhase::Descent => (20_000.0, 300.0, -2_000.0, 3_000.0, 250.0),
                FlightPhase::Approach => (2_500.0, 170.0, -700.0, 0.0, 140.0),
                FlightPhase::Landing => (800.0, 140.0, -700.0, 0.0, 0.0),
            };
        PhaseProfile {
            altitude_ft,
            airspeed_kt,
            vertical_speed_fpm,
            target_altitude_ft,
            target_airspeed_kt,
        }
    }
}

/// Kinematic seed applied by [`crate::AircraftModel::set_flight_phase`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseProfile {
    pub altitude_ft: f64,
    pub airspeed_kt: f64,
    pub vertical_speed_fpm: f64,
    pub target_altitude_ft: f64,
    pub target_airspeed_kt: f64,
}

/// Classify the flight phase from altitude, airspeed and vertical speed.
///
/// Stateless: the same inputs always yield the same phase. Rules are evaluated
/// in a fixed priority order and the first match wins, so the overlapping
/// TAKEOFF/CLIMB window below 1,500 ft resolves to TAKEOFF. A ground roll with
/// no sink rate is reported as TAKEOFF whether accelerating or decelerating.
pub fn determine_phase(altitude_ft: f64, airspeed_kt: f64, vertical_speed_fpm: f64) -> FlightPhase {
    if altitude_ft < GROUND_ALTITUDE_FT {
        return if airspeed_kt < PARKED_MAX_SPEED_KT {
            FlightPhase::Parked
        } else if airspeed_kt < TAXI_MAX_SPEED_KT {
            FlightPhase::Taxi
        } else if vertical_speed_fpm < GROUND_SINK_FPM {
            FlightPhase::Landing
        } else {
            FlightPhase::Takeoff
        };
    }
    if altitude_ft < INITIAL_CLIMB_CEILING_FT && vertical_speed_fpm > CLIMB_RATE_FPM {
        return FlightPhase::Takeoff;
    }
    if altitude_ft < LANDING_CEILING_FT && vertical_speed_fpm < APPROACH_SINK_FPM {
        return FlightPhase::Landing;
    }
    if altitude_ft < APPROACH_CEILING_FT && vertical_speed_fpm < APPROACH_SINK_FPM {
        return FlightPhase::Approach;
    }
    if vertical_speed_fpm > CLIMB_RATE_FPM && altitude_ft < CLIMB_CEILING_FT {
        return FlightPhase::Climb;
    }
    if vertical_speed_fpm < DESCENT_RATE_FPM {
        return FlightPhase::Descent;
    }
    FlightPhase::Cruise
}
