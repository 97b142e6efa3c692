//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "02-model"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Cabin pressurization schedule, packs and decompression."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::environment::static_pressure_psi;
use crate::smoothing::approach;

pub const MAX_CABIN_ALTITUDE_FT: f64 = 8_000.0;
pub const MAX_DIFFERENTIAL_PSI: f64 = 9.0;
const CABIN_SCHEDULE_RATIO: f64 = 0.2;
/// Cabin climb/descent rates in ft/s.
const NORMAL_CABIN_RATE_FT_S: f64 = 500.0 / 60.0;
const UNPRESSURISED_CABIN_RATE_FT_S: f64 = 50.0;
const DECOMPRESSION_CABIN_RATE_FT_S: f64 = 3_000.0;
const OUTFLOW_RATE_PCT_S: f64 = 5.0;

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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PackId {
    Pack1,
    Pack2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressurizationState {
    pub cabin_altitude_ft: f64,
    /// Cabin vertical speed, ft/min.
    pub cabin_rate_fpm: f64,
    pub differential_psi: f64,
    pub pack1_on: bool,
    pub pack2_on: bool,
    pub pack1_failed: bool,
    pub pack2_failed: bool,
    pub outflow_valve_pct: f64,
    pub decompression: bool,
}

impl Default for PressurizationState {
    fn default() -> Self {
        Self {
            cabin_altitude_ft: 7_000.0,
            cabin_rate_fpm: 0.0,
            differential_psi: 7.8,
            pack1_on: true,
            pack2_on: true,
            pack1_failed: false,
            pack2_failed: false,
            outflow_valve_pct: 20.0,
            decompression: false,
        }
    }
}

impl PressurizationState {
    pub fn fail_pack(&mut self, pack: PackId) {
        match pack {
            PackId::Pack1 => self.pack1_failed = true,
            PackId::Pack2 => self.pack2_failed = true,
        }
    }

    pub fn packs_operating(&self) -> usize {
        usize::from(self.pack1_on) + usize::from(self.pack2_on)
    }

    /// Scheduled cabin altitude for a given aircraft altitude.
    pub fn scheduled_cabin_altitude_ft(aircraft_altitude_ft: f64) -> f64 {
        (aircraft_altitude_ft * CABIN_SCHEDULE_RATIO).clamp(0.0, MAX_CABIN_ALTITUDE_FT)
    }

    /// Packs need bleed air from at least one running engine.
    pub fn update(&mut self, aircraft_altitude_ft: f64, bleed_available: bool, dt: f64) {
        self.pack1_on = bleed_available && !self.pack1_failed;
        self.pack2_on = bleed_available && !self.pack2_failed;

        let altitude = aircraft_altitude_ft.max(0.0);
        let (target, rate) = if self.decompression {
            (altitude, DECOMPRESSION_CABIN_RATE_FT_S)
        } else if self.packs_operating() == 0 {
            (altitude, UNPRESSURISED_CABIN_RATE_FT_S)
        } else {
            (
                Self::scheduled_cabin_altitude_ft(altitude),
                NORMAL_CABIN_RATE_FT_S,
            )
        };

        let previous = self.cabin_altitude_ft;
        self.cabin_altitude_ft = approach(previous, target.clamp(0.0, altitude), rate, dt).max(0.0);
        self.cabin_rate_fpm = if dt > 0.0 {
            (self.cabin_altitude_ft - previous) / dt * 60.0
        } else {
            0.0
        };
        self.differential_psi = (static_pressure_psi(self.cabin_altitude_ft)
            - static_pressure_psi(altitude))
        .clamp(0.0, MAX_DIFFERENTIAL_PSI);

        let outflow_target = if self.decompression || self.packs_operating() == 0 {
            100.0
        } else {
            (20.0 + self.differential_psi * 2.0).clamp(0.0, 100.0)
        };
        self.outflow_valve_pct = approach(self.outflow_valve_pct, outflow_target, OUTFLOW_RATE_PCT_S, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cruise_cabin_holds_schedule() {
        let mut cabin = PressurizationState::default();
        for _ in 0..10 {
            cabin.update(35_000.0, true, 1.0);
        }
        assert_eq!(cabin.cabin_altitude_ft, 7_000.0);
        assert!(cabin.differential_psi > 7.0 && cabin.differential_psi <= MAX_DIFFERENTIAL_PSI);
    }

    #[test]
    fn decompression_equalises_within_seconds() {
        let mut cabin = PressurizationState {
            decompression: true,
            ..PressurizationState::default()
        };
        for _ in 0..10 {
            cabin.update(35_000.0, true, 1.0);
        }
        assert_eq!(cabin.cabin_altitude_ft, 35_000.0);
        assert_eq!(cabin.differential_psi, 0.0);
    }

    #[test]
    fn failed_packs_let_cabin_climb_slowly() {
        let mut cabin = PressurizationState::default();
        cabin.fail_pack(PackId::Pack1);
        cabin.fail_pack(PackId::Pack2);
        cabin.update(35_000.0, true, 1.0);
        assert_eq!(cabin.packs_operating(), 0);
        assert_eq!(cabin.cabin_altitude_ft, 7_050.0);
        assert!((cabin.cabin_rate_fpm - 3_000.0).abs() < 1e-9);
    }

    #[test]
    fn fast_descent_keeps_cabin_rate() {
        let mut cabin = PressurizationState::default();
        cabin.update(2_000.0, true, 1.0);
        assert!((cabin.cabin_altitude_ft - (7_000.0 - NORMAL_CABIN_RATE_FT_S)).abs() < 1e-9);
        assert!((cabin.cabin_rate_fpm + 500.0).abs() < 1e-9);
        assert_eq!(cabin.differential_psi, 0.0);
    }

    #[test]
    fn parked_cabin_stays_at_field_level() {
        let mut cabin = PressurizationState {
            cabin_altitude_ft: 0.0,
            ..PressurizationState::default()
        };
        cabin.update(0.0, false, 1.0);
        assert_eq!(cabin.cabin_altitude_ft, 0.0);
    }
}
