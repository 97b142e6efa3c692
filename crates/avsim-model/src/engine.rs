//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "02-model"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Turbofan engine state and spool dynamics."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::noise::NoiseSource;
use crate::phase::FlightPhase;
use crate::smoothing::{approach, clamp_pct};

pub const IDLE_N1_PCT: f64 = 20.0;
pub const MAX_N1_PCT: f64 = 100.0;
/// Spool rates, per second.
pub const N1_RATE_PCT_S: f64 = 8.0;
pub const N2_RATE_PCT_S: f64 = 6.0;
pub const EGT_RATE_C_S: f64 = 40.0;
pub const OIL_TEMP_RATE_C_S: f64 = 1.0;
const OIL_PRESSURE_RATE_PSI_S: f64 = 10.0;
const EGT_MAX_C: f64 = 1_200.0;
const FIRE_EGT_RISE_C: f64 = 400.0;
const VIBRATION_MAX: f64 = 10.0;

/// Engine position.
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
pub enum EngineId {
    Eng1,
    Eng2,
}

impl EngineId {
    pub fn index(&self) -> usize {
        match self {
            EngineId::Eng1 => 0,
            EngineId::Eng2 => 1,
        }
    }

    /// Engine number as shown on the flight deck (1 or 2).
    pub fn number(&self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Per-engine state. Fault fields are set by fault effects and never reset by
/// the update step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub n1_pct: f64,
    pub n2_pct: f64,
    pub egt_c: f64,
    /// Fuel flow in kg/h.
    pub fuel_flow_kg_h: f64,
    pub oil_pressure_psi: f64,
    pub oil_temp_c: f64,
    pub oil_quantity_pct: f64,
    pub vibration_n1: f64,
    pub vibration_n2: f64,
    /// Fraction of rated thrust in `[0, 1]`.
    pub thrust: f64,
    pub running: bool,
    pub fire: bool,
    /// Commanded thrust fraction overriding the phase schedule.
    pub thrust_override: Option<f64>,
    pub egt_bias_c: f64,
    pub vibration_bias: f64,
    /// Oil lost per second, in percent of capacity.
    pub oil_leak_pct_s: f64,
}

impl EngineState {
    /// A stabilised engine at the given N1.
    pub fn running_at(n1_pct: f64, oat_c: f64) -> Self {
        let n1 = n1_pct.clamp(IDLE_N1_PCT, MAX_N1_PCT);
        let n2 = target_n2(n1);
        Self {
            n1_pct: n1,
            n2_pct: n2,
            egt_c: target_egt(n1, oat_c, 0.0, false, true),
            fuel_flow_kg_h: fuel_flow_for(n1),
            oil_pressure_psi: 25.0 + 0.45 * n2,
            oil_temp_c: 60.0 + 0.5 * n2,
            oil_quantity_pct: 100.0,
            vibration_n1: 0.4 + 0.008 * n1,
            vibration_n2: 0.3 + 0.006 * n2,
            thrust: (n1 / 100.0).powi(2),
            running: true,
            fire: false,
            thrust_override: None,
            egt_bias_c: 0.0,
            vibration_bias: 0.0,
            oil_leak_pct_s: 0.0,
        }
    }

    /// Stop the engine immediately (flameout or fuel starvation).
    pub fn flame_out(&mut self) {
        self.running = false;
        self.n1_pct = 0.0;
        self.n2_pct = 0.0;
        self.fuel_flow_kg_h = 0.0;
        self.thrust = 0.0;
    }

    /// N1 the engine is spooling toward this tick.
    pub fn target_n1(&self, phase: FlightPhase) -> f64 {
        if !self.running {
            return 0.0;
        }
        match self.thrust_override {
            Some(thrust) => n1_for_thrust(thrust).clamp(IDLE_N1_PCT, MAX_N1_PCT),
            None => {
                let (low, high) = phase.n1_window();
                n1_for_thrust(phase.required_thrust()).clamp(low, high)
            }
        }
    }

    pub fn update(&mut self, phase: FlightPhase, oat_c: f64, dt: f64, noise: &mut dyn NoiseSource) {
        let n1_target = self.target_n1(phase);
        self.n1_pct = clamp_pct(approach(self.n1_pct, n1_target, N1_RATE_PCT_S, dt));

        let n2_target = if self.running { target_n2(self.n1_pct) } else { 0.0 };
        self.n2_pct = approach(self.n2_pct, n2_target, N2_RATE_PCT_S, dt).clamp(0.0, 105.0);

        let egt_target = target_egt(self.n1_pct, oat_c, self.egt_bias_c, self.fire, self.running);
        self.egt_c = approach(self.egt_c, egt_target, EGT_RATE_C_S, dt).clamp(-60.0, EGT_MAX_C);

        self.fuel_flow_kg_h = if self.running {
            fuel_flow_for(self.n1_pct)
        } else {
            0.0
        };
        self.thrust = if self.running {
            (self.n1_pct / 100.0).powi(2).clamp(0.0, 1.0)
        } else {
            0.0
        };

        self.oil_quantity_pct = clamp_pct(self.oil_quantity_pct - self.oil_leak_pct_s * dt);
        let quantity_factor = (self.oil_quantity_pct / 100.0).clamp(0.0, 1.0);
        let oil_pressure_target = if self.running {
            (25.0 + 0.45 * self.n2_pct) * quantity_factor
        } else {
            0.3 * self.n2_pct * quantity_factor
        };
        self.oil_pressure_psi = (approach(
            self.oil_pressure_psi,
            oil_pressure_target,
            OIL_PRESSURE_RATE_PSI_S,
            dt,
        ) + noise.sample(0.3))
        .max(0.0);

        let oil_temp_target = if self.running {
            60.0 + 0.5 * self.n2_pct + (1.0 - quantity_factor) * 40.0
        } else {
            oat_c
        };
        self.oil_temp_c = approach(self.oil_temp_c, oil_temp_target, OIL_TEMP_RATE_C_S, dt);

        let (vib_n1, vib_n2) = if self.running {
            (
                0.4 + 0.008 * self.n1_pct + self.vibration_bias,
                0.3 + 0.006 * self.n2_pct + 0.6 * self.vibration_bias,
            )
        } else {
            (0.0, 0.0)
        };
        self.vibration_n1 = (vib_n1 + noise.sample(0.05)).clamp(0.0, VIBRATION_MAX);
        self.vibration_n2 = (vib_n2 + noise.sample(0.05)).clamp(0.0, VIBRATION_MAX);
    }
}

/// Inverse of the `thrust ∝ N1²` relation.
pub fn n1_for_thrust(thrust: f64) -> f64 {
    100.0 * thrust.clamp(0.0, 1.0).sqrt()
}

fn target_n2(n1_pct: f64) -> f64 {
    55.0 + 0.45 * n1_pct
}

fn target_egt(n1_pct: f64, oat_c: f64, bias_c: f64, fire: bool, running: bool) -> f64 {
    let base = if running {
        oat_c + 300.0 + 5.5 * n1_pct + bias_c
    } else {
        oat_c
    };
    if fire {
        base + FIRE_EGT_RISE_C
    } else {
        base
    }
}

fn fuel_flow_for(n1_pct: f64) -> f64 {
    150.0 + 0.16 * n1_pct * n1_pct
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::NoNoise;

    #[test]
    fn cruise_target_follows_thrust_schedule() {
        let engine = EngineState::running_at(80.0, -54.0);
        let target = engine.target_n1(FlightPhase::Cruise);
        assert!((target - n1_for_thrust(0.75)).abs() < 1e-9);
    }

    #[test]
    fn thrust_override_bypasses_phase_window() {
        let mut engine = EngineState::running_at(80.0, -54.0);
        engine.thrust_override = Some(0.04);
        assert_eq!(engine.target_n1(FlightPhase::Cruise), IDLE_N1_PCT);
    }

    #[test]
    fn spool_up_is_rate_limited() {
        let mut engine = EngineState::running_at(IDLE_N1_PCT, 15.0);
        let before = engine.n1_pct;
        engine.update(FlightPhase::Takeoff, 15.0, 1.0, &mut NoNoise);
        assert!((engine.n1_pct - before - N1_RATE_PCT_S).abs() < 1e-9);
    }

    #[test]
    fn stopped_engine_spools_down_and_cools() {
        let mut engine = EngineState::running_at(85.0, 15.0);
        engine.running = false;
        for _ in 0..120 {
            engine.update(FlightPhase::Cruise, 15.0, 1.0, &mut NoNoise);
        }
        assert_eq!(engine.n1_pct, 0.0);
        assert_eq!(engine.fuel_flow_kg_h, 0.0);
        assert!((engine.egt_c - 15.0).abs() < 1e-9);
    }

    #[test]
    fn oil_leak_drops_pressure() {
        let mut engine = EngineState::running_at(85.0, 15.0);
        engine.oil_leak_pct_s = 2.0;
        for _ in 0..60 {
            engine.update(FlightPhase::Cruise, 15.0, 1.0, &mut NoNoise);
        }
        assert_eq!(engine.oil_quantity_pct, 0.0);
        assert_eq!(engine.oil_pressure_psi, 0.0);
    }

    #[test]
    fn engine_ids_parse() {
        assert_eq!("eng1".parse::<EngineId>().unwrap(), EngineId::Eng1);
        assert_eq!("ENG2".parse::<EngineId>().unwrap(), EngineId::Eng2);
        assert_eq!(EngineId::Eng2.number(), 2);
    }
}
