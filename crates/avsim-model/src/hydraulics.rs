//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "02-model"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Three-circuit hydraulic system."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::noise::NoiseSource;
use crate::smoothing::{approach, clamp_pct};

pub const NOMINAL_PRESSURE_PSI: f64 = 3_000.0;
pub const PRESSURE_RATE_PSI_S: f64 = 1_500.0;
pub const TEMPERATURE_RATE_C_S: f64 = 0.5;
/// Circuits below this pressure cannot move flight controls.
pub const MIN_USABLE_PRESSURE_PSI: f64 = 1_500.0;
const MIN_PUMPING_QUANTITY_PCT: f64 = 15.0;
const MAX_PRESSURE_PSI: f64 = 3_200.0;

/// Hydraulic circuit. GREEN is driven by engine 1, YELLOW by engine 2, BLUE by
/// an electric pump.
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
pub enum HydraulicCircuitId {
    Green,
    Blue,
    Yellow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydraulicCircuit {
    pub pressure_psi: f64,
    pub quantity_pct: f64,
    pub temperature_c: f64,
    pub pump_on: bool,
    pub pump_failed: bool,
    /// Fluid lost per second, percent of reservoir.
    pub leak_pct_s: f64,
}

impl HydraulicCircuit {
    pub fn pressurised() -> Self {
        Self {
            pressure_psi: NOMINAL_PRESSURE_PSI,
            quantity_pct: 100.0,
            temperature_c: 55.0,
            pump_on: true,
            pump_failed: false,
            leak_pct_s: 0.0,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.pressure_psi >= MIN_USABLE_PRESSURE_PSI
    }

    pub fn update(&mut self, driven: bool, dt: f64, noise: &mut dyn NoiseSource) {
        self.quantity_pct = clamp_pct(self.quantity_pct - self.leak_pct_s * dt);
        self.pump_on = driven && !self.pump_failed;
        let target = if self.pump_on && self.quantity_pct > MIN_PUMPING_QUANTITY_PCT {
            NOMINAL_PRESSURE_PSI
        } else {
            0.0
        };
        let mut pressure = approach(self.pressure_psi, target, PRESSURE_RATE_PSI_S, dt);
        if target > 0.0 && pressure >= target {
            pressure += noise.sample(15.0);
        }
        self.pressure_psi = pressure.clamp(0.0, MAX_PRESSURE_PSI);

        let temperature_target = 35.0 + self.pressure_psi / NOMINAL_PRESSURE_PSI * 20.0;
        self.temperature_c = approach(
            self.temperature_c,
            temperature_target,
            TEMPERATURE_RATE_C_S,
            dt,
        );
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydraulicSystem {
    pub green: HydraulicCircuit,
    pub blue: HydraulicCircuit,
    pub yellow: HydraulicCircuit,
}

impl Default for HydraulicSystem {
    fn default() -> Self {
        Self {
            green: HydraulicCircuit::pressurised(),
            blue: HydraulicCircuit::pressurised(),
            yellow: HydraulicCircuit::pressurised(),
        }
    }
}

impl HydraulicSystem {
    pub fn circuit(&self, id: HydraulicCircuitId) -> &HydraulicCircuit {
        match id {
            HydraulicCircuitId::Green => &self.green,
            HydraulicCircuitId::Blue => &self.blue,
            HydraulicCircuitId::Yellow => &self.yellow,
        }
    }

    pub fn circuit_mut(&mut self, id: HydraulicCircuitId) -> &mut HydraulicCircuit {
        match id {
            HydraulicCircuitId::Green => &mut self.green,
            HydraulicCircuitId::Blue => &mut self.blue,
            HydraulicCircuitId::Yellow => &mut self.yellow,
        }
    }

    pub fn usable_circuits(&self) -> usize {
        [&self.green, &self.blue, &self.yellow]
            .into_iter()
            .filter(|circuit| circuit.is_usable())
            .count()
    }

    /// `ac_powered` reflects the electrical state from the previous tick since
    /// hydraulics update before electrics.
    pub fn update(
        &mut self,
        eng1_running: bool,
        eng2_running: bool,
        ac_powered: bool,
        dt: f64,
        noise: &mut dyn NoiseSource,
    ) {
        self.green.update(eng1_running, dt, noise);
        self.blue.update(ac_powered, dt, noise);
        self.yellow.update(eng2_running, dt, noise);
    }
}
