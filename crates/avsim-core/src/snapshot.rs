//! ---
//! avsim_section: "01-core-functionality"
//! avsim_subsection: "module"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Display snapshot copied out of the coordinator each tick."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use avsim_faults::{ActiveFault, ScenarioStatus};
use avsim_model::{
    AircraftState, ElectricalSystem, EngineState, FlightControls, FuelState, HydraulicSystem,
    PressurizationState,
};
use avsim_playback::PlaybackInfo;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::coordinator::SimMode;

/// Auxiliary power unit readout. Not simulated; always reads off.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApuSnapshot {
    pub n_pct: f64,
    pub egt_c: f64,
    pub running: bool,
    pub bleed_on: bool,
    pub generator_on: bool,
}

/// Fuel quantities converted to mass for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelSnapshot {
    pub left_kg: f64,
    pub center_kg: f64,
    pub right_kg: f64,
    pub total_kg: f64,
    pub imbalance_kg: f64,
    pub temperature_c: f64,
    pub leaking: bool,
}

impl From<&FuelState> for FuelSnapshot {
    fn from(fuel: &FuelState) -> Self {
        let density = avsim_model::fuel::FUEL_DENSITY_KG_L;
        Self {
            left_kg: fuel.left_l * density,
            center_kg: fuel.center_l * density,
            right_kg: fuel.right_l * density,
            total_kg: fuel.total_kg(),
            imbalance_kg: fuel.imbalance_kg(),
            temperature_c: fuel.fuel_temp_c,
            leaking: fuel.left_leak_l_s > 0.0
                || fuel.center_leak_l_s > 0.0
                || fuel.right_leak_l_s > 0.0,
        }
    }
}

/// Everything a display needs for one frame, detached from the coordinator.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSnapshot {
    pub captured_at: DateTime<Utc>,
    pub mode: SimMode,
    pub tick: u64,
    pub aircraft: AircraftState,
    pub engines: [EngineState; 2],
    pub hydraulics: HydraulicSystem,
    pub electrical: ElectricalSystem,
    pub pressurization: PressurizationState,
    pub fuel: FuelSnapshot,
    pub controls: FlightControls,
    pub apu: ApuSnapshot,
    pub active_faults: Vec<ActiveFault>,
    pub alarms: Vec<String>,
    pub scenario: Option<ScenarioStatus>,
    pub playback: PlaybackInfo,
}

impl SimulationSnapshot {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize simulation snapshot")
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)
            .with_context(|| format!("unable to write snapshot {}", path.display()))
    }

    /// Short single-line status for consoles.
    pub fn summary(&self) -> String {
        format!(
            "[{}] tick {} {} ALT {:.0} ft IAS {:.0} kt VS {:+.0} fpm N1 {:.1}/{:.1} % FOB {:.0} kg faults {}",
            self.mode,
            self.tick,
            self.aircraft.phase,
            self.aircraft.altitude_ft,
            self.aircraft.airspeed_kt,
            self.aircraft.vertical_speed_fpm,
            self.engines[0].n1_pct,
            self.engines[1].n1_pct,
            self.fuel.total_kg,
            self.active_faults.len(),
        )
    }
}
