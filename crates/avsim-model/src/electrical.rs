//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "02-model"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "AC/DC electrical network with generators and battery."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::noise::NoiseSource;
use crate::smoothing::{approach, clamp_pct};

pub const AC_NOMINAL_V: f64 = 115.0;
pub const AC_NOMINAL_HZ: f64 = 400.0;
pub const DC_NOMINAL_V: f64 = 28.0;
/// Minimum N2 for the integrated drive generator to come online.
pub const GENERATOR_MIN_N2_PCT: f64 = 50.0;
const GENERATOR_RATING_KVA: f64 = 90.0;
const NETWORK_LOAD_KVA: f64 = 60.0;
const BATTERY_CHARGE_PCT_S: f64 = 0.05;
const BATTERY_DRAIN_PCT_S: f64 = 0.1;
const BATTERY_EMPTY_V: f64 = 24.0;
const BATTERY_FULL_V: f64 = 28.5;

/// Generator position; also names the AC bus it normally feeds.
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
pub enum GeneratorId {
    Gen1,
    Gen2,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub online: bool,
    pub failed: bool,
    pub voltage_v: f64,
    pub frequency_hz: f64,
    pub load_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcBus {
    pub powered: bool,
    pub failed: bool,
    pub voltage_v: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DcBus {
    pub powered: bool,
    pub voltage_v: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    pub voltage_v: f64,
    pub charge_pct: f64,
    pub charging: bool,
}

impl Default for Battery {
    fn default() -> Self {
        Self {
            voltage_v: BATTERY_FULL_V,
            charge_pct: 100.0,
            charging: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElectricalSystem {
    pub gen1: Generator,
    pub gen2: Generator,
    pub ac1: AcBus,
    pub ac2: AcBus,
    pub dc1: DcBus,
    pub dc2: DcBus,
    pub battery: Battery,
    /// Closed when a single generator feeds both AC buses.
    pub cross_tie_closed: bool,
}

impl ElectricalSystem {
    pub fn generator(&self, id: GeneratorId) -> &Generator {
        match id {
            GeneratorId::Gen1 => &self.gen1,
            GeneratorId::Gen2 => &self.gen2,
        }
    }

    pub fn generator_mut(&mut self, id: GeneratorId) -> &mut Generator {
        match id {
            GeneratorId::Gen1 => &mut self.gen1,
            GeneratorId::Gen2 => &mut self.gen2,
        }
    }

    pub fn ac_bus_mut(&mut self, id: GeneratorId) -> &mut AcBus {
        match id {
            GeneratorId::Gen1 => &mut self.ac1,
            GeneratorId::Gen2 => &mut self.ac2,
        }
    }

    pub fn ac_powered(&self) -> bool {
        self.ac1.powered || self.ac2.powered
    }

    /// `engine_n2` holds `(running, n2_pct)` per engine.
    pub fn update(&mut self, engine_n2: [(bool, f64); 2], dt: f64, noise: &mut dyn NoiseSource) {
        let [(eng1_running, eng1_n2), (eng2_running, eng2_n2)] = engine_n2;
        update_generator(&mut self.gen1, eng1_running, eng1_n2, noise);
        update_generator(&mut self.gen2, eng2_running, eng2_n2, noise);

        let online = [self.gen1.online, self.gen2.online];
        let online_count = online.iter().filter(|on| **on).count();
        let load_pct = if online_count > 0 {
            clamp_pct(NETWORK_LOAD_KVA / (online_count as f64 * GENERATOR_RATING_KVA) * 100.0)
        } else {
            0.0
        };
        for generator in [&mut self.gen1, &mut self.gen2] {
            generator.load_pct = if generator.online { load_pct } else { 0.0 };
        }

        self.cross_tie_closed = online_count == 1;
        let any_online = online_count > 0;
        update_ac_bus(&mut self.ac1, online[0] || (self.cross_tie_closed && any_online), noise);
        update_ac_bus(&mut self.ac2, online[1] || (self.cross_tie_closed && any_online), noise);

        self.battery.charging = any_online;
        let charge_delta = if any_online {
            BATTERY_CHARGE_PCT_S
        } else {
            -BATTERY_DRAIN_PCT_S
        };
        self.battery.charge_pct = clamp_pct(self.battery.charge_pct + charge_delta * dt);
        let battery_target_v =
            BATTERY_EMPTY_V + (BATTERY_FULL_V - BATTERY_EMPTY_V) * self.battery.charge_pct / 100.0;
        self.battery.voltage_v = approach(self.battery.voltage_v, battery_target_v, 0.5, dt);

        let battery_v = if self.battery.charge_pct > 0.0 {
            self.battery.voltage_v
        } else {
            0.0
        };
        let ac = [self.ac1.powered, self.ac2.powered];
        for (bus, ac_powered) in [&mut self.dc1, &mut self.dc2].into_iter().zip(ac) {
            if ac_powered {
                bus.powered = true;
                bus.voltage_v = (DC_NOMINAL_V + noise.sample(0.1)).max(0.0);
            } else {
                bus.powered = battery_v > 0.0;
                bus.voltage_v = battery_v;
            }
        }
    }
}

fn update_generator(
    generator: &mut Generator,
    engine_running: bool,
    n2_pct: f64,
    noise: &mut dyn NoiseSource,
) {
    generator.online = !generator.failed && engine_running && n2_pct >= GENERATOR_MIN_N2_PCT;
    if generator.online {
        generator.voltage_v = (AC_NOMINAL_V + noise.sample(0.5)).max(0.0);
        generator.frequency_hz = (AC_NOMINAL_HZ + noise.sample(1.0)).max(0.0);
    } else {
        generator.voltage_v = 0.0;
        generator.frequency_hz = 0.0;
    }
}

fn update_ac_bus(bus: &mut AcBus, fed: bool, noise: &mut dyn NoiseSource) {
    bus.powered = fed && !bus.failed;
    bus.voltage_v = if bus.powered {
        (AC_NOMINAL_V + noise.sample(0.5)).max(0.0)
    } else {
        0.0
    };
}
