//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "02-model"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Fuel tank quantities, burn sequencing and leaks."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::smoothing::approach;

pub const FUEL_DENSITY_KG_L: f64 = 0.8;
pub const CENTER_CAPACITY_L: f64 = 16_000.0;
pub const WING_CAPACITY_L: f64 = 7_500.0;
const FUEL_TEMP_RATE_C_S: f64 = 0.02;

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
pub enum FuelTank {
    Left,
    Center,
    Right,
}

/// Tank quantities in litres plus per-tank leak rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelState {
    pub left_l: f64,
    pub center_l: f64,
    pub right_l: f64,
    /// Leak rates in L/s. Faults add to these; nothing subtracts.
    pub left_leak_l_s: f64,
    pub center_leak_l_s: f64,
    pub right_leak_l_s: f64,
    pub fuel_temp_c: f64,
    /// Total engine burn over the last update, L/s.
    pub consumption_l_s: f64,
}

impl Default for FuelState {
    fn default() -> Self {
        Self {
            left_l: 6_500.0,
            center_l: 6_000.0,
            right_l: 6_500.0,
            left_leak_l_s: 0.0,
            center_leak_l_s: 0.0,
            right_leak_l_s: 0.0,
            fuel_temp_c: 10.0,
            consumption_l_s: 0.0,
        }
    }
}

impl FuelState {
    pub fn quantity_l(&self, tank: FuelTank) -> f64 {
        match tank {
            FuelTank::Left => self.left_l,
            FuelTank::Center => self.center_l,
            FuelTank::Right => self.right_l,
        }
    }

    pub fn set_quantity_l(&mut self, tank: FuelTank, litres: f64) {
        let capacity = capacity_l(tank);
        let value = litres.clamp(0.0, capacity);
        match tank {
            FuelTank::Left => self.left_l = value,
            FuelTank::Center => self.center_l = value,
            FuelTank::Right => self.right_l = value,
        }
    }

    /// Add a leak to `tank`. Leaks accumulate across repeated faults.
    pub fn add_leak(&mut self, tank: FuelTank, rate_l_s: f64) {
        let rate = rate_l_s.max(0.0);
        match tank {
            FuelTank::Left => self.left_leak_l_s += rate,
            FuelTank::Center => self.center_leak_l_s += rate,
            FuelTank::Right => self.right_leak_l_s += rate,
        }
    }

    pub fn leak_rate_l_s(&self, tank: FuelTank) -> f64 {
        match tank {
            FuelTank::Left => self.left_leak_l_s,
            FuelTank::Center => self.center_leak_l_s,
            FuelTank::Right => self.right_leak_l_s,
        }
    }

    pub fn total_l(&self) -> f64 {
        self.left_l + self.center_l + self.right_l
    }

    pub fn total_kg(&self) -> f64 {
        self.total_l() * FUEL_DENSITY_KG_L
    }

    /// Left minus right wing quantity in kg.
    pub fn imbalance_kg(&self) -> f64 {
        (self.left_l - self.right_l) * FUEL_DENSITY_KG_L
    }

    pub fn is_empty(&self) -> bool {
        self.total_l() <= 0.0
    }

    /// Burn `total_fuel_flow_kg_h` for `dt` seconds and apply leaks.
    ///
    /// Engine burn comes from the center tank first, then the wings split
    /// evenly; a dry wing's share falls to the other wing. Leaks drain their
    /// own tank on top of engine burn.
    pub fn update(&mut self, total_fuel_flow_kg_h: f64, oat_c: f64, dt: f64) {
        self.consumption_l_s = total_fuel_flow_kg_h.max(0.0) / 3_600.0 / FUEL_DENSITY_KG_L;
        self.draw(self.consumption_l_s * dt);

        self.left_l = (self.left_l - self.left_leak_l_s * dt).max(0.0);
        self.center_l = (self.center_l - self.center_leak_l_s * dt).max(0.0);
        self.right_l = (self.right_l - self.right_leak_l_s * dt).max(0.0);

        let temp_target = (oat_c + 20.0).clamp(-45.0, 50.0);
        self.fuel_temp_c = approach(self.fuel_temp_c, temp_target, FUEL_TEMP_RATE_C_S, dt);
    }

    fn draw(&mut self, burn_l: f64) {
        let from_center = burn_l.min(self.center_l);
        self.center_l -= from_center;
        let remaining = burn_l - from_center;
        if remaining <= 0.0 {
            return;
        }
        let half = remaining / 2.0;
        let from_left = half.min(self.left_l);
        let from_right = half.min(self.right_l);
        self.left_l -= from_left;
        self.right_l -= from_right;
        let shortfall = remaining - from_left - from_right;
        if shortfall > 0.0 {
            let extra_left = shortfall.min(self.left_l);
            self.left_l -= extra_left;
            let extra_right = (shortfall - extra_left).min(self.right_l);
            self.right_l -= extra_right;
        }
    }
}

pub fn capacity_l(tank: FuelTank) -> f64 {
    match tank {
        FuelTank::Center => CENTER_CAPACITY_L,
        FuelTank::Left | FuelTank::Right => WING_CAPACITY_L,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn litres_per_hour_as_kg(l_h: f64) -> f64 {
        l_h * FUEL_DENSITY_KG_L
    }

    #[test]
    fn burns_center_tank_first() {
        let mut fuel = FuelState::default();
        fuel.update(litres_per_hour_as_kg(3_600.0), 0.0, 10.0);
        assert!((fuel.center_l - 5_990.0).abs() < 1e-9);
        assert_eq!(fuel.left_l, 6_500.0);
        assert_eq!(fuel.right_l, 6_500.0);
    }

    #[test]
    fn wings_split_evenly_once_center_is_dry() {
        let mut fuel = FuelState {
            center_l: 4.0,
            ..FuelState::default()
        };
        fuel.update(litres_per_hour_as_kg(3_600.0), 0.0, 10.0);
        assert_eq!(fuel.center_l, 0.0);
        assert!((fuel.left_l - 6_497.0).abs() < 1e-9);
        assert!((fuel.right_l - 6_497.0).abs() < 1e-9);
    }

    #[test]
    fn dry_wing_share_moves_to_other_wing() {
        let mut fuel = FuelState {
            center_l: 0.0,
            left_l: 1.0,
            ..FuelState::default()
        };
        fuel.update(litres_per_hour_as_kg(3_600.0), 0.0, 10.0);
        assert_eq!(fuel.left_l, 0.0);
        assert!((fuel.right_l - 6_491.0).abs() < 1e-9);
    }

    #[test]
    fn leaks_accumulate_and_drain_their_tank() {
        let mut fuel = FuelState::default();
        fuel.add_leak(FuelTank::Left, 2.0);
        fuel.add_leak(FuelTank::Left, 3.0);
        assert_eq!(fuel.leak_rate_l_s(FuelTank::Left), 5.0);
        fuel.update(0.0, 0.0, 10.0);
        assert!((fuel.left_l - 6_450.0).abs() < 1e-9);
        assert_eq!(fuel.right_l, 6_500.0);
    }

    #[test]
    fn quantities_never_go_negative() {
        let mut fuel = FuelState {
            left_l: 1.0,
            center_l: 0.0,
            right_l: 1.0,
            ..FuelState::default()
        };
        fuel.add_leak(FuelTank::Right, 100.0);
        fuel.update(litres_per_hour_as_kg(36_000.0), 0.0, 60.0);
        assert_eq!(fuel.total_l(), 0.0);
        assert!(fuel.is_empty());
    }
}
