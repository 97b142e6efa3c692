//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "03-playback"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Versioned recorded-parameter to model-field table."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
//! Fixed mapping between recorder parameter names and model fields.
//!
//! The table is a contract with recorded files: renaming a parameter or
//! changing its unit changes what an existing recording drives, and requires a
//! bump of [`PARAMETER_TABLE_VERSION`].

use avsim_model::fuel::FUEL_DENSITY_KG_L;
use avsim_model::{AircraftModel, FlightPhase};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::frames::FrameValue;

pub const PARAMETER_TABLE_VERSION: u32 = 1;

/// How a recorded value is carried between two frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Linearly interpolated.
    Continuous,
    /// Held from the earlier frame; non-zero means on.
    Discrete,
    /// Flight phase name, held from the earlier frame.
    Phase,
}

type Getter = fn(&AircraftModel) -> f64;
type Setter = fn(&mut AircraftModel, f64);

/// Typed accessor pair for one parameter.
#[derive(Clone, Copy)]
pub struct ParameterSpec {
    pub parameter: Parameter,
    pub name: &'static str,
    pub unit: &'static str,
    pub kind: ValueKind,
    get: Getter,
    set: Setter,
}

impl ParameterSpec {
    pub fn read(&self, model: &AircraftModel) -> f64 {
        (self.get)(model)
    }

    pub fn write(&self, model: &mut AircraftModel, value: f64) {
        if value.is_finite() {
            (self.set)(model, value);
        }
    }

    /// Current model value in recorder form.
    pub fn sample(&self, model: &AircraftModel) -> FrameValue {
        let value = self.read(model);
        match self.kind {
            ValueKind::Phase => FrameValue::Text(
                phase_from_ordinal(value)
                    .map(|phase| phase.as_str())
                    .unwrap_or_default()
                    .to_string(),
            ),
            ValueKind::Continuous | ValueKind::Discrete => FrameValue::Number(value),
        }
    }

    /// Numeric form of a recorded cell, `None` if the cell cannot drive this
    /// parameter.
    pub fn decode(&self, value: &FrameValue) -> Option<f64> {
        match (self.kind, value) {
            (_, FrameValue::Number(number)) if number.is_finite() => Some(*number),
            (ValueKind::Discrete, FrameValue::Flag(on)) => Some(flag(*on)),
            (ValueKind::Phase, FrameValue::Text(text)) => {
                text.trim().parse::<FlightPhase>().ok().map(phase_ordinal)
            }
            (ValueKind::Discrete, FrameValue::Text(text)) => {
                match text.trim().to_ascii_uppercase().as_str() {
                    "ON" | "TRUE" | "YES" => Some(1.0),
                    "OFF" | "FALSE" | "NO" => Some(0.0),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Value between `a` (t = 0) and `b` (t = 1).
    pub fn interpolate(&self, a: f64, b: f64, t: f64) -> f64 {
        match self.kind {
            ValueKind::Continuous => a + (b - a) * t,
            ValueKind::Discrete | ValueKind::Phase => a,
        }
    }
}

impl std::fmt::Debug for ParameterSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterSpec")
            .field("name", &self.name)
            .field("unit", &self.unit)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Resolve a column header to a parameter. Case and surrounding whitespace are
/// ignored.
pub fn resolve(name: &str) -> Option<Parameter> {
    name.trim().parse().ok()
}

/// Every parameter in table order.
pub fn all_parameters() -> Vec<Parameter> {
    Parameter::iter().collect()
}

fn flag(on: bool) -> f64 {
    if on {
        1.0
    } else {
        0.0
    }
}

fn phase_ordinal(phase: FlightPhase) -> f64 {
    FlightPhase::iter()
        .position(|candidate| candidate == phase)
        .unwrap_or_default() as f64
}

fn phase_from_ordinal(value: f64) -> Option<FlightPhase> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    FlightPhase::iter().nth(value.round() as usize)
}

macro_rules! parameter_table {
    ($($variant:ident => $name:literal, $unit:literal, $kind:ident, $get:expr, $set:expr;)+) => {
        /// Recorded parameter known to the playback table.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
        #[strum(ascii_case_insensitive)]
        pub enum Parameter {
            $(
                #[strum(serialize = $name)]
                $variant,
            )+
        }

        impl Parameter {
            pub fn spec(self) -> ParameterSpec {
                match self {
                    $(
                        Parameter::$variant => ParameterSpec {
                            parameter: self,
                            name: $name,
                            unit: $unit,
                            kind: ValueKind::$kind,
                            get: $get,
                            set: $set,
                        },
                    )+
                }
            }

            pub fn name(self) -> &'static str {
                self.into()
            }
        }
    };
}

parameter_table! {
    AltStd => "ALT_STD", "ft", Continuous,
        |m| m.aircraft.altitude_ft, |m, v| m.aircraft.altitude_ft = v.max(0.0);
    Ias => "IAS", "kt", Continuous,
        |m| m.aircraft.airspeed_kt, |m, v| m.aircraft.airspeed_kt = v.max(0.0);
    Vs => "VS", "fpm", Continuous,
        |m| m.aircraft.vertical_speed_fpm, |m, v| m.aircraft.vertical_speed_fpm = v;
    Heading => "HDG", "deg", Continuous,
        |m| m.aircraft.heading_deg, |m, v| m.aircraft.heading_deg = v.rem_euclid(360.0);
    Pitch => "PITCH", "deg", Continuous,
        |m| m.aircraft.pitch_deg, |m, v| m.aircraft.pitch_deg = v;
    Roll => "ROLL", "deg", Continuous,
        |m| m.aircraft.roll_deg, |m, v| m.aircraft.roll_deg = v;
    GrossWeight => "GW", "kg", Continuous,
        |m| m.aircraft.gross_weight_kg, |m, v| m.aircraft.gross_weight_kg = v.max(0.0);
    FuelOnBoard => "FOB", "kg", Continuous,
        |m| m.aircraft.fuel_remaining_kg, |m, v| m.aircraft.fuel_remaining_kg = v.max(0.0);
    Sat => "SAT", "degC", Continuous,
        |m| m.aircraft.outside_air_temp_c, |m, v| m.aircraft.outside_air_temp_c = v;
    Tat => "TAT", "degC", Continuous,
        |m| m.aircraft.total_air_temp_c, |m, v| m.aircraft.total_air_temp_c = v;
    Mach => "MACH", "", Continuous,
        |m| m.aircraft.mach, |m, v| m.aircraft.mach = v.max(0.0);
    Phase => "FLIGHT_PHASE", "", Phase,
        |m| phase_ordinal(m.aircraft.phase),
        |m, v| if let Some(phase) = phase_from_ordinal(v) { m.aircraft.phase = phase };

    Eng1N1 => "ENG_1_N1", "%", Continuous,
        |m| m.engines[0].n1_pct, |m, v| m.engines[0].n1_pct = v.clamp(0.0, 100.0);
    Eng1N2 => "ENG_1_N2", "%", Continuous,
        |m| m.engines[0].n2_pct, |m, v| m.engines[0].n2_pct = v.clamp(0.0, 105.0);
    Eng1Egt => "ENG_1_EGT", "degC", Continuous,
        |m| m.engines[0].egt_c, |m, v| m.engines[0].egt_c = v;
    Eng1Ff => "ENG_1_FF", "kg/h", Continuous,
        |m| m.engines[0].fuel_flow_kg_h, |m, v| m.engines[0].fuel_flow_kg_h = v.max(0.0);
    Eng1OilPress => "ENG_1_OIL_PRESS", "psi", Continuous,
        |m| m.engines[0].oil_pressure_psi, |m, v| m.engines[0].oil_pressure_psi = v.max(0.0);
    Eng1OilTemp => "ENG_1_OIL_TEMP", "degC", Continuous,
        |m| m.engines[0].oil_temp_c, |m, v| m.engines[0].oil_temp_c = v;
    Eng1OilQty => "ENG_1_OIL_QTY", "%", Continuous,
        |m| m.engines[0].oil_quantity_pct, |m, v| m.engines[0].oil_quantity_pct = v.clamp(0.0, 100.0);
    Eng1VibN1 => "ENG_1_VIB_N1", "", Continuous,
        |m| m.engines[0].vibration_n1, |m, v| m.engines[0].vibration_n1 = v.max(0.0);
    Eng1VibN2 => "ENG_1_VIB_N2", "", Continuous,
        |m| m.engines[0].vibration_n2, |m, v| m.engines[0].vibration_n2 = v.max(0.0);
    Eng1Running => "ENG_1_RUNNING", "bool", Discrete,
        |m| flag(m.engines[0].running), |m, v| m.engines[0].running = v >= 0.5;
    Eng1Fire => "ENG_1_FIRE", "bool", Discrete,
        |m| flag(m.engines[0].fire), |m, v| m.engines[0].fire = v >= 0.5;

    Eng2N1 => "ENG_2_N1", "%", Continuous,
        |m| m.engines[1].n1_pct, |m, v| m.engines[1].n1_pct = v.clamp(0.0, 100.0);
    Eng2N2 => "ENG_2_N2", "%", Continuous,
        |m| m.engines[1].n2_pct, |m, v| m.engines[1].n2_pct = v.clamp(0.0, 105.0);
    Eng2Egt => "ENG_2_EGT", "degC", Continuous,
        |m| m.engines[1].egt_c, |m, v| m.engines[1].egt_c = v;
    Eng2Ff => "ENG_2_FF", "kg/h", Continuous,
        |m| m.engines[1].fuel_flow_kg_h, |m, v| m.engines[1].fuel_flow_kg_h = v.max(0.0);
    Eng2OilPress => "ENG_2_OIL_PRESS", "psi", Continuous,
        |m| m.engines[1].oil_pressure_psi, |m, v| m.engines[1].oil_pressure_psi = v.max(0.0);
    Eng2OilTemp => "ENG_2_OIL_TEMP", "degC", Continuous,
        |m| m.engines[1].oil_temp_c, |m, v| m.engines[1].oil_temp_c = v;
    Eng2OilQty => "ENG_2_OIL_QTY", "%", Continuous,
        |m| m.engines[1].oil_quantity_pct, |m, v| m.engines[1].oil_quantity_pct = v.clamp(0.0, 100.0);
    Eng2VibN1 => "ENG_2_VIB_N1", "", Continuous,
        |m| m.engines[1].vibration_n1, |m, v| m.engines[1].vibration_n1 = v.max(0.0);
    Eng2VibN2 => "ENG_2_VIB_N2", "", Continuous,
        |m| m.engines[1].vibration_n2, |m, v| m.engines[1].vibration_n2 = v.max(0.0);
    Eng2Running => "ENG_2_RUNNING", "bool", Discrete,
        |m| flag(m.engines[1].running), |m, v| m.engines[1].running = v >= 0.5;
    Eng2Fire => "ENG_2_FIRE", "bool", Discrete,
        |m| flag(m.engines[1].fire), |m, v| m.engines[1].fire = v >= 0.5;

    HydGreenPress => "HYD_GREEN_PRESS", "psi", Continuous,
        |m| m.hydraulics.green.pressure_psi, |m, v| m.hydraulics.green.pressure_psi = v.max(0.0);
    HydBluePress => "HYD_BLUE_PRESS", "psi", Continuous,
        |m| m.hydraulics.blue.pressure_psi, |m, v| m.hydraulics.blue.pressure_psi = v.max(0.0);
    HydYellowPress => "HYD_YELLOW_PRESS", "psi", Continuous,
        |m| m.hydraulics.yellow.pressure_psi, |m, v| m.hydraulics.yellow.pressure_psi = v.max(0.0);
    HydGreenQty => "HYD_GREEN_QTY", "%", Continuous,
        |m| m.hydraulics.green.quantity_pct, |m, v| m.hydraulics.green.quantity_pct = v.clamp(0.0, 100.0);
    HydBlueQty => "HYD_BLUE_QTY", "%", Continuous,
        |m| m.hydraulics.blue.quantity_pct, |m, v| m.hydraulics.blue.quantity_pct = v.clamp(0.0, 100.0);
    HydYellowQty => "HYD_YELLOW_QTY", "%", Continuous,
        |m| m.hydraulics.yellow.quantity_pct, |m, v| m.hydraulics.yellow.quantity_pct = v.clamp(0.0, 100.0);

    ElecAc1Volt => "ELEC_AC1_VOLT", "V", Continuous,
        |m| m.electrical.ac1.voltage_v, |m, v| m.electrical.ac1.voltage_v = v.max(0.0);
    ElecAc2Volt => "ELEC_AC2_VOLT", "V", Continuous,
        |m| m.electrical.ac2.voltage_v, |m, v| m.electrical.ac2.voltage_v = v.max(0.0);
    ElecDc1Volt => "ELEC_DC1_VOLT", "V", Continuous,
        |m| m.electrical.dc1.voltage_v, |m, v| m.electrical.dc1.voltage_v = v.max(0.0);
    ElecDc2Volt => "ELEC_DC2_VOLT", "V", Continuous,
        |m| m.electrical.dc2.voltage_v, |m, v| m.electrical.dc2.voltage_v = v.max(0.0);
    ElecGen1Load => "ELEC_GEN1_LOAD", "%", Continuous,
        |m| m.electrical.gen1.load_pct, |m, v| m.electrical.gen1.load_pct = v.clamp(0.0, 100.0);
    ElecGen2Load => "ELEC_GEN2_LOAD", "%", Continuous,
        |m| m.electrical.gen2.load_pct, |m, v| m.electrical.gen2.load_pct = v.clamp(0.0, 100.0);
    ElecBatVolt => "ELEC_BAT_VOLT", "V", Continuous,
        |m| m.electrical.battery.voltage_v, |m, v| m.electrical.battery.voltage_v = v.max(0.0);

    CabAlt => "CAB_ALT", "ft", Continuous,
        |m| m.pressurization.cabin_altitude_ft, |m, v| m.pressurization.cabin_altitude_ft = v.max(0.0);
    CabVs => "CAB_VS", "fpm", Continuous,
        |m| m.pressurization.cabin_rate_fpm, |m, v| m.pressurization.cabin_rate_fpm = v;
    CabDiff => "CAB_DIFF", "psi", Continuous,
        |m| m.pressurization.differential_psi, |m, v| m.pressurization.differential_psi = v.max(0.0);

    FuelLeft => "FUEL_QTY_LEFT", "kg", Continuous,
        |m| m.fuel.left_l * FUEL_DENSITY_KG_L, |m, v| m.fuel.left_l = v.max(0.0) / FUEL_DENSITY_KG_L;
    FuelCenter => "FUEL_QTY_CENTER", "kg", Continuous,
        |m| m.fuel.center_l * FUEL_DENSITY_KG_L, |m, v| m.fuel.center_l = v.max(0.0) / FUEL_DENSITY_KG_L;
    FuelRight => "FUEL_QTY_RIGHT", "kg", Continuous,
        |m| m.fuel.right_l * FUEL_DENSITY_KG_L, |m, v| m.fuel.right_l = v.max(0.0) / FUEL_DENSITY_KG_L;
    FuelTemp => "FUEL_TEMP", "degC", Continuous,
        |m| m.fuel.fuel_temp_c, |m, v| m.fuel.fuel_temp_c = v;

    Flaps => "FLAPS", "deg", Continuous,
        |m| m.controls.flaps_deg, |m, v| m.controls.flaps_deg = v.max(0.0);
    Spoilers => "SPOILERS", "deg", Continuous,
        |m| m.controls.spoilers_deg, |m, v| m.controls.spoilers_deg = v.max(0.0);
    Elevator => "ELEVATOR", "deg", Continuous,
        |m| m.controls.elevator_deg, |m, v| m.controls.elevator_deg = v;
    Rudder => "RUDDER", "deg", Continuous,
        |m| m.controls.rudder_deg, |m, v| m.controls.rudder_deg = v;
    AileronLeft => "AIL_L", "deg", Continuous,
        |m| m.controls.aileron_left_deg, |m, v| m.controls.aileron_left_deg = v;
    AileronRight => "AIL_R", "deg", Continuous,
        |m| m.controls.aileron_right_deg, |m, v| m.controls.aileron_right_deg = v;
    GearDown => "GEAR_DOWN", "bool", Discrete,
        |m| flag(m.controls.gear_down), |m, v| m.controls.gear_down = v >= 0.5;
}

#[cfg(test)]
mod tests {
    use super::*;
    use avsim_model::EngineId;

    #[test]
    fn names_resolve_case_insensitively() {
        assert_eq!(resolve("ENG_1_N1"), Some(Parameter::Eng1N1));
        assert_eq!(resolve(" alt_std "), Some(Parameter::AltStd));
        assert_eq!(resolve("TIME"), None);
        assert_eq!(Parameter::HydBluePress.name(), "HYD_BLUE_PRESS");
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = all_parameters().into_iter().map(Parameter::name).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn setters_write_the_named_field() {
        let mut model = AircraftModel::deterministic();
        Parameter::Eng2N1.spec().write(&mut model, 42.0);
        assert_eq!(model.engine(EngineId::Eng2).n1_pct, 42.0);
        Parameter::FuelCenter.spec().write(&mut model, 800.0);
        assert!((model.fuel.center_l - 1_000.0).abs() < 1e-9);
        Parameter::Eng1Running.spec().write(&mut model, 0.0);
        assert!(!model.engine(EngineId::Eng1).running);
    }

    #[test]
    fn phase_travels_as_text() {
        let spec = Parameter::Phase.spec();
        let mut model = AircraftModel::deterministic();
        let decoded = spec.decode(&FrameValue::Text("approach".into())).unwrap();
        spec.write(&mut model, decoded);
        assert_eq!(model.phase(), FlightPhase::Approach);
        assert_eq!(spec.sample(&model), FrameValue::Text("APPROACH".into()));
        assert_eq!(spec.decode(&FrameValue::Text("HOVER".into())), None);
    }

    #[test]
    fn discrete_values_hold_between_frames() {
        let gear = Parameter::GearDown.spec();
        assert_eq!(gear.interpolate(1.0, 0.0, 0.9), 1.0);
        let n1 = Parameter::Eng1N1.spec();
        assert_eq!(n1.interpolate(80.0, 90.0, 0.5), 85.0);
    }
}
