//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "faults"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Static fault catalog: definitions, targets, effects and alarms."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use std::fmt;

use avsim_model::{
    AircraftModel, EngineId, FlightPhase, FuelTank, GeneratorId, HydraulicCircuitId, PackId,
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::FaultError;

/// Closed set of injectable faults. The string form is the control-surface code.
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
pub enum FaultKind {
    EngFlameout,
    EngFire,
    EngOilLeak,
    EngVibration,
    EngEgtOverlimit,
    HydPumpFailure,
    HydLeak,
    GenFailure,
    BusFailure,
    FuelLeak,
    CabinDecompression,
    PackFailure,
    FlapJam,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn definition(self) -> &'static FaultDefinition {
        match self {
            FaultKind::EngFlameout => &ENG_FLAMEOUT,
            FaultKind::EngFire => &ENG_FIRE,
            FaultKind::EngOilLeak => &ENG_OIL_LEAK,
            FaultKind::EngVibration => &ENG_VIBRATION,
            FaultKind::EngEgtOverlimit => &ENG_EGT_OVERLIMIT,
            FaultKind::HydPumpFailure => &HYD_PUMP_FAILURE,
            FaultKind::HydLeak => &HYD_LEAK,
            FaultKind::GenFailure => &GEN_FAILURE,
            FaultKind::BusFailure => &BUS_FAILURE,
            FaultKind::FuelLeak => &FUEL_LEAK,
            FaultKind::CabinDecompression => &CABIN_DECOMPRESSION,
            FaultKind::PackFailure => &PACK_FAILURE,
            FaultKind::FlapJam => &FLAP_JAM,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Severity {
    Advisory,
    Caution,
    Warning,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Subsystem {
    Engines,
    Hydraulics,
    Electrical,
    Fuel,
    Pressurization,
    FlightControls,
}

/// Shape of target a fault accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TargetKind {
    #[strum(serialize = "eng1|eng2")]
    Engine,
    #[strum(serialize = "green|blue|yellow")]
    Circuit,
    #[strum(serialize = "gen1|gen2")]
    Generator,
    #[strum(serialize = "ac1|ac2")]
    Bus,
    #[strum(serialize = "left|center|right")]
    Tank,
    #[strum(serialize = "pack1|pack2")]
    Pack,
    #[strum(serialize = "no target")]
    Aircraft,
}

/// Resolved fault target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultTarget {
    Engine(EngineId),
    Circuit(HydraulicCircuitId),
    Generator(GeneratorId),
    /// AC bus, named after the generator that normally feeds it.
    Bus(GeneratorId),
    Tank(FuelTank),
    Pack(PackId),
    Aircraft,
}

impl FaultTarget {
    fn parse(kind: TargetKind, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match kind {
            TargetKind::Engine => raw.parse().ok().map(FaultTarget::Engine),
            TargetKind::Circuit => raw.parse().ok().map(FaultTarget::Circuit),
            TargetKind::Generator => raw.parse().ok().map(FaultTarget::Generator),
            TargetKind::Bus => match raw.to_ascii_lowercase().as_str() {
                "ac1" => Some(FaultTarget::Bus(GeneratorId::Gen1)),
                "ac2" => Some(FaultTarget::Bus(GeneratorId::Gen2)),
                _ => None,
            },
            TargetKind::Tank => raw.parse().ok().map(FaultTarget::Tank),
            TargetKind::Pack => raw.parse().ok().map(FaultTarget::Pack),
            TargetKind::Aircraft => Some(FaultTarget::Aircraft),
        }
    }
}

impl fmt::Display for FaultTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultTarget::Engine(id) => write!(f, "{id}"),
            FaultTarget::Circuit(id) => write!(f, "{id}"),
            FaultTarget::Generator(id) => write!(f, "{id}"),
            FaultTarget::Bus(GeneratorId::Gen1) => f.write_str("ac1"),
            FaultTarget::Bus(GeneratorId::Gen2) => f.write_str("ac2"),
            FaultTarget::Tank(tank) => write!(f, "{tank}"),
            FaultTarget::Pack(pack) => write!(f, "{pack}"),
            FaultTarget::Aircraft => f.write_str("aircraft"),
        }
    }
}

type Effect = fn(&mut AircraftModel, FaultTarget);
type AlarmGenerator = fn(FaultTarget) -> Vec<String>;

/// Immutable catalog entry describing one fault kind.
pub struct FaultDefinition {
    pub kind: FaultKind,
    pub name: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    pub subsystem: Subsystem,
    pub allowed_phases: &'static [FlightPhase],
    pub target_kind: TargetKind,
    pub default_target: FaultTarget,
    effect: Effect,
    alarms: AlarmGenerator,
}

impl FaultDefinition {
    pub fn allows(&self, phase: FlightPhase) -> bool {
        self.allowed_phases.contains(&phase)
    }

    /// Resolve a caller-supplied target; `None` or an empty string selects the
    /// default target.
    pub fn resolve_target(&self, target: Option<&str>) -> Result<FaultTarget, FaultError> {
        match target.map(str::trim).filter(|raw| !raw.is_empty()) {
            None => Ok(self.default_target),
            Some(raw) => {
                FaultTarget::parse(self.target_kind, raw).ok_or_else(|| FaultError::InvalidTarget {
                    fault: self.kind,
                    target: raw.to_string(),
                    expected: self.target_kind,
                })
            }
        }
    }

    pub fn apply(&self, model: &mut AircraftModel, target: FaultTarget) {
        (self.effect)(model, target);
    }

    pub fn alarm_codes(&self, target: FaultTarget) -> Vec<String> {
        (self.alarms)(target)
    }
}

impl fmt::Debug for FaultDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultDefinition")
            .field("kind", &self.kind)
            .field("severity", &self.severity)
            .field("subsystem", &self.subsystem)
            .field("allowed_phases", &self.allowed_phases)
            .finish_non_exhaustive()
    }
}

static CATALOG: Lazy<Vec<&'static FaultDefinition>> =
    Lazy::new(|| FaultKind::iter().map(FaultKind::definition).collect());

/// Every catalog entry in declaration order.
pub fn catalog() -> &'static [&'static FaultDefinition] {
    CATALOG.as_slice()
}

/// Look up a fault by its control-surface code.
pub fn lookup(code: &str) -> Result<&'static FaultDefinition, FaultError> {
    code.trim()
        .parse::<FaultKind>()
        .map(FaultKind::definition)
        .map_err(|_| FaultError::UnknownFault(code.to_string()))
}

use FlightPhase::{Approach, Climb, Cruise, Descent, Landing, Parked, Takeoff, Taxi};

const ALL_PHASES: &[FlightPhase] = &[Parked, Taxi, Takeoff, Climb, Cruise, Descent, Approach, Landing];
const POWERED_PHASES: &[FlightPhase] = &[Taxi, Takeoff, Climb, Cruise, Descent, Approach, Landing];
const AIRBORNE_PHASES: &[FlightPhase] = &[Takeoff, Climb, Cruise, Descent, Approach];
const HIGH_POWER_PHASES: &[FlightPhase] = &[Takeoff, Climb, Cruise, Descent];
const PRESSURISED_PHASES: &[FlightPhase] = &[Climb, Cruise, Descent];

fn engine_alarm(target: FaultTarget, suffixes: &[&str]) -> Vec<String> {
    match target {
        FaultTarget::Engine(id) => suffixes
            .iter()
            .map(|suffix| format!("ENG{}_{suffix}", id.number()))
            .collect(),
        _ => Vec::new(),
    }
}

fn target_alarm(target: FaultTarget, prefix: &str, suffix: &str) -> String {
    format!("{prefix}_{}_{suffix}", target.to_string().to_ascii_uppercase())
}

static ENG_FLAMEOUT: FaultDefinition = FaultDefinition {
    kind: FaultKind::EngFlameout,
    name: "Engine flameout",
    description: "Combustion lost; the engine spools down and stops producing thrust.",
    severity: Severity::Warning,
    subsystem: Subsystem::Engines,
    allowed_phases: AIRBORNE_PHASES,
    target_kind: TargetKind::Engine,
    default_target: FaultTarget::Engine(EngineId::Eng1),
    effect: |model, target| {
        if let FaultTarget::Engine(id) = target {
            model.engine_mut(id).flame_out();
        }
    },
    alarms: |target| engine_alarm(target, &["FLAMEOUT", "N1_LOW"]),
};

static ENG_FIRE: FaultDefinition = FaultDefinition {
    kind: FaultKind::EngFire,
    name: "Engine fire",
    description: "Fire detected in the engine nacelle; EGT rises sharply.",
    severity: Severity::Warning,
    subsystem: Subsystem::Engines,
    allowed_phases: POWERED_PHASES,
    target_kind: TargetKind::Engine,
    default_target: FaultTarget::Engine(EngineId::Eng1),
    effect: |model, target| {
        if let FaultTarget::Engine(id) = target {
            model.engine_mut(id).fire = true;
        }
    },
    alarms: |target| engine_alarm(target, &["FIRE", "EGT_HIGH"]),
};

static ENG_OIL_LEAK: FaultDefinition = FaultDefinition {
    kind: FaultKind::EngOilLeak,
    name: "Engine oil leak",
    description: "Oil quantity decreases steadily; oil pressure follows.",
    severity: Severity::Caution,
    subsystem: Subsystem::Engines,
    allowed_phases: POWERED_PHASES,
    target_kind: TargetKind::Engine,
    default_target: FaultTarget::Engine(EngineId::Eng1),
    effect: |model, target| {
        if let FaultTarget::Engine(id) = target {
            model.engine_mut(id).oil_leak_pct_s += 0.5;
        }
    },
    alarms: |target| engine_alarm(target, &["OIL_QTY_LOW", "OIL_PRESS_LOW"]),
};

static ENG_VIBRATION: FaultDefinition = FaultDefinition {
    kind: FaultKind::EngVibration,
    name: "High engine vibration",
    description: "Fan or core imbalance raises N1 and N2 vibration.",
    severity: Severity::Advisory,
    subsystem: Subsystem::Engines,
    allowed_phases: HIGH_POWER_PHASES,
    target_kind: TargetKind::Engine,
    default_target: FaultTarget::Engine(EngineId::Eng1),
    effect: |model, target| {
        if let FaultTarget::Engine(id) = target {
            model.engine_mut(id).vibration_bias += 3.0;
        }
    },
    alarms: |target| engine_alarm(target, &["VIB_HIGH"]),
};

static ENG_EGT_OVERLIMIT: FaultDefinition = FaultDefinition {
    kind: FaultKind::EngEgtOverlimit,
    name: "EGT overlimit",
    description: "Exhaust gas temperature exceeds its limit at high power.",
    severity: Severity::Caution,
    subsystem: Subsystem::Engines,
    allowed_phases: &[Takeoff, Climb],
    target_kind: TargetKind::Engine,
    default_target: FaultTarget::Engine(EngineId::Eng1),
    effect: |model, target| {
        if let FaultTarget::Engine(id) = target {
            model.engine_mut(id).egt_bias_c += 150.0;
        }
    },
    alarms: |target| engine_alarm(target, &["EGT_OVERLIMIT"]),
};

static HYD_PUMP_FAILURE: FaultDefinition = FaultDefinition {
    kind: FaultKind::HydPumpFailure,
    name: "Hydraulic pump failure",
    description: "The circuit's pump stops; pressure bleeds down.",
    severity: Severity::Caution,
    subsystem: Subsystem::Hydraulics,
    allowed_phases: ALL_PHASES,
    target_kind: TargetKind::Circuit,
    default_target: FaultTarget::Circuit(HydraulicCircuitId::Green),
    effect: |model, target| {
        if let FaultTarget::Circuit(id) = target {
            model.hydraulics.circuit_mut(id).pump_failed = true;
        }
    },
    alarms: |target| {
        vec![
            target_alarm(target, "HYD", "PUMP_FAULT"),
            target_alarm(target, "HYD", "PRESS_LOW"),
        ]
    },
};

static HYD_LEAK: FaultDefinition = FaultDefinition {
    kind: FaultKind::HydLeak,
    name: "Hydraulic leak",
    description: "Reservoir fluid is lost until the pump can no longer pressurise.",
    severity: Severity::Caution,
    subsystem: Subsystem::Hydraulics,
    allowed_phases: ALL_PHASES,
    target_kind: TargetKind::Circuit,
    default_target: FaultTarget::Circuit(HydraulicCircuitId::Green),
    effect: |model, target| {
        if let FaultTarget::Circuit(id) = target {
            model.hydraulics.circuit_mut(id).leak_pct_s += 1.0;
        }
    },
    alarms: |target| vec![target_alarm(target, "HYD", "RSVR_LO_LVL")],
};

static GEN_FAILURE: FaultDefinition = FaultDefinition {
    kind: FaultKind::GenFailure,
    name: "Generator failure",
    description: "The integrated drive generator trips offline.",
    severity: Severity::Caution,
    subsystem: Subsystem::Electrical,
    allowed_phases: POWERED_PHASES,
    target_kind: TargetKind::Generator,
    default_target: FaultTarget::Generator(GeneratorId::Gen1),
    effect: |model, target| {
        if let FaultTarget::Generator(id) = target {
            model.electrical.generator_mut(id).failed = true;
        }
    },
    alarms: |target| vec![target_alarm(target, "ELEC", "FAULT")],
};

static BUS_FAILURE: FaultDefinition = FaultDefinition {
    kind: FaultKind::BusFailure,
    name: "AC bus failure",
    description: "The AC bus is lost and cannot be fed through the cross-tie.",
    severity: Severity::Caution,
    subsystem: Subsystem::Electrical,
    allowed_phases: ALL_PHASES,
    target_kind: TargetKind::Bus,
    default_target: FaultTarget::Bus(GeneratorId::Gen1),
    effect: |model, target| {
        if let FaultTarget::Bus(id) = target {
            model.electrical.ac_bus_mut(id).failed = true;
        }
    },
    alarms: |target| vec![target_alarm(target, "ELEC", "BUS_FAULT")],
};

static FUEL_LEAK: FaultDefinition = FaultDefinition {
    kind: FaultKind::FuelLeak,
    name: "Fuel leak",
    description: "Fuel drains from the tank in addition to engine burn.",
    severity: Severity::Caution,
    subsystem: Subsystem::Fuel,
    allowed_phases: PRESSURISED_PHASES,
    target_kind: TargetKind::Tank,
    default_target: FaultTarget::Tank(FuelTank::Left),
    effect: |model, target| {
        if let FaultTarget::Tank(tank) = target {
            model.fuel.add_leak(tank, 2.0);
        }
    },
    alarms: |target| {
        vec![
            target_alarm(target, "FUEL", "LEAK"),
            "FUEL_IMBALANCE".to_string(),
        ]
    },
};

static CABIN_DECOMPRESSION: FaultDefinition = FaultDefinition {
    kind: FaultKind::CabinDecompression,
    name: "Rapid decompression",
    description: "Cabin altitude rises to aircraft altitude within seconds.",
    severity: Severity::Warning,
    subsystem: Subsystem::Pressurization,
    allowed_phases: PRESSURISED_PHASES,
    target_kind: TargetKind::Aircraft,
    default_target: FaultTarget::Aircraft,
    effect: |model, _| model.pressurization.decompression = true,
    alarms: |_| vec!["CAB_PR_EXCESS_CAB_ALT".to_string(), "MASTER_WARNING".to_string()],
};

static PACK_FAILURE: FaultDefinition = FaultDefinition {
    kind: FaultKind::PackFailure,
    name: "Air conditioning pack failure",
    description: "The pack stops supplying conditioned air.",
    severity: Severity::Advisory,
    subsystem: Subsystem::Pressurization,
    allowed_phases: POWERED_PHASES,
    target_kind: TargetKind::Pack,
    default_target: FaultTarget::Pack(PackId::Pack1),
    effect: |model, target| {
        if let FaultTarget::Pack(pack) = target {
            model.pressurization.fail_pack(pack);
        }
    },
    alarms: |target| vec![target_alarm(target, "AIR", "FAULT")],
};

static FLAP_JAM: FaultDefinition = FaultDefinition {
    kind: FaultKind::FlapJam,
    name: "Flap jam",
    description: "Flaps lock at their current position.",
    severity: Severity::Caution,
    subsystem: Subsystem::FlightControls,
    allowed_phases: &[Takeoff, Approach, Landing],
    target_kind: TargetKind::Aircraft,
    default_target: FaultTarget::Aircraft,
    effect: |model, _| model.controls.flaps_jammed = true,
    alarms: |_| vec!["F_CTL_FLAPS_LOCKED".to_string()],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_every_kind_once() {
        let kinds: Vec<FaultKind> = catalog().iter().map(|def| def.kind).collect();
        assert_eq!(kinds, FaultKind::iter().collect::<Vec<_>>());
        for def in catalog() {
            assert_eq!(def.kind.definition().kind, def.kind);
            assert!(!def.allowed_phases.is_empty());
        }
    }

    #[test]
    fn codes_round_trip_through_lookup() {
        assert_eq!(lookup("ENG_FLAMEOUT").unwrap().kind, FaultKind::EngFlameout);
        assert_eq!(lookup("eng_egt_overlimit").unwrap().kind, FaultKind::EngEgtOverlimit);
        assert!(matches!(lookup("ENG_EXPLODES"), Err(FaultError::UnknownFault(_))));
        assert_eq!(FaultKind::HydPumpFailure.as_str(), "HYD_PUMP_FAILURE");
    }

    #[test]
    fn targets_resolve_per_kind() {
        let flameout = FaultKind::EngFlameout.definition();
        assert_eq!(
            flameout.resolve_target(Some("eng2")).unwrap(),
            FaultTarget::Engine(EngineId::Eng2)
        );
        assert_eq!(flameout.resolve_target(None).unwrap(), flameout.default_target);
        assert!(matches!(
            flameout.resolve_target(Some("green")),
            Err(FaultError::InvalidTarget { .. })
        ));

        let bus = FaultKind::BusFailure.definition();
        let target = bus.resolve_target(Some("AC2")).unwrap();
        assert_eq!(target, FaultTarget::Bus(GeneratorId::Gen2));
        assert_eq!(target.to_string(), "ac2");
    }

    #[test]
    fn alarm_codes_name_the_target() {
        let fire = FaultKind::EngFire.definition();
        assert_eq!(
            fire.alarm_codes(FaultTarget::Engine(EngineId::Eng2)),
            vec!["ENG2_FIRE".to_string(), "ENG2_EGT_HIGH".to_string()]
        );
        let hyd = FaultKind::HydPumpFailure.definition();
        assert_eq!(
            hyd.alarm_codes(FaultTarget::Circuit(HydraulicCircuitId::Blue))[0],
            "HYD_BLUE_PUMP_FAULT"
        );
    }
}
