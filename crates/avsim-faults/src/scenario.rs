//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "faults"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Scenario definitions, built-in library and timeline cursor."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;

use avsim_model::{EngineId, FlightPhase};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::FaultKind;
use crate::error::ScenarioError;

/// Declarative training scenario, loadable from TOML.
///
/// ```toml
/// id = "HYD_GREEN_TAXI"
/// name = "Green pump failure on taxi"
/// duration_s = 60
///
/// [[timeline]]
/// at_s = 5
/// type = "inject_fault"
/// fault = "HYD_PUMP_FAILURE"
/// target = "green"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Total run time in simulated seconds.
    pub duration_s: f64,
    /// Informational only; not evaluated by the runner.
    #[serde(default)]
    pub success_criteria: Vec<String>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
}

impl ScenarioDefinition {
    /// Load and validate a scenario from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        contents.parse::<Self>()
    }

    /// Check structural rules and sort the timeline by trigger time.
    ///
    /// The sort is stable, so entries sharing a trigger keep file order.
    pub fn validate(mut self) -> Result<Self, ScenarioError> {
        let invalid = |reason: String| ScenarioError::Invalid {
            id: self.id.clone(),
            reason,
        };
        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty".into()));
        }
        if !self.duration_s.is_finite() || self.duration_s <= 0.0 {
            return Err(invalid(format!(
                "duration_s must be positive, got {}",
                self.duration_s
            )));
        }
        for entry in &self.timeline {
            if !entry.at_s.is_finite() || entry.at_s < 0.0 || entry.at_s > self.duration_s {
                return Err(invalid(format!(
                    "trigger {} is outside [0, {}]",
                    entry.at_s, self.duration_s
                )));
            }
            entry.action.validate().map_err(&invalid)?;
        }
        self.timeline.sort_by(|a, b| a.at_s.total_cmp(&b.at_s));
        Ok(self)
    }
}

impl std::str::FromStr for ScenarioDefinition {
    type Err = ScenarioError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        toml::from_str::<Self>(input)?.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Seconds after scenario start at which the action fires.
    pub at_s: f64,
    #[serde(flatten)]
    pub action: ScenarioAction,
}

impl TimelineEntry {
    pub fn new(at_s: f64, action: ScenarioAction) -> Self {
        Self { at_s, action }
    }
}

/// Timeline actions, tagged by `type` in scenario files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioAction {
    InjectFault {
        fault: FaultKind,
        #[serde(default)]
        target: Option<String>,
    },
    SetPhase {
        phase: FlightPhase,
    },
    /// Override thrust on one engine, or both when `engine` is omitted.
    SetThrust {
        #[serde(default)]
        engine: Option<EngineId>,
        thrust: f64,
    },
    ReleaseThrust {
        #[serde(default)]
        engine: Option<EngineId>,
    },
    SetTargetAltitude {
        altitude_ft: f64,
    },
    SetTargetAirspeed {
        airspeed_kt: f64,
    },
    ClearFaults,
    /// Instructor cue shown to the trainee.
    Message {
        text: String,
    },
}

impl ScenarioAction {
    pub fn label(&self) -> &'static str {
        match self {
            ScenarioAction::InjectFault { .. } => "inject_fault",
            ScenarioAction::SetPhase { .. } => "set_phase",
            ScenarioAction::SetThrust { .. } => "set_thrust",
            ScenarioAction::ReleaseThrust { .. } => "release_thrust",
            ScenarioAction::SetTargetAltitude { .. } => "set_target_altitude",
            ScenarioAction::SetTargetAirspeed { .. } => "set_target_airspeed",
            ScenarioAction::ClearFaults => "clear_faults",
            ScenarioAction::Message { .. } => "message",
        }
    }

    pub fn parameters(&self) -> serde_json::Value {
        match self {
            ScenarioAction::InjectFault { fault, target } => serde_json::json!({
                "fault": fault.as_str(),
                "target": target,
            }),
            ScenarioAction::SetPhase { phase } => serde_json::json!({ "phase": phase.as_str() }),
            ScenarioAction::SetThrust { engine, thrust } => serde_json::json!({
                "engine": engine.map(|id| id.as_str()),
                "thrust": thrust,
            }),
            ScenarioAction::ReleaseThrust { engine } => serde_json::json!({
                "engine": engine.map(|id| id.as_str()),
            }),
            ScenarioAction::SetTargetAltitude { altitude_ft } => {
                serde_json::json!({ "altitude_ft": altitude_ft })
            }
            ScenarioAction::SetTargetAirspeed { airspeed_kt } => {
                serde_json::json!({ "airspeed_kt": airspeed_kt })
            }
            ScenarioAction::ClearFaults => serde_json::json!({}),
            ScenarioAction::Message { text } => serde_json::json!({ "text": text }),
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            ScenarioAction::SetThrust { thrust, .. } if !(0.0..=1.0).contains(thrust) => {
                Err(format!("thrust {thrust} is outside [0, 1]"))
            }
            ScenarioAction::SetTargetAltitude { altitude_ft }
                if !altitude_ft.is_finite() || *altitude_ft < 0.0 =>
            {
                Err(format!("target altitude {altitude_ft} must be non-negative"))
            }
            ScenarioAction::SetTargetAirspeed { airspeed_kt }
                if !airspeed_kt.is_finite() || *airspeed_kt < 0.0 =>
            {
                Err(format!("target airspeed {airspeed_kt} must be non-negative"))
            }
            _ => Ok(()),
        }
    }
}

/// Record of a timeline entry that has fired.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiredAction {
    pub index: usize,
    pub trigger_s: f64,
    /// Scenario-elapsed time at which the entry actually ran.
    pub fired_at_s: f64,
    pub action: &'static str,
    pub parameters: serde_json::Value,
    /// False when the action was dispatched but rejected (e.g. a fault not
    /// allowed in the current phase).
    pub accepted: bool,
}

/// Execution state of the running scenario.
///
/// The cursor only moves forward and every entry fires at most once.
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    scenario: ScenarioDefinition,
    started_at_s: f64,
    elapsed_s: f64,
    cursor: usize,
    fired: Vec<FiredAction>,
}

impl ScenarioRun {
    pub fn new(scenario: ScenarioDefinition, started_at_s: f64) -> Self {
        Self {
            scenario,
            started_at_s,
            elapsed_s: 0.0,
            cursor: 0,
            fired: Vec::new(),
        }
    }

    pub fn scenario(&self) -> &ScenarioDefinition {
        &self.scenario
    }

    pub fn started_at_s(&self) -> f64 {
        self.started_at_s
    }

    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_s
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn fired(&self) -> &[FiredAction] {
        &self.fired
    }

    /// Finished once elapsed time has passed the scenario duration.
    pub fn is_complete(&self) -> bool {
        self.elapsed_s > self.scenario.duration_s
    }

    /// Advance scenario time and return the entries that became due, in
    /// timeline order, moving the cursor past them.
    pub fn advance(&mut self, dt: f64) -> Vec<(usize, TimelineEntry)> {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed_s += dt;
        }
        let mut due = Vec::new();
        while let Some(entry) = self.scenario.timeline.get(self.cursor) {
            if entry.at_s > self.elapsed_s {
                break;
            }
            due.push((self.cursor, entry.clone()));
            self.cursor += 1;
        }
        due
    }

    pub fn record(&mut self, index: usize, entry: &TimelineEntry, accepted: bool) -> FiredAction {
        let fired = FiredAction {
            index,
            trigger_s: entry.at_s,
            fired_at_s: self.elapsed_s,
            action: entry.action.label(),
            parameters: entry.action.parameters(),
            accepted,
        };
        self.fired.push(fired.clone());
        fired
    }

    pub fn status(&self) -> ScenarioStatus {
        let duration = self.scenario.duration_s;
        ScenarioStatus {
            id: self.scenario.id.clone(),
            name: self.scenario.name.clone(),
            elapsed_s: self.elapsed_s,
            duration_s: duration,
            progress_pct: (self.elapsed_s / duration * 100.0).clamp(0.0, 100.0),
            fired: self.cursor,
            total: self.scenario.timeline.len(),
            complete: self.is_complete(),
        }
    }
}

/// Display summary of a scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioStatus {
    pub id: String,
    pub name: String,
    pub elapsed_s: f64,
    pub duration_s: f64,
    pub progress_pct: f64,
    pub fired: usize,
    pub total: usize,
    pub complete: bool,
}

/// Scenarios available to `run_scenario`, keyed by id in registration order.
#[derive(Debug, Clone, Default)]
pub struct ScenarioLibrary {
    scenarios: IndexMap<String, ScenarioDefinition>,
}

impl ScenarioLibrary {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Library preloaded with the built-in training scenarios.
    pub fn builtin() -> Self {
        let scenarios = builtin_scenarios()
            .into_iter()
            .map(|scenario| (scenario.id.clone(), scenario))
            .collect();
        Self { scenarios }
    }

    pub fn register(&mut self, scenario: ScenarioDefinition) -> Result<(), ScenarioError> {
        let scenario = scenario.validate()?;
        if self.scenarios.contains_key(&scenario.id) {
            return Err(ScenarioError::Duplicate(scenario.id));
        }
        self.scenarios.insert(scenario.id.clone(), scenario);
        Ok(())
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&ScenarioDefinition, ScenarioError> {
        let scenario = ScenarioDefinition::from_file(path)?;
        let id = scenario.id.clone();
        self.register(scenario)?;
        self.get(&id).ok_or(ScenarioError::UnknownScenario(id))
    }

    pub fn get(&self, id: &str) -> Option<&ScenarioDefinition> {
        self.scenarios.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScenarioDefinition> {
        self.scenarios.values()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

fn inject(at_s: f64, fault: FaultKind, target: Option<&str>) -> TimelineEntry {
    TimelineEntry::new(
        at_s,
        ScenarioAction::InjectFault {
            fault,
            target: target.map(str::to_string),
        },
    )
}

fn message(at_s: f64, text: &str) -> TimelineEntry {
    TimelineEntry::new(at_s, ScenarioAction::Message { text: text.to_string() })
}

fn set_phase(at_s: f64, phase: FlightPhase) -> TimelineEntry {
    TimelineEntry::new(at_s, ScenarioAction::SetPhase { phase })
}

fn builtin_scenarios() -> Vec<ScenarioDefinition> {
    vec![
        ScenarioDefinition {
            id: "ENGINE_FAILURE_TAKEOFF".into(),
            name: "Engine failure after V1".into(),
            description: "Engine 1 flames out during the takeoff roll climb-out.".into(),
            duration_s: 120.0,
            success_criteria: vec![
                "Maintain directional control".into(),
                "Reach acceleration altitude on the remaining engine".into(),
            ],
            timeline: vec![
                set_phase(0.0, FlightPhase::Takeoff),
                inject(15.0, FaultKind::EngFlameout, Some("eng1")),
                message(20.0, "Engine 1 flameout. Maintain heading and identify the failure."),
                TimelineEntry::new(60.0, ScenarioAction::SetTargetAltitude { altitude_ft: 3_000.0 }),
            ],
        },
        ScenarioDefinition {
            id: "ENGINE_FIRE_CRUISE".into(),
            name: "Engine fire in cruise".into(),
            description: "Engine 2 fire at FL350 followed by shutdown and drift-down.".into(),
            duration_s: 180.0,
            success_criteria: vec![
                "Thrust lever to idle within 60 s".into(),
                "Engine shut down and descent initiated".into(),
            ],
            timeline: vec![
                set_phase(0.0, FlightPhase::Cruise),
                inject(10.0, FaultKind::EngFire, Some("eng2")),
                message(15.0, "ENG 2 FIRE. Apply the engine fire procedure."),
                TimelineEntry::new(
                    60.0,
                    ScenarioAction::SetThrust {
                        engine: Some(EngineId::Eng2),
                        thrust: 0.04,
                    },
                ),
                inject(90.0, FaultKind::EngFlameout, Some("eng2")),
                TimelineEntry::new(120.0, ScenarioAction::SetTargetAltitude { altitude_ft: 20_000.0 }),
            ],
        },
        ScenarioDefinition {
            id: "DUAL_HYDRAULIC_LOSS".into(),
            name: "Green and blue hydraulic loss".into(),
            description: "Green pump failure followed by a blue system leak.".into(),
            duration_s: 240.0,
            success_criteria: vec!["Descend and configure using the yellow system".into()],
            timeline: vec![
                set_phase(0.0, FlightPhase::Cruise),
                inject(20.0, FaultKind::HydPumpFailure, Some("green")),
                inject(60.0, FaultKind::HydLeak, Some("blue")),
                message(90.0, "Two hydraulic systems lost. Plan an approach with degraded controls."),
                TimelineEntry::new(150.0, ScenarioAction::SetTargetAltitude { altitude_ft: 10_000.0 }),
            ],
        },
        ScenarioDefinition {
            id: "RAPID_DECOMPRESSION".into(),
            name: "Rapid decompression at FL350".into(),
            description: "Structural failure depressurises the cabin; emergency descent.".into(),
            duration_s: 180.0,
            success_criteria: vec![
                "Oxygen masks on".into(),
                "Emergency descent to 10,000 ft".into(),
            ],
            timeline: vec![
                set_phase(0.0, FlightPhase::Cruise),
                inject(10.0, FaultKind::CabinDecompression, None),
                message(12.0, "CAB PR EXCESS CAB ALT. Emergency descent."),
                TimelineEntry::new(15.0, ScenarioAction::SetTargetAltitude { altitude_ft: 10_000.0 }),
                TimelineEntry::new(15.0, ScenarioAction::SetTargetAirspeed { airspeed_kt: 300.0 }),
            ],
        },
        ScenarioDefinition {
            id: "FUEL_LEAK_CRUISE".into(),
            name: "Fuel leak in cruise".into(),
            description: "Left wing tank leak producing a growing fuel imbalance.".into(),
            duration_s: 300.0,
            success_criteria: vec!["Detect the leak from the fuel imbalance".into()],
            timeline: vec![
                set_phase(0.0, FlightPhase::Cruise),
                inject(30.0, FaultKind::FuelLeak, Some("left")),
                message(120.0, "Check fuel quantities against the flight plan."),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        id = "SAMPLE"
        name = "Sample"
        duration_s = 30

        [[timeline]]
        at_s = 20
        type = "clear_faults"

        [[timeline]]
        at_s = 5
        type = "inject_fault"
        fault = "HYD_PUMP_FAILURE"
        target = "green"

        [[timeline]]
        at_s = 5
        type = "set_thrust"
        engine = "eng2"
        thrust = 0.5
    "#;

    #[test]
    fn parses_and_sorts_timeline_stably() {
        let scenario = SAMPLE.parse::<ScenarioDefinition>().unwrap();
        let labels: Vec<_> = scenario.timeline.iter().map(|e| e.action.label()).collect();
        assert_eq!(labels, vec!["inject_fault", "set_thrust", "clear_faults"]);
        assert_eq!(
            scenario.timeline[1].action,
            ScenarioAction::SetThrust {
                engine: Some(EngineId::Eng2),
                thrust: 0.5
            }
        );
    }

    #[test]
    fn rejects_trigger_beyond_duration() {
        let input = SAMPLE.replace("at_s = 20", "at_s = 45");
        let err = input.parse::<ScenarioDefinition>().unwrap_err();
        assert!(matches!(err, ScenarioError::Invalid { .. }), "{err}");
    }

    #[test]
    fn rejects_unknown_fault_code() {
        let input = SAMPLE.replace("HYD_PUMP_FAILURE", "HYD_EXPLOSION");
        assert!(matches!(
            input.parse::<ScenarioDefinition>(),
            Err(ScenarioError::Parse(_))
        ));
    }

    #[test]
    fn cursor_fires_each_entry_once_in_order() {
        let scenario = SAMPLE.parse::<ScenarioDefinition>().unwrap();
        let mut run = ScenarioRun::new(scenario, 100.0);
        assert!(run.advance(4.9).is_empty());
        let due = run.advance(0.1);
        assert_eq!(due.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1]);
        assert!(run.advance(0.0).is_empty());
        assert_eq!(run.advance(100.0).len(), 1);
        assert!(run.is_complete());
        assert_eq!(run.cursor(), 3);
    }

    #[test]
    fn builtin_library_is_valid() {
        let library = ScenarioLibrary::builtin();
        assert_eq!(library.len(), 5);
        for scenario in library.iter() {
            assert_eq!(scenario.clone().validate().unwrap(), *scenario);
        }
        assert!(library.get("RAPID_DECOMPRESSION").is_some());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut library = ScenarioLibrary::builtin();
        let mut copy = library.get("FUEL_LEAK_CRUISE").unwrap().clone();
        assert!(matches!(
            library.register(copy.clone()),
            Err(ScenarioError::Duplicate(_))
        ));
        copy.id = "FUEL_LEAK_CRUISE_2".into();
        library.register(copy).unwrap();
        assert_eq!(library.len(), 6);
    }
}
