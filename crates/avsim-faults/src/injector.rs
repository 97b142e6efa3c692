//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "faults"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Fault injector with active/history lists and the scenario runner."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use avsim_metrics::SimulationMetrics;
use avsim_model::AircraftModel;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{lookup, FaultDefinition, FaultKind, FaultTarget, Severity, Subsystem};
use crate::error::{FaultError, ScenarioError};
use crate::scenario::{
    FiredAction, ScenarioAction, ScenarioLibrary, ScenarioRun, ScenarioStatus,
};

/// A fault that has been injected. Entries never self-clear.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveFault {
    pub id: Uuid,
    pub kind: FaultKind,
    pub name: &'static str,
    pub target: String,
    pub severity: Severity,
    pub subsystem: Subsystem,
    /// Simulated time of injection, seconds.
    pub injected_at_s: f64,
    pub injected_at: DateTime<Utc>,
    pub alarm_codes: Vec<String>,
}

/// Owns the active and history fault lists and the single running scenario.
#[derive(Debug)]
pub struct FaultInjector {
    active: Vec<ActiveFault>,
    history: Vec<ActiveFault>,
    library: ScenarioLibrary,
    run: Option<ScenarioRun>,
    last_run: Option<ScenarioRun>,
    metrics: Option<SimulationMetrics>,
}

impl Default for FaultInjector {
    fn default() -> Self {
        Self::new(ScenarioLibrary::builtin(), None)
    }
}

impl FaultInjector {
    pub fn new(library: ScenarioLibrary, metrics: Option<SimulationMetrics>) -> Self {
        Self {
            active: Vec::new(),
            history: Vec::new(),
            library,
            run: None,
            last_run: None,
            metrics,
        }
    }

    pub fn active_faults(&self) -> &[ActiveFault] {
        &self.active
    }

    pub fn fault_history(&self) -> &[ActiveFault] {
        &self.history
    }

    pub fn library(&self) -> &ScenarioLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut ScenarioLibrary {
        &mut self.library
    }

    /// Inject `fault` against `target`, applying its effect to `model`.
    ///
    /// On error the model and both fault lists are left unchanged.
    pub fn try_inject(
        &mut self,
        model: &mut AircraftModel,
        fault: &str,
        target: Option<&str>,
    ) -> Result<ActiveFault, FaultError> {
        let result = Self::resolve(model, fault, target);
        let (definition, target) = match result {
            Ok(resolved) => resolved,
            Err(err) => {
                if let Some(metrics) = &self.metrics {
                    let label = match &err {
                        FaultError::UnknownFault(_) => "UNKNOWN",
                        FaultError::InvalidTarget { fault, .. }
                        | FaultError::PhaseNotAllowed { fault, .. } => fault.as_str(),
                    };
                    metrics.record_fault_injection(label, false);
                }
                return Err(err);
            }
        };

        definition.apply(model, target);
        let record = ActiveFault {
            id: Uuid::new_v4(),
            kind: definition.kind,
            name: definition.name,
            target: target.to_string(),
            severity: definition.severity,
            subsystem: definition.subsystem,
            injected_at_s: model.aircraft.elapsed_s,
            injected_at: Utc::now(),
            alarm_codes: definition.alarm_codes(target),
        };
        self.active.push(record.clone());
        self.history.push(record.clone());

        if let Some(metrics) = &self.metrics {
            metrics.record_fault_injection(definition.kind.as_str(), true);
            metrics.set_active_faults(self.active.len());
        }
        warn!(
            target: "avsim::faults",
            fault = definition.kind.as_str(),
            fault_target = %record.target,
            severity = %record.severity,
            sim_time = record.injected_at_s,
            alarms = ?record.alarm_codes,
            "fault injected",
        );
        Ok(record)
    }

    fn resolve(
        model: &AircraftModel,
        fault: &str,
        target: Option<&str>,
    ) -> Result<(&'static FaultDefinition, FaultTarget), FaultError> {
        let definition = lookup(fault)?;
        let phase = model.phase();
        if !definition.allows(phase) {
            return Err(FaultError::PhaseNotAllowed {
                fault: definition.kind,
                phase,
            });
        }
        let target = definition.resolve_target(target)?;
        Ok((definition, target))
    }

    /// Boolean form of [`try_inject`](Self::try_inject); rejections are logged.
    pub fn inject_fault(&mut self, model: &mut AircraftModel, fault: &str, target: Option<&str>) -> bool {
        match self.try_inject(model, fault, target) {
            Ok(_) => true,
            Err(err @ FaultError::UnknownFault(_)) => {
                warn!(target: "avsim::faults", error = %err, "fault injection rejected");
                false
            }
            Err(err) => {
                debug!(target: "avsim::faults", error = %err, "fault injection rejected");
                false
            }
        }
    }

    /// Empty the active list. History is kept.
    pub fn clear_all_faults(&mut self) {
        let cleared = self.active.len();
        self.active.clear();
        if let Some(metrics) = &self.metrics {
            metrics.set_active_faults(0);
        }
        info!(target: "avsim::faults", cleared, "active faults cleared");
    }

    /// Start scenario `id`, replacing any running scenario.
    pub fn try_run_scenario(&mut self, id: &str, now_s: f64) -> Result<ScenarioStatus, ScenarioError> {
        let scenario = self
            .library
            .get(id.trim())
            .cloned()
            .ok_or_else(|| ScenarioError::UnknownScenario(id.to_string()))?;
        if let Some(previous) = self.run.take() {
            info!(
                target: "avsim::faults",
                scenario = %previous.scenario().id,
                "scenario replaced before completion",
            );
            self.last_run = Some(previous);
        }
        info!(
            target: "avsim::faults",
            scenario = %scenario.id,
            duration_s = scenario.duration_s,
            entries = scenario.timeline.len(),
            "scenario started",
        );
        let run = ScenarioRun::new(scenario, now_s);
        let status = run.status();
        self.run = Some(run);
        Ok(status)
    }

    pub fn run_scenario(&mut self, id: &str, now_s: f64) -> bool {
        match self.try_run_scenario(id, now_s) {
            Ok(_) => true,
            Err(err) => {
                warn!(target: "avsim::faults", error = %err, "scenario rejected");
                false
            }
        }
    }

    pub fn stop_scenario(&mut self) {
        if let Some(run) = self.run.take() {
            info!(target: "avsim::faults", scenario = %run.scenario().id, "scenario stopped");
            self.last_run = Some(run);
        }
    }

    pub fn scenario_status(&self) -> Option<ScenarioStatus> {
        self.run.as_ref().map(ScenarioRun::status)
    }

    pub fn current_run(&self) -> Option<&ScenarioRun> {
        self.run.as_ref()
    }

    /// Most recently finished, stopped or replaced run, for reporting.
    pub fn last_run(&self) -> Option<&ScenarioRun> {
        self.last_run.as_ref()
    }

    /// Advance the running scenario by `dt` and execute every entry now due.
    ///
    /// Due entries run before the completion check, so entries scheduled at
    /// the scenario duration always fire.
    pub fn update_scenario(&mut self, model: &mut AircraftModel, dt: f64) -> Vec<FiredAction> {
        let Some(mut run) = self.run.take() else {
            return Vec::new();
        };
        let mut fired = Vec::new();
        for (index, entry) in run.advance(dt) {
            let accepted = self.execute(model, &entry.action);
            if let Some(metrics) = &self.metrics {
                metrics.inc_scenario_action(entry.action.label());
            }
            fired.push(run.record(index, &entry, accepted));
        }
        if run.is_complete() {
            info!(
                target: "avsim::faults",
                scenario = %run.scenario().id,
                fired = run.fired().len(),
                "scenario complete",
            );
            self.last_run = Some(run);
        } else {
            self.run = Some(run);
        }
        fired
    }

    fn execute(&mut self, model: &mut AircraftModel, action: &ScenarioAction) -> bool {
        debug!(
            target: "avsim::faults",
            action = action.label(),
            params = %action.parameters(),
            "scenario action",
        );
        match action {
            ScenarioAction::InjectFault { fault, target } => {
                self.inject_fault(model, fault.as_str(), target.as_deref())
            }
            ScenarioAction::SetPhase { phase } => {
                model.set_flight_phase(*phase);
                true
            }
            ScenarioAction::SetThrust { engine, thrust } => {
                model.set_thrust(*engine, Some(*thrust));
                true
            }
            ScenarioAction::ReleaseThrust { engine } => {
                model.set_thrust(*engine, None);
                true
            }
            ScenarioAction::SetTargetAltitude { altitude_ft } => {
                model.set_target_altitude(*altitude_ft);
                true
            }
            ScenarioAction::SetTargetAirspeed { airspeed_kt } => {
                model.set_target_airspeed(*airspeed_kt);
                true
            }
            ScenarioAction::ClearFaults => {
                self.clear_all_faults();
                true
            }
            ScenarioAction::Message { text } => {
                info!(target: "avsim::faults", message = %text, "scenario cue");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avsim_model::{EngineId, FlightPhase};

    #[test]
    fn flameout_in_cruise_stops_engine() {
        let mut model = AircraftModel::deterministic();
        let mut injector = FaultInjector::default();
        assert!(injector.inject_fault(&mut model, "ENG_FLAMEOUT", Some("eng1")));
        let eng1 = model.engine(EngineId::Eng1);
        assert_eq!(eng1.n1_pct, 0.0);
        assert_eq!(eng1.n2_pct, 0.0);
        assert_eq!(eng1.fuel_flow_kg_h, 0.0);
        assert!(!eng1.running);
        assert!(model.engine(EngineId::Eng2).running);
        assert_eq!(injector.active_faults()[0].alarm_codes[0], "ENG1_FLAMEOUT");
    }

    #[test]
    fn phase_rejection_leaves_lists_unchanged() {
        let mut model = AircraftModel::deterministic();
        model.set_flight_phase(FlightPhase::Parked);
        let mut injector = FaultInjector::default();
        let err = injector
            .try_inject(&mut model, "CABIN_DECOMPRESSION", None)
            .unwrap_err();
        assert!(matches!(err, FaultError::PhaseNotAllowed { .. }));
        assert!(!model.pressurization.decompression);
        assert!(injector.active_faults().is_empty());
        assert!(injector.fault_history().is_empty());
    }

    #[test]
    fn unknown_fault_and_bad_target_are_rejected() {
        let mut model = AircraftModel::deterministic();
        let mut injector = FaultInjector::default();
        assert!(!injector.inject_fault(&mut model, "WING_FALLS_OFF", None));
        assert!(!injector.inject_fault(&mut model, "ENG_FIRE", Some("eng3")));
        assert!(injector.fault_history().is_empty());
    }

    #[test]
    fn clear_keeps_history() {
        let mut model = AircraftModel::deterministic();
        let mut injector = FaultInjector::default();
        injector.inject_fault(&mut model, "HYD_LEAK", Some("blue"));
        let before = injector.fault_history().len();
        injector.inject_fault(&mut model, "GEN_FAILURE", None);
        injector.clear_all_faults();
        assert!(injector.active_faults().is_empty());
        assert_eq!(injector.fault_history().len(), before + 1);
        assert!(model.electrical.gen1.failed, "clearing does not heal the aircraft");
    }

    #[test]
    fn leak_faults_accumulate() {
        let mut model = AircraftModel::deterministic();
        let mut injector = FaultInjector::default();
        injector.inject_fault(&mut model, "FUEL_LEAK", Some("right"));
        injector.inject_fault(&mut model, "FUEL_LEAK", Some("right"));
        assert_eq!(model.fuel.right_leak_l_s, 4.0);
        assert_eq!(injector.active_faults().len(), 2);
    }

    #[test]
    fn scenario_replacement_and_unknown_ids() {
        let mut model = AircraftModel::deterministic();
        let mut injector = FaultInjector::default();
        assert!(!injector.run_scenario("NOPE", 0.0));
        assert!(injector.run_scenario("FUEL_LEAK_CRUISE", 0.0));
        injector.update_scenario(&mut model, 5.0);
        assert!(injector.run_scenario("RAPID_DECOMPRESSION", 5.0));
        let status = injector.scenario_status().unwrap();
        assert_eq!(status.id, "RAPID_DECOMPRESSION");
        assert_eq!(status.elapsed_s, 0.0);
        assert_eq!(injector.last_run().unwrap().scenario().id, "FUEL_LEAK_CRUISE");
    }

    #[test]
    fn scenario_completes_after_duration() {
        let mut model = AircraftModel::deterministic();
        let mut injector = FaultInjector::default();
        injector.run_scenario("RAPID_DECOMPRESSION", 0.0);
        let mut fired = Vec::new();
        for _ in 0..200 {
            model.advance(1.0);
            fired.extend(injector.update_scenario(&mut model, 1.0));
        }
        assert!(injector.scenario_status().is_none());
        assert_eq!(fired.len(), 5);
        assert!(fired.iter().all(|f| f.accepted));
        assert!(model.pressurization.decompression);
        assert_eq!(injector.fault_history().len(), 1);
        assert_eq!(model.aircraft.target_altitude_ft, 10_000.0);
    }
}
