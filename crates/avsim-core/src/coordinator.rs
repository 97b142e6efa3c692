//! ---
//! avsim_section: "01-core-functionality"
//! avsim_subsection: "module"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Simulation coordinator switching between live and replay."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use avsim_common::config::AppConfig;
use avsim_faults::{ActiveFault, FaultInjector, ScenarioLibrary, ScenarioStatus};
use avsim_logging::{log_control_event, sim_debug, sim_info, ControlOutcome, LogContext};
use avsim_metrics::SimulationMetrics;
use avsim_model::{AircraftModel, FlightPhase, NoNoise, NoiseSource, RandomNoise};
use avsim_playback::{PlaybackEngine, PlaybackInfo, PlaybackSession};
use chrono::Utc;
use indexmap::IndexSet;
use parking_lot::Mutex;
use serde::Serialize;
use strum::{Display, IntoStaticStr};
use tracing::info;

use crate::snapshot::{ApuSnapshot, FuelSnapshot, SimulationSnapshot};

/// Which engine drives the model on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SimMode {
    #[default]
    Live,
    Replay,
}

impl SimMode {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Coordinator shared between the tick loop and control surfaces.
pub type SharedCoordinator = Arc<Mutex<SimulationCoordinator>>;

/// Owns the model, the fault injector and the playback engine.
///
/// All mutation funnels through here. Only [`inject_fault`](Self::inject_fault),
/// [`run_scenario`](Self::run_scenario) and a successful playback load change
/// the mode.
#[derive(Debug)]
pub struct SimulationCoordinator {
    model: AircraftModel,
    injector: FaultInjector,
    playback: PlaybackEngine,
    mode: SimMode,
    tick_count: u64,
    metrics: Option<SimulationMetrics>,
}

impl Default for SimulationCoordinator {
    fn default() -> Self {
        Self::new(
            AircraftModel::deterministic(),
            FaultInjector::default(),
            PlaybackEngine::default(),
            None,
        )
    }
}

impl SimulationCoordinator {
    pub fn new(
        model: AircraftModel,
        injector: FaultInjector,
        playback: PlaybackEngine,
        metrics: Option<SimulationMetrics>,
    ) -> Self {
        Self {
            model,
            injector,
            playback,
            mode: SimMode::Live,
            tick_count: 0,
            metrics,
        }
    }

    /// Build from configuration: noise, extra scenarios and an optional
    /// startup recording.
    pub fn from_config(config: &AppConfig, metrics: Option<SimulationMetrics>) -> Result<Self> {
        let simulation = &config.simulation;
        let noise: Box<dyn NoiseSource> = if simulation.noise_enabled {
            Box::new(
                RandomNoise::seeded(simulation.random_seed).with_scale(simulation.noise_amplitude),
            )
        } else {
            Box::new(NoNoise)
        };

        let mut library = ScenarioLibrary::builtin();
        for path in &simulation.scenario_files {
            let scenario = library
                .load_file(path)
                .with_context(|| format!("failed to load scenario file {}", path.display()))?;
            info!(target: "avsim::core", scenario = %scenario.id, path = %path.display(), "scenario registered");
        }

        let playback = PlaybackEngine::default().with_speed(config.playback.default_speed);
        let mut coordinator = Self::new(
            AircraftModel::new(noise),
            FaultInjector::new(library, metrics.clone()),
            playback,
            metrics,
        );

        if let Some(source) = &config.playback.source {
            coordinator
                .load_playback_path(source)
                .with_context(|| format!("failed to load playback source {}", source.display()))?;
            if config.playback.autoplay {
                coordinator.play();
            }
        }
        Ok(coordinator)
    }

    pub fn into_shared(self) -> SharedCoordinator {
        Arc::new(Mutex::new(self))
    }

    /// Run one tick. Frozen ticks do nothing.
    pub fn tick(&mut self, dt: f64, frozen: bool) {
        if frozen {
            return;
        }
        match self.mode {
            SimMode::Live => {
                self.model.advance(dt);
                let fired = self.injector.update_scenario(&mut self.model, dt);
                if !fired.is_empty() {
                    let scenario = self.injector.current_run().or(self.injector.last_run());
                    let id = scenario.map(|run| run.scenario().id.as_str()).unwrap_or("");
                    for action in &fired {
                        sim_debug!(
                            context = self.context().with_scenario(id),
                            "scenario action {} at {:.1}s accepted={}",
                            action.action,
                            action.trigger_s,
                            action.accepted
                        );
                    }
                }
            }
            SimMode::Replay => {
                self.playback.advance(&mut self.model);
            }
        }
        self.tick_count += 1;
        if let Some(metrics) = &self.metrics {
            metrics.inc_tick(self.mode.as_str());
        }
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        let active_faults = self.injector.active_faults().to_vec();
        let alarms: IndexSet<String> = active_faults
            .iter()
            .flat_map(|fault| fault.alarm_codes.iter().cloned())
            .collect();
        SimulationSnapshot {
            captured_at: Utc::now(),
            mode: self.mode,
            tick: self.tick_count,
            aircraft: self.model.aircraft.clone(),
            engines: self.model.engines.clone(),
            hydraulics: self.model.hydraulics.clone(),
            electrical: self.model.electrical.clone(),
            pressurization: self.model.pressurization.clone(),
            fuel: FuelSnapshot::from(&self.model.fuel),
            controls: self.model.controls.clone(),
            apu: ApuSnapshot::default(),
            active_faults,
            alarms: alarms.into_iter().collect(),
            scenario: self.injector.scenario_status(),
            playback: self.playback.info(),
        }
    }

    pub fn inject_fault(&mut self, fault: &str, target: Option<&str>) -> bool {
        self.set_mode(SimMode::Live);
        let accepted = self.injector.inject_fault(&mut self.model, fault, target);
        log_control_event(
            Some(&self.context()),
            "inject_fault",
            &format!("{} -> {}", fault, target.unwrap_or("default")),
            ControlOutcome::from(accepted),
        );
        accepted
    }

    pub fn run_scenario(&mut self, id: &str) -> bool {
        self.set_mode(SimMode::Live);
        let accepted = self.injector.run_scenario(id, self.model.aircraft.elapsed_s);
        log_control_event(
            Some(&self.context().with_scenario(id)),
            "run_scenario",
            id,
            ControlOutcome::from(accepted),
        );
        accepted
    }

    /// Put the live model into a representative state for `phase`.
    pub fn seed_phase(&mut self, phase: FlightPhase) {
        self.model.set_flight_phase(phase);
        sim_info!(context = self.context(), "flight phase seeded");
    }

    pub fn stop_scenario(&mut self) {
        self.injector.stop_scenario();
    }

    pub fn clear_all_faults(&mut self) {
        self.injector.clear_all_faults();
        log_control_event(
            Some(&self.context()),
            "clear_all_faults",
            "active faults cleared",
            ControlOutcome::Accepted,
        );
    }

    /// Parse and load a recording. The mode switches to replay only when the
    /// source parses; a rejected source leaves everything as it was.
    pub fn load_playback_source(&mut self, source: &str) -> bool {
        let result = self.playback.load_str(source);
        self.finish_load(result.is_ok(), "inline source")
    }

    pub fn load_playback_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let result = self.playback.load_path(path);
        self.finish_load(result.is_ok(), &path.display().to_string());
        result.map_err(anyhow::Error::from)
    }

    pub fn load_playback_session(&mut self, session: PlaybackSession) {
        self.playback.load(session);
        self.finish_load(true, "recorded session");
    }

    fn finish_load(&mut self, loaded: bool, origin: &str) -> bool {
        if let Some(metrics) = &self.metrics {
            metrics.record_playback_load(loaded);
        }
        if loaded {
            self.set_mode(SimMode::Replay);
        }
        log_control_event(
            Some(&self.context()),
            "load_playback",
            origin,
            ControlOutcome::from(loaded),
        );
        loaded
    }

    pub fn play(&mut self) -> bool {
        self.playback.play()
    }

    pub fn pause(&mut self) {
        self.playback.pause();
    }

    pub fn stop(&mut self) {
        self.playback.stop();
    }

    /// Reposition playback and show the frame at the new position.
    pub fn seek(&mut self, seconds: f64) -> bool {
        match self.playback.seek(seconds) {
            Ok(()) => {
                if self.mode == SimMode::Replay {
                    self.playback.apply_current(&mut self.model);
                }
                true
            }
            Err(err) => {
                log_control_event(
                    Some(&self.context()),
                    "seek",
                    &err.to_string(),
                    ControlOutcome::Rejected,
                );
                false
            }
        }
    }

    pub fn set_speed(&mut self, multiplier: f64) {
        self.playback.set_speed(multiplier);
    }

    pub fn active_faults(&self) -> &[ActiveFault] {
        self.injector.active_faults()
    }

    pub fn fault_history(&self) -> &[ActiveFault] {
        self.injector.fault_history()
    }

    pub fn playback_info(&self) -> PlaybackInfo {
        self.playback.info()
    }

    pub fn scenario_status(&self) -> Option<ScenarioStatus> {
        self.injector.scenario_status()
    }

    pub fn scenarios(&self) -> &ScenarioLibrary {
        self.injector.library()
    }

    pub fn mode(&self) -> SimMode {
        self.mode
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn model(&self) -> &AircraftModel {
        &self.model
    }

    pub fn injector(&self) -> &FaultInjector {
        &self.injector
    }

    fn set_mode(&mut self, mode: SimMode) {
        if self.mode != mode {
            sim_info!(
                context = self.context(),
                "mode change {} -> {}",
                self.mode,
                mode
            );
            self.mode = mode;
        }
    }

    fn context<'a>(&self) -> LogContext<'a> {
        LogContext::new()
            .with_mode(self.mode.as_str())
            .with_phase(self.model.phase().as_str())
            .with_tick(self.tick_count)
            .with_sim_time(self.model.aircraft.elapsed_s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avsim_model::{EngineId, FlightPhase};
    use avsim_playback::ManualClock;

    fn coordinator_with_clock() -> (SimulationCoordinator, ManualClock) {
        let clock = ManualClock::new();
        let coordinator = SimulationCoordinator::new(
            AircraftModel::deterministic(),
            FaultInjector::default(),
            PlaybackEngine::new(Box::new(clock.clone())),
            None,
        );
        (coordinator, clock)
    }

    #[test]
    fn frozen_ticks_change_nothing() {
        let mut coordinator = SimulationCoordinator::default();
        let before = coordinator.model().aircraft.clone();
        coordinator.tick(1.0, true);
        assert_eq!(coordinator.model().aircraft, before);
        assert_eq!(coordinator.tick_count(), 0);
    }

    #[test]
    fn live_ticks_advance_the_model() {
        let mut coordinator = SimulationCoordinator::default();
        coordinator.tick(1.0, false);
        assert_eq!(coordinator.tick_count(), 1);
        assert_eq!(coordinator.model().aircraft.elapsed_s, 1.0);
    }

    #[test]
    fn flameout_through_the_coordinator() {
        let mut coordinator = SimulationCoordinator::default();
        assert_eq!(coordinator.model().phase(), FlightPhase::Cruise);
        assert!(coordinator.inject_fault("ENG_FLAMEOUT", Some("eng1")));
        let engine = coordinator.model().engine(EngineId::Eng1);
        assert_eq!(engine.n1_pct, 0.0);
        assert_eq!(engine.n2_pct, 0.0);
        assert_eq!(engine.fuel_flow_kg_h, 0.0);
        assert!(!engine.running);

        coordinator.clear_all_faults();
        assert!(coordinator.active_faults().is_empty());
        assert_eq!(coordinator.fault_history().len(), 1);
    }

    #[test]
    fn mode_follows_control_operations() {
        let (mut coordinator, _clock) = coordinator_with_clock();
        assert!(!coordinator.load_playback_source("not,a\nvalid"));
        assert_eq!(coordinator.mode(), SimMode::Live);

        assert!(coordinator.load_playback_source("IAS\n200\n210\n"));
        assert_eq!(coordinator.mode(), SimMode::Replay);

        coordinator.clear_all_faults();
        coordinator.play();
        assert_eq!(coordinator.mode(), SimMode::Replay);

        assert!(coordinator.run_scenario("ENGINE_FIRE_CRUISE"));
        assert_eq!(coordinator.mode(), SimMode::Live);
        assert!(!coordinator.run_scenario("NO_SUCH_SCENARIO"));
    }

    #[test]
    fn replay_ticks_write_recorded_values() {
        let (mut coordinator, clock) = coordinator_with_clock();
        assert!(coordinator.load_playback_source("IAS,ALT_STD\n200,5000\n220,6000\n"));
        assert!(coordinator.play());
        clock.advance_secs(0.5);
        coordinator.tick(1.0, false);
        assert_eq!(coordinator.model().aircraft.airspeed_kt, 210.0);
        assert_eq!(coordinator.model().aircraft.elapsed_s, 0.0);

        assert!(coordinator.seek(1.0));
        assert_eq!(coordinator.model().aircraft.altitude_ft, 6_000.0);
        assert!(!coordinator.seek(99.0));
    }

    #[test]
    fn snapshot_is_a_detached_copy() {
        let mut coordinator = SimulationCoordinator::default();
        coordinator.inject_fault("ENG_FIRE", Some("eng2"));
        let snapshot = coordinator.snapshot();
        coordinator.tick(1.0, false);
        assert_eq!(snapshot.tick, 0);
        assert!(snapshot.engines[1].fire);
        assert!(!snapshot.alarms.is_empty());
        assert!(!snapshot.apu.running);
        assert_eq!(snapshot.apu.n_pct, 0.0);
        assert!(snapshot.to_json().unwrap().contains("\"mode\": \"live\""));
    }

    #[test]
    fn shared_alarm_codes_appear_once() {
        let mut coordinator = SimulationCoordinator::default();
        coordinator.seed_phase(FlightPhase::Cruise);
        assert!(coordinator.inject_fault("FUEL_LEAK", Some("left")));
        assert!(coordinator.inject_fault("FUEL_LEAK", Some("right")));
        let alarms = coordinator.snapshot().alarms;
        assert_eq!(
            alarms.iter().filter(|code| code.as_str() == "FUEL_IMBALANCE").count(),
            1
        );
        assert_eq!(alarms.first().map(String::as_str), Some("FUEL_LEFT_LEAK"));
        assert!(alarms.iter().any(|code| code == "FUEL_RIGHT_LEAK"));
    }
}
