//! ---
//! avsim_section: "03-observability"
//! avsim_subsection: "module"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Counters for ticks, fault injections, scenarios and playback loads."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use anyhow::Result;
use prometheus::{IntCounterVec, IntGauge, Opts};

use crate::SharedRegistry;

/// Handles are cheap clones sharing the registered series.
#[derive(Clone)]
pub struct SimulationMetrics {
    ticks_total: IntCounterVec,
    fault_injections_total: IntCounterVec,
    active_faults: IntGauge,
    scenario_actions_total: IntCounterVec,
    playback_loads_total: IntCounterVec,
}

fn counter(registry: &SharedRegistry, name: &str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    let counter = IntCounterVec::new(Opts::new(name, help), labels)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

impl SimulationMetrics {
    /// Fails when the family is already registered on `registry`.
    pub fn new(registry: SharedRegistry) -> Result<Self> {
        let active_faults = IntGauge::with_opts(Opts::new(
            "avsim_active_faults",
            "Faults currently active on the simulated aircraft",
        ))?;
        registry.register(Box::new(active_faults.clone()))?;

        Ok(Self {
            ticks_total: counter(
                &registry,
                "avsim_ticks_total",
                "Coordinator ticks run, by live or replay mode",
                &["mode"],
            )?,
            fault_injections_total: counter(
                &registry,
                "avsim_fault_injections_total",
                "Fault injection requests by fault code and outcome",
                &["fault", "outcome"],
            )?,
            active_faults,
            scenario_actions_total: counter(
                &registry,
                "avsim_scenario_actions_total",
                "Scenario timeline entries fired, by action",
                &["action"],
            )?,
            playback_loads_total: counter(
                &registry,
                "avsim_playback_sessions_loaded_total",
                "Flight recordings offered for replay, by outcome",
                &["outcome"],
            )?,
        })
    }

    pub fn inc_tick(&self, mode: &str) {
        self.ticks_total.with_label_values(&[mode]).inc();
    }

    pub fn ticks(&self, mode: &str) -> u64 {
        self.ticks_total.with_label_values(&[mode]).get()
    }

    pub fn record_fault_injection(&self, fault: &str, accepted: bool) {
        let outcome = if accepted { "accepted" } else { "rejected" };
        self.fault_injections_total
            .with_label_values(&[fault, outcome])
            .inc();
    }

    pub fn set_active_faults(&self, count: usize) {
        self.active_faults.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    pub fn inc_scenario_action(&self, action: &str) {
        self.scenario_actions_total.with_label_values(&[action]).inc();
    }

    pub fn record_playback_load(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.playback_loads_total.with_label_values(&[outcome]).inc();
    }
}

impl std::fmt::Debug for SimulationMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationMetrics").finish_non_exhaustive()
    }
}
