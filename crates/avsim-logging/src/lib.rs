//! ---
//! avsim_section: "03-logging"
//! avsim_subsection: "module"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Structured logging context for simulation events."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Context-carrying log helpers shared by the simulation crates.

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

/// Initialize a baseline tracing subscriber suitable for tests and tools.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Coordinator mode (`live` or `replay`).
    pub mode: Option<&'a str>,
    /// Flight phase at the time of the event.
    pub phase: Option<&'a str>,
    /// Coordinator tick counter.
    pub tick: Option<u64>,
    /// Simulated time in seconds.
    pub sim_time: Option<f64>,
    /// Identifier of the running scenario.
    pub scenario: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the coordinator mode.
    pub fn with_mode(mut self, mode: &'a str) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Attach the flight phase label.
    pub fn with_phase(mut self, phase: &'a str) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Attach a tick value.
    pub fn with_tick(mut self, tick: u64) -> Self {
        self.tick = Some(tick);
        self
    }

    /// Attach the simulated clock.
    pub fn with_sim_time(mut self, seconds: f64) -> Self {
        self.sim_time = Some(seconds);
        self
    }

    /// Attach a scenario identifier.
    pub fn with_scenario(mut self, scenario: &'a str) -> Self {
        self.scenario = Some(scenario);
        self
    }
}

/// Outcome of a control operation requested by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    /// The operation was applied.
    Accepted,
    /// The operation was rejected and state is unchanged.
    Rejected,
}

impl ControlOutcome {
    /// Static label used in log fields and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlOutcome::Accepted => "accepted",
            ControlOutcome::Rejected => "rejected",
        }
    }

    fn level(&self) -> Level {
        match self {
            ControlOutcome::Accepted => Level::INFO,
            ControlOutcome::Rejected => Level::WARN,
        }
    }
}

impl From<bool> for ControlOutcome {
    fn from(accepted: bool) -> Self {
        if accepted {
            ControlOutcome::Accepted
        } else {
            ControlOutcome::Rejected
        }
    }
}

/// Emit a standardized control event with an accepted/rejected outcome.
pub fn log_control_event(
    context: Option<&LogContext>,
    operation: &str,
    message: &str,
    outcome: ControlOutcome,
) {
    let ctx = context.cloned().unwrap_or_default();
    macro_rules! emit {
        ($level:expr) => {
            tracing::event!(
                target: "avsim::control",
                $level,
                operation,
                outcome = outcome.as_str(),
                mode = ctx.mode.unwrap_or(""),
                phase = ctx.phase.unwrap_or(""),
                tick = ctx.tick.unwrap_or_default(),
                sim_time = ctx.sim_time.unwrap_or_default(),
                scenario = ctx.scenario.unwrap_or(""),
                message = %message
            )
        };
    }
    // `tracing::event!` needs a constant level, so branch on it.
    match outcome.level() {
        Level::WARN => emit!(Level::WARN),
        _ => emit!(Level::INFO),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macros_emit_without_panic() {
        init();
        let ctx = LogContext::new().with_mode("live").with_phase("CRUISE");
        sim_info!(context = ctx.clone(), "engine relight attempted");
        sim_debug!("debug message");
        sim_warn!(context = ctx.with_tick(12), "fault rejected: {}", "ENG_FIRE");
    }

    #[test]
    fn control_event_helper_emits() {
        init();
        let ctx = LogContext::new().with_scenario("RAPID_DECOMPRESSION");
        log_control_event(
            Some(&ctx),
            "run_scenario",
            "scenario started",
            ControlOutcome::Accepted,
        );
        log_control_event(None, "seek", "seek out of range", ControlOutcome::Rejected);
    }

    #[test]
    fn outcome_from_bool() {
        assert_eq!(ControlOutcome::from(true), ControlOutcome::Accepted);
        assert_eq!(ControlOutcome::from(false).as_str(), "rejected");
    }
}
