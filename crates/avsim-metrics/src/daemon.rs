//! ---
//! avsim_section: "03-observability"
//! avsim_subsection: "module"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Process-level metrics for the simulation daemon."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use anyhow::Result;
use prometheus::{Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts};

use crate::SharedRegistry;

/// Build info, start-up cost and operator console activity.
#[derive(Clone)]
pub struct DaemonMetrics {
    config_load_seconds: Histogram,
    console_commands_total: IntCounterVec,
    frozen: IntGauge,
}

impl DaemonMetrics {
    /// Register the daemon family and publish `avsimd_build_info`.
    pub fn new(registry: &SharedRegistry, version: &str, profile: &str) -> Result<Self> {
        let build_info = IntGauge::with_opts(
            Opts::new("avsimd_build_info", "Daemon version and build profile")
                .const_label("version", version)
                .const_label("profile", profile),
        )?;
        build_info.set(1);
        registry.register(Box::new(build_info))?;

        let config_load_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "avsimd_config_load_seconds",
                "Time to locate, parse and validate the daemon configuration",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        )?;
        registry.register(Box::new(config_load_seconds.clone()))?;

        let console_commands_total = IntCounterVec::new(
            Opts::new(
                "avsimd_console_commands_total",
                "Operator console commands by verb and outcome",
            ),
            &["command", "outcome"],
        )?;
        registry.register(Box::new(console_commands_total.clone()))?;

        let frozen = IntGauge::with_opts(Opts::new(
            "avsimd_simulation_frozen",
            "1 while the operator holds the tick loop",
        ))?;
        registry.register(Box::new(frozen.clone()))?;

        Ok(Self {
            config_load_seconds,
            console_commands_total,
            frozen,
        })
    }

    pub fn observe_config_load(&self, seconds: f64) {
        self.config_load_seconds.observe(seconds);
    }

    pub fn record_console_command(&self, command: &str, ok: bool) {
        let outcome = if ok { "ok" } else { "error" };
        self.console_commands_total
            .with_label_values(&[command, outcome])
            .inc();
    }

    pub fn set_frozen(&self, frozen: bool) {
        self.frozen.set(i64::from(frozen));
    }

    pub fn console_commands(&self, command: &str, ok: bool) -> u64 {
        let outcome = if ok { "ok" } else { "error" };
        self.console_commands_total
            .with_label_values(&[command, outcome])
            .get()
    }
}

impl std::fmt::Debug for DaemonMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaemonMetrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{new_registry, render};

    #[test]
    fn build_info_and_console_counters_render() {
        let registry = new_registry();
        let metrics = DaemonMetrics::new(&registry, "0.1.0", "debug").unwrap();
        metrics.record_console_command("inject", true);
        metrics.record_console_command("seek", false);
        metrics.set_frozen(true);

        assert_eq!(metrics.console_commands("inject", true), 1);
        let body = render(&registry).unwrap();
        assert!(body.contains("avsimd_build_info{profile=\"debug\",version=\"0.1.0\"} 1"));
        assert!(body.contains("avsimd_console_commands_total{command=\"seek\",outcome=\"error\"} 1"));
        assert!(body.contains("avsimd_simulation_frozen 1"));
    }
}
