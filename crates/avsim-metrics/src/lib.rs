//! ---
//! avsim_section: "03-observability"
//! avsim_subsection: "module"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Prometheus registry shared by the simulator crates."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
//! Simulation counters live in [`SimulationMetrics`] and are handed to the
//! coordinator and fault injector. The daemon adds [`DaemonMetrics`] and, when
//! enabled, serves everything through [`MetricsExporter`].
use std::sync::Arc;

use anyhow::{Context, Result};
use prometheus::{Registry, TextEncoder};

pub mod daemon;
pub mod exporter;
pub mod simulation;

pub use daemon::DaemonMetrics;
pub use exporter::MetricsExporter;
pub use simulation::SimulationMetrics;

pub type SharedRegistry = Arc<Registry>;

pub fn new_registry() -> SharedRegistry {
    Arc::new(Registry::new())
}

/// Prometheus text exposition of everything registered so far.
pub fn render(registry: &Registry) -> Result<String> {
    TextEncoder::new()
        .encode_to_string(&registry.gather())
        .context("failed to encode metrics")
}
