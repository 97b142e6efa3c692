//! ---
//! avsim_section: "01-core-functionality"
//! avsim_subsection: "module"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Shared primitives and utilities for the simulation runtime."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
//! Shared primitives for the AV-SIM workspace.
//! This crate exposes configuration loading and tracing initialisation
//! consumed by the simulation crates and binaries.

pub mod config;
pub mod logging;

pub use config::{AppConfig, LoadedAppConfig, LoggingConfig, MetricsConfig, PlaybackConfig, SimulationConfig};
pub use logging::{init_tracing, LogFormat};
