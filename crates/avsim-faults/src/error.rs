//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "faults"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Error types for fault injection and scenario handling."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use std::path::PathBuf;

use avsim_model::FlightPhase;
use thiserror::Error;

use crate::catalog::{FaultKind, TargetKind};

#[derive(Debug, Error)]
pub enum FaultError {
    #[error("unknown fault type `{0}`")]
    UnknownFault(String),
    #[error("invalid target `{target}` for {fault}: expected {expected}")]
    InvalidTarget {
        fault: FaultKind,
        target: String,
        expected: TargetKind,
    },
    #[error("{fault} cannot be injected during {phase}")]
    PhaseNotAllowed { fault: FaultKind, phase: FlightPhase },
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("unknown scenario `{0}`")]
    UnknownScenario(String),
    #[error("scenario `{0}` is already registered")]
    Duplicate(String),
    #[error("invalid scenario `{id}`: {reason}")]
    Invalid { id: String, reason: String },
    #[error("failed to read scenario file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario definition: {0}")]
    Parse(#[from] toml::de::Error),
}
