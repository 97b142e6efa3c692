//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "faults"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Fault catalog, injection and scenario timelines."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---

pub mod catalog;
pub mod error;
pub mod injector;
pub mod scenario;

pub use catalog::{catalog, lookup, FaultDefinition, FaultKind, FaultTarget, Severity, Subsystem};
pub use error::{FaultError, ScenarioError};
pub use injector::{ActiveFault, FaultInjector};
pub use scenario::{
    FiredAction, ScenarioAction, ScenarioDefinition, ScenarioLibrary, ScenarioRun, ScenarioStatus,
    TimelineEntry,
};

/// Crate prelude collecting the types hosts usually need.
pub mod prelude {
    pub use super::injector::{ActiveFault, FaultInjector};
    pub use super::scenario::{ScenarioDefinition, ScenarioLibrary};
}
