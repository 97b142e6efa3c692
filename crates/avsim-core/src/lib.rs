//! ---
//! avsim_section: "01-core-functionality"
//! avsim_subsection: "module"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Simulation coordination and runtime lifecycle."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
//! Simulation coordinator, display snapshot and tick runtime for AV-SIM.

pub mod coordinator;
pub mod runtime;
pub mod snapshot;

pub use coordinator::{SharedCoordinator, SimMode, SimulationCoordinator};
pub use runtime::{RuntimeHandle, TickRuntime};
pub use snapshot::{ApuSnapshot, FuelSnapshot, SimulationSnapshot};
