//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "02-model"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Physical state model module exports and shared types."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
//! Physical state model for a twin-engine transport aircraft.
//!
//! [`AircraftModel::advance`] is the single mutation entry point used by the
//! live simulation. Fault effects and playback setters write the public state
//! fields directly through a transient `&mut` borrow of the model.

pub mod aircraft;
pub mod controls;
pub mod electrical;
pub mod engine;
pub mod environment;
pub mod fuel;
pub mod hydraulics;
pub mod model;
pub mod noise;
pub mod phase;
pub mod pressurization;
pub mod smoothing;

pub use aircraft::AircraftState;
pub use controls::FlightControls;
pub use electrical::{AcBus, Battery, DcBus, ElectricalSystem, Generator, GeneratorId};
pub use engine::{EngineId, EngineState};
pub use fuel::{FuelState, FuelTank};
pub use hydraulics::{HydraulicCircuit, HydraulicCircuitId, HydraulicSystem};
pub use model::AircraftModel;
pub use noise::{NoNoise, NoiseSource, RandomNoise};
pub use phase::{determine_phase, FlightPhase};
pub use pressurization::{PackId, PressurizationState};
pub use smoothing::approach;
