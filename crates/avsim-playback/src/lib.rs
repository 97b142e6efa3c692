//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "03-playback"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Recorded flight data playback module exports."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
//! Recorded flight data playback for AV-SIM.
//!
//! Sources are CSV (header row of parameter names, usually led by `TIME`) or
//! JSON frame lists. Parsing is all-or-nothing. During playback the engine
//! interpolates between neighbouring frames and writes the result into an
//! [`avsim_model::AircraftModel`] through the fixed parameter table in
//! [`mapping`].

pub mod clock;
pub mod engine;
pub mod error;
pub mod frames;
pub mod mapping;
pub mod recorder;

pub use clock::{ManualClock, PlaybackClock, SystemClock};
pub use engine::{PlaybackEngine, PlaybackInfo, PlaybackState, MAX_SPEED, MIN_SPEED};
pub use error::{PlaybackError, Result};
pub use frames::{FrameValue, PlaybackSession, RecordedFrame, SourceFormat};
pub use mapping::{Parameter, ParameterSpec, ValueKind, PARAMETER_TABLE_VERSION};
pub use recorder::FlightRecorder;
