//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "03-playback"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Samples the model into recorder frames for later playback."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;

use avsim_model::AircraftModel;
use tracing::info;

use crate::error::{PlaybackError, Result};
use crate::frames::{FrameValue, PlaybackSession, RecordedFrame, SourceFormat, DEFAULT_SAMPLE_RATE_HZ};
use crate::mapping::{all_parameters, Parameter};

pub const TIME_COLUMN: &str = "TIME";

/// Accumulates frames sampled through the parameter table.
#[derive(Debug, Clone)]
pub struct FlightRecorder {
    parameters: Vec<Parameter>,
    frames: Vec<RecordedFrame>,
    sample_rate_hz: f64,
}

impl Default for FlightRecorder {
    fn default() -> Self {
        Self::new(all_parameters())
    }
}

impl FlightRecorder {
    pub fn new(parameters: Vec<Parameter>) -> Self {
        Self {
            parameters,
            frames: Vec::new(),
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
        }
    }

    /// Rate at which the caller samples; stored with structured output.
    pub fn with_sample_rate(mut self, sample_rate_hz: f64) -> Self {
        if sample_rate_hz.is_finite() && sample_rate_hz > 0.0 {
            self.sample_rate_hz = sample_rate_hz;
        }
        self
    }

    pub fn sample(&mut self, model: &AircraftModel) {
        let mut frame = RecordedFrame::new();
        frame.insert(TIME_COLUMN, FrameValue::Number(model.aircraft.elapsed_s));
        for parameter in &self.parameters {
            let spec = parameter.spec();
            frame.insert(spec.name, spec.sample(model));
        }
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn columns(&self) -> Vec<String> {
        std::iter::once(TIME_COLUMN)
            .chain(self.parameters.iter().map(|parameter| parameter.name()))
            .map(str::to_string)
            .collect()
    }

    /// Validate the recording as a playback session.
    pub fn to_session(&self) -> Result<PlaybackSession> {
        PlaybackSession::from_frames(self.frames.clone(), self.columns(), self.sample_rate_hz)
    }

    pub fn to_csv(&self) -> Result<String> {
        self.to_session()?.to_csv()
    }

    pub fn to_json(&self) -> Result<String> {
        self.to_session()?.to_json()
    }

    /// Write to `path`, choosing the encoding from its extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let body = match SourceFormat::from_path(path) {
            Some(SourceFormat::Csv) => self.to_csv()?,
            Some(SourceFormat::Json) => self.to_json()?,
            None => return Err(PlaybackError::UnsupportedFormat(path.to_path_buf())),
        };
        fs::write(path, body).map_err(|source| PlaybackError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            target: "avsim::playback",
            path = %path.display(),
            frames = self.frames.len(),
            "flight recording saved"
        );
        Ok(())
    }
}
