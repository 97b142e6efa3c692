//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "03-playback"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Playback error taxonomy."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlaybackError>;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("unable to read playback source {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported playback format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("playback source has no frames")]
    Empty,
    #[error("row {row} has {found} columns, header declares {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("frame {frame}: `{value}` is not a valid value for {parameter}")]
    InvalidValue {
        frame: usize,
        parameter: String,
        value: String,
    },
    #[error("malformed tabular source: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed structured source: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no playback session loaded")]
    NoSession,
    #[error("seek to {requested}s outside recording of {duration}s")]
    SeekOutOfRange { requested: f64, duration: f64 },
}
