//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "03-playback"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Recorded frames and all-or-nothing session parsing."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PlaybackError, Result};
use crate::mapping::{self, ParameterSpec, PARAMETER_TABLE_VERSION};
use crate::recorder::TIME_COLUMN;

/// Default frame rate of recorder output.
pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 1.0;

/// Single recorded cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl FrameValue {
    fn from_cell(cell: &str) -> Self {
        match cell.parse::<f64>() {
            Ok(number) => FrameValue::Number(number),
            Err(_) => FrameValue::Text(cell.to_string()),
        }
    }

    fn to_cell(&self) -> String {
        match self {
            FrameValue::Flag(flag) => flag.to_string(),
            FrameValue::Number(number) => number.to_string(),
            FrameValue::Text(text) => text.clone(),
        }
    }
}

/// One recorded time index: parameter name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordedFrame {
    values: IndexMap<String, FrameValue>,
}

impl RecordedFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FrameValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FrameValue> {
        self.values.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.values.get(name)? {
            FrameValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FrameValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Input encodings understood by [`PlaybackSession::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(SourceFormat::Csv),
            "json" => Some(SourceFormat::Json),
            _ => None,
        }
    }

    /// Structured sources start with `[` or `{`; anything else is tabular.
    pub fn detect(source: &str) -> Self {
        match source.trim_start().chars().next() {
            Some('[') | Some('{') => SourceFormat::Json,
            _ => SourceFormat::Csv,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonDocument {
    Frames(Vec<RecordedFrame>),
    Recording {
        frames: Vec<RecordedFrame>,
        #[serde(default)]
        sample_rate_hz: Option<f64>,
        #[serde(default)]
        parameter_table_version: Option<u32>,
    },
}

#[derive(Serialize)]
struct JsonRecording<'a> {
    parameter_table_version: u32,
    sample_rate_hz: f64,
    frames: &'a [RecordedFrame],
}

/// Column bound to a model field, with every frame decoded up front.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub(crate) spec: ParameterSpec,
    pub(crate) values: Vec<Option<f64>>,
}

/// Parsed, validated recording ready for playback.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    frames: Vec<RecordedFrame>,
    columns: Vec<String>,
    sample_rate_hz: f64,
    bindings: Vec<Binding>,
}

impl PlaybackSession {
    /// Parse a source, detecting its format from the leading character.
    pub fn parse(source: &str) -> Result<Self> {
        Self::parse_as(source, SourceFormat::detect(source))
    }

    pub fn parse_as(source: &str, format: SourceFormat) -> Result<Self> {
        match format {
            SourceFormat::Csv => Self::parse_csv(source),
            SourceFormat::Json => Self::parse_json(source),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = SourceFormat::from_path(path)
            .ok_or_else(|| PlaybackError::UnsupportedFormat(path.to_path_buf()))?;
        let source = fs::read_to_string(path).map_err(|source| PlaybackError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_as(&source, format)
    }

    pub fn parse_csv(source: &str) -> Result<Self> {
        if source.trim().is_empty() {
            return Err(PlaybackError::Empty);
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(false)
            .from_reader(source.as_bytes());

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if columns.iter().all(|column| column.is_empty()) {
            return Err(PlaybackError::Empty);
        }

        let mut frames = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(err) => {
                    return Err(match err.kind() {
                        csv::ErrorKind::UnequalLengths { len, expected_len, .. } => {
                            PlaybackError::RowLength {
                                row: row + 1,
                                expected: *expected_len as usize,
                                found: *len as usize,
                            }
                        }
                        _ => PlaybackError::Csv(err),
                    })
                }
            };
            let mut frame = RecordedFrame::new();
            for (column, cell) in columns.iter().zip(record.iter()) {
                if !cell.is_empty() {
                    frame.insert(column.clone(), FrameValue::from_cell(cell));
                }
            }
            frames.push(frame);
        }

        let sample_rate_hz = sample_rate_from_time(&frames).unwrap_or(DEFAULT_SAMPLE_RATE_HZ);
        Self::from_frames(frames, columns, sample_rate_hz)
    }

    pub fn parse_json(source: &str) -> Result<Self> {
        let (frames, sample_rate_hz) = match serde_json::from_str::<JsonDocument>(source) {
            Ok(JsonDocument::Frames(frames)) => (frames, None),
            Ok(JsonDocument::Recording {
                frames,
                sample_rate_hz,
                parameter_table_version,
            }) => {
                if let Some(version) = parameter_table_version {
                    if version != PARAMETER_TABLE_VERSION {
                        warn!(
                            target: "avsim::playback",
                            recorded = version,
                            current = PARAMETER_TABLE_VERSION,
                            "recording uses a different parameter table version"
                        );
                    }
                }
                (frames, sample_rate_hz)
            }
            // Untagged errors say nothing useful; re-parse as a plain list for the message.
            Err(_) => (serde_json::from_str::<Vec<RecordedFrame>>(source)?, None),
        };

        let mut columns: Vec<String> = Vec::new();
        for frame in &frames {
            for (name, _) in frame.iter() {
                if !columns.iter().any(|column| column == name) {
                    columns.push(name.to_string());
                }
            }
        }
        let sample_rate_hz = sample_rate_hz
            .or_else(|| sample_rate_from_time(&frames))
            .unwrap_or(DEFAULT_SAMPLE_RATE_HZ);
        Self::from_frames(frames, columns, sample_rate_hz)
    }

    /// Build a session from frames already in memory.
    pub fn from_frames(
        frames: Vec<RecordedFrame>,
        columns: Vec<String>,
        sample_rate_hz: f64,
    ) -> Result<Self> {
        if frames.is_empty() {
            return Err(PlaybackError::Empty);
        }
        let sample_rate_hz = if sample_rate_hz.is_finite() && sample_rate_hz > 0.0 {
            sample_rate_hz
        } else {
            DEFAULT_SAMPLE_RATE_HZ
        };

        let mut bindings = Vec::new();
        let mut ignored = Vec::new();
        for column in &columns {
            let Some(parameter) = mapping::resolve(column) else {
                ignored.push(column.as_str());
                continue;
            };
            let spec = parameter.spec();
            let mut values = Vec::with_capacity(frames.len());
            for (index, frame) in frames.iter().enumerate() {
                let decoded = match frame.get(column) {
                    None => None,
                    Some(value) => Some(spec.decode(value).ok_or_else(|| {
                        PlaybackError::InvalidValue {
                            frame: index,
                            parameter: spec.name.to_string(),
                            value: value.to_cell(),
                        }
                    })?),
                };
                values.push(decoded);
            }
            bindings.push(Binding { spec, values });
        }

        debug!(
            target: "avsim::playback",
            frames = frames.len(),
            mapped = bindings.len(),
            ignored = ?ignored,
            "playback session parsed"
        );

        Ok(Self {
            frames,
            columns,
            sample_rate_hz,
            bindings,
        })
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    /// Recorded length in seconds.
    pub fn duration_s(&self) -> f64 {
        self.frames.len() as f64 / self.sample_rate_hz
    }

    /// Names of the columns that drive a model field.
    pub fn mapped_parameters(&self) -> Vec<&'static str> {
        self.bindings.iter().map(|binding| binding.spec.name).collect()
    }

    pub(crate) fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for frame in &self.frames {
            writer.write_record(self.columns.iter().map(|column| {
                frame.get(column).map(FrameValue::to_cell).unwrap_or_default()
            }))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| PlaybackError::Io {
                path: "<memory>".into(),
                source: err.into_error(),
            })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&JsonRecording {
            parameter_table_version: PARAMETER_TABLE_VERSION,
            sample_rate_hz: self.sample_rate_hz,
            frames: &self.frames,
        })?)
    }
}

/// Rate implied by a strictly increasing `TIME` column, from the median step.
fn sample_rate_from_time(frames: &[RecordedFrame]) -> Option<f64> {
    let times = frames
        .iter()
        .map(|frame| frame.number(TIME_COLUMN))
        .collect::<Option<Vec<f64>>>()?;
    let mut steps: Vec<f64> = times.windows(2).map(|pair| pair[1] - pair[0]).collect();
    if steps.is_empty() || steps.iter().any(|step| !step.is_finite() || *step <= 0.0) {
        return None;
    }
    steps.sort_by(f64::total_cmp);
    let rate = 1.0 / steps[steps.len() / 2];
    rate.is_finite().then_some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "TIME,ENG_1_N1,ALT_STD,FLIGHT_PHASE,CUSTOM\n\
                       0,80.0,10000,CLIMB,a\n\
                       1,90.0,11000,CLIMB,b\n";

    #[test]
    fn csv_maps_known_columns_only() {
        let session = PlaybackSession::parse(CSV).unwrap();
        assert_eq!(session.frame_count(), 2);
        assert_eq!(session.columns().len(), 5);
        assert_eq!(
            session.mapped_parameters(),
            vec!["ENG_1_N1", "ALT_STD", "FLIGHT_PHASE"]
        );
        assert_eq!(session.frames()[1].number("ENG_1_N1"), Some(90.0));
        assert_eq!(session.duration_s(), 2.0);
    }

    #[test]
    fn malformed_sources_are_rejected() {
        assert!(matches!(PlaybackSession::parse(""), Err(PlaybackError::Empty)));
        assert!(matches!(
            PlaybackSession::parse("TIME,ALT_STD\n"),
            Err(PlaybackError::Empty)
        ));
        assert!(matches!(
            PlaybackSession::parse("TIME,ALT_STD\n0,100\n1\n"),
            Err(PlaybackError::RowLength { row: 2, expected: 2, found: 1 })
        ));
        assert!(matches!(
            PlaybackSession::parse("TIME,ALT_STD\n0,high\n"),
            Err(PlaybackError::InvalidValue { frame: 0, .. })
        ));
        assert!(matches!(
            PlaybackSession::parse("[1, 2, 3]"),
            Err(PlaybackError::Json(_))
        ));
        assert!(matches!(PlaybackSession::parse("[]"), Err(PlaybackError::Empty)));
    }

    #[test]
    fn csv_rate_follows_time_column() {
        let half_second = PlaybackSession::parse("TIME,IAS\n0,140\n0.5,141\n1.0,142\n1.5,143\n").unwrap();
        assert_eq!(half_second.sample_rate_hz(), 2.0);
        assert_eq!(half_second.duration_s(), 2.0);

        let rewound = PlaybackSession::parse("TIME,IAS\n0,140\n2,141\n1,142\n").unwrap();
        assert_eq!(rewound.sample_rate_hz(), DEFAULT_SAMPLE_RATE_HZ);
        let untimed = PlaybackSession::parse("IAS\n140\n141\n").unwrap();
        assert_eq!(untimed.sample_rate_hz(), DEFAULT_SAMPLE_RATE_HZ);
    }

    #[test]
    fn json_accepts_lists_and_recordings() {
        let list = PlaybackSession::parse(r#"[{"ENG_1_N1": 80, "GEAR_DOWN": true}]"#).unwrap();
        assert_eq!(list.frame_count(), 1);
        assert_eq!(list.sample_rate_hz(), DEFAULT_SAMPLE_RATE_HZ);

        let recording = PlaybackSession::parse(
            r#"{"sample_rate_hz": 4.0, "frames": [{"IAS": 250}, {"IAS": 251}]}"#,
        )
        .unwrap();
        assert_eq!(recording.sample_rate_hz(), 4.0);
        assert_eq!(recording.duration_s(), 0.5);
    }

    #[test]
    fn csv_export_parses_back() {
        let session = PlaybackSession::parse(CSV).unwrap();
        let again = PlaybackSession::parse(&session.to_csv().unwrap()).unwrap();
        assert_eq!(again.frames(), session.frames());
        let json = PlaybackSession::parse(&session.to_json().unwrap()).unwrap();
        assert_eq!(json.frames(), session.frames());
    }
}
