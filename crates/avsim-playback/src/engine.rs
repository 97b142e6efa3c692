//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "03-playback"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Clocked playback of recorded sessions into the aircraft model."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use std::path::Path;

use avsim_model::AircraftModel;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::{PlaybackClock, SystemClock};
use crate::error::{PlaybackError, Result};
use crate::frames::PlaybackSession;

pub const MIN_SPEED: f64 = 0.1;
pub const MAX_SPEED: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// Playback status as shown to operators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackInfo {
    pub loaded: bool,
    pub playing: bool,
    pub paused: bool,
    pub current_index: usize,
    pub frame_count: usize,
    pub duration_s: f64,
    pub position_s: f64,
    pub progress_pct: f64,
    pub speed: f64,
}

/// Drives a [`PlaybackSession`] against a wall clock.
///
/// Position in the recording is `anchor_position + (now - anchor_real) * speed`
/// while playing. Every transition that changes speed or resumes playback
/// re-anchors, so recorded time never jumps.
#[derive(Debug)]
pub struct PlaybackEngine {
    session: Option<PlaybackSession>,
    clock: Box<dyn PlaybackClock>,
    state: PlaybackState,
    speed: f64,
    anchor_real_s: f64,
    anchor_position_s: f64,
    position_s: f64,
    current_index: usize,
    fraction: f64,
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self::new(Box::new(SystemClock::new()))
    }
}

impl PlaybackEngine {
    pub fn new(clock: Box<dyn PlaybackClock>) -> Self {
        Self {
            session: None,
            clock,
            state: PlaybackState::Stopped,
            speed: 1.0,
            anchor_real_s: 0.0,
            anchor_position_s: 0.0,
            position_s: 0.0,
            current_index: 0,
            fraction: 0.0,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.set_speed(speed);
        self
    }

    /// Replace the session and rewind. Speed is kept.
    pub fn load(&mut self, session: PlaybackSession) {
        info!(
            target: "avsim::playback",
            frames = session.frame_count(),
            duration_s = session.duration_s(),
            mapped = session.mapped_parameters().len(),
            "playback session loaded"
        );
        self.session = Some(session);
        self.reset_position();
    }

    /// Parse and load. On failure the previous session stays in place.
    pub fn load_str(&mut self, source: &str) -> Result<()> {
        let session = PlaybackSession::parse(source).map_err(|err| {
            warn!(target: "avsim::playback", error = %err, "playback source rejected");
            err
        })?;
        self.load(session);
        Ok(())
    }

    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let session = PlaybackSession::from_path(path).map_err(|err| {
            warn!(
                target: "avsim::playback",
                path = %path.display(),
                error = %err,
                "playback file rejected"
            );
            err
        })?;
        self.load(session);
        Ok(())
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Start or resume. Playback that already ran off the end restarts.
    pub fn play(&mut self) -> bool {
        let Some(duration) = self.session.as_ref().map(PlaybackSession::duration_s) else {
            warn!(target: "avsim::playback", "play requested with no session loaded");
            return false;
        };
        if self.state == PlaybackState::Playing {
            return true;
        }
        if self.position_s >= duration {
            self.reset_position();
        }
        self.anchor(self.position_s);
        self.state = PlaybackState::Playing;
        debug!(target: "avsim::playback", position_s = self.position_s, "playback started");
        true
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.position_s = self.live_position();
            self.state = PlaybackState::Paused;
            debug!(target: "avsim::playback", position_s = self.position_s, "playback paused");
        }
    }

    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.reset_position();
    }

    /// Jump to `seconds` into the recording. Allowed range is `[0, duration]`.
    pub fn seek(&mut self, seconds: f64) -> Result<()> {
        let session = self.session.as_ref().ok_or(PlaybackError::NoSession)?;
        let duration = session.duration_s();
        if !seconds.is_finite() || seconds < 0.0 || seconds > duration {
            return Err(PlaybackError::SeekOutOfRange {
                requested: seconds,
                duration,
            });
        }
        let frame_position = seconds * session.sample_rate_hz();
        let last = session.frame_count().saturating_sub(1);
        self.position_s = seconds;
        self.current_index = (frame_position.floor() as usize).min(last);
        self.fraction = if self.current_index == last {
            0.0
        } else {
            frame_position.fract()
        };
        if self.state == PlaybackState::Playing {
            self.anchor(seconds);
        }
        Ok(())
    }

    /// Set the speed multiplier, clamped to `[MIN_SPEED, MAX_SPEED]`. Non-finite
    /// requests are ignored.
    pub fn set_speed(&mut self, multiplier: f64) {
        if !multiplier.is_finite() {
            return;
        }
        if self.state == PlaybackState::Playing {
            let position = self.live_position();
            self.anchor(position);
        }
        self.speed = multiplier.clamp(MIN_SPEED, MAX_SPEED);
    }

    /// One playback tick: read the clock, pick the frame pair and write the
    /// interpolated values. Returns whether anything was written.
    pub fn advance(&mut self, model: &mut AircraftModel) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        let position = self.live_position();
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        let frame_position = position * session.sample_rate_hz();
        let index = frame_position.floor() as usize;
        let frame_count = session.frame_count();

        if index >= frame_count {
            self.current_index = frame_count.saturating_sub(1);
            self.fraction = 0.0;
            self.position_s = session.duration_s();
            self.state = PlaybackState::Stopped;
            info!(target: "avsim::playback", frames = frame_count, "playback reached end of recording");
        } else {
            self.current_index = index;
            self.fraction = frame_position - index as f64;
            self.position_s = position;
        }
        self.apply_current(model)
    }

    /// Write the values at the current position without touching the clock.
    pub fn apply_current(&self, model: &mut AircraftModel) -> bool {
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        let index = self.current_index;
        for binding in session.bindings() {
            let here = binding.values.get(index).copied().flatten();
            let next = binding.values.get(index + 1).copied().flatten();
            let value = match (here, next) {
                (Some(a), Some(b)) => binding.spec.interpolate(a, b, self.fraction),
                (Some(a), None) => a,
                (None, _) => continue,
            };
            binding.spec.write(model, value);
        }
        true
    }

    pub fn info(&self) -> PlaybackInfo {
        let (frame_count, duration_s) = self
            .session
            .as_ref()
            .map(|session| (session.frame_count(), session.duration_s()))
            .unwrap_or((0, 0.0));
        let position_s = if self.state == PlaybackState::Playing {
            self.live_position().min(duration_s)
        } else {
            self.position_s
        };
        let progress_pct = if duration_s > 0.0 {
            (position_s / duration_s * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        PlaybackInfo {
            loaded: self.session.is_some(),
            playing: self.state == PlaybackState::Playing,
            paused: self.state == PlaybackState::Paused,
            current_index: self.current_index,
            frame_count,
            duration_s,
            position_s,
            progress_pct,
            speed: self.speed,
        }
    }

    fn now_s(&self) -> f64 {
        self.clock.now().as_secs_f64()
    }

    fn anchor(&mut self, position_s: f64) {
        self.anchor_real_s = self.now_s();
        self.anchor_position_s = position_s;
    }

    fn live_position(&self) -> f64 {
        let real = (self.now_s() - self.anchor_real_s).max(0.0);
        self.anchor_position_s + real * self.speed
    }

    fn reset_position(&mut self) {
        self.position_s = 0.0;
        self.anchor_position_s = 0.0;
        self.current_index = 0;
        self.fraction = 0.0;
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Stopped;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use avsim_model::{EngineId, FlightPhase};

    fn engine_with(source: &str) -> (PlaybackEngine, ManualClock) {
        let clock = ManualClock::new();
        let mut engine = PlaybackEngine::new(Box::new(clock.clone()));
        engine.load_str(source).unwrap();
        (engine, clock)
    }

    const TWO_FRAMES: &str = "TIME,ENG_1_N1,ALT_STD,GEAR_DOWN,FLIGHT_PHASE\n\
                              0,80,10000,1,CLIMB\n\
                              1,90,11000,0,CRUISE\n";

    #[test]
    fn frame_boundaries_are_exact_and_midpoints_average() {
        let (mut engine, clock) = engine_with(TWO_FRAMES);
        let mut model = AircraftModel::deterministic();
        assert!(engine.play());

        assert!(engine.advance(&mut model));
        assert_eq!(model.engine(EngineId::Eng1).n1_pct, 80.0);
        assert_eq!(model.aircraft.altitude_ft, 10_000.0);
        assert!(model.controls.gear_down);
        assert_eq!(model.phase(), FlightPhase::Climb);

        clock.advance_secs(0.5);
        engine.advance(&mut model);
        assert_eq!(model.engine(EngineId::Eng1).n1_pct, 85.0);
        assert_eq!(model.aircraft.altitude_ft, 10_500.0);
        assert!(model.controls.gear_down);
        assert_eq!(model.phase(), FlightPhase::Climb);
    }

    #[test]
    fn speed_scales_recorded_time() {
        let mut source = String::from("TIME,IAS\n");
        for second in 0..3_600 {
            source.push_str(&format!("{second},{}\n", 250 + second % 10));
        }
        let (mut engine, clock) = engine_with(&source);
        let mut model = AircraftModel::deterministic();
        engine.set_speed(2.0);
        engine.play();
        clock.advance_secs(10.0);
        engine.advance(&mut model);
        assert_eq!(engine.info().current_index, 20);
    }

    #[test]
    fn pause_does_not_skip_time() {
        let (mut engine, clock) = engine_with("IAS\n1\n2\n3\n4\n5\n");
        let mut model = AircraftModel::deterministic();
        engine.play();
        clock.advance_secs(2.0);
        engine.pause();
        clock.advance_secs(100.0);
        engine.play();
        clock.advance_secs(1.0);
        engine.advance(&mut model);
        assert_eq!(engine.info().current_index, 3);
        assert_eq!(model.aircraft.airspeed_kt, 4.0);
    }

    #[test]
    fn speed_change_keeps_position_continuous() {
        let (mut engine, clock) = engine_with("IAS\n1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n");
        engine.play();
        clock.advance_secs(2.0);
        engine.set_speed(3.0);
        assert!((engine.info().position_s - 2.0).abs() < 1e-9);
        clock.advance_secs(1.0);
        assert!((engine.info().position_s - 5.0).abs() < 1e-9);
    }

    #[test]
    fn speed_is_clamped() {
        let mut engine = PlaybackEngine::default();
        engine.set_speed(50.0);
        assert_eq!(engine.speed(), MAX_SPEED);
        engine.set_speed(0.0);
        assert_eq!(engine.speed(), MIN_SPEED);
        engine.set_speed(f64::NAN);
        assert_eq!(engine.speed(), MIN_SPEED);
    }

    #[test]
    fn running_off_the_end_stops_on_the_last_frame() {
        let (mut engine, clock) = engine_with(TWO_FRAMES);
        let mut model = AircraftModel::deterministic();
        engine.play();
        clock.advance_secs(30.0);
        assert!(engine.advance(&mut model));
        let info = engine.info();
        assert!(!info.playing);
        assert_eq!(info.current_index, 1);
        assert_eq!(info.progress_pct, 100.0);
        assert_eq!(model.aircraft.altitude_ft, 11_000.0);
        assert_eq!(model.phase(), FlightPhase::Cruise);
        assert!(!engine.advance(&mut model));

        assert!(engine.play());
        assert_eq!(engine.info().current_index, 0);
    }

    #[test]
    fn seek_repositions_within_range() {
        let (mut engine, _clock) = engine_with(TWO_FRAMES);
        let mut model = AircraftModel::deterministic();
        engine.seek(1.5).unwrap();
        assert_eq!(engine.info().current_index, 1);
        engine.apply_current(&mut model);
        assert_eq!(model.engine(EngineId::Eng1).n1_pct, 90.0);
        assert!(matches!(
            engine.seek(2.5),
            Err(PlaybackError::SeekOutOfRange { .. })
        ));
        assert!(engine.seek(-1.0).is_err());
        assert!(matches!(
            PlaybackEngine::default().seek(0.0),
            Err(PlaybackError::NoSession)
        ));
    }

    #[test]
    fn failed_load_keeps_previous_session() {
        let (mut engine, _clock) = engine_with(TWO_FRAMES);
        assert!(engine.load_str("TIME,IAS\n0\n").is_err());
        assert_eq!(engine.info().frame_count, 2);
        assert!(!PlaybackEngine::default().play());
    }

    #[test]
    fn unmapped_fields_are_left_alone() {
        let (mut engine, _clock) = engine_with("IAS,UNKNOWN_PARAM\n200,7\n");
        let mut model = AircraftModel::deterministic();
        let altitude = model.aircraft.altitude_ft;
        engine.play();
        engine.advance(&mut model);
        assert_eq!(model.aircraft.airspeed_kt, 200.0);
        assert_eq!(model.aircraft.altitude_ft, altitude);
    }
}
