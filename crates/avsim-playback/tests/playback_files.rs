//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "03-playback"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "File-backed recording and playback checks."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use avsim_model::{AircraftModel, EngineId};
use avsim_playback::{
    FlightRecorder, ManualClock, Parameter, PlaybackEngine, PlaybackError, PlaybackSession,
};

fn recorded_climb() -> FlightRecorder {
    let mut model = AircraftModel::deterministic();
    model.set_flight_phase(avsim_model::FlightPhase::Climb);
    let mut recorder = FlightRecorder::new(vec![
        Parameter::AltStd,
        Parameter::Ias,
        Parameter::Eng1N1,
        Parameter::Eng2N1,
        Parameter::Phase,
    ]);
    for _ in 0..30 {
        recorder.sample(&model);
        model.advance(1.0);
    }
    recorder
}

#[test]
fn saved_recordings_replay_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = recorded_climb();

    for name in ["climb.csv", "climb.json"] {
        let path = dir.path().join(name);
        recorder.save(&path).unwrap();

        let clock = ManualClock::new();
        let mut engine = PlaybackEngine::new(Box::new(clock.clone()));
        engine.load_path(&path).unwrap();
        assert_eq!(engine.info().frame_count, 30);

        let mut model = AircraftModel::deterministic();
        engine.play();
        clock.advance_secs(10.0);
        engine.advance(&mut model);

        let session = engine.session().unwrap();
        let expected = session.frames()[10].number("ALT_STD").unwrap();
        assert!((model.aircraft.altitude_ft - expected).abs() < 1e-6, "{name}");
        let n1 = session.frames()[10].number("ENG_1_N1").unwrap();
        assert!((model.engine(EngineId::Eng1).n1_pct - n1).abs() < 1e-6, "{name}");
    }
}

#[test]
fn missing_and_unknown_files_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        PlaybackSession::from_path(dir.path().join("absent.csv")),
        Err(PlaybackError::Io { .. })
    ));
    assert!(matches!(
        PlaybackSession::from_path(dir.path().join("flight.bin")),
        Err(PlaybackError::UnsupportedFormat(_))
    ));
}

#[test]
fn csv_recordings_keep_their_sample_rate() {
    let dir = tempfile::tempdir().unwrap();
    let mut model = AircraftModel::deterministic();
    let mut recorder = FlightRecorder::new(vec![Parameter::AltStd, Parameter::Ias]).with_sample_rate(4.0);
    for _ in 0..241 {
        recorder.sample(&model);
        model.advance(0.25);
    }
    let path = dir.path().join("fast.csv");
    recorder.save(&path).unwrap();

    let session = PlaybackSession::from_path(&path).unwrap();
    assert_eq!(session.sample_rate_hz(), 4.0);
    assert_eq!(session.duration_s(), 60.25);

    let mut engine = PlaybackEngine::new(Box::new(ManualClock::new()));
    engine.load_path(&path).unwrap();
    engine.seek(10.0).unwrap();
    let mut replayed = AircraftModel::deterministic();
    engine.apply_current(&mut replayed);
    assert_eq!(engine.info().current_index, 40);
    let expected = engine.session().unwrap().frames()[40].number("ALT_STD");
    assert_eq!(Some(replayed.aircraft.altitude_ft), expected);
}
