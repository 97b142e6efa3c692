//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "04-simgen"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Headless live run recorder producing playback sources."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
//! Flies the live model without a display and writes every tick through the
//! flight recorder, producing CSV or JSON that `avsimd replay` accepts.
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use avsim_core::SimulationCoordinator;
use avsim_faults::{FaultInjector, ScenarioLibrary};
use avsim_model::{AircraftModel, FlightPhase, NoNoise, NoiseSource, RandomNoise};
use avsim_playback::{FlightRecorder, PlaybackEngine};
use clap::{ArgAction, Parser, ValueEnum};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    author,
    disable_version_flag = true,
    about = "Record a headless AV-SIM live run for later playback",
    long_about = None
)]
struct Cli {
    /// Output file path. Use '-' for stdout.
    #[arg(long, default_value = "flight.csv")]
    output: PathBuf,

    /// Explicit output format when extension is ambiguous
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Simulated seconds to record (ignored when --samples supplied)
    #[arg(long, default_value_t = 600)]
    duration_secs: u64,

    /// Simulated interval between samples in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Explicit number of samples to record (overrides --duration-secs)
    #[arg(long)]
    samples: Option<u64>,

    /// Flight phase to seed before the first tick, e.g. TAKEOFF
    #[arg(long)]
    phase: Option<FlightPhase>,

    /// Scenario id started before the first tick
    #[arg(long)]
    scenario: Option<String>,

    /// Extra scenario definition (TOML) to register
    #[arg(long = "scenario-file", value_name = "FILE")]
    scenario_files: Vec<PathBuf>,

    /// Fault injected before the first tick, as CODE or CODE:target
    #[arg(long = "fault", value_name = "FAULT")]
    faults: Vec<String>,

    /// Random seed for subsystem noise
    #[arg(long, default_value_t = 0xA320)]
    seed: u64,

    /// Record without subsystem noise
    #[arg(long = "no-noise", action = ArgAction::SetTrue)]
    no_noise: bool,

    /// Print version information and exit
    #[arg(short = 'V', long = "version", action = ArgAction::SetTrue)]
    version: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("avsim-simgen {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    avsim_logging::init();

    let format = determine_format(&cli.output, cli.format);
    let samples = compute_sample_count(&cli)?;
    let recorder = record(&cli, samples)?;
    let body = match format {
        OutputFormat::Csv => recorder.to_csv()?,
        OutputFormat::Json => recorder.to_json()?,
    };
    write_output(&cli.output, &body)?;

    if cli.output.as_os_str() != "-" {
        info!(samples, output = %cli.output.display(), "flight recorded");
    }
    Ok(())
}

fn compute_sample_count(cli: &Cli) -> Result<u64> {
    if cli.interval_ms == 0 {
        return Err(anyhow!("interval-ms must be greater than zero"));
    }
    if let Some(samples) = cli.samples {
        return if samples == 0 {
            Err(anyhow!("samples must be greater than zero"))
        } else {
            Ok(samples)
        };
    }
    let ticks = cli.duration_secs.saturating_mul(1000) / cli.interval_ms;
    Ok(ticks.max(1))
}

fn determine_format(path: &Path, override_format: Option<OutputFormat>) -> OutputFormat {
    if let Some(format) = override_format {
        return format;
    }
    if path.as_os_str() == "-" {
        return OutputFormat::Json;
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => OutputFormat::Json,
        _ => OutputFormat::Csv,
    }
}

fn build_coordinator(cli: &Cli) -> Result<SimulationCoordinator> {
    let noise: Box<dyn NoiseSource> = if cli.no_noise {
        Box::new(NoNoise)
    } else {
        Box::new(RandomNoise::seeded(cli.seed))
    };
    let mut model = AircraftModel::new(noise);
    if let Some(phase) = cli.phase {
        model.set_flight_phase(phase);
    }

    let mut library = ScenarioLibrary::builtin();
    for path in &cli.scenario_files {
        library
            .load_file(path)
            .with_context(|| format!("failed to load scenario file {}", path.display()))?;
    }

    let mut coordinator = SimulationCoordinator::new(
        model,
        FaultInjector::new(library, None),
        PlaybackEngine::default(),
        None,
    );
    for spec in &cli.faults {
        let (code, target) = match spec.split_once(':') {
            Some((code, target)) => (code, Some(target)),
            None => (spec.as_str(), None),
        };
        if !coordinator.inject_fault(code, target) {
            return Err(anyhow!("fault {spec} was rejected in the starting phase"));
        }
    }
    if let Some(id) = &cli.scenario {
        if !coordinator.run_scenario(id) {
            return Err(anyhow!("unknown scenario {id}"));
        }
    }
    Ok(coordinator)
}

fn record(cli: &Cli, samples: u64) -> Result<FlightRecorder> {
    let mut coordinator = build_coordinator(cli)?;
    let dt = cli.interval_ms as f64 / 1000.0;
    let mut recorder = FlightRecorder::default().with_sample_rate(1.0 / dt);
    for _ in 0..samples {
        recorder.sample(coordinator.model());
        coordinator.tick(dt, false);
    }
    Ok(recorder)
}

fn write_output(path: &Path, body: &str) -> Result<()> {
    if path.as_os_str() == "-" {
        let mut stdout = io::stdout().lock();
        stdout.write_all(body.as_bytes())?;
        stdout.write_all(b"\n")?;
        return Ok(());
    }
    let mut file = File::create(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    file.write_all(body.as_bytes())
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}
