//! ---
//! avsim_section: "01-core-functionality"
//! avsim_subsection: "binary"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Binary entrypoint for the AV-SIM daemon."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use avsim_common::config::AppConfig;
use avsim_common::logging::init_tracing;
use avsim_core::{RuntimeHandle, SimulationCoordinator, TickRuntime};
use avsim_faults::catalog;
use avsim_metrics::{new_registry, DaemonMetrics, MetricsExporter, SharedRegistry, SimulationMetrics};
use avsim_model::FlightPhase;
use clap::{ArgAction, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

mod console;

use console::{ConsoleCommand, ConsoleFlow};

#[derive(Debug, Parser)]
#[command(
    author,
    disable_version_flag = true,
    about = "AV-SIM aircraft systems simulation daemon",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(
        short = 'V',
        long = "version",
        action = ArgAction::SetTrue,
        help = "Print version information and exit"
    )]
    version: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run the live simulation with the operator console")]
    Run {
        #[arg(long, help = "Flight phase to seed before the first tick")]
        phase: Option<FlightPhase>,
        #[arg(long, help = "Scenario id to start immediately")]
        scenario: Option<String>,
        #[arg(long, help = "Do not read operator commands from stdin")]
        no_console: bool,
    },
    #[command(about = "Replay a recorded CSV/JSON flight")]
    Replay {
        #[arg(value_name = "FILE")]
        source: PathBuf,
        #[arg(long, help = "Playback speed multiplier (0.1 - 10)")]
        speed: Option<f64>,
        #[arg(long, help = "Load without starting playback")]
        paused: bool,
        #[arg(long, help = "Do not read operator commands from stdin")]
        no_console: bool,
    },
    #[command(about = "List the fault catalog")]
    Faults,
    #[command(about = "List built-in and configured scenarios")]
    Scenarios,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("avsimd {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/avsim.toml"));
    candidates.push(PathBuf::from("/etc/avsim/avsim.toml"));

    let load_started = Instant::now();
    let loaded = AppConfig::load_with_source(&candidates)?;
    let load_duration = load_started.elapsed();
    let config = loaded.config;

    init_tracing("avsimd", &config.logging)?;
    match &loaded.source {
        Some(path) => info!(config_path = %path.display(), "configuration loaded"),
        None => info!("no configuration file found; using defaults"),
    }

    let registry = new_registry();
    let profile = if cfg!(debug_assertions) { "debug" } else { "release" };
    let daemon_metrics = DaemonMetrics::new(&registry, env!("CARGO_PKG_VERSION"), profile)?;
    daemon_metrics.observe_config_load(load_duration.as_secs_f64());
    let sim_metrics = SimulationMetrics::new(registry.clone())?;

    match cli.command.unwrap_or(Commands::Run {
        phase: None,
        scenario: None,
        no_console: false,
    }) {
        Commands::Run {
            phase,
            scenario,
            no_console,
        } => {
            let mut coordinator = SimulationCoordinator::from_config(&config, Some(sim_metrics))?;
            if let Some(phase) = phase {
                coordinator.seed_phase(phase);
            }
            if let Some(id) = scenario {
                if !coordinator.run_scenario(&id) {
                    return Err(anyhow!("unknown scenario {id}"));
                }
            }
            run_daemon(&config, coordinator, registry, &daemon_metrics, !no_console).await?
        }
        Commands::Replay {
            source,
            speed,
            paused,
            no_console,
        } => {
            let mut coordinator = SimulationCoordinator::from_config(&config, Some(sim_metrics))?;
            coordinator
                .load_playback_path(&source)
                .with_context(|| format!("unable to replay {}", source.display()))?;
            if let Some(speed) = speed {
                coordinator.set_speed(speed);
            }
            if !paused {
                coordinator.play();
            }
            run_daemon(&config, coordinator, registry, &daemon_metrics, !no_console).await?
        }
        Commands::Faults => print_fault_catalog(),
        Commands::Scenarios => {
            let coordinator = SimulationCoordinator::from_config(&config, None)?;
            for scenario in coordinator.scenarios().iter() {
                println!(
                    "{:<24} {:>5.0}s {:>2} entries  {}",
                    scenario.id,
                    scenario.duration_s,
                    scenario.timeline.len(),
                    scenario.name
                );
            }
        }
    }

    Ok(())
}

async fn run_daemon(
    config: &AppConfig,
    coordinator: SimulationCoordinator,
    registry: SharedRegistry,
    daemon_metrics: &DaemonMetrics,
    with_console: bool,
) -> Result<()> {
    let exporter = if config.metrics.enabled {
        Some(MetricsExporter::start(registry, config.metrics.listen).await?)
    } else {
        info!("metrics exporter disabled by configuration");
        None
    };

    let handle = TickRuntime::new(coordinator.into_shared(), config.simulation.tick_interval).start()?;
    info!(
        mode = %handle.coordinator().lock().mode(),
        "daemon running; waiting for termination signal"
    );

    if with_console {
        tokio::select! {
            result = run_console(&handle, daemon_metrics) => result?,
            result = signal::ctrl_c() => {
                result?;
                info!("ctrl-c received; shutting down");
            }
        }
    } else {
        signal::ctrl_c().await?;
        info!("ctrl-c received; shutting down");
    }

    handle.shutdown().await?;
    if let Some(exporter) = exporter {
        exporter.stop().await?;
    }
    Ok(())
}

/// Read operator commands until `quit` or end of input.
async fn run_console(handle: &RuntimeHandle, metrics: &DaemonMetrics) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("avsimd console ready; type `help` for commands");
    while let Some(line) = lines.next_line().await? {
        let command = match ConsoleCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        let verb = command.verb();
        let result = command.execute(handle);
        metrics.record_console_command(verb, result.is_ok());
        metrics.set_frozen(handle.is_frozen());
        match result {
            Ok(ConsoleFlow::Continue(reply)) => println!("{reply}"),
            Ok(ConsoleFlow::Quit) => return Ok(()),
            Err(err) => warn!(command = verb, error = %err, "console command failed"),
        }
    }
    // Stdin closed: keep simulating until a signal arrives.
    signal::ctrl_c().await?;
    info!("ctrl-c received; shutting down");
    Ok(())
}

fn print_fault_catalog() {
    for definition in catalog() {
        let phases = definition
            .allowed_phases
            .iter()
            .map(FlightPhase::as_str)
            .collect::<Vec<_>>()
            .join(",");
        println!(
            "{:<20} {:<8} {:<28} target {:<24} phases {}",
            definition.kind.as_str(),
            format!("{:?}", definition.severity),
            definition.name,
            definition.target_kind.to_string(),
            phases
        );
    }
}
