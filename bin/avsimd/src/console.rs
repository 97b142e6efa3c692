//! ---
//! avsim_section: "01-core-functionality"
//! avsim_subsection: "binary"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Line-oriented operator console for the daemon."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use avsim_core::RuntimeHandle;

pub const HELP: &str = "\
commands:
  status                      one-line aircraft status
  snapshot [FILE]             full snapshot as JSON (stdout or FILE)
  inject FAULT [TARGET]       inject a fault, e.g. `inject ENG_FIRE eng2`
  clear                       clear active faults
  faults | history            list active faults / injection history
  scenario ID                 start a scenario
  scenario-stop               stop the running scenario
  load FILE                   load a CSV/JSON recording and switch to replay
  play | pause | stop         playback transport
  seek SECONDS                reposition playback
  speed MULTIPLIER            playback speed (0.1 - 10)
  freeze | unfreeze           hold or release the tick loop
  quit                        shut the daemon down";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Help,
    Status,
    Snapshot(Option<PathBuf>),
    Inject { fault: String, target: Option<String> },
    Clear,
    Faults,
    History,
    Scenario(String),
    ScenarioStop,
    Load(PathBuf),
    Play,
    Pause,
    Stop,
    Seek(f64),
    Speed(f64),
    Freeze(bool),
    Quit,
}

/// What the input loop should do after a command ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleFlow {
    Continue(String),
    Quit,
}

impl ConsoleCommand {
    /// Parse a line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let arg = words.next();
        let extra = words.next();
        let command = match (verb.to_ascii_lowercase().as_str(), arg, extra) {
            ("help" | "?", None, None) => ConsoleCommand::Help,
            ("status", None, None) => ConsoleCommand::Status,
            ("snapshot", path, None) => ConsoleCommand::Snapshot(path.map(PathBuf::from)),
            ("inject", Some(fault), target) => ConsoleCommand::Inject {
                fault: fault.to_string(),
                target: target.map(str::to_string),
            },
            ("clear", None, None) => ConsoleCommand::Clear,
            ("faults", None, None) => ConsoleCommand::Faults,
            ("history", None, None) => ConsoleCommand::History,
            ("scenario", Some(id), None) => ConsoleCommand::Scenario(id.to_string()),
            ("scenario-stop", None, None) => ConsoleCommand::ScenarioStop,
            ("load", Some(path), None) => ConsoleCommand::Load(PathBuf::from(path)),
            ("play", None, None) => ConsoleCommand::Play,
            ("pause", None, None) => ConsoleCommand::Pause,
            ("stop", None, None) => ConsoleCommand::Stop,
            ("seek", Some(value), None) => ConsoleCommand::Seek(parse_number(value)?),
            ("speed", Some(value), None) => ConsoleCommand::Speed(parse_number(value)?),
            ("freeze", None, None) => ConsoleCommand::Freeze(true),
            ("unfreeze", None, None) => ConsoleCommand::Freeze(false),
            ("quit" | "exit", None, None) => ConsoleCommand::Quit,
            _ => return Err(anyhow!("unrecognised command `{}`; try `help`", line.trim())),
        };
        Ok(Some(command))
    }

    /// Metric label for the command.
    pub fn verb(&self) -> &'static str {
        match self {
            ConsoleCommand::Help => "help",
            ConsoleCommand::Status => "status",
            ConsoleCommand::Snapshot(_) => "snapshot",
            ConsoleCommand::Inject { .. } => "inject",
            ConsoleCommand::Clear => "clear",
            ConsoleCommand::Faults => "faults",
            ConsoleCommand::History => "history",
            ConsoleCommand::Scenario(_) => "scenario",
            ConsoleCommand::ScenarioStop => "scenario-stop",
            ConsoleCommand::Load(_) => "load",
            ConsoleCommand::Play => "play",
            ConsoleCommand::Pause => "pause",
            ConsoleCommand::Stop => "stop",
            ConsoleCommand::Seek(_) => "seek",
            ConsoleCommand::Speed(_) => "speed",
            ConsoleCommand::Freeze(true) => "freeze",
            ConsoleCommand::Freeze(false) => "unfreeze",
            ConsoleCommand::Quit => "quit",
        }
    }

    pub fn execute(self, handle: &RuntimeHandle) -> Result<ConsoleFlow> {
        let shared = handle.coordinator();
        let reply = match self {
            ConsoleCommand::Help => HELP.to_string(),
            ConsoleCommand::Status => shared.lock().snapshot().summary(),
            ConsoleCommand::Snapshot(None) => shared.lock().snapshot().to_json()?,
            ConsoleCommand::Snapshot(Some(path)) => {
                let snapshot = shared.lock().snapshot();
                snapshot.write_json(&path)?;
                format!("snapshot written to {}", path.display())
            }
            ConsoleCommand::Inject { fault, target } => {
                let accepted = shared.lock().inject_fault(&fault, target.as_deref());
                outcome("inject", accepted)
            }
            ConsoleCommand::Clear => {
                shared.lock().clear_all_faults();
                "active faults cleared".to_string()
            }
            ConsoleCommand::Faults => list_faults(shared.lock().active_faults()),
            ConsoleCommand::History => list_faults(shared.lock().fault_history()),
            ConsoleCommand::Scenario(id) => {
                let accepted = shared.lock().run_scenario(&id);
                outcome("scenario", accepted)
            }
            ConsoleCommand::ScenarioStop => {
                shared.lock().stop_scenario();
                "scenario stopped".to_string()
            }
            ConsoleCommand::Load(path) => match shared.lock().load_playback_path(&path) {
                Ok(()) => format!("loaded {}", path.display()),
                Err(err) => format!("load failed: {err:#}"),
            },
            ConsoleCommand::Play => outcome("play", shared.lock().play()),
            ConsoleCommand::Pause => {
                shared.lock().pause();
                "paused".to_string()
            }
            ConsoleCommand::Stop => {
                shared.lock().stop();
                "stopped".to_string()
            }
            ConsoleCommand::Seek(seconds) => outcome("seek", shared.lock().seek(seconds)),
            ConsoleCommand::Speed(multiplier) => {
                let mut coordinator = shared.lock();
                coordinator.set_speed(multiplier);
                format!("speed {:.2}x", coordinator.playback_info().speed)
            }
            ConsoleCommand::Freeze(frozen) => {
                handle.set_frozen(frozen);
                let state = if frozen { "frozen" } else { "running" };
                state.to_string()
            }
            ConsoleCommand::Quit => return Ok(ConsoleFlow::Quit),
        };
        Ok(ConsoleFlow::Continue(reply))
    }
}

fn parse_number(value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .map_err(|_| anyhow!("`{value}` is not a number"))
}

fn outcome(operation: &str, accepted: bool) -> String {
    if accepted {
        format!("{operation}: ok")
    } else {
        format!("{operation}: rejected (see log)")
    }
}

fn list_faults(faults: &[avsim_faults::ActiveFault]) -> String {
    if faults.is_empty() {
        return "none".to_string();
    }
    faults
        .iter()
        .map(|fault| {
            format!(
                "{:>7.1}s {:<24} {:<7} {:?} [{}]",
                fault.injected_at_s,
                fault.kind.as_str(),
                fault.target,
                fault.severity,
                fault.alarm_codes.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(ConsoleCommand::parse("   ").unwrap(), None);
        assert_eq!(
            ConsoleCommand::parse("inject ENG_FIRE eng2").unwrap(),
            Some(ConsoleCommand::Inject {
                fault: "ENG_FIRE".into(),
                target: Some("eng2".into())
            })
        );
        assert_eq!(
            ConsoleCommand::parse("inject CABIN_DECOMPRESSION").unwrap(),
            Some(ConsoleCommand::Inject {
                fault: "CABIN_DECOMPRESSION".into(),
                target: None
            })
        );
        assert_eq!(
            ConsoleCommand::parse("SPEED 2.5").unwrap(),
            Some(ConsoleCommand::Speed(2.5))
        );
        assert_eq!(
            ConsoleCommand::parse("snapshot out.json").unwrap(),
            Some(ConsoleCommand::Snapshot(Some(PathBuf::from("out.json"))))
        );
        assert_eq!(ConsoleCommand::parse("exit").unwrap(), Some(ConsoleCommand::Quit));
        let unfreeze = ConsoleCommand::parse("unfreeze").unwrap().unwrap();
        assert_eq!(unfreeze.verb(), "unfreeze");
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(ConsoleCommand::parse("seek soon").is_err());
        assert!(ConsoleCommand::parse("scenario").is_err());
        assert!(ConsoleCommand::parse("play now").is_err());
        assert!(ConsoleCommand::parse("launch").is_err());
    }
}
