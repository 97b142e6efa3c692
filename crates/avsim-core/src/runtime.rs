//! ---
//! avsim_section: "01-core-functionality"
//! avsim_subsection: "module"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Fixed-cadence tick driver for a shared coordinator."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::coordinator::SharedCoordinator;

/// Drives `tick` on a shared coordinator every `interval`.
///
/// The simulated step is the configured interval, not the measured wall time,
/// so a stalled host slows the simulation instead of making it jump.
#[derive(Debug)]
pub struct TickRuntime {
    coordinator: SharedCoordinator,
    interval: Duration,
    frozen: Arc<AtomicBool>,
}

impl TickRuntime {
    pub fn new(coordinator: SharedCoordinator, interval: Duration) -> Self {
        Self {
            coordinator,
            interval,
            frozen: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag consulted on every tick; set it to freeze the simulation.
    pub fn freeze_flag(&self) -> Arc<AtomicBool> {
        self.frozen.clone()
    }

    pub fn start(self) -> Result<RuntimeHandle> {
        if self.interval.is_zero() {
            return Err(anyhow!("tick interval must be greater than zero"));
        }
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(4);
        let coordinator = self.coordinator.clone();
        let frozen = self.frozen.clone();
        let period = self.interval;
        let dt = period.as_secs_f64();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!(target: "avsim::core", "tick loop shutdown");
                        break;
                    }
                    _ = interval.tick() => {
                        coordinator.lock().tick(dt, frozen.load(Ordering::Relaxed));
                    }
                }
            }
        });

        info!(target: "avsim::core", interval_ms = period.as_millis() as u64, "tick loop started");
        Ok(RuntimeHandle {
            shutdown: shutdown_tx,
            task,
            coordinator: self.coordinator,
            frozen: self.frozen,
        })
    }
}

/// Handle for a running tick loop.
#[derive(Debug)]
pub struct RuntimeHandle {
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<()>,
    coordinator: SharedCoordinator,
    frozen: Arc<AtomicBool>,
}

impl RuntimeHandle {
    pub fn coordinator(&self) -> SharedCoordinator {
        self.coordinator.clone()
    }

    pub fn set_frozen(&self, frozen: bool) {
        self.frozen.store(frozen, Ordering::Relaxed);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Relaxed)
    }

    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(());
        if let Err(err) = self.task.await {
            error!(target: "avsim::core", error = %err, "tick loop join error");
        }
        info!(target: "avsim::core", "tick loop stopped");
        Ok(())
    }
}
