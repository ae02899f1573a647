//! Worker Pool Supervisor
//!
//! Purpose:
//!     Runs in the parent process. Spawns one child process per execution
//!     unit (`whale-strike --worker <k>`), restarts each one whenever it
//!     exits, and tears everything down on SIGINT / SIGTERM.
//!
//! Author: AI-Generated
//! Created: 2026-10-18
//!
//! Notes:
//!     - U = min(available parallelism, max_workers), at least 1
//!     - Initial spawns are spaced by spawn_spacing_ms; workers add their own
//!       stagger on top
//!     - Exit code 75 (rate limited) restarts after rate_limit_cooldown_ms,
//!       anything else after restart_cooldown_ms
//!     - Children are spawned with kill_on_drop, so aborting the slot tasks
//!       kills them

use crate::error::RATE_LIMIT_EXIT_CODE;
use crate::types::{AppConfig, EngineSettings, WorkerRole};
use anyhow::{Context, Result};
use futures::StreamExt;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Everything needed to (re)launch a worker process
#[derive(Debug, Clone)]
pub struct Launcher {
    exe: PathBuf,
    config_path: PathBuf,
    json_logs: bool,
    dry_run: bool,
    settings: EngineSettings,
}

impl Launcher {
    pub fn new(exe: PathBuf, config_path: &Path, json_logs: bool, dry_run: bool, settings: EngineSettings) -> Self {
        Self {
            exe,
            config_path: config_path.to_path_buf(),
            json_logs,
            dry_run,
            settings,
        }
    }

    pub fn worker_args(&self, ordinal: u32) -> Vec<String> {
        let mut args = vec![
            "--config".to_string(),
            self.config_path.display().to_string(),
            "--worker".to_string(),
            ordinal.to_string(),
        ];
        if self.json_logs {
            args.push("--json".to_string());
        }
        if self.dry_run {
            args.push("--dry-run".to_string());
        }
        args
    }

    /// Delay before relaunching a worker that exited with `code`
    pub fn restart_delay(&self, code: Option<i32>) -> Duration {
        if code == Some(RATE_LIMIT_EXIT_CODE) {
            Duration::from_millis(self.settings.rate_limit_cooldown_ms)
        } else {
            Duration::from_millis(self.settings.restart_cooldown_ms)
        }
    }

    async fn run_once(&self, ordinal: u32) -> std::io::Result<ExitStatus> {
        let mut child = Command::new(&self.exe)
            .args(self.worker_args(ordinal))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        info!("Worker {} spawned (pid {})", ordinal, child.id().unwrap_or_default());
        child.wait().await
    }

    /// Keep worker `ordinal` alive forever
    async fn supervise(self: Arc<Self>, ordinal: u32) {
        let spacing = self
            .settings
            .spawn_spacing_ms
            .saturating_mul(ordinal.saturating_sub(1) as u64);
        if spacing > 0 {
            sleep(Duration::from_millis(spacing)).await;
        }

        loop {
            let code = match self.run_once(ordinal).await {
                Ok(status) if status.success() => {
                    info!("Worker {} completed its mission (exit 0)", ordinal);
                    Some(0)
                }
                Ok(status) => {
                    warn!("Worker {} exited: {}", ordinal, status);
                    status.code()
                }
                Err(e) => {
                    error!("Worker {} could not be spawned: {}", ordinal, e);
                    None
                }
            };

            let delay = self.restart_delay(code);
            info!("Restarting worker {} in {}ms", ordinal, delay.as_millis());
            sleep(delay).await;
        }
    }
}

pub fn worker_count(available: usize, max_workers: usize) -> u32 {
    available.min(max_workers).max(1) as u32
}

/// Parent-process main loop. Returns after a termination signal.
pub async fn run_supervisor(config: &AppConfig, config_path: &Path, json_logs: bool) -> Result<()> {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let units = worker_count(available, config.engine.max_workers);

    info!("===========================================");
    info!("   Whale Strike Engine - Supervisor");
    info!("===========================================");
    info!(
        "Execution units: {} (parallelism {}, cap {})",
        units, available, config.engine.max_workers
    );
    match config.engine.beneficiary {
        Some(addr) => info!("Beneficiary: {:?}", addr),
        None => info!("Beneficiary: not configured"),
    }
    if config.strike.dry_run {
        info!("DRY RUN: strikes are signed but never dispatched");
    }
    for ordinal in 1..=units {
        let net = config.network_for(ordinal);
        let role = WorkerRole::for_ordinal(ordinal, config.engine.role_assignment);
        info!("  worker {:>3} → {} ({}) via {}", ordinal, net.name, role, net.submission);
    }

    let exe = std::env::current_exe().context("Failed to resolve own executable path")?;
    let launcher = Arc::new(Launcher::new(
        exe,
        config_path,
        json_logs,
        config.strike.dry_run,
        config.engine.clone(),
    ));

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("Failed to install signal handlers")?;

    let mut slots = JoinSet::new();
    for ordinal in 1..=units {
        slots.spawn(Arc::clone(&launcher).supervise(ordinal));
    }

    tokio::select! {
        sig = signals.next() => {
            info!("Received signal {:?}, stopping {} workers", sig, units);
        }
        done = slots.join_next() => {
            // Slot tasks loop forever; reaching here means one panicked
            error!("Supervisor slot ended unexpectedly: {:?}", done);
        }
    }

    slots.abort_all();
    while slots.join_next().await.is_some() {}
    info!("All workers stopped");
    Ok(())
}
