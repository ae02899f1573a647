//! Whale Strike Engine
//!
//! Main entry point. One binary, two modes:
//!     whale-strike [--config P]              supervisor: spawns and restarts workers
//!     whale-strike --worker K [--config P]   worker K: one network, one role
//!
//! Worker exit codes:
//!     0   a private relay accepted a strike (mission complete)
//!     1   fatal error (stream lost, bad config, ...)
//!     75  endpoint rate limited us; supervisor waits longer before restart
//!
//! Author: AI-Generated
//! Created: 2026-10-18

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use whale_strike::config::load_config;
use whale_strike::error::FATAL_EXIT_CODE;
use whale_strike::supervisor::run_supervisor;
use whale_strike::worker::{run_worker, WorkerExit};

/// Whale-triggered flash-loan strike engine (Ethereum, Base, Arbitrum)
#[derive(Parser, Debug)]
#[command(name = "whale-strike")]
struct Args {
    /// Network / strike configuration file
    #[arg(short, long, env = "STRIKE_CONFIG", default_value = "config/networks.toml")]
    config: PathBuf,

    /// Run as worker K (set by the supervisor)
    #[arg(long, value_name = "K")]
    worker: Option<u32>,

    /// JSON log lines
    #[arg(long)]
    json: bool,

    /// Sign strikes but never dispatch them
    #[arg(long)]
    dry_run: bool,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.json);

    let code = match args.worker {
        Some(ordinal) => worker_main(&args, ordinal),
        None => match supervisor_main(&args) {
            Ok(()) => 0,
            Err(e) => {
                error!("Supervisor failed: {:#}", e);
                FATAL_EXIT_CODE
            }
        },
    };
    ExitCode::from(code as u8)
}

fn supervisor_main(args: &Args) -> Result<()> {
    let config = load_config(&args.config, args.dry_run)?;
    info!(
        "Configuration loaded from {} ({} networks)",
        args.config.display(),
        config.networks.len()
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_supervisor(&config, &args.config, args.json))
}

fn worker_main(args: &Args, ordinal: u32) -> i32 {
    let config = match load_config(&args.config, args.dry_run) {
        Ok(c) => c,
        Err(e) => {
            error!("Worker {}: configuration error: {:#}", ordinal, e);
            return FATAL_EXIT_CODE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Worker {}: runtime build failed: {}", ordinal, e);
            return FATAL_EXIT_CODE;
        }
    };

    let exit = runtime.block_on(run_worker(config, ordinal));
    match &exit {
        WorkerExit::MissionComplete(hash) => {
            info!("Worker {}: mission complete ({:?})", ordinal, hash)
        }
        WorkerExit::Fatal(e) => {
            error!("Worker {}: exiting on {} error: {}", ordinal, e.kind(), e)
        }
    }
    exit.exit_code()
}
