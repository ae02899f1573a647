//! Worker process entry
//!
//! Purpose:
//!     Everything one worker process does between spawn and exit:
//!     stagger, connect (WS for streams, HTTP for calls), subscribe per role,
//!     then a single select loop over streams, heartbeat and exit signals.
//!
//! Author: AI-Generated
//! Created: 2026-10-18
//!
//! Notes:
//!     - No in-process reconnect: the WS transport is built with zero retries,
//!       a stream ending is a fatal Disconnected and the supervisor restarts
//!       the process
//!     - The heartbeat liveness probe runs over the WS socket itself
//!     - Monitor role opens no subscriptions; it only runs the heartbeat
//!     - Runs on a current_thread runtime built in main.rs

use super::{StrikeWorker, WorkerExit};
use crate::chain::{ChainClient, LocalTxSigner, RelayClient, RpcChain};
use crate::error::{ChainError, Severity};
use crate::intake::ConfirmedIntake;
use crate::strike::StrikeEngine;
use crate::submission::SubmissionController;
use crate::types::{AppConfig, DetectedEvent, WorkerRole};
use alloy::providers::{Provider, ProviderBuilder, WsConnect};
use alloy::rpc::types::{Filter, Log};
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{info, info_span, warn, Instrument};

/// Run worker `ordinal` until it has a reason to exit
pub async fn run_worker(config: AppConfig, ordinal: u32) -> WorkerExit {
    let descriptor = config.network_for(ordinal).clone();
    let role = WorkerRole::for_ordinal(ordinal, config.engine.role_assignment);
    let span = info_span!("worker", worker = ordinal, network = %descriptor.name, role = %role);

    async move {
        match run(config, ordinal, role).await {
            Ok(exit) => exit,
            Err(e) => WorkerExit::Fatal(e),
        }
    }
    .instrument(span)
    .await
}

async fn run(config: AppConfig, ordinal: u32, role: WorkerRole) -> Result<WorkerExit, ChainError> {
    let descriptor = config.network_for(ordinal).clone();
    let params = config.strike.clone();

    let delay = config
        .engine
        .stagger
        .delay_for(ordinal, rand::rng().random::<f64>());
    if !delay.is_zero() {
        info!("Staggered start: waiting {}ms", delay.as_millis());
        sleep(delay).await;
    }

    // ── Connections ──────────────────────────────────────────────────

    let ws = ProviderBuilder::new()
        .connect_ws(WsConnect::new(&descriptor.ws_url).with_max_retries(0))
        .await
        .map_err(|e| ChainError::classify(format!("ws connect to {} failed: {}", descriptor.name, e)))?
        .erased();
    let stream: Arc<dyn ChainClient> = Arc::new(RpcChain::from_provider(ws.clone()));
    let chain: Arc<dyn ChainClient> = Arc::new(RpcChain::connect_http(&descriptor.rpc_url)?);

    let signer = LocalTxSigner::from_private_key(&config.private_key)?;
    let relay = RelayClient::new(
        descriptor.bundle_relay_url.clone(),
        descriptor.relay_endpoint().to_string(),
        signer.key().clone(),
        Duration::from_millis(params.relay_timeout_ms),
    )?;

    let block = chain.block_number().await?;
    info!(
        "Worker online at block {} | chain_id {} | submission {} | treasury {}",
        block,
        descriptor.chain_id,
        descriptor.submission,
        signer.key().address()
    );

    // ── Worker context ───────────────────────────────────────────────

    let (exit_tx, mut exit_rx) = mpsc::unbounded_channel();
    let engine = StrikeEngine::new(Arc::clone(&chain), descriptor.clone(), params.clone());
    let controller = SubmissionController::new(
        Arc::clone(&chain),
        Arc::new(signer),
        Arc::new(relay),
        descriptor.clone(),
        params,
    );
    let worker = Arc::new(StrikeWorker::new(
        Arc::clone(&chain),
        stream,
        engine,
        controller,
        exit_tx,
    ));

    worker
        .fees()
        .refresh(chain.as_ref(), descriptor.price_feed)
        .await?;

    // ── Subscriptions ────────────────────────────────────────────────

    let mut pending: Option<BoxStream<'static, Result<Option<DetectedEvent>, ChainError>>> =
        if role.watches_pending() {
            let sub = ws
                .subscribe_pending_transactions()
                .await
                .map_err(|e| ChainError::classify(format!("pending subscription failed: {}", e)))?;
            info!("Subscribed to pending transactions");
            Some(worker.pending_lookups(sub.into_stream()))
        } else {
            None
        };

    let mut logs: Option<BoxStream<'static, Log>> = if role.watches_logs() {
        let filter = Filter::new().event_signature(ConfirmedIntake::swap_topic());
        let sub = ws
            .subscribe_logs(&filter)
            .await
            .map_err(|e| ChainError::classify(format!("swap log subscription failed: {}", e)))?;
        info!("Subscribed to confirmed Swap logs");
        Some(sub.into_stream().boxed())
    } else {
        None
    };

    // ── Main loop ────────────────────────────────────────────────────

    let mut heartbeat = interval(Duration::from_secs(config.engine.heartbeat_secs.max(1)));
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            exit = exit_rx.recv() => {
                if let Some(exit) = exit {
                    return Ok(exit);
                }
            }
            found = next_item(&mut pending) => match found {
                Some(Ok(Some(event))) => worker.on_detected(event),
                Some(Ok(None)) => {}
                Some(Err(e)) => return Err(e),
                None => return Err(ChainError::Disconnected("pending stream ended".into())),
            },
            log = next_item(&mut logs) => match log {
                Some(log) => worker.on_swap_log(&log),
                None => return Err(ChainError::Disconnected("log stream ended".into())),
            },
            _ = heartbeat.tick() => {
                if let Err(e) = worker.heartbeat().await {
                    match e.severity() {
                        Severity::Fatal => return Err(e),
                        Severity::Recoverable => warn!("Heartbeat failed ({}): {}", e.kind(), e),
                    }
                }
            }
        }
    }
}

/// Next item of an optional stream; never resolves when the stream is absent
async fn next_item<S>(stream: &mut Option<S>) -> Option<S::Item>
where
    S: Stream + Unpin,
{
    match stream {
        Some(s) => s.next().await,
        None => std::future::pending().await,
    }
}
