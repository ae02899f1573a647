//! Strike Worker
//!
//! Purpose:
//!     Worker-scoped context tying intake, decision and submission together
//!     for one (network, role) assignment. One instance per worker process;
//!     nothing here is process-global.
//!
//! Author: AI-Generated
//! Created: 2026-10-18
//!
//! Architecture:
//!     gate.rs       single-flight gate (atomic flag + RAII permit)
//!     fee_cache.rs  fee snapshot + reference price, refreshed on heartbeat
//!     runner.rs     process entry: connect, subscribe, select loop
//!
//! Flow:
//!     pending hash → sampler → tx lookup (ordered, bounded) ─┐
//!     swap log     → decode ─────────────────────────────────┴→ try_strike → gate
//!         → engine.evaluate → controller.submit → (mission complete ⇒ exit 0)

pub mod fee_cache;
pub mod gate;
pub mod runner;

pub use fee_cache::FeeCache;
pub use gate::{GatePermit, StrikeGate};
pub use runner::run_worker;

use crate::chain::ChainClient;
use crate::error::{ChainError, Severity};
use crate::intake::{ConfirmedIntake, PendingIntake};
use crate::strike::{StrikeEngine, Verdict};
use crate::submission::{SubmissionController, SubmissionOutcome};
use crate::types::DetectedEvent;
use alloy::primitives::utils::format_ether;
use alloy::primitives::{TxHash, U256};
use alloy::rpc::types::Log;
use futures::stream::BoxStream;
use futures::{future, Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

/// Pending-hash lookups allowed in flight at once
pub const PENDING_LOOKAHEAD: usize = 8;

/// Why a worker process stops
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// A private relay accepted a strike
    MissionComplete(TxHash),
    Fatal(ChainError),
}

impl WorkerExit {
    pub fn exit_code(&self) -> i32 {
        match self {
            WorkerExit::MissionComplete(_) => 0,
            WorkerExit::Fatal(e) => e.exit_code(),
        }
    }
}

pub struct StrikeWorker {
    chain: Arc<dyn ChainClient>,
    /// Client on the subscription socket; probed by the heartbeat
    stream: Arc<dyn ChainClient>,
    engine: StrikeEngine,
    controller: SubmissionController,
    gate: StrikeGate,
    fees: FeeCache,
    pending: PendingIntake,
    confirmed: ConfirmedIntake,
    exit_tx: mpsc::UnboundedSender<WorkerExit>,
}

impl StrikeWorker {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        stream: Arc<dyn ChainClient>,
        engine: StrikeEngine,
        controller: SubmissionController,
        exit_tx: mpsc::UnboundedSender<WorkerExit>,
    ) -> Self {
        let pending = PendingIntake::new(engine.params());
        let confirmed = ConfirmedIntake::new(engine.params());
        Self {
            chain,
            stream,
            engine,
            controller,
            gate: StrikeGate::new(),
            fees: FeeCache::new(),
            pending,
            confirmed,
            exit_tx,
        }
    }

    pub fn fees(&self) -> &FeeCache {
        &self.fees
    }

    pub fn gate(&self) -> &StrikeGate {
        &self.gate
    }

    /// Ordered lookup pipeline over the pending-hash subscription. Hashes are
    /// sampled on arrival; at most PENDING_LOOKAHEAD lookups run at once and
    /// results keep arrival order. A fatal lookup error is yielded as `Err`.
    pub fn pending_lookups<S>(
        self: &Arc<Self>,
        hashes: S,
    ) -> BoxStream<'static, Result<Option<DetectedEvent>, ChainError>>
    where
        S: Stream<Item = TxHash> + Send + 'static,
    {
        let sampler = Arc::clone(self);
        let worker = Arc::clone(self);
        hashes
            .filter(move |_| future::ready(sampler.pending.admit()))
            .map(move |hash| {
                let worker = Arc::clone(&worker);
                async move { worker.pending.inspect(worker.chain.as_ref(), hash).await }
            })
            .buffered(PENDING_LOOKAHEAD)
            .boxed()
    }

    pub fn on_swap_log(self: &Arc<Self>, log: &Log) {
        if let Some(event) = self.confirmed.decode(log) {
            self.on_detected(event);
        }
    }

    pub fn on_detected(self: &Arc<Self>, event: DetectedEvent) {
        info!("Whale detected: {}", event);
        self.try_strike(event);
    }

    /// Start a strike unless one is already in flight (then the event is dropped)
    pub fn try_strike(self: &Arc<Self>, event: DetectedEvent) -> Option<JoinHandle<()>> {
        let Some(permit) = self.gate.try_acquire() else {
            debug!("Strike in flight, dropping {}", event);
            return None;
        };

        let worker = Arc::clone(self);
        let handle = tokio::spawn(
            async move {
                let _permit = permit;
                if let Err(e) = worker.strike(&event).await {
                    warn!("Strike aborted on fatal error ({}): {}", e.kind(), e);
                    let _ = worker.exit_tx.send(WorkerExit::Fatal(e));
                }
            }
            .in_current_span(),
        );
        Some(handle)
    }

    /// One full evaluation. Recoverable errors are logged and swallowed;
    /// only fatal ones come back.
    pub async fn strike(&self, event: &DetectedEvent) -> Result<Option<SubmissionOutcome>, ChainError> {
        let Some(fees) = self.fees.fees() else {
            warn!("No fee snapshot yet, abandoning {}", event);
            return Ok(None);
        };

        let treasury = self.controller.treasury().identity();
        let verdict = match self.engine.evaluate(event, treasury, &fees).await {
            Ok(v) => v,
            Err(e) => return recoverable(e, "evaluation"),
        };

        let plan = match verdict {
            Verdict::Accept(plan) => plan,
            Verdict::Reject(reason) => {
                debug!("Strike rejected for {}: {:?}", event, reason);
                return Ok(None);
            }
        };

        if let Some(price) = self.fees.price() {
            info!(
                "Expected net profit {} ETH (~${:.2})",
                format_ether(plan.decision.net_profit),
                to_usd(plan.decision.net_profit, price)
            );
        }

        let outcome = match self.controller.submit(&plan, &fees).await {
            Ok(o) => o,
            Err(e) => return recoverable(e, "submission"),
        };

        info!("Submission outcome: {}", outcome);
        if let SubmissionOutcome::RelayAccepted(hash) = outcome {
            let _ = self.exit_tx.send(WorkerExit::MissionComplete(hash));
        }
        Ok(Some(outcome))
    }

    /// Liveness probe on the subscription socket plus fee/price refresh.
    /// The refresh is skipped while a strike holds the gate.
    pub async fn heartbeat(&self) -> Result<(), ChainError> {
        let block = self.stream.block_number().await.map_err(|e| match e.severity() {
            Severity::Fatal => e,
            Severity::Recoverable => ChainError::Disconnected(format!("liveness probe failed: {}", e)),
        })?;

        if self.gate.is_held() {
            debug!("Heartbeat at block {}: strike in flight, refresh skipped", block);
            return Ok(());
        }

        self.fees
            .refresh(self.chain.as_ref(), self.engine.descriptor().price_feed)
            .await?;

        match (self.fees.fees(), self.fees.price()) {
            (Some(f), Some(p)) => info!(
                "Heartbeat block {} | max fee {:.3} gwei | tip {:.3} gwei | ETH ${:.2} | scans {}",
                block,
                gwei(f.max_fee_per_gas),
                gwei(f.priority_fee_per_gas),
                p,
                self.pending.scans()
            ),
            (Some(f), None) => info!(
                "Heartbeat block {} | max fee {:.3} gwei | tip {:.3} gwei | scans {}",
                block,
                gwei(f.max_fee_per_gas),
                gwei(f.priority_fee_per_gas),
                self.pending.scans()
            ),
            _ => info!("Heartbeat block {} | no fee snapshot yet", block),
        }
        Ok(())
    }
}

fn recoverable<T>(e: ChainError, stage: &str) -> Result<Option<T>, ChainError> {
    match e.severity() {
        Severity::Fatal => Err(e),
        Severity::Recoverable => {
            warn!("Strike {} abandoned ({}): {}", stage, e.kind(), e);
            Ok(None)
        }
    }
}

fn gwei(wei: u128) -> f64 {
    wei as f64 / 1e9
}

fn to_usd(wei: U256, price: f64) -> f64 {
    format_ether(wei).parse::<f64>().unwrap_or(0.0) * price
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::{eth, fees, milli_eth, word, Calls, MockChain, MockChannel, MockSigner};
    use crate::strike::engine::tests::{descriptor, whale};
    use crate::chain::TxView;
    use crate::types::{StrikeParams, SubmissionMode};
    use alloy::primitives::Address;
    use futures::stream;
    use tokio::sync::Notify;
    use tokio_test::{assert_pending, task};

    struct Harness {
        chain: Arc<MockChain>,
        stream: Arc<MockChain>,
        channel: Arc<MockChannel>,
        worker: Arc<StrikeWorker>,
        exit_rx: mpsc::UnboundedReceiver<WorkerExit>,
    }

    fn harness(chain: MockChain, mode: SubmissionMode) -> Harness {
        let h = harness_without_fees(chain, mode);
        h.worker.fees().set_fees(fees(2_000_000_000, 100_000_000));
        h
    }

    fn harness_without_fees(chain: MockChain, mode: SubmissionMode) -> Harness {
        let chain = Arc::new(chain);
        let channel = Arc::new(MockChannel::with_bundles(false));
        let mut desc = descriptor();
        desc.submission = mode;
        let params = StrikeParams::default();

        let engine = StrikeEngine::new(chain.clone(), desc.clone(), params.clone());
        let controller = SubmissionController::new(
            chain.clone(),
            Arc::new(MockSigner::default()),
            channel.clone(),
            desc,
            params,
        );
        let stream = Arc::new(MockChain::default());
        let (exit_tx, exit_rx) = mpsc::unbounded_channel();
        let worker = Arc::new(StrikeWorker::new(
            chain.clone(),
            stream.clone(),
            engine,
            controller,
            exit_tx,
        ));
        Harness {
            chain,
            stream,
            channel,
            worker,
            exit_rx,
        }
    }

    #[tokio::test]
    async fn test_second_event_dropped_while_in_flight() {
        let hold = Arc::new(Notify::new());
        let chain = MockChain {
            hold_simulation: Some(hold.clone()),
            ..MockChain::default()
        };
        let h = harness(chain, SubmissionMode::PublicBroadcast);

        let first = h.worker.try_strike(whale()).expect("gate free");
        while Calls::get(&h.chain.calls.simulate) == 0 {
            tokio::task::yield_now().await;
        }

        assert!(h.worker.gate().is_held());
        assert!(h.worker.try_strike(whale()).is_none());

        hold.notify_one();
        first.await.unwrap();

        assert_eq!(Calls::get(&h.chain.calls.balance), 1);
        assert_eq!(Calls::get(&h.chain.calls.simulate), 1);
        assert!(!h.worker.gate().is_held());
    }

    #[tokio::test]
    async fn test_relay_acceptance_signals_mission_complete() {
        let chain = MockChain::default();
        chain.set_simulation(Ok(word(eth(1))));
        let mut h = harness(chain, SubmissionMode::PrivateRelay);
        *h.channel.private_result.lock().unwrap() = Ok(Some(TxHash::repeat_byte(0x3c)));

        let handle = h.worker.try_strike(whale()).unwrap();
        handle.await.unwrap();

        let exit = h.exit_rx.recv().await.unwrap();
        assert_eq!(exit, WorkerExit::MissionComplete(TxHash::repeat_byte(0x3c)));
        assert_eq!(exit.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_revert_submits_nothing() {
        let chain = MockChain::default();
        chain.set_simulation(Err(ChainError::Reverted("execution reverted".into())));
        let h = harness(chain, SubmissionMode::PublicBroadcast);

        let outcome = h.worker.strike(&whale()).await.unwrap();
        assert!(outcome.is_none());
        assert_eq!(Calls::get(&h.chain.calls.nonce), 0);
        assert_eq!(Calls::get(&h.chain.calls.send_raw), 0);
        assert_eq!(h.channel.private_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_fee_snapshot_abandons() {
        let h = harness_without_fees(MockChain::default(), SubmissionMode::PublicBroadcast);
        assert!(h.worker.fees().fees().is_none());

        assert!(h.worker.strike(&whale()).await.unwrap().is_none());
        assert_eq!(Calls::get(&h.chain.calls.balance), 0);
    }

    #[tokio::test]
    async fn test_fatal_error_reaches_exit_channel() {
        let chain = MockChain::default();
        chain.set_simulation(Err(ChainError::RateLimited("429 Too Many Requests".into())));
        let mut h = harness(chain, SubmissionMode::PublicBroadcast);

        h.worker.try_strike(whale()).unwrap().await.unwrap();

        let exit = h.exit_rx.recv().await.unwrap();
        assert_eq!(exit.exit_code(), crate::error::RATE_LIMIT_EXIT_CODE);
    }

    #[tokio::test]
    async fn test_heartbeat_skips_refresh_while_gate_held() {
        let h = harness(MockChain::default(), SubmissionMode::PublicBroadcast);

        let permit = h.worker.gate().try_acquire().unwrap();
        h.worker.heartbeat().await.unwrap();
        assert_eq!(Calls::get(&h.stream.calls.block_number), 1);
        assert_eq!(Calls::get(&h.chain.calls.fee_snapshot), 0);

        drop(permit);
        h.worker.heartbeat().await.unwrap();
        assert_eq!(Calls::get(&h.chain.calls.fee_snapshot), 1);
    }

    #[tokio::test]
    async fn test_heartbeat_probes_subscription_socket() {
        let h = harness(MockChain::default(), SubmissionMode::PublicBroadcast);
        *h.stream.block_error.lock().unwrap() = Some(ChainError::Transport("socket closed".into()));

        let err = h.worker.heartbeat().await.unwrap_err();

        assert_eq!(err.kind(), "disconnected");
        assert_eq!(Calls::get(&h.chain.calls.block_number), 0);
        assert_eq!(Calls::get(&h.chain.calls.fee_snapshot), 0);
    }

    fn pending_tx(byte: u8, value: U256) -> TxView {
        TxView {
            hash: TxHash::repeat_byte(byte),
            to: Some(Address::repeat_byte(0x55)),
            value,
        }
    }

    #[tokio::test]
    async fn test_pending_lookups_keep_arrival_order() {
        let chain = MockChain::default();
        for (byte, value) in [(0x01, eth(30)), (0x02, eth(1)), (0x03, eth(16)), (0x04, eth(90))] {
            chain.insert_tx(pending_tx(byte, value));
        }
        let h = harness(chain, SubmissionMode::PublicBroadcast);

        let hashes = stream::iter((1u8..=4).map(TxHash::repeat_byte));
        let found: Vec<_> = h.worker.pending_lookups(hashes).collect().await;

        let seen: Vec<Option<TxHash>> = found
            .into_iter()
            .map(|r| r.unwrap().map(|event| event.source_hash))
            .collect();
        assert_eq!(
            seen,
            vec![
                Some(TxHash::repeat_byte(0x01)),
                None,
                Some(TxHash::repeat_byte(0x03)),
                Some(TxHash::repeat_byte(0x04)),
            ]
        );
        assert_eq!(Calls::get(&h.chain.calls.transaction), 4);
    }

    #[tokio::test]
    async fn test_rate_limited_lookup_ends_pipeline() {
        let chain = MockChain::default();
        *chain.transaction_error.lock().unwrap() =
            Some(ChainError::RateLimited("429 Too Many Requests".into()));
        let h = harness(chain, SubmissionMode::PublicBroadcast);

        let mut lookups = h.worker.pending_lookups(stream::iter(vec![TxHash::repeat_byte(0x01)]));

        let err = lookups.next().await.unwrap().unwrap_err();
        assert_eq!(err.exit_code(), crate::error::RATE_LIMIT_EXIT_CODE);
    }

    #[tokio::test]
    async fn test_pending_lookups_bounded() {
        let hold = Arc::new(Notify::new());
        let chain = MockChain {
            hold_transaction: Some(hold.clone()),
            ..MockChain::default()
        };
        let h = harness(chain, SubmissionMode::PublicBroadcast);
        let hashes = stream::iter((0u8..64).map(TxHash::repeat_byte));

        let mut lookups = h.worker.pending_lookups(hashes);
        {
            let mut next = task::spawn(lookups.next());
            assert_pending!(next.poll());
        }
        assert_eq!(Calls::get(&h.chain.calls.transaction), PENDING_LOOKAHEAD);

        hold.notify_waiters();
        assert!(lookups.next().await.unwrap().unwrap().is_none());
    }

    #[test]
    fn test_usd_conversion() {
        let usd = to_usd(milli_eth(500), 3_000.0);
        assert!((usd - 1_500.0).abs() < 1e-6);
    }
}
