//! Speculative intake: pending-transaction hashes → PendingTransfer events
//!
//! Purpose:
//!     Each admitted hash costs one `eth_getTransactionByHash`. The full
//!     transaction is kept only when it moves at least `whale_threshold` of
//!     native value to a destination (and, if a venue filter is set, to one
//!     of the listed venues).
//!
//! Author: AI-Generated
//! Created: 2026-10-18
//!
//! Notes:
//!     - Vanished txs and recoverable lookup failures drop the hash (debug
//!       log only); fatal ones (rate limit, disconnect) go back to the caller
//!     - `scans` counts every hash inspected; logged every PROGRESS_EVERY

use super::sampler::Sampler;
use crate::chain::{ChainClient, TxView};
use crate::error::{ChainError, Severity};
use crate::types::{DetectedEvent, EventKind, StrikeParams};
use alloy::primitives::{Address, TxHash, U256};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

const PROGRESS_EVERY: u64 = 1_000;

pub struct PendingIntake {
    threshold: U256,
    venue_filter: Vec<Address>,
    sampler: Sampler,
    scans: AtomicU64,
}

impl PendingIntake {
    pub fn new(params: &StrikeParams) -> Self {
        Self {
            threshold: params.whale_threshold,
            venue_filter: params.venue_filter.clone(),
            sampler: Sampler::new(params.sampling_rate),
            scans: AtomicU64::new(0),
        }
    }

    /// Sampling decision for one announced hash
    pub fn admit(&self) -> bool {
        self.sampler.admit()
    }

    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// Pure whale test on an already-fetched transaction
    pub fn classify(&self, tx: &TxView) -> Option<DetectedEvent> {
        let to = tx.to?;
        if tx.value < self.threshold {
            return None;
        }
        if !self.venue_filter.is_empty() && !self.venue_filter.contains(&to) {
            return None;
        }
        Some(DetectedEvent {
            kind: EventKind::PendingTransfer,
            value: tx.value,
            source_hash: tx.hash,
        })
    }

    /// Fetch and classify one pending hash
    pub async fn inspect(
        &self,
        chain: &dyn ChainClient,
        hash: TxHash,
    ) -> Result<Option<DetectedEvent>, ChainError> {
        let scanned = self.scans.fetch_add(1, Ordering::Relaxed) + 1;
        if scanned % PROGRESS_EVERY == 0 {
            info!("Pending scan progress: {} txs inspected", scanned);
        }

        match chain.transaction(hash).await {
            Ok(Some(tx)) => Ok(self.classify(&tx)),
            Ok(None) => {
                debug!("Pending tx {:?} no longer available", hash);
                Ok(None)
            }
            Err(e) if e.severity() == Severity::Fatal => Err(e),
            Err(e) => {
                debug!("Pending tx {:?} lookup failed ({}): {}", hash, e.kind(), e);
                Ok(None)
            }
        }
    }
}
