//! Fee & price cache
//!
//! Latest gas-fee snapshot and reference asset price for one worker.
//! Both are replaced wholesale on each heartbeat refresh and read without
//! any staleness check.
//!
//! Author: AI-Generated
//! Created: 2026-10-18

use crate::chain::ChainClient;
use crate::error::{ChainError, Severity};
use crate::types::FeeSnapshot;
use alloy::primitives::Address;
use tokio::sync::watch;
use tracing::{debug, warn};

pub struct FeeCache {
    fees: watch::Sender<Option<FeeSnapshot>>,
    price: watch::Sender<Option<f64>>,
}

impl Default for FeeCache {
    fn default() -> Self {
        Self {
            fees: watch::channel(None).0,
            price: watch::channel(None).0,
        }
    }
}

impl FeeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fees(&self) -> Option<FeeSnapshot> {
        self.fees.borrow().clone()
    }

    /// USD price of the native asset, if a feed is configured and answered
    pub fn price(&self) -> Option<f64> {
        *self.price.borrow()
    }

    pub fn set_fees(&self, snapshot: FeeSnapshot) {
        self.fees.send_replace(Some(snapshot));
    }

    pub fn set_price(&self, price: f64) {
        self.price.send_replace(Some(price));
    }

    /// Pull a fresh snapshot (and price when `feed` is set). Recoverable
    /// failures keep the previous values; fatal ones are returned.
    pub async fn refresh(
        &self,
        chain: &dyn ChainClient,
        feed: Option<Address>,
    ) -> Result<(), ChainError> {
        match chain.fee_snapshot().await {
            Ok(snapshot) => {
                debug!(
                    "Fee snapshot: max {} wei, tip {} wei",
                    snapshot.max_fee_per_gas, snapshot.priority_fee_per_gas
                );
                self.set_fees(snapshot);
            }
            Err(e) if e.severity() == Severity::Fatal => return Err(e),
            Err(e) => warn!("Fee refresh failed ({}), keeping last snapshot: {}", e.kind(), e),
        }

        if let Some(feed) = feed {
            match chain.reference_price(feed).await {
                Ok(price) => self.set_price(price),
                Err(e) if e.severity() == Severity::Fatal => return Err(e),
                Err(e) => debug!("Price feed read failed ({}): {}", e.kind(), e),
            }
        }
        Ok(())
    }
}
