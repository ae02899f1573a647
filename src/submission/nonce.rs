//! Treasury nonce discipline
//!
//! The nonce is read from the endpoint (pending state) and then advanced
//! locally right before each submission attempt. The cached value survives
//! only while every dispatch is known to have reached the mempool; anything
//! with an unknown fate (bundle, failed send) drops it, and a sequencing
//! conflict re-reads it immediately.
//!
//! Author: AI-Generated
//! Created: 2026-10-18

use crate::chain::ChainClient;
use crate::error::ChainError;
use crate::retry::retry_async;
use alloy::primitives::Address;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

const FETCH_ATTEMPTS: usize = 3;
const FETCH_DELAY: Duration = Duration::from_millis(100);

pub struct TreasuryState {
    identity: Address,
    next_nonce: Mutex<Option<u64>>,
}

impl TreasuryState {
    pub fn new(identity: Address) -> Self {
        Self {
            identity,
            next_nonce: Mutex::new(None),
        }
    }

    pub fn identity(&self) -> Address {
        self.identity
    }

    async fn fetch(&self, chain: &dyn ChainClient) -> Result<u64, ChainError> {
        let who = self.identity;
        retry_async(|_| chain.nonce(who), FETCH_ATTEMPTS, FETCH_DELAY).await
    }

    /// Nonce for the next submission; advances the local counter
    pub async fn reserve_nonce(&self, chain: &dyn ChainClient) -> Result<u64, ChainError> {
        let mut next = self.next_nonce.lock().await;
        let nonce = match *next {
            Some(n) => n,
            None => self.fetch(chain).await?,
        };
        *next = Some(nonce + 1);
        Ok(nonce)
    }

    /// Re-read the pending nonce after a sequencing conflict. On failure the
    /// cache stays empty so the next reservation reads it again.
    pub async fn resync(&self, chain: &dyn ChainClient) -> Result<u64, ChainError> {
        let mut next = self.next_nonce.lock().await;
        *next = None;
        let fresh = self.fetch(chain).await?;
        *next = Some(fresh);
        info!("Nonce resynced to {}", fresh);
        Ok(fresh)
    }

    /// Forget the cached nonce; the next reservation reads the pending count
    pub async fn invalidate(&self) {
        *self.next_nonce.lock().await = None;
    }

    /// Hand back a reserved nonce that was never dispatched
    pub async fn release(&self, nonce: u64) {
        let mut next = self.next_nonce.lock().await;
        if *next == Some(nonce + 1) {
            *next = Some(nonce);
        }
    }

    pub async fn peek(&self) -> Option<u64> {
        *self.next_nonce.lock().await
    }
}
