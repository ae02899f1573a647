//! Submission Controller
//!
//! Purpose:
//!     Turns an accepted StrikePlan into a signed EIP-1559 transaction and
//!     dispatches it down the network's configured path.
//!
//! Author: AI-Generated
//! Created: 2026-10-18
//!
//! Paths:
//!     private_bundle   → eth_sendBundle for block+1, fire-and-forget, no fallback
//!                        (without a bundle relay it behaves like private_relay)
//!     private_relay    → private RPC; a `result` ends the worker's mission,
//!                        anything else falls through to public broadcast
//!     public_broadcast → public RPC only
//!
//! Notes:
//!     - priority fee = snapshot tip × (100 + bribe%) / 100
//!     - max fee = snapshot max fee, raised to at least the priority fee
//!     - a sequencing conflict from any path resyncs the nonce immediately
//!     - after a bundle or a failed send the cached nonce is dropped, so the
//!       next strike re-reads the pending count
//!     - dry run signs, logs, and hands the nonce back

use super::nonce::TreasuryState;
use crate::chain::{ChainClient, PrivateChannel, TxSigner};
use crate::error::{ChainError, Severity};
use crate::strike::StrikePlan;
use crate::types::{ChainDescriptor, FeeSnapshot, StrikeParams, SubmissionMode};
use alloy::network::TransactionBuilder;
use alloy::primitives::{Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    BundleDispatched { target_block: u64 },
    /// Private RPC returned a hash; the worker's job is done
    RelayAccepted(TxHash),
    Broadcast(TxHash),
    /// Broadcast rejected; carries the error kind
    BroadcastFailed(&'static str),
    DryRun { nonce: u64 },
}

impl SubmissionOutcome {
    pub fn completes_mission(&self) -> bool {
        matches!(self, SubmissionOutcome::RelayAccepted(_))
    }
}

impl fmt::Display for SubmissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SubmissionOutcome::BundleDispatched { target_block } => {
                write!(f, "bundle dispatched for block {}", target_block)
            }
            SubmissionOutcome::RelayAccepted(hash) => write!(f, "relay accepted {:?}", hash),
            SubmissionOutcome::Broadcast(hash) => write!(f, "broadcast {:?}", hash),
            SubmissionOutcome::BroadcastFailed(kind) => write!(f, "broadcast failed ({})", kind),
            SubmissionOutcome::DryRun { nonce } => write!(f, "dry run (nonce {})", nonce),
        }
    }
}

/// Tip after the competitive bribe multiplier
pub fn bribed_priority_fee(priority_fee_per_gas: u128, bribe_pct: u64) -> u128 {
    priority_fee_per_gas.saturating_mul(100 + bribe_pct as u128) / 100
}

pub struct SubmissionController {
    chain: Arc<dyn ChainClient>,
    signer: Arc<dyn TxSigner>,
    channel: Arc<dyn PrivateChannel>,
    treasury: TreasuryState,
    descriptor: ChainDescriptor,
    params: StrikeParams,
}

impl SubmissionController {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        signer: Arc<dyn TxSigner>,
        channel: Arc<dyn PrivateChannel>,
        descriptor: ChainDescriptor,
        params: StrikeParams,
    ) -> Self {
        let treasury = TreasuryState::new(signer.address());
        Self {
            chain,
            signer,
            channel,
            treasury,
            descriptor,
            params,
        }
    }

    pub fn treasury(&self) -> &TreasuryState {
        &self.treasury
    }

    pub fn build_request(&self, payload: Bytes, nonce: u64, fees: &FeeSnapshot) -> TransactionRequest {
        let priority = bribed_priority_fee(fees.priority_fee_per_gas, self.params.priority_bribe_pct);
        let max_fee = fees.max_fee_per_gas.max(priority);

        TransactionRequest::default()
            .with_from(self.treasury.identity())
            .with_to(self.descriptor.target_contract)
            .with_input(payload)
            .with_nonce(nonce)
            .with_chain_id(self.descriptor.chain_id)
            .with_gas_limit(self.params.gas_limit)
            .with_max_fee_per_gas(max_fee)
            .with_max_priority_fee_per_gas(priority)
            .with_value(U256::ZERO)
    }

    pub async fn submit(
        &self,
        plan: &StrikePlan,
        fees: &FeeSnapshot,
    ) -> Result<SubmissionOutcome, ChainError> {
        let nonce = self.treasury.reserve_nonce(self.chain.as_ref()).await?;
        let tx = self.build_request(plan.candidate.payload.clone(), nonce, fees);

        let raw = match self.signer.sign(tx).await {
            Ok(raw) => raw,
            Err(e) => {
                self.treasury.release(nonce).await;
                return Err(e);
            }
        };

        if self.params.dry_run {
            info!(
                "[DRY RUN] Would submit strike via {} (nonce {}, {} bytes)",
                self.descriptor.submission,
                nonce,
                raw.len()
            );
            self.treasury.release(nonce).await;
            return Ok(SubmissionOutcome::DryRun { nonce });
        }

        match self.descriptor.submission {
            SubmissionMode::PrivateBundle if self.channel.supports_bundles() => {
                self.dispatch_bundle(&raw, nonce).await
            }
            SubmissionMode::PublicBroadcast => self.broadcast(&raw).await,
            SubmissionMode::PrivateBundle | SubmissionMode::PrivateRelay => {
                self.relay_then_broadcast(&raw).await
            }
        }
    }

    async fn dispatch_bundle(&self, raw: &Bytes, nonce: u64) -> Result<SubmissionOutcome, ChainError> {
        let block = match self.chain.block_number().await {
            Ok(block) => block,
            Err(e) => {
                self.treasury.release(nonce).await;
                return Err(e);
            }
        };
        let target_block = block + 1;

        match self.channel.send_bundle(raw, target_block).await {
            Ok(()) => info!("Bundle sent for block {} (nonce {})", target_block, nonce),
            Err(e) => warn!("Bundle submission failed ({}): {}", e.kind(), e),
        }
        // Inclusion is unknown until the block lands
        self.treasury.invalidate().await;
        Ok(SubmissionOutcome::BundleDispatched { target_block })
    }

    async fn relay_then_broadcast(&self, raw: &Bytes) -> Result<SubmissionOutcome, ChainError> {
        match self.channel.send_private(raw).await {
            Ok(Some(hash)) => {
                info!("Private relay accepted strike: {:?}", hash);
                return Ok(SubmissionOutcome::RelayAccepted(hash));
            }
            Ok(None) => warn!("Private relay returned no result, broadcasting publicly"),
            Err(e) if e.is_nonce_conflict() => {
                warn!("Private relay rejected nonce: {}", e);
                self.resync().await;
                return Ok(SubmissionOutcome::BroadcastFailed(e.kind()));
            }
            Err(e) => warn!("Private relay failed ({}), broadcasting publicly: {}", e.kind(), e),
        }
        self.broadcast(raw).await
    }

    async fn broadcast(&self, raw: &Bytes) -> Result<SubmissionOutcome, ChainError> {
        match self.chain.send_raw(raw).await {
            Ok(hash) => {
                info!("Strike broadcast: {:?}", hash);
                Ok(SubmissionOutcome::Broadcast(hash))
            }
            Err(e) if e.severity() == Severity::Fatal => {
                self.treasury.invalidate().await;
                Err(e)
            }
            Err(e) => {
                warn!("Broadcast failed ({}): {}", e.kind(), e);
                if e.is_nonce_conflict() {
                    self.resync().await;
                } else {
                    self.treasury.invalidate().await;
                }
                Ok(SubmissionOutcome::BroadcastFailed(e.kind()))
            }
        }
    }

    async fn resync(&self) {
        if let Err(e) = self.treasury.resync(self.chain.as_ref()).await {
            warn!("Nonce resync failed, will re-read on next strike: {}", e);
        }
    }
}
