//! Chain Capabilities
//!
//! Purpose:
//!     The narrow interfaces the strike engine consumes from the outside world.
//!     Everything above this module talks to traits, so the decision and
//!     submission paths can be exercised against in-memory fakes.
//!
//! Author: AI-Generated
//! Created: 2026-10-18
//!
//! Architecture:
//!     rpc.rs     ChainClient over an alloy HTTP provider
//!     signer.rs  TxSigner over a local private key
//!     relay.rs   PrivateChannel over reqwest (bundle relay + private RPC)
//!     mock.rs    test doubles (cfg(test) only)

pub mod relay;
pub mod rpc;
pub mod signer;

#[cfg(test)]
pub mod mock;

pub use relay::RelayClient;
pub use rpc::RpcChain;
pub use signer::LocalTxSigner;

use crate::error::ChainError;
use crate::types::FeeSnapshot;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;

/// The fields of a pending transaction the intake cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxView {
    pub hash: TxHash,
    /// None for contract creation
    pub to: Option<Address>,
    pub value: U256,
}

/// RPC query capability
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn balance(&self, who: Address) -> Result<U256, ChainError>;

    async fn transaction(&self, hash: TxHash) -> Result<Option<TxView>, ChainError>;

    async fn fee_snapshot(&self) -> Result<FeeSnapshot, ChainError>;

    /// Pending-state transaction count
    async fn nonce(&self, who: Address) -> Result<u64, ChainError>;

    /// Read-only call; a revert comes back as `ChainError::Reverted`
    async fn simulate(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
        gas_limit: u64,
    ) -> Result<Bytes, ChainError>;

    async fn send_raw(&self, raw: &[u8]) -> Result<TxHash, ChainError>;

    async fn block_number(&self) -> Result<u64, ChainError>;

    /// OP-stack L1 data fee for `data`
    async fn l1_fee(&self, oracle: Address, data: Bytes) -> Result<U256, ChainError>;

    /// One side of a V2 pool's reserves
    async fn pool_reserve(&self, pool: Address, index: u8) -> Result<U256, ChainError>;

    /// Chainlink answer scaled to a float (8-decimal feeds)
    async fn reference_price(&self, feed: Address) -> Result<f64, ChainError>;
}

/// Signing capability
#[async_trait]
pub trait TxSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Sign a complete transaction request, returning the EIP-2718 encoding
    async fn sign(&self, tx: TransactionRequest) -> Result<Bytes, ChainError>;
}

/// Private submission paths (bundle relay + private RPC)
#[async_trait]
pub trait PrivateChannel: Send + Sync {
    /// True when a bundle relay is configured for this network
    fn supports_bundles(&self) -> bool;

    async fn send_bundle(&self, raw: &Bytes, target_block: u64) -> Result<(), ChainError>;

    /// `Ok(Some(hash))` only on a response carrying a `result`
    async fn send_private(&self, raw: &Bytes) -> Result<Option<TxHash>, ChainError>;
}
