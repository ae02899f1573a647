//! Local-key signing capability
//!
//! Wraps an alloy `PrivateKeySigner` in an `EthereumWallet` and produces
//! EIP-2718 encoded raw transactions ready for any submission path.
//!
//! Author: AI-Generated
//! Created: 2026-10-18

use super::TxSigner;
use crate::error::ChainError;
use alloy::eips::eip2718::Encodable2718;
use alloy::network::{Ethereum, EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;

pub struct LocalTxSigner {
    key: PrivateKeySigner,
    wallet: EthereumWallet,
}

impl LocalTxSigner {
    pub fn from_private_key(raw_key: &str) -> Result<Self, ChainError> {
        let key: PrivateKeySigner = raw_key
            .trim()
            .parse()
            .map_err(|e| ChainError::Signing(format!("invalid treasury key: {}", e)))?;
        Ok(Self::new(key))
    }

    pub fn new(key: PrivateKeySigner) -> Self {
        let wallet = EthereumWallet::from(key.clone());
        Self { key, wallet }
    }

    /// The raw key, for relay auth headers
    pub fn key(&self) -> &PrivateKeySigner {
        &self.key
    }
}

#[async_trait]
impl TxSigner for LocalTxSigner {
    fn address(&self) -> Address {
        self.key.address()
    }

    async fn sign(&self, tx: TransactionRequest) -> Result<Bytes, ChainError> {
        let envelope = <TransactionRequest as TransactionBuilder<Ethereum>>::build(tx, &self.wallet)
            .await
            .map_err(|e| ChainError::Signing(e.to_string()))?;
        Ok(Bytes::from(envelope.encoded_2718()))
    }
}
