//! alloy-backed RPC capability
//!
//! One HTTP provider per worker. All errors are mapped through
//! `ChainError::classify` so callers see the failure kind rather than the
//! transport's error type.
//!
//! Author: AI-Generated
//! Created: 2026-10-18

use super::{ChainClient, TxView};
use crate::contracts::{IAggregatorV3, IL1GasOracle, IUniswapV2Pair};
use crate::error::ChainError;
use crate::types::FeeSnapshot;
use alloy::consensus::Transaction as _;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use chrono::Utc;
use std::fmt::Display;

/// Chainlink USD feeds report 8 decimals
const PRICE_FEED_SCALE: f64 = 1e8;

pub struct RpcChain {
    provider: DynProvider,
}

impl RpcChain {
    pub fn connect_http(rpc_url: &str) -> Result<Self, ChainError> {
        let url: Url = rpc_url
            .parse()
            .map_err(|e| ChainError::Transport(format!("invalid RPC url '{}': {}", rpc_url, e)))?;
        let provider = ProviderBuilder::new().connect_http(url).erased();
        Ok(Self { provider })
    }

    pub fn from_provider(provider: DynProvider) -> Self {
        Self { provider }
    }
}

fn rpc_err<E: Display>(e: E) -> ChainError {
    ChainError::classify(e.to_string())
}

#[async_trait]
impl ChainClient for RpcChain {
    async fn balance(&self, who: Address) -> Result<U256, ChainError> {
        self.provider.get_balance(who).await.map_err(rpc_err)
    }

    async fn transaction(&self, hash: TxHash) -> Result<Option<TxView>, ChainError> {
        let tx = self
            .provider
            .get_transaction_by_hash(hash)
            .await
            .map_err(rpc_err)?;

        Ok(tx.map(|tx| TxView {
            hash,
            to: tx.to(),
            value: tx.value(),
        }))
    }

    async fn fee_snapshot(&self) -> Result<FeeSnapshot, ChainError> {
        let estimate = self
            .provider
            .estimate_eip1559_fees()
            .await
            .map_err(rpc_err)?;

        Ok(FeeSnapshot {
            max_fee_per_gas: estimate.max_fee_per_gas,
            priority_fee_per_gas: estimate.max_priority_fee_per_gas,
            captured_at: Utc::now(),
        })
    }

    async fn nonce(&self, who: Address) -> Result<u64, ChainError> {
        self.provider
            .get_transaction_count(who)
            .pending()
            .await
            .map_err(rpc_err)
    }

    async fn simulate(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
        gas_limit: u64,
    ) -> Result<Bytes, ChainError> {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(data)
            .with_gas_limit(gas_limit);

        self.provider.call(tx).await.map_err(rpc_err)
    }

    async fn send_raw(&self, raw: &[u8]) -> Result<TxHash, ChainError> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(rpc_err)?;
        Ok(*pending.tx_hash())
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.provider.get_block_number().await.map_err(rpc_err)
    }

    async fn l1_fee(&self, oracle: Address, data: Bytes) -> Result<U256, ChainError> {
        IL1GasOracle::new(oracle, self.provider.clone())
            .getL1Fee(data)
            .call()
            .await
            .map_err(rpc_err)
    }

    async fn pool_reserve(&self, pool: Address, index: u8) -> Result<U256, ChainError> {
        let reserves = IUniswapV2Pair::new(pool, self.provider.clone())
            .getReserves()
            .call()
            .await
            .map_err(rpc_err)?;

        let raw = if index == 0 {
            reserves.reserve0
        } else {
            reserves.reserve1
        };
        Ok(U256::from(raw))
    }

    async fn reference_price(&self, feed: Address) -> Result<f64, ChainError> {
        let round = IAggregatorV3::new(feed, self.provider.clone())
            .latestRoundData()
            .call()
            .await
            .map_err(rpc_err)?;

        let answer: f64 = round
            .answer
            .to_string()
            .parse()
            .map_err(|e| ChainError::Decode(format!("price answer {}: {}", round.answer, e)))?;
        Ok(answer / PRICE_FEED_SCALE)
    }
}
