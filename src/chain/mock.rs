//! In-memory ChainClient / TxSigner / PrivateChannel doubles for unit tests.
//! Responses are set per field; every call is counted.

use super::{ChainClient, PrivateChannel, TxSigner, TxView};
use crate::error::ChainError;
use crate::types::FeeSnapshot;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const ETH: u128 = 1_000_000_000_000_000_000;

pub fn eth(whole: u128) -> U256 {
    U256::from(whole * ETH)
}

pub fn milli_eth(milli: u128) -> U256 {
    U256::from(milli * ETH / 1000)
}

pub fn word(value: U256) -> Bytes {
    Bytes::from(value.to_be_bytes::<32>().to_vec())
}

pub fn fees(max_fee_per_gas: u128, priority_fee_per_gas: u128) -> FeeSnapshot {
    FeeSnapshot {
        max_fee_per_gas,
        priority_fee_per_gas,
        captured_at: Utc::now(),
    }
}

#[derive(Default)]
pub struct Calls {
    pub balance: AtomicUsize,
    pub transaction: AtomicUsize,
    pub fee_snapshot: AtomicUsize,
    pub nonce: AtomicUsize,
    pub simulate: AtomicUsize,
    pub send_raw: AtomicUsize,
    pub block_number: AtomicUsize,
    pub l1_fee: AtomicUsize,
    pub pool_reserve: AtomicUsize,
    pub reference_price: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct MockChain {
    pub calls: Calls,
    pub balance: Mutex<Result<U256, ChainError>>,
    pub transactions: Mutex<HashMap<TxHash, TxView>>,
    /// When set, every transaction lookup fails with it
    pub transaction_error: Mutex<Option<ChainError>>,
    /// When set, transaction() parks until notified
    pub hold_transaction: Option<Arc<Notify>>,
    pub fee: Mutex<Result<FeeSnapshot, ChainError>>,
    /// Successive nonce answers; the last one repeats
    pub nonces: Mutex<VecDeque<u64>>,
    pub simulation: Mutex<Result<Bytes, ChainError>>,
    /// Last calldata passed to simulate()
    pub simulated_payload: Mutex<Option<Bytes>>,
    /// Successive send_raw answers; Ok(random hash) once drained
    pub send_results: Mutex<VecDeque<Result<TxHash, ChainError>>>,
    pub sent: Mutex<Vec<Bytes>>,
    pub block: u64,
    /// When set, block_number() fails with it
    pub block_error: Mutex<Option<ChainError>>,
    pub l1: Mutex<Result<U256, ChainError>>,
    pub reserve: Mutex<Result<U256, ChainError>>,
    pub price: Mutex<Result<f64, ChainError>>,
    /// When set, simulate() parks until notified
    pub hold_simulation: Option<Arc<Notify>>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            calls: Calls::default(),
            balance: Mutex::new(Ok(milli_eth(50))),
            transactions: Mutex::new(HashMap::new()),
            transaction_error: Mutex::new(None),
            hold_transaction: None,
            fee: Mutex::new(Ok(fees(2_000_000_000, 100_000_000))),
            nonces: Mutex::new(VecDeque::from(vec![7])),
            simulation: Mutex::new(Ok(word(U256::ZERO))),
            simulated_payload: Mutex::new(None),
            send_results: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            block: 1_000,
            block_error: Mutex::new(None),
            l1: Mutex::new(Ok(U256::ZERO)),
            reserve: Mutex::new(Err(ChainError::Transport("no pool".into()))),
            price: Mutex::new(Ok(3_300.0)),
            hold_simulation: None,
        }
    }
}

impl MockChain {
    pub fn set_simulation(&self, result: Result<Bytes, ChainError>) {
        *self.simulation.lock().unwrap() = result;
    }

    pub fn push_send_result(&self, result: Result<TxHash, ChainError>) {
        self.send_results.lock().unwrap().push_back(result);
    }

    pub fn insert_tx(&self, view: TxView) {
        self.transactions.lock().unwrap().insert(view.hash, view);
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn balance(&self, _who: Address) -> Result<U256, ChainError> {
        self.calls.balance.fetch_add(1, Ordering::SeqCst);
        self.balance.lock().unwrap().clone()
    }

    async fn transaction(&self, hash: TxHash) -> Result<Option<TxView>, ChainError> {
        self.calls.transaction.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.hold_transaction {
            gate.notified().await;
        }
        if let Some(e) = self.transaction_error.lock().unwrap().clone() {
            return Err(e);
        }
        Ok(self.transactions.lock().unwrap().get(&hash).cloned())
    }

    async fn fee_snapshot(&self) -> Result<FeeSnapshot, ChainError> {
        self.calls.fee_snapshot.fetch_add(1, Ordering::SeqCst);
        self.fee.lock().unwrap().clone()
    }

    async fn nonce(&self, _who: Address) -> Result<u64, ChainError> {
        self.calls.nonce.fetch_add(1, Ordering::SeqCst);
        let mut nonces = self.nonces.lock().unwrap();
        let next = if nonces.len() > 1 {
            nonces.pop_front()
        } else {
            nonces.front().copied()
        };
        next.ok_or_else(|| ChainError::Transport("no nonce".into()))
    }

    async fn simulate(
        &self,
        _from: Address,
        _to: Address,
        data: Bytes,
        _gas_limit: u64,
    ) -> Result<Bytes, ChainError> {
        self.calls.simulate.fetch_add(1, Ordering::SeqCst);
        *self.simulated_payload.lock().unwrap() = Some(data);
        if let Some(gate) = &self.hold_simulation {
            gate.notified().await;
        }
        self.simulation.lock().unwrap().clone()
    }

    async fn send_raw(&self, raw: &[u8]) -> Result<TxHash, ChainError> {
        self.calls.send_raw.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(Bytes::copy_from_slice(raw));
        self.send_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(TxHash::random()))
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.calls.block_number.fetch_add(1, Ordering::SeqCst);
        match self.block_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(self.block),
        }
    }

    async fn l1_fee(&self, _oracle: Address, _data: Bytes) -> Result<U256, ChainError> {
        self.calls.l1_fee.fetch_add(1, Ordering::SeqCst);
        self.l1.lock().unwrap().clone()
    }

    async fn pool_reserve(&self, _pool: Address, _index: u8) -> Result<U256, ChainError> {
        self.calls.pool_reserve.fetch_add(1, Ordering::SeqCst);
        self.reserve.lock().unwrap().clone()
    }

    async fn reference_price(&self, _feed: Address) -> Result<f64, ChainError> {
        self.calls.reference_price.fetch_add(1, Ordering::SeqCst);
        self.price.lock().unwrap().clone()
    }
}

/// Signer whose "raw transaction" is just the 8-byte big-endian nonce,
/// so tests can read back which nonce was used.
pub struct MockSigner {
    pub address: Address,
    pub signed: Mutex<Vec<TransactionRequest>>,
}

impl Default for MockSigner {
    fn default() -> Self {
        Self {
            address: Address::repeat_byte(0x77),
            signed: Mutex::new(Vec::new()),
        }
    }
}

impl MockSigner {
    pub fn nonce_of(raw: &Bytes) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&raw[..8]);
        u64::from_be_bytes(buf)
    }
}

#[async_trait]
impl TxSigner for MockSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign(&self, tx: TransactionRequest) -> Result<Bytes, ChainError> {
        let nonce = tx
            .nonce
            .ok_or_else(|| ChainError::Signing("missing nonce".into()))?;
        self.signed.lock().unwrap().push(tx);
        Ok(Bytes::from(nonce.to_be_bytes().to_vec()))
    }
}

pub struct MockChannel {
    pub bundles: bool,
    pub bundle_calls: AtomicUsize,
    pub private_calls: AtomicUsize,
    pub bundle_result: Mutex<Result<(), ChainError>>,
    pub private_result: Mutex<Result<Option<TxHash>, ChainError>>,
}

impl MockChannel {
    pub fn with_bundles(bundles: bool) -> Self {
        Self {
            bundles,
            bundle_calls: AtomicUsize::new(0),
            private_calls: AtomicUsize::new(0),
            bundle_result: Mutex::new(Ok(())),
            private_result: Mutex::new(Ok(None)),
        }
    }
}

#[async_trait]
impl PrivateChannel for MockChannel {
    fn supports_bundles(&self) -> bool {
        self.bundles
    }

    async fn send_bundle(&self, _raw: &Bytes, _target_block: u64) -> Result<(), ChainError> {
        self.bundle_calls.fetch_add(1, Ordering::SeqCst);
        self.bundle_result.lock().unwrap().clone()
    }

    async fn send_private(&self, _raw: &Bytes) -> Result<Option<TxHash>, ChainError> {
        self.private_calls.fetch_add(1, Ordering::SeqCst);
        self.private_result.lock().unwrap().clone()
    }
}
