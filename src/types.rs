// Core data structures shared by intake, strike engine, submission and supervisor.
// Everything here is resolved runtime state; the raw TOML shapes live in config.rs.

use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How a worker dispatches an accepted strike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMode {
    /// Single-tx bundle to a Flashbots-style relay, fire-and-forget
    PrivateBundle,
    /// eth_sendRawTransaction to a private RPC, public broadcast on failure
    PrivateRelay,
    /// Straight to the public RPC
    PublicBroadcast,
}

impl fmt::Display for SubmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SubmissionMode::PrivateBundle => write!(f, "private_bundle"),
            SubmissionMode::PrivateRelay => write!(f, "private_relay"),
            SubmissionMode::PublicBroadcast => write!(f, "public_broadcast"),
        }
    }
}

/// Static per-network parameters. Built once at startup, never mutated.
#[derive(Debug, Clone)]
pub struct ChainDescriptor {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub ws_url: String,
    /// Asset borrowed by the flash loan (WETH on every supported chain)
    pub native_asset: Address,
    /// Counter asset on the swap path
    pub stable_asset: Address,
    pub target_contract: Address,
    /// OP-stack GasPriceOracle (Base); None on L1 / Arbitrum
    pub fee_oracle: Option<Address>,
    /// V2 pool used to cap loan size by depth
    pub liquidity_pool: Option<Address>,
    /// Which getReserves() slot holds the borrowed asset (0 or 1)
    pub reserve_index: u8,
    /// Chainlink feed for the native asset in USD (8 decimals)
    pub price_feed: Option<Address>,
    pub submission: SubmissionMode,
    pub bundle_relay_url: Option<String>,
    pub private_rpc_url: Option<String>,
}

impl ChainDescriptor {
    /// Endpoint for the private relay attempt (falls back to the public RPC)
    pub fn relay_endpoint(&self) -> &str {
        self.private_rpc_url.as_deref().unwrap_or(&self.rpc_url)
    }

    /// Swap path encoded into every loan request
    pub fn swap_path(&self) -> Vec<Address> {
        vec![self.native_asset, self.stable_asset]
    }
}

/// Worker specialization. `Hybrid` is the single-role layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerRole {
    /// Pending-transaction stream only
    Sniper,
    /// Confirmed swap logs only
    Decoder,
    /// No subscriptions; fee/price telemetry only
    Monitor,
    /// Both streams
    Hybrid,
}

impl WorkerRole {
    pub fn for_ordinal(ordinal: u32, assignment: RoleAssignment) -> Self {
        match assignment {
            RoleAssignment::Combined => WorkerRole::Hybrid,
            RoleAssignment::Split => match ordinal % 3 {
                0 => WorkerRole::Sniper,
                1 => WorkerRole::Decoder,
                _ => WorkerRole::Monitor,
            },
        }
    }

    pub fn watches_pending(&self) -> bool {
        matches!(self, WorkerRole::Sniper | WorkerRole::Hybrid)
    }

    pub fn watches_logs(&self) -> bool {
        matches!(self, WorkerRole::Decoder | WorkerRole::Hybrid)
    }
}

impl fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WorkerRole::Sniper => write!(f, "SNIPER"),
            WorkerRole::Decoder => write!(f, "DECODER"),
            WorkerRole::Monitor => write!(f, "MONITOR"),
            WorkerRole::Hybrid => write!(f, "HYBRID"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleAssignment {
    /// Every worker watches both streams
    #[default]
    Combined,
    /// ordinal % 3 → Sniper / Decoder / Monitor
    Split,
}

/// Per-worker startup delay so U workers don't hit the endpoint at once
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StaggerPolicy {
    Fixed { delay_ms: u64 },
    Linear { step_ms: u64 },
    Jitter { max_ms: u64 },
}

impl Default for StaggerPolicy {
    fn default() -> Self {
        StaggerPolicy::Jitter { max_ms: 5_000 }
    }
}

impl StaggerPolicy {
    /// Delay for worker `ordinal` (1-based). `roll` is a uniform sample in [0, 1).
    pub fn delay_for(&self, ordinal: u32, roll: f64) -> Duration {
        match *self {
            StaggerPolicy::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            StaggerPolicy::Linear { step_ms } => {
                Duration::from_millis(step_ms.saturating_mul(ordinal.saturating_sub(1) as u64))
            }
            StaggerPolicy::Jitter { max_ms } => {
                let roll = roll.clamp(0.0, 1.0);
                Duration::from_millis((max_ms as f64 * roll) as u64)
            }
        }
    }
}

/// Gas market snapshot, replaced wholesale on each heartbeat refresh.
/// No staleness check is applied when it is read.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeSnapshot {
    /// Per-gas ceiling declared by the strike tx; charged in cost accounting
    pub max_fee_per_gas: u128,
    /// Suggested tip before the bribe multiplier
    pub priority_fee_per_gas: u128,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Large native transfer seen in the pending pool
    PendingTransfer,
    /// Large swap decoded from a confirmed log
    ConfirmedSwap,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventKind::PendingTransfer => write!(f, "PENDING_TRANSFER"),
            EventKind::ConfirmedSwap => write!(f, "CONFIRMED_SWAP"),
        }
    }
}

/// A whale signal. Created per signal, consumed by one strike evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedEvent {
    pub kind: EventKind,
    pub value: U256,
    pub source_hash: TxHash,
}

impl fmt::Display for DetectedEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let hash = format!("{:?}", self.source_hash);
        write!(
            f,
            "{} {} ETH ({}...)",
            self.kind,
            format_ether(self.value),
            &hash[..hash.len().min(10)]
        )
    }
}

/// Sized and simulated loan request
#[derive(Debug, Clone)]
pub struct StrikeCandidate {
    pub loan_amount: U256,
    pub payload: Bytes,
    pub simulated_return: U256,
}

/// Accept/reject outcome. `net_profit` is return minus every cost term,
/// margin included; zero when rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrikeDecision {
    pub accepted: bool,
    pub net_profit: U256,
    pub total_cost: U256,
}

/// Tunables for sizing, costing, intake and submission
#[derive(Debug, Clone)]
pub struct StrikeParams {
    pub whale_threshold: U256,
    pub confirmed_threshold: U256,
    /// Destination allow-list for pending transfers; empty disables the check
    pub venue_filter: Vec<Address>,
    /// Fraction of pending announcements inspected, in [0, 1]
    pub sampling_rate: f64,
    pub gas_limit: u64,
    pub margin: U256,
    pub priority_bribe_pct: u64,
    pub loan_fee_bps: u64,
    pub operating_balance: U256,
    pub large_loan: U256,
    pub small_loan: U256,
    pub relay_timeout_ms: u64,
    pub dry_run: bool,
}

impl Default for StrikeParams {
    fn default() -> Self {
        const ETH: u128 = 1_000_000_000_000_000_000;
        Self {
            whale_threshold: U256::from(15 * ETH),
            confirmed_threshold: U256::from(10 * ETH),
            venue_filter: Vec::new(),
            sampling_rate: 1.0,
            gas_limit: 1_250_000,
            margin: U256::from(12 * ETH / 1000),
            priority_bribe_pct: 15,
            loan_fee_bps: 5,
            operating_balance: U256::from(ETH / 10),
            large_loan: U256::from(100 * ETH),
            small_loan: U256::from(25 * ETH),
            relay_timeout_ms: 2_000,
            dry_run: false,
        }
    }
}

/// Process-level settings for the supervisor and worker loop
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub max_workers: usize,
    pub role_assignment: RoleAssignment,
    pub stagger: StaggerPolicy,
    pub spawn_spacing_ms: u64,
    pub restart_cooldown_ms: u64,
    pub rate_limit_cooldown_ms: u64,
    pub heartbeat_secs: u64,
    pub beneficiary: Option<Address>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_workers: 64,
            role_assignment: RoleAssignment::Combined,
            stagger: StaggerPolicy::default(),
            spawn_spacing_ms: 0,
            restart_cooldown_ms: 3_000,
            rate_limit_cooldown_ms: 60_000,
            heartbeat_secs: 15,
            beneficiary: None,
        }
    }
}

/// Fully resolved configuration. Not `Debug`: it carries the treasury key.
#[derive(Clone)]
pub struct AppConfig {
    pub engine: EngineSettings,
    pub strike: StrikeParams,
    pub networks: Vec<ChainDescriptor>,
    pub private_key: String,
}

impl AppConfig {
    /// Network for worker `ordinal` (1-based): (ordinal - 1) mod |networks|
    pub fn network_for(&self, ordinal: u32) -> &ChainDescriptor {
        let index = (ordinal.saturating_sub(1) as usize) % self.networks.len();
        &self.networks[index]
    }
}
