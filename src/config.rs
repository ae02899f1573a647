//! Configuration management
//!
//! Reads the network/strike TOML file and the treasury key from `.env`,
//! then resolves everything into the immutable `AppConfig`.
//!
//! Author: AI-Generated
//! Created: 2026-10-18
//!
//! Layout:
//!     [engine]      supervisor + worker loop settings
//!     [strike]      thresholds, sizing tiers, cost terms (ether as decimal strings)
//!     [[network]]   one ChainDescriptor per entry
//!
//! Secrets:
//!     TREASURY_PRIVATE_KEY  required (PRIVATE_KEY accepted as fallback)
//!     TARGET_CONTRACT       optional override of [engine].target_contract

use crate::types::{
    AppConfig, ChainDescriptor, EngineSettings, RoleAssignment, StaggerPolicy, StrikeParams,
    SubmissionMode,
};
use alloy::primitives::utils::parse_ether;
use alloy::primitives::{Address, U256};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Top-level TOML configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    pub engine: EngineToml,
    #[serde(default)]
    pub strike: StrikeToml,
    #[serde(rename = "network")]
    pub networks: Vec<NetworkToml>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineToml {
    /// Default strike target for networks that don't set their own
    pub target_contract: Option<String>,
    /// Profit recipient, logged at boot
    pub beneficiary: Option<String>,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default)]
    pub role_assignment: RoleAssignment,
    #[serde(default)]
    pub stagger: StaggerPolicy,
    #[serde(default)]
    pub spawn_spacing_ms: u64,
    #[serde(default = "default_restart_cooldown")]
    pub restart_cooldown_ms: u64,
    #[serde(default = "default_rate_limit_cooldown")]
    pub rate_limit_cooldown_ms: u64,
    #[serde(default = "default_heartbeat")]
    pub heartbeat_secs: u64,
    #[serde(default)]
    pub dry_run: bool,
}

fn default_max_workers() -> usize { 64 }
fn default_restart_cooldown() -> u64 { 3_000 }
fn default_rate_limit_cooldown() -> u64 { 60_000 }
fn default_heartbeat() -> u64 { 15 }

/// Strike tunables. Ether amounts are decimal strings ("0.012").
#[derive(Debug, Clone, Deserialize)]
pub struct StrikeToml {
    #[serde(default = "default_whale_threshold")]
    pub whale_threshold_eth: String,
    #[serde(default = "default_confirmed_threshold")]
    pub confirmed_threshold_eth: String,
    #[serde(default)]
    pub venue_filter: Vec<String>,
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    #[serde(default = "default_margin")]
    pub margin_eth: String,
    #[serde(default = "default_bribe")]
    pub priority_bribe_pct: u64,
    #[serde(default = "default_loan_fee_bps")]
    pub loan_fee_bps: u64,
    #[serde(default = "default_operating_balance")]
    pub operating_balance_eth: String,
    #[serde(default = "default_large_loan")]
    pub large_loan_eth: String,
    #[serde(default = "default_small_loan")]
    pub small_loan_eth: String,
    #[serde(default = "default_relay_timeout")]
    pub relay_timeout_ms: u64,
}

fn default_whale_threshold() -> String { "15.0".to_string() }
fn default_confirmed_threshold() -> String { "10.0".to_string() }
fn default_sampling_rate() -> f64 { 1.0 }
fn default_gas_limit() -> u64 { 1_250_000 }
fn default_margin() -> String { "0.012".to_string() }
fn default_bribe() -> u64 { 15 }
fn default_loan_fee_bps() -> u64 { 5 }
fn default_operating_balance() -> String { "0.1".to_string() }
fn default_large_loan() -> String { "100".to_string() }
fn default_small_loan() -> String { "25".to_string() }
fn default_relay_timeout() -> u64 { 2_000 }

impl Default for StrikeToml {
    fn default() -> Self {
        Self {
            whale_threshold_eth: default_whale_threshold(),
            confirmed_threshold_eth: default_confirmed_threshold(),
            venue_filter: Vec::new(),
            sampling_rate: default_sampling_rate(),
            gas_limit: default_gas_limit(),
            margin_eth: default_margin(),
            priority_bribe_pct: default_bribe(),
            loan_fee_bps: default_loan_fee_bps(),
            operating_balance_eth: default_operating_balance(),
            large_loan_eth: default_large_loan(),
            small_loan_eth: default_small_loan(),
            relay_timeout_ms: default_relay_timeout(),
        }
    }
}

/// One `[[network]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkToml {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub ws_url: String,
    pub native_asset: String,
    pub stable_asset: String,
    pub target_contract: Option<String>,
    pub fee_oracle: Option<String>,
    pub liquidity_pool: Option<String>,
    #[serde(default)]
    pub reserve_index: u8,
    pub price_feed: Option<String>,
    pub submission: SubmissionMode,
    pub bundle_relay_url: Option<String>,
    pub private_rpc_url: Option<String>,
}

impl TomlConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse TOML configuration")
    }

    /// Resolve raw TOML into runtime types.
    /// `target_override` (TARGET_CONTRACT env) wins over `[engine].target_contract`.
    pub fn resolve(
        &self,
        private_key: String,
        target_override: Option<String>,
        force_dry_run: bool,
    ) -> Result<AppConfig> {
        if self.networks.is_empty() {
            bail!("No [[network]] entries configured");
        }

        let default_target = target_override
            .or_else(|| self.engine.target_contract.clone())
            .map(|s| parse_address(&s, "engine.target_contract"))
            .transpose()?;

        let networks = self
            .networks
            .iter()
            .map(|n| n.resolve(default_target))
            .collect::<Result<Vec<_>>>()?;

        let engine = EngineSettings {
            max_workers: self.engine.max_workers.max(1),
            role_assignment: self.engine.role_assignment,
            stagger: self.engine.stagger,
            spawn_spacing_ms: self.engine.spawn_spacing_ms,
            restart_cooldown_ms: self.engine.restart_cooldown_ms,
            rate_limit_cooldown_ms: self.engine.rate_limit_cooldown_ms,
            heartbeat_secs: self.engine.heartbeat_secs.max(1),
            beneficiary: self
                .engine
                .beneficiary
                .as_deref()
                .map(|s| parse_address(s, "engine.beneficiary"))
                .transpose()?,
        };

        let mut strike = self.strike.resolve()?;
        strike.dry_run = self.engine.dry_run || force_dry_run;

        Ok(AppConfig {
            engine,
            strike,
            networks,
            private_key,
        })
    }
}

impl StrikeToml {
    pub fn resolve(&self) -> Result<StrikeParams> {
        if !(0.0..=1.0).contains(&self.sampling_rate) {
            bail!("strike.sampling_rate must be within [0, 1], got {}", self.sampling_rate);
        }

        let venue_filter = self
            .venue_filter
            .iter()
            .map(|s| parse_address(s, "strike.venue_filter"))
            .collect::<Result<Vec<_>>>()?;

        Ok(StrikeParams {
            whale_threshold: parse_eth(&self.whale_threshold_eth, "strike.whale_threshold_eth")?,
            confirmed_threshold: parse_eth(&self.confirmed_threshold_eth, "strike.confirmed_threshold_eth")?,
            venue_filter,
            sampling_rate: self.sampling_rate,
            gas_limit: self.gas_limit,
            margin: parse_eth(&self.margin_eth, "strike.margin_eth")?,
            priority_bribe_pct: self.priority_bribe_pct,
            loan_fee_bps: self.loan_fee_bps,
            operating_balance: parse_eth(&self.operating_balance_eth, "strike.operating_balance_eth")?,
            large_loan: parse_eth(&self.large_loan_eth, "strike.large_loan_eth")?,
            small_loan: parse_eth(&self.small_loan_eth, "strike.small_loan_eth")?,
            relay_timeout_ms: self.relay_timeout_ms,
            dry_run: false,
        })
    }
}

impl NetworkToml {
    fn resolve(&self, default_target: Option<Address>) -> Result<ChainDescriptor> {
        let field = |f: &str| format!("network[{}].{}", self.name, f);

        let target_contract = match &self.target_contract {
            Some(s) => parse_address(s, &field("target_contract"))?,
            None => default_target.with_context(|| {
                format!("{} has no target_contract and no engine default", self.name)
            })?,
        };

        if self.reserve_index > 1 {
            bail!("{} must be 0 or 1", field("reserve_index"));
        }

        let optional = |value: &Option<String>, name: &str| -> Result<Option<Address>> {
            value
                .as_deref()
                .map(|s| parse_address(s, &field(name)))
                .transpose()
        };

        Ok(ChainDescriptor {
            name: self.name.clone(),
            chain_id: self.chain_id,
            rpc_url: self.rpc_url.clone(),
            ws_url: self.ws_url.clone(),
            native_asset: parse_address(&self.native_asset, &field("native_asset"))?,
            stable_asset: parse_address(&self.stable_asset, &field("stable_asset"))?,
            target_contract,
            fee_oracle: optional(&self.fee_oracle, "fee_oracle")?,
            liquidity_pool: optional(&self.liquidity_pool, "liquidity_pool")?,
            reserve_index: self.reserve_index,
            price_feed: optional(&self.price_feed, "price_feed")?,
            submission: self.submission,
            bundle_relay_url: self.bundle_relay_url.clone(),
            private_rpc_url: self.private_rpc_url.clone(),
        })
    }
}

fn parse_address(value: &str, field: &str) -> Result<Address> {
    value
        .trim()
        .parse::<Address>()
        .with_context(|| format!("Invalid address for {}: '{}'", field, value))
}

fn parse_eth(value: &str, field: &str) -> Result<U256> {
    parse_ether(value.trim()).with_context(|| format!("Invalid ether amount for {}: '{}'", field, value))
}

/// Load the TOML file plus `.env` secrets into an `AppConfig`.
pub fn load_config(path: &Path, force_dry_run: bool) -> Result<AppConfig> {
    dotenv::dotenv().ok();

    let private_key = std::env::var("TREASURY_PRIVATE_KEY")
        .or_else(|_| std::env::var("PRIVATE_KEY"))
        .context("TREASURY_PRIVATE_KEY (or PRIVATE_KEY) not set")?
        .trim()
        .to_string();
    let target_override = std::env::var("TARGET_CONTRACT").ok();

    TomlConfig::load(path)?.resolve(private_key, target_override, force_dry_run)
}
