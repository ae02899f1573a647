//! Strike Decision Engine
//!
//! Purpose:
//!     One evaluation per detected whale event:
//!         balance → tier → reserve cap → payload → (simulation ‖ L1 fee)
//!         → cost model → accept / reject
//!
//! Author: AI-Generated
//! Created: 2026-10-18
//!
//! Notes:
//!     - Simulation and the L1 oracle query run concurrently (both read-only)
//!     - A failing reserve query leaves the loan uncapped; a failing or absent
//!       oracle contributes an L1 fee of zero
//!     - A reverted, failed or empty simulation is a reject, never retried
//!     - Only fatal errors (rate limit, disconnect) and a failed balance
//!       query surface as `Err`

use super::cost::{self, CostBreakdown};
use super::sizing::{cap_to_reserve, propose_loan};
use crate::chain::ChainClient;
use crate::contracts::IFlashStrike;
use crate::error::{ChainError, Severity};
use crate::types::{
    ChainDescriptor, DetectedEvent, FeeSnapshot, StrikeCandidate, StrikeDecision, StrikeParams,
};
use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An accepted strike, ready for submission
#[derive(Debug, Clone)]
pub struct StrikePlan {
    pub candidate: StrikeCandidate,
    pub decision: StrikeDecision,
    pub costs: CostBreakdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    SimulationReverted,
    /// Simulation failed for a non-revert reason (error kind)
    SimulationFailed(&'static str),
    EmptyReturn,
    Unprofitable(StrikeDecision),
}

#[derive(Debug, Clone)]
pub enum Verdict {
    Accept(StrikePlan),
    Reject(RejectReason),
}

pub struct StrikeEngine {
    chain: Arc<dyn ChainClient>,
    descriptor: ChainDescriptor,
    params: StrikeParams,
}

impl StrikeEngine {
    pub fn new(chain: Arc<dyn ChainClient>, descriptor: ChainDescriptor, params: StrikeParams) -> Self {
        Self {
            chain,
            descriptor,
            params,
        }
    }

    pub fn params(&self) -> &StrikeParams {
        &self.params
    }

    pub fn descriptor(&self) -> &ChainDescriptor {
        &self.descriptor
    }

    /// Calldata for the flash-loan request
    pub fn build_payload(&self, amount: U256) -> Bytes {
        IFlashStrike::requestTitanLoanCall {
            token: self.descriptor.native_asset,
            amount,
            path: self.descriptor.swap_path(),
        }
        .abi_encode()
        .into()
    }

    /// Size the loan for `treasury`, applying the reserve cap when available
    pub async fn size_loan(&self, treasury: Address) -> Result<U256, ChainError> {
        let balance = self.chain.balance(treasury).await?;
        let tier = propose_loan(balance, &self.params);

        let Some(pool) = self.descriptor.liquidity_pool else {
            return Ok(tier);
        };

        match self
            .chain
            .pool_reserve(pool, self.descriptor.reserve_index)
            .await
        {
            Ok(reserve) => {
                let capped = cap_to_reserve(tier, reserve);
                if capped < tier {
                    debug!(
                        "Loan capped by pool depth: {} → {} ETH (reserve {})",
                        format_ether(tier),
                        format_ether(capped),
                        format_ether(reserve)
                    );
                }
                Ok(capped)
            }
            Err(e) if e.severity() == Severity::Fatal => Err(e),
            Err(e) => {
                warn!("Reserve query failed ({}), proceeding uncapped: {}", e.kind(), e);
                Ok(tier)
            }
        }
    }

    async fn l1_fee(&self, payload: Bytes) -> Result<U256, ChainError> {
        let Some(oracle) = self.descriptor.fee_oracle else {
            return Ok(U256::ZERO);
        };
        match self.chain.l1_fee(oracle, payload).await {
            Ok(fee) => Ok(fee),
            Err(e) if e.severity() == Severity::Fatal => Err(e),
            Err(e) => {
                debug!("L1 fee oracle failed ({}), using 0: {}", e.kind(), e);
                Ok(U256::ZERO)
            }
        }
    }

    pub async fn evaluate(
        &self,
        event: &DetectedEvent,
        treasury: Address,
        fees: &FeeSnapshot,
    ) -> Result<Verdict, ChainError> {
        let amount = self.size_loan(treasury).await?;
        let payload = self.build_payload(amount);

        let (simulation, l1_fee) = tokio::join!(
            self.chain.simulate(
                treasury,
                self.descriptor.target_contract,
                payload.clone(),
                self.params.gas_limit,
            ),
            self.l1_fee(payload.clone())
        );
        let l1_fee = l1_fee?;

        let output = match simulation {
            Ok(output) => output,
            Err(e) if e.severity() == Severity::Fatal => return Err(e),
            Err(ChainError::Reverted(msg)) => {
                debug!("Strike simulation reverted for {}: {}", event, msg);
                return Ok(Verdict::Reject(RejectReason::SimulationReverted));
            }
            Err(e) => {
                debug!("Strike simulation failed for {} ({}): {}", event, e.kind(), e);
                return Ok(Verdict::Reject(RejectReason::SimulationFailed(e.kind())));
            }
        };

        let Some(simulated_return) = cost::simulated_return(&output) else {
            return Ok(Verdict::Reject(RejectReason::EmptyReturn));
        };

        let costs = CostBreakdown::new(amount, l1_fee, fees, &self.params);
        let decision = cost::decide(simulated_return, &costs);

        if !decision.accepted {
            debug!(
                "Strike unprofitable for {}: return {} ≤ cost {}",
                event,
                format_ether(simulated_return),
                format_ether(decision.total_cost)
            );
            return Ok(Verdict::Reject(RejectReason::Unprofitable(decision)));
        }

        info!(
            "Strike accepted on {}: loan {} ETH | return {} | net {} | {}",
            self.descriptor.name,
            format_ether(amount),
            format_ether(simulated_return),
            format_ether(decision.net_profit),
            costs
        );

        Ok(Verdict::Accept(StrikePlan {
            candidate: StrikeCandidate {
                loan_amount: amount,
                payload,
                simulated_return,
            },
            decision,
            costs,
        }))
    }
}
