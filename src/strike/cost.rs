//! Strike cost model
//!
//! total = gas_limit × max_fee_per_gas + L1 data fee + loan fee + margin
//!
//! A strike is taken only when the simulated return is strictly greater
//! than `total`. Equality is a reject.
//!
//! Author: AI-Generated
//! Created: 2026-10-18

use crate::types::{FeeSnapshot, StrikeDecision, StrikeParams};
use alloy::primitives::utils::format_ether;
use alloy::primitives::{Bytes, U256};
use std::fmt;

const BPS_DENOMINATOR: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostBreakdown {
    pub gas_cost: U256,
    pub l1_fee: U256,
    pub loan_fee: U256,
    pub margin: U256,
}

impl CostBreakdown {
    pub fn new(loan_amount: U256, l1_fee: U256, fees: &FeeSnapshot, params: &StrikeParams) -> Self {
        Self {
            gas_cost: gas_cost(params.gas_limit, fees.max_fee_per_gas),
            l1_fee,
            loan_fee: loan_fee(loan_amount, params.loan_fee_bps),
            margin: params.margin,
        }
    }

    pub fn total(&self) -> U256 {
        self.gas_cost
            .saturating_add(self.l1_fee)
            .saturating_add(self.loan_fee)
            .saturating_add(self.margin)
    }
}

impl fmt::Display for CostBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "gas={} l1={} loan_fee={} margin={} total={}",
            format_ether(self.gas_cost),
            format_ether(self.l1_fee),
            format_ether(self.loan_fee),
            format_ether(self.margin),
            format_ether(self.total())
        )
    }
}

pub fn gas_cost(gas_limit: u64, max_fee_per_gas: u128) -> U256 {
    U256::from(gas_limit).saturating_mul(U256::from(max_fee_per_gas))
}

/// Flash-loan premium: `bps` basis points of the borrowed amount
pub fn loan_fee(amount: U256, bps: u64) -> U256 {
    amount.saturating_mul(U256::from(bps)) / U256::from(BPS_DENOMINATOR)
}

pub fn decide(simulated_return: U256, costs: &CostBreakdown) -> StrikeDecision {
    let total_cost = costs.total();
    let accepted = simulated_return > total_cost;
    StrikeDecision {
        accepted,
        net_profit: if accepted {
            simulated_return - total_cost
        } else {
            U256::ZERO
        },
        total_cost,
    }
}

/// First return word of the simulation. None when the call returned nothing.
pub fn simulated_return(output: &Bytes) -> Option<U256> {
    if output.is_empty() {
        return None;
    }
    let word = &output[..output.len().min(32)];
    Some(U256::from_be_slice(word))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::{eth, fees, milli_eth, word};

    fn costs_for_small_tier() -> CostBreakdown {
        // 1.25M gas @ 2 gwei = 0.0025, 5 bps of 25 = 0.0125, margin 0.012
        CostBreakdown::new(eth(25), U256::ZERO, &fees(2_000_000_000, 0), &StrikeParams::default())
    }

    #[test]
    fn test_cost_terms() {
        let costs = costs_for_small_tier();
        assert_eq!(costs.gas_cost, U256::from(2_500_000_000_000_000u128));
        assert_eq!(costs.loan_fee, U256::from(12_500_000_000_000_000u128));
        assert_eq!(costs.margin, milli_eth(12));
        assert_eq!(costs.total(), milli_eth(27));
    }

    #[test]
    fn test_equality_rejects() {
        let costs = costs_for_small_tier();
        let total = costs.total();

        let at = decide(total, &costs);
        assert!(!at.accepted);
        assert_eq!(at.net_profit, U256::ZERO);
        assert_eq!(at.total_cost, total);

        assert!(!decide(total - U256::from(1), &costs).accepted);

        let above = decide(total + U256::from(1), &costs);
        assert!(above.accepted);
        assert_eq!(above.net_profit, U256::from(1));
    }

    #[test]
    fn test_l1_fee_counts() {
        let base = costs_for_small_tier();
        let with_l1 = CostBreakdown {
            l1_fee: milli_eth(1),
            ..base
        };
        let ret = base.total() + U256::from(1);
        assert!(decide(ret, &base).accepted);
        assert!(!decide(ret, &with_l1).accepted);
    }

    #[test]
    fn test_loan_fee_rounds_down() {
        assert_eq!(loan_fee(U256::from(19_999u64), 5), U256::from(9));
        assert_eq!(loan_fee(eth(100), 5), milli_eth(50));
    }

    #[test]
    fn test_simulated_return_word() {
        assert_eq!(simulated_return(&Bytes::new()), None);
        assert_eq!(simulated_return(&word(eth(3))), Some(eth(3)));

        let mut two_words = word(U256::from(42)).to_vec();
        two_words.extend_from_slice(&[0xff; 32]);
        assert_eq!(simulated_return(&Bytes::from(two_words)), Some(U256::from(42)));
    }
}
