// Loan sizing: two fixed tiers picked by treasury balance, then clipped to
// a tenth of pool depth when the pool reserve is known.

use crate::types::StrikeParams;
use alloy::primitives::U256;

/// Share of the counter-asset reserve a single loan may take (1/10)
const RESERVE_CAP_DIVISOR: u64 = 10;

/// Large tier iff balance is strictly above the operating threshold
pub fn propose_loan(balance: U256, params: &StrikeParams) -> U256 {
    if balance > params.operating_balance {
        params.large_loan
    } else {
        params.small_loan
    }
}

pub fn cap_to_reserve(amount: U256, reserve: U256) -> U256 {
    amount.min(reserve / U256::from(RESERVE_CAP_DIVISOR))
}
