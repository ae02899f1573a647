//! Confirmed intake: V2 `Swap` logs → ConfirmedSwap events
//!
//! The Swap data section is four uint256 words
//! (amount0In, amount1In, amount0Out, amount1Out). The largest of them is
//! the swap's size; anything at or above `confirmed_threshold` is a whale.
//!
//! Author: AI-Generated
//! Created: 2026-10-18

use crate::contracts::IUniswapV2Pair;
use crate::types::{DetectedEvent, EventKind, StrikeParams};
use alloy::primitives::{B256, TxHash, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use tracing::debug;

const WORD: usize = 32;
const AMOUNT_WORDS: usize = 4;

pub struct ConfirmedIntake {
    threshold: U256,
}

impl ConfirmedIntake {
    pub fn new(params: &StrikeParams) -> Self {
        Self {
            threshold: params.confirmed_threshold,
        }
    }

    /// Topic0 used for the log subscription filter
    pub fn swap_topic() -> B256 {
        IUniswapV2Pair::Swap::SIGNATURE_HASH
    }

    pub fn decode(&self, log: &Log) -> Option<DetectedEvent> {
        let hash = log.transaction_hash.unwrap_or_default();
        self.decode_data(log.data().data.as_ref(), hash)
    }

    /// Largest of the four amount words, if it clears the threshold
    pub fn decode_data(&self, data: &[u8], source_hash: TxHash) -> Option<DetectedEvent> {
        if data.len() < WORD * AMOUNT_WORDS {
            debug!("Swap log {:?} too short ({} bytes)", source_hash, data.len());
            return None;
        }

        let largest = data
            .chunks_exact(WORD)
            .take(AMOUNT_WORDS)
            .map(U256::from_be_slice)
            .max()
            .unwrap_or(U256::ZERO);

        if largest < self.threshold {
            return None;
        }

        Some(DetectedEvent {
            kind: EventKind::ConfirmedSwap,
            value: largest,
            source_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::eth;

    fn swap_data(amounts: [U256; 4]) -> Vec<u8> {
        amounts
            .iter()
            .flat_map(|a| a.to_be_bytes::<32>())
            .collect()
    }

    #[test]
    fn test_max_amount_triggers() {
        let intake = ConfirmedIntake::new(&StrikeParams::default());
        let data = swap_data([U256::ZERO, eth(3), eth(12), U256::ZERO]);

        let event = intake.decode_data(&data, TxHash::repeat_byte(0x0c)).unwrap();
        assert_eq!(event.kind, EventKind::ConfirmedSwap);
        assert_eq!(event.value, eth(12));
        assert_eq!(event.source_hash, TxHash::repeat_byte(0x0c));
    }

    #[test]
    fn test_below_threshold_is_ignored() {
        let intake = ConfirmedIntake::new(&StrikeParams::default());
        let just_under = eth(10) - U256::from(1);
        let data = swap_data([just_under, U256::ZERO, U256::ZERO, just_under]);
        assert!(intake.decode_data(&data, TxHash::ZERO).is_none());

        let at = swap_data([U256::ZERO, U256::ZERO, U256::ZERO, eth(10)]);
        assert!(intake.decode_data(&at, TxHash::ZERO).is_some());
    }

    #[test]
    fn test_short_data_is_dropped() {
        let intake = ConfirmedIntake::new(&StrikeParams::default());
        assert!(intake.decode_data(&[0u8; 96], TxHash::ZERO).is_none());
    }

    #[test]
    fn test_swap_topic_matches_signature() {
        let expected = alloy::primitives::keccak256(
            "Swap(address,uint256,uint256,uint256,uint256,address)",
        );
        assert_eq!(ConfirmedIntake::swap_topic(), expected);
    }
}
