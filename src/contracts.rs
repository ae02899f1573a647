//! Centralized Contract Definitions
//!
//! All Solidity interfaces the strike engine touches, defined using alloy's
//! `sol!` macro. Each interface is annotated with `#[sol(rpc)]` so the RPC
//! client can build contract instances against any alloy Provider.
//!
//! Author: AI-Generated
//! Created: 2026-10-18

use alloy::sol;

// ── Strike target (flash-loan entry point) ───────────────────────────

sol! {
    #[sol(rpc)]
    interface IFlashStrike {
        function requestTitanLoan(address token, uint256 amount, address[] calldata path) external;
    }
}

// ── OP-stack L1 data fee oracle ──────────────────────────────────────

sol! {
    #[sol(rpc)]
    interface IL1GasOracle {
        function getL1Fee(bytes memory data) external view returns (uint256);
    }
}

// ── Uniswap V2 pair (reserves + Swap event) ──────────────────────────

sol! {
    #[sol(rpc)]
    interface IUniswapV2Pair {
        event Swap(address indexed sender, uint256 amount0In, uint256 amount1In, uint256 amount0Out, uint256 amount1Out, address indexed to);

        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
    }
}

// ── Chainlink price feed ─────────────────────────────────────────────

sol! {
    #[sol(rpc)]
    interface IAggregatorV3 {
        function latestRoundData() external view returns (uint80 roundId, int256 answer, uint256 startedAt, uint256 updatedAt, uint80 answeredInRound);
    }
}
