//! Strike Decision Engine
//!
//! ```text
//!     sizing.rs  two-tier loan sizing + reserve cap
//!     cost.rs    cost model and accept/reject rule
//!     engine.rs  the evaluation pipeline over a ChainClient
//! ```
//!
//! Author: AI-Generated
//! Created: 2026-10-18

pub mod cost;
pub mod engine;
pub mod sizing;

pub use cost::CostBreakdown;
pub use engine::{RejectReason, StrikeEngine, StrikePlan, Verdict};
