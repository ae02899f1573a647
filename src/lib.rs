//! Whale Strike Engine Library
//!
//! Detects large pending transfers and confirmed swaps on EVM networks and
//! decides whether a flash-loan strike against the target contract pays for
//! itself, then submits it privately or publicly.
//!
//! Author: AI-Generated
//! Created: 2026-10-18

pub mod chain;
pub mod config;
pub mod contracts;
pub mod error;
pub mod intake;
pub mod retry;
pub mod strike;
pub mod submission;
pub mod supervisor;
pub mod types;
pub mod worker;

// Re-export commonly used types
pub use config::load_config;
pub use error::ChainError;
pub use types::{AppConfig, ChainDescriptor, DetectedEvent, StrikeParams};
