//! Submission
//!
//! ```text
//!     controller.rs  bribe fee, build/sign, bundle / relay / broadcast
//!     nonce.rs       treasury nonce cache with resync
//! ```
//!
//! Author: AI-Generated
//! Created: 2026-10-18

pub mod controller;
pub mod nonce;

pub use controller::{SubmissionController, SubmissionOutcome};
pub use nonce::TreasuryState;
