//! Event Intake
//!
//! Turns raw chain signals into `DetectedEvent`s:
//!     pending.rs  speculative path (pending tx hashes, sampled)
//!     logs.rs     confirmed path (V2 Swap logs)
//!     sampler.rs  admission coin flip for the speculative path
//!
//! Author: AI-Generated
//! Created: 2026-10-18

pub mod logs;
pub mod pending;
pub mod sampler;

pub use logs::ConfirmedIntake;
pub use pending::PendingIntake;
pub use sampler::Sampler;
