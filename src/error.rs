//! External-Call Error Taxonomy
//!
//! Purpose:
//!     Every call that leaves the process (RPC, relay, signer, stream) returns
//!     `Result<T, ChainError>`. The variant records *what kind* of failure
//!     happened so the caller can pick the recovery path, and `severity()`
//!     says whether the worker can keep going.
//!
//! Author: AI-Generated
//! Created: 2026-10-18
//!
//! Recovery map:
//!     Transport / Decode / Signing  → abandon this one evaluation
//!     Reverted                      → normal negative decision
//!     NonceConflict                 → resync nonce from the endpoint
//!     RateLimited                   → worker exits, supervisor waits longer
//!     Disconnected                  → worker exits, supervisor restarts

use thiserror::Error;

/// Exit code a worker uses when the endpoint is throttling it (EX_TEMPFAIL).
pub const RATE_LIMIT_EXIT_CODE: i32 = 75;

/// Exit code for any other fatal worker error.
pub const FATAL_EXIT_CODE: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("sequencing conflict: {0}")]
    NonceConflict(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("execution reverted: {0}")]
    Reverted(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("stream disconnected: {0}")]
    Disconnected(String),
}

/// Whether a failure ends the worker process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Recoverable,
    Fatal,
}

impl ChainError {
    /// Map a raw endpoint error message onto a failure kind.
    ///
    /// Providers don't agree on error codes, so this goes by message text the
    /// same way the nodes phrase it ("nonce too low", "429 Too Many Requests",
    /// "execution reverted").
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if is_http_429(&lower)
            || lower.contains("rate limit")
            || lower.contains("too many requests")
            || lower.contains("exceeded its compute units")
        {
            Self::RateLimited(message)
        } else if lower.contains("nonce")
            || lower.contains("replacement transaction underpriced")
        {
            Self::NonceConflict(message)
        } else if lower.contains("revert") {
            Self::Reverted(message)
        } else if lower.contains("deserialize") || lower.contains("decode") {
            Self::Decode(message)
        } else {
            Self::Transport(message)
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::RateLimited(_) | Self::Disconnected(_) => Severity::Fatal,
            _ => Severity::Recoverable,
        }
    }

    pub fn is_nonce_conflict(&self) -> bool {
        matches!(self, Self::NonceConflict(_))
    }

    /// Process exit code for a worker that stops on this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RateLimited(_) => RATE_LIMIT_EXIT_CODE,
            _ => FATAL_EXIT_CODE,
        }
    }

    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::RateLimited(_) => "rate_limited",
            Self::NonceConflict(_) => "nonce_conflict",
            Self::Decode(_) => "decode",
            Self::Reverted(_) => "reverted",
            Self::Signing(_) => "signing",
            Self::Disconnected(_) => "disconnected",
        }
    }
}

/// HTTP 429 as transports phrase it ("HTTP error 429 with body",
/// "status code 429", "(429 Too Many Requests)"). A bare "429" inside a
/// block number, hash or URL does not count.
fn is_http_429(lower: &str) -> bool {
    ["error 429", "status 429", "status code 429", "code: 429", "http 429", "(429 "]
        .iter()
        .any(|needle| lower.contains(needle))
}
