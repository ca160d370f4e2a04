//! Error types for gate, session and transport operations.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by gate components.
///
/// None of these are fatal: callers log them and degrade to "deny" or
/// "acknowledge without deciding".
#[derive(Debug, Error)]
pub enum GateError {
    /// No live handler is subscribed at the target address.
    #[error("no handlers for address {0}")]
    NoHandlers(String),
    /// The recipient did not reply within the allotted time.
    #[error("timed out after {timeout:?} waiting for reply from {address}")]
    ReplyTimeout {
        /// Address the request was sent to.
        address: String,
        /// How long the caller waited.
        timeout: Duration,
    },
    /// The recipient dropped the request without replying.
    #[error("reply dropped by {0}")]
    ReplyDropped(String),
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Transport-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
