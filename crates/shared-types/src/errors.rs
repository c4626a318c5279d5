//! # Error Types
//!
//! The error taxonomy shared across the signing core.
//!
//! Propagation rules:
//!
//! - `Transport` and `Validation` on a sync gateway call propagate to the
//!   caller.
//! - `NotFound` and `Provider` raised inside an asynchronous inbound
//!   callback are logged as fatal and swallowed; redelivery cannot change
//!   an external system's prior decision.
//! - `Conflict` from identifier creation is always returned synchronously.

use thiserror::Error;

/// Result alias used across the signing core.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in the signing core.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    /// The transport failed or a sync call timed out waiting for its
    /// correlated response.
    #[error("transport unavailable: {reason}")]
    Transport {
        /// Human-readable failure reason.
        reason: String,
    },

    /// Malformed envelope, undecodable payload, or mutually-exclusive
    /// parameters.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A live identifier already exists for the natural key.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A callback or read references a record that no longer exists.
    #[error("not found: {0}")]
    NotFound(String),

    /// The external system reported a domain-level failure.
    #[error("provider error {code}: {message}")]
    Provider {
        /// Provider-assigned error code.
        code: i64,
        /// Provider-supplied message.
        message: String,
    },
}

impl CoreError {
    /// Transport failure for an unreachable or timed-out downstream.
    #[must_use]
    pub fn service_unavailable(event: &str) -> Self {
        Self::Transport {
            reason: format!("no response for event '{event}'"),
        }
    }

    /// Validation failure with a formatted message.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True for errors that an async inbound callback must swallow
    /// after logging rather than re-raise into the transport.
    #[must_use]
    pub fn is_callback_swallowed(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Provider { .. })
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Validation(format!("undecodable payload: {e}"))
    }
}
