//! Shared Error Types
//!
//! This module defines the error taxonomy used by every component that talks
//! to the server: the HTTP client, the session state machine, the preview
//! synchronizer, and the resume store all fail with an [`ApiError`].
//!
//! # Error Categories
//!
//! - `Timeout` - the request exceeded its deadline; retrying the triggering
//!   action is always safe
//! - `Unauthorized` - the server session is invalid or expired; recovering
//!   requires re-authenticating
//! - `Http` - any other non-2xx response, carrying the status code and the
//!   server-provided detail message when one was present
//! - `Network` - transport-level failure (DNS, connection refused, ...)
//! - `Decode` - a 2xx response whose body did not match the expected model
//! - `Cancelled` - the request was superseded; never shown to the user
//!
//! # Thread Safety
//!
//! All error variants are `Send + Sync` and can cross task boundaries.
use thiserror::Error;

/// Generic detail used when an error response has no parseable body.
pub const GENERIC_ERROR_DETAIL: &str = "An error occurred";

/// Errors produced by the HTTP client and surfaced through the core components
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request exceeded its deadline and was aborted
    #[error("request timed out")]
    Timeout,

    /// The server rejected the session (HTTP 401)
    #[error("session expired")]
    Unauthorized,

    /// Any other non-2xx response
    #[error("{detail}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Server-provided detail message, or a generic fallback
        detail: String,
    },

    /// Transport-level failure below the HTTP layer
    #[error("network error: {message}")]
    Network {
        /// Human-readable error message
        message: String,
    },

    /// A successful response whose body could not be decoded
    #[error("invalid response body: {message}")]
    Decode {
        /// Human-readable error message
        message: String,
    },

    /// The request was superseded by a newer one and aborted
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Create an `Http` error, substituting the generic detail when absent
    pub fn http(status: u16, detail: Option<String>) -> Self {
        Self::Http {
            status,
            detail: detail.unwrap_or_else(|| GENERIC_ERROR_DETAIL.to_string()),
        }
    }

    /// Create a new network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error is the quiet supersede outcome
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(format!("JSON error: {}", err))
    }
}
