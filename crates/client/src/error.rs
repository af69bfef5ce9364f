//! Error types for the Omeda client
//!
//! Every fallible operation in this crate returns [`OmedaError`] so callers
//! can match on one taxonomy regardless of which resource raised the failure.

use thiserror::Error;

/// Errors raised by client configuration, dispatch, and response handling
#[derive(Debug, Error)]
pub enum OmedaError {
    /// Client settings are missing, empty, or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// A resource method was called with unusable input; nothing was dispatched
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An unregistered resource name was requested
    #[error("no resource exists for {0}")]
    UnknownResource(String),

    /// The response body could not be decoded into a structured value
    #[error("Response parse error: {0}")]
    Parse(String),

    /// The upstream service answered with a non-success HTTP status
    #[error("API error (status {status}): {content}")]
    Api {
        /// HTTP status code returned by the service
        status: u16,
        /// Raw response body as received
        content: String,
    },

    /// The request failed before an HTTP status was produced
    #[error("Network error: {0}")]
    Network(String),
}

impl OmedaError {
    /// Get the HTTP status code, if the upstream service produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check whether the failure was detected locally, before dispatch
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::InvalidArgument(_) | Self::UnknownResource(_)
        )
    }
}

impl From<reqwest::Error> for OmedaError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Api { status: status.as_u16(), content: err.to_string() },
            None => Self::Network(err.to_string()),
        }
    }
}

/// Convenience result type used throughout the crate
pub type Result<T> = std::result::Result<T, OmedaError>;
