//! Error types for the payunify SDK

use crate::types::OrderStatusData;
use thiserror::Error;

/// Result type alias for payunify operations
pub type Result<T> = std::result::Result<T, PayError>;

/// Main error type for payunify operations
#[derive(Error, Debug)]
pub enum PayError {
    /// Transport or connection failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request body could not be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response body could not be decoded
    #[error("Failed to decode response: {source}, body: {body}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// Gateway answered with a non-success envelope code
    #[error("Gateway error (code={code}): {message}")]
    Api { code: i64, message: String },

    /// Success envelope without a `data` payload
    #[error("Response to {operation} carried no data")]
    MissingData { operation: String },

    /// Polling used up every attempt without reaching a terminal status
    #[error("Polling timed out after {max_retries} attempts")]
    PollTimeout { max_retries: u32 },

    /// Polling observed the order being closed
    #[error("Order {} is closed", .status.order_no)]
    OrderClosed { status: Box<OrderStatusData> },

    /// HMAC key setup failed
    #[error("Signing error: {message}")]
    Signing { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PayError {
    /// Create a gateway error
    pub fn api(code: i64, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }

    /// Create a missing data error
    pub fn missing_data(operation: impl Into<String>) -> Self {
        Self::MissingData {
            operation: operation.into(),
        }
    }

    /// Create a signing error
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether a caller may reasonably retry the same call.
    ///
    /// Transport failures and gateway-side 5xx codes are retryable; decode
    /// failures, configuration problems and terminal poll outcomes are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Self::Api { code, .. } => (500..600).contains(code),
            Self::PollTimeout { .. } => true,
            _ => false,
        }
    }

    /// The order payload attached to a closed-order error
    pub fn closed_status(&self) -> Option<&OrderStatusData> {
        match self {
            Self::OrderClosed { status } => Some(status),
            _ => None,
        }
    }
}
