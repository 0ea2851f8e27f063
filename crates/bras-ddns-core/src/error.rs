//! Error types for the Bras DDNS system
//!
//! This module defines all error types used throughout the workspace.

use thiserror::Error;

/// Result type alias for Bras DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the Bras DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input: config, challenge, or an API body that does not parse
    #[error("Parse error: {0}")]
    Parse(String),

    /// Remote API refused the request (HTTP status or reply code)
    #[error("API error ({service}): {message}")]
    Api {
        /// Which remote API failed ("portal", "dnspod")
        service: String,
        /// Error message
        message: String,
    },

    /// DnsPod answered with `status.code != 1` and strict mode is on
    #[error("Provider status {code}: {message}")]
    ProviderStatus {
        /// Provider status code
        code: i64,
        /// Provider status message
        message: String,
    },

    /// Address selection errors (interface enumeration, route tables)
    #[error("Address selector error: {0}")]
    AddressSelector(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level HTTP errors (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Expected data was absent from a response
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an API error for the given service
    pub fn api(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a provider status error
    pub fn provider_status(code: i64, message: impl Into<String>) -> Self {
        Self::ProviderStatus {
            code,
            message: message.into(),
        }
    }

    /// Create an address selector error
    pub fn address_selector(msg: impl Into<String>) -> Self {
        Self::AddressSelector(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Whether this error came from a remote API answering "no"
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::ProviderStatus { .. })
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
