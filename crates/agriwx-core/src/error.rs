//! Centralized error types for the AgriWx service.
//!
//! Lookup failures carry their own client-facing message and HTTP status.
//! Network and store errors keep full context for the logs.

use thiserror::Error;

/// Failures of a single weather lookup. Each variant maps to its own
/// HTTP status so callers can tell them apart.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Missing query parameter q (location)")]
    InvalidQuery,

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Weather provider unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Server misconfigured: {0}")]
    ServerMisconfigured(String),
}

impl LookupError {
    pub fn user_message(&self) -> &'static str {
        match self {
            LookupError::InvalidQuery => "Missing query parameter q (location)",
            LookupError::LocationNotFound(_) => "Location not found",
            LookupError::UpstreamUnavailable(_) => "Server error",
            LookupError::ServerMisconfigured(_) => {
                "Server misconfigured: missing OpenWeatherMap API key"
            }
        }
    }

    /// HTTP status code for the inbound API.
    pub fn status_code(&self) -> u16 {
        match self {
            LookupError::InvalidQuery => 400,
            LookupError::LocationNotFound(_) => 404,
            LookupError::UpstreamUnavailable(_) | LookupError::ServerMisconfigured(_) => 500,
        }
    }

    /// Extra detail for the response body, when there is any worth showing.
    pub fn details(&self) -> Option<&str> {
        match self {
            LookupError::UpstreamUnavailable(detail) => Some(detail),
            _ => None,
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// History store errors. These are logged and never reach API clients.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database open failed: {0}")]
    Open(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Data corruption detected: {0}")]
    Corruption(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Background task failed: {0}")]
    Join(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_store_error(self) -> StoreError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_store_error(self) -> StoreError {
        match &self {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("corrupt") => {
                StoreError::Corruption(self.to_string())
            }
            _ => StoreError::Query(self.to_string()),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        e.into_store_error()
    }
}
