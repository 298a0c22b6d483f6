//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout sqlprobe.
//!
//! # Error Categories
//! - `ConfigUnavailable`: The `.env` file could not be opened or read
//! - `ConnectionFailed`: The MySQL client could not open a session or select the schema
//! - `NotConnected`: A query was issued on a client that never connected
//! - `QueryFailed`: Query execution or row retrieval errors
//! - `Io`: Writing results to stdout failed
//!
//! Only `ConnectionFailed` is recovered from (see `DatabaseClient::connect`).
//! Everything else propagates to the binary and terminates it.

use thiserror::Error;

/// Main error type for sqlprobe operations
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Config file missing or unreadable
    #[error("Configuration unavailable: {0}")]
    ConfigUnavailable(String),

    /// Database connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Client used before a successful connect
    #[error("Not connected: call connect() before query()")]
    NotConnected,

    /// Query execution failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Writing results failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// Stable error code string
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigUnavailable(_) => "CONFIG_UNAVAILABLE",
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::NotConnected => "NOT_CONNECTED",
            Self::QueryFailed(_) => "QUERY_FAILED",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Get human-readable error message
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Create a config unavailable error
    pub fn config_unavailable(message: impl Into<String>) -> Self {
        Self::ConfigUnavailable(message.into())
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Create a query failed error
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed(message.into())
    }
}

/// Result type alias for sqlprobe operations
pub type Result<T> = std::result::Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ProbeError::config_unavailable("test").error_code(), "CONFIG_UNAVAILABLE");
        assert_eq!(ProbeError::connection_failed("test").error_code(), "CONNECTION_FAILED");
        assert_eq!(ProbeError::NotConnected.error_code(), "NOT_CONNECTED");
        assert_eq!(ProbeError::query_failed("test").error_code(), "QUERY_FAILED");
    }

    #[test]
    fn test_error_messages() {
        let err = ProbeError::config_unavailable("Could not open .env file");
        assert!(err.message().contains("Could not open .env file"));

        let err = ProbeError::connection_failed("Access denied for user 'root'");
        assert!(err.message().starts_with("Connection failed"));
        assert!(err.message().contains("Access denied"));

        assert!(ProbeError::NotConnected.message().contains("connect()"));
    }

    #[test]
    fn test_error_constructors() {
        let err = ProbeError::config_unavailable("test");
        assert!(matches!(err, ProbeError::ConfigUnavailable(_)));

        let err = ProbeError::connection_failed("test");
        assert!(matches!(err, ProbeError::ConnectionFailed(_)));

        let err = ProbeError::query_failed("test");
        assert!(matches!(err, ProbeError::QueryFailed(_)));

        let err: ProbeError = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed").into();
        assert!(matches!(err, ProbeError::Io(_)));
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
