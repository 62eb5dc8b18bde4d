//! Core error types for meetbook-core.
//!
//! This module defines the error hierarchy using thiserror. Engine errors
//! ([`AvailabilityError`]) are raised to the immediate caller; remote errors
//! ([`GraphError`]) are caught by the booking layer and turned into
//! structured results.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for meetbook-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Availability engine errors
    #[error("{0}")]
    Availability(#[from] AvailabilityError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote calendar errors
    #[error("Calendar API error: {0}")]
    Graph(#[from] GraphError),

    /// A booking request failed field validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The remote schedule source failed or timed out
    #[error("Calendar service unavailable: {0}")]
    UpstreamUnavailable(String),
}

/// Errors raised by the availability engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityError {
    /// Date string could not be parsed
    #[error("Invalid date format: {input}")]
    InvalidDate { input: String },

    /// Time-of-day string could not be parsed
    #[error("Invalid time format: {input} (expected HH:MM)")]
    InvalidTime { input: String },

    /// Duration is non-positive or outside policy
    #[error("Invalid duration: {minutes} minutes")]
    InvalidDuration { minutes: i64 },

    /// Interval end precedes its start
    #[error("Invalid interval: end ({end}) precedes start ({start})")]
    InvalidInterval { start: String, end: String },

    /// A single schedule record could not be parsed
    #[error("Malformed schedule item #{index}: {reason}")]
    MalformedScheduleItem { index: usize, reason: String },
}

/// Errors from the Microsoft Graph client.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Required settings are missing
    #[error("Graph client not configured, missing: {}", missing.join(", "))]
    NotConfigured { missing: Vec<String> },

    /// Token endpoint refused or returned garbage
    #[error("Token acquisition failed: {0}")]
    TokenAcquisition(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<reqwest::Error> for GraphError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GraphError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            GraphError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            GraphError::Transport(err.to_string())
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_errors_render_clear_messages() {
        let err = AvailabilityError::InvalidDate {
            input: "tomorrow-ish".into(),
        };
        assert_eq!(err.to_string(), "Invalid date format: tomorrow-ish");

        let err = AvailabilityError::InvalidDuration { minutes: 0 };
        assert_eq!(err.to_string(), "Invalid duration: 0 minutes");
    }

    #[test]
    fn not_configured_lists_missing_keys() {
        let err = GraphError::NotConfigured {
            missing: vec!["graph.tenant_id".into(), "AZURE_CLIENT_SECRET".into()],
        };
        assert_eq!(
            err.to_string(),
            "Graph client not configured, missing: graph.tenant_id, AZURE_CLIENT_SECRET"
        );
    }

    #[test]
    fn core_error_wraps_engine_error_transparently() {
        let err: CoreError = AvailabilityError::InvalidTime {
            input: "25:99".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Invalid time format: 25:99 (expected HH:MM)");
    }
}
