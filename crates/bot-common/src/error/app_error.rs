//! Application error types
//!
//! Unified error handling at the application edge: configuration, REST bootstrap,
//! and the gateway supervisor all surface through `AppError`.

use bot_core::DomainError;
use std::fmt;

use crate::config::ConfigError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // REST API errors
    #[error("API error: {0}")]
    Api(#[source] anyhow::Error),

    // Gateway errors
    #[error("Gateway error: {0}")]
    Gateway(#[source] anyhow::Error),

    // Credentials rejected by the platform
    #[error("Credentials rejected: {0}")]
    Unauthorized(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    /// Get error code for logs
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Domain(e) => e.code(),
            Self::Api(_) => "API_ERROR",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Process exit code for the binary
    ///
    /// Follows the sysexits convention: 78 for configuration, 77 for
    /// permission, 69 for an unavailable service, 70 for internal failures.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Domain(_) => 78,
            Self::Unauthorized(_) => 77,
            Self::Api(_) | Self::Gateway(_) => 69,
            Self::Internal(_) => 70,
        }
    }

    /// Create an API error from any error
    pub fn api(err: impl Into<anyhow::Error>) -> Self {
        Self::Api(err.into())
    }

    /// Create a gateway error from any error
    pub fn gateway(err: impl Into<anyhow::Error>) -> Self {
        Self::Gateway(err.into())
    }

    #[must_use]
    pub fn unauthorized(msg: impl fmt::Display) -> Self {
        Self::Unauthorized(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
