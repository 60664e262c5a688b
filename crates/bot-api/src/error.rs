//! REST client errors

use bot_common::AppError;
use thiserror::Error;

/// Errors returned by [`crate::GatewayApi`] calls
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status: {status} body={body}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// The platform rejected the bot's credentials
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedStatus { status, .. }
                if *status == reqwest::StatusCode::UNAUTHORIZED
                    || *status == reqwest::StatusCode::FORBIDDEN
        )
    }

    #[must_use]
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            Self::Decode(_) => None,
        }
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        if err.is_unauthorized() {
            AppError::unauthorized(err)
        } else {
            AppError::api(err)
        }
    }
}

/// Result type alias for REST calls
pub type ApiResult<T> = Result<T, ApiError>;
