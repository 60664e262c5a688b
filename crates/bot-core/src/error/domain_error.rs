//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown token type: {0}")]
    UnknownTokenType(String),

    #[error("Token must not be empty")]
    EmptyToken,

    #[error("Shard count must be at least 1")]
    ZeroShardCount,

    #[error("Shard {shard_id} is out of range for {shard_count} shards")]
    ShardOutOfRange { shard_id: u32, shard_count: u32 },
}

impl DomainError {
    /// Get error code for logs and error responses
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownTokenType(_) => "UNKNOWN_TOKEN_TYPE",
            Self::EmptyToken => "EMPTY_TOKEN",
            Self::ZeroShardCount => "ZERO_SHARD_COUNT",
            Self::ShardOutOfRange { .. } => "SHARD_OUT_OF_RANGE",
        }
    }
}
