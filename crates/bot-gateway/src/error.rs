//! Gateway error types

use bot_common::AppError;
use bot_core::ShardConfig;
use std::any::Any;
use std::time::Duration;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::events::EventType;
use crate::protocol::{CloseCode, CloseDisposition};

/// Why a shard connection failed or ended
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("connect to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    #[error("connect to {url} timed out after {timeout:?}")]
    ConnectTimeout { url: String, timeout: Duration },

    #[error("handshake failed: {0}")]
    Handshake(#[source] tungstenite::Error),

    #[error("transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("connection closed: {code}")]
    Closed { code: CloseCode, reason: String },

    #[error("connection closed without a close frame")]
    Disconnected,

    #[error("server requested reconnect")]
    Reconnect,

    #[error("session invalidated (resumable: {resumable})")]
    InvalidSession { resumable: bool },

    #[error("heartbeat was not acknowledged")]
    Zombie,

    #[error("resume forced")]
    ForceResume,

    #[error("frame processor stopped unexpectedly")]
    ProcessorFailed,

    #[error("shard task panicked: {0}")]
    Panic(String),

    #[error("shard {shard} rejected by gateway: {code}")]
    Fatal { shard: ShardConfig, code: CloseCode },

    #[error("gateway reported no shards to start")]
    NoShards,

    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

impl GatewayError {
    /// How the shard continues after this error
    #[must_use]
    pub fn disposition(&self) -> CloseDisposition {
        match self {
            Self::Closed { code, .. } | Self::Fatal { code, .. } => code.disposition(),
            Self::InvalidSession { resumable: false } => CloseDisposition::Reidentify,
            Self::NoShards => CloseDisposition::Fatal,
            _ => CloseDisposition::Resume,
        }
    }

    /// Retrying cannot fix this error
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.disposition() == CloseDisposition::Fatal
    }

    /// Close code carried by this error, if the server sent one
    #[must_use]
    pub fn close_code(&self) -> Option<CloseCode> {
        match self {
            Self::Closed { code, .. } | Self::Fatal { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err.close_code() {
            Some(CloseCode::AuthenticationFailed) => AppError::unauthorized(err),
            _ => AppError::gateway(err),
        }
    }
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors from routing one dispatch frame
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to decode {event_type} payload: {source}")]
    Decode {
        event_type: EventType,
        #[source]
        source: serde_json::Error,
    },

    #[error("{event_type} handler failed: {source}")]
    Handler {
        event_type: EventType,
        #[source]
        source: anyhow::Error,
    },
}

/// Render a caught panic payload for logs
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
