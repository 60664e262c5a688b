//! Gateway bootstrap information returned by `GET /gateway/bot`

use serde::{Deserialize, Serialize};

/// Where to connect and how many shards to open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayBootstrap {
    /// WebSocket URL shared by every shard
    pub url: String,
    /// Recommended shard count
    pub shards: u32,
    pub session_start_limit: SessionStartLimit,
}

/// Session start quota
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionStartLimit {
    pub total: u32,
    pub remaining: u32,
    /// Milliseconds until `remaining` resets
    pub reset_after: u64,
    /// Sessions that may be started per rate-limit window
    pub max_concurrency: u32,
}

impl GatewayBootstrap {
    /// Bootstrap for a fixed URL, used when the REST call is skipped
    pub fn new(url: impl Into<String>, shards: u32, max_concurrency: u32) -> Self {
        Self {
            url: url.into(),
            shards,
            session_start_limit: SessionStartLimit {
                max_concurrency,
                ..SessionStartLimit::default()
            },
        }
    }

    #[inline]
    pub fn max_concurrency(&self) -> u32 {
        self.session_start_limit.max_concurrency
    }
}
