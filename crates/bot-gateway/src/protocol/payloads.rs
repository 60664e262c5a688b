//! Handshake payload definitions

use bot_core::{Intents, ShardConfig};
use serde::{Deserialize, Serialize};

/// Payload for op 10 (Hello)
///
/// Sent by the server immediately after connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    #[serde(default)]
    pub heartbeat_interval: u64,
}

impl HelloPayload {
    /// Default heartbeat interval (45 seconds)
    pub const DEFAULT_HEARTBEAT_INTERVAL: u64 = 45_000;

    /// Create a Hello payload with custom interval
    #[must_use]
    pub fn with_interval(heartbeat_interval: u64) -> Self {
        Self { heartbeat_interval }
    }

    /// The advertised interval, or `None` when the server sent zero
    #[must_use]
    pub fn interval_ms(&self) -> Option<u64> {
        (self.heartbeat_interval > 0).then_some(self.heartbeat_interval)
    }
}

impl Default for HelloPayload {
    fn default() -> Self {
        Self::with_interval(Self::DEFAULT_HEARTBEAT_INTERVAL)
    }
}

/// Payload for op 2 (Identify)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    /// Full authorization value, e.g. `Bot 1024.abcdef`
    pub token: String,

    /// Event categories to subscribe to
    pub intents: Intents,

    /// `[shard_id, shard_count]`
    pub shard: ShardConfig,

    /// Client properties
    #[serde(default)]
    pub properties: IdentifyProperties,
}

/// Client connection properties
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentifyProperties {
    #[serde(rename = "$os", default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    #[serde(rename = "$browser", default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,

    #[serde(rename = "$device", default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

impl IdentifyProperties {
    /// Create empty properties
    #[must_use]
    pub fn new() -> Self {
        Self {
            os: None,
            browser: None,
            device: None,
        }
    }

    /// Properties describing this process
    #[must_use]
    pub fn current() -> Self {
        Self::new()
            .with_os(std::env::consts::OS)
            .with_browser(env!("CARGO_PKG_NAME"))
            .with_device(env!("CARGO_PKG_NAME"))
    }

    /// Set operating system
    #[must_use]
    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = Some(os.into());
        self
    }

    /// Set client library name
    #[must_use]
    pub fn with_browser(mut self, browser: impl Into<String>) -> Self {
        self.browser = Some(browser.into());
        self
    }

    /// Set device type
    #[must_use]
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }
}

impl Default for IdentifyProperties {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload for op 6 (Resume)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumePayload {
    /// Full authorization value
    pub token: String,

    /// Session ID to resume
    pub session_id: String,

    /// Last received sequence number
    pub seq: u32,
}
