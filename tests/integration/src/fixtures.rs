//! Test fixtures and data generators
//!
//! Provides reusable credentials, gateway configs and event payloads.

use std::time::Duration;

use bot_common::GatewayConfig;
use bot_core::{GatewayBootstrap, Intents, Token};
use bot_gateway::{GatewayResult, HandlerRegistry, ResumeTrigger, SessionManager, ShardStatusTable};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

pub const TEST_APP_ID: u64 = 1024;
pub const TEST_SECRET: &str = "integration-secret";

/// Authorization value the mock gateway expects
pub const TEST_AUTHORIZATION: &str = "Bot 1024.integration-secret";

pub fn test_token() -> Token {
    Token::bot(TEST_APP_ID, TEST_SECRET).expect("valid test token")
}

/// Gateway config with short timeouts
///
/// The one-second window keeps the start interval at its one-second floor.
pub fn fast_config() -> GatewayConfig {
    GatewayConfig {
        connect_timeout: Duration::from_secs(2),
        queue_size: 64,
        default_heartbeat: Duration::from_secs(45),
        concurrency_window: Duration::from_secs(1),
        zombie_detection: true,
        drain_timeout: Duration::from_secs(1),
    }
}

pub fn bootstrap(url: &str, shards: u32, max_concurrency: u32) -> GatewayBootstrap {
    GatewayBootstrap::new(url, shards, max_concurrency)
}

/// A supervisor running in the background
pub struct RunningGateway {
    pub status: ShardStatusTable,
    pub resume: ResumeTrigger,
    pub handle: JoinHandle<GatewayResult<()>>,
}

impl RunningGateway {
    /// Start a supervisor for `bootstrap` with the given handlers
    pub fn spawn(
        registry: HandlerRegistry,
        intents: Intents,
        config: GatewayConfig,
        bootstrap: GatewayBootstrap,
    ) -> Self {
        let manager = SessionManager::new(registry, config);
        let status = manager.status();
        let resume = manager.resume_trigger();
        let token = test_token();

        let handle = tokio::spawn(async move { manager.start(&bootstrap, &token, intents).await });

        Self {
            status,
            resume,
            handle,
        }
    }
}

impl Drop for RunningGateway {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// AT_MESSAGE_CREATE payload
pub fn at_message(id: &str, content: &str) -> Value {
    json!({
        "id": id,
        "channel_id": "channel-1",
        "guild_id": "guild-1",
        "content": format!("<@!10000> {content}"),
        "timestamp": "2024-01-01T00:00:00+08:00",
        "author": {"id": "user-1", "username": "tester"},
        "member": {"roles": ["1"], "joined_at": "2023-06-01T00:00:00+08:00"},
        "seq": 1,
    })
}

/// MESSAGE_REACTION_ADD payload
pub fn reaction(user_id: &str, message_id: &str) -> Value {
    json!({
        "user_id": user_id,
        "channel_id": "channel-1",
        "guild_id": "guild-1",
        "target": {"id": message_id, "type": 0},
        "emoji": {"id": "4", "type": 1},
    })
}
