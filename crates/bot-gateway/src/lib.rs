//! # bot-gateway
//!
//! Sharded gateway client: keeps one WebSocket session per shard alive and
//! routes dispatch events to registered handlers.

pub mod client;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod handlers;
pub mod protocol;
pub mod shard;
pub mod supervisor;

pub use client::{ClientContext, ProtocolClient, ShardExit};
pub use dispatch::EventRouter;
pub use error::{DispatchError, GatewayError, GatewayResult};
pub use events::{EventType, GatewayEvent, ReadyEvent};
pub use handlers::{register_handlers, DispatchContext, Handler, HandlerRegistry};
pub use protocol::{CloseCode, CloseDisposition, FrameEnvelope, GatewayMessage, OpCode};
pub use shard::{ResumeState, ShardDescriptor};
pub use supervisor::{ResumeTrigger, SessionManager, ShardState, ShardStatus, ShardStatusTable};

use bot_api::GatewayApi;
use bot_common::AppResult;
use bot_core::{Intents, Token};

/// Fetch the gateway bootstrap and run every shard until a fatal error
pub async fn run(
    api: &dyn GatewayApi,
    manager: &SessionManager,
    token: &Token,
    intents: Intents,
) -> AppResult<()> {
    let bootstrap = api.gateway_bot().await?;
    tracing::info!(
        url = %bootstrap.url,
        shards = bootstrap.shards,
        remaining = bootstrap.session_start_limit.remaining,
        "Gateway bootstrap received"
    );

    manager.start(&bootstrap, token, intents).await?;
    Ok(())
}
