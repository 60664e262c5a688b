//! Event payload definitions

use bot_core::{Message, MessageDelete, MessageReaction, ShardConfig, User};
use serde::{Deserialize, Serialize};

use super::EventType;

/// READY event payload
///
/// Sent after successful Identify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyEvent {
    /// Gateway protocol version
    #[serde(default)]
    pub version: u32,

    /// Session ID for resuming
    pub session_id: String,

    /// The bot user
    #[serde(default)]
    pub user: User,

    /// Authoritative `[shard_id, shard_count]` for this connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard: Option<ShardConfig>,
}

/// A decoded dispatch event
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    Ready(ReadyEvent),
    Resumed,
    MessageCreate(Message),
    AtMessageCreate(Message),
    PublicMessageDelete(MessageDelete),
    DirectMessageCreate(Message),
    MessageReactionAdd(MessageReaction),
    MessageReactionRemove(MessageReaction),
}

impl GatewayEvent {
    /// The event type this payload was decoded as
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Ready(_) => EventType::Ready,
            Self::Resumed => EventType::Resumed,
            Self::MessageCreate(_) => EventType::MessageCreate,
            Self::AtMessageCreate(_) => EventType::AtMessageCreate,
            Self::PublicMessageDelete(_) => EventType::PublicMessageDelete,
            Self::DirectMessageCreate(_) => EventType::DirectMessageCreate,
            Self::MessageReactionAdd(_) => EventType::MessageReactionAdd,
            Self::MessageReactionRemove(_) => EventType::MessageReactionRemove,
        }
    }

    /// The message carried by message-creating events
    #[must_use]
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::MessageCreate(m) | Self::AtMessageCreate(m) | Self::DirectMessageCreate(m) => {
                Some(m)
            }
            _ => None,
        }
    }

    /// Take the message out of message-creating events
    #[must_use]
    pub fn into_message(self) -> Option<Message> {
        match self {
            Self::MessageCreate(m) | Self::AtMessageCreate(m) | Self::DirectMessageCreate(m) => {
                Some(m)
            }
            _ => None,
        }
    }
}
