//! Gateway event types
//!
//! Event names carried in the `t` field of dispatch frames, the intent each
//! one requires, and how its payload decodes.

use bot_core::Intents;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::{GatewayEvent, ReadyEvent};

/// Gateway event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    // Connection events
    /// Sent after successful Identify
    Ready,
    /// Sent after successful Resume
    Resumed,

    // Message events
    /// Any message in a guild channel
    MessageCreate,
    /// Message that @-mentions the bot
    AtMessageCreate,
    /// @-message deleted
    PublicMessageDelete,
    /// Direct message to the bot
    DirectMessageCreate,

    // Reaction events
    /// Reaction added
    MessageReactionAdd,
    /// Reaction removed
    MessageReactionRemove,
}

impl EventType {
    /// Every known event type
    pub const ALL: [EventType; 8] = [
        Self::Ready,
        Self::Resumed,
        Self::MessageCreate,
        Self::AtMessageCreate,
        Self::PublicMessageDelete,
        Self::DirectMessageCreate,
        Self::MessageReactionAdd,
        Self::MessageReactionRemove,
    ];

    /// Get the string representation of the event type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Resumed => "RESUMED",
            Self::MessageCreate => "MESSAGE_CREATE",
            Self::AtMessageCreate => "AT_MESSAGE_CREATE",
            Self::PublicMessageDelete => "PUBLIC_MESSAGE_DELETE",
            Self::DirectMessageCreate => "DIRECT_MESSAGE_CREATE",
            Self::MessageReactionAdd => "MESSAGE_REACTION_ADD",
            Self::MessageReactionRemove => "MESSAGE_REACTION_REMOVE",
        }
    }

    /// Parse an event type from a string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "READY" => Some(Self::Ready),
            "RESUMED" => Some(Self::Resumed),
            "MESSAGE_CREATE" => Some(Self::MessageCreate),
            "AT_MESSAGE_CREATE" => Some(Self::AtMessageCreate),
            "PUBLIC_MESSAGE_DELETE" => Some(Self::PublicMessageDelete),
            "DIRECT_MESSAGE_CREATE" => Some(Self::DirectMessageCreate),
            "MESSAGE_REACTION_ADD" => Some(Self::MessageReactionAdd),
            "MESSAGE_REACTION_REMOVE" => Some(Self::MessageReactionRemove),
            _ => None,
        }
    }

    /// Intent that must be declared to receive this event
    ///
    /// Connection events are always delivered and need none.
    #[must_use]
    pub const fn intent(self) -> Intents {
        match self {
            Self::Ready | Self::Resumed => Intents::empty(),
            Self::MessageCreate => Intents::GUILD_MESSAGES,
            Self::AtMessageCreate | Self::PublicMessageDelete => Intents::PUBLIC_GUILD_MESSAGES,
            Self::DirectMessageCreate => Intents::DIRECT_MESSAGE,
            Self::MessageReactionAdd | Self::MessageReactionRemove => {
                Intents::GUILD_MESSAGE_REACTIONS
            }
        }
    }

    /// Decode a dispatch payload of this type
    pub fn decode(self, d: Option<&Value>) -> Result<GatewayEvent, serde_json::Error> {
        fn typed<T: serde::de::DeserializeOwned>(d: Option<&Value>) -> Result<T, serde_json::Error> {
            match d {
                Some(value) => T::deserialize(value),
                None => T::deserialize(Value::Null),
            }
        }

        Ok(match self {
            Self::Ready => GatewayEvent::Ready(typed::<ReadyEvent>(d)?),
            Self::Resumed => GatewayEvent::Resumed,
            Self::MessageCreate => GatewayEvent::MessageCreate(typed(d)?),
            Self::AtMessageCreate => GatewayEvent::AtMessageCreate(typed(d)?),
            Self::PublicMessageDelete => GatewayEvent::PublicMessageDelete(typed(d)?),
            Self::DirectMessageCreate => GatewayEvent::DirectMessageCreate(typed(d)?),
            Self::MessageReactionAdd => GatewayEvent::MessageReactionAdd(typed(d)?),
            Self::MessageReactionRemove => GatewayEvent::MessageReactionRemove(typed(d)?),
        })
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<EventType> for String {
    fn from(event: EventType) -> Self {
        event.as_str().to_string()
    }
}
