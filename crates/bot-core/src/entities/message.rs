//! Message entities - inbound messages and outbound message requests

use serde::{Deserialize, Serialize};

use super::user::{Member, User};

/// A message posted in a guild channel or a direct-message session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub guild_id: String,
    pub content: String,
    pub timestamp: String,
    pub edited_timestamp: String,
    pub mention_everyone: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<Member>,
    pub mentions: Vec<User>,
    /// Guild the direct-message session was opened from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_guild_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

impl Message {
    /// Check if message has been edited
    #[inline]
    pub fn is_edited(&self) -> bool {
        !self.edited_timestamp.is_empty()
    }

    /// Id of the author, if present
    pub fn author_id(&self) -> Option<&str> {
        self.author.as_ref().map(|a| a.id.as_str())
    }

    /// Check whether `user_id` is @-mentioned
    pub fn mentions_user(&self, user_id: &str) -> bool {
        self.mentions.iter().any(|u| u.id == user_id)
    }

    /// Content with leading `<@!id>` mention tags removed and whitespace trimmed
    ///
    /// At-messages always start with the bot's mention tag.
    pub fn plain_content(&self) -> &str {
        let mut rest = self.content.trim_start();
        while rest.starts_with("<@") {
            match rest.find('>') {
                Some(end) => rest = rest[end + 1..].trim_start(),
                None => break,
            }
        }
        rest.trim_end()
    }
}

/// A deleted message and the user who deleted it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageDelete {
    pub message: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op_user: Option<User>,
}

/// A direct-message session between the bot and one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectMessage {
    pub guild_id: String,
    pub channel_id: String,
    pub create_time: String,
}

/// Request body for opening a direct-message session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMessageToCreate {
    pub source_guild_id: String,
    pub recipient_id: String,
}

/// Request body for posting a message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageToCreate {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    /// Message being replied to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg_id: Option<String>,
    /// Event being replied to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl MessageToCreate {
    /// Plain text message
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Mark this message as a passive reply to `msg_id`
    #[must_use]
    pub fn reply_to(mut self, msg_id: impl Into<String>) -> Self {
        self.msg_id = Some(msg_id.into());
        self
    }

    #[must_use]
    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    #[must_use]
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image = url.into();
        self
    }
}
