//! Reaction entities

use serde::{Deserialize, Serialize};

/// Kind of object a reaction is attached to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ReactionTargetType {
    #[default]
    Message,
    Post,
    Comment,
    Reply,
    Unknown(u8),
}

impl From<u8> for ReactionTargetType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Message,
            1 => Self::Post,
            2 => Self::Comment,
            3 => Self::Reply,
            other => Self::Unknown(other),
        }
    }
}

impl From<ReactionTargetType> for u8 {
    fn from(value: ReactionTargetType) -> Self {
        match value {
            ReactionTargetType::Message => 0,
            ReactionTargetType::Post => 1,
            ReactionTargetType::Comment => 2,
            ReactionTargetType::Reply => 3,
            ReactionTargetType::Unknown(other) => other,
        }
    }
}

/// Object a reaction is attached to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionTarget {
    pub id: String,
    #[serde(rename = "type")]
    pub target_type: ReactionTargetType,
}

/// Emoji used in a reaction
///
/// `emoji_type` 1 is a system emoji, 2 is a unicode emoji.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Emoji {
    pub id: String,
    #[serde(rename = "type")]
    pub emoji_type: u32,
}

/// A reaction added to or removed from a message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageReaction {
    pub user_id: String,
    pub channel_id: String,
    pub guild_id: String,
    pub target: ReactionTarget,
    pub emoji: Emoji,
}
