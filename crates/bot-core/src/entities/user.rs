//! User and guild member entities

use serde::{Deserialize, Serialize};

/// A user account, human or bot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub username: String,
    pub avatar: String,
    pub bot: bool,
    /// Open id in an associated application
    #[serde(skip_serializing_if = "Option::is_none")]
    pub union_openid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub union_user_account: Option<String>,
}

impl User {
    /// Create a user with the given id and name
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            ..Self::default()
        }
    }
}

/// A user's membership in a guild
///
/// Gateway events carry a partial member: `user` is absent when the
/// member is attached to a message that already has an author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Member {
    pub guild_id: String,
    pub joined_at: String,
    pub nick: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op_user_id: Option<String>,
}

impl Member {
    /// Get display name (nickname if set, otherwise fallback)
    pub fn display_name<'a>(&'a self, username: &'a str) -> &'a str {
        if self.nick.is_empty() {
            username
        } else {
            &self.nick
        }
    }

    /// Check if member has a specific role
    #[inline]
    pub fn has_role(&self, role_id: &str) -> bool {
        self.roles.iter().any(|r| r == role_id)
    }
}
