//! WebSocket close codes
//!
//! Close codes the gateway sends when it terminates a connection, and what the
//! client does about each of them.

use std::fmt;

/// What happens to a shard after its connection ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseDisposition {
    /// Reconnect and resume the same session
    Resume,
    /// Reconnect with a fresh Identify
    Reidentify,
    /// Stop the whole supervisor; retrying cannot succeed
    Fatal,
}

/// Gateway WebSocket close codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseCode {
    /// Invalid opcode sent
    InvalidOpcode,
    /// Invalid payload sent
    InvalidPayload,
    /// Invalid token
    AuthenticationFailed,
    /// Session id is no longer valid
    InvalidSessionId,
    /// Resume sequence is invalid
    InvalidSequence,
    /// Frames sent too fast
    RateLimited,
    /// Session expired
    SessionTimeout,
    /// Invalid shard numbering
    InvalidShard,
    /// Too many guilds for the shard count
    TooManyGuilds,
    /// Invalid protocol version
    InvalidVersion,
    /// Invalid intent
    InvalidIntent,
    /// Intent not permitted for this bot
    IntentNotPermitted,
    /// Server-side failure, 4900..=4913
    InternalError(u16),
    /// Bot is offline
    BotOffline,
    /// Bot is banned
    BotBanned,
    /// Any other code, including the standard 1000-range codes
    Other(u16),
}

impl CloseCode {
    /// Create a `CloseCode` from a raw u16 value
    #[must_use]
    pub fn from_u16(value: u16) -> Self {
        match value {
            4001 => Self::InvalidOpcode,
            4002 => Self::InvalidPayload,
            4004 => Self::AuthenticationFailed,
            4006 => Self::InvalidSessionId,
            4007 => Self::InvalidSequence,
            4008 => Self::RateLimited,
            4009 => Self::SessionTimeout,
            4010 => Self::InvalidShard,
            4011 => Self::TooManyGuilds,
            4012 => Self::InvalidVersion,
            4013 => Self::InvalidIntent,
            4014 => Self::IntentNotPermitted,
            4900..=4913 => Self::InternalError(value),
            4914 => Self::BotOffline,
            4915 => Self::BotBanned,
            other => Self::Other(other),
        }
    }

    /// Get the raw u16 value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::InvalidOpcode => 4001,
            Self::InvalidPayload => 4002,
            Self::AuthenticationFailed => 4004,
            Self::InvalidSessionId => 4006,
            Self::InvalidSequence => 4007,
            Self::RateLimited => 4008,
            Self::SessionTimeout => 4009,
            Self::InvalidShard => 4010,
            Self::TooManyGuilds => 4011,
            Self::InvalidVersion => 4012,
            Self::InvalidIntent => 4013,
            Self::IntentNotPermitted => 4014,
            Self::InternalError(code) | Self::Other(code) => code,
            Self::BotOffline => 4914,
            Self::BotBanned => 4915,
        }
    }

    /// Decide how the shard continues after this close code
    #[must_use]
    pub const fn disposition(self) -> CloseDisposition {
        match self {
            Self::InvalidSessionId | Self::InvalidSequence => CloseDisposition::Reidentify,
            Self::AuthenticationFailed
            | Self::InvalidShard
            | Self::TooManyGuilds
            | Self::InvalidVersion
            | Self::InvalidIntent
            | Self::IntentNotPermitted
            | Self::BotOffline
            | Self::BotBanned => CloseDisposition::Fatal,
            Self::InvalidOpcode
            | Self::InvalidPayload
            | Self::RateLimited
            | Self::SessionTimeout
            | Self::InternalError(_)
            | Self::Other(_) => CloseDisposition::Resume,
        }
    }

    /// Get the description for this close code
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidOpcode => "Invalid opcode",
            Self::InvalidPayload => "Invalid payload",
            Self::AuthenticationFailed => "Authentication failed",
            Self::InvalidSessionId => "Invalid session id",
            Self::InvalidSequence => "Invalid sequence number",
            Self::RateLimited => "Rate limited",
            Self::SessionTimeout => "Session timed out",
            Self::InvalidShard => "Invalid shard",
            Self::TooManyGuilds => "Too many guilds for shard count",
            Self::InvalidVersion => "Invalid version",
            Self::InvalidIntent => "Invalid intent",
            Self::IntentNotPermitted => "Intent not permitted",
            Self::InternalError(_) => "Internal server error",
            Self::BotOffline => "Bot is offline",
            Self::BotBanned => "Bot is banned",
            Self::Other(_) => "Connection closed",
        }
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_u16())
    }
}

impl From<u16> for CloseCode {
    fn from(value: u16) -> Self {
        Self::from_u16(value)
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}
