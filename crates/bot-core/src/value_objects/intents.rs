//! Gateway intent bitflags
//!
//! An intent tells the gateway which event categories a connection wants delivered.
//! The mask is declared once per shard during Identify.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Event categories a shard subscribes to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Intents: u32 {
        /// Guild create/update/delete
        const GUILDS                  = 1 << 0;
        /// Guild member add/update/remove
        const GUILD_MEMBERS           = 1 << 1;
        /// Every message in guild channels (private bots only)
        const GUILD_MESSAGES          = 1 << 9;
        /// Reactions on guild messages
        const GUILD_MESSAGE_REACTIONS = 1 << 10;
        /// Direct messages to the bot
        const DIRECT_MESSAGE          = 1 << 12;
        /// Messages that @-mention the bot, and their deletion
        const PUBLIC_GUILD_MESSAGES   = 1 << 30;
    }
}

impl Intents {
    /// Intent requested when no handler implies one
    ///
    /// The gateway rejects an Identify that carries an empty mask.
    pub const FALLBACK: Intents = Intents::GUILDS;

    /// Combine several intent sets into one
    pub fn combine<I>(intents: I) -> Self
    where
        I: IntoIterator<Item = Intents>,
    {
        intents.into_iter().fold(Intents::empty(), |acc, i| acc | i)
    }

    /// The mask to present during Identify
    #[must_use]
    pub fn or_fallback(self) -> Self {
        if self.is_empty() {
            Self::FALLBACK
        } else {
            self
        }
    }

    /// Names of the set flags, for logs
    pub fn names(&self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

impl Default for Intents {
    fn default() -> Self {
        Intents::empty()
    }
}

impl fmt::Display for Intents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

// Serialized as a plain integer on the wire
impl Serialize for Intents {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for Intents {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(Intents::from_bits_truncate(bits))
    }
}

impl From<u32> for Intents {
    fn from(bits: u32) -> Self {
        Intents::from_bits_truncate(bits)
    }
}

impl From<Intents> for u32 {
    fn from(intents: Intents) -> Self {
        intents.bits()
    }
}
