//! # bot-core
//!
//! Domain layer for the bot gateway client: credentials, intents, shard numbering,
//! and the entities carried by gateway events and the REST API.
//! This crate has zero dependencies on infrastructure (network, runtime, etc.).

pub mod entities;
pub mod error;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    DirectMessage, DirectMessageToCreate, GatewayBootstrap, Member, Message, MessageDelete,
    MessageReaction, MessageToCreate, ReactionTarget, ReactionTargetType, SessionStartLimit, User,
    Emoji,
};
pub use error::DomainError;
pub use value_objects::{Intents, ShardConfig, Token, TokenType};
