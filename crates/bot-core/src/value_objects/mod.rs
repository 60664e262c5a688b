//! Value objects - immutable types that represent domain concepts

mod intents;
mod shard;
mod token;

pub use intents::Intents;
pub use shard::ShardConfig;
pub use token::{Token, TokenType};
