//! Domain entities - objects carried by gateway events and REST calls

mod gateway;
mod message;
mod reaction;
mod user;

pub use gateway::{GatewayBootstrap, SessionStartLimit};
pub use message::{DirectMessage, DirectMessageToCreate, Message, MessageDelete, MessageToCreate};
pub use reaction::{Emoji, MessageReaction, ReactionTarget, ReactionTargetType};
pub use user::{Member, User};
