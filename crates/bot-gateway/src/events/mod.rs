//! Gateway events
//!
//! Dispatch event types and their decoded payloads.

mod event_types;
mod payloads;

pub use event_types::EventType;
pub use payloads::{GatewayEvent, ReadyEvent};
