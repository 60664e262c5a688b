//! Gateway protocol definitions
//!
//! Defines the WebSocket protocol including op codes, message formats, and close codes.

mod close_codes;
mod frame;
mod messages;
mod opcodes;
mod payloads;

pub use close_codes::{CloseCode, CloseDisposition};
pub use frame::{FrameEnvelope, FrameError};
pub use messages::GatewayMessage;
pub use opcodes::OpCode;
pub use payloads::{HelloPayload, IdentifyPayload, IdentifyProperties, ResumePayload};
