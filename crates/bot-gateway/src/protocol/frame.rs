//! Decoded inbound frames

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{GatewayMessage, OpCode};
use crate::events::EventType;

/// One inbound frame, decoded once and never mutated
///
/// The typed payload is produced on demand from `d`; `raw` keeps the original
/// text for logging.
#[derive(Debug, Clone)]
pub struct FrameEnvelope {
    pub op: OpCode,
    pub s: Option<u32>,
    pub t: Option<String>,
    pub id: Option<String>,
    pub d: Option<Value>,
    pub raw: String,
}

impl FrameEnvelope {
    /// Decode a text frame
    ///
    /// Fails on invalid JSON and on unknown op codes.
    pub fn parse(raw: impl Into<String>) -> Result<Self, serde_json::Error> {
        let raw = raw.into();
        let message = GatewayMessage::from_json(&raw)?;
        Ok(Self {
            op: message.op,
            s: message.s,
            t: message.t,
            id: message.id,
            d: message.d,
            raw,
        })
    }

    /// Decode a binary frame holding UTF-8 JSON
    pub fn parse_bytes(raw: &[u8]) -> Result<Self, FrameError> {
        let text = std::str::from_utf8(raw).map_err(|_| FrameError::NotUtf8)?;
        Ok(Self::parse(text)?)
    }

    /// Decode `d` into a typed payload; a missing `d` decodes as JSON `null`
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.d {
            Some(d) => T::deserialize(d),
            None => T::deserialize(Value::Null),
        }
    }

    /// Dispatch event type, if `t` names one this client knows
    pub fn event_type(&self) -> Option<EventType> {
        self.t.as_deref().and_then(EventType::from_str)
    }

    #[inline]
    pub fn is_dispatch(&self) -> bool {
        self.op == OpCode::Dispatch
    }

    /// Sequence number, ignoring the zero value the server uses for "none"
    pub fn sequence(&self) -> Option<u32> {
        self.s.filter(|&s| s > 0)
    }
}

/// Frame decoding errors
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("binary frame is not valid UTF-8")]
    NotUtf8,

    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
}
