//! Per-shard session state
//!
//! A descriptor is everything needed to (re)open one shard's connection. It is
//! held by exactly one owner at a time: the supervisor pool while queued, the
//! protocol client while running.

use bot_core::{Intents, ShardConfig, Token};
use std::fmt;

use crate::events::ReadyEvent;
use crate::protocol::{GatewayMessage, IdentifyPayload, IdentifyProperties, ResumePayload};

/// Session state of one shard
#[derive(Debug, Clone)]
pub struct ShardDescriptor {
    /// Set by READY; `None` means the next handshake is an Identify
    pub session_id: Option<String>,
    pub url: String,
    pub token: Token,
    pub intents: Intents,
    /// Highest sequence number seen on this session
    pub last_sequence: u32,
    pub shard: ShardConfig,
}

/// The resumable part of a descriptor, published while a shard runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeState {
    pub session_id: Option<String>,
    pub last_sequence: u32,
    pub shard: ShardConfig,
}

impl ShardDescriptor {
    /// Descriptor for a shard that has never connected
    pub fn new(url: impl Into<String>, token: Token, intents: Intents, shard: ShardConfig) -> Self {
        Self {
            session_id: None,
            url: url.into(),
            token,
            intents,
            last_sequence: 0,
            shard,
        }
    }

    /// Whether the next handshake resumes a session
    #[inline]
    pub fn is_resumable(&self) -> bool {
        self.session_id.is_some()
    }

    /// Build the handshake frame: Resume when a session exists, Identify otherwise
    pub fn handshake(&self) -> Result<GatewayMessage, serde_json::Error> {
        match &self.session_id {
            Some(session_id) => GatewayMessage::resume(&ResumePayload {
                token: self.token.authorization(),
                session_id: session_id.clone(),
                seq: self.last_sequence,
            }),
            None => GatewayMessage::identify(&IdentifyPayload {
                token: self.token.authorization(),
                intents: self.intents.or_fallback(),
                shard: self.shard,
                properties: IdentifyProperties::current(),
            }),
        }
    }

    /// Record a frame's sequence number; zero and stale values are ignored
    pub fn observe_sequence(&mut self, seq: Option<u32>) {
        if let Some(seq) = seq {
            if seq > self.last_sequence {
                self.last_sequence = seq;
            }
        }
    }

    /// Adopt the session id and shard numbering announced by READY
    pub fn apply_ready(&mut self, ready: &ReadyEvent) {
        self.session_id = Some(ready.session_id.clone());
        if let Some(shard) = ready.shard {
            self.shard = shard;
        }
    }

    /// Forget the session so the next handshake identifies again
    pub fn reset_session(&mut self) {
        self.session_id = None;
        self.last_sequence = 0;
    }

    /// Snapshot of the resumable state
    #[must_use]
    pub fn resume_state(&self) -> ResumeState {
        ResumeState {
            session_id: self.session_id.clone(),
            last_sequence: self.last_sequence,
            shard: self.shard,
        }
    }

    /// Overwrite the resumable state from a snapshot
    pub fn restore(&mut self, state: &ResumeState) {
        self.session_id.clone_from(&state.session_id);
        self.last_sequence = state.last_sequence;
        self.shard = state.shard;
    }
}

impl fmt::Display for ShardDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ws][ID:{}][Shard:({}/{})][Intent:{}]",
            self.session_id.as_deref().unwrap_or(""),
            self.shard.shard_id,
            self.shard.shard_count,
            self.intents
        )
    }
}
