//! Live shard status
//!
//! Every shard publishes its state transitions here so the embedding
//! application can observe the gateway without touching descriptors.

use bot_core::ShardConfig;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;

/// Connection state of one shard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardState {
    /// Queued in the pool
    Disconnected,
    /// Opening the WebSocket
    Connecting,
    /// Identify sent, waiting for READY
    Identifying,
    /// Resume sent, waiting for RESUMED
    Resuming,
    /// Session established, events flowing
    Listening,
    /// Connection torn down, descriptor about to be requeued
    Closed,
}

/// Snapshot of one shard
#[derive(Debug, Clone, Serialize)]
pub struct ShardStatus {
    pub shard: ShardConfig,
    pub state: ShardState,
    pub session_id: Option<String>,
    pub last_sequence: u32,
    /// Connection attempts since start
    pub attempts: u64,
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ShardStatus {
    fn new(shard: ShardConfig) -> Self {
        Self {
            shard,
            state: ShardState::Disconnected,
            session_id: None,
            last_sequence: 0,
            attempts: 0,
            last_error: None,
            updated_at: Utc::now(),
        }
    }
}

/// Shared table of shard statuses keyed by shard id
#[derive(Debug, Clone, Default)]
pub struct ShardStatusTable {
    shards: Arc<DashMap<u32, ShardStatus>>,
}

impl ShardStatusTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shard in the `Disconnected` state
    pub fn register(&self, shard: ShardConfig) {
        self.shards.insert(shard.shard_id, ShardStatus::new(shard));
    }

    fn update(&self, shard: ShardConfig, f: impl FnOnce(&mut ShardStatus)) {
        let mut entry = self
            .shards
            .entry(shard.shard_id)
            .or_insert_with(|| ShardStatus::new(shard));
        entry.shard = shard;
        f(&mut entry);
        entry.updated_at = Utc::now();
    }

    pub fn transition(&self, shard: ShardConfig, state: ShardState) {
        self.update(shard, |status| status.state = state);
        tracing::trace!(shard = %shard, state = ?state, "Shard state changed");
    }

    /// Count a new connection attempt and move to `Connecting`
    pub fn record_attempt(&self, shard: ShardConfig) {
        self.update(shard, |status| {
            status.attempts += 1;
            status.state = ShardState::Connecting;
        });
    }

    pub fn record_sequence(&self, shard: ShardConfig, seq: u32) {
        self.update(shard, |status| status.last_sequence = seq);
    }

    /// Session established; the shard is listening
    pub fn record_session(&self, shard: ShardConfig, session_id: &str) {
        self.update(shard, |status| {
            status.session_id = Some(session_id.to_string());
            status.state = ShardState::Listening;
        });
    }

    pub fn record_error(&self, shard: ShardConfig, error: impl ToString) {
        self.update(shard, |status| status.last_error = Some(error.to_string()));
    }

    pub fn get(&self, shard_id: u32) -> Option<ShardStatus> {
        self.shards.get(&shard_id).map(|entry| entry.clone())
    }

    /// Every shard, ordered by shard id
    pub fn snapshot(&self) -> Vec<ShardStatus> {
        let mut all: Vec<_> = self.shards.iter().map(|entry| entry.clone()).collect();
        all.sort_by_key(|status| status.shard.shard_id);
        all
    }

    /// Number of shards currently in `state`
    pub fn count_in(&self, state: ShardState) -> usize {
        self.shards.iter().filter(|entry| entry.state == state).count()
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }
}
