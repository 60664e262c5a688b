//! Shard numbering

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of one connection within the shard set
///
/// Serialized as the two-element array `[shard_id, shard_count]` used by
/// Identify and Ready payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct ShardConfig {
    pub shard_id: u32,
    pub shard_count: u32,
}

impl ShardConfig {
    /// Create a validated shard config
    pub fn new(shard_id: u32, shard_count: u32) -> Result<Self, DomainError> {
        if shard_count == 0 {
            return Err(DomainError::ZeroShardCount);
        }
        if shard_id >= shard_count {
            return Err(DomainError::ShardOutOfRange {
                shard_id,
                shard_count,
            });
        }
        Ok(Self {
            shard_id,
            shard_count,
        })
    }

    /// Configs for every shard in `[0, shard_count)`
    pub fn all(shard_count: u32) -> impl Iterator<Item = ShardConfig> {
        (0..shard_count).map(move |shard_id| Self {
            shard_id,
            shard_count,
        })
    }
}

impl From<[u32; 2]> for ShardConfig {
    fn from([shard_id, shard_count]: [u32; 2]) -> Self {
        Self {
            shard_id,
            shard_count,
        }
    }
}

impl From<ShardConfig> for [u32; 2] {
    fn from(shard: ShardConfig) -> Self {
        [shard.shard_id, shard.shard_count]
    }
}

impl fmt::Display for ShardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.shard_id, self.shard_count)
    }
}
