//! Shard descriptor pool
//!
//! Bounded queue holding every descriptor that is waiting to (re)connect.
//! Capacity equals the shard count, so returning a descriptor never waits.

use tokio::sync::mpsc;

use crate::shard::ShardDescriptor;

/// Consumer side, owned by the supervisor's drain loop
#[derive(Debug)]
pub struct ShardPool {
    tx: mpsc::Sender<ShardDescriptor>,
    rx: mpsc::Receiver<ShardDescriptor>,
}

/// Producer side, held by running shards to return their descriptor
#[derive(Debug, Clone)]
pub struct PoolHandle {
    tx: mpsc::Sender<ShardDescriptor>,
}

impl ShardPool {
    /// Create a pool for `capacity` shards
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self { tx, rx }
    }

    /// Queue freshly created descriptors; fails if the pool is full
    pub fn seed<I>(&self, descriptors: I) -> Result<(), ShardDescriptor>
    where
        I: IntoIterator<Item = ShardDescriptor>,
    {
        for descriptor in descriptors {
            self.tx.try_send(descriptor).map_err(|e| e.into_inner())?;
        }
        Ok(())
    }

    pub fn handle(&self) -> PoolHandle {
        PoolHandle { tx: self.tx.clone() }
    }

    /// Next descriptor waiting to connect
    pub async fn next(&mut self) -> Option<ShardDescriptor> {
        self.rx.recv().await
    }

    /// Number of descriptors currently queued
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl PoolHandle {
    /// Return a descriptor to the pool
    pub async fn requeue(&self, descriptor: ShardDescriptor) {
        let shard = descriptor.shard;
        if self.tx.send(descriptor).await.is_err() {
            tracing::warn!(shard = %shard, "Shard pool closed; descriptor dropped");
        }
    }
}
