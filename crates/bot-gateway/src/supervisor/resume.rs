//! Force-resume trigger

use tokio::sync::broadcast;

/// Makes every listening shard drop its connection and resume
///
/// Shards that are not listening when the trigger fires are unaffected.
#[derive(Debug, Clone)]
pub struct ResumeTrigger {
    tx: broadcast::Sender<()>,
}

impl ResumeTrigger {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Fire the trigger; returns how many shards were listening for it
    pub fn trigger(&self) -> usize {
        let receivers = self.tx.send(()).unwrap_or(0);
        tracing::info!(shards = receivers, "Force resume triggered");
        receivers
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}

impl Default for ResumeTrigger {
    fn default() -> Self {
        Self::new()
    }
}
