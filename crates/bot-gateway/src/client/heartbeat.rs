//! Heartbeat timer

use std::time::Duration;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Heartbeat schedule and acknowledgement tracking for one connection
#[derive(Debug)]
pub struct Heartbeat {
    interval: Interval,
    period: Duration,
    last_sent: Option<Instant>,
    last_ack: Option<Instant>,
    awaiting_ack: bool,
}

impl Heartbeat {
    /// First tick fires one full `period` from now
    pub fn new(period: Duration) -> Self {
        Self {
            interval: Self::schedule(period),
            period,
            last_sent: None,
            last_ack: None,
            awaiting_ack: false,
        }
    }

    fn schedule(period: Duration) -> Interval {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }

    /// Wait for the next heartbeat slot
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }

    /// Restart the schedule with a new period
    pub fn reset(&mut self, period: Duration) {
        self.period = period;
        self.interval = Self::schedule(period);
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn sent(&mut self) {
        self.last_sent = Some(Instant::now());
        self.awaiting_ack = true;
    }

    pub fn acked(&mut self) {
        self.last_ack = Some(Instant::now());
        self.awaiting_ack = false;
    }

    /// Whether the last heartbeat is still unacknowledged
    pub fn awaiting_ack(&self) -> bool {
        self.awaiting_ack
    }

    /// Round trip of the last acknowledged heartbeat
    pub fn latency(&self) -> Option<Duration> {
        match (self.last_sent, self.last_ack) {
            (Some(sent), Some(ack)) if ack >= sent => Some(ack - sent),
            _ => None,
        }
    }
}
