//! Per-shard protocol client

mod connection;
mod heartbeat;

pub use connection::{ClientContext, ProtocolClient, ShardExit};
pub use heartbeat::Heartbeat;
