//! Gateway connection supervisor
//!
//! Owns the shard pool, throttles shard starts and restarts every shard that
//! ends.

mod manager;
mod pool;
mod resume;
mod status;
mod throttle;

pub use manager::SessionManager;
pub use pool::{PoolHandle, ShardPool};
pub use resume::ResumeTrigger;
pub use status::{ShardState, ShardStatus, ShardStatusTable};
pub use throttle::start_interval;
