//! Shard session state

mod descriptor;

pub use descriptor::{ResumeState, ShardDescriptor};
