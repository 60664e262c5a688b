//! User callbacks
//!
//! Handlers are registered once at startup and shared read-only by every
//! shard.

mod registry;

pub use registry::{
    register_handlers, DispatchContext, ErrorNotifyHandler, EventHandler, Handler,
    HandlerFuture, HandlerRegistry, ReadyHandler,
};
