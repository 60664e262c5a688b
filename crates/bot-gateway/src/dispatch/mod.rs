//! Event dispatch

mod router;

pub use router::EventRouter;
