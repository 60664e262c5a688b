//! Event router
//!
//! Maps dispatch frames to the callback registered for their event type.

use bot_core::ShardConfig;
use std::collections::HashMap;

use crate::error::DispatchError;
use crate::events::EventType;
use crate::handlers::{DispatchContext, EventHandler, HandlerRegistry};
use crate::protocol::{FrameEnvelope, OpCode};

/// Routing table keyed by `(op, event type)`, built once from a registry
pub struct EventRouter {
    routes: HashMap<(OpCode, EventType), EventHandler>,
}

impl EventRouter {
    pub fn new(registry: &HandlerRegistry) -> Self {
        let routes = registry
            .event_types()
            .filter_map(|event_type| {
                registry
                    .event_handler(event_type)
                    .map(|handler| ((OpCode::Dispatch, event_type), handler.clone()))
            })
            .collect();

        Self { routes }
    }

    pub fn contains(&self, op: OpCode, event_type: EventType) -> bool {
        self.routes.contains_key(&(op, event_type))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Route one frame received on `shard`
    ///
    /// Unknown event types and frames without a route are ignored.
    pub async fn dispatch(
        &self,
        frame: &FrameEnvelope,
        shard: ShardConfig,
    ) -> Result<(), DispatchError> {
        let Some(event_type) = frame.event_type() else {
            if let Some(t) = frame.t.as_deref() {
                tracing::trace!(shard = %shard, event_type = t, "Unknown event type ignored");
            }
            return Ok(());
        };

        let Some(handler) = self.routes.get(&(frame.op, event_type)) else {
            return Ok(());
        };

        let event = event_type
            .decode(frame.d.as_ref())
            .map_err(|source| DispatchError::Decode { event_type, source })?;

        let ctx = DispatchContext::from_frame(frame, event_type, shard);
        handler(ctx, event)
            .await
            .map_err(|source| DispatchError::Handler { event_type, source })
    }
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("routes", &self.routes.len())
            .finish()
    }
}
