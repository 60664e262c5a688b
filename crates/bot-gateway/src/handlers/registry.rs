//! Handler registry
//!
//! One callback per role: the ready callback, the error-notify callback, and
//! one async callback per dispatch event type. The intents a bot must declare
//! are derived from the event slots that are filled.

use bot_core::{Intents, Message, ShardConfig};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::{panic_message, GatewayError};
use crate::events::{EventType, GatewayEvent, ReadyEvent};
use crate::protocol::FrameEnvelope;

/// Future returned by event callbacks
pub type HandlerFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Async callback for one dispatch event type
pub type EventHandler = Arc<dyn Fn(DispatchContext, GatewayEvent) -> HandlerFuture + Send + Sync>;

/// Callback invoked after READY has been applied to the shard
pub type ReadyHandler = Arc<dyn Fn(&DispatchContext, &ReadyEvent) + Send + Sync>;

/// Callback invoked for every shard-level error
pub type ErrorNotifyHandler = Arc<dyn Fn(&GatewayError) + Send + Sync>;

/// Where a dispatch event came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchContext {
    pub shard: ShardConfig,
    pub event_type: EventType,
    pub sequence: Option<u32>,
    /// Event id, passed back when replying to the event
    pub event_id: Option<String>,
}

impl DispatchContext {
    pub fn from_frame(frame: &FrameEnvelope, event_type: EventType, shard: ShardConfig) -> Self {
        Self {
            shard,
            event_type,
            sequence: frame.sequence(),
            event_id: frame.id.clone(),
        }
    }
}

/// A callback together with the role it fills
#[derive(Clone)]
pub enum Handler {
    Ready(ReadyHandler),
    ErrorNotify(ErrorNotifyHandler),
    Event(EventType, EventHandler),
}

impl Handler {
    pub fn ready<F>(f: F) -> Self
    where
        F: Fn(&DispatchContext, &ReadyEvent) + Send + Sync + 'static,
    {
        Self::Ready(Arc::new(f))
    }

    pub fn error_notify<F>(f: F) -> Self
    where
        F: Fn(&GatewayError) + Send + Sync + 'static,
    {
        Self::ErrorNotify(Arc::new(f))
    }

    /// Callback for any dispatch event type
    pub fn on<F, Fut>(event_type: EventType, f: F) -> Self
    where
        F: Fn(DispatchContext, GatewayEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::Event(
            event_type,
            Arc::new(move |ctx: DispatchContext, event: GatewayEvent| -> HandlerFuture {
                f(ctx, event).boxed()
            }),
        )
    }

    /// Callback for messages that @-mention the bot
    pub fn at_message<F, Fut>(f: F) -> Self
    where
        F: Fn(DispatchContext, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::message_slot(EventType::AtMessageCreate, f)
    }

    /// Callback for every guild message
    pub fn message<F, Fut>(f: F) -> Self
    where
        F: Fn(DispatchContext, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::message_slot(EventType::MessageCreate, f)
    }

    /// Callback for direct messages
    pub fn direct_message<F, Fut>(f: F) -> Self
    where
        F: Fn(DispatchContext, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::message_slot(EventType::DirectMessageCreate, f)
    }

    fn message_slot<F, Fut>(event_type: EventType, f: F) -> Self
    where
        F: Fn(DispatchContext, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::Event(
            event_type,
            Arc::new(move |ctx: DispatchContext, event: GatewayEvent| -> HandlerFuture {
                match event.into_message() {
                    Some(message) => f(ctx, message).boxed(),
                    None => futures::future::ready(Ok(())).boxed(),
                }
            }),
        )
    }

    fn role(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::ErrorNotify(_) => "error_notify",
            Self::Event(event_type, _) => event_type.as_str(),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.role()).finish()
    }
}

/// Registered callbacks, immutable once built
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    ready: Option<ReadyHandler>,
    error_notify: Option<ErrorNotifyHandler>,
    events: HashMap<EventType, EventHandler>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the handler's role; a role registered twice keeps the later callback
    pub fn register(&mut self, handler: Handler) {
        let role = handler.role();
        let replaced = match handler {
            Handler::Ready(f) => self.ready.replace(f).is_some(),
            Handler::ErrorNotify(f) => self.error_notify.replace(f).is_some(),
            Handler::Event(EventType::Ready, _) => {
                tracing::warn!("READY has a dedicated slot; use Handler::ready");
                return;
            }
            Handler::Event(event_type, f) => self.events.insert(event_type, f).is_some(),
        };

        if replaced {
            tracing::debug!(role, "Handler replaced");
        }
    }

    /// Intents needed to receive every registered event type
    #[must_use]
    pub fn intents(&self) -> Intents {
        self.events
            .keys()
            .fold(Intents::empty(), |acc, event_type| acc | event_type.intent())
    }

    pub fn ready(&self) -> Option<&ReadyHandler> {
        self.ready.as_ref()
    }

    pub fn error_notify(&self) -> Option<&ErrorNotifyHandler> {
        self.error_notify.as_ref()
    }

    pub fn event_handler(&self, event_type: EventType) -> Option<&EventHandler> {
        self.events.get(&event_type)
    }

    /// Registered event types
    pub fn event_types(&self) -> impl Iterator<Item = EventType> + '_ {
        self.events.keys().copied()
    }

    /// Pass an error to the error-notify callback, if any
    ///
    /// A panicking callback is logged and never unwinds into the caller.
    pub fn notify_error(&self, err: &GatewayError) {
        let Some(f) = &self.error_notify else {
            return;
        };
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| f(err))) {
            tracing::error!(
                error = %err,
                panic = %panic_message(payload.as_ref()),
                "Error-notify handler panicked"
            );
        }
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut events: Vec<_> = self.events.keys().map(|e| e.as_str()).collect();
        events.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("ready", &self.ready.is_some())
            .field("error_notify", &self.error_notify.is_some())
            .field("events", &events)
            .finish()
    }
}

/// Build a registry and the intents it needs
pub fn register_handlers<I>(handlers: I) -> (HandlerRegistry, Intents)
where
    I: IntoIterator<Item = Handler>,
{
    let mut registry = HandlerRegistry::new();
    for handler in handlers {
        registry.register(handler);
    }
    let intents = registry.intents();
    (registry, intents)
}
