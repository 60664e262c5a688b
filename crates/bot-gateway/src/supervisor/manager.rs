//! Session manager
//!
//! Seeds one descriptor per shard, then drains the pool forever: every
//! descriptor popped is started after the global start interval, and every
//! shard that ends goes back into the pool.

use bot_common::GatewayConfig;
use bot_core::{GatewayBootstrap, Intents, ShardConfig, Token};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;

use super::pool::{PoolHandle, ShardPool};
use super::resume::ResumeTrigger;
use super::status::{ShardState, ShardStatusTable};
use super::throttle::start_interval;
use crate::client::{ClientContext, ProtocolClient, ShardExit};
use crate::dispatch::EventRouter;
use crate::error::{panic_message, GatewayError, GatewayResult};
use crate::handlers::HandlerRegistry;
use crate::shard::{ResumeState, ShardDescriptor};

/// Supervises every shard of one bot
#[derive(Debug)]
pub struct SessionManager {
    registry: Arc<HandlerRegistry>,
    router: Arc<EventRouter>,
    config: GatewayConfig,
    status: ShardStatusTable,
    resume: ResumeTrigger,
}

impl SessionManager {
    pub fn new(registry: HandlerRegistry, config: GatewayConfig) -> Self {
        let router = EventRouter::new(&registry);
        Self {
            registry: Arc::new(registry),
            router: Arc::new(router),
            config,
            status: ShardStatusTable::new(),
            resume: ResumeTrigger::new(),
        }
    }

    /// Live status of every shard
    pub fn status(&self) -> ShardStatusTable {
        self.status.clone()
    }

    /// Trigger that makes every listening shard resume on a new connection
    pub fn resume_trigger(&self) -> ResumeTrigger {
        self.resume.clone()
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    fn client_context(&self) -> ClientContext {
        ClientContext {
            registry: self.registry.clone(),
            router: self.router.clone(),
            config: self.config.clone(),
            status: self.status.clone(),
            resume: self.resume.clone(),
        }
    }

    /// Connect every shard and keep them connected
    ///
    /// Returns only when the bootstrap has no shards or the gateway rejects a
    /// shard with a fatal close code.
    pub async fn start(
        &self,
        bootstrap: &GatewayBootstrap,
        token: &Token,
        intents: Intents,
    ) -> GatewayResult<()> {
        if bootstrap.shards == 0 {
            return Err(GatewayError::NoShards);
        }

        let interval = start_interval(bootstrap.max_concurrency(), self.config.concurrency_window);
        tracing::info!(
            url = %bootstrap.url,
            shards = bootstrap.shards,
            max_concurrency = bootstrap.max_concurrency(),
            interval_ms = interval.as_millis(),
            intents = %intents,
            "Starting gateway sessions"
        );

        let mut pool = ShardPool::new(bootstrap.shards as usize);
        let descriptors = ShardConfig::all(bootstrap.shards).map(|shard| {
            self.status.register(shard);
            ShardDescriptor::new(bootstrap.url.clone(), token.clone(), intents, shard)
        });
        if let Err(rejected) = pool.seed(descriptors) {
            tracing::error!(shard = %rejected.shard, "Shard pool overflow while seeding");
            return Err(GatewayError::NoShards);
        }

        let handle = pool.handle();
        let mut running = JoinSet::new();

        loop {
            tokio::select! {
                Some(descriptor) = pool.next() => {
                    tokio::time::sleep(interval).await;
                    running.spawn(run_and_report(descriptor, self.client_context(), handle.clone()));
                }
                Some(joined) = running.join_next() => {
                    match joined {
                        Ok(Some(fatal)) => return Err(fatal),
                        Ok(None) => {}
                        Err(err) => tracing::error!(error = %err, "Shard task failed"),
                    }
                }
                else => return Ok(()),
            }
        }
    }
}

/// Run one shard to completion and return its descriptor to the pool
async fn run_and_report(
    descriptor: ShardDescriptor,
    ctx: ClientContext,
    pool: PoolHandle,
) -> Option<GatewayError> {
    let fallback = descriptor.clone();
    let client = ProtocolClient::new(descriptor, ctx.clone());
    let latest = client.resume_state();
    report(client.run(), fallback, latest, &ctx, pool).await
}

/// Await a shard run and requeue whatever it leaves behind
///
/// A panic escaping the run is logged and the descriptor is rebuilt from the
/// latest resume snapshot. Every exit except a fatal one is requeued.
async fn report<F>(
    run: F,
    mut fallback: ShardDescriptor,
    latest: watch::Receiver<ResumeState>,
    ctx: &ClientContext,
    pool: PoolHandle,
) -> Option<GatewayError>
where
    F: Future<Output = ShardExit>,
{
    let exit = match AssertUnwindSafe(run).catch_unwind().await {
        Ok(exit) => exit,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(shard = %fallback, panic = %message, "Shard panicked");
            let err = GatewayError::Panic(message);
            ctx.registry.notify_error(&err);
            ctx.status.record_error(fallback.shard, &err);
            fallback.restore(&latest.borrow());
            ShardExit::Requeue(fallback)
        }
    };

    match exit {
        ShardExit::Requeue(descriptor) => {
            ctx.status.transition(descriptor.shard, ShardState::Disconnected);
            tracing::debug!(shard = %descriptor, "Requeueing shard");
            pool.requeue(descriptor).await;
            None
        }
        ShardExit::Fatal { descriptor, code } => Some(GatewayError::Fatal {
            shard: descriptor.shard,
            code,
        }),
    }
}
