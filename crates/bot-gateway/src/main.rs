//! Bot gateway entry point
//!
//! Run with:
//! ```bash
//! cargo run -p bot-gateway
//! ```
//!
//! Configuration is loaded from environment variables. Replies "pong" to any
//! @-message whose text is "ping". SIGHUP makes every shard resume on a fresh
//! connection.

use bot_api::{GatewayApi, HttpApiClient};
use bot_common::{try_init_tracing_with_config, AppConfig, AppError, AppResult, TracingConfig};
use bot_core::MessageToCreate;
use bot_gateway::{register_handlers, Handler, ResumeTrigger, SessionManager};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(AppError::from(e).exit_code());
        }
    };

    // Initialize tracing
    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(config).await {
        error!(error = %e, code = e.error_code(), "Gateway stopped");
        std::process::exit(e.exit_code());
    }
}

async fn run(config: AppConfig) -> AppResult<()> {
    info!(
        app = %config.app.name,
        env = ?config.app.env,
        app_id = config.bot.app_id,
        api = %config.api.base_url,
        "Starting bot gateway..."
    );

    let api = Arc::new(HttpApiClient::from_config(&config.api, config.bot.token.clone())?);
    let (registry, intents) = register_handlers(handlers(api.clone()));
    info!(intents = %intents, "Handlers registered");

    let manager = SessionManager::new(registry, config.gateway.clone());
    spawn_hangup_listener(manager.resume_trigger());

    bot_gateway::run(&*api, &manager, &config.bot.token, intents).await
}

fn handlers(api: Arc<HttpApiClient>) -> Vec<Handler> {
    vec![
        Handler::ready(|ctx, ready| {
            info!(
                shard = %ctx.shard,
                session = %ready.session_id,
                bot = %ready.user.username,
                "Bot ready"
            );
        }),
        Handler::error_notify(|err| warn!(error = %err, "Shard error")),
        Handler::at_message(move |ctx, message| {
            let api = api.clone();
            async move {
                if message.plain_content() != "ping" {
                    return Ok(());
                }
                let mut reply = MessageToCreate::text("pong").reply_to(message.id.clone());
                if let Some(event_id) = ctx.event_id {
                    reply = reply.with_event_id(event_id);
                }
                api.post_message(&message.channel_id, &reply).await?;
                Ok(())
            }
        }),
    ]
}

#[cfg(unix)]
fn spawn_hangup_listener(trigger: ResumeTrigger) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(hangup) => hangup,
            Err(e) => {
                warn!(error = %e, "SIGHUP handler unavailable; force resume disabled");
                return;
            }
        };
        while hangup.recv().await.is_some() {
            info!("SIGHUP received");
            trigger.trigger();
        }
    });
}

#[cfg(not(unix))]
fn spawn_hangup_listener(_trigger: ResumeTrigger) {}
