//! Gateway Integration Tests
//!
//! Each test runs a scripted mock gateway on localhost and a real supervisor
//! connecting to it over WebSockets.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bot_api::HttpApiClient;
use bot_common::AppError;
use bot_core::{Intents, Message, MessageReaction, ShardConfig};
use bot_gateway::protocol::OpCode;
use bot_gateway::{
    register_handlers, CloseCode, DispatchContext, EventType, GatewayError, GatewayEvent, Handler,
    ReadyEvent, SessionManager, ShardState,
};
use integration_tests::{
    at_message, bootstrap, fast_config, reaction, test_token, Action, MockGateway,
    RunningGateway, TEST_AUTHORIZATION,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(10);

/// Handlers that forward ready and at-message events to channels
fn forwarding_handlers() -> (
    Vec<Handler>,
    mpsc::UnboundedReceiver<ReadyEvent>,
    mpsc::UnboundedReceiver<(DispatchContext, Message)>,
) {
    let (ready_tx, ready_rx) = mpsc::unbounded_channel();
    let (message_tx, message_rx) = mpsc::unbounded_channel();

    let handlers = vec![
        Handler::ready(move |_, ready| {
            let _ = ready_tx.send(ready.clone());
        }),
        Handler::at_message(move |ctx, message| {
            let tx = message_tx.clone();
            async move {
                let _ = tx.send((ctx, message));
                Ok(())
            }
        }),
    ];

    (handlers, ready_rx, message_rx)
}

async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("channel closed")
}

// ============================================================================
// Handshake & Dispatch Tests
// ============================================================================

#[tokio::test]
async fn test_identify_ready_and_at_message() {
    let mut gateway = MockGateway::builder()
        .script(vec![
            Action::ready_with("session-1"),
            Action::dispatch("AT_MESSAGE_CREATE", 2, at_message("m1", "ping")),
        ])
        .start()
        .await
        .unwrap();

    let (handlers, mut ready_rx, mut message_rx) = forwarding_handlers();
    let (registry, intents) = register_handlers(handlers);
    assert_eq!(intents, Intents::PUBLIC_GUILD_MESSAGES);

    let running = RunningGateway::spawn(
        registry,
        intents,
        fast_config(),
        bootstrap(&gateway.ws_url(), 1, 1),
    );

    let handshake = gateway.next_handshake().await.expect("no handshake");
    assert_eq!(handshake.message.op, OpCode::Identify);
    let identify = handshake.message.as_identify().unwrap();
    assert_eq!(identify.token, TEST_AUTHORIZATION);
    assert_eq!(identify.intents, Intents::PUBLIC_GUILD_MESSAGES);
    assert_eq!(identify.shard, ShardConfig::new(0, 1).unwrap());

    let ready = recv(&mut ready_rx).await;
    assert_eq!(ready.session_id, "session-1");
    assert_eq!(ready.user.username, "mock-bot");

    let (ctx, message) = recv(&mut message_rx).await;
    assert_eq!(ctx.sequence, Some(2));
    assert_eq!(ctx.event_type, EventType::AtMessageCreate);
    assert_eq!(ctx.event_id.as_deref(), Some("AT_MESSAGE_CREATE:2"));
    assert_eq!(message.id, "m1");
    assert_eq!(message.plain_content(), "ping");
    assert_eq!(message.author_id(), Some("user-1"));

    let status = running.status.get(0).unwrap();
    assert_eq!(status.state, ShardState::Listening);
    assert_eq!(status.session_id.as_deref(), Some("session-1"));
    assert_eq!(status.last_sequence, 2);
    assert_eq!(status.attempts, 1);
}

#[tokio::test]
async fn test_unregistered_events_are_ignored() {
    let mut gateway = MockGateway::builder()
        .script(vec![
            Action::ready(),
            Action::dispatch("MESSAGE_REACTION_ADD", 2, reaction("user-1", "m0")),
            Action::dispatch("GUILD_CREATE", 3, serde_json::json!({"id": "g1"})),
            Action::dispatch("AT_MESSAGE_CREATE", 4, at_message("m1", "hello")),
        ])
        .start()
        .await
        .unwrap();

    let (handlers, _ready_rx, mut message_rx) = forwarding_handlers();
    let (registry, intents) = register_handlers(handlers);
    let _running = RunningGateway::spawn(
        registry,
        intents,
        fast_config(),
        bootstrap(&gateway.ws_url(), 1, 1),
    );

    gateway.next_handshake().await.expect("no handshake");
    let (ctx, message) = recv(&mut message_rx).await;
    assert_eq!(ctx.sequence, Some(4));
    assert_eq!(message.id, "m1");
    assert!(gateway
        .next_handshake_within(Duration::from_millis(500))
        .await
        .is_none());
}

#[tokio::test]
async fn test_reaction_handler_receives_typed_payload() {
    let gateway = MockGateway::builder()
        .script(vec![
            Action::ready(),
            Action::dispatch("MESSAGE_REACTION_ADD", 2, reaction("user-7", "m9")),
        ])
        .start()
        .await
        .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel::<MessageReaction>();
    let (registry, intents) = register_handlers([Handler::on(
        EventType::MessageReactionAdd,
        move |_, event| {
            let tx = tx.clone();
            async move {
                if let GatewayEvent::MessageReactionAdd(reaction) = event {
                    let _ = tx.send(reaction);
                }
                Ok(())
            }
        },
    )]);
    assert_eq!(intents, Intents::GUILD_MESSAGE_REACTIONS);

    let _running = RunningGateway::spawn(
        registry,
        intents,
        fast_config(),
        bootstrap(&gateway.ws_url(), 1, 1),
    );

    let reaction = recv(&mut rx).await;
    assert_eq!(reaction.user_id, "user-7");
    assert_eq!(reaction.target.id, "m9");
}

// ============================================================================
// Resume Tests
// ============================================================================

#[tokio::test]
async fn test_session_timeout_close_resumes() {
    let mut gateway = MockGateway::builder()
        .script(vec![
            Action::ready_with("abc"),
            Action::dispatch("AT_MESSAGE_CREATE", 42, at_message("m1", "hi")),
            Action::Wait(Duration::from_millis(50)),
            Action::Close(4009),
        ])
        .start()
        .await
        .unwrap();

    let (handlers, _ready_rx, _message_rx) = forwarding_handlers();
    let (registry, intents) = register_handlers(handlers);
    let _running = RunningGateway::spawn(
        registry,
        intents,
        fast_config(),
        bootstrap(&gateway.ws_url(), 1, 1),
    );

    let first = gateway.next_handshake().await.expect("no first handshake");
    assert_eq!(first.message.op, OpCode::Identify);

    let second = gateway.next_handshake().await.expect("no second handshake");
    assert_eq!(second.conn, 1);
    let resume = second.message.as_resume().expect("expected resume");
    assert_eq!(resume.session_id, "abc");
    assert_eq!(resume.seq, 42);
    assert_eq!(resume.token, TEST_AUTHORIZATION);
}

#[tokio::test]
async fn test_dropped_connection_resumes() {
    let mut gateway = MockGateway::builder()
        .script(vec![
            Action::ready_with("abc"),
            Action::dispatch("AT_MESSAGE_CREATE", 42, at_message("m1", "hi")),
            Action::Wait(Duration::from_millis(50)),
            Action::Drop,
        ])
        .start()
        .await
        .unwrap();

    let (handlers, _ready_rx, mut message_rx) = forwarding_handlers();
    let (registry, intents) = register_handlers(handlers);
    let _running = RunningGateway::spawn(
        registry,
        intents,
        fast_config(),
        bootstrap(&gateway.ws_url(), 1, 1),
    );

    let first = gateway.next_handshake().await.expect("no first handshake");
    assert_eq!(first.message.op, OpCode::Identify);
    let (ctx, _) = recv(&mut message_rx).await;
    assert_eq!(ctx.sequence, Some(42));

    let second = gateway.next_handshake().await.expect("no second handshake");
    assert_eq!(second.conn, 1);
    let resume = second.message.as_resume().expect("expected resume");
    assert_eq!(resume.session_id, "abc");
    assert_eq!(resume.seq, 42);
}

#[tokio::test]
async fn test_reconnect_opcode_resumes() {
    let mut gateway = MockGateway::builder()
        .script(vec![
            Action::ready_with("abc"),
            Action::dispatch("AT_MESSAGE_CREATE", 7, at_message("m1", "hi")),
            Action::Reconnect,
        ])
        .script(vec![Action::Resumed])
        .start()
        .await
        .unwrap();

    let (handlers, _ready_rx, _message_rx) = forwarding_handlers();
    let (registry, intents) = register_handlers(handlers);
    let running = RunningGateway::spawn(
        registry,
        intents,
        fast_config(),
        bootstrap(&gateway.ws_url(), 1, 1),
    );

    gateway.next_handshake().await.expect("no first handshake");
    let second = gateway.next_handshake().await.expect("no second handshake");
    let resume = second.message.as_resume().expect("expected resume");
    assert_eq!(resume.session_id, "abc");
    assert_eq!(resume.seq, 7);

    // RESUMED puts the shard back into Listening
    let deadline = tokio::time::Instant::now() + WAIT;
    loop {
        let status = running.status.get(0).unwrap();
        if status.state == ShardState::Listening && status.attempts == 2 {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "shard never resumed");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_invalid_session_reidentifies() {
    let mut gateway = MockGateway::builder()
        .script(vec![
            Action::ready_with("abc"),
            Action::dispatch("AT_MESSAGE_CREATE", 5, at_message("m1", "hi")),
            Action::InvalidSession(false),
        ])
        .start()
        .await
        .unwrap();

    let (handlers, _ready_rx, _message_rx) = forwarding_handlers();
    let (registry, intents) = register_handlers(handlers);
    let _running = RunningGateway::spawn(
        registry,
        intents,
        fast_config(),
        bootstrap(&gateway.ws_url(), 1, 1),
    );

    let first = gateway.next_handshake().await.expect("no first handshake");
    assert_eq!(first.message.op, OpCode::Identify);

    let second = gateway.next_handshake().await.expect("no second handshake");
    assert_eq!(second.message.op, OpCode::Identify);
    assert_eq!(
        second.message.as_identify().unwrap().shard,
        ShardConfig::new(0, 1).unwrap()
    );
}

#[tokio::test]
async fn test_force_resume() {
    let mut gateway = MockGateway::builder()
        .script(vec![
            Action::ready_with("abc"),
            Action::dispatch("AT_MESSAGE_CREATE", 3, at_message("m1", "hi")),
        ])
        .start()
        .await
        .unwrap();

    let (handlers, _ready_rx, mut message_rx) = forwarding_handlers();
    let (registry, intents) = register_handlers(handlers);
    let running = RunningGateway::spawn(
        registry,
        intents,
        fast_config(),
        bootstrap(&gateway.ws_url(), 1, 1),
    );

    gateway.next_handshake().await.expect("no first handshake");
    let (ctx, _) = recv(&mut message_rx).await;
    assert_eq!(ctx.sequence, Some(3));

    assert_eq!(running.resume.trigger(), 1);

    let second = gateway.next_handshake().await.expect("no second handshake");
    let resume = second.message.as_resume().expect("expected resume");
    assert_eq!(resume.session_id, "abc");
    assert_eq!(resume.seq, 3);
}

// ============================================================================
// Heartbeat Tests
// ============================================================================

#[tokio::test]
async fn test_heartbeat_carries_last_sequence() {
    let mut gateway = MockGateway::builder()
        .hello_interval_ms(100)
        .script(vec![
            Action::ready(),
            Action::dispatch("AT_MESSAGE_CREATE", 3, at_message("m1", "hi")),
        ])
        .start()
        .await
        .unwrap();

    let (handlers, _ready_rx, _message_rx) = forwarding_handlers();
    let (registry, intents) = register_handlers(handlers);
    let _running = RunningGateway::spawn(
        registry,
        intents,
        fast_config(),
        bootstrap(&gateway.ws_url(), 1, 1),
    );

    let mut last = 0;
    loop {
        let seq = gateway
            .next_heartbeat()
            .await
            .expect("no heartbeat")
            .unwrap_or(0);
        assert!(seq >= last, "heartbeat sequence went backwards");
        last = seq;
        if seq == 3 {
            break;
        }
    }
}

#[tokio::test]
async fn test_zero_hello_interval_uses_default() {
    let mut gateway = MockGateway::builder()
        .hello_interval_ms(0)
        .script(vec![Action::ready()])
        .start()
        .await
        .unwrap();

    let mut config = fast_config();
    config.default_heartbeat = Duration::from_millis(150);

    let (handlers, _ready_rx, _message_rx) = forwarding_handlers();
    let (registry, intents) = register_handlers(handlers);
    let _running =
        RunningGateway::spawn(registry, intents, config, bootstrap(&gateway.ws_url(), 1, 1));

    assert!(gateway.next_heartbeat().await.is_some());
}

#[tokio::test]
async fn test_server_heartbeat_request_answered() {
    let mut gateway = MockGateway::builder()
        .script(vec![
            Action::ready(),
            Action::dispatch("AT_MESSAGE_CREATE", 2, at_message("m1", "hi")),
            Action::Wait(Duration::from_millis(50)),
            Action::HeartbeatRequest,
        ])
        .start()
        .await
        .unwrap();

    let (handlers, _ready_rx, _message_rx) = forwarding_handlers();
    let (registry, intents) = register_handlers(handlers);
    let _running = RunningGateway::spawn(
        registry,
        intents,
        fast_config(),
        bootstrap(&gateway.ws_url(), 1, 1),
    );

    // The default interval is 45s, so any heartbeat here answers the request
    assert_eq!(gateway.next_heartbeat().await, Some(Some(2)));
}

// ============================================================================
// Supervisor Tests
// ============================================================================

#[tokio::test]
async fn test_fatal_close_stops_supervisor() {
    let gateway = MockGateway::builder()
        .script(vec![Action::Close(4004)])
        .start()
        .await
        .unwrap();

    let errors = Arc::new(AtomicUsize::new(0));
    let seen = errors.clone();
    let (registry, intents) = register_handlers([Handler::error_notify(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    })]);

    let manager = SessionManager::new(registry, fast_config());
    let result = timeout(
        WAIT,
        manager.start(&bootstrap(&gateway.ws_url(), 1, 1), &test_token(), intents),
    )
    .await
    .expect("supervisor did not stop");

    match result {
        Err(GatewayError::Fatal { shard, code }) => {
            assert_eq!(shard, ShardConfig::new(0, 1).unwrap());
            assert_eq!(code, CloseCode::AuthenticationFailed);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(errors.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_shard_start_spacing() {
    let mut gateway = MockGateway::builder().start().await.unwrap();

    let mut config = fast_config();
    config.concurrency_window = Duration::from_secs(2);

    let (registry, intents) = register_handlers(Vec::new());
    let _running =
        RunningGateway::spawn(registry, intents, config, bootstrap(&gateway.ws_url(), 3, 2));

    let mut handshakes = Vec::new();
    for _ in 0..3 {
        handshakes.push(gateway.next_handshake().await.expect("missing handshake"));
    }

    let shard_ids: Vec<_> = handshakes
        .iter()
        .map(|h| h.message.as_identify().unwrap().shard.shard_id)
        .collect();
    assert_eq!(shard_ids, vec![0, 1, 2]);

    for pair in handshakes.windows(2) {
        let gap = pair[1].at.duration_since(pair[0].at);
        assert!(gap >= Duration::from_millis(900), "shards started {gap:?} apart");
    }

    // Empty intents fall back to GUILDS
    let identify = handshakes[0].message.as_identify().unwrap();
    assert_eq!(identify.intents, Intents::GUILDS);
}

#[tokio::test]
async fn test_handler_panic_keeps_shard_alive() {
    let mut gateway = MockGateway::builder()
        .script(vec![
            Action::ready(),
            Action::dispatch("AT_MESSAGE_CREATE", 2, at_message("m1", "explode")),
            Action::dispatch("AT_MESSAGE_CREATE", 3, at_message("m2", "still here")),
        ])
        .start()
        .await
        .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (registry, intents) = register_handlers([Handler::at_message(move |ctx, message| {
        let tx = tx.clone();
        async move {
            assert_ne!(message.plain_content(), "explode", "handler exploded");
            let _ = tx.send((ctx.sequence, message.id));
            Ok(())
        }
    })]);
    let running = RunningGateway::spawn(
        registry,
        intents,
        fast_config(),
        bootstrap(&gateway.ws_url(), 1, 1),
    );

    gateway.next_handshake().await.expect("no handshake");
    assert_eq!(recv(&mut rx).await, (Some(3), "m2".to_string()));
    assert!(gateway
        .next_handshake_within(Duration::from_millis(500))
        .await
        .is_none());
    assert_eq!(running.status.get(0).unwrap().attempts, 1);
}

#[tokio::test]
async fn test_malformed_frames_are_skipped() {
    let mut gateway = MockGateway::builder()
        .script(vec![
            Action::ready(),
            Action::Raw("not json".to_string()),
            Action::Raw(r#"{"op":3,"d":{}}"#.to_string()),
            Action::Raw(r#"{"op":2,"d":{}}"#.to_string()),
            Action::dispatch("AT_MESSAGE_CREATE", 2, serde_json::json!("wrong shape")),
            Action::dispatch("AT_MESSAGE_CREATE", 3, at_message("m3", "ok")),
        ])
        .start()
        .await
        .unwrap();

    let (handlers, _ready_rx, mut message_rx) = forwarding_handlers();
    let (registry, intents) = register_handlers(handlers);
    let running = RunningGateway::spawn(
        registry,
        intents,
        fast_config(),
        bootstrap(&gateway.ws_url(), 1, 1),
    );

    gateway.next_handshake().await.expect("no handshake");
    let (ctx, message) = recv(&mut message_rx).await;
    assert_eq!(ctx.sequence, Some(3));
    assert_eq!(message.id, "m3");
    assert_eq!(running.status.get(0).unwrap().attempts, 1);
}

// ============================================================================
// Bootstrap Tests
// ============================================================================

#[tokio::test]
async fn test_run_fetches_bootstrap_and_reports_rejection() {
    let mut gateway = MockGateway::builder()
        .script(vec![Action::Close(4004)])
        .start()
        .await
        .unwrap();

    let api = HttpApiClient::new(gateway.base_url(), test_token(), Duration::from_secs(5)).unwrap();
    let (registry, intents) = register_handlers(Vec::new());
    let manager = SessionManager::new(registry, fast_config());

    let result = timeout(
        WAIT,
        bot_gateway::run(&api, &manager, &test_token(), intents),
    )
    .await
    .expect("run did not stop");

    assert!(matches!(result, Err(AppError::Unauthorized(_))));
    let handshake = gateway.next_handshake().await.expect("no handshake");
    assert_eq!(handshake.message.op, OpCode::Identify);
}
