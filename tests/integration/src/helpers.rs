//! Test helpers for integration tests
//!
//! `MockGateway` serves `GET /gateway/bot` and a WebSocket endpoint at
//! `/websocket`. Every accepted connection sends Hello, waits for the client's
//! handshake, then plays the script registered for that connection index.
//! Heartbeats are always acknowledged. Everything the clients send is
//! recorded for assertions.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use bot_gateway::protocol::{GatewayMessage, HelloPayload, OpCode};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How long record accessors wait before giving up
pub const RECORD_TIMEOUT: Duration = Duration::from_secs(10);

/// One step of a connection script
#[derive(Debug, Clone)]
pub enum Action {
    /// READY with sequence 1; the shard is echoed from the Identify payload
    Ready { session_id: String },
    /// RESUMED
    Resumed,
    /// Any dispatch event
    Dispatch {
        t: String,
        s: u32,
        d: Value,
        id: Option<String>,
    },
    /// Raw text frame, sent as-is
    Raw(String),
    /// Close frame with the given code; ends the connection
    Close(u16),
    /// Drop the socket without a close frame
    Drop,
    InvalidSession(bool),
    Reconnect,
    /// Server-side heartbeat request
    HeartbeatRequest,
    Wait(Duration),
}

impl Action {
    /// READY with a fresh random session id
    pub fn ready() -> Self {
        Self::Ready {
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn ready_with(session_id: &str) -> Self {
        Self::Ready {
            session_id: session_id.to_string(),
        }
    }

    pub fn dispatch(t: &str, s: u32, d: Value) -> Self {
        Self::Dispatch {
            t: t.to_string(),
            s,
            d,
            id: Some(format!("{t}:{s}")),
        }
    }
}

/// A handshake frame received from a client
#[derive(Debug, Clone)]
pub struct Handshake {
    pub conn: usize,
    pub message: GatewayMessage,
    pub at: Instant,
}

/// Something a client did
#[derive(Debug, Clone)]
pub enum Record {
    Handshake(Handshake),
    Heartbeat {
        conn: usize,
        seq: Option<u32>,
        at: Instant,
    },
    Disconnected {
        conn: usize,
    },
}

#[derive(Clone)]
struct MockState {
    addr: SocketAddr,
    shards: u32,
    max_concurrency: u32,
    hello_interval_ms: u64,
    scripts: Arc<Vec<Vec<Action>>>,
    connections: Arc<AtomicUsize>,
    records: mpsc::UnboundedSender<Record>,
}

/// Builder for a mock gateway
#[derive(Debug, Clone)]
pub struct MockGatewayBuilder {
    shards: u32,
    max_concurrency: u32,
    hello_interval_ms: u64,
    scripts: Vec<Vec<Action>>,
}

impl MockGatewayBuilder {
    /// Heartbeat interval announced in Hello
    pub fn hello_interval_ms(mut self, interval: u64) -> Self {
        self.hello_interval_ms = interval;
        self
    }

    /// Shard count and max concurrency reported by `/gateway/bot`
    pub fn bootstrap(mut self, shards: u32, max_concurrency: u32) -> Self {
        self.shards = shards;
        self.max_concurrency = max_concurrency;
        self
    }

    /// Script for the next connection index; unscripted connections stay open
    pub fn script(mut self, actions: Vec<Action>) -> Self {
        self.scripts.push(actions);
        self
    }

    pub async fn start(self) -> Result<MockGateway> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (records_tx, records_rx) = mpsc::unbounded_channel();

        let state = MockState {
            addr,
            shards: self.shards,
            max_concurrency: self.max_concurrency,
            hello_interval_ms: self.hello_interval_ms,
            scripts: Arc::new(self.scripts),
            connections: Arc::new(AtomicUsize::new(0)),
            records: records_tx,
        };

        let app = Router::new()
            .route("/gateway/bot", get(gateway_bot))
            .route("/websocket", get(websocket))
            .with_state(state);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(MockGateway {
            addr,
            records: records_rx,
            _handle: handle,
        })
    }
}

/// Scripted gateway server
pub struct MockGateway {
    pub addr: SocketAddr,
    records: mpsc::UnboundedReceiver<Record>,
    _handle: JoinHandle<()>,
}

impl MockGateway {
    pub fn builder() -> MockGatewayBuilder {
        MockGatewayBuilder {
            shards: 1,
            max_concurrency: 1,
            hello_interval_ms: 45_000,
            scripts: Vec::new(),
        }
    }

    /// WebSocket URL clients connect to
    pub fn ws_url(&self) -> String {
        format!("ws://{}/websocket", self.addr)
    }

    /// Base URL of the REST endpoints
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Next record, or `None` after `timeout`
    pub async fn next_record(&mut self, timeout: Duration) -> Option<Record> {
        tokio::time::timeout(timeout, self.records.recv())
            .await
            .ok()
            .flatten()
    }

    /// Next handshake, skipping other records
    pub async fn next_handshake(&mut self) -> Option<Handshake> {
        self.next_handshake_within(RECORD_TIMEOUT).await
    }

    pub async fn next_handshake_within(&mut self, timeout: Duration) -> Option<Handshake> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.next_record(remaining).await? {
                Record::Handshake(handshake) => return Some(handshake),
                _ => continue,
            }
        }
    }

    /// Next heartbeat sequence, skipping other records
    pub async fn next_heartbeat(&mut self) -> Option<Option<u32>> {
        let deadline = Instant::now() + RECORD_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if let Record::Heartbeat { seq, .. } = self.next_record(remaining).await? {
                return Some(seq);
            }
        }
    }
}

async fn gateway_bot(State(state): State<MockState>) -> Json<Value> {
    Json(json!({
        "url": format!("ws://{}/websocket", state.addr),
        "shards": state.shards,
        "session_start_limit": {
            "total": 1000,
            "remaining": 999,
            "reset_after": 86_400_000,
            "max_concurrency": state.max_concurrency,
        }
    }))
}

async fn websocket(State(state): State<MockState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

/// What the writer task does next
#[derive(Debug)]
enum Outbound {
    Frame(Message),
    Drop,
}

fn text(message: &GatewayMessage) -> Outbound {
    Outbound::Frame(Message::Text(message.to_json().unwrap_or_default()))
}

async fn handle_socket(state: MockState, socket: WebSocket) {
    let conn = state.connections.fetch_add(1, Ordering::SeqCst);
    let script = state.scripts.get(conn).cloned().unwrap_or_default();
    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Outbound>();
    let (handshake_tx, handshake_rx) = oneshot::channel::<GatewayMessage>();

    let _ = out_tx.send(text(&GatewayMessage::hello(&HelloPayload::with_interval(
        state.hello_interval_ms,
    ))));

    let mut writer = tokio::spawn(async move {
        while let Some(Outbound::Frame(message)) = out_rx.recv().await {
            let closing = matches!(message, Message::Close(_));
            if sink.send(message).await.is_err() || closing {
                break;
            }
        }
    });

    let records = state.records.clone();
    let acks = out_tx.clone();
    let mut reader = tokio::spawn(async move {
        let mut handshake_tx = Some(handshake_tx);
        while let Some(Ok(message)) = stream.next().await {
            let raw = match message {
                Message::Text(raw) => raw,
                Message::Close(_) => break,
                _ => continue,
            };
            let Ok(frame) = GatewayMessage::from_json(&raw) else {
                continue;
            };

            match frame.op {
                OpCode::Identify | OpCode::Resume => {
                    let _ = records.send(Record::Handshake(Handshake {
                        conn,
                        message: frame.clone(),
                        at: Instant::now(),
                    }));
                    if let Some(tx) = handshake_tx.take() {
                        let _ = tx.send(frame);
                    }
                }
                OpCode::Heartbeat => {
                    let _ = records.send(Record::Heartbeat {
                        conn,
                        seq: frame.as_heartbeat_seq().flatten(),
                        at: Instant::now(),
                    });
                    let _ = acks.send(text(&GatewayMessage::heartbeat_ack()));
                }
                _ => {}
            }
        }
    });

    let runner = tokio::spawn(run_script(script, handshake_rx, out_tx));

    tokio::select! {
        _ = &mut reader => {}
        _ = &mut writer => {}
    }
    runner.abort();
    reader.abort();
    writer.abort();
    let _ = state.records.send(Record::Disconnected { conn });
}

async fn run_script(
    script: Vec<Action>,
    handshake: oneshot::Receiver<GatewayMessage>,
    out: mpsc::UnboundedSender<Outbound>,
) {
    let Ok(handshake) = handshake.await else {
        return;
    };
    let shard = handshake.as_identify().map(|identify| identify.shard);

    for action in script {
        let message = match action {
            Action::Ready { session_id } => text(&GatewayMessage::dispatch(
                "READY",
                1,
                json!({
                    "version": 1,
                    "session_id": session_id,
                    "user": {"id": "10000", "username": "mock-bot", "bot": true},
                    "shard": shard,
                }),
            )),
            Action::Resumed => text(&GatewayMessage::dispatch("RESUMED", 0, json!(""))),
            Action::Dispatch { t, s, d, id } => {
                let mut message = GatewayMessage::dispatch(t, s, d);
                if let Some(id) = id {
                    message = message.with_id(id);
                }
                text(&message)
            }
            Action::Raw(raw) => Outbound::Frame(Message::Text(raw)),
            Action::Close(code) => Outbound::Frame(Message::Close(Some(CloseFrame {
                code,
                reason: "scripted close".into(),
            }))),
            Action::Drop => Outbound::Drop,
            Action::InvalidSession(resumable) => {
                text(&GatewayMessage::invalid_session(resumable))
            }
            Action::Reconnect => text(&GatewayMessage::reconnect()),
            Action::HeartbeatRequest => text(&GatewayMessage::heartbeat_request()),
            Action::Wait(duration) => {
                tokio::time::sleep(duration).await;
                continue;
            }
        };

        if out.send(message).is_err() {
            return;
        }
    }
}
