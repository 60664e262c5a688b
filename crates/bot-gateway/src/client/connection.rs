//! Per-shard protocol client
//!
//! Drives one connection from connect to teardown. Three tasks cooperate:
//!
//! - reader: decodes frames, queues every frame for the processor and signals
//!   control opcodes straight to the main task
//! - processor: owns the descriptor while connected, tracks sequence and
//!   session, runs the ready callback and routes dispatch events
//! - main: heartbeats, reacts to control signals and force-resume, tears the
//!   connection down and hands the descriptor back

use bot_common::GatewayConfig;
use futures::FutureExt;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{Sink, SinkExt, StreamExt};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::heartbeat::Heartbeat;
use crate::dispatch::EventRouter;
use crate::error::{panic_message, GatewayError, GatewayResult};
use crate::events::{EventType, ReadyEvent};
use crate::handlers::{DispatchContext, HandlerRegistry};
use crate::protocol::{
    CloseCode, CloseDisposition, FrameEnvelope, FrameError, GatewayMessage, HelloPayload, OpCode,
};
use crate::shard::{ResumeState, ShardDescriptor};
use crate::supervisor::{ResumeTrigger, ShardState, ShardStatusTable};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, WsMessage>;

/// Everything a shard shares with the rest of the gateway
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub registry: Arc<HandlerRegistry>,
    pub router: Arc<EventRouter>,
    pub config: GatewayConfig,
    pub status: ShardStatusTable,
    pub resume: ResumeTrigger,
}

/// How a shard's run ended
#[derive(Debug)]
pub enum ShardExit {
    /// Put the descriptor back in the pool
    Requeue(ShardDescriptor),
    /// The gateway rejected this shard for good
    Fatal {
        descriptor: ShardDescriptor,
        code: CloseCode,
    },
}

impl ShardExit {
    pub fn descriptor(&self) -> &ShardDescriptor {
        match self {
            Self::Requeue(descriptor) | Self::Fatal { descriptor, .. } => descriptor,
        }
    }
}

/// Signals from the reader (and a failing processor) to the main task
#[derive(Debug)]
enum Control {
    Hello(Option<u64>),
    HeartbeatAck,
    HeartbeatRequested,
    Reconnect,
    InvalidSession { resumable: bool },
    Terminated(GatewayError),
}

impl Control {
    fn from_frame(frame: &FrameEnvelope) -> Option<Self> {
        if !frame.op.is_control() {
            return None;
        }
        match frame.op {
            OpCode::Hello => Some(Self::Hello(
                frame
                    .decode::<HelloPayload>()
                    .ok()
                    .and_then(|hello| hello.interval_ms()),
            )),
            OpCode::HeartbeatAck => Some(Self::HeartbeatAck),
            OpCode::Heartbeat => Some(Self::HeartbeatRequested),
            OpCode::Reconnect => Some(Self::Reconnect),
            OpCode::InvalidSession => Some(Self::InvalidSession {
                resumable: frame.decode::<bool>().unwrap_or(false),
            }),
            _ => None,
        }
    }
}

/// Protocol client for one shard
pub struct ProtocolClient {
    descriptor: ShardDescriptor,
    ctx: ClientContext,
    snapshot: watch::Sender<ResumeState>,
}

impl ProtocolClient {
    pub fn new(descriptor: ShardDescriptor, ctx: ClientContext) -> Self {
        let (snapshot, _) = watch::channel(descriptor.resume_state());
        Self {
            descriptor,
            ctx,
            snapshot,
        }
    }

    pub fn descriptor(&self) -> &ShardDescriptor {
        &self.descriptor
    }

    /// Latest session id and sequence, updated while the client runs
    pub fn resume_state(&self) -> watch::Receiver<ResumeState> {
        self.snapshot.subscribe()
    }

    /// Run the connection until it ends
    pub async fn run(self) -> ShardExit {
        let Self {
            descriptor,
            ctx,
            snapshot,
        } = self;
        let shard = descriptor.shard;

        ctx.status.record_attempt(shard);
        tracing::info!(shard = %shard, descriptor = %descriptor, "Connecting to gateway");

        let stream = match connect(&descriptor.url, ctx.config.connect_timeout).await {
            Ok(stream) => stream,
            Err(err) => return finish(&ctx, descriptor, err),
        };
        let (mut sink, stream) = stream.split();

        let descriptor = match open_session(&mut sink, descriptor, &ctx).await {
            Ok(descriptor) => descriptor,
            Err(exit) => return exit,
        };

        let (control_tx, mut control_rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = mpsc::channel(ctx.config.queue_size.max(1));

        let fallback = descriptor.clone();
        let latest = snapshot.subscribe();
        let reader = tokio::spawn(read_frames(stream, frame_tx, control_tx.clone(), shard));
        let mut processor = tokio::spawn(process_frames(
            descriptor,
            frame_rx,
            ctx.clone(),
            snapshot,
            control_tx,
        ));

        let mut heartbeat = Heartbeat::new(ctx.config.default_heartbeat);
        let mut force_resume = ctx.resume.subscribe();
        let mut force_resume_open = true;
        let mut processed: Option<Result<ShardDescriptor, JoinError>> = None;

        let reason = loop {
            tokio::select! {
                () = heartbeat.tick() => {
                    if ctx.config.zombie_detection && heartbeat.awaiting_ack() {
                        tracing::warn!(shard = %shard, "Heartbeat not acknowledged; connection is a zombie");
                        break GatewayError::Zombie;
                    }
                    if let Err(err) = send_heartbeat(&mut sink, &latest, &mut heartbeat, shard).await {
                        break err;
                    }
                }
                signal = control_rx.recv() => {
                    let Some(signal) = signal else {
                        break GatewayError::Disconnected;
                    };
                    match signal {
                        Control::Hello(interval) => {
                            let period = interval
                                .map_or(ctx.config.default_heartbeat, Duration::from_millis);
                            heartbeat.reset(period);
                            tracing::debug!(
                                shard = %shard,
                                interval_ms = period.as_millis(),
                                "Hello received"
                            );
                        }
                        Control::HeartbeatAck => {
                            heartbeat.acked();
                            tracing::trace!(shard = %shard, latency = ?heartbeat.latency(), "Heartbeat acknowledged");
                        }
                        Control::HeartbeatRequested => {
                            if let Err(err) = send_heartbeat(&mut sink, &latest, &mut heartbeat, shard).await {
                                break err;
                            }
                        }
                        Control::Reconnect => break GatewayError::Reconnect,
                        Control::InvalidSession { resumable } => {
                            break GatewayError::InvalidSession { resumable };
                        }
                        Control::Terminated(err) => break err,
                    }
                }
                result = force_resume.recv(), if force_resume_open => {
                    match result {
                        Ok(()) | Err(RecvError::Lagged(_)) => break GatewayError::ForceResume,
                        Err(RecvError::Closed) => force_resume_open = false,
                    }
                }
                result = &mut processor, if processed.is_none() => {
                    let failed = result.is_err();
                    processed = Some(result);
                    if failed {
                        break GatewayError::ProcessorFailed;
                    }
                }
            }
        };

        tracing::info!(shard = %shard, reason = %reason, "Connection ending");
        reader.abort();
        if let Err(err) = sink.close().await {
            tracing::debug!(shard = %shard, error = %err, "Close after teardown failed");
        }

        let descriptor = match processed {
            Some(Ok(descriptor)) => descriptor,
            Some(Err(_)) => rebuild(fallback, &latest),
            None => drain(processor, ctx.config.drain_timeout, fallback, &latest, shard).await,
        };

        finish(&ctx, descriptor, reason)
    }
}

async fn connect(url: &str, timeout: Duration) -> GatewayResult<WsStream> {
    match time::timeout(timeout, connect_async(url)).await {
        Ok(Ok((stream, _response))) => Ok(stream),
        Ok(Err(source)) => Err(GatewayError::Connect {
            url: url.to_string(),
            source,
        }),
        Err(_) => Err(GatewayError::ConnectTimeout {
            url: url.to_string(),
            timeout,
        }),
    }
}

/// Send the handshake and mark the shard as identifying or resuming
///
/// A failed write closes the sink and ends the run with a requeue.
async fn open_session<S>(
    sink: &mut S,
    descriptor: ShardDescriptor,
    ctx: &ClientContext,
) -> Result<ShardDescriptor, ShardExit>
where
    S: Sink<WsMessage, Error = WsError> + Unpin,
{
    if let Err(err) = send_handshake(sink, &descriptor).await {
        let _ = sink.close().await;
        return Err(finish(ctx, descriptor, err));
    }

    let state = if descriptor.is_resumable() {
        ShardState::Resuming
    } else {
        ShardState::Identifying
    };
    ctx.status.transition(descriptor.shard, state);
    Ok(descriptor)
}

async fn send_handshake<S>(sink: &mut S, descriptor: &ShardDescriptor) -> GatewayResult<()>
where
    S: Sink<WsMessage, Error = WsError> + Unpin,
{
    let message = descriptor.handshake()?;
    tracing::debug!(shard = %descriptor.shard, op = %message.op, "Sending handshake");
    sink.send(WsMessage::Text(message.to_json()?))
        .await
        .map_err(GatewayError::Handshake)
}

async fn send_heartbeat(
    sink: &mut WsSink,
    latest: &watch::Receiver<ResumeState>,
    heartbeat: &mut Heartbeat,
    shard: bot_core::ShardConfig,
) -> GatewayResult<()> {
    let seq = latest.borrow().last_sequence;
    sink.send(WsMessage::Text(GatewayMessage::heartbeat(seq).to_json()?))
        .await?;
    heartbeat.sent();
    tracing::trace!(shard = %shard, seq, "Heartbeat sent");
    Ok(())
}

fn close_reason(frame: Option<CloseFrame<'_>>) -> GatewayError {
    match frame {
        Some(frame) => GatewayError::Closed {
            code: CloseCode::from_u16(u16::from(frame.code)),
            reason: frame.reason.into_owned(),
        },
        None => GatewayError::Disconnected,
    }
}

async fn read_frames(
    mut stream: SplitStream<WsStream>,
    frames: mpsc::Sender<FrameEnvelope>,
    control: mpsc::UnboundedSender<Control>,
    shard: bot_core::ShardConfig,
) {
    let reason = loop {
        let message = match stream.next().await {
            Some(Ok(message)) => message,
            Some(Err(err)) => break GatewayError::Transport(err),
            None => break GatewayError::Disconnected,
        };

        let parsed = match message {
            WsMessage::Text(text) => FrameEnvelope::parse(text).map_err(FrameError::from),
            WsMessage::Binary(bytes) => FrameEnvelope::parse_bytes(&bytes),
            WsMessage::Close(frame) => break close_reason(frame),
            WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => continue,
        };

        let frame = match parsed {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(shard = %shard, error = %err, "Skipping malformed frame");
                continue;
            }
        };

        tracing::trace!(shard = %shard, op = %frame.op, seq = ?frame.s, "Frame received");
        if !frame.op.is_server_op() {
            tracing::warn!(shard = %shard, op = %frame.op, "Skipping client-only opcode from server");
            continue;
        }

        if let Some(signal) = Control::from_frame(&frame) {
            if control.send(signal).is_err() {
                return;
            }
        }
        if frames.send(frame).await.is_err() {
            break GatewayError::ProcessorFailed;
        }
    };

    let _ = control.send(Control::Terminated(reason));
}

async fn process_frames(
    mut descriptor: ShardDescriptor,
    mut frames: mpsc::Receiver<FrameEnvelope>,
    ctx: ClientContext,
    snapshot: watch::Sender<ResumeState>,
    control: mpsc::UnboundedSender<Control>,
) -> ShardDescriptor {
    while let Some(frame) = frames.recv().await {
        let tracked = catch_unwind(AssertUnwindSafe(|| {
            track_frame(&mut descriptor, &frame, &ctx, &snapshot);
        }));
        if let Err(payload) = tracked {
            let message = panic_message(payload.as_ref());
            tracing::error!(shard = %descriptor.shard, panic = %message, "Frame bookkeeping panicked");
            let _ = control.send(Control::Terminated(GatewayError::Panic(message)));
            break;
        }

        if !frame.is_dispatch() || frame.event_type() == Some(EventType::Ready) {
            continue;
        }

        let shard = descriptor.shard;
        match AssertUnwindSafe(ctx.router.dispatch(&frame, shard))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::warn!(shard = %shard, seq = ?frame.s, error = %err, "Event handling failed");
            }
            Err(payload) => {
                tracing::error!(
                    shard = %shard,
                    seq = ?frame.s,
                    event_type = frame.t.as_deref().unwrap_or_default(),
                    panic = %panic_message(payload.as_ref()),
                    "Event handler panicked"
                );
            }
        }
    }

    descriptor
}

/// Sequence, session and status bookkeeping for one frame
fn track_frame(
    descriptor: &mut ShardDescriptor,
    frame: &FrameEnvelope,
    ctx: &ClientContext,
    snapshot: &watch::Sender<ResumeState>,
) {
    descriptor.observe_sequence(frame.sequence());

    if frame.is_dispatch() {
        match frame.event_type() {
            Some(EventType::Ready) => match frame.decode::<ReadyEvent>() {
                Ok(ready) => on_ready(descriptor, frame, &ready, ctx),
                Err(err) => {
                    tracing::warn!(shard = %descriptor.shard, error = %err, "Malformed READY payload");
                }
            },
            Some(EventType::Resumed) => {
                let session_id = descriptor.session_id.clone().unwrap_or_default();
                ctx.status.record_session(descriptor.shard, &session_id);
                tracing::info!(shard = %descriptor.shard, session = %session_id, "Session resumed");
            }
            _ => {}
        }
    }

    ctx.status
        .record_sequence(descriptor.shard, descriptor.last_sequence);
    snapshot.send_if_modified(|state| {
        let next = descriptor.resume_state();
        if *state == next {
            false
        } else {
            *state = next;
            true
        }
    });
}

fn on_ready(
    descriptor: &mut ShardDescriptor,
    frame: &FrameEnvelope,
    ready: &ReadyEvent,
    ctx: &ClientContext,
) {
    descriptor.apply_ready(ready);
    ctx.status.record_session(descriptor.shard, &ready.session_id);
    tracing::info!(
        shard = %descriptor.shard,
        session = %ready.session_id,
        user = %ready.user.username,
        "Session ready"
    );

    if let Some(handler) = ctx.registry.ready() {
        let dispatch_ctx = DispatchContext::from_frame(frame, EventType::Ready, descriptor.shard);
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| handler(&dispatch_ctx, ready))) {
            tracing::error!(
                shard = %descriptor.shard,
                panic = %panic_message(payload.as_ref()),
                "Ready handler panicked"
            );
        }
    }
}

async fn drain(
    mut processor: JoinHandle<ShardDescriptor>,
    timeout: Duration,
    fallback: ShardDescriptor,
    latest: &watch::Receiver<ResumeState>,
    shard: bot_core::ShardConfig,
) -> ShardDescriptor {
    match time::timeout(timeout, &mut processor).await {
        Ok(Ok(descriptor)) => descriptor,
        Ok(Err(err)) => {
            tracing::warn!(shard = %shard, error = %err, "Frame processor failed during drain");
            rebuild(fallback, latest)
        }
        Err(_) => {
            tracing::warn!(shard = %shard, timeout = ?timeout, "Frame processor did not drain in time");
            processor.abort();
            rebuild(fallback, latest)
        }
    }
}

/// Descriptor reconstructed from the last published snapshot
fn rebuild(mut fallback: ShardDescriptor, latest: &watch::Receiver<ResumeState>) -> ShardDescriptor {
    fallback.restore(&latest.borrow());
    fallback
}

/// Report the reason, apply its disposition and hand the descriptor back
fn finish(ctx: &ClientContext, mut descriptor: ShardDescriptor, reason: GatewayError) -> ShardExit {
    let shard = descriptor.shard;
    ctx.registry.notify_error(&reason);
    ctx.status.record_error(shard, &reason);
    ctx.status.transition(shard, ShardState::Closed);

    if let Some(code) = reason.close_code().filter(|_| reason.is_fatal()) {
        tracing::error!(shard = %shard, code = %code, "Gateway rejected shard");
        return ShardExit::Fatal { descriptor, code };
    }

    match reason.disposition() {
        CloseDisposition::Reidentify => {
            tracing::info!(shard = %shard, reason = %reason, "Session discarded; will identify");
            descriptor.reset_session();
            ShardExit::Requeue(descriptor)
        }
        _ => {
            tracing::info!(
                shard = %shard,
                reason = %reason,
                resumable = descriptor.is_resumable(),
                "Shard requeued"
            );
            ShardExit::Requeue(descriptor)
        }
    }
}
