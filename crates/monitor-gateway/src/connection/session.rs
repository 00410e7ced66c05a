//! Gateway session actor
//!
//! One task owns the socket, the timers and every state transition. The caller
//! talks to it only through the stop signal; it talks back only through the
//! [`Notifier`].

use super::resume::ResumeState;
use super::sender::{FrameSender, HeartbeatFrames};
use super::{SessionConfig, SessionState, StateCell};
use crate::broadcast::{IngestionQueue, QueuedEvent, RateLimitedDispatcher};
use crate::error::{ErrorKind, GatewayError};
use crate::events::Notifier;
use crate::heartbeat::HeartbeatScheduler;
use crate::protocol::{close_reason, CloseCode, FrameCodec, InboundFrame, OpCode, ReadyPayload};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::Instrument;
use uuid::Uuid;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long the writer gets to flush a close frame
const WRITER_SHUTDOWN: Duration = Duration::from_secs(2);

pub(crate) const STATUS_CONNECTING: &str = "Connecting to gateway";
pub(crate) const STATUS_CONNECTED: &str = "Connected to Discord Gateway";
pub(crate) const STATUS_RECONNECTING: &str = "Attempting to reconnect...";

/// Why a connection attempt ended
#[derive(Debug)]
enum Outcome {
    /// Explicit stop; never reconnect
    Stopped,
    /// Socket closed by the remote side or at its request
    Closed(String),
    /// Socket could not be opened or failed while reading
    Failed(GatewayError),
}

/// What the read loop does after a frame
enum FrameAction {
    Continue,
    Reconnect,
}

pub(crate) struct GatewaySession {
    tag: String,
    config: Arc<SessionConfig>,
    codec: FrameCodec,
    notifier: Notifier,
    state: StateCell,
    queue: IngestionQueue,
    heartbeat: Option<HeartbeatScheduler>,
    /// Lives as long as the session so the tick spacing survives reconnects
    dispatcher: RateLimitedDispatcher,
    resume: ResumeState,
    /// Learned from Hello, 0 until then
    heartbeat_interval_ms: u64,
    hello_seen: bool,
}

impl GatewaySession {
    pub(crate) fn new(
        tag: String,
        config: Arc<SessionConfig>,
        notifier: Notifier,
        state: StateCell,
        queue: IngestionQueue,
    ) -> Self {
        let codec = config.codec();
        let dispatcher = RateLimitedDispatcher::new(queue.clone());
        Self {
            tag,
            config,
            codec,
            notifier,
            state,
            queue,
            heartbeat: None,
            dispatcher,
            resume: ResumeState::default(),
            heartbeat_interval_ms: 0,
            hello_seen: false,
        }
    }

    /// Connect, and keep reconnecting, until stopped or out of attempts.
    ///
    /// A dropped stop sender counts as a stop.
    pub(crate) async fn run(mut self, mut stop: oneshot::Receiver<()>) {
        let policy = self.config.reconnect;
        let mut attempt: u32 = 0;

        loop {
            let attempt_id = Uuid::new_v4();
            let span = tracing::info_span!("gateway_attempt", tag = %self.tag, attempt_id = %attempt_id);
            let outcome = self.connect_once(&mut stop).instrument(span).await;

            match outcome {
                Outcome::Stopped => break,
                Outcome::Closed(reason) => self
                    .notifier
                    .status(&self.tag, format!("Connection closed: {reason}")),
                Outcome::Failed(e) => self.notifier.error(&self.tag, e.kind(), e.to_string()),
            }
            self.state.transition(SessionState::Disconnected);

            if std::mem::take(&mut self.hello_seen) {
                attempt = 0;
            }
            if policy.exhausted(attempt) {
                self.notifier.error(
                    &self.tag,
                    ErrorKind::Session,
                    "Reconnect attempt limit reached",
                );
                self.notifier.status(
                    &self.tag,
                    format!("Giving up after {attempt} reconnect attempts"),
                );
                break;
            }

            let delay = policy.delay_for(attempt);
            attempt = attempt.saturating_add(1);
            tracing::info!(tag = %self.tag, attempt, delay_ms = delay.as_millis(), "Reconnect scheduled");

            tokio::select! {
                biased;
                _ = &mut stop => {
                    self.state.transition(SessionState::Closing);
                    break;
                }
                () = sleep(delay) => {}
            }
            self.notifier.status(&self.tag, STATUS_RECONNECTING);
        }

        self.finish();
    }

    /// One connection attempt from open to close
    async fn connect_once(&mut self, stop: &mut oneshot::Receiver<()>) -> Outcome {
        self.state.transition(SessionState::Connecting);
        self.notifier.status(&self.tag, STATUS_CONNECTING);

        let url = if self.config.resume {
            self.resume.connect_url(&self.config.url)
        } else {
            self.config.url.clone()
        };
        tracing::debug!(url = %url, "Opening gateway socket");

        let socket = tokio::select! {
            biased;
            _ = &mut *stop => {
                self.state.transition(SessionState::Closing);
                return Outcome::Stopped;
            }
            result = connect_async(url.as_str()) => match result {
                Ok((socket, _response)) => socket,
                Err(e) => return Outcome::Failed(e.into()),
            },
        };

        self.state.transition(SessionState::AwaitingHello);
        self.notifier.status(&self.tag, STATUS_CONNECTED);

        let (sink, stream) = socket.split();
        let (sender, rx) = FrameSender::channel();
        let writer = tokio::spawn(write_loop(sink, rx).in_current_span());

        self.send_handshake(&sender);
        let outcome = self.read_loop(stream, &sender, stop).await;

        self.teardown().await;
        if matches!(outcome, Outcome::Stopped) {
            // Writer exits after the close frame
            let _ = sender.close();
        }
        shutdown_writer(sender, writer).await;
        outcome
    }

    async fn read_loop(
        &mut self,
        mut stream: SplitStream<WsStream>,
        sender: &FrameSender,
        stop: &mut oneshot::Receiver<()>,
    ) -> Outcome {
        loop {
            let message = tokio::select! {
                biased;
                _ = &mut *stop => {
                    self.state.transition(SessionState::Closing);
                    return Outcome::Stopped;
                }
                message = stream.next() => message,
            };

            match message {
                Some(Ok(Message::Text(text))) => {
                    if let FrameAction::Reconnect = self.handle_text(&text, sender) {
                        return Outcome::Closed("Reconnect requested by gateway".to_string());
                    }
                }
                Some(Ok(Message::Binary(bytes))) => {
                    self.notifier.error(
                        &self.tag,
                        ErrorKind::Decode,
                        format!("Binary frame of {} bytes ignored", bytes.len()),
                    );
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame.map_or((None, String::new()), |f| {
                        (Some(u16::from(f.code)), f.reason.to_string())
                    });
                    if let Some(known) = code.and_then(CloseCode::from_u16) {
                        tracing::info!(
                            close_code = %known,
                            reconnectable = known.should_reconnect(),
                            "Gateway closed the socket"
                        );
                    }
                    return Outcome::Closed(close_reason(code, &reason));
                }
                Some(Ok(_)) => tracing::trace!("Control frame received"),
                Some(Err(e)) => return Outcome::Failed(e.into()),
                None => return Outcome::Closed(close_reason(None, "")),
            }
        }
    }

    /// Decode one text frame and route it
    fn handle_text(&mut self, text: &str, sender: &FrameSender) -> FrameAction {
        let frame = match self.codec.decode(text) {
            Ok(Some(frame)) => frame,
            Ok(None) => return FrameAction::Continue,
            Err(e) => {
                self.notifier.error(&self.tag, e.kind(), e.to_string());
                return FrameAction::Continue;
            }
        };
        tracing::trace!(op = %OpCode::describe(frame.opcode), event_type = %frame.event_type_str(), "Frame received");

        if self.config.resume {
            self.track_resume(&frame);
        }

        match frame.op() {
            Some(OpCode::Hello) => {
                self.on_hello(&frame, sender);
                return FrameAction::Continue;
            }
            Some(OpCode::Heartbeat) => self.heartbeat_now(sender),
            Some(OpCode::HeartbeatAck) => tracing::trace!("Heartbeat acknowledged"),
            Some(OpCode::Reconnect) => return FrameAction::Reconnect,
            Some(op) if op.is_client_op() => {
                tracing::debug!(op = %op, "Client op code received from gateway");
            }
            _ => {}
        }

        if let Some((event_type, payload)) = frame.into_event_parts() {
            self.queue.offer(QueuedEvent::new(event_type, payload));
        }
        FrameAction::Continue
    }

    /// Start the keep-alive and the dispatcher for this connection
    fn on_hello(&mut self, frame: &InboundFrame, sender: &FrameSender) {
        let interval_ms = match FrameCodec::hello_interval(frame) {
            Ok(ms) => ms,
            Err(e) => {
                self.notifier.error(&self.tag, e.kind(), e.to_string());
                return;
            }
        };
        self.heartbeat_interval_ms = interval_ms;
        self.hello_seen = true;
        tracing::info!(interval_ms, "Hello received");

        let sequence = self.config.resume.then(|| self.resume.sequence.clone());
        let heartbeat = self.heartbeat.get_or_insert_with(HeartbeatScheduler::new);
        heartbeat.start(
            Duration::from_millis(interval_ms),
            HeartbeatFrames::new(sender.clone(), sequence),
            self.notifier.clone(),
            self.tag.clone(),
        );

        // A repeated Hello only resets the heartbeat
        if !self.dispatcher.is_running() {
            let notifier = self.notifier.clone();
            self.dispatcher
                .start(self.config.dispatch_tick, move |event| notifier.event(event));
        }

        self.state.transition(SessionState::Heartbeating);
    }

    /// The gateway may ask for a heartbeat outside the regular cadence
    fn heartbeat_now(&self, sender: &FrameSender) {
        let last = if self.config.resume {
            self.resume.sequence.get()
        } else {
            None
        };
        if let Err(e) = sender.send_text(FrameCodec::encode_heartbeat(last)) {
            self.notifier.error(
                &self.tag,
                ErrorKind::Heartbeat,
                format!("Failed to send heartbeat: {e}"),
            );
        }
    }

    fn track_resume(&mut self, frame: &InboundFrame) {
        self.resume.record_sequence(frame.sequence);

        match frame.op() {
            Some(OpCode::InvalidSession) => {
                tracing::info!("Session invalidated, next connection identifies fresh");
                self.resume.clear();
            }
            Some(OpCode::Dispatch) if frame.event_type_str() == "READY" => {
                let ready = frame
                    .payload
                    .clone()
                    .map(serde_json::from_value::<ReadyPayload>);
                match ready {
                    Some(Ok(ready)) => self.resume.record_ready(ready),
                    Some(Err(e)) => tracing::warn!(error = %e, "READY without session details"),
                    None => {}
                }
            }
            _ => {}
        }
    }

    /// Identify, or Resume when a previous session can be picked up
    fn send_handshake(&self, sender: &FrameSender) {
        let resumable = if self.config.resume {
            self.resume.resumable()
        } else {
            None
        };

        let (frame, what) = match resumable {
            Some((session_id, seq)) => (
                FrameCodec::encode_resume(&self.config.token, session_id, seq),
                "resume",
            ),
            None => (
                FrameCodec::encode_identify(
                    &self.config.token,
                    self.config.intents,
                    &self.config.properties,
                ),
                "identify",
            ),
        };

        match frame.and_then(|text| sender.send_text(text)) {
            Ok(()) => tracing::debug!(handshake = what, "Handshake queued"),
            Err(e) => self.notifier.error(
                &self.tag,
                ErrorKind::Identify,
                format!("Failed to send {what}: {e}"),
            ),
        }
    }

    /// Cancel the timers of the current connection
    async fn teardown(&mut self) {
        if let Some(mut heartbeat) = self.heartbeat.take() {
            heartbeat.cancel().await;
        }
        self.dispatcher.stop().await;
        self.heartbeat_interval_ms = 0;
    }

    fn finish(&mut self) {
        let discarded = self.queue.clear();
        if discarded > 0 {
            tracing::info!(tag = %self.tag, discarded, "Undelivered events discarded");
        }
        self.state.transition(SessionState::Disconnected);
        tracing::info!(tag = %self.tag, "Session ended");
    }
}

/// Forward queued frames to the socket until the channel closes or a close frame goes out
async fn write_loop(
    mut sink: SplitSink<WsStream, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(message) = rx.recv().await {
        let closing = matches!(message, Message::Close(_));
        if let Err(e) = sink.send(message).await {
            tracing::warn!(error = %e, "Failed to write to gateway socket");
            break;
        }
        if closing {
            break;
        }
    }
    let _ = sink.close().await;
    tracing::trace!("Socket writer finished");
}

async fn shutdown_writer(sender: FrameSender, mut writer: JoinHandle<()>) {
    drop(sender);
    if timeout(WRITER_SHUTDOWN, &mut writer).await.is_err() {
        tracing::warn!("Socket writer did not finish in time");
        writer.abort();
    }
}

impl std::fmt::Debug for GatewaySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewaySession")
            .field("tag", &self.tag)
            .field("state", &self.state.get())
            .field("heartbeat_interval_ms", &self.heartbeat_interval_ms)
            .field("depth", &self.queue.depth())
            .finish()
    }
}
