//! Event-stream socket: one long-lived feed connection per connector.
//!
//! A background task owns the connection and runs a small state machine:
//!
//! ```text
//! Disconnected ─► Connecting ─► Connected ──(drop / ping timeout)──► ReconnectWait ─┐
//!                     ▲                                                             │
//!                     └──────────────────── reconnect_delay ───────────────────────┘
//! any state ──close()──► Closing ─► Closed
//! ```
//!
//! Every successful connect re-issues `listen` and `listenreplies` for the
//! topic. Acks are explicit; the connector redelivers an unacked batch after
//! a reconnect, so delivery is at-least-once.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use tokenbridge_core::config::FeedSettings;
use tokenbridge_core::error::TransportError;
use tokenbridge_core::event::{EventStreamReply, RawChainEvent};

use crate::timer::Timer;
use crate::transport::{FeedConnection, FeedFrame, FeedTransport};

/// One delivery from the connector; acked as a unit.
pub type EventBatch = Vec<RawChainEvent>;

#[derive(Debug, Clone)]
pub struct SocketConfig {
    pub topic: String,
    pub reconnect_delay: Duration,
    pub ping_interval: Duration,
    pub ping_timeout: Duration,
}

impl SocketConfig {
    pub fn new(topic: impl Into<String>, feed: &FeedSettings) -> Self {
        Self {
            topic: topic.into(),
            reconnect_delay: feed.reconnect_delay(),
            ping_interval: feed.ping_interval(),
            ping_timeout: feed.ping_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    ReconnectWait,
    Closing,
    Closed,
}

/// A parsed text frame from the feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    Batch(EventBatch),
    Reply(EventStreamReply),
}

impl FeedMessage {
    /// JSON arrays are event batches; any other JSON value is a reply.
    ///
    /// Batch entries are decoded one by one. A malformed entry is logged and
    /// dropped; the rest of the batch survives, and an all-malformed batch is
    /// still returned (empty) so it gets acked.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str::<Value>(text)? {
            Value::Array(items) => Ok(Self::Batch(decode_batch(items))),
            other => Ok(Self::Reply(serde_json::from_value(other)?)),
        }
    }
}

fn decode_batch(items: Vec<Value>) -> EventBatch {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<RawChainEvent>(item) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::error!(index, error = %e, "dropping malformed event from batch");
                None
            }
        })
        .collect()
}

/// Receiving ends handed out by [`EventStreamSocket::connect`].
pub struct FeedReceivers {
    pub batches: mpsc::UnboundedReceiver<EventBatch>,
    pub replies: mpsc::UnboundedReceiver<EventStreamReply>,
}

enum SocketCommand {
    Ack,
    Close,
}

/// Handle to the background feed task.
pub struct EventStreamSocket {
    topic: String,
    cmd_tx: mpsc::UnboundedSender<SocketCommand>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl EventStreamSocket {
    /// Start the background task. Connecting happens asynchronously; watch
    /// [`state`](Self::state) to observe it.
    pub fn connect(transport: Arc<dyn FeedTransport>, config: SocketConfig) -> (Self, FeedReceivers) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (batch_tx, batches) = mpsc::unbounded_channel();
        let (reply_tx, replies) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let topic = config.topic.clone();

        let task = SocketTask {
            transport,
            config,
            cmd_rx,
            batch_tx,
            reply_tx,
            state_tx,
            disconnect_detected: false,
        };
        tokio::spawn(task.run());

        (
            Self {
                topic,
                cmd_tx,
                state_rx,
            },
            FeedReceivers { batches, replies },
        )
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Acknowledge the oldest unacknowledged batch.
    pub fn ack(&self) -> Result<(), TransportError> {
        self.cmd_tx
            .send(SocketCommand::Ack)
            .map_err(|_| TransportError::WebSocket("feed task closed".into()))
    }

    /// Close the feed. No reconnect follows.
    pub fn close(&self) {
        let _ = self.cmd_tx.send(SocketCommand::Close);
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Wait until the socket reaches `target`.
    pub async fn wait_for(&self, target: ConnectionState) {
        let mut rx = self.state_rx.clone();
        let _ = rx.wait_for(|s| *s == target).await;
    }
}

impl Drop for EventStreamSocket {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(SocketCommand::Close);
    }
}

enum SessionEnd {
    Dropped,
    CloseRequested,
}

struct SocketTask {
    transport: Arc<dyn FeedTransport>,
    config: SocketConfig,
    cmd_rx: mpsc::UnboundedReceiver<SocketCommand>,
    batch_tx: mpsc::UnboundedSender<EventBatch>,
    reply_tx: mpsc::UnboundedSender<EventStreamReply>,
    state_tx: watch::Sender<ConnectionState>,
    disconnect_detected: bool,
}

impl SocketTask {
    async fn run(mut self) {
        loop {
            self.state_tx.send_replace(ConnectionState::Connecting);
            let end = match self.transport.connect().await {
                Ok(conn) => {
                    if self.disconnect_detected {
                        tracing::info!(url = %self.transport.url(), "Event stream websocket restored");
                        self.disconnect_detected = false;
                    } else {
                        tracing::info!(url = %self.transport.url(), "Event stream websocket connected");
                    }
                    self.session(conn).await
                }
                Err(e) => {
                    tracing::error!(url = %self.transport.url(), error = %e, "Event stream websocket connect failed");
                    SessionEnd::Dropped
                }
            };

            if let SessionEnd::CloseRequested = end {
                break;
            }

            self.disconnect_detected = true;
            self.state_tx.send_replace(ConnectionState::ReconnectWait);
            tracing::error!(
                delay_ms = self.config.reconnect_delay.as_millis() as u64,
                "Event stream websocket disconnected, attempting to reconnect"
            );
            if !self.wait_reconnect_delay().await {
                break;
            }
        }
        self.state_tx.send_replace(ConnectionState::Closed);
        tracing::info!(topic = %self.config.topic, "Event stream websocket closed");
    }

    /// Sleep out the reconnect delay. Returns `false` if a close arrived meanwhile.
    async fn wait_reconnect_delay(&mut self) -> bool {
        let deadline = Instant::now() + self.config.reconnect_delay;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => return true,
                cmd = self.cmd_rx.recv() => match cmd {
                    None | Some(SocketCommand::Close) => {
                        self.state_tx.send_replace(ConnectionState::Closing);
                        return false;
                    }
                    Some(SocketCommand::Ack) => {
                        // the batch will be redelivered on reconnect
                        tracing::debug!("ack dropped while disconnected");
                    }
                }
            }
        }
    }

    async fn session(&mut self, mut conn: Box<dyn FeedConnection>) -> SessionEnd {
        let topic = self.config.topic.clone();
        let handshake = [
            json!({ "type": "listen", "topic": topic }),
            json!({ "type": "listenreplies" }),
        ];
        for frame in handshake {
            if let Err(e) = conn.send(FeedFrame::Text(frame.to_string())).await {
                tracing::error!(error = %e, "Event stream listen failed");
                return SessionEnd::Dropped;
            }
        }
        self.state_tx.send_replace(ConnectionState::Connected);

        let mut ping_timer = Timer::new();
        let mut pong_deadline = Timer::new();
        if let Err(e) = conn.send(FeedFrame::Ping).await {
            tracing::error!(error = %e, "Event stream ping failed");
            return SessionEnd::Dropped;
        }
        pong_deadline.arm(self.config.ping_timeout);

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(SocketCommand::Ack) => {
                        let ack = json!({ "type": "ack", "topic": topic });
                        if let Err(e) = conn.send(FeedFrame::Text(ack.to_string())).await {
                            tracing::error!(error = %e, "Event stream ack failed");
                            return SessionEnd::Dropped;
                        }
                    }
                    None | Some(SocketCommand::Close) => {
                        self.state_tx.send_replace(ConnectionState::Closing);
                        conn.terminate().await;
                        return SessionEnd::CloseRequested;
                    }
                },
                frame = conn.recv() => match frame {
                    None | Some(Ok(FeedFrame::Close)) => return SessionEnd::Dropped,
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Event stream websocket error");
                        return SessionEnd::Dropped;
                    }
                    Some(Ok(FeedFrame::Text(text))) => self.dispatch(&text),
                    Some(Ok(FeedFrame::Pong)) => {
                        pong_deadline.cancel();
                        ping_timer.arm(self.config.ping_interval);
                    }
                    Some(Ok(FeedFrame::Ping)) => {}
                },
                _ = ping_timer.expired() => {
                    ping_timer.cancel();
                    if let Err(e) = conn.send(FeedFrame::Ping).await {
                        tracing::error!(error = %e, "Event stream ping failed");
                        return SessionEnd::Dropped;
                    }
                    pong_deadline.arm(self.config.ping_timeout);
                }
                _ = pong_deadline.expired() => {
                    tracing::error!(
                        timeout_ms = self.config.ping_timeout.as_millis() as u64,
                        "Event stream ping timeout"
                    );
                    conn.terminate().await;
                    return SessionEnd::Dropped;
                }
            }
        }
    }

    fn dispatch(&self, text: &str) {
        match FeedMessage::parse(text) {
            Ok(FeedMessage::Batch(batch)) => {
                for event in &batch {
                    tracing::debug!(signature = %event.signature, sub_id = %event.sub_id, "feed event");
                }
                if self.batch_tx.send(batch).is_err() {
                    tracing::debug!("no batch receiver; dropping");
                }
            }
            Ok(FeedMessage::Reply(reply)) => {
                tracing::debug!(request_id = %reply.headers.request_id, kind = %reply.headers.kind, "feed reply");
                if self.reply_tx.send(reply).is_err() {
                    tracing::debug!("no reply receiver; dropping");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Event stream message could not be parsed");
            }
        }
    }
}
