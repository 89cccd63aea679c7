//! Feed transport seam.
//!
//! The socket state machine talks to a `FeedConnection` rather than to
//! tungstenite directly, so keepalive and reconnect behaviour can be driven
//! by an in-memory peer under paused time.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, AUTHORIZATION};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use tokenbridge_core::error::TransportError;

/// A frame on the feed, reduced to what the socket cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedFrame {
    Text(String),
    Ping,
    Pong,
    Close,
}

/// One open feed connection.
#[async_trait]
pub trait FeedConnection: Send {
    async fn send(&mut self, frame: FeedFrame) -> Result<(), TransportError>;

    /// Next inbound frame; `None` once the peer has gone away.
    async fn recv(&mut self) -> Option<Result<FeedFrame, TransportError>>;

    /// Drop the connection without a closing handshake.
    async fn terminate(self: Box<Self>);
}

/// Opens feed connections to a single endpoint.
#[async_trait]
pub trait FeedTransport: Send + Sync + 'static {
    async fn connect(&self) -> Result<Box<dyn FeedConnection>, TransportError>;

    fn url(&self) -> &str;
}

// ---------------------------------------------------------------------------
// tungstenite implementation
// ---------------------------------------------------------------------------

/// Websocket transport for the connector's `/ws` endpoint.
#[derive(Debug, Clone)]
pub struct WsFeedTransport {
    url: String,
    username: String,
    password: String,
}

impl WsFeedTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: String::new(),
            password: String::new(),
        }
    }

    /// Send basic auth on the upgrade request. Ignored unless both parts are non-empty.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    fn authorization(&self) -> Option<String> {
        if self.username.is_empty() || self.password.is_empty() {
            return None;
        }
        let raw = format!("{}:{}", self.username, self.password);
        Some(format!("Basic {}", BASE64_STANDARD.encode(raw)))
    }
}

#[async_trait]
impl FeedTransport for WsFeedTransport {
    async fn connect(&self) -> Result<Box<dyn FeedConnection>, TransportError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::WebSocket(e.to_string()))?;

        if let Some(auth) = self.authorization() {
            let value = HeaderValue::from_str(&auth)
                .map_err(|e| TransportError::WebSocket(format!("invalid auth header: {e}")))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (ws, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))?;
        Ok(Box::new(WsFeedConnection { ws }))
    }

    fn url(&self) -> &str {
        &self.url
    }
}

struct WsFeedConnection {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FeedConnection for WsFeedConnection {
    async fn send(&mut self, frame: FeedFrame) -> Result<(), TransportError> {
        let msg = match frame {
            FeedFrame::Text(text) => Message::Text(text.into()),
            FeedFrame::Ping => Message::Ping(Default::default()),
            FeedFrame::Pong => Message::Pong(Default::default()),
            FeedFrame::Close => Message::Close(None),
        };
        self.ws
            .send(msg)
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<FeedFrame, TransportError>> {
        loop {
            let frame = match self.ws.next().await? {
                Err(e) => return Some(Err(TransportError::WebSocket(e.to_string()))),
                Ok(Message::Text(text)) => FeedFrame::Text(text.as_str().to_owned()),
                Ok(Message::Binary(bytes)) => {
                    FeedFrame::Text(String::from_utf8_lossy(&bytes).into_owned())
                }
                // tungstenite queues the pong reply itself
                Ok(Message::Ping(_)) => FeedFrame::Ping,
                Ok(Message::Pong(_)) => FeedFrame::Pong,
                Ok(Message::Close(_)) => FeedFrame::Close,
                Ok(Message::Frame(_)) => continue,
            };
            return Some(Ok(frame));
        }
    }

    async fn terminate(self: Box<Self>) {
        // dropping the stream closes the TCP connection
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_auth_header_without_both_credentials() {
        let t = WsFeedTransport::new("ws://localhost:5102/ws");
        assert!(t.authorization().is_none());
        let t = t.with_credentials("user", "");
        assert!(t.authorization().is_none());
    }

    #[test]
    fn basic_auth_header() {
        let t = WsFeedTransport::new("ws://localhost:5102/ws").with_credentials("user", "pass");
        assert_eq!(t.authorization().as_deref(), Some("Basic dXNlcjpwYXNz"));
    }

    #[tokio::test]
    async fn connect_to_closed_port_fails() {
        let t = WsFeedTransport::new("ws://127.0.0.1:9/ws");
        let err = t.connect().await.err().expect("connection should fail");
        assert!(matches!(err, TransportError::WebSocket(_)));
    }
}
