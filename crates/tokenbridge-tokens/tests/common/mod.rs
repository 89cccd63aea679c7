//! In-memory connector and event feed shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use tokenbridge_core::{
    BridgeConfig, ConnectorRequest, ConnectorResponse, ConnectorTransport, EventStreamClient,
    Method, RawChainEvent, RetrySettings, RetryingConnectorClient, TransportError,
};
use tokenbridge_ws::{FeedConnection, FeedFrame, FeedTransport};

pub const TOPIC: &str = "tok";
pub const INSTANCE: &str = "/contracts/0xabc";
pub const ZERO: &str = "0x0000000000000000000000000000000000000000";

const SUBSCRIBABLE: [&str; 3] = ["TokenCreate", "TransferSingle", "TransferBatch"];

#[derive(Default)]
pub struct FakeConnector {
    pub streams: Mutex<Vec<Value>>,
    pub subscriptions: Mutex<Vec<Value>>,
    pub requests: Mutex<Vec<ConnectorRequest>>,
    pub receipts: Mutex<HashMap<String, Value>>,
    pub uri_template: Mutex<Option<String>>,
    pub uri_calls: AtomicUsize,
    /// Reject stream listing with a 400.
    pub reject_streams: AtomicBool,
    next_id: AtomicUsize,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn seed_stream(&self, id: &str, name: &str) {
        self.streams
            .lock()
            .unwrap()
            .push(json!({ "id": id, "name": name }));
    }

    pub fn seed_subscription(&self, id: &str, name: &str, stream: &str) {
        self.subscriptions
            .lock()
            .unwrap()
            .push(json!({ "id": id, "name": name, "stream": stream }));
    }

    pub fn set_uri_template(&self, template: &str) {
        *self.uri_template.lock().unwrap() = Some(template.to_string());
    }

    pub fn subscription_names(&self) -> Vec<String> {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| s["name"].as_str().map(str::to_string))
            .collect()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ConnectorRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests_to(method, path).len()
    }

    fn route(&self, req: &ConnectorRequest) -> ConnectorResponse {
        let body = req.body.clone().unwrap_or(Value::Null);
        let path = req.path.as_str();
        match req.method {
            Method::Get if path == "/eventstreams" => {
                if self.reject_streams.load(Ordering::SeqCst) {
                    return ConnectorResponse::new(400, json!("bad request"));
                }
                ConnectorResponse::new(200, Value::Array(self.streams.lock().unwrap().clone()))
            }
            Method::Post if path == "/eventstreams" => {
                let mut stream = body;
                stream["id"] = json!(format!("es-{}", self.next_id()));
                self.streams.lock().unwrap().push(stream.clone());
                ConnectorResponse::new(200, stream)
            }
            Method::Patch if path.starts_with("/eventstreams/") => {
                let mut stream = body;
                stream["id"] = json!(path.trim_start_matches("/eventstreams/"));
                ConnectorResponse::new(200, stream)
            }
            Method::Delete if path.starts_with("/eventstreams/") => {
                let id = path.trim_start_matches("/eventstreams/");
                self.streams.lock().unwrap().retain(|s| s["id"] != id);
                self.subscriptions.lock().unwrap().retain(|s| s["stream"] != id);
                ConnectorResponse::new(204, Value::Null)
            }
            Method::Get if path == "/subscriptions" => ConnectorResponse::new(
                200,
                Value::Array(self.subscriptions.lock().unwrap().clone()),
            ),
            Method::Get if path.starts_with("/subscriptions/") => {
                let id = path.trim_start_matches("/subscriptions/");
                let subs = self.subscriptions.lock().unwrap();
                match subs.iter().find(|s| s["id"] == id) {
                    Some(sub) => ConnectorResponse::new(200, sub.clone()),
                    None => ConnectorResponse::new(404, Value::Null),
                }
            }
            Method::Get if path.starts_with("/reply/") => {
                let id = path.trim_start_matches("/reply/");
                match self.receipts.lock().unwrap().get(id) {
                    Some(reply) => ConnectorResponse::new(200, reply.clone()),
                    None => ConnectorResponse::new(404, json!({ "error": "not found" })),
                }
            }
            Method::Get if path == format!("{INSTANCE}/uri") => {
                self.uri_calls.fetch_add(1, Ordering::SeqCst);
                match self.uri_template.lock().unwrap().clone() {
                    Some(t) => ConnectorResponse::new(200, json!({ "output": t })),
                    None => ConnectorResponse::new(404, Value::Null),
                }
            }
            Method::Get if path == format!("{INSTANCE}/balanceOf") => {
                ConnectorResponse::new(200, json!({ "output": "42" }))
            }
            Method::Post if path.starts_with(INSTANCE) => {
                let method = path.trim_start_matches(INSTANCE).trim_start_matches('/');
                let n = self.next_id();
                if SUBSCRIBABLE.contains(&method) {
                    let mut sub = body;
                    sub["id"] = json!(format!("sb-{n}"));
                    self.subscriptions.lock().unwrap().push(sub.clone());
                    ConnectorResponse::new(200, sub)
                } else {
                    ConnectorResponse::new(202, json!({ "sent": true, "id": format!("op-{n}") }))
                }
            }
            _ => ConnectorResponse::new(405, Value::Null),
        }
    }
}

#[async_trait]
impl ConnectorTransport for FakeConnector {
    async fn send(&self, req: ConnectorRequest) -> Result<ConnectorResponse, TransportError> {
        self.requests.lock().unwrap().push(req.clone());
        Ok(self.route(&req))
    }

    fn url(&self) -> &str {
        "http://connector"
    }
}

pub fn client(fake: &Arc<FakeConnector>) -> RetryingConnectorClient {
    RetryingConnectorClient::new(fake.clone(), &RetrySettings::default()).unwrap()
}

pub fn streams(fake: &Arc<FakeConnector>) -> EventStreamClient {
    EventStreamClient::new(client(fake))
}

pub fn config() -> BridgeConfig {
    let mut config = BridgeConfig::new("http://connector");
    config.topic = TOPIC.to_string();
    config.instance_path = INSTANCE.to_string();
    config
}

/// A chain event at block 100, tx index 0x2, log index 1.
pub fn chain_event(sub_id: &str, signature: &str, data: Value) -> RawChainEvent {
    serde_json::from_value(json!({
        "subId": sub_id,
        "signature": signature,
        "address": "0xabc",
        "blockNumber": "100",
        "transactionIndex": "0x2",
        "transactionHash": "0xfeed",
        "logIndex": "1",
        "data": data,
    }))
    .unwrap()
}

// ---------------------------------------------------------------------------
// Event feed
// ---------------------------------------------------------------------------

pub struct Peer {
    pub to_client: mpsc::UnboundedSender<FeedFrame>,
    pub from_client: mpsc::UnboundedReceiver<FeedFrame>,
}

impl Peer {
    /// Next text frame as JSON, skipping pings.
    pub async fn next_json(&mut self) -> Value {
        loop {
            match self.from_client.recv().await.expect("client went away") {
                FeedFrame::Text(text) => return serde_json::from_str(&text).unwrap(),
                FeedFrame::Ping => continue,
                other => panic!("unexpected frame {other:?}"),
            }
        }
    }

    pub fn send_json(&self, value: Value) {
        self.to_client.send(FeedFrame::Text(value.to_string())).unwrap();
    }
}

struct ChannelConnection {
    inbound: mpsc::UnboundedReceiver<FeedFrame>,
    outbound: mpsc::UnboundedSender<FeedFrame>,
}

#[async_trait]
impl FeedConnection for ChannelConnection {
    async fn send(&mut self, frame: FeedFrame) -> Result<(), TransportError> {
        self.outbound
            .send(frame)
            .map_err(|_| TransportError::WebSocket("peer gone".into()))
    }

    async fn recv(&mut self) -> Option<Result<FeedFrame, TransportError>> {
        self.inbound.recv().await.map(Ok)
    }

    async fn terminate(self: Box<Self>) {}
}

pub struct ChannelFeed {
    peers: mpsc::UnboundedSender<Peer>,
}

impl ChannelFeed {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Peer>) {
        let (peers, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { peers }), rx)
    }
}

#[async_trait]
impl FeedTransport for ChannelFeed {
    async fn connect(&self) -> Result<Box<dyn FeedConnection>, TransportError> {
        let (to_client, inbound) = mpsc::unbounded_channel();
        let (outbound, from_client) = mpsc::unbounded_channel();
        let _ = self.peers.send(Peer {
            to_client,
            from_client,
        });
        Ok(Box::new(ChannelConnection { inbound, outbound }))
    }

    fn url(&self) -> &str {
        "ws://connector/ws"
    }
}
