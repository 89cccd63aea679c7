//! EventStreamClient against an in-memory connector.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use tokenbridge_core::{
    ConnectorRequest, ConnectorResponse, ConnectorTransport, EventStreamClient, Method,
    RetrySettings, RetryingConnectorClient, TransportError,
};

#[derive(Default)]
struct FakeConnector {
    streams: Mutex<Vec<Value>>,
    subscriptions: Mutex<Vec<Value>>,
    log: Mutex<Vec<(Method, String)>>,
}

#[async_trait]
impl ConnectorTransport for FakeConnector {
    async fn send(&self, req: ConnectorRequest) -> Result<ConnectorResponse, TransportError> {
        self.log.lock().unwrap().push((req.method, req.path.clone()));
        let body = req.body.clone().unwrap_or(Value::Null);
        let resp = match (req.method, req.path.as_str()) {
            (Method::Get, "/eventstreams") => {
                ConnectorResponse::new(200, Value::Array(self.streams.lock().unwrap().clone()))
            }
            (Method::Post, "/eventstreams") => {
                let mut stream = body;
                stream["id"] = json!("es-1");
                self.streams.lock().unwrap().push(stream.clone());
                ConnectorResponse::new(200, stream)
            }
            (Method::Patch, path) if path.starts_with("/eventstreams/") => {
                let mut stream = body;
                stream["id"] = json!(path.trim_start_matches("/eventstreams/"));
                ConnectorResponse::new(200, stream)
            }
            (Method::Get, "/subscriptions") => ConnectorResponse::new(
                200,
                Value::Array(self.subscriptions.lock().unwrap().clone()),
            ),
            (Method::Get, path) if path.starts_with("/subscriptions/") => {
                let id = path.trim_start_matches("/subscriptions/");
                match self
                    .subscriptions
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|s| s["id"] == id)
                {
                    Some(sub) => ConnectorResponse::new(200, sub.clone()),
                    None => ConnectorResponse::new(404, Value::Null),
                }
            }
            (Method::Post, _) => {
                let mut subs = self.subscriptions.lock().unwrap();
                let mut sub = body;
                sub["id"] = json!(format!("sb-{}", subs.len() + 1));
                subs.push(sub.clone());
                ConnectorResponse::new(200, sub)
            }
            _ => ConnectorResponse::new(405, Value::Null),
        };
        Ok(resp)
    }

    fn url(&self) -> &str {
        "http://connector"
    }
}

fn client(fake: Arc<FakeConnector>) -> EventStreamClient {
    EventStreamClient::new(RetryingConnectorClient::new(fake, &RetrySettings::default()).unwrap())
}

#[tokio::test]
async fn create_then_update_stream_by_name() {
    let fake = Arc::new(FakeConnector::default());
    let es = client(fake.clone());

    let created = es.create_or_update_stream("token").await.unwrap();
    assert_eq!(created.id, "es-1");
    assert_eq!(created.name, "token");
    assert_eq!(fake.streams.lock().unwrap()[0]["websocket"]["topic"], "token");

    let updated = es.create_or_update_stream("token").await.unwrap();
    assert_eq!(updated.id, "es-1");
    let log = fake.log.lock().unwrap();
    assert!(log.contains(&(Method::Patch, "/eventstreams/es-1".to_string())));
    assert_eq!(fake.streams.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn get_or_create_subscription_is_idempotent() {
    let fake = Arc::new(FakeConnector::default());
    let es = client(fake.clone());

    let first = es
        .get_or_create_subscription("/contracts/0x1", "es-1", "TokenCreate", "token:base", "0")
        .await
        .unwrap();
    let second = es
        .get_or_create_subscription("/contracts/0x1", "es-1", "TokenCreate", "token:base", "0")
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(fake.subscriptions.lock().unwrap().len(), 1);
    assert!(fake
        .log
        .lock()
        .unwrap()
        .contains(&(Method::Post, "/contracts/0x1/TokenCreate".to_string())));

    // same name on a different stream is a different subscription
    es.get_or_create_subscription("/contracts/0x1", "es-2", "TokenCreate", "token:base", "0")
        .await
        .unwrap();
    assert_eq!(fake.subscriptions.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn missing_subscription_is_none() {
    let fake = Arc::new(FakeConnector::default());
    let es = client(fake);
    assert!(es.get_subscription("nope").await.unwrap().is_none());
}
