//! Event stream and subscription management on the connector.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::RetryingConnectorClient;
use crate::error::BridgeError;
use crate::request::ConnectorRequest;

/// A named, connector-side event delivery channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStream {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    #[serde(default, rename = "batchTimeoutMS", skip_serializing_if = "Option::is_none")]
    pub batch_timeout_ms: Option<u64>,
}

/// A filter over one event signature, bound to a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStreamSubscription {
    pub id: String,
    pub name: String,
    pub stream: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_block: Option<String>,
}

/// Stream/subscription CRUD over a [`RetryingConnectorClient`].
#[derive(Clone)]
pub struct EventStreamClient {
    client: RetryingConnectorClient,
}

impl EventStreamClient {
    pub fn new(client: RetryingConnectorClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RetryingConnectorClient {
        &self.client
    }

    pub async fn get_streams(&self) -> Result<Vec<EventStream>, BridgeError> {
        self.client
            .send_json(ConnectorRequest::get("/eventstreams"))
            .await
    }

    /// Look up a stream by name.
    pub async fn find_stream(&self, name: &str) -> Result<Option<EventStream>, BridgeError> {
        Ok(self
            .get_streams()
            .await?
            .into_iter()
            .find(|s| s.name == name))
    }

    /// Create the stream named `topic`, or patch it if one already exists.
    pub async fn create_or_update_stream(&self, topic: &str) -> Result<EventStream, BridgeError> {
        let details = json!({
            "name": topic,
            "errorHandling": "block",
            "batchSize": 50,
            "batchTimeoutMS": 500,
            "type": "websocket",
            "websocket": { "topic": topic },
            // spelling is the connector's
            "blockedReryDelaySec": 30,
            "inputs": true,
            "timestamps": true,
        });

        let stream: EventStream = match self.find_stream(topic).await? {
            Some(existing) => {
                self.client
                    .send_json(ConnectorRequest::patch(
                        format!("/eventstreams/{}", existing.id),
                        details,
                    ))
                    .await?
            }
            None => {
                self.client
                    .send_json(ConnectorRequest::post("/eventstreams", details))
                    .await?
            }
        };
        tracing::info!(topic, stream_id = %stream.id, "event stream ready");
        Ok(stream)
    }

    /// Delete a stream; the connector cascades to its subscriptions.
    pub async fn delete_stream(&self, id: &str) -> Result<(), BridgeError> {
        self.client
            .send(ConnectorRequest::delete(format!("/eventstreams/{id}")))
            .await?;
        Ok(())
    }

    pub async fn get_subscriptions(&self) -> Result<Vec<EventStreamSubscription>, BridgeError> {
        self.client
            .send_json(ConnectorRequest::get("/subscriptions"))
            .await
    }

    /// Fetch one subscription; `None` if the connector no longer knows it.
    pub async fn get_subscription(
        &self,
        id: &str,
    ) -> Result<Option<EventStreamSubscription>, BridgeError> {
        self.client
            .send_optional(ConnectorRequest::get(format!("/subscriptions/{id}")))
            .await
    }

    /// Subscribe `stream_id` to `event` on the contract at `instance_path`.
    pub async fn create_subscription(
        &self,
        instance_path: &str,
        stream_id: &str,
        event: &str,
        name: &str,
        from_block: &str,
    ) -> Result<EventStreamSubscription, BridgeError> {
        let sub: EventStreamSubscription = self
            .client
            .send_json(ConnectorRequest::post(
                format!("{instance_path}/{event}"),
                json!({
                    "name": name,
                    "stream": stream_id,
                    "fromBlock": from_block,
                }),
            ))
            .await?;
        tracing::info!(event, subscription_id = %sub.id, "created subscription");
        Ok(sub)
    }

    /// Reuse a subscription with the same name on the same stream, or create it.
    pub async fn get_or_create_subscription(
        &self,
        instance_path: &str,
        stream_id: &str,
        event: &str,
        name: &str,
        from_block: &str,
    ) -> Result<EventStreamSubscription, BridgeError> {
        let existing = self
            .get_subscriptions()
            .await?
            .into_iter()
            .find(|s| s.name == name && s.stream == stream_id);
        if let Some(sub) = existing {
            tracing::info!(event, subscription_id = %sub.id, "existing subscription");
            return Ok(sub);
        }
        self.create_subscription(instance_path, stream_id, event, name, from_block)
            .await
    }
}
