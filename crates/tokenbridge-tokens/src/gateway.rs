//! Fan-out from the event feed to transformers and on to subscribers.
//!
//! A batch is acknowledged only after every notification derived from it
//! has been handed to at least one subscriber. Until a subscriber attaches
//! the batch is held unacknowledged.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};

use tokenbridge_core::codec::SUBSCRIPTION_DELIMITER;
use tokenbridge_core::error::BridgeError;
use tokenbridge_core::event::{EventStreamReply, RawChainEvent};
use tokenbridge_core::notification::{Notification, ReceiptEvent};
use tokenbridge_core::EventStreamClient;
use tokenbridge_ws::{EventBatch, EventStreamSocket, FeedReceivers};

use crate::transformer::EventTransformer;

/// Maps a subscription id (as carried on each event) to its name.
#[async_trait]
pub trait SubscriptionResolver: Send + Sync {
    async fn subscription_name(&self, sub_id: &str) -> Result<Option<String>, BridgeError>;
}

/// Resolver backed by the connector, caching every id it has seen.
pub struct CachedSubscriptionResolver {
    streams: EventStreamClient,
    cache: Mutex<HashMap<String, String>>,
}

impl CachedSubscriptionResolver {
    pub fn new(streams: EventStreamClient) -> Self {
        Self {
            streams,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SubscriptionResolver for CachedSubscriptionResolver {
    async fn subscription_name(&self, sub_id: &str) -> Result<Option<String>, BridgeError> {
        let cached = self
            .cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(sub_id)
            .cloned();
        if cached.is_some() {
            return Ok(cached);
        }
        let Some(sub) = self.streams.get_subscription(sub_id).await? else {
            return Ok(None);
        };
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(sub_id.to_string(), sub.name.clone());
        Ok(Some(sub.name))
    }
}

pub struct ProxyGateway {
    transformers: HashMap<String, Arc<dyn EventTransformer>>,
    resolver: Arc<dyn SubscriptionResolver>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<Notification>>>,
    subscriber_added: Notify,
    retry_delay: Duration,
}

impl ProxyGateway {
    pub fn new(resolver: Arc<dyn SubscriptionResolver>) -> Self {
        Self {
            transformers: HashMap::new(),
            resolver,
            subscribers: Mutex::new(Vec::new()),
            subscriber_added: Notify::new(),
            retry_delay: Duration::from_secs(5),
        }
    }

    /// Delay before a batch whose subscriptions could not be resolved is retried.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Register a transformer for the topic it reports. Replaces any previous
    /// transformer for the same topic.
    pub fn register(&mut self, transformer: Arc<dyn EventTransformer>) {
        self.transformers
            .insert(transformer.topic().to_string(), transformer);
    }

    /// Attach a subscriber. Notifications arrive in the order they were derived.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock_subscribers().push(tx);
        self.subscriber_added.notify_waiters();
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subs = self.lock_subscribers();
        subs.retain(|s| !s.is_closed());
        subs.len()
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<Notification>>> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Transformer owning `subscription_name`; the longest matching topic wins.
    fn transformer_for(&self, subscription_name: &str) -> Option<&Arc<dyn EventTransformer>> {
        self.transformers
            .iter()
            .filter(|(topic, _)| {
                subscription_name
                    .strip_prefix(topic.as_str())
                    .is_some_and(|rest| rest.starts_with(SUBSCRIPTION_DELIMITER))
            })
            .max_by_key(|(topic, _)| topic.len())
            .map(|(_, t)| t)
    }

    /// Transform every event of a batch, preserving order.
    ///
    /// Events whose subscription is unknown, or whose topic has no
    /// transformer, are skipped. Fails only if a subscription lookup fails.
    pub async fn process_batch(&self, batch: &[RawChainEvent]) -> Result<Vec<Notification>, BridgeError> {
        let mut out = Vec::new();
        for event in batch {
            let Some(name) = self.resolver.subscription_name(&event.sub_id).await? else {
                tracing::warn!(sub_id = %event.sub_id, "event from unknown subscription");
                continue;
            };
            let Some(transformer) = self.transformer_for(&name) else {
                tracing::warn!(subscription = %name, "no transformer for subscription");
                continue;
            };
            out.extend(transformer.transform(&name, event).await);
        }
        Ok(out)
    }

    async fn wait_for_subscriber(&self) {
        loop {
            let added = self.subscriber_added.notified();
            if self.subscriber_count() > 0 {
                return;
            }
            tracing::debug!("holding batch until a subscriber attaches");
            added.await;
        }
    }

    /// Hand `notifications` to every live subscriber, waiting for one to
    /// exist. Returns once at least one subscriber took the whole set.
    pub async fn deliver(&self, notifications: &[Notification]) {
        loop {
            self.wait_for_subscriber().await;
            let delivered = {
                let mut subs = self.lock_subscribers();
                subs.retain(|tx| notifications.iter().all(|n| tx.send(n.clone()).is_ok()));
                !subs.is_empty()
            };
            if delivered {
                return;
            }
        }
    }

    /// Forward to current subscribers only; receipts are not held.
    fn broadcast(&self, notification: &Notification) {
        self.lock_subscribers()
            .retain(|tx| tx.send(notification.clone()).is_ok());
    }

    async fn handle_batch(&self, socket: &EventStreamSocket, batch: EventBatch) {
        let notifications = loop {
            match self.process_batch(&batch).await {
                Ok(n) => break n,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        delay_ms = self.retry_delay.as_millis() as u64,
                        "could not resolve batch subscriptions, retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        };
        if !notifications.is_empty() {
            self.deliver(&notifications).await;
        }
        for n in &notifications {
            tracing::debug!(event = n.event_name(), pool_id = ?n.pool_id(), "notification delivered");
        }
        if let Err(e) = socket.ack() {
            tracing::error!(error = %e, "could not ack batch");
        }
    }

    fn handle_reply(&self, reply: EventStreamReply) {
        let receipt = Notification::Receipt(ReceiptEvent {
            success: reply.is_success(),
            id: reply.headers.request_id,
            message: reply.error_message,
        });
        self.broadcast(&receipt);
    }

    /// Pump the feed until it closes.
    ///
    /// Replies are forwarded from their own task, so receipts keep flowing
    /// while a batch waits for a subscriber or for its subscriptions to resolve.
    pub async fn run(self: Arc<Self>, socket: EventStreamSocket, feed: FeedReceivers) {
        let FeedReceivers {
            mut batches,
            mut replies,
        } = feed;

        let gateway = Arc::clone(&self);
        let receipts = tokio::spawn(async move {
            while let Some(reply) = replies.recv().await {
                gateway.handle_reply(reply);
            }
        });

        while let Some(batch) = batches.recv().await {
            self.handle_batch(&socket, batch).await;
        }
        receipts.abort();
        tracing::info!(topic = %socket.topic(), "event feed closed; gateway stopping");
    }
}
