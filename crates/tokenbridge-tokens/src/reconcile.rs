//! Startup reconciliation of connector subscriptions.
//!
//! If the stream for our topic carries subscriptions that do not match the
//! current naming scheme or event set, the stream is deleted and the
//! baseline recreated. Deleting the stream makes the connector redeliver
//! every historical pool and transfer event, which downstream consumers
//! absorb idempotently.

use std::collections::BTreeSet;

use tokenbridge_core::codec::{unpack_subscription_name, BASE_SUBSCRIPTION};
use tokenbridge_core::error::BridgeError;
use tokenbridge_core::eventstream::{EventStreamClient, EventStreamSubscription};

use crate::events::POOL_EVENTS;
use crate::service::init_stream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No stream named after the topic exists yet.
    NoStream,
    /// The stream exists but has no subscriptions.
    NoSubscriptions,
    /// Only the bootstrap subscription exists; no pools activated yet.
    BaseOnly,
    /// Every per-pool event is subscribed.
    Consistent,
    /// The stream was deleted and the baseline recreated.
    Recreated,
}

/// Distinct event kinds among `subs`, decoded against `topic`.
pub fn event_kinds(topic: &str, subs: &[EventStreamSubscription]) -> BTreeSet<String> {
    subs.iter()
        .filter_map(|s| {
            unpack_subscription_name(topic, &s.name)
                .event_kind()
                .map(str::to_string)
        })
        .collect()
}

/// `true` when `kinds` is neither the base-only state nor a complete per-pool set.
pub fn is_stale(kinds: &BTreeSet<String>) -> bool {
    if kinds.len() == 1 && kinds.contains(BASE_SUBSCRIPTION) {
        return false;
    }
    POOL_EVENTS.iter().any(|e| !kinds.contains(*e))
}

pub struct ReconciliationService {
    streams: EventStreamClient,
    topic: String,
    instance_path: String,
}

impl ReconciliationService {
    pub fn new(
        streams: EventStreamClient,
        topic: impl Into<String>,
        instance_path: impl Into<String>,
    ) -> Self {
        Self {
            streams,
            topic: topic.into(),
            instance_path: instance_path.into(),
        }
    }

    pub async fn run(&self) -> Result<ReconcileOutcome, BridgeError> {
        let Some(stream) = self.streams.find_stream(&self.topic).await? else {
            return Ok(ReconcileOutcome::NoStream);
        };
        let subs: Vec<_> = self
            .streams
            .get_subscriptions()
            .await?
            .into_iter()
            .filter(|s| s.stream == stream.id)
            .collect();
        if subs.is_empty() {
            return Ok(ReconcileOutcome::NoSubscriptions);
        }

        let kinds = event_kinds(&self.topic, &subs);
        if !is_stale(&kinds) {
            return Ok(if kinds.len() == 1 {
                ReconcileOutcome::BaseOnly
            } else {
                ReconcileOutcome::Consistent
            });
        }

        tracing::warn!(
            topic = %self.topic,
            stream_id = %stream.id,
            found = ?kinds,
            "Incorrect event stream subscriptions found - deleting and recreating"
        );
        self.streams.delete_stream(&stream.id).await?;
        init_stream(&self.streams, &self.topic, &self.instance_path).await?;
        Ok(ReconcileOutcome::Recreated)
    }

    /// Run, logging instead of propagating failures so startup proceeds.
    pub async fn run_at_startup(&self) -> Option<ReconcileOutcome> {
        match self.run().await {
            Ok(outcome) => {
                tracing::info!(topic = %self.topic, ?outcome, "subscription reconciliation finished");
                Some(outcome)
            }
            Err(e) => {
                tracing::error!(topic = %self.topic, error = %e, "subscription reconciliation failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(name: &str) -> EventStreamSubscription {
        EventStreamSubscription {
            id: name.to_string(),
            name: name.to_string(),
            stream: "es-1".into(),
            from_block: None,
        }
    }

    fn kinds(names: &[&str]) -> BTreeSet<String> {
        let subs: Vec<_> = names.iter().map(|n| sub(n)).collect();
        event_kinds("tok", &subs)
    }

    #[test]
    fn base_only_is_valid() {
        let k = kinds(&["tok:base"]);
        assert_eq!(k.len(), 1);
        assert!(!is_stale(&k));
    }

    #[test]
    fn missing_batch_subscription_is_stale() {
        assert!(is_stale(&kinds(&["tok:base", "tok:F1:TokenCreate", "tok:F1:TransferSingle"])));
    }

    #[test]
    fn full_set_is_consistent() {
        assert!(!is_stale(&kinds(&[
            "tok:base",
            "tok:F1:TokenCreate",
            "tok:F1:TransferSingle",
            "tok:F1:TransferBatch",
        ])));
    }

    #[test]
    fn legacy_names_are_stale() {
        // names from another scheme decode to nothing
        assert!(is_stale(&kinds(&["TokenCreate", "TransferSingle"])));
    }
}
