//! Subscription-name codec.
//!
//! Names have the form `topic:poolId[:event]`. The topic may itself contain
//! `:`, so decoding strips the known topic as an opaque prefix before
//! splitting the remainder.

use serde::{Deserialize, Serialize};

pub const SUBSCRIPTION_DELIMITER: char = ':';

/// Pool segment of the bootstrap subscription created before any pool is activated.
pub const BASE_SUBSCRIPTION: &str = "base";

/// Decoded subscription name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubscriptionName {
    pub prefix: String,
    pub pool_id: Option<String>,
    pub event: Option<String>,
}

impl SubscriptionName {
    /// `true` when the name did not start with `topic:` (another service's subscription).
    pub fn is_foreign(&self) -> bool {
        self.pool_id.is_none()
    }

    pub fn is_base(&self) -> bool {
        self.pool_id.as_deref() == Some(BASE_SUBSCRIPTION)
    }

    /// Event kind used when reconciling: the event segment, or `base` for the
    /// bootstrap subscription.
    pub fn event_kind(&self) -> Option<&str> {
        match self.event.as_deref() {
            Some(event) => Some(event),
            None if self.is_base() => Some(BASE_SUBSCRIPTION),
            None => None,
        }
    }
}

pub fn pack_subscription_name(topic: &str, pool_id: &str, event: Option<&str>) -> String {
    let mut name = format!("{topic}{SUBSCRIPTION_DELIMITER}{pool_id}");
    if let Some(event) = event {
        name.push(SUBSCRIPTION_DELIMITER);
        name.push_str(event);
    }
    name
}

pub fn unpack_subscription_name(topic: &str, name: &str) -> SubscriptionName {
    let rest = name
        .strip_prefix(topic)
        .and_then(|r| r.strip_prefix(SUBSCRIPTION_DELIMITER));
    let Some(rest) = rest else {
        return SubscriptionName {
            prefix: topic.to_string(),
            ..Default::default()
        };
    };

    let mut parts = rest.split(SUBSCRIPTION_DELIMITER);
    let non_empty = |s: Option<&str>| s.filter(|s| !s.is_empty()).map(String::from);
    let pool_id = non_empty(parts.next());
    let event = non_empty(parts.next());
    SubscriptionName {
        prefix: topic.to_string(),
        pool_id,
        event,
    }
}
