//! Bridge configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::BridgeError;
use crate::policy::RetryConfig;

/// Default retry condition: connection-level failures, timeouts and gateway errors.
pub const DEFAULT_RETRY_CONDITION: &str =
    r"(?i)(connection|connect error|timed out|ECONN|HTTP 50[234])";

/// Retry parameters applied to every outbound connector call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_factor")]
    pub factor: f64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Total attempts per call, first try included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Regular expression matched against the error text. Empty disables retry.
    #[serde(default = "default_condition")]
    pub condition: String,
}

fn default_initial_delay_ms() -> u64 { 100 }
fn default_factor() -> f64 { 2.0 }
fn default_max_delay_ms() -> u64 { 10_000 }
fn default_max_attempts() -> u32 { 15 }
fn default_condition() -> String { DEFAULT_RETRY_CONDITION.to_string() }

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            factor: default_factor(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
            condition: default_condition(),
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts.max(1),
            initial_backoff: Duration::from_millis(self.initial_delay_ms),
            max_backoff: Duration::from_millis(self.max_delay_ms),
            multiplier: self.factor,
        }
    }
}

/// Event-feed socket timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSettings {
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,
    /// Must be strictly longer than `ping_interval_ms`.
    #[serde(default = "default_ping_timeout_ms")]
    pub ping_timeout_ms: u64,
}

fn default_reconnect_delay_ms() -> u64 { 5_000 }
fn default_ping_interval_ms() -> u64 { 10_000 }
fn default_ping_timeout_ms() -> u64 { 60_000 }

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
            ping_interval_ms: default_ping_interval_ms(),
            ping_timeout_ms: default_ping_timeout_ms(),
        }
    }
}

impl FeedSettings {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }
}

/// Top-level bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Connector REST base URL, e.g. "http://ethconnect:8080"
    pub connector_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Event stream name and websocket topic
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Prefix for the connector's `-from` / `-sync` / `-id` query parameters
    #[serde(default = "default_short_prefix")]
    pub short_prefix: String,
    /// Contract instance path relative to `connector_url`, e.g. "/contracts/0x123"
    #[serde(default)]
    pub instance_path: String,
    #[serde(default = "bool_true")]
    pub auto_init: bool,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub feed: FeedSettings,
}

fn default_topic() -> String { "token".into() }
fn default_short_prefix() -> String { "fly".into() }
fn bool_true() -> bool { true }

impl BridgeConfig {
    /// Minimal config for a connector URL; everything else defaulted.
    pub fn new(connector_url: impl Into<String>) -> Self {
        Self {
            connector_url: connector_url.into(),
            username: String::new(),
            password: String::new(),
            topic: default_topic(),
            short_prefix: default_short_prefix(),
            instance_path: String::new(),
            auto_init: true,
            retry: RetrySettings::default(),
            feed: FeedSettings::default(),
        }
    }

    /// Websocket URL of the event feed: `http(s)` → `ws(s)`, suffixed `/ws`.
    pub fn feed_url(&self) -> String {
        let base = self.connector_url.trim_end_matches('/');
        let ws = match base.strip_prefix("http") {
            Some(rest) => format!("ws{rest}"),
            None => base.to_string(),
        };
        format!("{ws}/ws")
    }

    /// Check the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.connector_url.is_empty() {
            return Err(BridgeError::Config("connector_url is required".into()));
        }
        if self.topic.is_empty() {
            return Err(BridgeError::Config("topic must not be empty".into()));
        }
        if self.feed.ping_timeout_ms <= self.feed.ping_interval_ms {
            return Err(BridgeError::Config(format!(
                "ping timeout ({}ms) must be longer than ping interval ({}ms)",
                self.feed.ping_timeout_ms, self.feed.ping_interval_ms
            )));
        }
        if self.retry.factor < 1.0 {
            return Err(BridgeError::Config("retry factor must be >= 1.0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_url_derivation() {
        assert_eq!(BridgeConfig::new("http://eth:8080").feed_url(), "ws://eth:8080/ws");
        assert_eq!(BridgeConfig::new("https://eth/").feed_url(), "wss://eth/ws");
    }

    #[test]
    fn defaults_from_minimal_json() {
        let cfg: BridgeConfig =
            serde_json::from_str(r#"{"connector_url":"http://eth"}"#).unwrap();
        assert_eq!(cfg.topic, "token");
        assert_eq!(cfg.short_prefix, "fly");
        assert!(cfg.auto_init);
        assert_eq!(cfg.retry.max_attempts, 15);
        assert_eq!(cfg.feed.ping_timeout(), Duration::from_secs(60));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn ping_timeout_must_exceed_interval() {
        let mut cfg = BridgeConfig::new("http://eth");
        cfg.feed.ping_timeout_ms = cfg.feed.ping_interval_ms;
        assert!(matches!(cfg.validate(), Err(BridgeError::Config(_))));
    }
}
