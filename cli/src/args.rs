//! Command-line and environment configuration.

use clap::{ArgAction, Args, Parser, Subcommand};

use tokenbridge_core::config::DEFAULT_RETRY_CONDITION;
use tokenbridge_core::{BridgeConfig, FeedSettings, RetrySettings};

use crate::logging::LogConfig;

#[derive(Parser, Debug)]
#[command(
    name = "tokenbridge",
    about = "Bridge blockchain token events to token lifecycle notifications",
    long_about = "
TokenBridge subscribes to a connector's event stream, turns ERC1155 token
logs into pool / mint / burn / transfer notifications and prints them to
stdout as JSON lines. Logs go to stderr.

ENVIRONMENT VARIABLES:
  ETHCONNECT_URL        Connector REST base URL
  ETHCONNECT_INSTANCE   Contract instance path, e.g. /contracts/0x123
  ETHCONNECT_TOPIC      Event stream name / websocket topic
  ETHCONNECT_PREFIX     Connector query-parameter prefix
  ETHCONNECT_USERNAME   Basic auth user
  ETHCONNECT_PASSWORD   Basic auth password
  AUTO_INIT             Create stream and base subscription at startup
  RETRY_*               Retry policy for connector calls
  LOG_LEVEL, LOG_JSON   Logging
  LOG_COMPONENTS        Per-crate levels, e.g. tokenbridge_ws=debug
",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub connector: ConnectorArgs,

    #[command(flatten)]
    pub retry: RetryArgs,

    #[command(flatten)]
    pub log: LogArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Reconcile, initialize, then stream notifications (default)
    Run,
    /// Create or update the event stream and base subscription
    Init,
    /// Check subscriptions and recreate the stream if they are stale
    Reconcile,
    /// Fetch the receipt of a submitted operation
    Receipt {
        /// Operation id returned on submission
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct ConnectorArgs {
    #[arg(long, env = "ETHCONNECT_URL")]
    pub url: String,

    #[arg(long, env = "ETHCONNECT_INSTANCE", default_value = "")]
    pub instance: String,

    #[arg(long, env = "ETHCONNECT_TOPIC", default_value = "token")]
    pub topic: String,

    #[arg(long, env = "ETHCONNECT_PREFIX", default_value = "fly")]
    pub prefix: String,

    #[arg(long, env = "ETHCONNECT_USERNAME", default_value = "")]
    pub username: String,

    #[arg(long, env = "ETHCONNECT_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    #[arg(long, env = "AUTO_INIT", default_value_t = true, action = ArgAction::Set)]
    pub auto_init: bool,
}

#[derive(Args, Debug)]
pub struct RetryArgs {
    #[arg(long = "retry-initial-delay-ms", env = "RETRY_INITIAL_DELAY_MS", default_value_t = 100)]
    pub initial_delay_ms: u64,

    #[arg(long = "retry-factor", env = "RETRY_FACTOR", default_value_t = 2.0)]
    pub factor: f64,

    #[arg(long = "retry-max-delay-ms", env = "RETRY_MAX_DELAY_MS", default_value_t = 10_000)]
    pub max_delay_ms: u64,

    #[arg(long = "retry-max-attempts", env = "RETRY_MAX_ATTEMPTS", default_value_t = 15)]
    pub max_attempts: u32,

    /// Pattern matched against connector errors; empty disables retry
    #[arg(long = "retry-condition", env = "RETRY_CONDITION", default_value = DEFAULT_RETRY_CONDITION)]
    pub condition: String,
}

#[derive(Args, Debug)]
pub struct LogArgs {
    #[arg(long = "log-level", env = "LOG_LEVEL", default_value = "info")]
    pub level: String,

    #[arg(long = "log-json", env = "LOG_JSON", default_value_t = false, action = ArgAction::Set)]
    pub json: bool,

    /// Per-crate level override, `crate=level`; repeat or comma-separate
    #[arg(
        long = "log-component",
        env = "LOG_COMPONENTS",
        value_delimiter = ',',
        value_parser = parse_component
    )]
    pub components: Vec<(String, String)>,
}

fn parse_component(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, level)) if !name.is_empty() && !level.is_empty() => {
            Ok((name.trim().to_string(), level.trim().to_string()))
        }
        _ => Err(format!("expected crate=level, got '{raw}'")),
    }
}

impl Cli {
    pub fn bridge_config(&self) -> BridgeConfig {
        let c = &self.connector;
        BridgeConfig {
            connector_url: c.url.clone(),
            username: c.username.clone(),
            password: c.password.clone(),
            topic: c.topic.clone(),
            short_prefix: c.prefix.clone(),
            instance_path: c.instance.clone(),
            auto_init: c.auto_init,
            retry: RetrySettings {
                initial_delay_ms: self.retry.initial_delay_ms,
                factor: self.retry.factor,
                max_delay_ms: self.retry.max_delay_ms,
                max_attempts: self.retry.max_attempts,
                condition: self.retry.condition.clone(),
            },
            feed: FeedSettings::default(),
        }
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log.level.clone(),
            components: self.log.components.iter().cloned().collect(),
            json: self.log.json,
        }
    }
}
