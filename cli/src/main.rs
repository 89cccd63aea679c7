//! tokenbridge CLI: run the token event bridge from the terminal.
//!
//! Usage:
//! ```bash
//! # Reconcile, initialize and stream notifications as JSON lines
//! tokenbridge --url http://ethconnect:8080 --instance /contracts/0x123 run
//!
//! # One-off maintenance
//! tokenbridge --url http://ethconnect:8080 --instance /contracts/0x123 init
//! tokenbridge --url http://ethconnect:8080 --instance /contracts/0x123 reconcile
//! tokenbridge --url http://ethconnect:8080 receipt <operation-id>
//! ```

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use tokenbridge_core::{BridgeConfig, EventStreamClient, RetryingConnectorClient};
use tokenbridge_http::{HttpConnectorConfig, HttpConnectorTransport};
use tokenbridge_tokens::{CachedSubscriptionResolver, ProxyGateway, TokensBootstrap};
use tokenbridge_ws::{EventStreamSocket, SocketConfig, WsFeedTransport};

mod args;
mod logging;

use args::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(&cli.log_config());

    let config = cli.bridge_config();
    config.validate().context("invalid configuration")?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => cmd_run(config).await,
        Command::Init => cmd_init(config).await,
        Command::Reconcile => cmd_reconcile(config).await,
        Command::Receipt { id } => cmd_receipt(config, &id).await,
    }
}

fn event_streams(config: &BridgeConfig) -> Result<EventStreamClient> {
    let transport = HttpConnectorTransport::new(
        &config.connector_url,
        HttpConnectorConfig {
            username: config.username.clone(),
            password: config.password.clone(),
            ..HttpConnectorConfig::default()
        },
    )?;
    let client = RetryingConnectorClient::new(Arc::new(transport), &config.retry)?;
    Ok(EventStreamClient::new(client))
}

fn require_instance(config: &BridgeConfig) -> Result<()> {
    if config.instance_path.is_empty() {
        bail!("--instance (ETHCONNECT_INSTANCE) is required for this command");
    }
    Ok(())
}

async fn cmd_run(config: BridgeConfig) -> Result<()> {
    require_instance(&config)?;
    let streams = event_streams(&config)?;

    let bootstrap = TokensBootstrap::new(config.clone(), streams.clone());
    let listener = bootstrap.listener();
    let (service, _) = bootstrap.start().await.context("startup failed")?;
    tracing::info!(topic = %config.topic, stream_id = %service.stream().id, "token bridge started");

    let mut gateway = ProxyGateway::new(Arc::new(CachedSubscriptionResolver::new(streams)));
    gateway.register(Arc::new(listener));
    let gateway = Arc::new(gateway);
    let mut notifications = gateway.subscribe();

    let feed = WsFeedTransport::new(config.feed_url())
        .with_credentials(config.username.clone(), config.password.clone());
    let (socket, receivers) =
        EventStreamSocket::connect(Arc::new(feed), SocketConfig::new(&config.topic, &config.feed));
    let pump = tokio::spawn(gateway.clone().run(socket, receivers));

    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            next = notifications.recv() => match next {
                Some(notification) => {
                    let line = serde_json::to_string(&notification)?;
                    writeln!(stdout, "{line}")?;
                    stdout.flush()?;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted; shutting down");
                break;
            }
        }
    }
    pump.abort();
    Ok(())
}

async fn cmd_init(config: BridgeConfig) -> Result<()> {
    require_instance(&config)?;
    let service = TokensBootstrap::new(config.clone(), event_streams(&config)?)
        .init()
        .await?;
    println!("{}", serde_json::to_string_pretty(service.stream())?);
    Ok(())
}

async fn cmd_reconcile(config: BridgeConfig) -> Result<()> {
    require_instance(&config)?;
    let outcome = TokensBootstrap::new(config.clone(), event_streams(&config)?)
        .reconciliation()
        .run()
        .await?;
    println!("{outcome:?}");
    Ok(())
}

async fn cmd_receipt(config: BridgeConfig, id: &str) -> Result<()> {
    let service = TokensBootstrap::new(config.clone(), event_streams(&config)?)
        .attach()
        .await?;
    let receipt = service.get_receipt(id).await?;
    println!("{}", serde_json::to_string_pretty(&receipt)?);
    Ok(())
}
