//! Connector-side token operations.
//!
//! [`TokensBootstrap`] is the only way to obtain a [`TokensService`]: it
//! either creates the stream baseline (`init`) or attaches to an existing
//! one (`attach`), so pool activation always has a stream to bind to.

use futures::future::try_join3;
use serde_json::{json, Value};

use tokenbridge_core::codec::{encode_hex, pack_subscription_name, pack_token_id, PoolId, BASE_SUBSCRIPTION};
use tokenbridge_core::config::BridgeConfig;
use tokenbridge_core::error::BridgeError;
use tokenbridge_core::event::EventStreamReply;
use tokenbridge_core::eventstream::{EventStream, EventStreamClient, EventStreamSubscription};
use tokenbridge_core::notification::PoolType;
use tokenbridge_core::request::{ConnectorAsyncResponse, ConnectorRequest, ConnectorReturn};
use tokenbridge_core::RetryingConnectorClient;

use crate::events::{TOKEN_CREATE, TRANSFER_BATCH, TRANSFER_SINGLE};
use crate::interfaces::{
    AsyncResponse, TokenBalance, TokenBalanceQuery, TokenBurn, TokenMint, TokenPool,
    TokenPoolActivate, TokenTransfer,
};
use crate::reconcile::{ReconcileOutcome, ReconciliationService};
use crate::transformer::TokenListener;

/// Upper bound on tokens minted by one non-fungible mint call.
pub const MAX_NON_FUNGIBLE_MINT: usize = 1_000;

/// Create or update the stream for `topic` and its base subscription.
pub(crate) async fn init_stream(
    streams: &EventStreamClient,
    topic: &str,
    instance_path: &str,
) -> Result<EventStream, BridgeError> {
    let stream = streams.create_or_update_stream(topic).await?;
    streams
        .get_or_create_subscription(
            instance_path,
            &stream.id,
            TOKEN_CREATE,
            &pack_subscription_name(topic, BASE_SUBSCRIPTION, None),
            "0",
        )
        .await?;
    Ok(stream)
}

pub struct TokensBootstrap {
    config: BridgeConfig,
    streams: EventStreamClient,
}

impl TokensBootstrap {
    pub fn new(config: BridgeConfig, streams: EventStreamClient) -> Self {
        Self { config, streams }
    }

    pub fn reconciliation(&self) -> ReconciliationService {
        ReconciliationService::new(
            self.streams.clone(),
            &self.config.topic,
            &self.config.instance_path,
        )
    }

    /// The event transformer for this configuration.
    pub fn listener(&self) -> TokenListener {
        TokenListener::new(
            &self.config.topic,
            &self.config.instance_path,
            self.streams.client().clone(),
        )
    }

    /// One-time initialization: event stream plus base subscription.
    pub async fn init(self) -> Result<TokensService, BridgeError> {
        let stream = init_stream(&self.streams, &self.config.topic, &self.config.instance_path).await?;
        tracing::info!(topic = %self.config.topic, stream_id = %stream.id, "event stream initialized");
        Ok(TokensService::new(self.config, self.streams, stream))
    }

    /// Use the existing stream without modifying it.
    pub async fn attach(self) -> Result<TokensService, BridgeError> {
        let stream = self
            .streams
            .find_stream(&self.config.topic)
            .await?
            .ok_or_else(|| BridgeError::NotFound {
                resource: format!("event stream '{}'", self.config.topic),
            })?;
        tracing::info!(topic = %self.config.topic, stream_id = %stream.id, "attached to event stream");
        Ok(TokensService::new(self.config, self.streams, stream))
    }

    /// Reconcile (failures logged, not fatal), then `init` or `attach`
    /// depending on `auto_init`.
    pub async fn start(self) -> Result<(TokensService, Option<ReconcileOutcome>), BridgeError> {
        let outcome = self.reconciliation().run_at_startup().await;
        let service = if self.config.auto_init {
            self.init().await?
        } else {
            self.attach().await?
        };
        Ok((service, outcome))
    }
}

pub struct TokensService {
    config: BridgeConfig,
    streams: EventStreamClient,
    stream: EventStream,
}

impl TokensService {
    fn new(config: BridgeConfig, streams: EventStreamClient, stream: EventStream) -> Self {
        Self {
            config,
            streams,
            stream,
        }
    }

    pub fn stream(&self) -> &EventStream {
        &self.stream
    }

    fn client(&self) -> &RetryingConnectorClient {
        self.streams.client()
    }

    fn instance_path(&self, method: &str) -> String {
        format!("{}/{method}", self.config.instance_path)
    }

    /// A transaction submission with the connector's `{prefix}-*` query options.
    fn submission(&self, method: &str, body: Value, operator: &str, request_id: Option<&str>) -> ConnectorRequest {
        let prefix = &self.config.short_prefix;
        let mut req = ConnectorRequest::post(self.instance_path(method), body)
            .with_query(format!("{prefix}-from"), operator)
            .with_query(format!("{prefix}-sync"), "false");
        if let Some(id) = request_id {
            req = req.with_query(format!("{prefix}-id"), id);
        }
        req
    }

    async fn submit(&self, req: ConnectorRequest) -> Result<AsyncResponse, BridgeError> {
        let resp: ConnectorAsyncResponse = self.client().send_json(req).await?;
        Ok(AsyncResponse { id: resp.id })
    }

    pub async fn create_pool(&self, dto: &TokenPool) -> Result<AsyncResponse, BridgeError> {
        let body = json!({
            "is_fungible": dto.pool_type == PoolType::Fungible,
            "data": encode_hex(dto.data.as_deref().unwrap_or_default()),
        });
        self.submit(self.submission("create", body, &dto.operator, dto.request_id.as_deref()))
            .await
    }

    /// Subscribe to every pool event for `pool_id`. The three subscriptions are
    /// created concurrently and start at the pool-creation block.
    pub async fn activate_pool(&self, dto: &TokenPoolActivate) -> Result<(), BridgeError> {
        dto.pool_id.parse::<PoolId>()?;
        let from_block = dto
            .transaction
            .as_ref()
            .map(|tx| tx.block_number.as_str())
            .unwrap_or("0");
        try_join3(
            self.subscribe_pool_event(&dto.pool_id, TOKEN_CREATE, from_block),
            self.subscribe_pool_event(&dto.pool_id, TRANSFER_SINGLE, from_block),
            self.subscribe_pool_event(&dto.pool_id, TRANSFER_BATCH, from_block),
        )
        .await?;
        tracing::info!(pool_id = %dto.pool_id, from_block, "pool activated");
        Ok(())
    }

    async fn subscribe_pool_event(
        &self,
        pool_id: &str,
        event: &str,
        from_block: &str,
    ) -> Result<EventStreamSubscription, BridgeError> {
        let name = pack_subscription_name(&self.config.topic, pool_id, Some(event));
        self.streams
            .get_or_create_subscription(&self.config.instance_path, &self.stream.id, event, &name, from_block)
            .await
    }

    pub async fn mint(&self, dto: &TokenMint) -> Result<AsyncResponse, BridgeError> {
        let pool: PoolId = dto.pool_id.parse()?;
        let type_id = pack_token_id(&dto.pool_id, None)?;
        let data = encode_hex(dto.data.as_deref().unwrap_or_default());
        let (method, body) = if pool.fungible {
            (
                "mintFungible",
                json!({
                    "type_id": type_id,
                    "to": [dto.to],
                    "amounts": [dto.amount],
                    "data": data,
                }),
            )
        } else {
            // one recipient entry per minted token
            let count: usize = dto.amount.parse().map_err(|_| {
                BridgeError::InvalidRequest(format!(
                    "non-fungible mint amount must be a whole number, got '{}'",
                    dto.amount
                ))
            })?;
            if count > MAX_NON_FUNGIBLE_MINT {
                return Err(BridgeError::InvalidRequest(format!(
                    "non-fungible mint amount {count} exceeds {MAX_NON_FUNGIBLE_MINT}"
                )));
            }
            (
                "mintNonFungible",
                json!({
                    "type_id": type_id,
                    "to": vec![dto.to.as_str(); count],
                    "data": data,
                }),
            )
        };
        self.submit(self.submission(method, body, &dto.operator, dto.request_id.as_deref()))
            .await
    }

    pub async fn burn(&self, dto: &TokenBurn) -> Result<AsyncResponse, BridgeError> {
        let body = json!({
            "from": dto.from,
            "id": pack_token_id(&dto.pool_id, dto.token_index.as_deref())?,
            "amount": dto.amount,
            "data": encode_hex(dto.data.as_deref().unwrap_or_default()),
        });
        self.submit(self.submission("burn", body, &dto.operator, dto.request_id.as_deref()))
            .await
    }

    pub async fn transfer(&self, dto: &TokenTransfer) -> Result<AsyncResponse, BridgeError> {
        let body = json!({
            "from": dto.from,
            "to": dto.to,
            "id": pack_token_id(&dto.pool_id, dto.token_index.as_deref())?,
            "amount": dto.amount,
            "data": encode_hex(dto.data.as_deref().unwrap_or_default()),
        });
        self.submit(self.submission("safeTransferFrom", body, &dto.operator, dto.request_id.as_deref()))
            .await
    }

    pub async fn balance(&self, dto: &TokenBalanceQuery) -> Result<TokenBalance, BridgeError> {
        let id = pack_token_id(&dto.pool_id, dto.token_index.as_deref())?;
        let req = ConnectorRequest::get(self.instance_path("balanceOf"))
            .with_query("account", dto.account.as_str())
            .with_query("id", id);
        let ret: ConnectorReturn = self.client().send_json(req).await?;
        Ok(TokenBalance { balance: ret.output })
    }

    /// Receipt for a submitted operation; [`BridgeError::NotFound`] if the
    /// connector has none yet.
    pub async fn get_receipt(&self, id: &str) -> Result<EventStreamReply, BridgeError> {
        self.client()
            .send_json(ConnectorRequest::get(format!("/reply/{id}")))
            .await
    }
}
