//! Raw chain event → token notification.

use std::fmt::Write as _;

use alloy_primitives::U256;
use async_trait::async_trait;
use tokio::sync::OnceCell;

use tokenbridge_core::codec::{
    decode_hex, encode_hex_id_for_uri, unpack_subscription_name, unpack_token_id, SubscriptionName,
};
use tokenbridge_core::error::BridgeError;
use tokenbridge_core::event::RawChainEvent;
use tokenbridge_core::notification::{
    Notification, PoolType, TokenPoolEvent, TokenTransferEvent, TOKEN_STANDARD,
};
use tokenbridge_core::request::{ConnectorRequest, ConnectorReturn};
use tokenbridge_core::RetryingConnectorClient;

use crate::events::{
    is_zero_address, TokenCreateData, TransferBatchData, TransferSingleData,
    TOKEN_CREATE_SIGNATURE, TRANSFER_BATCH_SIGNATURE, TRANSFER_SINGLE_SIGNATURE,
};

/// Turns raw events from subscriptions under one topic into notifications.
///
/// Implementations must tolerate replay: the same event may be delivered
/// more than once and must produce the same notifications each time.
#[async_trait]
pub trait EventTransformer: Send + Sync {
    /// Subscription-name topic this transformer owns.
    fn topic(&self) -> &str;

    /// Transform one event. An event that should not produce output yields
    /// an empty vec; transformation never fails the pipeline.
    async fn transform(&self, subscription_name: &str, event: &RawChainEvent) -> Vec<Notification>;
}

/// ERC1155 token event transformer.
pub struct TokenListener {
    topic: String,
    instance_path: String,
    client: RetryingConnectorClient,
    uri_template: OnceCell<String>,
}

impl TokenListener {
    pub fn new(
        topic: impl Into<String>,
        instance_path: impl Into<String>,
        client: RetryingConnectorClient,
    ) -> Self {
        Self {
            topic: topic.into(),
            instance_path: instance_path.into(),
            client,
            uri_template: OnceCell::new(),
        }
    }

    fn transform_token_create(
        &self,
        sub: &SubscriptionName,
        event: &RawChainEvent,
    ) -> Option<Notification> {
        let data: TokenCreateData = match event.decode_data() {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, tx = %event.transaction_hash, "malformed TokenCreate event");
                return None;
            }
        };
        let id = match unpack_token_id(&data.type_id) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "TokenCreate with undecodable type id");
                return None;
            }
        };
        let pool_id = id.pool.to_string();

        if !sub.is_base() && sub.pool_id.as_deref() != Some(pool_id.as_str()) {
            tracing::debug!(pool_id = %pool_id, "pool creation not for this subscription");
            return None;
        }

        Some(Notification::PoolCreated(TokenPoolEvent {
            standard: TOKEN_STANDARD.to_string(),
            pool_type: if id.is_fungible() {
                PoolType::Fungible
            } else {
                PoolType::Nonfungible
            },
            pool_id,
            operator: data.operator,
            data: decode_hex(&data.data),
            transaction: event.locator(),
        }))
    }

    async fn transform_transfer(
        &self,
        sub: &SubscriptionName,
        event: &RawChainEvent,
        data: &TransferSingleData,
        batch_index: Option<usize>,
    ) -> Option<Notification> {
        let id = match unpack_token_id(&data.id) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "transfer with undecodable token id");
                return None;
            }
        };
        let pool_id = id.pool.to_string();

        if sub.pool_id.as_deref() != Some(pool_id.as_str()) {
            tracing::debug!(pool_id = %pool_id, "transfer is not from the subscribed pool");
            return None;
        }
        if is_zero_address(&data.from) && is_zero_address(&data.to) {
            tracing::debug!(tx = %event.transaction_hash, "ignoring zero-to-zero transfer");
            return None;
        }

        let Some(tx_index) = decimal_index(&event.transaction_index) else {
            tracing::warn!(
                transaction_index = %event.transaction_index,
                "transfer with unparseable transaction index"
            );
            return None;
        };
        let mut transfer_id = format!("{}.{}.{}", event.block_number, tx_index, event.log_index);
        if let Some(i) = batch_index {
            let _ = write!(transfer_id, ".{i}");
        }

        let mut payload = TokenTransferEvent {
            id: transfer_id,
            pool_id,
            token_index: id.token_index.map(|i| i.to_string()),
            uri: self.token_uri(&data.id).await,
            from: None,
            to: None,
            amount: data.value.clone(),
            operator: data.operator.clone(),
            data: decode_hex(event.input_data().unwrap_or_default()),
            transaction: event.locator(),
        };

        let notification = if is_zero_address(&data.from) {
            payload.to = Some(data.to.clone());
            Notification::Mint(payload)
        } else if is_zero_address(&data.to) {
            payload.from = Some(data.from.clone());
            Notification::Burn(payload)
        } else {
            payload.from = Some(data.from.clone());
            payload.to = Some(data.to.clone());
            Notification::Transfer(payload)
        };
        Some(notification)
    }

    async fn transform_transfer_batch(
        &self,
        sub: &SubscriptionName,
        event: &RawChainEvent,
    ) -> Vec<Notification> {
        let data: TransferBatchData = match event.decode_data() {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, tx = %event.transaction_hash, "malformed TransferBatch event");
                return Vec::new();
            }
        };
        if data.ids.len() != data.values.len() {
            tracing::warn!(
                ids = data.ids.len(),
                values = data.values.len(),
                "TransferBatch ids and values differ in length"
            );
        }

        let mut out = Vec::with_capacity(data.ids.len());
        for (i, single) in data.split().iter().enumerate() {
            if let Some(n) = self.transform_transfer(sub, event, single, Some(i)).await {
                out.push(n);
            }
        }
        out
    }

    /// Token URI from the contract's template. The template is fetched once;
    /// a failed fetch yields `""` and is retried on the next call.
    async fn token_uri(&self, id: &str) -> String {
        let template = match self
            .uri_template
            .get_or_try_init(|| self.fetch_uri_template())
            .await
        {
            Ok(template) => template,
            Err(e) => {
                tracing::warn!(error = %e, "could not fetch token URI template");
                return String::new();
            }
        };
        match encode_hex_id_for_uri(id) {
            Ok(hex_id) => template.replace("{id}", &hex_id),
            Err(e) => {
                tracing::warn!(error = %e, "could not encode token id for URI");
                String::new()
            }
        }
    }

    async fn fetch_uri_template(&self) -> Result<String, BridgeError> {
        let ret: ConnectorReturn = self
            .client
            .send_json(
                ConnectorRequest::get(format!("{}/uri", self.instance_path)).with_query("input", "0"),
            )
            .await?;
        Ok(ret.output)
    }
}

#[async_trait]
impl EventTransformer for TokenListener {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn transform(&self, subscription_name: &str, event: &RawChainEvent) -> Vec<Notification> {
        let sub = unpack_subscription_name(&self.topic, subscription_name);
        match event.signature.as_str() {
            TOKEN_CREATE_SIGNATURE => self.transform_token_create(&sub, event).into_iter().collect(),
            TRANSFER_SINGLE_SIGNATURE => match event.decode_data::<TransferSingleData>() {
                Ok(data) => self
                    .transform_transfer(&sub, event, &data, None)
                    .await
                    .into_iter()
                    .collect(),
                Err(e) => {
                    tracing::warn!(error = %e, tx = %event.transaction_hash, "malformed TransferSingle event");
                    Vec::new()
                }
            },
            TRANSFER_BATCH_SIGNATURE => self.transform_transfer_batch(&sub, event).await,
            other => {
                tracing::error!(signature = other, "Unknown event signature");
                Vec::new()
            }
        }
    }
}

/// Render a decimal or `0x`-hex index as decimal.
fn decimal_index(raw: &str) -> Option<String> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(digits) => U256::from_str_radix(digits, 16),
        None => U256::from_str_radix(raw, 10),
    };
    parsed.ok().map(|v| v.to_string())
}
