//! Inbound feed types: raw chain events and operation replies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A connector-decoded log entry, as delivered on the event feed.
///
/// `data` holds the decoded event fields keyed by parameter name; their
/// shape depends on `signature`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChainEvent {
    /// Id of the subscription that matched this log
    pub sub_id: String,
    /// Canonical event signature, e.g. "TransferSingle(address,address,address,uint256,uint256)"
    pub signature: String,
    #[serde(default)]
    pub address: String,
    pub block_number: String,
    /// Decimal or `0x`-prefixed hex, depending on the connector
    pub transaction_index: String,
    pub transaction_hash: String,
    #[serde(default)]
    pub log_index: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_args: Option<Value>,
}

impl RawChainEvent {
    /// On-chain position of this log.
    pub fn locator(&self) -> TransactionLocator {
        TransactionLocator {
            block_number: self.block_number.clone(),
            transaction_index: self.transaction_index.clone(),
            transaction_hash: self.transaction_hash.clone(),
            log_index: self.log_index.clone(),
        }
    }

    /// Decode `data` into a signature-specific shape.
    pub fn decode_data<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }

    /// The `data` argument of the originating transaction input, if present.
    pub fn input_data(&self) -> Option<&str> {
        self.input_args.as_ref()?.get("data")?.as_str()
    }
}

/// Where an event happened on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLocator {
    pub block_number: String,
    pub transaction_index: String,
    pub transaction_hash: String,
    #[serde(default)]
    pub log_index: String,
}

/// Header of an operation-result reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyHeaders {
    /// e.g. "TransactionSuccess" or "TransactionFailure"
    #[serde(rename = "type")]
    pub kind: String,
    /// The id returned when the operation was submitted
    #[serde(default)]
    pub request_id: String,
}

/// Result of a previously submitted operation, delivered on the feed or fetched by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStreamReply {
    pub headers: ReplyHeaders,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl EventStreamReply {
    pub const SUCCESS: &'static str = "TransactionSuccess";

    pub fn is_success(&self) -> bool {
        self.headers.kind == Self::SUCCESS
    }
}
