//! Request and response shapes for token operations.

use serde::{Deserialize, Serialize};

use tokenbridge_core::event::TransactionLocator;
use tokenbridge_core::notification::PoolType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPool {
    #[serde(rename = "type")]
    pub pool_type: PoolType,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPoolActivate {
    pub pool_id: String,
    /// The pool-creation transaction; subscriptions start from its block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionLocator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMint {
    pub pool_id: String,
    pub to: String,
    pub amount: String,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBurn {
    pub pool_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_index: Option<String>,
    pub from: String,
    pub amount: String,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    pub pool_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_index: Option<String>,
    pub from: String,
    pub to: String,
    pub amount: String,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceQuery {
    pub pool_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_index: Option<String>,
    pub account: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub balance: String,
}

/// Id under which a submitted operation's receipt will be reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsyncResponse {
    pub id: String,
}
