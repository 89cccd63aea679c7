//! Outbound notification schema.
//!
//! Serialized as `{"event": "<tag>", "data": {...}}`.

use serde::{Deserialize, Serialize};

use crate::event::TransactionLocator;

/// Token standard reported on pool notifications.
pub const TOKEN_STANDARD: &str = "ERC20";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolType {
    Fungible,
    Nonfungible,
}

/// A pool was created on chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPoolEvent {
    pub standard: String,
    #[serde(rename = "type")]
    pub pool_type: PoolType,
    pub pool_id: String,
    pub operator: String,
    pub data: String,
    pub transaction: TransactionLocator,
}

/// Payload shared by mint, burn and transfer notifications.
///
/// Mints carry only `to`, burns only `from`, transfers both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransferEvent {
    /// Globally unique transfer id: `block.txIndex.logIndex[.batchIndex]`
    pub id: String,
    pub pool_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_index: Option<String>,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub amount: String,
    pub operator: String,
    pub data: String,
    pub transaction: TransactionLocator,
}

/// Outcome of a submitted operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptEvent {
    pub id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A message delivered to external subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Notification {
    #[serde(rename = "token-pool")]
    PoolCreated(TokenPoolEvent),
    #[serde(rename = "token-mint")]
    Mint(TokenTransferEvent),
    #[serde(rename = "token-burn")]
    Burn(TokenTransferEvent),
    #[serde(rename = "token-transfer")]
    Transfer(TokenTransferEvent),
    #[serde(rename = "receipt")]
    Receipt(ReceiptEvent),
}

impl Notification {
    /// The `event` tag this notification serializes with.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::PoolCreated(_) => "token-pool",
            Self::Mint(_) => "token-mint",
            Self::Burn(_) => "token-burn",
            Self::Transfer(_) => "token-transfer",
            Self::Receipt(_) => "receipt",
        }
    }

    /// The pool this notification concerns (`None` for receipts).
    pub fn pool_id(&self) -> Option<&str> {
        match self {
            Self::PoolCreated(e) => Some(&e.pool_id),
            Self::Mint(e) | Self::Burn(e) | Self::Transfer(e) => Some(&e.pool_id),
            Self::Receipt(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator() -> TransactionLocator {
        TransactionLocator {
            block_number: "100".into(),
            transaction_index: "0x2".into(),
            transaction_hash: "0xabc".into(),
            log_index: "1".into(),
        }
    }

    #[test]
    fn mint_serializes_with_tag_and_without_from() {
        let n = Notification::Mint(TokenTransferEvent {
            id: "100.2.1".into(),
            pool_id: "F1".into(),
            token_index: None,
            uri: String::new(),
            from: None,
            to: Some("0xABC".into()),
            amount: "10".into(),
            operator: "0xop".into(),
            data: String::new(),
            transaction: locator(),
        });
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["event"], "token-mint");
        assert_eq!(json["data"]["to"], "0xABC");
        assert_eq!(json["data"]["poolId"], "F1");
        assert!(json["data"].get("from").is_none());
        assert_eq!(json["data"]["transaction"]["blockNumber"], "100");
        assert_eq!(n.event_name(), "token-mint");
    }

    #[test]
    fn pool_event_type_field() {
        let n = Notification::PoolCreated(TokenPoolEvent {
            standard: TOKEN_STANDARD.into(),
            pool_type: PoolType::Nonfungible,
            pool_id: "N1".into(),
            operator: "0xop".into(),
            data: "hello".into(),
            transaction: locator(),
        });
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["event"], "token-pool");
        assert_eq!(json["data"]["standard"], "ERC20");
        assert_eq!(json["data"]["type"], "nonfungible");
        assert_eq!(n.pool_id(), Some("N1"));
    }
}
