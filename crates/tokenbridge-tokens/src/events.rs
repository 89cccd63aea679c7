//! Contract events the token listener understands.

use serde::Deserialize;

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

pub const TOKEN_CREATE: &str = "TokenCreate";
pub const TOKEN_CREATE_SIGNATURE: &str = "TokenCreate(address,uint256,bytes)";
pub const TRANSFER_SINGLE: &str = "TransferSingle";
pub const TRANSFER_SINGLE_SIGNATURE: &str =
    "TransferSingle(address,address,address,uint256,uint256)";
pub const TRANSFER_BATCH: &str = "TransferBatch";
pub const TRANSFER_BATCH_SIGNATURE: &str =
    "TransferBatch(address,address,address,uint256[],uint256[])";

/// Events subscribed for every activated pool.
pub const POOL_EVENTS: [&str; 3] = [TOKEN_CREATE, TRANSFER_SINGLE, TRANSFER_BATCH];

pub fn is_zero_address(address: &str) -> bool {
    address.eq_ignore_ascii_case(ZERO_ADDRESS)
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenCreateData {
    pub operator: String,
    pub type_id: String,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferSingleData {
    pub from: String,
    pub to: String,
    pub operator: String,
    pub id: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferBatchData {
    pub from: String,
    pub to: String,
    pub operator: String,
    pub ids: Vec<String>,
    pub values: Vec<String>,
}

impl TransferBatchData {
    /// Split into one single transfer per position, in array order.
    pub fn split(&self) -> Vec<TransferSingleData> {
        self.ids
            .iter()
            .zip(&self.values)
            .map(|(id, value)| TransferSingleData {
                from: self.from.clone(),
                to: self.to.clone(),
                operator: self.operator.clone(),
                id: id.clone(),
                value: value.clone(),
            })
            .collect()
    }
}
