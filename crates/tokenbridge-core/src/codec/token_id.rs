//! Composite token-id codec.
//!
//! Layout of the uint256 token id (big-endian bit numbering):
//!
//! ```text
//!  255 | 254 ........ 128 | 127 ......... 0
//!  NF  |   pool number    |   token index
//! ```
//!
//! Bit 255 is clear for fungible pools (`F<n>`) and set for non-fungible
//! pools (`N<n>`). Fungible pools always carry token index zero, so
//! `pack("F1", None) == 2^128`.

use alloy_primitives::U256;
use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

const POOL_SHIFT: usize = 128;
const NON_FUNGIBLE_BIT: usize = 255;
/// Pool numbers occupy bits 128..=254.
pub const MAX_POOL_NUMBER: u128 = (1u128 << 127) - 1;

/// A pool identifier such as `F1` or `N7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolId {
    pub fungible: bool,
    pub number: u128,
}

impl PoolId {
    pub fn fungible(number: u128) -> Self {
        Self { fungible: true, number }
    }

    pub fn non_fungible(number: u128) -> Self {
        Self { fungible: false, number }
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.fungible { 'F' } else { 'N' };
        write!(f, "{prefix}{}", self.number)
    }
}

impl FromStr for PoolId {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BridgeError::InvalidPoolId { value: s.to_string() };
        let mut chars = s.chars();
        let fungible = match chars.next() {
            Some('F') => true,
            Some('N') => false,
            _ => return Err(invalid()),
        };
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let number: u128 = digits.parse().map_err(|_| invalid())?;
        if number > MAX_POOL_NUMBER {
            return Err(invalid());
        }
        Ok(Self { fungible, number })
    }
}

/// A decoded token id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeTokenId {
    pub pool: PoolId,
    /// Always `None` for fungible pools.
    pub token_index: Option<u128>,
}

impl CompositeTokenId {
    pub fn is_fungible(&self) -> bool {
        self.pool.fungible
    }

    pub fn to_u256(&self) -> U256 {
        let mut value = U256::from(self.pool.number) << POOL_SHIFT;
        if !self.pool.fungible {
            value |= U256::from(1u8) << NON_FUNGIBLE_BIT;
        }
        value | U256::from(self.token_index.unwrap_or(0))
    }

    pub fn from_u256(value: U256) -> Self {
        let fungible = !value.bit(NON_FUNGIBLE_BIT);
        let number_mask = U256::from(MAX_POOL_NUMBER);
        let number = ((value >> POOL_SHIFT) & number_mask).to::<u128>();
        let token_index = if fungible {
            None
        } else {
            Some((value & U256::from(u128::MAX)).to::<u128>())
        };
        Self {
            pool: PoolId { fungible, number },
            token_index,
        }
    }
}

impl fmt::Display for CompositeTokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_u256())
    }
}

/// Pack a pool id and optional token index into the decimal on-chain token id.
///
/// Fungible pools only accept an absent or zero index.
pub fn pack_token_id(pool_id: &str, token_index: Option<&str>) -> Result<String, BridgeError> {
    let pool: PoolId = pool_id.parse()?;
    let index = match token_index {
        None | Some("") => 0,
        Some(raw) => raw.parse::<u128>().map_err(|e| BridgeError::InvalidTokenId {
            value: raw.to_string(),
            reason: format!("token index: {e}"),
        })?,
    };
    if pool.fungible && index != 0 {
        return Err(BridgeError::InvalidTokenId {
            value: index.to_string(),
            reason: format!("fungible pool {pool} has no token index"),
        });
    }
    let id = CompositeTokenId {
        pool,
        token_index: (!pool.fungible).then_some(index),
    };
    Ok(id.to_string())
}

/// Unpack a decimal on-chain token id.
pub fn unpack_token_id(id: &str) -> Result<CompositeTokenId, BridgeError> {
    let value = U256::from_str_radix(id, 10).map_err(|e| BridgeError::InvalidTokenId {
        value: id.to_string(),
        reason: e.to_string(),
    })?;
    Ok(CompositeTokenId::from_u256(value))
}
