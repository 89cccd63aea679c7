//! Hex payload helpers.

use alloy_primitives::U256;

use crate::error::BridgeError;

/// Encode UTF-8 text as `0x`-prefixed hex. Empty input encodes as `0x00`.
pub fn encode_hex(data: &str) -> String {
    if data.is_empty() {
        return "0x00".to_string();
    }
    format!("0x{}", ::hex::encode(data.as_bytes()))
}

/// Decode `0x`-prefixed hex into text. `""`, `0x`, `0x0` and `0x00` decode to `""`;
/// invalid hex or invalid UTF-8 decodes lossily rather than failing.
pub fn decode_hex(data: &str) -> String {
    let digits = data.strip_prefix("0x").unwrap_or(data);
    if digits.chars().all(|c| c == '0') {
        return String::new();
    }
    let padded;
    let digits = if digits.len() % 2 == 1 {
        padded = format!("0{digits}");
        padded.as_str()
    } else {
        digits
    };
    match ::hex::decode(digits) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::debug!(error = %e, "undecodable hex payload");
            String::new()
        }
    }
}

/// Render a decimal token id as 64 lowercase hex digits, the form `{id}` takes in token URIs.
pub fn encode_hex_id_for_uri(id: &str) -> Result<String, BridgeError> {
    let value = U256::from_str_radix(id, 10).map_err(|e| BridgeError::InvalidTokenId {
        value: id.to_string(),
        reason: e.to_string(),
    })?;
    Ok(::hex::encode(value.to_be_bytes::<32>()))
}
