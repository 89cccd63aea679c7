//! Pure encodings shared with the connector and downstream consumers.
//!
//! - [`subscription`]: `topic:poolId[:event]` subscription names
//! - [`token_id`]: pool id + token index packed into one uint256
//! - [`hex`]: hex payloads carried in contract calls and events

pub mod hex;
pub mod subscription;
pub mod token_id;

pub use self::hex::{decode_hex, encode_hex, encode_hex_id_for_uri};
pub use subscription::{
    pack_subscription_name, unpack_subscription_name, SubscriptionName, BASE_SUBSCRIPTION,
    SUBSCRIPTION_DELIMITER,
};
pub use token_id::{pack_token_id, unpack_token_id, CompositeTokenId, PoolId};
