//! Codec behaviour through the public API.

use tokenbridge_core::codec::{
    encode_hex_id_for_uri, pack_subscription_name, pack_token_id, unpack_subscription_name,
    unpack_token_id, PoolId,
};

#[test]
fn second_fungible_pool_is_two_shifted() {
    // 2 << 128
    assert_eq!(
        pack_token_id("F2", None).unwrap(),
        "680564733841876926926749214863536422912"
    );
}

#[test]
fn non_fungible_token_uri_id_has_flag_in_leading_nibble() {
    let id = pack_token_id("N1", Some("3")).unwrap();
    let hex = encode_hex_id_for_uri(&id).unwrap();
    assert_eq!(hex.len(), 64);
    assert_eq!(&hex[32..], "00000000000000000000000000000003");
    assert_eq!(&hex[..32], "80000000000000000000000000000001");
}

#[test]
fn unpacking_ignores_nothing_the_packer_wrote() {
    let id = unpack_token_id(&pack_token_id("N42", Some("7")).unwrap()).unwrap();
    assert_eq!(id.pool, PoolId::non_fungible(42));
    assert_eq!(id.token_index, Some(7));
    assert_eq!(id.pool.to_string(), "N42");
}

#[test]
fn nested_topic_does_not_claim_outer_subscriptions() {
    let outer = pack_subscription_name("tok", "F1", Some("TransferSingle"));
    let parts = unpack_subscription_name("tok:en", &outer);
    assert!(parts.is_foreign());

    let inner = pack_subscription_name("tok:en", "F1", Some("TransferSingle"));
    // the outer topic sees "en" as the pool segment
    let seen_by_outer = unpack_subscription_name("tok", &inner);
    assert_eq!(seen_by_outer.pool_id.as_deref(), Some("en"));
    assert_eq!(seen_by_outer.event.as_deref(), Some("F1"));
}

#[test]
fn empty_segments_decode_as_absent() {
    let parts = unpack_subscription_name("token", "token::TokenCreate");
    assert_eq!(parts.pool_id, None);
    assert_eq!(parts.event.as_deref(), Some("TokenCreate"));
}
