//! tokenbridge-tokens: ERC1155 token events in, notifications out.
//!
//! - [`TokenListener`] turns `TokenCreate`, `TransferSingle` and
//!   `TransferBatch` logs into pool, mint, burn and transfer notifications
//! - [`ProxyGateway`] routes feed batches to transformers by subscription
//!   topic, hands notifications to subscribers and acks the batch
//! - [`ReconciliationService`] repairs stale subscription state at startup
//! - [`TokensService`] submits token transactions and manages pool subscriptions

pub mod events;
pub mod gateway;
pub mod interfaces;
pub mod reconcile;
pub mod service;
pub mod transformer;

pub use gateway::{CachedSubscriptionResolver, ProxyGateway, SubscriptionResolver};
pub use interfaces::{
    AsyncResponse, TokenBalance, TokenBalanceQuery, TokenBurn, TokenMint, TokenPool,
    TokenPoolActivate, TokenTransfer,
};
pub use reconcile::{ReconcileOutcome, ReconciliationService};
pub use service::{TokensBootstrap, TokensService};
pub use transformer::{EventTransformer, TokenListener};
