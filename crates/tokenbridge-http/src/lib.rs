//! tokenbridge-http: `ConnectorTransport` over HTTP, backed by `reqwest`.
//!
//! Retry lives one layer up in `RetryingConnectorClient`; this crate performs
//! exactly one round trip per call.

pub mod client;

pub use client::{HttpConnectorConfig, HttpConnectorTransport};
