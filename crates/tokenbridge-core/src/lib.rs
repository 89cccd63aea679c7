//! tokenbridge-core: foundation types and traits for TokenBridge.
//!
//! # Overview
//!
//! TokenBridge subscribes to a blockchain connector's event stream, turns raw
//! ERC1155-style contract logs into token notifications and republishes them
//! with at-least-once delivery. The core crate defines:
//!
//! - [`ConnectorTransport`]: the async trait every connector transport implements
//! - [`RetryingConnectorClient`]: exponential-backoff retry around every outbound call
//! - [`EventStreamClient`]: event stream and subscription management
//! - [`codec`] module: subscription names, composite token ids, hex payloads
//! - [`RawChainEvent`] / [`EventStreamReply`]: inbound feed types
//! - [`Notification`]: the outbound notification schema
//! - [`BridgeError`] / [`TransportError`]: structured error types

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod eventstream;
pub mod notification;
pub mod policy;
pub mod request;
pub mod transport;

pub use client::RetryingConnectorClient;
pub use config::{BridgeConfig, FeedSettings, RetrySettings};
pub use error::{BridgeError, TransportError};
pub use event::{EventStreamReply, RawChainEvent, TransactionLocator};
pub use eventstream::{EventStream, EventStreamClient, EventStreamSubscription};
pub use notification::{Notification, ReceiptEvent, TokenPoolEvent, TokenTransferEvent};
pub use request::{ConnectorRequest, ConnectorResponse, Method};
pub use transport::ConnectorTransport;
