//! The `ConnectorTransport` trait: the seam between the bridge and the connector's REST API.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::request::{ConnectorRequest, ConnectorResponse};

/// A single round trip to the connector.
///
/// Implementations return `Ok` for every reply the connector produced,
/// including non-2xx statuses; status interpretation belongs to
/// [`RetryingConnectorClient`](crate::client::RetryingConnectorClient).
/// `Err` is reserved for calls that never got an answer.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` for use across Tokio tasks.
///
/// # Object Safety
/// The trait is object-safe and can be stored as `Arc<dyn ConnectorTransport>`.
#[async_trait]
pub trait ConnectorTransport: Send + Sync + 'static {
    /// Send one request and return whatever the connector replied.
    async fn send(&self, req: ConnectorRequest) -> Result<ConnectorResponse, TransportError>;

    /// Return the transport's base URL.
    fn url(&self) -> &str;
}
