//! `RetryingConnectorClient`: every outbound connector call goes through here.
//!
//! Attempts are strictly sequential: a call is re-issued only after the
//! previous attempt has failed and the backoff delay has elapsed.

use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::config::RetrySettings;
use crate::error::{BridgeError, TransportError};
use crate::policy::{NeverRetry, PatternPredicate, RetryPolicy, RetryPredicate};
use crate::request::{ConnectorRequest, ConnectorResponse};
use crate::transport::ConnectorTransport;

/// Connector client with exponential-backoff retry.
#[derive(Clone)]
pub struct RetryingConnectorClient {
    transport: Arc<dyn ConnectorTransport>,
    retry: RetryPolicy,
    predicate: Arc<dyn RetryPredicate>,
}

impl RetryingConnectorClient {
    /// Build a client from retry settings. Fails if the retry condition is not a valid pattern.
    pub fn new(
        transport: Arc<dyn ConnectorTransport>,
        settings: &RetrySettings,
    ) -> Result<Self, BridgeError> {
        let predicate: Arc<dyn RetryPredicate> = if settings.condition.is_empty() {
            Arc::new(NeverRetry)
        } else {
            Arc::new(PatternPredicate::new(&settings.condition).map_err(|e| {
                BridgeError::Config(format!("invalid retry condition: {e}"))
            })?)
        };
        Ok(Self::with_predicate(
            transport,
            RetryPolicy::new(settings.to_retry_config()),
            predicate,
        ))
    }

    /// Build a client with an explicit policy and retryability predicate.
    pub fn with_predicate(
        transport: Arc<dyn ConnectorTransport>,
        retry: RetryPolicy,
        predicate: Arc<dyn RetryPredicate>,
    ) -> Self {
        Self {
            transport,
            retry,
            predicate,
        }
    }

    pub fn url(&self) -> &str {
        self.transport.url()
    }

    async fn send_once(&self, req: &ConnectorRequest) -> Result<ConnectorResponse, TransportError> {
        let resp = self.transport.send(req.clone()).await?;
        if resp.is_success() {
            return Ok(resp);
        }
        let body = match &resp.body {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Err(TransportError::Status {
            status: resp.status,
            body,
        })
    }

    /// Send a request, retrying transient failures per the configured policy.
    ///
    /// A 404 is surfaced as [`BridgeError::NotFound`] without retrying.
    pub async fn send(&self, req: ConnectorRequest) -> Result<ConnectorResponse, BridgeError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let err = match self.send_once(&req).await {
                Ok(resp) => return Ok(resp),
                Err(e) => e,
            };

            if err.is_not_found() {
                return Err(BridgeError::NotFound {
                    resource: req.path.clone(),
                });
            }

            if !self.predicate.is_retryable(&err) {
                tracing::debug!(
                    method = %req.method,
                    path = %req.path,
                    error = %err,
                    "connector rejected request"
                );
                return Err(BridgeError::ConnectorRejected {
                    status: err.status(),
                    source: err,
                });
            }

            match self.retry.next_delay(attempt) {
                Some(delay) => {
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        path = %req.path,
                        "retrying connector request"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    tracing::error!(
                        attempt,
                        error = %err,
                        path = %req.path,
                        "max retries exceeded"
                    );
                    return Err(BridgeError::ConnectorUnavailable {
                        attempts: attempt,
                        last_error: err,
                    });
                }
            }
        }
    }

    /// Send and deserialize the body.
    pub async fn send_json<T: DeserializeOwned>(&self, req: ConnectorRequest) -> Result<T, BridgeError> {
        let resp = self.send(req).await?;
        Ok(resp.json()?)
    }

    /// Like [`send_json`](Self::send_json), but a 404 yields `Ok(None)`.
    pub async fn send_optional<T: DeserializeOwned>(
        &self,
        req: ConnectorRequest,
    ) -> Result<Option<T>, BridgeError> {
        match self.send_json(req).await {
            Ok(value) => Ok(Some(value)),
            Err(BridgeError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
