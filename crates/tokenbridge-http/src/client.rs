//! HTTP connector transport backed by `reqwest`.

use async_trait::async_trait;
use std::time::Duration;

use tokenbridge_core::error::{BridgeError, TransportError};
use tokenbridge_core::request::{ConnectorRequest, ConnectorResponse, Method};
use tokenbridge_core::transport::ConnectorTransport;

/// Configuration for `HttpConnectorTransport`.
#[derive(Debug, Clone)]
pub struct HttpConnectorConfig {
    pub username: String,
    pub password: String,
    pub request_timeout: Duration,
}

impl Default for HttpConnectorConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Connector REST transport.
pub struct HttpConnectorTransport {
    url: String,
    http: reqwest::Client,
    username: String,
    password: String,
}

impl HttpConnectorTransport {
    /// Create a transport for the connector at `url`.
    pub fn new(url: impl Into<String>, config: HttpConnectorConfig) -> Result<Self, BridgeError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BridgeError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into().trim_end_matches('/').to_string(),
            http,
            username: config.username,
            password: config.password,
        })
    }

    /// Create with default configuration (no credentials).
    pub fn default_for(url: impl Into<String>) -> Result<Self, BridgeError> {
        Self::new(url, HttpConnectorConfig::default())
    }

    fn build(&self, req: &ConnectorRequest) -> reqwest::RequestBuilder {
        let url = join_url(&self.url, &req.path);
        let mut builder = match req.method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
            Method::Patch => self.http.patch(url),
            Method::Delete => self.http.delete(url),
        };
        if !self.username.is_empty() && !self.password.is_empty() {
            builder = builder.basic_auth(&self.username, Some(&self.password));
        }
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }
        builder
    }
}

#[async_trait]
impl ConnectorTransport for HttpConnectorTransport {
    async fn send(&self, req: ConnectorRequest) -> Result<ConnectorResponse, TransportError> {
        tracing::debug!(method = %req.method, path = %req.path, "connector request");

        let resp = self
            .build(&req)
            .send()
            .await
            .map_err(|e| TransportError::Http(describe(&e)))?;

        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| TransportError::Http(describe(&e)))?;

        Ok(ConnectorResponse::new(status, parse_body(&text)))
    }

    fn url(&self) -> &str {
        &self.url
    }
}

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Empty bodies become `Null`; non-JSON bodies are kept as a string.
fn parse_body(text: &str) -> serde_json::Value {
    if text.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
}

/// Include the error kind so retry conditions can match on it.
fn describe(e: &reqwest::Error) -> String {
    let kind = if e.is_timeout() {
        "request timed out"
    } else if e.is_connect() {
        "connection error"
    } else {
        "request error"
    };
    format!("{kind}: {e}")
}
