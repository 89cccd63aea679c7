//! Transport-level and caller-level error types.

use thiserror::Error;

/// Errors raised by a single connector round trip.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, timeout, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The connector answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// WebSocket connection/send/receive error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Response could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// An unexpected error.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// HTTP status code, when the connector answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` for a 404 reply.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Errors surfaced to callers of the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Every attempt failed with a retryable error.
    #[error("Connector unavailable after {attempts} attempts: {last_error}")]
    ConnectorUnavailable {
        attempts: u32,
        last_error: TransportError,
    },

    /// The connector refused the call; retrying will not help.
    #[error("Connector rejected request: {source}")]
    ConnectorRejected {
        status: Option<u16>,
        #[source]
        source: TransportError,
    },

    /// The requested receipt or resource does not exist.
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Invalid token id '{value}': {reason}")]
    InvalidTokenId { value: String, reason: String },

    #[error("Invalid pool id '{value}'")]
    InvalidPoolId { value: String },

    /// A request that cannot be turned into a connector call.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BridgeError {
    /// Returns `true` if the connector could not be reached (transient, exhausted).
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ConnectorUnavailable { .. })
    }

    /// Returns `true` if the connector rejected the call outright.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::ConnectorRejected { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_text_carries_code_and_body() {
        let err = TransportError::Status {
            status: 503,
            body: "upstream down".into(),
        };
        assert_eq!(err.to_string(), "HTTP 503: upstream down");
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_not_found());
    }

    #[test]
    fn classification_helpers() {
        let unavailable = BridgeError::ConnectorUnavailable {
            attempts: 3,
            last_error: TransportError::Http("connection refused".into()),
        };
        assert!(unavailable.is_unavailable());
        assert!(!unavailable.is_rejected());

        let rejected = BridgeError::ConnectorRejected {
            status: Some(400),
            source: TransportError::Status {
                status: 400,
                body: "bad input".into(),
            },
        };
        assert!(rejected.is_rejected());
    }
}
