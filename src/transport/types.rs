use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Client-generated id pairing an outbound query with its pending reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wire body of a user query: `{"message": ..., "user_id": ...}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OutboundQuery {
    pub message: String,
    pub user_id: String,
}

/// A query on its way out, tagged with the id of the reply it expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub request_id: RequestId,
    pub body: OutboundQuery,
}

/// Readiness of the connection as last reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "online",
            ConnectionState::Closed => "offline",
        }
    }
}

/// Everything a transport can report back to the session.
///
/// `request_id` is `None` when the wire carries no correlation (WebSocket);
/// the pending-reply policy decides which message it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Opened,
    TextDelivered {
        request_id: Option<RequestId>,
        text: String,
    },
    ErrorDelivered {
        request_id: Option<RequestId>,
        error: String,
    },
    Closed,
}

/// Instructions from the session to the transport run loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(OutboundRequest),
    Close,
}

/// Errors raised by transports.
#[derive(Debug)]
pub enum TransportError {
    /// The run loop has exited; nothing can be sent.
    Disconnected,
    /// Handshake or socket-level failure.
    Network(String),
    /// Server answered with a non-success status.
    Api { status: u16, message: String },
    /// Failed to encode an outbound body or decode an inbound frame.
    Encode(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Disconnected => write!(f, "connection is not open"),
            TransportError::Network(msg) => write!(f, "network error: {msg}"),
            TransportError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            TransportError::Encode(msg) => write!(f, "encoding error: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_query_serializes_wire_fields() {
        let body = OutboundQuery {
            message: "What is AAPL doing today?".to_string(),
            user_id: "user_42".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"message": "What is AAPL doing today?", "user_id": "user_42"})
        );
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn connection_state_defaults_to_connecting() {
        assert_eq!(ConnectionState::default(), ConnectionState::Connecting);
        assert_eq!(ConnectionState::Open.label(), "online");
    }

    #[test]
    fn api_error_display_includes_status() {
        let err = TransportError::Api {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "API error (HTTP 502): bad gateway");
    }
}
