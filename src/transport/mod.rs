pub mod connection;
pub mod http;
pub mod types;
pub mod websocket;

pub use connection::{ConnectionHandle, Transport, open};
pub use http::HttpTransport;
pub use types::{
    Command, ConnectionState, InboundEvent, OutboundQuery, OutboundRequest, RequestId,
    TransportError,
};
pub use websocket::WebSocketTransport;
