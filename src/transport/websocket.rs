//! WebSocket transport.
//!
//! The backend answers every text frame it receives with one text frame
//! holding the complete reply. Frames carry no correlation id, so replies are
//! reported with `request_id: None` and matched by the session's pending policy.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::sync::mpsc::{Sender, UnboundedReceiver};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::transport::{Command, InboundEvent, Transport, TransportError};

pub const DEFAULT_WS_URL: &str = "wss://fin-gpt-production.up.railway.app/epoch-ws";

pub struct WebSocketTransport {
    url: String,
}

impl WebSocketTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Maps a raw frame onto an inbound event. Control frames yield `None`.
fn classify(message: Message) -> Option<InboundEvent> {
    match message {
        Message::Text(text) => Some(InboundEvent::TextDelivered {
            request_id: None,
            text: text.as_str().to_string(),
        }),
        Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
            Ok(text) => Some(InboundEvent::TextDelivered {
                request_id: None,
                text,
            }),
            Err(_) => Some(InboundEvent::ErrorDelivered {
                request_id: None,
                error: format!("received {} bytes of non-UTF-8 binary data", bytes.len()),
            }),
        },
        Message::Close(_) => Some(InboundEvent::Closed),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => None,
    }
}

async fn emit(events: &Sender<InboundEvent>, event: InboundEvent) -> Result<(), TransportError> {
    events
        .send(event)
        .await
        .map_err(|_| TransportError::Disconnected)
}

#[async_trait]
impl Transport for WebSocketTransport {
    fn name(&self) -> &str {
        "websocket"
    }

    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn run(
        &self,
        mut commands: UnboundedReceiver<Command>,
        events: Sender<InboundEvent>,
    ) -> Result<(), TransportError> {
        info!("Connecting to {}", self.url);

        let socket = match connect_async(self.url.as_str()).await {
            Ok((socket, response)) => {
                debug!("Handshake complete: HTTP {}", response.status());
                socket
            }
            Err(e) => {
                warn!("WebSocket handshake with {} failed: {}", self.url, e);
                emit(
                    &events,
                    InboundEvent::ErrorDelivered {
                        request_id: None,
                        error: e.to_string(),
                    },
                )
                .await?;
                emit(&events, InboundEvent::Closed).await?;
                return Err(TransportError::Network(e.to_string()));
            }
        };

        info!("WebSocket connected");
        emit(&events, InboundEvent::Opened).await?;

        let (mut sink, mut stream) = socket.split();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Send(request)) => {
                        let json = serde_json::to_string(&request.body)
                            .map_err(|e| TransportError::Encode(e.to_string()))?;
                        debug!("Sending query {} ({} bytes)", request.request_id, json.len());
                        if let Err(e) = sink.send(Message::Text(json.into())).await {
                            warn!("WebSocket send failed: {}", e);
                            emit(
                                &events,
                                InboundEvent::ErrorDelivered {
                                    request_id: Some(request.request_id),
                                    error: e.to_string(),
                                },
                            )
                            .await?;
                            emit(&events, InboundEvent::Closed).await?;
                            return Err(TransportError::Network(e.to_string()));
                        }
                    }
                    Some(Command::Close) | None => {
                        info!("Closing WebSocket");
                        if let Err(e) = sink.send(Message::Close(None)).await {
                            debug!("Close frame not delivered: {}", e);
                        }
                        let _ = sink.close().await;
                        emit(&events, InboundEvent::Closed).await?;
                        return Ok(());
                    }
                },
                frame = stream.next() => match frame {
                    Some(Ok(message)) => {
                        let Some(event) = classify(message) else {
                            continue;
                        };
                        let closed = event == InboundEvent::Closed;
                        emit(&events, event).await?;
                        if closed {
                            info!("Server closed the WebSocket");
                            return Ok(());
                        }
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket stream error: {}", e);
                        emit(
                            &events,
                            InboundEvent::ErrorDelivered {
                                request_id: None,
                                error: e.to_string(),
                            },
                        )
                        .await?;
                        emit(&events, InboundEvent::Closed).await?;
                        return Err(TransportError::Network(e.to_string()));
                    }
                    None => {
                        info!("WebSocket stream ended");
                        emit(&events, InboundEvent::Closed).await?;
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_frame_becomes_uncorrelated_delivery() {
        let event = classify(Message::Text("AAPL is up 2%".into()));
        assert_eq!(
            event,
            Some(InboundEvent::TextDelivered {
                request_id: None,
                text: "AAPL is up 2%".to_string(),
            })
        );
    }

    #[test]
    fn utf8_binary_frame_is_text() {
        let event = classify(Message::Binary(b"MSFT flat".to_vec().into()));
        assert!(matches!(event, Some(InboundEvent::TextDelivered { text, .. }) if text == "MSFT flat"));
    }

    #[test]
    fn invalid_binary_frame_is_error() {
        let event = classify(Message::Binary(vec![0xff, 0xfe].into()));
        assert!(matches!(event, Some(InboundEvent::ErrorDelivered { .. })));
    }

    #[test]
    fn control_frames_are_ignored() {
        assert_eq!(classify(Message::Ping(Vec::new().into())), None);
        assert_eq!(classify(Message::Pong(Vec::new().into())), None);
        assert_eq!(classify(Message::Close(None)), Some(InboundEvent::Closed));
    }
}
