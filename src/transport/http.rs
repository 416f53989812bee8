//! HTTP transport: one `POST {base_url}/epoch` per query.
//!
//! The backend streams the reply body; the transport reads it to completion
//! and reports it as a single delivery correlated with the request.

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::sync::mpsc::{Sender, UnboundedReceiver};

use crate::transport::{
    Command, InboundEvent, OutboundQuery, OutboundRequest, Transport, TransportError,
};

pub const DEFAULT_HTTP_URL: &str = "http://localhost:8000";

pub struct HttpTransport {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            endpoint: format!("{}/epoch", base_url.trim_end_matches('/')),
            client: reqwest::Client::new(),
        }
    }
}

/// Posts one query and collects the streamed reply body.
async fn post_query(
    client: &reqwest::Client,
    endpoint: &str,
    body: &OutboundQuery,
) -> Result<String, TransportError> {
    let mut response = client
        .post(endpoint)
        .json(body)
        .send()
        .await
        .map_err(|e| TransportError::Network(e.to_string()))?;

    debug!("Epoch response status: {}", response.status());

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        warn!("Epoch API error: {} - {}", status, message);
        return Err(TransportError::Api { status, message });
    }

    // Collect raw bytes first so multi-byte characters split across chunks survive
    let mut bytes = Vec::new();
    let mut chunk_count = 0usize;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| TransportError::Network(e.to_string()))?
    {
        chunk_count += 1;
        bytes.extend_from_slice(&chunk);
    }
    debug!("Reply complete: {} chunks, {} bytes", chunk_count, bytes.len());

    String::from_utf8(bytes).map_err(|e| TransportError::Encode(e.to_string()))
}

fn spawn_query(
    client: reqwest::Client,
    endpoint: String,
    request: OutboundRequest,
    events: Sender<InboundEvent>,
) {
    tokio::spawn(async move {
        let request_id = Some(request.request_id);
        let event = match post_query(&client, &endpoint, &request.body).await {
            Ok(text) => InboundEvent::TextDelivered { request_id, text },
            Err(e) => InboundEvent::ErrorDelivered {
                request_id,
                error: e.to_string(),
            },
        };
        if events.send(event).await.is_err() {
            warn!(
                "Dropping reply for {}: receiver dropped",
                request.request_id
            );
        }
    });
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn run(
        &self,
        mut commands: UnboundedReceiver<Command>,
        events: Sender<InboundEvent>,
    ) -> Result<(), TransportError> {
        // Stateless: every request opens its own connection, so the channel is usable at once.
        events
            .send(InboundEvent::Opened)
            .await
            .map_err(|_| TransportError::Disconnected)?;

        while let Some(command) = commands.recv().await {
            match command {
                Command::Send(request) => {
                    info!("POST {} (request {})", self.endpoint, request.request_id);
                    spawn_query(
                        self.client.clone(),
                        self.endpoint.clone(),
                        request,
                        events.clone(),
                    );
                }
                Command::Close => break,
            }
        }

        events
            .send(InboundEvent::Closed)
            .await
            .map_err(|_| TransportError::Disconnected)
    }
}
