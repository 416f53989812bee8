//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use async_trait::async_trait;
use tokio::sync::mpsc::{Sender, UnboundedReceiver};

use crate::core::pending::PendingPolicy;
use crate::core::state::App;
use crate::transport::{Command, InboundEvent, Transport, TransportError};

/// In-process transport that answers every query with `echo: <message>`.
pub struct EchoTransport;

#[async_trait]
impl Transport for EchoTransport {
    fn name(&self) -> &str {
        "echo"
    }

    fn endpoint(&self) -> &str {
        "memory://echo"
    }

    async fn run(
        &self,
        mut commands: UnboundedReceiver<Command>,
        events: Sender<InboundEvent>,
    ) -> Result<(), TransportError> {
        let emit = |event| {
            let events = events.clone();
            async move { events.send(event).await.map_err(|_| TransportError::Disconnected) }
        };
        emit(InboundEvent::Opened).await?;
        while let Some(command) = commands.recv().await {
            match command {
                Command::Send(req) => {
                    emit(InboundEvent::TextDelivered {
                        request_id: Some(req.request_id),
                        text: format!("echo: {}", req.body.message),
                    })
                    .await?
                }
                Command::Close => break,
            }
        }
        emit(InboundEvent::Closed).await
    }
}

pub fn test_app_with_policy(policy: PendingPolicy) -> App {
    App::new(
        "test-user".to_string(),
        policy,
        vec![
            "What is AAPL doing today?".to_string(),
            "Summarize today's news for NVDA".to_string(),
        ],
        "memory://echo".to_string(),
    )
}

/// Creates a test App that is still connecting.
pub fn test_app() -> App {
    test_app_with_policy(PendingPolicy::default())
}

/// Creates a test App whose connection has already opened.
pub fn open_app() -> App {
    let mut app = test_app();
    crate::core::action::update(&mut app, crate::core::action::Action::Inbound(InboundEvent::Opened));
    app
}
