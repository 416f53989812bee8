use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::sync::mpsc::{self, Sender, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::types::{Command, InboundEvent, OutboundRequest, TransportError};

/// A full-duplex channel to the finance backend.
///
/// `run` owns the network resource for the lifetime of a session: it consumes
/// `Command`s until `Command::Close` (or until every `ConnectionHandle` is
/// dropped) and reports everything that happens as `InboundEvent`s.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns the name of the transport.
    fn name(&self) -> &str;

    /// Where this transport connects, for display.
    fn endpoint(&self) -> &str;

    async fn run(
        &self,
        commands: UnboundedReceiver<Command>,
        events: Sender<InboundEvent>,
    ) -> Result<(), TransportError>;
}

/// The sending side of a connection, owned by the chat session.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    commands: UnboundedSender<Command>,
}

impl ConnectionHandle {
    /// Creates a handle plus the command stream a transport run loop consumes.
    pub fn channel() -> (Self, UnboundedReceiver<Command>) {
        let (commands, rx) = mpsc::unbounded_channel();
        (Self { commands }, rx)
    }

    /// Queues a request for the run loop. Fails once the run loop is gone.
    pub fn send(&self, request: OutboundRequest) -> Result<(), TransportError> {
        debug!("Queueing outbound request {}", request.request_id);
        self.commands
            .send(Command::Send(request))
            .map_err(|_| TransportError::Disconnected)
    }

    /// Asks the run loop to close the connection. Safe to call repeatedly.
    pub fn close(&self) {
        if self.commands.send(Command::Close).is_err() {
            debug!("Close requested after transport already stopped");
        }
    }
}

/// Starts `transport` on the tokio runtime and returns the handle that talks to it.
pub fn open(
    transport: Arc<dyn Transport>,
    events: Sender<InboundEvent>,
) -> (ConnectionHandle, JoinHandle<()>) {
    let (handle, commands) = ConnectionHandle::channel();
    let task = tokio::spawn(async move {
        if let Err(e) = transport.run(commands, events).await {
            warn!("Transport '{}' stopped with error: {}", transport.name(), e);
        }
    });
    (handle, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::types::{OutboundQuery, RequestId};

    fn request(text: &str) -> OutboundRequest {
        OutboundRequest {
            request_id: RequestId::new(),
            body: OutboundQuery {
                message: text.to_string(),
                user_id: "u".to_string(),
            },
        }
    }

    #[test]
    fn send_forwards_command() {
        let (handle, mut rx) = ConnectionHandle::channel();
        let req = request("hi there");
        handle.send(req.clone()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), Command::Send(req));
    }

    #[test]
    fn send_fails_when_run_loop_dropped() {
        let (handle, rx) = ConnectionHandle::channel();
        drop(rx);
        assert!(matches!(
            handle.send(request("hi there")),
            Err(TransportError::Disconnected)
        ));
        // Closing a dead connection is a no-op
        handle.close();
    }

    #[test]
    fn open_runs_transport_until_close() {
        use crate::test_support::EchoTransport;

        tokio_test::block_on(async {
            let (tx, mut rx) = mpsc::channel(8);
            let (handle, task) = open(Arc::new(EchoTransport), tx);
            handle.send(request("ping")).unwrap();
            handle.close();
            task.await.unwrap();

            assert_eq!(rx.recv().await, Some(InboundEvent::Opened));
            assert!(matches!(
                rx.recv().await,
                Some(InboundEvent::TextDelivered { text, .. }) if text == "echo: ping"
            ));
            assert_eq!(rx.recv().await, Some(InboundEvent::Closed));
        });
    }
}
