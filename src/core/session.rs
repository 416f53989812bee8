//! # Chat Session
//!
//! Owns the connection for the lifetime of one chat and performs the I/O
//! that `update()` asks for.
//!
//! ```text
//!   Transport task ──InboundEvent──► forwarder ──Action::Inbound──┐
//!                                                                 ▼
//!   UI loop ──Action──► ChatSession::dispatch ──► update(app) ──► Effect
//!                              │                                  │
//!                              └──── ConnectionHandle::send ◄─────┘
//! ```
//!
//! Transport tasks never touch `App`; they only feed the action queue the UI
//! loop drains. A failed send is folded back into the same `dispatch` call,
//! so the pending reply is resolved before the next frame is drawn.

use std::sync::{Arc, mpsc};

use log::{debug, info, warn};

use crate::core::action::{Action, Effect, update};
use crate::core::state::App;
use crate::transport::{self, ConnectionHandle, InboundEvent, Transport};

/// Buffer between a transport run loop and the forwarder task.
const EVENT_BUFFER: usize = 64;

pub struct ChatSession {
    app: App,
    connection: ConnectionHandle,
}

impl ChatSession {
    /// Opens `transport` and wires its events into `actions`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(app: App, transport: Arc<dyn Transport>, actions: mpsc::Sender<Action>) -> Self {
        info!(
            "Opening {} transport to {}",
            transport.name(),
            transport.endpoint()
        );
        let (events_tx, mut events_rx) = tokio::sync::mpsc::channel::<InboundEvent>(EVENT_BUFFER);
        let (connection, _run_task) = transport::open(transport, events_tx);

        tokio::spawn(async move {
            let mut forwarded = 0usize;
            while let Some(event) = events_rx.recv().await {
                forwarded += 1;
                debug!("Forwarding inbound event: {:?}", event);
                if actions.send(Action::Inbound(event)).is_err() {
                    warn!("Failed to forward inbound event: receiver dropped");
                    return;
                }
            }
            debug!("Event stream ended after {} events", forwarded);
        });

        Self { app, connection }
    }

    /// Builds a session around an existing handle. Nothing is spawned.
    pub fn with_connection(app: App, connection: ConnectionHandle) -> Self {
        Self { app, connection }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Applies one action and carries out its effect.
    ///
    /// Returns `Effect::Quit` when the caller should exit, otherwise
    /// `Effect::None`; sends are always handled here.
    pub fn dispatch(&mut self, action: Action) -> Effect {
        match update(&mut self.app, action) {
            Effect::Send(request) => {
                let request_id = request.request_id;
                if let Err(e) = self.connection.send(request) {
                    update(
                        &mut self.app,
                        Action::SendFailed {
                            request_id,
                            reason: e.to_string(),
                        },
                    );
                }
                Effect::None
            }
            other => other,
        }
    }

    /// Closes the connection. The transport reports `Closed` on its way out,
    /// but nothing in the transcript changes.
    pub fn close(&mut self) {
        info!("Closing session connection");
        self.connection.close();
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.connection.close();
    }
}
