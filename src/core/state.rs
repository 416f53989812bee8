//! # Application State
//!
//! Core chat state for Epoch. Domain logic only; presentation state lives in
//! the `tui` module.
//!
//! ```text
//! App
//! ├── transcript: Transcript        // ordered messages, append-only
//! ├── pending: PendingReplies       // request → bot message awaiting reply
//! ├── connection: ConnectionState   // last state reported by the transport
//! ├── user_id: String               // sent with every query
//! ├── starters: Vec<String>         // sample queries for the welcome screen
//! ├── show_starters: bool           // cleared for good by the first submit
//! ├── status_message: String        // title bar text
//! └── endpoint: String              // where the transport connects
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use crate::core::config::ResolvedConfig;
use crate::core::message::Transcript;
use crate::core::pending::{PendingPolicy, PendingReplies};
use crate::core::starter;
use crate::transport::ConnectionState;

/// Error recorded on a reply that could not be sent.
pub const CONNECTION_FAILED: &str = "WebSocket connection failed!";

pub struct App {
    pub transcript: Transcript,
    pub pending: PendingReplies,
    pub connection: ConnectionState,
    pub user_id: String,
    pub starters: Vec<String>,
    pub show_starters: bool,
    pub status_message: String,
    pub endpoint: String,
}

impl App {
    pub fn new(
        user_id: String,
        policy: PendingPolicy,
        starters: Vec<String>,
        endpoint: String,
    ) -> Self {
        Self {
            transcript: Transcript::new(),
            pending: PendingReplies::new(policy),
            connection: ConnectionState::Connecting,
            user_id,
            starters,
            show_starters: true,
            status_message: String::from("Welcome to Epoch!"),
            endpoint,
        }
    }

    pub fn from_config(config: &ResolvedConfig, endpoint: String) -> Self {
        let starters = starter::pick(starter::STARTER_COUNT, &mut rand::rng());
        Self::new(
            config.user_id.clone(),
            config.pending_policy,
            starters,
            endpoint,
        )
    }

    /// True while at least one reply is outstanding.
    pub fn is_loading(&self) -> bool {
        !self.pending.is_empty()
    }
}
