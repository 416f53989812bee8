//! # Transcript
//!
//! The ordered list of chat messages for one session.
//!
//! ```text
//! Transcript
//! ├── messages: Vec<Message>   // insertion order = display order
//! └── revision: u64            // bumped on every append or resolution
//! ```
//!
//! Messages are only ever appended. The single permitted in-place change is
//! resolving a pending bot message, once, to either text or an error.

use std::fmt;

use chrono::{DateTime, Local};
use log::{debug, warn};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    /// Absent while a bot reply is pending.
    pub text: Option<String>,
    pub error: Option<String>,
    /// True only for a bot message still awaiting its reply.
    pub loading: bool,
    pub created_at: DateTime<Local>,
}

impl Message {
    fn user(text: String) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            text: Some(text),
            error: None,
            loading: false,
            created_at: Local::now(),
        }
    }

    fn pending_bot() -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Bot,
            text: None,
            error: None,
            loading: true,
            created_at: Local::now(),
        }
    }
}

/// A reply outcome applied to a pending bot message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Text(String),
    Error(String),
}

#[derive(Debug, Default, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
    revision: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Increases on every mutation; the view compares it to detect changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn push_user(&mut self, text: String) -> MessageId {
        let message = Message::user(text);
        let id = message.id;
        self.messages.push(message);
        self.revision += 1;
        id
    }

    pub fn push_pending_bot(&mut self) -> MessageId {
        let message = Message::pending_bot();
        let id = message.id;
        self.messages.push(message);
        self.revision += 1;
        id
    }

    /// Resolves a pending bot message. Returns `false` (and changes nothing)
    /// if the id is unknown, names a user message, or was already resolved.
    pub fn resolve(&mut self, id: MessageId, resolution: Resolution) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            warn!("Resolution for unknown message {}", id);
            return false;
        };
        if message.role != Role::Bot || !message.loading {
            debug!("Ignoring resolution for settled message {}", id);
            return false;
        }

        match resolution {
            Resolution::Text(text) => message.text = Some(text),
            Resolution::Error(error) => message.error = Some(error),
        }
        message.loading = false;
        self.revision += 1;
        true
    }
}
