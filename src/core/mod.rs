//! # Core Application Logic
//!
//! This module contains Epoch's chat logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Transcript, pending  │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • ChatSession (owns    │
//!                    │    the connection)      │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┴───────────────────┐
//!            ▼                                       ▼
//!     ┌────────────┐                          ┌────────────┐
//!     │    TUI     │                          │ Transport  │
//!     │  Adapter   │                          │ (ws/http)  │
//!     │ (ratatui)  │                          │            │
//!     └────────────┘                          └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`message`]: `Transcript` and `Message`, the append-only chat log
//! - [`pending`]: which bot message each outstanding request resolves
//! - [`validation`]: the `Query` type the form hands to the session
//! - [`starter`]: sample queries for the welcome screen
//! - [`state`]: the `App` struct, all chat state in one place
//! - [`action`]: the `Action` enum and `update()` reducer
//! - [`session`]: `ChatSession`, the reducer plus its connection
//! - [`config`]: layered configuration

pub mod action;
pub mod config;
pub mod message;
pub mod pending;
pub mod session;
pub mod starter;
pub mod state;
pub mod validation;
