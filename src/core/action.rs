//! # Actions
//!
//! Everything that can happen in Epoch becomes an `Action`.
//! User submits a query? That's `Action::Submit(query)`.
//! The socket delivers a reply? That's `Action::Inbound(TextDelivered)`.
//!
//! The `update()` function applies an action to the state and returns an
//! `Effect` describing the I/O the caller must perform. No side effects here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```
//!
//! Actions are applied one at a time, in the order the event loop receives
//! them. Any inbound event is acceptable at any time: deliveries with nothing
//! pending are dropped, and closure never touches the transcript.

use log::{debug, info, warn};

use crate::core::message::Resolution;
use crate::core::state::{App, CONNECTION_FAILED};
use crate::core::validation::Query;
use crate::transport::{
    ConnectionState, InboundEvent, OutboundQuery, OutboundRequest, RequestId,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Submit(Query),
    Inbound(InboundEvent),
    /// The transport refused a queued request.
    SendFailed { request_id: RequestId, reason: String },
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Send(OutboundRequest),
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit(query) => submit(app, query),
        Action::Inbound(event) => {
            inbound(app, event);
            Effect::None
        }
        Action::SendFailed { request_id, reason } => {
            warn!("Send failed for {}: {}", request_id, reason);
            app.connection = ConnectionState::Closed;
            resolve(
                app,
                Some(request_id),
                Resolution::Error(CONNECTION_FAILED.to_string()),
            );
            Effect::None
        }
        Action::Quit => Effect::Quit,
    }
}

fn submit(app: &mut App, query: Query) -> Effect {
    info!("Query submitted ({} chars)", query.as_str().chars().count());
    app.show_starters = false;

    let text = query.into_string();
    app.transcript.push_user(text.clone());
    let bot_id = app.transcript.push_pending_bot();

    let request_id = RequestId::new();
    if let Some(orphan) = app.pending.register(request_id, bot_id) {
        warn!("Pending reply {} displaced by a new submission", orphan);
    }

    if app.connection != ConnectionState::Open {
        info!(
            "Connection is {}, failing request {} without sending",
            app.connection.label(),
            request_id
        );
        resolve(
            app,
            Some(request_id),
            Resolution::Error(CONNECTION_FAILED.to_string()),
        );
        return Effect::None;
    }

    app.status_message = String::from("Analyzing...");
    Effect::Send(OutboundRequest {
        request_id,
        body: OutboundQuery {
            message: text,
            user_id: app.user_id.clone(),
        },
    })
}

fn inbound(app: &mut App, event: InboundEvent) {
    match event {
        InboundEvent::Opened => {
            info!("Connection open");
            app.connection = ConnectionState::Open;
            app.status_message = String::from("Connected");
        }
        InboundEvent::TextDelivered { request_id, text } => {
            debug!("Reply delivered ({} bytes)", text.len());
            if resolve(app, request_id, Resolution::Text(text)) {
                app.status_message = String::from("Ready");
            }
        }
        InboundEvent::ErrorDelivered { request_id, error } => {
            warn!("Transport error: {}", error);
            app.status_message = format!("Error: {}", error);
            resolve(app, request_id, Resolution::Error(error));
        }
        InboundEvent::Closed => {
            info!("Connection closed");
            app.connection = ConnectionState::Closed;
            app.status_message = String::from("Disconnected");
        }
    }
}

/// Applies a resolution to the pending message a delivery belongs to.
/// Returns `false` when nothing was pending for it.
fn resolve(app: &mut App, request_id: Option<RequestId>, resolution: Resolution) -> bool {
    let Some(message_id) = app.pending.take(request_id) else {
        debug!("Dropping unsolicited delivery (request {:?})", request_id);
        return false;
    };
    app.transcript.resolve(message_id, resolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;
    use crate::core::pending::PendingPolicy;
    use crate::test_support::{open_app, test_app, test_app_with_policy};

    fn query(text: &str) -> Query {
        Query::parse(text).unwrap()
    }

    fn text_delivered(text: &str) -> Action {
        Action::Inbound(InboundEvent::TextDelivered {
            request_id: None,
            text: text.to_string(),
        })
    }

    #[test]
    fn submit_appends_user_and_pending_bot() {
        let mut app = open_app();
        let effect = update(&mut app, Action::Submit(query("What is AAPL doing today?")));

        let messages = app.transcript.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text.as_deref(), Some("What is AAPL doing today?"));
        assert!(!messages[0].loading);
        assert_eq!(messages[1].role, Role::Bot);
        assert!(messages[1].loading);
        assert!(app.is_loading());
        assert!(!app.show_starters);

        match effect {
            Effect::Send(req) => {
                assert_eq!(req.body.message, "What is AAPL doing today?");
                assert_eq!(req.body.user_id, "test-user");
            }
            other => panic!("expected Send, got {:?}", other),
        }
    }

    #[test]
    fn every_submit_adds_exactly_two_entries() {
        let mut app = open_app();
        for i in 0..5 {
            update(&mut app, Action::Submit(query(&format!("query {i}"))));
            assert_eq!(app.transcript.len(), (i + 1) * 2);
        }
    }

    #[test]
    fn inbound_text_resolves_pending_reply() {
        let mut app = open_app();
        update(&mut app, Action::Submit(query("What is AAPL doing today?")));
        update(&mut app, text_delivered("AAPL is up 2%"));

        let bot = &app.transcript.messages()[1];
        assert_eq!(bot.text.as_deref(), Some("AAPL is up 2%"));
        assert!(bot.error.is_none());
        assert!(!bot.loading);
        assert!(!app.is_loading());
    }

    #[test]
    fn inbound_error_resolves_pending_reply() {
        let mut app = open_app();
        update(&mut app, Action::Submit(query("What is AAPL doing today?")));
        update(
            &mut app,
            Action::Inbound(InboundEvent::ErrorDelivered {
                request_id: None,
                error: "socket reset".to_string(),
            }),
        );

        let bot = &app.transcript.messages()[1];
        assert_eq!(bot.error.as_deref(), Some("socket reset"));
        assert!(bot.text.is_none());
        assert!(!bot.loading);
    }

    #[test]
    fn submit_while_closed_fails_immediately_without_send() {
        let mut app = open_app();
        update(&mut app, Action::Inbound(InboundEvent::Closed));

        let effect = update(&mut app, Action::Submit(query("What is AAPL doing today?")));
        assert_eq!(effect, Effect::None);

        let bot = &app.transcript.messages()[1];
        assert_eq!(bot.error.as_deref(), Some(CONNECTION_FAILED));
        assert!(!bot.loading);
        assert!(!app.is_loading());
    }

    #[test]
    fn submit_while_connecting_fails_immediately_without_send() {
        let mut app = test_app();
        assert_eq!(app.connection, ConnectionState::Connecting);
        let effect = update(&mut app, Action::Submit(query("hello there")));
        assert_eq!(effect, Effect::None);
        assert_eq!(
            app.transcript.messages()[1].error.as_deref(),
            Some(CONNECTION_FAILED)
        );
    }

    #[test]
    fn unsolicited_events_do_not_mutate_transcript() {
        let mut app = open_app();
        let before = app.transcript.revision();

        update(&mut app, text_delivered("nobody asked"));
        update(
            &mut app,
            Action::Inbound(InboundEvent::ErrorDelivered {
                request_id: None,
                error: "stray".to_string(),
            }),
        );

        assert!(app.transcript.is_empty());
        assert_eq!(app.transcript.revision(), before);
    }

    #[test]
    fn duplicate_reply_after_resolution_is_dropped() {
        let mut app = open_app();
        update(&mut app, Action::Submit(query("hello there")));
        update(&mut app, text_delivered("first"));
        let revision = app.transcript.revision();
        update(&mut app, text_delivered("second"));
        assert_eq!(app.transcript.messages()[1].text.as_deref(), Some("first"));
        assert_eq!(app.transcript.revision(), revision);
    }

    #[test]
    fn close_leaves_pending_message_untouched() {
        let mut app = open_app();
        update(&mut app, Action::Submit(query("hello there")));
        let revision = app.transcript.revision();
        update(&mut app, Action::Inbound(InboundEvent::Closed));

        assert_eq!(app.connection, ConnectionState::Closed);
        assert!(app.transcript.messages()[1].loading);
        assert_eq!(app.transcript.revision(), revision);
    }

    #[test]
    fn reply_after_close_still_resolves() {
        let mut app = open_app();
        update(&mut app, Action::Submit(query("What is AAPL doing today?")));
        update(&mut app, Action::Inbound(InboundEvent::Closed));
        update(&mut app, text_delivered("AAPL is up 2%"));

        let bot = &app.transcript.messages()[1];
        assert_eq!(bot.text.as_deref(), Some("AAPL is up 2%"));
        assert!(!bot.loading);
        assert!(!app.is_loading());
        assert_eq!(app.connection, ConnectionState::Closed);
    }

    #[test]
    fn error_after_close_still_resolves() {
        let mut app = open_app();
        update(&mut app, Action::Submit(query("What is AAPL doing today?")));
        update(&mut app, Action::Inbound(InboundEvent::Closed));
        update(
            &mut app,
            Action::Inbound(InboundEvent::ErrorDelivered {
                request_id: None,
                error: "stream reset".to_string(),
            }),
        );

        let bot = &app.transcript.messages()[1];
        assert_eq!(bot.error.as_deref(), Some("stream reset"));
        assert!(!bot.loading);
    }

    #[test]
    fn send_failure_resolves_with_connectivity_error() {
        let mut app = open_app();
        let Effect::Send(req) = update(&mut app, Action::Submit(query("hello there"))) else {
            panic!("expected Send");
        };
        update(
            &mut app,
            Action::SendFailed {
                request_id: req.request_id,
                reason: "connection is not open".to_string(),
            },
        );
        assert_eq!(
            app.transcript.messages()[1].error.as_deref(),
            Some(CONNECTION_FAILED)
        );
        assert_eq!(app.connection, ConnectionState::Closed);
    }

    #[test]
    fn correlated_policy_resolves_concurrent_submits_independently() {
        let mut app = test_app_with_policy(PendingPolicy::Correlated);
        update(&mut app, Action::Inbound(InboundEvent::Opened));
        update(&mut app, Action::Submit(query("first question")));
        update(&mut app, Action::Submit(query("second question")));

        update(&mut app, text_delivered("first answer"));
        update(&mut app, text_delivered("second answer"));

        let messages = app.transcript.messages();
        assert_eq!(messages[1].text.as_deref(), Some("first answer"));
        assert_eq!(messages[3].text.as_deref(), Some("second answer"));
        assert!(messages.iter().all(|m| !m.loading));
    }

    #[test]
    fn correlated_policy_honors_request_ids_out_of_order() {
        let mut app = test_app_with_policy(PendingPolicy::Correlated);
        update(&mut app, Action::Inbound(InboundEvent::Opened));
        let Effect::Send(first) = update(&mut app, Action::Submit(query("first question"))) else {
            panic!("expected Send");
        };
        let Effect::Send(second) = update(&mut app, Action::Submit(query("second question")))
        else {
            panic!("expected Send");
        };

        update(
            &mut app,
            Action::Inbound(InboundEvent::TextDelivered {
                request_id: Some(second.request_id),
                text: "second answer".to_string(),
            }),
        );
        assert!(app.transcript.messages()[1].loading);
        assert_eq!(
            app.transcript.messages()[3].text.as_deref(),
            Some("second answer")
        );

        update(
            &mut app,
            Action::Inbound(InboundEvent::TextDelivered {
                request_id: Some(first.request_id),
                text: "first answer".to_string(),
            }),
        );
        assert_eq!(
            app.transcript.messages()[1].text.as_deref(),
            Some("first answer")
        );
    }

    #[test]
    fn single_slot_policy_orphans_earlier_reply() {
        let mut app = test_app_with_policy(PendingPolicy::SingleSlot);
        update(&mut app, Action::Inbound(InboundEvent::Opened));
        update(&mut app, Action::Submit(query("first question")));
        update(&mut app, Action::Submit(query("second question")));

        update(&mut app, text_delivered("an answer"));

        let messages = app.transcript.messages();
        // The first bot message was displaced and never resolves
        assert!(messages[1].loading);
        assert!(messages[1].text.is_none());
        assert_eq!(messages[3].text.as_deref(), Some("an answer"));
        assert!(!app.is_loading());
    }

    #[test]
    fn opened_marks_connection_open() {
        let mut app = test_app();
        update(&mut app, Action::Inbound(InboundEvent::Opened));
        assert_eq!(app.connection, ConnectionState::Open);
        assert_eq!(update(&mut app, Action::Quit), Effect::Quit);
    }
}
