//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! The event loop uses conditional redraw to avoid unnecessary work:
//!
//! - **Animating** (reply pending, or a reply still being revealed): draws
//!   every ~80ms so the spinner and word reveal advance.
//! - **Idle**: sleeps up to 500ms, only redraws on input, inbound actions or
//!   terminal resize.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call, making blinking cursors appear erratic during continuous redraws.

mod component;
pub mod components;
pub mod event;
pub mod markdown;
pub mod reveal;
mod ui;

use log::{debug, info};
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;

use crate::TransportKind;
use crate::core::action::{Action, Effect};
use crate::core::config::ResolvedConfig;
use crate::core::session::ChatSession;
use crate::core::state::App;
use crate::core::validation::Query;
use crate::transport::{HttpTransport, Transport, WebSocketTransport};
use crate::tui::component::EventHandler;
use crate::tui::components::{InputBox, InputEvent, MessageListState, Welcome};
use crate::tui::event::{TuiEvent, poll_event, poll_event_immediate};
use crate::tui::reveal::Reveal;

const ANIMATION_TICK: Duration = Duration::from_millis(80);
const IDLE_TICK: Duration = Duration::from_millis(500);

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    // Persistent component states
    pub message_list: MessageListState,
    pub input_box: InputBox,
    pub reveal: Reveal,
}

impl TuiState {
    pub fn new(reveal_words_per_frame: usize) -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            reveal: Reveal::new(reveal_words_per_frame),
        }
    }

    /// Spinner or word reveal in progress.
    pub fn is_animating(&self, app: &App) -> bool {
        app.is_loading() || self.reveal.is_animating()
    }

    /// A resolved reply starts its reveal on the next animation step.
    pub fn on_transcript_changed(&mut self, app: &App) {
        if self.reveal.track(&app.transcript) {
            debug!("Reveal started");
        }
    }

    /// Advances the reveal by one step. Returns whether a frame is due.
    pub fn advance_animation(&mut self, app: &App) -> bool {
        if !self.is_animating(app) {
            return false;
        }
        self.reveal.tick(&app.transcript);
        true
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,                        // Show cursor for input editing
            SetCursorStyle::SteadyBlock, // Non-blinking: avoids blink timer reset from continuous redraws
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide // Hide cursor on exit
        );
    }
}

/// Build the transport selected by a resolved config.
pub fn build_transport(config: &ResolvedConfig) -> Arc<dyn Transport> {
    match config.transport {
        TransportKind::WebSocket => Arc::new(WebSocketTransport::new(config.ws_url.clone())),
        TransportKind::Http => Arc::new(HttpTransport::new(&config.http_url)),
    }
}

/// Must be called from within a tokio runtime: the transport runs on it.
pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let transport = build_transport(&config);
    let app = App::from_config(&config, transport.endpoint().to_string());
    let mut tui = TuiState::new(config.reveal_words_per_frame);

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();
    let mut session = ChatSession::start(app, transport, tx);

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let start_time = Instant::now();
    let mut needs_redraw = true; // Force first frame
    let mut last_revision = session.app().transcript.revision();

    let result = loop {
        // Sync InputBox props with App state
        tui.input_box.disabled = session.app().is_loading();

        let animating = tui.advance_animation(session.app());
        if animating {
            needs_redraw = true;
        }

        // Only draw when something changed
        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_millis() / ANIMATION_TICK.as_millis()) as usize;
            if let Err(e) = terminal.draw(|f| ui::draw_ui(f, session.app(), &mut tui, spinner_frame)) {
                break Err(e);
            }
            needs_redraw = false;
        }

        let timeout = if animating { ANIMATION_TICK } else { IDLE_TICK };
        let first_event = match poll_event(timeout) {
            Ok(event) => event,
            Err(e) => break Err(e),
        };

        // Process first event + drain ALL pending events before next draw
        let mut should_quit = false;
        if first_event.is_some() {
            needs_redraw = true;
        }
        let queued = std::iter::from_fn(|| poll_event_immediate().ok().flatten());
        for event in first_event.into_iter().chain(queued) {
            if handle_event(&mut tui, &mut session, event) == Effect::Quit {
                should_quit = true;
                break;
            }
        }
        if should_quit {
            break Ok(());
        }

        // Handle transport events forwarded by the session
        while let Ok(action) = rx.try_recv() {
            debug!("Event loop received: {:?}", action);
            session.dispatch(action);
        }

        let revision = session.app().transcript.revision();
        if revision != last_revision {
            last_revision = revision;
            tui.on_transcript_changed(session.app());
            needs_redraw = true;
        }
    };

    session.close();
    ratatui::restore();
    result
}

/// Routes one terminal event to the component or action it belongs to.
fn handle_event(tui: &mut TuiState, session: &mut ChatSession, event: TuiEvent) -> Effect {
    let input_empty = tui.input_box.is_empty();
    match event {
        // Resize just needs a redraw
        TuiEvent::Resize => Effect::None,
        TuiEvent::Quit => session.dispatch(Action::Quit),
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown
        | TuiEvent::ScrollToBottom => {
            tui.message_list.handle_event(&event);
            Effect::None
        }
        TuiEvent::CursorEnd if input_empty => {
            tui.message_list.pin_to_bottom();
            Effect::None
        }
        TuiEvent::InputChar(key) if input_empty && session.app().show_starters => {
            let starter = Welcome::starter_for_key(&session.app().starters, key)
                .and_then(|s| Query::parse(s).ok());
            match starter {
                Some(query) if !session.app().is_loading() => submit(tui, session, query),
                Some(_) => Effect::None,
                None => forward_to_input(tui, session, &event),
            }
        }
        _ => forward_to_input(tui, session, &event),
    }
}

fn forward_to_input(tui: &mut TuiState, session: &mut ChatSession, event: &TuiEvent) -> Effect {
    match tui.input_box.handle_event(event) {
        Some(InputEvent::Submit(query)) => submit(tui, session, query),
        Some(InputEvent::Invalid(error)) => {
            debug!("Rejected query: {}", error);
            Effect::None
        }
        Some(InputEvent::ContentChanged) | None => Effect::None,
    }
}

fn submit(tui: &mut TuiState, session: &mut ChatSession, query: Query) -> Effect {
    info!("Submitting query ({} chars)", query.as_str().chars().count());
    tui.message_list.pin_to_bottom();
    session.dispatch(Action::Submit(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;
    use crate::test_support::open_app;
    use crate::transport::{Command, ConnectionHandle, InboundEvent};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn setup() -> (TuiState, ChatSession, UnboundedReceiver<Command>) {
        let (handle, commands) = ConnectionHandle::channel();
        let session = ChatSession::with_connection(open_app(), handle);
        (TuiState::new(0), session, commands)
    }

    fn type_str(tui: &mut TuiState, session: &mut ChatSession, text: &str) {
        for c in text.chars() {
            handle_event(tui, session, TuiEvent::InputChar(c));
        }
    }

    #[test]
    fn enter_submits_typed_query() {
        let (mut tui, mut session, mut commands) = setup();
        type_str(&mut tui, &mut session, "What is MSFT doing?");
        assert_eq!(handle_event(&mut tui, &mut session, TuiEvent::Submit), Effect::None);

        let app = session.app();
        assert!(!app.show_starters);
        assert_eq!(app.transcript.len(), 2);
        assert_eq!(app.transcript.messages()[0].role, Role::User);
        assert!(tui.input_box.is_empty());

        match commands.try_recv() {
            Ok(Command::Send(req)) => assert_eq!(req.body.message, "What is MSFT doing?"),
            other => panic!("expected Send, got {other:?}"),
        }
    }

    #[test]
    fn short_query_is_not_submitted() {
        let (mut tui, mut session, mut commands) = setup();
        type_str(&mut tui, &mut session, "x");
        handle_event(&mut tui, &mut session, TuiEvent::Submit);

        assert!(session.app().transcript.is_empty());
        assert!(session.app().show_starters);
        assert_eq!(tui.input_box.buffer, "x");
        assert!(commands.try_recv().is_err());
    }

    #[test]
    fn digit_on_empty_input_submits_starter() {
        let (mut tui, mut session, mut commands) = setup();
        handle_event(&mut tui, &mut session, TuiEvent::InputChar('2'));

        let app = session.app();
        assert_eq!(
            app.transcript.messages()[0].text.as_deref(),
            Some("Summarize today's news for NVDA")
        );
        assert!(matches!(commands.try_recv(), Ok(Command::Send(_))));

        // Starters are gone: digits are ordinary input now
        handle_event(&mut tui, &mut session, TuiEvent::InputChar('1'));
        assert_eq!(tui.input_box.buffer, "1");
    }

    #[test]
    fn digit_without_a_starter_is_typed() {
        let (mut tui, mut session, _commands) = setup();
        handle_event(&mut tui, &mut session, TuiEvent::InputChar('7'));
        assert_eq!(tui.input_box.buffer, "7");
        assert!(session.app().transcript.is_empty());
    }

    #[test]
    fn submit_refused_while_reply_pending() {
        let (mut tui, mut session, mut commands) = setup();
        type_str(&mut tui, &mut session, "first question");
        handle_event(&mut tui, &mut session, TuiEvent::Submit);
        let _ = commands.try_recv();

        tui.input_box.disabled = session.app().is_loading();
        type_str(&mut tui, &mut session, "second question");
        handle_event(&mut tui, &mut session, TuiEvent::Submit);

        assert_eq!(session.app().transcript.len(), 2);
        assert_eq!(tui.input_box.buffer, "second question");
        assert!(commands.try_recv().is_err());
    }

    #[test]
    fn first_frame_after_reply_reveals_one_step() {
        let (handle, _commands) = ConnectionHandle::channel();
        let mut session = ChatSession::with_connection(open_app(), handle);
        let mut tui = TuiState::new(2);
        session.dispatch(Action::Submit(Query::parse("What is AAPL doing today?").unwrap()));
        session.dispatch(Action::Inbound(InboundEvent::TextDelivered {
            request_id: None,
            text: "AAPL is up 2% today".to_string(),
        }));

        tui.on_transcript_changed(session.app());
        assert!(tui.advance_animation(session.app()));

        let reply = &session.app().transcript.messages()[1];
        assert_eq!(tui.reveal.visible(reply), "AAPL is");

        // Runs to completion, then the loop goes idle
        while tui.advance_animation(session.app()) {}
        assert_eq!(tui.reveal.visible(reply), "AAPL is up 2% today");
    }

    #[test]
    fn quit_keys_end_the_loop() {
        let (mut tui, mut session, _commands) = setup();
        assert_eq!(handle_event(&mut tui, &mut session, TuiEvent::Quit), Effect::Quit);
        assert_eq!(handle_event(&mut tui, &mut session, TuiEvent::Resize), Effect::None);
    }
}
