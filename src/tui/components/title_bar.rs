//! # TitleBar Component
//!
//! One-line status bar across the top of the screen.
//!
//! Shows, left to right: the app name, the connection state as a coloured
//! dot plus label, the transport endpoint, the status message, and `↓ New`
//! when the transcript has content below the viewport.
//!
//! Purely presentational: every field is a prop filled from `App` or the
//! message list each frame.
//!
//! ```text
//! Epoch ● online  wss://host/epoch-ws | Analyzing... | ↓ New
//! ```

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::transport::ConnectionState;
use crate::tui::component::Component;

pub struct TitleBar<'a> {
    pub connection: ConnectionState,
    pub endpoint: &'a str,
    pub status_message: &'a str,
    /// Whether there's content below the current scroll position
    pub has_unseen_content: bool,
}

impl<'a> TitleBar<'a> {
    pub fn new(
        connection: ConnectionState,
        endpoint: &'a str,
        status_message: &'a str,
        has_unseen_content: bool,
    ) -> Self {
        Self {
            connection,
            endpoint,
            status_message,
            has_unseen_content,
        }
    }

    fn line(&self) -> Line<'a> {
        let dot = match self.connection {
            ConnectionState::Connecting => Color::Yellow,
            ConnectionState::Open => Color::Green,
            ConnectionState::Closed => Color::Red,
        };
        let muted = Style::default().fg(Color::DarkGray);

        let mut spans = vec![
            Span::styled("Epoch", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" "),
            Span::styled("●", Style::default().fg(dot)),
            Span::raw(format!(" {}  ", self.connection.label())),
            Span::styled(self.endpoint, muted),
        ];
        if !self.status_message.is_empty() {
            spans.push(Span::styled(" | ", muted));
            spans.push(Span::raw(self.status_message));
        }
        if self.has_unseen_content {
            spans.push(Span::styled(" | ", muted));
            spans.push(Span::styled("↓ New", Style::default().fg(Color::Cyan)));
        }
        Line::from(spans)
    }
}

impl Component for TitleBar<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(self.line(), area);
    }
}
