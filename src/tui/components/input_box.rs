//! # InputBox Component
//!
//! Single-line query field.
//!
//! ## Responsibilities
//!
//! - Capture text input
//! - Handle editing (backspace, delete, cursor movement, paste)
//! - Validate on Enter and either emit a `Query` or show why not
//! - Refuse submission while a reply is pending
//!
//! ## State Management
//!
//! The buffer, cursor and validation error are internal state. `disabled` is
//! a prop the parent sets from `App::is_loading` each frame.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::validation::{Query, ValidationError};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

pub const PLACEHOLDER: &str = "Ask about a stock, e.g. What is AAPL doing today?";
const TITLE: &str = "Ask Epoch";
const WAITING_TITLE: &str = "Waiting for reply...";

/// Borders (1 top + 1 bottom) around the one text row.
pub const HEIGHT: u16 = 3;

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Enter pressed on valid input; the buffer has been cleared.
    Submit(Query),
    /// Enter pressed on invalid input; the buffer is kept.
    Invalid(ValidationError),
    ContentChanged,
}

pub struct InputBox {
    /// Text buffer (Internal State)
    pub buffer: String,
    /// Byte offset of the cursor in `buffer`
    cursor: usize,
    /// Byte offset of the first visible char when the buffer is wider than the box
    scroll: usize,
    /// Last validation failure, cleared by the next edit
    error: Option<ValidationError>,
    /// Reply pending (Prop)
    pub disabled: bool,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
            scroll: 0,
            error: None,
            disabled: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.scroll = 0;
    }

    fn insert(&mut self, text: &str) {
        self.buffer.insert_str(self.cursor, text);
        self.cursor += text.len();
        self.error = None;
    }

    /// Display columns from the first visible char to the cursor.
    fn cursor_col(&self) -> usize {
        self.buffer
            .get(self.scroll..self.cursor)
            .map_or(0, UnicodeWidthStr::width)
    }

    /// Keeps the cursor column inside a field `width` columns wide.
    fn update_scroll(&mut self, width: usize) {
        if self.cursor < self.scroll || !self.buffer.is_char_boundary(self.scroll) {
            self.scroll = self.cursor;
        }
        if width == 0 {
            return;
        }
        while self.cursor_col() >= width {
            let Some(c) = self.buffer[self.scroll..].chars().next() else {
                break;
            };
            self.scroll += c.len_utf8();
        }
    }

    /// Chars from the first visible one that fit in `width` columns.
    fn visible_text(&self, width: usize) -> String {
        let mut used = 0;
        self.buffer
            .get(self.scroll..)
            .unwrap_or_default()
            .chars()
            .take_while(|c| {
                used += c.width().unwrap_or(0);
                used <= width
            })
            .collect()
    }

    fn title(&self) -> Line<'static> {
        if let Some(error) = &self.error {
            return Line::styled(format!(" {error} "), Style::default().fg(Color::Red));
        }
        if self.disabled {
            return Line::styled(WAITING_TITLE, Style::default().fg(Color::DarkGray));
        }
        Line::from(TITLE)
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let inner_width = area.width.saturating_sub(2) as usize;
        self.update_scroll(inner_width);

        let border_style = if self.disabled {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(self.title());

        let input = if self.buffer.is_empty() {
            Paragraph::new(PLACEHOLDER)
                .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
        } else {
            let visible = self.visible_text(inner_width);
            let fg = if self.disabled { Color::DarkGray } else { Color::Green };
            Paragraph::new(visible).style(Style::default().fg(fg))
        };
        frame.render_widget(input.block(block), area);

        if !self.disabled && inner_width > 0 {
            let col = self.cursor_col() as u16;
            frame.set_cursor_position((area.x + 1 + col, area.y + 1));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) if !c.is_control() => {
                let mut tmp = [0u8; 4];
                self.insert(c.encode_utf8(&mut tmp));
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                // One-line field: fold line breaks into spaces
                let flat: String = text
                    .chars()
                    .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
                    .filter(|c| !c.is_control())
                    .collect();
                self.insert(&flat);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace => {
                let prev = self.buffer[..self.cursor].char_indices().next_back()?.0;
                self.buffer.drain(prev..self.cursor);
                self.cursor = prev;
                self.error = None;
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Delete => {
                let c = self.buffer[self.cursor..].chars().next()?;
                self.buffer.drain(self.cursor..self.cursor + c.len_utf8());
                self.error = None;
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorLeft => {
                self.cursor = self.buffer[..self.cursor].char_indices().next_back()?.0;
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorRight => {
                self.cursor += self.buffer[self.cursor..].chars().next()?.len_utf8();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorHome => (self.cursor != 0).then(|| {
                self.cursor = 0;
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorEnd => (self.cursor != self.buffer.len()).then(|| {
                self.cursor = self.buffer.len();
                InputEvent::ContentChanged
            }),
            TuiEvent::Submit if self.disabled => None,
            TuiEvent::Submit => match Query::parse(&self.buffer) {
                Ok(query) => {
                    self.clear();
                    self.error = None;
                    Some(InputEvent::Submit(query))
                }
                Err(error) => {
                    self.error = Some(error.clone());
                    Some(InputEvent::Invalid(error))
                }
            },
            _ => None,
        }
    }
}
