use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Borders, Padding, Paragraph, Widget, Wrap};

use crate::core::message::{Message, Role};
use crate::tui::markdown;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
pub(crate) const VERTICAL_OVERHEAD: u32 = 2;

pub const LOADING_TEXT: &str =
    "Analyzing stocks for you! Sit tight, financial insights are on the way!";
pub const ERROR_HEADLINE: &str =
    "Oops! Looks like there's a turbulence in our financial data stream.";
pub const ERROR_HINT: &str = "Please retry, and we'll try to navigate you to smoother insights.";

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// A single transcript entry.
///
/// # Design
///
/// Created fresh each frame by `MessageList`. `visible_text` is the part of a
/// bot reply revealed so far; user messages always show their full text.
///
/// Bot messages render by state, in priority order: loading, then error,
/// then text. A message may carry both text and an error; the error wins.
///
/// # Height Calculation
///
/// [`calculate_height`](Self::calculate_height) builds the same `Paragraph`
/// the widget renders and asks ratatui for its wrapped line count, so the
/// list can lay out the transcript without rendering. Heights are `u32`: a
/// long transcript easily passes `u16::MAX` rows.
#[derive(Clone, Copy)]
pub struct MessageView<'a> {
    pub message: &'a Message,
    pub visible_text: &'a str,
    pub spinner_frame: usize,
}

impl<'a> MessageView<'a> {
    pub fn new(message: &'a Message, visible_text: &'a str, spinner_frame: usize) -> Self {
        Self {
            message,
            visible_text,
            spinner_frame,
        }
    }

    pub fn calculate_height(message: &Message, visible_text: &str, width: u16) -> u32 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }
        let body = body(message, visible_text, 0);
        let lines = paragraph(body).line_count(content_width) as u32;
        lines.max(1) + VERTICAL_OVERHEAD
    }

    /// Renders rows `skip..skip + area.height` of this message laid out
    /// `full_height` rows tall.
    pub fn render_rows(self, skip: u32, full_height: u32, area: Rect, buf: &mut Buffer) {
        let role = self.message.role;
        let name = match role {
            Role::User => "you",
            Role::Bot => "epoch",
        };
        let title = format!(
            "{name} · {}",
            self.message.created_at.format("%H:%M")
        );
        let border_style = Style::default().fg(accent(role)).add_modifier(Modifier::DIM);

        let block = Block::new()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));
        let body = paragraph(body(self.message, self.visible_text, self.spinner_frame));
        render_panel_rows(block, Some(Line::from(title)), body, skip, full_height, area, buf);
    }
}

/// Draws the part of a bordered panel that falls in `area`. Borders (and the
/// title) at a clipped edge are left out so a partly scrolled panel reads
/// as continuing off screen.
pub(crate) fn render_panel_rows(
    block: Block<'_>,
    title: Option<Line<'_>>,
    body: Paragraph<'_>,
    skip: u32,
    full_height: u32,
    area: Rect,
    buf: &mut Buffer,
) {
    let mut borders = Borders::LEFT | Borders::RIGHT;
    let mut block = block;
    if skip == 0 {
        borders |= Borders::TOP;
        if let Some(title) = title {
            block = block.title(title);
        }
    }
    if skip.saturating_add(u32::from(area.height)) >= full_height {
        borders |= Borders::BOTTOM;
    }
    let block = block.borders(borders);
    let inner = block.inner(area);
    block.render(area, buf);

    // Body rows above the window; the top border accounts for one skipped row
    let hidden = u16::try_from(skip.saturating_sub(1)).unwrap_or(u16::MAX);
    body.scroll((hidden, 0)).render(inner, buf);
}

fn accent(role: Role) -> Color {
    match role {
        Role::User => Color::Green,
        Role::Bot => Color::Blue,
    }
}

fn body(message: &Message, visible_text: &str, spinner_frame: usize) -> Text<'static> {
    match message.role {
        Role::User => Text::styled(
            message.text.clone().unwrap_or_default(),
            Style::default().fg(Color::Green),
        ),
        Role::Bot if message.loading => Text::from(Line::from(vec![
            Span::styled(
                format!("{} ", SPINNER[spinner_frame % SPINNER.len()]),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(
                LOADING_TEXT,
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ])),
        Role::Bot => match &message.error {
            Some(error) => Text::from(vec![
                Line::styled(ERROR_HEADLINE, Style::default().fg(Color::Red)),
                Line::styled(ERROR_HINT, Style::default().fg(Color::Red)),
                Line::styled(
                    format!("Error: {error}"),
                    Style::default().fg(Color::Red).add_modifier(Modifier::DIM),
                ),
            ]),
            None => markdown::render(visible_text, Color::White),
        },
    }
}

fn paragraph(text: Text<'static>) -> Paragraph<'static> {
    Paragraph::new(text).wrap(Wrap { trim: false })
}

impl<'a> Widget for MessageView<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.render_rows(0, u32::from(area.height), area, buf);
    }
}
