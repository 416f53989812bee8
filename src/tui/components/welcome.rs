//! # Welcome Component
//!
//! The first entry of the transcript: a markdown banner that stays for the
//! whole session, followed by the numbered conversation starters until the
//! first submission.

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::tui::components::message::{VERTICAL_OVERHEAD, render_panel_rows};
use crate::tui::markdown;

pub const BANNER: &str = "\
# Welcome to Epoch! 🌟

Discover the power of informed decision-making with these features:

- **Explore New Investment Opportunities:** Identify potential investments using \
Artificial Intelligence and your own customized criteria.

- **Leverage Real-time News:** Get key insights into relevant news and events in real-time.

- **Bring Your Own Data:** Leverage latest Artificial Intelligence techniques on your data.

#### Ready to accelerate your investing adventure? 🚀";

/// Widest the panel grows on large terminals.
const MAX_WIDTH: u16 = 80;

/// Borders and padding on both sides.
const HORIZONTAL_OVERHEAD: u16 = 4;

/// Columns taken by "n. " before starter text.
const NUMBER_WIDTH: usize = 3;

#[derive(Clone, Copy)]
pub struct Welcome<'a> {
    /// Empty once the starters are gone; the banner alone remains.
    pub starters: &'a [String],
}

impl<'a> Welcome<'a> {
    pub fn new(starters: &'a [String]) -> Self {
        Self { starters }
    }

    /// Starter submitted by pressing digit `key`; `'1'` is the first.
    pub fn starter_for_key(starters: &[String], key: char) -> Option<&str> {
        let n = key.to_digit(10)? as usize;
        starters.get(n.checked_sub(1)?).map(String::as_str)
    }

    /// Numbered starters, wrapped with a hanging indent so continuation rows
    /// line up under the text rather than the number.
    fn starter_lines(&self, width: usize) -> Vec<Line<'static>> {
        if self.starters.is_empty() {
            return Vec::new();
        }
        let indent = " ".repeat(NUMBER_WIDTH);
        let number_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
        let text_style = Style::default().fg(Color::Cyan);

        let mut lines = vec![Line::styled(
            "Try one of these (press its number):",
            Style::default().fg(Color::DarkGray),
        )];
        for (i, starter) in self.starters.iter().enumerate() {
            let options = textwrap::Options::new(width.max(NUMBER_WIDTH + 1))
                .initial_indent(&indent)
                .subsequent_indent(&indent);
            for (row, piece) in textwrap::wrap(starter, options).into_iter().enumerate() {
                let piece = piece.into_owned();
                let text = piece.strip_prefix(&indent).unwrap_or(&piece).to_string();
                let number = if row == 0 {
                    Span::styled(format!("{:<NUMBER_WIDTH$}", format!("{}.", i + 1)), number_style)
                } else {
                    Span::raw(indent.clone())
                };
                lines.push(Line::from(vec![number, Span::styled(text, text_style)]));
            }
        }
        lines
    }

    pub fn text(&self, width: u16) -> Text<'static> {
        let mut text = markdown::render(BANNER, Color::White);
        let starters = self.starter_lines(width as usize);
        if !starters.is_empty() {
            text.lines.push(Line::default());
            text.lines.extend(starters);
        }
        text
    }

    fn inner_width(width: u16) -> u16 {
        width.min(MAX_WIDTH).saturating_sub(HORIZONTAL_OVERHEAD)
    }

    fn paragraph(&self, inner_width: u16) -> Paragraph<'static> {
        Paragraph::new(self.text(inner_width)).wrap(Wrap { trim: false })
    }

    /// Rows the panel takes at `width`, measured like `MessageView`.
    pub fn calculate_height(&self, width: u16) -> u32 {
        let inner_width = Self::inner_width(width);
        if inner_width == 0 {
            return 1;
        }
        let lines = self.paragraph(inner_width).line_count(inner_width) as u32;
        lines.max(1) + VERTICAL_OVERHEAD
    }

    /// Renders rows `skip..skip + area.height` of the panel, centered in
    /// `area` horizontally.
    pub fn render_rows(self, skip: u32, full_height: u32, area: Rect, buf: &mut Buffer) {
        let width = area.width.min(MAX_WIDTH);
        let [column] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(area);
        let block = Block::new()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Blue).add_modifier(Modifier::DIM))
            .padding(Padding::horizontal(1));
        let body = self.paragraph(Self::inner_width(area.width));
        render_panel_rows(block, None, body, skip, full_height, column, buf);
    }
}

impl Widget for Welcome<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.render_rows(0, u32::from(area.height), area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starters() -> Vec<String> {
        vec![
            "What is AAPL doing today?".to_string(),
            "Compare the latest earnings of MSFT and GOOGL".to_string(),
        ]
    }

    fn rendered(welcome: Welcome<'_>, width: u16) -> String {
        let height = welcome.calculate_height(width) as u16;
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        welcome.render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn starter_keys_are_one_based() {
        let s = starters();
        assert_eq!(Welcome::starter_for_key(&s, '1'), Some("What is AAPL doing today?"));
        assert!(Welcome::starter_for_key(&s, '2').is_some());
        assert_eq!(Welcome::starter_for_key(&s, '3'), None);
        assert_eq!(Welcome::starter_for_key(&s, '0'), None);
        assert_eq!(Welcome::starter_for_key(&s, 'a'), None);
    }

    #[test]
    fn long_starters_wrap_under_their_text() {
        let s = starters();
        let welcome = Welcome::new(&s);
        let lines = welcome.starter_lines(24);
        let rendered: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();

        assert_eq!(rendered[1], "1. What is AAPL doing");
        assert_eq!(rendered[2], "   today?");
        assert!(rendered[3].starts_with("2. Compare"));
        assert!(rendered.iter().skip(1).all(|l| l.chars().count() <= 24));
    }

    #[test]
    fn renders_banner_and_starters() {
        let s = starters();
        let text = rendered(Welcome::new(&s), 90);
        assert!(text.contains("Welcome to Epoch!"));
        assert!(text.contains("Discover the power of informed decision-making"));
        assert!(text.contains("Ready to accelerate your investing adventure?"));
        assert!(text.contains("1. What is AAPL doing today?"));
        assert!(text.contains("2. Compare the latest earnings"));
    }

    #[test]
    fn banner_stays_without_starters() {
        let s = starters();
        let with_starters = Welcome::new(&s).calculate_height(90);
        let banner_only = Welcome::new(&[]);
        assert!(banner_only.calculate_height(90) < with_starters);

        let text = rendered(banner_only, 90);
        assert!(text.contains("Welcome to Epoch!"));
        assert!(text.contains("Bring Your Own Data"));
        assert!(!text.contains("Try one of these"));
    }
}
