//! Markdown → ratatui `Text` renderer.
//!
//! Converts `pulldown_cmark` events into styled `Line`/`Span` values:
//! headings, emphasis, inline code, code blocks, lists, blockquotes, links,
//! and GFM tables. Bot replies are mostly prose plus the odd table of
//! prices, so tables get real column layout.

use pulldown_cmark::{Alignment, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

/// Parse markdown into owned, styled `Text` using `base_fg` for body text.
pub fn render(content: &str, base_fg: Color) -> Text<'static> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TABLES);

    let mut renderer = Renderer::new(base_fg);
    for event in Parser::new_ext(content, opts) {
        renderer.event(event);
    }
    renderer.out
}

const RULE_WIDTH: usize = 40;

fn muted() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// A table being collected; rows are laid out once the table closes.
#[derive(Default)]
struct TableBuffer {
    alignments: Vec<Alignment>,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
    in_header: bool,
}

struct Renderer {
    out: Text<'static>,
    base_fg: Color,
    /// Composed inline styles; the top is the one in effect.
    stack: Vec<Style>,
    /// Prefix spans repeated on every new line (quotes, code gutters).
    gutters: Vec<Span<'static>>,
    /// One entry per open list: `None` bullets, `Some(n)` next ordinal.
    lists: Vec<Option<u64>>,
    /// The last line holds only a list marker; a loose item's paragraph
    /// continues it instead of starting a new line.
    item_start: bool,
    in_code: bool,
    pending_url: Option<String>,
    table: Option<TableBuffer>,
    /// Set after a block closes so the next block starts after a blank line.
    gap: bool,
}

impl Renderer {
    fn new(base_fg: Color) -> Self {
        Self {
            out: Text::default(),
            base_fg,
            stack: Vec::new(),
            gutters: Vec::new(),
            lists: Vec::new(),
            item_start: false,
            in_code: false,
            pending_url: None,
            table: None,
            gap: false,
        }
    }

    fn current(&self) -> Style {
        match self.stack.last() {
            Some(style) => *style,
            None => Style::default().fg(self.base_fg),
        }
    }

    fn push_style(&mut self, style: Style) {
        let composed = self.current().patch(style);
        self.stack.push(composed);
    }

    fn new_line(&mut self, mut line: Line<'static>) {
        if !self.gutters.is_empty() {
            let mut spans = self.gutters.clone();
            spans.append(&mut line.spans);
            line.spans = spans;
        }
        self.out.lines.push(line);
    }

    fn append(&mut self, span: Span<'static>) {
        match self.out.lines.last_mut() {
            Some(line) => line.push_span(span),
            None => self.new_line(Line::from(span)),
        }
    }

    fn open_block(&mut self) {
        if self.gap {
            self.new_line(Line::default());
            self.gap = false;
        }
    }

    fn event(&mut self, event: Event<'_>) {
        if self.table.is_some() {
            self.table_event(event);
            return;
        }
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(text),
            Event::Code(code) => {
                self.append(Span::styled(
                    code.to_string(),
                    Style::default().fg(Color::White).bg(Color::DarkGray),
                ));
            }
            Event::SoftBreak => self.append(Span::raw(" ")),
            Event::HardBreak => self.new_line(Line::default()),
            Event::Rule => {
                self.open_block();
                self.new_line(Line::from(Span::styled("─".repeat(RULE_WIDTH), muted())));
                self.gap = true;
            }
            _ => {} // HTML, footnotes, math
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph if self.item_start => self.item_start = false,
            Tag::Paragraph => {
                self.open_block();
                self.new_line(Line::default());
            }
            Tag::Heading { level, .. } => {
                self.open_block();
                let style = heading_style(self.base_fg, level);
                self.new_line(Line::from(Span::styled(
                    format!("{} ", "#".repeat(level as usize)),
                    style,
                )));
                self.push_style(style);
            }
            Tag::BlockQuote(_) => {
                self.open_block();
                self.gutters.push(Span::styled("│ ", muted()));
                self.push_style(Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM));
            }
            Tag::CodeBlock(kind) => {
                self.open_block();
                let label = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => format!("╭── {} ──", &*lang),
                    _ => "╭──".to_string(),
                };
                self.new_line(Line::from(Span::styled(label, muted())));
                self.gutters.push(Span::styled("│ ", muted()));
                self.in_code = true;
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.open_block();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                // Loose items are separated by a blank line
                self.open_block();
                self.item_start = true;
                self.new_line(Line::default());
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.append(Span::styled(marker, muted()));
            }
            Tag::Table(alignments) => {
                self.open_block();
                self.table = Some(TableBuffer {
                    alignments,
                    ..Default::default()
                });
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.pending_url = Some(dest_url.to_string());
                self.push_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED));
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.gap = true,
            TagEnd::Heading(_) => {
                self.stack.pop();
                self.gap = true;
            }
            TagEnd::BlockQuote(_) => {
                self.gutters.pop();
                self.stack.pop();
                self.gap = true;
            }
            TagEnd::CodeBlock => {
                self.in_code = false;
                self.gutters.pop();
                self.new_line(Line::from(Span::styled("╰──", muted())));
                self.gap = true;
            }
            TagEnd::Item => self.item_start = false,
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.gap = true;
                }
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.stack.pop();
            }
            TagEnd::Link => {
                self.stack.pop();
                if let Some(url) = self.pending_url.take() {
                    self.append(Span::styled(format!(" ({url})"), muted()));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: CowStr<'_>) {
        // ratatui gives tabs no width
        let text = text.replace('\t', "    ");
        if self.in_code {
            for line in text.lines() {
                self.new_line(Line::from(Span::styled(
                    line.to_string(),
                    Style::default().fg(Color::White),
                )));
            }
            return;
        }
        let style = self.current();
        self.append(Span::styled(text, style));
    }

    fn table_event(&mut self, event: Event<'_>) {
        let Some(table) = self.table.as_mut() else {
            return;
        };
        match event {
            Event::Start(Tag::TableHead) => table.in_header = true,
            Event::End(TagEnd::TableHead) => {
                table.in_header = false;
                // GFM puts header cells directly under the head, without a row
                if !table.row.is_empty() {
                    table.header = std::mem::take(&mut table.row);
                }
            }
            Event::End(TagEnd::TableRow) => {
                let row = std::mem::take(&mut table.row);
                if table.in_header {
                    table.header = row;
                } else {
                    table.rows.push(row);
                }
            }
            Event::End(TagEnd::TableCell) => {
                let cell = std::mem::take(&mut table.cell);
                table.row.push(cell.trim().to_string());
            }
            Event::Text(t) | Event::Code(t) => table.cell.push_str(&t),
            Event::SoftBreak | Event::HardBreak => table.cell.push(' '),
            Event::End(TagEnd::Table) => {
                if let Some(table) = self.table.take() {
                    self.flush_table(table);
                }
                self.gap = true;
            }
            _ => {}
        }
    }

    fn flush_table(&mut self, table: TableBuffer) {
        let columns = table
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(table.header.len()))
            .max()
            .unwrap_or(0);
        if columns == 0 {
            return;
        }

        let mut widths = vec![0usize; columns];
        for row in std::iter::once(&table.header).chain(table.rows.iter()) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let sep = Span::styled(" │ ", muted());
        let body = Style::default().fg(self.base_fg);
        let head = body.add_modifier(Modifier::BOLD);

        let format_row = |row: &[String], style: Style| -> Line<'static> {
            let mut spans = Vec::with_capacity(columns * 2);
            for (i, width) in widths.iter().enumerate() {
                if i > 0 {
                    spans.push(sep.clone());
                }
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let align = table.alignments.get(i).copied().unwrap_or(Alignment::None);
                spans.push(Span::styled(pad(cell, *width, align), style));
            }
            Line::from(spans)
        };

        if !table.header.is_empty() {
            let line = format_row(&table.header, head);
            self.new_line(line);
            let divider = widths
                .iter()
                .map(|w| "─".repeat(*w))
                .collect::<Vec<_>>()
                .join("─┼─");
            self.new_line(Line::from(Span::styled(divider, muted())));
        }
        for row in &table.rows {
            let line = format_row(row, body);
            self.new_line(line);
        }
    }
}

fn pad(cell: &str, width: usize, align: Alignment) -> String {
    let fill = width.saturating_sub(cell.chars().count());
    match align {
        Alignment::Right => format!("{}{cell}", " ".repeat(fill)),
        Alignment::Center => {
            let left = fill / 2;
            format!("{}{cell}{}", " ".repeat(left), " ".repeat(fill - left))
        }
        Alignment::Left | Alignment::None => format!("{cell}{}", " ".repeat(fill)),
    }
}

fn heading_style(base_fg: Color, level: HeadingLevel) -> Style {
    let modifiers = match level {
        HeadingLevel::H1 => Modifier::BOLD | Modifier::UNDERLINED,
        HeadingLevel::H2 => Modifier::BOLD,
        _ => Modifier::BOLD | Modifier::ITALIC,
    };
    Style::default().fg(base_fg).add_modifier(modifiers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &Text<'_>) -> Vec<String> {
        text.lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn heading_text_carries_heading_style() {
        let text = render("## Market Summary", Color::White);
        let line = &text.lines[0];
        let title = line.spans.iter().find(|s| s.content == "Market Summary").unwrap();
        assert!(title.style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(title.style.fg, Some(Color::White));
        assert_eq!(line.spans[0].content, "## ");
    }

    #[test]
    fn strong_and_inline_code_are_styled() {
        let text = render("AAPL is **up** on `NASDAQ`", Color::White);
        let line = &text.lines[0];
        let strong = line.spans.iter().find(|s| s.content == "up").unwrap();
        assert!(strong.style.add_modifier.contains(Modifier::BOLD));
        let code = line.spans.iter().find(|s| s.content == "NASDAQ").unwrap();
        assert_eq!(code.style.bg, Some(Color::DarkGray));
    }

    #[test]
    fn code_block_is_framed() {
        let lines = plain(&render("```python\nprint(1)\n```", Color::White));
        assert_eq!(lines[0], "╭── python ──");
        assert_eq!(lines[1], "│ print(1)");
        assert_eq!(lines.last().unwrap(), "╰──");
    }

    #[test]
    fn paragraphs_are_separated_by_blank_line() {
        let lines = plain(&render("first\n\nsecond", Color::White));
        assert_eq!(lines, vec!["first", "", "second"]);
    }

    #[test]
    fn ordered_list_numbers_items() {
        let lines = plain(&render("1. buy\n2. hold", Color::White));
        assert_eq!(lines, vec!["1. buy", "2. hold"]);
    }

    #[test]
    fn loose_list_keeps_marker_with_text() {
        let lines = plain(&render("- **Buy:** AAPL\n\n- **Hold:** MSFT\n\nDone", Color::White));
        assert_eq!(lines, vec!["• Buy: AAPL", "", "• Hold: MSFT", "", "Done"]);
    }

    #[test]
    fn nested_list_stays_tight() {
        let lines = plain(&render("- stocks\n  - AAPL\n- bonds", Color::White));
        assert_eq!(lines, vec!["• stocks", "  • AAPL", "• bonds"]);
    }

    #[test]
    fn table_columns_are_aligned() {
        let md = "| Ticker | Price |\n|:-------|------:|\n| AAPL | 189.5 |\n| MSFT | 402 |";
        let lines = plain(&render(md, Color::White));
        assert_eq!(lines[0], "Ticker │ Price");
        assert_eq!(lines[1], "───────┼──────");
        assert_eq!(lines[2], "AAPL   │ 189.5");
        assert_eq!(lines[3], "MSFT   │   402");
    }

    #[test]
    fn link_url_follows_text() {
        let lines = plain(&render("[SEC](https://sec.gov)", Color::White));
        assert_eq!(lines[0], "SEC (https://sec.gov)");
    }

    #[test]
    fn tabs_become_spaces() {
        let lines = plain(&render("```\n\tx = 1\n```", Color::White));
        assert!(lines.iter().any(|l| l.contains("    x = 1")));
        assert!(lines.iter().all(|l| !l.contains('\t')));
    }
}
