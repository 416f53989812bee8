//! # MessageList Component
//!
//! Scrollable view of the transcript.
//!
//! ## Responsibilities
//!
//! - Display the welcome header, then every transcript entry in order
//! - Follow new content unless the user has scrolled away (`ScrollFollow`)
//! - Cache message heights so only changed entries are re-measured
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the transcript (props).
//! Rendering mutates the state: the layout cache and the follow decision.
//!
//! Layout rows are `u32`. Only the rows on screen are composed into a
//! `tui_scrollview` canvas, so the canvas stays within ratatui's `u16`
//! coordinates however long the transcript grows. The scrollbar is drawn
//! separately against the full content height.

use std::ops::Range;

use ratatui::Frame;
use ratatui::layout::{Rect, Size};
use ratatui::widgets::{Scrollbar, ScrollbarOrientation, ScrollbarState};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::message::{Message, MessageId, Transcript};
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::MessageView;
use crate::tui::components::welcome::Welcome;
use crate::tui::event::TuiEvent;
use crate::tui::reveal::Reveal;

/// Rows the view may sit above the bottom and still count as following.
pub const SCROLL_SLACK: u32 = 10;

/// Rows moved per arrow key or wheel notch.
const LINE_STEP: i32 = 1;

/// Decides where the viewport sits after content or user scroll changes.
///
/// The bottom is always recomputed from the heights passed in, never stored,
/// because revealed text keeps growing the last message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollFollow {
    offset: u32,
    following: bool,
}

impl Default for ScrollFollow {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollFollow {
    pub fn new() -> Self {
        Self {
            offset: 0,
            following: true,
        }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn is_following(&self) -> bool {
        self.following
    }

    pub fn bottom(content_height: u32, viewport_height: u32) -> u32 {
        content_height.saturating_sub(viewport_height)
    }

    /// Call after every transcript mutation and on every render.
    ///
    /// While following, the offset moves to the new bottom; otherwise it
    /// stays put (clamped in case content shrank or the viewport grew).
    pub fn on_content(&mut self, content_height: u32, viewport_height: u32) {
        let bottom = Self::bottom(content_height, viewport_height);
        if self.following {
            self.offset = bottom;
        } else {
            self.offset = self.offset.min(bottom);
        }
    }

    /// User-initiated scroll. Following resumes only once the view is back
    /// within `SCROLL_SLACK` rows of the bottom.
    pub fn scroll_by(&mut self, delta: i32, content_height: u32, viewport_height: u32) {
        let bottom = Self::bottom(content_height, viewport_height);
        let target = (i64::from(self.offset) + i64::from(delta)).clamp(0, i64::from(bottom));
        self.offset = u32::try_from(target).unwrap_or(bottom);
        self.following = bottom - self.offset <= SCROLL_SLACK;
    }

    /// Jump to the bottom and resume following.
    pub fn pin(&mut self, content_height: u32, viewport_height: u32) {
        self.following = true;
        self.offset = Self::bottom(content_height, viewport_height);
    }

    pub fn has_content_below(&self, content_height: u32, viewport_height: u32) -> bool {
        self.offset < Self::bottom(content_height, viewport_height)
    }
}

/// Layout and scroll state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    pub layout: LayoutCache,
    pub follow: ScrollFollow,
    /// Last known viewport height (for scrolling between frames)
    pub viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            layout: LayoutCache::new(),
            follow: ScrollFollow::new(),
            viewport_height: 0,
        }
    }

    pub fn content_height(&self) -> u32 {
        self.layout.total()
    }

    pub fn has_content_below(&self) -> bool {
        self.follow
            .has_content_below(self.content_height(), u32::from(self.viewport_height))
    }

    fn scroll_by(&mut self, delta: i32) {
        self.follow
            .scroll_by(delta, self.content_height(), u32::from(self.viewport_height));
    }

    /// End key: back to the newest message.
    pub fn pin_to_bottom(&mut self) {
        self.follow
            .pin(self.content_height(), u32::from(self.viewport_height));
    }
}

/// Scrollable transcript view.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub header: Option<Welcome<'a>>,
    pub transcript: &'a Transcript,
    pub reveal: &'a Reveal,
    pub spinner_frame: usize,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        transcript: &'a Transcript,
        reveal: &'a Reveal,
        spinner_frame: usize,
    ) -> Self {
        Self {
            state,
            header: None,
            transcript,
            reveal,
            spinner_frame,
        }
    }

    /// Panel shown above the first message.
    pub fn header(mut self, header: Welcome<'a>) -> Self {
        self.header = Some(header);
        self
    }
}

/// Part of an item spanning `height` rows from `top` that lands in `rows`:
/// how many of its rows are hidden above, and where it goes on the canvas.
fn clip(top: u32, height: u32, rows: &Range<u32>, width: u16) -> Option<(u32, Rect)> {
    let start = top.max(rows.start);
    let end = top.saturating_add(height).min(rows.end);
    if start >= end {
        return None;
    }
    let y = u16::try_from(start - rows.start).ok()?;
    let visible = u16::try_from(end - start).ok()?;
    Some((start - top, Rect::new(0, y, width, visible)))
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar
        let messages = self.transcript.messages();

        // 1. Re-measure entries whose visible content changed
        let keys: Vec<HeightKey> = messages
            .iter()
            .map(|m| HeightKey::of(m, self.reveal))
            .collect();
        let layout = &mut self.state.layout;
        let reusable = layout.reusable_count(&keys, content_width);
        layout.heights.truncate(reusable);
        for message in messages.iter().skip(reusable) {
            let visible = self.reveal.visible(message);
            layout
                .heights
                .push(MessageView::calculate_height(message, visible, content_width));
        }
        layout.header_height = self
            .header
            .map_or(0, |header| header.calculate_height(content_width));
        layout.rebuild_prefix_heights();
        layout.update_metadata(keys, content_width);

        // 2. Follow or hold, against the bottom as it is now
        self.state.viewport_height = area.height;
        let total_height = self.state.content_height();
        self.state
            .follow
            .on_content(total_height, u32::from(area.height));

        if area.is_empty() {
            return;
        }

        // 3. Compose the rows on screen into a viewport-sized canvas
        let scroll_offset = self.state.follow.offset();
        let window = total_height
            .saturating_sub(scroll_offset)
            .min(u32::from(area.height));
        let rows = scroll_offset..scroll_offset + window;
        let mut canvas = ScrollView::new(Size::new(content_width, window as u16))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Never)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let layout = &self.state.layout;
        if let Some(header) = self.header
            && let Some((skip, rect)) = clip(0, layout.header_height, &rows, content_width)
        {
            header.render_rows(skip, layout.header_height, rect, canvas.buf_mut());
        }
        for i in layout.visible_range(scroll_offset, area.height) {
            let height = layout.heights[i];
            let Some((skip, rect)) = clip(layout.top_of(i), height, &rows, content_width) else {
                continue;
            };
            let message = &messages[i];
            MessageView::new(message, self.reveal.visible(message), self.spinner_frame)
                .render_rows(skip, height, rect, canvas.buf_mut());
        }

        let canvas_area = Rect {
            width: content_width,
            ..area
        };
        frame.render_stateful_widget(canvas, canvas_area, &mut ScrollViewState::default());

        if total_height > u32::from(area.height) {
            let mut scrollbar_state = ScrollbarState::new(total_height as usize)
                .position(scroll_offset as usize)
                .viewport_content_length(area.height as usize);
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                area,
                &mut scrollbar_state,
            );
        }
    }
}

/// EventHandler lives on `MessageListState` because `MessageList` is rebuilt
/// every frame and can't hold scroll position.
impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        let page = i32::from(self.viewport_height.max(1));
        match event {
            TuiEvent::ScrollUp => self.scroll_by(-LINE_STEP),
            TuiEvent::ScrollDown => self.scroll_by(LINE_STEP),
            TuiEvent::ScrollPageUp => self.scroll_by(-page),
            TuiEvent::ScrollPageDown => self.scroll_by(page),
            TuiEvent::ScrollToBottom => self.pin_to_bottom(),
            _ => {}
        }
        None
    }
}

/// What a message's measured height depends on, besides width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightKey {
    id: MessageId,
    loading: bool,
    has_error: bool,
    /// `None` once fully revealed.
    shown_words: Option<usize>,
}

impl HeightKey {
    pub fn of(message: &Message, reveal: &Reveal) -> Self {
        Self {
            id: message.id,
            loading: message.loading,
            has_error: message.error.is_some(),
            shown_words: reveal.shown_words(message.id),
        }
    }
}

/// Cached layout measurements
pub struct LayoutCache {
    /// Rows above the first message.
    pub header_height: u32,
    pub heights: Vec<u32>,
    /// Bottom row of each entry, header included.
    pub prefix_heights: Vec<u32>,
    keys: Vec<HeightKey>,
    content_width: u16,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            header_height: 0,
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            keys: Vec::new(),
            content_width: 0,
        }
    }

    /// Number of leading heights still valid for `keys` at `content_width`.
    pub fn reusable_count(&self, keys: &[HeightKey], content_width: u16) -> usize {
        if self.content_width != content_width {
            return 0;
        }
        keys.iter()
            .zip(self.keys.iter())
            .take(self.heights.len())
            .take_while(|(new, old)| new == old)
            .count()
    }

    pub fn update_metadata(&mut self, keys: Vec<HeightKey>, content_width: u16) {
        self.keys = keys;
        self.content_width = content_width;
    }

    pub fn rebuild_prefix_heights(&mut self) {
        let mut running = self.header_height;
        self.prefix_heights = self
            .heights
            .iter()
            .map(|h| {
                running = running.saturating_add(*h);
                running
            })
            .collect();
    }

    pub fn total(&self) -> u32 {
        self.prefix_heights.last().copied().unwrap_or(self.header_height)
    }

    /// Row where entry `index` starts.
    pub fn top_of(&self, index: usize) -> u32 {
        match index {
            0 => self.header_height,
            i => self.prefix_heights.get(i - 1).copied().unwrap_or_else(|| self.total()),
        }
    }

    /// Entries overlapping rows `scroll_offset..scroll_offset + viewport_height`.
    pub fn visible_range(&self, scroll_offset: u32, viewport_height: u16) -> Range<usize> {
        let from = scroll_offset;
        let to = scroll_offset.saturating_add(u32::from(viewport_height));

        let start = self.prefix_heights.partition_point(|&end| end <= from);
        // Entries ending before `to`, plus the one that straddles it
        let end = if self.top_of(0) >= to {
            0
        } else {
            self.prefix_heights
                .partition_point(|&end| end < to)
                .saturating_add(1)
                .min(self.prefix_heights.len())
        };
        start..end.max(start)
    }
}
