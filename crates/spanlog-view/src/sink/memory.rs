//! A scrollable, in-memory output sink.
//!
//! Models a terminal-sized window over the element list: `rows` visible rows
//! starting at `scroll_top`, with an end-of-log marker one row past the last
//! element.

use spanlog_core::{ElementId, OutputSink, Placement, RenderedLine};

use crate::viewport::ScrollPosition;

/// Visible rows when none are configured.
pub const DEFAULT_ROWS: usize = 40;

/// Counters of sink operations, for asserting how much work a render did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub inserts: usize,
    pub replaces: usize,
    pub removes: usize,
    pub clears: usize,
    pub end_scrolls: usize,
    pub line_scrolls: usize,
}

#[derive(Debug, Clone)]
pub struct MemorySink {
    elements: Vec<(ElementId, RenderedLine)>,
    next_id: u64,
    rows: usize,
    scroll_top: usize,
    scroll_left: usize,
    last_scrolled_to: Option<ElementId>,
    stats: SinkStats,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySink {
    pub const fn new() -> Self {
        Self::with_rows(DEFAULT_ROWS)
    }

    pub const fn with_rows(rows: usize) -> Self {
        Self {
            elements: Vec::new(),
            next_id: 0,
            rows: if rows == 0 { 1 } else { rows },
            scroll_top: 0,
            scroll_left: 0,
            last_scrolled_to: None,
            stats: SinkStats {
                inserts: 0,
                replaces: 0,
                removes: 0,
                clears: 0,
                end_scrolls: 0,
                line_scrolls: 0,
            },
        }
    }

    fn mint(&mut self) -> ElementId {
        let id = ElementId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn position(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|(existing, _)| *existing == id)
    }

    /// Rows of content including the end-of-log marker.
    const fn content_rows(&self) -> usize {
        self.elements.len() + 1
    }

    fn max_scroll_top(&self) -> usize {
        self.content_rows().saturating_sub(self.rows)
    }

    /// Move the window, as a user scrolling would, and report the new
    /// position. The top is clamped to the content.
    pub fn set_scroll_top(&mut self, top: usize) -> ScrollPosition {
        self.scroll_top = top.min(self.max_scroll_top());
        self.scroll_position()
    }

    pub fn set_scroll_left(&mut self, left: usize) -> ScrollPosition {
        self.scroll_left = left;
        self.scroll_position()
    }

    pub fn scroll_position(&self) -> ScrollPosition {
        ScrollPosition {
            top: self.scroll_top,
            left: self.scroll_left,
        }
    }

    pub const fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub const fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Option<&RenderedLine> {
        self.position(id).map(|index| &self.elements[index].1)
    }

    /// Element showing a stored line.
    pub fn find(&self, stored_line_index: usize) -> Option<ElementId> {
        self.elements
            .iter()
            .find(|(_, line)| line.stored_line_index == stored_line_index)
            .map(|(id, _)| *id)
    }

    pub fn lines(&self) -> impl Iterator<Item = &RenderedLine> {
        self.elements.iter().map(|(_, line)| line)
    }

    /// Display text of every element, in output order.
    pub fn texts(&self) -> Vec<String> {
        self.lines().map(RenderedLine::display_text).collect()
    }

    pub fn stored_indices(&self) -> Vec<usize> {
        self.lines().map(|line| line.stored_line_index).collect()
    }

    /// Elements currently inside the window.
    pub fn visible_lines(&self) -> impl Iterator<Item = &RenderedLine> {
        self.lines().skip(self.scroll_top).take(self.rows)
    }

    /// Element most recently scrolled into view by handle.
    pub const fn last_scrolled_to(&self) -> Option<ElementId> {
        self.last_scrolled_to
    }

    pub const fn stats(&self) -> SinkStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SinkStats::default();
    }
}

impl OutputSink for MemorySink {
    fn insert(&mut self, placement: Placement, line: RenderedLine) -> ElementId {
        let at = match placement {
            Placement::After(anchor) => self.position(anchor).map(|index| index + 1),
            Placement::Before(anchor) => self.position(anchor),
            Placement::End => None,
        }
        .unwrap_or(self.elements.len());

        let id = self.mint();
        self.elements.insert(at, (id, line));
        self.stats.inserts += 1;
        id
    }

    fn replace(&mut self, id: ElementId, line: RenderedLine) -> ElementId {
        match self.position(id) {
            Some(index) => {
                self.elements[index].1 = line;
                self.stats.replaces += 1;
                id
            }
            None => self.insert(Placement::End, line),
        }
    }

    fn remove(&mut self, id: ElementId) {
        if let Some(index) = self.position(id) {
            self.elements.remove(index);
            self.scroll_top = self.scroll_top.min(self.max_scroll_top());
            self.stats.removes += 1;
        }
    }

    fn clear(&mut self) {
        self.elements.clear();
        self.scroll_top = 0;
        self.last_scrolled_to = None;
        self.stats.clears += 1;
    }

    fn scroll_end_into_view(&mut self) {
        self.scroll_top = self.max_scroll_top();
        self.stats.end_scrolls += 1;
    }

    fn scroll_into_view(&mut self, id: ElementId) {
        let Some(index) = self.position(id) else {
            return;
        };
        self.scroll_top = index.saturating_sub(self.rows / 2).min(self.max_scroll_top());
        self.last_scrolled_to = Some(id);
        self.stats.line_scrolls += 1;
    }

    fn is_end_in_view(&self) -> bool {
        self.elements.len() < self.scroll_top + self.rows
    }
}
