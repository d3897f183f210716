//! Output sink port: the ordered element list a viewport materializes into.

use std::fmt;

use crate::domain::{BuildEvent, LogLevel, LogLine, SpanId};
use crate::prefix::source_prefix;

/// Prefix label for output without a manifest.
const GLOBAL_LABEL: &str = "(global)";

/// Opaque handle of a materialized element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "el#{}", self.0)
    }
}

/// A line ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub stored_line_index: usize,
    pub text: String,
    pub level: LogLevel,
    pub manifest_name: String,
    pub span_id: SpanId,
    pub build_event: Option<BuildEvent>,
    /// Manifest prefix, when the view mixes several manifests.
    pub prefix: Option<String>,
    /// The previous displayed line belongs to a different manifest.
    pub context_change: bool,
}

impl RenderedLine {
    pub fn from_line(line: &LogLine, show_prefix: bool, context_change: bool) -> Self {
        let prefix = show_prefix.then(|| {
            if line.manifest_name.is_empty() {
                source_prefix(GLOBAL_LABEL)
            } else {
                source_prefix(&line.manifest_name)
            }
        });

        Self {
            stored_line_index: line.stored_line_index,
            text: line.text.clone(),
            level: line.level,
            manifest_name: line.manifest_name.clone(),
            span_id: line.span_id.clone(),
            build_event: line.build_event,
            prefix,
            context_change,
        }
    }

    /// Prefix and text as one string.
    pub fn display_text(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}{}", self.text),
            None => self.text.clone(),
        }
    }
}

/// Where to insert a new element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Directly after an existing element.
    After(ElementId),
    /// Directly before an existing element.
    Before(ElementId),
    /// At the end of the output.
    End,
}

/// Ordered output that viewports materialize lines into.
///
/// Implementations own element handles. Operations on unknown handles are
/// no-ops (`insert` relative to an unknown handle appends at the end).
pub trait OutputSink: Send {
    fn insert(&mut self, placement: Placement, line: RenderedLine) -> ElementId;

    /// Replace an element in place, returning the handle now holding it.
    fn replace(&mut self, id: ElementId, line: RenderedLine) -> ElementId;

    fn remove(&mut self, id: ElementId);

    /// Drop every element.
    fn clear(&mut self);

    /// Scroll so that the end-of-log marker is visible.
    fn scroll_end_into_view(&mut self);

    /// Scroll so that `id` is centered in view.
    fn scroll_into_view(&mut self, id: ElementId);

    /// Whether the end-of-log marker is currently within view.
    fn is_end_in_view(&self) -> bool;
}
