use std::collections::BTreeMap;

use super::{Segment, SpanId};

/// One ingestion batch in domain form.
///
/// `spans` only needs to list spans the store has not seen yet. Checkpoints
/// are optional: without `to_checkpoint` the store advances by the number of
/// segments actually appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppendBatch {
    /// New span key -> owning manifest name.
    pub spans: BTreeMap<SpanId, String>,
    pub segments: Vec<Segment>,
    pub from_checkpoint: Option<i64>,
    pub to_checkpoint: Option<i64>,
}

impl AppendBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batch of segments for spans the store already knows.
    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Register a span with its owning manifest.
    #[must_use]
    pub fn with_span(
        mut self,
        span_id: impl Into<SpanId>,
        manifest_name: impl Into<String>,
    ) -> Self {
        self.spans.insert(span_id.into(), manifest_name.into());
        self
    }

    #[must_use]
    pub fn with_segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    #[must_use]
    pub const fn with_checkpoints(mut self, from: i64, to: i64) -> Self {
        self.from_checkpoint = Some(from);
        self.to_checkpoint = Some(to);
        self
    }
}

impl From<Segment> for AppendBatch {
    fn from(segment: Segment) -> Self {
        Self::from_segments([segment])
    }
}
