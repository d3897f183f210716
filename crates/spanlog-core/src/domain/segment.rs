use serde::{Deserialize, Serialize};

use super::{LogLevel, SpanId};

/// Build-lifecycle marker carried on a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildEvent {
    /// A build started.
    Init,
    /// A live update fell back to a full rebuild.
    Fallback,
}

/// Structured fields attached to a segment.
///
/// Unknown keys in the wire map are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentFields {
    /// Identifies a self-overwriting progress line.
    #[serde(
        rename = "progressID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub progress_id: Option<String>,

    #[serde(
        rename = "buildEvent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub build_event: Option<BuildEvent>,
}

impl SegmentFields {
    pub const fn is_empty(&self) -> bool {
        self.progress_id.is_none() && self.build_event.is_none()
    }
}

/// One raw text fragment received from the transport.
///
/// Segments are immutable once stored; later segments may supersede the
/// lines they produced but never change the segment itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub span_id: SpanId,
    /// Raw text; may or may not end in a newline.
    pub text: String,
    /// Timestamp as received (RFC 3339 in practice); empty when absent.
    pub time: String,
    pub level: LogLevel,
    /// Marks the first line of a warning/error group for the alert index.
    pub anchor: bool,
    pub fields: SegmentFields,
}

impl Segment {
    /// Create an `Info` segment with no timestamp or fields.
    pub fn new(span_id: impl Into<SpanId>, text: impl Into<String>) -> Self {
        Self {
            span_id: span_id.into(),
            text: text.into(),
            time: String::new(),
            level: LogLevel::Info,
            anchor: false,
            fields: SegmentFields::default(),
        }
    }

    /// Create a segment on the global span.
    pub fn global(text: impl Into<String>) -> Self {
        Self::new(SpanId::global(), text)
    }

    #[must_use]
    pub const fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = time.into();
        self
    }

    #[must_use]
    pub const fn with_anchor(mut self, anchor: bool) -> Self {
        self.anchor = anchor;
        self
    }

    #[must_use]
    pub fn with_progress_id(mut self, progress_id: impl Into<String>) -> Self {
        self.fields.progress_id = Some(progress_id.into());
        self
    }

    #[must_use]
    pub const fn with_build_event(mut self, event: BuildEvent) -> Self {
        self.fields.build_event = Some(event);
        self
    }

    /// Length of the text in bytes.
    pub const fn len(&self) -> usize {
        self.text.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether the text ends with a line terminator.
    pub fn is_complete(&self) -> bool {
        self.text.ends_with('\n')
    }

    pub fn progress_id(&self) -> Option<&str> {
        self.fields.progress_id.as_deref()
    }
}
