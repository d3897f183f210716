use std::fmt;

use serde::{Deserialize, Serialize};

use super::{BuildEvent, LogLevel, SpanId};

/// Logical clock over appended segments.
///
/// Every stored segment has a checkpoint position; incremental queries return
/// the lines touched by segments at or after a checkpoint.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Checkpoint(u64);

impl Checkpoint {
    /// The beginning of the log; a query from here returns everything.
    pub const ZERO: Self = Self(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Checkpoint `count` segments after this one.
    #[must_use]
    pub const fn advance(self, count: u64) -> Self {
        Self(self.0.saturating_add(count))
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A displayable line as returned by store queries.
///
/// The text has its trailing newline stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogLine {
    pub text: String,
    /// Level in effect when the line was opened.
    pub level: LogLevel,
    /// Owning manifest, denormalized from the span.
    pub manifest_name: String,
    pub span_id: SpanId,
    /// Position in the store's line index.
    pub stored_line_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_event: Option<BuildEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_id: Option<String>,
    /// Timestamp of the segment that opened the line.
    pub time: String,
}

/// Result of an incremental query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogPatchSet {
    /// Lines created or mutated since the requested checkpoint, in line order.
    pub lines: Vec<LogLine>,
    /// Checkpoint to pass to the next incremental query.
    pub checkpoint: Checkpoint,
}

impl LogPatchSet {
    pub const fn empty(checkpoint: Checkpoint) -> Self {
        Self {
            lines: Vec::new(),
            checkpoint,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
