//! Log domain types.
//!
//! Pure data: no locking, no I/O. The store in [`crate::store`] is the only
//! place these are created from wire input and mutated.
//!
//! # Structure
//!
//! - `level` - Severity of a segment (`LogLevel`)
//! - `span` - Span keys and the span bookkeeping exposed to readers
//! - `segment` - Raw fragments as received (`Segment`, `SegmentFields`)
//! - `line` - Displayable lines, patch sets and checkpoints
//! - `batch` - One ingestion batch in domain form (`AppendBatch`)

mod batch;
mod level;
mod line;
mod segment;
mod span;

pub use batch::AppendBatch;
pub use level::LogLevel;
pub use line::{Checkpoint, LogLine, LogPatchSet};
pub use segment::{BuildEvent, Segment, SegmentFields};
pub use span::{GLOBAL_SPAN_ID, LogAlert, LogSpan, SpanId};
