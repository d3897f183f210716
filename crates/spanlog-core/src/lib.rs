#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod contracts;
pub mod domain;
pub mod error;
pub mod filter;
pub mod ports;
pub mod prefix;
pub mod settings;
pub mod store;

// Re-export commonly used types for convenience
pub use contracts::{ContractError, LogList, SegmentDto, SpanDto};
pub use domain::{
    AppendBatch, BuildEvent, Checkpoint, GLOBAL_SPAN_ID, LogAlert, LogLevel, LogLine,
    LogPatchSet, LogSpan, Segment, SegmentFields, SpanId,
};
pub use error::CoreError;
pub use filter::{FilterLevel, FilterParseError, FilterSource, FilterTerm, LogFilter, TermState};
pub use ports::{ElementId, OutputSink, Placement, RenderedLine, Scheduler, Task, TickId};
pub use prefix::{PREFIX_WIDTH, source_prefix};
pub use settings::{
    DEFAULT_FRAME_INTERVAL_MS, DEFAULT_MAX_LOG_LENGTH, DEFAULT_RENDER_WINDOW, Settings,
    SettingsError, SettingsUpdate, validate_settings,
};
pub use store::{
    ListenerId, LogStore, LogUpdateAction, LogUpdateEvent, LogUpdateListener, ManifestWeight,
    SharedLogStore, heaviest_manifest_name,
};
