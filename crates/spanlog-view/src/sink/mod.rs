//! Output sink adapters implementing the core [`OutputSink`] port.
//!
//! [`OutputSink`]: spanlog_core::OutputSink

mod memory;

pub use memory::{MemorySink, SinkStats};
