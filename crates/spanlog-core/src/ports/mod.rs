//! Port definitions (trait abstractions) for the rendering host.
//!
//! Ports define what the viewport expects from its environment: a way to
//! defer bounded units of work, and an ordered output to materialize lines
//! into. They use only domain types.
//!
//! # Design Rules
//!
//! - No async runtime types in any signature
//! - Handles are opaque integers owned by the implementation
//! - Cancellation and removal of unknown handles are no-ops

pub mod output_sink;
pub mod scheduler;

pub use output_sink::{ElementId, OutputSink, Placement, RenderedLine};
pub use scheduler::{Scheduler, Task, TickId};
