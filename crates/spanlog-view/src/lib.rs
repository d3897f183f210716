#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use mockall as _;

pub mod scheduler;
pub mod sink;
pub mod viewport;

pub use scheduler::{FrameScheduler, ImmediateScheduler, ManualScheduler};
pub use sink::{MemorySink, SinkStats};
pub use viewport::{RenderPhase, ScrollPosition, ViewScope, Viewport, ViewportOptions};
