//! Scheduler port for cooperative, frame-paced work.
//!
//! The viewport never renders inline with a store update. It asks the
//! scheduler to run one bounded unit of work later and yields.

use std::fmt;

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Handle returned by [`Scheduler::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(u64);

impl TickId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick#{}", self.0)
    }
}

/// Port for deferring work to the next frame.
///
/// # Implementations
///
/// - A synchronous trampoline for deterministic tests
/// - A manually stepped scheduler for tests that inspect intermediate frames
/// - A timer-driven scheduler bound to a frame interval
///
/// The task may run before `schedule` returns (synchronous implementations).
/// Callers must not hold locks the task needs while scheduling.
pub trait Scheduler: Send + Sync {
    /// Queue `task` for the next frame.
    fn schedule(&self, task: Task) -> TickId;

    /// Cancel a queued task. No-op if it already ran or was cancelled.
    fn cancel(&self, id: TickId);
}
