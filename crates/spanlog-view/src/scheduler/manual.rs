//! Manually stepped scheduler.

use std::sync::Mutex;

use spanlog_core::{Scheduler, Task, TickId};

use super::{TaskQueue, lock, run_frame};

/// Upper bound on frames run by [`ManualScheduler::run_until_idle`].
const MAX_FRAMES: usize = 100_000;

/// Queues tasks until the caller steps a frame.
///
/// Lets tests observe the output between frames.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    queue: Mutex<TaskQueue>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the oldest queued task. Returns false if nothing was queued.
    pub fn run_next(&self) -> bool {
        let Some(task) = lock(&self.queue).pop() else {
            return false;
        };
        task();
        true
    }

    /// Run one frame: every task queued before this call.
    ///
    /// Tasks scheduled while the frame runs wait for the next frame.
    pub fn run_pending(&self) -> usize {
        run_frame(&self.queue)
    }

    /// Run frames until no task is queued. Returns the number of frames.
    pub fn run_until_idle(&self) -> usize {
        let mut frames = 0;
        while frames < MAX_FRAMES && self.run_pending() > 0 {
            frames += 1;
        }
        frames
    }

    pub fn pending(&self) -> usize {
        lock(&self.queue).len()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, task: Task) -> TickId {
        lock(&self.queue).push(task)
    }

    fn cancel(&self, id: TickId) {
        lock(&self.queue).cancel(id);
    }
}
