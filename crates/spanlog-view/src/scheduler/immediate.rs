//! Synchronous scheduler for deterministic tests.

use std::sync::Mutex;

use spanlog_core::{Scheduler, Task, TickId};

use super::{TaskQueue, lock};

#[derive(Debug, Default)]
struct Trampoline {
    queue: TaskQueue,
    draining: bool,
}

/// Runs every task before `schedule` returns.
///
/// A task scheduled from inside a running task is queued and run after it
/// finishes, on the same call stack, so re-entrant scheduling never recurses.
/// If another thread is draining, the task runs on that thread.
#[derive(Debug, Default)]
pub struct ImmediateScheduler {
    state: Mutex<Trampoline>,
}

impl ImmediateScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next task to run, or `None` after releasing the drain.
    fn next_task(&self) -> Option<Task> {
        let mut state = lock(&self.state);
        let task = state.queue.pop();
        if task.is_none() {
            state.draining = false;
        }
        task
    }
}

impl Scheduler for ImmediateScheduler {
    fn schedule(&self, task: Task) -> TickId {
        let id = {
            let mut state = lock(&self.state);
            let id = state.queue.push(task);
            if state.draining {
                return id;
            }
            state.draining = true;
            id
        };

        while let Some(task) = self.next_task() {
            task();
        }
        id
    }

    fn cancel(&self, id: TickId) {
        lock(&self.state).queue.cancel(id);
    }
}
