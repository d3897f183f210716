//! Scheduler adapters implementing the core [`Scheduler`] port.
//!
//! [`Scheduler`]: spanlog_core::Scheduler

mod frame;
mod immediate;
mod manual;

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use spanlog_core::{Task, TickId};

pub use frame::FrameScheduler;
pub use immediate::ImmediateScheduler;
pub use manual::ManualScheduler;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run every task queued before the call. Tasks scheduled meanwhile wait
/// for the next frame.
fn run_frame(queue: &Mutex<TaskQueue>) -> usize {
    let Some(boundary) = lock(queue).last_id() else {
        return 0;
    };

    let mut ran = 0;
    loop {
        let task = lock(queue).pop_due(boundary);
        let Some(task) = task else { break };
        task();
        ran += 1;
    }
    ran
}

/// FIFO of pending tasks. Ids increase monotonically, so the queue is
/// always sorted by id.
#[derive(Default)]
struct TaskQueue {
    tasks: VecDeque<(TickId, Task)>,
    next_id: u64,
}

impl TaskQueue {
    fn push(&mut self, task: Task) -> TickId {
        let id = TickId::new(self.next_id);
        self.next_id += 1;
        self.tasks.push_back((id, task));
        id
    }

    fn cancel(&mut self, id: TickId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|(queued, _)| *queued != id);
        self.tasks.len() != before
    }

    fn pop(&mut self) -> Option<Task> {
        self.tasks.pop_front().map(|(_, task)| task)
    }

    /// Pop the next task queued no later than `boundary`.
    fn pop_due(&mut self, boundary: TickId) -> Option<Task> {
        if self.tasks.front().is_some_and(|(id, _)| *id <= boundary) {
            self.pop()
        } else {
            None
        }
    }

    /// Id of the most recently queued task still pending.
    fn last_id(&self) -> Option<TickId> {
        self.tasks.back().map(|(id, _)| *id)
    }

    fn len(&self) -> usize {
        self.tasks.len()
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.tasks.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_ids_increase() {
        let mut queue = TaskQueue::default();
        let a = queue.push(Box::new(|| {}));
        let b = queue.push(Box::new(|| {}));
        assert!(a < b);
        assert_eq!(queue.last_id(), Some(b));
    }

    #[test]
    fn test_pop_due_respects_boundary() {
        let mut queue = TaskQueue::default();
        let a = queue.push(Box::new(|| {}));
        queue.push(Box::new(|| {}));

        assert!(queue.pop_due(a).is_some());
        assert!(queue.pop_due(a).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_cancel_unknown_is_noop() {
        let mut queue = TaskQueue::default();
        let a = queue.push(Box::new(|| {}));
        assert!(queue.cancel(a));
        assert!(!queue.cancel(a));
        assert!(!queue.cancel(TickId::new(42)));
    }
}
