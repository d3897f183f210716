//! Frame-paced scheduler driven by a tokio interval.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use spanlog_core::{Scheduler, Task, TickId};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{TaskQueue, lock, run_frame};

/// Shortest frame tokio accepts.
const MIN_FRAME: Duration = Duration::from_millis(1);

/// Runs queued tasks once per frame on a background tokio task.
///
/// Each frame runs the tasks queued before it started; a task that
/// reschedules itself runs again one frame later. Slow frames are skipped,
/// not replayed. Dropping the scheduler or calling [`shutdown`] stops the
/// frame loop; tasks still queued then never run.
///
/// [`shutdown`]: FrameScheduler::shutdown
#[derive(Debug)]
pub struct FrameScheduler {
    queue: Arc<Mutex<TaskQueue>>,
    cancel_token: CancellationToken,
    frame_interval: Duration,
}

impl FrameScheduler {
    /// Start the frame loop. Must be called from within a tokio runtime.
    pub fn spawn(frame_interval: Duration) -> Arc<Self> {
        let frame_interval = frame_interval.max(MIN_FRAME);
        let scheduler = Arc::new(Self {
            queue: Arc::default(),
            cancel_token: CancellationToken::new(),
            frame_interval,
        });

        let queue = Arc::clone(&scheduler.queue);
        let cancel_token = scheduler.cancel_token.clone();
        tokio::spawn(run_frames(queue, frame_interval, cancel_token));
        scheduler
    }

    /// Stop the frame loop. Idempotent.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub const fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn pending(&self) -> usize {
        lock(&self.queue).len()
    }
}

impl Scheduler for FrameScheduler {
    fn schedule(&self, task: Task) -> TickId {
        lock(&self.queue).push(task)
    }

    fn cancel(&self, id: TickId) {
        lock(&self.queue).cancel(id);
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn run_frames(
    queue: Arc<Mutex<TaskQueue>>,
    frame_interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    debug!(?frame_interval, "Starting frame scheduler");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let ran = run_frame(&queue);
                if ran > 0 {
                    trace!(tasks = ran, "Ran frame");
                }
            }
            () = cancel_token.cancelled() => {
                debug!("Frame scheduler stopped");
                break;
            }
        }
    }
}
