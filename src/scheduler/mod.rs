//! Task scheduling for time-based operators
//!
//! Every deferred emission in the engine (delay, sample, timeout, interval,
//! observe_on/subscribe_on hops) is a task handed to a [`Scheduler`]. The
//! scheduler is an explicit, injectable dependency so tests can substitute
//! [`VirtualScheduler`] for [`ThreadScheduler`] without touching operator
//! code.

pub mod thread;
pub mod virtual_clock;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub use thread::ThreadScheduler;
pub use virtual_clock::VirtualScheduler;

/// One-shot task body.
pub type Task = Box<dyn FnOnce() + Send>;

/// Periodic task body; invoked once per period until cancelled.
pub type PeriodicTask = Box<dyn FnMut() + Send>;

/// Clock plus task queue driving all time-based operators.
pub trait Scheduler: Send + Sync {
    /// Current reading of this scheduler's clock.
    fn now(&self) -> Duration;

    /// Run `task` once, `delay` after now.
    fn schedule_once(&self, delay: Duration, task: Task) -> TaskHandle;

    /// Run `task` at `now + initial_delay`, then every `period` thereafter,
    /// until the handle is cancelled.
    fn schedule_periodic(
        &self,
        initial_delay: Duration,
        period: Duration,
        task: PeriodicTask,
    ) -> TaskHandle;
}

/// Shared scheduler reference as consumed by operators.
pub type SchedulerHandle = Arc<dyn Scheduler>;

/// Cancellation handle for a scheduled task.
///
/// A cancelled task never fires again; cancelling is idempotent and safe
/// from within the task body itself.
#[derive(Clone)]
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle {
    pub(crate) fn new() -> Self {
        TaskHandle {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
