//! Real-clock scheduler backed by sleeper threads
//!
//! Production counterpart of the virtual clock: each task gets its own
//! thread that sleeps until the due time. Cancellation is checked right
//! before every firing, so a cancelled task never runs again (an in-flight
//! sleep is not interrupted, the wakeup just becomes a no-op).

use std::thread;
use std::time::{Duration, Instant};

use super::{PeriodicTask, Scheduler, Task, TaskHandle};

/// Wall-clock scheduler; `now()` reads elapsed time since creation so the
/// timeline starts at zero like the virtual clock's.
#[derive(Clone)]
pub struct ThreadScheduler {
    epoch: Instant,
}

impl ThreadScheduler {
    pub fn new() -> Self {
        ThreadScheduler {
            epoch: Instant::now(),
        }
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ThreadScheduler {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn schedule_once(&self, delay: Duration, task: Task) -> TaskHandle {
        let handle = TaskHandle::new();
        let guard = handle.clone();
        thread::spawn(move || {
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            if !guard.is_cancelled() {
                task();
            }
        });
        handle
    }

    fn schedule_periodic(
        &self,
        initial_delay: Duration,
        period: Duration,
        mut task: PeriodicTask,
    ) -> TaskHandle {
        assert!(period > Duration::ZERO, "period must be non-zero");
        let handle = TaskHandle::new();
        let guard = handle.clone();
        // Due times are computed on a fixed grid from the spawn instant, so
        // a slow task body delays at most the current firing and never
        // shifts the schedule itself.
        let epoch = Instant::now();
        thread::spawn(move || {
            let mut due = initial_delay;
            loop {
                let now = epoch.elapsed();
                if due > now {
                    thread::sleep(due - now);
                }
                if guard.is_cancelled() {
                    break;
                }
                task();
                due += period;
            }
        });
        handle
    }
}
