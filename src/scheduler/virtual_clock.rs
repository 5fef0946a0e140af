//! Virtual clock scheduler for deterministic time-based testing
//!
//! Holds a simulated timestamp and an ordered queue of pending tasks.
//! Nothing runs until the clock is advanced explicitly; `advance_by`
//! processes every task due inside the advanced window in (due time,
//! insertion order) order, so runs are fully deterministic.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::trace;

use super::{PeriodicTask, Scheduler, SchedulerHandle, Task, TaskHandle};

enum TaskKind {
    Once(Task),
    Periodic { period: Duration, body: PeriodicTask },
}

struct Entry {
    due: Duration,
    seq: u64,
    kind: TaskKind,
    handle: TaskHandle,
}

// BinaryHeap is a max-heap; order entries so the earliest (due, seq) pair
// surfaces first.
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct Queue {
    now: Duration,
    seq: u64,
    entries: BinaryHeap<Entry>,
}

impl Queue {
    fn push(&mut self, due: Duration, kind: TaskKind, handle: TaskHandle) {
        self.seq += 1;
        trace!("virtual scheduler: task #{} due at {:?}", self.seq, due);
        self.entries.push(Entry {
            due,
            seq: self.seq,
            kind,
            handle,
        });
    }
}

/// Manually advanced scheduler backing all virtual-time tests.
///
/// Clones share the same clock and queue. The queue lock is never held while
/// a task body runs, so tasks may schedule further tasks; anything they
/// enqueue with a due time inside the window being advanced runs within the
/// same `advance_by` call.
#[derive(Clone)]
pub struct VirtualScheduler {
    queue: Arc<Mutex<Queue>>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        VirtualScheduler {
            queue: Arc::new(Mutex::new(Queue {
                now: Duration::ZERO,
                seq: 0,
                entries: BinaryHeap::new(),
            })),
        }
    }

    /// Shared handle in the form operators consume.
    pub fn handle(&self) -> SchedulerHandle {
        Arc::new(self.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Move the clock forward by `delta`, firing every due task in order.
    pub fn advance_by(&self, delta: Duration) {
        let target = self.lock().now + delta;
        self.advance_to(target);
    }

    /// Move the clock forward to `target` (no-op if already past it).
    ///
    /// While a task runs, the clock reads that task's due time; after the
    /// call, it reads `target` regardless of how many tasks fired.
    pub fn advance_to(&self, target: Duration) {
        loop {
            let entry = {
                let mut queue = self.lock();
                match queue.entries.peek() {
                    Some(head) if head.due <= target => {
                        let entry = queue.entries.pop();
                        if let Some(ref e) = entry {
                            queue.now = queue.now.max(e.due);
                        }
                        entry
                    }
                    _ => None,
                }
            };
            let Some(Entry {
                due, kind, handle, ..
            }) = entry
            else {
                break;
            };
            if handle.is_cancelled() {
                continue;
            }
            trace!("virtual scheduler: firing task due at {:?}", due);
            match kind {
                TaskKind::Once(body) => body(),
                TaskKind::Periodic { period, mut body } => {
                    body();
                    // The body may have cancelled its own handle.
                    if !handle.is_cancelled() {
                        self.lock()
                            .push(due + period, TaskKind::Periodic { period, body }, handle);
                    }
                }
            }
        }
        let mut queue = self.lock();
        queue.now = queue.now.max(target);
    }
}

impl Default for VirtualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for VirtualScheduler {
    fn now(&self) -> Duration {
        self.lock().now
    }

    fn schedule_once(&self, delay: Duration, task: Task) -> TaskHandle {
        let handle = TaskHandle::new();
        let mut queue = self.lock();
        let due = queue.now + delay;
        queue.push(due, TaskKind::Once(task), handle.clone());
        handle
    }

    fn schedule_periodic(
        &self,
        initial_delay: Duration,
        period: Duration,
        task: PeriodicTask,
    ) -> TaskHandle {
        assert!(period > Duration::ZERO, "period must be non-zero");
        let handle = TaskHandle::new();
        let mut queue = self.lock();
        let due = queue.now + initial_delay;
        queue.push(due, TaskKind::Periodic { period, body: task }, handle.clone());
        handle
    }
}
