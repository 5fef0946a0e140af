//! Time-based operators: delay, sample, timeout, subscribe_on, observe_on
//!
//! Every deferred emission here is a scheduled task; the operators never
//! block. With a [`VirtualScheduler`](crate::VirtualScheduler) injected they
//! are fully deterministic under test.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::FlowError;
use crate::flow::core::{Flow, FlowEmitter};
use crate::scheduler::{SchedulerHandle, TaskHandle};
use crate::subscriber::callbacks;

struct SampleState<T> {
    latest: Option<T>,
    timer: Option<TaskHandle>,
}

// (Re)start the timeout window; the previous pending task, if any, is
// cancelled so it can never fire against a stream that has shown activity.
fn arm_timeout<T: 'static>(
    pending: &Arc<Mutex<Option<TaskHandle>>>,
    scheduler: &SchedulerHandle,
    duration: Duration,
    out: &FlowEmitter<T>,
) {
    let out = out.clone();
    let handle = scheduler.schedule_once(duration, Box::new(move || out.fail(FlowError::Timeout)));
    let previous = pending
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .replace(handle);
    if let Some(previous) = previous {
        previous.cancel();
    }
}

fn cancel_pending(pending: &Arc<Mutex<Option<TaskHandle>>>) {
    if let Some(handle) = pending.lock().unwrap_or_else(|e| e.into_inner()).take() {
        handle.cancel();
    }
}

impl<T: Send + 'static> Flow<T> {
    /// Re-emit every upstream signal, values and terminals alike, after an
    /// additional fixed delay on the scheduler's clock.
    pub fn delay(&self, duration: Duration, scheduler: SchedulerHandle) -> Flow<T> {
        let upstream = self.clone();
        Flow::create(move |out| {
            let scheduler = Arc::clone(&scheduler);
            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let scheduler = Arc::clone(&scheduler);
                        move |value| {
                            let out = out.clone();
                            scheduler.schedule_once(duration, Box::new(move || out.emit(value)));
                        }
                    },
                    {
                        let out = out.clone();
                        let scheduler = Arc::clone(&scheduler);
                        move || {
                            let out = out.clone();
                            scheduler.schedule_once(duration, Box::new(move || out.complete()));
                        }
                    },
                    {
                        let out = out.clone();
                        let scheduler = Arc::clone(&scheduler);
                        move |error| {
                            let out = out.clone();
                            scheduler.schedule_once(duration, Box::new(move || out.fail(error)));
                        }
                    },
                ),
                out.subscription(),
            );
        })
    }

    /// Group incoming values into non-overlapping windows of length
    /// `period`, measured from the first value's arrival, and emit only the
    /// most recently received value at each window boundary. A window with
    /// no new value emits nothing.
    pub fn sample(&self, period: Duration, scheduler: SchedulerHandle) -> Flow<T> {
        let upstream = self.clone();
        Flow::create(move |out| {
            let scheduler = Arc::clone(&scheduler);
            let state: Arc<Mutex<SampleState<T>>> = Arc::new(Mutex::new(SampleState {
                latest: None,
                timer: None,
            }));

            let stop_timer = {
                let state = Arc::clone(&state);
                move || {
                    if let Some(timer) = state
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .timer
                        .take()
                    {
                        timer.cancel();
                    }
                }
            };

            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let state = Arc::clone(&state);
                        let scheduler = Arc::clone(&scheduler);
                        move |value| {
                            let mut st = state.lock().unwrap_or_else(|e| e.into_inner());
                            st.latest = Some(value);
                            if st.timer.is_none() {
                                // First value opens the window sequence.
                                let out = out.clone();
                                let tick_state = Arc::clone(&state);
                                let handle = scheduler.schedule_periodic(
                                    period,
                                    period,
                                    Box::new(move || {
                                        let sampled = tick_state
                                            .lock()
                                            .unwrap_or_else(|e| e.into_inner())
                                            .latest
                                            .take();
                                        if let Some(sampled) = sampled {
                                            out.emit(sampled);
                                        }
                                    }),
                                );
                                st.timer = Some(handle);
                            }
                        }
                    },
                    {
                        let out = out.clone();
                        let stop_timer = stop_timer.clone();
                        move || {
                            stop_timer();
                            out.complete();
                        }
                    },
                    {
                        let out = out.clone();
                        let stop_timer = stop_timer.clone();
                        move |error| {
                            stop_timer();
                            out.fail(error);
                        }
                    },
                ),
                out.subscription(),
            );

            out.on_cancel(stop_timer);
        })
    }

    /// Fail with [`FlowError::Timeout`] if no value arrives within
    /// `duration` of subscription or of the previous value, whichever is
    /// later; the window resets on every value. Upstream completion or error
    /// inside the window passes through unchanged.
    pub fn timeout(&self, duration: Duration, scheduler: SchedulerHandle) -> Flow<T> {
        let upstream = self.clone();
        Flow::create(move |out| {
            let scheduler = Arc::clone(&scheduler);
            let pending: Arc<Mutex<Option<TaskHandle>>> = Arc::new(Mutex::new(None));
            arm_timeout(&pending, &scheduler, duration, &out);

            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let pending = Arc::clone(&pending);
                        let scheduler = Arc::clone(&scheduler);
                        move |value| {
                            cancel_pending(&pending);
                            out.emit(value);
                            if out.is_active() {
                                arm_timeout(&pending, &scheduler, duration, &out);
                            }
                        }
                    },
                    {
                        let out = out.clone();
                        let pending = Arc::clone(&pending);
                        move || {
                            cancel_pending(&pending);
                            out.complete();
                        }
                    },
                    {
                        let out = out.clone();
                        let pending = Arc::clone(&pending);
                        move |error| {
                            cancel_pending(&pending);
                            out.fail(error);
                        }
                    },
                ),
                out.subscription(),
            );

            out.on_cancel(move || cancel_pending(&pending));
        })
    }

    /// Perform the upstream subscription (and therefore the producer's work)
    /// as a task on `scheduler` instead of the caller's context.
    pub fn subscribe_on(&self, scheduler: SchedulerHandle) -> Flow<T> {
        let upstream = self.clone();
        Flow::create(move |out| {
            let upstream = upstream.clone();
            let task_out = out.clone();
            let handle = scheduler.schedule_once(
                Duration::ZERO,
                Box::new(move || {
                    if !task_out.is_active() {
                        return;
                    }
                    upstream.subscribe_bound(
                        callbacks(
                            {
                                let out = task_out.clone();
                                move |value| out.emit(value)
                            },
                            {
                                let out = task_out.clone();
                                move || out.complete()
                            },
                            {
                                let out = task_out.clone();
                                move |error| out.fail(error)
                            },
                        ),
                        task_out.subscription(),
                    );
                }),
            );
            out.on_cancel(move || handle.cancel());
        })
    }

    /// Deliver every downstream signal as a task on `scheduler`, decoupling
    /// delivery from the context the producer emits on.
    pub fn observe_on(&self, scheduler: SchedulerHandle) -> Flow<T> {
        let upstream = self.clone();
        Flow::create(move |out| {
            let scheduler = Arc::clone(&scheduler);
            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let scheduler = Arc::clone(&scheduler);
                        move |value| {
                            let out = out.clone();
                            scheduler
                                .schedule_once(Duration::ZERO, Box::new(move || out.emit(value)));
                        }
                    },
                    {
                        let out = out.clone();
                        let scheduler = Arc::clone(&scheduler);
                        move || {
                            let out = out.clone();
                            scheduler
                                .schedule_once(Duration::ZERO, Box::new(move || out.complete()));
                        }
                    },
                    {
                        let out = out.clone();
                        let scheduler = Arc::clone(&scheduler);
                        move |error| {
                            let out = out.clone();
                            scheduler
                                .schedule_once(Duration::ZERO, Box::new(move || out.fail(error)));
                        }
                    },
                ),
                out.subscription(),
            );
        })
    }
}
