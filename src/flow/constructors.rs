//! Flow constructors
//!
//! All constructors are cold: they describe a computation and run it anew on
//! every subscribe call.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{catch_fault, FlowError};
use crate::flow::core::Flow;
use crate::scheduler::SchedulerHandle;
use crate::subscriber::callbacks;

impl<T: Send + 'static> Flow<T> {
    /// Emit a single value, then complete.
    pub fn just(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Flow::create(move |emitter| {
            emitter.emit(value.clone());
            emitter.complete();
        })
    }

    /// Emit every item of the collection in order, then complete.
    ///
    /// # Examples
    /// ```
    /// use flowrx::{Flow, TestSubscriber};
    ///
    /// let subscriber = TestSubscriber::new();
    /// Flow::from_iter(vec!["a", "b"]).subscribe(subscriber.clone());
    /// subscriber.assert_values(&["a", "b"]);
    /// ```
    pub fn from_iter<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
    {
        Flow::create(move |emitter| {
            for item in items.clone() {
                if !emitter.is_active() {
                    return;
                }
                emitter.emit(item);
            }
            emitter.complete();
        })
    }

    /// Complete immediately without emitting.
    pub fn empty() -> Self {
        Flow::create(|emitter| emitter.complete())
    }

    /// Fail immediately with `error`.
    pub fn error(error: FlowError) -> Self {
        Flow::create(move |emitter| emitter.fail(error.clone()))
    }

    /// Never emit anything and never terminate.
    pub fn never() -> Self {
        Flow::create(|_emitter| {})
    }

    /// Defer building the actual flow until subscribe time, so expensive
    /// setup work runs per subscription instead of at assembly time.
    pub fn defer<F>(factory: F) -> Self
    where
        F: Fn() -> Flow<T> + Send + Sync + 'static,
    {
        let factory = Arc::new(factory);
        Flow::create(move |emitter| {
            let factory = Arc::clone(&factory);
            match catch_fault(move || factory()) {
                Ok(flow) => {
                    let out = emitter.clone();
                    flow.subscribe_bound(
                        callbacks(
                            {
                                let out = out.clone();
                                move |value| out.emit(value)
                            },
                            {
                                let out = out.clone();
                                move || out.complete()
                            },
                            move |error| out.fail(error),
                        ),
                        emitter.subscription(),
                    );
                }
                Err(fault) => emitter.fail(fault),
            }
        })
    }
}

impl Flow<u64> {
    /// Unbounded ascending counter on the scheduler's clock: first value `0`
    /// at `initial_delay`, then one more every `period`. Never completes or
    /// errors on its own; stops only when the subscription is cancelled.
    pub fn interval(initial_delay: Duration, period: Duration, scheduler: SchedulerHandle) -> Self {
        Flow::create(move |emitter| {
            let out = emitter.clone();
            let mut counter: u64 = 0;
            let handle = scheduler.schedule_periodic(
                initial_delay,
                period,
                Box::new(move || {
                    out.emit(counter);
                    counter += 1;
                }),
            );
            emitter.on_cancel(move || handle.cancel());
        })
    }

    /// Emit a single `0` after `delay`, then complete.
    pub fn timer(delay: Duration, scheduler: SchedulerHandle) -> Self {
        Flow::create(move |emitter| {
            let out = emitter.clone();
            let handle = scheduler.schedule_once(
                delay,
                Box::new(move || {
                    out.emit(0);
                    out.complete();
                }),
            );
            emitter.on_cancel(move || handle.cancel());
        })
    }
}
