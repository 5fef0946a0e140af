//! `Single`: exactly one value or an error
//!
//! Success and failure are mutually exclusive terminal outcomes; there is no
//! separate completion signal.

use std::sync::Arc;

use log::debug;

use crate::completable::Completable;
use crate::error::{catch_fault, FlowError};
use crate::flow::Flow;
use crate::maybe::Maybe;
use crate::subscriber::{single_callbacks, SingleSubscriber};
use crate::subscription::Subscription;

/// Lazy, re-subscribable computation resolving to exactly one value or an
/// error.
///
/// # Examples
/// ```
/// use flowrx::{Single, TestSubscriber};
///
/// let subscriber = TestSubscriber::new();
/// Single::just(21).map(|x| x * 2).subscribe(subscriber.clone());
/// subscriber.assert_values(&[42]);
/// ```
pub struct Single<T> {
    producer: Arc<dyn Fn(SingleEmitter<T>) + Send + Sync>,
}

impl<T> Clone for Single<T> {
    fn clone(&self) -> Self {
        Single {
            producer: Arc::clone(&self.producer),
        }
    }
}

impl<T: Send + 'static> Single<T> {
    pub fn create<P>(producer: P) -> Self
    where
        P: Fn(SingleEmitter<T>) + Send + Sync + 'static,
    {
        Single {
            producer: Arc::new(producer),
        }
    }

    /// Succeed immediately with `value`.
    pub fn just(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Single::create(move |emitter| emitter.succeed(value.clone()))
    }

    /// Fail immediately with `error`.
    pub fn error(error: FlowError) -> Self {
        Single::create(move |emitter| emitter.fail(error.clone()))
    }

    /// Run `compute` on subscribe and succeed with its result, or fail if it
    /// panics.
    pub fn from_callable<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Single::create(move |emitter| match catch_fault(&compute) {
            Ok(value) => emitter.succeed(value),
            Err(fault) => emitter.fail(fault),
        })
    }

    pub fn subscribe<S>(&self, subscriber: S) -> Subscription
    where
        S: SingleSubscriber<T> + 'static,
    {
        self.run_producer(subscriber, Subscription::new())
    }

    /// Subscribe with disposal tied to `parent` before the producer runs.
    pub(crate) fn subscribe_bound<S>(&self, subscriber: S, parent: &Subscription) -> Subscription
    where
        S: SingleSubscriber<T> + 'static,
    {
        let subscription = Subscription::new();
        let child = subscription.clone();
        parent.add_cleanup(move || child.cancel());
        self.run_producer(subscriber, subscription)
    }

    fn run_producer<S>(&self, subscriber: S, subscription: Subscription) -> Subscription
    where
        S: SingleSubscriber<T> + 'static,
    {
        let emitter = SingleEmitter {
            subscriber: Arc::new(subscriber),
            subscription: subscription.clone(),
        };
        let producer = Arc::clone(&self.producer);
        let run_emitter = emitter.clone();
        if let Err(fault) = catch_fault(move || producer(run_emitter)) {
            emitter.fail(fault);
        }
        subscription
    }

    pub fn subscribe_with<S, E>(&self, on_success: S, on_error: E) -> Subscription
    where
        S: Fn(T) + Send + Sync + 'static,
        E: Fn(FlowError) + Send + Sync + 'static,
    {
        self.subscribe(single_callbacks(on_success, on_error))
    }

    /// Transform the success value.
    pub fn map<U, F>(&self, f: F) -> Single<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let f = Arc::new(f);
        Single::create(move |out| {
            let f = Arc::clone(&f);
            upstream.subscribe_bound(
                single_callbacks(
                    {
                        let out = out.clone();
                        move |value| match catch_fault(|| f(value)) {
                            Ok(mapped) => out.succeed(mapped),
                            Err(fault) => out.fail(fault),
                        }
                    },
                    {
                        let out = out.clone();
                        move |error| out.fail(error)
                    },
                ),
                out.subscription(),
            );
        })
    }

    /// Narrow to a [`Maybe`]: pass the value through if it satisfies the
    /// predicate, otherwise complete with no value.
    pub fn filter<F>(&self, predicate: F) -> Maybe<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let predicate = Arc::new(predicate);
        Maybe::create(move |out| {
            let predicate = Arc::clone(&predicate);
            upstream.subscribe_bound(
                single_callbacks(
                    {
                        let out = out.clone();
                        move |value| match catch_fault(|| predicate(&value)) {
                            Ok(true) => out.succeed(value),
                            Ok(false) => out.complete(),
                            Err(fault) => out.fail(fault),
                        }
                    },
                    {
                        let out = out.clone();
                        move |error| out.fail(error)
                    },
                ),
                out.subscription(),
            );
        })
    }

    /// Widen to a [`Flow`] emitting the value and then completing.
    pub fn to_flow(&self) -> Flow<T> {
        let upstream = self.clone();
        Flow::create(move |out| {
            upstream.subscribe_bound(
                single_callbacks(
                    {
                        let out = out.clone();
                        move |value| {
                            out.emit(value);
                            out.complete();
                        }
                    },
                    {
                        let out = out.clone();
                        move |error| out.fail(error)
                    },
                ),
                out.subscription(),
            );
        })
    }
}

impl Single<bool> {
    /// Collapse to a [`Completable`]: complete if the value resolves true,
    /// fail with [`FlowError::ConditionNotMet`] if false.
    pub fn require_true(&self) -> Completable {
        let upstream = self.clone();
        Completable::create(move |out| {
            upstream.subscribe_bound(
                single_callbacks(
                    {
                        let out = out.clone();
                        move |satisfied| {
                            if satisfied {
                                out.complete();
                            } else {
                                out.fail(FlowError::ConditionNotMet);
                            }
                        }
                    },
                    {
                        let out = out.clone();
                        move |error| out.fail(error)
                    },
                ),
                out.subscription(),
            );
        })
    }
}

/// Producer-facing handle for a [`Single`] subscription.
pub struct SingleEmitter<T> {
    subscriber: Arc<dyn SingleSubscriber<T>>,
    subscription: Subscription,
}

impl<T> Clone for SingleEmitter<T> {
    fn clone(&self) -> Self {
        SingleEmitter {
            subscriber: Arc::clone(&self.subscriber),
            subscription: self.subscription.clone(),
        }
    }
}

impl<T> SingleEmitter<T> {
    /// Deliver the success value and dispose the subscription.
    pub fn succeed(&self, value: T) {
        if !self.subscription.try_terminate() {
            debug!("single: dropping success after termination/cancellation");
            return;
        }
        self.subscriber.on_success(value);
        self.subscription.cancel();
    }

    /// Deliver the error terminal signal and dispose the subscription.
    pub fn fail(&self, error: FlowError) {
        if !self.subscription.try_terminate() {
            debug!("single: dropping error after termination/cancellation: {}", error);
            return;
        }
        self.subscriber.on_error(error);
        self.subscription.cancel();
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    pub fn on_cancel<F>(&self, cleanup: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.subscription.add_cleanup(cleanup);
    }
}
