//! `Maybe`: zero or one value
//!
//! A success value is itself terminal (value implies completion); the other
//! terminal outcomes are empty completion and error.

use std::sync::Arc;

use log::debug;

use crate::error::{catch_fault, FlowError};
use crate::single::Single;
use crate::subscriber::{maybe_callbacks, MaybeSubscriber};
use crate::subscription::Subscription;

/// Lazy, re-subscribable computation resolving to at most one value.
pub struct Maybe<T> {
    producer: Arc<dyn Fn(MaybeEmitter<T>) + Send + Sync>,
}

impl<T> Clone for Maybe<T> {
    fn clone(&self) -> Self {
        Maybe {
            producer: Arc::clone(&self.producer),
        }
    }
}

impl<T: Send + 'static> Maybe<T> {
    pub fn create<P>(producer: P) -> Self
    where
        P: Fn(MaybeEmitter<T>) + Send + Sync + 'static,
    {
        Maybe {
            producer: Arc::new(producer),
        }
    }

    /// Succeed immediately with `value`.
    pub fn just(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Maybe::create(move |emitter| emitter.succeed(value.clone()))
    }

    /// Complete immediately with no value.
    pub fn empty() -> Self {
        Maybe::create(|emitter| emitter.complete())
    }

    /// Fail immediately with `error`.
    pub fn error(error: FlowError) -> Self {
        Maybe::create(move |emitter| emitter.fail(error.clone()))
    }

    /// `Some(value)` succeeds with the value, `None` completes empty.
    pub fn from_option(option: Option<T>) -> Self
    where
        T: Clone + Sync,
    {
        Maybe::create(move |emitter| match option.clone() {
            Some(value) => emitter.succeed(value),
            None => emitter.complete(),
        })
    }

    pub fn subscribe<S>(&self, subscriber: S) -> Subscription
    where
        S: MaybeSubscriber<T> + 'static,
    {
        self.run_producer(subscriber, Subscription::new())
    }

    /// Subscribe with disposal tied to `parent` before the producer runs.
    pub(crate) fn subscribe_bound<S>(&self, subscriber: S, parent: &Subscription) -> Subscription
    where
        S: MaybeSubscriber<T> + 'static,
    {
        let subscription = Subscription::new();
        let child = subscription.clone();
        parent.add_cleanup(move || child.cancel());
        self.run_producer(subscriber, subscription)
    }

    fn run_producer<S>(&self, subscriber: S, subscription: Subscription) -> Subscription
    where
        S: MaybeSubscriber<T> + 'static,
    {
        let emitter = MaybeEmitter {
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

    pub fn subscribe_with<S, C, E>(&self, on_success: S, on_complete: C, on_error: E) -> Subscription
    where
        S: Fn(T) + Send + Sync + 'static,
        C: Fn() + Send + Sync + 'static,
        E: Fn(FlowError) + Send + Sync + 'static,
    {
        self.subscribe(maybe_callbacks(on_success, on_complete, on_error))
    }

    /// Transform the success value, if any.
    pub fn map<U, F>(&self, f: F) -> Maybe<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let f = Arc::new(f);
        Maybe::create(move |out| {
            let f = Arc::clone(&f);
            upstream.subscribe_bound(
                maybe_callbacks(
                    {
                        let out = out.clone();
                        move |value| match catch_fault(|| f(value)) {
                            Ok(mapped) => out.succeed(mapped),
                            Err(fault) => out.fail(fault),
                        }
                    },
                    {
                        let out = out.clone();
                        move || out.complete()
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

    /// Keep the value only if it satisfies the predicate; otherwise complete
    /// empty.
    pub fn filter<F>(&self, predicate: F) -> Maybe<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let predicate = Arc::new(predicate);
        Maybe::create(move |out| {
            let predicate = Arc::clone(&predicate);
            upstream.subscribe_bound(
                maybe_callbacks(
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
                        move || out.complete()
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

    /// Widen to a [`Single`]: pass the value through, or succeed with
    /// `default` if this `Maybe` completes empty.
    ///
    /// # Examples
    /// ```
    /// use flowrx::{Maybe, TestSubscriber};
    ///
    /// let subscriber = TestSubscriber::new();
    /// Maybe::<i32>::empty()
    ///     .to_single_with_default(7)
    ///     .subscribe(subscriber.clone());
    /// subscriber.assert_values(&[7]);
    /// ```
    pub fn to_single_with_default(&self, default: T) -> Single<T>
    where
        T: Clone + Sync,
    {
        let upstream = self.clone();
        Single::create(move |out| {
            let default = default.clone();
            upstream.subscribe_bound(
                maybe_callbacks(
                    {
                        let out = out.clone();
                        move |value| out.succeed(value)
                    },
                    {
                        let out = out.clone();
                        move || out.succeed(default.clone())
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

/// Producer-facing handle for a [`Maybe`] subscription.
pub struct MaybeEmitter<T> {
    subscriber: Arc<dyn MaybeSubscriber<T>>,
    subscription: Subscription,
}

impl<T> Clone for MaybeEmitter<T> {
    fn clone(&self) -> Self {
        MaybeEmitter {
            subscriber: Arc::clone(&self.subscriber),
            subscription: self.subscription.clone(),
        }
    }
}

impl<T> MaybeEmitter<T> {
    /// Deliver the success value; terminal, so completion is implied.
    pub fn succeed(&self, value: T) {
        if !self.subscription.try_terminate() {
            debug!("maybe: dropping success after termination/cancellation");
            return;
        }
        self.subscriber.on_success(value);
        self.subscription.cancel();
    }

    /// Complete with no value.
    pub fn complete(&self) {
        if !self.subscription.try_terminate() {
            debug!("maybe: dropping completion after termination/cancellation");
            return;
        }
        self.subscriber.on_complete();
        self.subscription.cancel();
    }

    /// Deliver the error terminal signal.
    pub fn fail(&self, error: FlowError) {
        if !self.subscription.try_terminate() {
            debug!("maybe: dropping error after termination/cancellation: {}", error);
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
