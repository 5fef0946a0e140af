//! `Completable`: no values, just a success/error terminal outcome

use std::sync::Arc;

use log::debug;

use crate::error::{catch_fault, FlowError};
use crate::subscriber::{completable_callbacks, CompletableSubscriber};
use crate::subscription::Subscription;

/// Lazy, re-subscribable computation with no values; it either completes or
/// errors.
#[derive(Clone)]
pub struct Completable {
    producer: Arc<dyn Fn(CompletableEmitter) + Send + Sync>,
}

impl Completable {
    pub fn create<P>(producer: P) -> Self
    where
        P: Fn(CompletableEmitter) + Send + Sync + 'static,
    {
        Completable {
            producer: Arc::new(producer),
        }
    }

    /// Complete immediately.
    pub fn complete() -> Self {
        Completable::create(|emitter| emitter.complete())
    }

    /// Fail immediately with `error`.
    pub fn error(error: FlowError) -> Self {
        Completable::create(move |emitter| emitter.fail(error.clone()))
    }

    /// Wrap a zero-argument side-effecting action: runs on subscribe and
    /// completes, or fails if the action panics.
    ///
    /// # Examples
    /// ```
    /// use std::sync::atomic::{AtomicBool, Ordering};
    /// use std::sync::Arc;
    /// use flowrx::{Completable, TestSubscriber};
    ///
    /// let ran = Arc::new(AtomicBool::new(false));
    /// let flag = Arc::clone(&ran);
    /// let subscriber = TestSubscriber::<()>::new();
    /// Completable::from_action(move || flag.store(true, Ordering::SeqCst))
    ///     .subscribe(subscriber.clone());
    /// assert!(ran.load(Ordering::SeqCst));
    /// subscriber.assert_complete();
    /// ```
    pub fn from_action<F>(action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Completable::create(move |emitter| match catch_fault(&action) {
            Ok(()) => emitter.complete(),
            Err(fault) => emitter.fail(fault),
        })
    }

    pub fn subscribe<S>(&self, subscriber: S) -> Subscription
    where
        S: CompletableSubscriber + 'static,
    {
        self.run_producer(subscriber, Subscription::new())
    }

    /// Subscribe with disposal tied to `parent` before the producer runs.
    pub(crate) fn subscribe_bound<S>(&self, subscriber: S, parent: &Subscription) -> Subscription
    where
        S: CompletableSubscriber + 'static,
    {
        let subscription = Subscription::new();
        let child = subscription.clone();
        parent.add_cleanup(move || child.cancel());
        self.run_producer(subscriber, subscription)
    }

    fn run_producer<S>(&self, subscriber: S, subscription: Subscription) -> Subscription
    where
        S: CompletableSubscriber + 'static,
    {
        let emitter = CompletableEmitter {
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

    pub fn subscribe_with<C, E>(&self, on_complete: C, on_error: E) -> Subscription
    where
        C: Fn() + Send + Sync + 'static,
        E: Fn(FlowError) + Send + Sync + 'static,
    {
        self.subscribe(completable_callbacks(on_complete, on_error))
    }

    /// Run `next` after this completable completes; errors short-circuit.
    pub fn and_then(&self, next: &Completable) -> Completable {
        let upstream = self.clone();
        let next = next.clone();
        Completable::create(move |out| {
            let next = next.clone();
            upstream.subscribe_bound(
                completable_callbacks(
                    {
                        let out = out.clone();
                        move || {
                            next.subscribe_bound(
                                completable_callbacks(
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

/// Producer-facing handle for a [`Completable`] subscription.
#[derive(Clone)]
pub struct CompletableEmitter {
    subscriber: Arc<dyn CompletableSubscriber>,
    subscription: Subscription,
}

impl CompletableEmitter {
    /// Deliver the completion terminal signal.
    pub fn complete(&self) {
        if !self.subscription.try_terminate() {
            debug!("completable: dropping completion after termination/cancellation");
            return;
        }
        self.subscriber.on_complete();
        self.subscription.cancel();
    }

    /// Deliver the error terminal signal.
    pub fn fail(&self, error: FlowError) {
        if !self.subscription.try_terminate() {
            debug!(
                "completable: dropping error after termination/cancellation: {}",
                error
            );
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
