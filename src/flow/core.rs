//! Core `Flow` type and emitter plumbing
//!
//! A `Flow` is an immutable value wrapping a producer closure; nothing runs
//! until `subscribe`, and every subscribe call runs the producer again from
//! scratch. The emitter handed to the producer guards every signal with the
//! subscription's terminal/cancellation state, so a misbehaving producer can
//! never deliver past a terminal signal.

use std::sync::Arc;

use log::debug;

use crate::error::{catch_fault, FlowError};
use crate::subscriber::{callbacks, Subscriber};
use crate::subscription::Subscription;

/// Lazy, re-subscribable sequence: zero or more values, then exactly one of
/// completion or error.
///
/// # Examples
/// ```
/// use flowrx::{Flow, TestSubscriber};
///
/// let flow = Flow::from_iter(vec![1, 2, 3]).map(|x| x * 10);
/// let subscriber = TestSubscriber::new();
/// flow.subscribe(subscriber.clone());
/// subscriber.assert_values(&[10, 20, 30]);
/// subscriber.assert_complete();
/// ```
pub struct Flow<T> {
    producer: Arc<dyn Fn(FlowEmitter<T>) + Send + Sync>,
}

impl<T> Clone for Flow<T> {
    fn clone(&self) -> Self {
        Flow {
            producer: Arc::clone(&self.producer),
        }
    }
}

impl<T: Send + 'static> Flow<T> {
    /// Wrap a producer function. The producer runs once per subscribe call
    /// and pushes signals through the emitter it receives.
    ///
    /// # Examples
    /// ```
    /// use flowrx::{Flow, TestSubscriber};
    ///
    /// let flow = Flow::create(|emitter| {
    ///     emitter.emit(1);
    ///     emitter.emit(2);
    ///     emitter.complete();
    /// });
    /// let subscriber = TestSubscriber::new();
    /// flow.subscribe(subscriber.clone());
    /// subscriber.assert_values(&[1, 2]);
    /// ```
    pub fn create<P>(producer: P) -> Self
    where
        P: Fn(FlowEmitter<T>) + Send + Sync + 'static,
    {
        Flow {
            producer: Arc::new(producer),
        }
    }

    /// Run the producer for this subscriber. A panic inside the producer is
    /// converted into an error signal instead of unwinding past subscribe.
    pub fn subscribe<S>(&self, subscriber: S) -> Subscription
    where
        S: Subscriber<T> + 'static,
    {
        self.subscribe_shared(Arc::new(subscriber))
    }

    /// Subscribe with plain closures instead of a [`Subscriber`] value.
    pub fn subscribe_with<N, C, E>(&self, on_next: N, on_complete: C, on_error: E) -> Subscription
    where
        N: Fn(T) + Send + Sync + 'static,
        C: Fn() + Send + Sync + 'static,
        E: Fn(FlowError) + Send + Sync + 'static,
    {
        self.subscribe(callbacks(on_next, on_complete, on_error))
    }

    pub(crate) fn subscribe_shared(&self, subscriber: Arc<dyn Subscriber<T>>) -> Subscription {
        self.run_producer(subscriber, Subscription::new())
    }

    /// Subscribe with this subscription's disposal tied to `parent` before
    /// the producer runs. Operators bind their upstream subscriptions to the
    /// downstream one this way, so cancelling (or terminating) downstream
    /// stops a synchronously emitting upstream producer mid-run instead of
    /// after it returns.
    pub(crate) fn subscribe_bound<S>(&self, subscriber: S, parent: &Subscription) -> Subscription
    where
        S: Subscriber<T> + 'static,
    {
        let subscription = Subscription::new();
        let child = subscription.clone();
        parent.add_cleanup(move || child.cancel());
        self.run_producer(Arc::new(subscriber), subscription)
    }

    fn run_producer(
        &self,
        subscriber: Arc<dyn Subscriber<T>>,
        subscription: Subscription,
    ) -> Subscription {
        let emitter = FlowEmitter {
            subscriber,
            subscription: subscription.clone(),
        };
        let producer = Arc::clone(&self.producer);
        let run_emitter = emitter.clone();
        if let Err(fault) = catch_fault(move || producer(run_emitter)) {
            emitter.fail(fault);
        }
        subscription
    }
}

/// Producer-facing handle pushing signals into one subscription.
///
/// Every method is a no-op once the subscription is cancelled or has seen a
/// terminal signal.
pub struct FlowEmitter<T> {
    subscriber: Arc<dyn Subscriber<T>>,
    subscription: Subscription,
}

impl<T> Clone for FlowEmitter<T> {
    fn clone(&self) -> Self {
        FlowEmitter {
            subscriber: Arc::clone(&self.subscriber),
            subscription: self.subscription.clone(),
        }
    }
}

impl<T> FlowEmitter<T> {
    /// Deliver a value downstream.
    pub fn emit(&self, value: T) {
        if !self.subscription.is_active() {
            debug!("flow: dropping value emitted after termination/cancellation");
            return;
        }
        self.subscriber.on_next(value);
    }

    /// Deliver the completion terminal signal and dispose the subscription.
    pub fn complete(&self) {
        if !self.subscription.try_terminate() {
            debug!("flow: dropping completion after termination/cancellation");
            return;
        }
        self.subscriber.on_complete();
        self.subscription.cancel();
    }

    /// Deliver the error terminal signal and dispose the subscription.
    pub fn fail(&self, error: FlowError) {
        if !self.subscription.try_terminate() {
            debug!("flow: dropping error after termination/cancellation: {}", error);
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

    /// Register a disposal action on this subscription (release an upstream
    /// subscription, stop a timer).
    pub fn on_cancel<F>(&self, cleanup: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.subscription.add_cleanup(cleanup);
    }
}
