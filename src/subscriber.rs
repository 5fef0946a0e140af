//! Consumer traits for the four stream variants
//!
//! Methods take `&self` so one subscriber instance can be shared by the
//! emitter and by operator plumbing; recording or stateful subscribers use
//! interior mutability.

use crate::error::FlowError;

/// Consumer of a [`Flow`](crate::Flow): zero or more values, then exactly one
/// of completion or error.
pub trait Subscriber<T>: Send + Sync {
    fn on_next(&self, value: T);
    fn on_complete(&self);
    fn on_error(&self, error: FlowError);
}

/// Consumer of a [`Single`](crate::Single): exactly one value or an error.
pub trait SingleSubscriber<T>: Send + Sync {
    fn on_success(&self, value: T);
    fn on_error(&self, error: FlowError);
}

/// Consumer of a [`Maybe`](crate::Maybe): a value (terminal), empty
/// completion, or an error.
pub trait MaybeSubscriber<T>: Send + Sync {
    fn on_success(&self, value: T);
    fn on_complete(&self);
    fn on_error(&self, error: FlowError);
}

/// Consumer of a [`Completable`](crate::Completable): completion or error.
pub trait CompletableSubscriber: Send + Sync {
    fn on_complete(&self);
    fn on_error(&self, error: FlowError);
}

// ================================
// Closure-backed subscribers
// ================================
//
// Operators forward signals through closures; these adapters are what
// `subscribe_with` hands to `subscribe` on each variant.

pub(crate) struct CallbackSubscriber<T> {
    next: Box<dyn Fn(T) + Send + Sync>,
    complete: Box<dyn Fn() + Send + Sync>,
    error: Box<dyn Fn(FlowError) + Send + Sync>,
}

impl<T> Subscriber<T> for CallbackSubscriber<T> {
    fn on_next(&self, value: T) {
        (self.next)(value);
    }

    fn on_complete(&self) {
        (self.complete)();
    }

    fn on_error(&self, error: FlowError) {
        (self.error)(error);
    }
}

pub(crate) fn callbacks<T, N, C, E>(next: N, complete: C, error: E) -> CallbackSubscriber<T>
where
    N: Fn(T) + Send + Sync + 'static,
    C: Fn() + Send + Sync + 'static,
    E: Fn(FlowError) + Send + Sync + 'static,
{
    CallbackSubscriber {
        next: Box::new(next),
        complete: Box::new(complete),
        error: Box::new(error),
    }
}

pub(crate) struct CallbackSingleSubscriber<T> {
    success: Box<dyn Fn(T) + Send + Sync>,
    error: Box<dyn Fn(FlowError) + Send + Sync>,
}

impl<T> SingleSubscriber<T> for CallbackSingleSubscriber<T> {
    fn on_success(&self, value: T) {
        (self.success)(value);
    }

    fn on_error(&self, error: FlowError) {
        (self.error)(error);
    }
}

pub(crate) fn single_callbacks<T, S, E>(success: S, error: E) -> CallbackSingleSubscriber<T>
where
    S: Fn(T) + Send + Sync + 'static,
    E: Fn(FlowError) + Send + Sync + 'static,
{
    CallbackSingleSubscriber {
        success: Box::new(success),
        error: Box::new(error),
    }
}

pub(crate) struct CallbackMaybeSubscriber<T> {
    success: Box<dyn Fn(T) + Send + Sync>,
    complete: Box<dyn Fn() + Send + Sync>,
    error: Box<dyn Fn(FlowError) + Send + Sync>,
}

impl<T> MaybeSubscriber<T> for CallbackMaybeSubscriber<T> {
    fn on_success(&self, value: T) {
        (self.success)(value);
    }

    fn on_complete(&self) {
        (self.complete)();
    }

    fn on_error(&self, error: FlowError) {
        (self.error)(error);
    }
}

pub(crate) fn maybe_callbacks<T, S, C, E>(
    success: S,
    complete: C,
    error: E,
) -> CallbackMaybeSubscriber<T>
where
    S: Fn(T) + Send + Sync + 'static,
    C: Fn() + Send + Sync + 'static,
    E: Fn(FlowError) + Send + Sync + 'static,
{
    CallbackMaybeSubscriber {
        success: Box::new(success),
        complete: Box::new(complete),
        error: Box::new(error),
    }
}

pub(crate) struct CallbackCompletableSubscriber {
    complete: Box<dyn Fn() + Send + Sync>,
    error: Box<dyn Fn(FlowError) + Send + Sync>,
}

impl CompletableSubscriber for CallbackCompletableSubscriber {
    fn on_complete(&self) {
        (self.complete)();
    }

    fn on_error(&self, error: FlowError) {
        (self.error)(error);
    }
}

pub(crate) fn completable_callbacks<C, E>(complete: C, error: E) -> CallbackCompletableSubscriber
where
    C: Fn() + Send + Sync + 'static,
    E: Fn(FlowError) + Send + Sync + 'static,
{
    CallbackCompletableSubscriber {
        complete: Box::new(complete),
        error: Box::new(error),
    }
}
