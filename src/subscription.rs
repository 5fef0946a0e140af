//! Subscription handles and cancellation plumbing
//!
//! A `Subscription` is created per subscribe call and shared between the
//! stream side (emitter guards, operator cleanups) and the consumer side
//! (explicit `cancel`). Cancellation is cooperative: it flips a flag that is
//! checked before every delivery and runs the registered cleanup actions,
//! which propagate disposal upstream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type Cleanup = Box<dyn FnOnce() + Send>;

struct SubscriptionState {
    cancelled: AtomicBool,
    terminated: AtomicBool,
    cleanups: Mutex<Vec<Cleanup>>,
}

/// Live, cancellable binding between a stream and a consumer.
///
/// Cloning yields another handle to the same subscription. Reaching a
/// terminal state cancels the subscription automatically, so cleanups run
/// exactly once whether the stream finished on its own or was disposed.
#[derive(Clone)]
pub struct Subscription {
    state: Arc<SubscriptionState>,
}

impl Subscription {
    pub(crate) fn new() -> Self {
        Subscription {
            state: Arc::new(SubscriptionState {
                cancelled: AtomicBool::new(false),
                terminated: AtomicBool::new(false),
                cleanups: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Dispose the subscription. Idempotent; the first call runs all
    /// registered cleanup actions.
    pub fn cancel(&self) {
        if self.state.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let actions: Vec<Cleanup> = {
            let mut cleanups = self
                .state
                .cleanups
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            cleanups.drain(..).collect()
        };
        for action in actions {
            action();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_terminated(&self) -> bool {
        self.state.terminated.load(Ordering::SeqCst)
    }

    /// Still accepting signals: neither cancelled nor past a terminal signal.
    pub fn is_active(&self) -> bool {
        !self.is_cancelled() && !self.is_terminated()
    }

    /// Claim the single terminal slot. Returns true for exactly one caller;
    /// false if the subscription already terminated or was cancelled.
    pub(crate) fn try_terminate(&self) -> bool {
        if self.is_cancelled() {
            return false;
        }
        !self.state.terminated.swap(true, Ordering::SeqCst)
    }

    /// Register an action to run on disposal (stop a timer, release an
    /// upstream subscription). Runs immediately if already disposed.
    pub fn add_cleanup<F>(&self, cleanup: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut cleanups = self
                .state
                .cleanups
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            if !self.is_cancelled() {
                cleanups.push(Box::new(cleanup));
                return;
            }
        }
        cleanup();
    }
}
