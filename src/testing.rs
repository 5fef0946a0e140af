//! Recording subscriber for assertions in tests
//!
//! `TestSubscriber` implements the subscriber traits of all four stream
//! variants, capturing every value and the terminal signal. Clones share the
//! same recording, so keep a clone after handing one to `subscribe`.

use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::FlowError;
use crate::subscriber::{CompletableSubscriber, MaybeSubscriber, SingleSubscriber, Subscriber};

struct Recording<T> {
    values: Vec<T>,
    completed: bool,
    error: Option<FlowError>,
}

/// Test double that records emitted values and the terminal signal.
///
/// # Examples
/// ```
/// use flowrx::{Flow, TestSubscriber};
///
/// let subscriber = TestSubscriber::new();
/// Flow::from_iter(vec![1, 2]).subscribe(subscriber.clone());
/// assert_eq!(subscriber.values(), vec![1, 2]);
/// assert!(subscriber.is_complete());
/// ```
pub struct TestSubscriber<T> {
    recording: Arc<Mutex<Recording<T>>>,
}

impl<T> Clone for TestSubscriber<T> {
    fn clone(&self) -> Self {
        TestSubscriber {
            recording: Arc::clone(&self.recording),
        }
    }
}

impl<T> Default for TestSubscriber<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TestSubscriber<T> {
    pub fn new() -> Self {
        TestSubscriber {
            recording: Arc::new(Mutex::new(Recording {
                values: Vec::new(),
                completed: false,
                error: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Recording<T>> {
        self.recording.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn values(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.lock().values.clone()
    }

    pub fn value_count(&self) -> usize {
        self.lock().values.len()
    }

    pub fn is_complete(&self) -> bool {
        self.lock().completed
    }

    pub fn error(&self) -> Option<FlowError> {
        self.lock().error.clone()
    }

    /// Terminal signal of either kind has been recorded.
    pub fn is_terminated(&self) -> bool {
        let recording = self.lock();
        recording.completed || recording.error.is_some()
    }

    pub fn assert_values(&self, expected: &[T])
    where
        T: PartialEq + Debug,
    {
        let recording = self.lock();
        assert_eq!(
            recording.values, expected,
            "recorded values do not match expectation"
        );
    }

    pub fn assert_no_values(&self) {
        let count = self.value_count();
        assert_eq!(count, 0, "expected no values, recorded {}", count);
    }

    pub fn assert_complete(&self) {
        let recording = self.lock();
        assert!(
            recording.completed,
            "expected completion; error = {:?}",
            recording.error
        );
    }

    pub fn assert_not_complete(&self) {
        assert!(!self.is_complete(), "expected no completion signal");
    }

    pub fn assert_not_terminated(&self) {
        let recording = self.lock();
        assert!(
            !recording.completed && recording.error.is_none(),
            "expected no terminal signal; completed = {}, error = {:?}",
            recording.completed,
            recording.error
        );
    }

    pub fn assert_error(&self, expected: FlowError) {
        let recording = self.lock();
        assert_eq!(
            recording.error.as_ref(),
            Some(&expected),
            "recorded terminal error does not match expectation"
        );
    }

    pub fn assert_no_error(&self) {
        let recording = self.lock();
        assert!(
            recording.error.is_none(),
            "expected no error, recorded {:?}",
            recording.error
        );
    }

    fn record_value(&self, value: T) {
        self.lock().values.push(value);
    }

    fn record_complete(&self) {
        self.lock().completed = true;
    }

    fn record_error(&self, error: FlowError) {
        self.lock().error = Some(error);
    }
}

impl<T: Send> Subscriber<T> for TestSubscriber<T> {
    fn on_next(&self, value: T) {
        self.record_value(value);
    }

    fn on_complete(&self) {
        self.record_complete();
    }

    fn on_error(&self, error: FlowError) {
        self.record_error(error);
    }
}

impl<T: Send> SingleSubscriber<T> for TestSubscriber<T> {
    // A success value terminates a Single, so it is recorded as both the
    // value and the completion.
    fn on_success(&self, value: T) {
        self.record_value(value);
        self.record_complete();
    }

    fn on_error(&self, error: FlowError) {
        self.record_error(error);
    }
}

impl<T: Send> MaybeSubscriber<T> for TestSubscriber<T> {
    fn on_success(&self, value: T) {
        self.record_value(value);
        self.record_complete();
    }

    fn on_complete(&self) {
        self.record_complete();
    }

    fn on_error(&self, error: FlowError) {
        self.record_error(error);
    }
}

impl CompletableSubscriber for TestSubscriber<()> {
    fn on_complete(&self) {
        self.record_complete();
    }

    fn on_error(&self, error: FlowError) {
        self.record_error(error);
    }
}
