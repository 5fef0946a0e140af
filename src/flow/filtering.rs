//! Filtering operators: filter, take, take_last, skip, distinct,
//! distinct_until_changed

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::catch_fault;
use crate::flow::core::Flow;
use crate::subscriber::callbacks;

impl<T: Send + 'static> Flow<T> {
    /// Drop values failing the predicate; terminal signals pass through
    /// unchanged.
    pub fn filter<F>(&self, predicate: F) -> Flow<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let predicate = Arc::new(predicate);
        Flow::create(move |out| {
            let predicate = Arc::clone(&predicate);
            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        move |value| match catch_fault(|| predicate(&value)) {
                            Ok(true) => out.emit(value),
                            Ok(false) => {}
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

    /// Re-emit only the first `n` values, then complete and release the
    /// upstream subscription. `take(0)` completes on subscribe.
    pub fn take(&self, n: usize) -> Flow<T> {
        let upstream = self.clone();
        Flow::create(move |out| {
            if n == 0 {
                out.complete();
                return;
            }
            let seen = Arc::new(AtomicUsize::new(0));
            // Completing at the nth value disposes the downstream
            // subscription, which cancels the bound upstream one mid-run and
            // stops a synchronous producer's iteration.
            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let seen = Arc::clone(&seen);
                        move |value| {
                            let index = seen.fetch_add(1, Ordering::SeqCst);
                            if index < n {
                                out.emit(value);
                                if index + 1 == n {
                                    out.complete();
                                }
                            }
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

    /// Buffer everything and, on completion, re-emit only the last `n`
    /// values in their original order.
    pub fn take_last(&self, n: usize) -> Flow<T> {
        let upstream = self.clone();
        Flow::create(move |out| {
            let tail: Arc<Mutex<VecDeque<T>>> = Arc::new(Mutex::new(VecDeque::new()));
            upstream.subscribe_bound(
                callbacks(
                    {
                        let tail = Arc::clone(&tail);
                        move |value| {
                            if n == 0 {
                                return;
                            }
                            let mut held = tail.lock().unwrap_or_else(|e| e.into_inner());
                            if held.len() == n {
                                held.pop_front();
                            }
                            held.push_back(value);
                        }
                    },
                    {
                        let out = out.clone();
                        let tail = Arc::clone(&tail);
                        move || {
                            let drained: Vec<T> = {
                                let mut held = tail.lock().unwrap_or_else(|e| e.into_inner());
                                held.drain(..).collect()
                            };
                            for value in drained {
                                out.emit(value);
                            }
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

    /// Drop the first `n` values and re-emit the remainder unchanged.
    pub fn skip(&self, n: usize) -> Flow<T> {
        let upstream = self.clone();
        Flow::create(move |out| {
            let seen = Arc::new(AtomicUsize::new(0));
            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let seen = Arc::clone(&seen);
                        move |value| {
                            if seen.fetch_add(1, Ordering::SeqCst) >= n {
                                out.emit(value);
                            }
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
}

impl<T> Flow<T>
where
    T: Eq + Hash + Clone + Send + 'static,
{
    /// Re-emit a value only the first time it is seen across the whole
    /// stream.
    pub fn distinct(&self) -> Flow<T> {
        let upstream = self.clone();
        Flow::create(move |out| {
            let seen: Arc<Mutex<HashSet<T>>> = Arc::new(Mutex::new(HashSet::new()));
            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let seen = Arc::clone(&seen);
                        move |value: T| {
                            let first_time = seen
                                .lock()
                                .unwrap_or_else(|e| e.into_inner())
                                .insert(value.clone());
                            if first_time {
                                out.emit(value);
                            }
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
}

impl<T> Flow<T>
where
    T: PartialEq + Clone + Send + 'static,
{
    /// Re-emit a value only if it differs from the immediately preceding
    /// emitted value; remembers nothing beyond the last one.
    pub fn distinct_until_changed(&self) -> Flow<T> {
        let upstream = self.clone();
        Flow::create(move |out| {
            let last: Arc<Mutex<Option<T>>> = Arc::new(Mutex::new(None));
            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let last = Arc::clone(&last);
                        move |value: T| {
                            let changed = {
                                let mut held = last.lock().unwrap_or_else(|e| e.into_inner());
                                if held.as_ref() == Some(&value) {
                                    false
                                } else {
                                    *held = Some(value.clone());
                                    true
                                }
                            };
                            if changed {
                                out.emit(value);
                            }
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
}
