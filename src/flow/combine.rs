//! Combination operators: merge, zip_with, start_with, combine_latest

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::catch_fault;
use crate::flow::core::Flow;
use crate::subscriber::callbacks;

struct ZipState<A, B> {
    left: VecDeque<A>,
    right: VecDeque<B>,
    left_done: bool,
    right_done: bool,
}

impl<A, B> ZipState<A, B> {
    // No further pair can ever form once a completed side has an empty queue.
    fn exhausted(&self) -> bool {
        (self.left_done && self.left.is_empty()) || (self.right_done && self.right.is_empty())
    }
}

struct LatestState<A, B> {
    left: Option<A>,
    right: Option<B>,
    remaining: usize,
}

impl<T: Send + 'static> Flow<T> {
    /// Interleave values from both flows in emission order. Completes only
    /// once both have completed; an error from either side fails the whole
    /// stream immediately.
    pub fn merge(&self, other: &Flow<T>) -> Flow<T> {
        let left = self.clone();
        let right = other.clone();
        Flow::create(move |out| {
            let remaining = Arc::new(Mutex::new(2usize));
            let forward = |source: &Flow<T>| {
                let out = out.clone();
                let remaining = Arc::clone(&remaining);
                source.subscribe_bound(
                    callbacks(
                        {
                            let out = out.clone();
                            move |value| out.emit(value)
                        },
                        {
                            let out = out.clone();
                            move || {
                                let all_done = {
                                    let mut left_to_finish =
                                        remaining.lock().unwrap_or_else(|e| e.into_inner());
                                    *left_to_finish -= 1;
                                    *left_to_finish == 0
                                };
                                if all_done {
                                    out.complete();
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
            };
            forward(&left);
            forward(&right);
        })
    }

    /// Pair the i-th value of this flow with the i-th value of `other` and
    /// emit `combine(a, b)`. Terminates as soon as either source does at the
    /// first index where one side is exhausted or faults.
    ///
    /// # Examples
    /// ```
    /// use flowrx::{Flow, TestSubscriber};
    ///
    /// let subscriber = TestSubscriber::new();
    /// Flow::from_iter(vec![1, 2, 3])
    ///     .zip_with(&Flow::from_iter(vec![10, 20, 30]), |a, b| a + b)
    ///     .subscribe(subscriber.clone());
    /// subscriber.assert_values(&[11, 22, 33]);
    /// subscriber.assert_complete();
    /// ```
    pub fn zip_with<U, R, F>(&self, other: &Flow<U>, combine: F) -> Flow<R>
    where
        U: Send + 'static,
        R: Send + 'static,
        F: Fn(T, U) -> R + Send + Sync + 'static,
    {
        let left = self.clone();
        let right = other.clone();
        let combine = Arc::new(combine);
        Flow::create(move |out| {
            let state = Arc::new(Mutex::new(ZipState {
                left: VecDeque::new(),
                right: VecDeque::new(),
                left_done: false,
                right_done: false,
            }));

            left.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let state = Arc::clone(&state);
                        let combine = Arc::clone(&combine);
                        move |value: T| {
                            let pair = {
                                let mut st = state.lock().unwrap_or_else(|e| e.into_inner());
                                match st.right.pop_front() {
                                    Some(b) => Some((value, b)),
                                    None => {
                                        st.left.push_back(value);
                                        None
                                    }
                                }
                            };
                            if let Some((a, b)) = pair {
                                match catch_fault(|| combine(a, b)) {
                                    Ok(result) => out.emit(result),
                                    Err(fault) => {
                                        out.fail(fault);
                                        return;
                                    }
                                }
                            }
                            if state.lock().unwrap_or_else(|e| e.into_inner()).exhausted() {
                                out.complete();
                            }
                        }
                    },
                    {
                        let out = out.clone();
                        let state = Arc::clone(&state);
                        move || {
                            let done = {
                                let mut st = state.lock().unwrap_or_else(|e| e.into_inner());
                                st.left_done = true;
                                st.exhausted()
                            };
                            if done {
                                out.complete();
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

            right.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let state = Arc::clone(&state);
                        let combine = Arc::clone(&combine);
                        move |value: U| {
                            let pair = {
                                let mut st = state.lock().unwrap_or_else(|e| e.into_inner());
                                match st.left.pop_front() {
                                    Some(a) => Some((a, value)),
                                    None => {
                                        st.right.push_back(value);
                                        None
                                    }
                                }
                            };
                            if let Some((a, b)) = pair {
                                match catch_fault(|| combine(a, b)) {
                                    Ok(result) => out.emit(result),
                                    Err(fault) => {
                                        out.fail(fault);
                                        return;
                                    }
                                }
                            }
                            if state.lock().unwrap_or_else(|e| e.into_inner()).exhausted() {
                                out.complete();
                            }
                        }
                    },
                    {
                        let out = out.clone();
                        let state = Arc::clone(&state);
                        move || {
                            let done = {
                                let mut st = state.lock().unwrap_or_else(|e| e.into_inner());
                                st.right_done = true;
                                st.exhausted()
                            };
                            if done {
                                out.complete();
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

    /// Emit `first`, then relay all of this flow's signals unchanged.
    pub fn start_with(&self, first: T) -> Flow<T>
    where
        T: Clone + Sync,
    {
        let upstream = self.clone();
        Flow::create(move |out| {
            out.emit(first.clone());
            if !out.is_active() {
                return;
            }
            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        move |value| out.emit(value)
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

    /// Re-emit `combine(latest left, latest right)` each time either source
    /// produces a new value, once both have emitted at least once. Completes
    /// when both sources have completed.
    pub fn combine_latest<U, R, F>(&self, other: &Flow<U>, combine: F) -> Flow<R>
    where
        T: Clone,
        U: Clone + Send + 'static,
        R: Send + 'static,
        F: Fn(T, U) -> R + Send + Sync + 'static,
    {
        let left = self.clone();
        let right = other.clone();
        let combine = Arc::new(combine);
        Flow::create(move |out| {
            let state = Arc::new(Mutex::new(LatestState::<T, U> {
                left: None,
                right: None,
                remaining: 2,
            }));

            let complete_half = |out: &crate::flow::core::FlowEmitter<R>,
                                 state: &Arc<Mutex<LatestState<T, U>>>| {
                let all_done = {
                    let mut st = state.lock().unwrap_or_else(|e| e.into_inner());
                    st.remaining -= 1;
                    st.remaining == 0
                };
                if all_done {
                    out.complete();
                }
            };

            left.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let state = Arc::clone(&state);
                        let combine = Arc::clone(&combine);
                        move |value: T| {
                            let snapshot = {
                                let mut st = state.lock().unwrap_or_else(|e| e.into_inner());
                                st.left = Some(value);
                                match (&st.left, &st.right) {
                                    (Some(a), Some(b)) => Some((a.clone(), b.clone())),
                                    _ => None,
                                }
                            };
                            if let Some((a, b)) = snapshot {
                                match catch_fault(|| combine(a, b)) {
                                    Ok(result) => out.emit(result),
                                    Err(fault) => out.fail(fault),
                                }
                            }
                        }
                    },
                    {
                        let out = out.clone();
                        let state = Arc::clone(&state);
                        let complete_half = complete_half.clone();
                        move || complete_half(&out, &state)
                    },
                    {
                        let out = out.clone();
                        move |error| out.fail(error)
                    },
                ),
                out.subscription(),
            );

            right.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let state = Arc::clone(&state);
                        let combine = Arc::clone(&combine);
                        move |value: U| {
                            let snapshot = {
                                let mut st = state.lock().unwrap_or_else(|e| e.into_inner());
                                st.right = Some(value);
                                match (&st.left, &st.right) {
                                    (Some(a), Some(b)) => Some((a.clone(), b.clone())),
                                    _ => None,
                                }
                            };
                            if let Some((a, b)) = snapshot {
                                match catch_fault(|| combine(a, b)) {
                                    Ok(result) => out.emit(result),
                                    Err(fault) => out.fail(fault),
                                }
                            }
                        }
                    },
                    {
                        let out = out.clone();
                        let state = Arc::clone(&state);
                        move || complete_half(&out, &state)
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
