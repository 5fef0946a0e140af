//! Transformation operators: map, flat_map, buffer

use std::sync::{Arc, Mutex};

use crate::error::catch_fault;
use crate::flow::core::Flow;
use crate::subscriber::callbacks;

struct FlatMapState {
    active_inner: usize,
    upstream_done: bool,
}

impl<T: Send + 'static> Flow<T> {
    /// Transform each value, preserving order and the terminal signal.
    ///
    /// # Examples
    /// ```
    /// use flowrx::{Flow, TestSubscriber};
    ///
    /// let subscriber = TestSubscriber::new();
    /// Flow::from_iter(vec![1, 2, 3])
    ///     .map(|x| x.to_string())
    ///     .subscribe(subscriber.clone());
    /// subscriber.assert_values(&["1".to_string(), "2".to_string(), "3".to_string()]);
    /// ```
    pub fn map<U, F>(&self, f: F) -> Flow<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let f = Arc::new(f);
        Flow::create(move |out| {
            let f = Arc::clone(&f);
            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        move |value| match catch_fault(|| f(value)) {
                            Ok(mapped) => out.emit(mapped),
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

    /// Map each value to an inner flow and merge all inner emissions into
    /// the output in the order the inner flows produce them (completion
    /// order, not upstream order). Completes once the upstream and every
    /// inner flow have completed; any error fails the output immediately.
    pub fn flat_map<U, F>(&self, f: F) -> Flow<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Flow<U> + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let f = Arc::new(f);
        Flow::create(move |out| {
            let f = Arc::clone(&f);
            let state = Arc::new(Mutex::new(FlatMapState {
                active_inner: 0,
                upstream_done: false,
            }));

            // Upstream and every inner flow are bound to the downstream
            // subscription, so one disposal reaches all of them.
            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let state = Arc::clone(&state);
                        move |value| {
                            let inner = match catch_fault(|| f(value)) {
                                Ok(inner) => inner,
                                Err(fault) => {
                                    out.fail(fault);
                                    return;
                                }
                            };
                            state.lock().unwrap_or_else(|e| e.into_inner()).active_inner += 1;
                            inner.subscribe_bound(
                                callbacks(
                                    {
                                        let out = out.clone();
                                        move |inner_value| out.emit(inner_value)
                                    },
                                    {
                                        let out = out.clone();
                                        let state = Arc::clone(&state);
                                        move || {
                                            let all_done = {
                                                let mut st = state
                                                    .lock()
                                                    .unwrap_or_else(|e| e.into_inner());
                                                st.active_inner -= 1;
                                                st.upstream_done && st.active_inner == 0
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
                        }
                    },
                    {
                        let out = out.clone();
                        let state = Arc::clone(&state);
                        move || {
                            let all_done = {
                                let mut st = state.lock().unwrap_or_else(|e| e.into_inner());
                                st.upstream_done = true;
                                st.active_inner == 0
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
        })
    }

    /// Collect values into fixed-size ordered groups, emitting each group as
    /// soon as it fills; a non-empty remainder is emitted as a final,
    /// possibly undersized group on completion.
    ///
    /// `size` must be greater than zero.
    pub fn buffer(&self, size: usize) -> Flow<Vec<T>> {
        assert!(size > 0, "buffer size must be greater than zero");
        let upstream = self.clone();
        Flow::create(move |out| {
            let pending: Arc<Mutex<Vec<T>>> = Arc::new(Mutex::new(Vec::new()));
            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let pending = Arc::clone(&pending);
                        move |value| {
                            let full = {
                                let mut buf = pending.lock().unwrap_or_else(|e| e.into_inner());
                                buf.push(value);
                                if buf.len() == size {
                                    Some(std::mem::take(&mut *buf))
                                } else {
                                    None
                                }
                            };
                            if let Some(group) = full {
                                out.emit(group);
                            }
                        }
                    },
                    {
                        let out = out.clone();
                        let pending = Arc::clone(&pending);
                        move || {
                            let remainder = {
                                let mut buf = pending.lock().unwrap_or_else(|e| e.into_inner());
                                std::mem::take(&mut *buf)
                            };
                            if !remainder.is_empty() {
                                out.emit(remainder);
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
}
