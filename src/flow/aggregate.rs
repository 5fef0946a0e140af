//! Aggregation operators collapsing a `Flow` into a `Single` or `Maybe`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{catch_fault, FlowError};
use crate::flow::core::Flow;
use crate::maybe::Maybe;
use crate::single::Single;
use crate::subscriber::callbacks;

impl<T: Send + 'static> Flow<T> {
    /// Apply `combine` left-to-right over all values and emit the final
    /// accumulator. An empty upstream fails with
    /// [`FlowError::EmptySequence`].
    ///
    /// # Examples
    /// ```
    /// use flowrx::{Flow, TestSubscriber};
    ///
    /// let subscriber = TestSubscriber::new();
    /// Flow::from_iter(vec![1, 2, 3])
    ///     .reduce(|a, b| a + b)
    ///     .subscribe(subscriber.clone());
    /// subscriber.assert_values(&[6]);
    /// ```
    pub fn reduce<F>(&self, combine: F) -> Single<T>
    where
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let combine = Arc::new(combine);
        Single::create(move |out| {
            let combine = Arc::clone(&combine);
            let accumulator: Arc<Mutex<Option<T>>> = Arc::new(Mutex::new(None));
            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let accumulator = Arc::clone(&accumulator);
                        move |value| {
                            let current = accumulator
                                .lock()
                                .unwrap_or_else(|e| e.into_inner())
                                .take();
                            let next = match current {
                                None => Some(value),
                                Some(acc) => match catch_fault(|| combine(acc, value)) {
                                    Ok(folded) => Some(folded),
                                    Err(fault) => {
                                        out.fail(fault);
                                        None
                                    }
                                },
                            };
                            if let Some(next) = next {
                                *accumulator.lock().unwrap_or_else(|e| e.into_inner()) = Some(next);
                            }
                        }
                    },
                    {
                        let out = out.clone();
                        let accumulator = Arc::clone(&accumulator);
                        move || {
                            match accumulator
                                .lock()
                                .unwrap_or_else(|e| e.into_inner())
                                .take()
                            {
                                Some(total) => out.succeed(total),
                                None => out.fail(FlowError::EmptySequence),
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

    /// Like [`reduce`](Flow::reduce), but an empty upstream completes the
    /// resulting `Maybe` with no value instead of failing.
    pub fn reduce_maybe<F>(&self, combine: F) -> Maybe<T>
    where
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let combine = Arc::new(combine);
        Maybe::create(move |out| {
            let combine = Arc::clone(&combine);
            let accumulator: Arc<Mutex<Option<T>>> = Arc::new(Mutex::new(None));
            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let accumulator = Arc::clone(&accumulator);
                        move |value| {
                            let current = accumulator
                                .lock()
                                .unwrap_or_else(|e| e.into_inner())
                                .take();
                            let next = match current {
                                None => Some(value),
                                Some(acc) => match catch_fault(|| combine(acc, value)) {
                                    Ok(folded) => Some(folded),
                                    Err(fault) => {
                                        out.fail(fault);
                                        None
                                    }
                                },
                            };
                            if let Some(next) = next {
                                *accumulator.lock().unwrap_or_else(|e| e.into_inner()) = Some(next);
                            }
                        }
                    },
                    {
                        let out = out.clone();
                        let accumulator = Arc::clone(&accumulator);
                        move || {
                            match accumulator
                                .lock()
                                .unwrap_or_else(|e| e.into_inner())
                                .take()
                            {
                                Some(total) => out.succeed(total),
                                None => out.complete(),
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

    /// Fold all values onto `seed` left-to-right; an empty upstream succeeds
    /// with the seed itself.
    pub fn fold<A, F>(&self, seed: A, combine: F) -> Single<A>
    where
        A: Clone + Send + Sync + 'static,
        F: Fn(A, T) -> A + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let combine = Arc::new(combine);
        Single::create(move |out| {
            let combine = Arc::clone(&combine);
            let accumulator: Arc<Mutex<Option<A>>> = Arc::new(Mutex::new(Some(seed.clone())));
            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let accumulator = Arc::clone(&accumulator);
                        move |value| {
                            let current = accumulator
                                .lock()
                                .unwrap_or_else(|e| e.into_inner())
                                .take();
                            if let Some(acc) = current {
                                match catch_fault(|| combine(acc, value)) {
                                    Ok(folded) => {
                                        *accumulator.lock().unwrap_or_else(|e| e.into_inner()) =
                                            Some(folded);
                                    }
                                    Err(fault) => out.fail(fault),
                                }
                            }
                        }
                    },
                    {
                        let out = out.clone();
                        let accumulator = Arc::clone(&accumulator);
                        move || {
                            if let Some(total) = accumulator
                                .lock()
                                .unwrap_or_else(|e| e.into_inner())
                                .take()
                            {
                                out.succeed(total);
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

    /// Accumulate every value into an ordered `Vec`, emitted once on
    /// completion.
    pub fn collect_list(&self) -> Single<Vec<T>> {
        let upstream = self.clone();
        Single::create(move |out| {
            let collected: Arc<Mutex<Vec<T>>> = Arc::new(Mutex::new(Vec::new()));
            upstream.subscribe_bound(
                callbacks(
                    {
                        let collected = Arc::clone(&collected);
                        move |value| {
                            collected
                                .lock()
                                .unwrap_or_else(|e| e.into_inner())
                                .push(value);
                        }
                    },
                    {
                        let out = out.clone();
                        let collected = Arc::clone(&collected);
                        move || {
                            let values = {
                                let mut held = collected.lock().unwrap_or_else(|e| e.into_inner());
                                std::mem::take(&mut *held)
                            };
                            out.succeed(values);
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

    /// Emit the value at index `n`, or fail with [`FlowError::NotFound`] if
    /// the upstream completes with fewer than `n + 1` values.
    pub fn element_at(&self, n: usize) -> Single<T> {
        let upstream = self.clone();
        Single::create(move |out| {
            let seen = Arc::new(AtomicUsize::new(0));
            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        let seen = Arc::clone(&seen);
                        move |value| {
                            if seen.fetch_add(1, Ordering::SeqCst) == n {
                                out.succeed(value);
                            }
                        }
                    },
                    {
                        let out = out.clone();
                        move || out.fail(FlowError::NotFound)
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

    /// First value of the sequence, or [`FlowError::NotFound`] if it is
    /// empty.
    pub fn first_or_error(&self) -> Single<T> {
        self.element_at(0)
    }

    /// True if every value satisfies the predicate; short-circuits to false
    /// on the first counterexample. An empty upstream yields true.
    pub fn all<F>(&self, predicate: F) -> Single<bool>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let predicate = Arc::new(predicate);
        Single::create(move |out| {
            let predicate = Arc::clone(&predicate);
            upstream.subscribe_bound(
                callbacks(
                    {
                        let out = out.clone();
                        move |value| match catch_fault(|| predicate(&value)) {
                            Ok(true) => {}
                            Ok(false) => out.succeed(false),
                            Err(fault) => out.fail(fault),
                        }
                    },
                    {
                        let out = out.clone();
                        move || out.succeed(true)
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
