//! Error-recovery operators: on_error_return, on_error_resume_with

use crate::flow::core::Flow;
use crate::subscriber::callbacks;

impl<T: Send + 'static> Flow<T> {
    /// On upstream error, emit `fallback` and complete instead of
    /// propagating the error.
    ///
    /// # Examples
    /// ```
    /// use flowrx::{Flow, FlowError, TestSubscriber};
    ///
    /// let subscriber = TestSubscriber::new();
    /// Flow::error(FlowError::Custom("boom".into()))
    ///     .on_error_return(7)
    ///     .subscribe(subscriber.clone());
    /// subscriber.assert_values(&[7]);
    /// subscriber.assert_complete();
    /// ```
    pub fn on_error_return(&self, fallback: T) -> Flow<T>
    where
        T: Clone + Sync,
    {
        let upstream = self.clone();
        Flow::create(move |out| {
            let fallback = fallback.clone();
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
                        move |_error| {
                            out.emit(fallback.clone());
                            out.complete();
                        }
                    },
                ),
                out.subscription(),
            );
        })
    }

    /// On upstream error, switch to `fallback` and relay its signals instead
    /// of propagating the error.
    pub fn on_error_resume_with(&self, fallback: &Flow<T>) -> Flow<T> {
        let upstream = self.clone();
        let fallback = fallback.clone();
        Flow::create(move |out| {
            let fallback = fallback.clone();
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
                        move |_error| {
                            fallback.subscribe_bound(
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
                        }
                    },
                ),
                out.subscription(),
            );
        })
    }
}
