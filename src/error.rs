//! Error types and fault capture for flowrx
//!
//! Every fault in the engine surfaces as the error terminal signal of the
//! subscription it belongs to; nothing crosses the subscribe boundary as a
//! panic.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use thiserror::Error;

/// Main error type delivered through `on_error`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// No value arrived within the configured timeout window
    #[error("operation timed out")]
    Timeout,
    /// An aggregation was applied to a sequence that emitted nothing
    #[error("sequence contains no elements")]
    EmptySequence,
    /// The sequence completed before reaching the requested index
    #[error("no element at the requested index")]
    NotFound,
    /// A required condition resolved to false
    #[error("condition not met")]
    ConditionNotMet,
    /// A producer or user-supplied callback panicked
    #[error("producer fault: {0}")]
    Fault(String),
    /// Custom error with message
    #[error("stream error: {0}")]
    Custom(String),
}

/// Result type for flowrx operations
pub type FlowResult<T> = Result<T, FlowError>;

/// Run a producer or user callback, converting a panic into a `Fault`.
///
/// Callbacks are invoked at exactly one point per signal, so unwind safety
/// reduces to the shared engine state staying consistent: all of it lives
/// behind mutexes or atomics and is re-checked before every delivery.
pub(crate) fn catch_fault<R>(f: impl FnOnce() -> R) -> FlowResult<R> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| FlowError::Fault(panic_message(payload)))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "callback panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catch_fault_passes_through_success() {
        assert_eq!(catch_fault(|| 21 * 2), Ok(42));
    }

    #[test]
    fn catch_fault_captures_panic_message() {
        let result: FlowResult<()> = catch_fault(|| panic!("boom"));
        assert_eq!(result, Err(FlowError::Fault("boom".to_string())));
    }
}
