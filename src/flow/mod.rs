//! `Flow` and its operator library
//!
//! The core type lives in [`core`]; operators are grouped by concern the
//! same way consumers think about them: construction, transformation,
//! filtering, combination, error recovery, time, grouping, aggregation.

pub mod aggregate;
pub mod combine;
pub mod constructors;
pub mod core;
pub mod errors;
pub mod filtering;
pub mod group;
pub mod time;
pub mod transform;

pub use self::core::{Flow, FlowEmitter};
pub use self::group::GroupedFlow;
