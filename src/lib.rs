//! flowrx - a push-based reactive stream engine with virtual-time scheduling
//!
//! Streams are cold, immutable descriptions of asynchronous computations in
//! four cardinality variants: [`Flow`] (many values), [`Maybe`] (at most
//! one), [`Single`] (exactly one value or error), and [`Completable`]
//! (completion only). Operators compose lazily; nothing runs until
//! `subscribe`. Every time-based operator takes an injected [`Scheduler`],
//! so tests drive a [`VirtualScheduler`] deterministically instead of
//! waiting on the wall clock.

pub mod completable;
pub mod error;
pub mod flow;
pub mod maybe;
pub mod scheduler;
pub mod single;
pub mod subscriber;
pub mod subscription;
pub mod testing;

// Re-export the public surface at the crate root
pub use completable::{Completable, CompletableEmitter};
pub use error::{FlowError, FlowResult};
pub use flow::{Flow, FlowEmitter, GroupedFlow};
pub use maybe::{Maybe, MaybeEmitter};
pub use scheduler::{
    Scheduler, SchedulerHandle, TaskHandle, ThreadScheduler, VirtualScheduler,
};
pub use single::{Single, SingleEmitter};
pub use subscriber::{CompletableSubscriber, MaybeSubscriber, SingleSubscriber, Subscriber};
pub use subscription::Subscription;
pub use testing::TestSubscriber;
