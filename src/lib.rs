//! Promissory: a single-threaded deferred-computation engine.
//!
//! # Overview
//!
//! A [`Promise`] is a placeholder for a value produced later. It settles
//! exactly once, either fulfilled with a value or rejected with a
//! [`Failure`], and every handler registered on it runs once after that,
//! in registration order. Everything runs on the calling thread: there is
//! no executor and no clock. Asynchrony comes from whoever holds a
//! [`Resolver`] and settles it later, typically a timer callback on a
//! [`Scheduler`](time::Scheduler).
//!
//! # Core Guarantees
//!
//! - **Settle once**: the first resolution wins, later ones are ignored
//! - **Ordered handlers**: handlers run in registration order, including
//!   handlers registered after settlement
//! - **Flattening**: resolving with a promise, lazy promise or foreign
//!   [`Thenable`] adopts its eventual state; self-resolution and cycles
//!   reject instead of hanging
//! - **Cooperative cancellation**: a canceller runs at most once, and a
//!   promise shared by several dependents is only cancelled once every
//!   dependent asked
//! - **No silent failures**: a rejection reaching a terminal consumer
//!   without a handler escalates through [`promise::unhandled`]
//!
//! # Module Structure
//!
//! - [`promise`]: the promise state machine, resolvers, lazy promises and
//!   thenable adoption
//! - [`combinator`]: `all`, `map`, `race`, `some`, `any`, `reduce`,
//!   ordered execution and timers
//! - [`cancel`]: the [`Cancellable`] trait and [`CancellationQueue`]
//! - [`shared`]: shared data propagated along a promise chain
//! - [`time`]: the [`Scheduler`](time::Scheduler) contract
//! - [`lab`]: a deterministic virtual scheduler for tests
//! - [`config`]: engine configuration and its loader
//! - [`error`]: failure types
//! - [`types`]: identifiers, virtual time and cancellation reasons
//!
//! # Example
//!
//! ```
//! use promissory::{all, reduce, Promise, Resolution};
//!
//! let values = all([Promise::fulfilled(1), Promise::fulfilled(2)]);
//! assert_eq!(values.outcome(), Some(Ok(vec![1, 2])));
//!
//! let sum = reduce(
//!     [Resolution::value(1), Resolution::value(2), Resolution::value(3)],
//!     |acc: i32, v: i32, _, _| Ok::<_, promissory::Failure>(acc + v),
//!     Resolution::value(0),
//! );
//! assert_eq!(sum.outcome(), Some(Ok(6)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::type_complexity)]

pub mod cancel;
pub mod combinator;
pub mod config;
pub mod error;
pub mod lab;
pub mod promise;
pub mod shared;
pub mod time;
pub mod tracing_compat;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-exports for convenient access to core types
pub use cancel::{Cancellable, CancellationQueue};
pub use combinator::{
    all, all_in_order, any, delay, map, race, reduce, reject_after, some, timeout,
    OrderedExecutionQueue,
};
pub use config::{ConfigError, ConfigLoader, EngineConfig, UnhandledPolicy};
pub use error::{
    AggregateError, Failure, FailureKind, LengthError, Rejection, Result, ResultExt,
    TimeoutError, UnhandledRejection, UserError,
};
pub use promise::{
    reject, reject_lazy, resolve, resolve_lazy, resolve_with_shared, Consumer, LazyPromise,
    Progress, Promise, PromiseBuilder, Reaction, Resolution, Resolver, Thenable,
};
pub use shared::{DataKey, Scenario, SharedData, StoreKind};
pub use time::{Scheduler, TimerHandle};
pub use types::{CancelKind, CancelReason, PanicPayload, PromiseId, PromiseState, Time, TimerId};
