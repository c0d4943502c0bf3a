//! Combinators composing many promises into one.
//!
//! - [`all`] / [`map`]: wait for every input, results in input order
//! - [`race`]: settle like the first input to settle
//! - [`some`] / [`any`]: wait for N successes, results keyed by position
//! - [`reduce`]: left fold awaiting each step
//! - [`all_in_order`] / [`OrderedExecutionQueue`]: start inputs one at a
//!   time
//! - [`delay`], [`reject_after`], [`timeout`]: timers on a
//!   [`Scheduler`](crate::time::Scheduler)
//!
//! The parallel combinators normalize every input up front and share one
//! [`CancellationQueue`] holding all of them: cancelling the combined
//! promise cancels each input still pending. Progress of any input is
//! forwarded to the combined promise.
//!
//! Inputs bound to shared-data contexts have those contexts merged into
//! one, which the combined promise (and everything derived from it)
//! carries.

pub mod join;
pub mod ordered;
pub mod quorum;
pub mod race;
pub mod reduce;
pub mod timeout;

pub use join::{all, map};
pub use ordered::{all_in_order, OrderedExecutionQueue};
pub use quorum::{any, quorum_achieved, quorum_still_possible, some};
pub use race::race;
pub use reduce::reduce;
pub use timeout::{delay, reject_after, timeout};

use crate::cancel::CancellationQueue;
use crate::error::Failure;
use crate::promise::{resolve, Promise, Resolution, Resolver};
use crate::shared::SharedData;

/// Normalizes every input into a promise, in input order.
pub(crate) fn normalize<T, I, R>(inputs: I) -> Vec<Promise<T>>
where
    T: Clone + 'static,
    I: IntoIterator<Item = R>,
    R: Into<Resolution<T>>,
{
    inputs.into_iter().map(|input| resolve(input)).collect()
}

/// Builds a cancellation queue over `inputs`.
pub(crate) fn cancellation_of<T: Clone + 'static>(inputs: &[Promise<T>]) -> CancellationQueue {
    let queue = CancellationQueue::new();
    for input in inputs {
        queue.enqueue(input.clone());
    }
    queue
}

/// Folds the contexts of `inputs` into the first one found.
pub(crate) fn merged_context<'a, T: 'a>(
    inputs: impl IntoIterator<Item = &'a Promise<T>>,
) -> Option<SharedData> {
    inputs
        .into_iter()
        .filter_map(Promise::shared_data)
        .reduce(|primary, other| {
            primary.merge(&other);
            primary
        })
}

/// Creates the combined promise: cancelling it invokes `queue`.
pub(crate) fn combined<T, F>(
    queue: CancellationQueue,
    shared: Option<SharedData>,
    start: F,
) -> Promise<T>
where
    T: Clone + 'static,
    F: FnOnce(Resolver<T>) -> Result<(), Failure>,
{
    let builder = Promise::builder().canceller(move |_| {
        queue.invoke();
        Ok(())
    });
    match shared {
        Some(shared) => builder.shared_data(shared),
        None => builder,
    }
    .build(start)
}
