//! Race combinator: settle like the first input to settle.
//!
//! The winner is decided by settlement order, not declaration order.
//! Losers are not cancelled when the race is decided; cancelling the
//! combined promise cancels every input still pending.
//!
//! # Algebraic Laws
//!
//! - Commutativity: `race([a, b]) ≃ race([b, a])` when `a` and `b` settle
//!   at different times
//! - Identity: `race([a, never]) ≃ a`
//!
//! An empty race never settles.

use super::{cancellation_of, combined, merged_context, normalize};
use crate::promise::{Consumer, Promise, Resolution};

/// Settles with the outcome of the first input to settle.
///
/// ```
/// use promissory::{race, Promise};
///
/// let never = Promise::<u8>::new(|_| Ok(()));
/// let winner = race([never, Promise::fulfilled(2)]);
/// assert_eq!(winner.outcome(), Some(Ok(2)));
/// ```
pub fn race<T, I, R>(inputs: I) -> Promise<T>
where
    T: Clone + 'static,
    I: IntoIterator<Item = R>,
    R: Into<Resolution<T>>,
{
    let inputs = normalize(inputs);
    let queue = cancellation_of(&inputs);
    combined(queue, merged_context(&inputs), move |resolver| {
        for input in inputs {
            input.done_with(Consumer::settling(&resolver));
        }
        Ok(())
    })
}
