//! Left fold over promises.

use std::rc::Rc;

use super::{cancellation_of, combined, merged_context, normalize};
use crate::promise::{resolve, Consumer, Promise, Resolution};

/// Folds the inputs left to right.
///
/// Each step waits for the previous accumulator and for the next input,
/// then calls `reducer(accumulator, value, index, total)`. The reducer may
/// return a promise. Inputs and `initial` are started up front; only the
/// combination is sequential. The first failure rejects the fold.
///
/// ```
/// use promissory::{reduce, Promise, Resolution};
///
/// let sum = reduce(
///     [Promise::fulfilled(1), Promise::fulfilled(2), Promise::fulfilled(3)],
///     |acc: i32, v: i32, _, _| Ok::<_, promissory::Failure>(acc + v),
///     Resolution::value(10),
/// );
/// assert_eq!(sum.outcome(), Some(Ok(16)));
/// ```
pub fn reduce<T, A, I, R, F, S>(inputs: I, reducer: F, initial: impl Into<Resolution<A>>) -> Promise<A>
where
    T: Clone + 'static,
    A: Clone + 'static,
    I: IntoIterator<Item = R>,
    R: Into<Resolution<T>>,
    F: Fn(A, T, usize, usize) -> S + 'static,
    S: Into<Resolution<A>>,
{
    let items = normalize(inputs);
    let initial = resolve(initial);
    let queue = cancellation_of(&items);
    queue.enqueue(initial.clone());
    let total = items.len();
    let reducer = Rc::new(reducer);

    let shared = match (merged_context(&items), initial.shared_data()) {
        (Some(primary), Some(other)) => {
            primary.merge(&other);
            Some(primary)
        }
        (primary, other) => primary.or(other),
    };
    combined(queue, shared, move |resolver| {
        let mut accumulator = initial;
        for (index, item) in items.into_iter().enumerate() {
            let reducer = Rc::clone(&reducer);
            accumulator = accumulator.and_then::<A, _, _>(move |current| {
                item.and_then::<A, _, _>(move |value| (*reducer)(current, value, index, total))
            });
        }
        accumulator.done_with(Consumer::settling(&resolver));
        Ok(())
    })
}
