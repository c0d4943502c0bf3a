//! Wait-for-all combinators.
//!
//! [`map`] transforms every input and fulfills with the transformed values
//! in input order, index for index, no matter in which order the inputs
//! settle. The first failure, from an input or from the transform, rejects
//! the combined promise. [`all`] is `map` with the identity transform.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{cancellation_of, combined, merged_context, normalize};
use crate::promise::{Consumer, Promise, Resolution};
use crate::tracing_compat::debug;

/// Fulfills with every input's value in input order.
///
/// An empty input fulfills with an empty vector.
///
/// ```
/// use promissory::{all, Promise, Resolution};
///
/// let combined = all([Resolution::value(1), Promise::fulfilled(2).into()]);
/// assert_eq!(combined.outcome(), Some(Ok(vec![1, 2])));
/// ```
pub fn all<T, I, R>(inputs: I) -> Promise<Vec<T>>
where
    T: Clone + 'static,
    I: IntoIterator<Item = R>,
    R: Into<Resolution<T>>,
{
    map(inputs, Resolution::value)
}

/// Applies `transform` to every input's value and fulfills with the
/// results in input order.
///
/// The transform may return a promise; its settlement is awaited.
pub fn map<T, U, I, R, F, S>(inputs: I, transform: F) -> Promise<Vec<U>>
where
    T: Clone + 'static,
    U: Clone + 'static,
    I: IntoIterator<Item = R>,
    R: Into<Resolution<T>>,
    F: Fn(T) -> S + 'static,
    S: Into<Resolution<U>>,
{
    let inputs = normalize(inputs);
    let queue = cancellation_of(&inputs);
    let total = inputs.len();
    let transform = Rc::new(transform);

    combined(queue, merged_context(&inputs), move |resolver| {
        if total == 0 {
            resolver.fulfill(Vec::new());
            return Ok(());
        }
        let slots: Rc<RefCell<Vec<Option<U>>>> = Rc::new(RefCell::new(vec![None; total]));
        let remaining = Rc::new(Cell::new(total));

        for (index, input) in inputs.into_iter().enumerate() {
            let transform = Rc::clone(&transform);
            let slots = Rc::clone(&slots);
            let remaining = Rc::clone(&remaining);
            let on_value = resolver.clone();
            let on_failure = resolver.clone();
            let on_update = resolver.clone();

            input
                .and_then::<U, _, _>(move |value| (*transform)(value))
                .done_with(
                    Consumer::new()
                        .fulfilled(move |mapped| {
                            slots.borrow_mut()[index] = Some(mapped);
                            remaining.set(remaining.get() - 1);
                            if remaining.get() == 0 {
                                let values: Vec<U> = slots.borrow_mut().drain(..).flatten().collect();
                                debug!(total = values.len(), "all inputs fulfilled");
                                on_value.fulfill(values);
                            }
                        })
                        .rejected(move |failure| on_failure.reject(failure))
                        .progress(move |update| on_update.notify(update)),
                );
        }
        Ok(())
    })
}
