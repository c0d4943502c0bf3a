//! Wait-for-N combinators.
//!
//! [`some`] fulfills once `required` inputs have fulfilled, with their
//! values keyed by input position. It rejects as soon as reaching
//! `required` successes has become impossible, carrying every failure
//! collected so far in an [`AggregateError`].
//!
//! # Edge Cases
//!
//! - `some(inputs, 0)`: fulfills with an empty map without touching inputs
//! - `some(inputs, n)` with `n == len`: succeeds only if every input does
//! - `some(inputs, n)` with `n > len`: [`LengthError`], raised synchronously

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::{cancellation_of, combined, merged_context, normalize};
use crate::error::{AggregateError, Failure, LengthError};
use crate::promise::{Consumer, Promise, Resolution};
use crate::tracing_compat::debug;

/// Checks if a quorum can still be reached.
///
/// # Example
/// ```
/// use promissory::combinator::quorum_still_possible;
///
/// // 2-of-3 with 2 failures: only 1 input left, quorum impossible
/// assert!(!quorum_still_possible(2, 3, 0, 2));
/// ```
#[must_use]
pub const fn quorum_still_possible(
    required: usize,
    total: usize,
    successes: usize,
    failures: usize,
) -> bool {
    let remaining = total.saturating_sub(successes).saturating_sub(failures);
    successes + remaining >= required
}

/// Checks if a quorum has been achieved.
#[must_use]
pub const fn quorum_achieved(required: usize, successes: usize) -> bool {
    successes >= required
}

struct Tally<T> {
    values: BTreeMap<usize, T>,
    reasons: BTreeMap<usize, Failure>,
    decided: bool,
}

/// Fulfills once `required` inputs fulfill.
///
/// # Errors
///
/// Returns [`LengthError`] if `required` exceeds the number of inputs.
pub fn some<T, I, R>(inputs: I, required: usize) -> Result<Promise<BTreeMap<usize, T>>, LengthError>
where
    T: Clone + 'static,
    I: IntoIterator<Item = R>,
    R: Into<Resolution<T>>,
{
    let resolutions: Vec<Resolution<T>> = inputs.into_iter().map(Into::into).collect();
    if required == 0 {
        return Ok(Promise::fulfilled(BTreeMap::new()));
    }
    let total = resolutions.len();
    if total < required {
        return Err(LengthError::new(required, total));
    }

    let inputs = normalize(resolutions);
    let queue = cancellation_of(&inputs);
    Ok(combined(queue, merged_context(&inputs), move |resolver| {
        let tally = Rc::new(RefCell::new(Tally {
            values: BTreeMap::new(),
            reasons: BTreeMap::new(),
            decided: false,
        }));

        for (index, input) in inputs.into_iter().enumerate() {
            let on_value = Rc::clone(&tally);
            let on_failure = Rc::clone(&tally);
            let fulfill = resolver.clone();
            let reject = resolver.clone();
            let notify = resolver.clone();

            input.done_with(
                Consumer::new()
                    .fulfilled(move |value| {
                        let reached = {
                            let mut tally = on_value.borrow_mut();
                            if tally.decided {
                                return;
                            }
                            tally.values.insert(index, value);
                            if quorum_achieved(required, tally.values.len()) {
                                tally.decided = true;
                                Some(std::mem::take(&mut tally.values))
                            } else {
                                None
                            }
                        };
                        if let Some(values) = reached {
                            debug!(required = required, total = total, "quorum reached");
                            fulfill.fulfill(values);
                        }
                    })
                    .rejected(move |failure| {
                        let lost = {
                            let mut tally = on_failure.borrow_mut();
                            if tally.decided {
                                return;
                            }
                            tally.reasons.insert(index, failure);
                            let possible = quorum_still_possible(
                                required,
                                total,
                                tally.values.len(),
                                tally.reasons.len(),
                            );
                            if possible {
                                None
                            } else {
                                tally.decided = true;
                                Some(std::mem::take(&mut tally.reasons))
                            }
                        };
                        if let Some(reasons) = lost {
                            debug!(required = required, total = total, "quorum unreachable");
                            reject.reject(AggregateError {
                                required,
                                total,
                                reasons,
                            });
                        }
                    })
                    .progress(move |update| notify.notify(update)),
            );
        }
        Ok(())
    }))
}

/// Fulfills with the first input to fulfill.
///
/// Rejects with an [`AggregateError`] once every input has rejected.
///
/// # Errors
///
/// Returns [`LengthError`] for an empty input.
pub fn any<T, I, R>(inputs: I) -> Result<Promise<T>, LengthError>
where
    T: Clone + 'static,
    I: IntoIterator<Item = R>,
    R: Into<Resolution<T>>,
{
    let first = some(inputs, 1)?;
    Ok(first.then(|values| {
        values
            .into_values()
            .next()
            .ok_or_else(|| Failure::internal("quorum of one fulfilled without a value"))
    }))
}
