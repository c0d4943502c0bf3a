//! Timer combinators: sleep, delayed rejection and deadlines.
//!
//! All three are written against the [`Scheduler`] trait, so the same code
//! runs on a real event loop or on the deterministic
//! [`VirtualScheduler`](crate::lab::VirtualScheduler).
//!
//! # Timeout semantics
//!
//! [`timeout`] mirrors its input until the deadline. When the deadline
//! fires first, the returned promise rejects with a [`TimeoutError`] and
//! the input is then cancelled. If the input settles first the timer is
//! disarmed; if it is already settled no timer is ever armed.
//!
//! Cancelling the returned promise cancels the input. The timer keeps
//! running unless that cancellation settles the input.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::error::TimeoutError;
use crate::promise::{Promise, Resolver};
use crate::time::{Scheduler, TimerHandle};
use crate::tracing_compat::{debug, trace};
use crate::types::CancelReason;

#[derive(Debug, Clone, Copy)]
enum TimerSlot {
    Unarmed,
    Armed(TimerHandle),
    Disarmed,
}

/// Fulfills with `after` once the scheduler has let `after` elapse.
///
/// Cancelling the promise disarms the timer and rejects with
/// [`CancelReason::timer_cancelled`].
pub fn delay<S>(scheduler: &S, after: Duration) -> Promise<Duration>
where
    S: Scheduler + Clone + 'static,
{
    let armed: Rc<Cell<Option<TimerHandle>>> = Rc::new(Cell::new(None));
    let on_cancel = Rc::clone(&armed);
    let disarm = scheduler.clone();
    let scheduler = scheduler.clone();
    Promise::builder()
        .canceller(move |_| {
            if let Some(handle) = on_cancel.take() {
                disarm.cancel_timer(handle);
            }
            Err(CancelReason::timer_cancelled().into())
        })
        .build(move |resolver| {
            let handle = scheduler.add_timer(
                after,
                Box::new(move || {
                    resolver.fulfill(after);
                }),
            );
            trace!(timer = %handle.id(), after = ?after, "delay armed");
            armed.set(Some(handle));
            Ok(())
        })
}

/// Rejects with a [`TimeoutError`] once `after` has elapsed.
pub fn reject_after<T, S>(scheduler: &S, after: Duration) -> Promise<T>
where
    T: Clone + 'static,
    S: Scheduler + Clone + 'static,
{
    delay(scheduler, after).then(|elapsed| Err(TimeoutError::new(elapsed).into()))
}

/// Mirrors `promise`, rejecting with a [`TimeoutError`] if it has not
/// settled within `after`.
///
/// ```
/// use promissory::combinator::timeout;
/// use promissory::lab::VirtualScheduler;
/// use promissory::{Failure, Promise};
/// use std::time::Duration;
///
/// let scheduler = VirtualScheduler::new();
/// let never = Promise::<u8>::new(|_| Ok(()));
/// let bounded = timeout(&never, Duration::from_secs(1), &scheduler);
///
/// scheduler.advance_by(Duration::from_secs(1));
/// assert!(matches!(bounded.outcome(), Some(Err(Failure::Timeout(_)))));
/// ```
pub fn timeout<T, S>(promise: &Promise<T>, after: Duration, scheduler: &S) -> Promise<T>
where
    T: Clone + 'static,
    S: Scheduler + Clone + 'static,
{
    let input = promise.clone();
    let promise = promise.clone();
    let scheduler = scheduler.clone();
    Promise::builder()
        .canceller(move |_| {
            debug!(promise = %input.id(), "timeout cancelled, cancelling input");
            input.cancel();
            Ok(())
        })
        .build(move |resolver: Resolver<T>| {
            let slot = Rc::new(Cell::new(TimerSlot::Unarmed));
            let on_value = Rc::clone(&slot);
            let on_failure = Rc::clone(&slot);
            let disarm_value = scheduler.clone();
            let disarm_failure = scheduler.clone();
            let fulfill = resolver.clone();
            let reject = resolver.clone();

            let watched = promise.then_else(
                move |value| {
                    disarm(&on_value, &disarm_value);
                    fulfill.fulfill(value);
                    Ok(())
                },
                move |failure| {
                    disarm(&on_failure, &disarm_failure);
                    reject.reject(failure);
                    Ok(())
                },
            );

            if matches!(slot.get(), TimerSlot::Disarmed) {
                return Ok(());
            }

            let watched = Rc::new(RefCell::new(Some(watched)));
            let handle = scheduler.add_timer(
                after,
                Box::new(move || {
                    debug!(after = ?after, "deadline reached");
                    resolver.reject(TimeoutError::new(after));
                    let pending = watched.borrow_mut().take();
                    if let Some(pending) = pending {
                        pending.cancel();
                    }
                }),
            );
            slot.set(TimerSlot::Armed(handle));
            Ok(())
        })
}

fn disarm<S: Scheduler>(slot: &Cell<TimerSlot>, scheduler: &S) {
    if let TimerSlot::Armed(handle) = slot.replace(TimerSlot::Disarmed) {
        scheduler.cancel_timer(handle);
    }
}
