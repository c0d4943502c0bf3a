//! The scheduler contract timer combinators are written against.
//!
//! The engine never reads a clock or owns an event loop. Anything that can
//! run a one-shot callback after a delay and cancel it again can drive
//! [`delay`](crate::combinator::delay), [`reject_after`](crate::combinator::reject_after)
//! and [`timeout`](crate::combinator::timeout). The crate ships
//! [`VirtualScheduler`](crate::lab::VirtualScheduler) as a deterministic
//! implementation.

use std::rc::Rc;
use std::time::Duration;

use crate::types::{Time, TimerId};

/// Callback run when a timer fires.
pub type TimerCallback = Box<dyn FnOnce()>;

/// Handle identifying an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    id: TimerId,
    deadline: Time,
}

impl TimerHandle {
    /// Creates a handle.
    #[must_use]
    pub const fn new(id: TimerId, deadline: Time) -> Self {
        Self { id, deadline }
    }

    /// Returns the timer id.
    #[must_use]
    pub const fn id(&self) -> TimerId {
        self.id
    }

    /// Returns the instant the timer fires at.
    #[must_use]
    pub const fn deadline(&self) -> Time {
        self.deadline
    }
}

/// An event loop able to run one-shot timers.
pub trait Scheduler {
    /// Returns the scheduler's current time.
    fn now(&self) -> Time;

    /// Runs `callback` once after `after` has elapsed.
    fn add_timer(&self, after: Duration, callback: TimerCallback) -> TimerHandle;

    /// Disarms a timer. Unknown or already fired handles are ignored.
    fn cancel_timer(&self, handle: TimerHandle);
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
    fn now(&self) -> Time {
        (**self).now()
    }

    fn add_timer(&self, after: Duration, callback: TimerCallback) -> TimerHandle {
        (**self).add_timer(after, callback)
    }

    fn cancel_timer(&self, handle: TimerHandle) {
        (**self).cancel_timer(handle);
    }
}
