//! Virtual time wheel driving timer callbacks deterministically.
//!
//! Timers are kept in a min-heap ordered by deadline, then by timer id, so
//! two runs that arm the same timers fire them in the same order. Nothing
//! here reads the wall clock: time only moves when a test advances it.
//!
//! # Example
//!
//! ```
//! use promissory::lab::VirtualScheduler;
//! use promissory::combinator::delay;
//! use std::time::Duration;
//!
//! let scheduler = VirtualScheduler::new();
//! let slept = delay(&scheduler, Duration::from_millis(50));
//! assert!(slept.is_pending());
//!
//! scheduler.advance_by(Duration::from_millis(50));
//! assert_eq!(slept.outcome(), Some(Ok(Duration::from_millis(50))));
//! ```

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::time::{Scheduler, TimerCallback, TimerHandle};
use crate::tracing_compat::{debug, trace};
use crate::types::{Time, TimerId};

/// A timer entry in the virtual wheel.
struct VirtualTimer {
    deadline: Time,
    id: TimerId,
    callback: TimerCallback,
}

impl Eq for VirtualTimer {}

impl PartialEq for VirtualTimer {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.id == other.id
    }
}

impl Ord for VirtualTimer {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap ordering: earliest deadline first, then lowest id
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for VirtualTimer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Timer storage on virtual time.
///
/// Cancellation is lazy: cancelled ids are remembered and skipped when
/// their deadline is reached.
pub struct VirtualTimerWheel {
    heap: BinaryHeap<VirtualTimer>,
    now: Time,
    next_id: u64,
    cancelled: HashSet<TimerId>,
}

impl Default for VirtualTimerWheel {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualTimerWheel {
    /// Creates an empty wheel at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Time::ZERO)
    }

    /// Creates an empty wheel at the given instant.
    #[must_use]
    pub fn starting_at(now: Time) -> Self {
        Self {
            heap: BinaryHeap::new(),
            now,
            next_id: 0,
            cancelled: HashSet::new(),
        }
    }

    /// Returns the current virtual time.
    #[must_use]
    pub const fn now(&self) -> Time {
        self.now
    }

    /// Returns the number of armed, non-cancelled timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap
            .iter()
            .filter(|t| !self.cancelled.contains(&t.id))
            .count()
    }

    /// Returns true if no timer is armed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Arms a timer firing at `deadline`.
    pub fn insert(&mut self, deadline: Time, callback: TimerCallback) -> TimerHandle {
        let id = TimerId::from_raw(self.next_id);
        self.next_id += 1;
        self.heap.push(VirtualTimer {
            deadline,
            id,
            callback,
        });
        TimerHandle::new(id, deadline)
    }

    /// Marks a timer as cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) {
        if self.heap.iter().any(|t| t.id == handle.id()) {
            self.cancelled.insert(handle.id());
        }
    }

    /// Returns the deadline of the next non-cancelled timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Time> {
        self.heap
            .iter()
            .filter(|t| !self.cancelled.contains(&t.id))
            .map(|t| t.deadline)
            .min()
    }

    /// Pops the next timer due at or before `limit`, moving time to its
    /// deadline. Cancelled timers are discarded on the way.
    fn pop_due(&mut self, limit: Time) -> Option<(TimerId, TimerCallback)> {
        loop {
            if self.heap.peek()?.deadline > limit {
                return None;
            }
            let timer = self.heap.pop()?;
            if self.cancelled.remove(&timer.id) {
                continue;
            }
            self.now = self.now.max(timer.deadline);
            return Some((timer.id, timer.callback));
        }
    }

    fn settle_at(&mut self, target: Time) {
        self.now = self.now.max(target);
        if self.cancelled.len() > self.heap.len() {
            let live: HashSet<_> = self.heap.iter().map(|t| t.id).collect();
            self.cancelled.retain(|id| live.contains(id));
        }
    }

    /// Drops every timer without running it.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.cancelled.clear();
    }
}

impl fmt::Debug for VirtualTimerWheel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualTimerWheel")
            .field("now", &self.now)
            .field("armed", &self.len())
            .field("next_deadline", &self.next_deadline())
            .finish()
    }
}

/// A [`Scheduler`] running on virtual time.
///
/// Clones share the same wheel. Callbacks run outside the wheel's borrow,
/// so they may arm or cancel further timers; a timer armed by a callback
/// fires in the same advance if its deadline falls inside the window.
#[derive(Clone, Default)]
pub struct VirtualScheduler {
    wheel: Rc<RefCell<VirtualTimerWheel>>,
}

impl VirtualScheduler {
    /// Creates a scheduler at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scheduler at the given instant.
    #[must_use]
    pub fn starting_at(now: Time) -> Self {
        Self {
            wheel: Rc::new(RefCell::new(VirtualTimerWheel::starting_at(now))),
        }
    }

    /// Returns the number of armed timers.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.wheel.borrow().len()
    }

    /// Returns the deadline of the next armed timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Time> {
        self.wheel.borrow().next_deadline()
    }

    /// Advances time by `by`, firing every timer due on the way.
    ///
    /// Returns the number of callbacks run.
    pub fn advance_by(&self, by: Duration) -> usize {
        let target = self.wheel.borrow().now() + by;
        self.advance_to(target)
    }

    /// Advances time to `target`, firing every timer due on the way.
    ///
    /// Moving backwards is a no-op. Returns the number of callbacks run.
    pub fn advance_to(&self, target: Time) -> usize {
        if target < self.wheel.borrow().now() {
            return 0;
        }
        let mut fired = 0;
        loop {
            let due = self.wheel.borrow_mut().pop_due(target);
            let Some((id, callback)) = due else {
                break;
            };
            trace!(timer = %id, now = %self.now(), "timer fired");
            callback();
            fired += 1;
        }
        self.wheel.borrow_mut().settle_at(target);
        debug!(now = %target, fired = fired, "virtual time advanced");
        fired
    }

    /// Advances to the next deadline and fires the timers due there.
    ///
    /// Returns 0 without moving time when nothing is armed.
    pub fn advance_to_next(&self) -> usize {
        let next = self.next_deadline();
        next.map_or(0, |deadline| self.advance_to(deadline))
    }

    /// Fires timers until none remain armed, including timers armed by
    /// callbacks along the way.
    ///
    /// Returns the number of callbacks run.
    pub fn run_until_idle(&self) -> usize {
        let mut fired = 0;
        while self.next_deadline().is_some() {
            fired += self.advance_to_next();
        }
        fired
    }
}

impl Scheduler for VirtualScheduler {
    fn now(&self) -> Time {
        self.wheel.borrow().now()
    }

    fn add_timer(&self, after: Duration, callback: TimerCallback) -> TimerHandle {
        let mut wheel = self.wheel.borrow_mut();
        let deadline = wheel.now() + after;
        let handle = wheel.insert(deadline, callback);
        trace!(timer = %handle.id(), deadline = %deadline, "timer armed");
        handle
    }

    fn cancel_timer(&self, handle: TimerHandle) {
        trace!(timer = %handle.id(), "timer cancelled");
        self.wheel.borrow_mut().cancel(handle);
    }
}

impl fmt::Debug for VirtualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VirtualScheduler")
            .field(&*self.wheel.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{init_test_logging, EventLog};

    fn init_test(test_name: &str) {
        init_test_logging();
        crate::test_phase!(test_name);
    }

    fn record(log: &EventLog, name: &'static str) -> TimerCallback {
        let log = log.clone();
        Box::new(move || log.push(name))
    }

    #[test]
    fn new_scheduler_starts_at_zero() {
        init_test("new_scheduler_starts_at_zero");
        let scheduler = VirtualScheduler::new();
        assert_eq!(scheduler.now(), Time::ZERO);
        assert_eq!(scheduler.pending_timers(), 0);
        let later = VirtualScheduler::starting_at(Time::from_secs(3));
        assert_eq!(later.now(), Time::from_secs(3));
        crate::test_complete!("new_scheduler_starts_at_zero");
    }

    #[test]
    fn timers_fire_in_deadline_order() {
        init_test("timers_fire_in_deadline_order");
        let scheduler = VirtualScheduler::new();
        let log = EventLog::new();
        scheduler.add_timer(Duration::from_millis(100), record(&log, "slow"));
        scheduler.add_timer(Duration::from_millis(10), record(&log, "fast"));
        scheduler.add_timer(Duration::from_millis(50), record(&log, "mid"));

        let fired = scheduler.advance_by(Duration::from_millis(60));
        assert_eq!(fired, 2);
        assert_eq!(log.events(), vec!["fast", "mid"]);
        assert_eq!(scheduler.now(), Time::from_millis(60));

        scheduler.advance_to_next();
        assert_eq!(log.events(), vec!["fast", "mid", "slow"]);
        assert_eq!(scheduler.now(), Time::from_millis(100));
        crate::test_complete!("timers_fire_in_deadline_order");
    }

    #[test]
    fn same_deadline_fires_by_id() {
        init_test("same_deadline_fires_by_id");
        let scheduler = VirtualScheduler::new();
        let log = EventLog::new();
        for name in ["a", "b", "c"] {
            scheduler.add_timer(Duration::from_millis(5), record(&log, name));
        }
        scheduler.advance_by(Duration::from_millis(5));
        assert_eq!(log.events(), vec!["a", "b", "c"]);
        crate::test_complete!("same_deadline_fires_by_id");
    }

    #[test]
    fn cancelled_timer_never_fires() {
        init_test("cancelled_timer_never_fires");
        let scheduler = VirtualScheduler::new();
        let log = EventLog::new();
        let handle = scheduler.add_timer(Duration::from_millis(10), record(&log, "cancelled"));
        scheduler.add_timer(Duration::from_millis(20), record(&log, "kept"));
        scheduler.cancel_timer(handle);
        assert_eq!(scheduler.pending_timers(), 1);
        assert_eq!(scheduler.next_deadline(), Some(Time::from_millis(20)));
        scheduler.run_until_idle();
        assert_eq!(log.events(), vec!["kept"]);
        crate::test_complete!("cancelled_timer_never_fires");
    }

    #[test]
    fn callbacks_may_arm_timers_inside_window() {
        init_test("callbacks_may_arm_timers_inside_window");
        let scheduler = VirtualScheduler::new();
        let log = EventLog::new();
        let inner_log = log.clone();
        let rearm = scheduler.clone();
        scheduler.add_timer(
            Duration::from_millis(10),
            Box::new(move || {
                inner_log.push("outer");
                rearm.add_timer(Duration::from_millis(5), record(&inner_log, "inner"));
            }),
        );
        let fired = scheduler.advance_by(Duration::from_millis(20));
        assert_eq!(fired, 2);
        assert_eq!(log.events(), vec!["outer", "inner"]);
        crate::test_complete!("callbacks_may_arm_timers_inside_window");
    }

    #[test]
    fn advance_to_past_is_noop() {
        init_test("advance_to_past_is_noop");
        let scheduler = VirtualScheduler::starting_at(Time::from_millis(100));
        assert_eq!(scheduler.advance_to(Time::from_millis(50)), 0);
        assert_eq!(scheduler.now(), Time::from_millis(100));
        assert_eq!(scheduler.advance_to_next(), 0);
        crate::test_complete!("advance_to_past_is_noop");
    }

    #[test]
    fn determinism_across_runs() {
        init_test("determinism_across_runs");
        fn run(seed: u64) -> Vec<String> {
            let scheduler = VirtualScheduler::new();
            let log = EventLog::new();
            for i in 0..10u64 {
                let after = Duration::from_millis((seed.wrapping_mul(i + 1)) % 7);
                let log = log.clone();
                scheduler.add_timer(after, Box::new(move || log.push(i.to_string())));
            }
            scheduler.run_until_idle();
            log.events()
        }
        assert_eq!(run(42), run(42));
        crate::test_complete!("determinism_across_runs");
    }
}
