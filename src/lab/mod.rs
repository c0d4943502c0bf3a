//! Deterministic test harness.
//!
//! [`VirtualScheduler`] runs timers on virtual time so that timeout and
//! delay behaviour can be tested without sleeping.

mod virtual_time_wheel;

pub use virtual_time_wheel::{VirtualScheduler, VirtualTimerWheel};
