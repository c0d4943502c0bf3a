//! Helpers shared by the unit tests.
//!
//! Every test calls [`init_test_logging`] first so engine events show up
//! under `cargo test -- --nocapture`; the macros below bracket a test and
//! check settled outcomes.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard, Once, PoisonError};

static LOGGING: Once = Once::new();
static ENV: Mutex<()> = Mutex::new(());

/// Installs a trace-level subscriber that writes through the test harness.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_target(true)
            .with_line_number(true)
            .with_ansi(false)
            .try_init();
    });
}

/// Serializes tests that touch process environment variables.
pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    ENV.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Records the order in which handlers ran.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.events.borrow_mut().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

/// Marks the start of a test in the log.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(test = %$name, ">>> {}", $name);
    };
}

/// Marks a passing test in the log.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "<<< {} passed", $name);
    };
}

/// Logs the compared values, then asserts.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        tracing::debug!(expected = ?$expected, actual = ?$actual, "check: {}", $msg);
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}

/// The promise fulfilled with `$expected`.
#[macro_export]
macro_rules! assert_fulfilled {
    ($promise:expr, $expected:expr) => {
        match $promise.outcome() {
            Some(Ok(value)) => assert_eq!(value, $expected),
            other => panic!("expected fulfillment with {:?}, got {:?}", $expected, other),
        }
    };
}

/// The promise rejected, with a failure matching `$pattern` when given.
#[macro_export]
macro_rules! assert_rejected {
    ($promise:expr) => {
        $crate::assert_rejected!($promise, _)
    };
    ($promise:expr, $pattern:pat) => {
        match $promise.outcome() {
            Some(Err($pattern)) => {}
            other => panic!(
                "expected rejection matching `{}`, got {:?}",
                stringify!($pattern),
                other
            ),
        }
    };
}

/// The promise has no outcome yet.
#[macro_export]
macro_rules! assert_pending {
    ($promise:expr) => {
        if let Some(outcome) = $promise.outcome() {
            panic!("expected pending, got {:?}", outcome);
        }
    };
}
