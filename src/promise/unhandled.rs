//! Escalation of failures that reach `done` with no rejection handler.
//!
//! A hook installed on the current thread receives every escaped failure.
//! Without a hook, the configured [`UnhandledPolicy`] decides: `Panic`
//! raises an [`UnhandledRejection`] panic payload that propagates through
//! the engine untouched, `Log` only emits the error event.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{self, UnhandledPolicy};
use crate::error::{Failure, UnhandledRejection};
use crate::tracing_compat::error;

/// Callback receiving escaped failures.
pub type RejectionHook = Rc<dyn Fn(&Failure)>;

thread_local! {
    static HOOK: RefCell<Option<RejectionHook>> = const { RefCell::new(None) };
}

/// Installs a hook for the current thread, returning the previous one.
pub fn set_hook<F>(hook: F) -> Option<RejectionHook>
where
    F: Fn(&Failure) + 'static,
{
    replace_hook(Some(Rc::new(hook)))
}

/// Removes the hook for the current thread, returning it.
pub fn clear_hook() -> Option<RejectionHook> {
    replace_hook(None)
}

fn replace_hook(hook: Option<RejectionHook>) -> Option<RejectionHook> {
    HOOK.with(|slot| std::mem::replace(&mut *slot.borrow_mut(), hook))
}

/// Escalates a failure that no handler consumed.
///
/// # Panics
///
/// Panics with an [`UnhandledRejection`] payload when no hook is installed
/// and the active policy is [`UnhandledPolicy::Panic`].
pub fn escalate(failure: Failure) {
    error!(failure = %failure, kind = ?failure.kind(), "unhandled rejection");
    let hook = HOOK.with(|slot| slot.borrow().clone());
    if let Some(hook) = hook {
        hook(&failure);
        return;
    }
    match config::current().unhandled_rejection {
        UnhandledPolicy::Panic => std::panic::panic_any(UnhandledRejection::new(failure)),
        UnhandledPolicy::Log => {}
    }
}

/// Returns true if a panic payload is an escalated rejection.
#[must_use]
pub fn is_escalation(payload: &(dyn Any + Send)) -> bool {
    payload.is::<UnhandledRejection>()
}

/// Collects escaped failures while alive.
///
/// Restores the previously installed hook on drop.
pub struct RejectionRecorder {
    failures: Rc<RefCell<Vec<Failure>>>,
    previous: Option<RejectionHook>,
}

/// Starts recording escaped failures on the current thread.
#[must_use]
pub fn record() -> RejectionRecorder {
    let failures = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&failures);
    let previous = set_hook(move |failure| sink.borrow_mut().push(failure.clone()));
    RejectionRecorder { failures, previous }
}

impl RejectionRecorder {
    /// Returns the failures recorded so far.
    #[must_use]
    pub fn failures(&self) -> Vec<Failure> {
        self.failures.borrow().clone()
    }

    /// Drains the recorded failures.
    pub fn take(&self) -> Vec<Failure> {
        std::mem::take(&mut *self.failures.borrow_mut())
    }

    /// Returns the number of recorded failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.borrow().len()
    }

    /// Returns true if nothing escaped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.borrow().is_empty()
    }
}

impl Drop for RejectionRecorder {
    fn drop(&mut self) {
        replace_hook(self.previous.take());
    }
}

impl std::fmt::Debug for RejectionRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RejectionRecorder")
            .field("failures", &self.failures.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::test_utils::init_test_logging;
    use std::panic::{self, AssertUnwindSafe};

    fn init_test(test_name: &str) {
        init_test_logging();
        crate::test_phase!(test_name);
    }

    #[test]
    fn recorder_collects_and_restores() {
        init_test("recorder_collects_and_restores");
        {
            let recorder = record();
            escalate(Failure::user("first"));
            escalate(Failure::user("second"));
            assert_eq!(recorder.len(), 2);
            assert_eq!(recorder.take()[1], Failure::user("second"));
            assert!(recorder.is_empty());
        }
        assert!(clear_hook().is_none());
        crate::test_complete!("recorder_collects_and_restores");
    }

    #[test]
    fn nested_recorders_restore_outer() {
        init_test("nested_recorders_restore_outer");
        let outer = record();
        {
            let inner = record();
            escalate(Failure::user("inner"));
            assert_eq!(inner.len(), 1);
        }
        escalate(Failure::user("outer"));
        assert_eq!(outer.failures(), vec![Failure::user("outer")]);
        crate::test_complete!("nested_recorders_restore_outer");
    }

    #[test]
    fn panic_policy_raises_unhandled_rejection() {
        init_test("panic_policy_raises_unhandled_rejection");
        let previous = config::install(EngineConfig::default());
        let result = panic::catch_unwind(AssertUnwindSafe(|| escalate(Failure::user("boom"))));
        config::install(previous);

        let payload = result.expect_err("escalation should panic");
        assert!(is_escalation(payload.as_ref()));
        let rejection = payload
            .downcast::<UnhandledRejection>()
            .expect("payload type");
        assert_eq!(rejection.failure(), &Failure::user("boom"));
        crate::test_complete!("panic_policy_raises_unhandled_rejection");
    }

    #[test]
    fn log_policy_swallows() {
        init_test("log_policy_swallows");
        let previous = config::install(EngineConfig {
            unhandled_rejection: UnhandledPolicy::Log,
            ..EngineConfig::default()
        });
        escalate(Failure::user("quiet"));
        config::install(previous);
        crate::test_complete!("log_policy_swallows");
    }
}
