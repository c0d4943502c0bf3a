use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::Cancellable;
use crate::tracing_compat::debug;

struct QueueInner {
    handles: Vec<Box<dyn Cancellable>>,
    invoked: bool,
}

/// Ordered, invoke-once collection of cancellable handles.
///
/// Clones share the same queue.
#[derive(Clone)]
pub struct CancellationQueue {
    inner: Rc<RefCell<QueueInner>>,
}

impl CancellationQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(QueueInner {
                handles: Vec::new(),
                invoked: false,
            })),
        }
    }

    /// Adds a handle.
    ///
    /// Returns `false` and drops the handle if the queue was already
    /// invoked.
    pub fn enqueue(&self, handle: impl Cancellable + 'static) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.invoked {
            return false;
        }
        inner.handles.push(Box::new(handle));
        true
    }

    /// Cancels every queued handle in insertion order, then empties the
    /// queue. Later calls do nothing.
    pub fn invoke(&self) {
        let handles = {
            let mut inner = self.inner.borrow_mut();
            if inner.invoked {
                return;
            }
            inner.invoked = true;
            std::mem::take(&mut inner.handles)
        };
        debug!(handles = handles.len(), "cancellation queue invoked");
        for handle in handles {
            handle.cancel();
        }
    }

    /// Returns true once [`invoke`](Self::invoke) has run.
    #[must_use]
    pub fn is_invoked(&self) -> bool {
        self.inner.borrow().invoked
    }

    /// Returns the number of queued handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().handles.len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().handles.is_empty()
    }
}

impl Cancellable for CancellationQueue {
    fn cancel(&self) {
        self.invoke();
    }
}

impl Default for CancellationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("CancellationQueue")
            .field("handles", &inner.handles.len())
            .field("invoked", &inner.invoked)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promise::{LazyPromise, Promise};
    use crate::test_utils::{init_test_logging, EventLog};

    fn init_test(test_name: &str) {
        init_test_logging();
        crate::test_phase!(test_name);
    }

    struct Tracked {
        log: EventLog,
        name: &'static str,
    }

    impl Cancellable for Tracked {
        fn cancel(&self) {
            self.log.push(self.name);
        }
    }

    fn tracked(log: &EventLog, name: &'static str) -> Tracked {
        Tracked {
            log: log.clone(),
            name,
        }
    }

    #[test]
    fn invoke_cancels_in_insertion_order() {
        init_test("invoke_cancels_in_insertion_order");
        let log = EventLog::new();
        let queue = CancellationQueue::new();
        queue.enqueue(tracked(&log, "first"));
        queue.enqueue(vec![tracked(&log, "nested-a"), tracked(&log, "nested-b")]);
        queue.enqueue(tracked(&log, "last"));
        assert_eq!(queue.len(), 3);

        queue.invoke();
        crate::assert_with_log!(
            log.events() == ["first", "nested-a", "nested-b", "last"],
            "cancel order",
            ["first", "nested-a", "nested-b", "last"],
            log.events()
        );
        assert!(queue.is_empty());
        assert!(queue.is_invoked());
        crate::test_complete!("invoke_cancels_in_insertion_order");
    }

    #[test]
    fn enqueue_after_invoke_is_inert() {
        init_test("enqueue_after_invoke_is_inert");
        let log = EventLog::new();
        let queue = CancellationQueue::new();
        queue.invoke();
        assert!(!queue.enqueue(tracked(&log, "late")));
        queue.invoke();
        assert!(log.is_empty());
        assert!(queue.is_empty());
        crate::test_complete!("enqueue_after_invoke_is_inert");
    }

    #[test]
    fn nested_queue_is_invoked_once() {
        init_test("nested_queue_is_invoked_once");
        let log = EventLog::new();
        let inner = CancellationQueue::new();
        inner.enqueue(tracked(&log, "inner"));
        let outer = CancellationQueue::new();
        outer.enqueue(inner.clone());
        outer.enqueue(inner.clone());
        outer.invoke();
        assert_eq!(log.events(), vec!["inner"]);
        crate::test_complete!("nested_queue_is_invoked_once");
    }

    #[test]
    fn promises_and_lazy_promises_are_cancelled() {
        init_test("promises_and_lazy_promises_are_cancelled");
        let log = EventLog::new();
        let seen = log.clone();
        let promise: Promise<i32> = Promise::builder()
            .canceller(move |_| {
                seen.push("promise");
                Ok(())
            })
            .build(|_| Ok(()));
        let seen = log.clone();
        let lazy = LazyPromise::new(move || {
            let seen = seen.clone();
            Promise::<i32>::builder()
                .canceller(move |_| {
                    seen.push("lazy");
                    Ok(())
                })
                .build(|_| Ok(()))
        });
        let queue = CancellationQueue::new();
        queue.enqueue(promise);
        queue.enqueue(lazy);
        queue.invoke();
        assert_eq!(log.events(), vec!["promise", "lazy"]);
        crate::test_complete!("promises_and_lazy_promises_are_cancelled");
    }
}
