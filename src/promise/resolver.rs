//! The settling capability handed to resolver functions and cancellers.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::{Progress, Promise, Resolution};
use crate::error::Failure;

/// Settles a promise at most once.
///
/// Clones share the same capability: the first `resolve`/`fulfill`/`reject`
/// through any clone consumes it and later calls are no-ops. `notify` does
/// not consume it.
pub struct Resolver<T> {
    target: Rc<RefCell<Option<Promise<T>>>>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            target: Rc::clone(&self.target),
        }
    }
}

impl<T: Clone + 'static> Resolver<T> {
    pub(crate) fn new(promise: Promise<T>) -> Self {
        Self {
            target: Rc::new(RefCell::new(Some(promise))),
        }
    }

    fn take(&self) -> Option<Promise<T>> {
        self.target.borrow_mut().take()
    }

    /// Resolves with a value, failure, promise, lazy promise or thenable.
    pub fn resolve(&self, resolution: impl Into<Resolution<T>>) {
        if let Some(promise) = self.take() {
            promise.resolve_from(resolution.into());
        }
    }

    /// Fulfills with a value.
    pub fn fulfill(&self, value: T) {
        self.resolve(Resolution::Value(value));
    }

    /// Rejects with a failure.
    pub fn reject(&self, failure: impl Into<Failure>) {
        if let Some(promise) = self.take() {
            promise.reject_with(failure.into());
        }
    }

    /// Sends a progress notification to the promise's listeners.
    pub fn notify(&self, update: impl Into<Progress>) {
        let target = self.target.borrow().clone();
        if let Some(promise) = target {
            promise.notify_progress(update.into());
        }
    }

    /// Binds the unsettled target to `source`'s context.
    pub(crate) fn adopt_shared(&self, source: &Promise<T>) {
        let target = self.target.borrow().clone();
        if let Some(promise) = target {
            promise.adopt_shared(source);
        }
    }

    /// Returns true once this capability has settled its promise.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.target.borrow().is_none()
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("consumed", &self.target.borrow().is_none())
            .finish()
    }
}
