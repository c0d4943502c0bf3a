//! Cooperative cancellation of composite operations.
//!
//! A [`CancellationQueue`] collects the handles a combinator started so
//! that abandoning the combined promise can cancel every constituent that
//! is still pending. Invocation happens once; the queue is inert afterwards.

mod queue;

pub use queue::CancellationQueue;

use crate::promise::{LazyPromise, Promise};

/// Something that can be asked to cancel.
///
/// Cancellation is a request: a settled target ignores it.
pub trait Cancellable {
    /// Requests cancellation.
    fn cancel(&self);
}

impl<T: Clone + 'static> Cancellable for Promise<T> {
    fn cancel(&self) {
        Promise::cancel(self);
    }
}

impl<T: Clone + 'static> Cancellable for LazyPromise<T> {
    fn cancel(&self) {
        LazyPromise::cancel(self);
    }
}

impl<C: Cancellable> Cancellable for Vec<C> {
    fn cancel(&self) {
        for handle in self {
            handle.cancel();
        }
    }
}

impl<C: Cancellable + ?Sized> Cancellable for Box<C> {
    fn cancel(&self) {
        (**self).cancel();
    }
}
