//! Adoption of foreign promise-like objects.

use super::{Progress, Promise};
use crate::error::Failure;
use crate::shared::SharedData;

/// A foreign promise-like object.
///
/// Resolving with a thenable produces a native promise that calls
/// [`Thenable::then`] exactly once with callbacks settling it. If the
/// thenable exposes a canceller, cancelling the native promise invokes it.
pub trait Thenable<T> {
    /// Registers callbacks for the eventual outcome.
    fn then(
        self: Box<Self>,
        on_fulfilled: Box<dyn FnOnce(T)>,
        on_rejected: Box<dyn FnOnce(Failure)>,
        on_progress: Box<dyn Fn(Progress)>,
    );

    /// Hands over a cancellation hook, if the object supports one.
    fn take_canceller(&mut self) -> Option<Box<dyn FnOnce()>> {
        None
    }
}

pub(crate) fn adopt<T: Clone + 'static>(
    mut foreign: Box<dyn Thenable<T>>,
    shared: Option<SharedData>,
) -> Promise<T> {
    let mut builder = Promise::builder();
    if let Some(cancel) = foreign.take_canceller() {
        builder = builder.canceller(move |_| {
            cancel();
            Ok(())
        });
    }
    if let Some(shared) = shared {
        builder = builder.shared_data(shared);
    }
    builder.build(move |resolver| {
        let on_value = resolver.clone();
        let on_failure = resolver.clone();
        foreign.then(
            Box::new(move |value| on_value.fulfill(value)),
            Box::new(move |failure| on_failure.reject(failure)),
            Box::new(move |update| resolver.notify(update)),
        );
        Ok(())
    })
}
