//! Normalization of resolution inputs into promises.

use std::fmt;

use super::thenable::{self, Thenable};
use super::{LazyPromise, Promise};
use crate::error::Failure;
use crate::shared::SharedData;

/// Anything a promise can be resolved with.
///
/// Plain values and failures settle immediately. Promises are followed,
/// lazy promises are forced and then followed, and thenables are adopted
/// through their own `then`.
pub enum Resolution<T> {
    /// Fulfill with a value.
    Value(T),
    /// Reject with a failure.
    Failure(Failure),
    /// Follow another promise.
    Promise(Promise<T>),
    /// Force a lazy promise and follow it.
    Lazy(LazyPromise<T>),
    /// Adopt a foreign promise-like object.
    Thenable(Box<dyn Thenable<T>>),
}

impl<T> Resolution<T> {
    /// Resolution with a plain value.
    #[must_use]
    pub const fn value(value: T) -> Self {
        Self::Value(value)
    }

    /// Resolution with a failure.
    #[must_use]
    pub fn failure(failure: impl Into<Failure>) -> Self {
        Self::Failure(failure.into())
    }

    /// Resolution adopting a thenable.
    #[must_use]
    pub fn thenable(thenable: impl Thenable<T> + 'static) -> Self {
        Self::Thenable(Box::new(thenable))
    }
}

impl<T> From<Result<T, Failure>> for Resolution<T> {
    fn from(result: Result<T, Failure>) -> Self {
        match result {
            Ok(value) => Self::Value(value),
            Err(failure) => Self::Failure(failure),
        }
    }
}

impl<T> From<Promise<T>> for Resolution<T> {
    fn from(promise: Promise<T>) -> Self {
        Self::Promise(promise)
    }
}

impl<T> From<&Promise<T>> for Resolution<T> {
    fn from(promise: &Promise<T>) -> Self {
        Self::Promise(promise.clone())
    }
}

impl<T> From<LazyPromise<T>> for Resolution<T> {
    fn from(lazy: LazyPromise<T>) -> Self {
        Self::Lazy(lazy)
    }
}

impl<T> From<Box<dyn Thenable<T>>> for Resolution<T> {
    fn from(thenable: Box<dyn Thenable<T>>) -> Self {
        Self::Thenable(thenable)
    }
}

impl<T> fmt::Debug for Resolution<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => f.write_str("Resolution::Value(..)"),
            Self::Failure(failure) => f.debug_tuple("Resolution::Failure").field(failure).finish(),
            Self::Promise(promise) => f.debug_tuple("Resolution::Promise").field(&promise.id()).finish(),
            Self::Lazy(_) => f.write_str("Resolution::Lazy(..)"),
            Self::Thenable(_) => f.write_str("Resolution::Thenable(..)"),
        }
    }
}

/// Wraps anything resolvable into a promise.
///
/// A promise input is returned as the same handle.
pub fn resolve<T: Clone + 'static>(resolution: impl Into<Resolution<T>>) -> Promise<T> {
    resolve_with(resolution.into(), None)
}

/// Like [`resolve`], binding the result to a shared-data context.
///
/// A promise input that already carries a context has it merged into
/// `shared`.
pub fn resolve_with_shared<T: Clone + 'static>(
    resolution: impl Into<Resolution<T>>,
    shared: &SharedData,
) -> Promise<T> {
    resolve_with(resolution.into(), Some(shared.clone()))
}

/// Creates a rejected promise.
pub fn reject<T: Clone + 'static>(failure: impl Into<Failure>) -> Promise<T> {
    Promise::rejected(failure)
}

/// Lazily resolves `resolution` on first observation.
pub fn resolve_lazy<T, R>(resolution: R) -> LazyPromise<T>
where
    T: Clone + 'static,
    R: Into<Resolution<T>> + 'static,
{
    LazyPromise::new(move || resolution)
}

/// Lazily rejects with `failure` on first observation.
pub fn reject_lazy<T: Clone + 'static>(failure: impl Into<Failure>) -> LazyPromise<T> {
    let failure = failure.into();
    LazyPromise::new(move || Resolution::Failure(failure))
}

pub(crate) fn resolve_with<T: Clone + 'static>(
    resolution: Resolution<T>,
    shared: Option<SharedData>,
) -> Promise<T> {
    match resolution {
        Resolution::Value(value) => Promise::settled(Ok(value), shared),
        Resolution::Failure(failure) => Promise::settled(Err(failure), shared),
        Resolution::Promise(promise) => bind_shared(promise, shared),
        Resolution::Lazy(lazy) => bind_shared(lazy.promise(), shared),
        Resolution::Thenable(foreign) => thenable::adopt(foreign, shared),
    }
}

fn bind_shared<T: Clone + 'static>(promise: Promise<T>, shared: Option<SharedData>) -> Promise<T> {
    if let Some(shared) = shared {
        match promise.shared_data() {
            Some(theirs) => shared.merge(&theirs),
            None => promise.inner.borrow_mut().shared = Some(shared),
        }
    }
    promise
}
