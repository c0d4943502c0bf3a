//! Handler bundles registered on a promise.
//!
//! A [`Reaction`] is the three-slot argument of `then`: it produces the
//! settlement of a derived promise. A [`Consumer`] is the three-slot
//! argument of `done`: it observes the outcome and produces nothing.

use std::rc::Rc;

use serde_json::Value;

use super::{Promise, Resolution, Resolver};
use crate::error::Failure;
use crate::shared::SharedData;

/// An incremental notification, distinct from final settlement.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// A progress update.
    Update(Value),
    /// A progress transform failed; the failure travels as a notification.
    Failure(Failure),
}

impl Progress {
    /// Creates a progress update.
    #[must_use]
    pub fn update(value: impl Into<Value>) -> Self {
        Self::Update(value.into())
    }

    /// Returns the update payload, if this is an update.
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        match self {
            Self::Update(v) => Some(v),
            Self::Failure(_) => None,
        }
    }

    /// Returns the failure, if a transform failed.
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failure(f) => Some(f),
            Self::Update(_) => None,
        }
    }
}

impl From<Value> for Progress {
    fn from(value: Value) -> Self {
        Self::Update(value)
    }
}

/// Yields the settled promise's context, binding a fresh one if it has none.
pub(crate) type ContextAccess<'a> = dyn Fn() -> SharedData + 'a;

pub(crate) type FulfillHandler<T, U> = Box<dyn FnOnce(T, &ContextAccess) -> Resolution<U>>;
pub(crate) type RejectHandler<U> = Box<dyn FnOnce(Failure, &ContextAccess) -> Resolution<U>>;
pub(crate) type ProgressTransform = Rc<dyn Fn(Progress) -> Result<Progress, Failure>>;
pub(crate) type ProgressListener = Rc<dyn Fn(Progress)>;

/// Handlers for `Promise::then_with`.
///
/// The fulfillment slot is always present: it maps `T` to the derived
/// promise's `U`. [`Reaction::passthrough`] fills it with the identity for
/// reactions that only care about failures or progress.
pub struct Reaction<T, U> {
    pub(crate) on_fulfilled: FulfillHandler<T, U>,
    pub(crate) on_rejected: Option<RejectHandler<U>>,
    pub(crate) on_progress: Option<ProgressTransform>,
}

impl<T: 'static, U: 'static> Reaction<T, U> {
    /// Creates a reaction from a fulfillment handler.
    ///
    /// The handler may return anything resolvable, including another
    /// promise, which the derived promise then follows.
    #[must_use]
    pub fn new<F, R>(on_fulfilled: F) -> Self
    where
        F: FnOnce(T) -> R + 'static,
        R: Into<Resolution<U>>,
    {
        Self {
            on_fulfilled: Box::new(move |value, _: &ContextAccess| on_fulfilled(value).into()),
            on_rejected: None,
            on_progress: None,
        }
    }

    /// Creates a reaction whose fulfillment handler also sees the chain's
    /// shared-data context.
    ///
    /// A chain without a context is bound to a fresh one from
    /// [`SharedData::new`] before the handler runs.
    #[must_use]
    pub fn shared<F, R>(on_fulfilled: F) -> Self
    where
        F: FnOnce(T, &SharedData) -> R + 'static,
        R: Into<Resolution<U>>,
    {
        Self {
            on_fulfilled: Box::new(move |value, context: &ContextAccess| {
                on_fulfilled(value, &context()).into()
            }),
            on_rejected: None,
            on_progress: None,
        }
    }

    /// Sets a rejection handler that also sees the chain's context.
    #[must_use]
    pub fn rejected_shared<G, R>(mut self, on_rejected: G) -> Self
    where
        G: FnOnce(Failure, &SharedData) -> R + 'static,
        R: Into<Resolution<U>>,
    {
        self.on_rejected = Some(Box::new(move |failure, context: &ContextAccess| {
            on_rejected(failure, &context()).into()
        }));
        self
    }

    /// Sets the rejection handler.
    #[must_use]
    pub fn rejected<G, R>(mut self, on_rejected: G) -> Self
    where
        G: FnOnce(Failure) -> R + 'static,
        R: Into<Resolution<U>>,
    {
        self.on_rejected = Some(Box::new(move |failure, _: &ContextAccess| {
            on_rejected(failure).into()
        }));
        self
    }

    /// Sets the progress transform.
    ///
    /// A transform returning `Err` (or panicking) forwards the failure as
    /// [`Progress::Failure`].
    #[must_use]
    pub fn progress<P>(mut self, on_progress: P) -> Self
    where
        P: Fn(Progress) -> Result<Progress, Failure> + 'static,
    {
        self.on_progress = Some(Rc::new(on_progress));
        self
    }
}

impl<T: 'static> Reaction<T, T> {
    /// A reaction that passes the value through unchanged.
    #[must_use]
    pub fn passthrough() -> Self {
        Self {
            on_fulfilled: Box::new(|value, _: &ContextAccess| Resolution::Value(value)),
            on_rejected: None,
            on_progress: None,
        }
    }
}

/// Handlers for `Promise::done_with`.
///
/// A consumer without a rejection handler escalates a failure as an
/// unhandled rejection.
pub struct Consumer<T> {
    pub(crate) on_fulfilled: Option<Box<dyn FnOnce(T)>>,
    pub(crate) on_rejected: Option<Box<dyn FnOnce(Failure)>>,
    pub(crate) on_progress: Option<ProgressListener>,
}

impl<T: 'static> Consumer<T> {
    /// Creates a consumer with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            on_fulfilled: None,
            on_rejected: None,
            on_progress: None,
        }
    }

    /// Sets the fulfillment handler.
    #[must_use]
    pub fn fulfilled<F>(mut self, on_fulfilled: F) -> Self
    where
        F: FnOnce(T) + 'static,
    {
        self.on_fulfilled = Some(Box::new(on_fulfilled));
        self
    }

    /// Sets the rejection handler.
    #[must_use]
    pub fn rejected<G>(mut self, on_rejected: G) -> Self
    where
        G: FnOnce(Failure) + 'static,
    {
        self.on_rejected = Some(Box::new(on_rejected));
        self
    }

    /// Sets the progress listener.
    #[must_use]
    pub fn progress<P>(mut self, on_progress: P) -> Self
    where
        P: Fn(Progress) + 'static,
    {
        self.on_progress = Some(Rc::new(on_progress));
        self
    }

    pub(crate) fn with_listener(mut self, listener: ProgressListener) -> Self {
        self.on_progress = Some(listener);
        self
    }
}

impl<T: Clone + 'static> Consumer<T> {
    /// A consumer that settles `resolver` with the outcome and forwards
    /// progress to it.
    #[must_use]
    pub fn settling(resolver: &Resolver<T>) -> Self {
        let on_value = resolver.clone();
        let on_failure = resolver.clone();
        let on_update = resolver.clone();
        Self::new()
            .fulfilled(move |value| on_value.fulfill(value))
            .rejected(move |failure| on_failure.reject(failure))
            .progress(move |update| on_update.notify(update))
    }
}

impl<T: Clone + 'static> Consumer<T> {
    /// Like [`Consumer::settling`], first binding the resolver's promise
    /// to the context `source` carries when it settles.
    pub(crate) fn adopting(resolver: &Resolver<T>, source: &Promise<T>) -> Self {
        let (on_value, on_failure) = (resolver.clone(), resolver.clone());
        let (value_source, failure_source) = (source.clone(), source.clone());
        let on_update = resolver.clone();
        Self::new()
            .fulfilled(move |value| {
                on_value.adopt_shared(&value_source);
                on_value.fulfill(value);
            })
            .rejected(move |failure| {
                on_failure.adopt_shared(&failure_source);
                on_failure.reject(failure);
            })
            .progress(move |update| on_update.notify(update))
    }
}

impl<T: 'static> Default for Consumer<T> {
    fn default() -> Self {
        Self::new()
    }
}
