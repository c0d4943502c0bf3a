//! Deferred promise construction.
//!
//! A [`LazyPromise`] holds a factory that runs on first observation. The
//! `*_lazy` methods queue operations without running the factory; they are
//! replayed, in order, against the produced promise once it exists.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::{guarded, resolve, Consumer, Progress, Promise, Reaction, Resolution};
use crate::error::{Failure, Rejection};
use crate::tracing_compat::{debug, trace};

/// Kind of an operation queued on an unforced [`LazyPromise`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LazyOpKind {
    /// A queued `then`.
    Then,
    /// A queued `always`.
    Always,
    /// A queued `otherwise`.
    Otherwise,
}

struct QueuedOp<T> {
    kind: LazyOpKind,
    apply: Box<dyn FnOnce(&Promise<T>)>,
}

type Factory<T> = Box<dyn FnOnce() -> Resolution<T>>;

struct LazyInner<T> {
    factory: Option<Factory<T>>,
    promise: Option<Promise<T>>,
    queued: Vec<QueuedOp<T>>,
}

/// A promise whose construction is deferred until first observation.
pub struct LazyPromise<T> {
    inner: Rc<RefCell<LazyInner<T>>>,
}

impl<T> Clone for LazyPromise<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> LazyPromise<T> {
    /// Creates a lazy promise from a factory.
    ///
    /// The factory runs at most once. A failure or panic inside it becomes
    /// the rejection of the produced promise.
    ///
    /// ```
    /// use promissory::{LazyPromise, Promise};
    ///
    /// let lazy = LazyPromise::new(|| Promise::fulfilled(1));
    /// let doubled = lazy.then_lazy(|v| Ok(v * 2));
    /// assert!(!lazy.is_forced());
    /// assert_eq!(doubled.promise().outcome(), Some(Ok(2)));
    /// ```
    pub fn new<F, R>(factory: F) -> Self
    where
        F: FnOnce() -> R + 'static,
        R: Into<Resolution<T>>,
    {
        Self {
            inner: Rc::new(RefCell::new(LazyInner {
                factory: Some(Box::new(move || factory().into())),
                promise: None,
                queued: Vec::new(),
            })),
        }
    }

    /// Wraps an existing promise as an already-forced lazy promise.
    #[must_use]
    pub fn from_promise(promise: Promise<T>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(LazyInner {
                factory: None,
                promise: Some(promise),
                queued: Vec::new(),
            })),
        }
    }

    /// Returns true once the factory has run.
    #[must_use]
    pub fn is_forced(&self) -> bool {
        self.inner.borrow().promise.is_some()
    }

    /// Returns the kinds of the operations still waiting for replay.
    #[must_use]
    pub fn queued_operations(&self) -> Vec<LazyOpKind> {
        self.inner.borrow().queued.iter().map(|op| op.kind).collect()
    }

    fn forced(&self) -> Option<Promise<T>> {
        self.inner.borrow().promise.clone()
    }

    /// Forces the factory, returning the produced promise.
    ///
    /// Queued operations are replayed against it in queue order. Forcing
    /// from inside the factory yields a self-resolution rejection.
    pub fn promise(&self) -> Promise<T> {
        if let Some(promise) = self.forced() {
            return promise;
        }
        let factory = self.inner.borrow_mut().factory.take();
        let Some(factory) = factory else {
            trace!("lazy promise forced re-entrantly");
            return Promise::rejected(Failure::SelfResolution);
        };
        let produced = guarded(|| Ok(factory())).unwrap_or_else(Resolution::Failure);
        let promise = resolve(produced);
        let queued = {
            let mut inner = self.inner.borrow_mut();
            inner.promise = Some(promise.clone());
            std::mem::take(&mut inner.queued)
        };
        debug!(promise = %promise.id(), replayed = queued.len(), "lazy promise forced");
        for op in queued {
            (op.apply)(&promise);
        }
        promise
    }

    fn defer<U, F>(&self, kind: LazyOpKind, op: F) -> LazyPromise<U>
    where
        U: Clone + 'static,
        F: FnOnce(&Promise<T>) -> Promise<U> + 'static,
    {
        if let Some(promise) = self.forced() {
            return LazyPromise::from_promise(op(&promise));
        }
        let slot: Rc<RefCell<Option<Promise<U>>>> = Rc::new(RefCell::new(None));
        let fill = Rc::clone(&slot);
        self.inner.borrow_mut().queued.push(QueuedOp {
            kind,
            apply: Box::new(move |promise| {
                let derived = op(promise);
                *fill.borrow_mut() = Some(derived);
            }),
        });
        let parent = self.clone();
        LazyPromise::new(move || {
            parent.promise();
            let replayed = slot.borrow_mut().take();
            match replayed {
                Some(derived) => Resolution::Promise(derived),
                None => Resolution::Failure(Failure::internal("queued lazy operation was not replayed")),
            }
        })
    }

    /// Queues a `then` without forcing the factory.
    pub fn then_lazy<U, F>(&self, on_fulfilled: F) -> LazyPromise<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<U, Failure> + 'static,
    {
        self.defer(LazyOpKind::Then, move |promise| promise.then(on_fulfilled))
    }

    /// Queues an `always` without forcing the factory.
    pub fn always_lazy<F, R>(&self, on_settled: F) -> Self
    where
        F: FnOnce() -> R + 'static,
        R: Into<Resolution<()>>,
    {
        self.defer(LazyOpKind::Always, move |promise| promise.always(on_settled))
    }

    /// Queues an `otherwise` without forcing the factory.
    pub fn otherwise_lazy<E, G, R>(&self, on_rejected: G) -> Self
    where
        E: Rejection,
        G: FnOnce(E) -> R + 'static,
        R: Into<Resolution<T>>,
    {
        self.defer(LazyOpKind::Otherwise, move |promise| {
            promise.otherwise(on_rejected)
        })
    }

    /// Forces and registers a reaction.
    pub fn then_with<U: Clone + 'static>(&self, reaction: Reaction<T, U>) -> Promise<U> {
        self.promise().then_with(reaction)
    }

    /// Forces and chains a fallible transformation.
    pub fn then<U, F>(&self, on_fulfilled: F) -> Promise<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<U, Failure> + 'static,
    {
        self.promise().then(on_fulfilled)
    }

    /// Forces and chains a transformation that may return a promise.
    pub fn and_then<U, F, R>(&self, on_fulfilled: F) -> Promise<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> R + 'static,
        R: Into<Resolution<U>>,
    {
        self.promise().and_then(on_fulfilled)
    }

    /// Forces and recovers from failures of variant `E`.
    pub fn otherwise<E, G, R>(&self, on_rejected: G) -> Promise<T>
    where
        E: Rejection,
        G: FnOnce(E) -> R + 'static,
        R: Into<Resolution<T>>,
    {
        self.promise().otherwise(on_rejected)
    }

    /// Forces and registers a cleanup handler.
    pub fn always<F, R>(&self, on_settled: F) -> Promise<T>
    where
        F: FnOnce() -> R + 'static,
        R: Into<Resolution<()>>,
    {
        self.promise().always(on_settled)
    }

    /// Forces and observes progress.
    pub fn progress<P>(&self, on_progress: P) -> Promise<T>
    where
        P: Fn(Progress) -> Result<Progress, Failure> + 'static,
    {
        self.promise().progress(on_progress)
    }

    /// Forces and consumes the outcome.
    pub fn done_with(&self, consumer: Consumer<T>) {
        self.promise().done_with(consumer);
    }

    /// Forces and consumes the value; failures escalate.
    pub fn done<F>(&self, on_fulfilled: F)
    where
        F: FnOnce(T) + 'static,
    {
        self.promise().done(on_fulfilled);
    }

    /// Forces and cancels the produced promise.
    pub fn cancel(&self) {
        self.promise().cancel();
    }
}

impl<T> fmt::Debug for LazyPromise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("LazyPromise")
            .field("forced", &inner.promise.is_some())
            .field("queued", &inner.queued.len())
            .finish()
    }
}
