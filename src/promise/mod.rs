//! Promises: single-assignment containers for an eventual outcome.
//!
//! A [`Promise`] starts pending and settles exactly once, either by
//! fulfilling with a value, rejecting with a [`Failure`], or following
//! another promise whose outcome it then mirrors. Handlers registered while
//! pending run in registration order once the outcome is known; handlers
//! registered afterwards run immediately.
//!
//! Everything here is single-threaded. Handles are cheap `Rc` clones and no
//! internal borrow is held while user code runs, so handlers may freely
//! register more handlers, settle other promises or cancel.
//!
//! # Failure containment
//!
//! A panic inside a reaction handler, a resolver function, a canceller or a
//! progress transform becomes a rejection carrying
//! [`Failure::Panicked`]. The one exception is the payload raised by
//! [`unhandled::escalate`], which always propagates to the caller.
//!
//! # Cancellation
//!
//! Cancelling a derived promise only reaches its parent once every promise
//! derived from that parent has asked for cancellation.

mod lazy;
mod reaction;
mod resolution;
mod resolver;
pub mod thenable;
pub mod unhandled;

pub use lazy::{LazyOpKind, LazyPromise};
pub use reaction::{Consumer, Progress, Reaction};
pub use resolution::{reject, reject_lazy, resolve, resolve_lazy, resolve_with_shared, Resolution};
pub use resolver::Resolver;
pub use thenable::Thenable;

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use smallvec::SmallVec;

use crate::error::{Failure, Rejection};
use crate::shared::SharedData;
use crate::tracing_compat::{debug, trace};
use crate::types::{PanicPayload, PromiseId, PromiseState};
use reaction::{ContextAccess, ProgressListener};

type Handler<T> = Box<dyn FnOnce(&Promise<T>)>;

/// Cancellation hook of a pending promise.
///
/// Receives a resolver for the promise; returning `Err` rejects it.
pub type Canceller<T> = Box<dyn FnOnce(Resolver<T>) -> Result<(), Failure>>;

enum State<T> {
    Pending {
        handlers: SmallVec<[Handler<T>; 2]>,
        progress: Vec<ProgressListener>,
    },
    Following(Promise<T>),
    Fulfilled(T),
    Rejected(Failure),
}

impl<T> State<T> {
    fn pending() -> Self {
        Self::Pending {
            handlers: SmallVec::new(),
            progress: Vec::new(),
        }
    }
}

struct Inner<T> {
    id: PromiseId,
    state: State<T>,
    canceller: Option<Canceller<T>>,
    required_cancel_requests: usize,
    shared: Option<SharedData>,
}

/// Cloned view of a promise's own state.
enum Snapshot<T> {
    Pending,
    Following(Promise<T>),
    Fulfilled(T),
    Rejected(Failure),
}

/// Runs user code, turning `Err` and panics into a failure.
///
/// Escalated rejections are re-raised.
pub(crate) fn guarded<R>(f: impl FnOnce() -> Result<R, Failure>) -> Result<R, Failure> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            if unhandled::is_escalation(payload.as_ref()) {
                panic::resume_unwind(payload);
            }
            Err(Failure::Panicked(PanicPayload::from_panic(payload.as_ref())))
        }
    }
}

/// A single-assignment container for an eventual `T` or [`Failure`].
pub struct Promise<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Builder for promises with a canceller or shared-data context.
pub struct PromiseBuilder<T> {
    canceller: Option<Canceller<T>>,
    shared: Option<SharedData>,
}

impl<T: Clone + 'static> PromiseBuilder<T> {
    /// Sets the canceller, invoked at most once while pending.
    #[must_use]
    pub fn canceller<C>(mut self, canceller: C) -> Self
    where
        C: FnOnce(Resolver<T>) -> Result<(), Failure> + 'static,
    {
        self.canceller = Some(Box::new(canceller));
        self
    }

    /// Binds the promise to a shared-data context.
    #[must_use]
    pub fn shared_data(mut self, shared: SharedData) -> Self {
        self.shared = Some(shared);
        self
    }

    /// Creates the promise and runs `resolver` synchronously.
    ///
    /// An `Err` or panic from `resolver` rejects the promise unless it has
    /// already settled.
    pub fn build<F>(self, resolver: F) -> Promise<T>
    where
        F: FnOnce(Resolver<T>) -> Result<(), Failure>,
    {
        let promise = Promise::pending(self.canceller, self.shared);
        trace!(promise = %promise.id(), "running resolver function");
        let capability = Resolver::new(promise.clone());
        if let Err(failure) = guarded(|| resolver(capability.clone())) {
            capability.reject(failure);
        }
        promise
    }
}

impl<T> Promise<T> {
    /// Returns this promise's identifier.
    #[must_use]
    pub fn id(&self) -> PromiseId {
        self.inner.borrow().id
    }

    /// Returns the shared-data context, if bound to one.
    #[must_use]
    pub fn shared_data(&self) -> Option<SharedData> {
        self.inner.borrow().shared.clone()
    }

    /// Returns true if both handles refer to the same promise.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Binds this promise to `shared`.
    ///
    /// Adopts it when unbound, otherwise folds it into the current context.
    pub(crate) fn bind_context(&self, shared: SharedData) {
        match self.shared_data() {
            Some(mine) => mine.merge(&shared),
            None => self.inner.borrow_mut().shared = Some(shared),
        }
    }

    fn adopt_shared(&self, target: &Self) {
        if let Some(theirs) = target.shared_data() {
            self.bind_context(theirs);
        }
    }
}

impl<T: Clone + 'static> Promise<T> {
    /// Creates a promise and runs `resolver` synchronously.
    ///
    /// ```
    /// use promissory::Promise;
    ///
    /// let p = Promise::new(|resolver| {
    ///     resolver.fulfill(2);
    ///     Ok(())
    /// });
    /// let doubled = p.then(|v| Ok(v * 2));
    /// assert_eq!(doubled.outcome(), Some(Ok(4)));
    /// ```
    pub fn new<F>(resolver: F) -> Self
    where
        F: FnOnce(Resolver<T>) -> Result<(), Failure>,
    {
        Self::builder().build(resolver)
    }

    /// Starts a [`PromiseBuilder`].
    #[must_use]
    pub fn builder() -> PromiseBuilder<T> {
        PromiseBuilder {
            canceller: None,
            shared: None,
        }
    }

    /// An already-fulfilled promise.
    #[must_use]
    pub fn fulfilled(value: T) -> Self {
        Self::settled(Ok(value), None)
    }

    /// An already-rejected promise.
    #[must_use]
    pub fn rejected(failure: impl Into<Failure>) -> Self {
        Self::settled(Err(failure.into()), None)
    }

    pub(crate) fn settled(outcome: Result<T, Failure>, shared: Option<SharedData>) -> Self {
        let state = match outcome {
            Ok(value) => State::Fulfilled(value),
            Err(failure) => State::Rejected(failure),
        };
        Self::with_state(state, None, shared)
    }

    pub(crate) fn pending(canceller: Option<Canceller<T>>, shared: Option<SharedData>) -> Self {
        Self::with_state(State::pending(), canceller, shared)
    }

    fn with_state(
        state: State<T>,
        canceller: Option<Canceller<T>>,
        shared: Option<SharedData>,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                id: PromiseId::next(),
                state,
                canceller,
                required_cancel_requests: 0,
                shared,
            })),
        }
    }

    /// Returns the shared-data context, binding a fresh one if there is none.
    ///
    /// The fresh context takes its scenario and kind from the active
    /// [`EngineConfig`](crate::config::EngineConfig).
    #[must_use]
    pub fn context(&self) -> SharedData {
        let mut inner = self.inner.borrow_mut();
        inner.shared.get_or_insert_with(SharedData::new).clone()
    }

    /// Returns the observable state, looking through followed promises.
    #[must_use]
    pub fn state(&self) -> PromiseState {
        match self.unwrap_chain().1 {
            Snapshot::Fulfilled(_) => PromiseState::Fulfilled,
            Snapshot::Rejected(_) => PromiseState::Rejected,
            Snapshot::Pending | Snapshot::Following(_) => PromiseState::Pending,
        }
    }

    /// Returns true while no outcome is known.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state() == PromiseState::Pending
    }

    /// Returns the outcome, if known.
    #[must_use]
    pub fn outcome(&self) -> Option<Result<T, Failure>> {
        match self.unwrap_chain().1 {
            Snapshot::Fulfilled(value) => Some(Ok(value)),
            Snapshot::Rejected(failure) => Some(Err(failure)),
            Snapshot::Pending | Snapshot::Following(_) => None,
        }
    }

    fn snapshot(&self) -> Snapshot<T> {
        match &self.inner.borrow().state {
            State::Pending { .. } => Snapshot::Pending,
            State::Following(target) => Snapshot::Following(target.clone()),
            State::Fulfilled(value) => Snapshot::Fulfilled(value.clone()),
            State::Rejected(failure) => Snapshot::Rejected(failure.clone()),
        }
    }

    /// Follows the chain to the promise that holds the outcome.
    ///
    /// The returned snapshot is never `Following`.
    fn unwrap_chain(&self) -> (Self, Snapshot<T>) {
        let mut current = self.clone();
        loop {
            match current.snapshot() {
                Snapshot::Following(next) => current = next,
                terminal => return (current, terminal),
            }
        }
    }

    fn is_unresolved(&self) -> bool {
        matches!(self.inner.borrow().state, State::Pending { .. })
    }

    /// Registers a reaction and returns the derived promise.
    ///
    /// The derived promise settles with the handler's result, or mirrors
    /// this promise when the matching handler is absent.
    pub fn then_with<U: Clone + 'static>(&self, reaction: Reaction<T, U>) -> Promise<U> {
        match self.snapshot() {
            Snapshot::Following(target) => target.then_with(reaction),
            Snapshot::Fulfilled(value) => {
                let on_fulfilled = reaction.on_fulfilled;
                let context: &ContextAccess = &|| self.context();
                let next = guarded(|| Ok(on_fulfilled(value, context)))
                    .unwrap_or_else(Resolution::Failure);
                resolution::resolve_with(next, self.shared_data())
            }
            Snapshot::Rejected(failure) => match reaction.on_rejected {
                Some(on_rejected) => {
                    let context: &ContextAccess = &|| self.context();
                    let next = guarded(|| Ok(on_rejected(failure, context)))
                        .unwrap_or_else(Resolution::Failure);
                    resolution::resolve_with(next, self.shared_data())
                }
                None => Promise::settled(Err(failure), self.shared_data()),
            },
            Snapshot::Pending => self.derive(reaction),
        }
    }

    fn derive<U: Clone + 'static>(&self, reaction: Reaction<T, U>) -> Promise<U> {
        let has_canceller = self.inner.borrow().canceller.is_some();
        let canceller: Option<Canceller<U>> = if has_canceller {
            self.inner.borrow_mut().required_cancel_requests += 1;
            let parent = self.clone();
            Some(Box::new(move |_| {
                parent.release_cancel_request();
                Ok(())
            }))
        } else {
            None
        };
        let derived = Promise::pending(canceller, self.shared_data());
        let resolver = Resolver::new(derived.clone());
        trace!(parent = %self.id(), derived = %derived.id(), "registered reaction");

        let Reaction {
            on_fulfilled,
            on_rejected,
            on_progress,
        } = reaction;
        let notify = resolver.clone();
        let listener: ProgressListener = Rc::new(move |update: Progress| {
            let update = match &on_progress {
                Some(transform) => guarded(|| transform(update)).unwrap_or_else(Progress::Failure),
                None => update,
            };
            notify.notify(update);
        });
        let forward = Rc::clone(&listener);
        let bound = derived.clone();
        let handler: Handler<T> = Box::new(move |target| {
            if let Some(shared) = target.shared_data() {
                bound.bind_context(shared);
            }
            let next = target.then_with(Reaction {
                on_fulfilled,
                on_rejected,
                on_progress: None,
            });
            next.done_with(Consumer::adopting(&resolver, &next).with_listener(forward));
        });
        self.push_handler(handler, Some(listener));
        derived
    }

    fn push_handler(&self, handler: Handler<T>, listener: Option<ProgressListener>) {
        let late = {
            let mut inner = self.inner.borrow_mut();
            match &mut inner.state {
                State::Pending { handlers, progress } => {
                    handlers.push(handler);
                    progress.extend(listener);
                    None
                }
                _ => Some(handler),
            }
        };
        if let Some(handler) = late {
            let (target, _) = self.unwrap_chain();
            handler(&target);
        }
    }

    /// Chains a fallible transformation of the value.
    ///
    /// Failures pass through untouched.
    pub fn then<U, F>(&self, on_fulfilled: F) -> Promise<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<U, Failure> + 'static,
    {
        self.then_with(Reaction::new(on_fulfilled))
    }

    /// Chains a transformation that may return another promise.
    pub fn and_then<U, F, R>(&self, on_fulfilled: F) -> Promise<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> R + 'static,
        R: Into<Resolution<U>>,
    {
        self.then_with(Reaction::new(on_fulfilled))
    }

    /// Chains handlers for both outcomes.
    pub fn then_else<U, F, G>(&self, on_fulfilled: F, on_rejected: G) -> Promise<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<U, Failure> + 'static,
        G: FnOnce(Failure) -> Result<U, Failure> + 'static,
    {
        self.then_with(Reaction::new(on_fulfilled).rejected(on_rejected))
    }

    /// Recovers from any failure.
    pub fn catch<G>(&self, on_rejected: G) -> Self
    where
        G: FnOnce(Failure) -> Result<T, Failure> + 'static,
    {
        self.then_with(Reaction::passthrough().rejected(on_rejected))
    }

    /// Recovers from any failure with a resolution, possibly a promise.
    pub fn or_else<G, R>(&self, on_rejected: G) -> Self
    where
        G: FnOnce(Failure) -> R + 'static,
        R: Into<Resolution<T>>,
    {
        self.then_with(Reaction::passthrough().rejected(on_rejected))
    }

    /// Recovers only from failures of variant `E`.
    ///
    /// ```
    /// use promissory::{Failure, Promise, TimeoutError};
    ///
    /// let p: Promise<u32> = Promise::rejected(Failure::user("bad input"));
    /// let recovered = p.otherwise(|_: TimeoutError| Ok::<_, Failure>(0));
    /// assert!(matches!(recovered.outcome(), Some(Err(Failure::User(_)))));
    /// ```
    pub fn otherwise<E, G, R>(&self, on_rejected: G) -> Self
    where
        E: Rejection,
        G: FnOnce(E) -> R + 'static,
        R: Into<Resolution<T>>,
    {
        self.then_with(Reaction::passthrough().rejected(move |failure: Failure| {
            match E::from_failure(&failure) {
                Some(matched) => on_rejected(matched).into(),
                None => Resolution::Failure(failure),
            }
        }))
    }

    /// Runs `on_settled` on either outcome, then re-emits the original
    /// outcome once its result settles.
    ///
    /// If `on_settled` fails, or returns a promise that rejects, the derived
    /// promise rejects with that failure instead.
    pub fn always<F, R>(&self, on_settled: F) -> Self
    where
        F: FnOnce() -> R + 'static,
        R: Into<Resolution<()>>,
    {
        let slot = Rc::new(RefCell::new(Some(on_settled)));
        let on_failure = Rc::clone(&slot);
        self.then_with(
            Reaction::new(move |value: T| {
                let taken = slot.borrow_mut().take();
                let Some(on_settled) = taken else {
                    return Resolution::Value(value);
                };
                Resolution::Promise(resolve::<()>(on_settled()).then(move |()| Ok(value)))
            })
            .rejected(move |failure: Failure| {
                let taken = on_failure.borrow_mut().take();
                let Some(on_settled) = taken else {
                    return Resolution::Failure(failure);
                };
                Resolution::Promise(resolve::<()>(on_settled()).then(move |()| Err(failure)))
            }),
        )
    }

    /// Chains a transformation that also sees the chain's shared-data
    /// context.
    ///
    /// The context is the one the chain carries once this promise settles;
    /// an unbound chain gets a fresh context.
    ///
    /// ```
    /// use promissory::{Promise, SharedData};
    ///
    /// let ctx = SharedData::new();
    /// ctx.add("user", "ada");
    /// let p = Promise::builder().shared_data(ctx).build(|r| {
    ///     r.fulfill(1);
    ///     Ok(())
    /// });
    /// let greeted = p.then_shared(|v, shared| Ok(format!("{v}:{}", shared.get("user").unwrap())));
    /// assert_eq!(greeted.outcome(), Some(Ok("1:\"ada\"".to_string())));
    /// ```
    pub fn then_shared<U, F, R>(&self, on_fulfilled: F) -> Promise<U>
    where
        U: Clone + 'static,
        F: FnOnce(T, &SharedData) -> R + 'static,
        R: Into<Resolution<U>>,
    {
        self.then_with(Reaction::shared(on_fulfilled))
    }

    /// Like [`Promise::always`], handing the chain's context to `on_settled`.
    pub fn always_shared<F, R>(&self, on_settled: F) -> Self
    where
        F: FnOnce(&SharedData) -> R + 'static,
        R: Into<Resolution<()>>,
    {
        let slot = Rc::new(RefCell::new(Some(on_settled)));
        let on_failure = Rc::clone(&slot);
        self.then_with(
            Reaction::shared(move |value: T, shared: &SharedData| {
                let taken = slot.borrow_mut().take();
                let Some(on_settled) = taken else {
                    return Resolution::Value(value);
                };
                Resolution::Promise(resolve::<()>(on_settled(shared)).then(move |()| Ok(value)))
            })
            .rejected_shared(move |failure: Failure, shared: &SharedData| {
                let taken = on_failure.borrow_mut().take();
                let Some(on_settled) = taken else {
                    return Resolution::Failure(failure);
                };
                Resolution::Promise(resolve::<()>(on_settled(shared)).then(move |()| Err(failure)))
            }),
        )
    }

    /// Observes progress notifications.
    ///
    /// The transform's result is forwarded to the derived promise's
    /// listeners.
    pub fn progress<P>(&self, on_progress: P) -> Self
    where
        P: Fn(Progress) -> Result<Progress, Failure> + 'static,
    {
        self.then_with(Reaction::passthrough().progress(on_progress))
    }

    /// Returns a promise mirroring this one.
    ///
    /// A settled promise returns itself.
    #[must_use]
    pub fn chain(&self) -> Self {
        if self.is_pending() {
            self.then_with(Reaction::passthrough())
        } else {
            self.clone()
        }
    }

    /// Consumes the outcome without creating a derived promise.
    ///
    /// A failure reaching a consumer with no rejection handler is
    /// escalated through [`unhandled::escalate`].
    pub fn done_with(&self, consumer: Consumer<T>) {
        match self.snapshot() {
            Snapshot::Following(target) => target.done_with(consumer),
            Snapshot::Fulfilled(value) => {
                if let Some(on_fulfilled) = consumer.on_fulfilled {
                    on_fulfilled(value);
                }
            }
            Snapshot::Rejected(failure) => match consumer.on_rejected {
                Some(on_rejected) => on_rejected(failure),
                None => unhandled::escalate(failure),
            },
            Snapshot::Pending => {
                let Consumer {
                    on_fulfilled,
                    on_rejected,
                    on_progress,
                } = consumer;
                let handler: Handler<T> = Box::new(move |target| {
                    target.done_with(Consumer {
                        on_fulfilled,
                        on_rejected,
                        on_progress: None,
                    });
                });
                self.push_handler(handler, on_progress);
            }
        }
    }

    /// Consumes the value; failures escalate.
    pub fn done<F>(&self, on_fulfilled: F)
    where
        F: FnOnce(T) + 'static,
    {
        self.done_with(Consumer::new().fulfilled(on_fulfilled));
    }

    /// Consumes either outcome.
    pub fn done_else<F, G>(&self, on_fulfilled: F, on_rejected: G)
    where
        F: FnOnce(T) + 'static,
        G: FnOnce(Failure) + 'static,
    {
        self.done_with(Consumer::new().fulfilled(on_fulfilled).rejected(on_rejected));
    }

    /// Ends the chain; a failure escalates.
    pub fn finish(&self) {
        self.done_with(Consumer::new());
    }

    /// Requests cancellation.
    ///
    /// Invokes the canceller at most once. A promise following another
    /// pending promise also forwards the request to that promise once all
    /// of its dependents have asked.
    pub fn cancel(&self) {
        let (canceller, following) = {
            let mut inner = self.inner.borrow_mut();
            let canceller = inner.canceller.take();
            let following = match &inner.state {
                State::Following(target) => Some(target.clone()),
                _ => None,
            };
            (canceller, following)
        };

        let mut forward = None;
        if let Some(target) = following {
            let (root, snapshot) = target.unwrap_chain();
            if !matches!(snapshot, Snapshot::Pending) {
                return;
            }
            let released = {
                let mut inner = root.inner.borrow_mut();
                inner.required_cancel_requests = inner.required_cancel_requests.saturating_sub(1);
                inner.required_cancel_requests == 0
            };
            if released {
                forward = Some(root);
            }
        }

        if let Some(canceller) = canceller {
            debug!(promise = %self.id(), "invoking canceller");
            let capability = Resolver::new(self.clone());
            if let Err(failure) = guarded(|| canceller(capability.clone())) {
                capability.reject(failure);
            }
        }

        if let Some(root) = forward {
            root.cancel();
        }
    }

    fn release_cancel_request(&self) {
        let released = {
            let mut inner = self.inner.borrow_mut();
            inner.required_cancel_requests = inner.required_cancel_requests.saturating_sub(1);
            inner.required_cancel_requests == 0
        };
        if released {
            self.cancel();
        }
    }

    pub(crate) fn resolve_from(&self, resolution: Resolution<T>) {
        if !self.is_unresolved() {
            return;
        }
        let target = resolution::resolve_with(resolution, self.shared_data());
        self.settle(target);
    }

    pub(crate) fn reject_with(&self, failure: Failure) {
        if !self.is_unresolved() {
            return;
        }
        let target = Self::settled(Err(failure), self.shared_data());
        self.settle(target);
    }

    pub(crate) fn notify_progress(&self, update: Progress) {
        let listeners = match &self.inner.borrow().state {
            State::Pending { progress, .. } => progress.clone(),
            _ => Vec::new(),
        };
        for listener in listeners {
            listener(update.clone());
        }
    }

    fn settle(&self, target: Self) {
        if !self.is_unresolved() {
            return;
        }
        let (mut target, mut snapshot) = target.unwrap_chain();
        if target.ptr_eq(self) {
            trace!(promise = %self.id(), "rejecting self-resolution");
            target = Self::settled(Err(Failure::SelfResolution), None);
            snapshot = Snapshot::Rejected(Failure::SelfResolution);
        }
        self.adopt_shared(&target);

        let (state, following) = match snapshot {
            Snapshot::Fulfilled(value) => (State::Fulfilled(value), false),
            Snapshot::Rejected(failure) => (State::Rejected(failure), false),
            Snapshot::Pending | Snapshot::Following(_) => {
                target.inner.borrow_mut().required_cancel_requests += 1;
                (State::Following(target.clone()), true)
            }
        };
        let handlers = {
            let mut inner = self.inner.borrow_mut();
            if !following {
                inner.canceller = None;
            }
            match std::mem::replace(&mut inner.state, state) {
                State::Pending { handlers, .. } => handlers,
                _ => SmallVec::new(),
            }
        };
        trace!(
            promise = %self.id(),
            following = following,
            handlers = handlers.len(),
            "promise resolved"
        );
        let observed = if following { target } else { self.clone() };
        dispatch(handlers, &observed);
    }

}

/// Runs every handler, then re-raises the first panic among them.
fn dispatch<T>(handlers: SmallVec<[Handler<T>; 2]>, target: &Promise<T>) {
    let mut escaped: Option<Box<dyn Any + Send>> = None;
    for handler in handlers {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler(target))) {
            if escaped.is_none() {
                escaped = Some(payload);
            }
        }
    }
    if let Some(payload) = escaped {
        panic::resume_unwind(payload);
    }
}

impl<T: Clone + 'static> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}
