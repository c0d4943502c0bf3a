//! Sequential execution: start one operation only after the previous one
//! fulfilled.
//!
//! Unlike the parallel combinators, an [`OrderedExecutionQueue`] keeps its
//! operations as unnormalized [`Resolution`]s until it pops them, so a lazy
//! operation is not started before its turn. The first rejection invokes
//! the run's [`CancellationQueue`], discards every operation not yet
//! started and rejects the combined promise.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::cancel::CancellationQueue;
use crate::error::Failure;
use crate::promise::{resolve, Consumer, Promise, Resolution, Resolver};
use crate::tracing_compat::{debug, trace};

struct Run<T> {
    waiting: VecDeque<Resolution<T>>,
    results: Vec<T>,
    cancellation: CancellationQueue,
    promise: Option<Promise<Vec<T>>>,
    resolver: Option<Resolver<Vec<T>>>,
    abandoned: bool,
}

/// FIFO of operations resolved strictly one after another.
///
/// Clones share the same queue.
///
/// ```
/// use promissory::{LazyPromise, OrderedExecutionQueue, Promise, Resolution};
///
/// let queue = OrderedExecutionQueue::new();
/// queue.enqueue(Resolution::value(1));
/// queue.enqueue(LazyPromise::new(|| Promise::fulfilled(2)));
/// assert_eq!(queue.run().outcome(), Some(Ok(vec![1, 2])));
/// ```
pub struct OrderedExecutionQueue<T> {
    run: Rc<RefCell<Run<T>>>,
}

impl<T> Clone for OrderedExecutionQueue<T> {
    fn clone(&self) -> Self {
        Self {
            run: Rc::clone(&self.run),
        }
    }
}

impl<T: Clone + 'static> OrderedExecutionQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run: Rc::new(RefCell::new(Run {
                waiting: VecDeque::new(),
                results: Vec::new(),
                cancellation: CancellationQueue::new(),
                promise: None,
                resolver: None,
                abandoned: false,
            })),
        }
    }

    /// Appends an operation.
    ///
    /// Operations appended while a run is in flight are picked up by it;
    /// operations appended after the run settled are never started.
    pub fn enqueue(&self, operation: impl Into<Resolution<T>>) {
        self.run.borrow_mut().waiting.push_back(operation.into());
    }

    /// Appends every operation in order.
    pub fn enqueue_all<I, R>(&self, operations: I)
    where
        I: IntoIterator<Item = R>,
        R: Into<Resolution<T>>,
    {
        self.run
            .borrow_mut()
            .waiting
            .extend(operations.into_iter().map(Into::into));
    }

    /// Returns the number of operations not yet started.
    #[must_use]
    pub fn len(&self) -> usize {
        self.run.borrow().waiting.len()
    }

    /// Returns true if no operation is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.run.borrow().waiting.is_empty()
    }

    /// Starts the run, returning the combined promise.
    ///
    /// Idempotent: later calls return the same promise.
    pub fn run(&self) -> Promise<Vec<T>> {
        if let Some(promise) = self.run.borrow().promise.clone() {
            return promise;
        }
        let on_cancel = self.clone();
        let slot = Rc::new(RefCell::new(None));
        let captured = Rc::clone(&slot);
        let promise = Promise::builder()
            .canceller(move |_| {
                on_cancel.abandon();
                Ok(())
            })
            .build(move |resolver| {
                *captured.borrow_mut() = Some(resolver);
                Ok(())
            });
        {
            let mut run = self.run.borrow_mut();
            run.promise = Some(promise.clone());
            run.resolver = slot.borrow_mut().take();
        }
        debug!(operations = self.len(), "ordered execution started");
        self.step();
        promise
    }

    fn step(&self) {
        loop {
            let (next, resolver) = {
                let mut run = self.run.borrow_mut();
                if run.abandoned {
                    return;
                }
                let Some(resolver) = run.resolver.clone() else {
                    return;
                };
                (run.waiting.pop_front(), resolver)
            };
            let Some(next) = next else {
                let results = std::mem::take(&mut self.run.borrow_mut().results);
                debug!(results = results.len(), "ordered execution finished");
                resolver.fulfill(results);
                return;
            };

            let operation = resolve(next);
            self.absorb_context(&operation);
            let cancellation = self.run.borrow().cancellation.clone();
            cancellation.enqueue(operation.clone());
            trace!(operation = %operation.id(), "ordered operation started");

            match operation.outcome() {
                Some(Ok(value)) => {
                    self.run.borrow_mut().results.push(value);
                }
                Some(Err(failure)) => {
                    self.fail(failure);
                    return;
                }
                None => {
                    let on_value = self.clone();
                    let on_failure = self.clone();
                    let settled = operation.clone();
                    operation.done_with(
                        Consumer::new()
                            .fulfilled(move |value| {
                                on_value.absorb_context(&settled);
                                on_value.run.borrow_mut().results.push(value);
                                on_value.step();
                            })
                            .rejected(move |failure| on_failure.fail(failure))
                            .progress(move |update| resolver.notify(update)),
                    );
                    return;
                }
            }
        }
    }

    /// Folds the operation's context into the combined promise's.
    fn absorb_context(&self, operation: &Promise<T>) {
        let promise = self.run.borrow().promise.clone();
        if let (Some(promise), Some(shared)) = (promise, operation.shared_data()) {
            promise.bind_context(shared);
        }
    }

    fn fail(&self, failure: Failure) {
        let (cancellation, resolver) = {
            let mut run = self.run.borrow_mut();
            run.waiting.clear();
            (run.cancellation.clone(), run.resolver.clone())
        };
        debug!(failure = %failure, "ordered execution rejected");
        cancellation.invoke();
        if let Some(resolver) = resolver {
            resolver.reject(failure);
        }
    }

    fn abandon(&self) {
        let (cancellation, discarded) = {
            let mut run = self.run.borrow_mut();
            run.abandoned = true;
            let discarded = run.waiting.len();
            run.waiting.clear();
            (run.cancellation.clone(), discarded)
        };
        debug!(discarded = discarded, "ordered execution cancelled");
        cancellation.invoke();
    }
}

impl<T: Clone + 'static> Default for OrderedExecutionQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for OrderedExecutionQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let run = self.run.borrow();
        f.debug_struct("OrderedExecutionQueue")
            .field("waiting", &run.waiting.len())
            .field("results", &run.results.len())
            .field("started", &run.promise.is_some())
            .field("abandoned", &run.abandoned)
            .finish()
    }
}

/// Resolves `inputs` one after another, fulfilling with their values in
/// order.
///
/// An empty input fulfills with an empty vector.
pub fn all_in_order<T, I, R>(inputs: I) -> Promise<Vec<T>>
where
    T: Clone + 'static,
    I: IntoIterator<Item = R>,
    R: Into<Resolution<T>>,
{
    let queue = OrderedExecutionQueue::new();
    queue.enqueue_all(inputs);
    if queue.is_empty() {
        return Promise::fulfilled(Vec::new());
    }
    queue.run()
}
