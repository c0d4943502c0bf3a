//! Helpers for the integration tests.
//!
//! Pull in with `#[macro_use] mod common; use common::*;`.

#![allow(dead_code)]

use promissory::lab::VirtualScheduler;
use promissory::{Promise, Resolver};
use proptest::prelude::ProptestConfig;
use proptest::test_runner::RngSeed;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

static LOGGING: Once = Once::new();

/// Seed used on CI when none is given explicitly.
pub const CI_PROPTEST_SEED: u64 = 0x5EED_5EED;

/// Proptest settings for `cases` cases.
///
/// `PROMISSORY_PROPTEST_SEED` pins the RNG seed (CI pins it to
/// [`CI_PROPTEST_SEED`]) unless proptest's own `PROPTEST_RNG_SEED` is set.
/// `PROMISSORY_PROPTEST_MAX_SHRINK_ITERS` bounds shrinking.
#[must_use]
pub fn test_proptest_config(cases: u32) -> ProptestConfig {
    let mut config = ProptestConfig::with_cases(cases);
    let seed = env_u64("PROMISSORY_PROPTEST_SEED")
        .or_else(|| std::env::var_os("CI").map(|_| CI_PROPTEST_SEED));
    if let Some(seed) = seed.filter(|_| matches!(config.rng_seed, RngSeed::Random)) {
        config.rng_seed = RngSeed::Fixed(seed);
    }
    if let Some(iters) = env_u64("PROMISSORY_PROPTEST_MAX_SHRINK_ITERS") {
        config.max_shrink_iters = u32::try_from(iters).unwrap_or(u32::MAX);
    }
    config
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok()?.parse().ok()
}

/// Trace-level logging through the test writer; idempotent.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}

/// A fresh virtual scheduler at time zero.
#[must_use]
pub fn test_scheduler() -> VirtualScheduler {
    init_test_logging();
    VirtualScheduler::new()
}

/// A pending promise and the resolver that settles it.
#[must_use]
pub fn deferred<T: Clone + 'static>() -> (Promise<T>, Resolver<T>) {
    let slot = Rc::new(RefCell::new(None));
    let captured = Rc::clone(&slot);
    let promise = Promise::new(move |resolver| {
        *captured.borrow_mut() = Some(resolver);
        Ok(())
    });
    let resolver = slot
        .borrow_mut()
        .take()
        .expect("resolver function runs synchronously");
    (promise, resolver)
}

/// What the handlers saw, in order.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Rc<RefCell<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }
}

macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(test = %$name, ">>> {}", $name);
    };
}

macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "<<< {} passed", $name);
    };
}

macro_rules! assert_fulfilled {
    ($promise:expr, $expected:expr) => {
        match $promise.outcome() {
            Some(Ok(value)) => assert_eq!(value, $expected),
            other => panic!("expected fulfillment with {:?}, got {:?}", $expected, other),
        }
    };
}

macro_rules! assert_rejected {
    ($promise:expr) => {
        assert_rejected!($promise, _)
    };
    ($promise:expr, $pattern:pat) => {
        match $promise.outcome() {
            Some(Err($pattern)) => {}
            other => panic!(
                "expected rejection matching `{}`, got {:?}",
                stringify!($pattern),
                other
            ),
        }
    };
}

macro_rules! assert_pending {
    ($promise:expr) => {
        if let Some(outcome) = $promise.outcome() {
            panic!("expected pending, got {:?}", outcome);
        }
    };
}
