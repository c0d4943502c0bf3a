//! Property tests for promise and combinator laws.
//!
//! # Laws Tested
//!
//! - settle-once: only the first of many resolutions takes effect
//! - handler order: handlers observe the outcome in registration order
//! - `all` preserves input order whatever the settlement order
//! - `race` settles like the earliest input, ties broken by arming order
//! - `reduce` agrees with a synchronous left fold
//! - `some` fulfills iff at least `required` inputs fulfill
//! - merge scenario: merged entries keep every write in order

#[macro_use]
mod common;

use common::*;
use promissory::combinator::delay;
use promissory::lab::VirtualScheduler;
use promissory::{
    all, race, reduce, some, Failure, Promise, Resolution, Scenario, SharedData, StoreKind,
};
use proptest::prelude::*;
use serde_json::json;
use std::time::Duration;

/// An input settling after `millis` with `Ok(value)` or a failure.
fn timed(scheduler: &VirtualScheduler, millis: u64, value: i64, fails: bool) -> Promise<i64> {
    delay(scheduler, Duration::from_millis(millis)).then(move |_| {
        if fails {
            Err(Failure::user(format!("input {value} failed")))
        } else {
            Ok(value)
        }
    })
}

fn arb_schedule() -> impl Strategy<Value = Vec<(u64, i64)>> {
    proptest::collection::vec((0u64..50, -1000i64..1000), 1..12)
}

proptest! {
    #![proptest_config(test_proptest_config(64))]

    #[test]
    fn settle_once_keeps_first_resolution(values in proptest::collection::vec(any::<i32>(), 1..8)) {
        init_test_logging();
        let (promise, resolver) = deferred::<i32>();
        for value in &values {
            resolver.fulfill(*value);
        }
        prop_assert_eq!(promise.outcome(), Some(Ok(values[0])));
    }

    #[test]
    fn handlers_observe_registration_order(count in 1usize..16) {
        init_test_logging();
        let journal = Journal::new();
        let (promise, resolver) = deferred::<u8>();
        for idx in 0..count {
            let journal = journal.clone();
            promise.done(move |_| journal.record(idx.to_string()));
        }
        resolver.fulfill(0);
        let expected: Vec<String> = (0..count).map(|idx| idx.to_string()).collect();
        prop_assert_eq!(journal.entries(), expected);
    }

    #[test]
    fn all_preserves_input_order(schedule in arb_schedule()) {
        init_test_logging();
        let scheduler = VirtualScheduler::new();
        let inputs: Vec<_> = schedule
            .iter()
            .map(|&(millis, value)| timed(&scheduler, millis, value, false))
            .collect();
        let combined = all(inputs);
        scheduler.run_until_idle();
        let expected: Vec<i64> = schedule.iter().map(|&(_, value)| value).collect();
        prop_assert_eq!(combined.outcome(), Some(Ok(expected)));
    }

    #[test]
    fn race_settles_like_earliest_input(schedule in arb_schedule()) {
        init_test_logging();
        let scheduler = VirtualScheduler::new();
        let inputs: Vec<_> = schedule
            .iter()
            .map(|&(millis, value)| timed(&scheduler, millis, value, false))
            .collect();
        let winner = race(inputs);
        scheduler.run_until_idle();
        let earliest = schedule
            .iter()
            .enumerate()
            .min_by_key(|&(idx, &(millis, _))| (millis, idx))
            .map(|(_, &(_, value))| value);
        prop_assert_eq!(winner.outcome(), earliest.map(Ok));
    }

    #[test]
    fn reduce_agrees_with_left_fold(schedule in arb_schedule(), seed in -100i64..100) {
        init_test_logging();
        let scheduler = VirtualScheduler::new();
        let inputs: Vec<_> = schedule
            .iter()
            .map(|&(millis, value)| timed(&scheduler, millis, value, false))
            .collect();
        let folded = reduce(
            inputs,
            |acc: i64, value: i64, index, _| Ok::<_, Failure>(acc.wrapping_mul(31).wrapping_add(value + index as i64)),
            Resolution::value(seed),
        );
        scheduler.run_until_idle();
        let expected = schedule
            .iter()
            .enumerate()
            .fold(seed, |acc, (index, &(_, value))| acc.wrapping_mul(31).wrapping_add(value + index as i64));
        prop_assert_eq!(folded.outcome(), Some(Ok(expected)));
    }

    #[test]
    fn some_fulfills_iff_enough_inputs_fulfill(
        plan in proptest::collection::vec((0u64..50, any::<bool>()), 1..10),
        required_seed in any::<usize>(),
    ) {
        init_test_logging();
        let required = 1 + required_seed % plan.len();
        let scheduler = VirtualScheduler::new();
        let inputs: Vec<_> = plan
            .iter()
            .enumerate()
            .map(|(idx, &(millis, fails))| timed(&scheduler, millis, idx as i64, fails))
            .collect();
        let quorum = some(inputs, required).expect("required within bounds");
        scheduler.run_until_idle();
        let successes = plan.iter().filter(|&&(_, fails)| !fails).count();
        match quorum.outcome() {
            Some(Ok(values)) => {
                prop_assert!(successes >= required);
                prop_assert_eq!(values.len(), required);
            }
            Some(Err(Failure::Aggregate(e))) => {
                prop_assert!(successes < required);
                prop_assert!(e.reasons.len() > plan.len() - required);
            }
            other => prop_assert!(false, "unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn merge_scenario_keeps_every_write(writes in proptest::collection::vec(any::<i32>(), 1..10)) {
        init_test_logging();
        let ctx = SharedData::with_options(Scenario::Merge, StoreKind::Arbitrary);
        for value in &writes {
            ctx.add("k", *value);
        }
        let expected = if writes.len() == 1 { json!(writes[0]) } else { json!(writes) };
        prop_assert_eq!(ctx.get("k"), Some(expected));
    }
}
