//! Property-based tests for the decay state machine.
//!
//! These tests verify the key invariants of relationship authority using
//! property-based testing with proptest.

use std::sync::Arc;

use proptest::prelude::*;

use crate::identity::Identity;
use crate::time::{Clock, ManualClock};

use super::engine::AuthorityEngine;

/// Strategy for authority values in a range that leaves headroom for
/// ceiling and boost arithmetic.
fn authority_value() -> impl Strategy<Value = u128> {
    0u128..1_000_000_000_000_000_000_000_000
}

/// Strategy for strictly positive decay rates.
fn decay_rate() -> impl Strategy<Value = u128> {
    1u128..1_000_000_000_000_000_000
}

/// Strategy for time gaps between operations.
fn time_gap() -> impl Strategy<Value = u64> {
    0u64..10_000_000
}

fn engine_with(
    initial: u128,
    ceiling: u128,
    decay: u128,
) -> (Arc<ManualClock>, AuthorityEngine, super::RelationshipId) {
    let clock = Arc::new(ManualClock::new(1));
    let mut engine = AuthorityEngine::new(clock.clone());
    let id = engine
        .create(
            Identity::named("alice"),
            Identity::named("agent-1"),
            initial,
            ceiling,
            decay,
        )
        .expect("valid creation parameters");
    (clock, engine, id)
}

proptest! {
    /// Property: effective authority never exceeds the stored value, and
    /// never increases as time passes.
    #[test]
    fn prop_decay_is_monotonically_decreasing(
        initial in authority_value(),
        headroom in authority_value(),
        decay in decay_rate(),
        gaps in prop::collection::vec(time_gap(), 1..10),
    ) {
        let ceiling = initial.saturating_add(headroom);
        let (clock, engine, id) = engine_with(initial, ceiling, decay);

        let mut previous = engine.effective_authority(id).unwrap();
        prop_assert!(previous <= initial);

        for gap in gaps {
            clock.advance(gap);
            let current = engine.effective_authority(id).unwrap();
            prop_assert!(current <= previous);
            previous = current;
        }
    }

    /// Property: stored authority never exceeds the ceiling after any
    /// interleaving of heartbeats, boosts, and slashes.
    #[test]
    fn prop_stored_authority_never_exceeds_ceiling(
        initial in authority_value(),
        headroom in authority_value(),
        decay in decay_rate(),
        ops in prop::collection::vec((0u8..3, authority_value(), time_gap()), 0..20),
    ) {
        let ceiling = initial.saturating_add(headroom);
        let (clock, mut engine, id) = engine_with(initial, ceiling, decay);
        let principal = Identity::named("alice");

        for (op, amount, gap) in ops {
            clock.advance(gap);
            match op {
                0 => {
                    let _ = engine.heartbeat(principal, id);
                },
                1 => {
                    let _ = engine.boost(principal, id, amount);
                },
                _ => {
                    // A fresh slasher identity per gap sidesteps the
                    // cooldown so the invariant is exercised, not the
                    // rate limit.
                    let slasher = Identity::named(&format!("slasher-{gap}"));
                    let _ = engine.slash(slasher, id, amount);
                },
            }
            let record = engine.get_relationship(id).unwrap();
            prop_assert!(record.stored_authority() <= record.ceiling());
        }
    }

    /// Property: a heartbeat leaves effective authority unchanged; it only
    /// rebases the decay origin.
    #[test]
    fn prop_heartbeat_preserves_effective(
        initial in authority_value(),
        decay in decay_rate(),
        gap in time_gap(),
    ) {
        let (clock, mut engine, id) = engine_with(initial, initial, decay);
        clock.advance(gap);

        let before = engine.effective_authority(id).unwrap();
        let materialized = engine.heartbeat(Identity::named("alice"), id).unwrap();
        let after = engine.effective_authority(id).unwrap();

        prop_assert_eq!(before, materialized);
        prop_assert_eq!(before, after);
    }

    /// Property: a slash of any amount lands exactly at
    /// `effective - min(effective, amount)` and never kills.
    #[test]
    fn prop_slash_floors_at_zero(
        initial in authority_value(),
        decay in decay_rate(),
        amount in 1u128..u128::MAX,
    ) {
        let (_clock, mut engine, id) = engine_with(initial, initial, decay);
        let effective = engine.effective_authority(id).unwrap();

        let after = engine
            .slash(Identity::named("slasher"), id, amount)
            .unwrap();

        prop_assert_eq!(after, effective - effective.min(amount));
        prop_assert!(engine.is_alive(id));
    }

    /// Property: time_to_zero is consistent with authority_at — the
    /// projected authority one second past the horizon is zero.
    #[test]
    fn prop_time_to_zero_matches_projection(
        initial in authority_value(),
        decay in decay_rate(),
    ) {
        // Horizons beyond u64 seconds saturate and cannot be projected.
        prop_assume!(initial / decay < u128::from(u64::MAX));
        let (clock, engine, id) = engine_with(initial, initial, decay);

        let horizon = engine.time_to_zero(id).unwrap();
        let at = clock.now_secs().saturating_add(horizon).saturating_add(1);
        prop_assert_eq!(engine.authority_at(id, at).unwrap(), 0);
    }
}
