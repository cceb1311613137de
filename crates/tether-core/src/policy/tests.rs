//! Tests for the policy module.

use std::sync::Arc;

use crate::authority::AuthorityEngine;
use crate::events::Event;
use crate::identity::Identity;
use crate::time::ManualClock;

use super::engine::PolicyEngine;
use super::error::{
    DENY_REASON_BELOW_ALL_TIERS, DENY_REASON_BUDGET_EXCEEDED, DENY_REASON_TARGET_NOT_WHITELISTED,
    DENY_REASON_UNBOUND, PolicyError,
};
use super::types::{MAX_TIERS, Policy, PolicyTier, TIER_NONE};

/// One authority unit in 18-decimal fixed point.
const ONE: u128 = 1_000_000_000_000_000_000;

/// One USDC-style unit with 6 decimals.
const USD: u128 = 1_000_000;

const DAY: u64 = 86_400;

fn principal() -> Identity {
    Identity::named("alice")
}

fn agent() -> Identity {
    Identity::named("agent-1")
}

fn venue() -> Identity {
    Identity::named("venue")
}

fn tier(min: u128, cap: u128) -> PolicyTier {
    PolicyTier::new(min, cap, false, vec![])
}

/// Four tiers at 10/25/50/75 units with growing caps.
fn standard_tiers() -> Vec<PolicyTier> {
    vec![
        tier(10 * ONE, 1_000 * USD),
        tier(25 * ONE, 5_000 * USD),
        tier(50 * ONE, 20_000 * USD),
        tier(75 * ONE, 50_000 * USD),
    ]
}

struct Fixture {
    clock: Arc<ManualClock>,
    authority: AuthorityEngine,
    policy: PolicyEngine,
}

fn setup() -> Fixture {
    let clock = Arc::new(ManualClock::new(1_000_000));
    Fixture {
        clock: clock.clone(),
        authority: AuthorityEngine::new(clock.clone()),
        policy: PolicyEngine::new(clock),
    }
}

impl Fixture {
    /// Creates a relationship with the given authority and a negligible
    /// decay rate, bound to a freshly registered standard policy.
    fn bound_relationship(
        &mut self,
        authority: u128,
    ) -> (crate::authority::RelationshipId, super::types::PolicyId) {
        let id = self
            .authority
            .create(principal(), agent(), authority, 1_000 * ONE, 1)
            .unwrap();
        let policy_id = self.policy.create_policy(DAY, standard_tiers()).unwrap();
        self.policy
            .bind_policy(&self.authority, principal(), id, policy_id)
            .unwrap();
        (id, policy_id)
    }
}

// =============================================================================
// Policy creation
// =============================================================================

#[test]
fn test_create_policy_rejects_zero_tiers() {
    let mut fx = setup();
    assert_eq!(
        fx.policy.create_policy(DAY, vec![]),
        Err(PolicyError::InvalidTierCount { count: 0 })
    );
}

#[test]
fn test_create_policy_rejects_too_many_tiers() {
    let mut fx = setup();
    let tiers: Vec<_> = (0..9).map(|i| tier(i as u128 * ONE, USD)).collect();
    assert_eq!(
        fx.policy.create_policy(DAY, tiers),
        Err(PolicyError::InvalidTierCount { count: 9 })
    );
}

#[test]
fn test_create_policy_accepts_max_tiers() {
    let mut fx = setup();
    let tiers: Vec<_> = (0..MAX_TIERS)
        .map(|i| tier(u128::try_from(i).unwrap() * ONE, USD))
        .collect();
    assert!(fx.policy.create_policy(DAY, tiers).is_ok());
}

#[test]
fn test_create_policy_rejects_zero_epoch() {
    let mut fx = setup();
    assert_eq!(
        fx.policy.create_policy(0, standard_tiers()),
        Err(PolicyError::EpochDurationZero)
    );
}

#[test]
fn test_create_policy_rejects_non_ascending_tiers() {
    let mut fx = setup();
    let tiers = vec![tier(10 * ONE, USD), tier(10 * ONE, USD)];
    assert_eq!(
        fx.policy.create_policy(DAY, tiers),
        Err(PolicyError::TierAuthoritiesNotAscending { index: 1 })
    );
}

#[test]
fn test_policy_id_is_content_addressed() {
    let mut fx = setup();

    let id = fx.policy.create_policy(DAY, standard_tiers()).unwrap();
    let expected = Policy::new(DAY, standard_tiers()).unwrap().content_id();
    assert_eq!(id, expected);

    // Identical parameters re-register as the same id and are rejected.
    assert_eq!(
        fx.policy.create_policy(DAY, standard_tiers()),
        Err(PolicyError::PolicyAlreadyRegistered { policy: id })
    );
    assert_eq!(fx.policy.policy_count(), 1);
}

#[test]
fn test_policy_id_differs_on_any_parameter() {
    let base = Policy::new(DAY, standard_tiers()).unwrap().content_id();

    let longer_epoch = Policy::new(DAY + 1, standard_tiers()).unwrap().content_id();
    assert_ne!(base, longer_epoch);

    let mut tiers = standard_tiers();
    tiers[0].whitelist.push(venue());
    let with_whitelist = Policy::new(DAY, tiers).unwrap().content_id();
    assert_ne!(base, with_whitelist);
}

#[test]
fn test_from_arrays_rejects_length_mismatch() {
    let result = Policy::from_arrays(
        DAY,
        vec![10 * ONE, 25 * ONE],
        vec![USD],
        vec![false, true],
        vec![vec![], vec![]],
    );
    assert_eq!(
        result,
        Err(PolicyError::ArrayLengthMismatch {
            min_authorities: 2,
            spend_caps: 1,
            can_sub_delegate: 2,
            whitelists: 2,
        })
    );
}

#[test]
fn test_from_arrays_matches_tier_construction() {
    let from_arrays = Policy::from_arrays(
        DAY,
        vec![10 * ONE, 25 * ONE],
        vec![USD, 2 * USD],
        vec![false, true],
        vec![vec![], vec![venue()]],
    )
    .unwrap();
    let direct = Policy::new(
        DAY,
        vec![
            PolicyTier::new(10 * ONE, USD, false, vec![]),
            PolicyTier::new(25 * ONE, 2 * USD, true, vec![venue()]),
        ],
    )
    .unwrap();
    assert_eq!(from_arrays.content_id(), direct.content_id());
}

// =============================================================================
// Binding
// =============================================================================

#[test]
fn test_bind_is_one_shot() {
    let mut fx = setup();
    let (id, first) = fx.bound_relationship(60 * ONE);

    let mut other_tiers = standard_tiers();
    other_tiers[0].spend_cap += USD;
    let second = fx.policy.create_policy(DAY, other_tiers).unwrap();

    assert_eq!(
        fx.policy.bind_policy(&fx.authority, principal(), id, second),
        Err(PolicyError::AlreadyBound {
            relationship: id,
            existing: first,
        })
    );
    assert_eq!(fx.policy.binding(id), Some(first));
}

#[test]
fn test_bind_requires_principal_and_liveness() {
    let mut fx = setup();
    let id = fx
        .authority
        .create(principal(), agent(), ONE, ONE, 1)
        .unwrap();
    let policy_id = fx.policy.create_policy(DAY, standard_tiers()).unwrap();

    assert_eq!(
        fx.policy.bind_policy(&fx.authority, agent(), id, policy_id),
        Err(PolicyError::NotPrincipal {
            relationship: id,
            caller: agent(),
        })
    );

    fx.authority.kill(principal(), id).unwrap();
    assert_eq!(
        fx.policy
            .bind_policy(&fx.authority, principal(), id, policy_id),
        Err(PolicyError::NotAlive { relationship: id })
    );
}

#[test]
fn test_bind_requires_registered_policy() {
    let mut fx = setup();
    let id = fx
        .authority
        .create(principal(), agent(), ONE, ONE, 1)
        .unwrap();
    let unregistered = Policy::new(DAY, standard_tiers()).unwrap().content_id();

    assert_eq!(
        fx.policy
            .bind_policy(&fx.authority, principal(), id, unregistered),
        Err(PolicyError::PolicyNotRegistered {
            policy: unregistered
        })
    );
}

#[test]
fn test_bind_emits_event() {
    let mut fx = setup();
    let (id, policy_id) = fx.bound_relationship(60 * ONE);

    let events = fx.policy.drain_events();
    assert!(events.contains(&Event::PolicyBound {
        relationship: id,
        policy: policy_id,
    }));
}

// =============================================================================
// check_action
// =============================================================================

#[test]
fn test_check_action_unbound_denies() {
    let mut fx = setup();
    let id = fx
        .authority
        .create(principal(), agent(), ONE, ONE, 1)
        .unwrap();

    let check = fx.policy.check_action(&fx.authority, id, venue(), USD);
    assert!(!check.allowed);
    assert_eq!(check.tier, 0);
    assert_eq!(check.deny_reason, Some(DENY_REASON_UNBOUND));
}

#[test]
fn test_check_action_resolves_highest_tier() {
    let mut fx = setup();
    let (id, _) = fx.bound_relationship(60 * ONE);

    let check = fx.policy.check_action(&fx.authority, id, venue(), USD);
    assert!(check.allowed);
    assert_eq!(check.tier, 2);
}

#[test]
fn test_check_action_below_all_tiers_denies() {
    let mut fx = setup();
    let (id, _) = fx.bound_relationship(ONE);

    let check = fx.policy.check_action(&fx.authority, id, venue(), USD);
    assert!(!check.allowed);
    assert_eq!(check.tier, 0);
    assert_eq!(check.deny_reason, Some(DENY_REASON_BELOW_ALL_TIERS));
}

#[test]
fn test_check_action_enforces_whitelist() {
    let mut fx = setup();
    let id = fx
        .authority
        .create(principal(), agent(), 20 * ONE, 100 * ONE, 1)
        .unwrap();
    let tiers = vec![PolicyTier::new(10 * ONE, 1_000 * USD, false, vec![venue()])];
    let policy_id = fx.policy.create_policy(DAY, tiers).unwrap();
    fx.policy
        .bind_policy(&fx.authority, principal(), id, policy_id)
        .unwrap();

    let allowed = fx.policy.check_action(&fx.authority, id, venue(), USD);
    assert!(allowed.allowed);

    let denied = fx
        .policy
        .check_action(&fx.authority, id, Identity::named("other"), USD);
    assert!(!denied.allowed);
    assert_eq!(denied.tier, 0);
    assert_eq!(denied.deny_reason, Some(DENY_REASON_TARGET_NOT_WHITELISTED));
}

#[test]
fn test_check_action_enforces_budget() {
    let mut fx = setup();
    let (id, _) = fx.bound_relationship(60 * ONE);

    // Tier 2 cap is 20_000 USD.
    let over = fx
        .policy
        .check_action(&fx.authority, id, venue(), 20_001 * USD);
    assert!(!over.allowed);
    assert_eq!(over.deny_reason, Some(DENY_REASON_BUDGET_EXCEEDED));

    let at_cap = fx
        .policy
        .check_action(&fx.authority, id, venue(), 20_000 * USD);
    assert!(at_cap.allowed);
}

// =============================================================================
// record_spend
// =============================================================================

#[test]
fn test_record_spend_requires_binding() {
    let mut fx = setup();
    let id = fx
        .authority
        .create(principal(), agent(), ONE, ONE, 1)
        .unwrap();

    let result = fx
        .policy
        .record_spend(&fx.authority, agent(), id, venue(), USD);
    assert_eq!(result, Err(PolicyError::NotBound { relationship: id }));
}

#[test]
fn test_record_spend_requires_agent() {
    let mut fx = setup();
    let (id, _) = fx.bound_relationship(60 * ONE);

    let result = fx
        .policy
        .record_spend(&fx.authority, principal(), id, venue(), USD);
    assert_eq!(
        result,
        Err(PolicyError::NotAgent {
            relationship: id,
            caller: principal(),
        })
    );
}

#[test]
fn test_record_spend_requires_liveness() {
    let mut fx = setup();
    let (id, _) = fx.bound_relationship(60 * ONE);
    fx.authority.kill(principal(), id).unwrap();

    let result = fx
        .policy
        .record_spend(&fx.authority, agent(), id, venue(), USD);
    assert_eq!(result, Err(PolicyError::NotAlive { relationship: id }));
}

#[test]
fn test_record_spend_debits_and_reports_remaining() {
    let mut fx = setup();
    let (id, _) = fx.bound_relationship(60 * ONE);

    let receipt = fx
        .policy
        .record_spend(&fx.authority, agent(), id, venue(), 5_000 * USD)
        .unwrap();
    assert_eq!(receipt.tier, 2);
    assert_eq!(receipt.spent_in_epoch, 5_000 * USD);
    assert_eq!(receipt.remaining_budget, 15_000 * USD);

    let status = fx.policy.agent_status(&fx.authority, id);
    assert_eq!(status.remaining_budget, 15_000 * USD);
}

#[test]
fn test_record_spend_enforces_cap_atomically() {
    let mut fx = setup();
    let (id, _) = fx.bound_relationship(60 * ONE);

    fx.policy
        .record_spend(&fx.authority, agent(), id, venue(), 20_000 * USD)
        .unwrap();

    let result = fx.policy.record_spend(&fx.authority, agent(), id, venue(), 1);
    assert_eq!(
        result,
        Err(PolicyError::BudgetExceeded {
            relationship: id,
            tier: 2,
            requested: 1,
            remaining: 0,
        })
    );

    // The failed debit must not have touched spend state.
    assert_eq!(fx.policy.spend_state(id).spent_in_epoch, 20_000 * USD);
}

#[test]
fn test_record_spend_whitelist_is_authoritative() {
    let mut fx = setup();
    let id = fx
        .authority
        .create(principal(), agent(), 20 * ONE, 100 * ONE, 1)
        .unwrap();
    let tiers = vec![PolicyTier::new(10 * ONE, 1_000 * USD, false, vec![venue()])];
    let policy_id = fx.policy.create_policy(DAY, tiers).unwrap();
    fx.policy
        .bind_policy(&fx.authority, principal(), id, policy_id)
        .unwrap();

    let result =
        fx.policy
            .record_spend(&fx.authority, agent(), id, Identity::named("other"), USD);
    assert_eq!(
        result,
        Err(PolicyError::ActionNotAllowed {
            relationship: id,
            reason: DENY_REASON_TARGET_NOT_WHITELISTED,
        })
    );
    assert_eq!(fx.policy.spend_state(id).spent_in_epoch, 0);
}

#[test]
fn test_record_spend_below_all_tiers() {
    let mut fx = setup();
    let (id, _) = fx.bound_relationship(ONE);

    let result = fx
        .policy
        .record_spend(&fx.authority, agent(), id, venue(), USD);
    assert_eq!(
        result,
        Err(PolicyError::ActionNotAllowed {
            relationship: id,
            reason: DENY_REASON_BELOW_ALL_TIERS,
        })
    );
}

#[test]
fn test_epoch_resets_lazily() {
    let mut fx = setup();
    // High authority, negligible decay: tier 3, cap 50_000 USD.
    let (id, _) = fx.bound_relationship(100 * ONE);

    fx.policy
        .record_spend(&fx.authority, agent(), id, venue(), 50_000 * USD)
        .unwrap();
    assert!(
        fx.policy
            .record_spend(&fx.authority, agent(), id, venue(), 1)
            .is_err()
    );

    // A day later the window has elapsed; the next debit opens a fresh
    // epoch with the full cap.
    fx.clock.advance(DAY);
    let receipt = fx
        .policy
        .record_spend(&fx.authority, agent(), id, venue(), 10_000 * USD)
        .unwrap();
    assert_eq!(receipt.spent_in_epoch, 10_000 * USD);
    assert_eq!(receipt.remaining_budget, 40_000 * USD);
}

#[test]
fn test_spend_persists_across_tier_drop_within_epoch() {
    let mut fx = setup();
    // Authority 60 units decaying at 1 unit per 100 seconds.
    let id = fx
        .authority
        .create(principal(), agent(), 60 * ONE, 1_000 * ONE, ONE / 100)
        .unwrap();
    let policy_id = fx.policy.create_policy(DAY, standard_tiers()).unwrap();
    fx.policy
        .bind_policy(&fx.authority, principal(), id, policy_id)
        .unwrap();

    // Spend at tier 2 (cap 20_000).
    fx.policy
        .record_spend(&fx.authority, agent(), id, venue(), 4_000 * USD)
        .unwrap();

    // Decay to tier 1 (cap 5_000) inside the same epoch: the earlier
    // spend still counts against the smaller cap.
    fx.clock.advance(3_000);
    assert_eq!(fx.policy.agent_status(&fx.authority, id).tier, 1);

    let result = fx
        .policy
        .record_spend(&fx.authority, agent(), id, venue(), 1_500 * USD);
    assert_eq!(
        result,
        Err(PolicyError::BudgetExceeded {
            relationship: id,
            tier: 1,
            requested: 1_500 * USD,
            remaining: 1_000 * USD,
        })
    );
}

// =============================================================================
// Queries
// =============================================================================

#[test]
fn test_agent_status_sentinel_when_unbound_or_exhausted() {
    let mut fx = setup();
    let id = fx
        .authority
        .create(principal(), agent(), ONE, ONE, 1)
        .unwrap();

    let unbound = fx.policy.agent_status(&fx.authority, id);
    assert_eq!(unbound.tier, TIER_NONE);
    assert_eq!(unbound.remaining_budget, 0);
    assert!(!unbound.can_sub_delegate);

    let (bound_id, _) = fx.bound_relationship(ONE);
    let below = fx.policy.agent_status(&fx.authority, bound_id);
    assert_eq!(below.tier, TIER_NONE);
}

#[test]
fn test_agent_status_reports_sub_delegation() {
    let mut fx = setup();
    let id = fx
        .authority
        .create(principal(), agent(), 20 * ONE, 100 * ONE, 1)
        .unwrap();
    let tiers = vec![PolicyTier::new(10 * ONE, 1_000 * USD, true, vec![])];
    let policy_id = fx.policy.create_policy(DAY, tiers).unwrap();
    fx.policy
        .bind_policy(&fx.authority, principal(), id, policy_id)
        .unwrap();

    let status = fx.policy.agent_status(&fx.authority, id);
    assert_eq!(status.tier, 0);
    assert!(status.can_sub_delegate);
}

#[test]
fn test_authority_to_next_tier() {
    let mut fx = setup();

    let id = fx
        .authority
        .create(principal(), agent(), ONE, ONE, 1)
        .unwrap();
    assert_eq!(fx.policy.authority_to_next_tier(&fx.authority, id), 0);

    // Below tier 0: distance to the first minimum.
    let (below, _) = fx.bound_relationship(ONE);
    assert_eq!(
        fx.policy.authority_to_next_tier(&fx.authority, below),
        9 * ONE
    );

    // Mid-ladder: distance to tier 3's minimum.
    let mut mid_fx = setup();
    let (mid, _) = mid_fx.bound_relationship(60 * ONE);
    assert_eq!(
        mid_fx.policy.authority_to_next_tier(&mid_fx.authority, mid),
        15 * ONE
    );

    // Top tier: nothing above.
    let mut top_fx = setup();
    let (top, _) = top_fx.bound_relationship(80 * ONE);
    assert_eq!(top_fx.policy.authority_to_next_tier(&top_fx.authority, top), 0);
}

#[test]
fn test_get_policy_and_tier() {
    let mut fx = setup();
    let policy_id = fx.policy.create_policy(DAY, standard_tiers()).unwrap();

    let policy = fx.policy.get_policy(policy_id).unwrap();
    assert_eq!(policy.epoch_duration(), DAY);
    assert_eq!(policy.tier_count(), 4);

    let tier3 = fx.policy.get_tier(policy_id, 3).unwrap();
    assert_eq!(tier3.min_authority, 75 * ONE);
    assert_eq!(tier3.spend_cap, 50_000 * USD);

    assert_eq!(
        fx.policy.get_tier(policy_id, 4),
        Err(PolicyError::TierIndexOutOfRange {
            policy: policy_id,
            index: 4,
            tier_count: 4,
        })
    );
}

#[test]
fn test_policy_serde_round_trip() {
    let policy = Policy::new(DAY, standard_tiers()).unwrap();
    let json = serde_json::to_string(&policy).unwrap();
    let back: Policy = serde_json::from_str(&json).unwrap();
    assert_eq!(policy, back);
    assert_eq!(policy.content_id(), back.content_id());
}
