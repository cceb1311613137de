//! Policy-specific error types.

use thiserror::Error;

use crate::authority::RelationshipId;
use crate::identity::Identity;

use super::types::PolicyId;

/// Stable deny reason when a relationship has no bound policy.
pub const DENY_REASON_UNBOUND: &str = "policy_unbound";
/// Stable deny reason when effective authority clears no tier.
pub const DENY_REASON_BELOW_ALL_TIERS: &str = "authority_below_all_tiers";
/// Stable deny reason when the target misses the tier allow-list.
pub const DENY_REASON_TARGET_NOT_WHITELISTED: &str = "target_not_whitelisted";
/// Stable deny reason when the debit would exceed the epoch cap.
pub const DENY_REASON_BUDGET_EXCEEDED: &str = "epoch_budget_exceeded";

/// Errors that can occur during policy operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PolicyError {
    /// A policy must define between one and eight tiers.
    #[error("policy must define 1..=8 tiers, got {count}")]
    InvalidTierCount {
        /// The rejected tier count.
        count: usize,
    },

    /// Tier minimum authorities must be strictly ascending.
    #[error("tier minimum authorities must be strictly ascending (violation at tier {index})")]
    TierAuthoritiesNotAscending {
        /// Index of the first tier whose minimum does not exceed its
        /// predecessor's.
        index: usize,
    },

    /// The epoch duration must be strictly positive.
    #[error("epoch duration must be strictly positive")]
    EpochDurationZero,

    /// The five parallel tier arrays disagree on length.
    #[error(
        "tier arrays disagree on length: min_authorities={min_authorities}, \
         spend_caps={spend_caps}, can_sub_delegate={can_sub_delegate}, \
         whitelists={whitelists}"
    )]
    ArrayLengthMismatch {
        /// Length of the minimum-authority array.
        min_authorities: usize,
        /// Length of the spend-cap array.
        spend_caps: usize,
        /// Length of the sub-delegation flag array.
        can_sub_delegate: usize,
        /// Length of the whitelist array.
        whitelists: usize,
    },

    /// A policy with identical content is already registered.
    #[error("policy already registered: {policy}")]
    PolicyAlreadyRegistered {
        /// The existing content-addressed identifier.
        policy: PolicyId,
    },

    /// No policy exists under this identifier.
    #[error("policy not registered: {policy}")]
    PolicyNotRegistered {
        /// The unknown identifier.
        policy: PolicyId,
    },

    /// No relationship exists under this identifier.
    #[error("relationship not found: {relationship}")]
    RelationshipNotFound {
        /// The unknown identifier.
        relationship: RelationshipId,
    },

    /// The caller is not the relationship's principal.
    #[error("caller {caller} is not the principal of relationship {relationship}")]
    NotPrincipal {
        /// The relationship operated on.
        relationship: RelationshipId,
        /// The rejected caller.
        caller: Identity,
    },

    /// The relationship has been killed.
    #[error("relationship {relationship} is no longer alive")]
    NotAlive {
        /// The dead relationship.
        relationship: RelationshipId,
    },

    /// The relationship already has a bound policy.
    #[error("relationship {relationship} is already bound to policy {existing}")]
    AlreadyBound {
        /// The relationship.
        relationship: RelationshipId,
        /// The policy it is already bound to.
        existing: PolicyId,
    },

    /// The relationship has no bound policy.
    #[error("relationship {relationship} has no bound policy")]
    NotBound {
        /// The unbound relationship.
        relationship: RelationshipId,
    },

    /// The caller is not the relationship's agent.
    #[error("caller {caller} is not the agent of relationship {relationship}")]
    NotAgent {
        /// The relationship operated on.
        relationship: RelationshipId,
        /// The rejected caller.
        caller: Identity,
    },

    /// The action is not permitted under the active tier.
    #[error("action not allowed for relationship {relationship}: {reason}")]
    ActionNotAllowed {
        /// The relationship.
        relationship: RelationshipId,
        /// Stable deny reason (one of the `DENY_REASON_*` constants).
        reason: &'static str,
    },

    /// The debit would exceed the tier's epoch spend cap.
    #[error(
        "epoch budget exceeded for relationship {relationship} at tier {tier}: \
         requested {requested}, remaining {remaining}"
    )]
    BudgetExceeded {
        /// The relationship.
        relationship: RelationshipId,
        /// The active tier index.
        tier: u8,
        /// The requested debit.
        requested: u128,
        /// Budget remaining in the current epoch.
        remaining: u128,
    },

    /// The tier index is outside the policy's tier list.
    #[error("policy {policy} has {tier_count} tiers, index {index} is out of range")]
    TierIndexOutOfRange {
        /// The policy.
        policy: PolicyId,
        /// The rejected index.
        index: u8,
        /// The policy's tier count.
        tier_count: u8,
    },
}
