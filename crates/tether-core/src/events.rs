//! Observable engine events.
//!
//! Every state transition in the core emits an [`Event`]. Each engine
//! buffers its own events in acceptance order; embedders drain the buffer
//! after each batch of operations and feed external monitors. Events are
//! plain serde values, not a wire protocol: signing, sequencing, and
//! transport belong to the host.

use serde::{Deserialize, Serialize};

use crate::authority::RelationshipId;
use crate::crypto::Hash;
use crate::identity::Identity;
use crate::ledger::ActionKind;
use crate::policy::PolicyId;

/// An observable side effect of a core operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Event {
    /// A relationship was created.
    RelationshipCreated {
        /// The new relationship's identifier.
        relationship: RelationshipId,
        /// The principal who created it.
        principal: Identity,
        /// The delegate agent.
        agent: Identity,
        /// Authority granted at creation.
        initial_authority: u128,
        /// Hard upper bound for authority.
        ceiling: u128,
        /// Authority consumed per second of wall time.
        decay_per_second: u128,
        /// Creation timestamp in seconds.
        created_at: u64,
    },

    /// A principal materialized decay without restoring authority.
    Heartbeat {
        /// The relationship refreshed.
        relationship: RelationshipId,
        /// Authority after materializing decay.
        authority: u128,
        /// Operation timestamp in seconds.
        at: u64,
    },

    /// A principal added authority.
    Boosted {
        /// The relationship boosted.
        relationship: RelationshipId,
        /// Amount requested (before the ceiling clamp).
        amount: u128,
        /// Authority after the boost.
        authority: u128,
        /// Operation timestamp in seconds.
        at: u64,
    },

    /// Any party reduced authority.
    Slashed {
        /// The relationship slashed.
        relationship: RelationshipId,
        /// The slasher's identity.
        slasher: Identity,
        /// Amount requested (before the zero floor).
        amount: u128,
        /// Authority after the slash.
        authority: u128,
        /// Operation timestamp in seconds.
        at: u64,
    },

    /// A principal terminated a relationship.
    Killed {
        /// The relationship killed.
        relationship: RelationshipId,
        /// Operation timestamp in seconds.
        at: u64,
    },

    /// A policy was registered.
    PolicyCreated {
        /// The content-addressed policy identifier.
        policy: PolicyId,
        /// Epoch window in seconds.
        epoch_duration: u64,
        /// Number of privilege tiers.
        tier_count: u8,
    },

    /// A policy was bound to a relationship.
    PolicyBound {
        /// The relationship bound.
        relationship: RelationshipId,
        /// The policy it is now bound to.
        policy: PolicyId,
    },

    /// An agent debited its epoch budget.
    SpendRecorded {
        /// The relationship that spent.
        relationship: RelationshipId,
        /// The tier the spend was admitted under.
        tier: u8,
        /// Amount debited.
        amount: u128,
        /// Cumulative spend in the current epoch after this debit.
        spent_in_epoch: u128,
        /// Operation timestamp in seconds.
        at: u64,
    },

    /// An agent appended an attested action record.
    ActionLogged {
        /// The relationship the action belongs to.
        relationship: RelationshipId,
        /// Index of the new entry in the relationship's log.
        index: u64,
        /// Kind of action attested.
        action: ActionKind,
        /// Target of the action.
        target: Identity,
        /// Action value in the policy-defined denomination.
        value: u128,
        /// Effective authority captured at append time.
        authority: u128,
        /// New chain head after the append.
        chain_head: Hash,
        /// Operation timestamp in seconds.
        at: u64,
    },
}
