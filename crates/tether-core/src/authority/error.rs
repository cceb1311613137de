//! Authority-specific error types.

use thiserror::Error;

use crate::identity::Identity;

use super::state::RelationshipId;

/// Errors that can occur during authority operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthorityError {
    /// No relationship exists under this identifier.
    #[error("relationship not found: {relationship}")]
    RelationshipNotFound {
        /// The unknown identifier.
        relationship: RelationshipId,
    },

    /// The agent identity was the reserved zero identity.
    #[error("agent identity must not be zero")]
    AgentIsZero,

    /// The principal tried to delegate to themselves.
    #[error("agent must differ from principal {principal}")]
    AgentIsPrincipal {
        /// The identity that appeared on both sides.
        principal: Identity,
    },

    /// The initial authority was above the requested ceiling.
    #[error("initial authority {initial_authority} exceeds ceiling {ceiling}")]
    InitialAuthorityExceedsCeiling {
        /// The requested starting authority.
        initial_authority: u128,
        /// The requested ceiling.
        ceiling: u128,
    },

    /// The decay rate was zero; authority must always be decaying.
    #[error("decay rate must be strictly positive")]
    DecayRateIsZero,

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

    /// A boost of zero authority is meaningless.
    #[error("boost amount must be non-zero")]
    BoostAmountZero,

    /// A slash of zero authority is meaningless.
    #[error("slash amount must be non-zero")]
    SlashAmountZero,

    /// The same slasher hit this relationship within the cooldown window.
    #[error(
        "slasher {slasher} is within the cooldown window for relationship \
         {relationship}: retry at {retry_at}"
    )]
    SlashCooldownActive {
        /// The relationship being slashed.
        relationship: RelationshipId,
        /// The rate-limited slasher.
        slasher: Identity,
        /// Earliest timestamp at which this slasher may slash again.
        retry_at: u64,
    },
}
