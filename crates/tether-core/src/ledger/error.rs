//! Ledger-specific error types.

use thiserror::Error;

use crate::authority::RelationshipId;
use crate::identity::Identity;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LedgerError {
    /// No relationship exists under this identifier.
    #[error("relationship not found: {relationship}")]
    RelationshipNotFound {
        /// The unknown identifier.
        relationship: RelationshipId,
    },

    /// The relationship has been killed.
    #[error("relationship {relationship} is no longer alive")]
    NotAlive {
        /// The dead relationship.
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

    /// An entry's back-link does not match the recomputed chain.
    ///
    /// An index equal to the entry count means the stored chain head does
    /// not match the digest of the final entry.
    #[error("chain integrity broken for relationship {relationship} at index {index}")]
    ChainIntegrityBroken {
        /// The relationship whose chain failed verification.
        relationship: RelationshipId,
        /// Index of the first entry that failed to link.
        index: u64,
    },

    /// The entry index is past the end of the log.
    #[error(
        "entry index {index} out of range for relationship {relationship} \
         ({entry_count} entries)"
    )]
    IndexOutOfRange {
        /// The relationship queried.
        relationship: RelationshipId,
        /// The rejected index.
        index: u64,
        /// Number of entries in the log.
        entry_count: u64,
    },

    /// A ranged walk was requested with inverted or out-of-bounds bounds.
    #[error(
        "invalid range [{start}, {end}) for relationship {relationship} \
         ({entry_count} entries)"
    )]
    InvalidRange {
        /// The relationship queried.
        relationship: RelationshipId,
        /// Inclusive start of the requested range.
        start: u64,
        /// Exclusive end of the requested range.
        end: u64,
        /// Number of entries in the log.
        entry_count: u64,
    },
}
