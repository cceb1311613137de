//! Log entries and their canonical hashes.

use serde::{Deserialize, Serialize};

use crate::authority::RelationshipId;
use crate::crypto::{CanonicalEncoder, Hash};
use crate::identity::Identity;

/// The kind of action an agent attests to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ActionKind {
    /// Value transfer to a target.
    Transfer,
    /// Asset swap at a venue.
    Swap,
    /// Liquidity provision.
    ProvideLp,
    /// Borrow against collateral.
    Borrow,
    /// Contract or resource deployment.
    Deploy,
    /// Sub-delegation of authority.
    Delegate,
    /// Governance participation.
    Governance,
    /// Anything the other kinds do not cover.
    Custom,
}

impl ActionKind {
    /// Stable single-byte code used in the canonical entry encoding.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Transfer => 0,
            Self::Swap => 1,
            Self::ProvideLp => 2,
            Self::Borrow => 3,
            Self::Deploy => 4,
            Self::Delegate => 5,
            Self::Governance => 6,
            Self::Custom => 7,
        }
    }

    /// Returns the string representation of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Transfer => "TRANSFER",
            Self::Swap => "SWAP",
            Self::ProvideLp => "PROVIDE_LP",
            Self::Borrow => "BORROW",
            Self::Deploy => "DEPLOY",
            Self::Delegate => "DELEGATE",
            Self::Governance => "GOVERNANCE",
            Self::Custom => "CUSTOM",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attested action record.
///
/// Entries are immutable once appended. The canonical hash covers the
/// seven fields in declaration order, so `prev_hash` links each entry to
/// the exact content of its predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogEntry {
    /// The relationship this action belongs to.
    pub relationship: RelationshipId,
    /// Kind of action attested.
    pub action: ActionKind,
    /// Target of the action.
    pub target: Identity,
    /// Action value in the policy-defined denomination.
    pub value: u128,
    /// Effective authority at append time.
    pub authority_at_time: u128,
    /// Append timestamp in seconds.
    pub timestamp: u64,
    /// Digest of the previous entry; zero for the first entry.
    pub prev_hash: Hash,
}

impl LogEntry {
    /// Canonical digest of this entry.
    #[must_use]
    pub fn entry_hash(&self) -> Hash {
        let mut enc = CanonicalEncoder::new();
        enc.push_hash(self.relationship.as_hash());
        enc.push_u8(self.action.code());
        enc.push_identity(&self.target);
        enc.push_u128(self.value);
        enc.push_u128(self.authority_at_time);
        enc.push_u64(self.timestamp);
        enc.push_hash(&self.prev_hash);
        enc.finish()
    }
}
