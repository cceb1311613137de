//! Relationship records and identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crypto::{CanonicalEncoder, Hash, HashParseError};
use crate::identity::Identity;

/// Identifier of a principal/agent relationship.
///
/// Derived deterministically as
/// `blake3(principal || agent || sequence_number)`, where the sequence
/// number counts creations per principal. The same principal delegating to
/// the same agent twice yields two distinct identifiers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(Hash);

impl RelationshipId {
    /// Derives the identifier for the `sequence`-th relationship a
    /// principal creates with an agent.
    #[must_use]
    pub fn derive(principal: &Identity, agent: &Identity, sequence: u64) -> Self {
        let mut enc = CanonicalEncoder::new();
        enc.push_identity(principal);
        enc.push_identity(agent);
        enc.push_u64(sequence);
        Self(enc.finish())
    }

    /// Returns the underlying digest.
    #[must_use]
    pub const fn as_hash(&self) -> &Hash {
        &self.0
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelationshipId({})", &self.0.to_string()[..16])
    }
}

impl FromStr for RelationshipId {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s).map(Self)
    }
}

/// The stored state of one principal/agent relationship.
///
/// # Invariants
///
/// - `stored_authority <= ceiling` after every operation
/// - `alive == false` is terminal and implies zero effective authority
/// - `created_at` never changes after creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    principal: Identity,
    agent: Identity,
    stored_authority: u128,
    ceiling: u128,
    decay_per_second: u128,
    last_refresh: u64,
    created_at: u64,
    alive: bool,
}

impl Relationship {
    pub(crate) fn new(
        principal: Identity,
        agent: Identity,
        initial_authority: u128,
        ceiling: u128,
        decay_per_second: u128,
        now: u64,
    ) -> Self {
        Self {
            principal,
            agent,
            stored_authority: initial_authority,
            ceiling,
            decay_per_second,
            last_refresh: now,
            created_at: now,
            alive: true,
        }
    }

    /// The principal who owns this relationship.
    #[must_use]
    pub const fn principal(&self) -> Identity {
        self.principal
    }

    /// The delegate agent.
    #[must_use]
    pub const fn agent(&self) -> Identity {
        self.agent
    }

    /// Authority as of [`Relationship::last_refresh`], before any decay
    /// that has accrued since.
    #[must_use]
    pub const fn stored_authority(&self) -> u128 {
        self.stored_authority
    }

    /// Hard upper bound for authority.
    #[must_use]
    pub const fn ceiling(&self) -> u128 {
        self.ceiling
    }

    /// Authority consumed per second of wall time.
    #[must_use]
    pub const fn decay_per_second(&self) -> u128 {
        self.decay_per_second
    }

    /// Timestamp of the last event that materialized authority.
    #[must_use]
    pub const fn last_refresh(&self) -> u64 {
        self.last_refresh
    }

    /// Creation timestamp; never mutated.
    #[must_use]
    pub const fn created_at(&self) -> u64 {
        self.created_at
    }

    /// `true` from creation until [`kill`](super::AuthorityEngine::kill).
    #[must_use]
    pub const fn alive(&self) -> bool {
        self.alive
    }

    /// Authority remaining at time `at`, projecting linear decay from the
    /// last refresh point and flooring at zero.
    ///
    /// For `at <= last_refresh` this returns the stored value: it is a
    /// projection from current state, not a historical answer.
    #[must_use]
    pub fn authority_at(&self, at: u64) -> u128 {
        if !self.alive {
            return 0;
        }
        if at <= self.last_refresh {
            return self.stored_authority;
        }
        let elapsed = u128::from(at - self.last_refresh);
        // Overflow means the decayed amount exceeds any representable
        // authority, so the value has reached zero regardless.
        match elapsed.checked_mul(self.decay_per_second) {
            Some(consumed) => self.stored_authority.saturating_sub(consumed),
            None => 0,
        }
    }

    /// Writes the decayed value back and resets the refresh point.
    ///
    /// Returns the materialized authority.
    pub(crate) fn materialize(&mut self, now: u64) -> u128 {
        let effective = self.authority_at(now);
        self.stored_authority = effective;
        self.last_refresh = now;
        effective
    }

    /// Adds `amount` to the materialized value, clamped to the ceiling.
    pub(crate) fn add_clamped(&mut self, amount: u128) -> u128 {
        self.stored_authority = match self.stored_authority.checked_add(amount) {
            Some(sum) => sum.min(self.ceiling),
            None => self.ceiling,
        };
        self.stored_authority
    }

    /// Subtracts `amount` from the materialized value, flooring at zero.
    pub(crate) fn subtract_floored(&mut self, amount: u128) -> u128 {
        self.stored_authority = self.stored_authority.saturating_sub(amount);
        self.stored_authority
    }

    /// Marks the relationship dead and zeroes its authority. Terminal.
    pub(crate) fn kill(&mut self) {
        self.alive = false;
        self.stored_authority = 0;
    }
}
