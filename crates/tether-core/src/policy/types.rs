//! Policy definitions and spend state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crypto::{CanonicalEncoder, Hash, HashParseError};
use crate::identity::Identity;

use super::error::PolicyError;

/// Maximum number of tiers a policy may define.
pub const MAX_TIERS: usize = 8;

/// Sentinel tier index meaning "unbound or below every tier".
pub const TIER_NONE: u8 = u8::MAX;

/// Content-addressed policy identifier.
///
/// The digest of the policy's canonical encoding: two registrations with
/// identical parameters always produce the same identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(Hash);

impl PolicyId {
    /// Returns the underlying digest.
    #[must_use]
    pub const fn as_hash(&self) -> &Hash {
        &self.0
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PolicyId({})", &self.0.to_string()[..16])
    }
}

impl FromStr for PolicyId {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s).map(Self)
    }
}

/// One privilege tier within a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyTier {
    /// Minimum effective authority required to occupy this tier.
    pub min_authority: u128,
    /// Maximum spend per epoch while this tier is active, in the
    /// policy-defined denomination.
    pub spend_cap: u128,
    /// Whether the agent may sub-delegate at this tier.
    pub can_sub_delegate: bool,
    /// Allowed targets at this tier; empty means any target.
    pub whitelist: Vec<Identity>,
}

impl PolicyTier {
    /// Creates a tier.
    #[must_use]
    pub const fn new(
        min_authority: u128,
        spend_cap: u128,
        can_sub_delegate: bool,
        whitelist: Vec<Identity>,
    ) -> Self {
        Self {
            min_authority,
            spend_cap,
            can_sub_delegate,
            whitelist,
        }
    }

    /// `true` if `target` passes this tier's allow-list.
    #[must_use]
    pub fn allows_target(&self, target: &Identity) -> bool {
        self.whitelist.is_empty() || self.whitelist.contains(target)
    }
}

/// An immutable, content-addressed policy.
///
/// # Invariants
///
/// - `1..=MAX_TIERS` tiers
/// - tier minimum authorities are strictly ascending
/// - `epoch_duration` is strictly positive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    epoch_duration: u64,
    tiers: Vec<PolicyTier>,
}

impl Policy {
    /// Validates and constructs a policy.
    ///
    /// # Errors
    ///
    /// - [`PolicyError::EpochDurationZero`] if `epoch_duration == 0`
    /// - [`PolicyError::InvalidTierCount`] if there are zero tiers or more
    ///   than [`MAX_TIERS`]
    /// - [`PolicyError::TierAuthoritiesNotAscending`] if the minimums are
    ///   not strictly ascending
    pub fn new(epoch_duration: u64, tiers: Vec<PolicyTier>) -> Result<Self, PolicyError> {
        if epoch_duration == 0 {
            return Err(PolicyError::EpochDurationZero);
        }
        if tiers.is_empty() || tiers.len() > MAX_TIERS {
            return Err(PolicyError::InvalidTierCount { count: tiers.len() });
        }
        for (index, window) in tiers.windows(2).enumerate() {
            if window[1].min_authority <= window[0].min_authority {
                return Err(PolicyError::TierAuthoritiesNotAscending { index: index + 1 });
            }
        }
        Ok(Self {
            epoch_duration,
            tiers,
        })
    }

    /// Builds a policy from the five parallel per-tier arrays.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::ArrayLengthMismatch`] if the arrays disagree
    /// on length, plus every error [`Policy::new`] can return.
    pub fn from_arrays(
        epoch_duration: u64,
        min_authorities: Vec<u128>,
        spend_caps: Vec<u128>,
        can_sub_delegate: Vec<bool>,
        whitelists: Vec<Vec<Identity>>,
    ) -> Result<Self, PolicyError> {
        let len = min_authorities.len();
        if spend_caps.len() != len || can_sub_delegate.len() != len || whitelists.len() != len {
            return Err(PolicyError::ArrayLengthMismatch {
                min_authorities: len,
                spend_caps: spend_caps.len(),
                can_sub_delegate: can_sub_delegate.len(),
                whitelists: whitelists.len(),
            });
        }
        let tiers = min_authorities
            .into_iter()
            .zip(spend_caps)
            .zip(can_sub_delegate)
            .zip(whitelists)
            .map(|(((min_authority, spend_cap), sub), whitelist)| {
                PolicyTier::new(min_authority, spend_cap, sub, whitelist)
            })
            .collect();
        Self::new(epoch_duration, tiers)
    }

    /// Epoch window in seconds.
    #[must_use]
    pub const fn epoch_duration(&self) -> u64 {
        self.epoch_duration
    }

    /// The tiers in ascending authority order.
    #[must_use]
    pub fn tiers(&self) -> &[PolicyTier] {
        &self.tiers
    }

    /// Number of tiers.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn tier_count(&self) -> u8 {
        // Bounded by MAX_TIERS at construction.
        self.tiers.len() as u8
    }

    /// The highest tier index whose minimum `authority` clears, if any.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn qualifying_tier(&self, authority: u128) -> Option<u8> {
        self.tiers
            .iter()
            .rposition(|tier| authority >= tier.min_authority)
            .map(|index| index as u8)
    }

    /// Content-addressed identifier of this policy.
    ///
    /// Encodes the epoch duration and, per tier in index order, the
    /// minimum authority, spend cap, sub-delegation flag, whitelist length,
    /// and each whitelist identity.
    #[must_use]
    pub fn content_id(&self) -> PolicyId {
        let mut enc = CanonicalEncoder::new();
        enc.push_u64(self.epoch_duration);
        enc.push_len(self.tiers.len());
        for tier in &self.tiers {
            enc.push_u128(tier.min_authority);
            enc.push_u128(tier.spend_cap);
            enc.push_bool(tier.can_sub_delegate);
            enc.push_len(tier.whitelist.len());
            for target in &tier.whitelist {
                enc.push_identity(target);
            }
        }
        PolicyId(enc.finish())
    }
}

/// Per-relationship epoch spend state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendState {
    /// Start of the current epoch; zero means no epoch opened yet.
    pub epoch_start: u64,
    /// Amount debited within the current epoch.
    pub spent_in_epoch: u128,
}

impl SpendState {
    /// `true` if the epoch window has elapsed at `now` (or none was ever
    /// opened).
    #[must_use]
    pub fn epoch_expired(&self, now: u64, epoch_duration: u64) -> bool {
        self.epoch_start == 0 || now >= self.epoch_start.saturating_add(epoch_duration)
    }

    /// Budget left against `spend_cap` at `now` under the lazy-reset rule.
    #[must_use]
    pub fn remaining_budget(&self, now: u64, epoch_duration: u64, spend_cap: u128) -> u128 {
        if self.epoch_expired(now, epoch_duration) {
            spend_cap
        } else {
            spend_cap.saturating_sub(self.spent_in_epoch)
        }
    }
}
