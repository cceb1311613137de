//! The policy engine.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::authority::{AuthorityEngine, RelationshipId};
use crate::events::Event;
use crate::identity::Identity;
use crate::time::Clock;

use super::error::{
    DENY_REASON_BELOW_ALL_TIERS, DENY_REASON_BUDGET_EXCEEDED, DENY_REASON_TARGET_NOT_WHITELISTED,
    DENY_REASON_UNBOUND, PolicyError,
};
use super::types::{Policy, PolicyId, PolicyTier, SpendState, TIER_NONE};

/// Advisory verdict from [`PolicyEngine::check_action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCheck {
    /// Whether the action would currently be admitted.
    pub allowed: bool,
    /// The qualifying tier index; zero when unbound or below all tiers.
    pub tier: u8,
    /// Stable deny reason when `allowed` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deny_reason: Option<&'static str>,
}

impl ActionCheck {
    const fn allowed(tier: u8) -> Self {
        Self {
            allowed: true,
            tier,
            deny_reason: None,
        }
    }

    const fn denied(tier: u8, reason: &'static str) -> Self {
        Self {
            allowed: false,
            tier,
            deny_reason: Some(reason),
        }
    }
}

/// Receipt from a successful [`PolicyEngine::record_spend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendReceipt {
    /// The tier the debit was admitted under.
    pub tier: u8,
    /// Cumulative spend in the current epoch, this debit included.
    pub spent_in_epoch: u128,
    /// Budget remaining in the current epoch.
    pub remaining_budget: u128,
}

/// Snapshot of an agent's standing under its bound policy.
///
/// When the relationship is unbound or its authority clears no tier, the
/// tier is the [`TIER_NONE`] sentinel and the other fields are zeroed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatus {
    /// Active tier index, or [`TIER_NONE`].
    pub tier: u8,
    /// Budget remaining in the current epoch at the active tier.
    pub remaining_budget: u128,
    /// Whether the agent may sub-delegate at the active tier.
    pub can_sub_delegate: bool,
}

impl AgentStatus {
    const NONE: Self = Self {
        tier: TIER_NONE,
        remaining_budget: 0,
        can_sub_delegate: false,
    };
}

/// Registers immutable policies, binds them to relationships, and
/// enforces per-epoch spend caps.
///
/// The policy engine never mutates authority state; it reads effective
/// authority through [`AuthorityEngine`] queries passed into each call.
#[derive(Debug)]
pub struct PolicyEngine {
    policies: HashMap<PolicyId, Policy>,
    bindings: HashMap<RelationshipId, PolicyId>,
    spend: HashMap<RelationshipId, SpendState>,
    clock: Arc<dyn Clock>,
    events: Vec<Event>,
}

impl PolicyEngine {
    /// Creates an empty policy engine.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            policies: HashMap::new(),
            bindings: HashMap::new(),
            spend: HashMap::new(),
            clock,
            events: Vec::new(),
        }
    }

    // =========================================================================
    // Registration and binding
    // =========================================================================

    /// Validates and registers a policy, returning its content-addressed
    /// identifier.
    ///
    /// # Errors
    ///
    /// Every validation error of [`Policy::new`], plus
    /// [`PolicyError::PolicyAlreadyRegistered`] when a policy with
    /// identical content already exists.
    pub fn create_policy(
        &mut self,
        epoch_duration: u64,
        tiers: Vec<PolicyTier>,
    ) -> Result<PolicyId, PolicyError> {
        let policy = Policy::new(epoch_duration, tiers)?;
        self.register(policy)
    }

    /// Registers a policy built from the five parallel per-tier arrays.
    ///
    /// # Errors
    ///
    /// Every error of [`Policy::from_arrays`], plus
    /// [`PolicyError::PolicyAlreadyRegistered`].
    pub fn create_policy_from_arrays(
        &mut self,
        epoch_duration: u64,
        min_authorities: Vec<u128>,
        spend_caps: Vec<u128>,
        can_sub_delegate: Vec<bool>,
        whitelists: Vec<Vec<Identity>>,
    ) -> Result<PolicyId, PolicyError> {
        let policy = Policy::from_arrays(
            epoch_duration,
            min_authorities,
            spend_caps,
            can_sub_delegate,
            whitelists,
        )?;
        self.register(policy)
    }

    fn register(&mut self, policy: Policy) -> Result<PolicyId, PolicyError> {
        let id = policy.content_id();
        let Entry::Vacant(slot) = self.policies.entry(id) else {
            return Err(PolicyError::PolicyAlreadyRegistered { policy: id });
        };

        let epoch_duration = policy.epoch_duration();
        let tier_count = policy.tier_count();
        slot.insert(policy);

        tracing::info!(
            policy = %id,
            epoch_duration,
            tier_count,
            "policy registered"
        );
        self.events.push(Event::PolicyCreated {
            policy: id,
            epoch_duration,
            tier_count,
        });
        Ok(id)
    }

    /// Binds a registered policy to a relationship. One-shot and
    /// irreversible.
    ///
    /// # Errors
    ///
    /// Fails if the caller is not the relationship's principal, the
    /// relationship is unknown or dead, the policy is not registered, or
    /// a binding already exists.
    pub fn bind_policy(
        &mut self,
        authority: &AuthorityEngine,
        caller: Identity,
        relationship: RelationshipId,
        policy: PolicyId,
    ) -> Result<(), PolicyError> {
        let record = authority
            .get_relationship(relationship)
            .map_err(|_| PolicyError::RelationshipNotFound { relationship })?;
        if record.principal() != caller {
            return Err(PolicyError::NotPrincipal {
                relationship,
                caller,
            });
        }
        if !record.alive() {
            return Err(PolicyError::NotAlive { relationship });
        }
        if !self.policies.contains_key(&policy) {
            return Err(PolicyError::PolicyNotRegistered { policy });
        }
        if let Some(&existing) = self.bindings.get(&relationship) {
            return Err(PolicyError::AlreadyBound {
                relationship,
                existing,
            });
        }

        self.bindings.insert(relationship, policy);

        tracing::info!(relationship = %relationship, policy = %policy, "policy bound");
        self.events.push(Event::PolicyBound {
            relationship,
            policy,
        });
        Ok(())
    }

    // =========================================================================
    // Enforcement
    // =========================================================================

    /// Predicts whether an action would pass tier, whitelist, and budget
    /// constraints right now.
    ///
    /// Purely advisory: state is only mutated by
    /// [`PolicyEngine::record_spend`], which re-runs every check.
    #[must_use]
    pub fn check_action(
        &self,
        authority: &AuthorityEngine,
        relationship: RelationshipId,
        target: Identity,
        amount: u128,
    ) -> ActionCheck {
        let Some(policy) = self.bound_policy(relationship) else {
            return ActionCheck::denied(0, DENY_REASON_UNBOUND);
        };

        let auth = authority.effective_authority(relationship).unwrap_or(0);
        let Some(tier_index) = policy.qualifying_tier(auth) else {
            return ActionCheck::denied(0, DENY_REASON_BELOW_ALL_TIERS);
        };
        let tier = &policy.tiers()[usize::from(tier_index)];

        if !tier.allows_target(&target) {
            return ActionCheck::denied(tier_index, DENY_REASON_TARGET_NOT_WHITELISTED);
        }

        let remaining = self.remaining_budget(relationship, policy, tier);
        if amount > remaining {
            return ActionCheck::denied(tier_index, DENY_REASON_BUDGET_EXCEEDED);
        }

        ActionCheck::allowed(tier_index)
    }

    /// Debits the epoch budget for an agent action. Authoritative.
    ///
    /// Opens a fresh epoch if none is active or the window has elapsed,
    /// enforces the active tier's allow-list against `target`, then debits
    /// the cap. Failures leave the spend state untouched.
    ///
    /// Spend state deliberately survives tier changes within an epoch:
    /// amounts debited at a higher tier still count against a lower
    /// tier's cap until the window expires.
    ///
    /// # Errors
    ///
    /// - [`PolicyError::NotBound`] if the relationship has no policy
    /// - [`PolicyError::RelationshipNotFound`] for unknown relationships
    /// - [`PolicyError::NotAlive`] if the relationship has been killed
    /// - [`PolicyError::NotAgent`] if `caller` is not the agent
    /// - [`PolicyError::ActionNotAllowed`] below all tiers or on an
    ///   allow-list miss
    /// - [`PolicyError::BudgetExceeded`] if the debit would breach the cap
    pub fn record_spend(
        &mut self,
        authority: &AuthorityEngine,
        caller: Identity,
        relationship: RelationshipId,
        target: Identity,
        amount: u128,
    ) -> Result<SpendReceipt, PolicyError> {
        let Some(&policy_id) = self.bindings.get(&relationship) else {
            return Err(PolicyError::NotBound { relationship });
        };
        let policy = self
            .policies
            .get(&policy_id)
            .ok_or(PolicyError::PolicyNotRegistered { policy: policy_id })?;

        let record = authority
            .get_relationship(relationship)
            .map_err(|_| PolicyError::RelationshipNotFound { relationship })?;
        if !record.alive() {
            return Err(PolicyError::NotAlive { relationship });
        }
        if record.agent() != caller {
            return Err(PolicyError::NotAgent {
                relationship,
                caller,
            });
        }

        let auth = authority.effective_authority(relationship).unwrap_or(0);
        let Some(tier_index) = policy.qualifying_tier(auth) else {
            return Err(PolicyError::ActionNotAllowed {
                relationship,
                reason: DENY_REASON_BELOW_ALL_TIERS,
            });
        };
        let tier = &policy.tiers()[usize::from(tier_index)];

        if !tier.allows_target(&target) {
            return Err(PolicyError::ActionNotAllowed {
                relationship,
                reason: DENY_REASON_TARGET_NOT_WHITELISTED,
            });
        }

        // Compute the post-debit state before writing anything back, so a
        // budget failure leaves no trace (including the lazy epoch reset).
        let now = self.clock.now_secs();
        let current = self.spend.get(&relationship).copied().unwrap_or_default();
        let mut next = if current.epoch_expired(now, policy.epoch_duration()) {
            SpendState {
                epoch_start: now,
                spent_in_epoch: 0,
            }
        } else {
            current
        };

        let spent = next
            .spent_in_epoch
            .checked_add(amount)
            .filter(|&total| total <= tier.spend_cap)
            .ok_or(PolicyError::BudgetExceeded {
                relationship,
                tier: tier_index,
                requested: amount,
                remaining: tier.spend_cap.saturating_sub(next.spent_in_epoch),
            })?;
        next.spent_in_epoch = spent;
        self.spend.insert(relationship, next);

        tracing::debug!(
            relationship = %relationship,
            tier = tier_index,
            amount = %amount,
            spent_in_epoch = %spent,
            "spend recorded"
        );
        self.events.push(Event::SpendRecorded {
            relationship,
            tier: tier_index,
            amount,
            spent_in_epoch: spent,
            at: now,
        });

        Ok(SpendReceipt {
            tier: tier_index,
            spent_in_epoch: spent,
            remaining_budget: tier.spend_cap - spent,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The agent's current tier, remaining budget, and sub-delegation
    /// flag; the [`TIER_NONE`] sentinel when unbound or below all tiers.
    #[must_use]
    pub fn agent_status(
        &self,
        authority: &AuthorityEngine,
        relationship: RelationshipId,
    ) -> AgentStatus {
        let Some(policy) = self.bound_policy(relationship) else {
            return AgentStatus::NONE;
        };
        let auth = authority.effective_authority(relationship).unwrap_or(0);
        let Some(tier_index) = policy.qualifying_tier(auth) else {
            return AgentStatus::NONE;
        };
        let tier = &policy.tiers()[usize::from(tier_index)];
        AgentStatus {
            tier: tier_index,
            remaining_budget: self.remaining_budget(relationship, policy, tier),
            can_sub_delegate: tier.can_sub_delegate,
        }
    }

    /// Additional authority needed to reach the next tier up; zero when
    /// unbound or already at the top tier.
    #[must_use]
    pub fn authority_to_next_tier(
        &self,
        authority: &AuthorityEngine,
        relationship: RelationshipId,
    ) -> u128 {
        let Some(policy) = self.bound_policy(relationship) else {
            return 0;
        };
        let auth = authority.effective_authority(relationship).unwrap_or(0);

        let next_min = match policy.qualifying_tier(auth) {
            None => policy.tiers()[0].min_authority,
            Some(current) => {
                let next = usize::from(current) + 1;
                match policy.tiers().get(next) {
                    Some(tier) => tier.min_authority,
                    None => return 0,
                }
            },
        };
        next_min - auth
    }

    /// Returns a registered policy verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::PolicyNotRegistered`] for unknown ids.
    pub fn get_policy(&self, policy: PolicyId) -> Result<&Policy, PolicyError> {
        self.policies
            .get(&policy)
            .ok_or(PolicyError::PolicyNotRegistered { policy })
    }

    /// Returns one tier of a registered policy verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::PolicyNotRegistered`] for unknown ids and
    /// [`PolicyError::TierIndexOutOfRange`] for indices past the tier
    /// list.
    pub fn get_tier(&self, policy: PolicyId, index: u8) -> Result<&PolicyTier, PolicyError> {
        let record = self.get_policy(policy)?;
        record
            .tiers()
            .get(usize::from(index))
            .ok_or(PolicyError::TierIndexOutOfRange {
                policy,
                index,
                tier_count: record.tier_count(),
            })
    }

    /// The policy bound to a relationship, if any.
    #[must_use]
    pub fn binding(&self, relationship: RelationshipId) -> Option<PolicyId> {
        self.bindings.get(&relationship).copied()
    }

    /// The relationship's spend state; default (no epoch) when it has
    /// never spent.
    #[must_use]
    pub fn spend_state(&self, relationship: RelationshipId) -> SpendState {
        self.spend.get(&relationship).copied().unwrap_or_default()
    }

    /// Number of registered policies.
    #[must_use]
    pub fn policy_count(&self) -> usize {
        self.policies.len()
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Events emitted since the last drain, in acceptance order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Removes and returns all buffered events.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn bound_policy(&self, relationship: RelationshipId) -> Option<&Policy> {
        let policy_id = self.bindings.get(&relationship)?;
        self.policies.get(policy_id)
    }

    fn remaining_budget(
        &self,
        relationship: RelationshipId,
        policy: &Policy,
        tier: &PolicyTier,
    ) -> u128 {
        self.spend
            .get(&relationship)
            .copied()
            .unwrap_or_default()
            .remaining_budget(self.clock.now_secs(), policy.epoch_duration(), tier.spend_cap)
    }
}
