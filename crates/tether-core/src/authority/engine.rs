//! The authority engine.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, CoreConfig};
use crate::events::Event;
use crate::identity::Identity;
use crate::time::Clock;

use super::error::AuthorityError;
use super::state::{Relationship, RelationshipId};

/// Snapshot of the most recent relationship for a `(principal, agent)`
/// pair, as recorded in the secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveRelationship {
    /// The most recently created relationship for the pair.
    pub relationship: RelationshipId,
    /// Current effective authority of that relationship.
    pub effective_authority: u128,
    /// Whether that relationship is still alive.
    pub alive: bool,
}

/// Owns every relationship record and the decay function.
///
/// All mutating operations take the caller's identity explicitly; the
/// embedding host is responsible for authenticating it. Operations are
/// check-then-mutate: a failure leaves no partial state behind.
#[derive(Debug)]
pub struct AuthorityEngine {
    relationships: HashMap<RelationshipId, Relationship>,
    /// Per-principal creation counter, feeding identifier derivation.
    sequences: HashMap<Identity, u64>,
    /// Most recent relationship per `(principal, agent)` pair.
    active: HashMap<(Identity, Identity), RelationshipId>,
    /// Last slash timestamp per `(slasher, relationship)`.
    last_slash: HashMap<(Identity, RelationshipId), u64>,
    config: CoreConfig,
    clock: Arc<dyn Clock>,
    events: Vec<Event>,
}

impl AuthorityEngine {
    /// Creates an engine with the default configuration.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::build(clock, CoreConfig::default())
    }

    /// Creates an engine with an explicit, validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid, e.g. a
    /// zero slash cooldown, which would disable permissionless-reduction
    /// rate limiting entirely.
    pub fn with_config(clock: Arc<dyn Clock>, config: CoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(clock, config))
    }

    fn build(clock: Arc<dyn Clock>, config: CoreConfig) -> Self {
        Self {
            relationships: HashMap::new(),
            sequences: HashMap::new(),
            active: HashMap::new(),
            last_slash: HashMap::new(),
            config,
            clock,
            events: Vec::new(),
        }
    }

    // =========================================================================
    // Mutating operations
    // =========================================================================

    /// Creates a new relationship delegating authority from `caller` to
    /// `agent`.
    ///
    /// The identifier is derived from the principal, the agent, and a
    /// per-principal sequence counter, so repeated delegation to the same
    /// agent yields distinct identifiers. The `(principal, agent)` index
    /// is repointed at the newest relationship; older ones stay operable
    /// through their explicit identifier.
    ///
    /// # Errors
    ///
    /// - [`AuthorityError::AgentIsZero`] if `agent` is the zero identity
    /// - [`AuthorityError::AgentIsPrincipal`] if `agent == caller`
    /// - [`AuthorityError::InitialAuthorityExceedsCeiling`] if
    ///   `initial_authority > ceiling`
    /// - [`AuthorityError::DecayRateIsZero`] if `decay_per_second == 0`
    pub fn create(
        &mut self,
        caller: Identity,
        agent: Identity,
        initial_authority: u128,
        ceiling: u128,
        decay_per_second: u128,
    ) -> Result<RelationshipId, AuthorityError> {
        if agent.is_zero() {
            return Err(AuthorityError::AgentIsZero);
        }
        if agent == caller {
            return Err(AuthorityError::AgentIsPrincipal { principal: caller });
        }
        if initial_authority > ceiling {
            return Err(AuthorityError::InitialAuthorityExceedsCeiling {
                initial_authority,
                ceiling,
            });
        }
        if decay_per_second == 0 {
            return Err(AuthorityError::DecayRateIsZero);
        }

        let sequence = self.sequences.entry(caller).or_insert(0);
        let id = RelationshipId::derive(&caller, &agent, *sequence);
        *sequence += 1;

        let now = self.clock.now_secs();
        self.relationships.insert(
            id,
            Relationship::new(caller, agent, initial_authority, ceiling, decay_per_second, now),
        );
        self.active.insert((caller, agent), id);

        tracing::info!(
            relationship = %id,
            principal = %caller,
            agent = %agent,
            initial_authority = %initial_authority,
            ceiling = %ceiling,
            decay_per_second = %decay_per_second,
            "relationship created"
        );
        self.events.push(Event::RelationshipCreated {
            relationship: id,
            principal: caller,
            agent,
            initial_authority,
            ceiling,
            decay_per_second,
            created_at: now,
        });

        Ok(id)
    }

    /// Materializes decay and resets the refresh point.
    ///
    /// Heartbeat never restores authority: it writes the current decayed
    /// value back as the new baseline. Returns the materialized authority.
    ///
    /// # Errors
    ///
    /// Fails if the relationship is unknown, the caller is not its
    /// principal, or it is no longer alive.
    pub fn heartbeat(
        &mut self,
        caller: Identity,
        relationship: RelationshipId,
    ) -> Result<u128, AuthorityError> {
        let now = self.clock.now_secs();
        let record = Self::resolve_principal_mut(&mut self.relationships, relationship, caller)?;

        let authority = record.materialize(now);

        tracing::debug!(relationship = %relationship, authority = %authority, "heartbeat");
        self.events.push(Event::Heartbeat {
            relationship,
            authority,
            at: now,
        });
        Ok(authority)
    }

    /// Adds authority, clamped to the ceiling.
    ///
    /// Decay is materialized first, so the boost applies to the current
    /// effective value. Returns the authority after the boost.
    ///
    /// # Errors
    ///
    /// Fails if `amount` is zero, the relationship is unknown, the caller
    /// is not its principal, or it is no longer alive.
    pub fn boost(
        &mut self,
        caller: Identity,
        relationship: RelationshipId,
        amount: u128,
    ) -> Result<u128, AuthorityError> {
        if amount == 0 {
            return Err(AuthorityError::BoostAmountZero);
        }
        let now = self.clock.now_secs();
        let record = Self::resolve_principal_mut(&mut self.relationships, relationship, caller)?;

        record.materialize(now);
        let authority = record.add_clamped(amount);

        tracing::info!(
            relationship = %relationship,
            amount = %amount,
            authority = %authority,
            "authority boosted"
        );
        self.events.push(Event::Boosted {
            relationship,
            amount,
            authority,
            at: now,
        });
        Ok(authority)
    }

    /// Reduces authority toward zero. Open to any caller, rate-limited
    /// per slasher per relationship.
    ///
    /// Slash never terminates a relationship; it can only drive authority
    /// to zero while leaving it alive. Returns the authority after the
    /// slash.
    ///
    /// # Errors
    ///
    /// Fails if `amount` is zero, the relationship is unknown or dead, or
    /// this slasher already slashed it within the cooldown window.
    pub fn slash(
        &mut self,
        caller: Identity,
        relationship: RelationshipId,
        amount: u128,
    ) -> Result<u128, AuthorityError> {
        if amount == 0 {
            return Err(AuthorityError::SlashAmountZero);
        }
        let now = self.clock.now_secs();

        let record = self
            .relationships
            .get_mut(&relationship)
            .ok_or(AuthorityError::RelationshipNotFound { relationship })?;
        if !record.alive() {
            return Err(AuthorityError::NotAlive { relationship });
        }

        let cooldown = self.config.slash_cooldown_secs;
        if let Some(&last) = self.last_slash.get(&(caller, relationship)) {
            if now.saturating_sub(last) < cooldown {
                return Err(AuthorityError::SlashCooldownActive {
                    relationship,
                    slasher: caller,
                    retry_at: last.saturating_add(cooldown),
                });
            }
        }

        // Materializing before subtracting resets the refresh point to
        // `now`, so past decay cannot be charged a second time.
        record.materialize(now);
        let authority = record.subtract_floored(amount);
        self.last_slash.insert((caller, relationship), now);

        tracing::warn!(
            relationship = %relationship,
            slasher = %caller,
            amount = %amount,
            authority = %authority,
            "authority slashed"
        );
        self.events.push(Event::Slashed {
            relationship,
            slasher: caller,
            amount,
            authority,
            at: now,
        });
        Ok(authority)
    }

    /// Terminates a relationship. Irreversible.
    ///
    /// # Errors
    ///
    /// Fails if the relationship is unknown, the caller is not its
    /// principal, or it is already dead.
    pub fn kill(
        &mut self,
        caller: Identity,
        relationship: RelationshipId,
    ) -> Result<(), AuthorityError> {
        let now = self.clock.now_secs();
        let record = Self::resolve_principal_mut(&mut self.relationships, relationship, caller)?;

        record.kill();

        tracing::info!(relationship = %relationship, "relationship killed");
        self.events.push(Event::Killed {
            relationship,
            at: now,
        });
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current effective authority: the stored value minus decay since the
    /// last refresh, floored at zero. Dead relationships read as zero.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::RelationshipNotFound`] for unknown ids.
    pub fn effective_authority(
        &self,
        relationship: RelationshipId,
    ) -> Result<u128, AuthorityError> {
        let record = self.get_relationship(relationship)?;
        Ok(record.authority_at(self.clock.now_secs()))
    }

    /// Seconds until effective authority reaches zero at the current decay
    /// rate. Zero for dead or already-exhausted relationships.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::RelationshipNotFound`] for unknown ids.
    pub fn time_to_zero(&self, relationship: RelationshipId) -> Result<u64, AuthorityError> {
        let record = self.get_relationship(relationship)?;
        if !record.alive() {
            return Ok(0);
        }
        let effective = record.authority_at(self.clock.now_secs());
        let seconds = effective / record.decay_per_second();
        Ok(u64::try_from(seconds).unwrap_or(u64::MAX))
    }

    /// Authority projected at time `at` from current state.
    ///
    /// For `at <= last_refresh` this returns the stored value, not a
    /// historical answer; see [`Relationship::authority_at`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::RelationshipNotFound`] for unknown ids.
    pub fn authority_at(
        &self,
        relationship: RelationshipId,
        at: u64,
    ) -> Result<u128, AuthorityError> {
        let record = self.get_relationship(relationship)?;
        Ok(record.authority_at(at))
    }

    /// Returns the stored relationship record verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::RelationshipNotFound`] for unknown ids.
    pub fn get_relationship(
        &self,
        relationship: RelationshipId,
    ) -> Result<&Relationship, AuthorityError> {
        self.relationships
            .get(&relationship)
            .ok_or(AuthorityError::RelationshipNotFound { relationship })
    }

    /// Looks up the most recently created relationship for a
    /// `(principal, agent)` pair.
    #[must_use]
    pub fn active_relationship(
        &self,
        principal: Identity,
        agent: Identity,
    ) -> Option<ActiveRelationship> {
        let id = *self.active.get(&(principal, agent))?;
        let record = self.relationships.get(&id)?;
        Some(ActiveRelationship {
            relationship: id,
            effective_authority: record.authority_at(self.clock.now_secs()),
            alive: record.alive(),
        })
    }

    /// `true` if the relationship exists and has not been killed.
    #[must_use]
    pub fn is_alive(&self, relationship: RelationshipId) -> bool {
        self.relationships
            .get(&relationship)
            .is_some_and(Relationship::alive)
    }

    /// Number of relationships ever created, dead ones included.
    #[must_use]
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
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

    /// Resolves a live relationship for a principal-only mutation.
    fn resolve_principal_mut(
        relationships: &mut HashMap<RelationshipId, Relationship>,
        relationship: RelationshipId,
        caller: Identity,
    ) -> Result<&mut Relationship, AuthorityError> {
        let record = relationships
            .get_mut(&relationship)
            .ok_or(AuthorityError::RelationshipNotFound { relationship })?;
        if record.principal() != caller {
            return Err(AuthorityError::NotPrincipal {
                relationship,
                caller,
            });
        }
        if !record.alive() {
            return Err(AuthorityError::NotAlive { relationship });
        }
        Ok(record)
    }
}
