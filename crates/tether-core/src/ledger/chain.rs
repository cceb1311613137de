//! The per-relationship hash-chained log.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::authority::{AuthorityEngine, RelationshipId};
use crate::crypto::Hash;
use crate::events::Event;
use crate::identity::Identity;
use crate::time::Clock;

use super::entry::{ActionKind, LogEntry};
use super::error::LedgerError;

/// Aggregate view over a span of a relationship's log.
///
/// An empty span reads as all zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSummary {
    /// Number of entries scanned.
    pub total_actions: u64,
    /// Highest authority stamped on any scanned entry.
    pub highest_authority: u128,
    /// Lowest authority stamped on any scanned entry.
    pub lowest_authority: u128,
    /// Sum of entry values. Saturates at `u128::MAX` rather than dropping
    /// contributions.
    pub total_value: u128,
    /// Timestamp of the first scanned entry.
    pub first_action: u64,
    /// Timestamp of the last scanned entry.
    pub last_action: u64,
}

impl ChainSummary {
    fn over(entries: &[LogEntry]) -> Self {
        let Some((first, last)) = entries.first().zip(entries.last()) else {
            return Self::default();
        };

        let mut highest = 0u128;
        let mut lowest = u128::MAX;
        let mut total_value = 0u128;
        for entry in entries {
            highest = highest.max(entry.authority_at_time);
            lowest = lowest.min(entry.authority_at_time);
            total_value = total_value.saturating_add(entry.value);
        }

        Self {
            total_actions: entries.len() as u64,
            highest_authority: highest,
            lowest_authority: lowest,
            total_value,
            first_action: first.timestamp,
            last_action: last.timestamp,
        }
    }
}

/// Appends attested action records into per-relationship hash chains.
///
/// The ledger reads liveness and effective authority from the
/// [`AuthorityEngine`] passed into each call; it owns only the logs and
/// chain heads.
#[derive(Debug)]
pub struct ActionLedger {
    logs: HashMap<RelationshipId, Vec<LogEntry>>,
    heads: HashMap<RelationshipId, Hash>,
    clock: Arc<dyn Clock>,
    events: Vec<Event>,
}

impl ActionLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            logs: HashMap::new(),
            heads: HashMap::new(),
            clock,
            events: Vec::new(),
        }
    }

    // =========================================================================
    // Append
    // =========================================================================

    /// Appends an attested action record and advances the chain head.
    ///
    /// The entry is stamped with the current effective authority, the
    /// current timestamp, and the digest of the previous entry (zero for
    /// the first). Returns the new entry's index.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::RelationshipNotFound`] for unknown relationships
    /// - [`LedgerError::NotAlive`] if the relationship has been killed
    /// - [`LedgerError::NotAgent`] if `caller` is not the agent
    pub fn log(
        &mut self,
        authority: &AuthorityEngine,
        caller: Identity,
        relationship: RelationshipId,
        action: ActionKind,
        target: Identity,
        value: u128,
    ) -> Result<u64, LedgerError> {
        let record = authority
            .get_relationship(relationship)
            .map_err(|_| LedgerError::RelationshipNotFound { relationship })?;
        if !record.alive() {
            return Err(LedgerError::NotAlive { relationship });
        }
        if record.agent() != caller {
            return Err(LedgerError::NotAgent {
                relationship,
                caller,
            });
        }

        let now = self.clock.now_secs();
        let authority_at_time = authority.effective_authority(relationship).unwrap_or(0);
        let prev_hash = self.chain_head(relationship);

        let entry = LogEntry {
            relationship,
            action,
            target,
            value,
            authority_at_time,
            timestamp: now,
            prev_hash,
        };
        let head = entry.entry_hash();

        let log = self.logs.entry(relationship).or_default();
        log.push(entry);
        let index = log.len() as u64 - 1;
        self.heads.insert(relationship, head);

        tracing::debug!(
            relationship = %relationship,
            index,
            action = %action,
            target = %target,
            value = %value,
            authority = %authority_at_time,
            "action logged"
        );
        self.events.push(Event::ActionLogged {
            relationship,
            index,
            action,
            target,
            value,
            authority: authority_at_time,
            chain_head: head,
            at: now,
        });

        Ok(index)
    }

    // =========================================================================
    // Verification
    // =========================================================================

    /// Walks the full chain and checks every back-link and the stored
    /// head. An empty log verifies trivially.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ChainIntegrityBroken`] carrying the index of
    /// the first entry that fails to link; an index equal to the entry
    /// count means the stored head does not match the final entry.
    pub fn verify_chain(&self, relationship: RelationshipId) -> Result<(), LedgerError> {
        let entries = self.entries(relationship);

        let mut computed = Hash::ZERO;
        for (index, entry) in entries.iter().enumerate() {
            if entry.prev_hash != computed {
                return Err(LedgerError::ChainIntegrityBroken {
                    relationship,
                    index: index as u64,
                });
            }
            computed = entry.entry_hash();
        }

        if computed != self.chain_head(relationship) {
            return Err(LedgerError::ChainIntegrityBroken {
                relationship,
                index: entries.len() as u64,
            });
        }
        Ok(())
    }

    /// Walks `[start, end)` of the chain, checking each back-link, and
    /// returns the running digest after the span.
    ///
    /// For `start == 0` the walk begins from the zero genesis digest;
    /// otherwise it anchors on the digest of entry `start - 1`. When the
    /// span reaches the end of the log, the result is also checked against
    /// the stored head, so paginated walks over the whole log are
    /// equivalent to [`ActionLedger::verify_chain`].
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidRange`] for inverted or out-of-bounds spans,
    /// and [`LedgerError::ChainIntegrityBroken`] as in
    /// [`ActionLedger::verify_chain`].
    pub fn verify_range(
        &self,
        relationship: RelationshipId,
        start: u64,
        end: u64,
    ) -> Result<Hash, LedgerError> {
        let entries = self.check_range(relationship, start, end)?;

        let mut computed = if start == 0 {
            Hash::ZERO
        } else {
            self.entries(relationship)[usize::try_from(start).unwrap_or(usize::MAX) - 1]
                .entry_hash()
        };
        for (offset, entry) in entries.iter().enumerate() {
            if entry.prev_hash != computed {
                return Err(LedgerError::ChainIntegrityBroken {
                    relationship,
                    index: start + offset as u64,
                });
            }
            computed = entry.entry_hash();
        }

        if end == self.entry_count(relationship) && computed != self.chain_head(relationship) {
            return Err(LedgerError::ChainIntegrityBroken {
                relationship,
                index: end,
            });
        }
        Ok(computed)
    }

    // =========================================================================
    // Summaries and queries
    // =========================================================================

    /// Aggregates the full log; all zeros when empty.
    #[must_use]
    pub fn summary(&self, relationship: RelationshipId) -> ChainSummary {
        ChainSummary::over(self.entries(relationship))
    }

    /// Aggregates the `[start, end)` span of the log.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRange`] for inverted or out-of-bounds
    /// spans.
    pub fn summary_range(
        &self,
        relationship: RelationshipId,
        start: u64,
        end: u64,
    ) -> Result<ChainSummary, LedgerError> {
        Ok(ChainSummary::over(self.check_range(relationship, start, end)?))
    }

    /// Number of entries in a relationship's log.
    #[must_use]
    pub fn entry_count(&self, relationship: RelationshipId) -> u64 {
        self.entries(relationship).len() as u64
    }

    /// Returns one entry verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::IndexOutOfRange`] past the end of the log.
    pub fn get_entry(
        &self,
        relationship: RelationshipId,
        index: u64,
    ) -> Result<&LogEntry, LedgerError> {
        let entries = self.entries(relationship);
        usize::try_from(index)
            .ok()
            .and_then(|i| entries.get(i))
            .ok_or(LedgerError::IndexOutOfRange {
                relationship,
                index,
                entry_count: entries.len() as u64,
            })
    }

    /// Digest of the most recent entry; zero for an empty log.
    #[must_use]
    pub fn chain_head(&self, relationship: RelationshipId) -> Hash {
        self.heads.get(&relationship).copied().unwrap_or(Hash::ZERO)
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

    fn entries(&self, relationship: RelationshipId) -> &[LogEntry] {
        self.logs.get(&relationship).map_or(&[], Vec::as_slice)
    }

    fn check_range(
        &self,
        relationship: RelationshipId,
        start: u64,
        end: u64,
    ) -> Result<&[LogEntry], LedgerError> {
        let entries = self.entries(relationship);
        let entry_count = entries.len() as u64;
        if start > end || end > entry_count {
            return Err(LedgerError::InvalidRange {
                relationship,
                start,
                end,
                entry_count,
            });
        }
        let (start, end) = (
            usize::try_from(start).unwrap_or(usize::MAX),
            usize::try_from(end).unwrap_or(usize::MAX),
        );
        Ok(&entries[start..end])
    }
}
