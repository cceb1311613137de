//! # tether-core
//!
//! Core library for tether - decaying delegation authority for
//! semi-autonomous agents.
//!
//! A human principal grants an agent a numeric authority budget that
//! decays linearly with wall time unless the principal explicitly renews
//! it. The design goal is "safe by inaction": if the principal walks
//! away, the agent's authority degrades to zero on its own, with no
//! revocation message and no administrator.
//!
//! ## Subsystems
//!
//! - **[`authority`]**: the decaying-authority state machine - create,
//!   heartbeat, boost, permissionless rate-limited slash, terminal kill
//! - **[`policy`]**: content-addressed immutable policies mapping
//!   authority into privilege tiers with per-epoch spend caps and target
//!   allow-lists
//! - **[`ledger`]**: per-relationship append-only action records linked
//!   into a tamper-evident rolling hash chain
//!
//! The engines share no mutable state: the policy engine and ledger read
//! authority through queries on [`authority::AuthorityEngine`]. Each
//! top-level operation is synchronous and check-then-mutate; embedders
//! serialize calls (a single writer or a lock around the engines).
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tether_core::authority::AuthorityEngine;
//! use tether_core::identity::Identity;
//! use tether_core::ledger::{ActionKind, ActionLedger};
//! use tether_core::policy::{PolicyEngine, PolicyTier};
//! use tether_core::time::ManualClock;
//!
//! let clock = Arc::new(ManualClock::new(1_700_000_000));
//! let mut authority = AuthorityEngine::new(clock.clone());
//! let mut policy = PolicyEngine::new(clock.clone());
//! let mut ledger = ActionLedger::new(clock.clone());
//!
//! let alice = Identity::named("alice");
//! let agent = Identity::named("agent-1");
//! let venue = Identity::named("venue");
//!
//! // Delegate 500 units, decaying 1 unit per second.
//! let id = authority.create(alice, agent, 500, 1_000, 1).unwrap();
//!
//! // Gate the agent behind a single tier with a daily cap.
//! let policy_id = policy
//!     .create_policy(86_400, vec![PolicyTier::new(100, 10_000, false, vec![])])
//!     .unwrap();
//! policy.bind_policy(&authority, alice, id, policy_id).unwrap();
//!
//! // The agent checks, debits, then attests.
//! assert!(policy.check_action(&authority, id, venue, 2_500).allowed);
//! policy.record_spend(&authority, agent, id, venue, 2_500).unwrap();
//! ledger
//!     .log(&authority, agent, id, ActionKind::Transfer, venue, 2_500)
//!     .unwrap();
//!
//! // If Alice walks away, authority reaches zero on its own.
//! clock.advance(500);
//! assert_eq!(authority.effective_authority(id).unwrap(), 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod authority;
pub mod config;
pub mod crypto;
pub mod events;
pub mod identity;
pub mod ledger;
pub mod policy;
pub mod time;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::authority::{AuthorityEngine, RelationshipId};
    pub use crate::config::CoreConfig;
    pub use crate::events::Event;
    pub use crate::identity::Identity;
    pub use crate::ledger::{ActionKind, ActionLedger};
    pub use crate::policy::{PolicyEngine, PolicyId, PolicyTier};
    pub use crate::time::{Clock, ManualClock, SystemClock};
}

/// Re-export commonly used types at the crate root.
pub use authority::{AuthorityEngine, RelationshipId};
pub use events::Event;
pub use identity::Identity;
pub use ledger::ActionLedger;
pub use policy::{PolicyEngine, PolicyId};
