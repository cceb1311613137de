//! Decaying-authority state machine.
//!
//! This module owns every relationship between a principal and a delegate
//! agent. A relationship carries a numeric authority budget that decays
//! linearly with wall time and is only replenished by explicit principal
//! action.
//!
//! ```text
//! create --> Relationship (alive)
//!            |  heartbeat: materialize decay, reset refresh point
//!            |  boost:     materialize, add up to ceiling
//!            |  slash:     materialize, subtract toward zero (any caller)
//!            v
//! kill ----> Relationship (dead, authority 0, terminal)
//! ```
//!
//! # Key Concepts
//!
//! - **Lazy decay**: decay is computed at read time and only written back
//!   ("materialized") by mutating operations, so an idle relationship
//!   costs nothing and survives arbitrary clock gaps
//! - **Walkaway safety**: if the principal stops calling, effective
//!   authority reaches zero on its own; no revocation message is needed
//! - **Permissionless slash**: anyone may reduce authority, rate-limited
//!   per slasher per relationship
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tether_core::authority::AuthorityEngine;
//! use tether_core::identity::Identity;
//! use tether_core::time::ManualClock;
//!
//! let clock = Arc::new(ManualClock::new(1_000));
//! let mut engine = AuthorityEngine::new(clock.clone());
//!
//! let principal = Identity::named("alice");
//! let agent = Identity::named("agent-1");
//! let id = engine
//!     .create(principal, agent, 1_000, 10_000, 1)
//!     .unwrap();
//!
//! clock.advance(250);
//! assert_eq!(engine.effective_authority(id).unwrap(), 750);
//! ```

mod engine;
mod error;
mod state;

#[cfg(test)]
mod proptest_decay;

pub use engine::{ActiveRelationship, AuthorityEngine};
pub use error::AuthorityError;
pub use state::{Relationship, RelationshipId};
