//! Content-addressed policies, tier mapping, and epoch budgets.
//!
//! A policy carries up to eight privilege tiers, each gated by a minimum
//! authority score. The highest tier whose minimum the relationship's
//! current effective authority clears is the active tier; it decides the
//! per-epoch spend cap, the target allow-list, and whether the agent may
//! sub-delegate.
//!
//! # Key Concepts
//!
//! - **Content addressing**: a policy's identifier is the blake3 digest of
//!   its canonical encoding, so identical parameters always produce the
//!   same identifier and re-registration is rejected
//! - **Immutability**: policies never change once registered; a
//!   relationship binds to at most one policy, exactly once
//! - **Lazy epochs**: spend windows reset on the first debit after expiry
//!   rather than on a timer
//! - **Advisory check, authoritative debit**: [`PolicyEngine::check_action`]
//!   predicts; only [`PolicyEngine::record_spend`] mutates state, and it
//!   re-enforces the whitelist and budget itself
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tether_core::authority::AuthorityEngine;
//! use tether_core::identity::Identity;
//! use tether_core::policy::{PolicyEngine, PolicyTier};
//! use tether_core::time::ManualClock;
//!
//! let clock = Arc::new(ManualClock::new(1_000));
//! let mut authority = AuthorityEngine::new(clock.clone());
//! let mut policy = PolicyEngine::new(clock);
//!
//! let principal = Identity::named("alice");
//! let agent = Identity::named("agent-1");
//! let id = authority.create(principal, agent, 500, 1_000, 1).unwrap();
//!
//! let policy_id = policy
//!     .create_policy(86_400, vec![PolicyTier::new(100, 10_000, false, vec![])])
//!     .unwrap();
//! policy.bind_policy(&authority, principal, id, policy_id).unwrap();
//!
//! let check = policy.check_action(&authority, id, Identity::named("venue"), 2_500);
//! assert!(check.allowed);
//! ```

mod engine;
mod error;
mod types;

#[cfg(test)]
mod tests;

pub use engine::{ActionCheck, AgentStatus, PolicyEngine, SpendReceipt};
pub use error::{
    DENY_REASON_BELOW_ALL_TIERS, DENY_REASON_BUDGET_EXCEEDED, DENY_REASON_TARGET_NOT_WHITELISTED,
    DENY_REASON_UNBOUND, PolicyError,
};
pub use types::{MAX_TIERS, Policy, PolicyId, PolicyTier, SpendState, TIER_NONE};
