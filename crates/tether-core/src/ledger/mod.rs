//! Agent-attested action ledger.
//!
//! Each relationship owns an append-only sequence of [`LogEntry`] records
//! linked into a rolling hash chain: every entry carries the digest of its
//! predecessor, and the chain head is the digest of the latest entry. Any
//! tampering with a historical entry breaks the chain.
//!
//! # Key Concepts
//!
//! - **Append-only semantics**: entries can only be added, never modified
//!   or deleted
//! - **Agent-attested**: only the relationship's agent may append, and the
//!   core records intent without verifying external execution
//! - **Authority stamping**: every entry captures the effective authority
//!   at append time, so the audit trail shows how much permission the
//!   agent held for each action
//! - **O(1) append, O(N) verify**: the rolling chain avoids a Merkle tree;
//!   ranged variants bound verification and summary walks on long logs
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tether_core::authority::AuthorityEngine;
//! use tether_core::identity::Identity;
//! use tether_core::ledger::{ActionKind, ActionLedger};
//! use tether_core::time::ManualClock;
//!
//! let clock = Arc::new(ManualClock::new(1_000));
//! let mut authority = AuthorityEngine::new(clock.clone());
//! let mut ledger = ActionLedger::new(clock);
//!
//! let principal = Identity::named("alice");
//! let agent = Identity::named("agent-1");
//! let id = authority.create(principal, agent, 1_000, 10_000, 1).unwrap();
//!
//! ledger
//!     .log(&authority, agent, id, ActionKind::Transfer, Identity::named("venue"), 250)
//!     .unwrap();
//! assert!(ledger.verify_chain(id).is_ok());
//! ```

mod chain;
mod entry;
mod error;


pub use chain::{ActionLedger, ChainSummary};
pub use entry::{ActionKind, LogEntry};
pub use error::LedgerError;
