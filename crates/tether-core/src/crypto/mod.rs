//! Hashing primitives for identifiers and the ledger chain.
//!
//! This module provides the content-addressing and hash-chain primitives
//! used across the core:
//!
//! - **Blake3 hashing**: 32-byte digests for relationship identifiers,
//!   policy identifiers, and ledger entry hashes
//! - **Canonical encoding**: a length-unambiguous byte encoding so that
//!   identical inputs always produce identical identifiers
//!
//! # Canonical Encoding
//!
//! Every hashed shape is encoded exactly one way: integers are fixed-width
//! big-endian, booleans are a single byte, and variable-length sequences
//! are preceded by a `u32` element count. Two different parameter lists can
//! therefore never encode to the same byte string.
//!
//! The reference system hashed with keccak256; any fixed, consistently
//! applied 256-bit hash is an acceptable substitute, and this crate uses
//! blake3 throughout.
//!
//! # Example
//!
//! ```rust
//! use tether_core::crypto::{CanonicalEncoder, Hash};
//!
//! let mut enc = CanonicalEncoder::new();
//! enc.push_u64(86_400);
//! enc.push_u128(1_000_000_000_000_000_000);
//! let digest = enc.finish();
//! assert_ne!(digest, Hash::ZERO);
//! ```

mod encode;
mod hash;


pub use encode::CanonicalEncoder;
pub use hash::{HASH_SIZE, Hash, HashParseError, hash_bytes};
