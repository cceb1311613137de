//! Opaque caller identities.
//!
//! The core never authenticates anyone; the embedding host resolves who is
//! calling and passes an [`Identity`] into each operation. The core only
//! needs equality and a distinguished zero value, so identities are opaque
//! 32-byte values with hex display.

use std::fmt;
use std::str::FromStr;

use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Size of an identity in bytes.
pub const IDENTITY_SIZE: usize = 32;

/// An opaque 32-byte identity.
///
/// The all-zeroes identity is reserved as "nobody" and is rejected wherever
/// a real party is required.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity([u8; IDENTITY_SIZE]);

impl Identity {
    /// The reserved zero identity.
    pub const ZERO: Self = Self([0u8; IDENTITY_SIZE]);

    /// Creates an identity from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; IDENTITY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes of this identity.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; IDENTITY_SIZE] {
        &self.0
    }

    /// Returns `true` if this is the reserved zero identity.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; IDENTITY_SIZE]
    }

    /// Derives a deterministic identity from a human-readable label.
    ///
    /// Intended for tests and embedders that key parties by name rather
    /// than by key material. The same label always yields the same
    /// identity.
    #[must_use]
    pub fn named(label: &str) -> Self {
        Self(*blake3::hash(label.as_bytes()).as_bytes())
    }

    /// Parses an identity from a 64-character hex string.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityParseError`] if the input is not exactly 64 hex
    /// characters.
    pub fn from_hex(s: &str) -> Result<Self, IdentityParseError> {
        let bytes = hex::decode(s).map_err(|_| IdentityParseError::InvalidHex)?;
        let arr: [u8; IDENTITY_SIZE] = bytes
            .try_into()
            .map_err(|_| IdentityParseError::InvalidLength)?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", hex::encode(&self.0[..8]))
    }
}

impl FromStr for Identity {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Identity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Errors from parsing an identity out of hex text.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdentityParseError {
    /// The input was not valid hex.
    #[error("identity is not valid hex")]
    InvalidHex,

    /// The decoded input was not exactly [`IDENTITY_SIZE`] bytes.
    #[error("identity must be exactly {IDENTITY_SIZE} bytes")]
    InvalidLength,
}
