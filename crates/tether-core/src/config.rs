//! Engine configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default slash cooldown window: one hour.
pub const DEFAULT_SLASH_COOLDOWN_SECS: u64 = 3_600;

/// Tunable windows for the core engines.
///
/// The defaults match the reference deployment; embedders that override
/// them should call [`CoreConfig::validate`] before constructing engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CoreConfig {
    /// Minimum seconds between two slashes by the same slasher against the
    /// same relationship.
    pub slash_cooldown_secs: u64,
}

impl CoreConfig {
    /// Checks that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SlashCooldownZero`] if the slash cooldown is
    /// zero, which would disable permissionless-reduction rate limiting
    /// entirely.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.slash_cooldown_secs == 0 {
            return Err(ConfigError::SlashCooldownZero);
        }
        Ok(())
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            slash_cooldown_secs: DEFAULT_SLASH_COOLDOWN_SECS,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The slash cooldown must be strictly positive.
    #[error("slash cooldown must be strictly positive")]
    SlashCooldownZero,
}
