//! Wall-clock abstraction.
//!
//! Every time-dependent rule in the core (decay, slash cooldown, epoch
//! windows, ledger timestamps) reads seconds from a [`Clock`]. Production
//! embedders use [`SystemClock`]; tests drive a [`ManualClock`] forward to
//! exercise decay and window expiry without sleeping.
//!
//! All rules tolerate the clock advancing by arbitrarily large gaps
//! between operations: decay simply materializes further, cooldowns and
//! epochs expire.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A monotonic seconds clock.
pub trait Clock: fmt::Debug + Send + Sync {
    /// Returns the current time in whole seconds since the Unix epoch.
    fn now_secs(&self) -> u64;
}

/// The real system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        // A pre-epoch system clock reads as zero rather than panicking.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs())
    }
}

/// A manually advanced clock for tests and simulations.
///
/// Interior atomicity lets shared `Arc<ManualClock>` handles advance time
/// without threading `&mut` through the engines under test.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a clock frozen at `start` seconds.
    #[must_use]
    pub fn new(start: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Advances the clock by `secs` seconds.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Sets the clock to an absolute time in seconds.
    pub fn set(&self, secs: u64) {
        self.now.store(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
