//! Unix timestamp utilities for payment authorization windows.
//!
//! This module provides the [`UnixTimestamp`] type used to represent the
//! current wall-clock time when checking the `validAfter` / `validBefore`
//! bounds of an EIP-3009 `transferWithAuthorization` message.

use std::fmt::{Display, Formatter};
use std::time::SystemTime;

use alloy_primitives::U256;

/// A Unix timestamp representing seconds since the Unix epoch (1970-01-01T00:00:00Z).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct UnixTimestamp(u64);

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl UnixTimestamp {
    /// Creates a new [`UnixTimestamp`] from a raw seconds value.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the current system time as a [`UnixTimestamp`].
    ///
    /// # Panics
    ///
    /// Panics if the system clock is set to a time before the Unix epoch,
    /// which should never happen on properly configured systems.
    #[must_use]
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("SystemTime before UNIX epoch?!?")
            .as_secs();
        Self(now)
    }

    /// Returns the timestamp as raw seconds since the Unix epoch.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Widens the timestamp for comparison with on-chain `uint256` bounds.
    #[must_use]
    pub fn as_u256(&self) -> U256 {
        U256::from(self.0)
    }
}
