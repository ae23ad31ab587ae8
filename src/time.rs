//! Time abstraction for host-agnostic timing.

use core::fmt;

use crate::engine::EngineError;

/// An absolute point in time with millisecond resolution, counted from the
/// Unix epoch in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Instant(i64);

impl Instant {
    /// The Unix epoch.
    pub const EPOCH: Self = Instant(0);

    /// Creates an instant from Unix milliseconds.
    #[inline]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Instant(millis)
    }

    /// Creates an instant from Unix seconds, saturating on overflow.
    #[inline]
    pub const fn from_unix_seconds(seconds: i64) -> Self {
        Instant(seconds.saturating_mul(1000))
    }

    /// Returns the instant as Unix milliseconds.
    #[inline]
    pub const fn as_unix_millis(&self) -> i64 {
        self.0
    }

    /// Adds milliseconds, returns None on overflow.
    pub fn checked_add_millis(self, millis: i64) -> Option<Self> {
        self.0.checked_add(millis).map(Instant)
    }

    /// Milliseconds elapsed since an earlier instant (zero if `earlier` is later).
    pub fn saturating_millis_since(&self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0).max(0) as u64
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Trait for abstracting wall-clock sources.
pub trait TimeSource {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Cadence of a recurring tick, in milliseconds. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickInterval(u32);

impl TickInterval {
    /// Cadence used while milliseconds are on screen.
    pub const FAST: Self = TickInterval(51);

    /// Cadence used when only whole seconds are displayed.
    pub const SLOW: Self = TickInterval(500);

    /// Creates an interval, rejecting zero.
    pub const fn from_millis(millis: u32) -> Result<Self, EngineError> {
        if millis == 0 {
            Err(EngineError::InvalidInterval)
        } else {
            Ok(TickInterval(millis))
        }
    }

    /// Returns the interval in milliseconds.
    #[inline]
    pub const fn as_millis(&self) -> u32 {
        self.0
    }
}

impl Default for TickInterval {
    fn default() -> Self {
        Self::SLOW
    }
}

impl fmt::Display for TickInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
