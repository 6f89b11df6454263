//! # Freshness: requested update cadence.
//!
//! [`Freshness`] expresses the maximum acceptable delay between successive
//! updates for a property, in transport milliseconds. Smaller is tighter
//! (more frequent). The resilient transport wrapper arbitrates between
//! concurrent requests by only ever tightening (see
//! [`ResilientTransport`](crate::ResilientTransport)).
//!
//! [`FreshnessCell`] is the "plain mutable setting" each consumption-adapter
//! manager exposes: a lock-free slot the manager shares with the objects it
//! hands out, so a later `set_default_freshness` call affects subsequent
//! registrations.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Maximum acceptable delay between updates, in transport milliseconds.
///
/// ## Example
/// ```rust
/// use propcast::Freshness;
///
/// let tight = Freshness::millis(200);
/// let loose = Freshness::millis(1000);
///
/// assert!(tight.is_tighter_than(loose));
/// assert!(!loose.is_tighter_than(tight));
/// assert!(!tight.is_tighter_than(tight)); // strictly tighter only
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Freshness(u32);

impl Freshness {
    /// Creates a freshness interval from milliseconds.
    #[inline]
    pub const fn millis(ms: u32) -> Self {
        Self(ms)
    }

    /// Returns the interval in milliseconds.
    #[inline]
    pub const fn as_millis(&self) -> u32 {
        self.0
    }

    /// Returns true if `self` is strictly tighter (numerically smaller)
    /// than `other`.
    #[inline]
    pub const fn is_tighter_than(&self, other: Freshness) -> bool {
        self.0 < other.0
    }
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Shared mutable freshness setting.
///
/// Adapter managers keep their default freshness in one of these and share
/// it (via `Arc`) with the live values they hand out, so changing the
/// default applies to every registration that happens afterwards. Already
/// active registrations are not re-issued.
#[derive(Debug)]
pub struct FreshnessCell {
    millis: AtomicU32,
}

impl FreshnessCell {
    /// Creates a cell holding the given interval.
    pub fn new(freshness: Freshness) -> Self {
        Self {
            millis: AtomicU32::new(freshness.as_millis()),
        }
    }

    /// Returns the current interval.
    pub fn get(&self) -> Freshness {
        Freshness::millis(self.millis.load(Ordering::Relaxed))
    }

    /// Replaces the interval.
    pub fn set(&self, freshness: Freshness) {
        self.millis.store(freshness.as_millis(), Ordering::Relaxed);
    }
}
