//! # Hub configuration.
//!
//! Provides [`HubConfig`] - the per-session settings a
//! [`PropertyHub`](crate::PropertyHub) is created with.
//!
//! Construct one hub per transport session and pass it explicitly; there is
//! no ambient global configuration and nothing here persists to disk.

use crate::property::Freshness;

/// Configuration for one distribution hub.
///
/// ## Field semantics
/// - `default_freshness`: the update cadence each consumption-adapter
///   manager starts out requesting when its consumer does not say otherwise.
///   Every manager copies this into its own mutable setting at first use
///   (see e.g. [`CallbackMap::set_default_freshness`](crate::CallbackMap::set_default_freshness)),
///   so later changes on one adapter do not affect the others.
#[derive(Clone, Copy, Debug)]
pub struct HubConfig {
    /// Default freshness for adapter-managed registrations.
    pub default_freshness: Freshness,
}

impl Default for HubConfig {
    /// Default configuration:
    ///
    /// - `default_freshness = 1000ms` (one update per second)
    fn default() -> Self {
        Self {
            default_freshness: Freshness::millis(1000),
        }
    }
}
