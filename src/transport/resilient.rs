//! # Resilient transport wrapper.
//!
//! [`ResilientTransport`] sits between the distribution hub and whatever
//! transport the connection code currently has (if any). It survives the
//! transport being swapped or lost entirely, and replays the wanted
//! subscriptions whenever a fresh transport is installed.
//!
//! ## Architecture
//! ```text
//! PropertyHub ──► ResilientTransport ──► installed: Option<TransportRef>
//!                       │
//!                       └─► wanted: PropertyKey → Freshness   (tightest ever)
//!
//! install(Some(t)):  replay every wanted entry as t.subscribe(key, freshness)
//! install(None):     no replay; calls become silent no-ops (table still kept)
//! call fails:        demote installed to None, log, never propagate
//! ```
//!
//! ## Rules
//! - The wanted table only ever tightens while entries exist; an explicit
//!   `unsubscribe` is the only thing that removes an entry.
//! - Equal-or-looser `subscribe` requests touch neither the table nor the
//!   transport: the transport exposes no way to ask what is currently
//!   subscribed, so the tightest-ever value is the only request that never
//!   under-serves a concurrent consumer.
//! - Failures never reach the caller; future calls silently no-op until the
//!   next `install`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::TransportError;
use crate::property::{Freshness, PropertyKey};
use crate::transport::TransportRef;

/// Wrapper around a swappable, possibly absent transport.
///
/// Owned by [`PropertyHub`](crate::PropertyHub); the hub forwards every
/// first-handler/last-handler transition here, and the connection code swaps
/// the underlying transport through
/// [`PropertyHub::install_transport`](crate::PropertyHub::install_transport).
pub struct ResilientTransport {
    installed: Mutex<Option<TransportRef>>,
    wanted: Mutex<HashMap<PropertyKey, Freshness>>,
}

impl ResilientTransport {
    /// Creates a wrapper with no transport installed and an empty table.
    pub fn new() -> Self {
        Self {
            installed: Mutex::new(None),
            wanted: Mutex::new(HashMap::new()),
        }
    }

    /// Installs a new transport (or none) and replays the wanted table.
    ///
    /// Replay runs in sorted key order so reconnect behavior is
    /// deterministic. A replay failure demotes the transport and stops the
    /// replay; the remaining entries stay wanted for the next install.
    pub fn install(&self, transport: Option<TransportRef>) {
        *self.installed.lock() = transport.clone();
        let Some(transport) = transport else {
            tracing::debug!("transport removed; subscriptions parked");
            return;
        };

        let mut replay: Vec<(PropertyKey, Freshness)> =
            self.wanted.lock().iter().map(|(k, f)| (*k, *f)).collect();
        replay.sort_unstable_by_key(|(key, _)| *key);

        tracing::debug!(entries = replay.len(), "transport installed; replaying subscriptions");
        for (key, freshness) in replay {
            if let Err(err) = transport.subscribe(key, freshness) {
                self.demote(&transport, "subscribe", &err);
                break;
            }
        }
    }

    /// Requests updates for `key`, arbitrating against earlier requests.
    ///
    /// Forwards to the installed transport only when `key` is new or
    /// `freshness` is strictly tighter than the remembered value. The table
    /// is updated in those cases even while no transport is installed, so a
    /// later [`install`](Self::install) replays the right cadence.
    pub fn subscribe(&self, key: PropertyKey, freshness: Freshness) {
        let forward = {
            let mut wanted = self.wanted.lock();
            match wanted.get(&key) {
                Some(current) if !freshness.is_tighter_than(*current) => false,
                _ => {
                    wanted.insert(key, freshness);
                    true
                }
            }
        };
        if !forward {
            return;
        }

        let Some(transport) = self.installed.lock().clone() else {
            return;
        };
        if let Err(err) = transport.subscribe(key, freshness) {
            self.demote(&transport, "subscribe", &err);
        }
    }

    /// Stops updates for `key` and forgets its remembered freshness.
    pub fn unsubscribe(&self, key: PropertyKey) {
        self.wanted.lock().remove(&key);

        let Some(transport) = self.installed.lock().clone() else {
            return;
        };
        if let Err(err) = transport.unsubscribe(key) {
            self.demote(&transport, "unsubscribe", &err);
        }
    }

    /// Returns true while a transport is installed.
    pub fn is_installed(&self) -> bool {
        self.installed.lock().is_some()
    }

    /// Returns the remembered (tightest-ever) freshness for `key`.
    pub fn remembered(&self, key: PropertyKey) -> Option<Freshness> {
        self.wanted.lock().get(&key).copied()
    }

    /// Drops the installed transport if it is still the one that failed.
    ///
    /// The pointer check keeps a concurrent `install` from being clobbered
    /// by a stale failure report.
    fn demote(&self, failed: &TransportRef, op: &'static str, err: &TransportError) {
        let mut installed = self.installed.lock();
        if installed
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, failed))
        {
            *installed = None;
            tracing::warn!(op, error = %err, label = err.as_label(), "transport call failed; demoted to absent");
        }
    }
}

impl Default for ResilientTransport {
    fn default() -> Self {
        Self::new()
    }
}
