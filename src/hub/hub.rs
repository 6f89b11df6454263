//! # Property hub - latest-value cache and fan-out engine.
//!
//! [`PropertyHub`] is the central distribution point for one transport
//! session: it owns the per-key cache and handler sets, turns handler
//! attach/detach into transport subscribe/unsubscribe through the
//! [`ResilientTransport`], and fans incoming updates out to every
//! registered handler.
//!
//! ## Architecture
//! ```text
//! decode glue ── on_update(key, value) ──► PropertyHub
//!                                            ├─ cache[key] = value
//!                                            └─ snapshot handlers[key], fan out
//!
//! adapter ── add_handler / remove_handler ──► PropertyHub
//!                                               └─► ResilientTransport ──► Transport
//! ```
//!
//! ## Rules
//! - A key has a live transport subscription iff its handler set is
//!   non-empty (empty→non-empty subscribes, non-empty→empty unsubscribes).
//! - A cached value is only ever replaced by a newer update for the same
//!   key; an emptied handler set leaves it in place for late subscribers.
//! - Fan-out iterates over a snapshot taken under the lock, so a handler
//!   that adds or removes handlers mid-delivery cannot corrupt the pass.
//! - `add_handler`/`remove_handler` never fail: transport trouble is
//!   absorbed one layer down.
//!
//! ## Example
//! ```rust
//! use propcast::{FnHandler, Freshness, HandlerRef, HubConfig, PropertyHub, PropertyKey, PropertyValue};
//!
//! let hub = PropertyHub::new(HubConfig::default());
//! let key = PropertyKey::new(0x0207);
//!
//! let speed: HandlerRef = FnHandler::arc("speed", |_k, v: &PropertyValue| {
//!     println!("speed changed: {v:?}");
//! });
//! hub.add_handler(key, Freshness::millis(500), speed.clone());
//!
//! // Fed by the protocol decoder:
//! hub.on_update(key, PropertyValue::Int32(88));
//! assert_eq!(hub.current_value(key), Some(PropertyValue::Int32(88)));
//!
//! hub.remove_handler(key, &speed);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::adapters::{CallbackMap, LiveValues, PropertyStreams};
use crate::config::HubConfig;
use crate::hub::handler::HandlerRef;
use crate::property::{Freshness, PropertyKey, PropertyValue};
use crate::transport::{ResilientTransport, TransportRef};

/// Per-key subscription record: last known value plus interested handlers.
#[derive(Default)]
struct Record {
    value: Option<PropertyValue>,
    handlers: Vec<HandlerRef>,
}

impl Record {
    fn contains(&self, handler: &HandlerRef) -> bool {
        self.handlers.iter().any(|h| Arc::ptr_eq(h, handler))
    }
}

/// Central distribution hub for one transport session.
///
/// Create one per session with [`PropertyHub::new`] and pass the `Arc`
/// around explicitly; the hub holds no ambient global state. The three
/// consumption adapters ([`callbacks`](Self::callbacks),
/// [`streams`](Self::streams), [`live_values`](Self::live_values)) are
/// lazily created sub-objects that hold only a weak reference back, so they
/// can never keep a defunct hub alive.
pub struct PropertyHub {
    records: Mutex<HashMap<PropertyKey, Record>>,
    transport: ResilientTransport,
    cfg: HubConfig,
    callbacks: OnceLock<CallbackMap>,
    streams: OnceLock<PropertyStreams>,
    live_values: OnceLock<LiveValues>,
}

impl PropertyHub {
    /// Creates a hub with no transport installed.
    pub fn new(cfg: HubConfig) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(HashMap::new()),
            transport: ResilientTransport::new(),
            cfg,
            callbacks: OnceLock::new(),
            streams: OnceLock::new(),
            live_values: OnceLock::new(),
        })
    }

    /// Returns the hub configuration.
    pub fn config(&self) -> &HubConfig {
        &self.cfg
    }

    /// Swaps the underlying transport (or removes it with `None`).
    ///
    /// Installing a transport replays every still-wanted subscription, so
    /// consumers ride through a reconnect without re-attaching.
    pub fn install_transport(&self, transport: Option<TransportRef>) {
        self.transport.install(transport);
    }

    /// Returns true while an underlying transport is installed.
    pub fn is_transport_installed(&self) -> bool {
        self.transport.is_installed()
    }

    /// Pure cache read: the most recent known value for `key`, if any.
    pub fn current_value(&self, key: PropertyKey) -> Option<PropertyValue> {
        self.records
            .lock()
            .get(&key)
            .and_then(|record| record.value.clone())
    }

    /// Registers `handler` as interested in `key`.
    ///
    /// The wrapper `subscribe` is issued on every call - its tightest-ever
    /// arbitration decides whether the transport sees anything. When the set
    /// already held at least one handler and a cached value exists, that
    /// value is delivered synchronously to `handler` alone before this
    /// method returns; the first-handler transition performs no synthetic
    /// delivery (the first real update arrives from the transport).
    ///
    /// Adding a handler that is already present is a membership no-op, but
    /// the synchronous cached delivery still runs.
    pub fn add_handler(&self, key: PropertyKey, freshness: Freshness, handler: HandlerRef) {
        let redeliver = {
            let mut records = self.records.lock();
            let record = records.entry(key).or_default();
            let was_empty = record.handlers.is_empty();
            if !record.contains(&handler) {
                record.handlers.push(Arc::clone(&handler));
            }
            if was_empty {
                None
            } else {
                record.value.clone()
            }
        };

        self.transport.subscribe(key, freshness);

        if let Some(value) = redeliver {
            handler.on_update(key, &value);
        }
    }

    /// Removes `handler` from the set for `key`.
    ///
    /// Idempotent: removing an absent handler is a no-op. The
    /// non-empty→empty transition issues the wrapper `unsubscribe`; the
    /// cached value stays put for the next subscriber.
    pub fn remove_handler(&self, key: PropertyKey, handler: &HandlerRef) {
        let now_empty = {
            let mut records = self.records.lock();
            let Some(record) = records.get_mut(&key) else {
                return;
            };
            let before = record.handlers.len();
            record.handlers.retain(|h| !Arc::ptr_eq(h, handler));
            before != record.handlers.len() && record.handlers.is_empty()
        };

        if now_empty {
            self.transport.unsubscribe(key);
        }
    }

    /// Feeds one decoded update into the hub.
    ///
    /// Called by the transport-facing glue, potentially from the connection
    /// thread. Writes the cache (also for keys nobody currently watches),
    /// then fans out to a snapshot of the handler set taken under the lock.
    /// Handler panics are not caught here; adapters isolate their own
    /// callbacks.
    pub fn on_update(&self, key: PropertyKey, value: PropertyValue) {
        let snapshot = {
            let mut records = self.records.lock();
            let record = records.entry(key).or_default();
            record.value = Some(value.clone());
            record.handlers.clone()
        };

        for handler in snapshot {
            handler.on_update(key, &value);
        }
    }

    /// Returns the sorted keys that currently have at least one handler.
    pub fn subscribed_keys(&self) -> Vec<PropertyKey> {
        let records = self.records.lock();
        let mut keys: Vec<PropertyKey> = records
            .iter()
            .filter(|(_, record)| !record.handlers.is_empty())
            .map(|(key, _)| *key)
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Returns how many handlers are registered for `key`.
    pub fn handler_count(&self, key: PropertyKey) -> usize {
        self.records
            .lock()
            .get(&key)
            .map_or(0, |record| record.handlers.len())
    }

    /// Callback-map consumption adapter for this hub (lazily created).
    pub fn callbacks(self: &Arc<Self>) -> &CallbackMap {
        self.callbacks
            .get_or_init(|| CallbackMap::new(Arc::downgrade(self), self.cfg.default_freshness))
    }

    /// Reactive-stream consumption adapter for this hub (lazily created).
    pub fn streams(self: &Arc<Self>) -> &PropertyStreams {
        self.streams
            .get_or_init(|| PropertyStreams::new(Arc::downgrade(self), self.cfg.default_freshness))
    }

    /// Lifecycle-value consumption adapter for this hub (lazily created).
    pub fn live_values(self: &Arc<Self>) -> &LiveValues {
        self.live_values
            .get_or_init(|| LiveValues::new(Arc::downgrade(self), self.cfg.default_freshness))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::hub::FnHandler;
    use crate::testing::{RecordingTransport, TransportCall};

    const K1: PropertyKey = PropertyKey::new(1);
    const K2: PropertyKey = PropertyKey::new(2);

    fn hub_with_recorder() -> (Arc<PropertyHub>, Arc<RecordingTransport>) {
        let hub = PropertyHub::new(HubConfig::default());
        let rec = RecordingTransport::arc();
        hub.install_transport(Some(rec.clone()));
        (hub, rec)
    }

    fn counting_handler(hits: Arc<AtomicUsize>) -> HandlerRef {
        FnHandler::arc("counting", move |_key: PropertyKey, _value: &PropertyValue| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_subscribe_only_on_empty_to_nonempty_transition() {
        let (hub, rec) = hub_with_recorder();
        let h1 = counting_handler(Arc::new(AtomicUsize::new(0)));
        let h2 = counting_handler(Arc::new(AtomicUsize::new(0)));

        hub.add_handler(K1, Freshness::millis(500), h1.clone());
        hub.add_handler(K1, Freshness::millis(500), h2.clone());

        // The wrapper saw both requests but forwarded only the first.
        assert_eq!(
            rec.calls(),
            vec![TransportCall::Subscribe(K1, Freshness::millis(500))]
        );

        hub.remove_handler(K1, &h1);
        assert_eq!(rec.calls().len(), 1);

        hub.remove_handler(K1, &h2);
        assert_eq!(
            rec.calls(),
            vec![
                TransportCall::Subscribe(K1, Freshness::millis(500)),
                TransportCall::Unsubscribe(K1),
            ]
        );

        // Empty→non-empty again restarts the subscription.
        hub.add_handler(K1, Freshness::millis(500), h1);
        assert_eq!(rec.calls().len(), 3);
    }

    #[test]
    fn test_late_subscriber_gets_cached_value_without_redelivery_to_others() {
        let (hub, _rec) = hub_with_recorder();

        let first_hits = Arc::new(AtomicUsize::new(0));
        let h1 = counting_handler(first_hits.clone());
        hub.add_handler(K1, Freshness::millis(500), h1);

        hub.on_update(K1, PropertyValue::Int32(7));
        assert_eq!(first_hits.load(Ordering::SeqCst), 1);

        let late: Mutex<Vec<PropertyValue>> = Mutex::new(Vec::new());
        let late = Arc::new(late);
        let late_in_handler = late.clone();
        let h2: HandlerRef = FnHandler::arc("late", move |_key, value: &PropertyValue| {
            late_in_handler.lock().push(value.clone());
        });
        hub.add_handler(K1, Freshness::millis(5000), h2);

        // Delivered synchronously to the newcomer only.
        assert_eq!(late.lock().as_slice(), &[PropertyValue::Int32(7)]);
        assert_eq!(first_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_first_handler_gets_no_synthetic_delivery() {
        let (hub, _rec) = hub_with_recorder();

        // Cache a value, then empty the set.
        let h1 = counting_handler(Arc::new(AtomicUsize::new(0)));
        hub.add_handler(K1, Freshness::millis(500), h1.clone());
        hub.on_update(K1, PropertyValue::Int32(7));
        hub.remove_handler(K1, &h1);

        let hits = Arc::new(AtomicUsize::new(0));
        hub.add_handler(K1, Freshness::millis(500), counting_handler(hits.clone()));

        // First handler of the (re)started subscription waits for the wire.
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(hub.current_value(K1), Some(PropertyValue::Int32(7)));
    }

    #[test]
    fn test_duplicate_add_is_membership_noop_but_redelivers() {
        let (hub, _rec) = hub_with_recorder();

        let other = counting_handler(Arc::new(AtomicUsize::new(0)));
        hub.add_handler(K1, Freshness::millis(500), other);
        hub.on_update(K1, PropertyValue::Int32(1));

        let hits = Arc::new(AtomicUsize::new(0));
        let h = counting_handler(hits.clone());
        hub.add_handler(K1, Freshness::millis(500), h.clone());
        assert_eq!(hits.load(Ordering::SeqCst), 1); // cached redelivery
        hub.add_handler(K1, Freshness::millis(500), h.clone());
        assert_eq!(hits.load(Ordering::SeqCst), 2); // runs again on re-add
        assert_eq!(hub.handler_count(K1), 2); // but membership unchanged

        hub.on_update(K1, PropertyValue::Int32(2));
        assert_eq!(hits.load(Ordering::SeqCst), 3); // delivered once per update
    }

    #[test]
    fn test_cache_survives_empty_handler_set() {
        let (hub, _rec) = hub_with_recorder();
        let h = counting_handler(Arc::new(AtomicUsize::new(0)));

        hub.add_handler(K1, Freshness::millis(500), h.clone());
        hub.on_update(K1, PropertyValue::Float(3.5));
        hub.remove_handler(K1, &h);

        assert_eq!(hub.handler_count(K1), 0);
        assert_eq!(hub.current_value(K1), Some(PropertyValue::Float(3.5)));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (hub, rec) = hub_with_recorder();
        let h = counting_handler(Arc::new(AtomicUsize::new(0)));

        hub.add_handler(K1, Freshness::millis(500), h.clone());
        hub.remove_handler(K1, &h);
        hub.remove_handler(K1, &h);
        hub.remove_handler(K2, &h);

        let unsubscribes = rec
            .calls()
            .into_iter()
            .filter(|c| matches!(c, TransportCall::Unsubscribe(_)))
            .count();
        assert_eq!(unsubscribes, 1);
    }

    /// A handler that detaches itself mid-delivery.
    struct SelfRemoving {
        hub: Arc<PropertyHub>,
        key: PropertyKey,
        me: OnceLock<HandlerRef>,
        hits: AtomicUsize,
    }

    impl crate::PropertyHandler for SelfRemoving {
        fn on_update(&self, _key: PropertyKey, _value: &PropertyValue) {
            self.hits.fetch_add(1, Ordering::SeqCst);
            if let Some(me) = self.me.get() {
                self.hub.remove_handler(self.key, me);
            }
        }
    }

    #[test]
    fn test_reentrant_remove_during_fanout_is_safe() {
        let (hub, _rec) = hub_with_recorder();

        let this = Arc::new(SelfRemoving {
            hub: hub.clone(),
            key: K1,
            me: OnceLock::new(),
            hits: AtomicUsize::new(0),
        });
        let me: HandlerRef = this.clone();
        this.me.set(me.clone()).ok();

        let other_hits = Arc::new(AtomicUsize::new(0));
        hub.add_handler(K1, Freshness::millis(500), me);
        hub.add_handler(K1, Freshness::millis(500), counting_handler(other_hits.clone()));

        hub.on_update(K1, PropertyValue::Int32(1));
        // Both handlers saw the pass the removal happened in.
        assert_eq!(this.hits.load(Ordering::SeqCst), 1);
        assert_eq!(other_hits.load(Ordering::SeqCst), 1);

        hub.on_update(K1, PropertyValue::Int32(2));
        // The self-removed handler is gone; the other still gets updates.
        assert_eq!(this.hits.load(Ordering::SeqCst), 1);
        assert_eq!(other_hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reentrant_add_during_fanout_joins_next_pass() {
        let (hub, _rec) = hub_with_recorder();

        let new_hits = Arc::new(AtomicUsize::new(0));
        let newcomer = counting_handler(new_hits.clone());

        let hub_in_handler = hub.clone();
        let newcomer_in_handler = newcomer.clone();
        let adder: HandlerRef = FnHandler::arc("adder", move |key, _value: &PropertyValue| {
            hub_in_handler.add_handler(key, Freshness::millis(500), newcomer_in_handler.clone());
        });
        hub.add_handler(K1, Freshness::millis(500), adder);

        hub.on_update(K1, PropertyValue::Int32(1));
        // Added mid-pass: redelivered the fresh cache entry synchronously,
        // but not part of the snapshot being iterated.
        assert_eq!(new_hits.load(Ordering::SeqCst), 1);
        assert_eq!(hub.handler_count(K1), 2);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let (hub, rec) = hub_with_recorder();

        assert_eq!(hub.current_value(K1), None);

        let h1_values = Arc::new(Mutex::new(Vec::new()));
        let h1_sink = h1_values.clone();
        let h1: HandlerRef = FnHandler::arc("h1", move |_k, v: &PropertyValue| {
            h1_sink.lock().push(v.clone());
        });
        hub.add_handler(K1, Freshness::millis(1000), h1.clone());
        assert_eq!(
            rec.calls(),
            vec![TransportCall::Subscribe(K1, Freshness::millis(1000))]
        );

        hub.on_update(K1, PropertyValue::Int32(42));
        assert_eq!(h1_values.lock().as_slice(), &[PropertyValue::Int32(42)]);

        let h2_values = Arc::new(Mutex::new(Vec::new()));
        let h2_sink = h2_values.clone();
        let h2: HandlerRef = FnHandler::arc("h2", move |_k, v: &PropertyValue| {
            h2_sink.lock().push(v.clone());
        });
        hub.add_handler(K1, Freshness::millis(5000), h2.clone());

        // Cached value reached the newcomer; looser request not forwarded.
        assert_eq!(h2_values.lock().as_slice(), &[PropertyValue::Int32(42)]);
        assert_eq!(rec.calls().len(), 1);

        hub.remove_handler(K1, &h1);
        assert_eq!(rec.calls().len(), 1); // h2 still registered

        hub.remove_handler(K1, &h2);
        assert_eq!(
            rec.calls(),
            vec![
                TransportCall::Subscribe(K1, Freshness::millis(1000)),
                TransportCall::Unsubscribe(K1),
            ]
        );

        assert_eq!(hub.current_value(K1), Some(PropertyValue::Int32(42)));
    }

    #[test]
    fn test_subscribed_keys_sorted_and_live_only() {
        let (hub, _rec) = hub_with_recorder();
        let h = counting_handler(Arc::new(AtomicUsize::new(0)));

        hub.add_handler(K2, Freshness::millis(500), h.clone());
        hub.add_handler(K1, Freshness::millis(500), h.clone());
        hub.on_update(PropertyKey::new(9), PropertyValue::Bool(true)); // cache only

        assert_eq!(hub.subscribed_keys(), vec![K1, K2]);
    }
}
