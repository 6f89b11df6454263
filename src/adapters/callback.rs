//! # Callback-map consumption adapter.
//!
//! [`CallbackMap`] serves consumers that just want "call this function when
//! the property changes". One stable indirection handler per key stays
//! registered with the hub; the function it invokes lives in a mutable slot,
//! so replacing the callback never re-registers anything and therefore never
//! touches the transport.
//!
//! ## Architecture
//! ```text
//! set(key, Some(cb)) ──► slot[key] = cb ──► hub.add_handler(key, default, slot-handler)
//! set(key, None)     ──► forget slot    ──► hub.remove_handler(key, slot-handler)
//!
//! hub fan-out ──► slot-handler ──► current callback (panic-isolated)
//! ```
//!
//! ## Rules
//! - A panicking callback is caught, logged, and dropped for that update;
//!   other handlers of the same key are unaffected.
//! - Every non-`None` `set` goes through `add_handler`, so the hub's
//!   membership no-op plus cached redelivery semantics apply.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::hub::{HandlerRef, PropertyHandler, PropertyHub};
use crate::property::{Freshness, FreshnessCell, PropertyKey, PropertyValue};

/// Consumer callback invoked with each update of its key.
pub type Callback = Arc<dyn Fn(PropertyKey, &PropertyValue) + Send + Sync>;

/// Stable per-key indirection: the registered handler that looks up and
/// invokes whatever callback is currently set.
struct CallbackSlot {
    current: Mutex<Option<Callback>>,
}

impl PropertyHandler for CallbackSlot {
    fn on_update(&self, key: PropertyKey, value: &PropertyValue) {
        let Some(callback) = self.current.lock().clone() else {
            return;
        };
        if catch_unwind(AssertUnwindSafe(|| callback(key, value))).is_err() {
            tracing::warn!(%key, "property callback panicked; update dropped");
        }
    }

    fn name(&self) -> &str {
        "callback-slot"
    }
}

struct Entry {
    slot: Arc<CallbackSlot>,
    handler: HandlerRef,
}

/// Keyed callback registry over one hub.
///
/// Obtained via [`PropertyHub::callbacks`](crate::PropertyHub::callbacks);
/// exactly one exists per hub.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use propcast::{HubConfig, PropertyHub, PropertyKey, PropertyValue};
///
/// let hub = PropertyHub::new(HubConfig::default());
/// let key = PropertyKey::new(0x0101);
///
/// hub.callbacks().set(
///     key,
///     Some(Arc::new(|_k, v: &PropertyValue| println!("fuel: {v:?}"))),
/// );
/// hub.on_update(key, PropertyValue::Float(0.62));
/// hub.callbacks().set(key, None);
/// ```
pub struct CallbackMap {
    hub: Weak<PropertyHub>,
    default_freshness: Arc<FreshnessCell>,
    entries: Mutex<HashMap<PropertyKey, Entry>>,
}

impl CallbackMap {
    pub(crate) fn new(hub: Weak<PropertyHub>, default_freshness: Freshness) -> Self {
        Self {
            hub,
            default_freshness: Arc::new(FreshnessCell::new(default_freshness)),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Sets or clears the callback for `key`.
    ///
    /// `Some(cb)` swaps the callback into the key's slot and (re-)registers
    /// the slot handler with the hub at the current default freshness.
    /// `None` removes the handler and forgets both slot and callback.
    pub fn set(&self, key: PropertyKey, callback: Option<Callback>) {
        let Some(hub) = self.hub.upgrade() else {
            return;
        };

        match callback {
            Some(callback) => {
                let handler = {
                    let mut entries = self.entries.lock();
                    let entry = entries.entry(key).or_insert_with(|| {
                        let slot = Arc::new(CallbackSlot {
                            current: Mutex::new(None),
                        });
                        let handler: HandlerRef = slot.clone();
                        Entry { slot, handler }
                    });
                    *entry.slot.current.lock() = Some(callback);
                    Arc::clone(&entry.handler)
                };
                hub.add_handler(key, self.default_freshness.get(), handler);
            }
            None => {
                let entry = self.entries.lock().remove(&key);
                if let Some(entry) = entry {
                    hub.remove_handler(key, &entry.handler);
                }
            }
        }
    }

    /// Returns the currently set callback for `key`, if any.
    pub fn get(&self, key: PropertyKey) -> Option<Callback> {
        self.entries
            .lock()
            .get(&key)
            .and_then(|entry| entry.slot.current.lock().clone())
    }

    /// Returns the freshness used for subsequent `set` registrations.
    pub fn default_freshness(&self) -> Freshness {
        self.default_freshness.get()
    }

    /// Changes the freshness used for subsequent `set` registrations.
    ///
    /// Already registered keys are unaffected until their next `set`.
    pub fn set_default_freshness(&self, freshness: Freshness) {
        self.default_freshness.set(freshness);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::HubConfig;
    use crate::hub::FnHandler;
    use crate::testing::{RecordingTransport, TransportCall};

    const K1: PropertyKey = PropertyKey::new(1);

    fn hub_with_recorder() -> (Arc<PropertyHub>, Arc<RecordingTransport>) {
        let hub = PropertyHub::new(HubConfig::default());
        let rec = RecordingTransport::arc();
        hub.install_transport(Some(rec.clone()));
        (hub, rec)
    }

    fn counter_callback(hits: Arc<AtomicUsize>) -> Callback {
        Arc::new(move |_key, _value: &PropertyValue| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_replacing_callback_does_not_resubscribe() {
        let (hub, rec) = hub_with_recorder();

        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        hub.callbacks().set(K1, Some(counter_callback(first.clone())));
        hub.callbacks().set(K1, Some(counter_callback(second.clone())));

        // One slot handler, one forwarded subscribe.
        assert_eq!(hub.handler_count(K1), 1);
        assert_eq!(
            rec.calls(),
            vec![TransportCall::Subscribe(K1, hub.config().default_freshness)]
        );

        hub.on_update(K1, PropertyValue::Int32(1));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clearing_callback_unsubscribes_and_forgets() {
        let (hub, rec) = hub_with_recorder();
        let hits = Arc::new(AtomicUsize::new(0));

        hub.callbacks().set(K1, Some(counter_callback(hits.clone())));
        assert!(hub.callbacks().get(K1).is_some());

        hub.callbacks().set(K1, None);
        assert!(hub.callbacks().get(K1).is_none());
        assert_eq!(hub.handler_count(K1), 0);
        assert!(rec
            .calls()
            .contains(&TransportCall::Unsubscribe(K1)));

        hub.on_update(K1, PropertyValue::Int32(1));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panicking_callback_does_not_poison_other_handlers() {
        let (hub, _rec) = hub_with_recorder();

        hub.callbacks().set(
            K1,
            Some(Arc::new(|_key, _value: &PropertyValue| {
                panic!("consumer bug");
            })),
        );

        let other_hits = Arc::new(AtomicUsize::new(0));
        let sink = other_hits.clone();
        hub.add_handler(
            K1,
            Freshness::millis(500),
            FnHandler::arc("other", move |_k: PropertyKey, _v: &PropertyValue| {
                sink.fetch_add(1, Ordering::SeqCst);
            }),
        );

        hub.on_update(K1, PropertyValue::Int32(1));
        hub.on_update(K1, PropertyValue::Int32(2));
        assert_eq!(other_hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_set_uses_current_default_freshness() {
        let (hub, rec) = hub_with_recorder();

        hub.callbacks().set_default_freshness(Freshness::millis(200));
        hub.callbacks()
            .set(K1, Some(counter_callback(Arc::new(AtomicUsize::new(0)))));

        assert_eq!(
            rec.calls(),
            vec![TransportCall::Subscribe(K1, Freshness::millis(200))]
        );
    }

    #[test]
    fn test_resetting_callback_redelivers_cached_value() {
        let (hub, _rec) = hub_with_recorder();
        let hits = Arc::new(AtomicUsize::new(0));

        hub.callbacks().set(K1, Some(counter_callback(hits.clone())));
        hub.on_update(K1, PropertyValue::Int32(1));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Re-setting the same key runs the hub's cached redelivery.
        hub.callbacks().set(K1, Some(counter_callback(hits.clone())));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
