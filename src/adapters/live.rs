//! # Lifecycle-value consumption adapter.
//!
//! [`LiveValues::get`] memoizes one [`LiveValue`] per key: a hot value
//! holder that is registered with the hub only while somebody observes it.
//! Observation is explicit - [`LiveValue::observe`] returns a
//! [`LiveObserver`] guard, and dropping the last guard deactivates the
//! holder - so the live transport subscription tracks real interest, not
//! mere references.
//!
//! ## Architecture
//! ```text
//! get(key) ─────────────────► LiveValue (one per key, memoized)
//! observe(): 0→1 observers ──► hub.add_handler + adopt cached value
//! drop last observer: 1→0  ──► hub.remove_handler (held value kept)
//!
//! transport thread ── on_update ──► equality gate ──► watch channel
//!                                                        └──► observers, on their own tasks
//! ```
//!
//! ## Rules
//! - Activation adopts the hub's cached value immediately; observers never
//!   wait for the next wire event when a last-known value exists.
//! - Redundant deliveries (equal to the held value) produce no
//!   notification.
//! - Values are posted from the transport side; observers pick them up on
//!   whatever task they await [`LiveObserver::changed`] from - the watch
//!   channel is the marshaling boundary.
//! - Deactivation keeps the held value (stale-but-last-known).

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::hub::{HandlerRef, PropertyHandler, PropertyHub};
use crate::property::{Freshness, FreshnessCell, PropertyKey, PropertyValue};

/// Hub handler feeding a live value; weak so an idle holder can be freed.
struct LiveHandler {
    value: Weak<LiveValue>,
}

impl PropertyHandler for LiveHandler {
    fn on_update(&self, _key: PropertyKey, value: &PropertyValue) {
        if let Some(live) = self.value.upgrade() {
            live.publish(value.clone());
        }
    }

    fn name(&self) -> &str {
        "live-value"
    }
}

struct Active {
    observers: usize,
    handler: Option<HandlerRef>,
}

/// Hot holder of one property's latest value.
///
/// Obtained via [`LiveValues::get`]; repeated calls for the same key return
/// the same holder.
pub struct LiveValue {
    key: PropertyKey,
    hub: Weak<PropertyHub>,
    default_freshness: Arc<FreshnessCell>,
    tx: watch::Sender<Option<PropertyValue>>,
    active: Mutex<Active>,
}

impl LiveValue {
    /// The key this holder tracks.
    pub fn key(&self) -> PropertyKey {
        self.key
    }

    /// Returns the currently held value, if any.
    pub fn current(&self) -> Option<PropertyValue> {
        self.tx.borrow().clone()
    }

    /// Returns true while at least one observer is attached.
    pub fn is_active(&self) -> bool {
        self.active.lock().observers > 0
    }

    /// Attaches an observer, activating the holder on the 0→1 transition.
    ///
    /// Activation registers a hub handler at the manager's current default
    /// freshness and adopts the hub's cached value without waiting for a
    /// new event. The returned guard detaches on drop.
    pub fn observe(self: &Arc<Self>) -> LiveObserver {
        {
            let mut active = self.active.lock();
            active.observers += 1;
            if active.observers == 1 {
                if let Some(hub) = self.hub.upgrade() {
                    let handler: HandlerRef = Arc::new(LiveHandler {
                        value: Arc::downgrade(self),
                    });
                    hub.add_handler(self.key, self.default_freshness.get(), Arc::clone(&handler));
                    active.handler = Some(handler);
                    if let Some(cached) = hub.current_value(self.key) {
                        self.publish(cached);
                    }
                }
            }
        }

        LiveObserver {
            rx: self.tx.subscribe(),
            value: Arc::clone(self),
        }
    }

    /// Stores `value` unless it equals the held one; observers are only
    /// woken for real changes.
    fn publish(&self, value: PropertyValue) {
        self.tx.send_if_modified(|current| {
            if current.as_ref() == Some(&value) {
                return false;
            }
            *current = Some(value);
            true
        });
    }

    fn release_observer(&self) {
        let handler = {
            let mut active = self.active.lock();
            active.observers -= 1;
            if active.observers == 0 {
                active.handler.take()
            } else {
                None
            }
        };

        if let Some(handler) = handler {
            if let Some(hub) = self.hub.upgrade() {
                hub.remove_handler(self.key, &handler);
            }
        }
    }
}

/// Observer guard for one [`LiveValue`].
///
/// Await [`changed`](Self::changed) for distinct new values; read
/// [`latest`](Self::latest) for the value held right now (including one
/// adopted from the cache at activation). Dropping the guard detaches the
/// observer.
pub struct LiveObserver {
    rx: watch::Receiver<Option<PropertyValue>>,
    value: Arc<LiveValue>,
}

impl LiveObserver {
    /// Waits until the held value changes and returns it.
    pub async fn changed(&mut self) -> Option<PropertyValue> {
        if self.rx.changed().await.is_err() {
            return None;
        }
        self.rx.borrow_and_update().clone()
    }

    /// Returns the value held right now and marks it seen.
    pub fn latest(&mut self) -> Option<PropertyValue> {
        self.rx.borrow_and_update().clone()
    }

    /// The holder this observer is attached to.
    pub fn live_value(&self) -> &Arc<LiveValue> {
        &self.value
    }
}

impl Drop for LiveObserver {
    fn drop(&mut self) {
        self.value.release_observer();
    }
}

/// Per-hub registry of memoized live values.
///
/// Obtained via [`PropertyHub::live_values`](crate::PropertyHub::live_values);
/// exactly one exists per hub.
///
/// ## Example
/// ```rust,no_run
/// use propcast::{HubConfig, PropertyHub, PropertyKey};
///
/// # async fn demo() {
/// let hub = PropertyHub::new(HubConfig::default());
/// let gear = hub.live_values().get(PropertyKey::new(0x0A04));
///
/// let mut observer = gear.observe();
/// if let Some(current) = observer.latest() {
///     println!("gear now: {current:?}");
/// }
/// while let Some(value) = observer.changed().await {
///     println!("gear changed: {value:?}");
/// }
/// # }
/// ```
pub struct LiveValues {
    hub: Weak<PropertyHub>,
    default_freshness: Arc<FreshnessCell>,
    values: Mutex<HashMap<PropertyKey, Arc<LiveValue>>>,
}

impl LiveValues {
    pub(crate) fn new(hub: Weak<PropertyHub>, default_freshness: Freshness) -> Self {
        Self {
            hub,
            default_freshness: Arc::new(FreshnessCell::new(default_freshness)),
            values: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the live value for `key`, creating it on first use.
    pub fn get(&self, key: PropertyKey) -> Arc<LiveValue> {
        let mut values = self.values.lock();
        Arc::clone(values.entry(key).or_insert_with(|| {
            let (tx, _rx) = watch::channel(None);
            Arc::new(LiveValue {
                key,
                hub: self.hub.clone(),
                default_freshness: Arc::clone(&self.default_freshness),
                tx,
                active: Mutex::new(Active {
                    observers: 0,
                    handler: None,
                }),
            })
        }))
    }

    /// Returns the freshness used for subsequent activations.
    pub fn default_freshness(&self) -> Freshness {
        self.default_freshness.get()
    }

    /// Changes the freshness used for subsequent activations.
    pub fn set_default_freshness(&self, freshness: Freshness) {
        self.default_freshness.set(freshness);
    }
}
