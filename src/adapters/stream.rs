//! # Reactive-stream consumption adapter.
//!
//! [`PropertyStreams::get`] hands out cold [`Stream`]s of property values.
//! Each stream instance registers its own hub handler when constructed and
//! removes it when dropped, so a key holds a live transport subscription
//! exactly while at least one stream for it is alive - the hub's handler-set
//! semantics, not this adapter, deduplicates the underlying subscription.
//!
//! ## Architecture
//! ```text
//! get(key) ──► handler ──► watch channel (capacity 1, overwrite)
//!                │                └──► PropertyStream (WatchStream)
//!                └─ removed on stream drop (RAII guard)
//! ```
//!
//! ## Rules
//! - Backpressure is conflation: a slow consumer only ever observes the
//!   most recent value, never an unbounded backlog.
//! - The bounded push (`send_replace`) cannot fail; a closed receiver just
//!   means the value goes nowhere.
//! - A cached value present at registration is the stream's first item.

use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::hub::{HandlerRef, PropertyHandler, PropertyHub};
use crate::property::{Freshness, FreshnessCell, PropertyKey, PropertyValue};

/// Hub handler pushing into a latest-value-wins channel.
struct StreamHandler {
    tx: watch::Sender<Option<PropertyValue>>,
}

impl PropertyHandler for StreamHandler {
    fn on_update(&self, _key: PropertyKey, value: &PropertyValue) {
        // Overwrite semantics: only the most recent value is retained.
        self.tx.send_replace(Some(value.clone()));
    }

    fn name(&self) -> &str {
        "stream"
    }
}

/// Removes the stream's handler when the stream is dropped.
struct RegistrationGuard {
    hub: Weak<PropertyHub>,
    key: PropertyKey,
    handler: Option<HandlerRef>,
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        if let (Some(hub), Some(handler)) = (self.hub.upgrade(), self.handler.take()) {
            hub.remove_handler(self.key, &handler);
        }
    }
}

/// One independent consumption of a property as an async stream.
///
/// Yields the latest value available at each poll; intermediate values a
/// slow consumer missed are silently conflated away. Dropping the stream
/// detaches its handler (and, if it was the last one, stops the transport
/// subscription).
pub struct PropertyStream {
    inner: WatchStream<Option<PropertyValue>>,
    _registration: RegistrationGuard,
}

impl Stream for PropertyStream {
    type Item = PropertyValue;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Some(value))) => return Poll::Ready(Some(value)),
                // Initial empty state before the first update; keep polling.
                Poll::Ready(Some(None)) => continue,
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Stream factory over one hub.
///
/// Obtained via [`PropertyHub::streams`](crate::PropertyHub::streams);
/// exactly one exists per hub.
///
/// ## Example
/// ```rust,no_run
/// use futures::StreamExt;
/// use propcast::{HubConfig, PropertyHub, PropertyKey};
///
/// # async fn demo() {
/// let hub = PropertyHub::new(HubConfig::default());
/// let mut speed = hub.streams().get(PropertyKey::new(0x0207));
///
/// while let Some(value) = speed.next().await {
///     println!("speed: {value:?}");
/// }
/// # }
/// ```
pub struct PropertyStreams {
    hub: Weak<PropertyHub>,
    default_freshness: Arc<FreshnessCell>,
}

impl PropertyStreams {
    pub(crate) fn new(hub: Weak<PropertyHub>, default_freshness: Freshness) -> Self {
        Self {
            hub,
            default_freshness: Arc::new(FreshnessCell::new(default_freshness)),
        }
    }

    /// Starts one independent consumption of `key`.
    ///
    /// Every call registers its own handler; after the owning hub is gone
    /// the returned stream terminates immediately.
    pub fn get(&self, key: PropertyKey) -> PropertyStream {
        let (tx, rx) = watch::channel(None);
        let mut registered = None;

        if let Some(hub) = self.hub.upgrade() {
            let handler: HandlerRef = Arc::new(StreamHandler { tx });
            hub.add_handler(key, self.default_freshness.get(), Arc::clone(&handler));
            registered = Some(handler);
        }

        PropertyStream {
            inner: WatchStream::new(rx),
            _registration: RegistrationGuard {
                hub: self.hub.clone(),
                key,
                handler: registered,
            },
        }
    }

    /// Returns the freshness used for subsequent `get` registrations.
    pub fn default_freshness(&self) -> Freshness {
        self.default_freshness.get()
    }

    /// Changes the freshness used for subsequent `get` registrations.
    pub fn set_default_freshness(&self, freshness: Freshness) {
        self.default_freshness.set(freshness);
    }
}
