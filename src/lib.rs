//! # propcast
//!
//! **Propcast** distributes keyed vehicle-telemetry updates from one
//! unreliable transport to any number of independent consumers.
//!
//! It is the in-process core of a phone-resident car bridge: the protocol
//! layer decodes wire messages into `(key, value)` pairs and feeds them in;
//! UI and state components consume them through whichever idiom fits -
//! plain callbacks, async streams, or observable hot values. The crate
//! guarantees at most one live transport subscription per property, serves
//! late subscribers the last known value, and rides through the transport
//! being dropped or replaced.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!            decode glue                       connection code
//!         on_update(key, value)            install_transport(Some/None)
//!                 │                                   │
//!                 ▼                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  PropertyHub (one per transport session)                          │
//! │  - cache: key → last known PropertyValue                          │
//! │  - handlers: key → set of HandlerRef (Arc identity)               │
//! │  - ResilientTransport (tightest-ever table, replay on install)    │
//! └──────┬──────────────────────┬──────────────────────┬──────────────┘
//!        ▼                      ▼                      ▼
//! ┌──────────────┐      ┌───────────────┐      ┌───────────────┐
//! │ CallbackMap  │      │PropertyStreams│      │  LiveValues   │
//! │ set/get per  │      │ cold streams, │      │ memoized hot  │
//! │ key callback │      │ latest-wins   │      │ values, dedup │
//! └──────┬───────┘      └──────┬────────┘      └──────┬────────┘
//!        ▼                     ▼                      ▼
//!   plain functions      async consumers        observer tasks
//! ```
//!
//! ### Subscription lifecycle
//! ```text
//! adapter ──► hub.add_handler(key, freshness, handler)
//!               ├─ set was empty      ──► wrapper.subscribe (forwarded)
//!               └─ set was non-empty  ──► wrapper.subscribe (arbitrated)
//!                                         + cached value → new handler only
//!
//! adapter ──► hub.remove_handler(key, handler)
//!               └─ set became empty   ──► wrapper.unsubscribe
//!
//! transport lost   ──► wrapper demotes to absent, calls become no-ops
//! transport back   ──► install replays every still-wanted (key, freshness)
//! ```
//!
//! ## Features
//! | Area           | Description                                                   | Key types                                  |
//! |----------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Core**       | Latest-value cache, per-key handler sets, snapshot fan-out.   | [`PropertyHub`], [`PropertyHandler`]       |
//! | **Resilience** | Transport swap/loss survival, tightest-ever replay.           | [`ResilientTransport`], [`Transport`]      |
//! | **Marshaling** | Confine transport calls to one worker context.                | [`ThreadedTransport`]                      |
//! | **Consumption**| Callback map, conflating streams, observable hot values.      | [`CallbackMap`], [`PropertyStreams`], [`LiveValues`] |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use propcast::{Freshness, HubConfig, PropertyHub, PropertyKey, PropertyValue};
//!
//! let hub = PropertyHub::new(HubConfig::default());
//! let speed = PropertyKey::new(0x0207);
//!
//! // Consume through the callback map.
//! hub.callbacks().set(
//!     speed,
//!     Some(Arc::new(|_key, value: &PropertyValue| {
//!         println!("speed: {value:?}");
//!     })),
//! );
//!
//! // Fed by the protocol decoder (possibly from another thread).
//! hub.on_update(speed, PropertyValue::Int32(88));
//!
//! // Late readers get the last known value from the cache.
//! assert_eq!(hub.current_value(speed), Some(PropertyValue::Int32(88)));
//! ```

mod adapters;
mod config;
mod error;
mod hub;
mod property;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

// ---- Public re-exports ----

pub use adapters::{Callback, CallbackMap, LiveObserver, LiveValue, LiveValues, PropertyStream, PropertyStreams};
pub use config::HubConfig;
pub use error::TransportError;
pub use hub::{FnHandler, HandlerRef, PropertyHandler, PropertyHub};
pub use property::{Freshness, FreshnessCell, PropertyKey, PropertyValue};
pub use transport::{ResilientTransport, ThreadedTransport, Transport, TransportRef};
