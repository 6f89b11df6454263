//! Consumption adapters: three idioms over one hub.
//!
//! Each adapter is a lazily created, per-hub manager reachable through
//! [`PropertyHub`](crate::PropertyHub) accessors. They are independent of
//! each other and never touch hub-owned state directly - only through
//! `add_handler`/`remove_handler`/`current_value`.
//!
//! - [`callback`]: keyed callback map for plain-function consumers;
//! - [`stream`]: cold [`futures::Stream`]s that hold a live subscription
//!   only while polled;
//! - [`live`]: memoized hot value holders with observer-counted activation.

mod callback;
mod live;
mod stream;

pub use callback::{Callback, CallbackMap};
pub use live::{LiveObserver, LiveValue, LiveValues};
pub use stream::{PropertyStream, PropertyStreams};
