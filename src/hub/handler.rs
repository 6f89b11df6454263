//! # Handler contract and function-backed handler.
//!
//! A handler is anything that can receive `(key, value)` pairs from the
//! hub's fan-out. Identity matters: registration and removal use `Arc`
//! pointer identity, and the per-key handler set has mathematical-set
//! semantics under that identity (no duplicates, insertion order
//! irrelevant).
//!
//! [`FnHandler`] wraps a closure so consumers do not need a struct per
//! handler; the consumption adapters build their internal handlers the same
//! way.

use std::borrow::Cow;
use std::sync::Arc;

use crate::property::{PropertyKey, PropertyValue};

/// Contract for recipients of property updates.
///
/// Called synchronously from whatever thread feeds
/// [`PropertyHub::on_update`](crate::PropertyHub::on_update), so
/// implementations must not block; hand off to a channel or queue for
/// anything slow. The hub does not catch panics here - the consumption
/// adapters isolate their own callbacks (see
/// [`CallbackMap`](crate::CallbackMap)).
pub trait PropertyHandler: Send + Sync + 'static {
    /// Receives one update for a subscribed key.
    fn on_update(&self, key: PropertyKey, value: &PropertyValue);

    /// Human-readable name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handler handle; `Arc` pointer identity is handler identity.
pub type HandlerRef = Arc<dyn PropertyHandler>;

/// Function-backed handler implementation.
///
/// ## Example
/// ```rust
/// use propcast::{FnHandler, HandlerRef, PropertyKey, PropertyValue};
///
/// let h: HandlerRef = FnHandler::arc("speed-logger", |key: PropertyKey, value: &PropertyValue| {
///     println!("{key} = {value:?}");
/// });
/// assert_eq!(h.name(), "speed-logger");
/// ```
pub struct FnHandler<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> FnHandler<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`FnHandler::arc`] when you immediately need a [`HandlerRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> PropertyHandler for FnHandler<F>
where
    F: Fn(PropertyKey, &PropertyValue) + Send + Sync + 'static,
{
    fn on_update(&self, key: PropertyKey, value: &PropertyValue) {
        (self.f)(key, value);
    }

    fn name(&self) -> &str {
        &self.name
    }
}
