//! Distribution core: handler contract and the property hub.
//!
//! Internal modules:
//! - [`handler`]: the [`PropertyHandler`] trait, [`HandlerRef`] identity
//!   handle, and the closure-backed [`FnHandler`];
//! - [`hub`]: [`PropertyHub`], the latest-value cache and fan-out engine.

mod handler;
#[allow(clippy::module_inception)]
mod hub;

pub use handler::{FnHandler, HandlerRef, PropertyHandler};
pub use hub::PropertyHub;
