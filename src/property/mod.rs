//! # Property primitives.
//!
//! This module provides the data types the distribution core is built on:
//! - [`PropertyKey`] - opaque identifier of one telemetry property
//! - [`PropertyValue`] - immutable, cheaply clonable telemetry payload
//! - [`Freshness`] - maximum acceptable delay between updates
//! - [`FreshnessCell`] - shared mutable freshness setting for adapter managers

mod freshness;
mod key;
mod value;

pub use freshness::{Freshness, FreshnessCell};
pub use key::PropertyKey;
pub use value::PropertyValue;
