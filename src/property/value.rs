//! # Telemetry payload carrier.
//!
//! [`PropertyValue`] is the already-decoded payload of one property update.
//! Which kind a given property carries is defined by the external catalog;
//! the distribution core treats every value as an opaque immutable datum and
//! only relies on cheap cloning and equality.
//!
//! ## Rules
//! - Values are never mutated in place; an update replaces the whole value.
//! - Aggregate kinds share their backing storage (`Arc`), so cloning a value
//!   during fan-out is pointer-cheap.
//! - Equality is structural and is what the lifecycle adapter uses to
//!   suppress redundant notifications.

use std::sync::Arc;

/// Decoded payload of one property update.
///
/// The variants cover the primitive shapes vehicle telemetry comes in;
/// per-property schemas (units, scaling, enum meanings) stay external.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Text(Arc<str>),
    Bytes(Arc<[u8]>),
    Int32Vec(Arc<[i32]>),
    FloatVec(Arc<[f32]>),
}

impl PropertyValue {
    /// Creates a text value from anything string-like.
    pub fn text(s: impl AsRef<str>) -> Self {
        Self::Text(Arc::from(s.as_ref()))
    }

    /// Creates a raw-bytes value.
    pub fn bytes(b: impl AsRef<[u8]>) -> Self {
        Self::Bytes(Arc::from(b.as_ref()))
    }

    /// Returns a short stable label of the payload kind (snake_case) for
    /// use in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int32(_) => "int32",
            PropertyValue::Int64(_) => "int64",
            PropertyValue::Float(_) => "float",
            PropertyValue::Text(_) => "text",
            PropertyValue::Bytes(_) => "bytes",
            PropertyValue::Int32Vec(_) => "int32_vec",
            PropertyValue::FloatVec(_) => "float_vec",
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f32> for PropertyValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::text(v)
    }
}
