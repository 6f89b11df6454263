//! # Transport contract.
//!
//! [`Transport`] is the narrow seam between this subsystem and the
//! connection-management code that owns the actual vehicle link. An
//! implementation only has to start and stop per-property update flows;
//! the updates themselves arrive out of band through
//! [`PropertyHub::on_update`](crate::PropertyHub::on_update), fed by
//! whatever decodes the wire protocol.
//!
//! ## Contract
//! - No guarantee about delivery timing or ordering of resulting updates.
//! - Any call may fail; callers must tolerate that at any time.
//! - Implementations may be idempotent (repeated `subscribe` for the same
//!   key is harmless) but callers never assume it.
//! - Calls must not block on network I/O; enqueue-and-return
//!   implementations are expected (see
//!   [`ThreadedTransport`](crate::ThreadedTransport)).

use std::sync::Arc;

use crate::error::TransportError;
use crate::property::{Freshness, PropertyKey};

/// Contract for the underlying subscribe/unsubscribe channel.
///
/// # Example
/// ```
/// use propcast::{Freshness, PropertyKey, Transport, TransportError};
///
/// struct NullTransport;
///
/// impl Transport for NullTransport {
///     fn subscribe(&self, _key: PropertyKey, _freshness: Freshness) -> Result<(), TransportError> {
///         Ok(())
///     }
///     fn unsubscribe(&self, _key: PropertyKey) -> Result<(), TransportError> {
///         Ok(())
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Requests updates for `key` no further apart than `freshness`.
    fn subscribe(&self, key: PropertyKey, freshness: Freshness) -> Result<(), TransportError>;

    /// Stops updates for `key`.
    fn unsubscribe(&self, key: PropertyKey) -> Result<(), TransportError>;
}

/// Shared handle to a transport (`Arc<dyn Transport>`).
pub type TransportRef = Arc<dyn Transport>;
