//! Error types used by the transport boundary.
//!
//! This subsystem surfaces exactly one error enum, [`TransportError`]:
//! failures of the underlying subscribe/unsubscribe channel. They are
//! produced by [`Transport`](crate::Transport) implementations and absorbed
//! by [`ResilientTransport`](crate::ResilientTransport), which demotes the
//! failed transport to absent instead of propagating. Consumer-facing
//! operations (`add_handler`, `remove_handler`, the adapters) are therefore
//! infallible; degraded service shows up as stale data, not as errors.

use thiserror::Error;

/// # Errors produced by transport subscribe/unsubscribe calls.
///
/// Any call on a [`Transport`](crate::Transport) may fail at any time; the
/// wrapper layer treats every variant the same way (demote and log), so the
/// variants exist for diagnostics, not for recovery branching.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TransportError {
    /// The marshaling queue or connection backing the transport is gone.
    #[error("transport closed")]
    Closed,

    /// The head unit rejected the request.
    #[error("transport rejected {op}: {reason}")]
    Rejected {
        /// Which call was rejected (`"subscribe"` / `"unsubscribe"`).
        op: &'static str,
        /// Rejection detail as reported by the remote side.
        reason: String,
    },

    /// The underlying link dropped mid-call.
    #[error("transport link lost: {reason}")]
    LinkLost {
        /// Link failure detail.
        reason: String,
    },
}

impl TransportError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use propcast::TransportError;
    ///
    /// assert_eq!(TransportError::Closed.as_label(), "transport_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TransportError::Closed => "transport_closed",
            TransportError::Rejected { .. } => "transport_rejected",
            TransportError::LinkLost { .. } => "transport_link_lost",
        }
    }
}
