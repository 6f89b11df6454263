//! Shared test doubles for the transport boundary.
//!
//! Only compiled for tests. [`RecordingTransport`] journals every call so
//! assertions can check exactly what reached the wire;
//! [`FailingTransport`] rejects everything to exercise the demote path.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::TransportError;
use crate::property::{Freshness, PropertyKey};
use crate::transport::Transport;

/// One observed transport call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TransportCall {
    Subscribe(PropertyKey, Freshness),
    Unsubscribe(PropertyKey),
}

/// Transport that records calls and always succeeds.
pub(crate) struct RecordingTransport {
    calls: Mutex<Vec<TransportCall>>,
}

impl RecordingTransport {
    pub(crate) fn arc() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Snapshot of the journal so far.
    pub(crate) fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().clone()
    }
}

impl Transport for RecordingTransport {
    fn subscribe(&self, key: PropertyKey, freshness: Freshness) -> Result<(), TransportError> {
        self.calls.lock().push(TransportCall::Subscribe(key, freshness));
        Ok(())
    }

    fn unsubscribe(&self, key: PropertyKey) -> Result<(), TransportError> {
        self.calls.lock().push(TransportCall::Unsubscribe(key));
        Ok(())
    }
}

/// Transport that rejects every call.
pub(crate) struct FailingTransport;

impl Transport for FailingTransport {
    fn subscribe(&self, _key: PropertyKey, _freshness: Freshness) -> Result<(), TransportError> {
        Err(TransportError::Rejected {
            op: "subscribe",
            reason: "induced failure".to_string(),
        })
    }

    fn unsubscribe(&self, _key: PropertyKey) -> Result<(), TransportError> {
        Err(TransportError::Rejected {
            op: "unsubscribe",
            reason: "induced failure".to_string(),
        })
    }
}
