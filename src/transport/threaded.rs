//! # Single-context transport marshaling.
//!
//! Some transports may only be touched from one thread (typically the one
//! that owns the connection), while handler registration happens wherever
//! application code runs. [`ThreadedTransport`] decouples the two: calls are
//! enqueued onto an mpsc queue and drained, in order, by a single worker
//! task.
//!
//! ## Architecture
//! ```text
//! subscribe()/unsubscribe()  (any thread)
//!        │  try-enqueue, returns immediately
//!        ▼
//!   [command queue] ──► worker task (one context) ──► inner.subscribe()/…
//!                            └──► inner failure: logged, dropped
//! ```
//!
//! ## Rules
//! - Pure marshaling shim: relative order of enqueued calls is preserved,
//!   nothing else changes.
//! - Enqueueing never blocks. Once the enqueue has succeeded, a later
//!   failure of the inner call cannot be reported to the caller; the worker
//!   logs it and moves on.
//! - After [`shutdown`](ThreadedTransport::shutdown) (or loss of the worker)
//!   every call returns [`TransportError::Closed`].

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;
use crate::property::{Freshness, PropertyKey};
use crate::transport::{Transport, TransportRef};

enum Command {
    Subscribe(PropertyKey, Freshness),
    Unsubscribe(PropertyKey),
}

/// Transport adapter that runs every call on one designated worker task.
pub struct ThreadedTransport {
    tx: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
}

impl ThreadedTransport {
    /// Spawns the worker on the ambient tokio runtime.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime; use
    /// [`spawn_on`](Self::spawn_on) to pin an explicit one.
    pub fn spawn(inner: TransportRef) -> Self {
        Self::spawn_on(inner, &tokio::runtime::Handle::current())
    }

    /// Spawns the worker on the given runtime handle.
    pub fn spawn_on(inner: TransportRef, handle: &tokio::runtime::Handle) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Command>();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        handle.spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    command = rx.recv() => {
                        let Some(command) = command else { break };
                        let (key, op, result) = match command {
                            Command::Subscribe(key, freshness) => {
                                (key, "subscribe", inner.subscribe(key, freshness))
                            }
                            Command::Unsubscribe(key) => (key, "unsubscribe", inner.unsubscribe(key)),
                        };
                        if let Err(err) = result {
                            tracing::warn!(%key, op, error = %err, "transport call failed on worker");
                        }
                    }
                }
            }
        });

        Self { tx, cancel }
    }

    /// Stops the worker; pending commands are dropped.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Transport for ThreadedTransport {
    fn subscribe(&self, key: PropertyKey, freshness: Freshness) -> Result<(), TransportError> {
        if self.cancel.is_cancelled() {
            return Err(TransportError::Closed);
        }
        self.tx
            .send(Command::Subscribe(key, freshness))
            .map_err(|_| TransportError::Closed)
    }

    fn unsubscribe(&self, key: PropertyKey) -> Result<(), TransportError> {
        if self.cancel.is_cancelled() {
            return Err(TransportError::Closed);
        }
        self.tx
            .send(Command::Unsubscribe(key))
            .map_err(|_| TransportError::Closed)
    }
}
