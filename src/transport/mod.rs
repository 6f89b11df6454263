//! Transport boundary: contract, resilience, and marshaling.
//!
//! This module contains everything that faces the underlying vehicle link:
//! - [`transport`]: the narrow [`Transport`] contract any connection must satisfy;
//! - [`resilient`]: wrapper that survives transport swaps and failures;
//! - [`threaded`]: adapter that marshals calls onto one worker context.

mod resilient;
mod threaded;
mod transport;

pub use resilient::ResilientTransport;
pub use threaded::ThreadedTransport;
pub use transport::{Transport, TransportRef};
