//! Client side of the management gateway protocol.
//!
//! A [`ManagementClient`] encodes [`ClientRequest`]s, hands them to a
//! [`Transport`] and turns the returned envelopes back into typed results.
//! Bulk execution sends every request in one body and rebuilds one
//! [`BulkOutcome`] per request, in request order. When any position failed
//! the call returns [`ClientError::Bulk`] carrying every outcome, so callers
//! keep the successful results alongside the failures.

mod client;
mod errors;
mod request;
mod transport;

pub use client::{ClientResponse, ManagementClient, reconstruct};
pub use errors::{BulkOutcome, BulkRemoteError, ClientError, RemoteError, TransportError};
pub use request::ClientRequest;
pub use transport::Transport;

#[cfg(test)]
mod tests;
