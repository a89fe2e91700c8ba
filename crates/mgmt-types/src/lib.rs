//! Wire-level types shared by the management gateway and its clients.
//!
//! The gateway speaks a small JSON protocol: a request object (or an array of
//! them for bulk execution) goes in, and a response envelope (or an array of
//! envelopes in the same order) comes out. This crate owns the shapes of those
//! messages so the daemon and the client agree on field names and status
//! conventions.
//!
//! # Core Types
//!
//! - [`RequestType`] - The kind of management operation requested
//! - [`ResourceName`] - Structured, possibly wildcarded, resource identifier
//! - [`WireRequest`] - A request exactly as it travels over the wire
//! - [`ResponseEnvelope`] - The uniform success/failure response wrapper

mod envelope;
mod request_type;
mod resource;
mod wire;

pub use envelope::{ResponseEnvelope, STATUS_OK};
pub use request_type::{RequestType, RequestTypeParseError};
pub use resource::{ResourceName, ResourceNameError};
pub use wire::{AttributeSelector, WireRequest, WireTarget};
