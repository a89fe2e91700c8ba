//! Request dispatch.
//!
//! A [`DispatcherChain`] holds an ordered list of [`Dispatcher`]s fixed at
//! construction. The first dispatcher whose [`Dispatcher::can_handle`] accepts
//! a request serves it. The [`LocalDispatcher`] accepts everything and is
//! always last; extra dispatchers such as the [`RemoteDispatcher`] are built
//! from configuration tokens through the [`DispatcherRegistry`].

mod chain;
mod local;
mod registry;
mod remote;

use serde_json::Value;

use crate::errors::GatewayError;
use crate::request::ManagementRequest;

pub use self::chain::DispatcherChain;
pub use self::local::LocalDispatcher;
pub use self::registry::{DispatcherConstructor, DispatcherContext, DispatcherRegistry};
pub use self::remote::{
    CREDENTIALS_KEY, PRINCIPAL_KEY, REMOTE_CREDENTIALS_KEY, RemoteDispatcher, prepare_environment,
};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Value produced by a dispatcher, with an optional explicit status.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    /// Converted result value.
    pub value: Value,
    /// Status chosen by the dispatcher; the pipeline stamps 200 when absent.
    pub status: Option<u16>,
}

impl DispatchOutcome {
    /// Wraps a value without an explicit status.
    pub fn value(value: Value) -> Self {
        Self {
            value,
            status: None,
        }
    }

    /// Wraps a value with an explicit status.
    pub fn with_status(value: Value, status: u16) -> Self {
        Self {
            value,
            status: Some(status),
        }
    }
}

/// Serves the requests it accepts.
pub trait Dispatcher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns `true` when this dispatcher serves `request`.
    fn can_handle(&self, request: &ManagementRequest) -> bool;

    /// Executes `request`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] for access, lookup, invocation, transport and
    /// path failures, and for the fatal unsupported-operation case.
    fn dispatch(&self, request: &ManagementRequest) -> Result<DispatchOutcome, GatewayError>;
}
