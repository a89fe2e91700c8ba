//! Request handlers, one per request type.
//!
//! Handlers translate a validated [`ManagementRequest`] into calls on a
//! [`DirectoryConnection`]. Each handler checks the [`Restrictor`] before it
//! touches the directory. The [`HandlerRegistry`] is built once and never
//! changes afterwards, so dispatchers share it freely.

mod exec;
mod list;
mod read;
mod search;
mod version;
mod write;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use mgmt_types::RequestType;

use crate::directory::DirectoryConnection;
use crate::errors::GatewayError;
use crate::request::ManagementRequest;
use crate::restrictor::Restrictor;

pub use self::exec::ExecHandler;
pub use self::list::ListHandler;
pub use self::read::ReadHandler;
pub use self::search::SearchHandler;
pub use self::version::{PROTOCOL_VERSION, VersionHandler};
pub use self::write::WriteHandler;

/// Executes one request type against a directory connection.
pub trait RequestHandler: Send + Sync {
    /// Request type served by this handler.
    fn request_type(&self) -> RequestType;

    /// Serves the request against a single connection.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when access is denied or the directory
    /// rejects the call.
    fn handle(
        &self,
        request: &ManagementRequest,
        connection: &dyn DirectoryConnection,
    ) -> Result<Value, GatewayError>;

    /// Serves the request against every connection at once.
    ///
    /// Only handlers reporting [`RequestHandler::handles_all_targets_at_once`]
    /// are invoked this way.
    ///
    /// # Errors
    ///
    /// The default implementation reports the request type as unsupported.
    fn handle_all(
        &self,
        request: &ManagementRequest,
        connections: &[&dyn DirectoryConnection],
    ) -> Result<Value, GatewayError> {
        let _ = (request, connections);
        Err(GatewayError::unsupported_operation(self.request_type()))
    }

    /// Returns `false` when the handler consumes the request path itself.
    fn uses_path_on_return_value(&self) -> bool {
        true
    }

    /// Returns `true` when results must be merged across all connections.
    fn handles_all_targets_at_once(&self, _request: &ManagementRequest) -> bool {
        false
    }
}

/// Immutable mapping from request type to handler.
pub struct HandlerRegistry {
    handlers: HashMap<RequestType, Box<dyn RequestHandler>>,
}

impl HandlerRegistry {
    /// Builds the registry with every built-in handler.
    pub fn new(restrictor: Arc<dyn Restrictor>) -> Self {
        let handlers: Vec<Box<dyn RequestHandler>> = vec![
            Box::new(ReadHandler::new(Arc::clone(&restrictor))),
            Box::new(WriteHandler::new(Arc::clone(&restrictor))),
            Box::new(ExecHandler::new(Arc::clone(&restrictor))),
            Box::new(ListHandler::new(Arc::clone(&restrictor))),
            Box::new(VersionHandler::new(Arc::clone(&restrictor))),
            Box::new(SearchHandler::new(restrictor)),
        ];
        Self::from_handlers(handlers)
    }

    /// Builds a registry from an explicit handler set.
    ///
    /// A later handler for the same request type replaces an earlier one.
    pub fn from_handlers(handlers: Vec<Box<dyn RequestHandler>>) -> Self {
        let handlers = handlers
            .into_iter()
            .map(|handler| (handler.request_type(), handler))
            .collect();
        Self { handlers }
    }

    /// Looks up the handler for `request_type`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnsupportedOperation`] when no handler is
    /// registered.
    pub fn resolve(&self, request_type: RequestType) -> Result<&dyn RequestHandler, GatewayError> {
        self.handlers
            .get(&request_type)
            .map(|handler| &**handler)
            .ok_or_else(|| GatewayError::unsupported_operation(request_type))
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&str> = self.handlers.keys().map(|kind| kind.as_str()).collect();
        types.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("types", &types)
            .finish()
    }
}

fn deny(request_type: RequestType, subject: impl fmt::Display) -> GatewayError {
    GatewayError::access_denied(format!("{request_type} {subject}"))
}

/// Fails unless requests of `request_type` are permitted.
fn ensure_type_allowed(
    restrictor: &dyn Restrictor,
    request_type: RequestType,
) -> Result<(), GatewayError> {
    if restrictor.is_type_allowed(request_type) {
        Ok(())
    } else {
        Err(GatewayError::access_denied(format!(
            "{request_type} requests are not permitted"
        )))
    }
}
