use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::converter::ValueConverter;
use crate::directory::{DirectoryConnection, EmptyDirectory};
use crate::errors::GatewayError;
use crate::handler::{HandlerRegistry, RequestHandler};
use crate::request::ManagementRequest;
use crate::restrictor::Restrictor;

use super::{DISPATCH_TARGET, DispatchOutcome, Dispatcher};

/// Catch-all dispatcher serving requests from in-process directories.
///
/// Single-target handlers try each directory in order until one does not
/// report the resource as missing. All-at-once handlers see every directory.
pub struct LocalDispatcher {
    handlers: HandlerRegistry,
    directories: Vec<Arc<dyn DirectoryConnection>>,
    converter: ValueConverter,
}

impl LocalDispatcher {
    /// Creates a dispatcher over `directories`, consulted in order.
    pub fn new(
        restrictor: Arc<dyn Restrictor>,
        directories: Vec<Arc<dyn DirectoryConnection>>,
        converter: ValueConverter,
    ) -> Self {
        Self {
            handlers: HandlerRegistry::new(restrictor),
            directories,
            converter,
        }
    }

    fn first_serving(
        &self,
        handler: &dyn RequestHandler,
        request: &ManagementRequest,
    ) -> Result<Value, GatewayError> {
        if self.directories.is_empty() {
            return handler.handle(request, &EmptyDirectory);
        }
        let mut not_found = None;
        for (index, directory) in self.directories.iter().enumerate() {
            match handler.handle(request, &**directory) {
                Err(error @ GatewayError::ResourceNotFound { .. }) => {
                    debug!(
                        target: DISPATCH_TARGET,
                        directory = index,
                        request = %request,
                        "resource not in directory, trying next"
                    );
                    not_found = Some(error);
                }
                other => return other,
            }
        }
        Err(not_found.unwrap_or_else(|| {
            GatewayError::resource_not_found(
                request
                    .resource()
                    .map_or_else(|| String::from("<none>"), ToString::to_string),
            )
        }))
    }
}

impl Dispatcher for LocalDispatcher {
    fn name(&self) -> &'static str {
        "local"
    }

    fn can_handle(&self, _request: &ManagementRequest) -> bool {
        true
    }

    fn dispatch(&self, request: &ManagementRequest) -> Result<DispatchOutcome, GatewayError> {
        let handler = self.handlers.resolve(request.request_type())?;
        let raw = if handler.handles_all_targets_at_once(request) {
            let directories: Vec<&dyn DirectoryConnection> =
                self.directories.iter().map(|directory| &**directory).collect();
            handler.handle_all(request, &directories)?
        } else {
            self.first_serving(handler, request)?
        };
        let value =
            self.converter
                .convert(raw, request.path(), handler.uses_path_on_return_value())?;
        Ok(DispatchOutcome::value(value))
    }
}

impl fmt::Debug for LocalDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalDispatcher")
            .field("handlers", &self.handlers)
            .field("directories", &self.directories.len())
            .field("converter", &self.converter)
            .finish()
    }
}
